//! Technique name to draw routine mapping.

use std::collections::HashMap;
use std::fmt;

use super::frame::Frame;
use crate::gpu::GpuDevice;

/// A whole-frame draw routine. Everything it needs arrives through the
/// [`Frame`] context.
pub type RenderFn<D> = fn(&mut Frame<'_, D>);

/// Registered techniques, keyed by name.
pub struct RenderMethodTable<D: GpuDevice> {
    methods: HashMap<String, RenderFn<D>>,
}

impl<D: GpuDevice> Default for RenderMethodTable<D> {
    fn default() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }
}

impl<D: GpuDevice> Clone for RenderMethodTable<D> {
    fn clone(&self) -> Self {
        Self {
            methods: self.methods.clone(),
        }
    }
}

impl<D: GpuDevice> fmt::Debug for RenderMethodTable<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderMethodTable")
            .field("methods", &self.names())
            .finish()
    }
}

impl<D: GpuDevice> RenderMethodTable<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `method` under `name`, returning the routine it replaced.
    pub fn register(&mut self, name: impl Into<String>, method: RenderFn<D>) -> Option<RenderFn<D>> {
        self.methods.insert(name.into(), method)
    }

    /// Builder form of [`RenderMethodTable::register`].
    pub fn with(mut self, name: impl Into<String>, method: RenderFn<D>) -> Self {
        self.register(name, method);
        self
    }

    pub fn get(&self, name: &str) -> Option<RenderFn<D>> {
        self.methods.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn clear(&mut self) {
        self.methods.clear();
    }
}

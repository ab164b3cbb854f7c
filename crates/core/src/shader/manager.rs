//! Name-keyed shader program cache with a single active program.
//!
//! The manager owns every [`ShaderProgram`] it has built. A name present in
//! the cache always maps to a successfully linked program: failed builds are
//! never inserted, and a failed reload keeps the previous program in place.
//!
//! Exactly one program (or none) is active. Activating another name
//! implicitly replaces it, matching GL's single "current program" slot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::program::{ShaderError, ShaderProgram};
use crate::gpu::GpuDevice;

/// Cache of shader programs, keyed by name.
pub struct ShaderManager<D: GpuDevice> {
    root: PathBuf,
    programs: HashMap<String, ShaderProgram<D>>,
    active: Option<String>,
}

impl<D: GpuDevice> ShaderManager<D> {
    /// Creates an empty manager that resolves program names under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            programs: HashMap::new(),
            active: None,
        }
    }

    /// Directory program names are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of cached programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Cached program names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.programs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Looks up a cached program without touching any state.
    pub fn find_shader_program(&self, name: &str) -> Option<&ShaderProgram<D>> {
        self.programs.get(name)
    }

    /// Builds `<root>/<name>.vs` + `<root>/<name>.fs` and caches the result.
    ///
    /// On failure the cache is left exactly as it was. A program already
    /// cached under `name` is replaced and its GPU object deleted.
    ///
    /// # Errors
    ///
    /// Returns the read, compile, or link error.
    pub fn create_shader_program(&mut self, device: &mut D, name: &str) -> Result<(), ShaderError> {
        let program = ShaderProgram::build(device, &self.root, name)?;
        if let Some(old) = self.programs.insert(name.to_string(), program) {
            device.delete_program(old.handle());
        }
        log::debug!("created shader program '{name}'");
        Ok(())
    }

    /// Activates an already cached program.
    ///
    /// Returns `false` and logs an error if `name` is not cached.
    pub fn active_shader_program(&mut self, device: &mut D, name: &str) -> bool {
        match self.programs.get(name) {
            Some(program) => {
                program.activate(device);
                self.active = Some(name.to_string());
                true
            }
            None => {
                log::error!("no '{name}' shader in ShaderManager");
                false
            }
        }
    }

    /// Returns the cached program for `name`, building it first if needed,
    /// and makes it active.
    ///
    /// Returns `None` if the program cannot be built; the active program is
    /// then left unchanged.
    pub fn try_activate_shader_program(
        &mut self,
        device: &mut D,
        name: &str,
    ) -> Option<&ShaderProgram<D>> {
        if !self.programs.contains_key(name) {
            if let Err(err) = self.create_shader_program(device, name) {
                log::error!("cannot create shader program '{name}': {err}");
                return None;
            }
        }
        let handle = self.programs.get(name)?.handle();
        device.use_program(Some(handle));
        if self.active.as_deref() != Some(name) {
            self.active = Some(name.to_string());
        }
        self.programs.get(name)
    }

    /// Rebuilds `name` from disk and activates the new program.
    ///
    /// The new program is built before anything is touched. If the build
    /// fails, the previously cached program (if any) stays in place and the
    /// active program is unchanged. If it succeeds, the old GPU program is
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns the read, compile, or link error of the new build.
    pub fn load_shader(&mut self, device: &mut D, name: &str) -> Result<(), ShaderError> {
        let fresh = match ShaderProgram::build(device, &self.root, name) {
            Ok(program) => program,
            Err(err) => {
                log::error!("reload of shader '{name}' failed, keeping previous program: {err}");
                return Err(err);
            }
        };

        fresh.activate(device);
        if let Some(old) = self.programs.insert(name.to_string(), fresh) {
            device.delete_program(old.handle());
        }
        self.active = Some(name.to_string());
        log::info!("reloaded shader '{name}'");
        Ok(())
    }

    /// Unbinds the active program.
    pub fn stop_shader_program(&mut self, device: &mut D) {
        device.use_program(None);
        self.active = None;
    }

    /// Name of the active program.
    pub fn active_shader(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The active program, if any.
    pub fn active_program(&self) -> Option<&ShaderProgram<D>> {
        let name = self.active.as_deref()?;
        let program = self.programs.get(name);
        if program.is_none() {
            log::error!("active shader '{name}' is missing from ShaderManager");
        }
        program
    }

    /// Logs the active program's name and sources.
    pub fn describe_active(&self) {
        match self.active_program() {
            Some(program) => program.describe(),
            None => log::info!("no active shader program"),
        }
    }

    /// Deletes every cached program and forgets the active one.
    pub fn clear(&mut self, device: &mut D) {
        if self.active.take().is_some() {
            device.use_program(None);
        }
        for (_, program) in self.programs.drain() {
            device.delete_program(program.handle());
        }
    }
}

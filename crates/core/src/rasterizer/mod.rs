//! The rasterizer: GPU resource allocator, shader cache owner and frame
//! dispatcher.
//!
//! Buffers and vertex arrays live in two [`SlotTable`]s. Scene objects only
//! ever hold slot indices (through their mesh's
//! [`GpuBinding`](crate::mesh::GpuBinding)), so releasing one object's
//! resources never invalidates another's.
//!
//! Once per frame the driver calls [`Rasterizer::render`], which runs the
//! shadow pre-pass if needed and then the technique the scene names.
//!
//! # Module overview
//!
//! - [`dispatch`] -- Technique name to draw routine table.
//! - [`frame`] -- The [`Frame`] context render methods receive, the
//!   [`ShadowPass`] seam, and [`FrameOutcome`].

pub mod dispatch;
pub mod frame;

pub use dispatch::{RenderFn, RenderMethodTable};
pub use frame::{Frame, FrameOutcome, NoShadows, ShadowPass, TechniqueState};

use crate::config::EngineConfig;
use crate::error::RasterError;
use crate::gpu::{GpuDevice, PipelineState, Uniform};
use crate::mesh::{GpuBinding, VertexLayout};
use crate::scene::{Material, Scene, SceneObject};
use crate::shader::{ShaderError, ShaderManager};
use crate::slot::SlotTable;

/// Owns the device, the resource slot tables, the shader cache and the
/// technique table.
pub struct Rasterizer<D: GpuDevice> {
    device: D,
    config: EngineConfig,
    buffers: SlotTable<D::Buffer>,
    vertex_arrays: SlotTable<D::VertexArray>,
    shaders: ShaderManager<D>,
    methods: RenderMethodTable<D>,
    build_methods: fn() -> RenderMethodTable<D>,
    state: TechniqueState,
    draw_calls: usize,
    /// Bumped whenever a whole table is emptied, so bindings recorded before
    /// that point can be told apart from current ones.
    generation: u64,
}

impl<D: GpuDevice> Rasterizer<D> {
    /// Creates a rasterizer. The technique table stays empty until
    /// [`Rasterizer::init`] runs `build_methods`.
    pub fn new(device: D, config: EngineConfig, build_methods: fn() -> RenderMethodTable<D>) -> Self {
        let shaders = ShaderManager::new(config.shader_root.clone());
        Self {
            device,
            config,
            buffers: SlotTable::new(),
            vertex_arrays: SlotTable::new(),
            shaders,
            methods: RenderMethodTable::new(),
            build_methods,
            state: TechniqueState::default(),
            draw_calls: 0,
            generation: 0,
        }
    }

    /// Sets the viewport to the configured size and rebuilds the technique
    /// table.
    pub fn init(&mut self) {
        self.device.set_viewport(self.config.viewport.viewport());
        self.methods = (self.build_methods)();
        log::info!(
            "rasterizer initialized with {} render methods ({}x{})",
            self.methods.len(),
            self.config.viewport.width,
            self.config.viewport.height
        );
    }

    /// Enables back-face culling and the depth test.
    pub fn apply_pipeline_state(&mut self) {
        self.device.apply_pipeline_state(&PipelineState::default());
    }

    /// Destroys every buffer, vertex array and shader program and empties
    /// the technique table. Previously issued slot indices become invalid.
    pub fn clear(&mut self) {
        self.delete_all_buffers();
        self.delete_all_vertex_arrays();
        self.shaders.clear(&mut self.device);
        self.methods.clear();
        self.state = TechniqueState::default();
    }

    // --- accessors ---

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn shaders(&self) -> &ShaderManager<D> {
        &self.shaders
    }

    pub fn methods(&self) -> &RenderMethodTable<D> {
        &self.methods
    }

    pub fn technique_state(&self) -> &TechniqueState {
        &self.state
    }

    pub fn technique_state_mut(&mut self) -> &mut TechniqueState {
        &mut self.state
    }

    /// Total draw calls issued since creation.
    pub fn draw_call_count(&self) -> usize {
        self.draw_calls
    }

    // --- buffers ---

    fn alloc_buffer(&mut self) -> Result<(usize, D::Buffer), RasterError> {
        let handle = self.device.create_buffer().map_err(RasterError::Gpu)?;
        let index = self.buffers.insert(handle);
        log::debug!("buffer {handle:?} -> slot {index}");
        Ok((index, handle))
    }

    /// Allocates a buffer and returns its slot index. Reuses the first
    /// empty slot, otherwise appends one.
    ///
    /// # Errors
    ///
    /// Returns `RasterError::Gpu` if the device cannot create a buffer.
    pub fn create_buffer(&mut self) -> Result<usize, RasterError> {
        self.alloc_buffer().map(|(index, _)| index)
    }

    /// Destroys the buffers at `indices` and empties their slots. Every
    /// other slot keeps its index. Empty or unknown indices are skipped with
    /// a warning.
    pub fn delete_buffers(&mut self, indices: &[usize]) {
        for &index in indices {
            match self.buffers.remove(index) {
                Some(handle) => self.device.delete_buffer(handle),
                None => log::warn!("delete_buffers: slot {index} is not live"),
            }
        }
    }

    /// Destroys every buffer and shrinks the table to zero slots.
    pub fn delete_all_buffers(&mut self) {
        for handle in self.buffers.drain() {
            self.device.delete_buffer(handle);
        }
        self.generation += 1;
    }

    /// Handle stored in buffer slot `index`.
    pub fn buffer(&self, index: usize) -> Option<D::Buffer> {
        self.buffers.get(index)
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.live_count()
    }

    // --- vertex arrays ---

    fn alloc_vertex_array(&mut self) -> Result<(usize, D::VertexArray), RasterError> {
        let handle = self.device.create_vertex_array().map_err(RasterError::Gpu)?;
        let index = self.vertex_arrays.insert(handle);
        log::debug!("vertex array {handle:?} -> slot {index}");
        Ok((index, handle))
    }

    /// Allocates a vertex array and returns its slot index.
    ///
    /// # Errors
    ///
    /// Returns `RasterError::Gpu` if the device cannot create one.
    pub fn create_vertex_array(&mut self) -> Result<usize, RasterError> {
        self.alloc_vertex_array().map(|(index, _)| index)
    }

    /// Destroys the vertex arrays at `indices`, leaving empty slots.
    pub fn delete_vertex_arrays(&mut self, indices: &[usize]) {
        for &index in indices {
            match self.vertex_arrays.remove(index) {
                Some(handle) => self.device.delete_vertex_array(handle),
                None => log::warn!("delete_vertex_arrays: slot {index} is not live"),
            }
        }
    }

    /// Destroys every vertex array and shrinks the table to zero slots.
    pub fn delete_all_vertex_arrays(&mut self) {
        for handle in self.vertex_arrays.drain() {
            self.device.delete_vertex_array(handle);
        }
        self.generation += 1;
    }

    /// Whether `binding` was recorded after the tables were last emptied.
    pub fn is_current(&self, binding: &GpuBinding) -> bool {
        binding.generation == self.generation
    }

    pub fn vertex_array(&self, index: usize) -> Option<D::VertexArray> {
        self.vertex_arrays.get(index)
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.live_count()
    }

    // --- mesh upload ---

    /// Uploads `object`'s mesh (and its material's UVs) and records the
    /// slot indices on the mesh.
    ///
    /// Indices go into their own buffer. Positions, normals and UVs share a
    /// second buffer, one block after another. An existing binding is
    /// released first; one left over from before a [`clear`](Self::clear)
    /// is dropped without touching the slots it names.
    ///
    /// # Errors
    ///
    /// Returns `RasterError::Gpu` if an object cannot be created. Slots
    /// allocated before the failure are released again.
    pub fn init_gpu_data(&mut self, object: &mut SceneObject<D::Texture>) -> Result<(), RasterError> {
        match object.mesh.binding().map(|binding| self.is_current(binding)) {
            Some(true) => {
                self.delete_gpu_data(object);
            }
            Some(false) => {
                object.mesh.take_binding();
                log::debug!("dropped stale binding of '{}'", object.name);
            }
            None => {}
        }

        let (index_slot, ibo) = self.alloc_buffer()?;
        let (vertex_slot, vbo) = match self.alloc_buffer() {
            Ok(allocated) => allocated,
            Err(err) => {
                self.delete_buffers(&[index_slot]);
                return Err(err);
            }
        };
        let (vao_slot, vao) = match self.alloc_vertex_array() {
            Ok(allocated) => allocated,
            Err(err) => {
                self.delete_buffers(&[index_slot, vertex_slot]);
                return Err(err);
            }
        };

        let mesh = &object.mesh;
        let index_bytes = mesh.index_bytes();
        self.device
            .buffer_storage(ibo, index_bytes.len(), Some(index_bytes));

        let positions = mesh.position_bytes();
        let normals = mesh.normal_bytes();
        let uvs = object.material.as_ref().map_or(&[][..], Material::uv_bytes);
        let layout = VertexLayout::compute(positions.len(), normals.len(), uvs.len());

        self.device.buffer_storage(vbo, layout.total_bytes(), None);
        self.device.buffer_sub_data(vbo, 0, positions);
        self.device
            .buffer_sub_data(vbo, layout.normal_offset(), normals);
        if layout.has_uvs() {
            self.device.buffer_sub_data(vbo, layout.uv_offset(), uvs);
        }

        self.device
            .configure_vertex_array(vao, vbo, ibo, &layout.attributes());

        object.mesh.set_binding(GpuBinding {
            index_buffer: index_slot,
            vertex_buffer: vertex_slot,
            vertex_array: vao_slot,
            layout,
            generation: self.generation,
        });
        log::debug!(
            "uploaded '{}': {} triangles, {} vertex bytes",
            object.name,
            object.mesh.triangle_count(),
            layout.total_bytes()
        );
        Ok(())
    }

    /// Releases exactly the two buffer slots and one vertex-array slot
    /// recorded on `object`'s mesh. Returns `false` if it had none, or only
    /// a stale one from before the tables were emptied.
    pub fn delete_gpu_data(&mut self, object: &mut SceneObject<D::Texture>) -> bool {
        match object.mesh.take_binding() {
            Some(binding) if !self.is_current(&binding) => {
                log::warn!(
                    "'{}' holds a stale binding; its slots were already released",
                    object.name
                );
                false
            }
            Some(binding) => {
                self.delete_buffers(&[binding.index_buffer, binding.vertex_buffer]);
                self.delete_vertex_arrays(&[binding.vertex_array]);
                true
            }
            None => {
                log::warn!("'{}' has no GPU data to delete", object.name);
                false
            }
        }
    }

    /// Issues an indexed triangle draw of `object` with its cached vertex
    /// array. Objects that were never uploaded are skipped with a warning.
    pub fn draw(&mut self, object: &SceneObject<D::Texture>) -> bool {
        let Some(binding) = object.mesh.binding() else {
            log::warn!("{}", RasterError::NotUploaded(object.name.clone()));
            return false;
        };
        if !self.is_current(binding) {
            log::warn!("'{}' was uploaded before the tables were cleared", object.name);
            return false;
        }
        let Some(vao) = self.vertex_arrays.get(binding.vertex_array) else {
            log::warn!(
                "'{}' refers to vertex array slot {} which is not live",
                object.name,
                binding.vertex_array
            );
            return false;
        };
        self.device
            .draw_indexed_triangles(vao, object.mesh.index_count());
        self.draw_calls += 1;
        true
    }

    // --- shaders ---

    /// Activates shader `name`, building it on first use. Returns its handle.
    pub fn activate_shader(&mut self, name: &str) -> Option<D::Program> {
        self.shaders
            .try_activate_shader_program(&mut self.device, name)
            .map(|program| program.handle())
    }

    /// Rebuilds shader `name` from disk, keeping the old program on failure.
    ///
    /// # Errors
    ///
    /// Returns the build error; the cache is then unchanged.
    pub fn reload_shader(&mut self, name: &str) -> Result<(), ShaderError> {
        self.shaders.load_shader(&mut self.device, name)
    }

    /// Unbinds the active shader program.
    pub fn stop_shader(&mut self) {
        self.shaders.stop_shader_program(&mut self.device);
    }

    pub fn active_program_handle(&self) -> Option<D::Program> {
        self.shaders.active_program().map(|program| program.handle())
    }

    /// Writes a uniform of the active program. Logs a warning if no program
    /// is active.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<Uniform>) {
        match self.active_program_handle() {
            Some(program) => self.device.set_uniform(program, name, &value.into()),
            None => log::warn!("uniform '{name}' set with no active shader program"),
        }
    }

    // --- frame ---

    /// Renders one frame of `scene` with the technique it names.
    ///
    /// An empty technique name renders nothing. Otherwise the shadow
    /// pre-pass runs when `shadow` asks for it, then the technique. An
    /// unregistered name logs one error and draws nothing.
    pub fn render(
        &mut self,
        scene: &Scene<D::Texture>,
        shadow: &mut dyn ShadowPass<D>,
        delta: f32,
    ) -> FrameOutcome {
        let technique = scene.render_method.as_str();
        if technique.is_empty() {
            return FrameOutcome::Idle;
        }

        if shadow.is_needed() {
            shadow.render(self, scene);
        }

        let Some(method) = self.methods.get(technique) else {
            log::error!("no render method registered for '{technique}'");
            return FrameOutcome::MissingTechnique(technique.to_string());
        };

        let before = self.draw_calls;
        let mut frame = Frame::new(self, scene, shadow, delta);
        method(&mut frame);
        FrameOutcome::Rendered {
            technique: technique.to_string(),
            draw_calls: self.draw_calls - before,
        }
    }
}

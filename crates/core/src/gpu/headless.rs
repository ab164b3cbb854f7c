//! In-memory GPU device.
//!
//! `HeadlessDevice` hands out non-zero handle ids, keeps buffer contents and
//! vertex-array layouts in host memory, and records every draw call and
//! uniform write. It lets the allocator, shader manager, and render methods
//! run without a window or a GL context.
//!
//! Compilation succeeds for any source except one containing a `#error`
//! preprocessor line, which GLSL compilers reject as well. That is how
//! tests provoke a failing build.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use super::{GpuDevice, PipelineState, Uniform, VertexAttribute, Viewport};
use crate::shader::{format_shader_error, ShaderError};

/// Opaque handle issued by [`HeadlessDevice`]. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessHandle(NonZeroU32);

impl HeadlessHandle {
    /// The raw id.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// One recorded indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub vertex_array: HeadlessHandle,
    pub index_count: u32,
    /// Program that was current when the draw was issued.
    pub program: Option<HeadlessHandle>,
}

/// Layout recorded by `configure_vertex_array`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexArrayState {
    pub vertex_buffer: Option<HeadlessHandle>,
    pub index_buffer: Option<HeadlessHandle>,
    pub attributes: Vec<VertexAttribute>,
}

/// A GPU device that lives entirely in host memory.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    last_id: u32,
    buffers: HashMap<HeadlessHandle, Vec<u8>>,
    vertex_arrays: HashMap<HeadlessHandle, VertexArrayState>,
    programs: HashMap<HeadlessHandle, (String, String)>,
    textures: HashSet<HeadlessHandle>,
    current_program: Option<HeadlessHandle>,
    uniforms: HashMap<(HeadlessHandle, String), Uniform>,
    texture_units: HashMap<u32, HeadlessHandle>,
    draws: Vec<DrawCall>,
    viewport: Option<Viewport>,
    pipeline: Option<PipelineState>,
    clears: Vec<[f32; 4]>,
    compile_count: usize,
}

impl HeadlessDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&mut self) -> Result<HeadlessHandle, String> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| "handle ids exhausted".to_string())?;
        NonZeroU32::new(self.last_id)
            .map(HeadlessHandle)
            .ok_or_else(|| "handle ids exhausted".to_string())
    }

    /// Allocates a texture object so materials can reference an albedo map.
    pub fn create_texture(&mut self) -> Result<HeadlessHandle, String> {
        let handle = self.next_handle()?;
        self.textures.insert(handle);
        Ok(handle)
    }

    /// Deletes a texture created with [`create_texture`](Self::create_texture).
    pub fn delete_texture(&mut self, texture: HeadlessHandle) {
        self.textures.remove(&texture);
    }

    /// Number of buffers that have been created and not deleted.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of vertex arrays that have been created and not deleted.
    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    /// Number of linked programs that have not been deleted.
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Number of successful `compile_program` calls so far.
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    /// Contents of a live buffer.
    pub fn buffer_contents(&self, buffer: HeadlessHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Layout of a live vertex array.
    pub fn vertex_array_state(&self, vertex_array: HeadlessHandle) -> Option<&VertexArrayState> {
        self.vertex_arrays.get(&vertex_array)
    }

    /// Vertex and fragment source a live program was built from.
    pub fn program_sources(&self, program: HeadlessHandle) -> Option<(&str, &str)> {
        self.programs
            .get(&program)
            .map(|(vs, fs)| (vs.as_str(), fs.as_str()))
    }

    /// The program made current by the last `use_program` call.
    pub fn current_program(&self) -> Option<HeadlessHandle> {
        self.current_program
    }

    /// The last value written to `name` on `program`.
    pub fn uniform(&self, program: HeadlessHandle, name: &str) -> Option<Uniform> {
        self.uniforms.get(&(program, name.to_string())).copied()
    }

    /// Texture currently bound to `unit`.
    pub fn texture_unit(&self, unit: u32) -> Option<HeadlessHandle> {
        self.texture_units.get(&unit).copied()
    }

    /// Every draw issued since creation or the last [`take_draw_calls`](Self::take_draw_calls).
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Returns and forgets the recorded draw calls.
    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draws)
    }

    /// Clear colors in the order they were issued.
    pub fn clears(&self) -> &[[f32; 4]] {
        &self.clears
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn pipeline_state(&self) -> Option<PipelineState> {
        self.pipeline
    }
}

/// Returns the 1-based line of the first `#error` directive in `source`.
fn error_directive_line(source: &str) -> Option<usize> {
    source
        .lines()
        .position(|line| line.trim_start().starts_with("#error"))
        .map(|i| i + 1)
}

impl GpuDevice for HeadlessDevice {
    type Buffer = HeadlessHandle;
    type VertexArray = HeadlessHandle;
    type Program = HeadlessHandle;
    type Texture = HeadlessHandle;

    fn create_buffer(&mut self) -> Result<HeadlessHandle, String> {
        let handle = self.next_handle()?;
        self.buffers.insert(handle, Vec::new());
        Ok(handle)
    }

    fn delete_buffer(&mut self, buffer: HeadlessHandle) {
        self.buffers.remove(&buffer);
    }

    fn create_vertex_array(&mut self) -> Result<HeadlessHandle, String> {
        let handle = self.next_handle()?;
        self.vertex_arrays.insert(
            handle,
            VertexArrayState {
                vertex_buffer: None,
                index_buffer: None,
                attributes: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn delete_vertex_array(&mut self, vertex_array: HeadlessHandle) {
        self.vertex_arrays.remove(&vertex_array);
    }

    fn buffer_storage(&mut self, buffer: HeadlessHandle, size: usize, data: Option<&[u8]>) {
        let Some(storage) = self.buffers.get_mut(&buffer) else {
            log::warn!("buffer_storage on unknown buffer {buffer:?}");
            return;
        };
        *storage = vec![0; size];
        if let Some(data) = data {
            let n = data.len().min(size);
            storage[..n].copy_from_slice(&data[..n]);
        }
    }

    fn buffer_sub_data(&mut self, buffer: HeadlessHandle, offset: usize, data: &[u8]) {
        let Some(storage) = self.buffers.get_mut(&buffer) else {
            log::warn!("buffer_sub_data on unknown buffer {buffer:?}");
            return;
        };
        match offset.checked_add(data.len()) {
            Some(end) if end <= storage.len() => storage[offset..end].copy_from_slice(data),
            _ => log::warn!(
                "buffer_sub_data out of range: offset {offset} + {} > {}",
                data.len(),
                storage.len()
            ),
        }
    }

    fn configure_vertex_array(
        &mut self,
        vertex_array: HeadlessHandle,
        vertex_buffer: HeadlessHandle,
        index_buffer: HeadlessHandle,
        attributes: &[VertexAttribute],
    ) {
        let Some(state) = self.vertex_arrays.get_mut(&vertex_array) else {
            log::warn!("configure_vertex_array on unknown vertex array {vertex_array:?}");
            return;
        };
        state.vertex_buffer = Some(vertex_buffer);
        state.index_buffer = Some(index_buffer);
        state.attributes = attributes.to_vec();
    }

    fn draw_indexed_triangles(&mut self, vertex_array: HeadlessHandle, index_count: u32) {
        self.draws.push(DrawCall {
            vertex_array,
            index_count,
            program: self.current_program,
        });
    }

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<HeadlessHandle, ShaderError> {
        for (stage, source) in [("vertex", vertex_src), ("fragment", fragment_src)] {
            if let Some(line) = error_directive_line(source) {
                return Err(ShaderError::Compile {
                    stage: stage.to_string(),
                    log: format_shader_error(
                        source,
                        &format!("ERROR: 0:{line}: '#error' : user-defined error"),
                    ),
                });
            }
        }
        let handle = self.next_handle().map_err(ShaderError::Link)?;
        self.programs
            .insert(handle, (vertex_src.to_string(), fragment_src.to_string()));
        self.compile_count += 1;
        Ok(handle)
    }

    fn delete_program(&mut self, program: HeadlessHandle) {
        self.programs.remove(&program);
        self.uniforms.retain(|(p, _), _| *p != program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: Option<HeadlessHandle>) {
        self.current_program = program;
    }

    fn set_uniform(&mut self, program: HeadlessHandle, name: &str, value: &Uniform) {
        if self.current_program != Some(program) {
            log::warn!("uniform '{name}' set on program {program:?} which is not current");
        }
        self.uniforms.insert((program, name.to_string()), *value);
    }

    fn bind_texture_unit(&mut self, unit: u32, texture: HeadlessHandle) {
        self.texture_units.insert(unit, texture);
    }

    fn is_texture(&self, texture: HeadlessHandle) -> bool {
        self.textures.contains(&texture)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    fn bind_default_framebuffer(&mut self) {}

    fn clear(&mut self, color: [f32; 4]) {
        self.clears.push(color);
    }

    fn apply_pipeline_state(&mut self, state: &PipelineState) {
        self.pipeline = Some(*state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_non_zero() {
        let mut dev = HeadlessDevice::new();
        let a = dev.create_buffer().unwrap();
        let b = dev.create_vertex_array().unwrap();
        let c = dev.create_texture().unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(a.get() > 0);
    }

    #[test]
    fn buffer_storage_then_sub_data_writes_at_offset() {
        let mut dev = HeadlessDevice::new();
        let buf = dev.create_buffer().unwrap();
        dev.buffer_storage(buf, 6, None);
        dev.buffer_sub_data(buf, 2, &[7, 8, 9]);
        assert_eq!(dev.buffer_contents(buf), Some(&[0, 0, 7, 8, 9, 0][..]));
    }

    #[test]
    fn buffer_sub_data_out_of_range_is_ignored() {
        let mut dev = HeadlessDevice::new();
        let buf = dev.create_buffer().unwrap();
        dev.buffer_storage(buf, 2, Some(&[1, 2]));
        dev.buffer_sub_data(buf, 1, &[5, 5]);
        assert_eq!(dev.buffer_contents(buf), Some(&[1, 2][..]));
    }

    #[test]
    fn delete_buffer_drops_contents() {
        let mut dev = HeadlessDevice::new();
        let buf = dev.create_buffer().unwrap();
        assert_eq!(dev.live_buffers(), 1);
        dev.delete_buffer(buf);
        assert_eq!(dev.live_buffers(), 0);
        assert!(dev.buffer_contents(buf).is_none());
    }

    #[test]
    fn compile_fails_on_error_directive() {
        let mut dev = HeadlessDevice::new();
        let err = dev
            .compile_program("void main() {}", "void main() {}\n#error broken\n")
            .unwrap_err();
        match err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(stage, "fragment");
                assert!(log.contains("0:2"), "expected line reference in: {log}");
            }
            other => panic!("expected compile error, got {other:?}"),
        }
        assert_eq!(dev.live_programs(), 0);
    }

    #[test]
    fn compile_succeeds_and_keeps_sources() {
        let mut dev = HeadlessDevice::new();
        let prog = dev.compile_program("vs", "fs").unwrap();
        assert_eq!(dev.program_sources(prog), Some(("vs", "fs")));
        assert_eq!(dev.compile_count(), 1);
    }

    #[test]
    fn delete_current_program_unbinds_it() {
        let mut dev = HeadlessDevice::new();
        let prog = dev.compile_program("vs", "fs").unwrap();
        dev.use_program(Some(prog));
        dev.set_uniform(prog, "t", &Uniform::Float(1.0));
        dev.delete_program(prog);
        assert_eq!(dev.current_program(), None);
        assert_eq!(dev.uniform(prog, "t"), None);
    }

    #[test]
    fn draw_records_current_program() {
        let mut dev = HeadlessDevice::new();
        let vao = dev.create_vertex_array().unwrap();
        let prog = dev.compile_program("vs", "fs").unwrap();
        dev.use_program(Some(prog));
        dev.draw_indexed_triangles(vao, 36);
        assert_eq!(
            dev.draw_calls(),
            &[DrawCall {
                vertex_array: vao,
                index_count: 36,
                program: Some(prog)
            }]
        );
        assert_eq!(dev.take_draw_calls().len(), 1);
        assert!(dev.draw_calls().is_empty());
    }

    #[test]
    fn deleted_texture_is_not_a_texture() {
        let mut dev = HeadlessDevice::new();
        let tex = dev.create_texture().unwrap();
        assert!(dev.is_texture(tex));
        dev.delete_texture(tex);
        assert!(!dev.is_texture(tex));
    }
}

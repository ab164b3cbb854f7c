//! OpenGL device over a `glow::Context`.
//!
//! Buffer uploads go through the `ARRAY_BUFFER` bind point and vertex arrays
//! are configured with the classic bind-then-`vertexAttribPointer` sequence,
//! so the same code runs on desktop GL 3.3+ and WebGL2.

use glow::HasContext;

use super::{GpuDevice, PipelineState, Uniform, VertexAttribute, Viewport};
use crate::shader::{format_shader_error, ShaderError};

fn stage_name(shader_type: u32) -> &'static str {
    match shader_type {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    }
}

/// Compiles one stage. A failure carries the numbered source and the
/// driver's info log.
///
/// # Errors
///
/// Returns `ShaderError::Compile` naming the stage.
#[allow(unsafe_code)]
pub fn compile_shader(
    gl: &glow::Context,
    shader_type: u32,
    source: &str,
) -> Result<glow::Shader, ShaderError> {
    let compile_error = |log: String| ShaderError::Compile {
        stage: stage_name(shader_type).to_string(),
        log,
    };

    // SAFETY: `shader_type` is a stage enum and the context is current.
    unsafe {
        let shader = gl.create_shader(shader_type).map_err(compile_error)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if gl.get_shader_compile_status(shader) {
            return Ok(shader);
        }
        let log = format_shader_error(source, &gl.get_shader_info_log(shader));
        gl.delete_shader(shader);
        Err(compile_error(log))
    }
}

/// Links two compiled stages. The stages are detached afterwards either way;
/// deleting them stays with the caller.
///
/// # Errors
///
/// Returns `ShaderError::Link` with the driver's info log.
#[allow(unsafe_code)]
pub fn link_program(
    gl: &glow::Context,
    vertex: glow::Shader,
    fragment: glow::Shader,
) -> Result<glow::Program, ShaderError> {
    // SAFETY: both stages came from `compile_shader` on this context.
    unsafe {
        let program = gl.create_program().map_err(ShaderError::Link)?;
        for stage in [vertex, fragment] {
            gl.attach_shader(program, stage);
        }
        gl.link_program(program);
        for stage in [vertex, fragment] {
            gl.detach_shader(program, stage);
        }
        if gl.get_program_link_status(program) {
            return Ok(program);
        }
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        Err(ShaderError::Link(log))
    }
}

/// A [`GpuDevice`] issuing real OpenGL calls.
///
/// The wrapped context must be current on the calling thread for the
/// lifetime of the device.
pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    /// Wraps a context that is already current.
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Returns a reference to the underlying `glow::Context`.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Consumes this wrapper and returns the underlying `glow::Context`.
    pub fn into_gl(self) -> glow::Context {
        self.gl
    }
}

fn gl_int(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// SAFETY (whole impl): every call passes handles previously returned by the
// same context, and sizes/offsets derived from slices we own.
#[allow(unsafe_code)]
impl GpuDevice for GlowDevice {
    type Buffer = glow::Buffer;
    type VertexArray = glow::VertexArray;
    type Program = glow::Program;
    type Texture = glow::Texture;

    fn create_buffer(&mut self) -> Result<glow::Buffer, String> {
        unsafe { self.gl.create_buffer() }
    }

    fn delete_buffer(&mut self, buffer: glow::Buffer) {
        unsafe { self.gl.delete_buffer(buffer) }
    }

    fn create_vertex_array(&mut self) -> Result<glow::VertexArray, String> {
        unsafe { self.gl.create_vertex_array() }
    }

    fn delete_vertex_array(&mut self, vertex_array: glow::VertexArray) {
        unsafe { self.gl.delete_vertex_array(vertex_array) }
    }

    fn buffer_storage(&mut self, buffer: glow::Buffer, size: usize, data: Option<&[u8]>) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            match data {
                Some(bytes) if bytes.len() == size => {
                    self.gl
                        .buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::DYNAMIC_DRAW);
                }
                Some(bytes) => {
                    self.gl
                        .buffer_data_size(glow::ARRAY_BUFFER, gl_int(size), glow::DYNAMIC_DRAW);
                    self.gl.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, bytes);
                }
                None => {
                    self.gl
                        .buffer_data_size(glow::ARRAY_BUFFER, gl_int(size), glow::DYNAMIC_DRAW);
                }
            }
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn buffer_sub_data(&mut self, buffer: glow::Buffer, offset: usize, data: &[u8]) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.gl
                .buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, gl_int(offset), data);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn configure_vertex_array(
        &mut self,
        vertex_array: glow::VertexArray,
        vertex_buffer: glow::Buffer,
        index_buffer: glow::Buffer,
        attributes: &[VertexAttribute],
    ) {
        unsafe {
            self.gl.bind_vertex_array(Some(vertex_array));
            // The array buffer must be bound before the attribute pointers.
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            for attr in attributes {
                self.gl.vertex_attrib_pointer_f32(
                    attr.location,
                    attr.components,
                    glow::FLOAT,
                    false,
                    gl_int(attr.stride),
                    gl_int(attr.offset),
                );
                self.gl.enable_vertex_attrib_array(attr.location);
            }
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    fn draw_indexed_triangles(&mut self, vertex_array: glow::VertexArray, index_count: u32) {
        unsafe {
            self.gl.bind_vertex_array(Some(vertex_array));
            self.gl.draw_elements(
                glow::TRIANGLES,
                i32::try_from(index_count).unwrap_or(i32::MAX),
                glow::UNSIGNED_INT,
                0,
            );
            self.gl.bind_vertex_array(None);
        }
    }

    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<glow::Program, ShaderError> {
        let vert = compile_shader(&self.gl, glow::VERTEX_SHADER, vertex_src)?;
        let frag = match compile_shader(&self.gl, glow::FRAGMENT_SHADER, fragment_src) {
            Ok(f) => f,
            Err(e) => {
                unsafe { self.gl.delete_shader(vert) };
                return Err(e);
            }
        };

        let result = link_program(&self.gl, vert, frag);

        unsafe {
            self.gl.delete_shader(vert);
            self.gl.delete_shader(frag);
        }

        result
    }

    fn delete_program(&mut self, program: glow::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&mut self, program: Option<glow::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn set_uniform(&mut self, program: glow::Program, name: &str, value: &Uniform) {
        unsafe {
            let location = self.gl.get_uniform_location(program, name);
            if location.is_none() {
                log::trace!("uniform '{name}' is not active in program {program:?}");
            }
            let loc = location.as_ref();
            match *value {
                Uniform::Int(v) => self.gl.uniform_1_i32(loc, v),
                Uniform::Float(v) => self.gl.uniform_1_f32(loc, v),
                Uniform::Vec2(v) => self.gl.uniform_2_f32(loc, v.x, v.y),
                Uniform::Vec3(v) => self.gl.uniform_3_f32(loc, v.x, v.y, v.z),
                Uniform::Vec4(v) => self.gl.uniform_4_f32(loc, v.x, v.y, v.z, v.w),
                Uniform::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(loc, false, &m.to_cols_array())
                }
            }
        }
    }

    fn bind_texture_unit(&mut self, unit: u32, texture: glow::Texture) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
        }
    }

    fn is_texture(&self, texture: glow::Texture) -> bool {
        unsafe { self.gl.is_texture(texture) }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl
                .viewport(viewport.x, viewport.y, viewport.width, viewport.height)
        }
    }

    fn bind_default_framebuffer(&mut self) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, None) }
    }

    fn clear(&mut self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn apply_pipeline_state(&mut self, state: &PipelineState) {
        unsafe {
            if state.cull_back_faces {
                self.gl.enable(glow::CULL_FACE);
                self.gl.cull_face(glow::BACK);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
            if state.depth_test {
                self.gl.depth_func(glow::LESS);
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // GlowDevice requires a live GL context, so integration tests are ignored.

    #[test]
    fn glow_device_compiles_with_expected_api() {
        fn _assert_api(dev: &GlowDevice) {
            let _gl: &glow::Context = dev.gl();
        }
        fn _assert_device<D: GpuDevice>() {}
        _assert_device::<GlowDevice>();
    }

    #[test]
    #[ignore = "requires GL context"]
    fn compile_program_links_trivial_shaders() {
        // Would test: compile_program with a pass-through vertex and a
        // constant-color fragment shader returns Ok.
    }

    #[test]
    #[ignore = "requires GL context"]
    fn buffer_roundtrip_through_get_buffer_sub_data() {
        // Would test: buffer_storage + buffer_sub_data contents are readable
        // back with get_buffer_sub_data.
    }
}

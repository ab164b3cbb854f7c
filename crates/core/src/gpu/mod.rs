//! The GPU device seam.
//!
//! Everything the rasterizer asks of the graphics API goes through
//! [`GpuDevice`]. Handles are opaque associated types so the allocator can
//! store them in slot tables without knowing what backs them.
//!
//! # Module overview
//!
//! - [`headless`] -- In-memory device that records commands. Used by tests
//!   and by frame simulation without a window.
//! - `gl` -- OpenGL device over a `glow::Context` (feature `gl`).

use std::fmt;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::shader::ShaderError;

#[cfg(feature = "gl")]
pub mod gl;
pub mod headless;

#[cfg(feature = "gl")]
pub use gl::GlowDevice;
pub use headless::{DrawCall, HeadlessDevice, HeadlessHandle};

/// A value that can be written to a shader uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl From<i32> for Uniform {
    fn from(v: i32) -> Self {
        Uniform::Int(v)
    }
}

impl From<bool> for Uniform {
    fn from(v: bool) -> Self {
        Uniform::Int(i32::from(v))
    }
}

impl From<f32> for Uniform {
    fn from(v: f32) -> Self {
        Uniform::Float(v)
    }
}

impl From<Vec2> for Uniform {
    fn from(v: Vec2) -> Self {
        Uniform::Vec2(v)
    }
}

impl From<Vec3> for Uniform {
    fn from(v: Vec3) -> Self {
        Uniform::Vec3(v)
    }
}

impl From<Vec4> for Uniform {
    fn from(v: Vec4) -> Self {
        Uniform::Vec4(v)
    }
}

impl From<Mat4> for Uniform {
    fn from(v: Mat4) -> Self {
        Uniform::Mat4(v)
    }
}

/// One float vertex attribute read from a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader `location` this attribute feeds.
    pub location: u32,
    /// Number of f32 components (2 or 3).
    pub components: i32,
    /// Byte offset of the attribute's block inside the vertex buffer.
    pub offset: usize,
    /// Byte distance between consecutive elements.
    pub stride: usize,
}

/// Rectangle of the framebuffer that draw calls cover, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    /// A viewport anchored at the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: i32::try_from(width).unwrap_or(i32::MAX),
            height: i32::try_from(height).unwrap_or(i32::MAX),
        }
    }
}

/// Fixed-function state applied once after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    /// Cull faces pointing away from the camera.
    pub cull_back_faces: bool,
    /// Enable the z-buffer with a `LESS` comparison.
    pub depth_test: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            cull_back_faces: true,
            depth_test: true,
        }
    }
}

/// The operations the rasterizer core needs from a graphics API.
///
/// Object creation is fallible and returns the driver's message. Every
/// other call mirrors a GL entry point that reports errors through the
/// driver's own error state rather than a return value.
pub trait GpuDevice {
    type Buffer: Copy + Eq + fmt::Debug;
    type VertexArray: Copy + Eq + fmt::Debug;
    type Program: Copy + Eq + fmt::Debug;
    type Texture: Copy + Eq + fmt::Debug;

    fn create_buffer(&mut self) -> Result<Self::Buffer, String>;
    fn delete_buffer(&mut self, buffer: Self::Buffer);
    fn create_vertex_array(&mut self) -> Result<Self::VertexArray, String>;
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);

    /// Allocates `size` bytes for `buffer`, initialized from `data` when given.
    fn buffer_storage(&mut self, buffer: Self::Buffer, size: usize, data: Option<&[u8]>);

    /// Overwrites `data.len()` bytes of `buffer` starting at `offset`.
    fn buffer_sub_data(&mut self, buffer: Self::Buffer, offset: usize, data: &[u8]);

    /// Records how `vertex_array` reads `vertex_buffer` and binds
    /// `index_buffer` as its element source.
    fn configure_vertex_array(
        &mut self,
        vertex_array: Self::VertexArray,
        vertex_buffer: Self::Buffer,
        index_buffer: Self::Buffer,
        attributes: &[VertexAttribute],
    );

    /// Issues an indexed triangle-list draw of `index_count` u32 indices.
    fn draw_indexed_triangles(&mut self, vertex_array: Self::VertexArray, index_count: u32);

    /// Compiles both stages and links them into a program.
    fn compile_program(
        &mut self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Self::Program, ShaderError>;
    fn delete_program(&mut self, program: Self::Program);

    /// Makes `program` current, or unbinds when `None`.
    fn use_program(&mut self, program: Option<Self::Program>);

    /// Writes a uniform of `program`. The program must be current.
    fn set_uniform(&mut self, program: Self::Program, name: &str, value: &Uniform);

    fn bind_texture_unit(&mut self, unit: u32, texture: Self::Texture);
    fn is_texture(&self, texture: Self::Texture) -> bool;

    fn set_viewport(&mut self, viewport: Viewport);
    fn bind_default_framebuffer(&mut self);

    /// Clears color and depth.
    fn clear(&mut self, color: [f32; 4]);

    fn apply_pipeline_state(&mut self, state: &PipelineState);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_conversions_pick_matching_variant() {
        assert_eq!(Uniform::from(3), Uniform::Int(3));
        assert_eq!(Uniform::from(true), Uniform::Int(1));
        assert_eq!(Uniform::from(0.5_f32), Uniform::Float(0.5));
        assert_eq!(Uniform::from(Vec3::X), Uniform::Vec3(Vec3::X));
        assert_eq!(
            Uniform::from(Mat4::IDENTITY),
            Uniform::Mat4(Mat4::IDENTITY)
        );
    }

    #[test]
    fn viewport_sized_starts_at_origin() {
        let vp = Viewport::sized(800, 600);
        assert_eq!((vp.x, vp.y, vp.width, vp.height), (0, 0, 800, 600));
    }

    #[test]
    fn viewport_sized_saturates_huge_dimensions() {
        let vp = Viewport::sized(u32::MAX, 1);
        assert_eq!(vp.width, i32::MAX);
    }

    #[test]
    fn default_pipeline_state_culls_and_depth_tests() {
        let state = PipelineState::default();
        assert!(state.cull_back_faces);
        assert!(state.depth_test);
    }
}

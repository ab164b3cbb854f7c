//! Triangle meshes and their GPU binding.
//!
//! A [`Mesh`] holds CPU-side vertex data. After upload through
//! [`Rasterizer::init_gpu_data`](crate::rasterizer::Rasterizer::init_gpu_data)
//! it also carries a [`GpuBinding`]: the slot indices of its index buffer,
//! vertex buffer and vertex array. The mesh never holds raw GPU handles.
//!
//! Vertex data is laid out block by block in a single buffer: every
//! position first, then every normal, then every UV.

pub mod generator;

use glam::{UVec3, Vec2, Vec3};

use crate::gpu::VertexAttribute;

pub use generator::MeshGenerator;

/// Byte sizes of the vertex-buffer blocks of one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexLayout {
    pub position_bytes: usize,
    pub normal_bytes: usize,
    pub uv_bytes: usize,
}

impl VertexLayout {
    pub const POSITION_LOCATION: u32 = 0;
    pub const NORMAL_LOCATION: u32 = 1;
    pub const UV_LOCATION: u32 = 2;

    pub fn compute(position_bytes: usize, normal_bytes: usize, uv_bytes: usize) -> Self {
        Self {
            position_bytes,
            normal_bytes,
            uv_bytes,
        }
    }

    /// Size of the whole vertex buffer.
    pub fn total_bytes(&self) -> usize {
        self.position_bytes + self.normal_bytes + self.uv_bytes
    }

    pub fn normal_offset(&self) -> usize {
        self.position_bytes
    }

    pub fn uv_offset(&self) -> usize {
        self.position_bytes + self.normal_bytes
    }

    pub fn has_uvs(&self) -> bool {
        self.uv_bytes > 0
    }

    /// Attribute pointers for this layout: position at location 0, normal
    /// at 1, and UV at 2 when the mesh has UVs.
    pub fn attributes(&self) -> Vec<VertexAttribute> {
        let vec3_stride = std::mem::size_of::<Vec3>();
        let mut attributes = vec![
            VertexAttribute {
                location: Self::POSITION_LOCATION,
                components: 3,
                offset: 0,
                stride: vec3_stride,
            },
            VertexAttribute {
                location: Self::NORMAL_LOCATION,
                components: 3,
                offset: self.normal_offset(),
                stride: vec3_stride,
            },
        ];
        if self.has_uvs() {
            attributes.push(VertexAttribute {
                location: Self::UV_LOCATION,
                components: 2,
                offset: self.uv_offset(),
                stride: std::mem::size_of::<Vec2>(),
            });
        }
        attributes
    }
}

/// Slot indices into the rasterizer's tables, recorded on upload.
///
/// `generation` is the rasterizer's table generation at upload time. A
/// binding from an earlier generation names slots that may since belong to
/// another object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuBinding {
    pub index_buffer: usize,
    pub vertex_buffer: usize,
    pub vertex_array: usize,
    pub layout: VertexLayout,
    pub generation: u64,
}

/// An indexed triangle mesh.
#[derive(Debug, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<UVec3>,
    binding: Option<GpuBinding>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<UVec3>) -> Self {
        Self {
            positions,
            normals,
            indices,
            binding: None,
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Triangles as vertex index triples.
    pub fn indices(&self) -> &[UVec3] {
        &self.indices
    }

    pub fn set_positions(&mut self, positions: Vec<Vec3>) {
        self.positions = positions;
    }

    pub fn set_normals(&mut self, normals: Vec<Vec3>) {
        self.normals = normals;
    }

    pub fn set_indices(&mut self, indices: Vec<UVec3>) {
        self.indices = indices;
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of u32 indices an indexed draw of this mesh consumes.
    pub fn index_count(&self) -> u32 {
        u32::try_from(self.indices.len() * 3).unwrap_or(u32::MAX)
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Slot indices recorded by the last upload, if any.
    pub fn binding(&self) -> Option<&GpuBinding> {
        self.binding.as_ref()
    }

    pub fn is_uploaded(&self) -> bool {
        self.binding.is_some()
    }

    pub(crate) fn set_binding(&mut self, binding: GpuBinding) {
        self.binding = Some(binding);
    }

    pub(crate) fn take_binding(&mut self) -> Option<GpuBinding> {
        self.binding.take()
    }
}

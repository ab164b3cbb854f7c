//! Procedural meshes.
//!
//! Coordinates are right-handed: +Y up, +X right, +Z toward the viewer.
//! Every generator emits counter-clockwise triangles when viewed from the
//! side its normals point to, so back-face culling keeps the outer faces.

use std::f32::consts::{PI, TAU};

use glam::{Quat, UVec3, Vec2, Vec3};

use super::Mesh;

/// Builds simple shapes without touching the filesystem.
pub struct MeshGenerator;

impl MeshGenerator {
    /// UV sphere of `radius` centered at the origin.
    ///
    /// `horizontal` is the number of segments around the Y axis and
    /// `vertical` the number of rings from pole to pole. The seam column is
    /// duplicated so UVs can wrap, giving `(horizontal + 1) * (vertical + 1)`
    /// vertices.
    pub fn sphere(horizontal: usize, vertical: usize, radius: f32) -> Mesh {
        let horizontal = horizontal.max(3);
        let vertical = vertical.max(2);
        let dv = PI / vertical as f32;
        let dh = TAU / horizontal as f32;
        let columns = horizontal + 1;

        let mut positions = Vec::with_capacity(columns * (vertical + 1));
        let mut normals = Vec::with_capacity(positions.capacity());
        let mut indices = Vec::with_capacity(horizontal * vertical * 2);

        for i in 0..=vertical {
            let v_angle = dv * i as f32;
            let y = v_angle.cos();
            let xz = v_angle.sin();
            for j in 0..=horizontal {
                let h_angle = dh * j as f32;
                let normal = Vec3::new(xz * h_angle.cos(), y, xz * h_angle.sin());
                normals.push(normal);
                positions.push(normal * radius);

                if i == vertical || j == horizontal {
                    continue;
                }
                // k3 -- k1
                // k4 -- k2
                let k1 = index(i * columns + j);
                let k2 = index(i * columns + j + 1);
                let k3 = index((i + 1) * columns + j);
                let k4 = index((i + 1) * columns + j + 1);
                indices.push(UVec3::new(k1, k4, k3));
                indices.push(UVec3::new(k1, k2, k4));
            }
        }

        Mesh::new(positions, normals, indices)
    }

    /// Texture coordinates matching [`MeshGenerator::sphere`] vertex order.
    pub fn sphere_uv(horizontal: usize, vertical: usize) -> Vec<Vec2> {
        let horizontal = horizontal.max(3);
        let vertical = vertical.max(2);
        let mut uv = Vec::with_capacity((horizontal + 1) * (vertical + 1));
        for i in 0..=vertical {
            for j in 0..=horizontal {
                uv.push(Vec2::new(
                    1.0 - j as f32 / horizontal as f32,
                    1.0 - i as f32 / vertical as f32,
                ));
            }
        }
        uv
    }

    /// Two-triangle rectangle of `width` x `height` around `center`, facing
    /// `normal`.
    ///
    /// The rectangle is built in the XY plane and rotated from +Z onto
    /// `normal` unless the two are parallel. Vertex order is top-left,
    /// top-right, bottom-left, bottom-right.
    pub fn plane(width: f32, height: f32, center: Vec3, normal: Vec3) -> Mesh {
        let n = normal.try_normalize().unwrap_or(Vec3::Z);
        let hw = width * 0.5;
        let hh = height * 0.5;
        let mut corners = [
            Vec3::new(-hw, hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
        ];
        if n != Vec3::Z && n != Vec3::NEG_Z {
            let rotation = Quat::from_rotation_arc(Vec3::Z, n);
            for corner in &mut corners {
                *corner = rotation * *corner;
            }
        }
        let [tl, tr, bl, br] = corners.map(|c| c + center);

        // Pick the winding that is counter-clockwise around `n`.
        let facing = (bl - tl).cross(tr - tl).dot(n);
        let indices = if facing >= 0.0 {
            vec![UVec3::new(0, 2, 1), UVec3::new(1, 2, 3)]
        } else {
            vec![UVec3::new(0, 1, 2), UVec3::new(1, 3, 2)]
        };

        Mesh::new(vec![tl, tr, bl, br], vec![n; 4], indices)
    }

    /// Texture coordinates matching [`MeshGenerator::plane`] vertex order.
    pub fn plane_uv() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
        ]
    }

    /// Axis-aligned cube with edge `length` centered at the origin.
    ///
    /// Each corner is emitted once per adjacent face so every face gets a
    /// flat normal: 24 vertices, 12 triangles.
    pub fn cube(length: f32) -> Mesh {
        let h = length / 2.0;
        // Each face lists its corners v1..v4 counter-clockwise seen from
        // outside, followed by the face normal.
        let faces: [([Vec3; 4], Vec3); 6] = [
            (
                [
                    Vec3::new(h, h, h),
                    Vec3::new(h, -h, h),
                    Vec3::new(h, -h, -h),
                    Vec3::new(h, h, -h),
                ],
                Vec3::X,
            ),
            (
                [
                    Vec3::new(-h, h, -h),
                    Vec3::new(-h, -h, -h),
                    Vec3::new(-h, -h, h),
                    Vec3::new(-h, h, h),
                ],
                Vec3::NEG_X,
            ),
            (
                [
                    Vec3::new(-h, h, -h),
                    Vec3::new(-h, h, h),
                    Vec3::new(h, h, h),
                    Vec3::new(h, h, -h),
                ],
                Vec3::Y,
            ),
            (
                [
                    Vec3::new(-h, -h, h),
                    Vec3::new(-h, -h, -h),
                    Vec3::new(h, -h, -h),
                    Vec3::new(h, -h, h),
                ],
                Vec3::NEG_Y,
            ),
            (
                [
                    Vec3::new(-h, h, h),
                    Vec3::new(-h, -h, h),
                    Vec3::new(h, -h, h),
                    Vec3::new(h, h, h),
                ],
                Vec3::Z,
            ),
            (
                [
                    Vec3::new(h, h, -h),
                    Vec3::new(h, -h, -h),
                    Vec3::new(-h, -h, -h),
                    Vec3::new(-h, h, -h),
                ],
                Vec3::NEG_Z,
            ),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(12);
        for (corners, normal) in faces {
            let base = index(positions.len());
            positions.extend_from_slice(&corners);
            normals.extend_from_slice(&[normal; 4]);
            // v4-v1-v2, v4-v2-v3
            indices.push(UVec3::new(base + 3, base, base + 1));
            indices.push(UVec3::new(base + 3, base + 1, base + 2));
        }

        Mesh::new(positions, normals, indices)
    }
}

fn index(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

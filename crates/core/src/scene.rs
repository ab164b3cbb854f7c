//! The scene data render methods read each frame.
//!
//! These are plain data types: the rasterizer never mutates a scene while
//! rendering it. `T` is the device's texture handle type, so a material can
//! reference an albedo texture without owning it.

use glam::{Mat4, Quat, Vec2, Vec3};

use crate::mesh::Mesh;

/// Placement of an object or light in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Model matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Phong surface description.
#[derive(Debug, Clone, PartialEq)]
pub struct Material<T> {
    /// Flat color used when no albedo texture is bound.
    pub color: Vec3,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
    /// Per-vertex texture coordinates, uploaded after normals.
    pub uvs: Vec<Vec2>,
    pub albedo: Option<T>,
}

impl<T> Default for Material<T> {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            ambient: 0.1,
            diffuse: 0.8,
            specular: 0.5,
            shininess: 32.0,
            uvs: Vec::new(),
            albedo: None,
        }
    }
}

impl<T> Material<T> {
    pub fn with_color(color: Vec3) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    /// The UV block as raw bytes, in vertex order.
    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }
}

impl<T: Copy> Material<T> {
    /// The albedo texture, if the material has both a texture and UVs to
    /// sample it with.
    pub fn sampled_albedo(&self) -> Option<T> {
        self.albedo.filter(|_| self.has_uvs())
    }
}

/// A named renderable.
#[derive(Debug)]
pub struct SceneObject<T> {
    pub name: String,
    pub transform: Transform,
    pub mesh: Mesh,
    pub material: Option<Material<T>>,
}

impl<T> SceneObject<T> {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            mesh,
            material: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material: Material<T>) -> Self {
        self.material = Some(material);
        self
    }
}

/// Light-type specific parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Omnidirectional light; `attenuation` holds the constant, linear and
    /// quadratic terms.
    Point { attenuation: Vec3 },
    /// Parallel light travelling along `direction`.
    Direct { direction: Vec3 },
}

impl LightKind {
    /// Value of the `type` field in the shader's light struct.
    pub fn shader_index(&self) -> i32 {
        match self {
            LightKind::Point { .. } => 0,
            LightKind::Direct { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Whether this light contributes to the shadow pre-pass.
    pub casts_shadow: bool,
}

impl Light {
    pub fn point(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point {
                attenuation: Vec3::new(1.0, 0.09, 0.032),
            },
            position,
            color,
            intensity,
            casts_shadow: false,
        }
    }

    pub fn direct(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Direct { direction },
            position: Vec3::ZERO,
            color,
            intensity,
            casts_shadow: false,
        }
    }
}

/// View and projection matrices of the active camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    /// Right-handed perspective camera at `eye` looking at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32) -> Self {
        Self {
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
            projection: Mat4::perspective_rh_gl(fov_y, aspect, 0.1, 100.0),
        }
    }
}

/// Everything a render method reads for one frame.
#[derive(Debug)]
pub struct Scene<T> {
    /// Name of the technique to render with. Empty means "render nothing".
    pub render_method: String,
    pub objects: Vec<SceneObject<T>>,
    pub lights: Vec<Light>,
    pub ambient: Vec3,
    pub camera: Camera,
}

impl<T> Default for Scene<T> {
    fn default() -> Self {
        Self {
            render_method: String::new(),
            objects: Vec::new(),
            lights: Vec::new(),
            ambient: Vec3::splat(0.1),
            camera: Camera::default(),
        }
    }
}

impl<T> Scene<T> {
    pub fn new(render_method: impl Into<String>) -> Self {
        Self {
            render_method: render_method.into(),
            ..Self::default()
        }
    }

    /// First object named `name`.
    pub fn object(&self, name: &str) -> Option<&SceneObject<T>> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject<T>> {
        self.objects.iter_mut().find(|o| o.name == name)
    }
}

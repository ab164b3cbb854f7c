//! The scene `raster simulate` renders.

use glam::{Quat, Vec3};
use raster_core::gpu::GpuDevice;
use raster_core::{
    Camera, Light, Material, MeshGenerator, RasterError, Rasterizer, Scene, SceneObject, Transform,
};
use raster_techniques::methods::SCREEN_QUAD_OBJECT;

/// Builds a small lit scene and uploads every mesh through `raster`.
///
/// A sphere and a cube stand on a floor plane, lit by one point light and
/// one shadow-casting sun. A full-screen quad is included so every built-in
/// technique has something to draw.
///
/// # Errors
///
/// Returns the first upload failure.
pub fn build_scene<D: GpuDevice>(
    raster: &mut Rasterizer<D>,
    technique: &str,
) -> Result<Scene<D::Texture>, RasterError> {
    let aspect = raster.config().viewport.aspect();
    let mut scene = Scene::new(technique);
    scene.camera = Camera::look_at(Vec3::new(0.0, 2.5, 6.0), Vec3::ZERO, 45f32.to_radians(), aspect);
    scene.ambient = Vec3::splat(0.15);
    scene
        .lights
        .push(Light::point(Vec3::new(-2.0, 3.0, 2.0), Vec3::ONE, 1.5));
    scene.lights.push(Light {
        casts_shadow: true,
        ..Light::direct(Vec3::new(-0.3, -1.0, -0.2), Vec3::new(1.0, 0.95, 0.85), 0.8)
    });

    let objects = [
        SceneObject::new("sphere", MeshGenerator::sphere(32, 16, 1.0))
            .with_transform(Transform::from_position(Vec3::new(-1.25, 1.0, 0.0)))
            .with_material(Material {
                uvs: MeshGenerator::sphere_uv(32, 16),
                ..Material::with_color(Vec3::new(0.85, 0.3, 0.25))
            }),
        SceneObject::new("cube", MeshGenerator::cube(1.5))
            .with_transform(Transform {
                position: Vec3::new(1.5, 0.75, 0.0),
                rotation: Quat::from_rotation_y(0.6),
                scale: Vec3::ONE,
            })
            .with_material(Material::with_color(Vec3::new(0.3, 0.55, 0.85))),
        SceneObject::new(
            "floor",
            MeshGenerator::plane(10.0, 10.0, Vec3::ZERO, Vec3::Y),
        )
        .with_material(Material {
            specular: 0.1,
            uvs: MeshGenerator::plane_uv(),
            ..Material::with_color(Vec3::splat(0.7))
        }),
        SceneObject::new(
            SCREEN_QUAD_OBJECT,
            MeshGenerator::plane(2.0, 2.0, Vec3::ZERO, Vec3::Z),
        )
        .with_material(Material {
            uvs: MeshGenerator::plane_uv(),
            ..Material::default()
        }),
    ];

    for mut object in objects {
        raster.init_gpu_data(&mut object)?;
        scene.objects.push(object);
    }
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_core::gpu::HeadlessDevice;
    use raster_core::{EngineConfig, FrameOutcome, NoShadows};
    use raster_techniques::{default_table, Technique};
    use std::path::PathBuf;

    fn shipped_shaders() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shaders")
    }

    fn raster() -> Rasterizer<HeadlessDevice> {
        let config = EngineConfig {
            shader_root: shipped_shaders(),
            ..EngineConfig::default()
        };
        let mut raster = Rasterizer::new(HeadlessDevice::new(), config, default_table);
        raster.init();
        raster
    }

    #[test]
    fn scene_uploads_every_object() {
        let mut r = raster();
        let scene = build_scene(&mut r, "RenderPhong").unwrap();
        assert_eq!(scene.objects.len(), 4);
        assert!(scene.objects.iter().all(|o| o.mesh.is_uploaded()));
        assert_eq!(r.live_buffers(), 8);
        assert_eq!(r.live_vertex_arrays(), 4);
    }

    #[test]
    fn every_technique_renders_with_shipped_shaders() {
        for technique in Technique::ALL {
            let mut r = raster();
            let scene = build_scene(&mut r, technique.name()).unwrap();
            let outcome = r.render(&scene, &mut NoShadows, 1.0 / 60.0);
            let expected = match technique {
                Technique::NoRender => 0,
                Technique::RenderScreenQuad => 1,
                _ => scene.objects.len(),
            };
            assert_eq!(
                outcome,
                FrameOutcome::Rendered {
                    technique: technique.name().into(),
                    draw_calls: expected
                },
                "{}",
                technique.name()
            );
            if let Some(shader) = technique.shader() {
                assert_eq!(r.shaders().active_shader(), Some(shader));
            }
        }
    }

    #[test]
    fn default_shader_root_holds_every_technique_program() {
        let workspace = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
        let root = workspace.join(EngineConfig::default().shader_root);
        for shader in Technique::ALL.iter().filter_map(|t| t.shader()) {
            assert!(root.join(format!("{shader}.vs")).is_file(), "{shader}.vs");
            assert!(root.join(format!("{shader}.fs")).is_file(), "{shader}.fs");
        }
    }

    #[test]
    fn shipped_lit_shaders_are_generated() {
        for program in ["Phong/phong.fs", "SonarLight/sonarLight.fs"] {
            let source = std::fs::read_to_string(shipped_shaders().join(program)).unwrap();
            assert!(!source.contains(raster_core::shader::IMPORT_TAG), "{program}");
            assert!(source.contains("struct Light"), "{program}");
        }
    }
}

//! Uniform blocks shared by the lit techniques.
//!
//! The lit shaders declare an array of light structs and a Phong material
//! struct; these helpers fill them in through the active program.

use glam::Vec3;
use raster_core::gpu::GpuDevice;
use raster_core::scene::{Camera, Light, LightKind, Material};
use raster_core::Frame;

/// Writes `viewMat` and `projectMat`.
pub fn set_camera<D: GpuDevice>(frame: &mut Frame<'_, D>, camera: &Camera) {
    frame.set("viewMat", camera.view);
    frame.set("projectMat", camera.projection);
}

/// Writes `ambientLight`, `activeLightNum` and one `lights[i]` struct per
/// light.
///
/// Directional lights upload the negated direction: the shader expects the
/// direction from the fragment toward the light.
pub fn set_lights<D: GpuDevice>(frame: &mut Frame<'_, D>, ambient: Vec3, lights: &[Light]) {
    frame.set("ambientLight", ambient);
    frame.set(
        "activeLightNum",
        i32::try_from(lights.len()).unwrap_or(i32::MAX),
    );
    for (i, light) in lights.iter().enumerate() {
        frame.set(&format!("lights[{i}].type"), light.kind.shader_index());
        frame.set(&format!("lights[{i}].color"), light.color);
        frame.set(&format!("lights[{i}].pos"), light.position);
        frame.set(&format!("lights[{i}].intensity"), light.intensity);
        match light.kind {
            LightKind::Point { attenuation } => {
                frame.set(&format!("lights[{i}].attenuation"), attenuation);
            }
            LightKind::Direct { direction } => {
                frame.set(&format!("lights[{i}].dir"), -direction);
            }
        }
    }
}

/// Writes `lights[i].renderShadow` for every light: set only when a shadow
/// pass ran this frame and the light casts shadows.
pub fn set_shadow_flags<D: GpuDevice>(frame: &mut Frame<'_, D>, lights: &[Light], shadows_rendered: bool) {
    for (i, light) in lights.iter().enumerate() {
        frame.set(
            &format!("lights[{i}].renderShadow"),
            shadows_rendered && light.casts_shadow,
        );
    }
}

/// Writes the `material` struct and binds the albedo texture, if any, to
/// `*next_unit`, advancing it.
pub fn set_phong_material<D: GpuDevice>(
    frame: &mut Frame<'_, D>,
    material: &Material<D::Texture>,
    next_unit: &mut u32,
) {
    frame.set("material.ka", material.ambient);
    frame.set("material.kd", material.diffuse);
    frame.set("material.ks", material.specular);
    frame.set("material.shiness", material.shininess);
    match material.sampled_albedo() {
        Some(texture) => {
            frame.set("albedoTex", i32::try_from(*next_unit).unwrap_or(0));
            frame.bind_texture(*next_unit, texture);
            *next_unit += 1;
            frame.set("useAlbedoTex", true);
        }
        None => {
            frame.set("useAlbedoTex", false);
            frame.set("material.color", material.color);
        }
    }
}

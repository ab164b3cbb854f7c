//! The built-in render methods.
//!
//! Each function draws one whole frame through the [`Frame`] it receives.
//! A method whose shader cannot be built returns early: the failure is
//! already logged by the shader manager and the frame stays blank.

use glam::Vec3;
use raster_core::gpu::GpuDevice;
use raster_core::scene::Material;
use raster_core::Frame;

use crate::uniforms::{set_camera, set_lights, set_phong_material, set_shadow_flags};

pub const SIMPLE_SHADER: &str = "Simple/simple";
pub const PHONG_SHADER: &str = "Phong/phong";
pub const SCREEN_QUAD_SHADER: &str = "ScreenQuad/screenQuad";
pub const SONAR_LIGHT_SHADER: &str = "SonarLight/sonarLight";

/// Name of the object [`render_screen_quad`] draws.
pub const SCREEN_QUAD_OBJECT: &str = "screen_quad";

const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Draws nothing.
pub fn no_render<D: GpuDevice>(_frame: &mut Frame<'_, D>) {}

/// Unlit: each object in its material color or albedo texture.
pub fn render_simple<D: GpuDevice>(frame: &mut Frame<'_, D>) {
    let clear_color = frame.config().clear_color;
    frame.clear(clear_color);
    if !frame.use_shader(SIMPLE_SHADER) {
        return;
    }
    let scene = frame.scene();
    set_camera(frame, &scene.camera);

    for object in &scene.objects {
        frame.set("modelMat", object.transform.matrix());
        match &object.material {
            Some(material) => match material.sampled_albedo() {
                Some(texture) => {
                    frame.bind_texture(0, texture);
                    frame.set("useAlbedoTex", true);
                }
                None => {
                    frame.set("useAlbedoTex", false);
                    frame.set("albedoColor", material.color);
                }
            },
            None => frame.set("useAlbedoTex", false),
        }
        frame.draw(object);
    }
}

/// Phong lighting with optional shadows from the shadow pre-pass.
pub fn render_phong<D: GpuDevice>(frame: &mut Frame<'_, D>) {
    frame.reset_viewport();
    frame.bind_default_framebuffer();
    let clear_color = frame.config().clear_color;
    frame.clear(clear_color);
    if !frame.use_shader(PHONG_SHADER) {
        return;
    }
    let scene = frame.scene();
    set_camera(frame, &scene.camera);
    set_lights(frame, scene.ambient, &scene.lights);

    let shadows = frame.shadow_needed();
    set_shadow_flags(frame, &scene.lights, shadows);

    // Texture units start at 0 for every program; the shadow technique
    // claims its units first.
    let mut unit = 0;
    if shadows {
        frame.bind_light_ratio(&mut unit);
    }

    let fallback = Material::default();
    for object in &scene.objects {
        frame.set("modelMat", object.transform.matrix());
        let material = object.material.as_ref().unwrap_or(&fallback);
        set_phong_material(frame, material, &mut unit);
        frame.draw(object);
    }
}

/// Draws the object named `screen_quad`, textured with its albedo map when
/// that is a live texture.
pub fn render_screen_quad<D: GpuDevice>(frame: &mut Frame<'_, D>) {
    frame.clear(BLACK);
    frame.bind_default_framebuffer();
    if !frame.use_shader(SCREEN_QUAD_SHADER) {
        return;
    }
    let Some(quad) = frame.scene().object(SCREEN_QUAD_OBJECT) else {
        log::warn!("scene has no '{SCREEN_QUAD_OBJECT}' object");
        return;
    };

    let texture = quad
        .material
        .as_ref()
        .and_then(Material::sampled_albedo)
        .filter(|&texture| frame.is_texture(texture));
    match texture {
        Some(texture) => {
            frame.set("useAlbedoTex", true);
            frame.bind_texture(0, texture);
            frame.set("albedoTex", 0);
        }
        None => {
            let color = quad.material.as_ref().map_or(Vec3::ONE, |m| m.color);
            frame.set("useAlbedoTex", false);
            frame.set("albedoColor", color);
        }
    }
    frame.draw(quad);
    frame.reset_viewport();
}

/// Lights only the band of a spherical wave travelling out from each light.
///
/// The band is `wave_width` thick and its radius advances by
/// `wave_speed * delta` every frame, wrapping at `wave_interval`.
pub fn render_sonar_light<D: GpuDevice>(frame: &mut Frame<'_, D>) {
    frame.bind_default_framebuffer();
    frame.clear(BLACK);
    if !frame.use_shader(SONAR_LIGHT_SHADER) {
        return;
    }
    let scene = frame.scene();
    set_camera(frame, &scene.camera);

    let sonar = frame.config().sonar;
    let delta = frame.delta();
    let offset = frame.state_mut().advance_wave(&sonar, delta);
    frame.set("waveMaxDepth", sonar.max_depth);
    frame.set("waveWidth", sonar.wave_width);
    frame.set("waveInterval", sonar.wave_interval);
    frame.set("waveMoveOffset", offset);

    set_lights(frame, scene.ambient, &scene.lights);

    let mut unit = 0;
    let fallback = Material::default();
    for object in &scene.objects {
        frame.set("modelMat", object.transform.matrix());
        let material = object.material.as_ref().unwrap_or(&fallback);
        set_phong_material(frame, material, &mut unit);
        frame.draw(object);
    }
}

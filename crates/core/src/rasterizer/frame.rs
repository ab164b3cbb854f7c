//! Per-frame context handed to render methods.
//!
//! A [`Frame`] bundles the rasterizer, the scene being drawn, the shadow
//! subsystem and the elapsed time. Render methods receive everything through
//! it instead of reaching for shared engine state.

use super::Rasterizer;
use crate::config::{EngineConfig, SonarConfig};
use crate::gpu::{GpuDevice, Uniform, Viewport};
use crate::scene::{Scene, SceneObject};

/// Shadow subsystem seam.
///
/// Before a technique runs, the rasterizer asks [`ShadowPass::is_needed`]
/// and, if so, runs [`ShadowPass::render`]. Lit techniques then call
/// [`ShadowPass::bind_light_ratio`] to let the shadow technique feed its
/// own uniforms and textures to the active program.
pub trait ShadowPass<D: GpuDevice> {
    fn is_needed(&self) -> bool;

    /// Renders shadow maps for `scene`.
    fn render(&mut self, raster: &mut Rasterizer<D>, scene: &Scene<D::Texture>);

    /// Binds the light-ratio inputs to `program`, starting at texture unit
    /// `*next_unit` and advancing it past every unit used.
    fn bind_light_ratio(&mut self, device: &mut D, program: D::Program, next_unit: &mut u32);
}

/// A shadow subsystem that never renders anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShadows;

impl<D: GpuDevice> ShadowPass<D> for NoShadows {
    fn is_needed(&self) -> bool {
        false
    }

    fn render(&mut self, _raster: &mut Rasterizer<D>, _scene: &Scene<D::Texture>) {}

    fn bind_light_ratio(&mut self, _device: &mut D, _program: D::Program, _next_unit: &mut u32) {}
}

/// State that techniques carry from one frame to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TechniqueState {
    /// Distance the sonar wave front has travelled inside the current interval.
    pub wave_offset: f32,
}

impl TechniqueState {
    /// Moves the sonar wave forward by `delta` seconds and returns the new
    /// offset. The offset wraps to zero once it reaches `wave_interval`.
    pub fn advance_wave(&mut self, sonar: &SonarConfig, delta: f32) -> f32 {
        self.wave_offset += sonar.wave_speed * delta;
        if self.wave_offset >= sonar.wave_interval {
            self.wave_offset = 0.0;
        }
        self.wave_offset
    }
}

/// Result of one [`Rasterizer::render`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The scene names no technique.
    Idle,
    /// The technique ran and issued `draw_calls` draws.
    Rendered {
        technique: String,
        draw_calls: usize,
    },
    /// No technique is registered under this name; nothing was drawn.
    MissingTechnique(String),
}

/// Everything a render method can touch while drawing one frame.
pub struct Frame<'a, D: GpuDevice> {
    raster: &'a mut Rasterizer<D>,
    scene: &'a Scene<D::Texture>,
    shadow: &'a mut dyn ShadowPass<D>,
    delta: f32,
}

impl<'a, D: GpuDevice> Frame<'a, D> {
    pub fn new(
        raster: &'a mut Rasterizer<D>,
        scene: &'a Scene<D::Texture>,
        shadow: &'a mut dyn ShadowPass<D>,
        delta: f32,
    ) -> Self {
        Self {
            raster,
            scene,
            shadow,
            delta,
        }
    }

    /// The scene being drawn. The returned reference outlives the frame
    /// borrow, so it can be held while issuing draw calls.
    pub fn scene(&self) -> &'a Scene<D::Texture> {
        self.scene
    }

    /// Seconds since the previous frame.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn config(&self) -> &EngineConfig {
        self.raster.config()
    }

    /// Direct access to the allocator and device.
    pub fn rasterizer(&mut self) -> &mut Rasterizer<D> {
        &mut *self.raster
    }

    pub fn state_mut(&mut self) -> &mut TechniqueState {
        self.raster.technique_state_mut()
    }

    /// Activates shader program `name`, building it on first use.
    ///
    /// Returns `false` if the program cannot be built; the previously
    /// active program then stays bound.
    pub fn use_shader(&mut self, name: &str) -> bool {
        self.raster.activate_shader(name).is_some()
    }

    /// Writes a uniform of the active program.
    pub fn set(&mut self, name: &str, value: impl Into<Uniform>) {
        self.raster.set_uniform(name, value);
    }

    /// Draws `object` with the active program.
    pub fn draw(&mut self, object: &SceneObject<D::Texture>) -> bool {
        self.raster.draw(object)
    }

    pub fn bind_texture(&mut self, unit: u32, texture: D::Texture) {
        self.raster.device_mut().bind_texture_unit(unit, texture);
    }

    pub fn is_texture(&self, texture: D::Texture) -> bool {
        self.raster.device().is_texture(texture)
    }

    /// Clears color and depth to `color`.
    pub fn clear(&mut self, color: [f32; 4]) {
        self.raster.device_mut().clear(color);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.raster.device_mut().set_viewport(viewport);
    }

    /// Restores the viewport to the configured window size.
    pub fn reset_viewport(&mut self) {
        let viewport = self.raster.config().viewport.viewport();
        self.raster.device_mut().set_viewport(viewport);
    }

    pub fn bind_default_framebuffer(&mut self) {
        self.raster.device_mut().bind_default_framebuffer();
    }

    /// Whether the shadow subsystem rendered a pre-pass this frame.
    pub fn shadow_needed(&self) -> bool {
        self.shadow.is_needed()
    }

    /// Lets the shadow subsystem bind its light-ratio inputs to the active
    /// program. Does nothing if no program is active.
    pub fn bind_light_ratio(&mut self, next_unit: &mut u32) {
        let Some(program) = self.raster.active_program_handle() else {
            log::warn!("light ratio requested with no active shader program");
            return;
        };
        self.shadow
            .bind_light_ratio(self.raster.device_mut(), program, next_unit);
    }
}

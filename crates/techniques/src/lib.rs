#![deny(unsafe_code)]
//! Technique registry: maps render-technique names to draw routines.
//!
//! This crate sits between `raster-core` (which defines the `Rasterizer`,
//! `Frame` and `RenderMethodTable`) and the binaries that drive frames.
//! [`default_table`] is the builder handed to `Rasterizer::new`, so the
//! table is rebuilt on every `Rasterizer::init`.

pub mod methods;
pub mod uniforms;

use raster_core::gpu::GpuDevice;
use raster_core::rasterizer::RenderFn;
use raster_core::{RasterError, RenderMethodTable};

/// All built-in technique names.
const TECHNIQUE_NAMES: &[&str] = &[
    "NoRender",
    "RenderSimple",
    "RenderPhong",
    "RenderScreenQuad",
    "RenderSonarLight",
];

/// The built-in render techniques.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Technique {
    /// Draws nothing.
    NoRender,
    /// Unlit color or albedo texture.
    RenderSimple,
    /// Phong lighting with optional shadow pre-pass.
    RenderPhong,
    /// A single textured full-screen quad.
    RenderScreenQuad,
    /// Expanding lit band around each light.
    RenderSonarLight,
}

impl Technique {
    pub const ALL: [Technique; 5] = [
        Technique::NoRender,
        Technique::RenderSimple,
        Technique::RenderPhong,
        Technique::RenderScreenQuad,
        Technique::RenderSonarLight,
    ];

    /// Looks a technique up by its scene name.
    ///
    /// Returns `RasterError::UnknownTechnique` if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self, RasterError> {
        Self::ALL
            .into_iter()
            .find(|technique| technique.name() == name)
            .ok_or_else(|| RasterError::UnknownTechnique(name.to_string()))
    }

    /// Name scenes use to select this technique.
    pub fn name(self) -> &'static str {
        match self {
            Technique::NoRender => "NoRender",
            Technique::RenderSimple => "RenderSimple",
            Technique::RenderPhong => "RenderPhong",
            Technique::RenderScreenQuad => "RenderScreenQuad",
            Technique::RenderSonarLight => "RenderSonarLight",
        }
    }

    /// Shader program the technique activates, if any.
    pub fn shader(self) -> Option<&'static str> {
        match self {
            Technique::NoRender => None,
            Technique::RenderSimple => Some(methods::SIMPLE_SHADER),
            Technique::RenderPhong => Some(methods::PHONG_SHADER),
            Technique::RenderScreenQuad => Some(methods::SCREEN_QUAD_SHADER),
            Technique::RenderSonarLight => Some(methods::SONAR_LIGHT_SHADER),
        }
    }

    /// The draw routine for device `D`.
    pub fn render_fn<D: GpuDevice>(self) -> RenderFn<D> {
        match self {
            Technique::NoRender => methods::no_render::<D>,
            Technique::RenderSimple => methods::render_simple::<D>,
            Technique::RenderPhong => methods::render_phong::<D>,
            Technique::RenderScreenQuad => methods::render_screen_quad::<D>,
            Technique::RenderSonarLight => methods::render_sonar_light::<D>,
        }
    }

    /// Returns a slice of all built-in technique names.
    pub fn list() -> &'static [&'static str] {
        TECHNIQUE_NAMES
    }
}

/// Table with every built-in technique registered under its name.
pub fn default_table<D: GpuDevice>() -> RenderMethodTable<D> {
    Technique::ALL
        .into_iter()
        .fold(RenderMethodTable::new(), |table, technique| {
            table.with(technique.name(), technique.render_fn::<D>())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use raster_core::gpu::HeadlessDevice;

    #[test]
    fn from_name_known_technique_succeeds() {
        assert_eq!(
            Technique::from_name("RenderPhong").unwrap(),
            Technique::RenderPhong
        );
    }

    #[test]
    fn from_name_unknown_returns_error() {
        let result = Technique::from_name("RenderVoxels");
        assert!(matches!(result, Err(RasterError::UnknownTechnique(_))));
    }

    #[test]
    fn list_matches_all_variants() {
        let names: Vec<&str> = Technique::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names, Technique::list());
    }

    #[test]
    fn names_roundtrip_through_from_name() {
        for technique in Technique::ALL {
            assert_eq!(Technique::from_name(technique.name()).unwrap(), technique);
        }
    }

    #[test]
    fn default_table_registers_every_technique() {
        let table = default_table::<HeadlessDevice>();
        assert_eq!(table.len(), TECHNIQUE_NAMES.len());
        for name in Technique::list() {
            assert!(table.contains(name), "missing {name}");
        }
    }

    #[test]
    fn only_no_render_lacks_a_shader() {
        for technique in Technique::ALL {
            assert_eq!(
                technique.shader().is_none(),
                technique == Technique::NoRender
            );
        }
    }

    proptest! {
        #[test]
        fn from_name_accepts_exactly_the_listed_names(name in "[A-Za-z]{0,20}") {
            match Technique::from_name(&name) {
                Ok(technique) => prop_assert_eq!(technique.name(), name.as_str()),
                Err(_) => prop_assert!(!Technique::list().contains(&name.as_str())),
            }
        }
    }
}

//! Error types for the rasterizer core.
//!
//! Shader compilation errors live in [`crate::shader::ShaderError`] and
//! source-generation errors in [`crate::shader::PreprocessError`]; this
//! module covers the allocator, upload path, and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::shader::ShaderError;

/// Errors produced by rasterizer operations.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The device refused to create a GPU object (buffer, vertex array).
    #[error("gpu object creation failed: {0}")]
    Gpu(String),

    /// A scene object was drawn or released before its mesh was uploaded.
    #[error("scene object '{0}' has no GPU data")]
    NotUploaded(String),

    /// No render technique is known by this name.
    #[error("unknown render technique: {0}")]
    UnknownTechnique(String),

    /// A shader program could not be built or activated.
    #[error(transparent)]
    Shader(#[from] ShaderError),
}

/// Errors produced while loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON or has the wrong shape.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_error_includes_driver_message() {
        let err = RasterError::Gpu("out of memory".into());
        let msg = format!("{err}");
        assert!(
            msg.contains("out of memory"),
            "expected driver message, got: {msg}"
        );
    }

    #[test]
    fn not_uploaded_includes_object_name() {
        let err = RasterError::NotUploaded("teapot".into());
        let msg = format!("{err}");
        assert!(msg.contains("teapot"), "missing object name in: {msg}");
    }

    #[test]
    fn unknown_technique_includes_name() {
        let err = RasterError::UnknownTechnique("RenderVoxels".into());
        assert_eq!(format!("{err}"), "unknown render technique: RenderVoxels");
    }

    #[test]
    fn shader_error_converts_transparently() {
        let err: RasterError = ShaderError::Link("varying mismatch".into()).into();
        let msg = format!("{err}");
        assert!(msg.contains("varying mismatch"), "missing link log in: {msg}");
    }

    #[test]
    fn config_io_error_includes_path() {
        let err = ConfigError::Io {
            path: PathBuf::from("engine.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = format!("{err}");
        assert!(msg.contains("engine.json"), "missing path in: {msg}");
        assert!(msg.contains("gone"), "missing io message in: {msg}");
    }

    #[test]
    fn config_parse_error_from_serde_json() {
        let bad = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = ConfigError::from(bad);
        assert!(format!("{err}").starts_with("invalid config"));
    }

    #[test]
    fn raster_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RasterError>();
        assert_send_sync::<ConfigError>();
    }

    #[test]
    fn raster_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<RasterError>();
    }
}

//! Shader programs, the program cache, and source-file generation.
//!
//! # Module overview
//!
//! - [`program`] -- A linked vertex + fragment pair and its build errors.
//! - [`manager`] -- Name-keyed cache with a single active program and
//!   rollback-safe reload.
//! - [`preprocess`] -- `#import:"<path>"#` expansion for composing shader
//!   sources from shared snippets.

pub mod manager;
pub mod preprocess;
pub mod program;

pub use manager::ShaderManager;
pub use preprocess::{
    expand_imports, generate_from_config, generate_shader_file, GenerationReport, PreprocessError,
    ShaderGenConfig, IMPORT_TAG,
};
pub use program::{format_shader_error, ShaderError, ShaderProgram};

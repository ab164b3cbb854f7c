#![deny(unsafe_code)]
//! Core of a real-time rasterization engine.
//!
//! Provides the `GpuDevice` seam (with a headless and an optional `glow`
//! backend), the index-stable `SlotTable` allocator, mesh upload, the
//! `ShaderManager` program cache with rollback-safe reload, `#import`
//! shader-source generation, and the `Rasterizer` that dispatches one
//! named render technique per frame.

pub mod config;
pub mod error;
pub mod gpu;
pub mod logging;
pub mod mesh;
pub mod rasterizer;
pub mod scene;
pub mod shader;
pub mod slot;

pub use config::EngineConfig;
pub use error::{ConfigError, RasterError};
pub use gpu::{GpuDevice, HeadlessDevice, Uniform};
pub use logging::{init_logging, LoggingConfig};
pub use mesh::{Mesh, MeshGenerator};
pub use rasterizer::{Frame, FrameOutcome, NoShadows, Rasterizer, RenderMethodTable, ShadowPass};
pub use scene::{Camera, Light, LightKind, Material, Scene, SceneObject, Transform};
pub use shader::{PreprocessError, ShaderError, ShaderManager, ShaderProgram};
pub use slot::SlotTable;

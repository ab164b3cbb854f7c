#![deny(unsafe_code)]
//! CLI binary for the raster engine.
//!
//! Subcommands:
//! - `generate` expands shader imports for every pair in a config file
//! - `techniques` prints the built-in render techniques
//! - `simulate` renders frames of a demo scene on the headless device

mod demo;
mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use raster_core::gpu::HeadlessDevice;
use raster_core::shader::{generate_from_config, ShaderError};
use raster_core::{
    init_logging, EngineConfig, FrameOutcome, LoggingConfig, NoShadows, RasterError, Rasterizer,
};
use raster_techniques::{default_table, Technique};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "raster", about = "Rasterizer engine CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log filter in env_logger syntax (defaults to RUST_LOG, then "info").
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Expand `#import:"file"#` directives for every input/output pair in a config.
    Generate {
        /// Engine config JSON with a `shader_generation` section.
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List the built-in render techniques and their shader programs.
    Techniques,
    /// Render frames of the demo scene on the headless device.
    Simulate {
        /// Technique name (e.g. "RenderPhong").
        #[arg(short, long, default_value = "RenderPhong")]
        technique: String,

        /// Number of frames to render.
        #[arg(short, long, default_value_t = 60)]
        frames: usize,

        /// Seconds between frames.
        #[arg(long, default_value_t = 1.0 / 60.0)]
        delta: f32,

        /// Engine config JSON.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Shader root, overriding the config.
        #[arg(long)]
        shader_root: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_path(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Generate { config } => {
            let config = EngineConfig::from_path(&config)?;
            let pairs = &config.shader_generation;
            if pairs.inputs.is_empty() {
                return Err(CliError::Input(
                    "config lists no shaders to generate".to_string(),
                ));
            }
            let report = generate_from_config(&config.shader_root, pairs)?;
            let generated: Vec<String> = report
                .generated
                .iter()
                .map(|path| path.display().to_string())
                .collect();

            if cli.json {
                let failed: Vec<_> = report
                    .failed
                    .iter()
                    .map(|(path, err)| {
                        serde_json::json!({
                            "output": path.display().to_string(),
                            "error": err.to_string(),
                        })
                    })
                    .collect();
                let info = serde_json::json!({
                    "shader_root": config.shader_root.display().to_string(),
                    "generated": generated,
                    "failed": failed,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "generated {} of {} shader file(s) under {}",
                    generated.len(),
                    pairs.inputs.len(),
                    config.shader_root.display()
                );
            }
            if let Some((_, err)) = report.failed.into_iter().next() {
                return Err(err.into());
            }
        }
        Command::Techniques => {
            if cli.json {
                let techniques: Vec<_> = Technique::ALL
                    .iter()
                    .map(|t| serde_json::json!({ "name": t.name(), "shader": t.shader() }))
                    .collect();
                let info = serde_json::json!({ "techniques": techniques });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Techniques:");
                for technique in Technique::ALL {
                    match technique.shader() {
                        Some(shader) => println!("  {:<18} {shader}", technique.name()),
                        None => println!("  {}", technique.name()),
                    }
                }
            }
        }
        Command::Simulate {
            technique,
            frames,
            delta,
            config,
            shader_root,
        } => {
            let kind = Technique::from_name(&technique)?;
            let mut config = load_config(config.as_ref())?;
            if let Some(root) = shader_root {
                config.shader_root = root;
            }

            let mut raster = Rasterizer::new(HeadlessDevice::new(), config, default_table);
            raster.init();
            raster.apply_pipeline_state();
            let scene = demo::build_scene(&mut raster, kind.name())?;
            log::debug!(
                "simulating {} for {frames} frames under {}",
                kind.name(),
                raster.config().shader_root.display()
            );

            let mut draw_calls = 0;
            for _ in 0..frames {
                match raster.render(&scene, &mut NoShadows, delta) {
                    FrameOutcome::Rendered { draw_calls: n, .. } => draw_calls += n,
                    FrameOutcome::Idle => {}
                    FrameOutcome::MissingTechnique(name) => {
                        return Err(RasterError::UnknownTechnique(name).into());
                    }
                }
                raster.device_mut().take_draw_calls();
            }

            if frames > 0 {
                if let Some(shader) = kind.shader() {
                    if raster.shaders().find_shader_program(shader).is_none() {
                        let err = ShaderError::NotFound(shader.to_string());
                        raster.clear();
                        return Err(RasterError::from(err).into());
                    }
                }
            }

            let compiled = raster.device().compile_count();
            let wave_offset = raster.technique_state().wave_offset;
            raster.clear();

            if cli.json {
                let info = serde_json::json!({
                    "technique": kind.name(),
                    "frames": frames,
                    "draw_calls": draw_calls,
                    "programs_compiled": compiled,
                    "wave_offset": wave_offset,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "rendered {} ({frames} frames, {draw_calls} draw calls, {compiled} program(s) compiled)",
                    kind.name()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(match &cli.log {
        Some(filter) => LoggingConfig::with_filter(filter.as_str()),
        None => LoggingConfig::default(),
    });
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

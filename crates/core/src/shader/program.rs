//! Shader programs and their build errors.
//!
//! A [`ShaderProgram`] is built from a pair of source files named after the
//! program (`<root>/<name>.vs` and `<root>/<name>.fs`). The GPU handle is
//! owned by the [`ShaderManager`](super::ShaderManager), which deletes it
//! through the device when the program is replaced or cleared.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::gpu::{GpuDevice, Uniform};

/// Errors that can occur while building or looking up a shader program.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// A source file could not be read.
    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A shader stage failed to compile.
    #[error("shader compile error ({stage}):\n{log}")]
    Compile {
        /// The shader stage that failed (e.g. "vertex", "fragment").
        stage: String,
        /// The driver's info log describing the error.
        log: String,
    },
    /// A program failed to link.
    #[error("shader link error:\n{0}")]
    Link(String),
    /// No program with this name is cached.
    #[error("no shader program named '{0}'")]
    NotFound(String),
}

/// Numbers every line of `source` (right-aligned) and appends the driver's
/// `log`, so `0:LINE` references in the log can be read against the GLSL.
///
/// Either part may be empty.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("{:>width$}: {line}", i + 1));
    }
    if !log.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(log);
    }
    out
}

/// Path of the vertex stage for program `name` under `root`.
pub fn vertex_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.vs"))
}

/// Path of the fragment stage for program `name` under `root`.
pub fn fragment_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.fs"))
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A linked vertex + fragment program.
pub struct ShaderProgram<D: GpuDevice> {
    name: String,
    handle: D::Program,
    vertex_path: PathBuf,
    fragment_path: PathBuf,
}

impl<D: GpuDevice> ShaderProgram<D> {
    /// Reads `<root>/<name>.vs` and `<root>/<name>.fs` and links them.
    ///
    /// # Errors
    ///
    /// Returns `ShaderError::Io` if either file is unreadable, or the
    /// device's compile/link error.
    pub fn build(device: &mut D, root: &Path, name: &str) -> Result<Self, ShaderError> {
        let vertex_path = vertex_path(root, name);
        let fragment_path = fragment_path(root, name);
        let vertex_src = read_source(&vertex_path)?;
        let fragment_src = read_source(&fragment_path)?;
        let handle = device.compile_program(&vertex_src, &fragment_src)?;
        Ok(Self {
            name: name.to_string(),
            handle,
            vertex_path,
            fragment_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The device handle backing this program.
    pub fn handle(&self) -> D::Program {
        self.handle
    }

    pub fn vertex_path(&self) -> &Path {
        &self.vertex_path
    }

    pub fn fragment_path(&self) -> &Path {
        &self.fragment_path
    }

    /// Makes this program current on `device`.
    pub fn activate(&self, device: &mut D) {
        device.use_program(Some(self.handle));
    }

    /// Writes a uniform. The program must be current.
    pub fn set(&self, device: &mut D, name: &str, value: impl Into<Uniform>) {
        device.set_uniform(self.handle, name, &value.into());
    }

    /// Logs the program's name and source files.
    pub fn describe(&self) {
        log::info!(
            "shader program '{}' (vertex: {}, fragment: {})",
            self.name,
            self.vertex_path.display(),
            self.fragment_path.display()
        );
    }
}

impl<D: GpuDevice> fmt::Debug for ShaderProgram<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("vertex_path", &self.vertex_path)
            .field("fragment_path", &self.fragment_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessDevice;

    // --- format_shader_error tests ---

    #[test]
    fn format_shader_error_prepends_line_numbers() {
        let source = "#version 330 core\nvoid main() {\n}\n";
        let log = "ERROR: 0:2: syntax error";
        let formatted = format_shader_error(source, log);

        assert!(
            formatted.contains("1: #version 330 core"),
            "expected line 1 with content, got:\n{formatted}"
        );
        assert!(
            formatted.contains("2: void main() {"),
            "expected line 2 with content, got:\n{formatted}"
        );
        assert!(
            formatted.contains(log),
            "expected driver log in output, got:\n{formatted}"
        );
    }

    #[test]
    fn format_shader_error_handles_empty_inputs() {
        assert_eq!(format_shader_error("", "some error"), "some error");
        assert_eq!(format_shader_error("void main() {}", ""), "1: void main() {}");
        assert!(format_shader_error("", "").is_empty());
    }

    #[test]
    fn format_shader_error_right_aligns_line_numbers() {
        let source = (1..=12)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let formatted = format_shader_error(&source, "err");
        let lines: Vec<&str> = formatted.lines().collect();

        assert!(
            lines[0].starts_with(" 1: "),
            "expected right-aligned single digit, got: '{}'",
            lines[0]
        );
        assert!(
            lines[9].starts_with("10: "),
            "expected no padding for double digit, got: '{}'",
            lines[9]
        );
    }

    // --- ShaderError Display tests ---

    #[test]
    fn shader_compile_error_display_includes_stage_and_log() {
        let err = ShaderError::Compile {
            stage: "fragment".into(),
            log: "undeclared identifier".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("fragment"), "missing stage in: {msg}");
        assert!(msg.contains("undeclared identifier"), "missing log in: {msg}");
    }

    #[test]
    fn shader_io_error_display_includes_path() {
        let err = ShaderError::Io {
            path: PathBuf::from("Phong/phong.vs"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(format!("{err}").contains("Phong/phong.vs"));
    }

    #[test]
    fn shader_error_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ShaderError>();
    }

    // --- ShaderProgram tests ---

    #[test]
    fn stage_paths_append_extensions() {
        let root = Path::new("shaders");
        assert_eq!(
            vertex_path(root, "Simple/simple"),
            Path::new("shaders/Simple/simple.vs")
        );
        assert_eq!(
            fragment_path(root, "Simple/simple"),
            Path::new("shaders/Simple/simple.fs")
        );
    }

    #[test]
    fn build_reads_both_stages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("flat.vs"), "vertex body").unwrap();
        std::fs::write(dir.path().join("flat.fs"), "fragment body").unwrap();

        let mut dev = HeadlessDevice::new();
        let program = ShaderProgram::build(&mut dev, dir.path(), "flat").unwrap();
        assert_eq!(program.name(), "flat");
        assert_eq!(
            dev.program_sources(program.handle()),
            Some(("vertex body", "fragment body"))
        );
    }

    #[test]
    fn build_reports_missing_fragment_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("half.vs"), "vertex body").unwrap();

        let mut dev = HeadlessDevice::new();
        let err = ShaderProgram::build(&mut dev, dir.path(), "half").unwrap_err();
        assert!(
            matches!(&err, ShaderError::Io { path, .. } if path.ends_with("half.fs")),
            "expected io error for half.fs, got {err:?}"
        );
        assert_eq!(dev.live_programs(), 0);
    }

    #[test]
    fn set_writes_uniform_through_device() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("u.vs"), "v").unwrap();
        std::fs::write(dir.path().join("u.fs"), "f").unwrap();

        let mut dev = HeadlessDevice::new();
        let program = ShaderProgram::build(&mut dev, dir.path(), "u").unwrap();
        program.activate(&mut dev);
        program.set(&mut dev, "useAlbedoTex", 1);
        assert_eq!(
            dev.uniform(program.handle(), "useAlbedoTex"),
            Some(Uniform::Int(1))
        );
    }
}

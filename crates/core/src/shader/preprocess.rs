//! Shader source composition through `#import:"<path>"#` directives.
//!
//! A main shader file may contain lines of the form
//!
//! ```text
//! #import:"SubShaders/light_ratio.sub_fs"#
//! ```
//!
//! Generation copies the main file line by line; each directive line is
//! replaced by the full contents of the referenced file (resolved against the
//! shader root) followed by a newline. Expansion is one level deep: a
//! referenced file that itself contains a directive is rejected.
//!
//! Output is streamed. When generation aborts, whatever was written before
//! the offending line stays in the output file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker that introduces an import directive.
pub const IMPORT_TAG: &str = "#import:";

/// Errors produced while generating a shader file.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The main file could not be read or the output file created.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the generated output failed.
    #[error("failed to write generated shader: {0}")]
    Write(#[from] std::io::Error),

    /// A directive has no closing `#`.
    #[error("line {line}: can not find ending '#'")]
    Unterminated { line: usize },

    /// A directive's path is not a non-empty quoted string.
    #[error("line {line}: import path must be quoted, e.g. #import:\"file\"#")]
    Malformed { line: usize },

    /// The referenced file could not be read.
    #[error("line {line}: failed to open {}: {source}", path.display())]
    Include {
        line: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The referenced file contains a directive of its own.
    #[error("line {line}: {} contains a nested import, which is not expanded", path.display())]
    NestedImport { line: usize, path: PathBuf },

    /// A generation config lists different numbers of inputs and outputs.
    #[error("shader generation config has {inputs} inputs but {outputs} outputs")]
    ConfigMismatch { inputs: usize, outputs: usize },
}

/// Pairs of main files and output files to generate, relative to the
/// shader root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderGenConfig {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// Extracts the import path of `line`, if it carries a directive.
///
/// `line_no` is 1-based and only used for error reporting.
pub fn parse_import(line: &str, line_no: usize) -> Result<Option<&str>, PreprocessError> {
    let Some(tag_pos) = line.find(IMPORT_TAG) else {
        return Ok(None);
    };
    let rest = &line[tag_pos + IMPORT_TAG.len()..];
    let end = rest
        .find('#')
        .ok_or(PreprocessError::Unterminated { line: line_no })?;
    rest[..end]
        .trim()
        .strip_prefix('"')
        .and_then(|quoted| quoted.strip_suffix('"'))
        .filter(|path| !path.is_empty())
        .map(Some)
        .ok_or(PreprocessError::Malformed { line: line_no })
}

/// Expands every directive in `source` into `out`.
///
/// Returns the number of directives expanded.
///
/// # Errors
///
/// Stops at the first malformed directive, unreadable include, or nested
/// import. Lines before it have already been written to `out`.
pub fn expand_imports<W: Write>(
    source: &str,
    root: &Path,
    out: &mut W,
) -> Result<usize, PreprocessError> {
    let mut expanded = 0;
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        match parse_import(line, line_no)? {
            Some(rel) => {
                let path = root.join(rel);
                let contents =
                    std::fs::read_to_string(&path).map_err(|source| PreprocessError::Include {
                        line: line_no,
                        path: path.clone(),
                        source,
                    })?;
                if contents.contains(IMPORT_TAG) {
                    return Err(PreprocessError::NestedImport {
                        line: line_no,
                        path,
                    });
                }
                out.write_all(contents.as_bytes())?;
                out.write_all(b"\n")?;
                expanded += 1;
            }
            None => {
                out.write_all(line.as_bytes())?;
                out.write_all(b"\n")?;
            }
        }
    }
    Ok(expanded)
}

/// Generates `output` from `main`, expanding imports relative to `root`.
///
/// # Errors
///
/// See [`expand_imports`]; additionally `PreprocessError::Open` when the
/// main file is unreadable or the output cannot be created. Every error is
/// also logged.
pub fn generate_shader_file(
    root: &Path,
    output: &Path,
    main: &Path,
) -> Result<usize, PreprocessError> {
    let result = generate_inner(root, output, main);
    match &result {
        Ok(_) => log::info!("{} has been created successfully", output.display()),
        Err(err) => log::error!("generating {} failed: {err}", output.display()),
    }
    result
}

fn generate_inner(root: &Path, output: &Path, main: &Path) -> Result<usize, PreprocessError> {
    let source = std::fs::read_to_string(main).map_err(|source| PreprocessError::Open {
        path: main.to_path_buf(),
        source,
    })?;
    let file = File::create(output).map_err(|source| PreprocessError::Open {
        path: output.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    let result = expand_imports(&source, root, &mut out);
    // Flush on both paths so a failed run leaves the partial output behind.
    out.flush()?;
    result
}

/// Outcome of [`generate_from_config`]: which outputs were written and which
/// pairs failed.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub generated: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, PreprocessError)>,
}

impl GenerationReport {
    /// Whether every pair was generated.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Generates every input/output pair of `config`, both resolved against `root`.
///
/// A failing pair is logged and recorded in the report; the remaining pairs
/// are still generated.
///
/// # Errors
///
/// Returns `ConfigMismatch` before touching any file if the lists differ in
/// length.
pub fn generate_from_config(
    root: &Path,
    config: &ShaderGenConfig,
) -> Result<GenerationReport, PreprocessError> {
    if config.inputs.len() != config.outputs.len() {
        let err = PreprocessError::ConfigMismatch {
            inputs: config.inputs.len(),
            outputs: config.outputs.len(),
        };
        log::error!("{err}");
        return Err(err);
    }
    let mut report = GenerationReport::default();
    for (input, output) in config.inputs.iter().zip(&config.outputs) {
        let output = root.join(output);
        match generate_shader_file(root, &output, &root.join(input)) {
            Ok(_) => report.generated.push(output),
            Err(err) => report.failed.push((output, err)),
        }
    }
    Ok(report)
}

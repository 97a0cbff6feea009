//! Reporting sinks
//!
//! The lock checker never prints or writes files itself. Diagnostics and the
//! final decision go through a [`Reporter`] handed in by the caller:
//!
//! - [`ActionsReporter`] logs through `tracing` and writes step outputs in the
//!   GitHub Actions `GITHUB_OUTPUT` file format, or as `name=value` lines.
//! - [`RecordingReporter`] keeps everything in memory.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Sink for diagnostics and named outputs.
pub trait Reporter {
    fn info(&mut self, message: &str);

    fn warning(&mut self, message: &str);

    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()>;
}

/// Reporter for CI runs. Outputs are appended to the `GITHUB_OUTPUT` file when
/// one is configured and written as `name=value` lines to `fallback` (stdout
/// unless replaced) otherwise.
#[derive(Debug)]
pub struct ActionsReporter<W = io::Stdout> {
    output_file: Option<PathBuf>,
    fallback: W,
}

impl ActionsReporter {
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            fallback: io::stdout(),
        }
    }

    /// Build from the `GITHUB_OUTPUT` environment variable.
    pub fn from_env() -> Self {
        let output_file = std::env::var_os(OUTPUT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(output_file)
    }
}

impl<W: Write> ActionsReporter<W> {
    /// Replace the writer used when no output file is configured.
    pub fn with_fallback<V: Write>(self, fallback: V) -> ActionsReporter<V> {
        ActionsReporter {
            output_file: self.output_file,
            fallback,
        }
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    pub fn into_fallback(self) -> W {
        self.fallback
    }
}

impl<W: Write> Reporter for ActionsReporter<W> {
    fn info(&mut self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warning(&mut self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        match &self.output_file {
            Some(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(format_output_entry(name, value).as_bytes())
            }
            None => writeln!(self.fallback, "{}={}", name, value),
        }
    }
}

/// Heredoc form used by the Actions runner, safe for multi-line values.
fn format_output_entry(name: &str, value: &str) -> String {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// In-memory reporter.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    pub infos: Vec<String>,
    pub warnings: Vec<String>,
    pub outputs: Vec<(String, String)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written for `name`.
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Reporter for RecordingReporter {
    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.outputs.push((name.to_string(), value.to_string()));
        Ok(())
    }
}

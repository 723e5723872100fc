//! Report output to stdout, stderr or a file.

use crate::options::serialization::Format;
use crate::report::Report;
use anyhow::{Context, Result};
use std::fmt::{self, Debug, Formatter};
use std::fs::File;
use std::io::{self, ErrorKind::BrokenPipe, LineWriter, Write};
use std::path::{Path, PathBuf};

/// `Writer` dynamic dispatches the `Write` trait.
pub type Writer = Box<dyn Write>;

/// `Output` writes to either a file or stream like stdout or stderr.
pub struct Output {
    writer: Writer,
}

impl Debug for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("writer", &"<dyn Write>")
            .finish()
    }
}

impl Default for Output {
    /// Default output is stdout
    fn default() -> Self {
        Self::stdout()
    }
}

impl Output {
    /// Creates an `Output` from an optional path; `None` or `-` is stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the output file cannot be created.
    pub fn new(output: Option<&PathBuf>) -> Result<Self> {
        match output.map(PathBuf::as_path) {
            Some(path) if path == Path::new("-") => Ok(Self::stdout()),
            Some(path) => Self::file(path),
            None => Ok(Self::stdout()),
        }
    }

    /// Creates an `Output` that writes to a file with error context.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn file(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create output file: {}", path.display()))?;
        let writer: Writer = Box::new(LineWriter::new(file));

        Ok(Self { writer })
    }

    /// Creates an `Output` that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(io::stdout().lock()),
        }
    }

    /// Creates an `Output` that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(io::stderr().lock()),
        }
    }

    /// Creates an `Output` from a writer.
    pub fn from_writer<W: Write + 'static>(writer: W) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Writes a chunk, treating a closed pipe as success.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than `BrokenPipe`.
    pub fn write_chunk(&mut self, chunk: &str) -> Result<()> {
        Self::handle_broken_pipe(self.writer.write_all(chunk.as_bytes()))
    }

    /// Flushes the writer, treating a closed pipe as success.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than `BrokenPipe`.
    pub fn flush(&mut self) -> Result<()> {
        Self::handle_broken_pipe(self.writer.flush())
    }

    /// Writes a verification report in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or write failure.
    pub fn write_formatted_report(&mut self, report: &Report, format: Format) -> Result<()> {
        match format {
            Format::Text => {
                self.write_chunk(&format!("{report}\n"))?;
            }
            Format::Json => {
                let json = serde_json::to_string(report)
                    .context("failed to serialize report to JSON")?;
                self.write_chunk(&format!("{json}\n"))?;
            }
            Format::Csv => {
                let mut wtr = csv::Writer::from_writer(Vec::new());
                wtr.write_record(["source", "check", "passed", "detail"])?;
                for check in report.checks() {
                    wtr.write_record([
                        report.source(),
                        check.name,
                        if check.passed { "true" } else { "false" },
                        check.detail.as_str(),
                    ])?;
                }
                let csv_data = String::from_utf8(wtr.into_inner()?)
                    .context("failed to convert CSV output to UTF-8 string")?;
                self.write_chunk(&csv_data)?;
            }
        }

        self.flush()
    }

    /// Processes the result of a write, handling `BrokenPipe` errors gracefully.
    fn handle_broken_pipe(result: io::Result<()>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) => match err.kind() {
                BrokenPipe => Ok(()),
                _ => Err(err.into()),
            },
        }
    }
}

//! Verbose details about a verification run, written before the report.

use anyhow::{Context, Result};
use bounded_source::{Format, Options, Output, Suite};
use serde::Serialize;

/// Writes the run configuration to stderr in the report format.
#[derive(Debug)]
pub(crate) struct Verbose {
    output: Output,
}

impl Default for Verbose {
    /// Default verbose logger writes to stderr.
    fn default() -> Self {
        Self {
            output: Output::stderr(),
        }
    }
}

/// Verbose data that can be serialized to both JSON and CSV.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerboseData<'a> {
    source: &'a str,
    estimated_bytes: u64,
    unsplittable: bool,
    split_after: usize,
    fraction: f64,
    exhaustive: bool,
    bundle_size: u64,
    fraction_grid: u16,
    io: String,
    processing: String,
    threads: String,
}

impl<'a> VerboseData<'a> {
    pub(crate) fn new(source: &'a str, estimated_bytes: u64, suite: &Suite, options: &Options) -> Self {
        Self {
            source,
            estimated_bytes,
            unsplittable: suite.unsplittable(),
            split_after: suite.split_after(),
            fraction: suite.fraction(),
            exhaustive: suite.exhaustive(),
            bundle_size: options.bundle_size(),
            fraction_grid: options.fraction_grid(),
            io: options.io().to_string(),
            processing: options.processing().to_string(),
            threads: options.threads().to_string(),
        }
    }

    /// Get all fields as name-value pairs.
    fn field_pairs(&self) -> [(&'static str, String); 11] {
        [
            ("source", self.source.to_string()),
            ("estimated-bytes", self.estimated_bytes.to_string()),
            ("unsplittable", self.unsplittable.to_string()),
            ("split-after", self.split_after.to_string()),
            ("fraction", self.fraction.to_string()),
            ("exhaustive", self.exhaustive.to_string()),
            ("bundle-size", self.bundle_size.to_string()),
            ("fraction-grid", self.fraction_grid.to_string()),
            ("io", self.io.clone()),
            ("processing", self.processing.clone()),
            ("threads", self.threads.clone()),
        ]
    }
}

impl Verbose {
    /// Writes the run configuration in `format`.
    pub(crate) fn write_verbose_info(&mut self, data: &VerboseData<'_>, format: Format) -> Result<()> {
        match format {
            Format::Json => self.write_json(data),
            Format::Csv => self.write_csv(data),
            Format::Text => self.write_text(data),
        }
    }

    fn write_json(&mut self, data: &VerboseData<'_>) -> Result<()> {
        let json = serde_json::to_string(data).context("failed to serialize verbose details")?;

        self.output
            .write_chunk(&format!("{json}\n\n"))
            .context("failed to write JSON output")
    }

    fn write_csv(&mut self, data: &VerboseData<'_>) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let field_pairs = data.field_pairs();

        writer.write_record(field_pairs.iter().map(|(name, _)| *name))?;
        writer.write_record(field_pairs.iter().map(|(_, value)| value))?;

        let output =
            String::from_utf8(writer.into_inner()?).context("failed to convert output to UTF-8")?;
        self.output
            .write_chunk(&format!("{output}\n"))
            .context("failed to write CSV output")
    }

    fn write_text(&mut self, data: &VerboseData<'_>) -> Result<()> {
        data.field_pairs()
            .into_iter()
            .try_for_each(|(field_name, value)| {
                self.output.write_chunk(&format!("{field_name} {value}\n"))
            })?;

        self.output.write_chunk("\n")
    }
}

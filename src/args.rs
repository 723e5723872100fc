//! Command-line argument parsing and access.

use anyhow::Result;
use bounded_source::{Format, Io, Options, Processing, Suite, Threads};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments parsed by clap.
#[derive(Debug, Clone, Parser)]
#[command(about, version)]
pub(crate) struct Args {
    /// Line file to verify; without it, a counting source is verified.
    #[arg(value_name = "PATH")]
    input: Option<PathBuf>,

    /// Records in the counting source when no PATH is given.
    #[arg(short = 'n', long, default_value_t = 100, value_name = "N")]
    count: u64,

    /// Wrap the source so it refuses every split, and check that it does.
    #[arg(short, long)]
    unsplittable: bool,

    /// Desired bundle size in bytes [default: 65536].
    #[arg(short, long, value_name = "BYTES")]
    bundle_size: Option<u64>,

    /// Records to read before the split checks.
    #[arg(short, long, default_value_t = 0, value_name = "N")]
    split_after: usize,

    /// Fraction of the remaining range to split at.
    #[arg(short = 'F', long, default_value_t = 0.5, value_name = "FRACTION")]
    fraction: f64,

    /// Number of threads for parallel verification [default: all].
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<u16>,

    /// Read bundles one at a time instead of in parallel.
    #[arg(short = 'S', long)]
    sequential: bool,

    /// Split after every prefix length at every fraction of the grid.
    #[arg(short = 'x', long)]
    exhaustive: bool,

    /// How a line file is loaded.
    #[arg(short = 'I', long, default_value_t, value_enum, value_name = "STRATEGY")]
    io: Io,

    /// Report format.
    #[arg(short, long, default_value_t, value_enum, value_name = "FORMAT")]
    format: Format,

    /// Write the report to file rather than stdout.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print verbose details.
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    pub(crate) const fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    pub(crate) const fn count(&self) -> u64 {
        self.count
    }

    pub(crate) const fn output(&self) -> Option<&PathBuf> {
        self.output.as_ref()
    }

    pub(crate) const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Environment defaults overridden by any flags given.
    pub(crate) fn to_options(&self) -> Options {
        let mut options = Options::from_env()
            .with_io(self.io)
            .with_format(self.format);

        if self.sequential {
            options = options.with_processing(Processing::Sequential);
        }
        if let Some(count) = self.threads {
            options = options.with_threads(Threads::Count(count));
        }
        if let Some(bundle_size) = self.bundle_size {
            options = options.with_bundle_size(bundle_size);
        }

        options
    }

    /// The checks to run.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a fraction outside `(0, 1)`.
    pub(crate) fn to_suite(&self) -> Result<Suite> {
        Ok(Suite::default()
            .with_split_after(self.split_after)
            .with_fraction(self.fraction)?
            .with_unsplittable(self.unsplittable)
            .with_exhaustive(self.exhaustive))
    }
}

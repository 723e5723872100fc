//! Configuration threaded through every source, reader and verification call.
//!
//! [`Options`] is the opaque configuration bag a [`BoundedSource`](crate::BoundedSource)
//! receives in `split_into_bundles`, `create_reader` and `estimated_size_bytes`.
//! Concrete sources read the settings they recognize and ignore the rest.
//!
//! # Structure
//!
//! - **Io** ([`Io`]): how a line file is loaded (memory-mapped or buffered)
//! - **Processing** ([`Processing`]): whether bundles are verified sequentially or in parallel
//! - **Threads** ([`Threads`]): thread pool size for parallel verification
//! - **Format** ([`Format`]): report format for the command-line tool
//! - bundle size: the default desired bundle size in bytes
//! - fraction grid: how many fractions an exhaustive split sweep tries
//!
//! # Usage
//!
//! ```
//! use bounded_source::{Options, Processing, Threads};
//!
//! let options = Options::default()
//!     .with_processing(Processing::Sequential)
//!     .with_bundle_size(64);
//! assert_eq!(options.bundle_size(), 64);
//! assert_eq!(options.threads(), Threads::All);
//! ```
//!
//! # Environment Variables
//!
//! - `BOUNDED_SOURCE_PROCESSING`: `sequential` or `parallel` (default: parallel)
//! - `BOUNDED_SOURCE_THREADS`: thread count or `all` (default: all available cores)
//! - `BOUNDED_SOURCE_BUNDLE_SIZE`: desired bundle size in bytes (default: 65536)
//! - `BOUNDED_SOURCE_FRACTION_GRID`: fractions per exhaustive sweep (default: 10)

pub mod io;
pub mod processing;
pub mod serialization;
pub mod threads;

use self::io::Io;
use self::processing::Processing;
use self::serialization::Format;
use self::threads::Threads;
use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

/// Unified configuration for sources, readers and the verification harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Line file loading strategy.
    io: Io,

    /// Bundle verification strategy.
    processing: Processing,

    /// Thread pool configuration.
    threads: Threads,

    /// Report format.
    format: Format,

    /// Default desired bundle size in bytes.
    bundle_size: u64,

    /// Number of fractions tried per prefix by exhaustive split probing.
    fraction_grid: u16,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            io: Io::default(),
            processing: Processing::default(),
            threads: Threads::default(),
            format: Format::default(),
            bundle_size: Self::BUNDLE_SIZE,
            fraction_grid: Self::FRACTION_GRID,
        }
    }
}

impl Options {
    /// Default bundle size is 64KB.
    pub const BUNDLE_SIZE: u64 = 64 * 1024;
    /// Default exhaustive sweep tries tenths.
    pub const FRACTION_GRID: u16 = 10;

    const ENV_PROCESSING: &str = "BOUNDED_SOURCE_PROCESSING";
    const ENV_THREADS: &str = "BOUNDED_SOURCE_THREADS";
    const ENV_BUNDLE_SIZE: &str = "BOUNDED_SOURCE_BUNDLE_SIZE";
    const ENV_FRACTION_GRID: &str = "BOUNDED_SOURCE_FRACTION_GRID";

    /// Create options from environment variables if present.
    pub fn from_env() -> Self {
        // Parse environment variables only once and cache the result
        static OPTIONS: OnceLock<Options> = OnceLock::new();

        *OPTIONS.get_or_init(|| Self {
            processing: Self::parse_processing(),
            threads: Self::parse_threads(),
            bundle_size: Self::parse_env_var(Self::ENV_BUNDLE_SIZE, Self::BUNDLE_SIZE),
            fraction_grid: Self::parse_env_var(Self::ENV_FRACTION_GRID, Self::FRACTION_GRID),
            ..Self::default()
        })
    }

    /// Set the line file loading strategy.
    #[must_use]
    pub const fn with_io(mut self, io: Io) -> Self {
        self.io = io;
        self
    }

    /// Set the bundle verification strategy.
    #[must_use]
    pub const fn with_processing(mut self, processing: Processing) -> Self {
        self.processing = processing;
        self
    }

    /// Set the thread count.
    #[must_use]
    pub const fn with_threads(mut self, threads: Threads) -> Self {
        self.threads = threads;
        self
    }

    /// Set the report format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the default desired bundle size in bytes.
    #[must_use]
    pub const fn with_bundle_size(mut self, bundle_size: u64) -> Self {
        self.bundle_size = bundle_size;
        self
    }

    /// Set the number of fractions tried per prefix by exhaustive probing.
    #[must_use]
    pub const fn with_fraction_grid(mut self, fraction_grid: u16) -> Self {
        self.fraction_grid = fraction_grid;
        self
    }

    #[must_use]
    pub const fn io(&self) -> Io {
        self.io
    }

    #[must_use]
    pub const fn processing(&self) -> Processing {
        self.processing
    }

    #[must_use]
    pub const fn threads(&self) -> Threads {
        self.threads
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub const fn bundle_size(&self) -> u64 {
        self.bundle_size
    }

    #[must_use]
    pub const fn fraction_grid(&self) -> u16 {
        self.fraction_grid
    }

    /// Initialize the thread pool if parallel processing is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if parallel mode is selected but the thread pool
    /// cannot be initialized.
    pub fn init_thread_pool_if_parallel(&self) -> anyhow::Result<()> {
        self.processing.initialize(self.threads)
    }

    /// Parse numeric environment variable with fallback to default value.
    fn parse_env_var<T: FromStr>(name: &str, default: T) -> T {
        env::var(name)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    fn parse_processing() -> Processing {
        match env::var(Self::ENV_PROCESSING).ok().as_deref() {
            Some(s) if s.eq_ignore_ascii_case("sequential") => Processing::Sequential,
            Some(s) if s.eq_ignore_ascii_case("parallel") => Processing::Parallel,
            _ => Processing::default(),
        }
    }

    /// Parse thread count from `BOUNDED_SOURCE_THREADS`.
    fn parse_threads() -> Threads {
        env::var(Self::ENV_THREADS)
            .ok()
            .and_then(|val| {
                if val.eq_ignore_ascii_case("all") {
                    Some(Threads::All)
                } else {
                    val.parse::<u16>().ok().map(Threads::Count)
                }
            })
            .unwrap_or_default()
    }
}

impl Display for Options {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Options {{ io: {}, processing: {}, threads: {}, format: {}, bundle_size: {}, fraction_grid: {} }}",
            self.io, self.processing, self.threads, self.format, self.bundle_size, self.fraction_grid
        )
    }
}

//! Whether the harness reads bundles on one thread or on the rayon pool.

use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};

use super::threads::Threads;

/// How the verification harness fans out over bundles and prefix lengths.
///
/// `Parallel` hands each bundle to a rayon worker, the way a pipeline runner
/// gives bundles to separate workers, and catches readers that share state
/// they should not. `Sequential` keeps every read on the calling thread, which
/// makes log output and failures deterministic.
///
/// ```
/// use bounded_source::Processing;
///
/// assert_eq!(Processing::default(), Processing::Parallel);
/// assert_eq!(Processing::from(false).to_string(), "sequential");
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Processing {
    /// One bundle at a time on the calling thread.
    Sequential,

    /// Bundles spread over the rayon pool.
    #[default]
    Parallel,
}

impl Display for Processing {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

impl Processing {
    /// Sizes the global rayon pool from `threads` when running in parallel.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a zero thread count in parallel mode, or when
    /// the global pool cannot be built.
    pub fn initialize(&self, threads: Threads) -> anyhow::Result<()> {
        match self {
            Self::Parallel => threads.init_pool(),
            Self::Sequential => Ok(()),
        }
    }
}

impl From<bool> for Processing {
    fn from(parallel: bool) -> Self {
        if parallel {
            Self::Parallel
        } else {
            Self::Sequential
        }
    }
}

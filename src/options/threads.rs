//! Thread count configuration for parallel verification.

use crate::BoundedSourceError;
use core::fmt::{self, Display, Formatter};
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Thread count configuration for parallel verification.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Threads {
    /// Use all available cores.
    #[default]
    All,

    /// Use a specific number of threads.
    Count(u16),
}

impl Threads {
    /// Get the number of threads that will be used.
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::All => rayon::current_num_threads(),
            Self::Count(n) => n as usize,
        }
    }

    /// Initialize the global rayon thread pool.
    ///
    /// Only the first call in a process configures the pool; later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a zero thread count or when the pool cannot be built.
    pub fn init_pool(self) -> anyhow::Result<()> {
        static INIT_ATTEMPTED: AtomicBool = AtomicBool::new(false);

        if let Self::Count(0) = self {
            return Err(BoundedSourceError::Config("thread count must be positive".into()).into());
        }

        if INIT_ATTEMPTED.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Self::Count(count) = self {
            ThreadPoolBuilder::new()
                .num_threads(count as usize)
                .build_global()
                .map_err(|_| {
                    BoundedSourceError::Config(format!(
                        "failed to configure thread pool with {count} threads"
                    ))
                })?;
            log::debug!("thread pool configured with {count} threads");
        }

        Ok(())
    }
}

impl Display for Threads {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}

impl From<u16> for Threads {
    fn from(count: u16) -> Self {
        Self::Count(count)
    }
}

//! Configuration for line file loading.

use clap::ValueEnum;
use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};

/// Determines how a line file is loaded before its ranges are read.
///
/// - **MemoryMapped**: Uses the OS virtual memory system. Requires a seekable file.
/// - **Buffered**: Reads the whole file into memory once.
///
/// Every split of a line source shares the loaded bytes, so either strategy
/// loads the file only once.
///
/// # Examples
///
/// ```
/// use bounded_source::Io;
///
/// assert_eq!(Io::default(), Io::MemoryMapped);
/// assert_eq!(Io::Buffered.to_string(), "buffered");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
)]
pub enum Io {
    /// Map the file into memory.
    #[default]
    #[clap(name = "mmap")]
    MemoryMapped,

    /// Read the entire file into memory.
    Buffered,
}

impl Display for Io {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MemoryMapped => write!(f, "memory-mapped"),
            Self::Buffered => write!(f, "buffered"),
        }
    }
}

//! Concrete bounded sources.
//!
//! - [`CountingSource`]: the integers of a half-open range, one record per integer
//! - [`LineSource`]: newline-delimited UTF-8 records over a byte range of an [`Input`](crate::Input)

pub mod counting;
pub mod lines;

pub use counting::{CountingReader, CountingSource, CountingSplitter};
pub use lines::{Line, LineReader, LineSource, LineSplitter};

//! Bounded sources that can be split while they are being read.
//!
//! A [`BoundedSource`] is a finite, immutable description of a range of
//! records. Before any reading starts it can be partitioned into bundles for
//! parallel work with [`BoundedSource::split_into_bundles`]. Once a
//! [`BoundedReader`] is running, a control thread can still rebalance work by
//! asking the reader to [`split_at_fraction`](BoundedReader::split_at_fraction):
//! the reader keeps the records before the split point and hands the rest
//! back as a residual source. Readers also report how far they have got with
//! [`fraction_consumed`](BoundedReader::fraction_consumed).
//!
//! The protocol guarantees that the reader plus every residual it handed out
//! produce exactly the records of the unsplit source, none twice and none
//! lost, even when the split races with the reader advancing. The race is
//! settled by an [`OffsetRangeTracker`] shared between the reader and its
//! [`Splitter`].
//!
//! ## Module structure
//!
//! - `error.rs`: Error types
//! - `exit_code.rs`: Exit codes for the command-line tool
//! - `input.rs`: Memory-mapped or buffered file bytes
//! - `lib.rs`: Crate root and re-exports
//! - `main.rs`: CLI entry point
//! - `options/`: Configuration
//!   - `options/io.rs`: File loading strategy
//!   - `options/processing.rs`: Sequential or parallel verification
//!   - `options/serialization.rs`: Report formats
//!   - `options/threads.rs`: Thread pool size
//! - `output.rs`: Report output to stdout or a file
//! - `range_tracker.rs`: Offset claims and split arbitration
//! - `report.rs`: Named verification checks
//! - `source.rs`: The `BoundedSource`, `BoundedReader` and `Splitter` traits
//! - `sources/`: Concrete sources
//!   - `sources/counting.rs`: Consecutive integers
//!   - `sources/lines.rs`: Lines of a file
//! - `testing.rs`: Verification harness
//! - `unsplittable.rs`: The unsplittable decorator
//!
//! # Examples
//!
//! Split a running reader and read both halves:
//!
//! ```
//! use bounded_source::{BoundedReader, BoundedSource, CountingSource, Options, testing};
//!
//! let options = Options::default();
//! let mut reader = CountingSource::up_to(10).create_reader(&options)?;
//! let primary = testing::read_n_items_from_unstarted_reader(&mut reader, 3)?;
//! assert_eq!(primary, vec![0, 1, 2]);
//!
//! let residual = reader.split_at_fraction(0.5).expect("split after the current record");
//! assert_eq!(residual, CountingSource::range(5, 10));
//!
//! let rest = testing::read_remaining_from_reader(&mut reader, true)?;
//! assert_eq!(rest, vec![3, 4]);
//! assert_eq!(testing::read_from_source(&residual, &options)?, vec![5, 6, 7, 8, 9]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Verify a source with the harness:
//!
//! ```
//! use bounded_source::{CountingSource, Options, Processing, testing};
//!
//! let options = Options::default().with_processing(Processing::Sequential);
//! let source = CountingSource::up_to(20);
//! testing::assert_split_into_bundles_covers(&source, 16, &options)?;
//! testing::assert_fraction_consumed_monotonic(&source, &options)?;
//! testing::assert_split_at_fraction_succeeds_and_consistent(&source, 5, 0.5, &options)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod error;
pub mod exit_code;
pub mod input;
pub mod options;
pub mod output;
pub mod range_tracker;
pub mod report;
pub mod source;
pub mod sources;
pub mod testing;
pub mod unsplittable;

pub use error::Error as BoundedSourceError;
pub use input::Input;
pub use options::{
    Options, io::Io, processing::Processing, serialization::Format, threads::Threads,
};
pub use output::Output;
pub use range_tracker::OffsetRangeTracker;
pub use report::{Check, Report, Suite};
pub use source::{BoundedReader, BoundedSource, ReaderState, Splitter};
pub use sources::{CountingSource, Line, LineSource};
pub use unsplittable::Unsplittable;

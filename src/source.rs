//! The bounded source and reader protocol.
//!
//! A [`BoundedSource`] describes a finite range of records. Before reading
//! begins it can be partitioned into bundles; each bundle is itself a source.
//! A [`BoundedReader`] is a single-owner cursor over one source:
//!
//! ```text
//! Unstarted --start()--> Started --advance() == false--> Finished
//! ```
//!
//! While a reader is running, another thread may take its [`Splitter`] and
//! call [`Splitter::split_at_fraction`] to hand the unread tail of the range
//! to an idle worker as a new residual source. The read thread keeps calling
//! [`BoundedReader::advance`]; records before the split point stay with the
//! primary reader and everything from the split point on belongs to the
//! residual. No record is ever produced by both, and none is dropped.

use anyhow::Result;
use std::fmt::Debug;

use crate::Options;

/// An immutable, cloneable description of a finite range of records.
pub trait BoundedSource: Clone + Debug + Send + Sync + 'static {
    /// The record type produced by readers of this source.
    type Item: Clone + Send;

    /// The reader type created by [`BoundedSource::create_reader`].
    type Reader: BoundedReader<Item = Self::Item, Source = Self>;

    /// Partitions this source into bundles of roughly `desired_bundle_size_bytes`.
    ///
    /// The bundles cover disjoint, contiguous parts of this source and together
    /// produce exactly its records. At least one bundle is always returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when `desired_bundle_size_bytes` is zero.
    fn split_into_bundles(&self, desired_bundle_size_bytes: u64, options: &Options)
    -> Result<Vec<Self>>;

    /// Best-effort size of this source in bytes, used only for split planning.
    ///
    /// # Errors
    ///
    /// Implementations may fail when the size requires I/O.
    fn estimated_size_bytes(&self, options: &Options) -> Result<u64>;

    /// Creates a fresh, unstarted reader over this source.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying data cannot be opened.
    fn create_reader(&self, options: &Options) -> Result<Self::Reader>;
}

/// A stateful cursor over one [`BoundedSource`].
pub trait BoundedReader: Send {
    /// The record type.
    type Item: Clone + Send;

    /// The source type residuals are expressed in.
    type Source: BoundedSource<Item = Self::Item>;

    /// The handle used to split this reader from another thread.
    type Splitter: Splitter<Source = Self::Source> + 'static;

    /// Moves to the first record. Returns whether one is available.
    ///
    /// # Errors
    ///
    /// Returns `Error::IllegalState` if called more than once.
    fn start(&mut self) -> Result<bool>;

    /// Moves to the next record. Returns whether one is available; after
    /// `false` the reader is finished.
    ///
    /// # Errors
    ///
    /// Returns `Error::IllegalState` if called before `start` or after the
    /// reader has finished.
    fn advance(&mut self) -> Result<bool>;

    /// The record at the current position.
    ///
    /// # Errors
    ///
    /// Returns `Error::IllegalState` unless the last `start`/`advance` call
    /// returned `true`.
    fn current(&self) -> Result<&Self::Item>;

    /// A source describing this reader's current range, including any
    /// truncation by an accepted split.
    ///
    /// # Errors
    ///
    /// Returns `Error::MutexPoisoned` if the range cannot be inspected.
    fn current_source(&self) -> Result<Self::Source>;

    /// A handle that can split this reader or observe its progress from
    /// another thread while this one keeps reading.
    fn splitter(&self) -> Self::Splitter;

    /// Fraction of this reader's current range consumed, `None` if unknown.
    fn fraction_consumed(&self) -> Option<f64> {
        self.splitter().fraction_consumed()
    }

    /// Truncates this reader at `fraction` of its current range and returns
    /// the unread remainder as a new source, or `None` if the split is refused.
    fn split_at_fraction(&self, fraction: f64) -> Option<Self::Source> {
        self.splitter().split_at_fraction(fraction)
    }
}

/// The control-thread side of a reader.
///
/// Both methods are safe to call concurrently with the owning reader's
/// `start`/`advance`.
pub trait Splitter: Send + Sync {
    /// The residual source type.
    type Source;

    /// See [`BoundedReader::split_at_fraction`].
    fn split_at_fraction(&self, fraction: f64) -> Option<Self::Source>;

    /// See [`BoundedReader::fraction_consumed`].
    fn fraction_consumed(&self) -> Option<f64>;
}

/// Reader lifecycle shared by the concrete readers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReaderState {
    #[default]
    Unstarted,
    Started,
    Finished,
}

impl ReaderState {
    /// Checks that `start` may be called and moves to `Started`.
    pub(crate) fn begin(&mut self) -> Result<()> {
        match self {
            Self::Unstarted => {
                *self = Self::Started;
                Ok(())
            }
            _ => Err(crate::BoundedSourceError::IllegalState(
                "start called more than once".into(),
            )
            .into()),
        }
    }

    /// Checks that `advance` may be called.
    pub(crate) fn check_advance(self) -> Result<()> {
        match self {
            Self::Started => Ok(()),
            Self::Unstarted => Err(crate::BoundedSourceError::IllegalState(
                "advance called before start".into(),
            )
            .into()),
            Self::Finished => Err(crate::BoundedSourceError::IllegalState(
                "advance called after the reader finished".into(),
            )
            .into()),
        }
    }
}

/// Rejects a zero bundle size hint.
pub(crate) fn check_bundle_size(desired_bundle_size_bytes: u64) -> Result<()> {
    if desired_bundle_size_bytes == 0 {
        return Err(crate::BoundedSourceError::Config(
            "desired bundle size must be positive".into(),
        )
        .into());
    }
    Ok(())
}

//! A source of consecutive integers.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::range_tracker::OffsetRangeTracker;
use crate::source::{BoundedReader, BoundedSource, ReaderState, Splitter, check_bundle_size};
use crate::{BoundedSourceError, Options};

/// Produces the integers `start..end` in order.
///
/// # Examples
///
/// ```
/// use bounded_source::{CountingSource, Options, testing};
///
/// let source = CountingSource::up_to(5);
/// let records = testing::read_from_source(&source, &Options::default())?;
/// assert_eq!(records, vec![0, 1, 2, 3, 4]);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "CountingRange")]
pub struct CountingSource {
    start: u64,
    end: u64,
}

/// Serialized form of a [`CountingSource`], normalized on the way in.
#[derive(Deserialize)]
struct CountingRange {
    start: u64,
    end: u64,
}

impl From<CountingRange> for CountingSource {
    fn from(raw: CountingRange) -> Self {
        Self::range(raw.start, raw.end)
    }
}

impl CountingSource {
    /// Estimated encoded size of one record.
    pub const BYTES_PER_RECORD: u64 = 8;

    /// The integers `0..n`.
    #[must_use]
    pub const fn up_to(n: u64) -> Self {
        Self { start: 0, end: n }
    }

    /// The integers `start..end`; an inverted range is empty.
    #[must_use]
    pub const fn range(start: u64, end: u64) -> Self {
        if end < start {
            Self { start, end: start }
        } else {
            Self { start, end }
        }
    }

    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of records this source produces.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl BoundedSource for CountingSource {
    type Item = u64;
    type Reader = CountingReader;

    fn split_into_bundles(
        &self,
        desired_bundle_size_bytes: u64,
        _options: &Options,
    ) -> Result<Vec<Self>> {
        check_bundle_size(desired_bundle_size_bytes)?;

        let per_bundle = (desired_bundle_size_bytes / Self::BYTES_PER_RECORD).max(1);
        if self.len() <= per_bundle {
            return Ok(vec![*self]);
        }

        let bundles: Vec<Self> = (self.start..self.end)
            .step_by(usize::try_from(per_bundle).unwrap_or(usize::MAX))
            .map(|start| Self::range(start, start.saturating_add(per_bundle).min(self.end)))
            .collect();
        log::debug!(
            "split counting source [{}, {}) into {} bundles of {per_bundle} records",
            self.start,
            self.end,
            bundles.len()
        );

        Ok(bundles)
    }

    fn estimated_size_bytes(&self, _options: &Options) -> Result<u64> {
        Ok(self.len().saturating_mul(Self::BYTES_PER_RECORD))
    }

    fn create_reader(&self, _options: &Options) -> Result<CountingReader> {
        Ok(CountingReader::new(*self))
    }
}

/// Reader over a [`CountingSource`].
#[derive(Debug)]
pub struct CountingReader {
    first: u64,
    tracker: Arc<OffsetRangeTracker>,
    state: ReaderState,
    current: Option<u64>,
}

impl CountingReader {
    fn new(source: CountingSource) -> Self {
        Self {
            first: source.start,
            tracker: Arc::new(OffsetRangeTracker::new(source.start, source.end)),
            state: ReaderState::default(),
            current: None,
        }
    }

    fn claim(&mut self, position: u64) -> Result<bool> {
        if self.tracker.try_claim(position)? {
            self.current = Some(position);
            Ok(true)
        } else {
            log::trace!("counting reader finished before {position}");
            self.current = None;
            self.state = ReaderState::Finished;
            Ok(false)
        }
    }
}

impl BoundedReader for CountingReader {
    type Item = u64;
    type Source = CountingSource;
    type Splitter = CountingSplitter;

    fn start(&mut self) -> Result<bool> {
        self.state.begin()?;
        self.claim(self.first)
    }

    fn advance(&mut self) -> Result<bool> {
        self.state.check_advance()?;
        let next = self.current.map_or(self.first, |current| current + 1);
        self.claim(next)
    }

    fn current(&self) -> Result<&u64> {
        match (self.state, self.current.as_ref()) {
            (ReaderState::Started, Some(current)) => Ok(current),
            (state, _) => Err(BoundedSourceError::IllegalState(format!(
                "no current record in state {state:?}"
            ))
            .into()),
        }
    }

    fn current_source(&self) -> Result<CountingSource> {
        let (start, stop) = self.tracker.range()?;
        Ok(CountingSource::range(start, stop))
    }

    fn splitter(&self) -> CountingSplitter {
        CountingSplitter {
            tracker: Arc::clone(&self.tracker),
        }
    }
}

/// Control handle for a [`CountingReader`].
#[derive(Clone, Debug)]
pub struct CountingSplitter {
    tracker: Arc<OffsetRangeTracker>,
}

impl Splitter for CountingSplitter {
    type Source = CountingSource;

    fn split_at_fraction(&self, fraction: f64) -> Option<CountingSource> {
        self.tracker
            .try_split_at_fraction(fraction)
            .map(|(start, end)| CountingSource::range(start, end))
    }

    fn fraction_consumed(&self) -> Option<f64> {
        self.tracker.fraction_consumed()
    }
}

//! Offset range tracking shared by a reader and its control thread.
//!
//! An [`OffsetRangeTracker`] guards the half-open range `[start, stop)` of a
//! reader together with the position of the last record it returned. The
//! read thread claims each record position with [`OffsetRangeTracker::try_claim`]
//! before producing it; the control thread truncates the range with
//! [`OffsetRangeTracker::try_split_at_fraction`]. Both happen under one lock,
//! so every record position is owned by exactly one side of any split.

use std::sync::{Mutex, MutexGuard};

use anyhow::Result;

use crate::BoundedSourceError;

#[derive(Debug)]
struct TrackerState {
    start: u64,
    stop: u64,
    last_record_start: Option<u64>,
    done: bool,
}

impl TrackerState {
    fn fraction_consumed(&self) -> f64 {
        if self.done {
            return 1.0;
        }
        match self.last_record_start {
            None => 0.0,
            Some(_) if self.stop <= self.start => 1.0,
            Some(last) => {
                let consumed = last.saturating_sub(self.start) as f64;
                let total = (self.stop - self.start) as f64;
                (consumed / total).clamp(0.0, 1.0)
            }
        }
    }

    /// Maps a fraction of the current range onto a position, rounding up.
    fn position_for_fraction(&self, fraction: f64) -> u64 {
        let span = self.stop.saturating_sub(self.start) as f64;
        self.start + (fraction * span).ceil() as u64
    }
}

/// The compare-and-truncate region for an offset-addressed reader.
#[derive(Debug)]
pub struct OffsetRangeTracker {
    state: Mutex<TrackerState>,
}

impl OffsetRangeTracker {
    /// Creates a tracker over `[start, stop)` with nothing claimed yet.
    #[must_use]
    pub const fn new(start: u64, stop: u64) -> Self {
        Self {
            state: Mutex::new(TrackerState {
                start,
                stop,
                last_record_start: None,
                done: false,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TrackerState>> {
        self.state
            .lock()
            .map_err(|_| BoundedSourceError::MutexPoisoned.into())
    }

    /// Claims the record starting at `position` for the primary reader.
    ///
    /// Returns `false`, and marks the range done, when `position` is at or past
    /// the current stop, including a stop moved by a concurrent split. The
    /// first successful claim moves the range start up to `position`, so bytes
    /// skipped before the first record never count as consumed.
    ///
    /// # Errors
    ///
    /// Returns `Error::IllegalState` if positions are not claimed in strictly
    /// increasing order from `start`, and `Error::MutexPoisoned` if the lock is poisoned.
    pub fn try_claim(&self, position: u64) -> Result<bool> {
        let mut state = self.lock()?;

        let floor_ok = match state.last_record_start {
            Some(last) => position > last,
            None => position >= state.start,
        };
        if !floor_ok {
            return Err(BoundedSourceError::IllegalState(format!(
                "claimed position {position} is not after {:?} in range [{}, {})",
                state.last_record_start, state.start, state.stop
            ))
            .into());
        }

        if position >= state.stop {
            state.done = true;
            return Ok(false);
        }

        if state.last_record_start.is_none() {
            state.start = position;
        }
        state.last_record_start = Some(position);
        Ok(true)
    }

    /// Marks the range exhausted when the data ends before `stop`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MutexPoisoned` if the lock is poisoned.
    pub fn mark_done(&self) -> Result<()> {
        self.lock()?.done = true;
        Ok(())
    }

    /// Truncates the range at `fraction` of its current extent.
    ///
    /// On success the tracker's stop becomes the split position and the
    /// residual range `[position, old_stop)` is returned. The split is refused
    /// when the range is done or when `fraction` does not exceed
    /// [`Self::fraction_consumed`]. It is also refused when the position is at
    /// or before the last claimed record (the start if nothing is claimed yet),
    /// or at or past the current stop.
    #[must_use]
    pub fn try_split_at_fraction(&self, fraction: f64) -> Option<(u64, u64)> {
        if !(fraction > 0.0 && fraction < 1.0) {
            log::debug!("refusing split at out-of-range fraction {fraction}");
            return None;
        }

        let Ok(mut state) = self.state.lock() else {
            log::warn!("refusing split at {fraction}: range tracker lock poisoned");
            return None;
        };

        if state.done {
            log::debug!("refusing split at {fraction}: reader already finished");
            return None;
        }

        let consumed = state.fraction_consumed();
        if fraction <= consumed {
            log::debug!("refusing split at {fraction}: {consumed} already consumed");
            return None;
        }

        let position = state.position_for_fraction(fraction);
        let floor = state.last_record_start.unwrap_or(state.start);
        if position <= floor {
            log::debug!(
                "refusing split at {fraction}: position {position} is not after {floor} in [{}, {})",
                state.start,
                state.stop
            );
            return None;
        }
        if position >= state.stop {
            log::debug!(
                "refusing split at {fraction}: position {position} is not before stop {}",
                state.stop
            );
            return None;
        }

        let residual = (position, state.stop);
        state.stop = position;
        log::debug!(
            "split at {fraction}: primary [{}, {position}), residual [{}, {})",
            state.start,
            residual.0,
            residual.1
        );
        Some(residual)
    }

    /// Fraction of the current range consumed, or `None` if the lock is poisoned.
    #[must_use]
    pub fn fraction_consumed(&self) -> Option<f64> {
        self.state
            .lock()
            .ok()
            .map(|state| state.fraction_consumed())
    }

    /// The current `[start, stop)` range.
    ///
    /// # Errors
    ///
    /// Returns `Error::MutexPoisoned` if the lock is poisoned.
    pub fn range(&self) -> Result<(u64, u64)> {
        let state = self.lock()?;
        Ok((state.start, state.stop))
    }

    /// The position of the last claimed record.
    ///
    /// # Errors
    ///
    /// Returns `Error::MutexPoisoned` if the lock is poisoned.
    pub fn last_record_start(&self) -> Result<Option<u64>> {
        Ok(self.lock()?.last_record_start)
    }
}

//! Verification harness for [`BoundedSource`] and [`BoundedReader`] implementations.
//!
//! The readers here drive a reader through partial reads, split attempts and
//! residual reads, and the `assert_*` functions cross-check every stream a
//! split produces against a plain, unsplit read of the same source.
//!
//! Assertion failures are returned as [`Error::Assertion`](crate::BoundedSourceError::Assertion)
//! describing the expected and actual record counts, so callers can tell an
//! incorrect source apart from an I/O or configuration failure.
//!
//! # Examples
//!
//! ```
//! use bounded_source::{BoundedReader, BoundedSource, CountingSource, Options, testing};
//!
//! let options = Options::default();
//! let source = testing::to_unsplittable_source(CountingSource::up_to(100));
//! let mut reader = source.create_reader(&options)?;
//!
//! let mut records = testing::read_n_items_from_unstarted_reader(&mut reader, 40)?;
//! assert!(reader.split_at_fraction(0.5).is_none());
//! records.extend(testing::read_remaining_from_reader(&mut reader, true)?);
//!
//! assert_eq!(records.len(), 100);
//! assert_eq!(reader.fraction_consumed(), Some(1.0));
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Barrier;
use std::thread;

use anyhow::Result;
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::source::{BoundedReader, BoundedSource, Splitter};
use crate::unsplittable::Unsplittable;
use crate::{BoundedSourceError, Options, Processing};

/// Records shown per side when two record sets differ.
const MISMATCH_SAMPLE: usize = 10;

/// What a split-at-fraction check requires of the reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpectedSplitOutcome {
    /// The split must be accepted, and primary plus residual must match the source.
    MustSucceedAndBeConsistent,
    /// The split must be refused, and the reader must still read the whole source.
    MustFail,
    /// Either outcome is fine, as long as no record is lost or duplicated.
    MustBeConsistentIfSucceeds,
}

/// Record counts observed by a split-at-fraction check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitAtFractionResult {
    /// Records produced by the primary reader, before and after the split attempt.
    pub num_primary_items: usize,
    /// Records produced by the residual, or `None` if the split was refused.
    pub num_residual_items: Option<usize>,
}

impl SplitAtFractionResult {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.num_residual_items.is_some()
    }
}

/// Totals from [`assert_split_at_fraction_exhaustive`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitSweepSummary {
    /// Records in the source.
    pub items: usize,
    /// Split attempts made, including concurrent ones.
    pub attempts: usize,
    /// Attempts the reader accepted.
    pub accepted: usize,
    /// Attempts the reader refused.
    pub refused: usize,
}

impl SplitSweepSummary {
    fn record(&mut self, result: SplitAtFractionResult) {
        self.attempts += 1;
        if result.succeeded() {
            self.accepted += 1;
        } else {
            self.refused += 1;
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.attempts += other.attempts;
        self.accepted += other.accepted;
        self.refused += other.refused;
        self
    }
}

/// Reads every record of `source` with a fresh reader, in order.
///
/// # Errors
///
/// Propagates any error from creating or driving the reader.
pub fn read_from_source<S: BoundedSource>(source: &S, options: &Options) -> Result<Vec<S::Item>> {
    let mut reader = source.create_reader(options)?;
    read_remaining_from_reader(&mut reader, false)
}

/// Starts `reader` and reads up to `n` records.
///
/// Fewer than `n` records are returned only when the reader finishes first.
///
/// # Errors
///
/// Propagates reader errors.
pub fn read_n_items_from_unstarted_reader<R: BoundedReader>(
    reader: &mut R,
    n: usize,
) -> Result<Vec<R::Item>> {
    read_n_items(reader, n, false)
}

/// Like [`read_n_items_from_unstarted_reader`], but requires exactly `n` records.
///
/// # Errors
///
/// Returns `Error::Assertion` if the reader finishes before `n` records.
pub fn read_exactly_n_items_from_unstarted_reader<R: BoundedReader>(
    reader: &mut R,
    n: usize,
) -> Result<Vec<R::Item>> {
    let items = read_n_items(reader, n, false)?;
    if items.len() < n {
        return Err(
            BoundedSourceError::mismatch("records available before exhaustion", n, items.len())
                .into(),
        );
    }
    Ok(items)
}

/// Advances an already started `reader` up to `n` times, collecting each record.
///
/// The record current when this is called is not included.
///
/// # Errors
///
/// Propagates reader errors.
pub fn read_n_items_from_started_reader<R: BoundedReader>(
    reader: &mut R,
    n: usize,
) -> Result<Vec<R::Item>> {
    read_n_items(reader, n, true)
}

fn read_n_items<R: BoundedReader>(reader: &mut R, n: usize, started: bool) -> Result<Vec<R::Item>> {
    let mut items = Vec::with_capacity(n);
    let mut started = started;
    while items.len() < n {
        let more = if started {
            reader.advance()?
        } else {
            started = true;
            reader.start()?
        };
        if !more {
            break;
        }
        items.push(reader.current()?.clone());
    }
    Ok(items)
}

/// Reads from the current position until `reader` finishes.
///
/// If `started` is false the reader is started first; otherwise the record
/// current at the time of the call is not included.
///
/// # Errors
///
/// Propagates reader errors.
pub fn read_remaining_from_reader<R: BoundedReader>(
    reader: &mut R,
    started: bool,
) -> Result<Vec<R::Item>> {
    let mut items = Vec::new();
    let mut more = if started {
        reader.advance()?
    } else {
        reader.start()?
    };
    while more {
        items.push(reader.current()?.clone());
        more = reader.advance()?;
    }
    Ok(items)
}

/// Wraps `delegate` so that it can never be split.
pub fn to_unsplittable_source<S: BoundedSource>(delegate: S) -> Unsplittable<S> {
    Unsplittable::new(delegate)
}

/// Counts occurrences of each record.
fn count_occurrences<T: Eq + Hash>(items: impl IntoIterator<Item = T>) -> HashMap<T, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Checks that two record sequences are equal as multisets.
fn assert_same_records<T>(what: &str, expected: &[T], actual: &[T]) -> Result<()>
where
    T: Eq + Hash + Debug,
{
    let expected_counts = count_occurrences(expected);
    let actual_counts = count_occurrences(actual);
    if expected_counts == actual_counts {
        return Ok(());
    }

    let missing: Vec<_> = expected_counts
        .iter()
        .filter(|(item, count)| actual_counts.get(*item).copied().unwrap_or(0) < **count)
        .map(|(item, _)| *item)
        .take(MISMATCH_SAMPLE)
        .collect();
    let unexpected: Vec<_> = actual_counts
        .iter()
        .filter(|(item, count)| expected_counts.get(*item).copied().unwrap_or(0) < **count)
        .map(|(item, _)| *item)
        .take(MISMATCH_SAMPLE)
        .collect();

    Err(BoundedSourceError::Assertion(format!(
        "{what}: expected {} records, got {}; missing or short {missing:?}; extra or duplicated {unexpected:?}",
        expected.len(),
        actual.len()
    ))
    .into())
}

/// Checks that `sources` together produce exactly the records of `reference`.
///
/// With [`Processing::Parallel`] the sources are read concurrently on the
/// rayon pool.
///
/// # Errors
///
/// Returns `Error::Assertion` if `sources` is empty or the records differ.
pub fn assert_sources_equal_reference_source<S, T>(
    reference: &S,
    sources: &[T],
    options: &Options,
) -> Result<()>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
    T: BoundedSource<Item = S::Item>,
{
    if sources.is_empty() {
        return Err(BoundedSourceError::Assertion("no sources to compare".into()).into());
    }

    let expected = read_from_source(reference, options)?;
    let per_source: Vec<Vec<S::Item>> = match options.processing() {
        Processing::Parallel => sources
            .par_iter()
            .map(|source| read_from_source(source, options))
            .collect::<Result<_>>()?,
        Processing::Sequential => sources
            .iter()
            .map(|source| read_from_source(source, options))
            .collect::<Result<_>>()?,
    };
    let actual: Vec<S::Item> = per_source.into_iter().flatten().collect();

    assert_same_records(
        &format!("{} sources against reference", sources.len()),
        &expected,
        &actual,
    )
}

/// Splits `source` into bundles and checks they cover it exactly.
///
/// Returns the number of bundles.
///
/// # Errors
///
/// Propagates `Error::Config` for a zero hint; returns `Error::Assertion` if
/// the bundles do not cover the source.
pub fn assert_split_into_bundles_covers<S>(
    source: &S,
    desired_bundle_size_bytes: u64,
    options: &Options,
) -> Result<usize>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
{
    let bundles = source.split_into_bundles(desired_bundle_size_bytes, options)?;
    assert_sources_equal_reference_source(source, &bundles, options)?;
    Ok(bundles.len())
}

/// Checks that an unstarted reader produces the same records as its current source.
///
/// # Errors
///
/// Returns `Error::Assertion` if the records differ.
pub fn assert_unstarted_reader_reads_same_as_its_source<R>(
    mut reader: R,
    options: &Options,
) -> Result<()>
where
    R: BoundedReader,
    R::Item: Eq + Hash + Debug,
{
    let expected = read_from_source(&reader.current_source()?, options)?;
    let actual = read_remaining_from_reader(&mut reader, false)?;
    assert_same_records("unstarted reader against its source", &expected, &actual)
}

/// Checks the progress contract of a full sequential read.
///
/// Fraction consumed must be `0.0` before `start` and while the first record
/// is current. It never decreases, stays within `[0.0, 1.0]` and is exactly
/// `1.0` once the reader finishes. Unknown (`None`) readings are allowed
/// mid-read.
///
/// # Errors
///
/// Returns `Error::Assertion` on the first violation.
pub fn assert_fraction_consumed_monotonic<S: BoundedSource>(
    source: &S,
    options: &Options,
) -> Result<()> {
    let mut reader = source.create_reader(options)?;

    let initial = reader.fraction_consumed();
    if initial.is_some_and(|fraction| fraction != 0.0) {
        return Err(
            BoundedSourceError::mismatch("fraction consumed before start", Some(0.0), initial)
                .into(),
        );
    }

    let mut last = 0.0_f64;
    let mut index = 0_usize;
    let mut more = reader.start()?;
    if more {
        let first = reader.fraction_consumed();
        if first.is_some_and(|fraction| fraction != 0.0) {
            return Err(BoundedSourceError::mismatch(
                "fraction consumed at the first record",
                Some(0.0),
                first,
            )
            .into());
        }
    }
    while more {
        if let Some(fraction) = reader.fraction_consumed() {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(BoundedSourceError::Assertion(format!(
                    "fraction consumed {fraction} at record {index} is outside [0, 1]"
                ))
                .into());
            }
            if fraction < last {
                return Err(BoundedSourceError::Assertion(format!(
                    "fraction consumed decreased from {last} to {fraction} at record {index}"
                ))
                .into());
            }
            last = fraction;
        }
        index += 1;
        more = reader.advance()?;
    }

    let last_reading = reader.fraction_consumed();
    if last_reading != Some(1.0) {
        return Err(BoundedSourceError::mismatch(
            "fraction consumed after the last record",
            Some(1.0),
            last_reading,
        )
        .into());
    }

    Ok(())
}

/// Reads `n` records, splits at `fraction`, and checks the outcome.
///
/// # Errors
///
/// Returns `Error::Assertion` if the outcome contradicts `expected`, or if
/// any record is lost or duplicated across primary and residual.
pub fn assert_split_at_fraction_behavior<S>(
    source: &S,
    num_items_to_read_before_split: usize,
    fraction: f64,
    expected: ExpectedSplitOutcome,
    options: &Options,
) -> Result<SplitAtFractionResult>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
{
    let reference = read_from_source(source, options)?;
    verify_single_split(
        source,
        &reference,
        num_items_to_read_before_split,
        fraction,
        expected,
        options,
    )
}

/// Shorthand for [`ExpectedSplitOutcome::MustSucceedAndBeConsistent`].
///
/// # Errors
///
/// See [`assert_split_at_fraction_behavior`].
pub fn assert_split_at_fraction_succeeds_and_consistent<S>(
    source: &S,
    num_items_to_read_before_split: usize,
    fraction: f64,
    options: &Options,
) -> Result<SplitAtFractionResult>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
{
    assert_split_at_fraction_behavior(
        source,
        num_items_to_read_before_split,
        fraction,
        ExpectedSplitOutcome::MustSucceedAndBeConsistent,
        options,
    )
}

/// Shorthand for [`ExpectedSplitOutcome::MustFail`].
///
/// # Errors
///
/// See [`assert_split_at_fraction_behavior`].
pub fn assert_split_at_fraction_fails<S>(
    source: &S,
    num_items_to_read_before_split: usize,
    fraction: f64,
    options: &Options,
) -> Result<()>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
{
    assert_split_at_fraction_behavior(
        source,
        num_items_to_read_before_split,
        fraction,
        ExpectedSplitOutcome::MustFail,
        options,
    )
    .map(|_| ())
}

fn verify_single_split<S>(
    source: &S,
    reference: &[S::Item],
    num_items_to_read_before_split: usize,
    fraction: f64,
    expected: ExpectedSplitOutcome,
    options: &Options,
) -> Result<SplitAtFractionResult>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
{
    let n = num_items_to_read_before_split;
    let mut reader = source.create_reader(options)?;
    let mut primary = read_n_items_from_unstarted_reader(&mut reader, n)?;
    let started = n > 0;
    let finished = primary.len() < n;

    let residual = reader.split_at_fraction(fraction);
    match (&residual, expected) {
        (None, ExpectedSplitOutcome::MustSucceedAndBeConsistent) => {
            return Err(BoundedSourceError::Assertion(format!(
                "split at {fraction} after {n} records was refused, expected it to succeed"
            ))
            .into());
        }
        (Some(_), ExpectedSplitOutcome::MustFail) => {
            return Err(BoundedSourceError::Assertion(format!(
                "split at {fraction} after {n} records succeeded, expected it to be refused"
            ))
            .into());
        }
        (Some(_), _) if finished => {
            return Err(BoundedSourceError::Assertion(format!(
                "split at {fraction} succeeded on a finished reader after {} records",
                primary.len()
            ))
            .into());
        }
        _ => {}
    }

    let Some(residual) = residual else {
        if !finished {
            primary.extend(read_remaining_from_reader(&mut reader, started)?);
        }
        assert_same_records(
            &format!("records after split at {fraction} was refused"),
            reference,
            &primary,
        )?;
        return Ok(SplitAtFractionResult {
            num_primary_items: primary.len(),
            num_residual_items: None,
        });
    };

    let primary_source = reader.current_source()?;
    primary.extend(read_remaining_from_reader(&mut reader, started)?);
    let primary_expected = read_from_source(&primary_source, options)?;
    assert_same_records(
        &format!("primary reader against its source after split at {fraction}"),
        &primary_expected,
        &primary,
    )?;

    let residual_items = read_from_source(&residual, options)?;
    let num_residual_items = residual_items.len();
    let combined: Vec<S::Item> = primary.iter().cloned().chain(residual_items).collect();
    assert_same_records(
        &format!("primary plus residual after split at {fraction} following {n} records"),
        reference,
        &combined,
    )?;

    Ok(SplitAtFractionResult {
        num_primary_items: primary.len(),
        num_residual_items: Some(num_residual_items),
    })
}

/// Alternates reading and splitting according to `plan`.
///
/// Each `(count, fraction)` step reads `count` more records from the primary
/// reader, then asks it to split at `fraction` of its remaining range and
/// reads any residual in full. After the plan, the primary reader is drained.
/// Fractions are normally increasing; refused splits are allowed. The primary
/// stream plus every residual must equal the unsplit source, and fraction
/// consumed must never decrease across an accepted split.
///
/// Returns the number of accepted splits.
///
/// # Errors
///
/// Returns `Error::Assertion` on lost or duplicated records, on a split
/// accepted after the reader finished, or on a progress regression.
pub fn assert_interleaved_splits_consistent<S>(
    source: &S,
    plan: &[(usize, f64)],
    options: &Options,
) -> Result<usize>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
{
    let reference = read_from_source(source, options)?;
    let mut reader = source.create_reader(options)?;
    let mut produced = Vec::with_capacity(reference.len());
    let mut started = false;
    let mut finished = false;
    let mut accepted = 0;

    for &(count, fraction) in plan {
        if !finished && count > 0 {
            let items = read_n_items(&mut reader, count, started)?;
            started = true;
            finished = items.len() < count;
            produced.extend(items);
        }

        let before = reader.fraction_consumed();
        let Some(residual) = reader.split_at_fraction(fraction) else {
            log::debug!("interleaved split at {fraction} refused after {} records", produced.len());
            continue;
        };
        if finished {
            return Err(BoundedSourceError::Assertion(format!(
                "split at {fraction} succeeded on a finished reader after {} records",
                produced.len()
            ))
            .into());
        }

        accepted += 1;
        if let (Some(before), Some(after)) = (before, reader.fraction_consumed()) {
            if after < before {
                return Err(BoundedSourceError::Assertion(format!(
                    "fraction consumed decreased from {before} to {after} across split at {fraction}"
                ))
                .into());
            }
        }
        produced.extend(read_from_source(&residual, options)?);
    }

    if !finished {
        produced.extend(read_remaining_from_reader(&mut reader, started)?);
    }

    assert_same_records(
        &format!("primary plus {accepted} residuals from interleaved splits"),
        &reference,
        &produced,
    )?;
    Ok(accepted)
}

/// Races a split at `fraction` on a control thread against the read thread
/// draining the reader after `num_items_to_read_before_split` records.
///
/// Whichever side wins, primary plus residual must equal the unsplit source.
///
/// # Errors
///
/// Returns `Error::Assertion` on lost or duplicated records or if the control
/// thread panics.
pub fn assert_split_at_fraction_concurrent<S>(
    source: &S,
    num_items_to_read_before_split: usize,
    fraction: f64,
    options: &Options,
) -> Result<SplitAtFractionResult>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
{
    let reference = read_from_source(source, options)?;
    verify_concurrent_split(
        source,
        &reference,
        num_items_to_read_before_split,
        fraction,
        options,
    )
}

fn verify_concurrent_split<S>(
    source: &S,
    reference: &[S::Item],
    num_items_to_read_before_split: usize,
    fraction: f64,
    options: &Options,
) -> Result<SplitAtFractionResult>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug,
{
    let n = num_items_to_read_before_split;
    let mut reader = source.create_reader(options)?;
    let mut primary = read_n_items_from_unstarted_reader(&mut reader, n)?;
    let started = n > 0;
    let finished = primary.len() < n;

    let splitter = reader.splitter();
    let barrier = Barrier::new(2);
    let (remaining, residual) = thread::scope(|scope| {
        let control = scope.spawn(|| {
            barrier.wait();
            splitter.split_at_fraction(fraction)
        });

        barrier.wait();
        let remaining = if finished {
            Ok(Vec::new())
        } else {
            read_remaining_from_reader(&mut reader, started)
        };
        (remaining, control.join())
    });

    let residual = residual.map_err(|_| {
        BoundedSourceError::Assertion(format!("control thread panicked splitting at {fraction}"))
    })?;
    primary.extend(remaining?);

    let residual_items = match &residual {
        Some(residual) => read_from_source(residual, options)?,
        None => Vec::new(),
    };
    let num_residual_items = residual.as_ref().map(|_| residual_items.len());
    let combined: Vec<S::Item> = primary.iter().cloned().chain(residual_items).collect();
    assert_same_records(
        &format!("primary plus residual after concurrent split at {fraction} following {n} records"),
        reference,
        &combined,
    )?;

    Ok(SplitAtFractionResult {
        num_primary_items: primary.len(),
        num_residual_items,
    })
}

/// Tries splits after every prefix length at every fraction of the grid.
///
/// For each `n` from `0` to the number of records, tries each fraction
/// `i / grid` for `i` in `1..grid` (`grid` from [`Options::fraction_grid`]),
/// requiring consistency whenever a split is accepted, then races one
/// concurrent split at the midpoint. Prefix lengths are swept in parallel with
/// [`Processing::Parallel`].
///
/// # Errors
///
/// Returns the first `Error::Assertion` encountered.
pub fn assert_split_at_fraction_exhaustive<S>(
    source: &S,
    options: &Options,
) -> Result<SplitSweepSummary>
where
    S: BoundedSource,
    S::Item: Eq + Hash + Debug + Sync,
{
    let reference = read_from_source(source, options)?;
    let grid = options.fraction_grid().max(2);

    let sweep = |n: usize| -> Result<SplitSweepSummary> {
        let mut summary = SplitSweepSummary::default();
        for i in 1..grid {
            let fraction = f64::from(i) / f64::from(grid);
            summary.record(verify_single_split(
                source,
                &reference,
                n,
                fraction,
                ExpectedSplitOutcome::MustBeConsistentIfSucceeds,
                options,
            )?);
        }
        summary.record(verify_concurrent_split(source, &reference, n, 0.5, options)?);
        Ok(summary)
    };

    let prefixes = 0..=reference.len();
    let summaries: Vec<SplitSweepSummary> = match options.processing() {
        Processing::Parallel => prefixes.into_par_iter().map(sweep).collect::<Result<_>>()?,
        Processing::Sequential => prefixes.map(sweep).collect::<Result<_>>()?,
    };

    let summary = summaries
        .into_iter()
        .fold(SplitSweepSummary::default(), SplitSweepSummary::merge);
    log::debug!(
        "exhaustive split sweep over {} records: {} attempts, {} accepted, {} refused",
        reference.len(),
        summary.attempts,
        summary.accepted,
        summary.refused
    );

    Ok(SplitSweepSummary {
        items: reference.len(),
        ..summary
    })
}

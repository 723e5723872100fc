//! A named set of verification checks run against one source.

use std::fmt::{self, Display, Formatter};
use std::hash::Hash;

use anyhow::Result;
use serde::Serialize;

use crate::source::BoundedSource;
use crate::testing::{self, ExpectedSplitOutcome};
use crate::{BoundedSourceError, Options};

/// The outcome of one check.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

/// Results of a [`Suite`] run, in the order the checks ran.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    source: String,
    checks: Vec<Check>,
}

impl Report {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            checks: Vec::new(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Whether every check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Number of failed checks.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|check| !check.passed).count()
    }

    /// Records `result` under `name`.
    ///
    /// An `Error::Assertion` becomes a failed check; any other error is
    /// returned, since it means the check could not run at all.
    pub fn record<T>(
        &mut self,
        name: &'static str,
        result: Result<T>,
        detail: impl FnOnce(&T) -> String,
    ) -> Result<()> {
        let check = match result {
            Ok(value) => Check {
                name,
                passed: true,
                detail: detail(&value),
            },
            Err(err) => match err.downcast_ref::<BoundedSourceError>() {
                Some(BoundedSourceError::Assertion(message)) => {
                    log::debug!("check {name} failed: {message}");
                    Check {
                        name,
                        passed: false,
                        detail: message.clone(),
                    }
                }
                _ => return Err(err),
            },
        };
        self.checks.push(check);
        Ok(())
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let status = if check.passed { "ok" } else { "FAILED" };
            writeln!(f, "{} {status} {}", check.name, check.detail)?;
        }
        write!(
            f,
            "{}: {} checks, {} failed",
            self.source,
            self.checks.len(),
            self.failures()
        )
    }
}

/// Which checks to run and where to split.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suite {
    /// Records read before the single and concurrent split checks.
    split_after: usize,
    /// Fraction used by the single, concurrent and interleaved split checks.
    fraction: f64,
    /// The source must refuse every split.
    unsplittable: bool,
    /// Also split after every prefix length against the fraction grid.
    exhaustive: bool,
}

impl Default for Suite {
    fn default() -> Self {
        Self {
            split_after: 0,
            fraction: 0.5,
            unsplittable: false,
            exhaustive: false,
        }
    }
}

impl Suite {
    #[must_use]
    pub const fn with_split_after(mut self, split_after: usize) -> Self {
        self.split_after = split_after;
        self
    }

    /// # Errors
    ///
    /// Returns `Error::Config` unless `fraction` lies in `(0, 1)`.
    pub fn with_fraction(mut self, fraction: f64) -> Result<Self> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(BoundedSourceError::Config(format!(
                "split fraction must be between 0 and 1 exclusive, got {fraction}"
            ))
            .into());
        }
        self.fraction = fraction;
        Ok(self)
    }

    #[must_use]
    pub const fn with_unsplittable(mut self, unsplittable: bool) -> Self {
        self.unsplittable = unsplittable;
        self
    }

    #[must_use]
    pub const fn with_exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    #[must_use]
    pub const fn split_after(&self) -> usize {
        self.split_after
    }

    #[must_use]
    pub const fn fraction(&self) -> f64 {
        self.fraction
    }

    #[must_use]
    pub const fn unsplittable(&self) -> bool {
        self.unsplittable
    }

    #[must_use]
    pub const fn exhaustive(&self) -> bool {
        self.exhaustive
    }

    /// Runs every check against `source` and collects the results.
    ///
    /// # Errors
    ///
    /// Returns any error other than `Error::Assertion`, such as an I/O
    /// failure or a zero bundle size.
    pub fn run<S>(&self, label: &str, source: &S, options: &Options) -> Result<Report>
    where
        S: BoundedSource,
        S::Item: Eq + Hash + fmt::Debug + Sync,
    {
        let mut report = Report::new(label);
        let n = self.split_after;
        let fraction = self.fraction;

        report.record(
            "bundles-cover",
            testing::assert_split_into_bundles_covers(source, options.bundle_size(), options),
            |bundles| format!("{bundles} bundles of at most {} bytes", options.bundle_size()),
        )?;

        report.record(
            "unstarted-reader",
            source
                .create_reader(options)
                .and_then(|reader| {
                    testing::assert_unstarted_reader_reads_same_as_its_source(reader, options)
                }),
            |()| "reads the same records as its source".to_string(),
        )?;

        report.record(
            "fraction-monotonic",
            testing::assert_fraction_consumed_monotonic(source, options),
            |()| "0.0 before reading, non-decreasing, 1.0 when finished".to_string(),
        )?;

        let expected = if self.unsplittable {
            ExpectedSplitOutcome::MustFail
        } else {
            ExpectedSplitOutcome::MustBeConsistentIfSucceeds
        };
        report.record(
            "split-at-fraction",
            testing::assert_split_at_fraction_behavior(source, n, fraction, expected, options),
            |result| match result.num_residual_items {
                Some(residual) => format!(
                    "split at {fraction} after {n}: primary {}, residual {residual}",
                    result.num_primary_items
                ),
                None => format!(
                    "split at {fraction} after {n} refused: {} records",
                    result.num_primary_items
                ),
            },
        )?;

        report.record(
            "concurrent-split",
            testing::assert_split_at_fraction_concurrent(source, n, fraction, options),
            |result| {
                let outcome = if result.succeeded() { "accepted" } else { "refused" };
                format!("split at {fraction} after {n} raced against reading: {outcome}")
            },
        )?;

        let plan = [(n, fraction), (1, fraction), (1, fraction)];
        report.record(
            "interleaved-splits",
            testing::assert_interleaved_splits_consistent(source, &plan, options),
            |accepted| format!("{accepted} of {} splits accepted", plan.len()),
        )?;

        if self.exhaustive {
            report.record(
                "exhaustive-splits",
                testing::assert_split_at_fraction_exhaustive(source, options),
                |summary| {
                    format!(
                        "{} records, {} attempts, {} accepted, {} refused",
                        summary.items, summary.attempts, summary.accepted, summary.refused
                    )
                },
            )?;
        }

        if self.unsplittable {
            report.record(
                "refuses-splits",
                source
                    .split_into_bundles(1, options)
                    .and_then(|bundles| {
                        if bundles.len() == 1 {
                            Ok(())
                        } else {
                            Err(BoundedSourceError::mismatch(
                                "bundles of an unsplittable source",
                                1,
                                bundles.len(),
                            )
                            .into())
                        }
                    }),
                |()| "one bundle at the smallest hint".to_string(),
            )?;
        }

        log::info!(
            "verified {label}: {} checks, {} failed",
            report.checks.len(),
            report.failures()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CountingSource, Processing, Unsplittable};

    fn options() -> Options {
        Options::default().with_processing(Processing::Sequential)
    }

    #[test]
    fn test_record_turns_assertion_into_failure() {
        let mut report = Report::new("test");
        report
            .record(
                "bad",
                Err::<(), _>(BoundedSourceError::Assertion("lost record 7".into()).into()),
                |()| String::new(),
            )
            .unwrap();
        assert!(!report.passed());
        assert_eq!(report.checks()[0].detail, "lost record 7");
    }

    #[test]
    fn test_record_propagates_other_errors() {
        let mut report = Report::new("test");
        let result = report.record(
            "io",
            Err::<(), _>(BoundedSourceError::Config("bad".into()).into()),
            |()| String::new(),
        );
        assert!(result.is_err());
        assert!(report.checks().is_empty());
    }

    #[test]
    fn test_suite_passes_counting_source() {
        let suite = Suite::default().with_split_after(10);
        let report = suite
            .run("count", &CountingSource::up_to(100), &options())
            .unwrap();
        assert!(report.passed(), "{report}");
        assert_eq!(report.checks().len(), 6);
    }

    #[test]
    fn test_suite_passes_unsplittable_source() {
        let suite = Suite::default()
            .with_split_after(40)
            .with_unsplittable(true);
        let source = Unsplittable::new(CountingSource::up_to(100));
        let report = suite.run("count", &source, &options()).unwrap();
        assert!(report.passed(), "{report}");
        assert_eq!(report.checks().last().unwrap().name, "refuses-splits");
    }

    #[test]
    fn test_unsplittable_suite_flags_splitting_source() {
        let suite = Suite::default()
            .with_split_after(10)
            .with_unsplittable(true);
        let report = suite
            .run("count", &CountingSource::up_to(100), &options())
            .unwrap();
        assert!(!report.passed());
        assert!(report.checks().iter().any(|check| check.name == "split-at-fraction" && !check.passed));
    }

    #[test]
    fn test_fraction_validation() {
        assert!(Suite::default().with_fraction(0.0).is_err());
        assert!(Suite::default().with_fraction(1.0).is_err());
        assert!(Suite::default().with_fraction(f64::NAN).is_err());
        assert!(Suite::default().with_fraction(0.25).is_ok());
    }

    #[test]
    fn test_display_summarizes() {
        let mut report = Report::new("demo");
        report.record("one", Ok(()), |()| "fine".into()).unwrap();
        assert_eq!(report.to_string(), "one ok fine\ndemo: 1 checks, 0 failed");
    }
}

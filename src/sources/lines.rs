//! A source of newline-delimited UTF-8 records over a byte range.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use memchr::memchr;

use crate::input::Input;
use crate::range_tracker::OffsetRangeTracker;
use crate::source::{BoundedReader, BoundedSource, ReaderState, Splitter, check_bundle_size};
use crate::{BoundedSourceError, Options};

/// A line record, without its line terminator.
pub type Line = Box<str>;

/// Produces the lines whose first byte lies in `[start, end)` of an [`Input`].
///
/// A line that begins inside the range is read to its end even when that end
/// lies past `end`, and a line that begins before `start` is skipped. Splitting
/// a byte range anywhere therefore hands every line to exactly one side.
/// A trailing `\r` is stripped, so CRLF files read the same as LF files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineSource {
    input: Input,
    start: u64,
    end: u64,
}

impl LineSource {
    /// All lines of `input`.
    #[must_use]
    pub fn new(input: Input) -> Self {
        let end = input.len();
        Self {
            input,
            start: 0,
            end,
        }
    }

    /// The lines starting in `[start, end)` of `input`, clamped to its length.
    #[must_use]
    pub fn with_range(input: Input, start: u64, end: u64) -> Self {
        let end = end.min(input.len());
        let start = start.min(end);
        Self { input, start, end }
    }

    /// Loads a file with the I/O strategy from `options`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be loaded.
    pub fn open<P: AsRef<Path>>(path: P, options: &Options) -> Result<Self> {
        Ok(Self::new(Input::new(path, options.io())?))
    }

    #[must_use]
    pub const fn input(&self) -> &Input {
        &self.input
    }

    /// The `[start, end)` byte range.
    #[must_use]
    pub const fn range(&self) -> (u64, u64) {
        (self.start, self.end)
    }
}

impl BoundedSource for LineSource {
    type Item = Line;
    type Reader = LineReader;

    fn split_into_bundles(
        &self,
        desired_bundle_size_bytes: u64,
        _options: &Options,
    ) -> Result<Vec<Self>> {
        check_bundle_size(desired_bundle_size_bytes)?;

        if self.end - self.start <= desired_bundle_size_bytes {
            return Ok(vec![self.clone()]);
        }

        let bundles: Vec<Self> = (self.start..self.end)
            .step_by(usize::try_from(desired_bundle_size_bytes).unwrap_or(usize::MAX))
            .map(|start| Self {
                input: self.input.clone(),
                start,
                end: start.saturating_add(desired_bundle_size_bytes).min(self.end),
            })
            .collect();
        log::debug!(
            "split {} [{}, {}) into {} bundles of {desired_bundle_size_bytes} bytes",
            self.input.source(),
            self.start,
            self.end,
            bundles.len()
        );

        Ok(bundles)
    }

    fn estimated_size_bytes(&self, _options: &Options) -> Result<u64> {
        Ok(self.end - self.start)
    }

    fn create_reader(&self, _options: &Options) -> Result<LineReader> {
        Ok(LineReader::new(self.clone()))
    }
}

/// Reader over a [`LineSource`].
#[derive(Debug)]
pub struct LineReader {
    source: LineSource,
    tracker: Arc<OffsetRangeTracker>,
    state: ReaderState,
    current: Option<Line>,
    next_offset: u64,
}

impl LineReader {
    fn new(source: LineSource) -> Self {
        let tracker = Arc::new(OffsetRangeTracker::new(source.start, source.end));
        Self {
            source,
            tracker,
            state: ReaderState::default(),
            current: None,
            next_offset: 0,
        }
    }

    fn finish(&mut self) -> Result<bool> {
        log::trace!(
            "line reader over {} finished at {}",
            self.source.input.source(),
            self.next_offset
        );
        self.current = None;
        self.state = ReaderState::Finished;
        Ok(false)
    }

    /// Claims and decodes the line starting at `offset`.
    fn read_line_at(&mut self, offset: u64) -> Result<bool> {
        let bytes = self.source.input.as_bytes();
        let len = bytes.len() as u64;

        if offset >= len {
            self.tracker.mark_done()?;
            return self.finish();
        }
        if !self.tracker.try_claim(offset)? {
            return self.finish();
        }

        let from = offset as usize;
        let to = memchr(b'\n', &bytes[from..]).map_or(bytes.len(), |i| from + i);
        self.next_offset = to as u64 + 1;

        self.current = None;

        let raw = &bytes[from..to];
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = simdutf8::basic::from_utf8(raw).map_err(|_| {
            let message = std::str::from_utf8(raw)
                .err()
                .map_or_else(|| "invalid UTF-8".to_string(), |e| e.to_string());
            BoundedSourceError::Utf8 {
                byte: offset,
                message,
            }
        })?;
        self.current = Some(line.into());

        Ok(true)
    }
}

/// The offset of the first line starting at or after `start`.
fn first_line_start(bytes: &[u8], start: u64) -> u64 {
    if start == 0 {
        return 0;
    }
    let from = (start - 1) as usize;
    bytes
        .get(from..)
        .and_then(|rest| memchr(b'\n', rest))
        .map_or(bytes.len() as u64, |i| (from + i + 1) as u64)
}

impl BoundedReader for LineReader {
    type Item = Line;
    type Source = LineSource;
    type Splitter = LineSplitter;

    fn start(&mut self) -> Result<bool> {
        self.state.begin()?;
        let first = first_line_start(self.source.input.as_bytes(), self.source.start);
        self.read_line_at(first)
    }

    fn advance(&mut self) -> Result<bool> {
        self.state.check_advance()?;
        self.read_line_at(self.next_offset)
    }

    fn current(&self) -> Result<&Line> {
        match (self.state, self.current.as_ref()) {
            (ReaderState::Started, Some(current)) => Ok(current),
            (state, _) => Err(BoundedSourceError::IllegalState(format!(
                "no current line in state {state:?}"
            ))
            .into()),
        }
    }

    fn current_source(&self) -> Result<LineSource> {
        let (start, stop) = self.tracker.range()?;
        Ok(LineSource::with_range(self.source.input.clone(), start, stop))
    }

    fn splitter(&self) -> LineSplitter {
        LineSplitter {
            input: self.source.input.clone(),
            tracker: Arc::clone(&self.tracker),
        }
    }
}

/// Control handle for a [`LineReader`].
#[derive(Clone, Debug)]
pub struct LineSplitter {
    input: Input,
    tracker: Arc<OffsetRangeTracker>,
}

impl Splitter for LineSplitter {
    type Source = LineSource;

    fn split_at_fraction(&self, fraction: f64) -> Option<LineSource> {
        self.tracker
            .try_split_at_fraction(fraction)
            .map(|(start, end)| LineSource::with_range(self.input.clone(), start, end))
    }

    fn fraction_consumed(&self) -> Option<f64> {
        self.tracker.fraction_consumed()
    }
}

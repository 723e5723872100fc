//! A decorator that makes any source behave as one indivisible unit.

use anyhow::Result;

use crate::Options;
use crate::source::{BoundedReader, BoundedSource, Splitter, check_bundle_size};

/// Wraps a source so that it is never split.
///
/// Bundle splitting always yields the wrapper itself, and its readers refuse
/// every `split_at_fraction` request. Reading and progress reporting go
/// straight to the delegate.
///
/// # Examples
///
/// ```
/// use bounded_source::{BoundedSource, CountingSource, Options, Unsplittable};
///
/// let options = Options::default();
/// let source = Unsplittable::new(CountingSource::up_to(100));
/// assert_eq!(source.split_into_bundles(1, &options)?, vec![source]);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Unsplittable<S> {
    delegate: S,
}

impl<S: BoundedSource> Unsplittable<S> {
    pub const fn new(delegate: S) -> Self {
        Self { delegate }
    }

    pub const fn delegate(&self) -> &S {
        &self.delegate
    }

    pub fn into_inner(self) -> S {
        self.delegate
    }
}

impl<S: BoundedSource> BoundedSource for Unsplittable<S> {
    type Item = S::Item;
    type Reader = UnsplittableReader<S::Reader>;

    fn split_into_bundles(
        &self,
        desired_bundle_size_bytes: u64,
        _options: &Options,
    ) -> Result<Vec<Self>> {
        check_bundle_size(desired_bundle_size_bytes)?;
        Ok(vec![self.clone()])
    }

    fn estimated_size_bytes(&self, options: &Options) -> Result<u64> {
        self.delegate.estimated_size_bytes(options)
    }

    fn create_reader(&self, options: &Options) -> Result<Self::Reader> {
        Ok(UnsplittableReader {
            delegate: self.delegate.create_reader(options)?,
        })
    }
}

/// Reader over an [`Unsplittable`] source.
#[derive(Debug)]
pub struct UnsplittableReader<R> {
    delegate: R,
}

impl<R: BoundedReader> BoundedReader for UnsplittableReader<R> {
    type Item = R::Item;
    type Source = Unsplittable<R::Source>;
    type Splitter = UnsplittableSplitter<R::Splitter>;

    fn start(&mut self) -> Result<bool> {
        self.delegate.start()
    }

    fn advance(&mut self) -> Result<bool> {
        self.delegate.advance()
    }

    fn current(&self) -> Result<&R::Item> {
        self.delegate.current()
    }

    fn current_source(&self) -> Result<Self::Source> {
        Ok(Unsplittable::new(self.delegate.current_source()?))
    }

    fn splitter(&self) -> Self::Splitter {
        UnsplittableSplitter {
            delegate: self.delegate.splitter(),
        }
    }

    fn fraction_consumed(&self) -> Option<f64> {
        self.delegate.fraction_consumed()
    }

    fn split_at_fraction(&self, fraction: f64) -> Option<Self::Source> {
        log::debug!("refusing split at {fraction}: source is unsplittable");
        None
    }
}

/// Control handle for an [`UnsplittableReader`]: observes progress, never splits.
#[derive(Clone, Debug)]
pub struct UnsplittableSplitter<P> {
    delegate: P,
}

impl<P> Splitter for UnsplittableSplitter<P>
where
    P: Splitter,
    P::Source: BoundedSource,
{
    type Source = Unsplittable<P::Source>;

    fn split_at_fraction(&self, fraction: f64) -> Option<Self::Source> {
        log::debug!("refusing split at {fraction}: source is unsplittable");
        None
    }

    fn fraction_consumed(&self) -> Option<f64> {
        self.delegate.fraction_consumed()
    }
}

//! Shared, immutable byte input for line sources.

use std::fmt::{self, Display, Formatter};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use memmap2::Mmap;

use crate::options::io::Io;
use crate::BoundedSourceError;

/// Bytes backing a [`LineSource`](crate::LineSource).
///
/// Cloning an `Input` shares the underlying bytes, so every bundle and
/// residual split from a line source reads the same loaded file.
#[derive(Clone, Debug)]
pub enum Input {
    /// A memory-mapped file.
    Mmap(Arc<Mmap>, PathBuf),
    /// A file read fully into memory.
    Buffered(Arc<[u8]>, PathBuf),
    /// In-memory bytes.
    Bytes(Arc<[u8]>),
}

impl Input {
    /// Loads a file with the given I/O strategy.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be opened, read or mapped.
    pub fn new<P: AsRef<Path>>(path: P, io: Io) -> Result<Self> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();

        match io {
            Io::MemoryMapped => {
                let file = open_file_with_error_context(path)?;
                // Safety: Memory mapping requires `unsafe` per memmap2 crate
                #[allow(unsafe_code)]
                let mmap = unsafe { Mmap::map(&file) }.map_err(|source| {
                    io_error(path, "failed to map file".into(), source)
                })?;
                Ok(Self::Mmap(Arc::new(mmap), path_buf))
            }
            Io::Buffered => {
                let bytes = fs::read(path).map_err(|source| {
                    io_error(path, io_error_message(&source), source)
                })?;
                Ok(Self::Buffered(bytes.into(), path_buf))
            }
        }
    }

    /// Create an `Input` from byte data.
    pub fn from_bytes<B: AsRef<[u8]>>(bytes: B) -> Self {
        Self::Bytes(bytes.as_ref().into())
    }

    /// The full contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Mmap(mmap, _) => mmap.as_ref(),
            Self::Buffered(bytes, _) | Self::Bytes(bytes) => bytes,
        }
    }

    /// Total size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// The file path, if file-based.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Mmap(_, path) | Self::Buffered(_, path) => Some(path),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the file name of the input or `"<bytes>"`.
    #[must_use]
    pub fn source(&self) -> String {
        self.path().map_or_else(
            || "<bytes>".to_string(),
            |path| {
                path.file_name().map_or_else(
                    || path.display().to_string(),
                    |name| name.to_string_lossy().into_owned(),
                )
            },
        )
    }
}

/// Inputs are equal when they hold the same bytes from the same place.
impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path() && self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Input {}

impl Display for Input {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mmap(_, path) => write!(f, "Mmap({})", path.display()),
            Self::Buffered(_, path) => write!(f, "Buffered({})", path.display()),
            Self::Bytes(bytes) => write!(f, "Bytes({})", bytes.len()),
        }
    }
}

fn io_error_message(source: &io::Error) -> String {
    match source.kind() {
        io::ErrorKind::NotFound => "no such file".into(),
        io::ErrorKind::PermissionDenied => "permission denied".into(),
        _ => "failed to read file".into(),
    }
}

fn io_error(path: &Path, message: String, source: io::Error) -> BoundedSourceError {
    BoundedSourceError::Io {
        path: path.display().to_string(),
        message,
        source,
    }
}

/// Opens a file with enhanced error context.
///
/// # Errors
///
/// Returns `Error::Io` with specific messages for:
/// - File not found
/// - Permission denied
/// - Other I/O errors
pub(crate) fn open_file_with_error_context(path: &Path) -> Result<File, BoundedSourceError> {
    File::open(path).map_err(|source| io_error(path, io_error_message(&source), source))
}

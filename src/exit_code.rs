//! Process exit statuses for the `bounded-source` command, in sysexits.h numbering.

use std::{io, process};

use clap::error::ErrorKind as ClapErrorKind;

use crate::BoundedSourceError;

/// How a verification run ended.
///
/// A run that completes maps to [`ExitCode::Success`] or, when any check
/// failed, [`ExitCode::DataError`]. A run that stops early maps its error
/// through [`ExitCode::from_error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ExitCode {
    /// Every check passed, or help was printed.
    Success = 0,
    /// An error none of the other codes describe.
    Failure = 1,
    /// Bad arguments or an invalid option value.
    Usage = 64,
    /// A check failed, or the input held invalid UTF-8.
    DataError = 65,
    /// The input file does not exist.
    NoInput = 66,
    /// A reader broke its calling protocol.
    Software = 70,
    /// The output file already exists and cannot be created.
    CannotCreate = 73,
    /// Reading input or writing the report failed.
    Io = 74,
    /// A file could not be opened for lack of permission.
    NoPermission = 77,
}

impl ExitCode {
    /// Picks the code for the first recognized cause in `err`'s chain.
    ///
    /// Context layers added with `anyhow::Context` are skipped until a
    /// [`BoundedSourceError`], a clap error or an I/O error turns up.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| {
                cause
                    .downcast_ref::<BoundedSourceError>()
                    .map(Self::from)
                    .or_else(|| cause.downcast_ref::<clap::Error>().map(Self::from))
                    .or_else(|| cause.downcast_ref::<io::Error>().map(Self::from))
            })
            .unwrap_or(Self::Failure)
    }
}

impl From<&io::Error> for ExitCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NoInput,
            io::ErrorKind::PermissionDenied => Self::NoPermission,
            io::ErrorKind::AlreadyExists => Self::CannotCreate,
            _ => Self::Io,
        }
    }
}

impl From<&clap::Error> for ExitCode {
    fn from(err: &clap::Error) -> Self {
        match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => Self::Success,
            _ => Self::Usage,
        }
    }
}

impl From<&BoundedSourceError> for ExitCode {
    fn from(err: &BoundedSourceError) -> Self {
        match err {
            BoundedSourceError::Config(_) => Self::Usage,
            BoundedSourceError::Assertion(_)
            | BoundedSourceError::Utf8 { .. }
            | BoundedSourceError::Json(_)
            | BoundedSourceError::Csv(_) => Self::DataError,
            BoundedSourceError::IllegalState(_) | BoundedSourceError::MutexPoisoned => {
                Self::Software
            }
            BoundedSourceError::Io { source, .. } => Self::from(source),
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

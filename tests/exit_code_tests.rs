use anyhow::Error;
use bounded_source::BoundedSourceError;
use bounded_source::exit_code::ExitCode;
use std::{io, process};

fn create_io_error(kind: io::ErrorKind) -> Error {
    io::Error::new(kind, "test I/O error").into()
}

#[test]
fn test_io_error_not_found() {
    let err = create_io_error(io::ErrorKind::NotFound);
    assert_eq!(ExitCode::from_error(&err), ExitCode::NoInput);
}

#[test]
fn test_io_error_permission_denied() {
    let err = create_io_error(io::ErrorKind::PermissionDenied);
    assert_eq!(ExitCode::from_error(&err), ExitCode::NoPermission);
}

#[test]
fn test_io_error_already_exists() {
    let err = create_io_error(io::ErrorKind::AlreadyExists);
    assert_eq!(ExitCode::from_error(&err), ExitCode::CannotCreate);
}

#[test]
fn test_io_error_other() {
    let err = create_io_error(io::ErrorKind::ConnectionRefused);
    assert_eq!(ExitCode::from_error(&err), ExitCode::Io);
}

#[test]
fn test_wrapped_io_error_uses_its_kind() {
    let err: Error = BoundedSourceError::Io {
        path: "missing.txt".into(),
        message: "no such file".into(),
        source: io::Error::new(io::ErrorKind::NotFound, "gone"),
    }
    .into();
    assert_eq!(ExitCode::from_error(&err), ExitCode::NoInput);
}

#[test]
fn test_source_errors() {
    let cases = [
        (BoundedSourceError::Config("zero bundle".into()), ExitCode::Usage),
        (BoundedSourceError::Assertion("lost".into()), ExitCode::DataError),
        (
            BoundedSourceError::Utf8 {
                byte: 3,
                message: "invalid".into(),
            },
            ExitCode::DataError,
        ),
        (BoundedSourceError::IllegalState("twice".into()), ExitCode::Software),
        (BoundedSourceError::MutexPoisoned, ExitCode::Software),
    ];
    for (err, expected) in cases {
        let err: Error = err.into();
        assert_eq!(ExitCode::from_error(&err), expected, "{err}");
    }
}

#[test]
fn test_context_keeps_root_cause() {
    let err = Error::from(BoundedSourceError::Assertion("lost".into())).context("verifying");
    assert_eq!(ExitCode::from_error(&err), ExitCode::DataError);
}

#[test]
fn test_nested_context_reaches_io_error() {
    let err = Error::from(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        .context("opening input")
        .context("verifying line source");
    assert_eq!(ExitCode::from_error(&err), ExitCode::NoPermission);
}

#[test]
fn test_context_message_alone_is_failure() {
    let err = anyhow::anyhow!("no cause").context("verifying");
    assert_eq!(ExitCode::from_error(&err), ExitCode::Failure);
}

#[test]
fn test_clap_help() {
    let clap_err = clap::Command::new("test")
        .try_get_matches_from(["test", "--help"])
        .unwrap_err();
    let err: Error = clap_err.into();
    assert_eq!(ExitCode::from_error(&err), ExitCode::Success);
}

#[test]
fn test_clap_usage_error() {
    let clap_err = clap::Command::new("test")
        .try_get_matches_from(["test", "--unknown"])
        .unwrap_err();
    let err: Error = clap_err.into();
    assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);
}

#[test]
fn test_unknown_error_is_failure() {
    let err = anyhow::anyhow!("something else");
    assert_eq!(ExitCode::from_error(&err), ExitCode::Failure);
}

#[test]
fn test_exit_code_values() {
    assert_eq!(ExitCode::Success as u8, 0);
    assert_eq!(ExitCode::Usage as u8, 64);
    assert_eq!(ExitCode::DataError as u8, 65);
    assert_eq!(ExitCode::NoInput as u8, 66);
    assert_eq!(ExitCode::Software as u8, 70);
    assert_eq!(ExitCode::Io as u8, 74);
    assert_eq!(process::ExitCode::from(ExitCode::DataError), process::ExitCode::from(65));
}

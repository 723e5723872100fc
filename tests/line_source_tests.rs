use std::io::Write;

use bounded_source::testing;
use bounded_source::{
    BoundedReader, BoundedSource, BoundedSourceError, Input, Io, LineSource, Options, Processing,
};
use tempfile::NamedTempFile;

const POEM: &str = "Hope is the thing with feathers\n\
                    That perches in the soul,\n\
                    And sings the tune without the words,\n\
                    And never stops at all,\n";

fn options() -> Options {
    Options::default().with_processing(Processing::Sequential)
}

fn temp_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

fn lines(records: &[Box<str>]) -> Vec<&str> {
    records.iter().map(AsRef::as_ref).collect()
}

#[test]
fn test_open_with_each_io_strategy() {
    let file = temp_file(POEM.as_bytes());
    for io in [Io::MemoryMapped, Io::Buffered] {
        let options = options().with_io(io);
        let source = LineSource::open(file.path(), &options).unwrap();
        assert_eq!(source.range(), (0, POEM.len() as u64));

        let records = testing::read_from_source(&source, &options).unwrap();
        assert_eq!(
            lines(&records),
            vec![
                "Hope is the thing with feathers",
                "That perches in the soul,",
                "And sings the tune without the words,",
                "And never stops at all,",
            ]
        );
    }
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = LineSource::open(dir.path().join("missing.txt"), &options()).unwrap_err();
    match err.downcast_ref::<BoundedSourceError>() {
        Some(BoundedSourceError::Io { message, source, .. }) => {
            assert!(message.starts_with("no such file"), "{message}");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn test_empty_file() {
    let file = temp_file(b"");
    let options = options().with_io(Io::Buffered);
    let source = LineSource::open(file.path(), &options).unwrap();
    let mut reader = source.create_reader(&options).unwrap();
    assert!(!reader.start().unwrap());
    assert_eq!(reader.fraction_consumed(), Some(1.0));
    assert_eq!(reader.split_at_fraction(0.5), None);
}

#[test]
fn test_bundles_cover_every_hint() {
    let source = LineSource::new(Input::from_bytes(POEM));
    for hint in [1, 2, 3, 5, 8, 13, 31, 32, 33, 64, 1 << 16] {
        testing::assert_split_into_bundles_covers(&source, hint, &options()).unwrap();
    }
}

#[test]
fn test_bundles_cover_in_parallel() {
    let file = temp_file(POEM.repeat(50).as_bytes());
    let options = Options::default().with_processing(Processing::Parallel);
    let source = LineSource::open(file.path(), &options).unwrap();
    let bundles = testing::assert_split_into_bundles_covers(&source, 100, &options).unwrap();
    assert!(bundles > 50);
}

#[test]
fn test_crlf_lines_split_consistently() {
    let source = LineSource::new(Input::from_bytes("a\r\nbb\r\nccc\r\ndddd\r\n"));
    testing::assert_split_into_bundles_covers(&source, 3, &options()).unwrap();
    testing::assert_split_at_fraction_exhaustive(&source, &options()).unwrap();
}

#[test]
fn test_unterminated_last_line() {
    let source = LineSource::new(Input::from_bytes("first\nsecond"));
    let records = testing::read_from_source(&source, &options()).unwrap();
    assert_eq!(lines(&records), vec!["first", "second"]);
    testing::assert_split_at_fraction_exhaustive(&source, &options()).unwrap();
}

#[test]
fn test_fraction_consumed_monotonic() {
    let source = LineSource::new(Input::from_bytes(POEM));
    testing::assert_fraction_consumed_monotonic(&source, &options()).unwrap();
}

#[test]
fn test_split_mid_line_keeps_line_with_primary() {
    // Line offsets: "aaaa\n" 0, "bbbb\n" 5, "cccc\n" 10, "dddd\n" 15.
    let input = Input::from_bytes("aaaa\nbbbb\ncccc\ndddd\n");
    let source = LineSource::new(input.clone());
    let mut reader = source.create_reader(&options()).unwrap();
    assert!(reader.start().unwrap());

    // 0.35 of [0, 20) is byte 7, inside "bbbb".
    let residual = reader.split_at_fraction(0.35).unwrap();
    assert_eq!(residual, LineSource::with_range(input, 7, 20));

    let primary = testing::read_remaining_from_reader(&mut reader, true).unwrap();
    assert_eq!(lines(&primary), vec!["bbbb"]);
    let rest = testing::read_from_source(&residual, &options()).unwrap();
    assert_eq!(lines(&rest), vec!["cccc", "dddd"]);
}

#[test]
fn test_split_succeeds_and_is_consistent() {
    let source = LineSource::new(Input::from_bytes(POEM));
    let result =
        testing::assert_split_at_fraction_succeeds_and_consistent(&source, 1, 0.5, &options())
            .unwrap();
    assert_eq!(
        result.num_primary_items + result.num_residual_items.unwrap_or(0),
        4
    );
}

#[test]
fn test_split_at_current_line_fails() {
    let source = LineSource::new(Input::from_bytes(POEM));
    // After three lines the current line starts at byte 58 of 120.
    testing::assert_split_at_fraction_fails(&source, 3, 0.45, &options()).unwrap();
    testing::assert_split_at_fraction_succeeds_and_consistent(&source, 3, 0.5, &options())
        .unwrap();
}

#[test]
fn test_interleaved_and_concurrent_splits() {
    let source = LineSource::new(Input::from_bytes(POEM.repeat(20)));
    let plan = [(3, 0.5), (2, 0.5), (4, 0.25), (1, 0.9)];
    testing::assert_interleaved_splits_consistent(&source, &plan, &options()).unwrap();
    for n in [0, 1, 40, 79, 80, 81] {
        testing::assert_split_at_fraction_concurrent(&source, n, 0.5, &options()).unwrap();
    }
}

#[test]
fn test_exhaustive_sweep_with_empty_lines() {
    let source = LineSource::new(Input::from_bytes("\n\nx\n\nyy\n\n"));
    let summary = testing::assert_split_at_fraction_exhaustive(&source, &options()).unwrap();
    assert_eq!(summary.items, 6);
}

#[test]
fn test_invalid_utf8_surfaces_as_error() {
    let file = temp_file(b"fine\n\xc3\x28\n");
    let options = options().with_io(Io::Buffered);
    let source = LineSource::open(file.path(), &options).unwrap();
    let err = testing::read_from_source(&source, &options).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BoundedSourceError>(),
        Some(BoundedSourceError::Utf8 { byte: 5, .. })
    ));
}

#[test]
fn test_unaligned_bundles_report_no_progress_at_first_line() {
    let input = Input::from_bytes("aaa\nbbb\nccc\n");
    let source = LineSource::new(input.clone());
    let bundles = source.split_into_bundles(3, &options()).unwrap();
    assert_eq!(bundles[1], LineSource::with_range(input, 3, 6));

    let mut reader = bundles[1].create_reader(&options()).unwrap();
    assert!(reader.start().unwrap());
    assert_eq!(reader.current().unwrap().as_ref(), "bbb");
    assert_eq!(reader.fraction_consumed(), Some(0.0));

    for bundle in &bundles {
        testing::assert_fraction_consumed_monotonic(bundle, &options()).unwrap();
    }
}

#[test]
fn test_split_at_reported_progress_is_refused() {
    let source = LineSource::new(Input::from_bytes(POEM));
    for n in 1..=4 {
        let mut reader = source.create_reader(&options()).unwrap();
        testing::read_n_items_from_unstarted_reader(&mut reader, n).unwrap();
        let consumed = reader.fraction_consumed().unwrap();
        assert_eq!(reader.split_at_fraction(consumed), None, "after {n} lines");
    }
}

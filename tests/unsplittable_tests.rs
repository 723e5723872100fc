use bounded_source::testing::{self, ExpectedSplitOutcome};
use bounded_source::{
    BoundedReader, BoundedSource, CountingSource, Input, LineSource, Options, Processing,
    Splitter, Unsplittable,
};
use hashbrown::HashSet;

fn options() -> Options {
    Options::default().with_processing(Processing::Sequential)
}

#[test]
fn test_unsplittable_counting_source_end_to_end() {
    let options = options();
    let source = testing::to_unsplittable_source(CountingSource::up_to(100));

    let bundles = source.split_into_bundles(1, &options).unwrap();
    assert_eq!(bundles, vec![source.clone()]);

    let mut reader = source.create_reader(&options).unwrap();
    assert_eq!(reader.fraction_consumed(), Some(0.0));

    let mut records = testing::read_exactly_n_items_from_unstarted_reader(&mut reader, 40).unwrap();
    assert_eq!(records.len(), 40);

    assert_eq!(reader.split_at_fraction(0.5), None);

    records.extend(testing::read_remaining_from_reader(&mut reader, true).unwrap());
    assert_eq!(records.len(), 100);

    let distinct: HashSet<u64> = records.iter().copied().collect();
    assert_eq!(distinct.len(), 100);
    assert!((0..100).all(|n| distinct.contains(&n)));

    assert_eq!(reader.fraction_consumed(), Some(1.0));
}

#[test]
fn test_unsplittable_refuses_at_every_fraction_and_prefix() {
    let options = options();
    let source = Unsplittable::new(CountingSource::up_to(12));
    for n in 0..=12 {
        for fraction in [0.1, 0.5, 0.9] {
            testing::assert_split_at_fraction_fails(&source, n, fraction, &options).unwrap();
        }
    }
}

#[test]
fn test_unsplittable_bundles_for_any_hint() {
    let options = options();
    let source = Unsplittable::new(CountingSource::up_to(1_000));
    for hint in [1, 8, 64, 1 << 20, u64::MAX] {
        assert_eq!(testing::assert_split_into_bundles_covers(&source, hint, &options).unwrap(), 1);
    }
}

#[test]
fn test_unsplittable_reads_same_as_delegate() {
    let options = options();
    let delegate = CountingSource::range(7, 57);
    let source = testing::to_unsplittable_source(delegate);
    testing::assert_sources_equal_reference_source(&delegate, &[source], &options).unwrap();
}

#[test]
fn test_unsplittable_progress_matches_delegate() {
    let options = options();
    let delegate = CountingSource::up_to(10);
    let mut plain = delegate.create_reader(&options).unwrap();
    let mut wrapped = Unsplittable::new(delegate).create_reader(&options).unwrap();

    assert_eq!(plain.start().unwrap(), wrapped.start().unwrap());
    loop {
        assert_eq!(plain.current().unwrap(), wrapped.current().unwrap());
        assert_eq!(plain.fraction_consumed(), wrapped.fraction_consumed());
        let more = plain.advance().unwrap();
        assert_eq!(more, wrapped.advance().unwrap());
        if !more {
            break;
        }
    }
    assert_eq!(wrapped.fraction_consumed(), Some(1.0));
}

#[test]
fn test_unsplittable_splitter_refuses_from_another_thread() {
    let options = options();
    let source = Unsplittable::new(CountingSource::up_to(1_000));
    let mut reader = source.create_reader(&options).unwrap();
    let splitter = reader.splitter();

    let records = std::thread::scope(|scope| {
        let control = scope.spawn(|| {
            (1..100)
                .filter_map(|i| splitter.split_at_fraction(f64::from(i) / 100.0))
                .count()
        });
        let records = testing::read_remaining_from_reader(&mut reader, false).unwrap();
        assert_eq!(control.join().unwrap(), 0);
        records
    });

    assert_eq!(records.len(), 1_000);
}

#[test]
fn test_unsplittable_line_source() {
    let options = options();
    let input = Input::from_bytes("one\ntwo\nthree\nfour\n");
    let source = Unsplittable::new(LineSource::new(input));

    let result = testing::assert_split_at_fraction_behavior(
        &source,
        2,
        0.75,
        ExpectedSplitOutcome::MustFail,
        &options,
    )
    .unwrap();
    assert_eq!(result.num_primary_items, 4);
    assert_eq!(result.num_residual_items, None);
}

#[test]
fn test_unsplittable_into_inner() {
    let source = Unsplittable::new(CountingSource::up_to(3));
    assert_eq!(*source.delegate(), CountingSource::up_to(3));
    assert_eq!(source.into_inner(), CountingSource::up_to(3));
}

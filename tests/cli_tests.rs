use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{self, contains};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

fn bounded_source() -> Command {
    Command::cargo_bin("bounded-source").unwrap()
}

fn line_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn version() {
    let assert = bounded_source().arg("-V").assert();
    assert.success().stdout(str::starts_with("bounded-source "));
}

#[test]
fn help() {
    let assert = bounded_source().arg("--help").assert();
    assert.success().stdout(contains("\nUsage"));
}

#[test]
fn unknown_flag_is_usage_error() {
    let assert = bounded_source().arg("--frobnicate").assert();
    assert.code(64).stderr(contains("--frobnicate"));
}

#[test]
fn counting_source_passes() {
    let assert = bounded_source().arg("--sequential").assert();
    assert
        .success()
        .stdout(contains("bundles-cover ok"))
        .stdout(contains("split-at-fraction ok"))
        .stdout(contains("concurrent-split ok"))
        .stdout(contains("count-100: 6 checks, 0 failed"));
}

#[test]
fn counting_source_split_after() {
    let assert = bounded_source()
        .args(["--count", "50", "--split-after", "10", "--fraction", "0.5"])
        .assert();
    assert
        .success()
        .stdout(contains("split at 0.5 after 10: primary 25, residual 25"));
}

#[test]
fn unsplittable_counting_source() {
    let assert = bounded_source()
        .args(["--unsplittable", "--split-after", "40", "--bundle-size", "8"])
        .assert();
    assert
        .success()
        .stdout(contains("split at 0.5 after 40 refused: 100 records"))
        .stdout(contains("bundles-cover ok 1 bundles"))
        .stdout(contains("refuses-splits ok"))
        .stdout(contains("count-100: 7 checks, 0 failed"));
}

#[test]
fn exhaustive_sweep() {
    let assert = bounded_source()
        .args(["--count", "12", "--exhaustive", "--sequential"])
        .assert();
    assert
        .success()
        .stdout(contains("exhaustive-splits ok 12 records, 130 attempts"));
}

#[test]
fn line_file_passes() {
    let file = line_file("alpha\nbeta\ngamma\ndelta\nepsilon\n");
    let assert = bounded_source()
        .arg(file.path())
        .args(["--bundle-size", "7", "--split-after", "1", "--exhaustive"])
        .assert();
    assert.success().stdout(contains("0 failed"));
}

#[test]
fn line_file_buffered() {
    let file = line_file("one\ntwo\n");
    let assert = bounded_source()
        .arg(file.path())
        .args(["--io", "buffered"])
        .assert();
    assert.success().stdout(contains("6 checks, 0 failed"));
}

#[test]
fn missing_file() {
    let assert = bounded_source().arg("definitely-missing.txt").assert();
    assert
        .code(66)
        .stderr(contains("no such file"))
        .stdout("");
}

#[test]
fn invalid_utf8_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"ok\n\xff\n").unwrap();
    let assert = bounded_source().arg(file.path()).assert();
    assert.code(65).stderr(contains("invalid UTF-8 at byte 3"));
}

#[test]
fn fraction_out_of_range() {
    let assert = bounded_source().args(["--fraction", "1.5"]).assert();
    assert
        .code(64)
        .stderr(contains("split fraction must be between 0 and 1"));
}

#[test]
fn zero_bundle_size() {
    let assert = bounded_source().args(["--bundle-size", "0"]).assert();
    assert
        .code(64)
        .stderr(contains("desired bundle size must be positive"));
}

#[test]
fn zero_threads() {
    let assert = bounded_source().args(["--threads", "0"]).assert();
    assert.code(64).stderr(contains("thread count must be positive"));
}

#[test]
fn json_format() {
    let assert = bounded_source()
        .args(["--count", "10", "--format", "json"])
        .assert();
    let output = assert.success().get_output().stdout.clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["source"], "count-10");
    assert_eq!(json["checks"].as_array().unwrap().len(), 6);
    assert!(
        json["checks"]
            .as_array()
            .unwrap()
            .iter()
            .all(|check| check["passed"] == true)
    );
}

#[test]
fn csv_format() {
    let assert = bounded_source()
        .args(["--count", "10", "--format", "csv"])
        .assert();
    assert
        .success()
        .stdout(str::starts_with("source,check,passed,detail\n"))
        .stdout(contains("count-10,bundles-cover,true,"));
}

#[test]
fn output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");
    let assert = bounded_source()
        .args(["--count", "5", "--output"])
        .arg(&path)
        .assert();
    assert.success().stdout("");

    let report = fs::read_to_string(&path).unwrap();
    assert!(report.contains("count-5: 6 checks, 0 failed"));
}

#[test]
fn verbose_text() {
    let assert = bounded_source()
        .args(["--count", "10", "--sequential", "--verbose"])
        .assert();
    assert
        .success()
        .stderr(str::starts_with(
            "source count-10\nestimated-bytes 80\nunsplittable false\nsplit-after 0\nfraction 0.5\nexhaustive false\nbundle-size 65536\nfraction-grid 10\nio memory-mapped\nprocessing sequential\n",
        ))
        .stdout(contains("0 failed"));
}

#[test]
fn verbose_json() {
    let assert = bounded_source()
        .args(["--count", "10", "--verbose", "--format", "json"])
        .assert();
    assert
        .success()
        .stderr(contains("\"source\":\"count-10\"").and(contains("\"estimatedBytes\":80")));
}

#[test]
fn verbose_csv() {
    let assert = bounded_source()
        .args(["--count", "10", "--verbose", "--format", "csv"])
        .assert();
    assert.success().stderr(str::starts_with(
        "source,estimated-bytes,unsplittable,split-after,fraction,exhaustive,bundle-size,fraction-grid,io,processing,threads\n",
    ));
}

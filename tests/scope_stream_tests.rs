// Scope stream, aggregation and statistics over real capture files

mod utils;

use rspscope::aggregate::{count_by_tag_in, select_by_tag_in, sorted_counts, take_group};
use rspscope::error::{FrameSection, ScopeError};
use rspscope::stats::{compute_percentiles, extract_milliseconds, summarize};
use rspscope::stream::{read_all_scopes, ScopeStream};
use std::collections::HashSet;
use utils::{mixed_capture, scope_ms, write_capture};

fn wanted(tags: &[&str]) -> HashSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_stream_yields_records_in_file_order() {
    let capture = mixed_capture();
    let tags: Vec<String> = read_all_scopes(capture.path())
        .unwrap()
        .iter()
        .map(|s| s.tag().to_string())
        .collect();
    assert_eq!(tags, ["parse", "render", "parse", "io", "render", "parse"]);
}

#[test]
fn test_empty_file_is_empty_stream() {
    let capture = write_capture(&[]);
    let mut stream = ScopeStream::open(capture.path()).unwrap();
    assert!(stream.next_scope().unwrap().is_none());
    assert!(stream.next_scope().unwrap().is_none());
    assert!(stream.is_finished());
}

#[test]
fn test_open_missing_file() {
    let capture = write_capture(&[]);
    let missing = capture.dir().join("nope.rsp");
    match ScopeStream::open(&missing) {
        Err(ScopeError::Open { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected Open error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_open_directory_fails() {
    let capture = write_capture(&[]);
    assert!(matches!(
        ScopeStream::open(capture.dir()),
        Err(ScopeError::Open { .. })
    ));
}

#[test]
fn test_truncated_payload_after_good_records() {
    let capture = write_capture(&[scope_ms("a", 1), scope_ms("b", 2)]);
    let len = capture.bytes().len();
    capture.truncate(len - 3);

    let mut stream = ScopeStream::open(capture.path()).unwrap();
    assert_eq!(stream.next_scope().unwrap().unwrap().tag(), "a");
    match stream.next_scope() {
        Err(ScopeError::TruncatedStream { index, section, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(section, FrameSection::Payload);
        }
        other => panic!("expected truncation, got {:?}", other),
    }
    // the failure is sticky
    assert!(matches!(
        stream.next_scope(),
        Err(ScopeError::TruncatedStream { index: 1, .. })
    ));
    assert_eq!(stream.records_read(), 1);
}

#[test]
fn test_partial_length_prefix() {
    let capture = write_capture(&[scope_ms("a", 1)]);
    capture.append(&[0x10, 0x00]);

    let results: Vec<_> = ScopeStream::open(capture.path()).unwrap().take(3).collect();
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(ScopeError::TruncatedStream {
            section: FrameSection::LengthPrefix,
            expected: 4,
            found: 2,
            ..
        })
    ));
}

#[test]
fn test_garbage_payload_is_malformed() {
    let capture = write_capture(&[scope_ms("a", 1)]);
    capture.append(&[3, 0, 0, 0, 0xc1, 0xc1, 0xc1]);

    let mut stream = ScopeStream::open(capture.path()).unwrap();
    assert!(stream.next_scope().is_ok());
    let err = stream.next_scope().unwrap_err();
    assert!(matches!(err, ScopeError::MalformedRecord { index: 1, .. }));
    assert_eq!(err.record_index(), Some(1));
    assert!(err.is_stream_error());
}

#[test]
fn test_count_by_tag_matches_file() {
    let capture = mixed_capture();
    let counts = count_by_tag_in(capture.path()).unwrap();
    assert_eq!(
        sorted_counts(&counts),
        vec![
            ("io".to_string(), 1),
            ("parse".to_string(), 3),
            ("render".to_string(), 2)
        ]
    );
}

#[test]
fn test_select_keeps_order_within_tag() {
    let capture = mixed_capture();
    let mut groups = select_by_tag_in(capture.path(), &wanted(&["parse", "missing"])).unwrap();
    assert!(!groups.contains_key("missing"));
    assert!(!groups.contains_key("render"));

    let parse = take_group(&mut groups, "parse").unwrap();
    let times = extract_milliseconds(&parse);
    assert_eq!(times.len(), 3);
    for (got, want) in times.iter().zip([1.0, 2.0, 3.0]) {
        assert!((got - want).abs() < 1e-9);
    }
}

#[test]
fn test_select_missing_tag_is_empty_selection() {
    let capture = mixed_capture();
    let mut groups = select_by_tag_in(capture.path(), &wanted(&["missing"])).unwrap();
    let err = take_group(&mut groups, "missing").unwrap_err();
    assert_eq!(err.to_string(), "No entries found for scope missing");
}

#[test]
fn test_aggregation_fails_on_truncated_capture() {
    let capture = mixed_capture();
    let len = capture.bytes().len();
    capture.truncate(len - 1);

    assert!(count_by_tag_in(capture.path()).is_err());
    assert!(select_by_tag_in(capture.path(), &wanted(&["parse"])).is_err());
}

#[test]
fn test_percentiles_over_capture() {
    let scopes: Vec<_> = (1..=100).map(|ms| scope_ms("tick", ms)).collect();
    let capture = write_capture(&scopes);

    let mut groups = select_by_tag_in(capture.path(), &wanted(&["tick"])).unwrap();
    let times = extract_milliseconds(&take_group(&mut groups, "tick").unwrap());
    let p = compute_percentiles(&times);
    assert!((p.p50 - 50.5).abs() < 1e-6);
    assert!((p.p95 - 95.05).abs() < 1e-6);
    assert!((p.p99 - 99.01).abs() < 1e-6);

    let summary = summarize(&times).unwrap();
    assert_eq!(summary.count, 100);
    assert!((summary.min - 1.0).abs() < 1e-9);
    assert!((summary.max - 100.0).abs() < 1e-9);
}

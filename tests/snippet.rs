//! Boundary behavior for the snippet reader beyond what its own unit tests
//! cover: clamping at file start/end and missing files.

use std::io::Write;

use native_symbolize::snippet::read_snippet;

fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("native-symbolize-snippet-it-{name}"));
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn clamps_context_at_start_of_file() {
    let path = write_temp("start", "a\nb\nc\nd\n");
    let lines = read_snippet(&path, 1, 3).unwrap();
    assert_eq!(lines, vec!["a", "b", "c", "d"]);
    std::fs::remove_file(path).ok();
}

#[test]
fn clamps_context_at_end_of_file() {
    let path = write_temp("end", "a\nb\nc\nd\n");
    let lines = read_snippet(&path, 4, 3).unwrap();
    assert_eq!(lines, vec!["a", "b", "c", "d"]);
    std::fs::remove_file(path).ok();
}

#[test]
fn target_line_past_eof_returns_none() {
    let path = write_temp("eof", "a\nb\n");
    assert!(read_snippet(&path, 99, 0).is_none());
    std::fs::remove_file(path).ok();
}

#[test]
fn target_line_zero_returns_none() {
    let path = write_temp("zero", "a\nb\n");
    assert!(read_snippet(&path, 0, 0).is_none());
    std::fs::remove_file(path).ok();
}

#[test]
fn crlf_line_endings_are_stripped() {
    let path = write_temp("crlf", "one\r\ntwo\r\nthree\r\n");
    let lines = read_snippet(&path, 2, 0).unwrap();
    assert_eq!(lines, vec!["two"]);
    std::fs::remove_file(path).ok();
}

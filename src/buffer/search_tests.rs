use regex::Regex;

use crate::buffer::Buffer;
use crate::point::{Direction, Point};

fn buffer_from(lines: &[&str]) -> Buffer {
    let mut buffer = Buffer::new("search-test");
    for line in lines {
        buffer.append_line(line);
    }
    buffer
}

// ============================================================
// Regex search
// ============================================================

#[test]
fn downward_finds_the_leftmost_match_after_the_column() {
    let buffer = buffer_from(&["abc", "def abc"]);
    let regex = Regex::new("abc").unwrap();

    let (found, length) = buffer
        .find_regex(Point::new(1, 1), &regex, Direction::Down)
        .unwrap();
    assert_eq!(found, Point::new(4, 1));
    assert_eq!(length, 3);
}

#[test]
fn upward_keeps_the_last_match_before_the_start() {
    let buffer = buffer_from(&["abc", "def abc"]);
    let regex = Regex::new("abc").unwrap();

    let (found, _) = buffer
        .find_regex(Point::new(4, 1), &regex, Direction::Up)
        .unwrap();
    assert_eq!(found, Point::new(0, 0));
}

#[test]
fn upward_prefers_the_closest_preceding_match() {
    let buffer = buffer_from(&["xx xx xx"]);
    let regex = Regex::new("xx").unwrap();

    let (found, _) = buffer
        .find_regex(Point::new(6, 0), &regex, Direction::Up)
        .unwrap();
    assert_eq!(found, Point::new(3, 0));
}

#[test]
fn downward_crosses_lines_from_the_start_column() {
    let buffer = buffer_from(&["needle at 0", "nothing", "a needle here"]);
    let regex = Regex::new("needle").unwrap();

    let (found, _) = buffer
        .find_regex(Point::new(1, 0), &regex, Direction::Down)
        .unwrap();
    assert_eq!(found, Point::new(2, 2));
}

#[test]
fn no_match_returns_none() {
    let buffer = buffer_from(&["plain text"]);
    let regex = Regex::new("zzz").unwrap();
    assert!(buffer
        .find_regex(Point::new(0, 0), &regex, Direction::Down)
        .is_none());
    assert!(buffer
        .find_regex(Point::new(0, 0), &regex, Direction::Up)
        .is_none());
}

#[test]
fn search_from_off_buffer_fails() {
    let buffer = buffer_from(&["hi"]);
    let regex = Regex::new("hi").unwrap();
    assert!(buffer
        .find_regex(Point::new(0, 5), &regex, Direction::Down)
        .is_none());
}

// ============================================================
// Literal search
// ============================================================

#[test]
fn literal_search_steps_in_both_directions() {
    let buffer = buffer_from(&["one two", "two one"]);

    let found = buffer
        .find_string(Point::new(0, 0), "two", Direction::Down)
        .unwrap();
    assert_eq!(found, Point::new(4, 0));

    let found = buffer
        .find_string(found, "two", Direction::Down)
        .unwrap();
    assert_eq!(found, Point::new(0, 1));

    let found = buffer
        .find_string(Point::new(4, 1), "two", Direction::Up)
        .unwrap();
    assert_eq!(found, Point::new(0, 1));
}

#[test]
fn literal_search_misses_return_none() {
    let buffer = buffer_from(&["abc"]);
    assert!(buffer
        .find_string(Point::new(0, 0), "zzz", Direction::Down)
        .is_none());
    assert!(buffer
        .find_string(Point::new(0, 0), "", Direction::Down)
        .is_none());
}

// ============================================================
// Word extraction
// ============================================================

#[test]
fn word_at_location_spans_the_word_run() {
    let buffer = buffer_from(&["foo bar_baz qux"]);
    let (start, end) = buffer.word_at_location(Point::new(6, 0)).unwrap();
    assert_eq!(start, Point::new(4, 0));
    assert_eq!(end, Point::new(10, 0));
}

#[test]
fn word_at_location_groups_punctuation() {
    let buffer = buffer_from(&["a ==> b"]);
    let (start, end) = buffer.word_at_location(Point::new(3, 0)).unwrap();
    assert_eq!(start, Point::new(2, 0));
    assert_eq!(end, Point::new(4, 0));
}

#[test]
fn word_at_location_groups_blanks() {
    let buffer = buffer_from(&["a   b"]);
    let (start, end) = buffer.word_at_location(Point::new(2, 0)).unwrap();
    assert_eq!(start, Point::new(1, 0));
    assert_eq!(end, Point::new(3, 0));
}

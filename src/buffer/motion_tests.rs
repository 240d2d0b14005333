use crate::buffer::Buffer;
use crate::point::Point;

fn buffer_from(lines: &[&str]) -> Buffer {
    let mut buffer = Buffer::new("test");
    for line in lines {
        buffer.append_line(line);
    }
    buffer
}

// ============================================================
// Clamping and flat advancement
// ============================================================

#[test]
fn move_cursor_clamps_to_characters() {
    let buffer = buffer_from(&["abc", ""]);
    assert_eq!(
        buffer.move_cursor(Point::new(0, 0), Point::new(10, 0)),
        Point::new(2, 0)
    );
    assert_eq!(
        buffer.move_cursor(Point::new(2, 0), Point::new(0, 5)),
        Point::new(0, 1)
    );
    assert_eq!(
        buffer.move_cursor(Point::new(0, 0), Point::new(-3, -3)),
        Point::new(0, 0)
    );
}

#[test]
fn zero_line_buffer_clamps_to_origin() {
    let buffer = Buffer::new("empty");
    assert_eq!(
        buffer.move_cursor(Point::new(5, 5), Point::new(1, 1)),
        Point::new(0, 0)
    );
}

#[test]
fn advance_cursor_walks_across_newlines() {
    let buffer = buffer_from(&["ab", "cd"]);
    // a -> b -> terminator -> start of next line
    assert_eq!(
        buffer.advance_cursor(Point::new(0, 0), 3),
        Some(Point::new(0, 1))
    );
    assert_eq!(
        buffer.advance_cursor(Point::new(0, 1), -1),
        Some(Point::new(2, 0))
    );
}

#[test]
fn advance_cursor_round_trips() {
    let buffer = buffer_from(&["first line", "", "third"]);
    let start = Point::new(3, 0);
    for delta in 1..12 {
        let there = buffer.advance_cursor(start, delta).unwrap();
        let back = buffer.advance_cursor(there, -delta).unwrap();
        assert_eq!(back, start, "delta {}", delta);
    }
}

// ============================================================
// Line ends
// ============================================================

#[test]
fn soft_line_boundaries_skip_blanks() {
    let buffer = buffer_from(&["   text   "]);
    assert_eq!(
        buffer.soft_beginning_of_line(Point::new(5, 0)),
        Some(Point::new(3, 0))
    );
    assert_eq!(
        buffer.soft_end_of_line(Point::new(0, 0)),
        Some(Point::new(6, 0))
    );
    assert_eq!(buffer.end_of_line(Point::new(0, 0)), Some(Point::new(9, 0)));
}

#[test]
fn end_of_file_lands_on_last_character() {
    let buffer = buffer_from(&["ab", "cde"]);
    assert_eq!(buffer.end_of_file(Point::new(0, 0)), Point::new(2, 1));
}

// ============================================================
// Word motions
// ============================================================

#[test]
fn next_word_stops_at_punctuation_with_weak_boundaries() {
    let buffer = buffer_from(&["foo.bar baz"]);
    let cursor = Point::new(0, 0);
    let cursor = buffer.next_word(cursor, true).unwrap();
    assert_eq!(cursor, Point::new(3, 0)); // '.'
    let cursor = buffer.next_word(cursor, true).unwrap();
    assert_eq!(cursor, Point::new(4, 0)); // 'bar'
    let cursor = buffer.next_word(cursor, true).unwrap();
    assert_eq!(cursor, Point::new(8, 0)); // 'baz'
}

#[test]
fn next_word_strong_boundaries_split_on_blanks_only() {
    let buffer = buffer_from(&["foo.bar baz"]);
    let cursor = buffer.next_word(Point::new(0, 0), false).unwrap();
    assert_eq!(cursor, Point::new(8, 0));
}

#[test]
fn next_word_crosses_line_boundaries() {
    let buffer = buffer_from(&["end", "start"]);
    let cursor = buffer.next_word(Point::new(2, 0), true).unwrap();
    assert_eq!(cursor, Point::new(0, 1));
}

#[test]
fn beginning_of_word_crosses_back_from_column_zero() {
    let buffer = buffer_from(&["word", "next"]);
    let cursor = buffer.beginning_of_word(Point::new(0, 1), true).unwrap();
    assert_eq!(cursor, Point::new(0, 0));
}

#[test]
fn underscore_is_a_word_character() {
    let buffer = buffer_from(&["some_name rest"]);
    let cursor = buffer.next_word(Point::new(0, 0), true).unwrap();
    assert_eq!(cursor, Point::new(10, 0));
}

#[test]
fn end_of_word_is_inclusive_target() {
    let buffer = buffer_from(&["one two"]);
    let cursor = buffer.end_of_word(Point::new(0, 0), true).unwrap();
    assert_eq!(cursor, Point::new(2, 0));
    let cursor = buffer.end_of_word(cursor, true).unwrap();
    assert_eq!(cursor, Point::new(6, 0));
}

// ============================================================
// Find char
// ============================================================

#[test]
fn find_char_scans_the_line_only() {
    let buffer = buffer_from(&["abcabc"]);
    assert_eq!(
        buffer.find_char_forward(Point::new(0, 0), 'c'),
        Some(Point::new(2, 0))
    );
    assert_eq!(
        buffer.find_char_forward(Point::new(2, 0), 'c'),
        Some(Point::new(5, 0))
    );
    assert_eq!(
        buffer.find_char_backward(Point::new(5, 0), 'a'),
        Some(Point::new(3, 0))
    );
    assert_eq!(buffer.find_char_forward(Point::new(5, 0), 'z'), None);
}

// ============================================================
// Matching pairs
// ============================================================

#[test]
fn matching_pair_spans_lines() {
    let buffer = buffer_from(&["int main(){", "}", ""]);
    assert_eq!(
        buffer.matching_pair(Point::new(10, 0), '{'),
        Some(Point::new(0, 1))
    );
    assert_eq!(
        buffer.matching_pair(Point::new(0, 1), '}'),
        Some(Point::new(10, 0))
    );
}

#[test]
fn unmatched_closer_finds_nothing() {
    let buffer = buffer_from(&["int main(){}", "}"]);
    assert_eq!(
        buffer.matching_pair(Point::new(10, 0), '{'),
        Some(Point::new(11, 0))
    );
    assert_eq!(buffer.matching_pair(Point::new(0, 1), '}'), None);
}

#[test]
fn matching_pair_respects_nesting() {
    let buffer = buffer_from(&["(a(b)c)"]);
    assert_eq!(
        buffer.matching_pair(Point::new(0, 0), '('),
        Some(Point::new(6, 0))
    );
    assert_eq!(
        buffer.matching_pair(Point::new(2, 0), '('),
        Some(Point::new(4, 0))
    );
}

#[test]
fn matching_pair_skips_string_literals() {
    let buffer = buffer_from(&["{ \"}\" }"]);
    assert_eq!(
        buffer.matching_pair(Point::new(0, 0), '{'),
        Some(Point::new(6, 0))
    );
}

#[test]
fn matching_pair_skips_line_comments() {
    let buffer = buffer_from(&["{ // }", "}"]);
    assert_eq!(
        buffer.matching_pair(Point::new(0, 0), '{'),
        Some(Point::new(0, 1))
    );
}

#[test]
fn escaped_quote_does_not_close_a_string() {
    let buffer = buffer_from(&["\"a\\\"b\" x"]);
    // string runs from 0 to 5; the escaped quote at 3 stays inside
    let close = buffer
        .find_matching_string_forward(Point::new(0, 0), '"')
        .unwrap();
    assert_eq!(close, Point::new(5, 0));
}

// ============================================================
// Indentation
// ============================================================

#[test]
fn brace_indentation_steps_in_one_tab() {
    let mut buffer = buffer_from(&["int main() {"]);
    buffer.file_type = crate::buffer::FileType::C;
    assert_eq!(buffer.indentation_for_line(Point::new(12, 0), 4), 4);
}

#[test]
fn matched_braces_do_not_indent() {
    let mut buffer = buffer_from(&["int x[] = {1};", "int y;"]);
    buffer.file_type = crate::buffer::FileType::C;
    assert_eq!(buffer.indentation_for_line(Point::new(6, 1), 4), 0);
}

#[test]
fn open_paren_indents_to_its_column() {
    let mut buffer = buffer_from(&["call(a,"]);
    buffer.file_type = crate::buffer::FileType::C;
    assert_eq!(buffer.indentation_for_line(Point::new(7, 0), 4), 5);
}

#[test]
fn python_indentation_follows_colon() {
    let mut buffer = buffer_from(&["def f():"]);
    buffer.file_type = crate::buffer::FileType::Python;
    assert_eq!(buffer.indentation_for_line(Point::new(8, 0), 4), 4);

    let mut buffer = buffer_from(&["    x = 1", ""]);
    buffer.file_type = crate::buffer::FileType::Python;
    assert_eq!(buffer.indentation_for_line(Point::new(0, 1), 4), 4);
}

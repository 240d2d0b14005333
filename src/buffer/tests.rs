use super::*;
use crate::point::Point;

fn buffer_from(lines: &[&str]) -> Buffer {
    let mut buffer = Buffer::new("test");
    for line in lines {
        buffer.append_line(line);
    }
    buffer
}

fn lines_of(buffer: &Buffer) -> Vec<&str> {
    buffer.lines.iter().map(|l| l.as_str()).collect()
}

// ============================================================
// Invariants
// ============================================================

#[test]
fn no_line_ever_contains_a_newline() {
    let mut buffer = buffer_from(&["alpha", "beta"]);
    buffer.insert_string(Point::new(2, 0), "x\ny\n\nz");
    buffer.insert_char(Point::new(0, 1), '\n');
    buffer.set_char(Point::new(0, 0), '\n');
    buffer.append_string(0, "tail\nmore");

    for line in &buffer.lines {
        assert!(!line.contains('\n'));
    }
}

#[test]
fn insert_then_exact_remove_is_identity() {
    let original = ["fn main() {", "    body();", "}"];
    let mut buffer = buffer_from(&original);

    let at = Point::new(4, 1);
    let inserted = "extra\nlines\n";
    assert!(buffer.insert_string(at, inserted));
    assert!(buffer.remove_string(at, inserted.len() as i64));

    assert_eq!(lines_of(&buffer), original);
}

#[test]
fn dupe_then_insert_reproduces_contents() {
    let buffer = buffer_from(&["one", "two", "three"]);
    let start = Point::new(1, 0);
    let end = Point::new(2, 2);
    let duped = buffer.dupe_string(start, end).unwrap();

    let mut replay = Buffer::new("replay");
    assert!(replay.load_string(&duped));
    assert_eq!(lines_of(&replay), vec!["ne", "two", "thr"]);
}

// ============================================================
// Insertion
// ============================================================

#[test]
fn insert_char_appends_and_splices() {
    let mut buffer = buffer_from(&["hello"]);
    assert!(buffer.insert_char(Point::new(5, 0), '!'));
    assert_eq!(lines_of(&buffer), vec!["hello!"]);

    assert!(buffer.insert_char(Point::new(0, 0), '>'));
    assert_eq!(lines_of(&buffer), vec![">hello!"]);
}

#[test]
fn insert_newline_char_splits_the_line() {
    let mut buffer = buffer_from(&["hello"]);
    assert!(buffer.insert_char(Point::new(2, 0), '\n'));
    assert_eq!(lines_of(&buffer), vec!["he", "llo"]);
}

#[test]
fn insert_string_with_newline_splits_around_the_column() {
    let mut buffer = buffer_from(&["foo"]);
    assert!(buffer.insert_string(Point::new(1, 0), "x\ny"));
    assert_eq!(lines_of(&buffer), vec!["fx", "yoo"]);
}

#[test]
fn insert_string_with_consecutive_newlines_makes_empty_lines() {
    let mut buffer = buffer_from(&["ab"]);
    assert!(buffer.insert_string(Point::new(1, 0), "1\n\n2"));
    assert_eq!(lines_of(&buffer), vec!["a1", "", "2b"]);
}

#[test]
fn insert_string_at_line_count_appends() {
    let mut buffer = buffer_from(&["first"]);
    assert!(buffer.insert_string(Point::new(0, 1), "second"));
    assert_eq!(lines_of(&buffer), vec!["first", "second"]);
}

#[test]
fn insert_string_into_empty_buffer_allocates_lines() {
    let mut buffer = Buffer::new("empty");
    assert!(buffer.insert_string(Point::new(0, 0), "a\nb\nc"));
    assert_eq!(lines_of(&buffer), vec!["a", "b", "c"]);
}

#[test]
fn load_single_line_with_trailing_newline_stays_single() {
    let mut buffer = Buffer::new("empty");
    assert!(buffer.load_string("only\n"));
    assert_eq!(lines_of(&buffer), vec!["only"]);
}

#[test]
fn insert_out_of_range_fails_without_mutation() {
    let mut buffer = buffer_from(&["abc"]);
    assert!(!buffer.insert_char(Point::new(9, 0), 'x'));
    assert!(!buffer.insert_string(Point::new(0, 5), "y"));
    assert_eq!(lines_of(&buffer), vec!["abc"]);
}

// ============================================================
// Removal
// ============================================================

#[test]
fn remove_across_line_end_joins_lines() {
    let mut buffer = buffer_from(&["ab", "cd"]);
    assert!(buffer.remove_string(Point::new(1, 0), 3));
    assert_eq!(lines_of(&buffer), vec!["ad"]);
}

#[test]
fn remove_whole_line_including_newline() {
    let mut buffer = buffer_from(&["ab", "cd"]);
    assert!(buffer.remove_string(Point::new(0, 0), 3));
    assert_eq!(lines_of(&buffer), vec!["cd"]);
}

#[test]
fn remove_at_end_of_line_joins() {
    let mut buffer = buffer_from(&["ab", "cd"]);
    assert!(buffer.remove_char(Point::new(2, 0)));
    assert_eq!(lines_of(&buffer), vec!["abcd"]);
}

#[test]
fn remove_zero_length_is_trivial_success() {
    let mut buffer = buffer_from(&["ab"]);
    assert!(buffer.remove_string(Point::new(0, 0), 0));
    assert_eq!(lines_of(&buffer), vec!["ab"]);
}

#[test]
fn remove_spanning_multiple_lines() {
    let mut buffer = buffer_from(&["abc", "def", "ghi"]);
    // "bc\ndef\ng" is 8 bytes
    assert!(buffer.remove_string(Point::new(1, 0), 8));
    assert_eq!(lines_of(&buffer), vec!["ahi"]);
}

#[test]
fn line_level_edits() {
    let mut buffer = buffer_from(&["one", "two"]);

    assert!(buffer.insert_newline(1));
    assert_eq!(lines_of(&buffer), vec!["one", "", "two"]);

    assert!(buffer.remove_line(1));
    assert_eq!(lines_of(&buffer), vec!["one", "two"]);

    assert!(buffer.append_char('!'));
    assert_eq!(lines_of(&buffer), vec!["one", "two!"]);
    assert_eq!(buffer.get_char_raw(Point::new(3, 1)), b'!');

    assert!(!buffer.remove_line(7));
}

#[test]
fn join_line_appends_the_next() {
    let mut buffer = buffer_from(&["one", "two"]);
    assert!(buffer.join_line(0));
    assert_eq!(lines_of(&buffer), vec!["onetwo"]);

    // joining the last line is a no-op success
    assert!(buffer.join_line(0));
    assert_eq!(lines_of(&buffer), vec!["onetwo"]);
}

// ============================================================
// Read-only entry points
// ============================================================

#[test]
fn readonly_buffers_reject_normal_mutation() {
    let mut buffer = buffer_from(&["text"]);
    buffer.status = BufferStatus::ReadOnly;

    assert!(!buffer.insert_char(Point::new(0, 0), 'x'));
    assert!(!buffer.remove_char(Point::new(0, 0)));
    assert!(!buffer.insert_string(Point::new(0, 0), "y"));
    assert!(!buffer.set_char(Point::new(0, 0), 'z'));
    assert_eq!(lines_of(&buffer), vec!["text"]);
}

#[test]
fn readonly_entry_points_only_work_on_readonly_buffers() {
    let mut buffer = buffer_from(&["text"]);
    assert!(!buffer.insert_char_readonly(Point::new(0, 0), 'x'));

    buffer.status = BufferStatus::ReadOnly;
    assert!(buffer.insert_char_readonly(Point::new(0, 0), 'x'));
    assert!(buffer.append_line_readonly("more"));
    assert_eq!(lines_of(&buffer), vec!["xtext", "more"]);
    assert_eq!(buffer.status, BufferStatus::ReadOnly);
}

#[test]
fn set_char_marks_modified() {
    let mut buffer = buffer_from(&["text"]);
    buffer.status = BufferStatus::None;
    assert!(buffer.set_char(Point::new(0, 0), 'n'));
    assert_eq!(buffer.status, BufferStatus::Modified);
}

// ============================================================
// Duplication and measurement
// ============================================================

#[test]
fn compute_length_counts_newlines_as_one_byte() {
    let buffer = buffer_from(&["abc", "de"]);
    // "bc\nd" inclusive
    assert_eq!(buffer.compute_length(Point::new(1, 0), Point::new(0, 1)), 4);
    // single line "ab"
    assert_eq!(buffer.compute_length(Point::new(0, 0), Point::new(1, 0)), 2);
}

#[test]
fn dupe_string_single_line() {
    let buffer = buffer_from(&["hello world"]);
    let duped = buffer.dupe_string(Point::new(0, 0), Point::new(4, 0)).unwrap();
    assert_eq!(duped, "hello");
}

#[test]
fn dupe_string_end_on_terminator_carries_newline() {
    let buffer = buffer_from(&["hi", "there"]);
    let duped = buffer.dupe_string(Point::new(0, 0), Point::new(2, 0)).unwrap();
    assert_eq!(duped, "hi\n");
}

#[test]
fn dupe_string_multi_line() {
    let buffer = buffer_from(&["one", "two", "three"]);
    let duped = buffer
        .dupe_string(Point::new(1, 0), Point::new(2, 2))
        .unwrap();
    assert_eq!(duped, "ne\ntwo\nthr");
}

#[test]
fn dupe_line_and_lines_are_newline_terminated() {
    let buffer = buffer_from(&["a", "b", "c"]);
    assert_eq!(buffer.dupe_line(1).unwrap(), "b\n");
    assert_eq!(buffer.dupe_lines(0, 1).unwrap(), "a\nb\n");
    assert_eq!(buffer.dupe_lines(2, 0).unwrap(), "a\nb\nc\n");
}

#[test]
fn prepend_and_append_string_target_line_ends() {
    let mut buffer = buffer_from(&["mid"]);
    assert!(buffer.prepend_string(0, ">> "));
    assert!(buffer.append_string(0, " <<"));
    assert_eq!(lines_of(&buffer), vec![">> mid <<"]);
}

#[test]
fn clear_empties_a_writable_buffer_only() {
    let mut buffer = buffer_from(&["gone"]);
    buffer.clear();
    assert!(buffer.lines.is_empty());

    let mut readonly = buffer_from(&["kept"]);
    readonly.status = BufferStatus::ReadOnly;
    readonly.clear();
    assert_eq!(lines_of(&readonly), vec!["kept"]);
    readonly.clear_readonly();
    assert!(readonly.lines.is_empty());
}

#[test]
fn dupe_buffer_copies_everything() {
    let buffer = buffer_from(&["a", "bb", "ccc"]);
    assert_eq!(buffer.dupe_buffer().unwrap(), "a\nbb\nccc");
    assert!(Buffer::new("empty").dupe_buffer().is_none());
}

#[test]
fn alloc_lines_replaces_contents_with_empties() {
    let mut buffer = buffer_from(&["old"]);
    assert!(buffer.alloc_lines(3));
    assert_eq!(lines_of(&buffer), vec!["", "", ""]);
    assert!(!buffer.alloc_lines(0));
}

#[test]
fn get_char_maps_terminator_to_newline() {
    let buffer = buffer_from(&["ab"]);
    assert_eq!(buffer.get_char(Point::new(0, 0)), Some('a'));
    assert_eq!(buffer.get_char(Point::new(2, 0)), Some('\n'));
    assert_eq!(buffer.get_char(Point::new(3, 0)), None);
}

#[test]
fn point_on_buffer_allows_the_terminator_column() {
    let buffer = buffer_from(&["ab"]);
    assert!(buffer.point_on_buffer(Point::new(2, 0)));
    assert!(!buffer.point_on_buffer(Point::new(3, 0)));
    assert!(!buffer.point_on_buffer(Point::new(0, 1)));
    assert!(!buffer.point_on_buffer(Point::new(-1, 0)));
}

// ============================================================
// File round trip
// ============================================================

#[test]
fn save_and_reload_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scratch.txt");
    let path = path.to_str().unwrap();

    let mut buffer = buffer_from(&["alpha", "", "gamma"]);
    assert!(buffer.save(path));
    assert_eq!(buffer.status, BufferStatus::None);

    let mut reloaded = Buffer::new("reload");
    assert_eq!(reloaded.load_file(path), LoadFileResult::Loaded);
    assert_eq!(lines_of(&reloaded), vec!["alpha", "", "gamma"]);
}

#[test]
fn load_file_distinguishes_missing_and_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut buffer = Buffer::new("probe");

    assert_eq!(
        buffer.load_file(dir.path().to_str().unwrap()),
        LoadFileResult::Directory
    );
    assert_eq!(
        buffer.load_file(dir.path().join("nope").to_str().unwrap()),
        LoadFileResult::Missing
    );
}

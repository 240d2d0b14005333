use super::*;
use crate::buffer::Buffer;

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

#[test]
fn insert_undo_redo_round_trip() {
    let mut buffer = buffer_from(&["hello"]);
    let mut log = CommitLog::new();

    let at = Point::new(5, 0);
    assert!(buffer.insert_char(at, '!'));
    log.insert_char(at, at, Point::new(6, 0), '!', Chain::Stop);
    assert_eq!(lines_of(&buffer), vec!["hello!"]);

    let cursor = log.undo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec!["hello"]);
    assert_eq!(cursor, Point::new(4, 0)); // clamped onto the line

    let cursor = log.redo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec!["hello!"]);
    assert_eq!(cursor, Point::new(6, 0));
}

#[test]
fn string_commits_reverse_multi_line_edits() {
    let mut buffer = buffer_from(&["foo"]);
    let mut log = CommitLog::new();

    let at = Point::new(1, 0);
    assert!(buffer.insert_string(at, "x\ny"));
    log.insert_string(at, at, at, "x\ny".to_string(), Chain::Stop);
    assert_eq!(lines_of(&buffer), vec!["fx", "yoo"]);

    log.undo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec!["foo"]);

    log.redo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec!["fx", "yoo"]);
}

#[test]
fn change_string_restores_prior_text() {
    let mut buffer = buffer_from(&["old text"]);
    let mut log = CommitLog::new();

    let at = Point::new(0, 0);
    assert!(buffer.remove_string(at, 3));
    assert!(buffer.insert_string(at, "new"));
    log.change_string(at, at, at, "new".to_string(), "old".to_string(), Chain::Stop);

    log.undo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec!["old text"]);

    log.redo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec!["new text"]);
}

#[test]
fn keep_going_chain_undoes_as_one_group() {
    let mut buffer = buffer_from(&[""]);
    let mut log = CommitLog::new();

    // three chars typed in one insert session
    for (i, c) in "abc".chars().enumerate() {
        let at = Point::new(i as i64, 0);
        buffer.insert_char(at, c);
        log.insert_char(at, at, Point::new(i as i64 + 1, 0), c, Chain::KeepGoing);
    }
    log.seal();
    assert_eq!(lines_of(&buffer), vec!["abc"]);

    log.undo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec![""]);

    log.redo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec!["abc"]);
}

#[test]
fn groups_undo_one_at_a_time() {
    let mut buffer = buffer_from(&[""]);
    let mut log = CommitLog::new();

    let at = Point::new(0, 0);
    buffer.insert_char(at, 'a');
    log.insert_char(at, at, at, 'a', Chain::Stop);

    let at = Point::new(1, 0);
    buffer.insert_char(at, 'b');
    log.insert_char(at, at, at, 'b', Chain::Stop);

    log.undo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec!["a"]);
    log.undo(&mut buffer).unwrap();
    assert_eq!(lines_of(&buffer), vec![""]);
    assert!(log.undo(&mut buffer).is_none());
}

#[test]
fn new_commit_after_undo_discards_the_redo_chain() {
    let mut buffer = buffer_from(&[""]);
    let mut log = CommitLog::new();

    let at = Point::new(0, 0);
    buffer.insert_char(at, 'a');
    log.insert_char(at, at, at, 'a', Chain::Stop);

    log.undo(&mut buffer).unwrap();
    assert!(log.can_redo());

    buffer.insert_char(at, 'z');
    log.insert_char(at, at, at, 'z', Chain::Stop);

    assert!(!log.can_redo());
    assert!(log.redo(&mut buffer).is_none());
    assert_eq!(lines_of(&buffer), vec!["z"]);
}

#[test]
fn undo_on_empty_log_fails() {
    let mut buffer = buffer_from(&["x"]);
    let mut log = CommitLog::new();
    assert!(log.is_empty());
    assert!(log.undo(&mut buffer).is_none());
    assert!(log.redo(&mut buffer).is_none());
}

#[test]
fn clear_forgets_all_history() {
    let mut buffer = buffer_from(&[""]);
    let mut log = CommitLog::new();

    let at = Point::new(0, 0);
    buffer.insert_char(at, 'a');
    log.insert_char(at, at, at, 'a', Chain::Stop);
    assert!(!log.is_empty());

    log.clear();
    assert!(log.is_empty());
    assert!(log.undo(&mut buffer).is_none());
}

use super::*;
use crate::buffer::{Buffer, FileType};
use crate::render::{HighlightLineType, LineNumberType};

struct RecordingSink {
    style: StyleId,
    highlight: HighlightKind,
}

impl StyleSink for RecordingSink {
    fn set_style(&mut self, style: StyleId, highlight: HighlightKind) {
        self.style = style;
        self.highlight = highlight;
    }
}

fn buffer_from(file_type: FileType, lines: &[&str]) -> Buffer {
    let mut buffer = Buffer::new("syntax-test");
    for line in lines {
        buffer.append_line(line);
    }
    buffer.file_type = file_type;
    buffer
}

/// Drive the four lifecycle points over the whole buffer and collect the
/// per-character styles
fn styles_of(buffer: &Buffer, highlight_regex: Option<&regex::Regex>) -> Vec<Vec<StyleId>> {
    let mut highlighter = highlighter_for(buffer.file_type);
    let mut sink = RecordingSink {
        style: StyleId::Normal,
        highlight: HighlightKind::Off,
    };

    let mut data = HighlightContext {
        buffer,
        top_left: Point::new(0, 0),
        bottom_right: Point::new(79, 23),
        cursor: buffer.cursor,
        loc: Point::new(0, 0),
        phase: SyntaxPhase::Initializing,
        highlight_regex,
        line_number_type: LineNumberType::None,
        highlight_line_type: HighlightLineType::None,
    };
    highlighter.highlight(&data, &mut sink);

    let mut all = Vec::new();
    for y in 0..buffer.line_count() {
        data.loc = Point::new(0, y);
        data.phase = SyntaxPhase::BeginningOfLine;
        highlighter.highlight(&data, &mut sink);

        let mut line_styles = Vec::new();
        let line_len = buffer.line(y).map_or(0, |l| l.len() as i64);
        for x in 0..line_len {
            data.loc = Point::new(x, y);
            data.phase = SyntaxPhase::Character;
            highlighter.highlight(&data, &mut sink);
            line_styles.push(sink.style);
        }

        data.loc = Point::new(line_len, y);
        data.phase = SyntaxPhase::EndOfLine;
        highlighter.highlight(&data, &mut sink);
        all.push(line_styles);
    }
    all
}

// ============================================================
// C highlighting
// ============================================================

#[test]
fn keywords_and_controls_are_styled_on_boundaries() {
    let buffer = buffer_from(FileType::C, &["if x; return y;"]);
    let styles = styles_of(&buffer, None);

    assert_eq!(styles[0][0], StyleId::Keyword); // i
    assert_eq!(styles[0][1], StyleId::Keyword); // f
    assert_eq!(styles[0][3], StyleId::Normal); // x
    assert_eq!(styles[0][6], StyleId::Control); // r of return
    assert_eq!(styles[0][11], StyleId::Control); // n of return
}

#[test]
fn identifier_prefixes_do_not_match_keywords() {
    let buffer = buffer_from(FileType::C, &["iffy"]);
    let styles = styles_of(&buffer, None);
    assert!(styles[0].iter().all(|&s| s == StyleId::Normal));
}

#[test]
fn line_comments_run_to_the_end() {
    let buffer = buffer_from(FileType::C, &["x; // if return"]);
    let styles = styles_of(&buffer, None);
    assert_eq!(styles[0][0], StyleId::Normal);
    for &style in &styles[0][3..] {
        assert_eq!(style, StyleId::Comment);
    }
}

#[test]
fn block_comments_span_lines() {
    let buffer = buffer_from(FileType::C, &["a /* start", "still if", "end */ b"]);
    let styles = styles_of(&buffer, None);

    assert_eq!(styles[0][0], StyleId::Normal);
    assert_eq!(styles[0][2], StyleId::Comment);
    assert!(styles[1].iter().all(|&s| s == StyleId::Comment));
    assert_eq!(styles[2][0], StyleId::Comment);
    assert_eq!(styles[2][5], StyleId::Comment); // closing '/'
    assert_eq!(styles[2][7], StyleId::Normal); // b
}

#[test]
fn strings_and_numbers() {
    let buffer = buffer_from(FileType::C, &["x = \"if\"; y = 42;"]);
    let styles = styles_of(&buffer, None);

    assert_eq!(styles[0][4], StyleId::String); // opening quote
    assert_eq!(styles[0][5], StyleId::String); // i
    assert_eq!(styles[0][7], StyleId::String); // closing quote
    assert_eq!(styles[0][14], StyleId::Number); // 4
    assert_eq!(styles[0][15], StyleId::Number); // 2
}

#[test]
fn preprocessor_lines_and_typedefs() {
    let buffer = buffer_from(FileType::C, &["#include <x.h>", "size_t n;"]);
    let styles = styles_of(&buffer, None);

    assert!(styles[0].iter().all(|&s| s == StyleId::Preprocessor));
    assert_eq!(styles[1][0], StyleId::Type);
    assert_eq!(styles[1][5], StyleId::Type);
    assert_eq!(styles[1][7], StyleId::Normal);
}

#[test]
fn trailing_whitespace_is_flagged() {
    let buffer = buffer_from(FileType::C, &["int x;   "]);
    let styles = styles_of(&buffer, None);
    assert_eq!(styles[0][6], StyleId::TrailingWhitespace);
    assert_eq!(styles[0][8], StyleId::TrailingWhitespace);
}

// ============================================================
// Python highlighting
// ============================================================

#[test]
fn python_keywords_comments_and_strings() {
    let buffer = buffer_from(FileType::Python, &["def f():  # make", "    return 'x'"]);
    let styles = styles_of(&buffer, None);

    assert_eq!(styles[0][0], StyleId::Keyword); // d
    assert_eq!(styles[0][2], StyleId::Keyword); // f
    assert_eq!(styles[0][4], StyleId::Normal); // f (name)
    assert_eq!(styles[0][10], StyleId::Comment); // '#'
    assert_eq!(styles[0][13], StyleId::Comment);

    assert_eq!(styles[1][4], StyleId::Control); // return
    assert_eq!(styles[1][11], StyleId::String); // opening quote
    assert_eq!(styles[1][12], StyleId::String); // x
}

#[test]
fn python_docstrings_span_lines() {
    let buffer = buffer_from(
        FileType::Python,
        &["\"\"\"top", "def not_code", "\"\"\"", "x = 1"],
    );
    let styles = styles_of(&buffer, None);

    assert!(styles[0].iter().all(|&s| s == StyleId::String));
    assert!(styles[1].iter().all(|&s| s == StyleId::String));
    assert!(styles[2].iter().all(|&s| s == StyleId::String));
    assert_eq!(styles[3][0], StyleId::Normal);
    assert_eq!(styles[3][4], StyleId::Number);
}

// ============================================================
// Bash and config highlighting
// ============================================================

#[test]
fn bash_keywords_and_comments() {
    let buffer = buffer_from(FileType::Bash, &["if true; then  # branch", "echo \"hi\""]);
    let styles = styles_of(&buffer, None);

    assert_eq!(styles[0][0], StyleId::Keyword); // if
    assert_eq!(styles[0][3], StyleId::Normal); // true is not a keyword here
    assert_eq!(styles[0][9], StyleId::Keyword); // then
    assert_eq!(styles[0][15], StyleId::Comment);
    assert_eq!(styles[1][5], StyleId::String);
}

#[test]
fn config_sections_and_comments() {
    let buffer = buffer_from(FileType::Config, &["[core]", "name = \"x\"  # note"]);
    let styles = styles_of(&buffer, None);

    assert!(styles[0].iter().all(|&s| s == StyleId::Preprocessor));
    assert_eq!(styles[1][0], StyleId::Normal);
    assert_eq!(styles[1][7], StyleId::String);
    assert_eq!(styles[1][12], StyleId::Comment);
}

// ============================================================
// Diff highlighting
// ============================================================

#[test]
fn diff_lines_style_by_their_first_character() {
    let buffer = buffer_from(
        FileType::Diff,
        &["@@ -1 +1 @@", "+added", "-removed", " context"],
    );
    let styles = styles_of(&buffer, None);

    assert!(styles[0].iter().all(|&s| s == StyleId::DiffHeader));
    assert!(styles[1].iter().all(|&s| s == StyleId::DiffAdded));
    assert!(styles[2].iter().all(|&s| s == StyleId::DiffRemoved));
    assert!(styles[3].iter().all(|&s| s == StyleId::Normal));
}

// ============================================================
// Overlay
// ============================================================

#[test]
fn visual_selection_overlays_the_base_style() {
    let mut buffer = buffer_from(FileType::Plain, &["select me"]);
    buffer.highlight_start = Point::new(2, 0);
    buffer.highlight_end = Point::new(5, 0);

    let mut overlay = SyntaxOverlay::default();
    let data = HighlightContext {
        buffer: &buffer,
        top_left: Point::new(0, 0),
        bottom_right: Point::new(79, 23),
        cursor: Point::new(0, 0),
        loc: Point::new(3, 0),
        phase: SyntaxPhase::Character,
        highlight_regex: None,
        line_number_type: LineNumberType::None,
        highlight_line_type: HighlightLineType::None,
    };
    assert_eq!(overlay.kind_at(&data), HighlightKind::Visual);

    overlay.begin_line(&data);
    let outside = HighlightContext {
        loc: Point::new(7, 0),
        ..data
    };
    assert_eq!(overlay.kind_at(&outside), HighlightKind::Off);
}

#[test]
fn search_matches_highlight_like_a_selection() {
    let buffer = buffer_from(FileType::Plain, &["foo bar foo"]);
    let regex = regex::Regex::new("foo").unwrap();

    let mut overlay = SyntaxOverlay::default();
    let mut data = HighlightContext {
        buffer: &buffer,
        top_left: Point::new(0, 0),
        bottom_right: Point::new(79, 23),
        cursor: Point::new(0, 0),
        loc: Point::new(0, 0),
        phase: SyntaxPhase::BeginningOfLine,
        highlight_regex: Some(&regex),
        line_number_type: LineNumberType::None,
        highlight_line_type: HighlightLineType::None,
    };
    overlay.begin_line(&data);

    data.loc = Point::new(1, 0);
    assert_eq!(overlay.kind_at(&data), HighlightKind::Visual);
    data.loc = Point::new(4, 0);
    assert_eq!(overlay.kind_at(&data), HighlightKind::Off);
    data.loc = Point::new(9, 0);
    assert_eq!(overlay.kind_at(&data), HighlightKind::Visual);
}

#[test]
fn current_line_policy_highlights_the_cursor_row() {
    let buffer = buffer_from(FileType::Plain, &["text   "]);
    let overlay = SyntaxOverlay::default();
    let data = HighlightContext {
        buffer: &buffer,
        top_left: Point::new(0, 0),
        bottom_right: Point::new(79, 23),
        cursor: Point::new(0, 0),
        loc: Point::new(1, 0),
        phase: SyntaxPhase::Character,
        highlight_regex: None,
        line_number_type: LineNumberType::None,
        highlight_line_type: HighlightLineType::ToEndOfText,
    };
    assert_eq!(overlay.kind_at(&data), HighlightKind::CurrentLine);

    let past_text = HighlightContext {
        loc: Point::new(6, 0),
        ..data
    };
    assert_eq!(overlay.kind_at(&past_text), HighlightKind::Off);
}

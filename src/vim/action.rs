//! Vim action vocabulary: motions, operators, text objects, and the
//! range resolution that turns them into concrete buffer spans

use regex::Regex;

use crate::buffer::motion::{is_blank, is_punct, is_word_char};
use crate::buffer::Buffer;
use crate::point::{Direction, Point};

/// A cursor motion, possibly the target of a pending operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    /// `w` / `W`
    NextWord { punct: bool },
    /// `b` / `B`
    WordBeginning { punct: bool },
    /// `e` / `E`
    WordEnd { punct: bool },
    /// `0`
    LineBeginning,
    /// `^`
    SoftLineBeginning,
    /// `$`
    LineEnd,
    /// `gg`
    FileBeginning,
    /// `G`
    FileEnd,
    /// `{` / `}`
    ParagraphBackward,
    ParagraphForward,
    /// `f<c>` / `F<c>`
    FindChar(char),
    FindCharBackward(char),
    /// `t<c>` / `T<c>`
    TillChar(char),
    TillCharBackward(char),
    /// `%`
    MatchingPair,
    /// `n` / `N`
    SearchNext,
    SearchPrevious,
    /// `` `<c> `` / `'<c>`
    MarkGoto(char),
    MarkGotoLine(char),
}

/// How a resolved motion bounds its operator range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Exclusive,
    Inclusive,
    Linewise,
}

/// A resolved motion target
#[derive(Debug, Clone, Copy)]
pub struct MotionTarget {
    pub destination: Point,
    pub kind: RangeKind,
    /// Long jumps push the pre-motion position onto the jump list
    pub is_jump: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Delete,
    Change,
    Yank,
    Indent,
    Dedent,
    AutoIndent,
}

impl Operator {
    pub fn from_key(c: char) -> Option<Operator> {
        match c {
            'd' => Some(Operator::Delete),
            'c' => Some(Operator::Change),
            'y' => Some(Operator::Yank),
            '>' => Some(Operator::Indent),
            '<' => Some(Operator::Dedent),
            '=' => Some(Operator::AutoIndent),
            _ => None,
        }
    }

}

/// `i<c>` / `a<c>` objects; `around` includes the delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextObject {
    Word { punct: bool, around: bool },
    Pair { open: char, close: char, around: bool },
    Quote { quote: char, around: bool },
}

impl TextObject {
    pub fn from_key(c: char, around: bool) -> Option<TextObject> {
        match c {
            'w' => Some(TextObject::Word {
                punct: true,
                around,
            }),
            'W' => Some(TextObject::Word {
                punct: false,
                around,
            }),
            '(' | ')' => Some(TextObject::Pair {
                open: '(',
                close: ')',
                around,
            }),
            '{' | '}' => Some(TextObject::Pair {
                open: '{',
                close: '}',
                around,
            }),
            '[' | ']' => Some(TextObject::Pair {
                open: '[',
                close: ']',
                around,
            }),
            '<' | '>' => Some(TextObject::Pair {
                open: '<',
                close: '>',
                around,
            }),
            '"' => Some(TextObject::Quote {
                quote: '"',
                around,
            }),
            '\'' => Some(TextObject::Quote {
                quote: '\'',
                around,
            }),
            _ => None,
        }
    }
}

/// Where entering insert mode places the cursor first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPlacement {
    /// `i`
    Here,
    /// `a`
    After,
    /// `I`
    SoftLineBeginning,
    /// `A`
    LineEnd,
    /// `o`
    LineBelow,
    /// `O`
    LineAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    Range,
    Line,
    Block,
}

/// A fully decoded normal-mode action
#[derive(Debug, Clone, Copy)]
pub enum ActionKind {
    Motion(Motion),
    OperatorMotion { op: Operator, motion: Motion },
    /// Doubled operator (`dd`, `yy`, ...) targeting whole lines
    OperatorLine(Operator),
    OperatorObject { op: Operator, object: TextObject },
    /// Operator applied to the active visual selection
    OperatorVisual(Operator),
    DeleteChar,
    DeleteCharBackward,
    ReplaceChar(char),
    PasteAfter,
    PasteBefore,
    Undo,
    Redo,
    EnterInsert(InsertPlacement),
    EnterVisual(VisualKind),
    SetMark(char),
    SearchWordForward,
    SearchWordBackward,
    RepeatLastAction,
}

/// An action plus its count and register prefix
#[derive(Debug, Clone, Copy)]
pub struct VimAction {
    pub count: u32,
    pub register: Option<char>,
    pub kind: ActionKind,
}

/// Everything motion resolution may need besides the buffer
pub struct MotionContext<'a> {
    pub buffer: &'a Buffer,
    pub cursor: Point,
    pub search: Option<(&'a Regex, Direction)>,
}

/// Resolve `motion` applied `count` times from the context cursor
pub fn resolve_motion(motion: Motion, count: u32, ctx: &MotionContext) -> Option<MotionTarget> {
    let buffer = ctx.buffer;
    let count = count.max(1);
    let mut cursor = ctx.cursor;

    let target = |destination, kind| {
        Some(MotionTarget {
            destination,
            kind,
            is_jump: false,
        })
    };
    let jump = |destination, kind| {
        Some(MotionTarget {
            destination,
            kind,
            is_jump: true,
        })
    };

    match motion {
        Motion::Left => target(
            buffer.move_cursor(cursor, Point::new(-(count as i64), 0)),
            RangeKind::Exclusive,
        ),
        Motion::Right => target(
            buffer.move_cursor(cursor, Point::new(count as i64, 0)),
            RangeKind::Exclusive,
        ),
        Motion::Up => target(
            buffer.move_cursor(cursor, Point::new(0, -(count as i64))),
            RangeKind::Linewise,
        ),
        Motion::Down => target(
            buffer.move_cursor(cursor, Point::new(0, count as i64)),
            RangeKind::Linewise,
        ),
        Motion::NextWord { punct } => {
            for _ in 0..count {
                cursor = buffer.next_word(cursor, punct)?;
            }
            target(cursor, RangeKind::Exclusive)
        }
        Motion::WordBeginning { punct } => {
            for _ in 0..count {
                cursor = buffer.beginning_of_word(cursor, punct)?;
            }
            target(cursor, RangeKind::Exclusive)
        }
        Motion::WordEnd { punct } => {
            for _ in 0..count {
                cursor = buffer.end_of_word(cursor, punct)?;
            }
            target(cursor, RangeKind::Inclusive)
        }
        Motion::LineBeginning => target(buffer.beginning_of_line(cursor), RangeKind::Exclusive),
        Motion::SoftLineBeginning => {
            target(buffer.soft_beginning_of_line(cursor)?, RangeKind::Exclusive)
        }
        Motion::LineEnd => target(buffer.end_of_line(cursor)?, RangeKind::Inclusive),
        Motion::FileBeginning => jump(buffer.beginning_of_file(), RangeKind::Linewise),
        Motion::FileEnd => {
            // a count turns `G` into goto-line (1-indexed)
            let destination = if count > 1 {
                buffer.clamp_cursor(Point::new(0, count as i64 - 1))
            } else {
                buffer.end_of_file(cursor)
            };
            jump(destination, RangeKind::Linewise)
        }
        Motion::ParagraphBackward => {
            for _ in 0..count {
                cursor = paragraph_backward(buffer, cursor);
            }
            target(cursor, RangeKind::Exclusive)
        }
        Motion::ParagraphForward => {
            for _ in 0..count {
                cursor = paragraph_forward(buffer, cursor);
            }
            target(cursor, RangeKind::Exclusive)
        }
        Motion::FindChar(c) => {
            for _ in 0..count {
                cursor = buffer.find_char_forward(cursor, c)?;
            }
            target(cursor, RangeKind::Inclusive)
        }
        Motion::FindCharBackward(c) => {
            for _ in 0..count {
                cursor = buffer.find_char_backward(cursor, c)?;
            }
            target(cursor, RangeKind::Exclusive)
        }
        Motion::TillChar(c) => {
            for _ in 0..count {
                cursor = buffer.find_char_forward(cursor, c)?;
            }
            target(Point::new(cursor.x - 1, cursor.y), RangeKind::Inclusive)
        }
        Motion::TillCharBackward(c) => {
            for _ in 0..count {
                cursor = buffer.find_char_backward(cursor, c)?;
            }
            target(Point::new(cursor.x + 1, cursor.y), RangeKind::Exclusive)
        }
        Motion::MatchingPair => {
            let under = buffer.get_char(cursor)?;
            let matched = buffer.matching_pair(cursor, under)?;
            target(matched, RangeKind::Inclusive)
        }
        Motion::SearchNext => {
            let (regex, direction) = ctx.search?;
            let (matched, _) = buffer.find_regex(step_for_search(buffer, cursor, direction), regex, direction)?;
            jump(matched, RangeKind::Exclusive)
        }
        Motion::SearchPrevious => {
            let (regex, direction) = ctx.search?;
            let direction = direction.reverse();
            let (matched, _) = buffer.find_regex(step_for_search(buffer, cursor, direction), regex, direction)?;
            jump(matched, RangeKind::Exclusive)
        }
        Motion::MarkGoto(register) => {
            let mark = *buffer.marks.get(&register)?;
            jump(buffer.clamp_cursor(mark), RangeKind::Exclusive)
        }
        Motion::MarkGotoLine(register) => {
            let mark = *buffer.marks.get(&register)?;
            let line_start = buffer.soft_beginning_of_line(buffer.clamp_cursor(mark))?;
            jump(line_start, RangeKind::Linewise)
        }
    }
}

/// Step off the current match so repeated searches advance
fn step_for_search(buffer: &Buffer, cursor: Point, direction: Direction) -> Point {
    match direction {
        Direction::Down => buffer.advance_cursor(cursor, 1).unwrap_or(cursor),
        Direction::Up => cursor,
    }
}

fn paragraph_forward(buffer: &Buffer, cursor: Point) -> Point {
    let mut y = cursor.y + 1;
    while y < buffer.line_count() {
        if buffer.line(y).is_some_and(|l| l.is_empty()) {
            return Point::new(0, y);
        }
        y += 1;
    }
    buffer.end_of_file(cursor)
}

fn paragraph_backward(buffer: &Buffer, cursor: Point) -> Point {
    let mut y = cursor.y - 1;
    while y >= 0 {
        if buffer.line(y).is_some_and(|l| l.is_empty()) {
            return Point::new(0, y);
        }
        y -= 1;
    }
    Point::new(0, 0)
}

/// Resolve a text object into an inclusive `[start, end]` span
pub fn resolve_text_object(
    object: TextObject,
    buffer: &Buffer,
    cursor: Point,
) -> Option<(Point, Point)> {
    match object {
        TextObject::Word { punct, around } => {
            let under = buffer.get_char(cursor)?;
            let (start, mut end) = if is_blank(under) {
                buffer.homogenous_adjacents(cursor, is_blank)?
            } else if punct && is_punct(under) {
                buffer.homogenous_adjacents(cursor, is_punct)?
            } else if punct {
                buffer.homogenous_adjacents(cursor, is_word_char)?
            } else {
                buffer.homogenous_adjacents(cursor, |c| !is_blank(c))?
            };

            if around {
                // `aw` swallows the trailing blank run
                let mut after = Point::new(end.x + 1, end.y);
                while buffer.get_char(after).is_some_and(|c| is_blank(c) && c != '\n') {
                    end = after;
                    after.x += 1;
                }
            }
            Some((start, end))
        }
        TextObject::Pair { open, close, around } => {
            let under = buffer.get_char(cursor)?;
            let (start, end) = if under == open {
                (cursor, buffer.matching_pair(cursor, open)?)
            } else if under == close {
                (buffer.matching_pair(cursor, close)?, cursor)
            } else {
                // scan outward: the enclosing open must match past us
                let start = buffer.find_matching_pair_enclosing(cursor, open, close)?;
                let end = buffer.matching_pair(start, open)?;
                (start, end)
            };

            if around {
                Some((start, end))
            } else {
                let inner_start = buffer.advance_cursor(start, 1)?;
                let inner_end = buffer.advance_cursor(end, -1)?;
                if inner_end.after(inner_start) || inner_start == inner_end {
                    Some((inner_start, inner_end))
                } else {
                    None
                }
            }
        }
        TextObject::Quote { quote, around } => {
            let line = buffer.line(cursor.y)?;
            let bytes = line.as_bytes();
            // find the quote pair containing or following the cursor
            let mut open_x: Option<i64> = None;
            let mut pairs: Vec<(i64, i64)> = Vec::new();
            let mut prev = b'\0';
            for (i, &b) in bytes.iter().enumerate() {
                if b == quote as u8 && prev != b'\\' {
                    match open_x {
                        None => open_x = Some(i as i64),
                        Some(o) => {
                            pairs.push((o, i as i64));
                            open_x = None;
                        }
                    }
                }
                prev = b;
            }

            let (start_x, end_x) = pairs
                .into_iter()
                .find(|&(_, close_x)| close_x >= cursor.x)?;

            if around {
                Some((
                    Point::new(start_x, cursor.y),
                    Point::new(end_x, cursor.y),
                ))
            } else if end_x - start_x > 1 {
                Some((
                    Point::new(start_x + 1, cursor.y),
                    Point::new(end_x - 1, cursor.y),
                ))
            } else {
                None
            }
        }
    }
}

impl Buffer {
    /// Innermost unmatched `open` before `cursor`, i.e. the opener of the
    /// pair enclosing it
    pub(crate) fn find_matching_pair_enclosing(
        &self,
        cursor: Point,
        open: char,
        close: char,
    ) -> Option<Point> {
        // walking backward from the cursor, the first opener whose match
        // lies at or beyond the cursor encloses it
        let mut itr = cursor;
        loop {
            itr = self.advance_cursor(itr, -1)?;
            let c = self.get_char(itr)?;
            if c == open {
                let matched = self.matching_pair(itr, open)?;
                if matched.after(cursor) || matched == cursor {
                    return Some(itr);
                }
            } else if c == close {
                // skip the nested pair entirely
                itr = self.matching_pair(itr, close)?;
            }
            if itr == Point::new(0, 0) {
                return None;
            }
        }
    }
}


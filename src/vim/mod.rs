//! Modal command interpreter
//!
//! Decodes the normal-mode key grammar
//! `[count] [register] (motion | operator [count] motion | operator
//! operator | operator text-object | action)` into [`VimAction`]s and
//! applies them to the current view's buffer, recording commits so every
//! user-level action undoes atomically.
//!
//! The interpreter is an explicit state machine: a count accumulator, a
//! latched register, a latched operator, and an `Awaiting` slot for the
//! argument character of `f t r m q @` and friends. Transitions are total:
//! unrecognized keys in normal mode reset pending state and are ignored.

pub mod action;

use regex::Regex;

use crate::buffer::Buffer;
use crate::commit::{Chain, CommitLog};
use crate::jump::JumpList;
use crate::key::Key;
use crate::point::{sort_points, Direction, Point};
use crate::registers::{MacroTable, YankMode, YankTable, SEARCH_REGISTER, UNNAMED_REGISTER};

use action::{
    resolve_motion, resolve_text_object, ActionKind, InsertPlacement, Motion, MotionContext,
    MotionTarget, Operator, RangeKind, TextObject, VimAction, VisualKind,
};

/// Interpreter mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VimMode {
    #[default]
    Normal,
    Insert,
    VisualRange,
    VisualLine,
    VisualBlock,
}

impl VimMode {
    pub fn name(self) -> &'static str {
        match self {
            VimMode::Normal => "NORMAL",
            VimMode::Insert => "INSERT",
            VimMode::VisualRange => "VISUAL",
            VimMode::VisualLine => "VISUAL LINE",
            VimMode::VisualBlock => "VISUAL BLOCK",
        }
    }
}

/// Which argument character the interpreter is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Register,
    Find(FindKind),
    Replace,
    SetMark,
    GotoMarkExact,
    GotoMarkLine,
    RecordMacro,
    PlayMacro,
    TextObject { around: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FindKind {
    Forward,
    Backward,
    TillForward,
    TillBackward,
}

/// Work the interpreter cannot do itself and hands to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorRequest {
    TabNext,
    TabPrevious,
    PlayMacro(char),
}

/// Result of feeding one key to the interpreter
#[derive(Debug)]
pub enum VimOutcome {
    /// Consumed; possibly mid-sequence
    Consumed,
    /// Consumed and an action was applied
    Applied,
    /// Consumed; the editor must carry out a request
    Request(EditorRequest),
    /// Not meaningful in the current state
    Ignored,
}

/// Active search pattern shared by `/ ? n N * #`
pub struct SearchState {
    pub regex: Regex,
    pub pattern: String,
    pub direction: Direction,
}

/// Everything an action application touches
pub struct ApplyContext<'a> {
    pub buffer: &'a mut Buffer,
    pub commits: &'a mut CommitLog,
    pub cursor: &'a mut Point,
    pub jumps: &'a mut JumpList,
    pub tab_width: i64,
}

#[derive(Clone)]
struct RecordedAction {
    action: VimAction,
    insert_text: Option<String>,
}

#[derive(Default)]
pub struct VimState {
    pub mode: VimMode,
    count: u32,
    op_count: u32,
    register: Option<char>,
    pending_op: Option<Operator>,
    awaiting: Option<Awaiting>,
    g_pending: bool,
    visual_start: Point,
    /// Cursor position recorded when insert mode was entered
    pub insert_anchor: Point,
    insert_text: String,
    /// Set when the in-progress insert session belongs to a repeatable
    /// action and should be captured on exit
    capture_insert: bool,
    pub yanks: YankTable,
    pub macros: MacroTable,
    recording: Option<(char, Vec<Key>)>,
    pub search: Option<SearchState>,
    last_action: Option<RecordedAction>,
    replaying: bool,
}

impl VimState {
    pub fn new() -> Self {
        VimState::default()
    }

    /// True when no partial sequence is latched; the editor only claims
    /// its global keys while the interpreter is idle
    pub fn is_idle(&self) -> bool {
        self.mode == VimMode::Normal
            && self.count == 0
            && self.pending_op.is_none()
            && self.awaiting.is_none()
            && !self.g_pending
    }

    pub fn recording_register(&self) -> Option<char> {
        self.recording.as_ref().map(|(register, _)| *register)
    }

    /// Current visual selection, ordered, with its kind
    pub fn selection(&self, cursor: Point) -> Option<(Point, Point, VisualKind)> {
        let kind = match self.mode {
            VimMode::VisualRange => VisualKind::Range,
            VimMode::VisualLine => VisualKind::Line,
            VimMode::VisualBlock => VisualKind::Block,
            _ => return None,
        };
        let (start, end) = sort_points(self.visual_start, cursor);
        Some((start, end, kind))
    }

    fn reset_pending(&mut self) {
        self.count = 0;
        self.op_count = 0;
        self.register = None;
        self.pending_op = None;
        self.awaiting = None;
        self.g_pending = false;
    }

    /// Feed one key through the interpreter
    pub fn handle_key(&mut self, key: Key, ctx: &mut ApplyContext) -> VimOutcome {
        if let Some((_, keys)) = self.recording.as_mut() {
            keys.push(key);
        }

        match self.mode {
            VimMode::Insert => self.handle_insert_key(key, ctx),
            _ => self.handle_normal_key(key, ctx),
        }
    }

    // ------------------------------------------------------------------
    // Normal / visual decode
    // ------------------------------------------------------------------

    fn handle_normal_key(&mut self, key: Key, ctx: &mut ApplyContext) -> VimOutcome {
        if let Some(awaiting) = self.awaiting {
            return self.handle_awaited_key(awaiting, key, ctx);
        }

        if self.g_pending {
            self.g_pending = false;
            return match key {
                Key::Char('g') => self.finish_motion(Motion::FileBeginning, ctx),
                Key::Char('t') => {
                    self.reset_pending();
                    VimOutcome::Request(EditorRequest::TabNext)
                }
                Key::Char('T') => {
                    self.reset_pending();
                    VimOutcome::Request(EditorRequest::TabPrevious)
                }
                _ => {
                    self.reset_pending();
                    VimOutcome::Ignored
                }
            };
        }

        match key {
            Key::Escape => {
                self.reset_pending();
                if self.mode != VimMode::Normal {
                    self.leave_visual(ctx);
                }
                VimOutcome::Consumed
            }

            Key::Char(c) if c.is_ascii_digit() && !(c == '0' && self.active_count() == 0) => {
                let digit = c.to_digit(10).unwrap_or(0);
                if self.pending_op.is_some() {
                    self.op_count = self.op_count.saturating_mul(10).saturating_add(digit);
                } else {
                    self.count = self.count.saturating_mul(10).saturating_add(digit);
                }
                VimOutcome::Consumed
            }

            Key::Char('"') => {
                self.awaiting = Some(Awaiting::Register);
                VimOutcome::Consumed
            }

            Key::Char('g') => {
                self.g_pending = true;
                VimOutcome::Consumed
            }

            Key::Char(c) if Operator::from_key(c).is_some() => {
                let op = Operator::from_key(c).unwrap_or(Operator::Delete);
                if self.mode != VimMode::Normal {
                    return self.finish_action(ActionKind::OperatorVisual(op), ctx);
                }
                match self.pending_op {
                    None => {
                        self.pending_op = Some(op);
                        VimOutcome::Consumed
                    }
                    Some(pending) if pending == op => {
                        // doubled operator selects whole lines
                        self.finish_action(ActionKind::OperatorLine(op), ctx)
                    }
                    Some(_) => {
                        self.reset_pending();
                        VimOutcome::Ignored
                    }
                }
            }

            Key::Char(c @ ('i' | 'a')) if self.pending_op.is_some() => {
                self.awaiting = Some(Awaiting::TextObject { around: c == 'a' });
                VimOutcome::Consumed
            }

            // plain motions
            Key::Char('h') | Key::ArrowLeft => self.finish_motion(Motion::Left, ctx),
            Key::Char('l') | Key::ArrowRight => self.finish_motion(Motion::Right, ctx),
            Key::Char('k') | Key::ArrowUp => self.finish_motion(Motion::Up, ctx),
            Key::Char('j') | Key::ArrowDown => self.finish_motion(Motion::Down, ctx),
            Key::Char('w') => self.finish_motion(Motion::NextWord { punct: true }, ctx),
            Key::Char('W') => self.finish_motion(Motion::NextWord { punct: false }, ctx),
            Key::Char('b') => self.finish_motion(Motion::WordBeginning { punct: true }, ctx),
            Key::Char('B') => self.finish_motion(Motion::WordBeginning { punct: false }, ctx),
            Key::Char('e') => self.finish_motion(Motion::WordEnd { punct: true }, ctx),
            Key::Char('E') => self.finish_motion(Motion::WordEnd { punct: false }, ctx),
            Key::Char('0') | Key::Home => self.finish_motion(Motion::LineBeginning, ctx),
            Key::Char('^') => self.finish_motion(Motion::SoftLineBeginning, ctx),
            Key::Char('$') | Key::End => self.finish_motion(Motion::LineEnd, ctx),
            Key::Char('G') => self.finish_motion(Motion::FileEnd, ctx),
            Key::Char('{') => self.finish_motion(Motion::ParagraphBackward, ctx),
            Key::Char('}') => self.finish_motion(Motion::ParagraphForward, ctx),
            Key::Char('%') => self.finish_motion(Motion::MatchingPair, ctx),
            Key::Char('n') => self.finish_motion(Motion::SearchNext, ctx),
            Key::Char('N') => self.finish_motion(Motion::SearchPrevious, ctx),

            Key::Char('f') => {
                self.awaiting = Some(Awaiting::Find(FindKind::Forward));
                VimOutcome::Consumed
            }
            Key::Char('F') => {
                self.awaiting = Some(Awaiting::Find(FindKind::Backward));
                VimOutcome::Consumed
            }
            Key::Char('t') => {
                self.awaiting = Some(Awaiting::Find(FindKind::TillForward));
                VimOutcome::Consumed
            }
            Key::Char('T') => {
                self.awaiting = Some(Awaiting::Find(FindKind::TillBackward));
                VimOutcome::Consumed
            }

            Key::Char('m') => {
                self.awaiting = Some(Awaiting::SetMark);
                VimOutcome::Consumed
            }
            Key::Char('`') => {
                self.awaiting = Some(Awaiting::GotoMarkExact);
                VimOutcome::Consumed
            }
            Key::Char('\'') => {
                self.awaiting = Some(Awaiting::GotoMarkLine);
                VimOutcome::Consumed
            }

            Key::Char('x') => self.finish_action(ActionKind::DeleteChar, ctx),
            Key::Char('X') => self.finish_action(ActionKind::DeleteCharBackward, ctx),
            Key::Char('r') if self.pending_op.is_none() => {
                self.awaiting = Some(Awaiting::Replace);
                VimOutcome::Consumed
            }
            Key::Char('p') => self.finish_action(ActionKind::PasteAfter, ctx),
            Key::Char('P') => self.finish_action(ActionKind::PasteBefore, ctx),
            Key::Char('u') => self.finish_action(ActionKind::Undo, ctx),
            Key::Ctrl(b'r') => self.finish_action(ActionKind::Redo, ctx),
            Key::Char('.') => self.finish_action(ActionKind::RepeatLastAction, ctx),
            Key::Char('*') => self.finish_action(ActionKind::SearchWordForward, ctx),
            Key::Char('#') => self.finish_action(ActionKind::SearchWordBackward, ctx),

            Key::Char('i') => self.finish_action(ActionKind::EnterInsert(InsertPlacement::Here), ctx),
            Key::Char('a') => {
                self.finish_action(ActionKind::EnterInsert(InsertPlacement::After), ctx)
            }
            Key::Char('I') => self.finish_action(
                ActionKind::EnterInsert(InsertPlacement::SoftLineBeginning),
                ctx,
            ),
            Key::Char('A') => {
                self.finish_action(ActionKind::EnterInsert(InsertPlacement::LineEnd), ctx)
            }
            Key::Char('o') => {
                self.finish_action(ActionKind::EnterInsert(InsertPlacement::LineBelow), ctx)
            }
            Key::Char('O') => {
                self.finish_action(ActionKind::EnterInsert(InsertPlacement::LineAbove), ctx)
            }

            Key::Char('v') => self.finish_action(ActionKind::EnterVisual(VisualKind::Range), ctx),
            Key::Char('V') => self.finish_action(ActionKind::EnterVisual(VisualKind::Line), ctx),
            Key::Ctrl(b'g') => self.finish_action(ActionKind::EnterVisual(VisualKind::Block), ctx),

            Key::Char('q') => {
                if let Some((register, mut keys)) = self.recording.take() {
                    keys.pop(); // drop the terminating q itself
                    self.macros.record(register, keys);
                    VimOutcome::Consumed
                } else {
                    self.awaiting = Some(Awaiting::RecordMacro);
                    VimOutcome::Consumed
                }
            }
            Key::Char('@') => {
                self.awaiting = Some(Awaiting::PlayMacro);
                VimOutcome::Consumed
            }

            _ => {
                self.reset_pending();
                VimOutcome::Ignored
            }
        }
    }

    fn active_count(&self) -> u32 {
        if self.pending_op.is_some() {
            self.op_count
        } else {
            self.count
        }
    }

    fn handle_awaited_key(
        &mut self,
        awaiting: Awaiting,
        key: Key,
        ctx: &mut ApplyContext,
    ) -> VimOutcome {
        self.awaiting = None;

        let Key::Char(c) = key else {
            self.reset_pending();
            return VimOutcome::Consumed;
        };

        match awaiting {
            Awaiting::Register => {
                self.register = Some(c);
                VimOutcome::Consumed
            }
            Awaiting::Find(kind) => {
                let motion = match kind {
                    FindKind::Forward => Motion::FindChar(c),
                    FindKind::Backward => Motion::FindCharBackward(c),
                    FindKind::TillForward => Motion::TillChar(c),
                    FindKind::TillBackward => Motion::TillCharBackward(c),
                };
                self.finish_motion(motion, ctx)
            }
            Awaiting::Replace => self.finish_action(ActionKind::ReplaceChar(c), ctx),
            Awaiting::SetMark => self.finish_action(ActionKind::SetMark(c), ctx),
            Awaiting::GotoMarkExact => self.finish_motion(Motion::MarkGoto(c), ctx),
            Awaiting::GotoMarkLine => self.finish_motion(Motion::MarkGotoLine(c), ctx),
            Awaiting::RecordMacro => {
                self.recording = Some((c, Vec::new()));
                VimOutcome::Consumed
            }
            Awaiting::PlayMacro => {
                self.reset_pending();
                VimOutcome::Request(EditorRequest::PlayMacro(c))
            }
            Awaiting::TextObject { around } => match (TextObject::from_key(c, around), self.pending_op)
            {
                (Some(object), Some(op)) => {
                    self.finish_action(ActionKind::OperatorObject { op, object }, ctx)
                }
                _ => {
                    self.reset_pending();
                    VimOutcome::Ignored
                }
            },
        }
    }

    fn finish_motion(&mut self, motion: Motion, ctx: &mut ApplyContext) -> VimOutcome {
        let kind = match self.pending_op {
            Some(op) => ActionKind::OperatorMotion { op, motion },
            None => ActionKind::Motion(motion),
        };
        self.finish_action(kind, ctx)
    }

    fn finish_action(&mut self, kind: ActionKind, ctx: &mut ApplyContext) -> VimOutcome {
        let count = self.count.max(1) * self.op_count.max(1);
        let action = VimAction {
            count,
            register: self.register,
            kind,
        };
        self.reset_pending();
        self.apply(action, ctx)
    }

    // ------------------------------------------------------------------
    // Application
    // ------------------------------------------------------------------

    /// Apply a decoded action against the context
    pub fn apply(&mut self, action: VimAction, ctx: &mut ApplyContext) -> VimOutcome {
        match action.kind {
            ActionKind::Motion(motion) => {
                let Some(target) = self.resolve(motion, action.count, ctx) else {
                    return VimOutcome::Consumed;
                };
                self.move_to_target(target, ctx);
                VimOutcome::Applied
            }

            ActionKind::OperatorMotion { op, motion } => {
                let cursor = *ctx.cursor;
                let Some(target) = self.resolve(motion, action.count, ctx) else {
                    return VimOutcome::Consumed;
                };
                if target.destination == cursor && target.kind != RangeKind::Linewise {
                    // the motion didn't move; nothing to operate on
                    return VimOutcome::Consumed;
                }
                self.record_dot(action);
                match target.kind {
                    RangeKind::Linewise => {
                        let (start, end) = sort_points(cursor, target.destination);
                        self.apply_line_operator(op, start.y, end.y, action.register, ctx);
                    }
                    RangeKind::Exclusive => {
                        let (start, end) = sort_points(cursor, target.destination);
                        let Some(end) = ctx.buffer.advance_cursor(end, -1) else {
                            return VimOutcome::Consumed;
                        };
                        if end.after(start) || end == start {
                            self.apply_char_operator(op, start, end, action.register, ctx);
                        }
                    }
                    RangeKind::Inclusive => {
                        let (start, end) = sort_points(cursor, target.destination);
                        self.apply_char_operator(op, start, end, action.register, ctx);
                    }
                }
                VimOutcome::Applied
            }

            ActionKind::OperatorLine(op) => {
                self.record_dot(action);
                let start = ctx.cursor.y;
                let end = (start + action.count as i64 - 1).min(ctx.buffer.line_count() - 1);
                self.apply_line_operator(op, start, end, action.register, ctx);
                VimOutcome::Applied
            }

            ActionKind::OperatorObject { op, object } => {
                let Some((start, end)) = resolve_text_object(object, ctx.buffer, *ctx.cursor)
                else {
                    return VimOutcome::Consumed;
                };
                self.record_dot(action);
                self.apply_char_operator(op, start, end, action.register, ctx);
                VimOutcome::Applied
            }

            ActionKind::OperatorVisual(op) => {
                let Some((start, end, kind)) = self.selection(*ctx.cursor) else {
                    return VimOutcome::Consumed;
                };
                match kind {
                    VisualKind::Line => {
                        self.apply_line_operator(op, start.y, end.y, action.register, ctx)
                    }
                    VisualKind::Range => {
                        self.apply_char_operator(op, start, end, action.register, ctx)
                    }
                    VisualKind::Block => {
                        self.apply_block_operator(op, start, end, action.register, ctx)
                    }
                }
                if self.mode != VimMode::Insert {
                    self.leave_visual(ctx);
                } else {
                    self.clear_highlight(ctx);
                }
                VimOutcome::Applied
            }

            ActionKind::DeleteChar => {
                self.record_dot(action);
                let cursor = *ctx.cursor;
                let line_len = ctx.buffer.line(cursor.y).map_or(0, |l| l.len() as i64);
                let length = (action.count as i64).min(line_len - cursor.x);
                if length <= 0 {
                    return VimOutcome::Consumed;
                }
                let end = Point::new(cursor.x + length - 1, cursor.y);
                let Some(text) = ctx.buffer.dupe_string(cursor, end) else {
                    return VimOutcome::Consumed;
                };
                if ctx.buffer.remove_string(cursor, length) {
                    self.store_yank(action.register, text.clone(), YankMode::Normal);
                    ctx.commits
                        .remove_string(cursor, cursor, cursor, text, Chain::Stop);
                    *ctx.cursor = ctx.buffer.clamp_cursor(cursor);
                }
                VimOutcome::Applied
            }

            ActionKind::DeleteCharBackward => {
                self.record_dot(action);
                let cursor = *ctx.cursor;
                let length = (action.count as i64).min(cursor.x);
                if length <= 0 {
                    return VimOutcome::Consumed;
                }
                let start = Point::new(cursor.x - length, cursor.y);
                let end = Point::new(cursor.x - 1, cursor.y);
                let Some(text) = ctx.buffer.dupe_string(start, end) else {
                    return VimOutcome::Consumed;
                };
                if ctx.buffer.remove_string(start, length) {
                    self.store_yank(action.register, text.clone(), YankMode::Normal);
                    ctx.commits
                        .remove_string(start, cursor, start, text, Chain::Stop);
                    *ctx.cursor = ctx.buffer.clamp_cursor(start);
                }
                VimOutcome::Applied
            }

            ActionKind::ReplaceChar(c) => {
                self.record_dot(action);
                let cursor = *ctx.cursor;
                let Some(prev) = ctx.buffer.get_char(cursor) else {
                    return VimOutcome::Consumed;
                };
                if prev == '\n' {
                    return VimOutcome::Consumed;
                }
                if ctx.buffer.set_char(cursor, c) {
                    ctx.commits
                        .change_char(cursor, cursor, cursor, c, prev, Chain::Stop);
                }
                VimOutcome::Applied
            }

            ActionKind::PasteAfter => {
                self.record_dot(action);
                self.paste(action.register, true, ctx);
                VimOutcome::Applied
            }
            ActionKind::PasteBefore => {
                self.record_dot(action);
                self.paste(action.register, false, ctx);
                VimOutcome::Applied
            }

            ActionKind::Undo => {
                if let Some(cursor) = ctx.commits.undo(ctx.buffer) {
                    *ctx.cursor = cursor;
                }
                VimOutcome::Applied
            }
            ActionKind::Redo => {
                if let Some(cursor) = ctx.commits.redo(ctx.buffer) {
                    *ctx.cursor = ctx.buffer.clamp_cursor(cursor);
                }
                VimOutcome::Applied
            }

            ActionKind::EnterInsert(placement) => {
                self.record_dot(action);
                self.enter_insert(placement, ctx);
                VimOutcome::Applied
            }

            ActionKind::EnterVisual(kind) => {
                self.mode = match kind {
                    VisualKind::Range => VimMode::VisualRange,
                    VisualKind::Line => VimMode::VisualLine,
                    VisualKind::Block => VimMode::VisualBlock,
                };
                self.visual_start = *ctx.cursor;
                self.update_highlight(ctx);
                VimOutcome::Applied
            }

            ActionKind::SetMark(register) => {
                ctx.buffer.marks.insert(register, *ctx.cursor);
                ctx.buffer.mark = *ctx.cursor;
                VimOutcome::Applied
            }

            ActionKind::SearchWordForward => self.search_word(Direction::Down, ctx),
            ActionKind::SearchWordBackward => self.search_word(Direction::Up, ctx),

            ActionKind::RepeatLastAction => {
                if self.replaying {
                    return VimOutcome::Consumed;
                }
                let Some(recorded) = self.last_action.clone() else {
                    return VimOutcome::Consumed;
                };
                self.replaying = true;
                let outcome = self.apply(recorded.action, ctx);
                if let Some(text) = recorded.insert_text {
                    // re-stream the captured insert, then settle back to
                    // normal mode as a finished action
                    self.stream_insert_text(&text, ctx);
                    self.finish_insert(ctx);
                }
                self.replaying = false;
                outcome
            }
        }
    }

    fn resolve(&self, motion: Motion, count: u32, ctx: &ApplyContext) -> Option<MotionTarget> {
        let search = self
            .search
            .as_ref()
            .map(|s| (&s.regex, s.direction));
        let motion_ctx = MotionContext {
            buffer: ctx.buffer,
            cursor: *ctx.cursor,
            search,
        };
        resolve_motion(motion, count, &motion_ctx)
    }

    fn move_to_target(&mut self, target: MotionTarget, ctx: &mut ApplyContext) {
        if target.is_jump {
            ctx.jumps.insert(&ctx.buffer.name.clone(), *ctx.cursor);
        }
        *ctx.cursor = ctx.buffer.clamp_cursor(target.destination);
        self.update_highlight(ctx);
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    fn store_yank(&mut self, register: Option<char>, text: String, mode: YankMode) {
        if let Some(register) = register {
            self.yanks.add(register, text.clone(), mode);
        }
        self.yanks.add(UNNAMED_REGISTER, text, mode);
    }

    fn apply_char_operator(
        &mut self,
        op: Operator,
        start: Point,
        end: Point,
        register: Option<char>,
        ctx: &mut ApplyContext,
    ) {
        match op {
            Operator::Yank => {
                if let Some(text) = ctx.buffer.dupe_string(start, end) {
                    self.store_yank(register, text, YankMode::Normal);
                }
                *ctx.cursor = ctx.buffer.clamp_cursor(start);
            }
            Operator::Delete | Operator::Change => {
                let Some(text) = ctx.buffer.dupe_string(start, end) else {
                    return;
                };
                let length = ctx.buffer.compute_length(start, end);
                let undo_cursor = *ctx.cursor;
                if ctx.buffer.remove_string(start, length) {
                    self.store_yank(register, text.clone(), YankMode::Normal);
                    let chain = if op == Operator::Change {
                        Chain::KeepGoing
                    } else {
                        Chain::Stop
                    };
                    ctx.commits
                        .remove_string(start, undo_cursor, start, text, chain);
                    *ctx.cursor = ctx.buffer.clamp_cursor(start);
                }
                if op == Operator::Change {
                    self.begin_insert(ctx.buffer.clamp_insert_cursor(start), ctx);
                }
            }
            Operator::Indent | Operator::Dedent | Operator::AutoIndent => {
                self.apply_line_operator(op, start.y, end.y, register, ctx);
            }
        }
    }

    fn apply_line_operator(
        &mut self,
        op: Operator,
        start_line: i64,
        end_line: i64,
        register: Option<char>,
        ctx: &mut ApplyContext,
    ) {
        let (start_line, end_line) = if start_line > end_line {
            (end_line, start_line)
        } else {
            (start_line, end_line)
        };

        match op {
            Operator::Yank => {
                if let Some(text) = ctx.buffer.dupe_lines(start_line, end_line) {
                    self.store_yank(register, text, YankMode::Line);
                }
            }
            Operator::Delete | Operator::Change => {
                let Some(text) = ctx.buffer.dupe_lines(start_line, end_line) else {
                    return;
                };
                let start = Point::new(0, start_line);
                let undo_cursor = *ctx.cursor;
                if !ctx.buffer.remove_string(start, text.len() as i64) {
                    return;
                }
                self.store_yank(register, text.clone(), YankMode::Line);

                if op == Operator::Change {
                    ctx.commits
                        .remove_string(start, undo_cursor, start, text, Chain::KeepGoing);
                    // change keeps an empty line to type into
                    ctx.buffer.insert_line(start_line, None);
                    ctx.commits.insert_string(
                        start,
                        undo_cursor,
                        start,
                        "\n".to_string(),
                        Chain::KeepGoing,
                    );
                    *ctx.cursor = Point::new(0, start_line);
                    self.begin_insert(*ctx.cursor, ctx);
                } else {
                    ctx.commits
                        .remove_string(start, undo_cursor, start, text, Chain::Stop);
                    let landed = ctx.buffer.clamp_cursor(start);
                    *ctx.cursor = ctx
                        .buffer
                        .soft_beginning_of_line(landed)
                        .map(|p| ctx.buffer.clamp_cursor(p))
                        .unwrap_or(landed);
                }
            }
            Operator::Indent => {
                let undo_cursor = *ctx.cursor;
                let pad = " ".repeat(ctx.tab_width as usize);
                for y in start_line..=end_line.min(ctx.buffer.line_count() - 1) {
                    if ctx.buffer.line(y).is_some_and(|l| l.is_empty()) {
                        continue;
                    }
                    let at = Point::new(0, y);
                    if ctx.buffer.insert_string(at, &pad) {
                        ctx.commits.insert_string(
                            at,
                            undo_cursor,
                            undo_cursor,
                            pad.clone(),
                            Chain::KeepGoing,
                        );
                    }
                }
                ctx.commits.seal();
                *ctx.cursor = ctx.buffer.clamp_cursor(*ctx.cursor);
            }
            Operator::Dedent => {
                let undo_cursor = *ctx.cursor;
                for y in start_line..=end_line.min(ctx.buffer.line_count() - 1) {
                    let Some(line) = ctx.buffer.line(y) else { continue };
                    let mut strip = 0usize;
                    let mut width = 0i64;
                    for b in line.bytes() {
                        if width >= ctx.tab_width {
                            break;
                        }
                        match b {
                            b' ' => width += 1,
                            b'\t' => width += ctx.tab_width,
                            _ => break,
                        }
                        strip += 1;
                    }
                    if strip == 0 {
                        continue;
                    }
                    let removed = line[..strip].to_string();
                    let at = Point::new(0, y);
                    if ctx.buffer.remove_string(at, strip as i64) {
                        ctx.commits.remove_string(
                            at,
                            undo_cursor,
                            undo_cursor,
                            removed,
                            Chain::KeepGoing,
                        );
                    }
                }
                ctx.commits.seal();
                *ctx.cursor = ctx.buffer.clamp_cursor(*ctx.cursor);
            }
            Operator::AutoIndent => {
                let undo_cursor = *ctx.cursor;
                for y in start_line..=end_line.min(ctx.buffer.line_count() - 1) {
                    let Some(line) = ctx.buffer.line(y) else { continue };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let current: usize = line
                        .bytes()
                        .take_while(|&b| b == b' ' || b == b'\t')
                        .count();
                    let target = ctx.buffer.indentation_for_line(Point::new(0, y), ctx.tab_width);
                    let prev = line[..current].to_string();
                    let replacement = " ".repeat(target.max(0) as usize);
                    if prev == replacement {
                        continue;
                    }
                    let at = Point::new(0, y);
                    if !ctx.buffer.remove_string(at, current as i64) {
                        continue;
                    }
                    let inserted = if replacement.is_empty() {
                        true
                    } else {
                        ctx.buffer.insert_string(at, &replacement)
                    };
                    if inserted {
                        ctx.commits.change_string(
                            at,
                            undo_cursor,
                            undo_cursor,
                            replacement,
                            prev,
                            Chain::KeepGoing,
                        );
                    }
                }
                ctx.commits.seal();
                *ctx.cursor = ctx.buffer.clamp_cursor(*ctx.cursor);
            }
        }
    }

    fn apply_block_operator(
        &mut self,
        op: Operator,
        start: Point,
        end: Point,
        register: Option<char>,
        ctx: &mut ApplyContext,
    ) {
        let left = start.x.min(end.x);
        let right = start.x.max(end.x);
        let undo_cursor = *ctx.cursor;
        let mut collected = String::new();

        for y in start.y..=end.y {
            let Some(line) = ctx.buffer.line(y) else { continue };
            let line_len = line.len() as i64;
            if left >= line_len {
                collected.push('\n');
                continue;
            }
            let span_end = right.min(line_len - 1);
            let row_start = Point::new(left, y);
            let row_end = Point::new(span_end, y);
            let Some(text) = ctx.buffer.dupe_string(row_start, row_end) else {
                continue;
            };
            collected.push_str(&text);
            collected.push('\n');

            if matches!(op, Operator::Delete | Operator::Change) {
                let length = (span_end - left) + 1;
                if ctx.buffer.remove_string(row_start, length) {
                    ctx.commits.remove_string(
                        row_start,
                        undo_cursor,
                        row_start,
                        text,
                        Chain::KeepGoing,
                    );
                }
            }
        }

        self.store_yank(register, collected, YankMode::Normal);
        ctx.commits.seal();
        *ctx.cursor = ctx.buffer.clamp_cursor(Point::new(left, start.y));

        if op == Operator::Change {
            self.begin_insert(*ctx.cursor, ctx);
        }
    }

    fn paste(&mut self, register: Option<char>, after: bool, ctx: &mut ApplyContext) {
        let register = register.unwrap_or(UNNAMED_REGISTER);
        let Some(yank) = self.yanks.get(register) else {
            return;
        };
        let text = yank.text.clone();
        let mode = yank.mode;
        let cursor = *ctx.cursor;

        match mode {
            YankMode::Line => {
                let line = if after { cursor.y + 1 } else { cursor.y };
                let at = Point::new(0, line);
                if ctx.buffer.insert_string(at, &text) {
                    ctx.commits
                        .insert_string(at, cursor, at, text, Chain::Stop);
                    let landed = ctx.buffer.clamp_cursor(at);
                    *ctx.cursor = ctx
                        .buffer
                        .soft_beginning_of_line(landed)
                        .map(|p| ctx.buffer.clamp_cursor(p))
                        .unwrap_or(landed);
                }
            }
            YankMode::Normal => {
                let line_len = ctx.buffer.line(cursor.y).map_or(0, |l| l.len() as i64);
                let x = if after {
                    (cursor.x + 1).min(line_len)
                } else {
                    cursor.x
                };
                let at = Point::new(x, cursor.y);
                if ctx.buffer.insert_string(at, &text) {
                    ctx.commits
                        .insert_string(at, cursor, at, text.clone(), Chain::Stop);
                    let landing = ctx
                        .buffer
                        .advance_cursor(at, text.len() as i64 - 1)
                        .unwrap_or(at);
                    *ctx.cursor = ctx.buffer.clamp_cursor(landing);
                }
            }
        }
    }

    fn search_word(&mut self, direction: Direction, ctx: &mut ApplyContext) -> VimOutcome {
        let cursor = *ctx.cursor;
        let Some((start, end)) = ctx.buffer.word_at_location(cursor) else {
            return VimOutcome::Consumed;
        };
        let Some(line) = ctx.buffer.line(start.y) else {
            return VimOutcome::Consumed;
        };
        let word = &line[start.x as usize..=end.x as usize];
        let pattern = format!(r"\b{}\b", regex::escape(word));
        let Ok(compiled) = Regex::new(&pattern) else {
            return VimOutcome::Consumed;
        };

        self.yanks
            .add(SEARCH_REGISTER, pattern.clone(), YankMode::Normal);
        self.search = Some(SearchState {
            regex: compiled,
            pattern,
            direction,
        });

        if let Some(target) = self.resolve(Motion::SearchNext, 1, ctx) {
            self.move_to_target(target, ctx);
        }
        VimOutcome::Applied
    }

    // ------------------------------------------------------------------
    // Insert mode
    // ------------------------------------------------------------------

    fn enter_insert(&mut self, placement: InsertPlacement, ctx: &mut ApplyContext) {
        let cursor = *ctx.cursor;
        let at = match placement {
            InsertPlacement::Here => cursor,
            InsertPlacement::After => {
                let line_len = ctx.buffer.line(cursor.y).map_or(0, |l| l.len() as i64);
                Point::new((cursor.x + 1).min(line_len), cursor.y)
            }
            InsertPlacement::SoftLineBeginning => ctx
                .buffer
                .soft_beginning_of_line(cursor)
                .unwrap_or(cursor),
            InsertPlacement::LineEnd => {
                let line_len = ctx.buffer.line(cursor.y).map_or(0, |l| l.len() as i64);
                Point::new(line_len, cursor.y)
            }
            InsertPlacement::LineBelow => {
                let indent = ctx
                    .buffer
                    .indentation_for_line(Point::new(i64::MAX, cursor.y), ctx.tab_width);
                let line_len = ctx.buffer.line(cursor.y).map_or(0, |l| l.len() as i64);
                let eol = Point::new(line_len, cursor.y);
                self.insert_with_commit(eol, '\n', ctx);
                let mut at = Point::new(0, cursor.y + 1);
                for _ in 0..indent {
                    self.insert_with_commit(at, ' ', ctx);
                    at.x += 1;
                }
                at
            }
            InsertPlacement::LineAbove => {
                let bol = Point::new(0, cursor.y);
                self.insert_with_commit(bol, '\n', ctx);
                Point::new(0, cursor.y)
            }
        };

        if ctx.buffer.lines.is_empty() {
            ctx.buffer.alloc_lines(1);
        }

        self.begin_insert(at, ctx);
    }

    fn begin_insert(&mut self, at: Point, ctx: &mut ApplyContext) {
        self.mode = VimMode::Insert;
        self.insert_anchor = at;
        self.insert_text.clear();
        self.capture_insert = true;
        *ctx.cursor = at;
    }

    /// Insert one character, committing with the KeepGoing chain so the
    /// whole session undoes atomically
    fn insert_with_commit(&mut self, at: Point, c: char, ctx: &mut ApplyContext) -> bool {
        if !ctx.buffer.insert_char(at, c) {
            return false;
        }
        let redo = if c == '\n' {
            Point::new(0, at.y + 1)
        } else {
            Point::new(at.x + 1, at.y)
        };
        ctx.commits.insert_char(at, at, redo, c, Chain::KeepGoing);
        true
    }

    fn handle_insert_key(&mut self, key: Key, ctx: &mut ApplyContext) -> VimOutcome {
        match key {
            Key::Escape => {
                self.finish_insert(ctx);
                VimOutcome::Applied
            }

            Key::Char(c) => {
                let at = *ctx.cursor;
                if self.insert_with_commit(at, c, ctx) {
                    *ctx.cursor = Point::new(at.x + 1, at.y);
                    self.insert_text.push(c);
                }
                VimOutcome::Applied
            }

            Key::Tab => {
                let at = *ctx.cursor;
                if self.insert_with_commit(at, '\t', ctx) {
                    *ctx.cursor = Point::new(at.x + 1, at.y);
                    self.insert_text.push('\t');
                }
                VimOutcome::Applied
            }

            Key::Enter => {
                let at = *ctx.cursor;
                let indent = ctx.buffer.indentation_for_line(at, ctx.tab_width);
                if self.insert_with_commit(at, '\n', ctx) {
                    let mut cursor = Point::new(0, at.y + 1);
                    for _ in 0..indent {
                        if self.insert_with_commit(cursor, ' ', ctx) {
                            cursor.x += 1;
                        }
                    }
                    *ctx.cursor = cursor;
                    self.insert_text.push('\n');
                }
                VimOutcome::Applied
            }

            Key::Backspace => {
                let cursor = *ctx.cursor;
                let Some(target) = ctx.buffer.advance_cursor(cursor, -1) else {
                    return VimOutcome::Consumed;
                };
                if target == cursor {
                    return VimOutcome::Consumed;
                }
                let Some(removed) = ctx.buffer.get_char(target) else {
                    return VimOutcome::Consumed;
                };
                if ctx.buffer.remove_char(target) {
                    ctx.commits
                        .remove_char(target, cursor, target, removed, Chain::KeepGoing);
                    *ctx.cursor = target;
                    self.insert_text.pop();
                }
                VimOutcome::Applied
            }

            Key::Delete => {
                let cursor = *ctx.cursor;
                let Some(removed) = ctx.buffer.get_char(cursor) else {
                    return VimOutcome::Consumed;
                };
                if ctx.buffer.remove_char(cursor) {
                    ctx.commits
                        .remove_char(cursor, cursor, cursor, removed, Chain::KeepGoing);
                }
                VimOutcome::Applied
            }

            Key::ArrowLeft => {
                *ctx.cursor = ctx.buffer.move_cursor(*ctx.cursor, Point::new(-1, 0));
                VimOutcome::Applied
            }
            Key::ArrowRight => {
                *ctx.cursor = ctx.buffer.move_cursor(*ctx.cursor, Point::new(1, 0));
                VimOutcome::Applied
            }
            Key::ArrowUp => {
                *ctx.cursor = ctx.buffer.move_cursor(*ctx.cursor, Point::new(0, -1));
                VimOutcome::Applied
            }
            Key::ArrowDown => {
                *ctx.cursor = ctx.buffer.move_cursor(*ctx.cursor, Point::new(0, 1));
                VimOutcome::Applied
            }

            _ => VimOutcome::Ignored,
        }
    }

    /// Leave insert mode: seal the commit group, clamp the cursor, and
    /// capture the typed text for dot repeat
    pub fn finish_insert(&mut self, ctx: &mut ApplyContext) {
        self.mode = VimMode::Normal;
        ctx.commits.seal();
        *ctx.cursor = ctx
            .buffer
            .clamp_cursor(Point::new(ctx.cursor.x - 1, ctx.cursor.y));

        if self.capture_insert {
            self.capture_insert = false;
            let text = std::mem::take(&mut self.insert_text);
            if let Some(recorded) = self.last_action.as_mut() {
                recorded.insert_text = Some(text);
            }
        }
    }

    fn stream_insert_text(&mut self, text: &str, ctx: &mut ApplyContext) {
        for c in text.chars() {
            let key = if c == '\n' { Key::Enter } else { Key::Char(c) };
            self.handle_insert_key(key, ctx);
        }
    }

    // ------------------------------------------------------------------
    // Visual helpers / dot repeat
    // ------------------------------------------------------------------

    fn leave_visual(&mut self, ctx: &mut ApplyContext) {
        self.mode = VimMode::Normal;
        self.clear_highlight(ctx);
    }

    fn clear_highlight(&mut self, ctx: &mut ApplyContext) {
        ctx.buffer.highlight_start = Point::new(-1, 0);
        ctx.buffer.highlight_end = Point::new(-1, 0);
    }

    /// Refresh the buffer's selection extent from the visual anchor
    pub fn update_highlight(&mut self, ctx: &mut ApplyContext) {
        let Some((start, end, kind)) = self.selection(*ctx.cursor) else {
            return;
        };
        match kind {
            VisualKind::Line => {
                ctx.buffer.highlight_start = Point::new(0, start.y);
                let end_len = ctx.buffer.line(end.y).map_or(0, |l| l.len() as i64);
                ctx.buffer.highlight_end = Point::new(end_len, end.y);
            }
            _ => {
                ctx.buffer.highlight_start = start;
                ctx.buffer.highlight_end = end;
            }
        }
    }

    fn record_dot(&mut self, action: VimAction) {
        if self.replaying {
            return;
        }
        self.last_action = Some(RecordedAction {
            action,
            insert_text: None,
        });
    }
}

impl Buffer {
    /// Insert-mode cursors may sit on the line terminator
    fn clamp_insert_cursor(&self, cursor: Point) -> Point {
        if self.lines.is_empty() {
            return Point::new(0, 0);
        }
        let y = cursor.y.clamp(0, self.line_count() - 1);
        let x = cursor.x.clamp(0, self.line(y).map_or(0, |l| l.len() as i64));
        Point::new(x, y)
    }
}

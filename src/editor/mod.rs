//! Editor composition root
//!
//! Owns the buffer list (messages buffer at its head), the tabs and
//! their view trees, the modal interpreter, prompts and their
//! histories, live terminals, and the main loop: block on input, decode
//! keys, pump terminal wakeups, and redraw under a rate limit.

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::Result;
use regex::Regex;

use crate::buffer::{Buffer, BufferHandle, BufferStatus, FileType, LoadFileResult};
use crate::command::Command;
use crate::commit::CommitLog;
use crate::input_history::InputHistory;
use crate::key::Key;
use crate::point::{Direction, Point};
use crate::registers::{YankMode, SEARCH_REGISTER};
use crate::render::{self, HighlightLineType, LineNumberType, RenderContext, RenderSettings};
use crate::screen::{CellStyle, CrosstermBackend, Screen};
use crate::syntax::{HighlightKind, StyleId};
use crate::tab::Tab;
use crate::terminal::{find_destination, Terminal, TerminalEvent};
use crate::vim::{ApplyContext, EditorRequest, SearchState, VimMode, VimOutcome, VimState};
use crate::view::{self, ViewId};

mod session;

const MESSAGES_BUFFER: &str = "messages";
/// Redraws are coalesced to at most one per this interval
const DRAW_INTERVAL: Duration = Duration::from_micros(16_666);
const INPUT_POLL: Duration = Duration::from_millis(50);
const MACRO_DEPTH_MAX: u32 = 8;

/// Parsed command-line invocation
#[derive(Debug, Default)]
pub struct Options {
    pub config: Option<String>,
    pub save_messages_on_exit: bool,
    pub show_help: bool,
    pub files: Vec<String>,
}

impl Options {
    pub fn parse(args: impl Iterator<Item = String>) -> Options {
        let mut options = Options::default();
        let mut args = args.peekable();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" => options.config = args.next(),
                "-s" => options.save_messages_on_exit = true,
                "-h" => options.show_help = true,
                _ => options.files.push(arg),
            }
        }
        options
    }

    pub fn usage() -> &'static str {
        "usage: sable [-c config] [-s] [-h] <files...>\n\
         \x20 -c <config>  record a config path for the session\n\
         \x20 -s           save the messages buffer on exit\n\
         \x20 -h           print this help"
    }
}

/// A buffer plus the editing state the buffer itself doesn't carry
struct EditorBuffer {
    buffer: BufferHandle,
    commits: CommitLog,
}

struct TerminalEntry {
    terminal: Terminal,
    events: Receiver<TerminalEvent>,
    /// Line of the last destination jump, for Ctrl-N/P traversal
    last_jump_line: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Command,
    SearchForward,
    SearchBackward,
    LoadFile,
    SwitchBuffer,
}

struct PromptState {
    kind: PromptKind,
    text: String,
    saved_cursor: Point,
    saved_top_row: i64,
}

/// Lock a buffer handle, recovering from poisoning
fn locked(handle: &BufferHandle) -> MutexGuard<'_, Buffer> {
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Editor {
    backend: CrosstermBackend,
    screen: Screen,
    buffers: Vec<EditorBuffer>,
    tabs: Vec<Tab>,
    tab_current: usize,
    next_view_id: ViewId,
    vim: VimState,
    terminals: Vec<TerminalEntry>,
    terminal_current: Option<usize>,
    prompt: Option<PromptState>,
    search_history: InputHistory,
    command_history: InputHistory,
    line_number_type: LineNumberType,
    highlight_line_type: HighlightLineType,
    highlight_search: Option<Regex>,
    buffer_listing: Option<BufferHandle>,
    tab_width: i64,
    macro_backslashes: bool,
    macro_depth: u32,
    save_messages_on_exit: bool,
    config_path: Option<String>,
    last_draw: Instant,
    dirty: bool,
    quit: bool,
}

impl Editor {
    pub fn new(backend: CrosstermBackend, options: Options) -> Result<Self> {
        let (width, height) = backend.size()?;

        let mut messages = Buffer::new(MESSAGES_BUFFER);
        messages.alloc_lines(1);
        messages.status = BufferStatus::ReadOnly;
        messages.no_line_numbers = true;
        let messages = messages.into_handle();

        let mut editor = Editor {
            backend,
            screen: Screen::new(width, height),
            buffers: vec![EditorBuffer {
                buffer: Arc::clone(&messages),
                commits: CommitLog::new(),
            }],
            tabs: Vec::new(),
            tab_current: 0,
            next_view_id: 1,
            vim: VimState::new(),
            terminals: Vec::new(),
            terminal_current: None,
            prompt: None,
            search_history: InputHistory::new(),
            command_history: InputHistory::new(),
            line_number_type: LineNumberType::Absolute,
            highlight_line_type: HighlightLineType::None,
            highlight_search: None,
            buffer_listing: None,
            tab_width: 4,
            macro_backslashes: false,
            macro_depth: 0,
            save_messages_on_exit: options.save_messages_on_exit,
            config_path: options.config.clone(),
            last_draw: Instant::now() - DRAW_INTERVAL,
            dirty: true,
            quit: false,
        };

        let config = editor.config_path.clone();
        if let Some(config) = config {
            editor.message(&format!("config recorded: '{}'", config));
        }

        let mut first: Option<BufferHandle> = None;
        for file in &options.files {
            if let Some(handle) = editor.open_file(file) {
                first.get_or_insert(handle);
            }
        }

        let focused = first.unwrap_or(messages);
        let view_id = editor.allocate_view_id();
        editor.tabs.push(Tab::new(view_id, focused));

        editor.load_session();
        editor.recalculate_views();

        Ok(editor)
    }

    /// Main loop: draw when dirty, block briefly on input, pump terminal
    /// events
    pub fn run(&mut self) -> Result<()> {
        while !self.quit {
            if self.dirty && self.last_draw.elapsed() >= DRAW_INTERVAL {
                self.draw()?;
                self.dirty = false;
                self.last_draw = Instant::now();
            }

            if let Some(key) = self.backend.read_key(INPUT_POLL)? {
                self.handle_key(key);
            }

            self.pump_terminal_events();
        }

        self.save_session();
        if self.save_messages_on_exit {
            let messages = Arc::clone(&self.buffers[0].buffer);
            locked(&messages).save(MESSAGES_BUFFER);
        }
        for entry in &mut self.terminals {
            entry.terminal.shutdown();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Buffer list
    // ------------------------------------------------------------------

    fn message(&mut self, text: &str) {
        let messages = Arc::clone(&self.buffers[0].buffer);
        let mut buffer = locked(&messages);
        let line = buffer.line_count().max(1) - 1;
        if buffer.line(line).is_some_and(|l| !l.is_empty()) {
            buffer.append_line_readonly(text);
        } else {
            buffer.append_string_readonly(line, text);
        }
        drop(buffer);
        self.dirty = true;
    }

    fn find_buffer_by_name(&self, name: &str) -> Option<BufferHandle> {
        self.buffers
            .iter()
            .map(|entry| &entry.buffer)
            .find(|handle| locked(handle).name == name)
            .map(Arc::clone)
    }

    /// Open (or re-focus) a file buffer; missing files become new-file
    /// buffers
    fn open_file(&mut self, path: &str) -> Option<BufferHandle> {
        if let Some(existing) = self.find_buffer_by_name(path) {
            return Some(existing);
        }

        let mut buffer = Buffer::new(path);
        match buffer.load_file(path) {
            LoadFileResult::Loaded => {}
            LoadFileResult::Missing => {
                buffer.alloc_lines(1);
                buffer.status = BufferStatus::NewFile;
                buffer.file_type = FileType::from_path(path);
                self.message(&format!("'{}' is a new file", path));
            }
            LoadFileResult::Directory => {
                self.message(&format!("'{}' is a directory", path));
                return None;
            }
        }

        let handle = buffer.into_handle();
        self.buffers.push(EditorBuffer {
            buffer: Arc::clone(&handle),
            commits: CommitLog::new(),
        });
        Some(handle)
    }

    fn switch_to_buffer(&mut self, handle: BufferHandle) {
        let cursor = locked(&handle).cursor;
        if let Some(view) = self.current_view_mut() {
            view.buffer = Arc::clone(&handle);
            view.cursor = cursor;
            view.top_row = 0;
            view.left_column = 0;
        }
        self.dirty = true;
    }

    // ------------------------------------------------------------------
    // Views and tabs
    // ------------------------------------------------------------------

    fn allocate_view_id(&mut self) -> ViewId {
        let id = self.next_view_id;
        self.next_view_id += 1;
        id
    }

    fn current_tab(&self) -> &Tab {
        &self.tabs[self.tab_current]
    }

    fn current_tab_mut(&mut self) -> &mut Tab {
        &mut self.tabs[self.tab_current]
    }

    fn current_view_mut(&mut self) -> Option<&mut crate::view::View> {
        let tab = &mut self.tabs[self.tab_current];
        tab.view_head
            .as_mut()
            .and_then(|head| head.find_mut(tab.view_current))
    }

    fn current_view(&self) -> Option<&crate::view::View> {
        let tab = self.current_tab();
        tab.view_head
            .as_ref()
            .and_then(|head| head.find(tab.view_current))
    }

    fn current_buffer_handle(&self) -> Option<BufferHandle> {
        self.current_view().map(|view| Arc::clone(&view.buffer))
    }

    fn view_area(&self) -> (Point, Point) {
        let top = if self.tabs.len() > 1 { 1 } else { 0 };
        (
            Point::new(0, top),
            Point::new(self.screen.width() - 1, self.screen.height() - 1),
        )
    }

    fn recalculate_views(&mut self) {
        let (top_left, bottom_right) = self.view_area();
        if let Some(head) = self.tabs[self.tab_current].view_head.as_mut() {
            view::calc_views(head, top_left, bottom_right);
        }
        self.resize_terminals();
        self.dirty = true;
    }

    /// Keep each live terminal sized to a view that shows it
    fn resize_terminals(&mut self) {
        for entry in &self.terminals {
            let Some(head) = self.tabs[self.tab_current].view_head.as_ref() else {
                continue;
            };
            if let Some(view) = head.find_buffer(&entry.terminal.buffer) {
                let width = (view.width()).max(1);
                let height = (view.height()).max(1);
                entry.terminal.resize(width, height);
            }
        }
    }

    fn split(&mut self, horizontal: bool) {
        let Some(buffer) = self.current_buffer_handle() else {
            return;
        };
        let new_id = self.allocate_view_id();
        let tab = &mut self.tabs[self.tab_current];
        let current = tab.view_current;
        if let Some(head) = tab.view_head.as_mut() {
            view::split_view(head, current, buffer, horizontal, new_id);
        }
        self.recalculate_views();
    }

    fn close_view(&mut self) {
        let removed = {
            let tab = &mut self.tabs[self.tab_current];
            let current = tab.view_current;
            view::remove_view(&mut tab.view_head, current)
        };
        if !removed {
            return;
        }

        let head_id = self.tabs[self.tab_current].view_head.as_ref().map(|h| h.id);
        match head_id {
            Some(fallback) => {
                let tab = &mut self.tabs[self.tab_current];
                let previous = tab.view_previous.filter(|id| {
                    tab.view_head
                        .as_ref()
                        .is_some_and(|head| head.find(*id).is_some())
                });
                tab.view_current = previous.unwrap_or(fallback);
                tab.view_previous = None;
                self.recalculate_views();
            }
            None => {
                self.tabs.remove(self.tab_current);
                if self.tabs.is_empty() {
                    self.quit = true;
                    return;
                }
                if self.tab_current >= self.tabs.len() {
                    self.tab_current = self.tabs.len() - 1;
                }
                self.recalculate_views();
            }
        }
    }

    fn new_tab(&mut self) {
        let Some(buffer) = self.current_buffer_handle() else {
            return;
        };
        let view_id = self.allocate_view_id();
        self.tabs.push(Tab::new(view_id, buffer));
        self.tab_current = self.tabs.len() - 1;
        self.recalculate_views();
    }

    fn next_tab(&mut self) {
        self.tab_current = (self.tab_current + 1) % self.tabs.len();
        self.recalculate_views();
    }

    fn previous_tab(&mut self) {
        self.tab_current = (self.tab_current + self.tabs.len() - 1) % self.tabs.len();
        self.recalculate_views();
    }

    /// Move focus to the adjacent view in a screen direction
    fn focus_adjacent_view(&mut self, dx: i64, dy: i64) {
        let Some(view) = self.current_view() else {
            return;
        };
        let mid_x = (view.top_left.x + view.bottom_right.x) / 2;
        let mid_y = (view.top_left.y + view.bottom_right.y) / 2;
        let probe = Point::new(
            if dx < 0 {
                view.top_left.x - 2
            } else if dx > 0 {
                view.bottom_right.x + 2
            } else {
                mid_x
            },
            if dy < 0 {
                view.top_left.y - 2
            } else if dy > 0 {
                view.bottom_right.y + 2
            } else {
                mid_y
            },
        );

        let target = self
            .current_tab()
            .view_head
            .as_ref()
            .and_then(|head| head.find_at_point(probe))
            .map(|found| found.id);
        if let Some(id) = target {
            self.current_tab_mut().focus(id);
            self.dirty = true;
        }
    }

    fn center_current_view(&mut self) {
        if let Some(view) = self.current_view_mut() {
            let height = view.height();
            view.top_row = (view.cursor.y - height / 2).max(0);
        }
        self.dirty = true;
    }

    /// Move the cursor a whole view height up or down
    fn page_current_view(&mut self, direction: i64) {
        if let Some(view) = self.current_view_mut() {
            let height = view.height();
            let handle = Arc::clone(&view.buffer);
            view.cursor = locked(&handle)
                .move_cursor(view.cursor, Point::new(0, direction * height));
        }
        self.dirty = true;
    }

    // ------------------------------------------------------------------
    // Key dispatch
    // ------------------------------------------------------------------

    fn handle_key(&mut self, key: Key) {
        if let Key::Resize(cols, rows) = key {
            self.screen.resize(cols as i64, rows as i64);
            self.recalculate_views();
            return;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        // a live terminal view in insert mode streams keys to the shell
        if self.vim.mode == VimMode::Insert {
            if let Some(index) = self.current_terminal_view() {
                if key == Key::Escape {
                    self.vim.mode = VimMode::Normal;
                } else {
                    self.terminals[index].terminal.send_key(key);
                }
                self.dirty = true;
                return;
            }
        }

        if self.vim.is_idle() && self.handle_global_key(key) {
            return;
        }

        self.vim_dispatch(key);
    }

    /// Keys the editor claims while the interpreter is idle
    fn handle_global_key(&mut self, key: Key) -> bool {
        match key {
            Key::Ctrl(b's') => self.split(true),
            Key::Ctrl(b'v') => self.split(false),
            Key::Ctrl(b'q') => self.close_view(),
            Key::Ctrl(b't') => self.new_tab(),
            Key::Ctrl(b'h') => self.focus_adjacent_view(-1, 0),
            Key::Ctrl(b'l') => self.focus_adjacent_view(1, 0),
            Key::Ctrl(b'k') => self.focus_adjacent_view(0, -1),
            Key::Ctrl(b'j') => self.focus_adjacent_view(0, 1),
            Key::Ctrl(b'a') => self.open_terminal(),
            Key::Ctrl(b'x') => self.focus_terminal(),
            Key::Ctrl(b'n') => self.destination_jump(true),
            Key::Ctrl(b'p') => self.destination_jump(false),
            Key::Ctrl(b'f') => self.open_prompt(PromptKind::LoadFile),
            Key::Ctrl(b'b') => self.open_prompt(PromptKind::SwitchBuffer),
            Key::Ctrl(b'o') => self.jump_list_step(false),
            Key::Ctrl(b'i') => self.jump_list_step(true),
            Key::Char(':') => self.open_prompt(PromptKind::Command),
            Key::Char('/') => self.open_prompt(PromptKind::SearchForward),
            Key::Char('?') => self.open_prompt(PromptKind::SearchBackward),
            Key::F(5) => {
                let config = self.config_path.clone().unwrap_or_default();
                self.message(&format!("reloaded configuration '{}'", config));
            }
            Key::PageDown => self.page_current_view(1),
            Key::PageUp => self.page_current_view(-1),
            Key::Enter => {
                if !self.try_listing_selection() && !self.try_terminal_enter() {
                    return false;
                }
            }
            _ => return false,
        }
        true
    }

    fn vim_dispatch(&mut self, key: Key) {
        // searches center the view afterwards
        let centers = self.vim.is_idle()
            && matches!(
                key,
                Key::Char('n') | Key::Char('N') | Key::Char('*') | Key::Char('#')
            );

        let outcome = {
            let tab = &mut self.tabs[self.tab_current];
            let Some(view) = tab
                .view_head
                .as_mut()
                .and_then(|head| head.find_mut(tab.view_current))
            else {
                return;
            };
            let handle = Arc::clone(&view.buffer);
            let Some(entry) = self
                .buffers
                .iter_mut()
                .find(|entry| Arc::ptr_eq(&entry.buffer, &handle))
            else {
                return;
            };

            let mut guard = locked(&handle);
            let mut ctx = ApplyContext {
                buffer: &mut guard,
                commits: &mut entry.commits,
                cursor: &mut view.cursor,
                jumps: &mut view.jumps,
                tab_width: self.tab_width,
            };
            let outcome = self.vim.handle_key(key, &mut ctx);
            guard.cursor = view.cursor;
            outcome
        };

        match outcome {
            VimOutcome::Request(EditorRequest::TabNext) => self.next_tab(),
            VimOutcome::Request(EditorRequest::TabPrevious) => self.previous_tab(),
            VimOutcome::Request(EditorRequest::PlayMacro(register)) => self.play_macro(register),
            VimOutcome::Applied | VimOutcome::Consumed => {}
            VimOutcome::Ignored => return,
        }

        if centers {
            self.center_current_view();
        }
        self.dirty = true;
    }

    fn play_macro(&mut self, register: char) {
        if self.macro_depth >= MACRO_DEPTH_MAX {
            self.message("macro replay too deep");
            return;
        }
        let Some(keys) = self.vim.macros.get(register).map(|k| k.to_vec()) else {
            self.message(&format!("no macro in register '{}'", register));
            return;
        };

        self.macro_depth += 1;
        for key in keys {
            if self.macro_backslashes {
                if let Key::Char('\\') = key {
                    self.handle_key(key);
                }
            }
            self.handle_key(key);
        }
        self.macro_depth -= 1;
    }

    // ------------------------------------------------------------------
    // Terminals
    // ------------------------------------------------------------------

    fn current_terminal_view(&self) -> Option<usize> {
        let view = self.current_view()?;
        self.terminals
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.terminal.buffer, &view.buffer))
    }

    fn open_terminal(&mut self) {
        let (width, height) = match self.current_view() {
            Some(view) => (view.width().max(1), view.height().max(1)),
            None => (80, 24),
        };

        let name = format!("[terminal {}]", self.terminals.len() + 1);
        let buffer = Buffer::new(&name).into_handle();
        match Terminal::spawn(width, height, Arc::clone(&buffer)) {
            Ok((terminal, events)) => {
                self.buffers.push(EditorBuffer {
                    buffer: Arc::clone(&buffer),
                    commits: CommitLog::new(),
                });
                self.terminals.push(TerminalEntry {
                    terminal,
                    events,
                    last_jump_line: 0,
                });
                self.terminal_current = Some(self.terminals.len() - 1);
                self.switch_to_buffer(buffer);
                self.vim.mode = VimMode::Insert;
            }
            Err(error) => self.message(&format!("terminal spawn failed: {}", error)),
        }
    }

    fn focus_terminal(&mut self) {
        let Some(index) = self.terminal_current.or_else(|| {
            if self.terminals.is_empty() {
                None
            } else {
                Some(self.terminals.len() - 1)
            }
        }) else {
            self.message("no terminal to focus");
            return;
        };

        self.terminal_current = Some(index);
        let buffer = Arc::clone(&self.terminals[index].terminal.buffer);

        // prefer a view already showing it
        let existing = self
            .current_tab()
            .view_head
            .as_ref()
            .and_then(|head| head.find_buffer(&buffer))
            .map(|view| view.id);
        match existing {
            Some(id) => self.current_tab_mut().focus(id),
            None => self.switch_to_buffer(buffer),
        }
        self.vim.mode = VimMode::Insert;
        self.dirty = true;
    }

    fn pump_terminal_events(&mut self) {
        let mut exited = false;
        for entry in &self.terminals {
            while let Ok(event) = entry.events.try_recv() {
                self.dirty = true;
                if event == TerminalEvent::ChildExit {
                    exited = true;
                }
            }
        }
        if exited {
            self.message("terminal shell exited");
        }
    }

    /// Enter on a terminal buffer jumps to the destination under the
    /// cursor
    fn try_terminal_enter(&mut self) -> bool {
        let Some(index) = self.current_terminal_view() else {
            return false;
        };
        let line = self.current_view().map_or(0, |view| view.cursor.y);
        self.jump_to_destination(index, line)
    }

    fn destination_jump(&mut self, forwards: bool) {
        let Some(index) = self.terminal_current.or_else(|| {
            if self.terminals.is_empty() {
                None
            } else {
                Some(self.terminals.len() - 1)
            }
        }) else {
            return;
        };

        let line_count = locked(&self.terminals[index].terminal.buffer).line_count();
        if line_count == 0 {
            return;
        }

        let delta: i64 = if forwards { 1 } else { -1 };
        let mut line = self.terminals[index].last_jump_line + delta;
        for _ in 0..line_count {
            if line >= line_count && forwards {
                line = 0;
            } else if line <= 0 && !forwards {
                line = line_count - 1;
            }

            if self.jump_to_destination(index, line) {
                return;
            }
            line += delta;
        }
    }

    fn jump_to_destination(&mut self, terminal_index: usize, line: i64) -> bool {
        let cwd = self.terminals[terminal_index]
            .terminal
            .current_directory()
            .unwrap_or_else(|| PathBuf::from("."));

        let destination = {
            let buffer = locked(&self.terminals[terminal_index].terminal.buffer);
            find_destination(&buffer, line, &cwd)
        };
        let Some(destination) = destination else {
            return false;
        };

        let path = destination.path.to_string_lossy().to_string();
        let Some(handle) = self.open_file(&path) else {
            return false;
        };

        // record where we came from
        if let Some(view) = self.current_view_mut() {
            let name = locked(&view.buffer).name.clone();
            let cursor = view.cursor;
            view.jumps.insert(&name, cursor);
        }

        self.switch_to_buffer(Arc::clone(&handle));
        {
            let buffer = locked(&handle);
            let view_id = self.tabs[self.tab_current].view_current;
            if let Some(view) = self.tabs[self.tab_current]
                .view_head
                .as_mut()
                .and_then(|head| head.find_mut(view_id))
            {
                let target = Point::new(0, destination.line - 1);
                view.cursor = buffer.clamp_cursor(target);
                view.cursor = match destination.column {
                    Some(column) => {
                        buffer.clamp_cursor(Point::new(column - 1, destination.line - 1))
                    }
                    None => buffer
                        .soft_beginning_of_line(view.cursor)
                        .map(|p| buffer.clamp_cursor(p))
                        .unwrap_or(view.cursor),
                };
            }
        }
        self.center_current_view();

        // leave the terminal's own cursor on the jumped-from line
        {
            let terminal_buffer = Arc::clone(&self.terminals[terminal_index].terminal.buffer);
            locked(&terminal_buffer).cursor = Point::new(0, line);
        }
        self.terminals[terminal_index].last_jump_line = line;
        self.terminal_current = Some(terminal_index);
        self.dirty = true;
        true
    }

    // ------------------------------------------------------------------
    // Jump list
    // ------------------------------------------------------------------

    fn jump_list_step(&mut self, forwards: bool) {
        let jump = {
            let Some(view) = self.current_view_mut() else {
                return;
            };

            // record the current position the first time we walk back
            let jump = if forwards {
                view.jumps.to_next()
            } else {
                view.jumps.to_previous()
            };
            jump.cloned()
        };

        let Some(jump) = jump else {
            return;
        };

        let Some(handle) = self.open_file(&jump.filepath) else {
            return;
        };
        self.switch_to_buffer(Arc::clone(&handle));
        if let Some(view) = self.current_view_mut() {
            let clamped = locked(&handle).clamp_cursor(jump.location);
            view.cursor = clamped;
        }
        self.center_current_view();
    }

    // ------------------------------------------------------------------
    // Prompts
    // ------------------------------------------------------------------

    fn open_prompt(&mut self, kind: PromptKind) {
        let (saved_cursor, saved_top_row) = self
            .current_view()
            .map(|view| (view.cursor, view.top_row))
            .unwrap_or_default();

        let tab = self.current_tab_mut();
        tab.view_input_save = Some(tab.view_current);

        self.prompt = Some(PromptState {
            kind,
            text: String::new(),
            saved_cursor,
            saved_top_row,
        });
        self.dirty = true;
    }

    fn handle_prompt_key(&mut self, key: Key) {
        let Some(kind) = self.prompt.as_ref().map(|prompt| prompt.kind) else {
            return;
        };
        let searching = matches!(
            kind,
            PromptKind::SearchForward | PromptKind::SearchBackward
        );

        match key {
            Key::Escape => self.cancel_prompt(),
            Key::Enter => self.commit_prompt(),
            Key::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.text.pop();
                }
                if searching {
                    self.incremental_search();
                }
            }
            Key::Char(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.text.push(c);
                }
                if searching {
                    self.incremental_search();
                }
            }
            Key::ArrowUp | Key::ArrowDown => {
                let history = match kind {
                    PromptKind::Command => &mut self.command_history,
                    PromptKind::SearchForward | PromptKind::SearchBackward => {
                        &mut self.search_history
                    }
                    _ => return,
                };
                let moved = if key == Key::ArrowUp {
                    history.prev()
                } else {
                    history.next()
                };
                if moved {
                    let text = history.current().to_string();
                    if let Some(prompt) = self.prompt.as_mut() {
                        prompt.text = text;
                    }
                }
            }
            _ => {}
        }
        self.dirty = true;
    }

    fn cancel_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };

        if matches!(
            prompt.kind,
            PromptKind::SearchForward | PromptKind::SearchBackward
        ) {
            // abandon the incremental match: restore the pre-search view
            if let Some(view) = self.current_view_mut() {
                view.cursor = prompt.saved_cursor;
                view.top_row = prompt.saved_top_row;
            }
            self.highlight_search = None;
        }

        self.current_tab_mut().view_input_save = None;
        self.search_history.reset();
        self.command_history.reset();
        self.dirty = true;
    }

    fn commit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        self.current_tab_mut().view_input_save = None;

        match prompt.kind {
            PromptKind::Command => {
                self.command_history.update_current(&prompt.text);
                self.command_history.commit();
                self.run_command_text(&prompt.text);
            }
            PromptKind::SearchForward | PromptKind::SearchBackward => {
                self.search_history.update_current(&prompt.text);
                self.search_history.commit();
                self.commit_search(prompt.kind, &prompt.text);
            }
            PromptKind::LoadFile => {
                if let Some(handle) = self.open_file(&prompt.text) {
                    self.switch_to_buffer(handle);
                }
            }
            PromptKind::SwitchBuffer => match self.find_buffer_by_name(&prompt.text) {
                Some(handle) => self.switch_to_buffer(handle),
                None => self.message(&format!("no buffer named '{}'", prompt.text)),
            },
        }
        self.dirty = true;
    }

    fn search_direction(kind: PromptKind) -> Direction {
        match kind {
            PromptKind::SearchBackward => Direction::Up,
            _ => Direction::Down,
        }
    }

    /// Center the view on the first match of the in-progress pattern
    fn incremental_search(&mut self) {
        let Some(prompt) = self.prompt.as_ref() else {
            return;
        };
        let direction = Self::search_direction(prompt.kind);
        let saved_cursor = prompt.saved_cursor;

        let regex = match Regex::new(&prompt.text) {
            Ok(regex) => regex,
            Err(_) => {
                // invalid patterns quietly suppress the highlight
                self.highlight_search = None;
                return;
            }
        };

        let matched = {
            let Some(view) = self.current_view() else {
                return;
            };
            let buffer = locked(&view.buffer);
            buffer
                .find_regex(buffer.clamp_cursor(saved_cursor), &regex, direction)
                .map(|(location, _)| location)
        };

        self.highlight_search = Some(regex);

        if let Some(location) = matched {
            if let Some(view) = self.current_view_mut() {
                view.cursor = location;
            }
            self.center_current_view();
        }
    }

    fn commit_search(&mut self, kind: PromptKind, pattern: &str) {
        if pattern.is_empty() {
            return;
        }
        let direction = Self::search_direction(kind);

        match Regex::new(pattern) {
            Ok(regex) => {
                self.vim
                    .yanks
                    .add(SEARCH_REGISTER, pattern.to_string(), YankMode::Normal);
                self.highlight_search = Some(regex.clone());
                self.vim.search = Some(SearchState {
                    regex,
                    pattern: pattern.to_string(),
                    direction,
                });
            }
            Err(error) => {
                self.message(&format!("invalid regex '{}': {}", pattern, error));
                self.highlight_search = None;
            }
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn run_command_text(&mut self, text: &str) {
        // a bare number is a goto-line
        if let Ok(line) = text.trim().parse::<i64>() {
            self.goto_line(line);
            return;
        }

        let Some(command) = Command::parse(text) else {
            return;
        };
        self.run_command(&command);
    }

    fn goto_line(&mut self, line: i64) {
        let Some(view) = self.current_view_mut() else {
            return;
        };
        let handle = Arc::clone(&view.buffer);
        let buffer = locked(&handle);
        let name = buffer.name.clone();
        let from = view.cursor;
        view.jumps.insert(&name, from);

        let clamped = buffer.clamp_cursor(Point::new(0, line - 1));
        view.cursor = buffer
            .soft_beginning_of_line(clamped)
            .map(|p| buffer.clamp_cursor(p))
            .unwrap_or(clamped);
        drop(buffer);
        self.center_current_view();
    }

    fn run_command(&mut self, command: &Command) {
        match command.name.as_str() {
            "new_buffer" => {
                let name = command
                    .args
                    .first()
                    .and_then(|arg| arg.as_str())
                    .unwrap_or("unnamed");
                let mut buffer = Buffer::new(name);
                buffer.alloc_lines(1);
                buffer.status = BufferStatus::NewFile;
                let handle = buffer.into_handle();
                self.buffers.push(EditorBuffer {
                    buffer: Arc::clone(&handle),
                    commits: CommitLog::new(),
                });
                self.switch_to_buffer(handle);
            }
            "reload_buffer" => {
                let Some(handle) = self.current_buffer_handle() else {
                    return;
                };
                let mut buffer = locked(&handle);
                let name = buffer.name.clone();
                let result = buffer.load_file(&name);
                drop(buffer);
                if result != LoadFileResult::Loaded {
                    self.message(&format!("failed to reload '{}'", name));
                } else if let Some(view) = self.current_view_mut() {
                    let clamped = locked(&handle).clamp_cursor(view.cursor);
                    view.cursor = clamped;
                }
            }
            "rename" => {
                let Some(name) = command.args.first().and_then(|arg| arg.as_str()) else {
                    self.message("rename requires a name");
                    return;
                };
                if let Some(handle) = self.current_buffer_handle() {
                    locked(&handle).name = name.to_string();
                }
            }
            "syntax" => {
                let Some(kind) = command.args.first().and_then(|arg| arg.as_str()) else {
                    return;
                };
                let file_type = match kind {
                    "c" => FileType::C,
                    "cpp" => FileType::Cpp,
                    "python" => FileType::Python,
                    "java" => FileType::Java,
                    "bash" => FileType::Bash,
                    "config" => FileType::Config,
                    "diff" => FileType::Diff,
                    "plain" => FileType::Plain,
                    other => {
                        self.message(&format!("unknown syntax '{}'", other));
                        return;
                    }
                };
                if let Some(handle) = self.current_buffer_handle() {
                    locked(&handle).file_type = file_type;
                }
            }
            "line_number" => {
                let Some(kind) = command.args.first().and_then(|arg| arg.as_str()) else {
                    return;
                };
                self.line_number_type = match kind {
                    "none" => LineNumberType::None,
                    "absolute" => LineNumberType::Absolute,
                    "relative" => LineNumberType::Relative,
                    "both" => LineNumberType::RelativeAndAbsolute,
                    other => {
                        self.message(&format!("unknown line_number '{}'", other));
                        return;
                    }
                };
            }
            "highlight_line" => {
                let Some(kind) = command.args.first().and_then(|arg| arg.as_str()) else {
                    return;
                };
                self.highlight_line_type = match kind {
                    "none" => HighlightLineType::None,
                    "text" => HighlightLineType::ToEndOfText,
                    "entire" => HighlightLineType::EntireLine,
                    other => {
                        self.message(&format!("unknown highlight_line '{}'", other));
                        return;
                    }
                };
            }
            "noh" => {
                self.highlight_search = None;
            }
            "buffers" => self.show_buffer_listing(),
            "macro_backslashes" => {
                self.macro_backslashes = !self.macro_backslashes;
                let state = if self.macro_backslashes { "on" } else { "off" };
                self.message(&format!("macro_backslashes {}", state));
            }
            other => self.message(&format!("unknown command '{}'", other)),
        }
        self.dirty = true;
    }

    /// Render the buffer list into a transient buffer shown in the
    /// overrideable view
    fn show_buffer_listing(&mut self) {
        let mut listing = Buffer::new("[buffers]");
        listing.no_line_numbers = true;
        for entry in &self.buffers {
            let buffer = locked(&entry.buffer);
            let flag = match buffer.status {
                BufferStatus::Modified => "+",
                BufferStatus::ReadOnly => "%",
                BufferStatus::NewFile => "~",
                BufferStatus::None => " ",
            };
            listing.append_line(&format!(
                "{} {:>5} {}",
                flag,
                buffer.line_count(),
                buffer.name
            ));
        }
        listing.status = BufferStatus::ReadOnly;
        let handle = listing.into_handle();
        self.buffer_listing = Some(Arc::clone(&handle));

        let tab = self.current_tab_mut();
        if tab.view_overrideable.is_none() {
            tab.view_overrideable = Some(tab.view_current);
        }
        if tab.save_overrideable(Arc::clone(&handle)) {
            let overrideable = tab.view_overrideable;
            if let Some(id) = overrideable {
                tab.focus(id);
            }
        } else {
            self.switch_to_buffer(handle);
        }
    }

    /// Enter on the buffer listing opens the buffer under the cursor
    fn try_listing_selection(&mut self) -> bool {
        let Some(listing) = self.buffer_listing.clone() else {
            return false;
        };
        let Some(view) = self.current_view() else {
            return false;
        };
        if !Arc::ptr_eq(&view.buffer, &listing) {
            return false;
        }

        let name = {
            let buffer = locked(&listing);
            buffer
                .line(view.cursor.y)
                .and_then(|line| line.get(8..))
                .map(|name| name.to_string())
        };

        self.buffer_listing = None;
        if self.current_tab().has_override() {
            self.current_tab_mut().restore_overrideable();
        }

        if let Some(name) = name {
            if let Some(handle) = self.find_buffer_by_name(name.trim()) {
                self.switch_to_buffer(handle);
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    fn draw(&mut self) -> Result<()> {
        self.screen.clear();

        // keep the cursor inside the current view
        let (_, area_bottom_right) = self.view_area();
        {
            let line_number_type = self.line_number_type;
            if let Some(view) = self.current_view_mut() {
                let at_width_edge = view.bottom_right.x == area_bottom_right.x;
                let at_height_edge = view.bottom_right.y == area_bottom_right.y;
                let (width, height) = (view.width(), view.height());
                let (line_count, no_numbers) = {
                    let buffer = locked(&view.buffer);
                    (buffer.line_count(), buffer.no_line_numbers)
                };
                let policy = if no_numbers {
                    LineNumberType::None
                } else {
                    line_number_type
                };
                render::follow_cursor(
                    view.cursor,
                    &mut view.left_column,
                    &mut view.top_row,
                    width,
                    height,
                    at_width_edge,
                    at_height_edge,
                    policy,
                    line_count,
                );
            }
        }

        let terminals = &self.terminals;
        let term_colors = |handle: &BufferHandle, location: Point| -> Option<(i16, i16)> {
            let entry = terminals
                .iter()
                .find(|entry| Arc::ptr_eq(&entry.terminal.buffer, handle))?;
            entry.terminal.with_grid(|grid| {
                let run = grid.color_at(location);
                (run.fg, run.bg)
            })
        };

        let settings = RenderSettings {
            highlight_regex: self.highlight_search.as_ref(),
            line_number_type: self.line_number_type,
            highlight_line_type: self.highlight_line_type,
            terminal_dimensions: Point::new(self.screen.width(), self.screen.height()),
        };
        let ctx = RenderContext {
            settings,
            term_colors: Some(&term_colors),
        };

        let tab = &self.tabs[self.tab_current];
        if let Some(head) = tab.view_head.as_ref() {
            render::draw_views(&mut self.screen, head, &ctx);

            let status = render::StatusContext {
                mode_name: self.vim.mode.name(),
                current_view: tab.view_current,
                overrideable_view: tab.view_overrideable,
                recording_macro: self.vim.recording_register(),
            };
            render::draw_view_statuses(&mut self.screen, head, &status);
        }

        // tab names along the top row
        let names: Vec<String> = self
            .tabs
            .iter()
            .map(|tab| {
                tab.current_view()
                    .map(|view| locked(&view.buffer).name.clone())
                    .unwrap_or_default()
            })
            .collect();
        render::draw_tab_line(&mut self.screen, &names, self.tab_current);

        // prompt overlays the bottom row
        if let Some(prompt) = self.prompt.as_ref() {
            let sigil = match prompt.kind {
                PromptKind::Command => ':',
                PromptKind::SearchForward => '/',
                PromptKind::SearchBackward => '?',
                PromptKind::LoadFile => '>',
                PromptKind::SwitchBuffer => '@',
            };
            let row = self.screen.height() - 1;
            let text = format!("{}{}", sigil, prompt.text);
            let blank = " ".repeat(self.screen.width() as usize);
            self.screen.put_str(
                Point::new(0, row),
                &blank,
                CellStyle::Style(StyleId::ViewStatus, HighlightKind::Off),
            );
            self.screen.put_str(
                Point::new(0, row),
                &text,
                CellStyle::Style(StyleId::ViewStatus, HighlightKind::Off),
            );
            self.screen.cursor = Point::new(text.len() as i64, row);
        } else {
            // hardware cursor onto the view cursor
            let cursor_position = self.current_view().map(|view| {
                let (line_count, no_numbers, is_terminal) = {
                    let buffer = locked(&view.buffer);
                    (
                        buffer.line_count(),
                        buffer.no_line_numbers,
                        buffer.file_type == FileType::Terminal,
                    )
                };
                let policy = if no_numbers {
                    LineNumberType::None
                } else {
                    self.line_number_type
                };
                let line_number_width = render::line_number_column_width(
                    policy,
                    line_count,
                    view.top_row,
                    view.top_row + view.height(),
                );

                let cursor = if is_terminal && self.vim.mode == VimMode::Insert {
                    self.current_terminal_view()
                        .map(|index| self.terminals[index].terminal.cursor())
                        .unwrap_or(view.cursor)
                } else {
                    view.cursor
                };

                Point::new(
                    view.top_left.x + line_number_width + (cursor.x - view.left_column),
                    view.top_left.y + (cursor.y - view.top_row),
                )
            });
            if let Some(position) = cursor_position {
                self.screen.cursor = position;
            }
        }

        self.backend.present(&self.screen)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

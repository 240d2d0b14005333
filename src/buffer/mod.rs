//! Line-oriented text buffers
//!
//! A buffer is a sequence of lines, each a mutable byte string with no
//! embedded newlines. All mutation goes through paired entry points: the
//! normal set, which refuses read-only buffers, and the readonly set,
//! which succeeds *only* on read-only buffers (used by the embedded
//! terminal and other output views).
//!
//! Edit operations report success with a `bool` and never partially
//! mutate: an out-of-range point leaves the buffer untouched.

pub mod motion;
pub mod search;

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::point::{sort_points, Point};

/// Shared handle to a buffer. The main thread and (for terminal buffers)
/// a reader thread both hold one; the lock is held only across a single
/// mutation or a single render pass.
pub type BufferHandle = Arc<Mutex<Buffer>>;

/// Dirty / access state of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferStatus {
    #[default]
    None,
    Modified,
    ReadOnly,
    NewFile,
}

/// Content language of a buffer, selecting its syntax highlighter and
/// indentation rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    #[default]
    Plain,
    C,
    Cpp,
    Python,
    Java,
    Bash,
    Config,
    Diff,
    Terminal,
}

impl FileType {
    /// Guess a file type from a filename extension
    pub fn from_path(path: &str) -> FileType {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("c") | Some("h") => FileType::C,
            Some("cpp") | Some("cc") | Some("hpp") | Some("cxx") => FileType::Cpp,
            Some("py") => FileType::Python,
            Some("java") => FileType::Java,
            Some("sh") | Some("bash") => FileType::Bash,
            Some("cfg") | Some("ini") | Some("conf") | Some("toml") => FileType::Config,
            Some("diff") | Some("patch") => FileType::Diff,
            _ => FileType::Plain,
        }
    }

    /// True for the C-family types that share brace/paren indentation
    pub fn is_c_family(self) -> bool {
        matches!(self, FileType::C | FileType::Cpp | FileType::Java)
    }
}

/// Outcome of loading a file into a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFileResult {
    Loaded,
    Missing,
    Directory,
}

/// An in-memory editable document
pub struct Buffer {
    /// Line storage; empty vec means a zero-line buffer
    pub lines: Vec<String>,
    pub status: BufferStatus,
    pub file_type: FileType,
    /// Filename for file-backed buffers, display name otherwise
    pub name: String,
    pub cursor: Point,
    /// Visual selection extent; `x == -1` signals no selection
    pub highlight_start: Point,
    pub highlight_end: Point,
    /// Single anonymous mark position
    pub mark: Point,
    pub blink: bool,
    /// Named mark table, keyed by register character
    pub marks: HashMap<char, Point>,
    /// Suppress the line-number column for this buffer regardless of the
    /// configured policy (meta buffers: messages, prompts, listings)
    pub no_line_numbers: bool,
}

impl Buffer {
    pub fn new(name: impl Into<String>) -> Self {
        Buffer {
            lines: Vec::new(),
            status: BufferStatus::None,
            file_type: FileType::Plain,
            name: name.into(),
            cursor: Point::default(),
            highlight_start: Point::new(-1, 0),
            highlight_end: Point::new(-1, 0),
            mark: Point::default(),
            blink: false,
            marks: HashMap::new(),
            no_line_numbers: false,
        }
    }

    /// Wrap a buffer in a shared handle
    pub fn into_handle(self) -> BufferHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn line_count(&self) -> i64 {
        self.lines.len() as i64
    }

    /// Borrow line `y`, if present
    pub fn line(&self, y: i64) -> Option<&str> {
        if y < 0 {
            return None;
        }
        self.lines.get(y as usize).map(|s| s.as_str())
    }

    fn line_len(&self, y: i64) -> i64 {
        self.line(y).map_or(0, |l| l.len() as i64)
    }

    /// Index of the last byte of `line`, or 0 for an empty line
    pub fn last_index(&self, y: i64) -> i64 {
        let len = self.line_len(y);
        if len > 0 {
            len - 1
        } else {
            0
        }
    }

    /// A point is on the buffer when its line exists and its column is at
    /// most one past the last byte (the line-terminator position).
    pub fn point_on_buffer(&self, location: Point) -> bool {
        if location.y < 0 || location.x < 0 {
            return false;
        }
        if location.y >= self.line_count() {
            return false;
        }
        location.x <= self.line_len(location.y)
    }

    /// Byte at `location`, mapping the line-terminator position to `\n`
    pub fn get_char(&self, location: Point) -> Option<char> {
        if !self.point_on_buffer(location) {
            return None;
        }
        let line = &self.lines[location.y as usize];
        if location.x as usize == line.len() {
            Some('\n')
        } else {
            Some(line.as_bytes()[location.x as usize] as char)
        }
    }

    /// Byte at `location` with no terminator mapping; caller guarantees
    /// the point is on the buffer and not at end of line
    pub fn get_char_raw(&self, location: Point) -> u8 {
        self.lines[location.y as usize].as_bytes()[location.x as usize]
    }

    fn mark_modified(&mut self) {
        if self.status != BufferStatus::ReadOnly {
            self.status = BufferStatus::Modified;
        }
    }

    fn writable(&self) -> bool {
        self.status != BufferStatus::ReadOnly
    }

    // ------------------------------------------------------------------
    // Allocation / loading
    // ------------------------------------------------------------------

    fn alloc_lines_impl(&mut self, line_count: i64) -> bool {
        if line_count <= 0 {
            return false;
        }
        self.lines = vec![String::new(); line_count as usize];
        self.mark_modified();
        true
    }

    /// Replace contents with `line_count` empty lines
    pub fn alloc_lines(&mut self, line_count: i64) -> bool {
        if !self.writable() {
            return false;
        }
        self.alloc_lines_impl(line_count)
    }

    fn clear_impl(&mut self) {
        self.lines.clear();
        self.mark_modified();
    }

    pub fn clear(&mut self) {
        if self.writable() {
            self.clear_impl();
        }
    }

    pub fn clear_readonly(&mut self) {
        if !self.writable() {
            self.clear_impl();
        }
    }

    /// Load buffer contents from a string (replaces nothing; the buffer
    /// should be empty)
    pub fn load_string(&mut self, string: &str) -> bool {
        self.insert_string(Point::new(0, 0), string)
    }

    /// Load a file from disk, replacing current contents. Write-protected
    /// files load read-only.
    pub fn load_file(&mut self, filename: &str) -> LoadFileResult {
        if let Ok(meta) = fs::metadata(filename) {
            if meta.is_dir() {
                return LoadFileResult::Directory;
            }
        }

        let mut contents = match fs::read_to_string(filename) {
            Ok(c) => c,
            Err(_) => return LoadFileResult::Missing,
        };

        // files conventionally end with a newline that is not a line
        if contents.ends_with('\n') {
            contents.pop();
        }

        self.lines.clear();
        self.status = BufferStatus::None;
        self.load_string(&contents);
        self.name = filename.to_string();
        self.file_type = FileType::from_path(filename);

        let readonly = fs::metadata(filename)
            .map(|m| m.permissions().readonly())
            .unwrap_or(false);
        self.status = if readonly {
            BufferStatus::ReadOnly
        } else {
            BufferStatus::None
        };

        LoadFileResult::Loaded
    }

    /// Write all lines to `filename`, newline-terminated
    pub fn save(&mut self, filename: &str) -> bool {
        let mut file = match fs::File::create(filename) {
            Ok(f) => f,
            Err(_) => return false,
        };

        for line in &self.lines {
            if file.write_all(line.as_bytes()).is_err() || file.write_all(b"\n").is_err() {
                return false;
            }
        }

        self.status = BufferStatus::None;
        true
    }

    // ------------------------------------------------------------------
    // Character edits
    // ------------------------------------------------------------------

    fn insert_char_impl(&mut self, location: Point, c: char) -> bool {
        if self.lines.is_empty() && location.x == 0 && location.y == 0 {
            self.alloc_lines_impl(1);
        }

        if !self.point_on_buffer(location) {
            return false;
        }

        let y = location.y as usize;
        let x = location.x as usize;

        if c == '\n' {
            // split the line at the insertion column
            let tail = self.lines[y][x..].to_string();
            self.lines[y].truncate(x);
            self.lines.insert(y + 1, tail);
            self.mark_modified();
            return true;
        }

        self.lines[y].insert(x, c);
        self.mark_modified();
        true
    }

    pub fn insert_char(&mut self, location: Point, c: char) -> bool {
        if !self.writable() {
            return false;
        }
        self.insert_char_impl(location, c)
    }

    pub fn insert_char_readonly(&mut self, location: Point, c: char) -> bool {
        if self.writable() {
            return false;
        }
        self.insert_char_impl(location, c)
    }

    fn end_of_buffer(&self) -> Point {
        let mut end = Point::new(0, 0);
        if !self.lines.is_empty() {
            end.y = self.line_count() - 1;
            end.x = self.line_len(end.y);
        }
        end
    }

    pub fn append_char(&mut self, c: char) -> bool {
        self.insert_char(self.end_of_buffer(), c)
    }

    pub fn append_char_readonly(&mut self, c: char) -> bool {
        self.insert_char_readonly(self.end_of_buffer(), c)
    }

    fn remove_char_impl(&mut self, location: Point) -> bool {
        if !self.point_on_buffer(location) {
            return false;
        }

        let y = location.y as usize;
        let line_len = self.lines[y].len() as i64;

        // removing from an empty line removes the line itself
        if line_len == 0 {
            return self.remove_line_impl(location.y);
        }

        // removing the terminator joins the following line
        if location.x == line_len {
            return self.join_line_impl(location.y);
        }

        self.lines[y].remove(location.x as usize);
        self.mark_modified();
        true
    }

    pub fn remove_char(&mut self, location: Point) -> bool {
        if !self.writable() {
            return false;
        }
        self.remove_char_impl(location)
    }

    pub fn remove_char_readonly(&mut self, location: Point) -> bool {
        if self.writable() {
            return false;
        }
        self.remove_char_impl(location)
    }

    fn set_char_impl(&mut self, location: Point, c: char) -> bool {
        if !self.point_on_buffer(location) {
            return false;
        }

        if c == '\n' {
            return self.insert_string_impl(location, "\n");
        }

        let y = location.y as usize;
        let x = location.x as usize;
        if x == self.lines[y].len() {
            self.lines[y].push(c);
        } else {
            self.lines[y].replace_range(x..x + 1, c.encode_utf8(&mut [0u8; 4]));
        }
        self.mark_modified();
        true
    }

    pub fn set_char(&mut self, location: Point, c: char) -> bool {
        if !self.writable() {
            return false;
        }
        self.set_char_impl(location, c)
    }

    pub fn set_char_readonly(&mut self, location: Point, c: char) -> bool {
        if self.writable() {
            return false;
        }
        self.set_char_impl(location, c)
    }

    // ------------------------------------------------------------------
    // String edits
    // ------------------------------------------------------------------

    fn insert_string_impl(&mut self, location: Point, new_string: &str) -> bool {
        if new_string.is_empty() {
            return false;
        }

        if location.x != 0 || location.y != 0 {
            if !self.point_on_buffer(location) {
                if location.x == 0 && location.y == self.line_count() {
                    // append new line(s) at end of file
                    return self.insert_line_impl(location.y, Some(new_string));
                }
                return false;
            }
        }

        // the whole buffer is empty: build lines from the string
        if self.lines.is_empty() {
            let mut line_count = new_string.bytes().filter(|&b| b == b'\n').count() + 1;
            // one line files usually contain a newline at the end
            if line_count == 2 && new_string.ends_with('\n') {
                line_count = 1;
            }
            self.lines = new_string
                .split('\n')
                .take(line_count)
                .map(|s| s.to_string())
                .collect();
            self.mark_modified();
            return true;
        }

        let y = location.y as usize;
        let x = location.x as usize;

        match new_string.find('\n') {
            None => {
                self.lines[y].insert_str(x, new_string);
            }
            Some(first_newline) => {
                let tail = self.lines[y][x..].to_string();
                self.lines[y].truncate(x);
                self.lines[y].push_str(&new_string[..first_newline]);

                let mut insert_at = y + 1;
                let mut rest = &new_string[first_newline + 1..];
                loop {
                    match rest.find('\n') {
                        Some(next) => {
                            self.lines.insert(insert_at, rest[..next].to_string());
                            insert_at += 1;
                            rest = &rest[next + 1..];
                        }
                        None => {
                            // final fragment joins what used to follow x
                            let mut last = rest.to_string();
                            last.push_str(&tail);
                            self.lines.insert(insert_at, last);
                            break;
                        }
                    }
                }
            }
        }

        self.mark_modified();
        true
    }

    pub fn insert_string(&mut self, location: Point, string: &str) -> bool {
        if !self.writable() {
            return false;
        }
        self.insert_string_impl(location, string)
    }

    pub fn insert_string_readonly(&mut self, location: Point, string: &str) -> bool {
        if self.writable() {
            return false;
        }
        self.insert_string_impl(location, string)
    }

    /// Insert `string` at the start of `line`
    pub fn prepend_string(&mut self, line: i64, string: &str) -> bool {
        self.insert_string(Point::new(0, line), string)
    }

    /// Insert `string` at the end of `line`
    pub fn append_string(&mut self, line: i64, string: &str) -> bool {
        let x = if self.line_count() > line {
            self.line_len(line)
        } else {
            0
        };
        self.insert_string(Point::new(x, line), string)
    }

    pub fn append_string_readonly(&mut self, line: i64, string: &str) -> bool {
        let x = if self.line_count() > line {
            self.line_len(line)
        } else {
            0
        };
        self.insert_string_readonly(Point::new(x, line), string)
    }

    fn remove_string_impl(&mut self, location: Point, length: i64) -> bool {
        if length == 0 {
            return true;
        }
        if !self.point_on_buffer(location) {
            return false;
        }

        let y = location.y as usize;
        let x = location.x as usize;
        let current_line_len = self.lines[y].len() as i64;
        let rest_of_line = current_line_len - location.x;

        // easy case: the whole range lies on one line
        if length <= rest_of_line {
            self.lines[y].replace_range(x..x + length as usize, "");
            self.mark_modified();
            return true;
        }

        // the embedded newline costs one byte
        let mut length = length - rest_of_line - 1;
        self.lines[y].truncate(x);
        if x == 0 && length == 0 {
            self.remove_line_impl(location.y);
            self.mark_modified();
            return true;
        }

        // consume whole following lines, then splice the remainder of the
        // last one onto the start line
        loop {
            let delete_index = y + 1;
            if delete_index >= self.lines.len() {
                break;
            }

            let next_line_len = self.lines[delete_index].len() as i64;
            if length >= next_line_len + 1 {
                self.lines.remove(delete_index);
                length -= next_line_len + 1;
            } else {
                let remainder = self.lines[delete_index][length as usize..].to_string();
                self.lines[y].push_str(&remainder);
                self.lines.remove(delete_index);
                break;
            }
        }

        self.mark_modified();
        true
    }

    pub fn remove_string(&mut self, location: Point, length: i64) -> bool {
        if !self.writable() {
            return false;
        }
        self.remove_string_impl(location, length)
    }

    pub fn remove_string_readonly(&mut self, location: Point, length: i64) -> bool {
        if self.writable() {
            return false;
        }
        self.remove_string_impl(location, length)
    }

    // ------------------------------------------------------------------
    // Line edits
    // ------------------------------------------------------------------

    fn insert_line_impl(&mut self, line: i64, string: Option<&str>) -> bool {
        if line < 0 || line > self.line_count() {
            return false;
        }

        let at = line as usize;
        match string {
            None => self.lines.insert(at, String::new()),
            Some(s) => {
                for (i, fragment) in s.split('\n').enumerate() {
                    self.lines.insert(at + i, fragment.to_string());
                }
            }
        }

        self.mark_modified();
        true
    }

    /// Insert line(s) before index `line`; `None` inserts one empty line
    pub fn insert_line(&mut self, line: i64, string: Option<&str>) -> bool {
        if !self.writable() {
            return false;
        }
        self.insert_line_impl(line, string)
    }

    pub fn insert_line_readonly(&mut self, line: i64, string: Option<&str>) -> bool {
        if self.writable() {
            return false;
        }
        self.insert_line_impl(line, string)
    }

    pub fn append_line(&mut self, string: &str) -> bool {
        self.insert_line(self.line_count(), Some(string))
    }

    pub fn append_line_readonly(&mut self, string: &str) -> bool {
        self.insert_line_readonly(self.line_count(), Some(string))
    }

    pub fn insert_newline(&mut self, line: i64) -> bool {
        self.insert_line(line, None)
    }

    fn remove_line_impl(&mut self, line: i64) -> bool {
        if line < 0 || line >= self.line_count() {
            return false;
        }
        self.lines.remove(line as usize);
        self.mark_modified();
        true
    }

    pub fn remove_line(&mut self, line: i64) -> bool {
        if !self.writable() {
            return false;
        }
        self.remove_line_impl(line)
    }

    pub fn remove_line_readonly(&mut self, line: i64) -> bool {
        if self.writable() {
            return false;
        }
        self.remove_line_impl(line)
    }

    fn join_line_impl(&mut self, line: i64) -> bool {
        if line < 0 || line >= self.line_count() {
            return false;
        }
        if line == self.line_count() - 1 {
            return true; // nothing to join
        }
        let next = self.lines.remove(line as usize + 1);
        self.lines[line as usize].push_str(&next);
        self.mark_modified();
        true
    }

    /// Append line `line + 1` onto line `line`
    pub fn join_line(&mut self, line: i64) -> bool {
        if !self.writable() {
            return false;
        }
        self.join_line_impl(line)
    }

    // ------------------------------------------------------------------
    // Duplication / measurement
    // ------------------------------------------------------------------

    /// Inclusive byte distance from `start` to `end`, counting one byte
    /// per line terminator
    pub fn compute_length(&self, start: Point, end: Point) -> i64 {
        let (start, end) = sort_points(start, end);

        if start.y < end.y {
            let mut length = (self.line_len(start.y) - start.x) + 1;
            for y in start.y + 1..end.y {
                length += self.line_len(y) + 1;
            }
            length + end.x + 1
        } else {
            end.x + 1 - start.x
        }
    }

    /// Copy of the inclusive range `[start, end]`. An end coordinate on a
    /// line terminator contributes a trailing newline.
    pub fn dupe_string(&self, start: Point, end: Point) -> Option<String> {
        if !self.point_on_buffer(start) || !self.point_on_buffer(end) {
            return None;
        }
        let (start, end) = sort_points(start, end);

        let mut duped = String::new();

        if start.y == end.y {
            let line = &self.lines[start.y as usize];
            let terminator = end.x as usize == line.len();
            let copy_end = if terminator {
                line.len()
            } else {
                end.x as usize + 1
            };
            duped.push_str(&line[start.x as usize..copy_end]);
            if terminator {
                duped.push('\n');
            }
            return Some(duped);
        }

        duped.push_str(&self.lines[start.y as usize][start.x as usize..]);
        duped.push('\n');
        for y in start.y + 1..end.y {
            duped.push_str(&self.lines[y as usize]);
            duped.push('\n');
        }
        let last = &self.lines[end.y as usize];
        let terminator = end.x as usize == last.len();
        let copy_end = if terminator {
            last.len()
        } else {
            end.x as usize + 1
        };
        duped.push_str(&last[..copy_end]);
        if terminator {
            duped.push('\n');
        }

        Some(duped)
    }

    /// Copy of one line, newline-terminated
    pub fn dupe_line(&self, line: i64) -> Option<String> {
        let mut duped = self.line(line)?.to_string();
        duped.push('\n');
        Some(duped)
    }

    /// Copy of an inclusive line range, each line newline-terminated
    pub fn dupe_lines(&self, start_line: i64, end_line: i64) -> Option<String> {
        let (start_line, end_line) = if start_line > end_line {
            (end_line, start_line)
        } else {
            (start_line, end_line)
        };
        if start_line < 0 || end_line >= self.line_count() {
            return None;
        }

        let mut duped = String::new();
        for y in start_line..=end_line {
            duped.push_str(&self.lines[y as usize]);
            duped.push('\n');
        }
        Some(duped)
    }

    /// Copy of the whole buffer
    pub fn dupe_buffer(&self) -> Option<String> {
        if self.lines.is_empty() {
            return None;
        }
        self.dupe_string(Point::new(0, 0), self.end_of_buffer_last_index())
    }

    fn end_of_buffer_last_index(&self) -> Point {
        let y = self.line_count() - 1;
        Point::new(self.last_index(y), y)
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

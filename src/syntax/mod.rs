//! Pluggable syntax highlighting
//!
//! The renderer drives a [`SyntaxHighlighter`] through four lifecycle
//! points: once per draw (`Initializing`), then per rendered line
//! (`BeginningOfLine`), per visible column (`Character`), and at each
//! line's end (`EndOfLine`). The highlighter emits style ids against an
//! abstract sink; mapping styles to concrete colors belongs to the
//! screen backend, not here.
//!
//! Language rules are deliberately self-contained concrete types (one
//! per file type) so the per-character hot path stays monomorphic within
//! a draw.

use regex::Regex;

use crate::buffer::{Buffer, FileType};
use crate::point::Point;
use crate::render::{HighlightLineType, LineNumberType};

/// Lifecycle point of a highlighter callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxPhase {
    Initializing,
    BeginningOfLine,
    Character,
    EndOfLine,
}

/// Semantic style of a glyph; the screen backend resolves these to colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleId {
    #[default]
    Normal,
    Keyword,
    Type,
    Control,
    Comment,
    String,
    Number,
    Preprocessor,
    DiffAdded,
    DiffRemoved,
    DiffHeader,
    TrailingWhitespace,
    LineNumbers,
    Borders,
    TabName,
    CurrentTabName,
    ViewStatus,
}

/// Overlay applied on top of the base style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightKind {
    #[default]
    Off,
    /// Visual selection or search match
    Visual,
    /// The cursor's line under the highlight-line policy
    CurrentLine,
}

/// Everything a highlighter may inspect at a lifecycle point
pub struct HighlightContext<'a> {
    pub buffer: &'a Buffer,
    pub top_left: Point,
    pub bottom_right: Point,
    pub cursor: Point,
    /// Buffer location currently being rendered
    pub loc: Point,
    pub phase: SyntaxPhase,
    pub highlight_regex: Option<&'a Regex>,
    pub line_number_type: LineNumberType,
    pub highlight_line_type: HighlightLineType,
}

/// Receives style transitions from the highlighter
pub trait StyleSink {
    fn set_style(&mut self, style: StyleId, highlight: HighlightKind);
}

/// A streaming per-buffer highlighter
pub trait SyntaxHighlighter {
    fn highlight(&mut self, data: &HighlightContext, sink: &mut dyn StyleSink);
}

/// Pick the highlighter for a buffer's file type. State lives for one
/// draw; `Initializing` arrives before anything else.
pub fn highlighter_for(file_type: FileType) -> Box<dyn SyntaxHighlighter> {
    match file_type {
        FileType::C | FileType::Cpp | FileType::Java => Box::new(CSyntax::default()),
        FileType::Python => Box::new(PythonSyntax::default()),
        FileType::Bash => Box::new(BashSyntax::default()),
        FileType::Config => Box::new(ConfigSyntax::default()),
        FileType::Diff => Box::new(DiffSyntax::default()),
        _ => Box::new(PlainSyntax::default()),
    }
}

// ----------------------------------------------------------------------
// Shared overlay: selection, search matches, current line
// ----------------------------------------------------------------------

/// Computes the highlight overlay every language shares: the visual
/// selection extent, search-regex matches on the current line, and the
/// highlight-line policy.
#[derive(Default)]
pub struct SyntaxOverlay {
    matches: Vec<(i64, i64)>,
}

impl SyntaxOverlay {
    /// Recompute search matches for the line being entered
    pub fn begin_line(&mut self, data: &HighlightContext) {
        self.matches.clear();
        let Some(regex) = data.highlight_regex else {
            return;
        };
        let Some(line) = data.buffer.line(data.loc.y) else {
            return;
        };
        for m in regex.find_iter(line) {
            self.matches.push((m.start() as i64, m.end() as i64));
        }
    }

    /// Overlay at the current location
    pub fn kind_at(&self, data: &HighlightContext) -> HighlightKind {
        let buffer = data.buffer;
        let loc = data.loc;

        if buffer.highlight_start.x >= 0
            && loc.in_range(buffer.highlight_start, buffer.highlight_end)
        {
            return HighlightKind::Visual;
        }

        if self
            .matches
            .iter()
            .any(|&(start, end)| loc.x >= start && loc.x < end)
        {
            return HighlightKind::Visual;
        }

        if loc.y == data.cursor.y {
            match data.highlight_line_type {
                HighlightLineType::None => {}
                HighlightLineType::EntireLine => return HighlightKind::CurrentLine,
                HighlightLineType::ToEndOfText => {
                    let text_end = buffer.line(loc.y).map_or(0, |l| l.trim_end().len() as i64);
                    if loc.x < text_end {
                        return HighlightKind::CurrentLine;
                    }
                }
            }
        }

        HighlightKind::Off
    }
}

// ----------------------------------------------------------------------
// Plain text
// ----------------------------------------------------------------------

#[derive(Default)]
pub struct PlainSyntax {
    overlay: SyntaxOverlay,
}

impl SyntaxHighlighter for PlainSyntax {
    fn highlight(&mut self, data: &HighlightContext, sink: &mut dyn StyleSink) {
        match data.phase {
            SyntaxPhase::Initializing => {}
            SyntaxPhase::BeginningOfLine => {
                self.overlay.begin_line(data);
                sink.set_style(StyleId::Normal, self.overlay.kind_at(data));
            }
            SyntaxPhase::Character => {
                sink.set_style(StyleId::Normal, self.overlay.kind_at(data));
            }
            SyntaxPhase::EndOfLine => {}
        }
    }
}

// ----------------------------------------------------------------------
// C family
// ----------------------------------------------------------------------

const C_KEYWORDS: &[&str] = &[
    "__thread", "auto", "case", "default", "do", "else", "enum", "extern", "false", "for", "if",
    "inline", "register", "sizeof", "static", "struct", "switch", "true", "typedef", "typeof",
    "union", "volatile", "while",
];

const C_CONTROL: &[&str] = &["break", "const", "continue", "goto", "return"];

const C_TYPES: &[&str] = &[
    "bool", "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
    "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "size_t", "ssize_t",
];

/// Length of the keyword starting at `offset`, if it sits on identifier
/// boundaries
fn match_keyword(line: &str, offset: usize, keywords: &[&str]) -> Option<usize> {
    let bytes = line.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    for keyword in keywords {
        if !line[offset..].starts_with(keyword) {
            continue;
        }
        let before_ok = offset == 0 || !is_ident(bytes[offset - 1]);
        let after = offset + keyword.len();
        let after_ok = after >= bytes.len() || !is_ident(bytes[after]);
        if before_ok && after_ok {
            return Some(keyword.len());
        }
    }
    None
}

/// A `_t`-suffixed identifier, the house style for typedefs
fn match_typename(line: &str, offset: usize) -> Option<usize> {
    if let Some(len) = match_keyword(line, offset, C_TYPES) {
        return Some(len);
    }

    let bytes = line.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    if offset > 0 && is_ident(bytes[offset - 1]) {
        return None;
    }
    let len = line[offset..].bytes().take_while(|&b| is_ident(b)).count();
    if len > 2 && line[offset..offset + len].ends_with("_t") {
        Some(len)
    } else {
        None
    }
}

#[derive(Default)]
pub struct CSyntax {
    overlay: SyntaxOverlay,
    inside_multiline_comment: bool,
    inside_comment: bool,
    inside_string: bool,
    quote: char,
    current_style: StyleId,
    style_left: usize,
    trailing_whitespace_begin: i64,
}

impl CSyntax {
    fn style_at(&mut self, data: &HighlightContext) -> StyleId {
        let Some(line) = data.buffer.line(data.loc.y) else {
            return StyleId::Normal;
        };
        let x = data.loc.x as usize;
        if x >= line.len() {
            return StyleId::Normal;
        }
        let bytes = line.as_bytes();
        let c = bytes[x] as char;
        let prev = if x > 0 { bytes[x - 1] as char } else { '\0' };
        let next = bytes.get(x + 1).map_or('\0', |&b| b as char);

        if self.inside_multiline_comment {
            if prev == '*' && c == '/' {
                self.inside_multiline_comment = false;
            }
            return StyleId::Comment;
        }

        if self.inside_comment {
            return StyleId::Comment;
        }

        if self.inside_string {
            if c == self.quote && prev != '\\' {
                self.inside_string = false;
            }
            return StyleId::String;
        }

        if self.style_left > 0 {
            self.style_left -= 1;
            return self.current_style;
        }

        if c == '/' && next == '/' {
            self.inside_comment = true;
            return StyleId::Comment;
        }
        if c == '/' && next == '*' {
            self.inside_multiline_comment = true;
            return StyleId::Comment;
        }
        if c == '"' || c == '\'' {
            self.inside_string = true;
            self.quote = c;
            return StyleId::String;
        }
        if x == 0 && c == '#' {
            self.current_style = StyleId::Preprocessor;
            self.style_left = line.len();
            return StyleId::Preprocessor;
        }
        if c.is_ascii_digit() && !prev.is_ascii_alphanumeric() && prev != '_' {
            let len = line[x..]
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'.')
                .count();
            self.current_style = StyleId::Number;
            self.style_left = len.saturating_sub(1);
            return StyleId::Number;
        }

        if let Some(len) = match_keyword(line, x, C_KEYWORDS) {
            self.current_style = StyleId::Keyword;
            self.style_left = len - 1;
            return StyleId::Keyword;
        }
        if let Some(len) = match_keyword(line, x, C_CONTROL) {
            self.current_style = StyleId::Control;
            self.style_left = len - 1;
            return StyleId::Control;
        }
        if let Some(len) = match_typename(line, x) {
            self.current_style = StyleId::Type;
            self.style_left = len - 1;
            return StyleId::Type;
        }

        StyleId::Normal
    }
}

impl SyntaxHighlighter for CSyntax {
    fn highlight(&mut self, data: &HighlightContext, sink: &mut dyn StyleSink) {
        match data.phase {
            SyntaxPhase::Initializing => {
                self.inside_multiline_comment = false;
            }
            SyntaxPhase::BeginningOfLine => {
                self.overlay.begin_line(data);
                self.inside_comment = false;
                self.inside_string = false;
                self.style_left = 0;
                self.trailing_whitespace_begin = data
                    .buffer
                    .line(data.loc.y)
                    .map_or(0, |l| l.trim_end().len() as i64);
                sink.set_style(StyleId::Normal, self.overlay.kind_at(data));
            }
            SyntaxPhase::Character => {
                let base = self.style_at(data);
                let line_len = data.buffer.line(data.loc.y).map_or(0, |l| l.len() as i64);
                let style = if data.loc.x >= self.trailing_whitespace_begin
                    && data.loc.x < line_len
                {
                    StyleId::TrailingWhitespace
                } else {
                    base
                };
                sink.set_style(style, self.overlay.kind_at(data));
            }
            SyntaxPhase::EndOfLine => {}
        }
    }
}

// ----------------------------------------------------------------------
// Python
// ----------------------------------------------------------------------

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "class", "def", "elif", "else", "except", "finally",
    "for", "from", "global", "if", "import", "in", "is", "lambda", "not", "or", "pass", "while",
    "with",
];

const PYTHON_CONTROL: &[&str] = &["break", "continue", "raise", "return", "yield"];

#[derive(Default)]
pub struct PythonSyntax {
    overlay: SyntaxOverlay,
    /// The delimiter of an open `'''`/`"""` docstring, if any
    docstring: Option<char>,
    inside_comment: bool,
    inside_string: bool,
    quote: char,
    current_style: StyleId,
    style_left: usize,
}

impl PythonSyntax {
    fn style_at(&mut self, data: &HighlightContext) -> StyleId {
        let Some(line) = data.buffer.line(data.loc.y) else {
            return StyleId::Normal;
        };
        let x = data.loc.x as usize;
        if x >= line.len() {
            return StyleId::Normal;
        }
        let bytes = line.as_bytes();
        let c = bytes[x] as char;
        let prev = if x > 0 { bytes[x - 1] as char } else { '\0' };

        let triple = (c == '"' && line[x..].starts_with("\"\"\""))
            || (c == '\'' && line[x..].starts_with("'''"));

        if let Some(delimiter) = self.docstring {
            if c == delimiter && triple {
                self.docstring = None;
                self.current_style = StyleId::String;
                self.style_left = 2;
            }
            return StyleId::String;
        }

        if self.inside_comment {
            return StyleId::Comment;
        }

        if self.inside_string {
            if c == self.quote && prev != '\\' {
                self.inside_string = false;
            }
            return StyleId::String;
        }

        if self.style_left > 0 {
            self.style_left -= 1;
            return self.current_style;
        }

        if triple {
            self.docstring = Some(c);
            self.current_style = StyleId::String;
            self.style_left = 2;
            return StyleId::String;
        }

        if c == '#' {
            self.inside_comment = true;
            return StyleId::Comment;
        }
        if c == '"' || c == '\'' {
            self.inside_string = true;
            self.quote = c;
            return StyleId::String;
        }
        if c.is_ascii_digit() && !prev.is_ascii_alphanumeric() && prev != '_' {
            let len = line[x..]
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'.')
                .count();
            self.current_style = StyleId::Number;
            self.style_left = len.saturating_sub(1);
            return StyleId::Number;
        }

        if let Some(len) = match_keyword(line, x, PYTHON_KEYWORDS) {
            self.current_style = StyleId::Keyword;
            self.style_left = len - 1;
            return StyleId::Keyword;
        }
        if let Some(len) = match_keyword(line, x, PYTHON_CONTROL) {
            self.current_style = StyleId::Control;
            self.style_left = len - 1;
            return StyleId::Control;
        }

        StyleId::Normal
    }
}

impl SyntaxHighlighter for PythonSyntax {
    fn highlight(&mut self, data: &HighlightContext, sink: &mut dyn StyleSink) {
        match data.phase {
            SyntaxPhase::Initializing => {
                self.docstring = None;
            }
            SyntaxPhase::BeginningOfLine => {
                self.overlay.begin_line(data);
                self.inside_comment = false;
                self.inside_string = false;
                self.style_left = 0;
                sink.set_style(StyleId::Normal, self.overlay.kind_at(data));
            }
            SyntaxPhase::Character => {
                let style = self.style_at(data);
                sink.set_style(style, self.overlay.kind_at(data));
            }
            SyntaxPhase::EndOfLine => {}
        }
    }
}

// ----------------------------------------------------------------------
// Shell and config files: comments, strings, and little else
// ----------------------------------------------------------------------

const BASH_KEYWORDS: &[&str] = &[
    "case", "do", "done", "elif", "else", "esac", "fi", "for", "function", "if", "in", "then",
    "until", "while",
];

/// Shared scanner for `#`-commented, quote-delimited line languages
#[derive(Default)]
struct HashCommentScanner {
    inside_comment: bool,
    inside_string: bool,
    quote: char,
    current_style: StyleId,
    style_left: usize,
}

impl HashCommentScanner {
    fn reset_line(&mut self) {
        self.inside_comment = false;
        self.inside_string = false;
        self.style_left = 0;
    }

    fn style_at(&mut self, data: &HighlightContext, keywords: &[&str]) -> StyleId {
        let Some(line) = data.buffer.line(data.loc.y) else {
            return StyleId::Normal;
        };
        let x = data.loc.x as usize;
        if x >= line.len() {
            return StyleId::Normal;
        }
        let bytes = line.as_bytes();
        let c = bytes[x] as char;
        let prev = if x > 0 { bytes[x - 1] as char } else { '\0' };

        if self.inside_comment {
            return StyleId::Comment;
        }
        if self.inside_string {
            if c == self.quote && prev != '\\' {
                self.inside_string = false;
            }
            return StyleId::String;
        }
        if self.style_left > 0 {
            self.style_left -= 1;
            return self.current_style;
        }

        if c == '#' {
            self.inside_comment = true;
            return StyleId::Comment;
        }
        if c == '"' || c == '\'' {
            self.inside_string = true;
            self.quote = c;
            return StyleId::String;
        }
        if c.is_ascii_digit() && !prev.is_ascii_alphanumeric() && prev != '_' {
            let len = line[x..]
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'.')
                .count();
            self.current_style = StyleId::Number;
            self.style_left = len.saturating_sub(1);
            return StyleId::Number;
        }

        if let Some(len) = match_keyword(line, x, keywords) {
            self.current_style = StyleId::Keyword;
            self.style_left = len - 1;
            return StyleId::Keyword;
        }

        StyleId::Normal
    }
}

#[derive(Default)]
pub struct BashSyntax {
    overlay: SyntaxOverlay,
    scanner: HashCommentScanner,
}

impl SyntaxHighlighter for BashSyntax {
    fn highlight(&mut self, data: &HighlightContext, sink: &mut dyn StyleSink) {
        match data.phase {
            SyntaxPhase::Initializing => {}
            SyntaxPhase::BeginningOfLine => {
                self.overlay.begin_line(data);
                self.scanner.reset_line();
                sink.set_style(StyleId::Normal, self.overlay.kind_at(data));
            }
            SyntaxPhase::Character => {
                let style = self.scanner.style_at(data, BASH_KEYWORDS);
                sink.set_style(style, self.overlay.kind_at(data));
            }
            SyntaxPhase::EndOfLine => {}
        }
    }
}

#[derive(Default)]
pub struct ConfigSyntax {
    overlay: SyntaxOverlay,
    scanner: HashCommentScanner,
}

impl SyntaxHighlighter for ConfigSyntax {
    fn highlight(&mut self, data: &HighlightContext, sink: &mut dyn StyleSink) {
        match data.phase {
            SyntaxPhase::Initializing => {}
            SyntaxPhase::BeginningOfLine => {
                self.overlay.begin_line(data);
                self.scanner.reset_line();
                // [section] headers read as preprocessor-like lines
                let line = data.buffer.line(data.loc.y).unwrap_or("");
                if line.trim_start().starts_with('[') {
                    self.scanner.current_style = StyleId::Preprocessor;
                    self.scanner.style_left = line.len();
                }
                sink.set_style(StyleId::Normal, self.overlay.kind_at(data));
            }
            SyntaxPhase::Character => {
                let style = self.scanner.style_at(data, &[]);
                sink.set_style(style, self.overlay.kind_at(data));
            }
            SyntaxPhase::EndOfLine => {}
        }
    }
}

// ----------------------------------------------------------------------
// Unified diffs
// ----------------------------------------------------------------------

#[derive(Default)]
pub struct DiffSyntax {
    overlay: SyntaxOverlay,
    line_style: StyleId,
}

impl SyntaxHighlighter for DiffSyntax {
    fn highlight(&mut self, data: &HighlightContext, sink: &mut dyn StyleSink) {
        match data.phase {
            SyntaxPhase::Initializing => {}
            SyntaxPhase::BeginningOfLine => {
                self.overlay.begin_line(data);
                let line = data.buffer.line(data.loc.y).unwrap_or("");
                self.line_style = if line.starts_with("@@")
                    || line.starts_with("---")
                    || line.starts_with("+++")
                    || line.starts_with("diff ")
                {
                    StyleId::DiffHeader
                } else if line.starts_with('+') {
                    StyleId::DiffAdded
                } else if line.starts_with('-') {
                    StyleId::DiffRemoved
                } else {
                    StyleId::Normal
                };
                sink.set_style(self.line_style, self.overlay.kind_at(data));
            }
            SyntaxPhase::Character => {
                sink.set_style(self.line_style, self.overlay.kind_at(data));
            }
            SyntaxPhase::EndOfLine => {}
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

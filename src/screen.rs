//! Abstract screen surface
//!
//! The render layer emits glyphs and style transitions into a [`Screen`]
//! cell grid; nothing in the core talks to the terminal directly. The
//! crossterm-backed [`CrosstermBackend`] owns raw mode, reads key events,
//! and flushes the finished grid, resolving style ids to concrete colors
//! at the very edge.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::style::{Color, Colors};
use crossterm::{cursor, event, execute, queue, style, terminal};

use crate::key::Key;
use crate::point::Point;
use crate::syntax::{HighlightKind, StyleId};

/// Final appearance of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Style(StyleId, HighlightKind),
    /// Raw terminal colors from the embedded shell's SGR runs
    TermColor {
        fg: i16,
        bg: i16,
        highlight: HighlightKind,
    },
}

impl Default for CellStyle {
    fn default() -> Self {
        CellStyle::Style(StyleId::Normal, HighlightKind::Off)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            glyph: ' ',
            style: CellStyle::default(),
        }
    }
}

/// A width x height cell grid with glyph read-back (border junction
/// probing relies on it)
pub struct Screen {
    width: i64,
    height: i64,
    cells: Vec<Cell>,
    /// Where the hardware cursor lands after a flush
    pub cursor: Point,
}

impl Screen {
    pub fn new(width: i64, height: i64) -> Self {
        Screen {
            width: width.max(1),
            height: height.max(1),
            cells: vec![Cell::default(); (width.max(1) * height.max(1)) as usize],
            cursor: Point::new(0, 0),
        }
    }

    pub fn width(&self) -> i64 {
        self.width
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn resize(&mut self, width: i64, height: i64) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.cells = vec![Cell::default(); (self.width * self.height) as usize];
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    fn index(&self, location: Point) -> Option<usize> {
        if location.x < 0 || location.y < 0 || location.x >= self.width || location.y >= self.height
        {
            return None;
        }
        Some((location.y * self.width + location.x) as usize)
    }

    pub fn put(&mut self, location: Point, glyph: char, style: CellStyle) {
        if let Some(index) = self.index(location) {
            self.cells[index] = Cell { glyph, style };
        }
    }

    pub fn put_str(&mut self, location: Point, text: &str, style: CellStyle) {
        let mut x = location.x;
        for c in text.chars() {
            self.put(Point::new(x, location.y), c, style);
            x += 1;
        }
    }

    pub fn glyph_at(&self, location: Point) -> Option<char> {
        self.index(location).map(|i| self.cells[i].glyph)
    }

    pub fn cell_at(&self, location: Point) -> Option<Cell> {
        self.index(location).map(|i| self.cells[i])
    }
}

// ----------------------------------------------------------------------
// Crossterm backend
// ----------------------------------------------------------------------

/// Terminal backend: raw mode in, cell grid out
pub struct CrosstermBackend {
    stdout: Stdout,
}

impl CrosstermBackend {
    pub fn new() -> Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)
            .context("failed to enter alternate screen")?;
        Ok(CrosstermBackend { stdout })
    }

    pub fn size(&self) -> Result<(i64, i64)> {
        let (cols, rows) = terminal::size().context("failed to query terminal size")?;
        Ok((cols as i64, rows as i64))
    }

    /// Block up to `timeout` for the next key event
    pub fn read_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
        if !event::poll(timeout).context("event poll failed")? {
            return Ok(None);
        }
        let ev = event::read().context("event read failed")?;
        Ok(Key::from_event(ev))
    }

    /// Flush the whole grid and park the hardware cursor
    pub fn present(&mut self, screen: &Screen) -> Result<()> {
        queue!(self.stdout, cursor::Hide, cursor::MoveTo(0, 0))?;

        let mut last_style: Option<CellStyle> = None;
        for y in 0..screen.height() {
            queue!(self.stdout, cursor::MoveTo(0, y as u16))?;
            for x in 0..screen.width() {
                let cell = screen
                    .cell_at(Point::new(x, y))
                    .unwrap_or_default();
                if last_style != Some(cell.style) {
                    let colors = resolve_colors(cell.style);
                    queue!(self.stdout, style::SetColors(colors))?;
                    last_style = Some(cell.style);
                }
                queue!(self.stdout, style::Print(cell.glyph))?;
            }
        }

        queue!(
            self.stdout,
            cursor::MoveTo(
                screen.cursor.x.clamp(0, screen.width - 1) as u16,
                screen.cursor.y.clamp(0, screen.height - 1) as u16
            ),
            cursor::Show
        )?;
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Map an ANSI color index from the embedded terminal to crossterm
fn ansi_color(index: i16) -> Color {
    match index {
        0 => Color::Black,
        1 => Color::DarkRed,
        2 => Color::DarkGreen,
        3 => Color::DarkYellow,
        4 => Color::DarkBlue,
        5 => Color::DarkMagenta,
        6 => Color::DarkCyan,
        7 => Color::Grey,
        _ => Color::Reset,
    }
}

/// The palette: style ids become colors only here
fn resolve_colors(style: CellStyle) -> Colors {
    match style {
        CellStyle::TermColor { fg, bg, highlight } => {
            let background = match highlight {
                HighlightKind::Off => ansi_color(bg),
                HighlightKind::Visual => Color::DarkGrey,
                HighlightKind::CurrentLine => Color::Black,
            };
            Colors::new(ansi_color(fg), background)
        }
        CellStyle::Style(id, highlight) => {
            let foreground = match id {
                StyleId::Normal => Color::Reset,
                StyleId::Keyword => Color::Yellow,
                StyleId::Type => Color::Cyan,
                StyleId::Control => Color::Magenta,
                StyleId::Comment => Color::DarkGreen,
                StyleId::String => Color::Red,
                StyleId::Number => Color::Magenta,
                StyleId::Preprocessor => Color::DarkMagenta,
                StyleId::DiffAdded => Color::Green,
                StyleId::DiffRemoved => Color::Red,
                StyleId::DiffHeader => Color::Magenta,
                StyleId::TrailingWhitespace => Color::Red,
                StyleId::LineNumbers => Color::DarkGrey,
                StyleId::Borders => Color::DarkGrey,
                StyleId::TabName => Color::Grey,
                StyleId::CurrentTabName => Color::White,
                StyleId::ViewStatus => Color::White,
            };
            let background = match (id, highlight) {
                (StyleId::TrailingWhitespace, _) => Color::Red,
                (_, HighlightKind::Visual) => Color::DarkGrey,
                (_, HighlightKind::CurrentLine) => Color::Black,
                (StyleId::ViewStatus, _) => Color::DarkGrey,
                (_, HighlightKind::Off) => Color::Reset,
            };
            Colors::new(foreground, background)
        }
    }
}

//! ANSI escape parsing for the embedded terminal
//!
//! The reader thread feeds raw pty output through [`AnsiParser`], which
//! recognizes printable text, C0 control codes, and the CSI subset the
//! editor needs (`ESC [ params* letter`, up to 16 numeric arguments with
//! an optional `?` private prefix). Everything else is dropped.
//!
//! Parsed output is back-projected onto the terminal's buffer through the
//! readonly mutation entry points, with per-line color runs recording SGR
//! transitions for the renderer.

use crate::buffer::Buffer;
use crate::point::Point;

/// Terminal default color sentinel
pub const DEFAULT_COLOR: i16 = -1;

const MAX_CSI_ARGS: usize = 16;

/// One foreground/background transition at a byte offset within a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRun {
    pub index: i64,
    pub fg: i16,
    pub bg: i16,
}

impl Default for ColorRun {
    fn default() -> Self {
        ColorRun {
            index: 0,
            fg: DEFAULT_COLOR,
            bg: DEFAULT_COLOR,
        }
    }
}

/// Mutable terminal geometry and color state, shared with the renderer
pub struct TermGrid {
    pub cursor: Point,
    pub width: i64,
    pub height: i64,
    pub scroll_top: i64,
    pub scroll_bottom: i64,
    pub origin_mode: bool,
    /// Parallel to the buffer's lines; each entry holds at least one run
    pub color_lines: Vec<Vec<ColorRun>>,
}

impl TermGrid {
    pub fn new(width: i64, height: i64) -> Self {
        TermGrid {
            cursor: Point::new(0, 0),
            width,
            height,
            scroll_top: 0,
            scroll_bottom: height - 1,
            origin_mode: false,
            color_lines: vec![vec![ColorRun::default()]],
        }
    }

    /// Color active at byte `x` of line `y`
    pub fn color_at(&self, location: Point) -> ColorRun {
        let Some(runs) = self.color_lines.get(location.y as usize) else {
            return ColorRun::default();
        };
        let mut active = ColorRun::default();
        for run in runs {
            if run.index > location.x {
                break;
            }
            active = *run;
        }
        active
    }

    fn last_run(&self) -> ColorRun {
        self.color_lines
            .last()
            .and_then(|runs| runs.last())
            .copied()
            .unwrap_or_default()
    }

    /// Keep the color table parallel to the buffer after a line append,
    /// carrying the trailing run onto the new line
    fn push_color_line(&mut self, line_count: i64) {
        let mut carried = self.last_run();
        carried.index = 0;
        while (self.color_lines.len() as i64) < line_count {
            self.color_lines.push(vec![carried]);
        }
    }

    fn scroll_set(&mut self, scroll_top: i64, scroll_bottom: i64) {
        let last_row = self.height - 1;
        let top = scroll_top.clamp(0, last_row);
        let bottom = scroll_bottom.clamp(0, last_row);
        if top > bottom {
            self.scroll_top = bottom;
            self.scroll_bottom = top;
        } else {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        }
    }
}

/// CSI decode state carried between reads
#[derive(Default)]
pub struct AnsiParser {
    escape: bool,
    csi: bool,
    args: [i64; MAX_CSI_ARGS],
    arg_index: usize,
    private: bool,
}

impl AnsiParser {
    pub fn new() -> Self {
        AnsiParser::default()
    }

    fn reset_csi(&mut self) {
        self.csi = false;
        self.private = false;
        self.arg_index = 0;
        self.args = [0; MAX_CSI_ARGS];
    }

    /// Feed a chunk of pty output into the buffer and grid
    pub fn process(&mut self, bytes: &[u8], grid: &mut TermGrid, buffer: &mut Buffer) {
        for &byte in bytes {
            if self.csi {
                self.process_csi_byte(byte, grid, buffer);
            } else if self.escape {
                if byte == b'[' {
                    self.csi = true;
                }
                self.escape = false;
            } else if (0x20..0x7f).contains(&byte) {
                self.print_char(byte as char, grid, buffer);
            } else {
                match byte {
                    0x1b => self.escape = true,
                    0x18 => self.reset_csi(),
                    b'\x08' => {
                        grid.cursor.x -= 1;
                        if grid.cursor.x < 0 {
                            grid.cursor.x = 0;
                        }
                    }
                    b'\n' => {
                        buffer.append_char_readonly('\n');
                        grid.cursor.x = 0;
                        grid.cursor.y += 1;
                        grid.push_color_line(buffer.line_count());
                    }
                    b'\r' => grid.cursor.x = 0,
                    _ => {}
                }
            }
        }
    }

    fn process_csi_byte(&mut self, byte: u8, grid: &mut TermGrid, buffer: &mut Buffer) {
        if byte.is_ascii_digit() {
            self.args[self.arg_index] *= 10;
            self.args[self.arg_index] += (byte - b'0') as i64;
            return;
        }
        if byte == b';' {
            if self.arg_index + 1 < MAX_CSI_ARGS {
                self.arg_index += 1;
            }
            return;
        }
        if byte == b'?' {
            self.private = true;
            return;
        }

        self.dispatch_csi(byte, grid, buffer);
        self.reset_csi();
    }

    fn arg_or(&self, slot: usize, default: i64) -> i64 {
        if self.args[slot] != 0 {
            self.args[slot]
        } else {
            default
        }
    }

    fn dispatch_csi(&mut self, letter: u8, grid: &mut TermGrid, buffer: &mut Buffer) {
        match letter {
            // insert blanks at cursor
            b'@' => {
                let spaces = self.arg_or(0, 1);
                for _ in 0..spaces {
                    if buffer.insert_char_readonly(grid.cursor, ' ') {
                        grid.cursor.x += 1;
                        if grid.cursor.x >= grid.width {
                            grid.cursor.x = 0;
                            grid.cursor.y += 1;
                        }
                    }
                }
            }

            b'A' => grid.cursor.y -= self.arg_or(0, 1),
            b'B' | b'e' => grid.cursor.y += self.arg_or(0, 1),
            b'C' | b'a' => grid.cursor.x += self.arg_or(0, 1),
            b'D' => grid.cursor.x -= self.arg_or(0, 1),

            // down / up to first column
            b'E' => {
                grid.cursor.y += self.arg_or(0, 1);
                grid.cursor.x = 0;
            }
            b'F' => {
                grid.cursor.y -= self.arg_or(0, 1);
                grid.cursor.x = 0;
            }

            b'G' | b'`' => grid.cursor.x = self.arg_or(0, 1) - 1,

            b'H' | b'f' => {
                grid.cursor.y = self.arg_or(0, 1) - 1;
                grid.cursor.x = self.arg_or(1, 1) - 1;
            }

            // clear screen regions
            b'J' => match self.args[0] {
                0 => {
                    clear_region(
                        buffer,
                        grid.cursor.x,
                        grid.cursor.y,
                        grid.width - 1,
                        grid.cursor.y,
                    );
                    if grid.cursor.y < grid.height {
                        clear_region(buffer, 0, grid.cursor.y + 1, grid.width - 1, grid.height - 1);
                    }
                }
                1 => {
                    clear_region(buffer, 0, grid.cursor.y, grid.cursor.x, grid.cursor.y);
                    if grid.cursor.y > 0 {
                        clear_region(buffer, 0, 0, grid.width - 1, grid.cursor.y - 1);
                    }
                }
                2 => clear_region(buffer, 0, 0, grid.width - 1, grid.cursor.y),
                _ => {}
            },

            // clear line
            b'K' => match self.args[0] {
                0 => clear_region(
                    buffer,
                    grid.cursor.x,
                    grid.cursor.y,
                    grid.width - 1,
                    grid.cursor.y,
                ),
                1 => clear_region(buffer, 0, grid.cursor.y, grid.cursor.x, grid.cursor.y),
                2 => clear_region(buffer, 0, grid.cursor.y, grid.width - 1, grid.cursor.y),
                _ => {}
            },

            b'S' => {
                let lines = self.arg_or(1, 1);
                scroll_up(buffer, grid, grid.scroll_top, lines);
            }
            b'T' => {
                let lines = self.arg_or(1, 1);
                scroll_down(buffer, grid, grid.scroll_top, lines);
            }

            // insert newlines
            b'L' => {
                let lines = self.arg_or(1, 1);
                for _ in 0..lines {
                    if buffer.insert_char_readonly(grid.cursor, '\n') {
                        grid.cursor.y += 1;
                        grid.cursor.x = 0;
                        grid.push_color_line(buffer.line_count());
                    }
                }
            }
            // delete lines
            b'M' => {
                let lines = self.arg_or(1, 1);
                for _ in 0..lines {
                    if buffer.remove_line_readonly(grid.cursor.y) {
                        grid.cursor.y -= 1;
                    }
                }
            }

            // erase characters in place
            b'X' => {
                let characters = self.arg_or(1, 1);
                clear_region(
                    buffer,
                    grid.cursor.x,
                    grid.cursor.y,
                    grid.cursor.x + characters - 1,
                    grid.cursor.y,
                );
            }
            // delete characters
            b'P' => {
                let characters = self.arg_or(1, 1);
                for _ in 0..characters {
                    buffer.remove_char_readonly(grid.cursor);
                }
            }

            b'd' => grid.cursor.y = self.arg_or(0, 1) - 1,

            b'h' | b'l' => {
                let on = letter == b'h';
                if self.private {
                    for slot in 0..=self.arg_index {
                        if self.args[slot] == 6 {
                            grid.origin_mode = on;
                        }
                    }
                }
            }

            b'r' => {
                if !self.private {
                    let top = self.arg_or(0, 1) - 1;
                    let bottom = self.arg_or(1, grid.height) - 1;
                    grid.scroll_set(top, bottom);
                    grid.cursor = Point::new(0, 0);
                }
            }

            b'm' => self.apply_sgr(grid, buffer),

            _ => {}
        }
    }

    /// SGR: append a color-run node to the last line, anchored at its
    /// current end, then fold each argument into it
    fn apply_sgr(&mut self, grid: &mut TermGrid, buffer: &mut Buffer) {
        let last_line = buffer.line_count() - 1;
        if last_line < 0 {
            return;
        }
        grid.push_color_line(last_line + 1);

        let mut run = grid.last_run();
        run.index = buffer.line(last_line).map_or(0, |l| l.len() as i64);

        for slot in 0..=self.arg_index {
            match self.args[slot] {
                0 => {
                    run.fg = DEFAULT_COLOR;
                    run.bg = DEFAULT_COLOR;
                }
                1 => {} // bold: color table unchanged
                fg @ 30..=37 => run.fg = (fg - 30) as i16,
                38 | 39 => run.fg = DEFAULT_COLOR,
                bg @ 40..=47 => run.bg = (bg - 40) as i16,
                48 | 49 => run.bg = DEFAULT_COLOR,
                _ => {}
            }
        }

        if let Some(runs) = grid.color_lines.get_mut(last_line as usize) {
            runs.push(run);
        }
    }

    fn print_char(&mut self, c: char, grid: &mut TermGrid, buffer: &mut Buffer) {
        if buffer.point_on_buffer(grid.cursor) {
            let line_last_index = buffer.last_index(grid.cursor.y);
            if line_last_index != 0 && grid.cursor.x <= line_last_index {
                buffer.set_char_readonly(grid.cursor, c);
            } else {
                buffer.insert_char_readonly(grid.cursor, c);
            }
        } else {
            buffer.insert_char_readonly(grid.cursor, c);
        }

        grid.cursor.x += 1;

        if grid.cursor.x >= grid.width {
            // wrap: the trailing color run carries onto the fresh line
            buffer.append_char_readonly('\n');
            grid.cursor.x = 0;
            grid.cursor.y += 1;
            grid.push_color_line(buffer.line_count());
        }
    }
}

fn clear_region(buffer: &mut Buffer, a_x: i64, a_y: i64, b_x: i64, b_y: i64) {
    for y in a_y..=b_y {
        for x in a_x..=b_x {
            buffer.set_char_readonly(Point::new(x, y), ' ');
        }
    }
}

fn clamp_scroll_lines(lines: i64, start: i64, scroll_bottom: i64) -> i64 {
    let max_lines = (scroll_bottom - start) + 1;
    lines.clamp(0, max_lines)
}

fn scroll_up(buffer: &mut Buffer, grid: &TermGrid, start: i64, lines: i64) {
    let lines = clamp_scroll_lines(lines, start, grid.scroll_bottom);
    if lines == 0 {
        return;
    }
    let last_line = grid.scroll_bottom - lines;

    clear_region(buffer, 0, start, grid.width - 1, (start + lines) - 1);

    for i in start..=last_line {
        let other = i + lines;
        if i >= 0
            && other >= 0
            && (other as usize) < buffer.lines.len()
            && (i as usize) < buffer.lines.len()
        {
            buffer.lines.swap(i as usize, other as usize);
        }
    }
}

fn scroll_down(buffer: &mut Buffer, grid: &TermGrid, start: i64, lines: i64) {
    let lines = clamp_scroll_lines(lines, start, grid.scroll_bottom);
    if lines == 0 {
        return;
    }
    let last_line = grid.scroll_bottom - lines;

    clear_region(buffer, 0, last_line + 1, grid.width - 1, grid.scroll_bottom);

    for i in start..=last_line {
        let other = i - lines;
        if other >= 0
            && (other as usize) < buffer.lines.len()
            && (i as usize) < buffer.lines.len()
        {
            buffer.lines.swap(i as usize, other as usize);
        }
    }
}

#[cfg(test)]
#[path = "ansi_tests.rs"]
mod tests;

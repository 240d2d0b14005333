//! Rendering the view tree onto the screen surface
//!
//! `draw_views` walks a tab's view chains the same way geometry was
//! calculated, drawing each pane's buffer, then its right/bottom border
//! lines, and finally connecting border crossings into junction glyphs
//! by probing the cells already on the surface.

use regex::Regex;

use crate::buffer::{Buffer, BufferHandle, BufferStatus};
use crate::point::{count_digits, Point};
use crate::screen::{CellStyle, Screen};
use crate::syntax::{
    highlighter_for, HighlightContext, HighlightKind, StyleId, StyleSink, SyntaxPhase,
};
use crate::view::{View, ViewId};

const HLINE: char = '─';
const VLINE: char = '│';
const BTEE: char = '┴';
const TTEE: char = '┬';
const RTEE: char = '┤';
const LTEE: char = '├';
const CROSS: char = '┼';

/// Line-number column policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineNumberType {
    #[default]
    None,
    Absolute,
    Relative,
    RelativeAndAbsolute,
}

/// Current-line highlight policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightLineType {
    #[default]
    None,
    ToEndOfText,
    EntireLine,
}

/// Per-frame render policies
pub struct RenderSettings<'a> {
    pub highlight_regex: Option<&'a Regex>,
    pub line_number_type: LineNumberType,
    pub highlight_line_type: HighlightLineType,
    /// Full screen extent; views touching it skip their outer border
    pub terminal_dimensions: Point,
}

/// Resolves embedded-terminal colors for a buffer location, when the
/// buffer belongs to a live terminal
pub type TermColorFn<'a> = &'a dyn Fn(&BufferHandle, Point) -> Option<(i16, i16)>;

pub struct RenderContext<'a> {
    pub settings: RenderSettings<'a>,
    pub term_colors: Option<TermColorFn<'a>>,
}

/// Width of the line-number column under `line_number_type`
pub fn line_number_column_width(
    line_number_type: LineNumberType,
    buffer_line_count: i64,
    buffer_view_top: i64,
    buffer_view_bottom: i64,
) -> i64 {
    if buffer_line_count == 0 {
        return 0;
    }

    match line_number_type {
        LineNumberType::None => 0,
        LineNumberType::Absolute | LineNumberType::RelativeAndAbsolute => {
            count_digits(buffer_line_count) + 1
        }
        LineNumberType::Relative => {
            let view_height = (buffer_view_bottom - buffer_view_top) + 1;
            if view_height > buffer_line_count {
                count_digits(buffer_line_count - 1) + 1
            } else {
                count_digits(view_height - 1) + 1
            }
        }
    }
}

/// Scroll `top_row`/`left_column` so the cursor stays inside the view
#[allow(clippy::too_many_arguments)]
pub fn follow_cursor(
    cursor: Point,
    left_column: &mut i64,
    top_row: &mut i64,
    mut view_width: i64,
    mut view_height: i64,
    at_terminal_width_edge: bool,
    at_terminal_height_edge: bool,
    line_number_type: LineNumberType,
    line_count: i64,
) {
    if !at_terminal_width_edge {
        view_width -= 1;
    }
    if !at_terminal_height_edge {
        view_height -= 1;
    }

    let mut bottom_row = *top_row + view_height;
    let mut right_column = *left_column + view_width;

    if cursor.y < *top_row {
        *top_row = cursor.y;
    } else if cursor.y > bottom_row {
        bottom_row = cursor.y;
        *top_row = bottom_row - view_height;
    }

    let line_number_adjustment =
        line_number_column_width(line_number_type, line_count, *top_row, bottom_row);

    if cursor.x < *left_column {
        *left_column = cursor.x;
    } else if cursor.x > (right_column - line_number_adjustment) {
        right_column = cursor.x + line_number_adjustment;
        *left_column = right_column - view_width;
    }

    if *top_row < 0 {
        *top_row = 0;
    }
    if *left_column < 0 {
        *left_column = 0;
    }
}

/// Collects the style the highlighter last emitted
#[derive(Default)]
struct CurrentStyle {
    style: StyleId,
    highlight: HighlightKind,
}

impl StyleSink for CurrentStyle {
    fn set_style(&mut self, style: StyleId, highlight: HighlightKind) {
        self.style = style;
        self.highlight = highlight;
    }
}

/// Draw one buffer into a rectangle of the screen
#[allow(clippy::too_many_arguments)]
pub fn draw_buffer(
    screen: &mut Screen,
    handle: &BufferHandle,
    buffer: &Buffer,
    view_cursor: Point,
    top_left: Point,
    bottom_right: Point,
    buffer_top_left: Point,
    ctx: &RenderContext,
) {
    let view_height = bottom_right.y - top_left.y;
    let last_buffer_line = buffer_top_left.y + view_height;

    let line_number_width = if buffer.no_line_numbers {
        0
    } else {
        line_number_column_width(
            ctx.settings.line_number_type,
            buffer.line_count(),
            buffer_top_left.y,
            last_buffer_line.min(buffer.line_count() - 1),
        )
    };

    let mut highlighter = highlighter_for(buffer.file_type);
    let mut sink = CurrentStyle::default();

    let mut data = HighlightContext {
        buffer,
        top_left,
        bottom_right,
        cursor: view_cursor,
        loc: buffer_top_left,
        phase: SyntaxPhase::Initializing,
        highlight_regex: ctx.settings.highlight_regex,
        line_number_type: ctx.settings.line_number_type,
        highlight_line_type: ctx.settings.highlight_line_type,
    };
    highlighter.highlight(&data, &mut sink);

    for row in top_left.y..=bottom_right.y {
        let buffer_line = buffer_top_left.y + (row - top_left.y);
        if buffer_line >= buffer.line_count() {
            break;
        }
        let Some(line) = buffer.line(buffer_line) else {
            break;
        };

        data.loc = Point::new(buffer_top_left.x, buffer_line);
        data.phase = SyntaxPhase::BeginningOfLine;
        highlighter.highlight(&data, &mut sink);

        if line_number_width > 0 {
            let text = format_line_number(
                ctx.settings.line_number_type,
                buffer_line,
                view_cursor.y,
                line_number_width,
            );
            screen.put_str(
                Point::new(top_left.x, row),
                &text,
                CellStyle::Style(StyleId::LineNumbers, HighlightKind::Off),
            );
        }

        let text_start = top_left.x + line_number_width;
        for column in text_start..=bottom_right.x {
            let buffer_x = buffer_top_left.x + (column - text_start);
            if buffer_x >= line.len() as i64 {
                break;
            }

            data.loc = Point::new(buffer_x, buffer_line);
            data.phase = SyntaxPhase::Character;
            highlighter.highlight(&data, &mut sink);

            let glyph = match line.as_bytes()[buffer_x as usize] as char {
                '\t' => ' ',
                c => c,
            };

            let style = match ctx
                .term_colors
                .and_then(|colors| colors(handle, data.loc))
            {
                Some((fg, bg)) => CellStyle::TermColor {
                    fg,
                    bg,
                    highlight: sink.highlight,
                },
                None => CellStyle::Style(sink.style, sink.highlight),
            };
            screen.put(Point::new(column, row), glyph, style);
        }

        data.loc = Point::new(line.len() as i64, buffer_line);
        data.phase = SyntaxPhase::EndOfLine;
        highlighter.highlight(&data, &mut sink);
    }
}

fn format_line_number(
    line_number_type: LineNumberType,
    buffer_line: i64,
    cursor_line: i64,
    width: i64,
) -> String {
    let number = match line_number_type {
        LineNumberType::Absolute => buffer_line + 1,
        LineNumberType::Relative => (buffer_line - cursor_line).abs(),
        LineNumberType::RelativeAndAbsolute => {
            if buffer_line == cursor_line {
                buffer_line + 1
            } else {
                (buffer_line - cursor_line).abs()
            }
        }
        LineNumberType::None => return String::new(),
    };
    format!("{:>width$} ", number, width = (width - 1) as usize)
}

fn border_style() -> CellStyle {
    CellStyle::Style(StyleId::Borders, HighlightKind::Off)
}

fn draw_view_bottom_right_borders(screen: &mut Screen, view: &View, terminal_dimensions: Point) {
    // right border
    if view.bottom_right.x < terminal_dimensions.x - 1 {
        for y in view.top_left.y..view.bottom_right.y {
            screen.put(Point::new(view.bottom_right.x, y), VLINE, border_style());
        }
    }

    // bottom border
    for x in view.top_left.x..view.bottom_right.x {
        screen.put(Point::new(x, view.bottom_right.y), HLINE, border_style());
    }
}

fn draw_leaf(screen: &mut Screen, view: &View, ctx: &RenderContext) {
    let buffer_top_left = Point::new(view.left_column, view.top_row);
    if let Ok(buffer) = view.buffer.lock() {
        draw_buffer(
            screen,
            &view.buffer,
            &buffer,
            view.cursor,
            view.top_left,
            view.bottom_right,
            buffer_top_left,
            ctx,
        );
    }
    draw_view_bottom_right_borders(screen, view, ctx.settings.terminal_dimensions);
}

fn draw_horizontal_views(
    screen: &mut Screen,
    view: &View,
    already_drawn: bool,
    ctx: &RenderContext,
) {
    let mut itr = Some(view);
    let mut is_first = true;
    while let Some(v) = itr {
        if ((!already_drawn && is_first) || !is_first) && v.next_vertical.is_some() {
            draw_vertical_views(screen, v, true, ctx);
        } else {
            draw_leaf(screen, v, ctx);
        }
        is_first = false;
        itr = v.next_horizontal.as_deref();
    }
}

fn draw_vertical_views(screen: &mut Screen, view: &View, already_drawn: bool, ctx: &RenderContext) {
    let mut itr = Some(view);
    let mut is_first = true;
    while let Some(v) = itr {
        if ((!already_drawn && is_first) || !is_first) && v.next_horizontal.is_some() {
            draw_horizontal_views(screen, v, true, ctx);
        } else {
            draw_leaf(screen, v, ctx);
        }
        is_first = false;
        itr = v.next_vertical.as_deref();
    }
}

/// Substitute junction glyphs where border lines cross, by probing the
/// four neighbors already drawn
pub fn connect_border_lines(screen: &mut Screen, location: Point) {
    let left = screen.glyph_at(Point::new(location.x - 1, location.y));
    let right = screen.glyph_at(Point::new(location.x + 1, location.y));
    let top = screen.glyph_at(Point::new(location.x, location.y - 1));
    let bottom = screen.glyph_at(Point::new(location.x, location.y + 1));

    let left = left == Some(HLINE);
    let right = right == Some(HLINE);
    let top = top == Some(VLINE);
    let bottom = bottom == Some(VLINE);

    if left && right && top {
        screen.put(location, BTEE, border_style());
    }
    if left && right && bottom {
        screen.put(location, TTEE, border_style());
    }
    if top && bottom && left {
        screen.put(location, RTEE, border_style());
    }
    if top && bottom && right {
        screen.put(location, LTEE, border_style());
    }
    if top && bottom && right && left {
        screen.put(location, CROSS, border_style());
    }
}

fn connect_borders(screen: &mut Screen, view: &View) {
    if let Some(h) = view.next_horizontal.as_deref() {
        connect_borders(screen, h);
    }
    if let Some(v) = view.next_vertical.as_deref() {
        connect_borders(screen, v);
    }

    connect_border_lines(
        screen,
        Point::new(view.top_left.x - 1, view.top_left.y - 1),
    );
    connect_border_lines(
        screen,
        Point::new(view.bottom_right.x, view.top_left.y - 1),
    );
    connect_border_lines(
        screen,
        Point::new(view.bottom_right.x, view.bottom_right.y),
    );
    connect_border_lines(
        screen,
        Point::new(view.top_left.x, view.bottom_right.y),
    );
}

/// Draw a whole view tree: panes first, then border junctions
pub fn draw_views(screen: &mut Screen, view: &View, ctx: &RenderContext) {
    draw_horizontal_views(screen, view, false, ctx);
    connect_borders(screen, view);
}

/// Status line inputs shared across the tree walk
pub struct StatusContext<'a> {
    pub mode_name: &'a str,
    pub current_view: ViewId,
    pub overrideable_view: Option<ViewId>,
    pub recording_macro: Option<char>,
}

/// Write each view's status text over its bottom border
pub fn draw_view_statuses(screen: &mut Screen, view: &View, status: &StatusContext) {
    if let Some(h) = view.next_horizontal.as_deref() {
        draw_view_statuses(screen, h, status);
    }
    if let Some(v) = view.next_vertical.as_deref() {
        draw_view_statuses(screen, v, status);
    }

    let (name, flag) = match view.buffer.lock() {
        Ok(buffer) => {
            let flag = match buffer.status {
                BufferStatus::Modified => "+",
                BufferStatus::ReadOnly => "[RO]",
                BufferStatus::NewFile => "[NEW]",
                BufferStatus::None => "",
            };
            (buffer.name.clone(), flag)
        }
        Err(_) => (String::new(), ""),
    };

    let mut text = String::new();
    if view.id == status.current_view {
        text.push_str(status.mode_name);
        text.push(' ');
        if let Some(register) = status.recording_macro {
            text.push_str("RECORDING ");
            text.push(register);
            text.push(' ');
        }
    }
    if status.overrideable_view == Some(view.id) {
        text.push('*');
    }
    text.push_str(flag);
    if !flag.is_empty() {
        text.push(' ');
    }
    text.push_str(&name);
    text.push_str(&format!(" {},{}", view.cursor.y + 1, view.cursor.x + 1));

    let width = (view.bottom_right.x - view.top_left.x).max(0) as usize;
    text.truncate(width);
    screen.put_str(
        Point::new(view.top_left.x, view.bottom_right.y),
        &text,
        CellStyle::Style(StyleId::ViewStatus, HighlightKind::Off),
    );
}

/// Top-row tab list, shown only with more than one tab
pub fn draw_tab_line(screen: &mut Screen, names: &[String], current: usize) {
    if names.len() <= 1 {
        return;
    }

    let mut x = 0i64;
    for (index, name) in names.iter().enumerate() {
        let style = if index == current {
            CellStyle::Style(StyleId::CurrentTabName, HighlightKind::Off)
        } else {
            CellStyle::Style(StyleId::TabName, HighlightKind::Off)
        };
        let label = format!(" {} ", name);
        screen.put_str(Point::new(x, 0), &label, style);
        x += label.len() as i64;
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

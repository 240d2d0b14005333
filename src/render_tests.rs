use super::*;
use crate::buffer::Buffer;
use crate::screen::Screen;
use crate::view::{calc_views, split_view, View};

fn test_buffer(lines: &[&str]) -> crate::buffer::BufferHandle {
    let mut buffer = Buffer::new("render-test");
    for line in lines {
        buffer.append_line(line);
    }
    buffer.into_handle()
}

fn settings() -> RenderSettings<'static> {
    RenderSettings {
        highlight_regex: None,
        line_number_type: LineNumberType::None,
        highlight_line_type: HighlightLineType::None,
        terminal_dimensions: Point::new(80, 24),
    }
}

// ============================================================
// Line number widths
// ============================================================

#[test]
fn absolute_width_depends_on_line_count() {
    assert_eq!(
        line_number_column_width(LineNumberType::Absolute, 9, 0, 23),
        2
    );
    assert_eq!(
        line_number_column_width(LineNumberType::Absolute, 100, 0, 23),
        4
    );
    assert_eq!(line_number_column_width(LineNumberType::Absolute, 0, 0, 23), 0);
}

#[test]
fn relative_width_depends_on_view_height() {
    // short view: distances cap at the view height
    assert_eq!(
        line_number_column_width(LineNumberType::Relative, 1000, 0, 9),
        2
    );
    // short buffer: distances cap at the line count
    assert_eq!(
        line_number_column_width(LineNumberType::Relative, 5, 0, 23),
        2
    );
}

#[test]
fn none_has_no_column() {
    assert_eq!(line_number_column_width(LineNumberType::None, 1000, 0, 23), 0);
}

// ============================================================
// Follow cursor
// ============================================================

#[test]
fn follow_scrolls_down_and_back_up() {
    let mut left = 0i64;
    let mut top = 0i64;

    follow_cursor(
        Point::new(0, 30),
        &mut left,
        &mut top,
        80,
        24,
        true,
        true,
        LineNumberType::None,
        100,
    );
    assert_eq!(top, 6); // 30 - 24

    follow_cursor(
        Point::new(0, 3),
        &mut left,
        &mut top,
        80,
        24,
        true,
        true,
        LineNumberType::None,
        100,
    );
    assert_eq!(top, 3);
}

#[test]
fn follow_scrolls_horizontally() {
    let mut left = 0i64;
    let mut top = 0i64;

    follow_cursor(
        Point::new(100, 0),
        &mut left,
        &mut top,
        80,
        24,
        true,
        true,
        LineNumberType::None,
        10,
    );
    assert_eq!(left, 20); // 100 - 80

    follow_cursor(
        Point::new(5, 0),
        &mut left,
        &mut top,
        80,
        24,
        true,
        true,
        LineNumberType::None,
        10,
    );
    assert_eq!(left, 5);
}

#[test]
fn follow_reserves_the_line_number_column() {
    let mut left = 0i64;
    let mut top = 0i64;

    // width 20, 100 lines -> "100 " needs 4 columns
    follow_cursor(
        Point::new(19, 0),
        &mut left,
        &mut top,
        20,
        24,
        true,
        true,
        LineNumberType::Absolute,
        100,
    );
    assert_eq!(left, 3); // 19 + 4 - 20
}

#[test]
fn follow_never_goes_negative() {
    let mut left = 5i64;
    let mut top = 5i64;
    follow_cursor(
        Point::new(0, 0),
        &mut left,
        &mut top,
        80,
        24,
        true,
        true,
        LineNumberType::None,
        10,
    );
    assert_eq!((left, top), (0, 0));
}

// ============================================================
// Buffer drawing
// ============================================================

#[test]
fn draw_buffer_places_glyphs_in_the_rectangle() {
    let handle = test_buffer(&["hello", "world"]);
    let mut screen = Screen::new(80, 24);
    let ctx = RenderContext {
        settings: settings(),
        term_colors: None,
    };

    let buffer = handle.lock().unwrap();
    draw_buffer(
        &mut screen,
        &handle,
        &buffer,
        Point::new(0, 0),
        Point::new(0, 0),
        Point::new(79, 23),
        Point::new(0, 0),
        &ctx,
    );
    drop(buffer);

    assert_eq!(screen.glyph_at(Point::new(0, 0)), Some('h'));
    assert_eq!(screen.glyph_at(Point::new(4, 0)), Some('o'));
    assert_eq!(screen.glyph_at(Point::new(0, 1)), Some('w'));
}

#[test]
fn draw_buffer_honors_the_scroll_origin() {
    let handle = test_buffer(&["aaa", "bbb", "ccc"]);
    let mut screen = Screen::new(80, 24);
    let ctx = RenderContext {
        settings: settings(),
        term_colors: None,
    };

    let buffer = handle.lock().unwrap();
    draw_buffer(
        &mut screen,
        &handle,
        &buffer,
        Point::new(0, 1),
        Point::new(0, 0),
        Point::new(79, 23),
        Point::new(1, 1),
        &ctx,
    );
    drop(buffer);

    // top-left of the view shows byte 1 of line 1
    assert_eq!(screen.glyph_at(Point::new(0, 0)), Some('b'));
    assert_eq!(screen.glyph_at(Point::new(0, 1)), Some('c'));
}

#[test]
fn line_numbers_occupy_the_left_column() {
    let handle = test_buffer(&["text"]);
    let mut screen = Screen::new(80, 24);
    let mut with_numbers = settings();
    with_numbers.line_number_type = LineNumberType::Absolute;
    let ctx = RenderContext {
        settings: with_numbers,
        term_colors: None,
    };

    let buffer = handle.lock().unwrap();
    draw_buffer(
        &mut screen,
        &handle,
        &buffer,
        Point::new(0, 0),
        Point::new(0, 0),
        Point::new(79, 23),
        Point::new(0, 0),
        &ctx,
    );
    drop(buffer);

    assert_eq!(screen.glyph_at(Point::new(0, 0)), Some('1'));
    assert_eq!(screen.glyph_at(Point::new(2, 0)), Some('t'));
}

// ============================================================
// Borders and junctions
// ============================================================

#[test]
fn split_draws_a_border_between_views() {
    let buffer = test_buffer(&["left pane"]);
    let mut head = View::new(1, std::sync::Arc::clone(&buffer));
    split_view(&mut head, 1, buffer, true, 2);
    calc_views(&mut head, Point::new(0, 0), Point::new(79, 23));

    let mut screen = Screen::new(80, 24);
    let ctx = RenderContext {
        settings: settings(),
        term_colors: None,
    };
    draw_views(&mut screen, &head, &ctx);

    // right border of the first view runs down column 39
    assert_eq!(screen.glyph_at(Point::new(39, 0)), Some('│'));
    assert_eq!(screen.glyph_at(Point::new(39, 10)), Some('│'));
}

#[test]
fn crossing_borders_become_junctions() {
    let mut screen = Screen::new(10, 10);
    let style = crate::screen::CellStyle::default();
    for x in 0..10 {
        screen.put(Point::new(x, 5), '─', style);
    }
    for y in 0..10 {
        if y != 5 {
            screen.put(Point::new(5, y), '│', style);
        }
    }

    connect_border_lines(&mut screen, Point::new(5, 5));
    assert_eq!(screen.glyph_at(Point::new(5, 5)), Some('┼'));
}

#[test]
fn tee_junction_at_a_border_end() {
    let mut screen = Screen::new(10, 10);
    let style = crate::screen::CellStyle::default();
    for x in 0..10 {
        screen.put(Point::new(x, 5), '─', style);
    }
    for y in 0..5 {
        screen.put(Point::new(5, y), '│', style);
    }

    connect_border_lines(&mut screen, Point::new(5, 5));
    assert_eq!(screen.glyph_at(Point::new(5, 5)), Some('┴'));
}

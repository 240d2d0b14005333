//! Cursor movement primitives
//!
//! Motions here are pure position calculations against a buffer: they
//! clamp into range, cross line boundaries where vim motions do, and
//! never mutate text. Word motions come in two flavors selected by the
//! `punctuation_boundaries` flag: weak boundaries (`w`, `b`, `e`) treat
//! punctuation (except underscore) as its own word class, strong
//! boundaries (`W`, `B`, `E`) split on blanks only.

use crate::buffer::{Buffer, FileType};
use crate::point::Point;

/// Blank as vim sees it: space or tab
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Punctuation for word motions; underscore counts as a word character
pub fn is_punct(c: char) -> bool {
    c != '_' && c.is_ascii_punctuation()
}

pub fn is_word_char(c: char) -> bool {
    !is_blank(c) && !is_punct(c)
}

impl Buffer {
    /// Clamp the cursor into the buffer, landing on a character (not the
    /// line terminator). A zero-line buffer clamps to `(0,0)`.
    pub fn clamp_cursor(&self, cursor: Point) -> Point {
        self.move_cursor(cursor, Point::new(0, 0))
    }

    /// Apply `delta` to `cursor` and clamp the result onto a character
    pub fn move_cursor(&self, cursor: Point, delta: Point) -> Point {
        if self.lines.is_empty() {
            return Point::new(0, 0);
        }

        let mut dst = Point::new(cursor.x + delta.x, cursor.y + delta.y);

        if dst.x < 0 {
            dst.x = 0;
        }
        if dst.y < 0 {
            dst.y = 0;
        }
        if dst.y >= self.line_count() {
            dst.y = self.line_count() - 1;
        }

        let line_len = self.line(dst.y).map_or(0, |l| l.len() as i64);
        if line_len == 0 {
            dst.x = 0;
        } else if dst.x >= line_len {
            dst.x = line_len - 1;
        }

        dst
    }

    /// Walk the buffer as one flat string with newline bytes between
    /// lines; the destination may land on a line terminator. Returns
    /// `None` when the starting cursor is out of range, and clamps at
    /// the buffer ends.
    pub fn advance_cursor(&self, cursor: Point, delta: i64) -> Option<Point> {
        if !self.point_on_buffer(cursor) {
            return None;
        }

        let mut cursor = cursor;
        let mut remaining = delta.abs();

        if delta >= 0 {
            loop {
                let room = self.line_len(cursor.y) - cursor.x;
                if remaining <= room {
                    cursor.x += remaining;
                    return Some(cursor);
                }
                if cursor.y + 1 >= self.line_count() {
                    return Some(self.end_of_file(cursor));
                }
                // stepping over the terminator costs one
                remaining -= room + 1;
                cursor.y += 1;
                cursor.x = 0;
            }
        } else {
            loop {
                if remaining <= cursor.x {
                    cursor.x -= remaining;
                    return Some(cursor);
                }
                if cursor.y == 0 {
                    return Some(Point::new(0, 0));
                }
                remaining -= cursor.x + 1;
                cursor.y -= 1;
                cursor.x = self.line_len(cursor.y);
            }
        }
    }

    pub fn beginning_of_file(&self) -> Point {
        Point::new(0, 0)
    }

    /// Last character of the last line; `cursor` is returned unchanged on
    /// a zero-line buffer
    pub fn end_of_file(&self, cursor: Point) -> Point {
        if self.lines.is_empty() {
            return cursor;
        }
        let last_line = self.line_count() - 1;
        Point::new(self.last_index(last_line), last_line)
    }

    pub fn beginning_of_line(&self, cursor: Point) -> Point {
        Point::new(0, cursor.y)
    }

    /// First non-blank column of the cursor's line
    pub fn soft_beginning_of_line(&self, cursor: Point) -> Option<Point> {
        if !self.point_on_buffer(cursor) {
            return None;
        }
        let line = self.line(cursor.y)?;
        let x = line
            .bytes()
            .position(|b| !is_blank(b as char))
            .unwrap_or(line.len());
        Some(Point::new(x as i64, cursor.y))
    }

    /// Last character of the cursor's line
    pub fn end_of_line(&self, cursor: Point) -> Option<Point> {
        if !self.point_on_buffer(cursor) {
            return None;
        }
        Some(Point::new(self.last_index(cursor.y), cursor.y))
    }

    /// Last non-blank column of the cursor's line
    pub fn soft_end_of_line(&self, cursor: Point) -> Option<Point> {
        if !self.point_on_buffer(cursor) {
            return None;
        }
        let line = self.line(cursor.y)?.as_bytes();
        let mut i = (line.len() as i64 - 1).max(0);
        while i > 0 && is_blank(line[i as usize] as char) {
            i -= 1;
        }
        Some(Point::new(i, cursor.y))
    }

    /// `b` / `B`: beginning of the current or previous word, crossing
    /// onto the previous line from column 0 or a blank run
    pub fn beginning_of_word(&self, cursor: Point, punctuation_boundaries: bool) -> Option<Point> {
        if !self.point_on_buffer(cursor) {
            return None;
        }

        let line = self.line(cursor.y)?.as_bytes();
        let start_x = cursor.x;
        let mut cursor = cursor;

        while cursor.x > 0 {
            let before = line[cursor.x as usize - 1] as char;
            if is_blank(before) {
                // starting on a boundary: skip the blank run first
                while cursor.x > 0 && is_blank(line[cursor.x as usize - 1] as char) {
                    cursor.x -= 1;
                }
            } else if punctuation_boundaries && is_punct(before) {
                while cursor.x > 0 && is_punct(line[cursor.x as usize - 1] as char) {
                    cursor.x -= 1;
                }
                break;
            } else {
                while cursor.x > 0 {
                    let b = line[cursor.x as usize - 1] as char;
                    if is_blank(b) || (punctuation_boundaries && is_punct(b)) {
                        break;
                    }
                    cursor.x -= 1;
                }
                break;
            }
        }

        let on_blank = (cursor.x as usize) < line.len() && is_blank(line[cursor.x as usize] as char);
        if cursor.x == 0 && cursor.y > 0 && (on_blank || start_x == 0) {
            cursor.y -= 1;
            cursor.x = self.line(cursor.y)?.len() as i64;
            if cursor.x > 0 {
                return self.beginning_of_word(cursor, punctuation_boundaries);
            }
            // the previous line is empty: stop there
        }

        Some(cursor)
    }

    /// `e` / `E`: end of the current or next word
    pub fn end_of_word(&self, cursor: Point, punctuation_boundaries: bool) -> Option<Point> {
        if !self.point_on_buffer(cursor) {
            return None;
        }

        let line = self.line(cursor.y)?.as_bytes();
        let line_len = line.len() as i64;
        let mut start_outside_word = false;
        let first_check = cursor.x + 1;
        let mut i = first_check;
        let mut cursor = cursor;

        while i < line_len {
            let c = line[i as usize] as char;
            if is_blank(c) {
                if !start_outside_word {
                    if i == first_check {
                        start_outside_word = true;
                    } else {
                        break;
                    }
                }
            } else {
                if is_punct(c) {
                    if punctuation_boundaries {
                        // pass when starting at the end of a word
                        if i == first_check || start_outside_word {
                            i += 1;
                        }
                        break;
                    }
                }
                start_outside_word = false;
            }
            i += 1;
        }

        if i == first_check && i >= line_len && cursor.y < self.line_count() - 1 {
            cursor.y += 1;
            cursor.x = 0;
            let first_char = self.line(cursor.y)?.bytes().next().map(|b| b as char);
            match first_char {
                Some(c) if punctuation_boundaries && is_punct(c) && !is_blank(c) => {}
                _ => return self.end_of_word(cursor, punctuation_boundaries),
            }
        } else if i != first_check {
            cursor.x = i - 1;
        }

        Some(cursor)
    }

    /// `w` / `W`: beginning of the next word
    pub fn next_word(&self, cursor: Point, punctuation_boundaries: bool) -> Option<Point> {
        if !self.point_on_buffer(cursor) {
            return None;
        }

        let line = self.line(cursor.y)?.as_bytes();
        let line_len = line.len() as i64;
        let first_check = cursor.x + 1;
        let mut i = first_check;
        let mut cursor = cursor;

        let at = |idx: i64| line.get(idx as usize).map_or('\n', |&b| b as char);
        let mut word_end =
            is_blank(at(cursor.x)) || (punctuation_boundaries && is_punct(at(cursor.x)));

        while i < line_len {
            let c = at(i);
            if is_blank(c) {
                word_end = true;
            } else if is_punct(c) {
                if punctuation_boundaries || word_end {
                    break;
                }
            } else if word_end {
                break;
            }
            i += 1;
        }

        cursor.x = i;

        if i >= line_len && cursor.y < self.line_count() - 1 {
            cursor.y += 1;
            cursor.x = 0;
            let next_line = self.line(cursor.y)?;
            if !line.is_empty() && !next_line.is_empty() {
                let first_char = next_line.as_bytes()[0] as char;
                if is_blank(first_char) {
                    return self.next_word(cursor, punctuation_boundaries);
                }
            }
        }

        Some(cursor)
    }

    /// `f`: next occurrence of `c` on the cursor's line
    pub fn find_char_forward(&self, cursor: Point, c: char) -> Option<Point> {
        let next = Point::new(cursor.x + 1, cursor.y);
        if !self.point_on_buffer(next) {
            return None;
        }
        let line = self.line(next.y)?;
        let found = line[next.x as usize..].find(c)?;
        Some(Point::new(next.x + found as i64, cursor.y))
    }

    /// `F`: previous occurrence of `c` on the cursor's line
    pub fn find_char_backward(&self, cursor: Point, c: char) -> Option<Point> {
        if !self.point_on_buffer(cursor) {
            return None;
        }
        let line = self.line(cursor.y)?;
        let found = line[..cursor.x as usize].rfind(c)?;
        Some(Point::new(found as i64, cursor.y))
    }

    /// `%`: matching delimiter of the pair character under the cursor.
    /// Openers scan forward, closers backward; string literals and
    /// C-style comments are skipped.
    pub fn matching_pair(&self, location: Point, matchee: char) -> Option<Point> {
        match matchee {
            '{' => self.find_matching_pair_forward(location, '{', '}'),
            '}' => self.find_matching_pair_backward(location, '}', '{'),
            '(' => self.find_matching_pair_forward(location, '(', ')'),
            ')' => self.find_matching_pair_backward(location, ')', '('),
            '[' => self.find_matching_pair_forward(location, '[', ']'),
            ']' => self.find_matching_pair_backward(location, ']', '['),
            '<' => self.find_matching_pair_forward(location, '<', '>'),
            '>' => self.find_matching_pair_backward(location, '>', '<'),
            _ => None,
        }
    }

    /// Next unescaped `matchee` after `location`; `\"` does not close a
    /// string, `\\"` does.
    pub(crate) fn find_matching_string_forward(
        &self,
        location: Point,
        matchee: char,
    ) -> Option<Point> {
        if !self.point_on_buffer(location) {
            return None;
        }

        let mut itr = Point::new(location.x + 1, location.y);
        let mut prev = '\0';
        let mut last_index = self.last_index(itr.y);

        while self.point_on_buffer(itr) {
            let curr = self.get_char(itr)?;

            if curr == matchee && prev != '\\' {
                return Some(itr);
            }

            itr.x += 1;
            if itr.x > last_index {
                itr.x = 0;
                itr.y += 1;
                if itr.y >= self.line_count() {
                    break;
                }
                last_index = self.last_index(itr.y);
            }

            prev = curr;
        }

        None
    }

    pub(crate) fn find_matching_string_backward(
        &self,
        location: Point,
        matchee: char,
    ) -> Option<Point> {
        if !self.point_on_buffer(location) {
            return None;
        }

        let mut itr = location;
        itr.x -= 1;
        if itr.x < 0 {
            itr.y -= 1;
            if itr.y < 0 {
                return None;
            }
            itr.x = self.last_index_before_comment(itr.y);
        }

        let mut prev = '\0';
        let mut prev_itr = itr;

        while self.point_on_buffer(itr) {
            let curr = self.get_char(itr)?;

            if prev == matchee && curr != '\\' {
                return Some(prev_itr);
            }

            prev = curr;
            prev_itr = itr;

            itr.x -= 1;
            if itr.x < 0 {
                itr.y -= 1;
                if itr.y < 0 {
                    break;
                }
                itr.x = self.last_index_before_comment(itr.y);
            }
        }

        None
    }

    /// Column of the last byte before a `//` comment opener on `line`,
    /// ignoring openers inside double-quoted strings
    fn last_index_before_comment(&self, line: i64) -> i64 {
        let Some(text) = self.line(line) else {
            return 0;
        };

        let mut prev = '\0';
        for (index, byte) in text.bytes().enumerate() {
            let c = byte as char;
            if c == '/' && prev == '/' && !index_inside_string_literal(text, index as i64) {
                return index as i64;
            }
            prev = c;
        }
        text.len() as i64
    }

    fn find_matching_pair_forward(
        &self,
        location: Point,
        matchee: char,
        target: char,
    ) -> Option<Point> {
        if !self.point_on_buffer(location) {
            return None;
        }

        let mut itr = location;
        let mut curr = '\0';
        let mut count = 0i64;
        let mut inside_multiline_comment = false;
        let mut last_index = self.last_index(itr.y);

        while self.point_on_buffer(itr) {
            let prev = curr;
            curr = self.get_char(itr)?;

            if inside_multiline_comment {
                if curr == '/' && prev == '*' {
                    inside_multiline_comment = false;
                }
            } else if curr == target {
                if count == 0 {
                    return Some(itr);
                }
                count -= 1;
            } else if curr == matchee && itr != location {
                count += 1;
            } else if curr == '"' {
                itr = self.find_matching_string_forward(itr, '"')?;
            } else if curr == '\'' {
                itr = self.find_matching_string_forward(itr, '\'')?;
            } else if curr == '/' && prev == '/' {
                // comment: ignore the rest of the line
                itr.x = 0;
                itr.y += 1;
                if itr.y >= self.line_count() {
                    break;
                }
                last_index = self.last_index(itr.y);
                continue;
            } else if curr == '*' && prev == '/' {
                inside_multiline_comment = true;
            }

            itr.x += 1;
            if itr.x > last_index {
                itr.y += 1;
                itr.x = 0;
                if itr.y >= self.line_count() {
                    break;
                }
                last_index = self.last_index(itr.y);
            }
        }

        None
    }

    fn find_matching_pair_backward(
        &self,
        location: Point,
        matchee: char,
        target: char,
    ) -> Option<Point> {
        if !self.point_on_buffer(location) {
            return None;
        }

        let mut itr = location;
        let mut curr = '\0';
        let mut count = 0i64;
        let mut inside_multiline_comment = false;

        itr.x -= 1;
        if itr.x < 0 {
            itr.y -= 1;
            if itr.y < 0 {
                return None;
            }
            itr.x = self.last_index_before_comment(itr.y);
        }

        while self.point_on_buffer(itr) {
            let prev = curr;
            curr = self.get_char(itr)?;

            if inside_multiline_comment {
                if curr == '*' && prev == '/' {
                    inside_multiline_comment = false;
                }
            } else if curr == target {
                if count == 0 {
                    return Some(itr);
                }
                count -= 1;
            } else if curr == matchee && itr != location {
                count += 1;
            } else if curr == '"' {
                itr = self.find_matching_string_backward(itr, '"')?;
            } else if curr == '\'' {
                itr = self.find_matching_string_backward(itr, '\'')?;
            } else if curr == '/' && prev == '*' {
                inside_multiline_comment = true;
            }

            itr.x -= 1;
            if itr.x < 0 {
                itr.y -= 1;
                if itr.y < 0 {
                    break;
                }
                itr.x = self.last_index_before_comment(itr.y);
            }
        }

        None
    }

    /// Indentation (in columns) a new line at `location` should receive.
    ///
    /// Python reuses the previous non-blank line's indent, one tab deeper
    /// after a trailing `:`. The C family and config files walk backward
    /// for an unmatched `{` (soft-BOL of its line plus one tab) or `(`
    /// (its column plus one), skipping strings and `//` tails.
    pub fn indentation_for_line(&self, location: Point, tab_width: i64) -> i64 {
        match self.file_type {
            FileType::Python => self.python_indentation(location, tab_width),
            ft if ft.is_c_family() => self.brace_indentation(location, tab_width),
            FileType::Config => self.brace_indentation(location, tab_width),
            _ => 0,
        }
    }

    fn python_indentation(&self, location: Point, tab_width: i64) -> i64 {
        for y in (0..=location.y.min(self.line_count() - 1)).rev() {
            let Some(line) = self.line(y) else { continue };
            let trimmed = line.trim_end();
            if trimmed.trim_start().is_empty() {
                continue;
            }
            let indent = line
                .bytes()
                .take_while(|&b| is_blank(b as char))
                .count() as i64;
            return if trimmed.ends_with(':') {
                indent + tab_width
            } else {
                indent
            };
        }
        0
    }

    fn brace_indentation(&self, location: Point, tab_width: i64) -> i64 {
        let mut y = location.y.min(self.line_count() - 1);

        while y >= 0 {
            let mut x = self.last_index_before_comment(y);
            if y == location.y && x > location.x {
                x = location.x - 1;
            }

            while x >= 0 {
                let iter = Point::new(x, y);
                let Some(curr) = self.get_char(iter) else {
                    break;
                };

                match curr {
                    '"' | '\'' => {
                        // skip over the whole string literal
                        let Some(skipped) = self.find_matching_string_backward(iter, curr) else {
                            return 0;
                        };
                        x = skipped.x;
                        y = skipped.y;
                    }
                    '{' => {
                        let matched = self.matching_pair(iter, '{');
                        let unmatched = match matched {
                            None => true,
                            Some(m) => m.after(location) || m == location,
                        };
                        if unmatched {
                            // a line with "{{" should not double-indent
                            let bol = self
                                .soft_beginning_of_line(Point::new(0, y))
                                .map_or(0, |p| p.x);
                            return bol + tab_width;
                        }
                    }
                    '(' => {
                        let matched = self.matching_pair(iter, '(');
                        let unmatched = match matched {
                            None => true,
                            Some(m) => m.after(location) || m == location,
                        };
                        if unmatched {
                            return iter.x + 1;
                        }
                    }
                    _ => {}
                }

                x -= 1;
            }

            y -= 1;
        }
        0
    }
}

/// Whether `index` falls inside an (unescaped) double-quoted string on
/// `string`
pub fn index_inside_string_literal(string: &str, index: i64) -> bool {
    let mut inside = false;
    let mut prev = '\0';

    for (i, byte) in string.bytes().enumerate() {
        if i as i64 > index {
            break;
        }
        let c = byte as char;
        if c == '"' && prev != '\\' {
            inside = !inside;
        }
        prev = c;
    }

    inside
}

#[cfg(test)]
#[path = "motion_tests.rs"]
mod motion_tests;

//! Buffer searches: regex, literal, and word extraction

use regex::Regex;

use crate::buffer::motion::{is_blank, is_punct, is_word_char};
use crate::buffer::Buffer;
use crate::point::{Direction, Point};

impl Buffer {
    /// Find the next regex match from `location` in `direction`.
    ///
    /// Downward takes the leftmost match at or after the start column,
    /// then scans following lines. Upward returns the last match that
    /// starts strictly before the start column, scanning earlier lines
    /// once the start line is exhausted.
    pub fn find_regex(
        &self,
        location: Point,
        regex: &Regex,
        direction: Direction,
    ) -> Option<(Point, i64)> {
        if !self.point_on_buffer(location) {
            return None;
        }

        match direction {
            Direction::Down => {
                let mut y = location.y;
                let mut x = location.x;
                while y < self.line_count() {
                    let line = self.line(y)?;
                    if let Some(m) = regex.find(&line[x as usize..]) {
                        let found = Point::new(x + m.start() as i64, y);
                        return Some((found, (m.end() - m.start()) as i64));
                    }
                    y += 1;
                    x = 0;
                }
                None
            }
            Direction::Up => {
                let mut y = location.y;
                loop {
                    let line = self.line(y)?;
                    // truncate the start line so we never find a forward
                    // match
                    let limit = if y == location.y {
                        location.x as usize
                    } else {
                        line.len()
                    };

                    let mut x = if y == location.y {
                        location.x
                    } else {
                        self.last_index(y)
                    };

                    while x >= 0 {
                        let slice = &line[x as usize..limit.max(x as usize)];
                        if let Some(m) = regex.find(slice) {
                            let found = Point::new(x + m.start() as i64, y);
                            return Some((found, (m.end() - m.start()) as i64));
                        }
                        x -= 1;
                    }

                    y -= 1;
                    if y < 0 {
                        return None;
                    }
                }
            }
        }
    }

    /// Find the next literal occurrence of `needle`, stepping one byte at
    /// a time in `direction`. The needle may not span lines.
    pub fn find_string(
        &self,
        location: Point,
        needle: &str,
        direction: Direction,
    ) -> Option<Point> {
        if needle.is_empty() || self.lines.is_empty() {
            return None;
        }

        let delta: i64 = match direction {
            Direction::Down => 1,
            Direction::Up => -1,
        };

        let mut location = location;
        location.x += delta;

        if location.x < 0 {
            location.y -= 1;
            if location.y < 0 {
                return None;
            }
            location.x = self.line(location.y)?.len() as i64 - 1;
        } else if location.x >= self.line(location.y)?.len() as i64 {
            location.x = 0;
            location.y += 1;
        }

        let end = match direction {
            Direction::Down => self.end_of_file(Point::new(0, 0)),
            Direction::Up => Point::new(0, 0),
        };

        while location != end {
            if location.y < 0 || location.y >= self.line_count() {
                break;
            }
            let line = self.line(location.y)?;
            if location.x >= 0 && (location.x as usize) < line.len() {
                if line[location.x as usize..].starts_with(needle) {
                    return Some(location);
                }
            }

            location.x += delta;

            if location.x < 0 {
                location.y -= 1;
                if location.y < 0 {
                    break;
                }
                location.x = self.line(location.y)?.len() as i64 - 1;
            } else if location.x >= self.line(location.y).map_or(0, |l| l.len() as i64) {
                location.x = 0;
                location.y += 1;
            }
        }

        None
    }

    /// Widest run of characters around `start`/`end` (equal on entry)
    /// matching the predicate. Both endpoints are inclusive.
    pub fn homogenous_adjacents(
        &self,
        location: Point,
        is_homogenous: fn(char) -> bool,
    ) -> Option<(Point, Point)> {
        self.get_char(location)?;

        let mut start = location;
        let mut end = location;

        loop {
            start.x -= 1;
            match self.get_char(start) {
                Some(c) if is_homogenous(c) => {}
                _ => break,
            }
        }
        start.x += 1; // the last character wasn't homogenous

        loop {
            end.x += 1;
            match self.get_char(end) {
                Some(c) if is_homogenous(c) => {}
                _ => break,
            }
        }
        end.x -= 1;

        Some((start, end))
    }

    /// The word under `location`: a run of word characters, punctuation,
    /// or blanks depending on what the cursor sits on
    pub fn word_at_location(&self, location: Point) -> Option<(Point, Point)> {
        let curr = self.get_char(location)?;

        if is_punct(curr) {
            self.homogenous_adjacents(location, is_punct)
        } else if is_blank(curr) {
            self.homogenous_adjacents(location, is_blank)
        } else {
            self.homogenous_adjacents(location, is_word_char)
        }
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;

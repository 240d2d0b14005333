//! Session restore file
//!
//! On exit the editor writes `$HOME/.ce`: the saved `/` register first
//! (a line count, then the literal pattern lines), then one
//! `<name> <cursor_y>` pair per non-readonly buffer. On startup the file
//! is read back; the first field that fails to parse silently ends the
//! restore.

use std::fs;
use std::path::PathBuf;

use regex::Regex;

use crate::point::{Direction, Point};
use crate::registers::{YankMode, SEARCH_REGISTER};
use crate::vim::SearchState;

use super::{locked, Editor};

impl Editor {
    fn session_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".ce"))
    }

    pub(super) fn load_session(&mut self) {
        let Some(path) = Self::session_path() else {
            return;
        };
        let Ok(contents) = fs::read_to_string(&path) else {
            return;
        };

        let mut lines = contents.lines();
        let Some(first) = lines.next() else {
            return;
        };
        let Ok(pattern_lines) = first.trim().parse::<usize>() else {
            return;
        };

        let pattern: Vec<&str> = (0..pattern_lines).filter_map(|_| lines.next()).collect();
        if pattern.len() != pattern_lines {
            return;
        }

        if pattern_lines > 0 {
            let pattern = pattern.join("\n");
            self.vim
                .yanks
                .add(SEARCH_REGISTER, pattern.clone(), YankMode::Normal);
            match Regex::new(&pattern) {
                Ok(regex) => {
                    self.highlight_search = Some(regex.clone());
                    self.vim.search = Some(SearchState {
                        regex,
                        pattern,
                        direction: Direction::Down,
                    });
                }
                Err(error) => {
                    self.message(&format!("session search pattern invalid: {}", error));
                }
            }
        }

        for line in lines {
            let Some((name, cursor_y)) = line.split_once(' ') else {
                break;
            };
            let Ok(cursor_y) = cursor_y.trim().parse::<i64>() else {
                break;
            };

            let Some(handle) = self.find_buffer_by_name(name) else {
                continue;
            };
            let cursor = {
                let mut buffer = locked(&handle);
                let landed = buffer.clamp_cursor(Point::new(0, cursor_y));
                let cursor = buffer
                    .soft_beginning_of_line(landed)
                    .map(|p| buffer.clamp_cursor(p))
                    .unwrap_or(landed);
                buffer.cursor = cursor;
                cursor
            };

            // a view already showing the buffer follows it
            let view_id = self.tabs[self.tab_current]
                .view_head
                .as_ref()
                .and_then(|head| head.find_buffer(&handle))
                .map(|view| view.id);
            if let Some(id) = view_id {
                if let Some(view) = self.tabs[self.tab_current]
                    .view_head
                    .as_mut()
                    .and_then(|head| head.find_mut(id))
                {
                    view.cursor = cursor;
                    let height = view.height();
                    view.top_row = (cursor.y - height / 2).max(0);
                }
            }
        }
    }

    pub(super) fn save_session(&self) {
        let Some(path) = Self::session_path() else {
            return;
        };

        let mut out = String::new();

        match self.vim.yanks.get(SEARCH_REGISTER) {
            Some(yank) => {
                let line_count = yank.text.split('\n').count();
                out.push_str(&format!("{}\n{}\n", line_count, yank.text));
            }
            None => out.push_str("0\n"),
        }

        for entry in &self.buffers {
            let buffer = locked(&entry.buffer);
            if buffer.status == crate::buffer::BufferStatus::ReadOnly {
                continue;
            }

            // a visible view's cursor wins over the buffer's own
            let cursor_y = self.tabs[self.tab_current]
                .view_head
                .as_ref()
                .and_then(|head| head.find_buffer(&entry.buffer))
                .map(|view| view.cursor.y)
                .unwrap_or(buffer.cursor.y);

            out.push_str(&format!("{} {}\n", buffer.name, cursor_y));
        }

        let _ = fs::write(path, out);
    }
}

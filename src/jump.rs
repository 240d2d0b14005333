//! Per-view jump list
//!
//! Long motions (searches, mark gotos, file begin/end, destination jumps)
//! push the pre-jump position here; Ctrl-O / Ctrl-I walk it.

use crate::point::Point;

pub const JUMP_LIST_MAX: usize = 32;

/// A recorded file + position pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Jump {
    pub filepath: String,
    pub location: Point,
}

/// Fixed-size ring of jumps with a traversal cursor
#[derive(Debug, Default)]
pub struct JumpList {
    jumps: [Jump; JUMP_LIST_MAX],
    current: usize,
}

impl JumpList {
    pub fn new() -> Self {
        JumpList::default()
    }

    /// Record a jump at the cursor, clearing any forward history. When
    /// the ring is full the oldest entry falls off the front.
    pub fn insert(&mut self, filepath: &str, location: Point) {
        let next_index = self.current + 1;

        if next_index < JUMP_LIST_MAX - 1 {
            self.jumps[self.current] = Jump {
                filepath: filepath.to_string(),
                location,
            };

            // clear all jumps afterwards
            for jump in &mut self.jumps[next_index..] {
                jump.filepath.clear();
            }

            self.current = next_index;
        } else {
            self.jumps.rotate_left(1);
            self.jumps[self.current] = Jump {
                filepath: filepath.to_string(),
                location,
            };
        }
    }

    /// Step back in the jump history
    pub fn to_previous(&mut self) -> Option<&Jump> {
        if self.current == 0 {
            return None; // history is empty
        }

        let jump_index = self.current - 1;
        if self.jumps[jump_index].filepath.is_empty() {
            return None;
        }

        self.current = jump_index;
        Some(&self.jumps[jump_index])
    }

    /// Step forward in the jump history
    pub fn to_next(&mut self) -> Option<&Jump> {
        if self.current >= JUMP_LIST_MAX - 1 {
            return None;
        }

        let jump_index = self.current + 1;
        if self.jumps[jump_index].filepath.is_empty() {
            return None;
        }

        self.current = jump_index;
        Some(&self.jumps[jump_index])
    }
}

//! Prompt input history
//!
//! The search and command prompts each own one of these. Entries append
//! at the tail; the cursor walks back and forth while the user browses
//! with the arrow keys, and committing a new entry snaps it to the end.

pub struct InputHistory {
    entries: Vec<String>,
    current: usize,
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHistory {
    pub fn new() -> Self {
        // one scratch entry so the cursor always points at something
        InputHistory {
            entries: vec![String::new()],
            current: 0,
        }
    }

    /// Text under the history cursor
    pub fn current(&self) -> &str {
        &self.entries[self.current]
    }

    /// Update the scratch entry at the tail with in-progress input
    pub fn update_current(&mut self, text: &str) {
        let last = self.entries.len() - 1;
        self.entries[last] = text.to_string();
    }

    /// Commit the tail entry and open a fresh scratch slot
    pub fn commit(&mut self) {
        self.entries.push(String::new());
        self.current = self.entries.len() - 1;
    }

    /// Step to the older entry, if any
    pub fn prev(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Step to the newer entry, if any
    pub fn next(&mut self) -> bool {
        if self.current + 1 >= self.entries.len() {
            return false;
        }
        self.current += 1;
        true
    }

    /// Reset the cursor to the scratch tail
    pub fn reset(&mut self) {
        self.current = self.entries.len() - 1;
    }
}

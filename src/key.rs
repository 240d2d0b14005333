//! Key representation for editor input

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// Represents a key press event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable character
    Char(char),
    /// Control key combination (e.g., Ctrl+A)
    Ctrl(u8),
    /// Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// Navigation keys
    Home,
    End,
    PageUp,
    PageDown,
    /// Editing keys
    Backspace,
    Delete,
    Enter,
    Escape,
    Tab,
    /// Function keys
    F(u8),
    /// System events
    Resize(u16, u16),
}

impl Key {
    /// Translate a crossterm event into a `Key`, if it maps onto the
    /// surface the editor understands.
    pub fn from_event(event: Event) -> Option<Key> {
        match event {
            Event::Key(KeyEvent {
                code, modifiers, ..
            }) => Self::from_code(code, modifiers),
            Event::Resize(cols, rows) => Some(Key::Resize(cols, rows)),
            _ => None,
        }
    }

    fn from_code(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
        match code {
            KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => {
                let b = c.to_ascii_lowercase() as u8;
                b.is_ascii_lowercase().then_some(Key::Ctrl(b))
            }
            KeyCode::Char(c) => Some(Key::Char(c)),
            KeyCode::Up => Some(Key::ArrowUp),
            KeyCode::Down => Some(Key::ArrowDown),
            KeyCode::Left => Some(Key::ArrowLeft),
            KeyCode::Right => Some(Key::ArrowRight),
            KeyCode::Home => Some(Key::Home),
            KeyCode::End => Some(Key::End),
            KeyCode::PageUp => Some(Key::PageUp),
            KeyCode::PageDown => Some(Key::PageDown),
            KeyCode::Backspace => Some(Key::Backspace),
            KeyCode::Delete => Some(Key::Delete),
            KeyCode::Enter => Some(Key::Enter),
            KeyCode::Esc => Some(Key::Escape),
            KeyCode::Tab => Some(Key::Tab),
            KeyCode::F(n) => Some(Key::F(n as u8)),
            _ => None,
        }
    }

    /// Convert key to VT100/xterm byte sequence for PTY input.
    ///
    /// Sequences follow the CSI (Control Sequence Introducer) convention:
    ///   - Cursor keys:  ESC [ {suffix}   e.g. ESC [ A  (up)
    ///   - Tilde keys:   ESC [ {num} ~    e.g. ESC [ 3 ~  (delete)
    ///   - Single byte:  direct control character
    pub fn to_vt100_bytes(&self) -> Vec<u8> {
        match self {
            // Printable character, 7-bit only
            Key::Char(c) => vec![*c as u8],

            // Ctrl+key masks to the control range (0x00-0x1F)
            Key::Ctrl(c) => vec![c & 0x1f],

            // Single-byte control characters
            Key::Backspace => vec![0x7f],
            Key::Enter => vec![b'\r'],
            Key::Escape => vec![0x1b],
            Key::Tab => vec![b'\t'],

            // CSI cursor keys: ESC [ {suffix}
            Key::ArrowUp => csi(b'A'),
            Key::ArrowDown => csi(b'B'),
            Key::ArrowRight => csi(b'C'),
            Key::ArrowLeft => csi(b'D'),
            Key::Home => csi(b'H'),
            Key::End => csi(b'F'),

            // CSI tilde keys: ESC [ {num} ~
            Key::Delete => csi_tilde(3),
            Key::PageUp => csi_tilde(5),
            Key::PageDown => csi_tilde(6),

            // Non-input events produce no bytes
            Key::F(..) | Key::Resize(..) => vec![],
        }
    }
}

/// Build a CSI sequence: `ESC [ {suffix}`
fn csi(suffix: u8) -> Vec<u8> {
    vec![0x1b, b'[', suffix]
}

/// Build a CSI tilde sequence: `ESC [ {num} ~`
fn csi_tilde(num: u8) -> Vec<u8> {
    vec![0x1b, b'[', b'0' + num, b'~']
}

//! File-destination parsing for terminal output
//!
//! Lines in a terminal buffer are scanned for three shapes of
//! compiler/tool output and turned into jump targets:
//!
//! - unified diff: `@@ -1633,9 +1636,26 @@` under a `--- a/path` or
//!   `+++ b/path` header
//! - valgrind: `==7330==    by 0x638B16A: frame (path.c:1983)`
//! - compiler / grep: `path:line:col: message` (or `path symbol line`)
//!
//! Relative paths resolve against the shell's current directory; a
//! destination only parses if the file actually exists.

use std::path::{Path, PathBuf};

use crate::buffer::Buffer;

/// A parsed jump target; `line` and `column` are 1-indexed as printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub path: PathBuf,
    pub line: i64,
    pub column: Option<i64>,
}

/// Parse the destination named on `line` of a terminal buffer
pub fn find_destination(buffer: &Buffer, line: i64, cwd: &Path) -> Option<Destination> {
    let text = buffer.line(line)?;

    if text.starts_with("@@") {
        parse_diff(buffer, line, cwd)
    } else if text.starts_with("==") {
        parse_valgrind(text, cwd)
    } else {
        parse_compiler(text, cwd)
    }
}

fn resolve(cwd: &Path, name: &str) -> Option<PathBuf> {
    let path = if name.starts_with('/') {
        PathBuf::from(name)
    } else {
        cwd.join(name)
    };
    path.is_file().then_some(path)
}

/// `@@ -old,len +new,len @@` with the filename on a preceding
/// `--- a/...` or `+++ b/...` header
fn parse_diff(buffer: &Buffer, line: i64, cwd: &Path) -> Option<Destination> {
    let mut file_line = line - 1;
    while file_line >= 0 {
        let header = buffer.line(file_line)?;
        if header.starts_with("---") || header.starts_with("+++") {
            break;
        }
        file_line -= 1;
    }
    if file_line < 0 {
        return None;
    }

    // --- a/ce.c  ->  ce.c
    let header = buffer.line(file_line)?;
    let slash = header.find('/')?;
    let path = resolve(cwd, &header[slash + 1..])?;

    let text = buffer.line(line)?;
    let plus = text.find('+')?;
    let comma = text[plus + 1..].find(',')?;
    let line_number: i64 = text[plus + 1..plus + 1 + comma].parse().ok()?;

    Some(Destination {
        path,
        line: line_number,
        column: None,
    })
}

/// `==pid==    by 0xADDR: frame (path:line)`
fn parse_valgrind(text: &str, cwd: &Path) -> Option<Destination> {
    let open_paren = text.find('(')?;
    let close_paren = text.find(')')?;
    if close_paren <= open_paren {
        return None;
    }

    let inner = &text[open_paren + 1..close_paren];
    let colon = inner.find(':')?;
    let path = resolve(cwd, &inner[..colon])?;
    let line_number: i64 = inner[colon + 1..].parse().ok()?;

    Some(Destination {
        path,
        line: line_number,
        column: None,
    })
}

/// `path:line:col: message` or `path symbol line `
fn parse_compiler(text: &str, cwd: &Path) -> Option<Destination> {
    let file_end = text.find(|c| c == ':' || c == ' ')?;
    let path = resolve(cwd, &text[..file_end])?;

    let (line_str, rest) = if text.as_bytes()[file_end] == b' ' {
        // 'filepath search_symbol line '
        let after = &text[file_end + 1..];
        let second_space = after.find(' ')?;
        let tail = &after[second_space + 1..];
        let end = tail.find(' ')?;
        (&tail[..end], &tail[end + 1..])
    } else {
        // 'filepath:line:column:'
        let after = &text[file_end + 1..];
        let second_colon = after.find(':')?;
        (&after[..second_colon], &after[second_colon + 1..])
    };

    let line_number: i64 = line_str.parse().ok()?;

    // optional column before a further colon
    let column = rest
        .find(':')
        .and_then(|end| rest[..end].parse::<i64>().ok());

    Some(Destination {
        path,
        line: line_number,
        column,
    })
}

#[cfg(test)]
#[path = "destination_tests.rs"]
mod tests;

//! Source text utilities: line/column lookup and debug-trace verbosity.

use once_cell::unsync::OnceCell;
use std::fmt::{Display, Formatter};

/// A 1-indexed line and column pair.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Source text addressed by byte offset, with lazily computed line breaks.
///
/// Lexing and parsing both report positions as plain byte offsets; `Code`
/// translates an offset into a [`Position`] only when an error needs to be
/// rendered.
pub struct Code<'c> {
    pub value: &'c str,
    line_breaks: OnceCell<Vec<usize>>,
}

impl<'c> From<&'c str> for Code<'c> {
    fn from(value: &'c str) -> Self {
        Code::new(value)
    }
}

impl<'c> Code<'c> {
    pub fn new(value: &'c str) -> Self {
        Self {
            value,
            line_breaks: OnceCell::new(),
        }
    }

    fn line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.value
                .char_indices()
                .filter_map(|(index, c)| if c == '\n' { Some(index) } else { None })
                .collect()
        })
    }

    /// Translate a byte offset into the source into a line/column position.
    pub fn position_at(&self, offset: usize) -> Position {
        let line_breaks = self.line_breaks();
        let index = match line_breaks.binary_search(&offset) {
            Ok(index) | Err(index) => index,
        };

        if index == 0 {
            Position::new(1, offset + 1)
        } else {
            let break_point = line_breaks[index - 1] + 1;
            Position::new(index + 1, offset - break_point + 1)
        }
    }

    /// Extract the source line (1-indexed) without its trailing newline.
    pub fn line(&self, line_number: usize) -> &'c str {
        let line_breaks = self.line_breaks();
        let start = if line_number <= 1 {
            0
        } else {
            line_breaks
                .get(line_number - 2)
                .map(|b| b + 1)
                .unwrap_or(self.value.len())
        };
        let end = line_breaks
            .get(line_number - 1)
            .copied()
            .unwrap_or(self.value.len());
        if start > end {
            ""
        } else {
            &self.value[start..end]
        }
    }

    /// Render `±k` lines of context around `line_number`, used for syntax error excerpts.
    pub fn excerpt(&self, line_number: usize, k: usize) -> String {
        let total_lines = self.line_breaks().len() + 1;
        let lo = line_number.saturating_sub(k).max(1);
        let hi = (line_number + k).min(total_lines);
        let mut out = String::new();
        for n in lo..=hi {
            let marker = if n == line_number { ">" } else { " " };
            out.push_str(&format!("{} {:>4} | {}\n", marker, n, self.line(n)));
        }
        out
    }
}

/// Verbosity level for the `#[cfg(debug_assertions)]`-gated trace output emitted
/// while building LR(1) tables (`Table::build_traced`/`ParseTable::build_traced`).
/// Ordered low to high.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub enum Trace {
    #[default]
    None,
    Default,
    Verbose,
}

impl Trace {
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    pub(crate) fn enabled(self, at: Trace) -> bool {
        self >= at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_at_tracks_lines() {
        let code = Code::new("ab\ncd\nef");
        assert_eq!(code.position_at(0), Position::new(1, 1));
        assert_eq!(code.position_at(3), Position::new(2, 1));
        assert_eq!(code.position_at(7), Position::new(3, 2));
    }

    #[test]
    fn line_extracts_without_newline() {
        let code = Code::new("ab\ncd\nef");
        assert_eq!(code.line(1), "ab");
        assert_eq!(code.line(2), "cd");
        assert_eq!(code.line(3), "ef");
    }
}

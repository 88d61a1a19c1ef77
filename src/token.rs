//! The token contract shared by the lexer, the parser generator, and the
//! parser driver (§3).

use std::fmt::{self, Display, Formatter};

/// A labeled slice of source text. `start_line`/`end_line` are 1-indexed and
/// may differ when a token's lexeme spans a newline (e.g. a multi-line string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub label: String,
    pub lexeme: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl Token {
    pub fn new(
        label: impl Into<String>,
        lexeme: impl Into<String>,
        start_line: usize,
        end_line: usize,
    ) -> Self {
        Self {
            label: label.into(),
            lexeme: lexeme.into(),
            start_line,
            end_line,
        }
    }

    /// The reserved label the driver uses once the lexer is exhausted.
    pub const END_SYM: &'static str = "END_SYM";
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", self.label, self.lexeme)
    }
}

//! Error kinds produced by each stage of the pipeline (§7).
//!
//! Every stage raises its own narrow error type; [`Error`] unifies them for
//! callers (the CLI, the REPL) that just need to report a failure and move on.

use std::fmt::{self, Display, Formatter};

/// Raised when no lexer rule matches at a non-empty cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub fragment: String,
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LexError: no rule matches at line {}: \"{}\"",
            self.line, self.fragment
        )
    }
}

/// Raised when a grammar cannot be built: unresolved conflicts, or a
/// malformed `.tok`/`.syn` specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecError {
    pub message: String,
}

impl SpecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SpecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SpecError: {}", self.message)
    }
}

/// Raised by the parser driver on an empty action cell, by the evaluator on
/// arity mismatches, and for `return`/`break` used outside their enclosing
/// construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: Option<usize>,
    pub message: String,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    pub fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "SyntaxError: line {}: {}", line, self.message),
            None => write!(f, "SyntaxError: {}", self.message),
        }
    }
}

/// Raised when an identifier has no binding in any enclosing frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameError {
    pub name: String,
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "NameError: name \"{}\" is not defined", self.name)
    }
}

/// Raised when a value has the wrong shape for an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    pub message: String,
}

impl TypeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TypeError: {}", self.message)
    }
}

/// Raised for an out-of-bounds array index, or a range built over a non-Number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexError {
    pub message: String,
}

impl IndexError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "IndexError: {}", self.message)
    }
}

/// Raised on division by zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticError {
    pub message: String,
}

impl Display for ArithmeticError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ArithmeticError: {}", self.message)
    }
}

/// The union of every error this crate can raise, used wherever a caller
/// needs to report a failure without caring which stage produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Lex(LexError),
    Spec(SpecError),
    Syntax(SyntaxError),
    Name(NameError),
    Type(TypeError),
    Index(IndexError),
    Arithmetic(ArithmeticError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(e) => write!(f, "{}", e),
            Error::Spec(e) => write!(f, "{}", e),
            Error::Syntax(e) => write!(f, "{}", e),
            Error::Name(e) => write!(f, "{}", e),
            Error::Type(e) => write!(f, "{}", e),
            Error::Index(e) => write!(f, "{}", e),
            Error::Arithmetic(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<LexError> for Error {
    fn from(e: LexError) -> Self {
        Error::Lex(e)
    }
}
impl From<SpecError> for Error {
    fn from(e: SpecError) -> Self {
        Error::Spec(e)
    }
}
impl From<SyntaxError> for Error {
    fn from(e: SyntaxError) -> Self {
        Error::Syntax(e)
    }
}
impl From<NameError> for Error {
    fn from(e: NameError) -> Self {
        Error::Name(e)
    }
}
impl From<TypeError> for Error {
    fn from(e: TypeError) -> Self {
        Error::Type(e)
    }
}
impl From<IndexError> for Error {
    fn from(e: IndexError) -> Self {
        Error::Index(e)
    }
}
impl From<ArithmeticError> for Error {
    fn from(e: ArithmeticError) -> Self {
        Error::Arithmetic(e)
    }
}

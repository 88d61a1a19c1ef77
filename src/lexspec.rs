//! Parsing of the `.tok` lexer specification format (§4.1, §6).
//!
//! Each non-comment, non-blank line reads as `label = literal` or
//! `label [:|<] pattern`. `<` marks a rule whose match is consumed but never
//! emitted as a token (used for whitespace and comments).

use crate::error::SpecError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleBody {
    Literal(String),
    Pattern(String),
}

/// One parsed line of a `.tok` file, before its pattern has been compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRule {
    pub label: String,
    pub body: RuleBody,
    /// Whether a match is emitted as a `Token`. `false` for `<`-separated rules.
    pub emit: bool,
}

/// A parsed `.tok` specification: every declared rule, in source order.
#[derive(Debug, Clone, Default)]
pub struct LexSpec {
    pub rules: Vec<TokenRule>,
}

impl LexSpec {
    pub fn parse(source: &str) -> Result<Self, SpecError> {
        let mut rules = Vec::new();
        for (lineno, raw_line) in source.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (label, rest) = split_first_word(line).ok_or_else(|| {
                SpecError::new(format!(
                    "line {}: expected \"label [=|:|<] value\" but got \"{}\"",
                    lineno + 1,
                    raw_line
                ))
            })?;
            let (sep, value) = split_first_word(rest).ok_or_else(|| {
                SpecError::new(format!(
                    "line {}: expected \"label [=|:|<] value\" but got \"{}\"",
                    lineno + 1,
                    raw_line
                ))
            })?;

            if value.is_empty() {
                return Err(SpecError::new(format!(
                    "line {}: rule for \"{}\" has no value",
                    lineno + 1,
                    label
                )));
            }

            let (body, emit) = match sep {
                "=" => (RuleBody::Literal(value.to_string()), true),
                ":" => (RuleBody::Pattern(value.to_string()), true),
                "<" => (RuleBody::Pattern(value.to_string()), false),
                other => {
                    return Err(SpecError::new(format!(
                        "line {}: unknown separator \"{}\", expected one of \"=\", \":\", \"<\"",
                        lineno + 1,
                        other
                    )))
                }
            };

            rules.push(TokenRule {
                label: label.to_string(),
                body,
                emit,
            });
        }
        Ok(Self { rules })
    }
}

/// Split `s` at its first run of whitespace, returning the leading word and
/// the (whitespace-trimmed) remainder.
fn split_first_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace)?;
    Some((&s[..end], s[end..].trim_start()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_and_pattern_rules() {
        let spec = LexSpec::parse(
            "# comment\nplus = +\nnum : [0-9]+\nws < \\s+\n",
        )
        .unwrap();
        assert_eq!(spec.rules.len(), 3);
        assert_eq!(spec.rules[0].label, "plus");
        assert_eq!(spec.rules[0].body, RuleBody::Literal("+".into()));
        assert!(spec.rules[0].emit);
        assert_eq!(spec.rules[2].label, "ws");
        assert!(!spec.rules[2].emit);
    }

    #[test]
    fn rejects_unknown_separator() {
        assert!(LexSpec::parse("num ? [0-9]+").is_err());
    }

    #[test]
    fn rejects_missing_value() {
        assert!(LexSpec::parse("num :").is_err());
    }
}

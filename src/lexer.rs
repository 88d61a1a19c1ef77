//! The table-driven lexer (§4.1).
//!
//! A [`Lexer`] is built once from a [`LexSpec`] and then reused to tokenize
//! any number of source strings. At each cursor position every literal rule
//! is tried first, in declaration order, and the first one whose text is a
//! prefix of the remaining input wins; only if no literal matches are the
//! pattern rules tried, again in declaration order, first match wins. There
//! is no length comparison at any point, so a literal rule shadows a longer
//! pattern match it happens to prefix (e.g. the keyword `if` shadows the
//! identifier `ifx`) — a spec author orders overlapping literals
//! longest-first to get the token they mean (`...` before `..`, `==` before
//! `=`).

use regex::Regex;

use crate::error::LexError;
use crate::lexspec::{LexSpec, RuleBody};
use crate::token::Token;

enum CompiledRule {
    Literal { label: String, text: String, emit: bool },
    Pattern { label: String, regex: Regex, emit: bool },
}

/// A compiled lexer ready to tokenize source text.
pub struct Lexer {
    literals: Vec<CompiledRule>,
    patterns: Vec<CompiledRule>,
}

impl Lexer {
    pub fn build(spec: &LexSpec) -> Result<Self, LexError> {
        let mut literals = Vec::new();
        let mut patterns = Vec::new();

        for rule in &spec.rules {
            match &rule.body {
                RuleBody::Literal(text) => literals.push(CompiledRule::Literal {
                    label: rule.label.clone(),
                    text: text.clone(),
                    emit: rule.emit,
                }),
                RuleBody::Pattern(pattern) => {
                    // Anchor at the cursor: the caller only ever matches against
                    // the unconsumed suffix of the source.
                    let anchored = format!("^(?:{})", pattern);
                    let regex = Regex::new(&anchored).map_err(|err| LexError {
                        line: 0,
                        fragment: format!("invalid pattern \"{}\" for \"{}\": {}", pattern, rule.label, err),
                    })?;
                    patterns.push(CompiledRule::Pattern {
                        label: rule.label.clone(),
                        regex,
                        emit: rule.emit,
                    });
                }
            }
        }

        Ok(Self { literals, patterns })
    }

    /// Tokenize `source` left to right. Whitespace and comment rules (those
    /// with `emit = false`) are matched and skipped but never appear in the
    /// returned stream.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut cursor = 0usize;
        let mut line = 1usize;

        while cursor < source.len() {
            let remaining = &source[cursor..];
            let (label, emit, matched_len, lexeme) = self.match_at(remaining).ok_or_else(|| LexError {
                line,
                fragment: remaining.lines().next().unwrap_or("").to_string(),
            })?;

            if matched_len == 0 {
                return Err(LexError {
                    line,
                    fragment: remaining.lines().next().unwrap_or("").to_string(),
                });
            }

            let consumed = &remaining[..matched_len];
            let start_line = line;
            line += consumed.matches('\n').count();

            if emit {
                tokens.push(Token::new(label, lexeme, start_line, line));
            }
            cursor += matched_len;
        }

        Ok(tokens)
    }

    /// Find the rule that matches at the start of `remaining`: every literal
    /// is tried first, in declaration order, and the first whose text
    /// prefixes `remaining` wins; only if none match are the patterns tried,
    /// again in declaration order, first match wins.
    fn match_at<'s>(&self, remaining: &'s str) -> Option<(&str, bool, usize, &'s str)> {
        for rule in &self.literals {
            if let CompiledRule::Literal { label, text, emit } = rule {
                if remaining.starts_with(text.as_str()) {
                    return Some((label.as_str(), *emit, text.len(), &remaining[..text.len()]));
                }
            }
        }

        for rule in &self.patterns {
            if let CompiledRule::Pattern { label, regex, emit } = rule {
                if let Some(caps) = regex.captures(remaining) {
                    let whole = caps.get(0).unwrap();
                    debug_assert_eq!(whole.start(), 0);
                    let lexeme = caps.name("val").map(|m| m.as_str()).unwrap_or(whole.as_str());
                    return Some((label.as_str(), *emit, whole.end(), lexeme));
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(spec: &str) -> Lexer {
        Lexer::build(&LexSpec::parse(spec).unwrap()).unwrap()
    }

    #[test]
    fn earlier_declared_literal_wins_over_a_later_overlapping_one() {
        let lexer = build("eq = ==\nassign = =\n");
        let tokens = lexer.tokenize("==").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].label, "eq");
    }

    #[test]
    fn declaration_order_beats_match_length() {
        // "short" is declared before "long" and is a prefix of it, so it wins
        // even though "long" would consume more of the input. Overlapping
        // literals must be declared longest-first to get the longer token.
        let lexer = build("short = =\nlong = ==\n");
        let tokens = lexer.tokenize("==").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].label, "short");
        assert_eq!(tokens[1].label, "short");
    }

    #[test]
    fn skips_suppressed_rules() {
        let lexer = build("ws < [ \\t]+\nnum : [0-9]+\n");
        let tokens = lexer.tokenize("1 2").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "1");
        assert_eq!(tokens[1].lexeme, "2");
    }

    #[test]
    fn named_group_selects_lexeme() {
        let lexer = build(r#"str : "(?P<val>[^"]*)""#);
        let tokens = lexer.tokenize("\"hi\"").unwrap();
        assert_eq!(tokens[0].lexeme, "hi");
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let lexer = build("nl < \\n\nnum : [0-9]+\n");
        let tokens = lexer.tokenize("1\n2").unwrap();
        assert_eq!(tokens[0].start_line, 1);
        assert_eq!(tokens[1].start_line, 2);
    }

    #[test]
    fn errors_on_unmatched_input() {
        let lexer = build("num : [0-9]+\n");
        let err = lexer.tokenize("abc").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn keyword_literal_shadows_a_longer_identifier_it_prefixes() {
        // Literals are tried before patterns with no length comparison, so
        // "if" matches the first two letters of "ifx" and the rest is
        // lexed separately as an identifier.
        let lexer = build("if = if\nid : [a-zA-Z_][a-zA-Z0-9_]*\nws < [ ]+\n");
        let tokens = lexer.tokenize("ifx").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].label, "if");
        assert_eq!(tokens[1].label, "id");
        assert_eq!(tokens[1].lexeme, "x");
    }
}

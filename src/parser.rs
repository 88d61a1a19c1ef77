//! The shift/reduce/accept parser driver (§4.3).
//!
//! Drives a [`ParseTable`] over a token stream with a state stack and a
//! parallel node stack. Once the real tokens are exhausted the driver treats
//! every further lookahead as the synthetic [`Token::END_SYM`] symbol, which
//! lets the augmented grammar's trailing `END_SYM` terminal be shifted like
//! any other token before the accepting state is reached.

use crate::cst::Node;
use crate::error::SyntaxError;
use crate::source::Code;
use crate::table::{Entry, ParseTable};
use crate::token::Token;

pub struct Parser<'t> {
    table: &'t ParseTable,
}

impl<'t> Parser<'t> {
    pub fn new(table: &'t ParseTable) -> Self {
        Self { table }
    }

    /// Parse `tokens` (as lexed from `code`) into a raw CST. Does not apply
    /// `K`/`C` normalization; call [`crate::cst::normalize`] on the result.
    pub fn parse(&self, tokens: &[Token], code: &Code) -> Result<Node, SyntaxError> {
        let mut state_stack = vec![self.table.start_state];
        let mut node_stack: Vec<Node> = Vec::new();
        let mut pos = 0usize;
        let eof_line = code.value.lines().count().max(1);

        loop {
            let current = tokens.get(pos);
            let (label, lexeme, start_line, end_line): (&str, &str, usize, usize) = match current {
                Some(t) => (t.label.as_str(), t.lexeme.as_str(), t.start_line, t.end_line),
                None => (Token::END_SYM, "", eof_line, eof_line),
            };

            let state = *state_stack.last().expect("state stack is never empty");
            match self.table.action(state, label) {
                Some(Entry::Shift(target)) => {
                    node_stack.push(Node::Terminal {
                        label: label.to_string(),
                        lexeme: lexeme.to_string(),
                        start_line,
                        end_line,
                    });
                    state_stack.push(target);
                    if current.is_some() {
                        pos += 1;
                    }
                }
                Some(Entry::Reduce(production)) => {
                    let (lhs, arity) = &self.table.productions[production];
                    let mut children = Vec::with_capacity(*arity);
                    for _ in 0..*arity {
                        state_stack.pop();
                        children.push(node_stack.pop().expect("reduction arity matches stacked children"));
                    }
                    children.reverse();

                    let uncovered = *state_stack.last().expect("state stack is never empty");
                    let next = self
                        .table
                        .goto(uncovered, lhs)
                        .expect("a reachable reduction always has a goto entry for its lhs");
                    node_stack.push(Node::Nonterminal {
                        label: lhs.clone(),
                        children,
                    });
                    state_stack.push(next);
                }
                Some(Entry::Accept) => {
                    return Ok(node_stack.pop().expect("the accepting reduction leaves exactly one node"));
                }
                None => {
                    let line = current.map(|t| t.start_line).unwrap_or(eof_line);
                    let what = match current {
                        Some(t) => format!("{}", t),
                        None => "end of input".to_string(),
                    };
                    return Err(SyntaxError::at(
                        line,
                        format!("unexpected {}\n{}", what, code.excerpt(line, 2)),
                    ));
                }
            }
        }
    }
}

//! The concrete syntax tree produced by the parser driver, and its
//! normalization into an abstract syntax tree via the keep-terminal set `K`
//! and contract-nonterminal set `C` (§4.3).
//!
//! Normalization is a splice, not a unit-rule unwrap: a nonterminal whose
//! label is in `C` is discarded unconditionally and whatever AST nodes its
//! children normalized to are spliced directly into its parent's child list,
//! however many there are. A grammar only gets the tidy "wrapper vanishes"
//! effect from this when every alternative of that nonterminal normalizes to
//! exactly one child; nonterminals whose arity varies by alternative (most
//! operator-precedence levels) are left out of `C` so their shape stays
//! intact for the evaluator to dispatch on.

use std::borrow::Cow;
use std::io;

use ptree::{Style, TreeItem};

use crate::grammar::Grammar;

/// A CST/AST node. Before normalization every reduction produces a
/// `Nonterminal` wrapping its children verbatim and every shift produces a
/// `Terminal`; after normalization, terminals not in `K` are gone and
/// nonterminals in `C` with a single surviving child have been replaced by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Terminal {
        label: String,
        lexeme: String,
        start_line: usize,
        end_line: usize,
    },
    Nonterminal {
        label: String,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn label(&self) -> &str {
        match self {
            Node::Terminal { label, .. } => label,
            Node::Nonterminal { label, .. } => label,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Terminal { .. } => &[],
            Node::Nonterminal { children, .. } => children,
        }
    }

    pub fn as_lexeme(&self) -> Option<&str> {
        match self {
            Node::Terminal { lexeme, .. } => Some(lexeme),
            Node::Nonterminal { .. } => None,
        }
    }
}

/// Normalize a raw CST into its AST. The start symbol is never in `C`, so
/// this always yields exactly one root node.
pub fn normalize(node: Node, grammar: &Grammar) -> Node {
    let mut roots = splice(node, grammar);
    assert_eq!(roots.len(), 1, "the start symbol is never a contract-nonterminal");
    roots.pop().unwrap()
}

/// Normalize one CST node into the AST nodes it contributes to its parent's
/// child list: a dropped terminal contributes none, a kept terminal
/// contributes itself, and a nonterminal's own (already-spliced) children
/// are either wrapped back up under its label, or — if the label is in `C`
/// — spliced straight into the caller's list in its place.
fn splice(node: Node, grammar: &Grammar) -> Vec<Node> {
    match node {
        Node::Terminal {
            label,
            lexeme,
            start_line,
            end_line,
        } => {
            if grammar.keep.contains(&label) {
                vec![Node::Terminal {
                    label,
                    lexeme,
                    start_line,
                    end_line,
                }]
            } else {
                vec![]
            }
        }
        Node::Nonterminal { label, children } => {
            let children: Vec<Node> = children.into_iter().flat_map(|c| splice(c, grammar)).collect();
            if grammar.contract.contains(&label) {
                children
            } else {
                vec![Node::Nonterminal { label, children }]
            }
        }
    }
}

impl TreeItem for Node {
    type Child = Node;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        match self {
            Node::Terminal { label, lexeme, .. } => {
                write!(f, "{}", style.paint(format!("{}(\"{}\")", label, lexeme)))
            }
            Node::Nonterminal { label, .. } => write!(f, "{}", style.paint(label)),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        match self {
            Node::Terminal { .. } => Cow::Owned(Vec::new()),
            Node::Nonterminal { children, .. } => Cow::Owned(children.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn grammar_with(keep: &[&str], contract: &[&str]) -> Grammar {
        use crate::grammar::{Rhs, Symbol};
        Grammar::new(
            "S".to_string(),
            vec![("S".to_string(), Rhs::new(vec![Symbol::Nonterminal("T".to_string())]))],
            keep.iter().map(|s| s.to_string()).collect(),
            contract.iter().map(|s| s.to_string()).collect(),
            HashMap::new(),
            HashMap::new(),
        )
        .unwrap()
    }

    fn term(label: &str, lexeme: &str) -> Node {
        Node::Terminal {
            label: label.to_string(),
            lexeme: lexeme.to_string(),
            start_line: 1,
            end_line: 1,
        }
    }

    #[test]
    fn drops_terminals_outside_keep_set() {
        let g = grammar_with(&["num"], &[]);
        let tree = Node::Nonterminal {
            label: "S".to_string(),
            children: vec![term(";", ";"), term("num", "1")],
        };
        let normalized = normalize(tree, &g);
        assert_eq!(normalized.children().len(), 1);
        assert_eq!(normalized.children()[0].as_lexeme(), Some("1"));
    }

    #[test]
    fn contracts_single_child_nonterminal() {
        let g = grammar_with(&["num"], &["Expr"]);
        let tree = Node::Nonterminal {
            label: "S".to_string(),
            children: vec![Node::Nonterminal {
                label: "Expr".to_string(),
                children: vec![term("num", "1")],
            }],
        };
        let normalized = normalize(tree, &g);
        assert_eq!(normalized.children()[0].label(), "num");
    }

    #[test]
    fn splices_contract_nonterminal_with_multiple_children_into_its_parent() {
        let g = grammar_with(&["num", "+"], &["Expr"]);
        let tree = Node::Nonterminal {
            label: "S".to_string(),
            children: vec![Node::Nonterminal {
                label: "Expr".to_string(),
                children: vec![term("num", "1"), term("+", "+"), term("num", "2")],
            }],
        };
        let normalized = normalize(tree, &g);
        assert_eq!(normalized.children().len(), 3);
        assert_eq!(normalized.children()[0].label(), "num");
        assert_eq!(normalized.children()[1].label(), "+");
        assert_eq!(normalized.children()[2].label(), "num");
    }
}

//! Grammar data model: symbols, productions, and the FIRST/nullable
//! fixed-point computation that the LR(1) table builder's closure/goto
//! depend on (§3, §4.2).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::{self, Display, Formatter};

use crate::error::SpecError;

/// The reserved name for the augmenting start production's left-hand side.
pub const START_SYM: &str = "START_SYM";
/// The reserved name for the end-of-input marker.
pub const END_SYM: &str = "END_SYM";
/// The reserved keyword denoting an epsilon production in a `.syn` spec.
pub const EMPTY: &str = "EMPTY";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => write!(f, "{}", t),
            Symbol::Nonterminal(n) => write!(f, "{}", n),
        }
    }
}

/// One alternative (`β`) of a production, already split into symbols. An
/// empty `body` denotes the `EMPTY` (epsilon) alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rhs {
    pub body: Vec<Symbol>,
}

impl Rhs {
    pub fn new(body: Vec<Symbol>) -> Self {
        Self { body }
    }

    /// The rule-precedence terminal used to resolve shift/reduce conflicts:
    /// the last terminal appearing in the body, or `None` if the body has no
    /// terminal (§4.2).
    pub fn precedence_terminal(&self) -> Option<&str> {
        self.body.iter().rev().find_map(|sy| match sy {
            Symbol::Terminal(t) => Some(t.as_str()),
            Symbol::Nonterminal(_) => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// An ordered production list: each entry is `(lhs, rhs)`; `id` is the
/// position in this list, used to identify a production by identity when
/// comparing LR items.
pub type ProductionId = usize;

/// A grammar `G = (N, T, P, S, K, C, π, α)` (§3).
#[derive(Debug, Clone)]
pub struct Grammar {
    pub start: String,
    pub productions: Vec<(String, Rhs)>,
    pub keep: HashSet<String>,
    pub contract: HashSet<String>,
    pub precedence: HashMap<String, u32>,
    pub assoc: HashMap<String, Assoc>,
    pub terminals: BTreeSet<String>,
    pub nonterminals: BTreeSet<String>,
}

impl Grammar {
    pub fn new(
        start: String,
        productions: Vec<(String, Rhs)>,
        keep: HashSet<String>,
        contract: HashSet<String>,
        precedence: HashMap<String, u32>,
        assoc: HashMap<String, Assoc>,
    ) -> Result<Self, SpecError> {
        let mut nonterminals: BTreeSet<String> = productions.iter().map(|(lhs, _)| lhs.clone()).collect();
        nonterminals.insert(start.clone());

        let mut terminals = BTreeSet::new();
        for (_, rhs) in &productions {
            for sy in &rhs.body {
                if let Symbol::Terminal(t) = sy {
                    terminals.insert(t.clone());
                }
            }
        }

        // Invariant: every nonterminal referenced on a right-hand side must
        // itself be the LHS of at least one production.
        for (_, rhs) in &productions {
            for sy in &rhs.body {
                if let Symbol::Nonterminal(n) = sy {
                    if !nonterminals.contains(n) {
                        return Err(SpecError::new(format!(
                            "nonterminal \"{}\" is used but never defined",
                            n
                        )));
                    }
                }
            }
        }

        Ok(Self {
            start,
            productions,
            keep,
            contract,
            precedence,
            assoc,
            terminals,
            nonterminals,
        })
    }

    pub fn productions_for<'g>(&'g self, lhs: &str) -> impl Iterator<Item = (ProductionId, &'g Rhs)> {
        self.productions
            .iter()
            .enumerate()
            .filter(move |(_, (l, _))| l == lhs)
            .map(|(id, (_, rhs))| (id, rhs))
    }

    pub fn production(&self, id: ProductionId) -> &(String, Rhs) {
        &self.productions[id]
    }

    /// Compute nullability and FIRST sets for every nonterminal by
    /// fixed-point iteration (§4.2).
    pub fn first_sets(&self) -> FirstSets {
        let mut nullable: HashMap<String, bool> = self.nonterminals.iter().map(|n| (n.clone(), false)).collect();
        let mut first: HashMap<String, BTreeSet<String>> =
            self.nonterminals.iter().map(|n| (n.clone(), BTreeSet::new())).collect();

        let mut changed = true;
        while changed {
            changed = false;
            for (lhs, rhs) in &self.productions {
                // Nullable: every symbol in the body is nullable (vacuously true for EMPTY).
                if !nullable[lhs] {
                    let all_nullable = rhs.body.iter().all(|sy| match sy {
                        Symbol::Terminal(_) => false,
                        Symbol::Nonterminal(n) => nullable[n],
                    });
                    if all_nullable {
                        nullable.insert(lhs.clone(), true);
                        changed = true;
                    }
                }

                // FIRST(lhs) gains FIRST(body-prefix) up to the first non-nullable symbol.
                for sy in &rhs.body {
                    match sy {
                        Symbol::Terminal(t) => {
                            if first.get_mut(lhs).unwrap().insert(t.clone()) {
                                changed = true;
                            }
                            break;
                        }
                        Symbol::Nonterminal(n) => {
                            let addition: Vec<String> = first[n].iter().cloned().collect();
                            for t in addition {
                                if first.get_mut(lhs).unwrap().insert(t) {
                                    changed = true;
                                }
                            }
                            if !nullable[n] {
                                break;
                            }
                        }
                    }
                }
            }
        }

        FirstSets { first, nullable }
    }
}

/// FIRST sets and nullability for every nonterminal in a [`Grammar`].
#[derive(Debug, Clone)]
pub struct FirstSets {
    first: HashMap<String, BTreeSet<String>>,
    nullable: HashMap<String, bool>,
}

impl FirstSets {
    pub fn of(&self, nonterminal: &str) -> &BTreeSet<String> {
        &self.first[nonterminal]
    }

    pub fn is_nullable(&self, nonterminal: &str) -> bool {
        self.nullable[nonterminal]
    }

    /// FIRST of a symbol sequence: terminals contributed up to (and including,
    /// if nullable) the first non-nullable symbol, plus whether the whole
    /// sequence is nullable.
    pub fn of_sequence(&self, symbols: &[Symbol]) -> (BTreeSet<String>, bool) {
        let mut set = BTreeSet::new();
        for sy in symbols {
            match sy {
                Symbol::Terminal(t) => {
                    set.insert(t.clone());
                    return (set, false);
                }
                Symbol::Nonterminal(n) => {
                    set.extend(self.first[n].iter().cloned());
                    if !self.nullable[n] {
                        return (set, false);
                    }
                }
            }
        }
        (set, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nt(s: &str) -> Symbol {
        Symbol::Nonterminal(s.to_string())
    }
    fn t(s: &str) -> Symbol {
        Symbol::Terminal(s.to_string())
    }

    // E -> E + T | T
    // T -> T * F | F
    // F -> id
    fn expr_grammar() -> Grammar {
        let productions = vec![
            ("E".to_string(), Rhs::new(vec![nt("E"), t("+"), nt("T")])),
            ("E".to_string(), Rhs::new(vec![nt("T")])),
            ("T".to_string(), Rhs::new(vec![nt("T"), t("*"), nt("F")])),
            ("T".to_string(), Rhs::new(vec![nt("F")])),
            ("F".to_string(), Rhs::new(vec![t("id")])),
        ];
        Grammar::new(
            "E".to_string(),
            productions,
            HashSet::new(),
            HashSet::new(),
            HashMap::new(),
            HashMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn first_sets_of_classic_expression_grammar() {
        let g = expr_grammar();
        let first = g.first_sets();
        for nt in ["E", "T", "F"] {
            assert_eq!(first.of(nt), &BTreeSet::from(["id".to_string()]));
            assert!(!first.is_nullable(nt));
        }
    }

    #[test]
    fn rejects_undefined_nonterminal() {
        let productions = vec![("S".to_string(), Rhs::new(vec![nt("Missing")]))];
        let err = Grammar::new(
            "S".to_string(),
            productions,
            HashSet::new(),
            HashSet::new(),
            HashMap::new(),
            HashMap::new(),
        )
        .unwrap_err();
        assert!(err.message.contains("Missing"));
    }
}

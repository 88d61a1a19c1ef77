//! Canonical LR(1) table construction (§4.2).
//!
//! Items carry a genuine per-item lookahead (not the LR(0)-plus-FOLLOW
//! approximation an SLR(1) table would use), so two items with the same core
//! but different lookaheads are kept as distinct set members until closure
//! and goto have both run to a fixed point.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::SpecError;
use crate::grammar::{Assoc, FirstSets, Grammar, ProductionId, Rhs, Symbol, END_SYM, START_SYM};
use crate::source::Trace;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub production: ProductionId,
    pub dot: usize,
    pub lookahead: String,
}

pub type ItemSet = BTreeSet<Item>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(usize),
    Reduce(ProductionId),
    Accept,
}

#[derive(Debug, Clone, Default)]
pub struct State {
    pub items: ItemSet,
    pub actions: BTreeMap<String, Action>,
    pub goto: BTreeMap<String, usize>,
}

/// A complete canonical LR(1) automaton: one [`State`] per item set, plus the
/// augmented grammar (`START_SYM -> start END_SYM`) the items refer to.
pub struct Table {
    pub augmented: Grammar,
    pub states: Vec<State>,
}

impl Table {
    pub fn build(grammar: &Grammar) -> Result<Self, SpecError> {
        Self::build_traced(grammar, Trace::default())
    }

    /// Like [`Table::build`], but emits `#[cfg(debug_assertions)]`-gated
    /// diagnostics to stderr as states and conflict resolutions are found.
    pub fn build_traced(grammar: &Grammar, trace: Trace) -> Result<Self, SpecError> {
        let augmented = augment(grammar)?;
        let start_production: ProductionId = augmented.productions.len() - 1;
        let first = augmented.first_sets();

        let start_items = closure(
            &augmented,
            &first,
            BTreeSet::from([Item {
                production: start_production,
                dot: 0,
                lookahead: END_SYM.to_string(),
            }]),
        );

        let mut states: Vec<State> = vec![State {
            items: start_items.clone(),
            actions: BTreeMap::new(),
            goto: BTreeMap::new(),
        }];
        let mut index: HashMap<ItemSet, usize> = HashMap::new();
        index.insert(start_items, 0);

        let mut frontier = vec![0usize];
        while let Some(id) = frontier.pop() {
            let items = states[id].items.clone();
            for symbol in transition_symbols(&augmented, &items) {
                let moved = goto(&augmented, &first, &items, &symbol);
                if moved.is_empty() {
                    continue;
                }
                let target = match index.get(&moved) {
                    Some(&existing) => existing,
                    None => {
                        let new_id = states.len();
                        index.insert(moved.clone(), new_id);
                        states.push(State {
                            items: moved,
                            actions: BTreeMap::new(),
                            goto: BTreeMap::new(),
                        });
                        frontier.push(new_id);
                        if trace.enabled(Trace::Verbose) {
                            eprintln!("lr1: state {} discovered via {:?}", new_id, symbol);
                        }
                        new_id
                    }
                };
                match &symbol {
                    Symbol::Terminal(t) => set_action(&augmented, &mut states, id, t, Action::Shift(target), trace)?,
                    Symbol::Nonterminal(n) => {
                        states[id].goto.insert(n.clone(), target);
                    }
                }
            }
        }

        for id in 0..states.len() {
            let items: Vec<Item> = states[id].items.iter().cloned().collect();
            for item in items {
                let (_, rhs) = augmented.production(item.production);
                if item.dot != rhs.body.len() {
                    continue;
                }
                let action = if item.production == start_production {
                    Action::Accept
                } else {
                    Action::Reduce(item.production)
                };
                set_action(&augmented, &mut states, id, &item.lookahead, action, trace)?;
            }
        }

        if trace.enabled(Trace::Default) {
            eprintln!("lr1: built {} states from {} productions", states.len(), augmented.productions.len());
        }

        Ok(Self { augmented, states })
    }

    pub fn start_state(&self) -> usize {
        0
    }

    pub fn action(&self, state: usize, terminal: &str) -> Option<Action> {
        self.states[state].actions.get(terminal).copied()
    }

    pub fn goto(&self, state: usize, nonterminal: &str) -> Option<usize> {
        self.states[state].goto.get(nonterminal).copied()
    }
}

/// Add the augmenting production `START_SYM -> start END_SYM`.
fn augment(grammar: &Grammar) -> Result<Grammar, SpecError> {
    let mut productions = grammar.productions.clone();
    productions.push((
        START_SYM.to_string(),
        Rhs::new(vec![
            Symbol::Nonterminal(grammar.start.clone()),
            Symbol::Terminal(END_SYM.to_string()),
        ]),
    ));
    Grammar::new(
        START_SYM.to_string(),
        productions,
        grammar.keep.clone(),
        grammar.contract.clone(),
        grammar.precedence.clone(),
        grammar.assoc.clone(),
    )
}

/// Close `items` under the standard LR(1) closure rule: for `A -> α·Bβ, a`,
/// add `B -> ·γ, b` for every production of `B` and every `b` in FIRST(βa).
fn closure(grammar: &Grammar, first: &FirstSets, mut items: ItemSet) -> ItemSet {
    let mut changed = true;
    while changed {
        changed = false;
        let snapshot: Vec<Item> = items.iter().cloned().collect();
        for item in snapshot {
            let (_, rhs) = grammar.production(item.production);
            let n = match rhs.body.get(item.dot) {
                Some(Symbol::Nonterminal(n)) => n.clone(),
                _ => continue,
            };

            let mut seq: Vec<Symbol> = rhs.body[item.dot + 1..].to_vec();
            seq.push(Symbol::Terminal(item.lookahead.clone()));
            let (lookaheads, _) = first.of_sequence(&seq);

            for (pid, _) in grammar.productions_for(&n) {
                for lookahead in &lookaheads {
                    if items.insert(Item {
                        production: pid,
                        dot: 0,
                        lookahead: lookahead.clone(),
                    }) {
                        changed = true;
                    }
                }
            }
        }
    }
    items
}

/// `goto(items, X)`: advance every item whose next symbol is `X`, then close.
fn goto(grammar: &Grammar, first: &FirstSets, items: &ItemSet, symbol: &Symbol) -> ItemSet {
    let mut moved = BTreeSet::new();
    for item in items {
        let (_, rhs) = grammar.production(item.production);
        if rhs.body.get(item.dot) == Some(symbol) {
            moved.insert(Item {
                production: item.production,
                dot: item.dot + 1,
                lookahead: item.lookahead.clone(),
            });
        }
    }
    if moved.is_empty() {
        moved
    } else {
        closure(grammar, first, moved)
    }
}

fn transition_symbols(grammar: &Grammar, items: &ItemSet) -> Vec<Symbol> {
    let mut set = BTreeSet::new();
    for item in items {
        let (_, rhs) = grammar.production(item.production);
        if let Some(sym) = rhs.body.get(item.dot) {
            set.insert(sym.clone());
        }
    }
    set.into_iter().collect()
}

fn set_action(
    grammar: &Grammar,
    states: &mut [State],
    state: usize,
    terminal: &str,
    action: Action,
    trace: Trace,
) -> Result<(), SpecError> {
    match states[state].actions.get(terminal).copied() {
        None => {
            states[state].actions.insert(terminal.to_string(), action);
            Ok(())
        }
        Some(existing) if existing == action => Ok(()),
        Some(existing) => {
            let resolved = resolve(grammar, terminal, existing, action)?;
            if trace.enabled(Trace::Default) {
                eprintln!(
                    "lr1: conflict in state {} on \"{}\" ({:?} vs {:?}) resolved to {:?}",
                    state, terminal, existing, action, resolved
                );
            }
            states[state].actions.insert(terminal.to_string(), resolved);
            Ok(())
        }
    }
}

fn resolve(grammar: &Grammar, terminal: &str, a: Action, b: Action) -> Result<Action, SpecError> {
    use Action::*;
    match (a, b) {
        (Shift(_), Shift(_)) => Ok(a),
        (Accept, _) | (_, Accept) => Err(SpecError::new(format!(
            "grammar is ambiguous: an accepting state also has another action on \"{}\"",
            terminal
        ))),
        (Shift(target), Reduce(p)) | (Reduce(p), Shift(target)) => {
            resolve_shift_reduce(grammar, terminal, target, p)
        }
        (Reduce(p1), Reduce(p2)) => {
            let (lo, hi) = if p1 < p2 { (p1, p2) } else { (p2, p1) };
            Err(SpecError::new(format!(
                "reduce/reduce conflict on \"{}\" between productions {} and {}",
                terminal, lo, hi
            )))
        }
    }
}

/// Resolve a shift/reduce conflict by comparing the shifted terminal's
/// declared precedence against the reducing rule's precedence terminal (the
/// last terminal in its body, §4.2). Equal precedence falls back to the
/// terminal's declared associativity; anything left unresolved is an error.
fn resolve_shift_reduce(
    grammar: &Grammar,
    terminal: &str,
    target: usize,
    production: ProductionId,
) -> Result<Action, SpecError> {
    let (_, rhs) = grammar.production(production);
    let rule_terminal = rhs.precedence_terminal();

    let shift_prec = grammar.precedence.get(terminal);
    let rule_prec = rule_terminal.and_then(|t| grammar.precedence.get(t));

    match (shift_prec, rule_prec) {
        (Some(sp), Some(rp)) if sp > rp => Ok(Action::Shift(target)),
        (Some(sp), Some(rp)) if sp < rp => Ok(Action::Reduce(production)),
        (Some(_), Some(_)) => match grammar.assoc.get(terminal) {
            Some(Assoc::Left) => Ok(Action::Reduce(production)),
            Some(Assoc::Right) => Ok(Action::Shift(target)),
            _ => Err(SpecError::new(format!(
                "shift/reduce conflict on \"{}\": operator is nonassociative",
                terminal
            ))),
        },
        _ => Err(SpecError::new(format!(
            "shift/reduce conflict on \"{}\" between production {} and a shift; declare precedence to resolve it",
            terminal, production
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammarspec;

    #[test]
    fn builds_table_for_unambiguous_expression_grammar() {
        let g = grammarspec::parse(
            ": id\nE : E + T | T\nT : T * F | F\nF : id\n",
        )
        .unwrap();
        let table = Table::build(&g).unwrap();
        assert!(table.action(table.start_state(), "id").is_some());
    }

    #[test]
    fn precedence_directives_resolve_shift_reduce_conflicts() {
        let g = grammarspec::parse(
            "%left +\n%left *\n: id\nE : E + E | E * E | id\n",
        )
        .unwrap();
        assert!(Table::build(&g).is_ok());
    }

    #[test]
    fn ambiguous_grammar_without_precedence_is_rejected() {
        let g = grammarspec::parse(": id\nE : E + E | id\n").unwrap();
        let err = Table::build(&g).unwrap_err();
        assert!(err.message.contains("shift/reduce"));
    }

    #[test]
    fn reduce_reduce_conflict_is_rejected() {
        let g = grammarspec::parse(": id\nS : A | B\nA : id\nB : id\n").unwrap();
        let err = Table::build(&g).unwrap_err();
        assert!(err.message.contains("reduce/reduce"));
    }

    #[test]
    fn build_traced_produces_the_same_table_as_build() {
        use crate::source::Trace;
        let g = grammarspec::parse(
            "%left +\n%left *\n: id\nE : E + E | E * E | id\n",
        )
        .unwrap();
        let table = Table::build_traced(&g, Trace::Verbose).unwrap();
        assert!(table.action(table.start_state(), "id").is_some());
    }
}

//! A persisted, self-contained snapshot of an LR(1) automaton (§4.2, §6).
//!
//! [`crate::lr1::Table`] borrows the [`crate::grammar::Grammar`] it was built
//! from; [`ParseTable`] copies out just what [`crate::parser::Parser`] needs
//! to drive a parse, and can be written to and read back from a plain text
//! format so a compiled grammar need not be rebuilt on every run.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::SpecError;
use crate::grammar::{Grammar, ProductionId};
use crate::lr1::{Action, Table};
use crate::source::Trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Shift(usize),
    Reduce(ProductionId),
    Accept,
}

#[derive(Debug, Clone, Default)]
pub struct StateRow {
    pub actions: BTreeMap<String, Entry>,
    pub goto: BTreeMap<String, usize>,
}

/// Everything the parser driver needs: the action/goto tables, and just
/// enough production shape (`lhs`, arity) to build reductions without the
/// rest of the grammar.
#[derive(Debug, Clone)]
pub struct ParseTable {
    pub start_state: usize,
    pub states: Vec<StateRow>,
    pub productions: Vec<(String, usize)>,
    pub keep: Vec<String>,
    pub contract: Vec<String>,
}

impl ParseTable {
    pub fn build(grammar: &Grammar) -> Result<Self, SpecError> {
        let table = Table::build(grammar)?;
        Ok(Self::from_table(&table))
    }

    /// Like [`ParseTable::build`], but with `#[cfg(debug_assertions)]`-gated
    /// trace output from the LR(1) builder (§4.2, §9).
    pub fn build_traced(grammar: &Grammar, trace: Trace) -> Result<Self, SpecError> {
        let table = Table::build_traced(grammar, trace)?;
        Ok(Self::from_table(&table))
    }

    pub fn from_table(table: &Table) -> Self {
        let productions = table
            .augmented
            .productions
            .iter()
            .map(|(lhs, rhs)| (lhs.clone(), rhs.body.len()))
            .collect();

        let states = table
            .states
            .iter()
            .map(|state| StateRow {
                actions: state
                    .actions
                    .iter()
                    .map(|(t, a)| (t.clone(), Entry::from(*a)))
                    .collect(),
                goto: state.goto.clone(),
            })
            .collect();

        Self {
            start_state: table.start_state(),
            states,
            productions,
            keep: table.augmented.keep.iter().cloned().collect(),
            contract: table.augmented.contract.iter().cloned().collect(),
        }
    }

    pub fn action(&self, state: usize, terminal: &str) -> Option<Entry> {
        self.states[state].actions.get(terminal).copied()
    }

    pub fn goto(&self, state: usize, nonterminal: &str) -> Option<usize> {
        self.states[state].goto.get(nonterminal).copied()
    }

    /// Render the table as the plain text format [`Self::parse`] reads back.
    pub fn render(&self) -> String {
        let mut out = String::new();
        writeln!(out, "START {}", self.start_state).unwrap();
        for (id, (lhs, arity)) in self.productions.iter().enumerate() {
            writeln!(out, "PROD {} {} {}", id, lhs, arity).unwrap();
        }
        for name in &self.keep {
            writeln!(out, "KEEP {}", name).unwrap();
        }
        for name in &self.contract {
            writeln!(out, "CONTRACT {}", name).unwrap();
        }
        for (id, state) in self.states.iter().enumerate() {
            writeln!(out, "STATE {}", id).unwrap();
            for (terminal, entry) in &state.actions {
                match entry {
                    Entry::Shift(target) => writeln!(out, "ACTION {} {} SHIFT {}", id, terminal, target).unwrap(),
                    Entry::Reduce(p) => writeln!(out, "ACTION {} {} REDUCE {}", id, terminal, p).unwrap(),
                    Entry::Accept => writeln!(out, "ACTION {} {} ACCEPT", id, terminal).unwrap(),
                }
            }
            for (nonterminal, target) in &state.goto {
                writeln!(out, "GOTO {} {} {}", id, nonterminal, target).unwrap();
            }
        }
        out
    }

    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let mut start_state = 0usize;
        let mut productions: Vec<(String, usize)> = Vec::new();
        let mut keep = Vec::new();
        let mut contract = Vec::new();
        let mut states: Vec<StateRow> = Vec::new();

        let bad = |line: &str| SpecError::new(format!("malformed parse table line: \"{}\"", line));

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                ["START", n] => start_state = n.parse().map_err(|_| bad(line))?,
                ["PROD", id, lhs, arity] => {
                    let id: usize = id.parse().map_err(|_| bad(line))?;
                    let arity: usize = arity.parse().map_err(|_| bad(line))?;
                    if productions.len() != id {
                        return Err(bad(line));
                    }
                    productions.push((lhs.to_string(), arity));
                }
                ["KEEP", name] => keep.push(name.to_string()),
                ["CONTRACT", name] => contract.push(name.to_string()),
                ["STATE", id] => {
                    let id: usize = id.parse().map_err(|_| bad(line))?;
                    if states.len() != id {
                        return Err(bad(line));
                    }
                    states.push(StateRow::default());
                }
                ["ACTION", id, terminal, "SHIFT", target] => {
                    let id: usize = id.parse().map_err(|_| bad(line))?;
                    let target: usize = target.parse().map_err(|_| bad(line))?;
                    let row = states.get_mut(id).ok_or_else(|| bad(line))?;
                    row.actions.insert(terminal.to_string(), Entry::Shift(target));
                }
                ["ACTION", id, terminal, "REDUCE", production] => {
                    let id: usize = id.parse().map_err(|_| bad(line))?;
                    let production: usize = production.parse().map_err(|_| bad(line))?;
                    let row = states.get_mut(id).ok_or_else(|| bad(line))?;
                    row.actions.insert(terminal.to_string(), Entry::Reduce(production));
                }
                ["ACTION", id, terminal, "ACCEPT"] => {
                    let id: usize = id.parse().map_err(|_| bad(line))?;
                    let row = states.get_mut(id).ok_or_else(|| bad(line))?;
                    row.actions.insert(terminal.to_string(), Entry::Accept);
                }
                ["GOTO", id, nonterminal, target] => {
                    let id: usize = id.parse().map_err(|_| bad(line))?;
                    let target: usize = target.parse().map_err(|_| bad(line))?;
                    let row = states.get_mut(id).ok_or_else(|| bad(line))?;
                    row.goto.insert(nonterminal.to_string(), target);
                }
                _ => return Err(bad(line)),
            }
        }

        Ok(Self {
            start_state,
            states,
            productions,
            keep,
            contract,
        })
    }
}

impl From<Action> for Entry {
    fn from(action: Action) -> Self {
        match action {
            Action::Shift(s) => Entry::Shift(s),
            Action::Reduce(p) => Entry::Reduce(p),
            Action::Accept => Entry::Accept,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammarspec;

    #[test]
    fn round_trips_through_text() {
        let g = grammarspec::parse(": id\nE : E + T | T\nT : T * F | F\nF : id\n").unwrap();
        let table = ParseTable::build(&g).unwrap();
        let text = table.render();
        let parsed = ParseTable::parse(&text).unwrap();
        assert_eq!(parsed.start_state, table.start_state);
        assert_eq!(parsed.productions, table.productions);
        assert_eq!(parsed.states.len(), table.states.len());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(ParseTable::parse("STATE abc\n").is_err());
    }
}

//! Parsing of the `.syn` grammar specification format (§4.2, §6).
//!
//! ```text
//! : k1 k2 ...                  (optional keep-terminal line)
//! %left t1 t2 ...               (optional precedence directives)
//! A : rhs1 | rhs2               (production; ":" keeps A, "<" contracts A)
//!   | rhs3                      (continuation line)
//! ```

use std::collections::{HashMap, HashSet};

use crate::error::SpecError;
use crate::grammar::{Assoc, Grammar, Rhs, Symbol, EMPTY, END_SYM, START_SYM};

pub fn parse(source: &str) -> Result<Grammar, SpecError> {
    let lines: Vec<&str> = source.lines().collect();
    let mut i = 0usize;

    let mut keep: HashSet<String> = HashSet::new();
    let mut checked_keep = false;
    let mut precedence: HashMap<String, u32> = HashMap::new();
    let mut assoc: HashMap<String, Assoc> = HashMap::new();
    let mut prec_counter: u32 = 0;
    let mut root: Option<String> = None;
    let mut raw_rules: Vec<(String, bool, Vec<String>)> = Vec::new();

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();
        let terms: Vec<&str> = line.split_whitespace().collect();

        if terms.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }

        if !checked_keep {
            checked_keep = true;
            if terms[0] == ":" {
                keep.extend(terms[1..].iter().map(|s| s.to_string()));
                i += 1;
                continue;
            }
        }

        if matches!(terms[0], "%left" | "%right" | "%nonassoc") {
            prec_counter += 1;
            let a = match terms[0] {
                "%left" => Assoc::Left,
                "%right" => Assoc::Right,
                _ => Assoc::NonAssoc,
            };
            for t in &terms[1..] {
                precedence.insert(t.to_string(), prec_counter);
                assoc.insert(t.to_string(), a);
            }
            i += 1;
            continue;
        }

        if terms.len() < 2 || !is_ident(terms[0]) || (terms[1] != ":" && terms[1] != "<") {
            return Err(SpecError::new(format!(
                "line {}: expected \"nonterminal [:|<] production\" but got \"{}\"",
                i + 1,
                line
            )));
        }

        let lhs = terms[0].to_string();
        let contract = terms[1] == "<";
        if lhs == START_SYM || lhs == END_SYM || lhs == EMPTY || lhs == "|" {
            return Err(SpecError::new(format!("line {}: \"{}\" is a reserved name", i + 1, lhs)));
        }
        if root.is_none() {
            root = Some(lhs.clone());
        }

        let mut all_terms: Vec<String> = terms[2..].iter().map(|s| s.to_string()).collect();
        i += 1;
        while i < lines.len() {
            let cterms: Vec<&str> = lines[i].split_whitespace().collect();
            if cterms.is_empty() {
                i += 1;
                continue;
            }
            if cterms[0] == "|" {
                all_terms.extend(cterms.iter().map(|s| s.to_string()));
                i += 1;
            } else {
                break;
            }
        }

        if all_terms.is_empty() || all_terms.last().map(String::as_str) == Some("|") {
            return Err(SpecError::new(format!(
                "production for \"{}\" cannot be empty or end with \"|\"",
                lhs
            )));
        }

        raw_rules.push((lhs, contract, all_terms));
    }

    let root = root.ok_or_else(|| SpecError::new("grammar has no productions"))?;
    let nonterminal_names: HashSet<String> = raw_rules.iter().map(|(lhs, _, _)| lhs.clone()).collect();

    let mut contract_set = HashSet::new();
    let mut productions = Vec::new();

    for (lhs, contract, terms) in &raw_rules {
        if *contract {
            contract_set.insert(lhs.clone());
        }

        let mut alts: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_empty = false;
        for term in terms {
            if term == "|" {
                if current.is_empty() && !current_empty {
                    return Err(SpecError::new(format!(
                        "production for \"{}\" has an empty alternative; use EMPTY",
                        lhs
                    )));
                }
                alts.push(std::mem::take(&mut current));
                current_empty = false;
            } else if term == EMPTY {
                current_empty = true;
            } else {
                current.push(term.clone());
            }
        }
        if current.is_empty() && !current_empty {
            return Err(SpecError::new(format!(
                "production for \"{}\" has an empty alternative; use EMPTY",
                lhs
            )));
        }
        alts.push(current);

        for alt in alts {
            let body: Vec<Symbol> = alt
                .iter()
                .map(|name| {
                    if nonterminal_names.contains(name) {
                        Symbol::Nonterminal(name.clone())
                    } else {
                        Symbol::Terminal(name.clone())
                    }
                })
                .collect();
            productions.push((lhs.clone(), Rhs::new(body)));
        }
    }

    Grammar::new(root, productions, keep, contract_set, precedence, assoc)
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keep_terminals_and_simple_grammar() {
        let spec = ": num id\nE : E + T | T\nT : id\n";
        let g = parse(spec).unwrap();
        assert_eq!(g.start, "E");
        assert!(g.keep.contains("num"));
        assert!(g.keep.contains("id"));
        assert_eq!(g.productions.len(), 3);
    }

    #[test]
    fn continuation_lines_extend_same_nonterminal() {
        let spec = "E : T\n  | E + T\n  | E - T\nT : id\n";
        let g = parse(spec).unwrap();
        let e_rules: Vec<_> = g.productions.iter().filter(|(lhs, _)| lhs == "E").collect();
        assert_eq!(e_rules.len(), 3);
    }

    #[test]
    fn empty_keyword_yields_epsilon_production() {
        let spec = "S : a S | EMPTY\n";
        let g = parse(spec).unwrap();
        assert!(g.productions.iter().any(|(_, rhs)| rhs.body.is_empty()));
    }

    #[test]
    fn contract_marker_populates_contract_set() {
        let spec = "S : a\nT < S\n";
        let g = parse(spec).unwrap();
        assert!(g.contract.contains("T"));
    }

    #[test]
    fn precedence_directives_increment_per_line() {
        let spec = "%left + -\n%left * /\nE : E + E | id\n";
        let g = parse(spec).unwrap();
        assert_eq!(g.precedence["+"], 1);
        assert_eq!(g.precedence["*"], 2);
        assert_eq!(g.assoc["+"], Assoc::Left);
    }

    #[test]
    fn rejects_reserved_nonterminal_name() {
        assert!(parse("START_SYM : a\n").is_err());
    }

    #[test]
    fn rejects_empty_as_a_nonterminal_name() {
        // "EMPTY" must stay the epsilon sentinel; a grammar declaring its own
        // "EMPTY" nonterminal would silently corrupt epsilon productions.
        assert!(parse("EMPTY : a\n").is_err());
    }

    #[test]
    fn rejects_dangling_bar() {
        assert!(parse("S : a |\n").is_err());
    }
}

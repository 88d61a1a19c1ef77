//! Glue shared by the CLI and the REPL: tokenize, parse, normalize, and
//! evaluate one piece of source text against a caller-owned [`Environment`].

use crate::builtins;
use crate::cst::{self, Node};
use crate::env::Environment;
use crate::error::Error;
use crate::eval;
use crate::langspec;
use crate::source::Code;
use crate::value::Value;

/// Parse `source` into a normalized AST without evaluating it.
pub fn parse(source: &str) -> Result<Node, Error> {
    let language = langspec::shared();
    let code = Code::new(source);
    let tokens = language.lexer.tokenize(source)?;
    let tree = crate::parser::Parser::new(&language.table).parse(&tokens, &code)?;
    Ok(cst::normalize(tree, &language.grammar))
}

/// Parse and evaluate `source` against `env`.
pub fn run(source: &str, env: &mut Environment) -> Result<(), Error> {
    let program = parse(source)?;
    eval::run_program(&program, env)
}

/// Parse and evaluate `source`, returning the value of its last executed
/// statement (used by the REPL's `Out [n]:` prompt).
pub fn eval(source: &str, env: &mut Environment) -> Result<Value, Error> {
    let program = parse(source)?;
    eval::eval_program(&program, env)
}

/// A fresh global environment with every built-in already installed.
pub fn fresh_environment() -> Environment {
    let mut env = Environment::new();
    builtins::install(&mut env);
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_source_against_a_fresh_environment() {
        let mut env = fresh_environment();
        run("x = 1 + 1;", &mut env).unwrap();
        assert_eq!(env.get("x").unwrap().to_string(), "2");
    }

    #[test]
    fn parse_errors_surface_without_touching_the_environment() {
        let mut env = fresh_environment();
        assert!(run("x = ;", &mut env).is_err());
        assert!(env.get("x").is_err());
    }
}

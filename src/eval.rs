//! The tree-walking evaluator (§4.5): walks the normalized AST produced by
//! [`crate::langspec`], dispatching on node label for statements and on node
//! label/shape for expressions.
//!
//! `&&`/`||` thread through the actual operand value (short-circuiting like
//! the source language's own truthiness, not a separate boolean type);
//! comparisons and `!` produce `Value::Number(1.0)`/`Value::Number(0.0)`,
//! since there is no dedicated boolean value in this language (§4.5, open
//! question — see DESIGN.md). A function without an explicit `return`
//! yields the value of its last executed statement, not a fixed unit value.

use crate::cst::Node;
use crate::env::Environment;
use crate::error::{ArithmeticError, Error, IndexError, SyntaxError, TypeError};
use crate::value::{Array, UserFn, Value};
use std::rc::Rc;

/// The outcome of executing a statement or statement list. `Normal` carries
/// the value of the last statement executed, since a function without an
/// explicit `return` yields the value of its last statement rather than a
/// fixed unit value (a behavior the host language documents explicitly).
enum Flow {
    Normal(Value),
    Return(Value),
    Break,
}

/// Walk the cons-list shape shared by `StmtList`, `Params`/`ParamsTail`, and
/// `Args`/`ArgsTail`: each node is either empty (the list's end) or wraps a
/// head and a tail node of the same shape.
fn flatten(node: &Node) -> Vec<&Node> {
    if node.children().is_empty() {
        return Vec::new();
    }
    let mut items = vec![&node.children()[0]];
    items.extend(flatten(&node.children()[1]));
    items
}

pub fn run_program(program: &Node, env: &mut Environment) -> Result<(), Error> {
    eval_program(program, env).map(|_| ())
}

/// Like [`run_program`], but also returns the value of the program's last
/// executed statement (used by the REPL's `Out [n]:` prompt).
pub fn eval_program(program: &Node, env: &mut Environment) -> Result<Value, Error> {
    let stmt_list = &program.children()[0];
    match eval_stmt_list(stmt_list, env)? {
        Flow::Normal(value) => Ok(value),
        Flow::Return(_) => Err(SyntaxError::new("\"return\" used outside a function").into()),
        Flow::Break => Err(SyntaxError::new("\"break\" used outside a loop").into()),
    }
}

fn eval_stmt_list(node: &Node, env: &mut Environment) -> Result<Flow, Error> {
    let mut last = Value::Number(0.0);
    for stmt in flatten(node) {
        match eval_stmt(stmt, env)? {
            Flow::Normal(value) => last = value,
            other => return Ok(other),
        }
    }
    Ok(Flow::Normal(last))
}

fn exec_block(block: &Node, env: &mut Environment) -> Result<Flow, Error> {
    env.push_frame();
    let result = eval_stmt_list(&block.children()[0], env);
    env.pop_frame();
    result
}

fn eval_stmt(node: &Node, env: &mut Environment) -> Result<Flow, Error> {
    match node.label() {
        "Assign" => {
            let value = assign(&node.children()[0], &node.children()[1], env)?;
            Ok(Flow::Normal(value))
        }
        "If" => {
            let condition = eval_expr(&node.children()[0], env)?;
            if condition.is_truthy() {
                exec_block(&node.children()[1], env)
            } else if node.children().len() == 3 {
                exec_block(&node.children()[2], env)
            } else {
                Ok(Flow::Normal(Value::Number(0.0)))
            }
        }
        "While" => {
            let mut last = Value::Number(0.0);
            loop {
                if !eval_expr(&node.children()[0], env)?.is_truthy() {
                    return Ok(Flow::Normal(last));
                }
                match exec_block(&node.children()[1], env)? {
                    Flow::Normal(value) => last = value,
                    Flow::Break => return Ok(Flow::Normal(last)),
                    Flow::Return(v) => return Ok(Flow::Return(v)),
                }
            }
        }
        "For" => {
            let iterable = eval_expr(&node.children()[1], env)?;
            let items: Vec<Value> = expect_array(&iterable)?.borrow().clone();
            let var = node.children()[0].as_lexeme().expect("For's loop variable is an id terminal");
            let mut last = Value::Number(0.0);
            for item in items {
                env.push_frame();
                env.bind_local(var, item);
                let flow = exec_block(&node.children()[2], env);
                env.pop_frame();
                match flow? {
                    Flow::Normal(value) => last = value,
                    Flow::Break => return Ok(Flow::Normal(last)),
                    Flow::Return(v) => return Ok(Flow::Return(v)),
                }
            }
            Ok(Flow::Normal(last))
        }
        "Def" => {
            let name = node.children()[0].as_lexeme().expect("Def's name is an id terminal").to_string();
            let params = flatten(&node.children()[1])
                .into_iter()
                .map(|p| p.as_lexeme().expect("a parameter is an id terminal").to_string())
                .collect();
            let func = Value::UserFn(Rc::new(UserFn {
                name: name.clone(),
                params,
                body: node.children()[2].clone(),
            }));
            env.set(&name, func.clone());
            Ok(Flow::Normal(func))
        }
        "Return" => {
            let value = match node.children().first() {
                Some(expr) => eval_expr(expr, env)?,
                None => Value::Number(0.0),
            };
            Ok(Flow::Return(value))
        }
        "Break" => Ok(Flow::Break),
        _ => {
            let value = eval_expr(node, env)?;
            Ok(Flow::Normal(value))
        }
    }
}

/// Operator-precedence levels whose arity varies by alternative (a binary
/// application, or a single-child passthrough to the next tighter level) and
/// so are kept as real nodes rather than spliced away by normalization.
const PASSTHROUGH_LABELS: &[&str] = &["Or", "And", "Eq", "Rel", "Add", "Mul", "Unary", "Postfix"];

/// Strip the single-child passthrough wrappers a plain identifier or index
/// expression is left wearing after it falls through every operator level
/// untouched, to reach the node an assignment actually targets.
fn resolve_target(node: &Node) -> &Node {
    match node {
        Node::Nonterminal { label, children } if children.len() == 1 && PASSTHROUGH_LABELS.contains(&label.as_str()) => {
            resolve_target(&children[0])
        }
        _ => node,
    }
}

fn assign(target: &Node, rhs: &Node, env: &mut Environment) -> Result<Value, Error> {
    let value = eval_expr(rhs, env)?;
    match resolve_target(target) {
        Node::Terminal { label, lexeme, .. } if label == "id" => {
            env.set(lexeme, value.clone());
            Ok(value)
        }
        Node::Nonterminal { label, children } if label == "Postfix" && children.len() == 3 => {
            let array = expect_array(&eval_expr(&children[0], env)?)?;
            let index = index_of(&eval_expr(&children[2], env)?, array.borrow().len())?;
            array.borrow_mut()[index] = value.clone();
            Ok(value)
        }
        _ => Err(SyntaxError::new("invalid assignment target").into()),
    }
}

fn eval_expr(node: &Node, env: &mut Environment) -> Result<Value, Error> {
    match node.label() {
        "id" => Ok(env.get(node.as_lexeme().expect("id node is a terminal"))?),
        "num" => {
            let lexeme = node.as_lexeme().expect("num node is a terminal");
            Ok(Value::Number(lexeme.parse().expect("the lexer only emits well-formed numerals")))
        }
        "str" => Ok(Value::String(node.as_lexeme().expect("str node is a terminal").to_string())),
        "Array" => eval_array_body(&node.children()[0], env),
        // Every operator-precedence level falls through to the next tighter
        // one unchanged when no operator at its level applies.
        "Or" | "And" | "Eq" | "Rel" | "Add" | "Mul" | "Unary" | "Postfix" if node.children().len() == 1 => {
            eval_expr(&node.children()[0], env)
        }
        "Or" => {
            let lhs = eval_expr(&node.children()[0], env)?;
            if lhs.is_truthy() {
                Ok(lhs)
            } else {
                eval_expr(&node.children()[2], env)
            }
        }
        "And" => {
            let lhs = eval_expr(&node.children()[0], env)?;
            if !lhs.is_truthy() {
                Ok(lhs)
            } else {
                eval_expr(&node.children()[2], env)
            }
        }
        "Eq" => {
            let lhs = eval_expr(&node.children()[0], env)?;
            let rhs = eval_expr(&node.children()[2], env)?;
            Ok(Value::Number(if lhs == rhs { 1.0 } else { 0.0 }))
        }
        "Rel" => {
            let lhs = eval_expr(&node.children()[0], env)?;
            let rhs = eval_expr(&node.children()[2], env)?;
            compare(node.children()[1].label(), &lhs, &rhs)
        }
        "Add" | "Mul" => {
            let lhs = eval_expr(&node.children()[0], env)?;
            let rhs = eval_expr(&node.children()[2], env)?;
            arith(node.children()[1].label(), lhs, rhs)
        }
        "Unary" => {
            let operand = eval_expr(&node.children()[1], env)?;
            Ok(Value::Number(if operand.is_truthy() { 0.0 } else { 1.0 }))
        }
        "Postfix" if node.children().len() == 2 => {
            let callee = eval_expr(&node.children()[0], env)?;
            let args = flatten(&node.children()[1])
                .into_iter()
                .map(|a| eval_expr(a, env))
                .collect::<Result<Vec<_>, _>>()?;
            call(callee, args, env)
        }
        "Postfix" if node.children().len() == 3 => {
            let array = expect_array(&eval_expr(&node.children()[0], env)?)?;
            let index = index_of(&eval_expr(&node.children()[2], env)?, array.borrow().len())?;
            Ok(array.borrow()[index].clone())
        }
        other => unreachable!("unexpected expression node \"{}\"", other),
    }
}

fn eval_array_body(body: &Node, env: &mut Environment) -> Result<Value, Error> {
    if body.children().is_empty() {
        return Ok(Value::array(Vec::new()));
    }
    let items = eval_tail(&body.children()[0], &body.children()[1], env)?;
    Ok(Value::array(items))
}

/// `expr` is the template/element expression just parsed; `tail` says what
/// follows it: nothing, a comma and another element, a `..`/`...` range
/// bound, or an `in ... :` comprehension clause.
fn eval_tail(expr: &Node, tail: &Node, env: &mut Environment) -> Result<Vec<Value>, Error> {
    if tail.children().is_empty() {
        return Ok(vec![eval_expr(expr, env)?]);
    }
    let head = &tail.children()[0];
    match head.label() {
        ".." => {
            let lo = eval_expr(expr, env)?;
            let hi = eval_expr(&tail.children()[1], env)?;
            eval_range(&lo, &hi, true)
        }
        "..." => {
            let lo = eval_expr(expr, env)?;
            let hi = eval_expr(&tail.children()[1], env)?;
            eval_range(&lo, &hi, false)
        }
        _ if tail.children().len() == 3 => {
            let bound = resolve_target(expr);
            let var = bound.as_lexeme().filter(|_| bound.label() == "id").ok_or_else(|| {
                SyntaxError::new("a comprehension's bound name must be a plain identifier")
            })?;
            let iterable = eval_expr(&tail.children()[0], env)?;
            let cond = &tail.children()[1];
            let map = tail.children()[2].children().first();
            let items: Vec<Value> = expect_array(&iterable)?.borrow().clone();
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                env.push_frame();
                env.bind_local(var, item.clone());
                let include = eval_expr(cond, env)?.is_truthy();
                let value = if include {
                    Some(match map {
                        Some(map_expr) => eval_expr(map_expr, env)?,
                        None => item,
                    })
                } else {
                    None
                };
                env.pop_frame();
                if let Some(value) = value {
                    out.push(value);
                }
            }
            Ok(out)
        }
        _ => {
            let mut out = vec![eval_expr(expr, env)?];
            out.extend(eval_tail(head, &tail.children()[1], env)?);
            Ok(out)
        }
    }
}

fn eval_range(lo: &Value, hi: &Value, inclusive: bool) -> Result<Vec<Value>, Error> {
    let (lo, hi) = match (lo, hi) {
        (Value::Number(a), Value::Number(b)) => (a.trunc() as i64, b.trunc() as i64),
        _ => return Err(IndexError::new("range bounds must be numbers").into()),
    };
    if inclusive {
        Ok((lo..=hi).map(|n| Value::Number(n as f64)).collect())
    } else {
        Ok((lo..hi).map(|n| Value::Number(n as f64)).collect())
    }
}

fn arith(op: &str, lhs: Value, rhs: Value) -> Result<Value, Error> {
    if op == "+" {
        match (&lhs, &rhs) {
            (Value::String(a), Value::String(b)) => return Ok(Value::String(format!("{}{}", a, b))),
            (Value::String(a), Value::Number(b)) => return Ok(Value::String(format!("{}{}", a, Value::Number(*b)))),
            (Value::Number(a), Value::String(b)) => return Ok(Value::String(format!("{}{}", Value::Number(*a), b))),
            (Value::Array(a), Value::Array(b)) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                return Ok(Value::array(items));
            }
            _ => {}
        }
    }
    let (a, b) = match (&lhs, &rhs) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        _ => {
            return Err(TypeError::new(format!(
                "cannot apply \"{}\" to a {} and a {}",
                op,
                lhs.type_name(),
                rhs.type_name()
            ))
            .into())
        }
    };
    match op {
        "+" => Ok(Value::Number(a + b)),
        "-" => Ok(Value::Number(a - b)),
        "*" => Ok(Value::Number(a * b)),
        "/" => {
            if b == 0.0 {
                Err(ArithmeticError {
                    message: "division by zero".to_string(),
                }
                .into())
            } else {
                Ok(Value::Number(a / b))
            }
        }
        "%" => {
            if b == 0.0 {
                Err(ArithmeticError {
                    message: "modulo by zero".to_string(),
                }
                .into())
            } else {
                Ok(Value::Number(a % b))
            }
        }
        other => unreachable!("Add/Mul's only operator terminals are +, -, *, /, %, got {}", other),
    }
}

fn compare(op: &str, lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    use std::cmp::Ordering;
    let ordering = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    let ordering = ordering.ok_or_else(|| {
        TypeError::new(format!("cannot compare a {} and a {}", lhs.type_name(), rhs.type_name()))
    })?;
    let holds = match op {
        "<" => ordering == Ordering::Less,
        "<=" => ordering != Ordering::Greater,
        ">" => ordering == Ordering::Greater,
        ">=" => ordering != Ordering::Less,
        other => unreachable!("Rel's only operator terminals are <, <=, >, >=, got {}", other),
    };
    Ok(Value::Number(if holds { 1.0 } else { 0.0 }))
}

fn call(callee: Value, args: Vec<Value>, env: &mut Environment) -> Result<Value, Error> {
    match callee {
        Value::UserFn(func) => {
            if func.params.len() != args.len() {
                return Err(SyntaxError::new(format!(
                    "\"{}\" takes {} argument(s), got {}",
                    func.name,
                    func.params.len(),
                    args.len()
                ))
                .into());
            }
            env.push_frame();
            for (param, value) in func.params.iter().zip(args) {
                env.bind_local(param, value);
            }
            let flow = eval_stmt_list(&func.body.children()[0], env);
            env.pop_frame();
            match flow? {
                Flow::Return(v) => Ok(v),
                Flow::Normal(v) => Ok(v),
                Flow::Break => Err(SyntaxError::new(format!("\"break\" used outside a loop in \"{}\"", func.name)).into()),
            }
        }
        Value::Builtin(b) => {
            if let Some(arity) = b.arity {
                if arity != args.len() {
                    return Err(SyntaxError::new(format!(
                        "\"{}\" takes {} argument(s), got {}",
                        b.name,
                        arity,
                        args.len()
                    ))
                    .into());
                }
            }
            (b.func)(&args)
        }
        other => Err(TypeError::new(format!("{} is not callable", other.type_name())).into()),
    }
}

fn expect_array(value: &Value) -> Result<Array, TypeError> {
    match value {
        Value::Array(a) => Ok(a.clone()),
        other => Err(TypeError::new(format!("expected an array, got a {}", other.type_name()))),
    }
}

fn index_of(value: &Value, len: usize) -> Result<usize, Error> {
    let n = match value {
        Value::Number(n) => n.trunc() as i64,
        other => return Err(TypeError::new(format!("array index must be a number, got a {}", other.type_name())).into()),
    };
    if n < 0 || n as usize >= len {
        return Err(IndexError::new(format!("index {} is out of bounds for an array of length {}", n, len)).into());
    }
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst;
    use crate::langspec;
    use crate::parser::Parser;
    use crate::source::Code;
    use rstest::rstest;

    #[rstest]
    #[case("x = 1 + 2;", "3")]
    #[case("x = \"a\" + 1;", "a1")]
    #[case("x = 5 % 2;", "1")]
    #[case("x = 2 * 3 + 4;", "10")]
    #[case("x = (2 + 3) * 4;", "20")]
    #[case("x = 1 < 2;", "1")]
    #[case("x = 1 >= 2;", "0")]
    fn expressions_evaluate_to_the_expected_display_form(#[case] source: &str, #[case] expected: &str) {
        let mut env = Environment::new();
        run(source, &mut env);
        assert_eq!(env.get("x").unwrap().to_string(), expected);
    }

    fn run(source: &str, env: &mut Environment) {
        let language = langspec::shared();
        let tokens = language.lexer.tokenize(source).unwrap();
        let parser = Parser::new(&language.table);
        let tree = parser.parse(&tokens, &Code::new(source)).unwrap();
        let program = cst::normalize(tree, &language.grammar);
        run_program(&program, env).unwrap();
    }

    #[test]
    fn assigns_and_reads_back_a_variable() {
        let mut env = Environment::new();
        run("x = 1 + 2 * 3;", &mut env);
        assert_eq!(env.get("x").unwrap(), Value::Number(7.0));
    }

    #[test]
    fn if_else_branches_correctly() {
        let mut env = Environment::new();
        run("if (1 > 2) { x = 1; } else { x = 2; }", &mut env);
        assert_eq!(env.get("x").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn while_loop_accumulates() {
        let mut env = Environment::new();
        run("i = 0; total = 0; while (i < 5) { total = total + i; i = i + 1; }", &mut env);
        assert_eq!(env.get("total").unwrap(), Value::Number(10.0));
    }

    #[test]
    fn for_loop_iterates_an_array() {
        let mut env = Environment::new();
        run("total = 0; for (x in {1, 2, 3}) { total = total + x; }", &mut env);
        assert_eq!(env.get("total").unwrap(), Value::Number(6.0));
    }

    #[test]
    fn user_function_returns_a_value() {
        let mut env = Environment::new();
        run("def add(a, b) { return a + b; } result = add(3, 4);", &mut env);
        assert_eq!(env.get("result").unwrap(), Value::Number(7.0));
    }

    #[test]
    fn function_without_return_yields_its_last_statement() {
        let mut env = Environment::new();
        run("def last(a) { a + 1; a * 2; } result = last(3);", &mut env);
        assert_eq!(env.get("result").unwrap(), Value::Number(6.0));
    }

    #[test]
    fn range_literal_builds_inclusive_array() {
        let mut env = Environment::new();
        run("r = {1 .. 3};", &mut env);
        let r = env.get("r").unwrap();
        assert_eq!(r, Value::array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]));
    }

    #[test]
    fn comprehension_with_filter() {
        let mut env = Environment::new();
        run("evens = {x in {1, 2, 3, 4} : x % 2 == 0};", &mut env);
        let evens = env.get("evens").unwrap();
        assert_eq!(evens, Value::array(vec![Value::Number(2.0), Value::Number(4.0)]));
    }

    #[test]
    fn comprehension_with_map_expression() {
        let mut env = Environment::new();
        run("squares = {x in {1, 2, 3, 4} : x % 2 == 0, x * x};", &mut env);
        let squares = env.get("squares").unwrap();
        assert_eq!(squares, Value::array(vec![Value::Number(4.0), Value::Number(16.0)]));
    }

    #[test]
    fn range_literal_exclusive_drops_the_upper_bound() {
        let mut env = Environment::new();
        run("r = {1 ... 4};", &mut env);
        let r = env.get("r").unwrap();
        assert_eq!(r, Value::array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]));
    }

    #[test]
    fn plus_coerces_numbers_into_strings() {
        let mut env = Environment::new();
        run(r#"a = "n=" + 3; b = 3 + "!";"#, &mut env);
        assert_eq!(env.get("a").unwrap(), Value::String("n=3".to_string()));
        assert_eq!(env.get("b").unwrap(), Value::String("3!".to_string()));
    }

    #[test]
    fn plus_concatenates_arrays() {
        let mut env = Environment::new();
        run("a = {1, 2} + {3};", &mut env);
        let a = env.get("a").unwrap();
        assert_eq!(a, Value::array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]));
    }

    #[test]
    fn index_assignment_mutates_in_place() {
        let mut env = Environment::new();
        run("a = {1, 2, 3}; a[1] = 9;", &mut env);
        let a = env.get("a").unwrap();
        assert_eq!(a, Value::array(vec![Value::Number(1.0), Value::Number(9.0), Value::Number(3.0)]));
    }

    #[test]
    fn division_by_zero_is_an_arithmetic_error() {
        let language = langspec::shared();
        let tokens = language.lexer.tokenize("x = 1 / 0;").unwrap();
        let parser = Parser::new(&language.table);
        let tree = parser.parse(&tokens, &Code::new("x = 1 / 0;")).unwrap();
        let program = cst::normalize(tree, &language.grammar);
        let mut env = Environment::new();
        let err = run_program(&program, &mut env).unwrap_err();
        assert!(matches!(err, Error::Arithmetic(_)));
    }

    #[test]
    fn out_of_bounds_index_is_an_index_error() {
        let language = langspec::shared();
        let tokens = language.lexer.tokenize("a = {}; x = a[0];").unwrap();
        let parser = Parser::new(&language.table);
        let tree = parser.parse(&tokens, &Code::new("a = {}; x = a[0];")).unwrap();
        let program = cst::normalize(tree, &language.grammar);
        let mut env = Environment::new();
        let err = run_program(&program, &mut env).unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[test]
    fn arrays_alias_across_assignment() {
        let mut env = Environment::new();
        run("a = {1, 2}; b = a; b[0] = 9;", &mut env);
        assert_eq!(env.get("a").unwrap(), Value::array(vec![Value::Number(9.0), Value::Number(2.0)]));
    }
}

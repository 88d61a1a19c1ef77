//! The default concrete language surface syntax (§6): a small curly-brace,
//! semicolon-terminated, dynamically-typed imperative language with arrays,
//! comprehensions, and first-class user-defined functions.
//!
//! This module wires the embedded `.tok`/`.syn` text through the rest of the
//! pipeline once, via [`shared`], so the CLI and the REPL build the LR(1)
//! table exactly once per process.

use once_cell::sync::OnceCell;

use crate::error::Error;
use crate::grammar::Grammar;
use crate::grammarspec;
use crate::lexer::Lexer;
use crate::lexspec::LexSpec;
use crate::table::ParseTable;

pub const TOKENS: &str = r#"
def = def
if = if
else = else
while = while
for = for
in = in
return = return
break = break
== = ==
<= = <=
>= = >=
&& = &&
|| = ||
... = ...
.. = ..
: = :
{ = {
} = }
( = (
) = )
[ = [
] = ]
; = ;
, = ,
= = =
+ = +
- = -
* = *
/ = /
% = %
< = <
> = >
! = !
id : [A-Za-z_][A-Za-z0-9_]*
num : [0-9]+(\.[0-9]+)?
str : "(?P<val>[^"]*)"
ws < [ \t\r\n]+
comment < #[^\n]*
"#;

pub const GRAMMAR: &str = r#"
: id num str + - * / % == < <= > >= && || ! .. ... [

Program : StmtList

StmtList : Stmt StmtList
         | EMPTY

Stmt < ExprStmt
     | Assign
     | If
     | While
     | For
     | Def
     | Return
     | Break

ExprStmt < Expr ;

Assign : Expr = Expr ;

If : if ( Expr ) Block else Block
   | if ( Expr ) Block

While : while ( Expr ) Block

For : for ( id in Expr ) Block

Def : def id ( Params ) Block

Params : id ParamsTail
       | EMPTY

ParamsTail : , id ParamsTail
           | EMPTY

Return : return Expr ;
       | return ;

Break : break ;

Block : { StmtList }

Expr < Or

Or : Or || And
   | And

And : And && Eq
    | Eq

Eq : Eq == Rel
   | Rel

Rel : Rel < Add
    | Rel <= Add
    | Rel > Add
    | Rel >= Add
    | Add

Add : Add + Mul
    | Add - Mul
    | Mul

Mul : Mul * Unary
    | Mul / Unary
    | Mul % Unary
    | Unary

Unary : ! Unary
      | Postfix

Postfix : Postfix ( Args )
        | Postfix [ Expr ]
        | Atom

Args : Expr ArgsTail
     | EMPTY

ArgsTail : , Expr ArgsTail
         | EMPTY

Atom < num
     | str
     | id
     | ( Expr )
     | Array

Array : { ArrayBody }

ArrayBody : Expr ArrayBodyTail
          | EMPTY

ArrayBodyTail : , Expr ArrayBodyTail
              | .. Expr
              | ... Expr
              | in Expr : Expr CompTail
              | EMPTY

CompTail : , Expr
         | EMPTY
"#;

/// The lexer, grammar, and LR(1) table for the default language, built once.
pub struct Language {
    pub lexer: Lexer,
    pub grammar: Grammar,
    pub table: ParseTable,
}

impl Language {
    fn load() -> Result<Self, Error> {
        let lex_spec = LexSpec::parse(TOKENS)?;
        let lexer = Lexer::build(&lex_spec)?;
        let grammar = grammarspec::parse(GRAMMAR)?;
        let table = ParseTable::build(&grammar)?;
        Ok(Self { lexer, grammar, table })
    }
}

/// The default language, built on first use and reused for the rest of the process.
pub fn shared() -> &'static Language {
    static LANGUAGE: OnceCell<Language> = OnceCell::new();
    LANGUAGE.get_or_init(|| Language::load().expect("the embedded default language spec is well-formed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst;
    use crate::parser::Parser;
    use crate::source::Code;

    fn parse(source: &str) -> cst::Node {
        let language = shared();
        let tokens = language.lexer.tokenize(source).unwrap();
        let parser = Parser::new(&language.table);
        let tree = parser.parse(&tokens, &Code::new(source)).unwrap();
        cst::normalize(tree, &language.grammar)
    }

    #[test]
    fn parses_empty_program() {
        let tree = parse("");
        assert_eq!(tree.label(), "Program");
    }

    #[test]
    fn parses_arithmetic_expression_statement() {
        parse("1 + 2 * 3;");
    }

    #[test]
    fn parses_if_else_while_for_def() {
        parse(
            r#"
            def add(a, b) {
                return a + b;
            }
            if (add(1, 2) > 2) {
                x = 1;
            } else {
                x = 0;
            }
            while (x < 10) {
                x = x + 1;
            }
            for (i in arr) {
                print(i);
            }
            "#,
        );
    }

    #[test]
    fn parses_array_literal_range_and_comprehension() {
        parse("a = {1, 2, 3};");
        parse("b = {1 .. 10};");
        parse("c = {1 ... 10};");
        parse("d = {x in a : x % 2 == 0, x * x};");
    }

    #[test]
    fn parses_empty_array_and_indexing() {
        let tree = parse("a = {}; b = a[0];");
        assert_eq!(tree.label(), "Program");
    }
}

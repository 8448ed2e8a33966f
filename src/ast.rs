//! Expression and program tree.
//!
//! The AST is immutable and fully typed: every special form is its own
//! variant, so the evaluator's dispatch is an exhaustive match and a new form
//! is a compile-time-checked addition. Primitive-operator references are
//! resolved while building the tree to pointers into the fixed table in
//! [`crate::builtinops`], so the evaluator never looks primitives up by name.
//!
//! `Display` unparses a tree back to surface syntax; the closure printer and
//! the REPL both rely on it.

use std::fmt;

use crate::builtinops::BuiltinOp;
use crate::value::{fmt_datum, Value};

/// Allowed non-alphanumeric characters in symbol names.
pub const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_$";

/// Check if a string is a valid symbol name.
/// Valid: non-empty, no leading digit, no "-digit" prefix, alphanumeric +
/// [`SYMBOL_SPECIAL_CHARS`].
pub fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false,
        Some(first) => {
            if first.is_ascii_digit() {
                return false;
            }
            if first == '-' {
                if let Some(second) = chars.next() {
                    if second.is_ascii_digit() {
                        return false;
                    }
                }
            }
            name.chars()
                .all(|c| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
        }
    }
}

/// An expression. All sub-expression sequences are ordered; binding-form
/// bodies are non-empty by construction when built through the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Bool(bool),
    Str(String),
    /// Variable reference, resolved against the environment chain at run time.
    Var(String),
    /// Primitive-operator reference; evaluates to itself.
    Prim(&'static BuiltinOp),
    /// Quoted literal datum. Only data variants of [`Value`] ever appear here.
    Lit(Value),
    If {
        test: Box<Expr>,
        then: Box<Expr>,
        alt: Box<Expr>,
    },
    Lambda {
        params: Vec<String>,
        body: Vec<Expr>,
    },
    App {
        rator: Box<Expr>,
        rands: Vec<Expr>,
    },
    /// Non-recursive local binding: right-hand sides see only the outer scope.
    Let {
        bindings: Vec<(String, Expr)>,
        body: Vec<Expr>,
    },
    /// Recursive local binding: right-hand sides see all sibling names.
    Letrec {
        bindings: Vec<(String, Expr)>,
        body: Vec<Expr>,
    },
    Set {
        name: String,
        expr: Box<Expr>,
    },
}

/// A top-level form. Definitions are only legal here, never nested.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Define { name: String, expr: Expr },
    Expr(Expr),
}

/// An ordered sequence of top-level forms, evaluated left to right against
/// one global environment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub forms: Vec<Form>,
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &[Expr]) -> fmt::Result {
    for expr in body {
        write!(f, " {expr}")?;
    }
    Ok(())
}

fn write_bindings(f: &mut fmt::Formatter<'_>, bindings: &[(String, Expr)]) -> fmt::Result {
    write!(f, "(")?;
    for (i, (name, expr)) in bindings.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "({name} {expr})")?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{n}"),
            Expr::Bool(true) => write!(f, "#t"),
            Expr::Bool(false) => write!(f, "#f"),
            Expr::Str(s) => write!(f, "\"{s}\""),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Prim(op) => write!(f, "{}", op.name),
            Expr::Lit(value) => {
                write!(f, "'")?;
                fmt_datum(value, f)
            }
            Expr::If { test, then, alt } => write!(f, "(if {test} {then} {alt})"),
            Expr::Lambda { params, body } => {
                write!(f, "(lambda (")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ")")?;
                write_body(f, body)?;
                write!(f, ")")
            }
            Expr::App { rator, rands } => {
                write!(f, "({rator}")?;
                write_body(f, rands)?;
                write!(f, ")")
            }
            Expr::Let { bindings, body } => {
                write!(f, "(let ")?;
                write_bindings(f, bindings)?;
                write_body(f, body)?;
                write!(f, ")")
            }
            Expr::Letrec { bindings, body } => {
                write!(f, "(letrec ")?;
                write_bindings(f, bindings)?;
                write_body(f, body)?;
                write!(f, ")")
            }
            Expr::Set { name, expr } => write!(f, "(set! {name} {expr})"),
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::Define { name, expr } => write!(f, "(define {name} {expr})"),
            Form::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, form) in self.forms.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{form}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::builtinops::find_op;

    #[test]
    fn symbol_validity() {
        assert!(is_valid_symbol("foo"));
        assert!(is_valid_symbol("+"));
        assert!(is_valid_symbol("set!"));
        assert!(is_valid_symbol("string=?"));
        assert!(is_valid_symbol("-abc"));
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("1foo"));
        assert!(!is_valid_symbol("-1"));
        assert!(!is_valid_symbol("a b"));
        assert!(!is_valid_symbol("a@b"));
    }

    #[test]
    fn unparse_application_and_if() {
        let add = find_op("+").unwrap();
        let expr = Expr::If {
            test: Box::new(Expr::App {
                rator: Box::new(Expr::Prim(add)),
                rands: vec![Expr::Var("x".into()), Expr::Num(1.0)],
            }),
            then: Box::new(Expr::Bool(true)),
            alt: Box::new(Expr::Str("no".into())),
        };
        assert_eq!(expr.to_string(), "(if (+ x 1) #t \"no\")");
    }

    #[test]
    fn unparse_binding_forms() {
        let expr = Expr::Let {
            bindings: vec![("x".into(), Expr::Num(1.0)), ("y".into(), Expr::Num(2.0))],
            body: vec![Expr::Var("y".into())],
        };
        assert_eq!(expr.to_string(), "(let ((x 1) (y 2)) y)");

        let expr = Expr::Set {
            name: "x".into(),
            expr: Box::new(Expr::Num(3.0)),
        };
        assert_eq!(expr.to_string(), "(set! x 3)");
    }

    #[test]
    fn unparse_quoted_data() {
        let lit = Expr::Lit(Value::list(vec![
            Value::Number(1.0),
            Value::Nil,
            Value::Symbol("a".into()),
        ]));
        assert_eq!(lit.to_string(), "'(1 () a)");
        assert_eq!(Expr::Lit(Value::Nil).to_string(), "'()");
    }

    #[test]
    fn unparse_define_form() {
        let form = Form::Define {
            name: "sq".into(),
            expr: Expr::Lambda {
                params: vec!["x".into()],
                body: vec![Expr::App {
                    rator: Box::new(Expr::Prim(find_op("*").unwrap())),
                    rands: vec![Expr::Var("x".into()), Expr::Var("x".into())],
                }],
            },
        };
        assert_eq!(form.to_string(), "(define sq (lambda (x) (* x x)))");
    }
}

//! S-expression front end: reader plus syntax analysis.
//!
//! Parsing is two-staged, like the rest of the pipeline it feeds: a nom-based
//! reader turns text into plain datums (numbers, booleans, strings, symbols,
//! lists), then syntax analysis maps datums onto the typed [`Expr`]/[`Form`]
//! tree, recognizing the special forms `quote`, `if`, `lambda`, `let`,
//! `letrec`, `set!`, and `define` (top level only) and rejecting malformed
//! shapes with [`Error::MalformedExpression`].
//!
//! The reader guards its own recursion with [`MAX_PARSE_DEPTH`]; evaluation
//! has no such guard.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{opt, recognize, value},
    error::ErrorKind,
    multi::separated_list0,
    sequence::{pair, preceded, terminated},
    IResult, Parser,
};

use crate::ast::{is_valid_symbol, Expr, Form, Program, SYMBOL_SPECIAL_CHARS};
use crate::builtinops::find_op;
use crate::value::Value;
use crate::{Error, ParseError, ParseErrorKind, MAX_PARSE_DEPTH};

/// Names with special-form meaning; never variables, never operators.
const KEYWORDS: &[&str] = &["quote", "if", "lambda", "let", "letrec", "set!", "define"];

/// A raw S-expression as the reader sees it, before syntax analysis.
#[derive(Debug, Clone, PartialEq)]
enum Datum {
    Num(f64),
    Bool(bool),
    Str(String),
    Sym(String),
    List(Vec<Datum>),
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Num(n) => write!(f, "{n}"),
            Datum::Bool(true) => write!(f, "#t"),
            Datum::Bool(false) => write!(f, "#f"),
            Datum::Str(s) => write!(f, "\"{s}\""),
            Datum::Sym(s) => write!(f, "{s}"),
            Datum::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

//
// Reader
//

/// Convert a nom failure to a structured [`ParseError`].
fn reader_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => ParseError::new(
                    ParseErrorKind::TooDeeplyNested,
                    format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                ),
                _ => {
                    if offset < input.len() {
                        ParseError::with_context(
                            ParseErrorKind::InvalidSyntax,
                            "invalid syntax",
                            input,
                            offset,
                        )
                    } else {
                        ParseError::new(ParseErrorKind::Incomplete, "unexpected end of input")
                    }
                }
            }
        }
        nom::Err::Incomplete(_) => {
            ParseError::new(ParseErrorKind::Incomplete, "incomplete input")
        }
    }
}

/// Parse a number: optional sign, digits, optional fractional part.
fn parse_number(input: &str) -> IResult<&str, Datum> {
    let (rest, number_str) = recognize(pair(
        opt(char('-')),
        pair(
            take_while1(|c: char| c.is_ascii_digit()),
            opt(pair(char('.'), take_while1(|c: char| c.is_ascii_digit()))),
        ),
    ))
    .parse(input)?;

    match number_str.parse::<f64>() {
        Ok(n) => Ok((rest, Datum::Num(n))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        ))),
    }
}

/// Parse a boolean (#t or #f)
fn parse_bool(input: &str) -> IResult<&str, Datum> {
    alt((
        value(Datum::Bool(true), tag("#t")),
        value(Datum::Bool(false), tag("#f")),
    ))
    .parse(input)
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> IResult<&str, Datum> {
    let mut symbol_chars =
        take_while1(|c: char| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c));

    let (remaining, candidate) = symbol_chars.parse(input)?;

    if is_valid_symbol(candidate) {
        Ok((remaining, Datum::Sym(candidate.into())))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

/// Parse a string literal with `\n \t \r \\ \"` escapes.
fn parse_string(input: &str) -> IResult<&str, Datum> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut chars = Vec::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => {
                return Ok((char_iter.as_str(), Datum::Str(chars.into_iter().collect())));
            }
            Some('\\') => {
                match char_iter.next() {
                    Some('n') => chars.push('\n'),
                    Some('t') => chars.push('\t'),
                    Some('r') => chars.push('\r'),
                    Some('\\') => chars.push('\\'),
                    Some('"') => chars.push('"'),
                    _ => {
                        // Unknown or incomplete escape sequence
                        return Err(nom::Err::Error(nom::error::Error::new(
                            remaining,
                            ErrorKind::Char,
                        )));
                    }
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                chars.push(ch);
                remaining = char_iter.as_str();
            }
            None => {
                // End of input without a closing quote
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    ErrorKind::Char,
                )));
            }
        }
    }
}

fn parse_list(input: &str, depth: usize) -> IResult<&str, Datum> {
    let (input, _) = char('(').parse(input)?;
    let (input, elements) =
        separated_list0(multispace1, |input| parse_datum(input, depth + 1)).parse(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char(')').parse(input)?;
    Ok((input, Datum::List(elements)))
}

/// Parse quoted shorthand: 'expr reads as (quote expr).
fn parse_quote(input: &str, depth: usize) -> IResult<&str, Datum> {
    let (input, _) = char('\'').parse(input)?;
    let (input, datum) = parse_datum(input, depth + 1)?;
    Ok((
        input,
        Datum::List(vec![Datum::Sym("quote".into()), datum]),
    ))
}

fn parse_datum(input: &str, depth: usize) -> IResult<&str, Datum> {
    if depth >= MAX_PARSE_DEPTH {
        // Failure, not Error: list/alt combinators must not backtrack past it.
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        multispace0,
        alt((
            |input| parse_quote(input, depth),
            |input| parse_list(input, depth),
            parse_number,
            parse_bool,
            parse_string,
            parse_symbol,
        )),
    )
    .parse(input)
}

/// Read exactly one datum; trailing input is an error.
fn read_one(input: &str) -> Result<Datum, ParseError> {
    match terminated(|input| parse_datum(input, 0), multispace0).parse(input) {
        Ok(("", datum)) => Ok(datum),
        Ok((remaining, _)) => Err(ParseError::with_context(
            ParseErrorKind::TrailingContent,
            "unexpected trailing input",
            input,
            input.len() - remaining.len(),
        )),
        Err(e) => Err(reader_error(input, e)),
    }
}

/// Read a whitespace-separated sequence of datums until the input runs out.
fn read_many(input: &str) -> Result<Vec<Datum>, ParseError> {
    let mut rest = input;
    let mut datums = Vec::new();
    loop {
        if rest.trim_start().is_empty() {
            break;
        }
        match parse_datum(rest, 0) {
            Ok((next, datum)) => {
                datums.push(datum);
                rest = next;
            }
            Err(e) => return Err(reader_error(input, e)),
        }
    }
    Ok(datums)
}

//
// Syntax analysis
//

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedExpression(message.into())
}

/// A name usable in a binding position: not a keyword, not a primitive.
fn bindable_name(name: &str) -> Result<String, Error> {
    if KEYWORDS.contains(&name) {
        return Err(malformed(format!("{name} is a keyword and cannot be bound")));
    }
    if find_op(name).is_some() {
        return Err(malformed(format!("cannot rebind primitive operator {name}")));
    }
    Ok(name.to_string())
}

fn binding_name(datum: &Datum) -> Result<String, Error> {
    match datum {
        Datum::Sym(name) => bindable_name(name),
        other => Err(malformed(format!("expected a variable name, got {other}"))),
    }
}

fn param_list(datum: &Datum) -> Result<Vec<String>, Error> {
    let Datum::List(items) = datum else {
        return Err(malformed("lambda parameters must be a list"));
    };
    let mut params = Vec::with_capacity(items.len());
    for item in items {
        let name = binding_name(item)?;
        if params.contains(&name) {
            return Err(malformed(format!("duplicate parameter name: {name}")));
        }
        params.push(name);
    }
    Ok(params)
}

fn body_exprs(rest: &[Datum], form: &str) -> Result<Vec<Expr>, Error> {
    if rest.is_empty() {
        return Err(malformed(format!("{form} body must be non-empty")));
    }
    rest.iter().map(expr_from_datum).collect()
}

fn binding_specs(datum: &Datum, form: &str) -> Result<Vec<(String, Expr)>, Error> {
    let Datum::List(specs) = datum else {
        return Err(malformed(format!("{form} bindings must be a list")));
    };
    let mut bindings: Vec<(String, Expr)> = Vec::with_capacity(specs.len());
    for spec in specs {
        let Datum::List(parts) = spec else {
            return Err(malformed(format!("{form} binding must be (name expression)")));
        };
        let [name_datum, rhs] = parts.as_slice() else {
            return Err(malformed(format!("{form} binding must be (name expression)")));
        };
        let name = binding_name(name_datum)?;
        if bindings.iter().any(|(bound, _)| bound == &name) {
            return Err(malformed(format!("duplicate binding name: {name}")));
        }
        bindings.push((name, expr_from_datum(rhs)?));
    }
    Ok(bindings)
}

fn binding_form(
    rest: &[Datum],
    form: &str,
    build: fn(Vec<(String, Expr)>, Vec<Expr>) -> Expr,
) -> Result<Expr, Error> {
    let [specs, body @ ..] = rest else {
        return Err(malformed(format!("{form} expects bindings and a body")));
    };
    let bindings = binding_specs(specs, form)?;
    let body = body_exprs(body, form)?;
    Ok(build(bindings, body))
}

/// Convert a quoted datum to its literal value: lists fold right-to-left into
/// pair chains ending in the empty-list marker.
fn value_from_datum(datum: &Datum) -> Value {
    match datum {
        Datum::Num(n) => Value::Number(*n),
        Datum::Bool(b) => Value::Bool(*b),
        Datum::Str(s) => Value::Str(s.clone()),
        Datum::Sym(s) => Value::Symbol(s.clone()),
        Datum::List(items) => items
            .iter()
            .rev()
            .fold(Value::Nil, |tail, item| {
                Value::cons(value_from_datum(item), tail)
            }),
    }
}

fn expr_from_datum(datum: &Datum) -> Result<Expr, Error> {
    match datum {
        Datum::Num(n) => Ok(Expr::Num(*n)),
        Datum::Bool(b) => Ok(Expr::Bool(*b)),
        Datum::Str(s) => Ok(Expr::Str(s.clone())),
        Datum::Sym(name) => {
            if KEYWORDS.contains(&name.as_str()) {
                Err(malformed(format!("{name} cannot be used as an expression")))
            } else if let Some(op) = find_op(name) {
                Ok(Expr::Prim(op))
            } else {
                Ok(Expr::Var(name.clone()))
            }
        }
        Datum::List(elements) => expr_from_list(elements),
    }
}

fn expr_from_list(elements: &[Datum]) -> Result<Expr, Error> {
    let [head, rest @ ..] = elements else {
        return Err(malformed("cannot evaluate the empty combination ()"));
    };

    if let Datum::Sym(name) = head {
        match name.as_str() {
            "quote" => {
                return match rest {
                    [datum] => Ok(Expr::Lit(value_from_datum(datum))),
                    _ => Err(malformed("quote expects exactly one datum")),
                };
            }
            "if" => {
                return match rest {
                    [test, then, alt] => Ok(Expr::If {
                        test: Box::new(expr_from_datum(test)?),
                        then: Box::new(expr_from_datum(then)?),
                        alt: Box::new(expr_from_datum(alt)?),
                    }),
                    _ => Err(malformed(
                        "if expects a test, a consequent, and an alternative",
                    )),
                };
            }
            "lambda" => {
                return match rest {
                    [params, body @ ..] => Ok(Expr::Lambda {
                        params: param_list(params)?,
                        body: body_exprs(body, "lambda")?,
                    }),
                    [] => Err(malformed("lambda expects a parameter list and a body")),
                };
            }
            "let" => {
                return binding_form(rest, "let", |bindings, body| Expr::Let { bindings, body });
            }
            "letrec" => {
                return binding_form(rest, "letrec", |bindings, body| Expr::Letrec {
                    bindings,
                    body,
                });
            }
            "set!" => {
                return match rest {
                    [target, rhs] => Ok(Expr::Set {
                        name: binding_name(target)?,
                        expr: Box::new(expr_from_datum(rhs)?),
                    }),
                    _ => Err(malformed("set! expects a variable and one expression")),
                };
            }
            "define" => return Err(malformed("define is only allowed at the top level")),
            _ => {}
        }
    }

    let rator = expr_from_datum(head)?;
    let rands = rest
        .iter()
        .map(expr_from_datum)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::App {
        rator: Box::new(rator),
        rands,
    })
}

fn form_from_datum(datum: &Datum) -> Result<Form, Error> {
    if let Datum::List(elements) = datum {
        if let [Datum::Sym(head), rest @ ..] = elements.as_slice() {
            if head == "define" {
                return match rest {
                    [name_datum, rhs] => Ok(Form::Define {
                        name: binding_name(name_datum)?,
                        expr: expr_from_datum(rhs)?,
                    }),
                    _ => Err(malformed("define expects a name and one expression")),
                };
            }
        }
    }
    Ok(Form::Expr(expr_from_datum(datum)?))
}

//
// Public API
//

/// Parse a single expression.
pub fn parse_expr(input: &str) -> Result<Expr, Error> {
    let datum = read_one(input)?;
    expr_from_datum(&datum)
}

/// Parse a single top-level form (a definition or an expression).
pub fn parse_form(input: &str) -> Result<Form, Error> {
    let datum = read_one(input)?;
    form_from_datum(&datum)
}

/// Parse a whole program: a sequence of top-level forms. Empty input is an
/// empty program; the driver reports it as such at evaluation time.
pub fn parse_program(input: &str) -> Result<Program, Error> {
    let datums = read_many(input)?;
    let forms = datums
        .iter()
        .map(form_from_datum)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program { forms })
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Expected outcome for a parse test case.
    #[derive(Debug)]
    enum Expected {
        /// Parses, and unparses back to exactly this text.
        Unparses(&'static str),
        /// Fails analysis; the message contains this fragment.
        Malformed(&'static str),
        /// Fails in the reader.
        ReadError,
    }
    use Expected::{Malformed, ReadError, Unparses};

    fn run_cases(cases: &[(&str, Expected)]) {
        for (i, (input, expected)) in cases.iter().enumerate() {
            let test_id = format!("parse case #{}", i + 1);
            let result = parse_expr(input);
            match (result, expected) {
                (Ok(expr), Unparses(text)) => {
                    let unparsed = expr.to_string();
                    assert_eq!(&unparsed, text, "{test_id}: unparse mismatch");
                    // Unparsed text must read back to the same tree.
                    let reparsed = parse_expr(&unparsed).unwrap_or_else(|e| {
                        panic!("{test_id}: round-trip failed for '{unparsed}': {e:?}")
                    });
                    assert_eq!(reparsed, expr, "{test_id}: round-trip tree mismatch");
                }
                (Err(Error::MalformedExpression(msg)), Malformed(fragment)) => {
                    assert!(
                        msg.contains(fragment),
                        "{test_id}: expected '{fragment}' in '{msg}'"
                    );
                }
                (Err(Error::Parse(_)), ReadError) => {}
                (result, expected) => {
                    panic!("{test_id}: expected {expected:?}, got {result:?}");
                }
            }
        }
    }

    #[test]
    fn atoms() {
        run_cases(&[
            ("42", Unparses("42")),
            ("-5", Unparses("-5")),
            ("3.14", Unparses("3.14")),
            ("-0.5", Unparses("-0.5")),
            ("1.50", Unparses("1.5")),
            ("#t", Unparses("#t")),
            ("#f", Unparses("#f")),
            ("\"hello\"", Unparses("\"hello\"")),
            ("\"\"", Unparses("\"\"")),
            ("foo", Unparses("foo")),
            ("-abc", Unparses("-abc")),
            ("two-words?", Unparses("two-words?")),
            ("  42  ", Unparses("42")),
            ("\t#t\n", Unparses("#t")),
            // Primitive references are still atoms
            ("+", Unparses("+")),
            ("string=?", Unparses("string=?")),
        ])
    }

    #[test]
    fn atom_reader_failures() {
        run_cases(&[
            ("", ReadError),
            ("   ", ReadError),
            (")", ReadError),
            ("(1 2", ReadError),
            ("1 2", ReadError),   // trailing content for parse_expr
            ("123abc", ReadError),
            ("-42name", ReadError),
            ("@invalid", ReadError),
            ("#true", ReadError),
            ("\"unterminated", ReadError),
            (r#""bad\xescape""#, ReadError),
            ("3.", ReadError),
        ])
    }

    #[test]
    fn string_escapes() {
        run_cases(&[
            (r#""line\nbreak""#, Unparses("\"line\nbreak\"")),
            (r#""tab\there""#, Unparses("\"tab\there\"")),
        ]);
        // Quote and backslash escapes decode to the literal character. These
        // do not round-trip through the printer, which renders strings raw.
        match parse_expr(r#""quote\"inside""#).unwrap() {
            Expr::Str(s) => assert_eq!(s, "quote\"inside"),
            other => panic!("expected string, got {other:?}"),
        }
        match parse_expr(r#""back\\slash""#).unwrap() {
            Expr::Str(s) => assert_eq!(s, "back\\slash"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn applications_and_special_forms() {
        run_cases(&[
            ("(+ 1 2)", Unparses("(+ 1 2)")),
            ("(f)", Unparses("(f)")),
            ("(f 1 \"x\" #t)", Unparses("(f 1 \"x\" #t)")),
            ("((lambda (x) x) 5)", Unparses("((lambda (x) x) 5)")),
            ("(if #t 1 2)", Unparses("(if #t 1 2)")),
            ("( if #t 1 2 )", Unparses("(if #t 1 2)")),
            ("(lambda (x y) (+ x y))", Unparses("(lambda (x y) (+ x y))")),
            ("(lambda () 1 2)", Unparses("(lambda () 1 2)")),
            ("(let ((x 1) (y 2)) (+ x y))", Unparses("(let ((x 1) (y 2)) (+ x y))")),
            ("(letrec ((f (lambda (n) (f n)))) (f 1))", Unparses("(letrec ((f (lambda (n) (f n)))) (f 1))")),
            ("(set! x (+ x 1))", Unparses("(set! x (+ x 1))")),
        ])
    }

    #[test]
    fn quotation() {
        run_cases(&[
            ("'foo", Unparses("'foo")),
            ("(quote foo)", Unparses("'foo")),
            ("'(1 2 3)", Unparses("'(1 2 3)")),
            ("''a", Unparses("'(quote a)")),
            ("'()", Unparses("'()")),
            ("'(a (b c) \"s\")", Unparses("'(a (b c) \"s\")")),
        ]);
        // Quoted lists become pair chains ending in the empty-list marker.
        match parse_expr("'(1 2)").unwrap() {
            Expr::Lit(value) => assert_eq!(value.to_string(), "(1 2)"),
            other => panic!("expected literal, got {other:?}"),
        }
        match parse_expr("'x").unwrap() {
            Expr::Lit(Value::Symbol(s)) => assert_eq!(s, "x"),
            other => panic!("expected symbol literal, got {other:?}"),
        }
    }

    #[test]
    fn malformed_special_forms() {
        run_cases(&[
            ("()", Malformed("empty combination")),
            ("(if #t 1)", Malformed("if expects")),
            ("(if #t 1 2 3)", Malformed("if expects")),
            ("(quote)", Malformed("quote expects")),
            ("(quote a b)", Malformed("quote expects")),
            ("(lambda (x))", Malformed("body must be non-empty")),
            ("(lambda x x)", Malformed("parameters must be a list")),
            ("(lambda (x x) x)", Malformed("duplicate parameter")),
            ("(lambda (1) 1)", Malformed("expected a variable name")),
            ("(let ((x 1)))", Malformed("body must be non-empty")),
            ("(let (x 1) x)", Malformed("binding must be")),
            ("(let ((x 1) (x 2)) x)", Malformed("duplicate binding")),
            ("(let x x)", Malformed("bindings must be a list")),
            ("(letrec)", Malformed("letrec expects")),
            ("(set! x)", Malformed("set! expects")),
            ("(set! 1 2)", Malformed("expected a variable name")),
            ("(set! if 2)", Malformed("keyword")),
            ("(set! car 2)", Malformed("primitive")),
            ("(define x 1)", Malformed("top level")),
            ("(let ((if 1)) 2)", Malformed("keyword")),
            ("(let ((car 1)) 2)", Malformed("primitive")),
            ("if", Malformed("cannot be used as an expression")),
            ("lambda", Malformed("cannot be used as an expression")),
        ])
    }

    #[test]
    fn reader_depth_limit() {
        let under = format!(
            "{}1{}",
            "(".repeat(MAX_PARSE_DEPTH - 1),
            ")".repeat(MAX_PARSE_DEPTH - 1)
        );
        let over = format!(
            "{}1{}",
            "(".repeat(MAX_PARSE_DEPTH),
            ")".repeat(MAX_PARSE_DEPTH)
        );
        assert!(parse_expr(&under).is_ok());
        match parse_expr(&over) {
            Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::TooDeeplyNested),
            other => panic!("expected depth error, got {other:?}"),
        }
    }

    #[test]
    fn trailing_content_is_reported_with_its_kind() {
        match parse_expr("(+ 1 2) extra") {
            Err(Error::Parse(e)) => assert_eq!(e.kind, ParseErrorKind::TrailingContent),
            other => panic!("expected trailing-content error, got {other:?}"),
        }
    }

    #[test]
    fn forms_distinguish_defines_from_expressions() {
        match parse_form("(define x 1)").unwrap() {
            Form::Define { name, expr } => {
                assert_eq!(name, "x");
                assert_eq!(expr, Expr::Num(1.0));
            }
            other => panic!("expected define, got {other:?}"),
        }
        match parse_form("(+ 1 2)").unwrap() {
            Form::Expr(_) => {}
            other => panic!("expected expression form, got {other:?}"),
        }
        assert!(matches!(
            parse_form("(define (f x) x)"),
            Err(Error::MalformedExpression(_))
        ));
        assert!(matches!(
            parse_form("(define car 1)"),
            Err(Error::MalformedExpression(_))
        ));
    }

    #[test]
    fn programs_are_form_sequences() {
        let program = parse_program("(define x 1) (define y 2) (+ x y)").unwrap();
        assert_eq!(program.forms.len(), 3);
        assert_eq!(
            program.to_string(),
            "(define x 1)\n(define y 2)\n(+ x y)"
        );

        // Empty input is an empty program, not a parse error.
        assert_eq!(parse_program("").unwrap().forms.len(), 0);
        assert_eq!(parse_program("  \n ").unwrap().forms.len(), 0);

        // Nested defines are still rejected.
        assert!(matches!(
            parse_program("(+ 1 (define x 2))"),
            Err(Error::MalformedExpression(_))
        ));
    }

    #[test]
    fn primitive_names_resolve_to_table_entries() {
        match parse_expr("(car x)").unwrap() {
            Expr::App { rator, .. } => match *rator {
                Expr::Prim(op) => assert_eq!(op.name, "car"),
                other => panic!("expected primitive rator, got {other:?}"),
            },
            other => panic!("expected application, got {other:?}"),
        }
        // Unknown names stay variable references.
        assert_eq!(parse_expr("frobnicate").unwrap(), Expr::Var("frobnicate".into()));
    }
}

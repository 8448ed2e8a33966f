//! The evaluation engine and the session driver.
//!
//! [`eval`] is a pure recursive function from (expression, environment) to
//! value-or-error, dispatching exhaustively on the expression variant.
//! Evaluation is applicative-order: operator first, then every operand left
//! to right, all eager. Failures are ordinary [`Error`] values threaded back
//! through each step; when several sibling evaluations fail (operands,
//! binding right-hand sides) the failures are aggregated before the form
//! aborts.
//!
//! There is no call-depth guard and no suspension point: evaluation is
//! strictly sequential recursion, bounded only by the host stack.
//!
//! [`Interpreter`] owns one global environment per session and drives
//! programs: top-level forms run strictly in order, definitions mutate the
//! global frame in place, and the final expression's value is the program
//! result.

use std::rc::Rc;

use tracing::trace;

use crate::ast::{Expr, Form, Program};
use crate::env::{Env, GlobalEnv};
use crate::value::{Closure, Value};
use crate::Error;

/// Any value other than boolean `#f` selects the "then" branch.
pub fn is_true(value: &Value) -> bool {
    !matches!(value, Value::Bool(false))
}

/// Evaluate one expression in an environment.
pub fn eval(expr: &Expr, env: &Env) -> Result<Value, Error> {
    match expr {
        Expr::Num(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Prim(op) => Ok(Value::Prim(*op)),
        Expr::Lit(value) => Ok(value.clone()),
        Expr::Var(name) => env.lookup(name),
        Expr::If { test, then, alt } => {
            let condition = eval(test, env)?;
            if is_true(&condition) {
                eval(then, env)
            } else {
                eval(alt, env)
            }
        }
        Expr::Lambda { params, body } => Ok(make_closure(params, body, env)),
        Expr::App { rator, rands } => {
            // Operator errors abort before any operand is touched.
            let proc = eval(rator, env)?;
            let args = eval_all(rands, env)?;
            apply(&proc, args)
        }
        Expr::Let { bindings, body } => eval_let(bindings, body, env),
        Expr::Letrec { bindings, body } => eval_letrec(bindings, body, env),
        Expr::Set { name, expr } => eval_set(name, expr, env),
    }
}

/// Apply a procedure value to fully evaluated arguments.
pub fn apply(proc: &Value, args: Vec<Value>) -> Result<Value, Error> {
    match proc {
        Value::Prim(op) => op.apply(&args),
        Value::Closure(closure) => apply_closure(closure, args),
        other => Err(Error::NotAProcedure(other.to_string())),
    }
}

/// Evaluate a non-empty expression sequence; the last value wins.
pub fn eval_seq(body: &[Expr], env: &Env) -> Result<Value, Error> {
    let (last, init) = body.split_last().ok_or(Error::EmptyProgram)?;
    for expr in init {
        eval(expr, env)?;
    }
    eval(last, env)
}

/// A closure captures the *current* environment by reference, with a fresh
/// identity tag from the session counter.
fn make_closure(params: &[String], body: &[Expr], env: &Env) -> Value {
    Value::Closure(Rc::new(Closure {
        id: env.global().fresh_closure_id(),
        params: params.to_vec(),
        body: body.to_vec(),
        env: env.clone(),
    }))
}

/// Evaluate every expression left to right, even past failures, so the
/// aggregate reports all of them.
fn eval_all(exprs: &[Expr], env: &Env) -> Result<Vec<Value>, Error> {
    let mut values = Vec::with_capacity(exprs.len());
    let mut errors = Vec::new();
    for expr in exprs {
        match eval(expr, env) {
            Ok(value) => values.push(value),
            Err(error) => errors.push(error),
        }
    }
    if errors.is_empty() {
        Ok(values)
    } else {
        Err(Error::aggregate(errors))
    }
}

fn apply_closure(closure: &Rc<Closure>, args: Vec<Value>) -> Result<Value, Error> {
    if closure.params.len() != args.len() {
        return Err(Error::ArityMismatch {
            expected: closure.params.len(),
            got: args.len(),
        });
    }
    trace!(closure = closure.id, "apply closure");
    // Lexical scoping: the new frame's parent is the closure's captured
    // environment, never the caller's.
    let call_env = closure.env.extend(closure.params.clone(), args);
    eval_seq(&closure.body, &call_env)
}

/// Right-hand sides run in the *outer* environment: sibling initializers
/// cannot see each other's new names.
fn eval_let(bindings: &[(String, Expr)], body: &[Expr], env: &Env) -> Result<Value, Error> {
    let mut values = Vec::with_capacity(bindings.len());
    let mut errors = Vec::new();
    for (_, rhs) in bindings {
        match eval(rhs, env) {
            Ok(value) => values.push(value),
            Err(error) => errors.push(error),
        }
    }
    if !errors.is_empty() {
        return Err(Error::aggregate(errors));
    }
    let names = bindings.iter().map(|(name, _)| name.clone()).collect();
    eval_seq(body, &env.extend(names, values))
}

/// Two-phase recursive binding: extend with placeholders, evaluate every
/// right-hand side in the extended environment (sibling references resolve
/// to the placeholder, never to a lookup failure), then patch each cell in
/// place. Any initializer error aborts before patching.
fn eval_letrec(bindings: &[(String, Expr)], body: &[Expr], env: &Env) -> Result<Value, Error> {
    let names: Vec<String> = bindings.iter().map(|(name, _)| name.clone()).collect();
    let ext_env = env.extend(names, vec![Value::Void; bindings.len()]);

    let mut values = Vec::with_capacity(bindings.len());
    let mut errors = Vec::new();
    for (_, rhs) in bindings {
        match eval(rhs, &ext_env) {
            Ok(value) => values.push(value),
            Err(error) => errors.push(error),
        }
    }
    if !errors.is_empty() {
        return Err(Error::aggregate(errors));
    }

    for (binding, value) in ext_env.frame_bindings().iter().zip(values) {
        binding.set(value);
    }
    eval_seq(body, &ext_env)
}

/// Assignment resolves the binding, not just the value, through the full
/// chain, then mutates its cell. The result is void.
fn eval_set(name: &str, expr: &Expr, env: &Env) -> Result<Value, Error> {
    let value = eval(expr, env)?;
    let binding = env.lookup_binding(name)?;
    binding.set(value);
    Ok(Value::Void)
}

/// One evaluation session: a global environment plus its identity counters,
/// explicitly created and explicitly reset. Independent sessions hold
/// independent instances.
pub struct Interpreter {
    global: Rc<GlobalEnv>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            global: GlobalEnv::new(),
        }
    }

    /// The session's global environment as the root of a lexical chain.
    pub fn global_env(&self) -> Env {
        Env::Global(Rc::clone(&self.global))
    }

    /// Direct access to the global frame (definition, introspection).
    pub fn global(&self) -> &Rc<GlobalEnv> {
        &self.global
    }

    /// Clear the global frame and the identity counters, isolating the next
    /// run from this one.
    pub fn reset(&self) {
        self.global.reset();
    }

    /// Evaluate one expression against the global environment.
    pub fn eval_expr(&self, expr: &Expr) -> Result<Value, Error> {
        eval(expr, &self.global_env())
    }

    /// Evaluate one top-level form. A definition evaluates its right-hand
    /// side against the global environment only and installs the binding
    /// there; its result is void.
    pub fn eval_form(&self, form: &Form) -> Result<Value, Error> {
        match form {
            Form::Define { name, expr } => {
                let value = eval(expr, &self.global_env())?;
                self.global.define(name, value);
                Ok(Value::Void)
            }
            Form::Expr(expr) => self.eval_expr(expr),
        }
    }

    /// Drive a program: forms strictly in order against the one global
    /// environment. A plain expression's value is discarded unless it is the
    /// final form; an error aborts the remaining forms and becomes the
    /// result. A program with no final expression value (empty, or ending in
    /// a definition) reports [`Error::EmptyProgram`].
    pub fn eval_program(&self, program: &Program) -> Result<Value, Error> {
        let mut result = None;
        for form in &program.forms {
            match form {
                Form::Define { .. } => {
                    self.eval_form(form)?;
                    result = None;
                }
                Form::Expr(expr) => result = Some(self.eval_expr(expr)?),
            }
        }
        result.ok_or(Error::EmptyProgram)
    }

    /// Thin composition of the textual front end with the evaluator.
    #[cfg(feature = "scheme")]
    pub fn eval_source(&self, source: &str) -> Result<Value, Error> {
        let program = crate::scheme::parse_program(source)?;
        self.eval_program(&program)
    }
}

//! Binding cells, frames, and the environment chain.
//!
//! The box-environment model: a [`Binding`] owns one mutable cell, a
//! [`Frame`] is the ordered set of bindings introduced together by one call
//! or binding form, and an [`Env`] is either the session's global frame or a
//! frame plus a parent link. Lookup walks the chain outward and fails at the
//! global frame.
//!
//! Cells, frames, and environments are shared-ownership nodes (`Rc`): a
//! closure keeps its defining environment alive past the call that created
//! it, and the same cell may be reachable from many environments at once, so
//! `set!` through one holder is observed by all of them. The lexical chain
//! itself is acyclic by construction, even though the value graph reachable
//! through stored closures can be cyclic.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::value::Value;
use crate::Error;

/// One variable's mutable storage. The cell is the unit of mutation: every
/// holder of the same binding observes an update immediately.
#[derive(Debug)]
pub struct Binding {
    name: String,
    cell: RefCell<Value>,
}

impl Binding {
    fn new(name: String, value: Value) -> Rc<Binding> {
        Rc::new(Binding {
            name,
            cell: RefCell::new(value),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value of the cell.
    pub fn get(&self) -> Value {
        self.cell.borrow().clone()
    }

    /// In-place mutation; used by `set!` and the two-phase recursive-binding
    /// initializer.
    pub fn set(&self, value: Value) {
        *self.cell.borrow_mut() = value;
    }
}

/// Ordered collection of bindings created together. Names are unique within
/// a frame at creation time; callers guarantee it before construction.
#[derive(Debug, Default)]
pub struct Frame {
    bindings: Vec<Rc<Binding>>,
}

impl Frame {
    /// Zip names with values positionally. Lengths must match; application
    /// and binding evaluation enforce this through their arity checks.
    fn new(names: Vec<String>, values: Vec<Value>) -> Frame {
        debug_assert_eq!(names.len(), values.len());
        debug_assert!(names
            .iter()
            .enumerate()
            .all(|(i, name)| !names[..i].contains(name)));
        Frame {
            bindings: names
                .into_iter()
                .zip(values)
                .map(|(name, value)| Binding::new(name, value))
                .collect(),
        }
    }

    fn get(&self, name: &str) -> Option<&Rc<Binding>> {
        self.bindings.iter().find(|binding| binding.name == name)
    }
}

/// The unique global frame of one evaluation session.
///
/// Explicit process-scoped state rather than an ambient global: each session
/// creates its own instance, and [`GlobalEnv::reset`] returns it to the
/// initial empty state (including the closure identity counter) so successive
/// runs are isolated.
#[derive(Debug, Default)]
pub struct GlobalEnv {
    frame: RefCell<Frame>,
    next_closure_id: Cell<u64>,
}

impl GlobalEnv {
    pub fn new() -> Rc<GlobalEnv> {
        Rc::new(GlobalEnv::default())
    }

    /// Insert or overwrite. Overwriting mutates the existing cell in place,
    /// so every holder of the binding observes the redefinition.
    pub fn define(&self, name: &str, value: Value) {
        debug!(var = name, "global define");
        let mut frame = self.frame.borrow_mut();
        if let Some(binding) = frame.get(name) {
            binding.set(value);
        } else {
            frame.bindings.push(Binding::new(name.to_string(), value));
        }
    }

    /// Clear every binding and zero the identity counter.
    pub fn reset(&self) {
        debug!("session reset");
        self.frame.replace(Frame::default());
        self.next_closure_id.set(0);
    }

    /// Mint a fresh closure identity tag.
    pub fn fresh_closure_id(&self) -> u64 {
        let id = self.next_closure_id.get();
        self.next_closure_id.set(id + 1);
        id
    }

    /// Name/value snapshot in definition order.
    pub fn bindings(&self) -> Vec<(String, Value)> {
        self.frame
            .borrow()
            .bindings
            .iter()
            .map(|binding| (binding.name.clone(), binding.get()))
            .collect()
    }

    fn get(&self, name: &str) -> Option<Rc<Binding>> {
        self.frame.borrow().get(name).cloned()
    }
}

/// A linked chain of frames from innermost to the global frame, defining the
/// names visible at a program point.
#[derive(Debug, Clone)]
pub enum Env {
    Global(Rc<GlobalEnv>),
    Local(Rc<LocalEnv>),
}

/// One frame plus its parent link, created per call or per binding form.
#[derive(Debug)]
pub struct LocalEnv {
    frame: Frame,
    parent: Env,
}

impl Env {
    /// Resolve a name to its current value.
    pub fn lookup(&self, name: &str) -> Result<Value, Error> {
        self.lookup_binding(name).map(|binding| binding.get())
    }

    /// Resolve a name to its mutable cell, walking the chain outward.
    /// Assignment needs the binding itself, not a copy of the value.
    pub fn lookup_binding(&self, name: &str) -> Result<Rc<Binding>, Error> {
        let mut env = self;
        loop {
            match env {
                Env::Global(global) => {
                    return global
                        .get(name)
                        .ok_or_else(|| Error::UnboundVariable(name.to_string()));
                }
                Env::Local(local) => {
                    if let Some(binding) = local.frame.get(name) {
                        return Ok(Rc::clone(binding));
                    }
                    env = &local.parent;
                }
            }
        }
    }

    /// Build one new frame zipping `names` with `values`, parented here.
    pub fn extend(&self, names: Vec<String>, values: Vec<Value>) -> Env {
        Env::Local(Rc::new(LocalEnv {
            frame: Frame::new(names, values),
            parent: self.clone(),
        }))
    }

    /// Walk to the global frame at the root of the chain.
    pub fn global(&self) -> Rc<GlobalEnv> {
        let mut env = self;
        loop {
            match env {
                Env::Global(global) => return Rc::clone(global),
                Env::Local(local) => env = &local.parent,
            }
        }
    }

    /// The innermost frame's cells in creation order; the recursive-binding
    /// patch phase writes computed values through these.
    pub(crate) fn frame_bindings(&self) -> Vec<Rc<Binding>> {
        match self {
            Env::Global(global) => global.frame.borrow().bindings.clone(),
            Env::Local(local) => local.frame.bindings.clone(),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;

    fn global_env() -> (Rc<GlobalEnv>, Env) {
        let global = GlobalEnv::new();
        let env = Env::Global(Rc::clone(&global));
        (global, env)
    }

    #[test]
    fn lookup_walks_the_chain_outward() {
        let (global, env) = global_env();
        global.define("x", Value::Number(1.0));
        let inner = env
            .extend(vec!["y".into()], vec![Value::Number(2.0)])
            .extend(vec!["z".into()], vec![Value::Number(3.0)]);

        assert_eq!(inner.lookup("x"), Ok(Value::Number(1.0)));
        assert_eq!(inner.lookup("y"), Ok(Value::Number(2.0)));
        assert_eq!(inner.lookup("z"), Ok(Value::Number(3.0)));
        assert_eq!(
            inner.lookup("w"),
            Err(Error::UnboundVariable("w".to_string()))
        );
    }

    #[test]
    fn inner_frames_shadow_outer_names() {
        let (global, env) = global_env();
        global.define("x", Value::Number(1.0));
        let inner = env.extend(vec!["x".into()], vec![Value::Number(99.0)]);
        assert_eq!(inner.lookup("x"), Ok(Value::Number(99.0)));
        assert_eq!(env.lookup("x"), Ok(Value::Number(1.0)));
    }

    #[test]
    fn cells_alias_rather_than_copy() {
        let (_, env) = global_env();
        let scope = env.extend(vec!["n".into()], vec![Value::Number(0.0)]);
        let binding = scope.lookup_binding("n").unwrap();
        binding.set(Value::Number(7.0));
        assert_eq!(scope.lookup("n"), Ok(Value::Number(7.0)));
    }

    #[test]
    fn redefinition_mutates_the_existing_cell() {
        let (global, env) = global_env();
        global.define("x", Value::Number(1.0));
        let held = env.lookup_binding("x").unwrap();
        global.define("x", Value::Number(2.0));
        assert_eq!(held.get(), Value::Number(2.0));
        assert_eq!(global.bindings().len(), 1);
    }

    #[test]
    fn reset_clears_bindings_and_counter() {
        let (global, env) = global_env();
        global.define("x", Value::Number(1.0));
        assert_eq!(global.fresh_closure_id(), 0);
        global.reset();
        assert_eq!(
            env.lookup("x"),
            Err(Error::UnboundVariable("x".to_string()))
        );
        assert_eq!(global.fresh_closure_id(), 0);
    }

    #[test]
    fn global_is_reachable_from_any_depth() {
        let (global, env) = global_env();
        let deep = env
            .extend(vec!["a".into()], vec![Value::Nil])
            .extend(vec!["b".into()], vec![Value::Nil]);
        assert!(Rc::ptr_eq(&deep.global(), &global));
    }
}

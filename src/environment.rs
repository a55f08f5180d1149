use crate::symbols::Symbol;
use crate::types::{LispObject, Slot};
use itertools::Itertools;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A scope frame. Frames chain to a parent; lookups fall back along the chain.
///
/// An immutable frame never gains new bindings: defining a name it does not
/// hold is passed up to the parent, which either rebinds it (if some ancestor
/// already has it) or creates it in the nearest mutable ancestor.
pub struct Context {
    parent: Option<Rc<Context>>,
    bindings: RefCell<HashMap<Symbol, Slot>>,
    immutable: Cell<bool>,
}

#[derive(Debug)]
pub struct NoEnclosingScope(pub Symbol);

impl fmt::Display for NoEnclosingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot define '{}': immutable scope has no parent", self.0)
    }
}

impl Context {
    fn with_parent(parent: Option<Rc<Context>>) -> Self {
        Self {
            parent,
            bindings: RefCell::new(HashMap::new()),
            immutable: Cell::new(false),
        }
    }

    /// A fresh top-level frame with no parent.
    pub fn global() -> Rc<Self> {
        Rc::new(Self::with_parent(None))
    }

    pub fn spawn_from(parent: &Rc<Context>) -> Rc<Self> {
        Rc::new(Self::with_parent(Some(parent.clone())))
    }

    /// A frozen copy of this frame attached to `parent`. The copy holds the
    /// same slots, so rebinding a name this frame already had is seen by both.
    /// New names pass through the copy to `parent`.
    pub fn copy_onto(&self, parent: &Rc<Context>) -> Rc<Self> {
        Rc::new(Self {
            parent: Some(parent.clone()),
            bindings: RefCell::new(self.bindings.borrow().clone()),
            immutable: Cell::new(true),
        })
    }

    pub fn freeze(&self) {
        self.immutable.set(true);
    }

    pub fn is_immutable(&self) -> bool {
        self.immutable.get()
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.bindings.borrow().contains_key(&symbol)
    }

    pub fn define(&self, symbol: Symbol, value: LispObject) -> Result<(), NoEnclosingScope> {
        if let Some(slot) = self.bindings.borrow().get(&symbol) {
            slot.replace(value);
            return Ok(());
        }
        if self.is_immutable() {
            return match &self.parent {
                Some(parent) => parent.define(symbol, value),
                None => Err(NoEnclosingScope(symbol)),
            };
        }
        let _previous = self.bindings.borrow_mut().insert(symbol, Slot::new(value));
        Ok(())
    }

    /// The value bound to `symbol` here or in the nearest ancestor; `nil` if
    /// it is unbound everywhere.
    pub fn lookup(&self, symbol: Symbol) -> LispObject {
        let mut context = self;
        loop {
            if let Some(slot) = context.bindings.borrow().get(&symbol) {
                return slot.clone_payload();
            }
            match &context.parent {
                Some(parent) => context = &**parent,
                None => return LispObject::Nil,
            }
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.bindings.borrow().keys().map(|s| s.name()).sorted().join(" ");
        write!(f, "{{{}}}", names)?;
        if self.is_immutable() {
            write!(f, " (immutable)")?;
        }
        if let Some(parent) = &self.parent {
            write!(f, " -> {}", parent)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Context {
    // Values are skipped: a closure bound here may capture this very frame.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context{}", self)
    }
}

extern crate derive_more;
use crate::environment::Context;
use crate::printer;
use crate::symbols::{intern, Symbol};
use derive_more::{Deref, Display};
use itertools::Itertools;
use std::cell::RefCell;
use std::fmt;
use std::fmt::Formatter;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

pub type LispInt = i64;
pub type LispFloat = f64;

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    name: &'static str,
    expected: Arity,
    got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "When evaluating {} expected {} arguments, but received {} arguments",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

/// A mutable pair. Both halves can be replaced after construction, and the
/// replacement is seen by every list that shares the cell.
#[derive(Debug)]
pub struct Cell {
    first: RefCell<LispObject>,
    rest: RefCell<LispObject>,
}

impl Cell {
    pub fn new(first: LispObject, rest: LispObject) -> Self {
        Self {
            first: RefCell::new(first),
            rest: RefCell::new(rest),
        }
    }

    pub fn car(&self) -> LispObject {
        self.first.borrow().clone()
    }

    pub fn cdr(&self) -> LispObject {
        self.rest.borrow().clone()
    }

    /// Replaces `first` and returns the cell itself.
    pub fn setcar(self: &Rc<Self>, value: LispObject) -> LispObject {
        self.first.replace(value);
        LispObject::Cell(self.clone())
    }

    /// Replaces `rest` and returns the new rest.
    pub fn setcdr(self: &Rc<Self>, value: LispObject) -> LispObject {
        self.rest.replace(value.clone());
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ClosureKind {
    #[display(fmt = "lambda")]
    Lambda,
    #[display(fmt = "macro")]
    Macro,
}

#[derive(Deref, Debug, Clone)]
pub struct Parameters(pub Vec<Symbol>);

impl Parameters {
    pub(crate) fn to_list(&self) -> LispObject {
        LispObject::wrap_list(self.iter().map(|&s| LispObject::Symbol(s)).collect())
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().join(" "))
    }
}

#[derive(Clone)]
pub struct Closure {
    pub kind: ClosureKind,
    pub parameters: Parameters,
    pub body: LispObject,
    pub context: Option<Rc<Context>>,
}

impl Closure {
    /// The `(lambda (params) body...)` form this closure was built from.
    pub(crate) fn source(&self) -> LispObject {
        LispObject::cons(
            LispObject::Symbol(intern(&self.kind.to_string())),
            LispObject::cons(self.parameters.to_list(), self.body.clone()),
        )
    }
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the context: the context may well contain this Closure!
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{kind: {:?}, parameters: {:?}, body: {:?}}}",
            self.kind, self.parameters, self.body
        )
    }
}

/// Values handed back in place of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Sentinel {
    #[display(fmt = "<INVALID FUNCTION>")]
    InvalidFunction,
}

/// A one-slot mutable box holding a bound value. Clones share the slot.
#[derive(Debug, Clone)]
pub struct Slot {
    payload: Rc<RefCell<LispObject>>,
}

impl Slot {
    pub(crate) fn new(obj: LispObject) -> Self {
        Self {
            payload: Rc::new(RefCell::new(obj)),
        }
    }

    pub(crate) fn clone_payload(&self) -> LispObject {
        self.payload.borrow().clone()
    }

    pub(crate) fn replace(&self, obj: LispObject) {
        self.payload.replace(obj);
    }
}

#[derive(Debug, Clone)]
pub enum LispObject {
    Nil,
    Integer(LispInt),
    Float(LispFloat),
    String(String),
    Symbol(Symbol),
    Cell(Rc<Cell>),
    Closure(Rc<Closure>),
    Sentinel(Sentinel),
}

pub(crate) fn truthy(obj: &LispObject) -> bool {
    !obj.is_nil()
}

#[derive(Debug, Display)]
pub enum TypeMismatch {
    #[display(fmt = "expected a number")]
    NotANumber,
    #[display(fmt = "expected a cons cell")]
    NotACell,
    #[display(fmt = "expected a symbol")]
    NotASymbol,
}

impl LispObject {
    pub fn cons(first: LispObject, rest: LispObject) -> Self {
        Self::Cell(Rc::new(Cell::new(first, rest)))
    }

    pub fn wrap_list(elements: Vec<LispObject>) -> Self {
        elements
            .into_iter()
            .rev()
            .fold(Self::Nil, |rest, first| Self::cons(first, rest))
    }

    pub fn new_symbol(name: &str) -> Self {
        Self::Symbol(intern(name))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, LispObject::Nil)
    }

    pub(crate) fn as_cell(&self) -> Result<&Rc<Cell>, TypeMismatch> {
        match self {
            LispObject::Cell(c) => Ok(c),
            _ => Err(TypeMismatch::NotACell),
        }
    }

    pub(crate) fn as_symbol(&self) -> Result<Symbol, TypeMismatch> {
        match self {
            LispObject::Symbol(s) => Ok(*s),
            _ => Err(TypeMismatch::NotASymbol),
        }
    }

    /// True for `nil` and for cells: the things `first`/`rest` are defined on.
    pub(crate) fn is_list(&self) -> bool {
        matches!(self, LispObject::Nil | LispObject::Cell(_))
    }

    /// `first` of a cell; `nil` for anything else.
    pub fn first(&self) -> LispObject {
        match self {
            LispObject::Cell(c) => c.car(),
            _ => LispObject::Nil,
        }
    }

    /// `rest` of a cell; `nil` for anything else.
    pub fn rest(&self) -> LispObject {
        match self {
            LispObject::Cell(c) => c.cdr(),
            _ => LispObject::Nil,
        }
    }

    pub(crate) fn second(&self) -> LispObject {
        self.rest().first()
    }

    pub(crate) fn third(&self) -> LispObject {
        self.rest().rest().first()
    }

    /// Walks the `first` of each cell along the `rest` chain. An improper
    /// tail is not visited.
    pub fn iter(&self) -> ListIter {
        ListIter { next: self.clone() }
    }
}

pub struct ListIter {
    next: LispObject,
}

impl Iterator for ListIter {
    type Item = LispObject;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, rest) = match &self.next {
            LispObject::Cell(c) => (c.car(), c.cdr()),
            _ => return None,
        };
        self.next = rest;
        Some(first)
    }
}

impl fmt::Display for LispObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", printer::pr_str(self))
    }
}

impl PartialEq for LispObject {
    fn eq(&self, other: &Self) -> bool {
        use LispObject::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Integer(x), Integer(y)) => x == y,
            (Float(x), Float(y)) => x == y,
            (String(x), String(y)) => x == y,
            (Symbol(x), Symbol(y)) => x == y,
            (Cell(x), Cell(y)) => Rc::ptr_eq(x, y) || (x.car() == y.car() && x.cdr() == y.cdr()),
            (Closure(x), Closure(y)) => Rc::ptr_eq(x, y),
            (Sentinel(x), Sentinel(y)) => x == y,
            (_, _) => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ints(values: &[LispInt]) -> LispObject {
        LispObject::wrap_list(values.iter().copied().map(LispObject::Integer).collect())
    }

    #[test]
    fn first_and_rest_of_nil_are_nil() {
        assert!(LispObject::Nil.first().is_nil());
        assert!(LispObject::Nil.rest().is_nil());
    }

    #[test]
    fn wrap_list_builds_proper_list() {
        let list = ints(&[1, 2, 3]);
        assert_eq!(list.first(), LispObject::Integer(1));
        assert_eq!(list.third(), LispObject::Integer(3));
        assert!(list.rest().rest().rest().is_nil());
        assert_eq!(list.iter().count(), 3);
        assert!(LispObject::wrap_list(vec![]).is_nil());
    }

    #[test]
    fn iteration_stops_at_improper_tail() {
        let pair = LispObject::cons(LispObject::Integer(1), LispObject::Integer(2));
        let items: Vec<_> = pair.iter().collect();
        assert_eq!(items, vec![LispObject::Integer(1)]);
    }

    #[test]
    fn mutation_is_shared_by_every_holder() {
        let tail = ints(&[2, 3]);
        let a = LispObject::cons(LispObject::Integer(1), tail.clone());
        let b = LispObject::cons(LispObject::Integer(10), tail.clone());
        tail.as_cell().unwrap().setcar(LispObject::Integer(20));
        assert_eq!(a.second(), LispObject::Integer(20));
        assert_eq!(b.second(), LispObject::Integer(20));
        let returned = tail.as_cell().unwrap().setcdr(LispObject::Nil);
        assert!(returned.is_nil());
        assert_eq!(a, ints(&[1, 20]));
    }

    #[test]
    fn slots_share_their_payload() {
        let slot = Slot::new(LispObject::Integer(1));
        let alias = slot.clone();
        alias.replace(LispObject::Integer(2));
        assert_eq!(slot.clone_payload(), LispObject::Integer(2));
    }

    #[test]
    fn arity_reports_bad_counts() {
        assert!(Arity::at_least(1).validate_for(1, "-").is_ok());
        let err = Arity::at_least(1).validate_for(0, "-").unwrap_err();
        assert_eq!(
            err.to_string(),
            "When evaluating - expected at least 1 arguments, but received 0 arguments"
        );
        assert!(Arity::exactly(2).validate_for(3, "setcar").is_err());
    }
}

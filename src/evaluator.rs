use crate::core::{self, SpecialForm};
use crate::environment::{Context, NoEnclosingScope};
use crate::special_forms::{DefError, FnError, LetError};
use crate::symbols::Symbol;
use crate::types::{BadArgCount, Closure, ClosureKind, LispObject, Sentinel, TypeMismatch};
use crate::reader;

use std::fmt;
use std::rc::Rc;

pub type Result<T = LispObject> = std::result::Result<T, Error>;
#[derive(Debug)]
pub enum Error {
    Def(DefError),
    Let(LetError),
    Fn(FnError),
    NoEnclosingScope(NoEnclosingScope),
    NotASpecialForm(Symbol),
    TypeMismatch(TypeMismatch),
    BadArgCount(BadArgCount),
    ReadError(reader::Error),
    IOError(std::io::Error),
    /// Raised by `exit`; the driver decides what terminating means.
    Exit(LispObject),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Def(e) => write!(f, "def: {}", e),
            Error::Let(e) => write!(f, "let: {}", e),
            Error::Fn(e) => write!(f, "lambda: {}", e),
            Error::NoEnclosingScope(e) => write!(f, "{}", e),
            Error::NotASpecialForm(s) => write!(f, "'{}' is not a special form", s),
            Error::TypeMismatch(e) => write!(f, "type mismatch: {}", e),
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::ReadError(e) => write!(f, "read error: {}", e),
            Error::IOError(e) => write!(f, "io error: {}", e),
            Error::Exit(value) => write!(f, "exit with {}", value),
        }
    }
}

impl From<TypeMismatch> for Error {
    fn from(t: TypeMismatch) -> Self {
        Self::TypeMismatch(t)
    }
}

impl From<BadArgCount> for Error {
    fn from(e: BadArgCount) -> Self {
        Self::BadArgCount(e)
    }
}

impl From<NoEnclosingScope> for Error {
    fn from(e: NoEnclosingScope) -> Self {
        Self::NoEnclosingScope(e)
    }
}

impl From<reader::Error> for Error {
    fn from(e: reader::Error) -> Self {
        Self::ReadError(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IOError(e)
    }
}

/// Evaluates one form in `context`.
///
/// Numbers, strings, nil and closures evaluate to themselves. A symbol
/// naming a special form also evaluates to itself; any other symbol is looked
/// up, and is nil when unbound. A cons cell is a call: see [`apply_form`].
#[allow(non_snake_case)]
pub fn EVAL(ast: &LispObject, context: &Rc<Context>) -> Result {
    match ast {
        LispObject::Symbol(symbol) => match core::is_special_form(*symbol) {
            true => Ok(ast.clone()),
            false => Ok(context.lookup(*symbol)),
        },
        LispObject::Cell(_) => apply_form(ast, context),
        _ => Ok(ast.clone()),
    }
}

/// Evaluates the head of `form`, then hands the unevaluated tail to whatever
/// the head turned out to be. A head that is neither a special form nor a
/// closure makes the whole form evaluate to `<INVALID FUNCTION>`.
fn apply_form(form: &LispObject, context: &Rc<Context>) -> Result {
    log::trace!("apply {}", form);
    let head = EVAL(&form.first(), context)?;
    let args = form.rest();
    match &head {
        LispObject::Symbol(symbol) => {
            if let Some(special) = core::lookup(*symbol) {
                return call_special_form(&special, &args, context);
            }
        }
        LispObject::Closure(closure) => return apply(closure, &args, context),
        _ => (),
    }
    log::debug!("cannot call {}", head);
    Ok(LispObject::Sentinel(Sentinel::InvalidFunction))
}

pub fn call_special_form(form: &SpecialForm, args: &LispObject, context: &Rc<Context>) -> Result {
    log::trace!("call {} with {}", form.name, args);
    let result = (form.handler)(args, context);
    match &result {
        Ok(val) => log::trace!("call to {} resulted in {}", form.name, val),
        Err(e) => log::trace!("call to {} failed: {}", form.name, e),
    }
    result
}

/// Calls a lambda or macro with raw argument forms from `caller`.
///
/// A lambda returns the value of its body. A macro's body produces an
/// expansion, which is then evaluated in the same frame.
pub fn apply(closure: &Closure, args: &LispObject, caller: &Rc<Context>) -> Result {
    let frame = make_closure_context(closure, args, caller)?;
    let result = execute_forms(&closure.body, &frame)?;
    match closure.kind {
        ClosureKind::Lambda => Ok(result),
        ClosureKind::Macro => {
            log::trace!("macro expanded to {}", result);
            EVAL(&result, &frame)
        }
    }
}

// The frame's parent is a frozen copy of the captured context re-parented
// onto the caller, so names resolve lexically first and then dynamically.
// Arguments are evaluated in the caller, never in the half-built frame.
fn make_closure_context(
    closure: &Closure,
    args: &LispObject,
    caller: &Rc<Context>,
) -> Result<Rc<Context>> {
    let parent = match &closure.context {
        Some(captured) => captured.copy_onto(caller),
        None => caller.clone(),
    };
    let frame = Context::spawn_from(&parent);
    let mut remaining = args.clone();
    for &parameter in closure.parameters.iter() {
        let form = remaining.first();
        let value = match closure.kind {
            ClosureKind::Lambda => EVAL(&form, caller)?,
            ClosureKind::Macro => form,
        };
        frame.define(parameter, value)?;
        remaining = remaining.rest();
    }
    frame.freeze();
    log::trace!("call {} in {}", closure.parameters, frame);
    Ok(frame)
}

/// Runs a closure body. A body form whose head is itself a list has every
/// element evaluated first, and the resulting list is then evaluated as the call.
fn execute_forms(body: &LispObject, frame: &Rc<Context>) -> Result {
    body.iter().try_fold(LispObject::Nil, |_, form| {
        let form = match form.first() {
            LispObject::Cell(_) => evaluate_in_list(&form, frame)?,
            _ => form,
        };
        EVAL(&form, frame)
    })
}

/// Evaluates each element of `list` left to right into a new proper list.
pub fn evaluate_in_list(list: &LispObject, context: &Rc<Context>) -> Result {
    let evaluated: Result<Vec<LispObject>> = list.iter().map(|obj| EVAL(&obj, context)).collect();
    Ok(LispObject::wrap_list(evaluated?))
}

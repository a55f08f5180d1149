use crate::environment::Context;
use crate::evaluator::{self, Error, EVAL};
use crate::special_forms;
use crate::symbols::{intern, Symbol};
use crate::types::{Arity, Cell, LispFloat, LispInt, LispObject, TypeMismatch};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::{PoisonError, RwLock};

/// A handler receives its argument forms unevaluated, plus the context of the call.
pub type Handler = fn(&LispObject, &Rc<Context>) -> evaluator::Result;

#[derive(Clone, Copy)]
pub struct SpecialForm {
    pub name: &'static str,
    pub handler: Handler,
}

impl fmt::Debug for SpecialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "special form #<{}>", self.name)
    }
}

#[derive(Clone, Copy)]
enum Number {
    Integer(LispInt),
    Float(LispFloat),
}

impl Number {
    fn from_object(obj: &LispObject) -> Result<Self, TypeMismatch> {
        match obj {
            LispObject::Integer(x) => Ok(Number::Integer(*x)),
            LispObject::Float(x) => Ok(Number::Float(*x)),
            _ => Err(TypeMismatch::NotANumber),
        }
    }

    fn to_float(self) -> LispFloat {
        match self {
            Number::Integer(x) => x as LispFloat,
            Number::Float(x) => x,
        }
    }

    fn combine(
        self,
        other: Number,
        ints: fn(LispInt, LispInt) -> LispInt,
        floats: fn(LispFloat, LispFloat) -> LispFloat,
    ) -> Number {
        match (self, other) {
            (Number::Integer(x), Number::Integer(y)) => Number::Integer(ints(x, y)),
            (x, y) => Number::Float(floats(x.to_float(), y.to_float())),
        }
    }

    fn add(self, other: Number) -> Number {
        self.combine(other, LispInt::wrapping_add, |x, y| x + y)
    }

    fn sub(self, other: Number) -> Number {
        self.combine(other, LispInt::wrapping_sub, |x, y| x - y)
    }

    fn negate(self) -> Number {
        match self {
            Number::Integer(x) => Number::Integer(x.wrapping_neg()),
            Number::Float(x) => Number::Float(-x),
        }
    }
}

impl From<Number> for LispObject {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(x) => LispObject::Integer(x),
            Number::Float(x) => LispObject::Float(x),
        }
    }
}

fn grab_numbers(args: &LispObject, context: &Rc<Context>) -> evaluator::Result<Vec<Number>> {
    args.iter()
        .map(|form| -> evaluator::Result<Number> {
            Ok(Number::from_object(&EVAL(&form, context)?)?)
        })
        .collect()
}

const SUM: SpecialForm = SpecialForm {
    name: "+",
    handler: sum_,
};

fn sum_(args: &LispObject, context: &Rc<Context>) -> evaluator::Result {
    let value = grab_numbers(args, context)?
        .into_iter()
        .fold(Number::Integer(0), Number::add);
    Ok(value.into())
}

const SUB: SpecialForm = SpecialForm {
    name: "-",
    handler: sub_,
};

fn sub_(args: &LispObject, context: &Rc<Context>) -> evaluator::Result {
    Arity::at_least(1).validate_for(args.iter().count(), "-")?;
    let numbers = grab_numbers(args, context)?;
    match numbers.split_first() {
        Some((&only, [])) => Ok(only.negate().into()),
        Some((&first, rest)) => Ok(rest.iter().copied().fold(first, Number::sub).into()),
        None => unreachable!("arity checked above"),
    }
}

const CONS: SpecialForm = SpecialForm {
    name: "cons",
    handler: cons_,
};

fn cons_(args: &LispObject, context: &Rc<Context>) -> evaluator::Result {
    let first = EVAL(&args.first(), context)?;
    let rest = EVAL(&args.second(), context)?;
    Ok(LispObject::cons(first, rest))
}

const LIST: SpecialForm = SpecialForm {
    name: "list",
    handler: list_,
};

fn list_(args: &LispObject, context: &Rc<Context>) -> evaluator::Result {
    evaluator::evaluate_in_list(args, context)
}

fn accessor_(
    args: &LispObject,
    context: &Rc<Context>,
    getter: fn(&Cell) -> LispObject,
) -> evaluator::Result {
    match EVAL(&args.first(), context)? {
        LispObject::Nil => Ok(LispObject::Nil),
        LispObject::Cell(cell) => Ok(getter(&cell)),
        _ => Err(TypeMismatch::NotACell.into()),
    }
}

fn mutator_(
    args: &LispObject,
    context: &Rc<Context>,
    name: &'static str,
    setter: fn(&Rc<Cell>, LispObject) -> LispObject,
) -> evaluator::Result {
    Arity::exactly(2).validate_for(args.iter().count(), name)?;
    let target = EVAL(&args.first(), context)?;
    let value = EVAL(&args.second(), context)?;
    Ok(setter(target.as_cell()?, value))
}

// car/cdr read a half of a cell; setcar/setcdr replace it. The handler is
// named after the Cell method it forwards to.
macro_rules! accessor_form {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: SpecialForm = SpecialForm {
                name: stringify!($SYMBOL),
                handler: |args: &LispObject, context: &Rc<Context>| {
                    accessor_(args, context, Cell::[<$NAME:lower>])
                },
            };
        }
    };
}

macro_rules! mutator_form {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: SpecialForm = SpecialForm {
                name: stringify!($SYMBOL),
                handler: |args: &LispObject, context: &Rc<Context>| {
                    mutator_(args, context, stringify!($SYMBOL), Cell::[<$NAME:lower>])
                },
            };
        }
    };
}

accessor_form!(car, CAR);
accessor_form!(cdr, CDR);
mutator_form!(setcar, SETCAR);
mutator_form!(setcdr, SETCDR);

type Namespace = HashMap<Symbol, SpecialForm>;
lazy_static! {
    static ref SPECIAL_FORMS: RwLock<Namespace> = {
        let mut map = Namespace::new();
        for form in [
            // Quoting and evaluation
            special_forms::QUOTE,
            special_forms::EVALUATE,
            // Binding and scope
            special_forms::DEF,
            special_forms::LET,
            special_forms::LAMBDA,
            special_forms::MACRO,
            // Control flow
            special_forms::IF,
            special_forms::WHEN,
            special_forms::DO,
            special_forms::EXIT,
            // Arithmetic
            SUM,
            SUB,
            // Working with cells
            CONS,
            CAR,
            CDR,
            SETCAR,
            SETCDR,
            LIST,
        ]
        .iter()
        {
            map.insert(intern(form.name), *form);
        }
        RwLock::new(map)
    };
}

/// Adds or replaces a named handler. Returns the handler it replaced.
pub fn install(form: SpecialForm) -> Option<SpecialForm> {
    log::debug!("install special form {}", form.name);
    SPECIAL_FORMS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(intern(form.name), form)
}

pub fn lookup(symbol: Symbol) -> Option<SpecialForm> {
    SPECIAL_FORMS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&symbol)
        .copied()
}

pub fn is_special_form(symbol: Symbol) -> bool {
    lookup(symbol).is_some()
}

/// Calls the handler registered under `name` with raw argument forms.
pub fn invoke(name: &str, args: &LispObject, context: &Rc<Context>) -> evaluator::Result {
    let symbol = intern(name);
    match lookup(symbol) {
        Some(form) => evaluator::call_special_form(&form, args, context),
        None => Err(Error::NotASpecialForm(symbol)),
    }
}

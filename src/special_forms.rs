use crate::core::SpecialForm;
use crate::environment::Context;
use crate::evaluator::{Error, Result, EVAL};
use crate::symbols::Symbol;
use crate::types::{truthy, Closure, ClosureKind, LispObject, Parameters};
use std::fmt;
use std::rc::Rc;

pub(crate) const QUOTE: SpecialForm = SpecialForm {
    name: "quote",
    handler: apply_quote,
};

pub fn apply_quote(args: &LispObject, _context: &Rc<Context>) -> Result {
    Ok(args.first())
}

#[derive(Debug)]
pub enum DefError {
    KeyNotASymbol,
}

impl fmt::Display for DefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefError::KeyNotASymbol => write!(f, "the name to define must be a symbol"),
        }
    }
}

pub(crate) const DEF: SpecialForm = SpecialForm {
    name: "def",
    handler: apply_def,
};

pub fn apply_def(args: &LispObject, context: &Rc<Context>) -> Result {
    let key = args
        .first()
        .as_symbol()
        .map_err(|_| Error::Def(DefError::KeyNotASymbol))?;
    let value = EVAL(&args.second(), context)?;
    context.define(key, value.clone())?;
    log::debug!("define {} as {}", key, value);
    Ok(value)
}

pub(crate) const IF: SpecialForm = SpecialForm {
    name: "if",
    handler: apply_if,
};

pub fn apply_if(args: &LispObject, context: &Rc<Context>) -> Result {
    let condition = EVAL(&args.first(), context)?;
    if truthy(&condition) {
        EVAL(&args.second(), context)
    } else {
        EVAL(&args.third(), context)
    }
}

pub(crate) const WHEN: SpecialForm = SpecialForm {
    name: "when",
    handler: apply_when,
};

pub fn apply_when(args: &LispObject, context: &Rc<Context>) -> Result {
    let condition = EVAL(&args.first(), context)?;
    match truthy(&condition) {
        true => apply_do(&args.rest(), context),
        false => Ok(LispObject::Nil),
    }
}

pub(crate) const EVALUATE: SpecialForm = SpecialForm {
    name: "eval",
    handler: apply_eval,
};

/// Evaluates the argument, then evaluates the resulting value as code.
pub fn apply_eval(args: &LispObject, context: &Rc<Context>) -> Result {
    let code = EVAL(&args.first(), context)?;
    log::trace!("eval {}", code);
    EVAL(&code, context)
}

pub(crate) const DO: SpecialForm = SpecialForm {
    name: "do",
    handler: apply_do,
};

pub fn apply_do(args: &LispObject, context: &Rc<Context>) -> Result {
    args.iter()
        .try_fold(LispObject::Nil, |_, form| EVAL(&form, context))
}

#[derive(Debug)]
pub enum LetError {
    BindingsNotAList,
    BindToNonSymbol,
}

impl fmt::Display for LetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LetError::BindingsNotAList => write!(f, "bindings must be a list of (name value)"),
            LetError::BindToNonSymbol => write!(f, "can only bind to a symbol"),
        }
    }
}

pub(crate) const LET: SpecialForm = SpecialForm {
    name: "let",
    handler: apply_let,
};

pub fn apply_let(args: &LispObject, context: &Rc<Context>) -> Result {
    let bindings = args.first();
    if !bindings.is_list() {
        return Err(Error::Let(LetError::BindingsNotAList));
    }
    let child = make_let_context(&bindings, context)?;
    log::trace!("let: context={}", child);
    apply_do(&args.rest(), &child)
}

fn make_let_context(bindings: &LispObject, parent: &Rc<Context>) -> Result<Rc<Context>> {
    let child = Context::spawn_from(parent);
    for binding in bindings.iter() {
        let key = binding
            .first()
            .as_symbol()
            .map_err(|_| Error::Let(LetError::BindToNonSymbol))?;
        // Note: evaluate in the parent, so no binding can see its siblings
        let value = EVAL(&binding.second(), parent)?;
        child.define(key, value)?;
    }
    child.freeze();
    Ok(child)
}

#[derive(Debug)]
pub enum FnError {
    ParametersNotGivenAsList,
    ParameterNotASymbol,
}

impl fmt::Display for FnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FnError::ParametersNotGivenAsList => write!(f, "parameters must be a list"),
            FnError::ParameterNotASymbol => write!(f, "every parameter must be a symbol"),
        }
    }
}

pub(crate) const LAMBDA: SpecialForm = SpecialForm {
    name: "lambda",
    handler: |args: &LispObject, context: &Rc<Context>| {
        apply_fn(args, context, ClosureKind::Lambda)
    },
};

pub(crate) const MACRO: SpecialForm = SpecialForm {
    name: "macro",
    handler: |args: &LispObject, context: &Rc<Context>| {
        apply_fn(args, context, ClosureKind::Macro)
    },
};

pub fn apply_fn(args: &LispObject, context: &Rc<Context>, kind: ClosureKind) -> Result {
    // The first argument is the parameter list, a proper list of symbols.
    // Everything after it is the body, kept as a list of forms.
    let parameters = args.first();
    if !parameters.is_list() {
        return Err(Error::Fn(FnError::ParametersNotGivenAsList));
    }
    let parameters: std::result::Result<Vec<Symbol>, _> =
        parameters.iter().map(|p| p.as_symbol()).collect();
    let parameters = parameters.map_err(|_| Error::Fn(FnError::ParameterNotASymbol))?;

    let closure = Closure {
        kind,
        parameters: Parameters(parameters),
        body: args.rest(),
        context: Some(context.clone()),
    };
    Ok(LispObject::Closure(Rc::new(closure)))
}

pub(crate) const EXIT: SpecialForm = SpecialForm {
    name: "exit",
    handler: apply_exit,
};

/// Unwinds to whoever is driving evaluation, carrying the exit value.
pub fn apply_exit(args: &LispObject, context: &Rc<Context>) -> Result {
    let value = EVAL(&args.first(), context)?;
    log::info!("exit requested with {}", value);
    Err(Error::Exit(value))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interpreter::load_str;
    use crate::printer::pr_str;
    use crate::symbols::intern;

    fn comparison(input: &str, output: &str) {
        let result = load_str(input, &Context::global()).unwrap();
        assert_eq!(pr_str(&result).trim_end(), output);
    }

    #[test]
    fn test_quote() {
        comparison("(quote (a b))", "(a b )");
        comparison("(quote x)", "x");
        comparison("(quote)", "()");
    }

    #[test]
    fn test_def() {
        comparison("(def x (+ 1 2))", "3");
        comparison("(def x 3) x", "3");
        comparison("(def x 3) (def x 4) x", "4");
        let result = load_str("(def 5 3)", &Context::global());
        assert!(matches!(result, Err(Error::Def(DefError::KeyNotASymbol))));
    }

    #[test]
    fn test_if() {
        comparison("(if 0 \"t\" \"f\")", "\"t\"");
        comparison("(if () \"t\" \"f\")", "\"f\"");
        comparison("(if () 1)", "()");
        comparison("(if unbound-anywhere 1 2)", "2");
    }

    #[test]
    fn test_when() {
        comparison("(when 1 2 3)", "3");
        comparison("(when () 2 3)", "()");
        comparison("(when 1 (def w 7) (+ w 1))", "8");
    }

    #[test]
    fn test_eval() {
        comparison("(eval (quote (+ 1 2)))", "3");
        comparison("(def code (list (quote +) 4 5)) (eval code)", "9");
        comparison("(def y 2) (def name (quote y)) (eval name)", "2");
    }

    #[test]
    fn test_do() {
        comparison("(do 1 2 3)", "3");
        comparison("(do)", "()");
        comparison("(do (def d 1) (def d (+ d 1)) d)", "2");
    }

    #[test]
    fn let_shadows_then_restores() {
        comparison("(def x 10) (let ((x 20)) x)", "20");
        comparison("(def x 10) (let ((x 20)) x) x", "10");
    }

    #[test]
    fn let_inits_see_the_outer_context() {
        comparison("(def x 1) (let ((x 2) (y x)) y)", "1");
    }

    #[test]
    fn let_def_rebinds_an_existing_outer_name() {
        comparison("(def x 10) (let ((y 1)) (def x 5)) x", "5");
    }

    #[test]
    fn let_def_of_a_new_name_lands_in_the_parent() {
        comparison("(let ((y 1)) (def fresh 3)) fresh", "3");
    }

    #[test]
    fn let_def_of_a_local_name_stays_local() {
        comparison("(def x 10) (let ((x 1)) (def x 2) x)", "2");
        comparison("(def x 10) (let ((x 1)) (def x 2)) x", "10");
    }

    #[test]
    fn let_errors() {
        let context = Context::global();
        assert!(matches!(
            load_str("(let 5 1)", &context),
            Err(Error::Let(LetError::BindingsNotAList))
        ));
        assert!(matches!(
            load_str("(let ((1 2)) 1)", &context),
            Err(Error::Let(LetError::BindToNonSymbol))
        ));
    }

    #[test]
    fn lambda_captures_parameters_and_body() {
        let result = load_str("(lambda (a b) (+ a b))", &Context::global()).unwrap();
        match &result {
            LispObject::Closure(c) => {
                assert_eq!(c.kind, ClosureKind::Lambda);
                assert_eq!(*c.parameters, vec![intern("a"), intern("b")]);
                assert!(c.context.is_some());
            }
            _ => panic!("expected a closure, got {}", result),
        }
        assert_eq!(pr_str(&result), "(lambda (a b )(+ a b ))");
        comparison("(macro (x) x)", "(macro (x )x )");
    }

    #[test]
    fn lambda_parameters_must_be_symbols() {
        let context = Context::global();
        assert!(matches!(
            load_str("(lambda (1) 1)", &context),
            Err(Error::Fn(FnError::ParameterNotASymbol))
        ));
        assert!(matches!(
            load_str("(lambda x 1)", &context),
            Err(Error::Fn(FnError::ParametersNotGivenAsList))
        ));
    }

    #[test]
    fn exit_unwinds_with_its_value() {
        let result = load_str("(def x 3) (exit (+ x 1)) (def x 0)", &Context::global());
        match result {
            Err(Error::Exit(LispObject::Integer(4))) => (),
            other => panic!("expected exit with 4, got {:?}", other),
        }
    }
}

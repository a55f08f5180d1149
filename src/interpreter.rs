use crate::environment::Context;
use crate::evaluator::{self, EVAL};
use crate::stream::{BufferedStream, LineSource, ReadLines};
use crate::types::LispObject;
use crate::{printer, reader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::rc::Rc;

/// Reads and evaluates every form in `stream` against `context`, returning
/// the value of the last one (nil if there were none).
pub fn load<S: LineSource>(
    stream: &mut BufferedStream<S>,
    context: &Rc<Context>,
) -> evaluator::Result {
    let mut result = LispObject::Nil;
    while let Some(form) = reader::read_form(stream)? {
        result = EVAL(&form, context)?;
    }
    Ok(result)
}

pub fn load_str(text: &str, context: &Rc<Context>) -> evaluator::Result {
    load(&mut BufferedStream::from_text(text), context)
}

pub fn load_file<P: AsRef<Path>>(path: P, context: &Rc<Context>) -> evaluator::Result {
    log::info!("loading {}", path.as_ref().display());
    let file = File::open(path)?;
    load(&mut BufferedStream::new(ReadLines(BufReader::new(file))), context)
}

/// One step of the prompt loop: read a form, evaluate it, print the result.
/// `Ok(None)` means the stream has ended.
pub fn rep<S: LineSource>(
    stream: &mut BufferedStream<S>,
    context: &Rc<Context>,
) -> evaluator::Result<Option<String>> {
    match reader::read_form(stream)? {
        Some(form) => EVAL(&form, context).map(|value| Some(printer::pr_str(&value))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::evaluator::Error;
    use std::io::Write;

    #[test]
    fn load_returns_the_last_value() {
        let context = Context::global();
        let result = load_str("(def a 1)\n(def b 2)\n(+ a b)", &context).unwrap();
        assert_eq!(result, LispObject::Integer(3));
        assert!(load_str("", &context).unwrap().is_nil());
    }

    #[test]
    fn load_shares_the_context() {
        let context = Context::global();
        load_str("(def shared 41)", &context).unwrap();
        let result = load_str("(+ shared 1)", &context).unwrap();
        assert_eq!(result, LispObject::Integer(42));
    }

    #[test]
    fn load_reports_read_errors() {
        let result = load_str("(+ 1", &Context::global());
        assert!(matches!(
            result,
            Err(Error::ReadError(reader::Error::UnclosedList))
        ));
    }

    #[test]
    fn load_file_evaluates_every_form() {
        let path = std::env::temp_dir().join(format!("cellisp-load-{}.lisp", std::process::id()));
        let mut file = File::create(&path).unwrap();
        writeln!(file, "(def double (lambda (x) (+ x x)))").unwrap();
        writeln!(file, "(double\n  21)").unwrap();
        drop(file);
        let result = load_file(&path, &Context::global());
        std::fs::remove_file(&path).unwrap();
        assert_eq!(result.unwrap(), LispObject::Integer(42));
    }

    #[test]
    fn load_file_reports_missing_files() {
        let result = load_file("/nonexistent/cellisp/file.lisp", &Context::global());
        assert!(matches!(result, Err(Error::IOError(_))));
    }

    #[test]
    fn rep_prints_each_form_in_turn() {
        let context = Context::global();
        let mut stream = BufferedStream::from_text("(def x 2) (cons x x)\n(list x)");
        assert_eq!(rep(&mut stream, &context).unwrap().unwrap(), "2 ");
        assert_eq!(rep(&mut stream, &context).unwrap().unwrap(), "(cons 2 2 ) ");
        assert_eq!(rep(&mut stream, &context).unwrap().unwrap(), "(2 )");
        assert!(rep(&mut stream, &context).unwrap().is_none());
    }
}

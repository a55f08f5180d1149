use crate::environment::Context;
use crate::reader;
use crate::stream::{BufferedStream, LineSource, ReadLines};
use crate::tokens::TokenizerError;
use crate::types::LispObject;
use crate::{evaluator, interpreter};
use ansi_term::Colour::Red;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::convert::TryFrom;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Debug)]
pub enum Error {
    IOError(io::Error),
    Load(String, evaluator::Error),
    Exit(LispObject),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IOError(e) => write!(f, "io error: {}", e),
            Error::Load(path, e) => write!(f, "while loading {}: {}", path, e),
            Error::Exit(value) => write!(f, "exit with {}", value),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IOError(e)
    }
}

fn loading(source: &str, e: evaluator::Error) -> Error {
    match e {
        evaluator::Error::Exit(value) => Error::Exit(value),
        e => Error::Load(source.to_string(), e),
    }
}

pub fn setup() -> io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("cellisp")?;
    interface.set_prompt("> ")?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(".cellisp_history");
            Some(path)
        }
        None => None,
    }
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

/// Feeds the reader from the terminal, one prompted line at a time.
struct Prompt<'a, T: Terminal> {
    interface: &'a Interface<T>,
}

impl<T: Terminal> LineSource for Prompt<'_, T> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.interface.read_line()? {
                ReadResult::Eof => return Ok(None),
                ReadResult::Signal(sig) => {
                    writeln!(self.interface, "Received signal {:?}", sig)?;
                }
                ReadResult::Input(line) => {
                    self.interface.add_history_unique(line.clone());
                    return Ok(Some(line + "\n"));
                }
            }
        }
    }
}

fn paint_error(message: impl fmt::Display) -> String {
    let text = format!("Error: {}", message);
    match atty::is(atty::Stream::Stdout) {
        true => Red.paint(text).to_string(),
        false => text,
    }
}

/// Reads, evaluates and echoes forms until the terminal reaches end of input.
/// Errors are reported and the loop carries on; `exit` ends it.
pub fn repl<T: Terminal>(interface: &Interface<T>, context: &Rc<Context>) -> Result<(), Error> {
    let mut stream = BufferedStream::new(Prompt { interface });
    loop {
        match interpreter::rep(&mut stream, context) {
            Ok(Some(output)) => writeln!(interface, "{}", output)?,
            Ok(None) => return Ok(()),
            Err(evaluator::Error::Exit(value)) => return Err(Error::Exit(value)),
            Err(evaluator::Error::ReadError(reader::Error::TokenizerError(
                TokenizerError::IOError(e),
            ))) => return Err(Error::IOError(e)),
            Err(e) => {
                stream.discard_buffer();
                writeln!(interface, "{}", paint_error(&e))?;
            }
        }
    }
}

/// `args` as from `std::env::args`: each file argument is loaded in order,
/// then the prompt loop runs unless `-n`/`--no-repl` was given. With no files
/// and a non-terminal stdin, stdin is loaded as a program instead.
pub fn launch(args: Vec<String>, context: &Rc<Context>) -> Result<(), Error> {
    let (flags, files): (Vec<String>, Vec<String>) =
        args.into_iter().skip(1).partition(|arg| arg.starts_with('-'));
    let interactive = !flags.iter().any(|f| f == "-n" || f == "--no-repl");

    for file in &files {
        interpreter::load_file(file, context).map_err(|e| loading(file, e))?;
    }

    if files.is_empty() && !atty::is(atty::Stream::Stdin) {
        let stdin = io::stdin();
        let mut stream = BufferedStream::new(ReadLines(stdin.lock()));
        interpreter::load(&mut stream, context).map_err(|e| loading("<stdin>", e))?;
        return Ok(());
    }

    if !interactive {
        return Ok(());
    }
    let interface = setup()?;
    let result = repl(&interface, context);
    save_history(&interface)?;
    result
}

/// Status for an `exit` value: integers are used as-is, a string is printed
/// first and exits successfully, anything else exits successfully.
pub fn exit_status(value: &LispObject) -> i32 {
    match value {
        LispObject::Integer(code) => {
            i32::try_from(*code).unwrap_or(if *code < 0 { i32::MIN } else { i32::MAX })
        }
        LispObject::String(message) => {
            print!("{}", message);
            0
        }
        _ => 0,
    }
}

/// Reports a failed `launch` and returns the process status to exit with.
pub fn report(error: &Error) -> i32 {
    match error {
        Error::Exit(value) => exit_status(value),
        e => {
            eprintln!("{}", paint_error(e));
            1
        }
    }
}

use crate::stream::{BufferedStream, LineSource};
use crate::strings::build_string;
use crate::tokens::{read_token, Token, TokenizerError};
use crate::types::{LispFloat, LispInt, LispObject};
use regex::Regex;
use std::fmt;

pub type Result<T = Option<LispObject>> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    TokenizerError(TokenizerError),
    UnclosedList,
    UnbalancedCloseBracket,
    ReadIntError(String),
    ReadFloatError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TokenizerError(e) => write!(f, "{}", e),
            Error::UnclosedList => write!(f, "end of input inside a list"),
            Error::UnbalancedCloseBracket => write!(f, "unexpected ')'"),
            Error::ReadIntError(s) => write!(f, "integer out of range: {}", s),
            Error::ReadFloatError(s) => write!(f, "bad float: {}", s),
        }
    }
}

impl From<TokenizerError> for Error {
    fn from(e: TokenizerError) -> Self {
        Self::TokenizerError(e)
    }
}

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^-?[0-9]+$").unwrap();
    static ref FLOAT: Regex = Regex::new(r"^-?([0-9]+\.[0-9]*|[0-9]*\.[0-9]+)$").unwrap();
}

/// Reads one form. `Ok(None)` means the stream ended before any token.
pub fn read_form<S: LineSource>(stream: &mut BufferedStream<S>) -> Result {
    match read_token(stream)? {
        None => Ok(None),
        Some(Token::OpenRoundBracket) => read_list(stream).map(Some),
        Some(Token::CloseRoundBracket) => Err(Error::UnbalancedCloseBracket),
        Some(token) => read_atom(token).map(Some),
    }
}

/// Reads the first form in `input`.
pub fn read_str(input: &str) -> Result {
    read_form(&mut BufferedStream::from_text(input))
}

/// Reads every form in `input`.
pub fn read_all(input: &str) -> Result<Vec<LispObject>> {
    let mut stream = BufferedStream::from_text(input);
    std::iter::from_fn(|| read_form(&mut stream).transpose()).collect()
}

// The opening bracket has already been consumed. `()` reads as nil.
fn read_list<S: LineSource>(stream: &mut BufferedStream<S>) -> Result<LispObject> {
    let mut elements = Vec::new();
    loop {
        match read_token(stream)? {
            None => return Err(Error::UnclosedList),
            Some(Token::CloseRoundBracket) => return Ok(LispObject::wrap_list(elements)),
            Some(Token::OpenRoundBracket) => elements.push(read_list(stream)?),
            Some(token) => elements.push(read_atom(token)?),
        }
    }
}

fn read_atom(token: Token) -> Result<LispObject> {
    match token {
        Token::StringLiteral(payload) => Ok(LispObject::String(build_string(&payload))),
        Token::PlainChars(chars) => classify(chars),
        Token::OpenRoundBracket | Token::CloseRoundBracket => {
            unreachable!("brackets are handled by read_form")
        }
    }
}

fn classify(chars: String) -> Result<LispObject> {
    if INTEGER.is_match(&chars) {
        chars
            .parse::<LispInt>()
            .map(LispObject::Integer)
            .map_err(|_| Error::ReadIntError(chars))
    } else if FLOAT.is_match(&chars) {
        chars
            .parse::<LispFloat>()
            .map(LispObject::Float)
            .map_err(|_| Error::ReadFloatError(chars))
    } else {
        Ok(LispObject::new_symbol(&chars))
    }
}

use crate::stream::{BufferedStream, LineSource};
use regex::Regex;
use std::{fmt, io};

#[derive(Debug, Eq, PartialEq)]
pub enum Token {
    OpenRoundBracket,
    CloseRoundBracket,
    /// The body of a string literal, quotes stripped, escapes unresolved.
    StringLiteral(String),
    PlainChars(String),
}

#[derive(Debug)]
pub enum TokenizerError {
    UnbalancedString(String),
    IOError(io::Error),
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::UnbalancedString(s) => {
                write!(f, "tokenizer failed: unbalanced string literal {}", s)
            }
            TokenizerError::IOError(e) => write!(f, "tokenizer failed: {}", e),
        }
    }
}

impl From<io::Error> for TokenizerError {
    fn from(e: io::Error) -> Self {
        Self::IOError(e)
    }
}

lazy_static! {
    static ref COMPLETE_TOKEN: Regex = Regex::new(
        r#"(?xs)                         # ignore whitespace in this pattern & let . match newlines
            ^(?:
                \(                       # open bracket
                |\)                      # close bracket
                |"(?:[^"\\]|\\.)*"       # a closed string literal; \ escapes the next char
            )$
        "#
    )
    .unwrap();
    static ref PARTIAL_TOKEN: Regex = Regex::new(
        r#"(?xs)
            ^(?:
                "(?:[^"\\]|\\.)*\\?      # a string literal still waiting for its closing quote
                |[^\s()"]+               # one or more plain characters
            )$
        "#
    )
    .unwrap();
}

fn create_token(captured: String) -> Token {
    match captured.as_str() {
        "(" => Token::OpenRoundBracket,
        ")" => Token::CloseRoundBracket,
        _ if captured.starts_with('"') => {
            Token::StringLiteral(captured[1..captured.len() - 1].to_string())
        }
        _ => Token::PlainChars(captured),
    }
}

/// Reads the next token, or `None` once the stream is exhausted.
///
/// Characters are accumulated until they form a complete bracket or string
/// literal, or until the next one would no longer extend a run of plain
/// characters; that character is pushed back for the next read.
pub fn read_token<S: LineSource>(
    stream: &mut BufferedStream<S>,
) -> Result<Option<Token>, TokenizerError> {
    stream.skip_whitespace()?;
    let mut buffer = String::new();
    while let Some(c) = stream.getc()? {
        buffer.push(c);
        if COMPLETE_TOKEN.is_match(&buffer) {
            return Ok(Some(create_token(buffer)));
        }
        if !PARTIAL_TOKEN.is_match(&buffer) {
            buffer.pop();
            stream.putc(c);
            break;
        }
    }
    match buffer.chars().next() {
        None => Ok(None),
        Some('"') => Err(TokenizerError::UnbalancedString(buffer)),
        Some(_) => Ok(Some(create_token(buffer))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        let mut stream = BufferedStream::from_text(input);
        std::iter::from_fn(|| read_token(&mut stream).unwrap()).collect()
    }

    fn plain(s: &str) -> Token {
        Token::PlainChars(s.to_string())
    }

    #[test]
    fn brackets_split_atoms() {
        use Token::*;
        assert_eq!(
            tokenize("(foo(bar) 12)"),
            vec![
                OpenRoundBracket,
                plain("foo"),
                OpenRoundBracket,
                plain("bar"),
                CloseRoundBracket,
                plain("12"),
                CloseRoundBracket
            ]
        );
    }

    #[test]
    fn string_literals_keep_escapes() {
        assert_eq!(
            tokenize(r#"a"b \"c\" (d)"e"#),
            vec![
                plain("a"),
                Token::StringLiteral(r#"b \"c\" (d)"#.to_string()),
                plain("e")
            ]
        );
    }

    #[test]
    fn strings_may_span_lines() {
        assert_eq!(
            tokenize("\"one\ntwo\""),
            vec![Token::StringLiteral("one\ntwo".to_string())]
        );
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(tokenize("  \n\t ").is_empty());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut stream = BufferedStream::from_text(r#""never closed"#);
        assert!(matches!(
            read_token(&mut stream),
            Err(TokenizerError::UnbalancedString(_))
        ));
    }
}

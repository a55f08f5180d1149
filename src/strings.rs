// The only escape the token grammar knows is \" for a quote inside a string
// literal. Any other backslash is kept as written.

use std::iter::Peekable;
use std::str::Chars;

const QUOTE: char = '"';
const BACKSLASH: char = '\\';

struct StringBuilder<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> StringBuilder<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }
}

impl Iterator for StringBuilder<'_> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        match self.chars.next()? {
            BACKSLASH if self.chars.peek() == Some(&QUOTE) => self.chars.next(),
            c => Some(c),
        }
    }
}

/// Resolves the escapes in the body of a string literal (quotes stripped).
pub(crate) fn build_string(src: &str) -> String {
    StringBuilder::new(src).collect()
}

/// The literal, quotes included, that reads back as `src`.
pub(crate) fn string_repr(src: &str) -> String {
    let mut output = String::with_capacity(src.len() + 2);
    output.push(QUOTE);
    for c in src.chars() {
        if c == QUOTE {
            output.push(BACKSLASH);
        }
        output.push(c);
    }
    output.push(QUOTE);
    output
}

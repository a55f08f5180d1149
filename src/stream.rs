//! A character source with pushback, fed a line at a time.

use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Something that can be asked for the next line of program text.
/// `Ok(None)` signals end-of-stream.
pub trait LineSource {
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Adapts any `BufRead` (a file, stdin, a byte slice) into a `LineSource`.
pub struct ReadLines<R>(pub R);

impl<R: BufRead> LineSource for ReadLines<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match self.0.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

pub struct BufferedStream<S> {
    source: S,
    buffer: VecDeque<char>,
    exhausted: bool,
}

impl<'a> BufferedStream<ReadLines<&'a [u8]>> {
    pub fn from_text(text: &'a str) -> Self {
        Self::new(ReadLines(text.as_bytes()))
    }
}

impl<S: LineSource> BufferedStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Pulls more text from the source if nothing is buffered. Returns
    /// whether anything is buffered afterwards.
    fn fill(&mut self) -> io::Result<bool> {
        while self.buffer.is_empty() && !self.exhausted {
            match self.source.next_line()? {
                Some(line) => self.buffer.extend(line.chars()),
                None => self.exhausted = true,
            }
        }
        Ok(!self.buffer.is_empty())
    }

    /// The next character, blocking on the source if need be.
    pub fn getc(&mut self) -> io::Result<Option<char>> {
        self.fill()?;
        Ok(self.buffer.pop_front())
    }

    /// Pushes one character back so the next `getc` returns it.
    pub fn putc(&mut self, c: char) {
        self.buffer.push_front(c);
    }

    pub fn eof(&mut self) -> io::Result<bool> {
        self.fill().map(|buffered| !buffered)
    }

    pub fn skip_whitespace(&mut self) -> io::Result<()> {
        while let Some(c) = self.getc()? {
            if !c.is_whitespace() {
                self.putc(c);
                break;
            }
        }
        Ok(())
    }

    /// Drops whatever is buffered, e.g. the rest of a line that failed to read.
    pub fn discard_buffer(&mut self) {
        self.buffer.clear();
    }
}

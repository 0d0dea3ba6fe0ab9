//! Token filtering and the parser's lookahead window.

use crate::token::Token;
use std::collections::VecDeque;
use std::io;

/// Iterator adapter dropping whitespace, comment and directive tokens. Errors pass through.
pub struct SkipTrivia<I> {
    inner: I,
}

pub fn skip_trivia<I>(inner: I) -> SkipTrivia<I>
where
    I: Iterator<Item = io::Result<Token>>,
{
    SkipTrivia { inner }
}

impl<I> Iterator for SkipTrivia<I>
where
    I: Iterator<Item = io::Result<Token>>,
{
    type Item = io::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(t) if t.kind.is_trivia() => continue,
                other => return Some(other),
            }
        }
    }
}

/// Random-access peek over a token stream without consuming it.
///
/// Tokens are pulled from the upstream iterator only when an offset beyond the
/// buffered window is requested. `peek` returns `Ok(None)` once the upstream is
/// exhausted before the requested offset; whether that is a clean end of input or a
/// truncated declaration is for the caller to decide.
pub struct LookAhead<I> {
    inner: I,
    buf: VecDeque<Token>,
    exhausted: bool,
}

impl<I> LookAhead<I>
where
    I: Iterator<Item = io::Result<Token>>,
{
    pub fn new(inner: I) -> Self {
        LookAhead {
            inner,
            buf: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Token at offset `k` from the current position.
    pub fn peek(&mut self, k: usize) -> io::Result<Option<&Token>> {
        while self.buf.len() <= k && !self.exhausted {
            match self.inner.next() {
                Some(Ok(t)) => self.buf.push_back(t),
                Some(Err(e)) => {
                    self.exhausted = true;
                    return Err(e);
                }
                None => self.exhausted = true,
            }
        }
        Ok(self.buf.get(k))
    }

    /// Consume the current token.
    pub fn bump(&mut self) -> io::Result<Option<Token>> {
        self.peek(0)?;
        Ok(self.buf.pop_front())
    }

    /// Number of tokens currently cached ahead of the cursor.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn is_exhausted(&mut self) -> io::Result<bool> {
        Ok(self.peek(0)?.is_none())
    }
}

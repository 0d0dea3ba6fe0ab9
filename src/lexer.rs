//! Hand-built tokenizer for the declaration language.
//!
//! [`Input`] pulls the source from any [`Read`] in fixed-size chunks and hands out one
//! character at a time with a single character of lookahead. [`Lexer`] is a lazy iterator
//! over classified [`Token`]s; it never fails on unrecognized characters (they become
//! [`TokenKind::Unknown`] tokens), only on I/O errors from the underlying reader.

use crate::token::{Keyword, Token, TokenKind};
use std::collections::VecDeque;
use std::io::{self, Read};

/// Bytes requested from the reader per refill.
pub const CHUNK_SIZE: usize = 1024;

const PUNCTUATION: &str = ".><+-*/%&^|!;{},:=()[]~?";

const TWO_CHAR_OPERATORS: [&str; 19] = [
    "+=", "-=", "*=", "/=", "%=", "&=", "^=", "|=", ">>", "<<", "++", "--", "->", "&&", "||",
    "<=", ">=", "==", "!=",
];

/// Alternate bracket spellings and their canonical form.
const DIGRAPHS: [(&str, &str); 4] = [("<:", "["), (":>", "]"), ("<%", "{"), ("%>", "}")];

/// Character source refilled on demand from a reader.
pub struct Input<R> {
    reader: R,
    buf: VecDeque<char>,
    /// Undecoded tail of the last chunk (partial UTF-8 sequence).
    pending: Vec<u8>,
    eof: bool,
    line: u32,
}

impl<R: Read> Input<R> {
    pub fn new(reader: R) -> Self {
        Input {
            reader,
            buf: VecDeque::new(),
            pending: Vec::new(),
            eof: false,
            line: 1,
        }
    }

    /// Line of the next character to be popped (1-based).
    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn peek(&mut self) -> io::Result<Option<char>> {
        self.fill()?;
        Ok(self.buf.front().copied())
    }

    pub fn pop(&mut self) -> io::Result<Option<char>> {
        self.fill()?;
        let ch = self.buf.pop_front();
        if ch == Some('\n') {
            self.line += 1;
        }
        Ok(ch)
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        while self.buf.is_empty() && !self.eof {
            let n = match self.reader.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                self.eof = true;
                if !self.pending.is_empty() {
                    self.pending.clear();
                    self.buf.push_back(char::REPLACEMENT_CHARACTER);
                }
                break;
            }
            self.pending.extend_from_slice(&chunk[..n]);
            self.decode_pending();
        }
        Ok(())
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    self.buf.extend(s.chars());
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    let prefix = std::str::from_utf8(&self.pending[..valid]).unwrap_or_default();
                    self.buf.extend(prefix.chars());
                    match e.error_len() {
                        Some(bad) => {
                            self.buf.push_back(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_int_suffix(c: char) -> bool {
    matches!(c, 'u' | 'U' | 'l' | 'L')
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0b' | '\n' | '\x0c' | '\r')
}

/// Lazy token iterator. Stops after the first I/O error.
pub struct Lexer<R> {
    input: Input<R>,
    failed: bool,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Lexer {
            input: Input::new(reader),
            failed: false,
        }
    }

    fn take_while(&mut self, text: &mut String, pred: impl Fn(char) -> bool) -> io::Result<()> {
        while let Some(c) = self.input.peek()? {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.input.pop()?;
        }
        Ok(())
    }

    fn lex_token(&mut self) -> io::Result<Option<Token>> {
        let line = self.input.line();
        let ch = match self.input.pop()? {
            Some(c) => c,
            None => return Ok(None),
        };
        let mut text = String::new();
        text.push(ch);

        let kind = if is_ident_start(ch) {
            self.take_while(&mut text, is_ident_continue)?;
            match Keyword::lookup(&text) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Identifier,
            }
        } else if ch == '\'' {
            self.char_literal(&mut text)?;
            TokenKind::CharLiteral
        } else if ch == '"' {
            self.string_literal(&mut text)?;
            TokenKind::StringLiteral
        } else if PUNCTUATION.contains(ch) {
            return self.punctuation(ch, line).map(Some);
        } else if ch.is_ascii_digit() {
            self.number(ch, &mut text)?;
            TokenKind::NumericLiteral
        } else if is_space(ch) {
            self.take_while(&mut text, is_space)?;
            TokenKind::Whitespace
        } else if ch == '#' {
            self.take_while(&mut text, |c| c != '\n')?;
            TokenKind::Directive
        } else {
            TokenKind::Unknown
        };
        Ok(Some(Token::new(kind, text, line)))
    }

    fn char_literal(&mut self, text: &mut String) -> io::Result<()> {
        match self.input.pop()? {
            Some('\\') => {
                text.push('\\');
                if let Some(escaped) = self.input.pop()? {
                    text.push(escaped);
                }
            }
            Some(c) => text.push(c),
            None => return Ok(()),
        }
        if self.input.peek()? == Some('\'') {
            self.input.pop()?;
            text.push('\'');
        }
        Ok(())
    }

    fn string_literal(&mut self, text: &mut String) -> io::Result<()> {
        while let Some(c) = self.input.pop()? {
            text.push(c);
            match c {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = self.input.pop()? {
                        text.push(escaped);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn number(&mut self, first: char, text: &mut String) -> io::Result<()> {
        if first != '0' {
            return self.take_while(text, |c| c.is_ascii_digit());
        }
        match self.input.peek()? {
            Some(x @ ('x' | 'X')) => {
                self.input.pop()?;
                text.push(x);
                self.take_while(text, |c| c.is_ascii_hexdigit())?;
                self.take_while(text, is_int_suffix)
            }
            Some(d) if d.is_ascii_digit() => self.take_while(text, |c| c.is_ascii_digit()),
            _ => Ok(()),
        }
    }

    fn punctuation(&mut self, first: char, line: u32) -> io::Result<Token> {
        let next = match self.input.peek()? {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Operator, first.to_string(), line)),
        };
        let mut pair = String::with_capacity(2);
        pair.push(first);
        pair.push(next);

        if let Some((_, canonical)) = DIGRAPHS.iter().find(|(d, _)| *d == pair) {
            self.input.pop()?;
            return Ok(Token::new(TokenKind::Operator, *canonical, line));
        }
        if pair == "//" {
            self.input.pop()?;
            self.take_while(&mut pair, |c| c != '\n')?;
            return Ok(Token::new(TokenKind::Comment, pair, line));
        }
        if pair == "/*" {
            self.input.pop()?;
            self.block_comment(&mut pair)?;
            return Ok(Token::new(TokenKind::Comment, pair, line));
        }
        if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
            self.input.pop()?;
            return Ok(Token::new(TokenKind::Operator, pair, line));
        }
        Ok(Token::new(TokenKind::Operator, first.to_string(), line))
    }

    /// Consume a block comment body; `text` already holds the opening `/*`.
    fn block_comment(&mut self, text: &mut String) -> io::Result<()> {
        while let Some(c) = self.input.pop()? {
            text.push(c);
            if c == '*' && self.input.peek()? == Some('/') {
                self.input.pop()?;
                text.push('/');
                break;
            }
        }
        Ok(())
    }
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = io::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.lex_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Tokenize an in-memory source, trivia included.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source.as_bytes()).map_while(Result::ok).collect()
}

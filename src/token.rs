//! Token types produced by the lexer.

use std::fmt;

/// Reserved words. Base-type names (`int`, `uint8_t`, ...) are not reserved; they lex as identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Auto,
    Break,
    Case,
    Const,
    Continue,
    Default,
    Do,
    Else,
    Enum,
    Extern,
    For,
    Goto,
    If,
    Register,
    Return,
    Signed,
    Sizeof,
    Static,
    Struct,
    Typedef,
    Union,
    Unsigned,
    Void,
    Volatile,
    While,
}

impl Keyword {
    pub const ALL: [Keyword; 25] = [
        Keyword::Auto,
        Keyword::Break,
        Keyword::Case,
        Keyword::Const,
        Keyword::Continue,
        Keyword::Default,
        Keyword::Do,
        Keyword::Else,
        Keyword::Enum,
        Keyword::Extern,
        Keyword::For,
        Keyword::Goto,
        Keyword::If,
        Keyword::Register,
        Keyword::Return,
        Keyword::Signed,
        Keyword::Sizeof,
        Keyword::Static,
        Keyword::Struct,
        Keyword::Typedef,
        Keyword::Union,
        Keyword::Unsigned,
        Keyword::Void,
        Keyword::Volatile,
        Keyword::While,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Auto => "auto",
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Default => "default",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Enum => "enum",
            Keyword::Extern => "extern",
            Keyword::For => "for",
            Keyword::Goto => "goto",
            Keyword::If => "if",
            Keyword::Register => "register",
            Keyword::Return => "return",
            Keyword::Signed => "signed",
            Keyword::Sizeof => "sizeof",
            Keyword::Static => "static",
            Keyword::Struct => "struct",
            Keyword::Typedef => "typedef",
            Keyword::Union => "union",
            Keyword::Unsigned => "unsigned",
            Keyword::Void => "void",
            Keyword::Volatile => "volatile",
            Keyword::While => "while",
        }
    }

    /// Look up a word in the reserved set.
    pub fn lookup(word: &str) -> Option<Keyword> {
        Keyword::ALL.iter().copied().find(|k| k.as_str() == word)
    }
}

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword(Keyword),
    CharLiteral,
    StringLiteral,
    NumericLiteral,
    /// Operator or punctuation; digraphs carry their canonical spelling.
    Operator,
    Whitespace,
    Comment,
    Directive,
    Unknown,
}

impl TokenKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::CharLiteral | TokenKind::StringLiteral | TokenKind::NumericLiteral
        )
    }

    /// Whitespace, comments and directives never reach the parser.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Directive
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Keyword(k) => write!(f, "keyword '{}'", k.as_str()),
            TokenKind::CharLiteral => write!(f, "char literal"),
            TokenKind::StringLiteral => write!(f, "string literal"),
            TokenKind::NumericLiteral => write!(f, "numeric literal"),
            TokenKind::Operator => write!(f, "operator"),
            TokenKind::Whitespace => write!(f, "whitespace"),
            TokenKind::Comment => write!(f, "comment"),
            TokenKind::Directive => write!(f, "directive"),
            TokenKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A classified token with its source text and the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: u32) -> Self {
        Token {
            kind,
            value: value.into(),
            line,
        }
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.value == op
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.value == name
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Keyword(_) => write!(f, "{}", self.kind),
            _ => write!(f, "{} '{}'", self.kind, self.value),
        }
    }
}

//! Recursive-descent parser from tokens to declarations.
//!
//! Top level: `typedef struct {..} Name;`, `struct Name {..};` and `Ret name(args);`.
//! Field markers (`_derived`, `_size_is(n)`, `_default(0)`, ...) are resolved into a
//! [`Classification`] while the field is parsed. The first mismatch aborts the parse.

use crate::ast::*;
use crate::config::Config;
use crate::lexer::Lexer;
use crate::stream::{skip_trivia, LookAhead, SkipTrivia};
use crate::token::{Keyword, Token, TokenKind};
use std::io::{self, Read};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, got {found}")]
    Unexpected {
        expected: String,
        found: Token,
        line: u32,
    },
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("line {line}: field '{field}': {second} conflicts with {first}")]
    ConflictingMarkers {
        field: String,
        first: String,
        second: String,
        line: u32,
    },
    #[error("IO: {0}")]
    Io(#[from] io::Error),
}

/// Parse an in-memory source with the default configuration.
pub fn parse(source: &str) -> Result<Vec<Declaration>, ParseError> {
    parse_with(source, &Config::default())
}

pub fn parse_with(source: &str, config: &Config) -> Result<Vec<Declaration>, ParseError> {
    parse_reader(source.as_bytes(), config)
}

pub fn parse_reader<R: Read>(reader: R, config: &Config) -> Result<Vec<Declaration>, ParseError> {
    Parser::from_reader(reader, config).collect()
}

/// Markers allowed immediately after the base type.
const TYPE_SITE_MARKERS: [&str; 5] = ["_derived", "_immutable", "_broken", "_version", "_size_is"];
/// Markers allowed immediately after the variable name.
const NAME_SITE_MARKERS: [&str; 7] = [
    "_derived",
    "_immutable",
    "_broken",
    "_version",
    "_size_is",
    "_default",
    "_type_of",
];

#[derive(Debug, Clone)]
enum Annotation {
    Skip(SkipReason),
    SizeIs(String),
    Default(String),
    TypeOf(String),
}

impl Annotation {
    fn marker(&self) -> &'static str {
        match self {
            Annotation::Skip(r) => r.marker(),
            Annotation::SizeIs(_) => "_size_is",
            Annotation::Default(_) => "_default",
            Annotation::TypeOf(_) => "_type_of",
        }
    }
}

enum Bracket {
    Size(String),
    Capacity(String),
}

impl Bracket {
    fn describe(&self) -> String {
        match self {
            Bracket::Size(s) | Bracket::Capacity(s) => format!("[{}]", s),
        }
    }
}

/// Markers collected for one field. The first conflicting pair is kept for the error.
#[derive(Default)]
struct FieldMarkers {
    classifier: Option<Annotation>,
    version: Option<String>,
    conflict: Option<(String, String)>,
}

impl FieldMarkers {
    fn add(&mut self, annotation: Annotation) {
        if self.conflict.is_some() {
            return;
        }
        match &self.classifier {
            Some(prev) => {
                self.conflict = Some((prev.marker().to_string(), annotation.marker().to_string()))
            }
            None => self.classifier = Some(annotation),
        }
    }

    fn set_version(&mut self, version: String) {
        if self.conflict.is_some() {
            return;
        }
        if self.version.is_some() {
            self.conflict = Some(("_version".to_string(), "_version".to_string()));
        } else {
            self.version = Some(version);
        }
    }

    fn has_size(&self) -> bool {
        matches!(self.classifier, Some(Annotation::SizeIs(_)))
    }

    /// `list_type` is the base type name when it is a configured list type. A list field
    /// is a container unless skipped: a bracket, `_size_is` or `_default` on it conflicts.
    fn finish(
        self,
        bracket: Option<Bracket>,
        list_type: Option<&str>,
    ) -> Result<(Classification, Option<String>), (String, String)> {
        if let Some(conflict) = self.conflict {
            return Err(conflict);
        }
        if let Some(list) = list_type {
            let clash = match (&self.classifier, &bracket) {
                (Some(Annotation::Skip(_)), _) => None,
                (Some(a @ (Annotation::SizeIs(_) | Annotation::Default(_))), _) => {
                    Some(a.marker().to_string())
                }
                (_, Some(b)) => Some(b.describe()),
                _ => None,
            };
            if let Some(second) = clash {
                return Err((list.to_string(), second));
            }
        }
        let classification = match (self.classifier, bracket) {
            (Some(Annotation::Skip(reason)), _) => Classification::Skipped { reason },
            (Some(Annotation::SizeIs(n)), None) => Classification::FixedArray {
                size: SizeExpr::Field(n),
                capacity: None,
            },
            (Some(Annotation::SizeIs(n)), Some(Bracket::Capacity(c))) => {
                Classification::FixedArray {
                    size: SizeExpr::Field(n),
                    capacity: Some(c),
                }
            }
            (Some(a), Some(b)) => return Err((b.describe(), a.marker().to_string())),
            (Some(Annotation::Default(literal)), None) => {
                Classification::DefaultValued { literal }
            }
            (Some(Annotation::TypeOf(e)), None) => Classification::Container {
                element_type: Some(e),
            },
            (None, Some(Bracket::Size(s) | Bracket::Capacity(s))) => {
                Classification::FixedArray {
                    size: SizeExpr::Constant(s),
                    capacity: None,
                }
            }
            (None, None) if list_type.is_some() => Classification::Container { element_type: None },
            (None, None) => Classification::Plain,
        };
        Ok((classification, self.version))
    }
}

/// Pull parser producing one [`Declaration`] per call.
pub struct Parser<I> {
    la: LookAhead<I>,
    config: Config,
    done: bool,
}

impl<R: Read> Parser<SkipTrivia<Lexer<R>>> {
    pub fn from_reader(reader: R, config: &Config) -> Self {
        Parser::new(skip_trivia(Lexer::new(reader)), config)
    }
}

impl<I> Parser<I>
where
    I: Iterator<Item = io::Result<Token>>,
{
    /// `tokens` must already be free of trivia (see [`skip_trivia`]).
    pub fn new(tokens: I, config: &Config) -> Self {
        Parser {
            la: LookAhead::new(tokens),
            config: config.clone(),
            done: false,
        }
    }

    /// Next top-level declaration; `Ok(None)` on clean end of input.
    pub fn next_declaration(&mut self) -> Result<Option<Declaration>, ParseError> {
        if self.la.is_exhausted()? {
            return Ok(None);
        }
        let decl = if self.check_keyword(0, Keyword::Typedef)? {
            Declaration::Typedef(self.typedef()?)
        } else if self.starts_struct_definition()? {
            Declaration::Struct(self.struct_body()?)
        } else {
            Declaration::Function(self.function()?)
        };
        self.expect_operator(";")?;
        log::debug!("parsed declaration {}", decl.name());
        Ok(Some(decl))
    }

    fn starts_struct_definition(&mut self) -> Result<bool, ParseError> {
        if !self.check_keyword(0, Keyword::Struct)? {
            return Ok(false);
        }
        if self.check_operator(1, "{")? {
            return Ok(true);
        }
        Ok(self.check_kind(1, TokenKind::Identifier)? && self.check_operator(2, "{")?)
    }

    fn typedef(&mut self) -> Result<TypedefDecl, ParseError> {
        self.expect_keyword(Keyword::Typedef)?;
        let underlying = self.struct_body()?;
        let alias = self.expect_identifier("typedef name")?;
        Ok(TypedefDecl { alias, underlying })
    }

    fn struct_body(&mut self) -> Result<StructDecl, ParseError> {
        self.expect_keyword(Keyword::Struct)?;
        let name = if self.check_kind(0, TokenKind::Identifier)? {
            Some(self.expect_identifier("struct name")?)
        } else {
            None
        };
        self.expect_operator("{")?;
        let mut fields = Vec::new();
        while !self.check_operator(0, "}")? {
            fields.push(self.var_decl()?);
            self.expect_operator(";")?;
        }
        self.expect_operator("}")?;
        Ok(StructDecl { name, fields })
    }

    fn function(&mut self) -> Result<FuncDecl, ParseError> {
        let return_type = self.return_type()?;
        let name = self.expect_identifier("function name")?;
        self.expect_operator("(")?;
        let mut args = Vec::new();
        if self.check_keyword(0, Keyword::Void)? && self.check_operator(1, ")")? {
            self.la.bump()?;
        } else if !self.check_operator(0, ")")? {
            loop {
                args.push(self.var_decl()?);
                if !self.eat_operator(",")? {
                    break;
                }
            }
        }
        self.expect_operator(")")?;
        Ok(FuncDecl {
            return_type,
            name,
            args,
        })
    }

    fn return_type(&mut self) -> Result<ReturnType, ParseError> {
        let is_const = self.eat_keyword(Keyword::Const)?;
        let is_struct = self.eat_keyword(Keyword::Struct)?;
        let name = self.base_type_name()?;
        let is_pointer = self.eat_operator("*")?;
        Ok(ReturnType {
            name,
            is_const,
            is_struct,
            is_pointer,
        })
    }

    fn base_type_name(&mut self) -> Result<String, ParseError> {
        if self.eat_keyword(Keyword::Void)? {
            return Ok("void".to_string());
        }
        self.expect_identifier("type name")
    }

    /// `const? struct? Type markers* '*'? name ('[' bound ']')? markers*`, without the terminator.
    ///
    /// When no bracket follows the name directly it may instead follow the name-site markers.
    fn var_decl(&mut self) -> Result<FieldDecl, ParseError> {
        let is_const = self.eat_keyword(Keyword::Const)?;
        let is_struct = self.eat_keyword(Keyword::Struct)?;
        let base_type = self.base_type_name()?;

        let mut markers = FieldMarkers::default();
        self.markers(&mut markers, &TYPE_SITE_MARKERS)?;

        let is_pointer = self.eat_operator("*")?;
        let name_token = self.expect(|t| t.kind == TokenKind::Identifier, || "variable name".into())?;
        let variable = name_token.value;

        let mut bracket = self.bracket(&markers)?;
        self.markers(&mut markers, &NAME_SITE_MARKERS)?;
        if bracket.is_none() {
            // `int count _size_is(n) [8];`: the bound may also follow the name-site markers
            bracket = self.bracket(&markers)?;
            if bracket.is_some() {
                self.markers(&mut markers, &NAME_SITE_MARKERS)?;
            }
        }

        let list_type = Some(base_type.as_str()).filter(|t| self.config.is_list_type(t));
        let (classification, version) =
            markers
                .finish(bracket, list_type)
                .map_err(|(first, second)| ParseError::ConflictingMarkers {
                    field: variable.clone(),
                    first,
                    second,
                    line: name_token.line,
                })?;

        Ok(FieldDecl {
            base_type,
            variable,
            is_const,
            is_struct,
            is_pointer,
            version,
            classification,
        })
    }

    /// Optional `[bound]`: a capacity once a size marker is set, the size otherwise.
    fn bracket(&mut self, markers: &FieldMarkers) -> Result<Option<Bracket>, ParseError> {
        if !self.eat_operator("[")? {
            return Ok(None);
        }
        let bound = self.expect(
            |t| matches!(t.kind, TokenKind::NumericLiteral | TokenKind::Identifier),
            || "array bound".into(),
        )?;
        self.expect_operator("]")?;
        if markers.has_size() {
            Ok(Some(Bracket::Capacity(bound.value)))
        } else {
            Ok(Some(Bracket::Size(bound.value)))
        }
    }

    fn markers(&mut self, markers: &mut FieldMarkers, allowed: &[&str]) -> Result<(), ParseError> {
        loop {
            let name = match self.la.peek(0)? {
                Some(t) if t.kind == TokenKind::Identifier && allowed.contains(&t.value.as_str()) => {
                    t.value.clone()
                }
                _ => return Ok(()),
            };
            self.la.bump()?;
            if name == "_version" {
                let version = self.marker_argument(true)?;
                markers.set_version(version);
                continue;
            }
            let annotation = match name.as_str() {
                "_derived" => Annotation::Skip(SkipReason::Derived),
                "_immutable" => Annotation::Skip(SkipReason::Immutable),
                "_broken" => Annotation::Skip(SkipReason::Broken),
                "_size_is" => Annotation::SizeIs(self.marker_argument(false)?),
                "_default" => Annotation::Default(self.marker_argument(true)?),
                _ => Annotation::TypeOf(self.marker_argument(false)?),
            };
            markers.add(annotation);
        }
    }

    /// `( literal )` or `( identifier )`.
    fn marker_argument(&mut self, literal: bool) -> Result<String, ParseError> {
        self.expect_operator("(")?;
        let value = if literal {
            self.expect(|t| t.kind.is_literal(), || "literal".into())?.value
        } else {
            self.expect_identifier("identifier")?
        };
        self.expect_operator(")")?;
        Ok(value)
    }

    // ---- token helpers ----

    fn check(&mut self, k: usize, pred: impl FnOnce(&Token) -> bool) -> Result<bool, ParseError> {
        Ok(self.la.peek(k)?.is_some_and(pred))
    }

    fn check_operator(&mut self, k: usize, op: &str) -> Result<bool, ParseError> {
        self.check(k, |t| t.is_operator(op))
    }

    fn check_keyword(&mut self, k: usize, kw: Keyword) -> Result<bool, ParseError> {
        self.check(k, |t| t.is_keyword(kw))
    }

    fn check_kind(&mut self, k: usize, kind: TokenKind) -> Result<bool, ParseError> {
        self.check(k, |t| t.kind == kind)
    }

    fn eat_operator(&mut self, op: &str) -> Result<bool, ParseError> {
        let hit = self.check_operator(0, op)?;
        if hit {
            self.la.bump()?;
        }
        Ok(hit)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> Result<bool, ParseError> {
        let hit = self.check_keyword(0, kw)?;
        if hit {
            self.la.bump()?;
        }
        Ok(hit)
    }

    fn expect(
        &mut self,
        pred: impl FnOnce(&Token) -> bool,
        expected: impl FnOnce() -> String,
    ) -> Result<Token, ParseError> {
        match self.la.bump()? {
            Some(t) => {
                if pred(&t) {
                    Ok(t)
                } else {
                    Err(ParseError::Unexpected {
                        expected: expected(),
                        line: t.line,
                        found: t,
                    })
                }
            }
            None => Err(ParseError::UnexpectedEof {
                expected: expected(),
            }),
        }
    }

    fn expect_operator(&mut self, op: &str) -> Result<(), ParseError> {
        self.expect(|t| t.is_operator(op), || format!("operator '{}'", op))
            .map(|_| ())
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), ParseError> {
        self.expect(|t| t.is_keyword(kw), || format!("keyword '{}'", kw.as_str()))
            .map(|_| ())
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        self.expect(|t| t.kind == TokenKind::Identifier, || what.to_string())
            .map(|t| t.value)
    }
}

impl<I> Iterator for Parser<I>
where
    I: Iterator<Item = io::Result<Token>>,
{
    type Item = Result<Declaration, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_declaration() {
            Ok(Some(decl)) => Some(Ok(decl)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

//! # qcgen: save/load procedure generator for annotated C structs
//!
//! Reads a restricted C declaration language (structs, typedefs of structs and simple
//! function prototypes) whose fields carry serialization markers, and emits a
//! `qc_save_T` / `qc_load_T` pair per struct driving a visitor-based marshalling API.
//!
//! ## Pipeline
//!
//! text → [`lexer`] tokens → [`stream::skip_trivia`] → [`parser`] declarations →
//! [`codegen`] C text. Every stage pulls from the previous one on demand.
//!
//! ## Field markers
//!
//! - `_derived`, `_immutable`, `_broken`: field is not serialized
//! - `_size_is(n)`: array whose element count is field `n`; a following `[N]` is the capacity
//! - `_default(lit)`: omitted on save when equal to `lit`, reset to `lit` before load
//! - `_type_of(T)`: `GSList` of `T` elements (a `GSList` field is a list even without it)
//! - `_version(lit)`: recorded, no effect on generated code
//!
//! ## Example
//!
//! ```text
//! typedef struct SerialFIFO {
//!     uint8_t data[UART_FIFO_LENGTH];
//!     uint8_t count;
//! } SerialFIFO;
//!
//! struct SerialState {
//!     uint16_t divider;
//!     uint8_t _derived thr;
//!     int thr_ipending _default(0);
//!     GSList *timers _type_of(Timer);
//! };
//! ```
//!
//! Parsing and generation can be split across processes through the JSON form of the
//! IR: see [`declarations_to_json`] and [`generate_from_json`].

pub mod ast;
pub mod codegen;
pub mod config;
pub mod dump;
pub mod filter;
pub mod lexer;
pub mod logger;
pub mod parser;
pub mod stream;
pub mod token;

pub use ast::{
    Classification, Declaration, FieldDecl, FuncDecl, ReturnType, SizeExpr, SkipReason,
    StructDecl, TypedefDecl,
};
pub use codegen::{Direction, Generator};
pub use config::Config;
pub use lexer::{tokenize, Lexer};
pub use parser::{parse, parse_reader, parse_with, ParseError, Parser};
pub use token::{Keyword, Token, TokenKind};

use std::io::{Read, Write};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("formatting generated code")]
    Fmt(#[from] std::fmt::Error),
}

/// Compile an in-memory source with the default configuration.
pub fn compile(source: &str) -> Result<String, CompileError> {
    compile_with(source, &Config::default())
}

pub fn compile_with(source: &str, config: &Config) -> Result<String, CompileError> {
    compile_reader(source.as_bytes(), config)
}

/// Parse everything, then generate. Nothing is returned if any declaration fails to parse.
pub fn compile_reader<R: Read>(reader: R, config: &Config) -> Result<String, CompileError> {
    let decls = parse_reader(reader, config)?;
    Ok(Generator::new(config.clone()).generate(&decls)?)
}

/// Emit each declaration's procedures as soon as it is parsed.
///
/// On a parse error, code for the declarations before it has already been written.
/// Returns the number of declarations parsed.
pub fn compile_streaming<R: Read, W: Write>(
    reader: R,
    mut writer: W,
    config: &Config,
) -> Result<usize, CompileError> {
    let generator = Generator::new(config.clone());
    let mut count = 0;
    let mut text = String::new();
    for decl in Parser::from_reader(reader, config) {
        let decl = decl?;
        text.clear();
        generator.write_declaration(&mut text, &decl)?;
        writer.write_all(text.as_bytes())?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Serialize a declaration list for a later [`generate_from_json`] run.
pub fn declarations_to_json(decls: &[Declaration]) -> Result<String, CompileError> {
    Ok(serde_json::to_string_pretty(decls)?)
}

/// Generate code from a JSON declaration list, bypassing the tokenizer and parser.
pub fn generate_from_json(json: &str, config: &Config) -> Result<String, CompileError> {
    let decls: Vec<Declaration> = serde_json::from_str(json)?;
    Ok(Generator::new(config.clone()).generate(&decls)?)
}

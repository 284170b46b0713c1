//! Turning PHP source text into a syntax tree: [`lex`] splits the text into
//! tokens, tracking string interpolation and heredocs, and [`parser`] builds a
//! [`phpast_common::Node`] tree from them.

pub mod lex;
pub mod parser;

pub use lex::{tokenize, LexerOptions, Token, TokenKind, TokenValue, Tokenizer};
pub use parser::{
    parse, parse_with, Cursor, InvalidVersion, ParseError, Parsed, Parser, ParserOptions, Version,
};

//! A recursive descent parser producing a [`Node`] tree. The grammar is split
//! across three modules which all extend the same [`Parser`]:
//!
//! - [`expr`](self::expr) handles expressions, by precedence climbing,
//! - [`stmt`](self::stmt) handles statements and statement lists,
//! - [`decl`](self::decl) handles functions, classes and their members.
//!
//! All of them move through the token stream using the [`Cursor`] trait.

mod decl;
mod error;
mod expr;
mod stmt;


use std::fmt;
use std::str::FromStr;

use log::{info, trace};
use phpast_common::{Location, Node, NodeKind};

pub use self::error::{InvalidVersion, ParseError};
use crate::lex::{tokenize, LexerOptions, Token, TokenKind, Tokenizer};

pub type Result<T> = std::result::Result<T, ParseError>;

/// A PHP language version, used to gate newer syntax.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const PHP_80: Self = Self::new(8, 0);
    pub const PHP_81: Self = Self::new(8, 1);
    pub const LATEST: Self = Self::new(8, 3);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::LATEST
    }
}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || InvalidVersion(s.into());
        let (major, minor) = s.trim().split_once('.').unwrap_or((s.trim(), "0"));

        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ParserOptions {
    pub version: Version,

    /// Record syntax errors and continue at the next statement instead of
    /// giving up at the first one.
    pub error_recovery: bool,

    /// Fail if any error was recorded during recovery.
    pub strict: bool,
}

/// The result of a successful parse. With error recovery, `errors` holds every
/// syntax error that was skipped over.
#[derive(Clone, Debug, PartialEq)]
pub struct Parsed {
    pub program: Node,
    pub errors: Vec<ParseError>,
}

/// Parse a complete source text with the default options.
pub fn parse(source: &str) -> Result<Node> {
    parse_with(
        source,
        None,
        &LexerOptions::default(),
        &ParserOptions::default(),
    )
    .map(|parsed| parsed.program)
}

/// Parse a source text, tagging every location with the given file id.
pub fn parse_with(
    source: &str,
    file: Option<usize>,
    lexer: &LexerOptions,
    options: &ParserOptions,
) -> Result<Parsed> {
    let tokens = match file {
        Some(id) => Tokenizer::new(source, *lexer).with_source(id).tokenize(),
        None => tokenize(source, lexer),
    };

    Parser::new(tokens, *options).parse_program()
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    options: ParserOptions,
    errors: Vec<ParseError>,
}

impl Parser {
    /// Create a parser over some tokens. Trivia is dropped, and an `Eof` token
    /// is added if the stream does not already end with one.
    pub fn new(tokens: Vec<Token>, options: ParserOptions) -> Self {
        let mut tokens: Vec<_> = tokens
            .into_iter()
            .filter(|token| !token.kind.is_trivia())
            .collect();

        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            let end = tokens
                .last()
                .map(|token| Location::at(token.location.end).with_source(token.location.source))
                .unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", end));
        }

        Self {
            tokens,
            current: 0,
            options,
            errors: Vec::new(),
        }
    }

    /// Parse every statement up to the end of the input.
    pub fn parse_program(mut self) -> Result<Parsed> {
        info!("beginning parsing (PHP {})", self.options.version);

        let start = self.peek().location;
        let statements = self.statements(|this| this.is_at_end())?;
        let program = Node::new(NodeKind::Program { statements }, start + self.peek().location);

        trace!("done parsing ({} errors)", self.errors.len());

        if self.options.strict {
            if let Some(error) = self.errors.into_iter().next() {
                return Err(error);
            }

            return Ok(Parsed {
                program,
                errors: Vec::new(),
            });
        }

        Ok(Parsed {
            program,
            errors: self.errors,
        })
    }

    /// Whether the targeted language version is at least `version`.
    fn supports(&self, version: Version) -> bool {
        self.options.version >= version
    }

    /// Record an error which has been recovered from.
    fn recover(&mut self, error: ParseError) {
        trace!("recovering from {error}");
        self.errors.push(error);
        self.synchronize();
    }

    /// Skip tokens until something that plausibly starts a new statement.
    /// The failing token is always discarded.
    fn synchronize(&mut self) {
        const STATEMENT_STARTS: &[TokenKind] = &[
            TokenKind::Class,
            TokenKind::Function,
            TokenKind::Var,
            TokenKind::For,
            TokenKind::Foreach,
            TokenKind::If,
            TokenKind::While,
            TokenKind::Do,
            TokenKind::Echo,
            TokenKind::Print,
            TokenKind::Return,
            TokenKind::Switch,
            TokenKind::Try,
            TokenKind::Throw,
        ];

        if !self.is_at_end() {
            self.advance();
        }

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon || self.check(STATEMENT_STARTS) {
                return;
            }

            trace!("skipping {}", self.peek().kind);
            self.advance();
        }
    }

    /// Build a node spanning from `start` to the previously consumed token.
    fn finish(&self, kind: NodeKind, start: Location) -> Node {
        Node::new(kind, start + self.previous().location)
    }
}

/// The location of a node produced by this parser.
fn span(node: &Node) -> Location {
    node.location.unwrap_or_default()
}

/// The name carried by an identifier or variable token, or its text.
fn name_of(token: &Token) -> String {
    token
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| token.text.clone())
}

/// Movement through the token stream.
pub trait Cursor {
    /// The current token. At the end of the input, this is `Eof`.
    fn peek(&self) -> &Token;

    /// The token `n` tokens ahead of the current one.
    fn peek_at(&self, n: usize) -> &Token;

    /// The most recently consumed token.
    fn previous(&self) -> &Token;

    /// Consume the current token and return it. Never moves past `Eof`.
    fn advance(&mut self) -> Token;

    fn checkpoint(&self) -> usize;

    fn rewind(&mut self, checkpoint: usize);

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, matcher: impl Matcher) -> bool {
        matcher.matches(self.peek())
    }

    /// Consume the current token if it matches.
    fn eat(&mut self, matcher: impl Matcher) -> Option<Token> {
        if self.check(matcher) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume the current token if it matches, or fail with the given
    /// message.
    fn consume(&mut self, matcher: impl Matcher, message: &str) -> Result<Token> {
        match self.eat(matcher) {
            Some(token) => Ok(token),
            None => Err(self.error(message)),
        }
    }

    /// An error at the current token.
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.peek().clone())
    }
}

impl Cursor for Parser {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.current + n).min(last)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn checkpoint(&self) -> usize {
        self.current
    }

    fn rewind(&mut self, checkpoint: usize) {
        self.current = checkpoint;
    }
}

pub trait Matcher {
    fn matches(&self, token: &Token) -> bool;
}

impl Matcher for TokenKind {
    fn matches(&self, token: &Token) -> bool {
        *self == token.kind
    }
}

impl Matcher for &[TokenKind] {
    fn matches(&self, token: &Token) -> bool {
        self.iter().any(|kind| kind.matches(token))
    }
}

impl<const N: usize> Matcher for &[TokenKind; N] {
    fn matches(&self, token: &Token) -> bool {
        self.iter().any(|kind| kind.matches(token))
    }
}

/// Matches identifiers as well as keywords, for the places where PHP allows
/// reserved words as names.
#[derive(Clone, Copy, Debug)]
pub struct AnyName;

impl Matcher for AnyName {
    fn matches(&self, token: &Token) -> bool {
        token.kind == TokenKind::Identifier || token.kind.is_keyword()
    }
}

//! Tokenization turns PHP source text into a stream of [`Token`]s. PHP is
//! lexically awkward in two ways:
//!
//! - Source files are mostly text. Everything outside of `<?php ... ?>` is
//!   inline HTML, so the tokenizer keeps track of whether it is currently
//!   inside a tag.
//! - Double-quoted strings, backtick strings and heredocs may contain
//!   interpolated code, which itself may contain strings. A
//!   [`LexerStateManager`] keeps a stack of these nested contexts and decides
//!   which scanning routine applies to the next token.
//!
//! A string without any interpolation is a single `StringLiteral` token.
//! Otherwise, the string is split up. The string
//!
//! ```php
//! "a $b[0] {$c->d}"
//! ```
//!
//! produces a token stream like
//!
//! ```text
//! StringStart, StringMiddle,
//! Variable, LeftBracket, Number, RightBracket,
//! StringMiddle,
//! CurlyOpen, Variable, Arrow, Identifier, RightBrace,
//! StringEnd
//! ```
//!
//! Lexing never fails. Characters that cannot start any token produce
//! `Unknown` tokens, which the parser reports.

pub mod scanner;
pub mod state;
mod token;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;

use log::{info, trace};
use phpast_common::tree::{Number, Quote};
use phpast_common::{Location, Position};

use self::scanner::{Scanner, ScannerState};
use self::state::{LexerState, LexerStateManager, QuoteKind};
pub use self::token::{keyword, symbol, Token, TokenKind, TokenValue};

/// Which trivia survive tokenization.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LexerOptions {
    pub preserve_comments: bool,
    pub preserve_whitespace: bool,
    pub preserve_inline_html: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            preserve_comments: false,
            preserve_whitespace: false,
            preserve_inline_html: true,
        }
    }
}

/// Tokenize a complete source text. The result always ends with an `Eof`
/// token.
pub fn tokenize(source: &str, options: &LexerOptions) -> Vec<Token> {
    Tokenizer::new(source, *options).tokenize()
}

pub struct Tokenizer<'src> {
    scanner: Scanner<'src>,
    options: LexerOptions,
    source_id: Option<usize>,

    /// Whether we are between `<?php` and `?>`.
    in_script: bool,
    states: LexerStateManager,

    /// Tokens already scanned but not yet handed out.
    pending: VecDeque<Token>,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str, options: LexerOptions) -> Self {
        Self {
            scanner: Scanner::new(source),
            options,
            source_id: None,
            in_script: false,
            states: LexerStateManager::new(),
            pending: VecDeque::new(),
        }
    }

    /// Tag every produced location with the given file id.
    pub fn with_source(self, source_id: usize) -> Self {
        Self {
            source_id: Some(source_id),
            ..self
        }
    }

    /// Produce every token, followed by `Eof`, and drop the trivia the options
    /// ask to drop.
    pub fn tokenize(mut self) -> Vec<Token> {
        info!("beginning tokenization");

        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }

        let end = self.scanner.position();
        tokens.push(Token::new(TokenKind::Eof, "", self.location(end, end)));

        let options = self.options;
        tokens.retain(|token| match token.kind {
            TokenKind::Whitespace | TokenKind::Newline => options.preserve_whitespace,
            TokenKind::Comment | TokenKind::DocComment => options.preserve_comments,
            TokenKind::InlineHtml => options.preserve_inline_html,
            _ => true,
        });

        trace!("done tokenizing ({} tokens)", tokens.len());
        tokens
    }

    /// Scan the next token, or return `None` at the end of the input. The
    /// produced token is always fed to the state manager.
    pub fn next_token(&mut self) -> Option<Token> {
        let token = match self.pending.pop_front() {
            Some(token) => token,
            None => self.scan()?,
        };

        self.states.observe(&token);
        Some(token)
    }

    fn scan(&mut self) -> Option<Token> {
        loop {
            if self.scanner.is_at_end() {
                return None;
            }

            return Some(match self.states.current() {
                LexerState::Normal | LexerState::InComplexInterpolation if !self.in_script => {
                    self.scan_inline()
                }
                LexerState::Normal | LexerState::InComplexInterpolation => self.scan_script(),
                LexerState::InDoubleQuoteString => self.scan_string_body(QuoteKind::Double),
                LexerState::InBacktick => self.scan_string_body(QuoteKind::Backtick),
                LexerState::InHeredoc => {
                    let quote = self
                        .states
                        .context()
                        .map(|context| context.quote.clone())
                        .unwrap_or(QuoteKind::Double);
                    self.scan_string_body(quote)
                }
                LexerState::InStringInterpolation => match self.scan_interpolation() {
                    Some(token) => token,
                    None => {
                        self.states.end_interpolation();
                        continue;
                    }
                },
            });
        }
    }

    fn location(&self, start: Position, end: Position) -> Location {
        Location::new(start, end).with_source(self.source_id)
    }

    /// Make a token out of everything consumed since `start`.
    fn token_from(&self, kind: TokenKind, start: ScannerState) -> Token {
        let text = self.scanner.slice_from(start);
        Token::new(
            kind,
            text,
            self.location(start.position(), self.scanner.position()),
        )
    }

    fn scan_inline(&mut self) -> Token {
        let start = self.scanner.save();

        if self.scanner.matches("<?=") {
            self.scanner.skip(3);
            self.in_script = true;
            return self.token_from(TokenKind::OpenTagWithEcho, start);
        }

        if self.at_open_tag() {
            self.scanner.skip(5);
            self.in_script = true;
            return self.token_from(TokenKind::OpenTag, start);
        }

        while !self.scanner.is_at_end() && !self.scanner.matches("<?=") && !self.at_open_tag() {
            self.scanner.advance();
        }

        let token = self.token_from(TokenKind::InlineHtml, start);
        let value = token.text.clone();
        token.with_value(TokenValue::Str {
            value,
            quote: Quote::Single,
        })
    }

    fn at_open_tag(&self) -> bool {
        self.scanner.matches_ignore_case("<?php") && {
            let after = self.scanner.peek(5);
            after == scanner::END || after.is_whitespace()
        }
    }

    fn scan_script(&mut self) -> Token {
        let start = self.scanner.save();
        let c = self.scanner.peek(0);

        if self.scanner.matches("?>") {
            self.scanner.skip(2);
            if !self.scanner.consume("\r\n") {
                self.scanner.consume("\n");
            }

            self.in_script = false;
            return self.token_from(TokenKind::CloseTag, start);
        }

        if c == ' ' || c == '\t' {
            self.scanner.consume_while(|c| c == ' ' || c == '\t');
            return self.token_from(TokenKind::Whitespace, start);
        }

        if self.scanner.consume("\r\n") || self.scanner.consume("\n") || self.scanner.consume("\r")
        {
            return self.token_from(TokenKind::Newline, start);
        }

        if self.scanner.matches("#[") {
            self.scanner.skip(2);
            return self.token_from(TokenKind::AttributeStart, start);
        }

        if c == '#' || self.scanner.matches("//") {
            while !self.scanner.is_at_end()
                && !matches!(self.scanner.peek(0), '\n' | '\r')
                && !self.scanner.matches("?>")
            {
                self.scanner.advance();
            }

            return self.token_from(TokenKind::Comment, start);
        }

        if self.scanner.matches("/*") {
            let doc = self.scanner.matches("/**") && self.scanner.peek(3) != '/';
            self.scanner.skip(2);

            while !self.scanner.is_at_end() && !self.scanner.matches("*/") {
                self.scanner.advance();
            }
            self.scanner.consume("*/");

            let kind = if doc {
                TokenKind::DocComment
            } else {
                TokenKind::Comment
            };
            return self.token_from(kind, start);
        }

        match c {
            '\'' => return self.scan_single_quoted(),
            '"' => return self.scan_double_quoted(),
            '`' => {
                self.scanner.advance();
                return self.token_from(TokenKind::Backtick, start);
            }
            _ => {}
        }

        if self.scanner.matches("<<<") {
            if let Some(token) = self.scan_heredoc_start() {
                return token;
            }
        }

        if c.is_ascii_digit() || (c == '.' && self.scanner.peek(1).is_ascii_digit()) {
            return self.scan_number();
        }

        if c == '$' {
            if is_name_start(self.scanner.peek(1)) {
                return self.scan_variable();
            }

            self.scanner.advance();
            return self.token_from(TokenKind::Dollar, start);
        }

        if is_name_start(c) {
            return self.scan_name();
        }

        self.scan_symbol()
    }

    fn scan_symbol(&mut self) -> Token {
        let start = self.scanner.save();

        for len in (1..=3).rev() {
            let candidate: String = (0..len).map(|i| self.scanner.peek(i)).collect();
            let kind = match candidate.as_str() {
                "<>" => Some(TokenKind::NotEqual),
                other => symbol(other),
            };

            if let Some(kind) = kind {
                self.scanner.skip(len);
                return self.token_from(kind, start);
            }
        }

        self.scanner.advance();
        self.token_from(TokenKind::Unknown, start)
    }

    fn scan_name(&mut self) -> Token {
        let start = self.scanner.save();
        let name = self.scanner.consume_while(is_name_continue);

        let kind = match name.to_ascii_lowercase().as_str() {
            "die" => TokenKind::Exit,
            lower => keyword(lower).unwrap_or(TokenKind::Identifier),
        };

        self.token_from(kind, start).with_value(TokenValue::Name(name))
    }

    fn scan_variable(&mut self) -> Token {
        let start = self.scanner.save();
        self.scanner.advance();
        let name = self.scanner.consume_while(is_name_continue);
        self.token_from(TokenKind::Variable, start)
            .with_value(TokenValue::Name(name))
    }

    fn scan_number(&mut self) -> Token {
        let start = self.scanner.save();
        let c = self.scanner.peek(0);
        let next = self.scanner.peek(1).to_ascii_lowercase();

        let value = if c == '0' && matches!(next, 'x' | 'b' | 'o') {
            self.scanner.skip(2);
            let radix = match next {
                'x' => 16,
                'b' => 2,
                _ => 8,
            };

            let digits = self
                .scanner
                .consume_while(|c| c == '_' || c.is_digit(radix));
            integer(&digits, radix)
        } else {
            let mut digits = self.scanner.consume_while(|c| c == '_' || c.is_ascii_digit());
            let mut float = false;

            if self.scanner.peek(0) == '.' && self.scanner.peek(1).is_ascii_digit() {
                float = true;
                digits.push(self.scanner.advance());
                digits.push_str(&self.scanner.consume_while(|c| c == '_' || c.is_ascii_digit()));
            }

            let sign = matches!(self.scanner.peek(1), '+' | '-');
            let exponent_digit = self.scanner.peek(if sign { 2 } else { 1 });
            if matches!(self.scanner.peek(0), 'e' | 'E') && exponent_digit.is_ascii_digit() {
                float = true;
                digits.push(self.scanner.advance());
                if sign {
                    digits.push(self.scanner.advance());
                }
                digits.push_str(&self.scanner.consume_while(|c| c == '_' || c.is_ascii_digit()));
            }

            let digits: String = digits.chars().filter(|&c| c != '_').collect();

            if float {
                Number::Float(digits.parse().unwrap_or(0.0))
            } else if digits.len() > 1 && digits.starts_with('0') {
                integer(&digits[1..], 8)
            } else {
                integer(&digits, 10)
            }
        };

        self.token_from(TokenKind::Number, start)
            .with_value(TokenValue::Number(value))
    }

    fn scan_single_quoted(&mut self) -> Token {
        let start = self.scanner.save();
        self.scanner.advance();

        let mut value = String::new();
        while !self.scanner.is_at_end() && self.scanner.peek(0) != '\'' {
            if self.scanner.peek(0) == '\\' && self.scanner.peek(1) != scanner::END {
                value.push(self.scanner.advance());
            }
            value.push(self.scanner.advance());
        }
        self.scanner.consume("'");

        self.token_from(TokenKind::StringLiteral, start)
            .with_value(TokenValue::Str {
                value,
                quote: Quote::Single,
            })
    }

    fn scan_double_quoted(&mut self) -> Token {
        let start = self.scanner.save();

        if self.interpolates(1, '"') {
            self.scanner.advance();
            return self.token_from(TokenKind::StringStart, start);
        }

        self.scanner.advance();
        let mut value = String::new();
        while !self.scanner.is_at_end() && self.scanner.peek(0) != '"' {
            if self.scanner.peek(0) == '\\' && self.scanner.peek(1) != scanner::END {
                value.push(self.scanner.advance());
            }
            value.push(self.scanner.advance());
        }
        self.scanner.consume("\"");

        self.token_from(TokenKind::StringLiteral, start)
            .with_value(TokenValue::Str {
                value,
                quote: Quote::Double,
            })
    }

    /// Look ahead from `offset` up to the unescaped `terminator` and report
    /// whether any interpolation starts on the way.
    fn interpolates(&self, mut offset: usize, terminator: char) -> bool {
        loop {
            let c = self.scanner.peek(offset);
            if c == scanner::END || c == terminator {
                return false;
            }

            if c == '\\' {
                offset += 2;
                continue;
            }

            let next = self.scanner.peek(offset + 1);
            if (c == '$' && (is_name_start(next) || next == '{')) || (c == '{' && next == '$') {
                return true;
            }

            offset += 1;
        }
    }

    /// Scan `<<<LABEL`, `<<<"LABEL"` or `<<<'LABEL'` along with the end of the
    /// line. A nowdoc is scanned entirely, with its body and end queued up.
    /// Returns `None` if this is not actually a heredoc.
    fn scan_heredoc_start(&mut self) -> Option<Token> {
        let start = self.scanner.save();
        self.scanner.skip(3);
        self.scanner.consume_while(|c| c == ' ' || c == '\t');

        let quote = match self.scanner.peek(0) {
            q @ ('\'' | '"') => {
                self.scanner.advance();
                Some(q)
            }
            _ => None,
        };

        if !is_name_start(self.scanner.peek(0)) {
            self.scanner.restore(start);
            return None;
        }

        let label = self.scanner.consume_while(is_name_continue);
        if let Some(q) = quote {
            if self.scanner.peek(0) != q {
                self.scanner.restore(start);
                return None;
            }
            self.scanner.advance();
        }

        let token = self
            .token_from(TokenKind::StartHeredoc, start)
            .with_value(TokenValue::Name(label.clone()));

        if !self.scanner.consume("\r\n") {
            self.scanner.consume("\n");
        }

        if quote == Some('\'') {
            let body_start = self.scanner.save();
            while !self.scanner.is_at_end() && !self.heredoc_end_ahead(&label) {
                self.scanner.advance();
            }

            if !self.scanner.slice_from(body_start).is_empty() {
                let body = self.token_from(TokenKind::StringMiddle, body_start);
                let value = body.text.clone();
                self.pending.push_back(body.with_value(TokenValue::Str {
                    value,
                    quote: Quote::Single,
                }));
            }

            if let Some(end) = self.scan_heredoc_end(&label) {
                self.pending.push_back(end);
            }
        }

        Some(token)
    }

    /// Whether the closing label follows at the cursor, either directly at the
    /// start of a line or after one line break.
    fn heredoc_end_ahead(&mut self, label: &str) -> bool {
        let saved = self.scanner.save();

        let line_break = self.scanner.consume("\r\n") || self.scanner.consume("\n");
        let found = (line_break || self.scanner.at_line_start()) && {
            self.scanner.consume_while(|c| c == ' ' || c == '\t');
            self.scanner.consume(label) && !is_name_continue(self.scanner.peek(0))
        };

        self.scanner.restore(saved);
        found
    }

    /// Scan the line break and indentation before a closing label, then the
    /// label itself.
    fn scan_heredoc_end(&mut self, label: &str) -> Option<Token> {
        if !self.heredoc_end_ahead(label) {
            return None;
        }

        if !self.scanner.consume("\r\n") {
            self.scanner.consume("\n");
        }
        self.scanner.consume_while(|c| c == ' ' || c == '\t');

        let start = self.scanner.save();
        self.scanner.consume(label);
        Some(
            self.token_from(TokenKind::EndHeredoc, start)
                .with_value(TokenValue::Name(label.into())),
        )
    }

    /// Scan literal string content up to the next interpolation or the end
    /// of the string, or the delimiter itself if we are right at it.
    fn scan_string_body(&mut self, quote: QuoteKind) -> Token {
        let start = self.scanner.save();

        let at_end = |this: &mut Self| match &quote {
            QuoteKind::Double => this.scanner.peek(0) == '"',
            QuoteKind::Backtick => this.scanner.peek(0) == '`',
            QuoteKind::Heredoc(label) => this.heredoc_end_ahead(label),
        };

        if at_end(self) {
            return match &quote {
                QuoteKind::Double => {
                    self.scanner.advance();
                    self.token_from(TokenKind::StringEnd, start)
                }
                QuoteKind::Backtick => {
                    self.scanner.advance();
                    self.token_from(TokenKind::Backtick, start)
                }
                QuoteKind::Heredoc(label) => match self.scan_heredoc_end(label) {
                    Some(token) => token,
                    None => self.token_from(TokenKind::EndHeredoc, start),
                },
            };
        }

        let c = self.scanner.peek(0);
        let next = self.scanner.peek(1);

        if c == '$' && is_name_start(next) {
            return self.scan_variable();
        }

        if c == '$' && next == '{' {
            self.scanner.skip(2);
            return self.token_from(TokenKind::DollarOpenCurlyBraces, start);
        }

        if c == '{' && next == '$' {
            self.scanner.advance();
            return self.token_from(TokenKind::CurlyOpen, start);
        }

        let mut value = String::new();
        while !self.scanner.is_at_end() && !at_end(self) {
            let c = self.scanner.peek(0);
            let next = self.scanner.peek(1);

            if c == '\\' && next != scanner::END {
                value.push(self.scanner.advance());
                value.push(self.scanner.advance());
                continue;
            }

            if (c == '$' && (is_name_start(next) || next == '{')) || (c == '{' && next == '$') {
                break;
            }

            value.push(self.scanner.advance());
        }

        self.token_from(TokenKind::StringMiddle, start)
            .with_value(TokenValue::Str {
                value,
                quote: Quote::Double,
            })
    }

    /// Continue a simple interpolation such as `$a[0]` or `$a->b`. Returns
    /// `None` when the interpolation cannot go on.
    fn scan_interpolation(&mut self) -> Option<Token> {
        let start = self.scanner.save();
        let in_offset = self
            .states
            .context()
            .is_some_and(|context| context.brace_nest > 0);
        let c = self.scanner.peek(0);

        match self.states.last_kind() {
            Some(TokenKind::LeftBracket) if in_offset => {
                if c == '-' && self.scanner.peek(1).is_ascii_digit() {
                    self.scanner.advance();
                    self.scanner.consume_while(|c| c.is_ascii_digit());
                    let text = self.scanner.slice_from(start);
                    let value = integer(text, 10);
                    Some(
                        self.token_from(TokenKind::Number, start)
                            .with_value(TokenValue::Number(value)),
                    )
                } else if c.is_ascii_digit() {
                    let digits = self.scanner.consume_while(|c| c.is_ascii_digit());
                    let value = integer(&digits, 10);
                    Some(
                        self.token_from(TokenKind::Number, start)
                            .with_value(TokenValue::Number(value)),
                    )
                } else if c == '$' && is_name_start(self.scanner.peek(1)) {
                    Some(self.scan_variable())
                } else if is_name_start(c) {
                    let name = self.scanner.consume_while(is_name_continue);
                    Some(
                        self.token_from(TokenKind::Identifier, start)
                            .with_value(TokenValue::Name(name)),
                    )
                } else {
                    None
                }
            }

            Some(_) if in_offset => {
                if c == ']' {
                    self.scanner.advance();
                    Some(self.token_from(TokenKind::RightBracket, start))
                } else {
                    None
                }
            }

            Some(TokenKind::Arrow) if is_name_start(c) => {
                let name = self.scanner.consume_while(is_name_continue);
                Some(
                    self.token_from(TokenKind::Identifier, start)
                        .with_value(TokenValue::Name(name)),
                )
            }

            Some(TokenKind::Variable) => {
                if c == '[' {
                    self.scanner.advance();
                    Some(self.token_from(TokenKind::LeftBracket, start))
                } else if self.scanner.matches("->") && is_name_start(self.scanner.peek(2)) {
                    self.scanner.skip(2);
                    Some(self.token_from(TokenKind::Arrow, start))
                } else {
                    None
                }
            }

            _ => None,
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic() || (c as u32) >= 0x80
}

fn is_name_continue(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit()
}

/// Convert the digits of an integer literal, turning values too large for an
/// `i64` into floats.
fn integer(digits: &str, radix: u32) -> Number {
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    let (negative, digits) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, digits),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Number::Int(0);
    }

    let signed = |value: i64| if negative { -value } else { value };

    match i64::from_str_radix(&digits, radix) {
        Ok(value) => Number::Int(signed(value)),
        Err(_) => {
            let value = if radix == 10 {
                digits.parse().unwrap_or(f64::INFINITY)
            } else {
                digits.chars().fold(0.0f64, |acc, c| {
                    acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
                })
            };
            Number::Float(if negative { -value } else { value })
        }
    }
}

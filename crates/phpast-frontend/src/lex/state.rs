//! Strings in PHP may contain code, and that code may contain strings again.
//! The tokenizer keeps track of where it is with a stack machine: every
//! produced token is fed to [`LexerStateManager::observe`], which pushes and
//! pops states as strings and interpolations open and close. The tokenizer in
//! turn asks the manager which scanning routine applies next.
//!
//! - `"`, an interpolating heredoc, or a backtick pushes a string state.
//! - A variable inside a string pushes `InStringInterpolation`. Only `[`,
//!   `->` and `::` (plus the offset or property name directly following them)
//!   continue that interpolation; anything else ends it.
//! - `{$` and `${` inside a string push `InComplexInterpolation`, which ends
//!   when its braces are balanced again.
//! - The closing delimiter of a string pops back to the enclosing state.

use super::token::{Token, TokenKind, TokenValue};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LexerState {
    Normal,
    InDoubleQuoteString,
    InHeredoc,
    InBacktick,
    /// After a `$name` inside a string.
    InStringInterpolation,
    /// Inside `{$ ... }` or `${ ... }` in a string.
    InComplexInterpolation,
}

impl LexerState {
    /// Whether this state scans literal string content.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            Self::InDoubleQuoteString | Self::InHeredoc | Self::InBacktick
        )
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum QuoteKind {
    Double,
    Backtick,
    /// A heredoc with the given closing label.
    Heredoc(String),
}

/// Bookkeeping for a single open string.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct StringContext {
    pub quote: QuoteKind,
    /// Open braces of a complex interpolation, or open brackets of a simple
    /// one.
    pub brace_nest: usize,
    /// Number of simple interpolations currently open.
    pub interpolation_depth: usize,
}

impl StringContext {
    fn new(quote: QuoteKind) -> Self {
        Self {
            quote,
            brace_nest: 0,
            interpolation_depth: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LexerStateManager {
    states: Vec<LexerState>,
    contexts: Vec<StringContext>,
    last: Option<TokenKind>,
}

impl LexerStateManager {
    pub fn new() -> Self {
        Self {
            states: vec![LexerState::Normal],
            contexts: Vec::new(),
            last: None,
        }
    }

    pub fn current(&self) -> LexerState {
        self.states.last().copied().unwrap_or(LexerState::Normal)
    }

    /// Number of states above the base `Normal` state.
    pub fn depth(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    /// The innermost open string, if any.
    pub fn context(&self) -> Option<&StringContext> {
        self.contexts.last()
    }

    /// The kind of the most recently observed token.
    pub fn last_kind(&self) -> Option<TokenKind> {
        self.last
    }

    pub fn push_state(&mut self, state: LexerState) {
        self.states.push(state);
    }

    /// Push a string state along with its context.
    pub fn push_string(&mut self, state: LexerState, quote: QuoteKind) {
        debug_assert!(state.is_string());
        self.states.push(state);
        self.contexts.push(StringContext::new(quote));
    }

    /// Pop the current state. The base state is never popped.
    pub fn pop_state(&mut self) -> LexerState {
        if self.states.len() <= 1 {
            return LexerState::Normal;
        }

        let state = self.states.pop().unwrap_or(LexerState::Normal);
        if state.is_string() {
            self.contexts.pop();
        }

        state
    }

    /// End a simple interpolation which cannot be continued.
    pub fn end_interpolation(&mut self) {
        if self.current() != LexerState::InStringInterpolation {
            return;
        }

        self.pop_state();
        if let Some(context) = self.contexts.last_mut() {
            context.brace_nest = 0;
            context.interpolation_depth = context.interpolation_depth.saturating_sub(1);
        }
    }

    /// Update the state according to the token that was just produced.
    pub fn observe(&mut self, token: &Token) {
        let kind = token.kind;

        if self.current() == LexerState::InStringInterpolation && !self.continues_interpolation(kind)
        {
            self.end_interpolation();
        }

        match self.current() {
            LexerState::Normal | LexerState::InComplexInterpolation => self.observe_code(token),

            state @ (LexerState::InDoubleQuoteString
            | LexerState::InHeredoc
            | LexerState::InBacktick) => match kind {
                TokenKind::StringEnd if state == LexerState::InDoubleQuoteString => {
                    self.pop_state();
                }
                TokenKind::EndHeredoc if state == LexerState::InHeredoc => {
                    self.pop_state();
                }
                TokenKind::Backtick if state == LexerState::InBacktick => {
                    self.pop_state();
                }
                TokenKind::Variable => {
                    self.push_state(LexerState::InStringInterpolation);
                    if let Some(context) = self.contexts.last_mut() {
                        context.interpolation_depth += 1;
                    }
                }
                TokenKind::CurlyOpen | TokenKind::DollarOpenCurlyBraces => {
                    self.push_state(LexerState::InComplexInterpolation);
                    if let Some(context) = self.contexts.last_mut() {
                        context.brace_nest += 1;
                    }
                }
                _ => {}
            },

            LexerState::InStringInterpolation => match kind {
                TokenKind::LeftBracket => {
                    if let Some(context) = self.contexts.last_mut() {
                        context.brace_nest += 1;
                    }
                }
                TokenKind::RightBracket => {
                    if let Some(context) = self.contexts.last_mut() {
                        context.brace_nest = context.brace_nest.saturating_sub(1);
                    }
                }
                _ => {}
            },
        }

        self.last = Some(kind);
    }

    fn observe_code(&mut self, token: &Token) {
        let complex = self.current() == LexerState::InComplexInterpolation;

        match token.kind {
            TokenKind::StringStart => {
                self.push_string(LexerState::InDoubleQuoteString, QuoteKind::Double)
            }
            TokenKind::Backtick => self.push_string(LexerState::InBacktick, QuoteKind::Backtick),
            TokenKind::StartHeredoc if !token.text.contains('\'') => {
                let label = match &token.value {
                    TokenValue::Name(label) => label.clone(),
                    _ => String::new(),
                };
                self.push_string(LexerState::InHeredoc, QuoteKind::Heredoc(label));
            }
            TokenKind::LeftBrace | TokenKind::CurlyOpen | TokenKind::DollarOpenCurlyBraces
                if complex =>
            {
                if let Some(context) = self.contexts.last_mut() {
                    context.brace_nest += 1;
                }
            }
            TokenKind::RightBrace if complex => {
                let balanced = match self.contexts.last_mut() {
                    Some(context) => {
                        context.brace_nest = context.brace_nest.saturating_sub(1);
                        context.brace_nest == 0
                    }
                    None => true,
                };

                if balanced {
                    self.pop_state();
                }
            }
            _ => {}
        }
    }

    /// Whether a token of the given kind keeps a simple interpolation going.
    fn continues_interpolation(&self, kind: TokenKind) -> bool {
        let in_offset = self.context().is_some_and(|context| context.brace_nest > 0);
        let after_accessor = matches!(
            self.last,
            Some(TokenKind::Arrow | TokenKind::DoubleColon)
        );

        matches!(
            kind,
            TokenKind::LeftBracket | TokenKind::Arrow | TokenKind::DoubleColon
        ) || in_offset
            || (after_accessor && kind == TokenKind::Identifier)
    }
}

impl Default for LexerStateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use phpast_common::Location;

    use super::*;

    fn token(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Location::default())
    }

    fn feed(manager: &mut LexerStateManager, tokens: &[(TokenKind, &str)]) {
        for (kind, text) in tokens {
            manager.observe(&token(*kind, text));
        }
    }

    #[test]
    fn double_quoted_string_pushes_and_pops() {
        let mut manager = LexerStateManager::new();

        feed(&mut manager, &[(TokenKind::StringStart, "\"")]);
        assert_eq!(LexerState::InDoubleQuoteString, manager.current());
        assert_eq!(Some(&QuoteKind::Double), manager.context().map(|c| &c.quote));

        feed(&mut manager, &[(TokenKind::StringEnd, "\"")]);
        assert_eq!(LexerState::Normal, manager.current());
        assert!(manager.context().is_none());
    }

    #[test]
    fn simple_interpolation_ends_on_other_tokens() {
        let mut manager = LexerStateManager::new();

        feed(
            &mut manager,
            &[(TokenKind::StringStart, "\""), (TokenKind::Variable, "$a")],
        );
        assert_eq!(LexerState::InStringInterpolation, manager.current());
        assert_eq!(1, manager.context().map_or(0, |c| c.interpolation_depth));

        feed(
            &mut manager,
            &[
                (TokenKind::LeftBracket, "["),
                (TokenKind::Number, "0"),
                (TokenKind::RightBracket, "]"),
            ],
        );
        assert_eq!(LexerState::InStringInterpolation, manager.current());

        feed(&mut manager, &[(TokenKind::StringMiddle, " tail")]);
        assert_eq!(LexerState::InDoubleQuoteString, manager.current());
        assert_eq!(0, manager.context().map_or(1, |c| c.interpolation_depth));

        feed(&mut manager, &[(TokenKind::StringEnd, "\"")]);
        assert_eq!(LexerState::Normal, manager.current());
    }

    #[test]
    fn property_interpolation_continues_through_name() {
        let mut manager = LexerStateManager::new();

        feed(
            &mut manager,
            &[
                (TokenKind::StringStart, "\""),
                (TokenKind::Variable, "$a"),
                (TokenKind::Arrow, "->"),
                (TokenKind::Identifier, "b"),
            ],
        );
        assert_eq!(LexerState::InStringInterpolation, manager.current());

        feed(&mut manager, &[(TokenKind::StringEnd, "\"")]);
        assert_eq!(LexerState::Normal, manager.current());
    }

    #[test]
    fn complex_interpolation_tracks_nested_braces() {
        let mut manager = LexerStateManager::new();

        feed(
            &mut manager,
            &[
                (TokenKind::StringStart, "\""),
                (TokenKind::CurlyOpen, "{"),
                (TokenKind::Variable, "$a"),
            ],
        );
        assert_eq!(LexerState::InComplexInterpolation, manager.current());

        feed(
            &mut manager,
            &[
                (TokenKind::LeftBrace, "{"),
                (TokenKind::Identifier, "x"),
                (TokenKind::RightBrace, "}"),
            ],
        );
        assert_eq!(LexerState::InComplexInterpolation, manager.current());

        feed(&mut manager, &[(TokenKind::RightBrace, "}")]);
        assert_eq!(LexerState::InDoubleQuoteString, manager.current());
    }

    #[test]
    fn nested_strings_inside_complex_interpolation() {
        let mut manager = LexerStateManager::new();

        feed(
            &mut manager,
            &[
                (TokenKind::StringStart, "\""),
                (TokenKind::DollarOpenCurlyBraces, "${"),
                (TokenKind::StringStart, "\""),
            ],
        );
        assert_eq!(3, manager.depth());
        assert_eq!(LexerState::InDoubleQuoteString, manager.current());

        feed(
            &mut manager,
            &[(TokenKind::StringEnd, "\""), (TokenKind::RightBrace, "}")],
        );
        assert_eq!(LexerState::InDoubleQuoteString, manager.current());
        assert_eq!(1, manager.depth());
    }

    #[test]
    fn nowdoc_does_not_push() {
        let mut manager = LexerStateManager::new();

        let start = token(TokenKind::StartHeredoc, "<<<'EOD'").with_value(TokenValue::Name("EOD".into()));
        manager.observe(&start);
        assert_eq!(LexerState::Normal, manager.current());

        let start = token(TokenKind::StartHeredoc, "<<<EOD").with_value(TokenValue::Name("EOD".into()));
        manager.observe(&start);
        assert_eq!(LexerState::InHeredoc, manager.current());
        assert_eq!(
            Some(&QuoteKind::Heredoc("EOD".into())),
            manager.context().map(|c| &c.quote)
        );
    }

    #[test]
    fn base_state_is_never_popped() {
        let mut manager = LexerStateManager::new();
        assert_eq!(LexerState::Normal, manager.pop_state());
        assert_eq!(LexerState::Normal, manager.current());
        assert_eq!(0, manager.depth());
    }
}

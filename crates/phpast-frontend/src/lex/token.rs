use std::fmt;

use bimap::BiMap;
use lazy_static::lazy_static;
use phpast_common::tree::{Number, Quote};
use phpast_common::Location;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,

    /// The raw lexeme, exactly as it appears in the source.
    pub text: String,

    pub location: Location,

    /// Kind-specific payload.
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            text: text.into(),
            location,
            value: TokenValue::None,
        }
    }

    pub fn with_value(self, value: TokenValue) -> Self {
        Self { value, ..self }
    }

    /// The identifier or variable name carried by this token, if any.
    pub fn name(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Name(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    None,
    Number(Number),
    /// The content of a string without its quotes, escapes not yet decoded.
    Str {
        value: String,
        quote: Quote,
    },
    /// An identifier, or a variable name without the `$`.
    Name(String),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenKind {
    // Structure and trivia
    InlineHtml,
    OpenTag,
    OpenTagWithEcho,
    CloseTag,
    Whitespace,
    Newline,
    Comment,
    DocComment,

    // Literals and names
    Number,
    /// A complete string without interpolation.
    StringLiteral,
    /// The opening `"` of an interpolated string.
    StringStart,
    /// A literal chunk of an interpolated string or heredoc.
    StringMiddle,
    /// The closing `"` of an interpolated string.
    StringEnd,
    Backtick,
    StartHeredoc,
    EndHeredoc,
    Variable,
    Identifier,
    /// A `$` not directly followed by a name.
    Dollar,
    /// `${` inside a string.
    DollarOpenCurlyBraces,
    /// The `{` of `{$` inside a string.
    CurlyOpen,

    // Keywords
    Abstract,
    And,
    Array,
    As,
    Break,
    Callable,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Declare,
    Default,
    Do,
    Echo,
    Else,
    ElseIf,
    Empty,
    EndDeclare,
    EndFor,
    EndForeach,
    EndIf,
    EndSwitch,
    EndWhile,
    Enum,
    Eval,
    Exit,
    Extends,
    Final,
    Finally,
    Fn,
    For,
    Foreach,
    Function,
    Global,
    Goto,
    If,
    Implements,
    Include,
    IncludeOnce,
    Instanceof,
    Insteadof,
    Interface,
    Isset,
    List,
    Match,
    Namespace,
    New,
    Or,
    Print,
    Private,
    Protected,
    Public,
    Readonly,
    Require,
    RequireOnce,
    Return,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Unset,
    Use,
    Var,
    While,
    Xor,
    Yield,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    Dot,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PowAssign,
    DotAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
    CoalesceAssign,
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Spaceship,
    Shl,
    Shr,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    AmpAmp,
    PipePipe,
    Question,
    Coalesce,
    Increment,
    Decrement,
    At,
    Arrow,
    NullsafeArrow,
    DoubleArrow,
    DoubleColon,
    Ellipsis,
    Backslash,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,
    Colon,
    /// `#[`
    AttributeStart,

    Eof,
    Unknown,
}

lazy_static! {
    /// Keyword spellings (in lower case) and their token kinds.
    static ref KEYWORDS: BiMap<&'static str, TokenKind> = {
        use TokenKind::*;

        [
            ("abstract", Abstract),
            ("and", And),
            ("array", Array),
            ("as", As),
            ("break", Break),
            ("callable", Callable),
            ("case", Case),
            ("catch", Catch),
            ("class", Class),
            ("clone", Clone),
            ("const", Const),
            ("continue", Continue),
            ("declare", Declare),
            ("default", Default),
            ("do", Do),
            ("echo", Echo),
            ("else", Else),
            ("elseif", ElseIf),
            ("empty", Empty),
            ("enddeclare", EndDeclare),
            ("endfor", EndFor),
            ("endforeach", EndForeach),
            ("endif", EndIf),
            ("endswitch", EndSwitch),
            ("endwhile", EndWhile),
            ("enum", Enum),
            ("eval", Eval),
            ("exit", Exit),
            ("extends", Extends),
            ("final", Final),
            ("finally", Finally),
            ("fn", Fn),
            ("for", For),
            ("foreach", Foreach),
            ("function", Function),
            ("global", Global),
            ("goto", Goto),
            ("if", If),
            ("implements", Implements),
            ("include", Include),
            ("include_once", IncludeOnce),
            ("instanceof", Instanceof),
            ("insteadof", Insteadof),
            ("interface", Interface),
            ("isset", Isset),
            ("list", List),
            ("match", Match),
            ("namespace", Namespace),
            ("new", New),
            ("or", Or),
            ("print", Print),
            ("private", Private),
            ("protected", Protected),
            ("public", Public),
            ("readonly", Readonly),
            ("require", Require),
            ("require_once", RequireOnce),
            ("return", Return),
            ("static", Static),
            ("switch", Switch),
            ("throw", Throw),
            ("trait", Trait),
            ("try", Try),
            ("unset", Unset),
            ("use", Use),
            ("var", Var),
            ("while", While),
            ("xor", Xor),
            ("yield", Yield),
        ]
        .into_iter()
        .collect()
    };

    /// Operator and punctuation spellings and their token kinds.
    static ref SYMBOLS: BiMap<&'static str, TokenKind> = {
        use TokenKind::*;

        [
            ("===", Identical),
            ("!==", NotIdentical),
            ("<=>", Spaceship),
            ("**=", PowAssign),
            ("<<=", ShlAssign),
            (">>=", ShrAssign),
            ("??=", CoalesceAssign),
            ("?->", NullsafeArrow),
            ("...", Ellipsis),
            ("==", Equal),
            ("!=", NotEqual),
            ("<=", LessEqual),
            (">=", GreaterEqual),
            ("+=", PlusAssign),
            ("-=", MinusAssign),
            ("*=", StarAssign),
            ("/=", SlashAssign),
            ("%=", PercentAssign),
            (".=", DotAssign),
            ("&=", AmpAssign),
            ("|=", PipeAssign),
            ("^=", CaretAssign),
            ("**", Pow),
            ("<<", Shl),
            (">>", Shr),
            ("&&", AmpAmp),
            ("||", PipePipe),
            ("??", Coalesce),
            ("++", Increment),
            ("--", Decrement),
            ("->", Arrow),
            ("=>", DoubleArrow),
            ("::", DoubleColon),
            ("#[", AttributeStart),
            ("+", Plus),
            ("-", Minus),
            ("*", Star),
            ("/", Slash),
            ("%", Percent),
            (".", Dot),
            ("=", Assign),
            ("<", Less),
            (">", Greater),
            ("&", Amp),
            ("|", Pipe),
            ("^", Caret),
            ("~", Tilde),
            ("!", Bang),
            ("?", Question),
            ("@", At),
            ("\\", Backslash),
            ("(", LeftParen),
            (")", RightParen),
            ("[", LeftBracket),
            ("]", RightBracket),
            ("{", LeftBrace),
            ("}", RightBrace),
            (";", Semicolon),
            (",", Comma),
            (":", Colon),
        ]
        .into_iter()
        .collect()
    };
}

/// Look up the keyword with the given spelling, ignoring case.
pub fn keyword(spelling: &str) -> Option<TokenKind> {
    KEYWORDS
        .get_by_left(spelling.to_ascii_lowercase().as_str())
        .copied()
}

/// Look up the operator or punctuation with exactly the given spelling.
pub fn symbol(spelling: &str) -> Option<TokenKind> {
    SYMBOLS.get_by_left(spelling).copied()
}

impl TokenKind {
    /// The fixed spelling of this kind, for keywords, operators and
    /// punctuation.
    pub fn spelling(self) -> Option<&'static str> {
        KEYWORDS
            .get_by_right(&self)
            .or_else(|| SYMBOLS.get_by_right(&self))
            .copied()
            .or(match self {
                Self::OpenTag => Some("<?php"),
                Self::OpenTagWithEcho => Some("<?="),
                Self::CloseTag => Some("?>"),
                _ => None,
            })
    }

    pub fn is_keyword(self) -> bool {
        KEYWORDS.contains_right(&self)
    }

    /// Whether this token carries no syntactic meaning.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::Newline | Self::Comment | Self::DocComment
        )
    }

    /// Every keyword kind along with its spelling.
    pub fn keywords() -> impl Iterator<Item = (&'static str, TokenKind)> {
        KEYWORDS.iter().map(|(spelling, kind)| (*spelling, *kind))
    }

    /// Every operator and punctuation kind along with its spelling.
    pub fn symbols() -> impl Iterator<Item = (&'static str, TokenKind)> {
        SYMBOLS.iter().map(|(spelling, kind)| (*spelling, *kind))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spelling() {
            Some(spelling) => write!(f, "'{spelling}'"),
            None => match self {
                Self::Eof => f.write_str("end of file"),
                Self::Number => f.write_str("number"),
                Self::StringLiteral => f.write_str("string"),
                Self::Variable => f.write_str("variable"),
                Self::Identifier => f.write_str("identifier"),
                other => write!(f, "{other:?}"),
            },
        }
    }
}

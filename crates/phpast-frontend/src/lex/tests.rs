use itertools::Itertools;
use phpast_common::tree::Number;
use phpast_common::Position;

use super::{tokenize, LexerOptions, Token, TokenKind, TokenValue};

fn lex(source: &str) -> Vec<Token> {
    tokenize(source, &LexerOptions::default())
}

/// Check that the lexer produces exactly the expected token kinds for some
/// code placed after `<?php `, not counting the open tag and the final `Eof`.
fn check(source: &str, expected: &[TokenKind]) {
    let tokens = lex(&format!("<?php {source}"));
    let kinds = tokens.iter().map(|token| token.kind).collect_vec();

    assert_eq!(Some(&TokenKind::OpenTag), kinds.first());
    assert_eq!(Some(&TokenKind::Eof), kinds.last());
    assert_eq!(expected, &kinds[1..kinds.len() - 1], "lexing {source:?}");
}

/// Lex some code after `<?php ` and return its single significant token.
fn single(source: &str) -> Token {
    let mut tokens = lex(&format!("<?php {source}"));
    assert_eq!(3, tokens.len(), "lexing {source:?}: {tokens:?}");
    tokens.swap_remove(1)
}

#[test]
fn fixed_spellings_are_single_tokens() {
    for (spelling, kind) in TokenKind::keywords().chain(TokenKind::symbols()) {
        let token = single(spelling);
        assert_eq!(kind, token.kind, "lexing {spelling:?}");
        assert_eq!(spelling, token.text);
    }
}

#[test]
fn keywords_ignore_case() {
    assert_eq!(TokenKind::Function, single("FUNCTION").kind);
    assert_eq!(TokenKind::Exit, single("die").kind);
    assert_eq!(TokenKind::Identifier, single("functions").kind);
}

#[test]
fn alternative_not_equal() {
    let token = single("<>");
    assert_eq!(TokenKind::NotEqual, token.kind);
    assert_eq!("<>", token.text);
}

#[test]
fn longest_match_wins() {
    check(
        "$a ??= $b ?-> c",
        &[
            TokenKind::Variable,
            TokenKind::CoalesceAssign,
            TokenKind::Variable,
            TokenKind::NullsafeArrow,
            TokenKind::Identifier,
        ],
    );
}

#[test]
fn unknown_characters_do_not_fail() {
    check("$a ¤", &[TokenKind::Variable, TokenKind::Identifier]);
    check("\u{1}", &[TokenKind::Unknown]);
}

#[test]
fn variables_and_dollars() {
    let token = single("$foo_1");
    assert_eq!(TokenKind::Variable, token.kind);
    assert_eq!(Some("foo_1"), token.name());

    check(
        "$$a",
        &[TokenKind::Dollar, TokenKind::Variable],
    );
}

#[test]
fn number_bases() {
    let value = |source: &str| match single(source).value {
        TokenValue::Number(number) => number,
        other => panic!("expected a number, got {other:?}"),
    };

    assert_eq!(Number::Int(255), value("0xFF"));
    assert_eq!(Number::Int(5), value("0b101"));
    assert_eq!(Number::Int(8), value("0o10"));
    assert_eq!(Number::Int(493), value("0755"));
    assert_eq!(Number::Int(1_000_000), value("1_000_000"));
    assert_eq!(Number::Int(0), value("0"));
    assert_eq!(Number::Float(1.5), value("1.5"));
    assert_eq!(Number::Float(0.5), value(".5"));
    assert_eq!(Number::Float(1e3), value("1e3"));
    assert_eq!(Number::Float(2.5e-2), value("2.5E-2"));
    assert_eq!(
        Number::Float(9_223_372_036_854_775_808.0),
        value("9223372036854775808")
    );
}

#[test]
fn number_followed_by_concatenation() {
    check(
        "1 . 2",
        &[TokenKind::Number, TokenKind::Dot, TokenKind::Number],
    );
}

#[test]
fn comments_are_dropped_by_default() {
    check(
        "1; // one\n# two\n/* three */ /** four */ 2;",
        &[
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Number,
            TokenKind::Semicolon,
        ],
    );
}

#[test]
fn comments_can_be_preserved() {
    let options = LexerOptions {
        preserve_comments: true,
        ..LexerOptions::default()
    };

    let kinds = tokenize("<?php // a\n/** b */ /**/ #[A]", &options)
        .into_iter()
        .map(|token| token.kind)
        .collect_vec();

    assert_eq!(
        vec![
            TokenKind::OpenTag,
            TokenKind::Comment,
            TokenKind::DocComment,
            TokenKind::Comment,
            TokenKind::AttributeStart,
            TokenKind::Identifier,
            TokenKind::RightBracket,
            TokenKind::Eof,
        ],
        kinds
    );
}

#[test]
fn whitespace_can_be_preserved() {
    let options = LexerOptions {
        preserve_whitespace: true,
        ..LexerOptions::default()
    };

    let kinds = tokenize("<?php  \t\r\n\n", &options)
        .into_iter()
        .map(|token| token.kind)
        .collect_vec();

    assert_eq!(
        vec![
            TokenKind::OpenTag,
            TokenKind::Whitespace,
            TokenKind::Newline,
            TokenKind::Newline,
            TokenKind::Eof,
        ],
        kinds
    );
}

#[test]
fn inline_html_and_tags() {
    let tokens = lex("<p><?php echo 1 ?>\n</p><?= 2;");
    let kinds = tokens.iter().map(|token| token.kind).collect_vec();

    assert_eq!(
        vec![
            TokenKind::InlineHtml,
            TokenKind::OpenTag,
            TokenKind::Echo,
            TokenKind::Number,
            TokenKind::CloseTag,
            TokenKind::InlineHtml,
            TokenKind::OpenTagWithEcho,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ],
        kinds
    );

    assert_eq!("<p>", tokens[0].text);
    assert_eq!("?>\n", tokens[4].text);
    assert_eq!("</p>", tokens[5].text);
}

#[test]
fn inline_html_can_be_dropped() {
    let options = LexerOptions {
        preserve_inline_html: false,
        ..LexerOptions::default()
    };

    let kinds = tokenize("<b><?php 1;", &options)
        .into_iter()
        .map(|token| token.kind)
        .collect_vec();

    assert_eq!(
        vec![
            TokenKind::OpenTag,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Eof
        ],
        kinds
    );
}

#[test]
fn plain_strings_are_single_tokens() {
    let token = single(r#"'it\'s'"#);
    assert_eq!(TokenKind::StringLiteral, token.kind);
    assert_eq!(r#"'it\'s'"#, token.text);
    assert!(matches!(token.value, TokenValue::Str { ref value, .. } if value == r"it\'s"));

    let token = single(r#""no $ here {} \$x""#);
    assert_eq!(TokenKind::StringLiteral, token.kind);
}

#[test]
fn simple_interpolation() {
    check(
        r#""a $b[0] $c->d $e[f] $g""#,
        &[
            TokenKind::StringStart,
            TokenKind::StringMiddle,
            TokenKind::Variable,
            TokenKind::LeftBracket,
            TokenKind::Number,
            TokenKind::RightBracket,
            TokenKind::StringMiddle,
            TokenKind::Variable,
            TokenKind::Arrow,
            TokenKind::Identifier,
            TokenKind::StringMiddle,
            TokenKind::Variable,
            TokenKind::LeftBracket,
            TokenKind::Identifier,
            TokenKind::RightBracket,
            TokenKind::StringMiddle,
            TokenKind::Variable,
            TokenKind::StringEnd,
        ],
    );
}

#[test]
fn arrow_without_name_is_text() {
    check(
        r#""$a->""#,
        &[
            TokenKind::StringStart,
            TokenKind::Variable,
            TokenKind::StringMiddle,
            TokenKind::StringEnd,
        ],
    );
}

#[test]
fn complex_interpolation() {
    check(
        r#""{$a["k"]} ${b}""#,
        &[
            TokenKind::StringStart,
            TokenKind::CurlyOpen,
            TokenKind::Variable,
            TokenKind::LeftBracket,
            TokenKind::StringLiteral,
            TokenKind::RightBracket,
            TokenKind::RightBrace,
            TokenKind::StringMiddle,
            TokenKind::DollarOpenCurlyBraces,
            TokenKind::Identifier,
            TokenKind::RightBrace,
            TokenKind::StringEnd,
        ],
    );
}

#[test]
fn backticks() {
    check(
        "`ls $dir`;",
        &[
            TokenKind::Backtick,
            TokenKind::StringMiddle,
            TokenKind::Variable,
            TokenKind::Backtick,
            TokenKind::Semicolon,
        ],
    );
}

#[test]
fn heredoc() {
    let tokens = lex("<?php $str = <<<EOD\nHello\nEOD;");
    let summary = tokens
        .iter()
        .map(|token| (token.kind, token.text.as_str()))
        .collect_vec();

    assert_eq!(
        vec![
            (TokenKind::OpenTag, "<?php"),
            (TokenKind::Variable, "$str"),
            (TokenKind::Assign, "="),
            (TokenKind::StartHeredoc, "<<<EOD"),
            (TokenKind::StringMiddle, "Hello"),
            (TokenKind::EndHeredoc, "EOD"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Eof, ""),
        ],
        summary
    );
}

#[test]
fn heredoc_with_interpolation_and_indentation() {
    check(
        "<<<\"END\"\n  a $b\n  ENDING\n  END;",
        &[
            TokenKind::StartHeredoc,
            TokenKind::StringMiddle,
            TokenKind::Variable,
            TokenKind::StringMiddle,
            TokenKind::EndHeredoc,
            TokenKind::Semicolon,
        ],
    );
}

#[test]
fn empty_heredoc() {
    check(
        "<<<EOD\nEOD;",
        &[
            TokenKind::StartHeredoc,
            TokenKind::EndHeredoc,
            TokenKind::Semicolon,
        ],
    );
}

#[test]
fn nowdoc_does_not_interpolate() {
    let tokens = lex("<?php <<<'EOD'\n$a {$b}\nEOD;\n");
    let summary = tokens
        .iter()
        .map(|token| (token.kind, token.text.as_str()))
        .collect_vec();

    assert_eq!(
        vec![
            (TokenKind::OpenTag, "<?php"),
            (TokenKind::StartHeredoc, "<<<'EOD'"),
            (TokenKind::StringMiddle, "$a {$b}"),
            (TokenKind::EndHeredoc, "EOD"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Eof, ""),
        ],
        summary
    );
}

#[test]
fn locations_track_lines() {
    let tokens = lex("<?php\n  $a;");

    let variable = &tokens[1];
    assert_eq!(TokenKind::Variable, variable.kind);
    assert_eq!(Position::new(2, 3, 8), variable.location.start);
    assert_eq!(Position::new(2, 5, 10), variable.location.end);

    let eof = tokens.last().map(|token| token.location);
    assert_eq!(
        Some(Position::new(2, 6, 11)),
        eof.map(|location| location.start)
    );
    assert_eq!(
        eof.map(|location| location.start),
        eof.map(|location| location.end)
    );
}

#[test]
fn source_ids_are_attached() {
    let tokens = super::Tokenizer::new("<?php 1;", LexerOptions::default())
        .with_source(7)
        .tokenize();
    assert!(tokens.iter().all(|token| token.location.source == Some(7)));
}

use expect_test::{expect, Expect};

use super::*;
use token::TokenKind;

fn check_tokens(input: &str, expect: Expect) {
    let tokens = lex(input);
    let tokens_str = format!("{:#?}", tokens);
    expect.assert_eq(&tokens_str);
}

/// Flattened (kind, lexeme) view for structural assertions.
fn kinds(input: &str) -> Vec<(TokenKind, String)> {
    lex(input)
        .unwrap()
        .into_iter()
        .map(|t| (t.kind, t.lexeme))
        .collect()
}

#[test]
fn lex_integer_literal() {
    check_tokens(
        "42",
        expect![[r#"
            Ok(
                [
                    Token {
                        kind: Number,
                        lexeme: "42",
                        position: Position {
                            line: 1,
                            column: 1,
                        },
                    },
                    Token {
                        kind: Eos,
                        lexeme: "",
                        position: Position {
                            line: 1,
                            column: 3,
                        },
                    },
                ],
            )"#]],
    );
}

#[test]
fn lex_decimal_literal() {
    assert_eq!(
        kinds("3.14"),
        vec![
            (TokenKind::Number, "3.14".to_string()),
            (TokenKind::Eos, String::new()),
        ]
    );
}

#[test]
fn dot_without_following_digit_is_not_a_fraction() {
    assert_eq!(
        kinds("2.x"),
        vec![
            (TokenKind::Number, "2".to_string()),
            (TokenKind::Dot, ".".to_string()),
            (TokenKind::Identifier, "x".to_string()),
            (TokenKind::Eos, String::new()),
        ]
    );
}

#[test]
fn lex_keywords() {
    let input = "if then else or and true false const for while fn return";
    let expected = [
        TokenKind::If,
        TokenKind::Then,
        TokenKind::Else,
        TokenKind::Or,
        TokenKind::And,
        TokenKind::True,
        TokenKind::False,
        TokenKind::Const,
        TokenKind::For,
        TokenKind::While,
        TokenKind::Fn,
        TokenKind::Return,
        TokenKind::Eos,
    ];

    let actual: Vec<TokenKind> = kinds(input).into_iter().map(|(k, _)| k).collect();
    assert_eq!(actual, expected);
}

#[test]
fn lex_identifiers() {
    assert_eq!(
        kinds("foo _bar baz_99 iffy"),
        vec![
            (TokenKind::Identifier, "foo".to_string()),
            (TokenKind::Identifier, "_bar".to_string()),
            (TokenKind::Identifier, "baz_99".to_string()),
            (TokenKind::Identifier, "iffy".to_string()),
            (TokenKind::Eos, String::new()),
        ]
    );
}

#[test]
fn lex_operators() {
    let actual: Vec<TokenKind> = kinds("= ! - + * / % < > <= >= == !=")
        .into_iter()
        .map(|(k, _)| k)
        .collect();

    assert_eq!(
        actual,
        [
            TokenKind::Assign,
            TokenKind::Bang,
            TokenKind::Minus,
            TokenKind::Plus,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Mod,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LtEqual,
            TokenKind::GtEqual,
            TokenKind::Equal,
            TokenKind::NeqEqual,
            TokenKind::Eos,
        ]
    );
}

#[test]
fn two_char_operators_are_not_split() {
    assert_eq!(
        kinds("a<=b"),
        vec![
            (TokenKind::Identifier, "a".to_string()),
            (TokenKind::LtEqual, "<=".to_string()),
            (TokenKind::Identifier, "b".to_string()),
            (TokenKind::Eos, String::new()),
        ]
    );
}

#[test]
fn lex_symbols() {
    let actual: Vec<TokenKind> = kinds("( ) { } [ ] , . : ;")
        .into_iter()
        .map(|(k, _)| k)
        .collect();

    assert_eq!(
        actual,
        [
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::RBrace,
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::Comma,
            TokenKind::Dot,
            TokenKind::Colon,
            TokenKind::Semicolon,
            TokenKind::Eos,
        ]
    );
}

#[test]
fn lex_plain_string() {
    assert_eq!(
        kinds(r#""hello world""#),
        vec![
            (TokenKind::String, "hello world".to_string()),
            (TokenKind::Eos, String::new()),
        ]
    );
}

#[test]
fn string_escapes_are_decoded() {
    let tokens = lex(r#""\n\r\t\\\"""#).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].lexeme, "\n\r\t\\\"");
}

#[test]
fn invalid_escape_is_an_error() {
    let err = lex(r#""\q""#).unwrap_err();
    assert_eq!(err.message, "Invalid escape sequence.");
    assert_eq!(err.line, 1);
}

#[test]
fn unterminated_string_is_an_error() {
    let err = lex("\"no closing quote").unwrap_err();
    assert_eq!(err.message, "Unterminated string.");
}

#[test]
fn comments_are_skipped() {
    // Comments open with `//` and close with `*/`.
    assert_eq!(
        kinds("1 // anything\n goes here */ 2"),
        vec![
            (TokenKind::Number, "1".to_string()),
            (TokenKind::Number, "2".to_string()),
            (TokenKind::Eos, String::new()),
        ]
    );
}

#[test]
fn unterminated_comment_is_an_error() {
    let err = lex("// never closed").unwrap_err();
    assert_eq!(err.message, "Unterminated comment.");
}

#[test]
fn unrecognized_bytes_yield_invalid_tokens() {
    // Invalid input still lexes to a finite, Eos-terminated stream.
    let tokens = lex("@ # $").unwrap();
    let invalid = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Invalid)
        .count();
    assert_eq!(invalid, 3);
    assert_eq!(tokens.last().unwrap().kind, TokenKind::Eos);
}

#[test]
fn empty_input_is_just_eos() {
    let tokens = lex("").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eos);
    assert_eq!(tokens[0].position.line, 1);
    assert_eq!(tokens[0].position.column, 1);
}

#[test]
fn positions_track_lines_and_columns() {
    let tokens = lex("foo\n  bar").unwrap();

    assert_eq!(tokens[0].position.line, 1);
    assert_eq!(tokens[0].position.column, 1);
    assert_eq!(tokens[1].position.line, 2);
    assert_eq!(tokens[1].position.column, 3);

    // Every position is 1-indexed.
    for token in &tokens {
        assert!(token.position.line >= 1);
        assert!(token.position.column >= 1);
    }
}

#[test]
fn every_lex_ends_in_eos() {
    for input in ["", "1 + 2", "fn main() -> int { return 0; }", "@@@", "...."] {
        let tokens = lex(input).unwrap();
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eos);
    }
}

#[test]
fn next_token_streams_one_at_a_time() {
    let mut lexer = Lexer::new("x = 1;");

    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Assign);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Semicolon);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eos);
    assert!(lexer.at_eof());
}

//! The VLP lexer.
//!
//! A single forward pass over the source text producing a flat token
//! stream terminated by an `EndOfFile` token. There is no separate
//! tokenizing-error type: anything that isn't whitespace, a comment, a
//! string, a number, an identifier, or a known operator becomes an
//! `Unknown` token and is left for the parser to reject. This matches the
//! reference lexer, which never rejects a character outright — it just
//! tags it `Unknown` and keeps going.

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Lex an entire source string into a token stream ending in `EndOfFile`.
pub fn lex(source: &str) -> Vec<Token> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    while !cursor.is_at_end() {
        let c = cursor.current_char();

        if c.is_whitespace() {
            cursor.advance();
            continue;
        }

        if c == '/' && cursor.peek_char(1) == '/' {
            while !cursor.is_at_end() && cursor.current_char() != '\n' {
                cursor.advance();
            }
            continue;
        }

        if c == '"' {
            tokens.push(lex_string(&mut cursor));
            continue;
        }

        if c.is_ascii_digit() {
            tokens.push(lex_number(&mut cursor));
            continue;
        }

        if is_identifier_start(c) {
            tokens.push(lex_identifier(&mut cursor));
            continue;
        }

        tokens.push(lex_operator(&mut cursor));
    }

    tokens.push(Token::new(
        TokenKind::EndOfFile,
        "",
        cursor.line(),
        cursor.column(),
    ));
    tokens
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn has_next_char(cursor: &Cursor<'_>) -> bool {
    cursor.position() + 1 < cursor.source().len()
}

fn lex_string(cursor: &mut Cursor<'_>) -> Token {
    let line = cursor.line();
    cursor.advance(); // opening quote
    let column = cursor.column();

    let mut value = String::new();
    while !cursor.is_at_end() && cursor.current_char() != '"' {
        if cursor.current_char() == '\\' && has_next_char(cursor) {
            let esc = cursor.peek_char(1);
            match esc {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                other => value.push(other),
            }
            cursor.advance();
            cursor.advance();
        } else {
            value.push(cursor.current_char());
            cursor.advance();
        }
    }
    // Unterminated strings are accepted silently, same as the reference lexer.
    if cursor.current_char() == '"' {
        cursor.advance();
    }

    Token::new(TokenKind::StringLit, value, line, column)
}

fn lex_number(cursor: &mut Cursor<'_>) -> Token {
    let line = cursor.line();
    let column = cursor.column();
    let start = cursor.position();

    let mut has_dot = false;
    while !cursor.is_at_end() && (cursor.current_char().is_ascii_digit() || cursor.current_char() == '.') {
        if cursor.current_char() == '.' {
            if has_dot || cursor.peek_char(1) == '.' {
                break;
            }
            has_dot = true;
        }
        cursor.advance();
    }

    let lexeme = cursor.slice_from(start);
    let kind = if has_dot { TokenKind::Float } else { TokenKind::Number };
    Token::new(kind, lexeme, line, column)
}

fn lex_identifier(cursor: &mut Cursor<'_>) -> Token {
    let line = cursor.line();
    let column = cursor.column();
    let start = cursor.position();

    while !cursor.is_at_end() && is_identifier_part(cursor.current_char()) {
        cursor.advance();
    }

    let word = cursor.slice_from(start);
    let kind = keyword_kind(word).unwrap_or(TokenKind::Identifier);
    Token::new(kind, word, line, column)
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    Some(match word {
        "var" => TokenKind::Var,
        "const" => TokenKind::Const,
        "fx" => TokenKind::Fx,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "print" => TokenKind::Print,
        "gather" => TokenKind::Gather,
        "mod" => TokenKind::Mod,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    })
}

fn lex_operator(cursor: &mut Cursor<'_>) -> Token {
    let line = cursor.line();
    let column = cursor.column();
    let c = cursor.current_char();

    macro_rules! two_char {
        ($kind:expr, $lexeme:expr) => {{
            cursor.advance();
            cursor.advance();
            return Token::new($kind, $lexeme, line, column);
        }};
    }
    macro_rules! one_char {
        ($kind:expr, $lexeme:expr) => {{
            cursor.advance();
            return Token::new($kind, $lexeme, line, column);
        }};
    }

    match c {
        '+' => one_char!(TokenKind::Plus, "+"),
        '-' => {
            if cursor.peek_char(1) == '>' {
                two_char!(TokenKind::Arrow, "->")
            } else {
                one_char!(TokenKind::Minus, "-")
            }
        }
        '*' => one_char!(TokenKind::Star, "*"),
        '/' => one_char!(TokenKind::Slash, "/"),
        '(' => one_char!(TokenKind::LeftParen, "("),
        ')' => one_char!(TokenKind::RightParen, ")"),
        '{' => one_char!(TokenKind::LeftBrace, "{"),
        '}' => one_char!(TokenKind::RightBrace, "}"),
        ',' => one_char!(TokenKind::Comma, ","),
        ';' => one_char!(TokenKind::Semicolon, ";"),
        ':' => {
            if cursor.peek_char(1) == ':' {
                two_char!(TokenKind::ColonColon, "::")
            } else {
                one_char!(TokenKind::Colon, ":")
            }
        }
        '.' => {
            if cursor.peek_char(1) == '.' {
                two_char!(TokenKind::DotDot, "..")
            } else {
                one_char!(TokenKind::Dot, ".")
            }
        }
        '=' => {
            if cursor.peek_char(1) == '=' {
                two_char!(TokenKind::Equals, "==")
            } else {
                one_char!(TokenKind::Assign, "=")
            }
        }
        '!' => {
            if cursor.peek_char(1) == '=' {
                two_char!(TokenKind::NotEquals, "!=")
            } else {
                one_char!(TokenKind::Unknown, "!")
            }
        }
        '<' => {
            if cursor.peek_char(1) == '=' {
                two_char!(TokenKind::LessEq, "<=")
            } else {
                one_char!(TokenKind::Less, "<")
            }
        }
        '>' => {
            if cursor.peek_char(1) == '=' {
                two_char!(TokenKind::GreaterEq, ">=")
            } else {
                one_char!(TokenKind::Greater, ">")
            }
        }
        other => {
            cursor.advance();
            Token::new(TokenKind::Unknown, other.to_string(), line, column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn ends_with_eof() {
        assert_eq!(kinds(""), vec![TokenKind::EndOfFile]);
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("var x = 1; // trailing\nvar y;"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn float_requires_single_dot() {
        let tokens = lex("3.14");
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].lexeme, "3.14");
    }

    #[test]
    fn range_dots_stop_number_lexing() {
        let tokens = lex("0..5");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "0");
        assert_eq!(tokens[1].kind, TokenKind::DotDot);
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].lexeme, "5");
    }

    #[test]
    fn string_escapes_n_and_t_only() {
        let tokens = lex(r#""a\nb\tc\qd""#);
        assert_eq!(tokens[0].kind, TokenKind::StringLit);
        assert_eq!(tokens[0].lexeme, "a\nb\tc\u{71}d");
    }

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(
            kinds("var const fx if else for in while return print gather mod true false"),
            vec![
                TokenKind::Var,
                TokenKind::Const,
                TokenKind::Fx,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::For,
                TokenKind::In,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::Print,
                TokenKind::Gather,
                TokenKind::Mod,
                TokenKind::True,
                TokenKind::False,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn greedy_two_char_operators() {
        assert_eq!(
            kinds("-> :: .. == != <= >="),
            vec![
                TokenKind::Arrow,
                TokenKind::ColonColon,
                TokenKind::DotDot,
                TokenKind::Equals,
                TokenKind::NotEquals,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn bang_without_equals_is_unknown() {
        assert_eq!(kinds("!"), vec![TokenKind::Unknown, TokenKind::EndOfFile]);
    }

    #[test]
    fn unterminated_string_does_not_panic() {
        let tokens = lex("\"abc");
        assert_eq!(tokens[0].kind, TokenKind::StringLit);
        assert_eq!(tokens[0].lexeme, "abc");
    }
}

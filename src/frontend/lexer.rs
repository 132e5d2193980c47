//! Lexer for Kestrel
//!
//! Pulls one token at a time out of the source text. Once the input is
//! exhausted every further call yields an `Eof` token.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::Span;

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    line: usize,
    column: usize,
    start_line: usize,
    start_column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos, self.start_line, self.start_column)
    }

    /// Create a token whose text is the source slice of the current span
    fn make_token(&self, kind: TokenKind) -> Token {
        let text: String = self.source[self.start..self.pos].iter().collect();
        Token::new(kind, text, self.make_span())
    }

    /// Skip whitespace and line comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier, keyword or boolean literal
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident);
        Token::new(kind, text, self.make_span())
    }

    fn read_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a number literal. A `.` directly after the integer part makes it a float.
    fn read_number(&mut self) -> Token {
        self.read_digits();

        if self.peek() == Some('.') {
            self.advance();
            self.read_digits();
            return self.make_token(TokenKind::Float);
        }

        self.make_token(TokenKind::Int)
    }

    /// Read a string literal. No escapes; an unterminated string runs to end of input.
    fn read_string(&mut self) -> Token {
        self.advance(); // opening quote
        let content_start = self.pos;

        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.advance();
        }

        let text: String = self.source[content_start..self.pos].iter().collect();
        self.advance(); // closing quote, if any
        Token::new(TokenKind::Str, text, self.make_span())
    }

    /// Emit `with_eq` if the next character is `=`, otherwise `single`
    fn one_or_two(&mut self, single: TokenKind, with_eq: TokenKind) -> Token {
        if self.peek() == Some('=') {
            self.advance();
            self.make_token(with_eq)
        } else {
            self.make_token(single)
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = self.column;

        let c = match self.peek() {
            Some(c) => c,
            None => return Token::eof(self.make_span()),
        };

        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c.is_alphabetic() || c == '_' {
            return self.read_identifier();
        }
        if c == '"' {
            return self.read_string();
        }

        self.advance();
        match c {
            '+' => self.one_or_two(TokenKind::Plus, TokenKind::PlusEq),
            '-' => self.one_or_two(TokenKind::Minus, TokenKind::MinusEq),
            '*' => self.one_or_two(TokenKind::Star, TokenKind::StarEq),
            '/' => self.one_or_two(TokenKind::Slash, TokenKind::SlashEq),
            '=' => self.one_or_two(TokenKind::Assign, TokenKind::EqEq),
            '<' => self.one_or_two(TokenKind::Lt, TokenKind::LtEq),
            '>' => self.one_or_two(TokenKind::Gt, TokenKind::GtEq),
            '(' => self.make_token(TokenKind::LParen),
            ')' => self.make_token(TokenKind::RParen),
            '{' => self.make_token(TokenKind::LBrace),
            '}' => self.make_token(TokenKind::RBrace),
            '[' => self.make_token(TokenKind::LBracket),
            ']' => self.make_token(TokenKind::RBracket),
            ';' => self.make_token(TokenKind::Semicolon),
            ',' => self.make_token(TokenKind::Comma),
            '.' => self.make_token(TokenKind::Dot),
            _ => self.make_token(TokenKind::Illegal),
        }
    }

    /// Tokenize the entire source, including the trailing `Eof`
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_declarations() {
        let tokens = Lexer::new("var x = 5; var y = 10.123 + 90;").tokenize();
        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens[8].kind, TokenKind::Float);
        assert_eq!(tokens[8].text, "10.123");
        assert_eq!(tokens[9].kind, TokenKind::Plus);
        assert_eq!(tokens[9].text, "+");
        assert_eq!(tokens[12].kind, TokenKind::Eof);
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("+= -= *= /= == <= >= + - * / = < >"),
            vec![
                TokenKind::PlusEq,
                TokenKind::MinusEq,
                TokenKind::StarEq,
                TokenKind::SlashEq,
                TokenKind::EqEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Assign,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_booleans() {
        let tokens = Lexer::new("var for while if else fun return true false value").tokenize();
        let got: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            got,
            vec![
                TokenKind::Var,
                TokenKind::For,
                TokenKind::While,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Fun,
                TokenKind::Return,
                TokenKind::Boolean,
                TokenKind::Boolean,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[8].text, "false");
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = Lexer::new("var a = 1; // trailing\n// whole line\na /= 2;").tokenize();
        let got: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(got, vec!["var", "a", "=", "1", ";", "a", "/=", "2", ";", ""]);
        assert_eq!(tokens[5].span.line, 3);
    }

    #[test]
    fn test_strings_are_verbatim() {
        let tokens = Lexer::new(r#""hello \n world" "open"#).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, r"hello \n world");
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(tokens[1].text, "open");
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("42 3.25 7.").tokenize();
        assert_eq!((tokens[0].kind, tokens[0].text.as_str()), (TokenKind::Int, "42"));
        assert_eq!((tokens[1].kind, tokens[1].text.as_str()), (TokenKind::Float, "3.25"));
        assert_eq!((tokens[2].kind, tokens[2].text.as_str()), (TokenKind::Float, "7."));
    }

    #[test]
    fn test_minus_is_separate_token() {
        assert_eq!(kinds("-5"), vec![TokenKind::Minus, TokenKind::Int, TokenKind::Eof]);
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().kind, TokenKind::Ident);
        for _ in 0..3 {
            assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        }
    }

    #[test]
    fn test_illegal_character() {
        let tokens = Lexer::new("a ! b").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Illegal);
        assert_eq!(tokens[1].text, "!");
        assert_eq!(tokens[1].span.column, 3);
    }
}

//! Token definitions for Kestrel

use crate::utils::Span;
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Literal source text of the token
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self { kind, text: text.into(), span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, text: String::new(), span }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            TokenKind::Str => write!(f, "\"{}\"", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ============ Keywords ============
    /// var
    Var,
    /// for (reserved)
    For,
    /// while
    While,
    /// if
    If,
    /// else (reserved)
    Else,
    /// fun
    Fun,
    /// return
    Return,

    // ============ Identifiers and Literals ============
    Ident,
    Int,
    Float,
    Str,
    /// `true` or `false`
    Boolean,

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// <
    Lt,
    /// <=
    LtEq,
    /// ==
    EqEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// =
    Assign,
    /// +=
    PlusEq,
    /// -=
    MinusEq,
    /// *=
    StarEq,
    /// /=
    SlashEq,

    // ============ Delimiters ============
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,

    // ============ Special ============
    /// A character that starts no valid token
    Illegal,
    Eof,
}

impl TokenKind {
    /// Look up a keyword. `true`/`false` are boolean literals, not keywords.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "var" => Some(TokenKind::Var),
            "for" => Some(TokenKind::For),
            "while" => Some(TokenKind::While),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "fun" => Some(TokenKind::Fun),
            "return" => Some(TokenKind::Return),
            "true" | "false" => Some(TokenKind::Boolean),
            _ => None,
        }
    }

    /// Human-readable name used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Var => "'var'",
            TokenKind::For => "'for'",
            TokenKind::While => "'while'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::Fun => "'fun'",
            TokenKind::Return => "'return'",
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::Str => "string",
            TokenKind::Boolean => "boolean",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::EqEq => "'=='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Assign => "'='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Illegal => "illegal character",
            TokenKind::Eof => "end of input",
        }
    }
}

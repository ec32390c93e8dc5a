use crate::language::span::Span;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
    Eq,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpersandAmpersand,
    PipePipe,
    Dollar,

    LParen,
    RParen,
    Comma,
    Dot,
    Hash,
    At,
    LBrace,
    RBrace,
    Colon,
    Semi,
    LBracket,
    RBracket,

    Eof,
}

impl TokenKind {
    /// Human readable name used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier `{name}`"),
            TokenKind::Int(value) => format!("integer `{value}`"),
            TokenKind::Float(value) => format!("number `{value}`"),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Boolean(value) => format!("`{value}`"),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("`{}`", other.symbol()),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::Bang => "!",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::BangEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Dollar => "$",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Hash => "#",
            TokenKind::At => "@",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Colon => ":",
            TokenKind::Semi => ";",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Int(_) | TokenKind::Float(_) => "number",
            TokenKind::String(_) => "string",
            TokenKind::Boolean(_) => "boolean",
            TokenKind::Eof => "EOF",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.span.start, self.kind.describe())
    }
}

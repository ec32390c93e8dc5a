use crate::language::span::{Location, Span};
use miette::SourceSpan;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    Lex,
    Parse,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::Lex => write!(f, "lexical error"),
            SyntaxErrorKind::Parse => write!(f, "parse error"),
        }
    }
}

/// Failure while turning source text into a `Program`. Always fatal.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{kind} at {}: {message}", .span.start)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub span: Span,
    pub help: Option<String>,
}

impl SyntaxError {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: SyntaxErrorKind::Lex,
            message: message.into(),
            span,
            help: None,
        }
    }

    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: SyntaxErrorKind::Parse,
            message: message.into(),
            span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn location(&self) -> Location {
        self.span.start
    }

    pub fn to_source_span(&self) -> SourceSpan {
        self.span.to_source_span()
    }
}

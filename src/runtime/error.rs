use crate::language::span::{Location, Span};
use std::fmt;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Error family as reported to users.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    NameError,
    ArityError,
    TypeError,
    EvalError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::NameError => "NameError",
            ErrorCategory::ArityError => "ArityError",
            ErrorCategory::TypeError => "TypeError",
            ErrorCategory::EvalError => "EvalError",
        })
    }
}

/// What a bare identifier used as a value turned out to name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierUsage {
    Function,
    Variable,
    Unresolved,
}

fn identifier_message(name: &str, usage: &IdentifierUsage) -> String {
    match usage {
        IdentifierUsage::Function => {
            format!("`{name}` is a rule and cannot be used as a value; call it as `{name}(...)`")
        }
        IdentifierUsage::Variable => {
            format!("bare identifier `{name}` is not a value; dereference the variable as `${name}`")
        }
        IdentifierUsage::Unresolved => format!("cannot resolve identifier `{name}`"),
    }
}

/// Lookup failure inside an `Environment`, before a source span is attached.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("unbound variable `{0}`")]
    UnboundVariable(String),
    #[error("unbound function `{name}`")]
    UnboundFunction { name: String, is_variable: bool },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum RuntimeError {
    #[error("unbound variable `${name}`")]
    UnboundVariable { name: String, span: Span },
    #[error("unbound function `{name}`")]
    UnboundFunction {
        name: String,
        is_variable: bool,
        span: Span,
    },
    #[error("rule `{name}` is already defined at {}", .previous.start)]
    DuplicateDefinition {
        name: String,
        span: Span,
        previous: Span,
    },
    #[error("missing value for parameter `{name}` of rule `{rule}`")]
    MissingParameter {
        name: String,
        rule: String,
        span: Span,
    },
    #[error("`{name}` takes {expected} argument(s) but {received} were supplied")]
    ArityMismatch {
        name: String,
        expected: usize,
        received: usize,
        span: Span,
    },
    #[error("{message}")]
    TypeMismatch { message: String, span: Span },
    #[error("{}", identifier_message(.name, .usage))]
    IdentifierAsValue {
        name: String,
        usage: IdentifierUsage,
        span: Span,
    },
    #[error("`@{name}` {message}")]
    InvalidAtRule {
        name: String,
        message: String,
        span: Span,
    },
    #[error("unsupported at-rule `@{name}`")]
    UnsupportedAtRule { name: String, span: Span },
    #[error("at-rule `@{name}` is not allowed at the top level")]
    GlobalAtRule { name: String, span: Span },
    #[error("program has no `main` rule")]
    MissingMain,
    #[error("division by zero")]
    DivisionByZero { span: Span },
    #[error("integer overflow in `{op}`")]
    Overflow { op: String, span: Span },
    #[error("failed to write output: {message}")]
    Output { message: String, span: Span },
}

impl RuntimeError {
    pub fn from_lookup(err: LookupError, span: Span) -> Self {
        match err {
            LookupError::UnboundVariable(name) => RuntimeError::UnboundVariable { name, span },
            LookupError::UnboundFunction { name, is_variable } => RuntimeError::UnboundFunction {
                name,
                is_variable,
                span,
            },
        }
    }

    pub fn type_mismatch(message: impl Into<String>, span: Span) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
            span,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RuntimeError::UnboundVariable { .. }
            | RuntimeError::UnboundFunction { .. }
            | RuntimeError::DuplicateDefinition { .. }
            | RuntimeError::IdentifierAsValue { .. }
            | RuntimeError::MissingMain => ErrorCategory::NameError,
            RuntimeError::MissingParameter { .. } | RuntimeError::ArityMismatch { .. } => {
                ErrorCategory::ArityError
            }
            RuntimeError::TypeMismatch { .. } => ErrorCategory::TypeError,
            RuntimeError::InvalidAtRule { .. }
            | RuntimeError::UnsupportedAtRule { .. }
            | RuntimeError::GlobalAtRule { .. }
            | RuntimeError::DivisionByZero { .. }
            | RuntimeError::Overflow { .. }
            | RuntimeError::Output { .. } => ErrorCategory::EvalError,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            RuntimeError::UnboundVariable { span, .. }
            | RuntimeError::UnboundFunction { span, .. }
            | RuntimeError::DuplicateDefinition { span, .. }
            | RuntimeError::MissingParameter { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::IdentifierAsValue { span, .. }
            | RuntimeError::InvalidAtRule { span, .. }
            | RuntimeError::UnsupportedAtRule { span, .. }
            | RuntimeError::GlobalAtRule { span, .. }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::Overflow { span, .. }
            | RuntimeError::Output { span, .. } => Some(*span),
            RuntimeError::MissingMain => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        self.span().map(|span| span.start)
    }

    /// Location of the earlier definition for duplicate-definition errors.
    pub fn previous_span(&self) -> Option<Span> {
        match self {
            RuntimeError::DuplicateDefinition { previous, .. } => Some(*previous),
            _ => None,
        }
    }

    pub fn help(&self) -> Option<String> {
        match self {
            RuntimeError::UnboundFunction {
                name,
                is_variable: true,
                ..
            } => Some(format!(
                "`{name}` is a variable, not a rule; read it with `${name}`"
            )),
            RuntimeError::UnboundVariable { name, .. } => Some(format!(
                "declare it first with `--{name}: value;` or add a `[{name}]` parameter"
            )),
            RuntimeError::DuplicateDefinition { .. } => {
                Some("rename one of the rules or remove the duplicate".to_string())
            }
            RuntimeError::MissingParameter { name, .. } => Some(format!(
                "pass a value for `{name}` or give it a default like `[{name}=0]`"
            )),
            RuntimeError::UnsupportedAtRule { .. } => {
                Some("only `@if` and `@return` are supported".to_string())
            }
            RuntimeError::GlobalAtRule { .. } => {
                Some("move the at-rule into a rule body such as `main { ... }`".to_string())
            }
            RuntimeError::MissingMain => Some("add an entry point: `main { ... }`".to_string()),
            _ => None,
        }
    }
}

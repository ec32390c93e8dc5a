use crate::language::span::Span;
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    value::Value,
};
use std::io::Write;

/// Functions available in every scope when no rule of the same name is visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Print,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "print" => Some(Builtin::Print),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
        }
    }

    pub fn call<W: Write>(self, out: &mut W, args: Vec<Value>, span: Span) -> RuntimeResult<Value> {
        match self {
            Builtin::Print => print(out, args, span),
        }
    }
}

/// Writes the value followed by a newline and hands it back unchanged.
fn print<W: Write>(out: &mut W, args: Vec<Value>, span: Span) -> RuntimeResult<Value> {
    let received = args.len();
    let mut args = args.into_iter();
    let (Some(value), None) = (args.next(), args.next()) else {
        return Err(RuntimeError::ArityMismatch {
            name: Builtin::Print.name().to_string(),
            expected: 1,
            received,
            span,
        });
    };
    writeln!(out, "{value}").map_err(|err| RuntimeError::Output {
        message: err.to_string(),
        span,
    })?;
    Ok(value)
}

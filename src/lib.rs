pub mod diagnostics;
pub mod language;
pub mod runtime;

pub use language::{ast::Program, errors::SyntaxError, parser::parse};
pub use runtime::{error::RuntimeError, invoke_main, value::Value, Interpreter};

use thiserror::Error;

/// Any failure between source text and a program result.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Parses `source` and invokes its `main` rule, printing to stdout.
pub fn run(source: &str) -> Result<Value, Error> {
    let program = parse(source)?;
    Ok(invoke_main(&program)?)
}

#[cfg(test)]
mod tests;

mod interpreter;
mod programs;

use crate::language::ast::Program;
use crate::language::parser::parse;
use crate::runtime::{error::RuntimeResult, value::Value, Interpreter};

fn parse_ok(source: &str) -> Program {
    parse(source).expect("program should parse")
}

/// Runs `source` with `print` captured, returning the result and everything printed.
fn run_captured(source: &str) -> (RuntimeResult<Value>, String) {
    let program = parse_ok(source);
    let mut interpreter = Interpreter::with_output(Vec::new());
    let result = interpreter.run(&program);
    let output = String::from_utf8(interpreter.into_output()).expect("utf8 output");
    (result, output)
}

fn eval(source: &str) -> RuntimeResult<Value> {
    run_captured(source).0
}

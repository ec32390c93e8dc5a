use super::{eval, run_captured};
use crate::runtime::error::{ErrorCategory, IdentifierUsage, RuntimeError};
use crate::runtime::value::Value;
use pretty_assertions::assert_eq;

/// Evaluates `expr` as the return value of `main`.
fn value_of(expr: &str) -> Result<Value, RuntimeError> {
    eval(&format!("main {{ @return {expr}; }}"))
}

#[test]
fn literals_evaluate_to_themselves() {
    assert_eq!(value_of("42"), Ok(Value::Int(42)));
    assert_eq!(value_of("2.5"), Ok(Value::Float(2.5)));
    assert_eq!(value_of("'hi'"), Ok(Value::from("hi")));
    assert_eq!(value_of("false"), Ok(Value::Boolean(false)));
}

#[test]
fn integer_arithmetic() {
    assert_eq!(value_of("1 + 2 * 3"), Ok(Value::Int(7)));
    assert_eq!(value_of("(1 + 2) * 3"), Ok(Value::Int(9)));
    assert_eq!(value_of("7 / 2"), Ok(Value::Int(3)));
    assert_eq!(value_of("7 % 4"), Ok(Value::Int(3)));
    assert_eq!(value_of("2 ^ 10"), Ok(Value::Int(1024)));
    assert_eq!(value_of("2 ^ 3 ^ 2"), Ok(Value::Int(512)));
    assert_eq!(value_of("-(3 - 5)"), Ok(Value::Int(2)));
}

#[test]
fn mixed_arithmetic_promotes_to_float() {
    assert_eq!(value_of("1 + 0.5"), Ok(Value::Float(1.5)));
    assert_eq!(value_of("3 / 2.0"), Ok(Value::Float(1.5)));
    assert_eq!(value_of("2 ^ -1"), Ok(Value::Float(0.5)));
    assert_eq!(value_of("4.0 ^ 0.5"), Ok(Value::Float(2.0)));
}

#[test]
fn negated_base_is_squared() {
    assert_eq!(value_of("-2 ^ 2"), Ok(Value::Int(4)));
    assert_eq!(value_of("-(2 ^ 2)"), Ok(Value::Int(-4)));
}

#[test]
fn leading_dot_floats_evaluate() {
    assert_eq!(value_of(".5 + 1"), Ok(Value::Float(1.5)));
}

#[test]
fn float_display_stays_short() {
    assert_eq!(Value::Float(1e300).to_string(), "1e300");
    assert_eq!(Value::Float(2.0).to_string(), "2.0");
    assert_eq!(Value::Float(-0.125).to_string(), "-0.125");
    assert_eq!(Value::Int(-7).to_string(), "-7");
}

#[test]
fn string_concatenation() {
    assert_eq!(value_of("'foo' + \"bar\""), Ok(Value::from("foobar")));
}

#[test]
fn unary_operators() {
    assert_eq!(value_of("+5"), Ok(Value::Int(5)));
    assert_eq!(value_of("-1.5"), Ok(Value::Float(-1.5)));
    assert_eq!(value_of("!true"), Ok(Value::Boolean(false)));
    assert_eq!(value_of("!!false"), Ok(Value::Boolean(false)));
}

#[test]
fn comparisons() {
    assert_eq!(value_of("1 == 1.0"), Ok(Value::Boolean(true)));
    assert_eq!(value_of("2 != 3"), Ok(Value::Boolean(true)));
    assert_eq!(value_of("2 < 1.5"), Ok(Value::Boolean(false)));
    assert_eq!(value_of("3 >= 3"), Ok(Value::Boolean(true)));
    assert_eq!(value_of("'abc' < 'abd'"), Ok(Value::Boolean(true)));
    assert_eq!(value_of("'a' == 'a'"), Ok(Value::Boolean(true)));
    assert_eq!(value_of("true == false"), Ok(Value::Boolean(false)));
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(value_of("true || missing()"), Ok(Value::Boolean(true)));
    assert_eq!(value_of("false && missing()"), Ok(Value::Boolean(false)));
    assert_eq!(value_of("true && 1 < 2"), Ok(Value::Boolean(true)));
    assert!(matches!(
        value_of("true && missing()"),
        Err(RuntimeError::UnboundFunction { name, .. }) if name == "missing"
    ));
}

#[test]
fn type_errors() {
    for expr in ["1 + true", "'a' - 'b'", "-'a'", "!1", "1 && true", "1 < 'a'", "true < false"] {
        let err = value_of(expr).expect_err(expr);
        assert_eq!(err.category(), ErrorCategory::TypeError, "{expr}: {err}");
    }
}

#[test]
fn type_error_message_names_operand_types() {
    let err = value_of("1 + true").expect_err("int plus boolean");
    assert_eq!(err.to_string(), "`+` expects numeric operands, found int and boolean");
}

#[test]
fn integer_division_by_zero() {
    assert!(matches!(value_of("1 / 0"), Err(RuntimeError::DivisionByZero { .. })));
    assert!(matches!(value_of("1 % 0"), Err(RuntimeError::DivisionByZero { .. })));
    assert_eq!(value_of("1.0 / 0"), Ok(Value::Float(f64::INFINITY)));
}

#[test]
fn integer_overflow() {
    let err = value_of("9223372036854775807 + 1").expect_err("overflow");
    assert!(matches!(&err, RuntimeError::Overflow { op, .. } if op == "+"));
    assert_eq!(err.category(), ErrorCategory::EvalError);
    assert!(matches!(value_of("2 ^ 64"), Err(RuntimeError::Overflow { .. })));
}

#[test]
fn if_requires_boolean_condition() {
    let err = eval("main { @if 1 { print: 1; } }").expect_err("int condition");
    assert_eq!(err.to_string(), "`@if` condition must be a boolean, found int");
    assert_eq!(err.category(), ErrorCategory::TypeError);
}

#[test]
fn if_requires_exactly_one_parameter() {
    let err = eval("main { @if true false { print: 1; } }").expect_err("two parameters");
    assert_eq!(err.to_string(), "`@if` expects exactly one parameter, found 2");
}

#[test]
fn if_requires_block() {
    let err = eval("main { @if true; }").expect_err("no block");
    assert_eq!(err.to_string(), "`@if` requires a block");
}

#[test]
fn false_if_yields_nil() {
    assert_eq!(eval("main { print: 1; @if false { print: 2; } }"), Ok(Value::Nil));
}

#[test]
fn return_rejects_block_and_extra_parameters() {
    let err = eval("main { @return 1 { } }").expect_err("block on return");
    assert_eq!(err.to_string(), "`@return` does not take a block");
    let err = eval("main { @return; }").expect_err("no value");
    assert_eq!(err.to_string(), "`@return` expects exactly one parameter, found 0");
}

#[test]
fn unknown_at_rules_are_unsupported() {
    let err = eval("main { @media screen { } }").expect_err("unsupported");
    assert!(matches!(&err, RuntimeError::UnsupportedAtRule { name, .. } if name == "media"));
}

#[test]
fn global_at_rules_are_fatal() {
    let err = eval("@import 'x'; main { print: 1; }").expect_err("global at-rule");
    assert!(matches!(&err, RuntimeError::GlobalAtRule { name, .. } if name == "import"));
}

#[test]
fn missing_main_is_fatal() {
    let err = eval("helper { print: 1; }").expect_err("no main");
    assert_eq!(err, RuntimeError::MissingMain);
    assert_eq!(err.category(), ErrorCategory::NameError);
    assert_eq!(err.span(), None);
    assert_eq!(err.help().as_deref(), Some("add an entry point: `main { ... }`"));
}

#[test]
fn bare_identifier_naming_a_rule() {
    let err = eval("helper { @return 1; } main { @return helper; }").expect_err("bare rule");
    assert!(matches!(
        &err,
        RuntimeError::IdentifierAsValue { usage: IdentifierUsage::Function, .. }
    ));
    assert_eq!(
        err.to_string(),
        "`helper` is a rule and cannot be used as a value; call it as `helper(...)`"
    );
}

#[test]
fn bare_identifier_naming_a_builtin() {
    let err = eval("main { @return print; }").expect_err("bare builtin");
    assert!(matches!(
        err,
        RuntimeError::IdentifierAsValue { usage: IdentifierUsage::Function, .. }
    ));
}

#[test]
fn bare_identifier_naming_a_variable() {
    let err = eval("main { --size: 3; @return size; }").expect_err("bare variable");
    assert!(matches!(
        &err,
        RuntimeError::IdentifierAsValue { usage: IdentifierUsage::Variable, .. }
    ));
    assert_eq!(
        err.to_string(),
        "bare identifier `size` is not a value; dereference the variable as `$size`"
    );
}

#[test]
fn bare_identifier_unresolved() {
    let err = eval("main { @return ghost; }").expect_err("unknown name");
    assert_eq!(err.to_string(), "cannot resolve identifier `ghost`");
    assert_eq!(err.category(), ErrorCategory::NameError);
}

#[test]
fn calling_a_variable_gets_a_hint() {
    let err = eval("main { --size: 3; size: 1; }").expect_err("variable called");
    assert!(matches!(
        &err,
        RuntimeError::UnboundFunction { is_variable: true, .. }
    ));
    assert_eq!(
        err.help().as_deref(),
        Some("`size` is a variable, not a rule; read it with `$size`")
    );
}

#[test]
fn unbound_variable_reports_location() {
    let err = eval("main {\n  print: $nope;\n}").expect_err("unbound");
    assert_eq!(err.to_string(), "unbound variable `$nope`");
    let location = err.location().expect("location");
    assert_eq!((location.line, location.col), (2, 10));
}

#[test]
fn print_writes_display_form() {
    let (result, output) = run_captured(
        "main { print: 1; print: 2.0; print: 0.25; print: 'text'; print: true; print: 1 < 0; }",
    );
    assert_eq!(result, Ok(Value::Boolean(false)));
    assert_eq!(output, "1\n2.0\n0.25\ntext\ntrue\nfalse\n");
}

#[test]
fn print_takes_exactly_one_argument() {
    let err = eval("main { print: 1 2; }").expect_err("two values");
    assert!(matches!(
        &err,
        RuntimeError::ArityMismatch { name, expected: 1, received: 2, .. } if name == "print"
    ));
    assert_eq!(err.category(), ErrorCategory::ArityError);
}

#[test]
fn print_can_be_called_as_a_value() {
    let (result, output) = run_captured("main { @return print(3) + 1; }");
    assert_eq!(result, Ok(Value::Int(4)));
    assert_eq!(output, "3\n");
}

#[test]
fn too_many_arguments() {
    let err = eval("one[a] { @return $a; } main { @return one(1, 2); }").expect_err("arity");
    assert_eq!(err.to_string(), "`one` takes 1 argument(s) but 2 were supplied");
}

#[test]
fn side_effects_before_an_error_remain() {
    let (result, output) = run_captured("main { print: 'before'; print: $missing; print: 'after'; }");
    assert!(result.is_err());
    assert_eq!(output, "before\n");
}

use super::{eval, parse_ok, run_captured};
use crate::language::span::Location;
use crate::runtime::error::{ErrorCategory, RuntimeError};
use crate::runtime::value::Value;
use pretty_assertions::assert_eq;

const FACTORIAL: &str = "
factorial[n] {
    @if $n == 1 { @return 1; }
    @return $n * factorial($n - 1);
}

main {
    @return factorial(5);
}
";

#[test]
fn recursion_computes_factorial() {
    assert_eq!(eval(FACTORIAL), Ok(Value::Int(120)));
}

#[test]
fn arity_defaults_bind_by_position() {
    let source = "
        f[a][b=1] { @return $a * 10 + $b; }
        main { @return f(4); }
    ";
    assert_eq!(eval(source), Ok(Value::Int(41)));

    let source = "
        f[a][b=1] { @return $a * 10 + $b; }
        main { @return f(4, 7); }
    ";
    assert_eq!(eval(source), Ok(Value::Int(47)));
}

#[test]
fn missing_parameter_without_default() {
    let source = "
        f[a][b=1] { @return $a; }
        main { @return f(); }
    ";
    let err = eval(source).expect_err("`a` has no default");
    assert!(matches!(
        &err,
        RuntimeError::MissingParameter { name, rule, .. } if name == "a" && rule == "f"
    ));
    assert_eq!(err.category(), ErrorCategory::ArityError);
}

#[test]
fn defaults_are_evaluated_in_the_defining_scope() {
    let source = "
        main {
            --base: 10;
            scaled[x][factor = $base / 2] { @return $x * $factor; }
            @return scaled(3);
        }
    ";
    assert_eq!(eval(source), Ok(Value::Int(15)));
}

#[test]
fn return_short_circuits() {
    let source = "
        f[n] {
            @if $n == 0 { @return 0; }
            print: 'unreachable';
            @return 1;
        }
        main { @return f(0); }
    ";
    let (result, output) = run_captured(source);
    assert_eq!(result, Ok(Value::Int(0)));
    assert_eq!(output, "");
}

#[test]
fn return_unwinds_nested_if_blocks() {
    let source = "
        pick[n] {
            @if $n > 0 {
                @if $n > 10 { @return 'big'; }
                @return 'small';
            }
            @return 'none';
        }
        main {
            print: pick(50);
            print: pick(5);
            print: pick(0);
        }
    ";
    let (result, output) = run_captured(source);
    assert_eq!(result, Ok(Value::from("none")));
    assert_eq!(output, "big\nsmall\nnone\n");
}

#[test]
fn return_stops_at_invocation_boundary() {
    let source = "
        inner { @return 1; }
        main {
            --x: inner();
            @return $x + 1;
        }
    ";
    assert_eq!(eval(source), Ok(Value::Int(2)));
}

#[test]
fn body_result_is_last_statement() {
    assert_eq!(eval("main { --a: 1; --b: $a + 1; }"), Ok(Value::Int(2)));
    assert_eq!(eval("main { }"), Ok(Value::Nil));
    assert_eq!(eval("main { --a: 1; inner { } }"), Ok(Value::Nil));
}

#[test]
fn lexical_closures_stay_inside_their_rule() {
    let visible = "
        main {
            helper[x] { @return $x + 1; }
            @if true { @return helper(1); }
        }
    ";
    assert_eq!(eval(visible), Ok(Value::Int(2)));

    let hidden = "
        sibling { @return helper(1); }
        main {
            helper[x] { @return $x + 1; }
            @return sibling();
        }
    ";
    let err = eval(hidden).expect_err("helper is local to main");
    assert!(matches!(&err, RuntimeError::UnboundFunction { name, .. } if name == "helper"));
}

#[test]
fn closures_capture_the_defining_scope() {
    let source = "
        main {
            --greeting: 'hello';
            greet { @return $greeting; }
            @return greet();
        }
    ";
    assert_eq!(eval(source), Ok(Value::from("hello")));
}

#[test]
fn callers_do_not_leak_into_callees() {
    let source = "
        show { print: $msg; }
        main {
            --msg: 'from main';
            show: ;
        }
    ";
    let err = eval(source).expect_err("lexical scoping hides caller variables");
    assert!(matches!(&err, RuntimeError::UnboundVariable { name, .. } if name == "msg"));
}

#[test]
fn variables_do_not_leak_between_rules() {
    let source = "
        first { --msg: 'a'; print: $msg; }
        second { print: $msg; }
        main {
            first: ;
            second: ;
        }
    ";
    let (result, output) = run_captured(source);
    assert!(matches!(result, Err(RuntimeError::UnboundVariable { .. })));
    assert_eq!(output, "a\n");
}

#[test]
fn if_blocks_get_their_own_scope() {
    let source = "
        main {
            --x: 1;
            @if true { --x: 2; --y: 3; }
            @return $x;
        }
    ";
    assert_eq!(eval(source), Ok(Value::Int(1)));

    let leaked = "main { @if true { --y: 3; } @return $y; }";
    assert!(matches!(eval(leaked), Err(RuntimeError::UnboundVariable { .. })));
}

#[test]
fn dollar_double_dash_reads_the_same_variable() {
    assert_eq!(eval("main { --w: 5; @return $--w + $w; }"), Ok(Value::Int(10)));
}

#[test]
fn nil_arguments_fall_back_to_defaults() {
    let source = "
        nothing { }
        f[a = 7] { @return $a; }
        main { @return f(nothing()); }
    ";
    assert_eq!(eval(source), Ok(Value::Int(7)));
}

#[test]
fn duplicate_main_names_both_locations() {
    let source = "main { print: 1; }\nmain { print: 2; }";
    let err = eval(source).expect_err("duplicate main");
    assert_eq!(err.category(), ErrorCategory::NameError);
    let RuntimeError::DuplicateDefinition {
        name,
        span,
        previous,
    } = &err
    else {
        panic!("expected duplicate definition, got {err:?}");
    };
    assert_eq!(name, "main");
    assert_eq!(previous.start, Location::new(0, 1, 1));
    assert_eq!(span.start, Location::new(19, 2, 1));
    assert_eq!(err.to_string(), "rule `main` is already defined at 1:1");
}

#[test]
fn nested_duplicates_are_fatal_but_shadowing_is_not() {
    let duplicate = "main { a { } a { } }";
    assert!(matches!(
        eval(duplicate),
        Err(RuntimeError::DuplicateDefinition { .. })
    ));

    let shadow = "
        value { @return 'outer'; }
        main {
            value { @return 'inner'; }
            @return value();
        }
    ";
    assert_eq!(eval(shadow), Ok(Value::from("inner")));
}

#[test]
fn rule_redefined_in_each_invocation() {
    let source = "
        make[n] {
            local { @return 1; }
            @return $n + local();
        }
        main { @return make(1) + make(2); }
    ";
    assert_eq!(eval(source), Ok(Value::Int(5)));
}

#[test]
fn fibonacci_with_defaults_and_logic() {
    let source = "
        fib[n][a = 0][b = 1] {
            @if $n == 0 || $n < 0 { @return $a; }
            @return fib($n - 1, $b, $a + $b);
        }
        main { @return fib(20); }
    ";
    assert_eq!(eval(source), Ok(Value::Int(6765)));
}

#[test]
fn parsed_programs_can_run_twice() {
    let program = parse_ok(FACTORIAL);
    let mut interpreter = crate::Interpreter::with_output(Vec::new());
    assert_eq!(interpreter.run(&program), Ok(Value::Int(120)));
    assert_eq!(interpreter.run(&program), Ok(Value::Int(120)));
}

#[test]
fn library_run_reports_both_error_families() {
    assert!(matches!(crate::run("main {"), Err(crate::Error::Syntax(_))));
    assert!(matches!(crate::run("helper { }"), Err(crate::Error::Runtime(_))));
    assert_eq!(crate::run("main { @return 2 * 21; }").map_err(|e| e.to_string()), Ok(Value::Int(42)));
}

use crate::language::{ast::*, span::Span};
use crate::runtime::{
    builtins::Builtin,
    environment::Environment,
    error::{IdentifierUsage, RuntimeError, RuntimeResult},
    value::Value,
};
use std::cmp::Ordering;
use std::io::{self, Write};
use std::rc::Rc;
use tracing::{debug, trace};

/// Tree-walking evaluator. `print` output goes to `W`.
pub struct Interpreter<W: Write = io::Stdout> {
    out: W,
}

/// Result of running a statement list.
enum BlockEval {
    Value(Value),
    /// `@return` fired; unwound up to the nearest invocation.
    Return(Value),
}

enum Callee {
    Rule(Rc<Rule>, Environment),
    Builtin(Builtin),
}

/// Runs a parsed program with `print` writing to stdout.
pub fn invoke_main(program: &Program) -> RuntimeResult<Value> {
    Interpreter::new().run(program)
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(out: W) -> Self {
        Self { out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Registers every top-level rule in a fresh root environment, then
    /// invokes `main` with no arguments and returns its value.
    pub fn run(&mut self, program: &Program) -> RuntimeResult<Value> {
        let root = Environment::new();
        for item in &program.items {
            match item {
                Item::Rule(rule) => self.define(&root, rule)?,
                Item::AtRule(at_rule) => {
                    return Err(RuntimeError::GlobalAtRule {
                        name: at_rule.name.name.clone(),
                        span: at_rule.span,
                    })
                }
            }
        }

        let (main, env) = root.get_fn("main").map_err(|_| RuntimeError::MissingMain)?;
        debug!(rules = program.items.len(), "invoking main");
        self.invoke(&main, Vec::new(), &env, main.selector.span)
    }

    fn define(&mut self, env: &Environment, rule: &Rule) -> RuntimeResult<()> {
        match env.set_fn(Rc::new(rule.clone())) {
            Ok(()) => {
                debug!(rule = rule.name(), depth = env.depth(), "registered rule");
                Ok(())
            }
            Err(existing) => {
                debug!(
                    rule = rule.name(),
                    previous = %existing.selector.identifier.span.start,
                    "duplicate rule definition"
                );
                Err(RuntimeError::DuplicateDefinition {
                    name: rule.name().to_string(),
                    span: rule.selector.identifier.span,
                    previous: existing.selector.identifier.span,
                })
            }
        }
    }

    fn invoke(
        &mut self,
        rule: &Rule,
        args: Vec<Value>,
        defining: &Environment,
        call_span: Span,
    ) -> RuntimeResult<Value> {
        trace!(rule = rule.name(), args = args.len(), "invoking rule");
        let attributes = &rule.selector.attributes;
        if args.len() > attributes.len() {
            return Err(RuntimeError::ArityMismatch {
                name: rule.name().to_string(),
                expected: attributes.len(),
                received: args.len(),
                span: call_span,
            });
        }

        let env = defining.fork();
        let mut args = args.into_iter();
        for attribute in attributes {
            let value = match args.next() {
                Some(value) if !value.is_nil() => value,
                _ => match &attribute.default {
                    Some(default) => self.eval_value(default, defining)?,
                    None => {
                        return Err(RuntimeError::MissingParameter {
                            name: attribute.name.variable_name().to_string(),
                            rule: rule.name().to_string(),
                            span: call_span,
                        })
                    }
                },
            };
            env.set_var(attribute.name.variable_name(), value);
        }

        match self.eval_statements(&rule.body, &env)? {
            BlockEval::Value(value) => Ok(value),
            BlockEval::Return(value) => {
                trace!(rule = rule.name(), "returned");
                Ok(value)
            }
        }
    }

    fn eval_statements(
        &mut self,
        statements: &[Statement],
        env: &Environment,
    ) -> RuntimeResult<BlockEval> {
        let mut result = Value::Nil;
        for statement in statements {
            match self.eval_statement(statement, env)? {
                BlockEval::Value(value) => result = value,
                signal @ BlockEval::Return(_) => return Ok(signal),
            }
        }
        Ok(BlockEval::Value(result))
    }

    fn eval_statement(&mut self, statement: &Statement, env: &Environment) -> RuntimeResult<BlockEval> {
        match statement {
            Statement::Rule(rule) => {
                self.define(env, rule)?;
                Ok(BlockEval::Value(Value::Nil))
            }
            Statement::AtRule(at_rule) => self.eval_at_rule(at_rule, env),
            Statement::Declaration(decl) => self.eval_declaration(decl, env).map(BlockEval::Value),
        }
    }

    fn eval_at_rule(&mut self, at_rule: &AtRule, env: &Environment) -> RuntimeResult<BlockEval> {
        match at_rule.name.name.as_str() {
            "if" => {
                let condition = single_parameter(at_rule)?;
                let Some(body) = &at_rule.body else {
                    return Err(invalid_at_rule(at_rule, "requires a block"));
                };
                match self.eval_value(condition, env)? {
                    Value::Boolean(true) => self.eval_statements(body, &env.fork()),
                    Value::Boolean(false) => Ok(BlockEval::Value(Value::Nil)),
                    other => Err(RuntimeError::type_mismatch(
                        format!("`@if` condition must be a boolean, found {}", other.type_name()),
                        condition.span(),
                    )),
                }
            }
            "return" => {
                if at_rule.body.is_some() {
                    return Err(invalid_at_rule(at_rule, "does not take a block"));
                }
                let expr = single_parameter(at_rule)?;
                let value = self.eval_value(expr, env)?;
                trace!(value = %value, "unwinding @return");
                Ok(BlockEval::Return(value))
            }
            _ => Err(RuntimeError::UnsupportedAtRule {
                name: at_rule.name.name.clone(),
                span: at_rule.name.span,
            }),
        }
    }

    fn eval_declaration(&mut self, decl: &Declaration, env: &Environment) -> RuntimeResult<Value> {
        if decl.property.is_variable() {
            let [expr] = decl.parameters.as_slice() else {
                return Err(RuntimeError::ArityMismatch {
                    name: decl.property.name.clone(),
                    expected: 1,
                    received: decl.parameters.len(),
                    span: decl.span,
                });
            };
            let value = self.eval_value(expr, env)?;
            env.set_var(decl.property.variable_name(), value.clone());
            return Ok(value);
        }

        let callee = self.resolve_callee(&decl.property, env)?;
        let args = self.eval_arguments(&decl.parameters, env)?;
        self.call(callee, args, decl.span)
    }

    fn eval_arguments(&mut self, exprs: &[Expr], env: &Environment) -> RuntimeResult<Vec<Value>> {
        let mut args = Vec::with_capacity(exprs.len());
        for expr in exprs {
            args.push(self.eval_value(expr, env)?);
        }
        Ok(args)
    }

    fn resolve_callee(&self, name: &Identifier, env: &Environment) -> RuntimeResult<Callee> {
        match env.get_fn(&name.name) {
            Ok((rule, defining)) => Ok(Callee::Rule(rule, defining)),
            Err(err) => match Builtin::lookup(&name.name) {
                Some(builtin) => Ok(Callee::Builtin(builtin)),
                None => Err(RuntimeError::from_lookup(err, name.span)),
            },
        }
    }

    fn call(&mut self, callee: Callee, args: Vec<Value>, span: Span) -> RuntimeResult<Value> {
        match callee {
            Callee::Rule(rule, defining) => self.invoke(&rule, args, &defining, span),
            Callee::Builtin(builtin) => {
                trace!(builtin = builtin.name(), args = args.len(), "calling builtin");
                builtin.call(&mut self.out, args, span)
            }
        }
    }

    fn eval_value(&mut self, expr: &Expr, env: &Environment) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Boolean(value, _) => Value::Boolean(*value),
                Literal::Int(value, _) => Value::Int(*value),
                Literal::Float(value, _) => Value::Float(*value),
                Literal::String(value, _) => Value::String(value.clone()),
            }),
            Expr::Identifier(ident) => Err(identifier_misuse(ident, env)),
            Expr::VariableDeref { name, span } => env
                .get_var(name.variable_name())
                .map_err(|err| RuntimeError::from_lookup(err, *span)),
            Expr::FunctionCall { callee, args, span } => {
                let args = self.eval_arguments(args, env)?;
                let callee = self.resolve_callee(callee, env)?;
                self.call(callee, args, *span)
            }
            Expr::Unary { op, expr, span } => {
                let value = self.eval_value(expr, env)?;
                eval_unary(*op, value, *span)
            }
            Expr::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                left,
                right,
                ..
            } => {
                let lhs = self.eval_condition(*op, left, env)?;
                match (op, lhs) {
                    (BinaryOp::Or, true) => Ok(Value::Boolean(true)),
                    (BinaryOp::And, false) => Ok(Value::Boolean(false)),
                    _ => self.eval_condition(*op, right, env).map(Value::Boolean),
                }
            }
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let left = self.eval_value(left, env)?;
                let right = self.eval_value(right, env)?;
                eval_binary(*op, left, right, *span)
            }
        }
    }

    fn eval_condition(&mut self, op: BinaryOp, expr: &Expr, env: &Environment) -> RuntimeResult<bool> {
        match self.eval_value(expr, env)? {
            Value::Boolean(value) => Ok(value),
            other => Err(RuntimeError::type_mismatch(
                format!("`{op}` expects boolean operands, found {}", other.type_name()),
                expr.span(),
            )),
        }
    }
}

fn single_parameter(at_rule: &AtRule) -> RuntimeResult<&Expr> {
    match at_rule.parameters.as_slice() {
        [expr] => Ok(expr),
        params => Err(invalid_at_rule(
            at_rule,
            &format!("expects exactly one parameter, found {}", params.len()),
        )),
    }
}

fn invalid_at_rule(at_rule: &AtRule, message: &str) -> RuntimeError {
    RuntimeError::InvalidAtRule {
        name: at_rule.name.name.clone(),
        message: message.to_string(),
        span: at_rule.span,
    }
}

fn identifier_misuse(ident: &Identifier, env: &Environment) -> RuntimeError {
    let usage = if env.get_fn(&ident.name).is_ok() || Builtin::lookup(&ident.name).is_some() {
        IdentifierUsage::Function
    } else if env.get_var(ident.variable_name()).is_ok() {
        IdentifierUsage::Variable
    } else {
        IdentifierUsage::Unresolved
    };
    RuntimeError::IdentifierAsValue {
        name: ident.name.clone(),
        usage,
        span: ident.span,
    }
}

fn eval_unary(op: UnaryOp, value: Value, span: Span) -> RuntimeResult<Value> {
    match (op, value) {
        (UnaryOp::Plus, value) => Ok(value),
        (UnaryOp::Neg, Value::Int(v)) => v
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::Overflow {
                op: op.to_string(),
                span,
            }),
        (UnaryOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnaryOp::Not, Value::Boolean(v)) => Ok(Value::Boolean(!v)),
        (op, value) => Err(RuntimeError::type_mismatch(
            format!("cannot apply unary `{op}` to {}", value.type_name()),
            span,
        )),
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value, span: Span) -> RuntimeResult<Value> {
    match op {
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Rem
        | BinaryOp::Pow => eval_numeric(op, left, right, span),
        BinaryOp::Eq => eval_compare(op, &left, &right, span, |o| o == Some(Ordering::Equal)),
        BinaryOp::NotEq => eval_compare(op, &left, &right, span, |o| o != Some(Ordering::Equal)),
        BinaryOp::Lt => eval_compare(op, &left, &right, span, |o| o == Some(Ordering::Less)),
        BinaryOp::LtEq => eval_compare(op, &left, &right, span, |o| {
            matches!(o, Some(Ordering::Less | Ordering::Equal))
        }),
        BinaryOp::Gt => eval_compare(op, &left, &right, span, |o| o == Some(Ordering::Greater)),
        BinaryOp::GtEq => eval_compare(op, &left, &right, span, |o| {
            matches!(o, Some(Ordering::Greater | Ordering::Equal))
        }),
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(if op == BinaryOp::And {
                a && b
            } else {
                a || b
            })),
            (left, right) => Err(RuntimeError::type_mismatch(
                format!(
                    "`{op}` expects boolean operands, found {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
                span,
            )),
        },
    }
}

fn eval_numeric(op: BinaryOp, left: Value, right: Value, span: Span) -> RuntimeResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => eval_int(op, a, b, span),
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => Ok(Value::String(a + &b)),
        (left, right) => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => eval_float(op, a, b, span),
            _ => Err(RuntimeError::type_mismatch(
                format!(
                    "`{op}` expects numeric operands, found {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
                span,
            )),
        },
    }
}

fn eval_int(op: BinaryOp, a: i64, b: i64, span: Span) -> RuntimeResult<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => {
            return Err(RuntimeError::DivisionByZero { span });
        }
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        BinaryOp::Pow if b < 0 => return Ok(Value::Float((a as f64).powf(b as f64))),
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
        _ => return Err(not_arithmetic(op, span)),
    };
    result.map(Value::Int).ok_or_else(|| RuntimeError::Overflow {
        op: op.to_string(),
        span,
    })
}

fn eval_float(op: BinaryOp, a: f64, b: f64, span: Span) -> RuntimeResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Pow => a.powf(b),
        _ => return Err(not_arithmetic(op, span)),
    };
    Ok(Value::Float(result))
}

fn not_arithmetic(op: BinaryOp, span: Span) -> RuntimeError {
    RuntimeError::type_mismatch(format!("`{op}` is not an arithmetic operator"), span)
}

fn eval_compare<F>(op: BinaryOp, left: &Value, right: &Value, span: Span, cmp: F) -> RuntimeResult<Value>
where
    F: FnOnce(Option<Ordering>) -> bool,
{
    let equality = matches!(op, BinaryOp::Eq | BinaryOp::NotEq);
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) if equality => Some(a.cmp(b)),
        (Value::Nil, Value::Nil) if equality => Some(Ordering::Equal),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(RuntimeError::type_mismatch(
                    format!(
                        "cannot compare {} with {} using `{op}`",
                        left.type_name(),
                        right.type_name()
                    ),
                    span,
                ))
            }
        },
    };
    Ok(Value::Boolean(cmp(ordering)))
}

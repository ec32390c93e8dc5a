use crate::language::span::Span;
use std::fmt;

/// Ordered list of top-level rules and at-rules.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Rule(Rule),
    AtRule(AtRule),
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Rule(rule) => rule.span,
            Item::AtRule(at_rule) => at_rule.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    /// Names starting with `--` declare variables instead of calling rules.
    pub fn is_variable(&self) -> bool {
        self.name.starts_with("--")
    }

    pub fn variable_name(&self) -> &str {
        self.name.strip_prefix("--").unwrap_or(&self.name)
    }
}

/// A rule: callable block keyed by its selector.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub selector: Selector,
    pub body: Vec<Statement>,
    pub span: Span,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.selector.identifier.name
    }
}

/// Rule name plus its positional parameter list, e.g. `add[a][b=1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    pub identifier: Identifier,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: Identifier,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AtRule {
    pub name: Identifier,
    pub parameters: Vec<Expr>,
    /// `None` for the `@name params;` form.
    pub body: Option<Vec<Statement>>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub property: Identifier,
    pub parameters: Vec<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Declaration(Declaration),
    AtRule(AtRule),
    Rule(Rule),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Declaration(decl) => decl.span,
            Statement::AtRule(at_rule) => at_rule.span,
            Statement::Rule(rule) => rule.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Boolean(bool, Span),
    Int(i64, Span),
    Float(f64, Span),
    String(String, Span),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Bare name. Only valid as a callee; evaluating one is an error.
    Identifier(Identifier),
    VariableDeref {
        name: Identifier,
        span: Span,
    },
    FunctionCall {
        callee: Identifier,
        args: Vec<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(
                Literal::Boolean(_, span)
                | Literal::Int(_, span)
                | Literal::Float(_, span)
                | Literal::String(_, span),
            ) => *span,
            Expr::Identifier(ident) => ident.span,
            Expr::VariableDeref { span, .. }
            | Expr::FunctionCall { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. } => *span,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}

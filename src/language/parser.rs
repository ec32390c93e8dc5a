use crate::language::{
    ast::*,
    errors::SyntaxError,
    lexer::Lexer,
    span::Span,
    token::{Token, TokenKind},
};

pub type ParseError = SyntaxError;

/// Parses a complete program. Any lexical or syntax error aborts the whole parse.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(source).parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            peeked: None,
        }
    }

    pub fn parse(mut self) -> Result<Program, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::Eof => break,
                TokenKind::Semi => {
                    self.advance()?;
                }
                TokenKind::At => items.push(Item::AtRule(self.parse_at_rule()?)),
                TokenKind::Identifier(_) => items.push(Item::Rule(self.parse_rule()?)),
                _ => {
                    let token = self.peek()?.clone();
                    return Err(self.unexpected(&token, "a rule or an at-rule"));
                }
            }
        }
        tracing::debug!(items = items.len(), "parsed program");
        Ok(Program { items })
    }

    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        let ident = self.expect_identifier("a rule name")?;
        self.parse_rule_with(ident)
    }

    /// Continues a rule whose name has already been consumed.
    fn parse_rule_with(&mut self, ident: Identifier) -> Result<Rule, ParseError> {
        if ident.is_variable() {
            return Err(ParseError::parse(
                format!("`{}` is a variable name and cannot name a rule", ident.name),
                ident.span,
            )
            .with_help(format!("declare a variable with `{}: value;`", ident.name)));
        }
        let selector = self.parse_selector(ident)?;
        if !self.check(&TokenKind::LBrace)? {
            let token = self.peek()?.clone();
            return Err(self.unexpected(
                &token,
                &format!("`{{` to open the body of rule `{}`", selector.identifier.name),
            ));
        }
        let (body, body_span) = self.parse_declaration_block()?;
        let span = selector.span.union(body_span);
        Ok(Rule {
            selector,
            body,
            span,
        })
    }

    fn parse_selector(&mut self, identifier: Identifier) -> Result<Selector, ParseError> {
        let mut attributes: Vec<Attribute> = Vec::new();
        while self.check(&TokenKind::LBracket)? {
            let open = self.advance()?;
            let name = self.expect_identifier("a parameter name")?;
            if attributes.iter().any(|attr| attr.name.name == name.name) {
                return Err(ParseError::parse(
                    format!(
                        "duplicate parameter `{}` in rule `{}`",
                        name.name, identifier.name
                    ),
                    name.span,
                ));
            }
            let default = if self.matches(&TokenKind::Eq)? {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let close = self.expect(TokenKind::RBracket, "to close the parameter")?;
            attributes.push(Attribute {
                name,
                default,
                span: open.span.union(close.span),
            });
        }
        let span = attributes
            .last()
            .map_or(identifier.span, |attr| identifier.span.union(attr.span));
        Ok(Selector {
            identifier,
            attributes,
            span,
        })
    }

    fn parse_declaration_block(&mut self) -> Result<(Vec<Statement>, Span), ParseError> {
        let open = self.expect(TokenKind::LBrace, "to open a block")?;
        let mut statements = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::RBrace => break,
                TokenKind::Semi => {
                    self.advance()?;
                }
                TokenKind::Eof => {
                    return Err(ParseError::parse("unclosed block", open.span)
                        .with_help("add a matching `}`"));
                }
                _ => statements.push(self.parse_statement()?),
            }
        }
        let close = self.advance()?;
        Ok((statements, open.span.union(close.span)))
    }

    /// `@` starts an at-rule; `name:` starts a declaration; any other name
    /// starts a nested rule.
    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_kind()? {
            TokenKind::At => Ok(Statement::AtRule(self.parse_at_rule()?)),
            TokenKind::Identifier(_) => {
                let ident = self.expect_identifier("a declaration")?;
                if self.check(&TokenKind::Colon)? {
                    Ok(Statement::Declaration(self.parse_declaration(ident)?))
                } else {
                    Ok(Statement::Rule(self.parse_rule_with(ident)?))
                }
            }
            _ => {
                let token = self.peek()?.clone();
                Err(self.unexpected(&token, "a declaration, a nested rule or an at-rule"))
            }
        }
    }

    fn parse_declaration(&mut self, property: Identifier) -> Result<Declaration, ParseError> {
        self.expect(TokenKind::Colon, "after the property name")?;
        let parameters = if property.is_variable() {
            vec![self.parse_expression()?]
        } else {
            self.parse_value_list()?
        };
        let context = if property.is_variable() {
            format!("after the value of `{}`", property.name)
        } else {
            format!("to end the `{}` declaration", property.name)
        };
        let end = self.expect(TokenKind::Semi, &context)?;
        let span = property.span.union(end.span);
        Ok(Declaration {
            property,
            parameters,
            span,
        })
    }

    fn parse_value_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut values = Vec::new();
        while starts_value(&self.peek_kind()?) {
            values.push(self.parse_expression()?);
        }
        Ok(values)
    }

    fn parse_at_rule(&mut self) -> Result<AtRule, ParseError> {
        let at = self.expect(TokenKind::At, "")?;
        let name = self.expect_identifier("an at-rule name after `@`")?;
        let mut parameters = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::LBrace | TokenKind::Semi => break,
                TokenKind::Eof => {
                    let token = self.peek()?.clone();
                    return Err(self.unexpected(
                        &token,
                        &format!("`{{` or `;` to finish `@{}`", name.name),
                    ));
                }
                _ => parameters.push(self.parse_expression()?),
            }
        }
        if self.check(&TokenKind::LBrace)? {
            let (body, body_span) = self.parse_declaration_block()?;
            Ok(AtRule {
                name,
                parameters,
                body: Some(body),
                span: at.span.union(body_span),
            })
        } else {
            let end = self.advance()?;
            Ok(AtRule {
                name,
                parameters,
                body: None,
                span: at.span.union(end.span),
            })
        }
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some((op, prec)) = self.current_binary_op()? {
            if prec < min_prec {
                break;
            }
            self.advance()?;
            // `^` is right associative
            let next_prec = if op == BinaryOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary(next_prec)?;
            let span = left.span().union(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind()? {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        let start = self.advance()?.span;
        let expr = self.parse_unary()?;
        let span = start.union(expr.span());
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
            span,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Int(value) => {
                self.advance()?;
                Ok(Expr::Literal(Literal::Int(value, token.span)))
            }
            TokenKind::Float(value) => {
                self.advance()?;
                Ok(Expr::Literal(Literal::Float(value, token.span)))
            }
            TokenKind::String(value) => {
                self.advance()?;
                Ok(Expr::Literal(Literal::String(value, token.span)))
            }
            TokenKind::Boolean(value) => {
                self.advance()?;
                Ok(Expr::Literal(Literal::Boolean(value, token.span)))
            }
            TokenKind::Identifier(_) => {
                let ident = self.expect_identifier("a value")?;
                if self.check(&TokenKind::LParen)? {
                    self.parse_function_call(ident)
                } else {
                    Ok(Expr::Identifier(ident))
                }
            }
            TokenKind::Dollar => {
                self.advance()?;
                let name = self.expect_identifier("a variable name after `$`")?;
                let span = token.span.union(name.span);
                Ok(Expr::VariableDeref { name, span })
            }
            TokenKind::LParen => {
                self.advance()?;
                let mut expr = self.parse_expression()?;
                let close = self.expect(TokenKind::RParen, "to close the group")?;
                set_span(&mut expr, token.span.union(close.span));
                Ok(expr)
            }
            _ => Err(self.unexpected(&token, "a value")),
        }
    }

    fn parse_function_call(&mut self, callee: Identifier) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen, "to start the argument list")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen)? {
            loop {
                args.push(self.parse_expression()?);
                if self.matches(&TokenKind::Comma)? {
                    if self.check(&TokenKind::RParen)? {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        let close = self.expect(
            TokenKind::RParen,
            &format!("to close the call to `{}`", callee.name),
        )?;
        let span = callee.span.union(close.span);
        Ok(Expr::FunctionCall { callee, args, span })
    }

    fn current_binary_op(&mut self) -> Result<Option<(BinaryOp, u8)>, ParseError> {
        Ok(match self.peek_kind()? {
            TokenKind::PipePipe => Some((BinaryOp::Or, 1)),
            TokenKind::AmpersandAmpersand => Some((BinaryOp::And, 2)),
            TokenKind::EqEq => Some((BinaryOp::Eq, 3)),
            TokenKind::BangEq => Some((BinaryOp::NotEq, 3)),
            TokenKind::Lt => Some((BinaryOp::Lt, 4)),
            TokenKind::LtEq => Some((BinaryOp::LtEq, 4)),
            TokenKind::Gt => Some((BinaryOp::Gt, 4)),
            TokenKind::GtEq => Some((BinaryOp::GtEq, 4)),
            TokenKind::Plus => Some((BinaryOp::Add, 5)),
            TokenKind::Minus => Some((BinaryOp::Sub, 5)),
            TokenKind::Star => Some((BinaryOp::Mul, 6)),
            TokenKind::Slash => Some((BinaryOp::Div, 6)),
            TokenKind::Percent => Some((BinaryOp::Rem, 6)),
            TokenKind::Caret => Some((BinaryOp::Pow, 7)),
            _ => None,
        })
    }

    fn expect_identifier(&mut self, what: &str) -> Result<Identifier, ParseError> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Identifier(name) => {
                self.advance()?;
                Ok(Identifier {
                    name,
                    span: token.span,
                })
            }
            _ => Err(self.unexpected(&token, what)),
        }
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token, ParseError> {
        let token = self.peek()?.clone();
        if token.kind == kind {
            self.advance()
        } else {
            let expected = if context.is_empty() {
                format!("`{}`", kind.symbol())
            } else {
                format!("`{}` {context}", kind.symbol())
            };
            Err(self.unexpected(&token, &expected))
        }
    }

    fn matches(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.check(kind)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn check(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        Ok(&self.peek()?.kind == kind)
    }

    fn peek_kind(&mut self) -> Result<TokenKind, ParseError> {
        Ok(self.peek()?.kind.clone())
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    fn unexpected(&self, token: &Token, expected: &str) -> ParseError {
        ParseError::parse(
            format!("expected {expected}, found {}", token.kind.describe()),
            token.span,
        )
    }
}

fn starts_value(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier(_)
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::String(_)
            | TokenKind::Boolean(_)
            | TokenKind::Dollar
            | TokenKind::LParen
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Bang
    )
}

/// Widens a parenthesised expression to cover its parentheses.
fn set_span(expr: &mut Expr, new_span: Span) {
    match expr {
        Expr::Literal(
            Literal::Boolean(_, span)
            | Literal::Int(_, span)
            | Literal::Float(_, span)
            | Literal::String(_, span),
        ) => *span = new_span,
        Expr::Identifier(ident) => ident.span = new_span,
        Expr::VariableDeref { span, .. }
        | Expr::FunctionCall { span, .. }
        | Expr::Unary { span, .. }
        | Expr::Binary { span, .. } => *span = new_span,
    }
}

use crate::language::{
    errors::SyntaxError,
    span::{Location, Span},
    token::{Token, TokenKind},
};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit0, digit1, satisfy},
    combinator::{opt, recognize},
    sequence::{pair, tuple},
    IResult,
};

pub type LexError = SyntaxError;

/// Tokenizes the whole source, ending with (and including) the `Eof` token.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// Pull-based lexer. Holds no token buffer; the parser owns the single
/// token of lookahead.
#[derive(Clone, Debug)]
pub struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    col: usize,
    finished: bool,
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(tag("--")),
        satisfy(is_ident_start),
        take_while(is_ident_continue),
    )))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ))(input)
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            col: 1,
            finished: false,
        }
    }

    /// Returns the next token. Once input is exhausted every call yields `Eof`.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let start = self.location();
        let Some(ch) = self.current() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::point(start),
            });
        };

        match ch {
            ch if is_ident_start(ch) => self.lex_identifier(start),
            '-' if self.peek() == Some('-') => self.lex_identifier(start),
            ch if ch.is_ascii_digit() => self.lex_number(start),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.lex_number(start),
            '"' | '\'' => self.lex_string(start, ch),
            _ => self.lex_symbol(start, ch),
        }
    }

    fn location(&self) -> Location {
        Location::new(self.offset, self.line, self.col)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.offset += ch.len_utf8();
        match ch {
            '\r' => {
                if self.current() == Some('\n') {
                    self.offset += 1;
                }
                self.line += 1;
                self.col = 1;
            }
            '\n' => {
                self.line += 1;
                self.col = 1;
            }
            _ => self.col += 1,
        }
        Some(ch)
    }

    fn bump_str(&mut self, text: &str) {
        let end = self.offset + text.len();
        while self.offset < end {
            if self.bump().is_none() {
                break;
            }
        }
    }

    fn span_from(&self, start: Location) -> Span {
        Span::new(start, self.location())
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.current() {
                Some(' ' | '\t' | '\r' | '\n' | '\x0C') => {
                    self.bump();
                }
                Some('/') if self.peek() == Some('*') => self.eat_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn eat_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.location();
        self.bump();
        self.bump();
        while let Some(ch) = self.current() {
            if ch == '*' && self.peek() == Some('/') {
                self.bump();
                self.bump();
                return Ok(());
            }
            self.bump();
        }
        Err(LexError::lex(
            "unterminated block comment",
            self.span_from(start),
        )
        .with_help("close the comment with `*/`"))
    }

    fn lex_identifier(&mut self, start: Location) -> Result<Token, LexError> {
        let text = match identifier(self.rest()) {
            Ok((_, text)) => text,
            Err(_) => {
                self.bump();
                self.bump();
                return Err(LexError::lex(
                    "expected a name after `--`",
                    self.span_from(start),
                )
                .with_help("variable names look like `--name`"));
            }
        };
        self.bump_str(text);
        let kind = match text {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            _ => TokenKind::Identifier(text.to_string()),
        };
        Ok(Token {
            kind,
            span: self.span_from(start),
        })
    }

    fn lex_number(&mut self, start: Location) -> Result<Token, LexError> {
        let text = match number(self.rest()) {
            Ok((_, text)) => text,
            Err(_) => {
                self.bump();
                return Err(LexError::lex("invalid number", self.span_from(start)));
            }
        };
        self.bump_str(text);
        let is_float = text.contains('.');

        if is_float && self.current() == Some('.') {
            self.bump();
            return Err(LexError::lex(
                "unexpected second `.` in number literal",
                self.span_from(start),
            )
            .with_help("a number may contain at most one `.`"));
        }

        let span = self.span_from(start);
        let kind = if is_float {
            match text.parse::<f64>() {
                Ok(value) => TokenKind::Float(value),
                Err(_) => return Err(LexError::lex("invalid float literal", span)),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => TokenKind::Int(value),
                Err(_) => {
                    return Err(LexError::lex(
                        format!("integer literal `{text}` does not fit in 64 bits"),
                        span,
                    )
                    .with_help(format!(
                        "integers range from {} to {}; write the minimum as `-{} - 1`",
                        i64::MIN,
                        i64::MAX,
                        i64::MAX
                    )))
                }
            }
        };
        Ok(Token { kind, span })
    }

    fn lex_string(&mut self, start: Location, quote: char) -> Result<Token, LexError> {
        self.bump();
        let mut value = String::new();
        while let Some(ch) = self.current() {
            match ch {
                ch if ch == quote => {
                    self.bump();
                    return Ok(Token {
                        kind: TokenKind::String(value),
                        span: self.span_from(start),
                    });
                }
                '\\' => {
                    self.bump();
                    let Some(escaped) = self.bump() else {
                        break;
                    };
                    value.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'f' => '\x0C',
                        other => other,
                    });
                }
                _ => {
                    value.push(ch);
                    self.bump();
                }
            }
        }
        Err(LexError::lex(
            "unterminated string literal",
            self.span_from(start),
        )
        .with_help(format!("add a closing {quote}")))
    }

    fn lex_symbol(&mut self, start: Location, ch: char) -> Result<Token, LexError> {
        self.bump();
        let next = self.current();
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '#' => TokenKind::Hash,
            '@' => TokenKind::At,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semi,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '$' => TokenKind::Dollar,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '!' => self.pair_or(next, '=', TokenKind::BangEq, TokenKind::Bang),
            '=' => self.pair_or(next, '=', TokenKind::EqEq, TokenKind::Eq),
            '<' => self.pair_or(next, '=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.pair_or(next, '=', TokenKind::GtEq, TokenKind::Gt),
            '&' | '|' => {
                if next == Some(ch) {
                    self.bump();
                    if ch == '&' {
                        TokenKind::AmpersandAmpersand
                    } else {
                        TokenKind::PipePipe
                    }
                } else {
                    return Err(LexError::lex(
                        format!("unexpected character `{ch}`, did you mean `{ch}{ch}`?"),
                        self.span_from(start),
                    )
                    .with_help(format!("logical operators are written `{ch}{ch}`")));
                }
            }
            other => {
                return Err(LexError::lex(
                    format!("unexpected character `{other}`"),
                    self.span_from(start),
                ));
            }
        };
        Ok(Token {
            kind,
            span: self.span_from(start),
        })
    }

    fn pair_or(
        &mut self,
        next: Option<char>,
        second: char,
        paired: TokenKind,
        single: TokenKind,
    ) -> TokenKind {
        if next == Some(second) {
            self.bump();
            paired
        } else {
            single
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    /// Yields tokens up to and including `Eof`, or up to the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        if matches!(
            result,
            Ok(Token {
                kind: TokenKind::Eof,
                ..
            }) | Err(_)
        ) {
            self.finished = true;
        }
        Some(result)
    }
}

//! Parses the expression inside a directive.
//!
//! The grammar, loosest binding first:
//!
//! ```text
//! ternary  = binary [ "?" ternary ":" ternary ]
//! binary   = unary { op unary }      (precedence climbing)
//! unary    = ( "!" | "-" | "+" ) unary | postfix
//! postfix  = primary { "[" key "]" | "->" ident }
//! primary  = number | string | true | false | null
//!          | VARIABLE | ident "(" args ")" | "(" ternary ")"
//! ```

use crate::compile::bind::{is_keyword, is_variable, Binder};
use crate::types::expr::{
    Binary, BinaryOp, Call, Expr, Index, Literal, Member, Ternary, Unary, UnaryOp, Var,
};
use crate::types::span::Span;
use crate::{Error, Result, Value};

/// Parse the expression at `span` in `source`, binding variables as they are
/// found.
pub fn parse(source: &str, span: Span, binder: &mut Binder) -> Result<Expr> {
    let mut parser = Parser::new(source, span, binder);
    let expr = parser.parse_expr()?;
    match parser.next()? {
        None => Ok(expr),
        Some((tk, sp)) => Err(parser.err_unexpected_token("end of expression", tk, sp)),
    }
}

/// Parse a `FOREACH` loop variable, which must be a bare variable name.
pub fn parse_loop_var(source: &str, span: Span, binder: &mut Binder) -> Result<usize> {
    let raw = &source[span];
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::syntax("expected loop variable", source, span));
    }
    if !is_variable(name) || is_keyword(name) {
        return Err(Error::syntax(
            format!("expected loop variable, found `{name}`"),
            source,
            span,
        ));
    }
    Ok(binder.bind(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Ident,
    Number,
    String,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Arrow,
    Question,
    Colon,
    Not,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    Identical,
    NotIdentical,
    AndAnd,
    OrOr,
}

impl Token {
    fn human(&self) -> &'static str {
        match self {
            Self::Ident => "identifier",
            Self::Number => "number",
            Self::String => "string",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Comma => "`,`",
            Self::Arrow => "`->`",
            Self::Question => "`?`",
            Self::Colon => "`:`",
            Self::Not => "`!`",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::Percent => "`%`",
            Self::Dot => "`.`",
            Self::Lt => "`<`",
            Self::Le => "`<=`",
            Self::Gt => "`>`",
            Self::Ge => "`>=`",
            Self::EqEq => "`==`",
            Self::NotEq => "`!=`",
            Self::Identical => "`===`",
            Self::NotIdentical => "`!==`",
            Self::AndAnd => "`&&`",
            Self::OrOr => "`||`",
        }
    }
}

/// Splits an expression region into tokens.
struct Lexer<'source> {
    source: &'source str,
    cursor: usize,
    end: usize,
}

impl<'source> Lexer<'source> {
    fn next(&mut self) -> Result<Option<(Token, Span)>> {
        let region = &self.source[..self.end];
        let rest = &region[self.cursor..];
        let ws = rest.len() - rest.trim_start().len();
        let i = self.cursor + ws;
        let rest = &region[i..];

        let mut chars = rest.chars();
        let c = match chars.next() {
            Some(c) => c,
            None => {
                self.cursor = i;
                return Ok(None);
            }
        };

        let two = |a: char, b: char| rest.starts_with(a) && rest[a.len_utf8()..].starts_with(b);

        let (tk, len) = match c {
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            ',' => (Token::Comma, 1),
            '?' => (Token::Question, 1),
            ':' => (Token::Colon, 1),
            '+' => (Token::Plus, 1),
            '*' => (Token::Star, 1),
            '/' => (Token::Slash, 1),
            '%' => (Token::Percent, 1),
            '.' => (Token::Dot, 1),
            '-' if two('-', '>') => (Token::Arrow, 2),
            '-' => (Token::Minus, 1),
            '!' if rest.starts_with("!==") => (Token::NotIdentical, 3),
            '!' if two('!', '=') => (Token::NotEq, 2),
            '!' => (Token::Not, 1),
            '=' if rest.starts_with("===") => (Token::Identical, 3),
            '=' if two('=', '=') => (Token::EqEq, 2),
            '<' if two('<', '>') => (Token::NotEq, 2),
            '<' if two('<', '=') => (Token::Le, 2),
            '<' => (Token::Lt, 1),
            '>' if two('>', '=') => (Token::Ge, 2),
            '>' => (Token::Gt, 1),
            '&' if two('&', '&') => (Token::AndAnd, 2),
            '|' if two('|', '|') => (Token::OrOr, 2),
            '\'' | '"' => (Token::String, self.lex_string(i, c)?),
            c if c.is_ascii_digit() => (Token::Number, lex_number(rest)),
            c if is_ident_start(c) => {
                let len = rest
                    .char_indices()
                    .find(|(_, c)| !is_ident_continue(*c))
                    .map(|(j, _)| j)
                    .unwrap_or(rest.len());
                (Token::Ident, len)
            }
            c => {
                let msg = match c {
                    '=' => "unexpected `=`, assignment is not supported".to_owned(),
                    c => format!("unexpected character `{c}`"),
                };
                return Err(Error::syntax(msg, self.source, i..i + c.len_utf8()));
            }
        };

        self.cursor = i + len;
        Ok(Some((tk, Span::from(i..i + len))))
    }

    /// Returns the length of the quoted string starting at `i`.
    fn lex_string(&self, i: usize, quote: char) -> Result<usize> {
        let rest = &self.source[i + 1..self.end];
        let mut escaped = false;
        for (j, c) in rest.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                c if c == quote => return Ok(j + 2),
                _ => {}
            }
        }
        Err(Error::syntax(
            "unclosed string",
            self.source,
            i..self.end,
        ))
    }
}

/// Returns the length of the number at the start of `rest`.
fn lex_number(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut len = digits(0);
    if bytes.get(len) == Some(&b'.') && bytes.get(len + 1).map_or(false, u8::is_ascii_digit) {
        len += 1 + digits(len + 1);
    }
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(len + 1), Some(b'+' | b'-')));
        let exp = digits(len + 1 + sign);
        if exp > 0 {
            len += 1 + sign + exp;
        }
    }
    len
}

#[cfg(feature = "unicode")]
fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

#[cfg(feature = "unicode")]
fn is_ident_continue(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

#[cfg(not(feature = "unicode"))]
fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// A recursive descent parser over the tokens of a single expression.
struct Parser<'a, 'source> {
    tokens: Lexer<'source>,

    /// Remember a peeked value, even if it was `None`
    peeked: Option<Option<(Token, Span)>>,

    binder: &'a mut Binder,

    /// The region being parsed, used for errors at the end of input.
    span: Span,
}

impl<'a, 'source> Parser<'a, 'source> {
    fn new(source: &'source str, span: Span, binder: &'a mut Binder) -> Self {
        Self {
            tokens: Lexer {
                source,
                cursor: span.m,
                end: span.n,
            },
            peeked: None,
            binder,
            span,
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_ternary()
    }

    /// Parses a ternary conditional.
    ///
    ///   COUNT > 1 ? 'items' : 'item'
    ///
    fn parse_ternary(&mut self) -> Result<Expr> {
        let cond = self.parse_binary(1)?;
        if !self.is_next(Token::Question)? {
            return Ok(cond);
        }
        self.expect(Token::Question)?;
        let then = self.parse_ternary()?;
        self.expect(Token::Colon)?;
        let otherwise = self.parse_ternary()?;
        let span = cond.span().combine(otherwise.span());
        Ok(Expr::Ternary(Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
            span,
        }))
    }

    /// Parses binary operators with at least the given precedence.
    ///
    ///   A . ' ' . B
    ///
    ///   COUNT + 1 >= LIMIT && !HIDDEN
    ///
    fn parse_binary(&mut self, min: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_binary_op()? {
                Some(op) if op.precedence() >= min => op,
                _ => break,
            };
            self.next()?;
            let rhs = self.parse_binary(op.precedence() + 1)?;
            let span = lhs.span().combine(rhs.span());
            lhs = Expr::Binary(Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            });
        }
        Ok(lhs)
    }

    fn peek_binary_op(&mut self) -> Result<Option<BinaryOp>> {
        let source = self.source();
        let op = match self.peek()? {
            Some((tk, span)) => match tk {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                Token::Dot => BinaryOp::Concat,
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::Ne,
                Token::Identical => BinaryOp::Identical,
                Token::NotIdentical => BinaryOp::NotIdentical,
                Token::AndAnd => BinaryOp::And,
                Token::OrOr => BinaryOp::Or,
                Token::Ident if &source[span] == "and" => BinaryOp::And,
                Token::Ident if &source[span] == "or" => BinaryOp::Or,
                _ => return Ok(None),
            },
            None => return Ok(None),
        };
        Ok(Some(op))
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek()? {
            Some((Token::Not, _)) => UnaryOp::Not,
            Some((Token::Minus, _)) => UnaryOp::Neg,
            Some((Token::Plus, _)) => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        let (_, begin) = self.parse()?;
        let operand = self.parse_unary()?;
        let span = begin.combine(operand.span());

        // Fold signed number literals.
        if let Expr::Literal(Literal { value, .. }) = &operand {
            let folded = match (op, value) {
                (UnaryOp::Neg, Value::Integer(i)) => i.checked_neg().map(Value::Integer),
                (UnaryOp::Neg, Value::Float(f)) => Some(Value::Float(-f)),
                (UnaryOp::Plus, Value::Integer(_) | Value::Float(_)) => Some(value.clone()),
                _ => None,
            };
            if let Some(value) = folded {
                return Ok(Expr::Literal(Literal { value, span }));
            }
        }

        Ok(Expr::Unary(Unary {
            op,
            operand: Box::new(operand),
            span,
        }))
    }

    /// Parses index and member access.
    ///
    ///   ROW[id]
    ///
    ///   ITEMS[INDEX + 1]
    ///
    ///   AUTHOR->name
    ///
    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek()? {
                Some((Token::LBracket, _)) => {
                    let (_, open) = self.parse()?;
                    let key = self.parse_index_key(open)?;
                    let close = self.expect(Token::RBracket)?;
                    let span = expr.span().combine(close);
                    expr = Expr::Index(Index {
                        receiver: Box::new(expr),
                        key: Box::new(key),
                        span,
                    });
                }
                Some((Token::Arrow, _)) => {
                    self.parse()?;
                    let name = self.expect(Token::Ident)?;
                    let span = expr.span().combine(name);
                    expr = Expr::Member(Member {
                        receiver: Box::new(expr),
                        name: self.source()[name].to_owned(),
                        span,
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Parses the key inside brackets.
    ///
    /// A bare word that is not a variable, e.g. `[id]` or `[0]`, is a literal
    /// key. Anything else is an expression.
    fn parse_index_key(&mut self, open: Span) -> Result<Expr> {
        debug_assert!(self.peeked.is_none());
        let source = self.source();
        let rest = &source[open.n..self.span.n];
        if let Some(close) = rest.find(']') {
            let word = rest[..close].trim();
            let is_word = !word.is_empty()
                && word.bytes().all(|b| b == b'_' || b.is_ascii_alphanumeric());
            if is_word && !is_variable(word) {
                let m = open.n + (rest.len() - rest.trim_start().len());
                let span = Span::from(m..m + word.len());
                self.tokens.cursor = span.n;
                return Ok(Expr::Literal(Literal {
                    value: Value::from(word),
                    span,
                }));
            }
        }
        self.parse_expr()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let (tk, span) = self.parse()?;
        let expr = match tk {
            Token::Number => self.parse_literal_number(span)?,
            Token::String => self.parse_literal_string(span)?,
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(Token::RParen)?;
                expr
            }
            Token::Ident => self.parse_ident(span)?,
            tk => return Err(self.err_unexpected_token("expression", tk, span)),
        };
        Ok(expr)
    }

    /// Parses a variable, a keyword literal, or a function call.
    fn parse_ident(&mut self, span: Span) -> Result<Expr> {
        let source = self.source();
        let name = &source[span];

        if is_variable(name) {
            if is_keyword(name) {
                return Err(Error::syntax(
                    format!("unexpected keyword `{name}`"),
                    source,
                    span,
                ));
            }
            let slot = self.binder.bind(name);
            return Ok(Expr::Var(Var { slot, span }));
        }

        if self.is_next(Token::LParen)? {
            return self.parse_call(span);
        }

        let value = if name.eq_ignore_ascii_case("true") {
            Value::Bool(true)
        } else if name.eq_ignore_ascii_case("false") {
            Value::Bool(false)
        } else if name.eq_ignore_ascii_case("null") {
            Value::None
        } else {
            return Err(Error::syntax(
                format!("unknown identifier `{name}`, template variables must be uppercase"),
                source,
                span,
            ));
        };
        Ok(Expr::Literal(Literal { value, span }))
    }

    /// Parses function call arguments.
    ///
    ///   implode(', ', TAGS)
    ///
    fn parse_call(&mut self, name: Span) -> Result<Expr> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        let close = loop {
            if let Some((Token::RParen, _)) = self.peek()? {
                break self.expect(Token::RParen)?;
            }
            args.push(self.parse_expr()?);
            match self.parse()? {
                (Token::Comma, _) => continue,
                (Token::RParen, span) => break span,
                (tk, span) => return Err(self.err_unexpected_token("`,` or `)`", tk, span)),
            }
        };
        Ok(Expr::Call(Call {
            name: self.source()[name].to_owned(),
            args,
            span: name.combine(close),
        }))
    }

    fn parse_literal_number(&self, span: Span) -> Result<Expr> {
        let raw = &self.source()[span];
        let value = if raw.contains(['.', 'e', 'E']) {
            raw.parse().map(Value::Float).ok()
        } else {
            // Integer literals out of range become floats.
            raw.parse()
                .map(Value::Integer)
                .or_else(|_| raw.parse().map(Value::Float))
                .ok()
        };
        match value {
            Some(value) => Ok(Expr::Literal(Literal { value, span })),
            None => Err(Error::syntax("invalid number literal", self.source(), span)),
        }
    }

    /// Parses a single or double quoted string.
    ///
    /// Single quoted strings only support the `\'` and `\\` escapes. Double
    /// quoted strings support the common escape characters.
    fn parse_literal_string(&self, span: Span) -> Result<Expr> {
        let raw = &self.source()[span];
        let quote = raw.as_bytes()[0];
        let inner = &raw[1..raw.len() - 1];

        let mut string = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                string.push(c);
                continue;
            }
            match (quote, chars.next()) {
                (b'\'', Some(c @ ('\'' | '\\'))) => string.push(c),
                (b'"', Some(c @ ('"' | '\\' | '$'))) => string.push(c),
                (b'"', Some('n')) => string.push('\n'),
                (b'"', Some('r')) => string.push('\r'),
                (b'"', Some('t')) => string.push('\t'),
                (b'"', Some('v')) => string.push('\u{0b}'),
                (b'"', Some('e')) => string.push('\u{1b}'),
                (b'"', Some('f')) => string.push('\u{0c}'),
                (_, Some(c)) => {
                    string.push('\\');
                    string.push(c);
                }
                (_, None) => string.push('\\'),
            }
        }

        Ok(Expr::Literal(Literal {
            value: Value::String(string),
            span,
        }))
    }

    fn is_next(&mut self, token: Token) -> Result<bool> {
        Ok(matches!(self.peek()?, Some((tk, _)) if tk == token))
    }

    fn expect(&mut self, exp: Token) -> Result<Span> {
        match self.next()? {
            Some((tk, span)) if tk == exp => Ok(span),
            Some((tk, span)) => Err(self.err_unexpected_token(exp.human(), tk, span)),
            None => Err(self.err_unexpected_eoi(exp.human())),
        }
    }

    fn parse(&mut self) -> Result<(Token, Span)> {
        match self.next()? {
            Some(next) => Ok(next),
            None => Err(self.err_unexpected_eoi("expression")),
        }
    }

    fn peek(&mut self) -> Result<Option<(Token, Span)>> {
        if let Some(peeked) = self.peeked {
            return Ok(peeked);
        }
        let peeked = self.tokens.next()?;
        self.peeked = Some(peeked);
        Ok(peeked)
    }

    fn next(&mut self) -> Result<Option<(Token, Span)>> {
        match self.peeked.take() {
            Some(peeked) => Ok(peeked),
            None => self.tokens.next(),
        }
    }

    fn err_unexpected_token(&self, exp: &str, got: Token, span: Span) -> Error {
        Error::syntax(
            format!("expected {exp}, found {}", got.human()),
            self.source(),
            span,
        )
    }

    fn err_unexpected_eoi(&self, exp: &str) -> Error {
        let Span { m, n } = self.span;
        let last = self.source()[m..n]
            .char_indices()
            .next_back()
            .map_or(n, |(i, _)| m + i);
        let span = Span::from(last..n);
        Error::syntax(
            format!("expected {exp}, found end of directive"),
            self.source(),
            span,
        )
    }

    fn source(&self) -> &'source str {
        self.tokens.source
    }
}

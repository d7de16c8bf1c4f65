//! Expression evaluation for template directives.
//!
//! Conditions (`<x-if condition="...">`), dynamic attributes (`x-href="..."`)
//! and variable references (`<x-var name="...">`) all carry expression text
//! that is evaluated against a per-expansion [`Scope`].
//!
//! ## Grammar
//!
//! The grammar is deliberately closed; there is no general-purpose code
//! execution behind it:
//!
//! - literals: integers, floats, `'single'`- or `"double"`-quoted strings,
//!   `true`, `false`, `null`
//! - identifiers, resolved against the scope (`title`, `static_path`, ...)
//! - property access on nested mappings (`author.name`)
//! - unary `!` and `-`
//! - binary `+ - * / %`, comparisons, `&&` and `||` (short-circuiting),
//!   with the usual precedence; `+` concatenates when both operands are
//!   strings
//! - calls to whitelisted host helpers (see below)
//!
//! ## Host helpers
//!
//! Two helpers are available to every expression on top of the caller's
//! scope: `defined(name)` tests scope membership without failing on the
//! lookup, and `join(parts...)` joins path segments with `/`. Templates are
//! trusted input, but the helper whitelist is still the full extent of what
//! expression authors can reach; growing it extends that trust boundary.
//!
//! ## Failure semantics
//!
//! Referencing a name the scope does not contain is an error, distinct from
//! looking up a name bound to `null` (which stringifies as `undefined`).
//! Every [`EvalError`] carries the raw expression text and a rendering of
//! the full scope; this is the only place diagnostic context is attached.

use serde_json::Value;
use thiserror::Error;

/// Variable scope for one expansion call: name to value mapping.
pub type Scope = serde_json::Map<String, Value>;

/// Expression failure, carrying the expression text and the scope it was
/// evaluated against.
#[derive(Error, Debug)]
#[error("{kind} (expression: `{expression}`, scope: {scope})")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub expression: String,
    pub scope: String,
}

#[derive(Error, Debug)]
pub enum EvalErrorKind {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("undefined variable `{0}`")]
    Undefined(String),
    #[error("unknown property `{0}`")]
    UnknownProperty(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("type error: {0}")]
    Type(String),
}

/// Evaluate `expression` against `scope`.
pub fn evaluate(expression: &str, scope: &Scope) -> Result<Value, EvalError> {
    let result = tokenize(expression)
        .and_then(|tokens| parse(&tokens))
        .and_then(|expr| eval(&expr, scope));
    result.map_err(|kind| EvalError {
        kind,
        expression: expression.to_string(),
        scope: render_scope(scope),
    })
}

/// Truthiness of a value, used by the conditional pass.
///
/// `null`, `false`, zero and the empty string are falsy; everything else
/// (including empty arrays and mappings) is truthy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Literal text representation of a value.
///
/// `null` renders as `undefined`; arrays and mappings fall back to their
/// JSON rendering.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => "undefined".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format!("{}", n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_scope(scope: &Scope) -> String {
    serde_json::to_string(&Value::Object(scope.clone()))
        .unwrap_or_else(|_| "<unprintable scope>".to_string())
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    LParen,
    RParen,
    Comma,
    Dot,
}

fn tokenize(input: &str) -> Result<Vec<Token>, EvalErrorKind> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Token::AndAnd);
                    i += 2;
                } else {
                    return Err(EvalErrorKind::Parse("expected `&&`".to_string()));
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Token::OrOr);
                    i += 2;
                } else {
                    return Err(EvalErrorKind::Parse("expected `||`".to_string()));
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::EqEq);
                    i += 2;
                } else {
                    return Err(EvalErrorKind::Parse(
                        "assignment is not supported, use `==`".to_string(),
                    ));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::NotEq);
                    i += 2;
                } else {
                    tokens.push(Token::Bang);
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::LtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::GtEq);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(EvalErrorKind::Parse(
                                "unterminated string literal".to_string(),
                            ));
                        }
                        Some('\\') => {
                            match chars.get(i + 1) {
                                Some(&escaped) => text.push(escaped),
                                None => {
                                    return Err(EvalErrorKind::Parse(
                                        "unterminated string literal".to_string(),
                                    ));
                                }
                            }
                            i += 2;
                        }
                        Some(&ch) if ch == quote => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            text.push(ch);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token::Str(text));
            }
            '0'..='9' => {
                let start = i;
                let mut is_float = false;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                // A dot counts as a fraction only when digits follow; `1.x`
                // stays Int(1), Dot, Ident(x) so numbers never swallow
                // property access.
                if chars.get(i) == Some(&'.')
                    && chars.get(i + 1).map(|c| c.is_ascii_digit()) == Some(true)
                {
                    is_float = true;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                if is_float {
                    let f = text
                        .parse::<f64>()
                        .map_err(|e| EvalErrorKind::Parse(format!("bad number `{text}`: {e}")))?;
                    tokens.push(Token::Float(f));
                } else {
                    let n = text
                        .parse::<i64>()
                        .map_err(|e| EvalErrorKind::Parse(format!("bad number `{text}`: {e}")))?;
                    tokens.push(Token::Int(n));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(EvalErrorKind::Parse(format!(
                    "unexpected character `{other}`"
                )));
            }
        }
    }

    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug)]
enum Expr {
    Lit(Value),
    Ident(String),
    Property(Box<Expr>, String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

struct TokenStream<'a> {
    tokens: &'a [Token],
    pos: usize,
}

fn parse(tokens: &[Token]) -> Result<Expr, EvalErrorKind> {
    let mut stream = TokenStream { tokens, pos: 0 };
    let expr = stream.parse_or()?;
    if stream.pos != tokens.len() {
        return Err(EvalErrorKind::Parse(format!(
            "unexpected trailing token {:?}",
            tokens[stream.pos]
        )));
    }
    Ok(expr)
}

impl TokenStream<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, EvalErrorKind> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalErrorKind> {
        let mut lhs = self.parse_comparison()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalErrorKind> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinOp::Eq,
                Some(Token::NotEq) => BinOp::Ne,
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::LtEq) => BinOp::Le,
                Some(Token::Gt) => BinOp::Gt,
                Some(Token::GtEq) => BinOp::Ge,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalErrorKind> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalErrorKind> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalErrorKind> {
        if self.eat(&Token::Bang) {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalErrorKind> {
        let mut expr = self.parse_primary()?;
        while self.eat(&Token::Dot) {
            match self.peek() {
                Some(Token::Ident(name)) => {
                    let name = name.clone();
                    self.pos += 1;
                    expr = Expr::Property(Box::new(expr), name);
                }
                other => {
                    return Err(EvalErrorKind::Parse(format!(
                        "expected property name after `.`, found {other:?}"
                    )));
                }
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalErrorKind> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| EvalErrorKind::Parse("unexpected end of expression".to_string()))?;
        self.pos += 1;
        match token {
            Token::Int(n) => Ok(Expr::Lit(Value::from(n))),
            Token::Float(f) => Ok(Expr::Lit(Value::from(f))),
            Token::Str(s) => Ok(Expr::Lit(Value::String(s))),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Lit(Value::Bool(true))),
                "false" => Ok(Expr::Lit(Value::Bool(false))),
                "null" => Ok(Expr::Lit(Value::Null)),
                _ => {
                    if self.eat(&Token::LParen) {
                        let mut args = Vec::new();
                        if !self.eat(&Token::RParen) {
                            loop {
                                args.push(self.parse_or()?);
                                if self.eat(&Token::Comma) {
                                    continue;
                                }
                                if self.eat(&Token::RParen) {
                                    break;
                                }
                                return Err(EvalErrorKind::Parse(
                                    "expected `,` or `)` in argument list".to_string(),
                                ));
                            }
                        }
                        Ok(Expr::Call(name, args))
                    } else {
                        Ok(Expr::Ident(name))
                    }
                }
            },
            Token::LParen => {
                let expr = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err(EvalErrorKind::Parse("expected `)`".to_string()));
                }
                Ok(expr)
            }
            other => Err(EvalErrorKind::Parse(format!("unexpected token {other:?}"))),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

fn eval(expr: &Expr, scope: &Scope) -> Result<Value, EvalErrorKind> {
    match expr {
        Expr::Lit(value) => Ok(value.clone()),
        Expr::Ident(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| EvalErrorKind::Undefined(name.clone())),
        Expr::Property(base, key) => match eval(base, scope)? {
            Value::Object(map) => map
                .get(key)
                .cloned()
                .ok_or_else(|| EvalErrorKind::UnknownProperty(key.clone())),
            other => Err(EvalErrorKind::Type(format!(
                "cannot access property `{key}` on {}",
                kind_name(&other)
            ))),
        },
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, scope)?))),
        Expr::Neg(inner) => match eval(inner, scope)? {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::from(-i))
                } else {
                    Ok(Value::from(-n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            other => Err(EvalErrorKind::Type(format!(
                "cannot negate {}",
                kind_name(&other)
            ))),
        },
        Expr::Binary(BinOp::And, lhs, rhs) => {
            Ok(Value::Bool(truthy(&eval(lhs, scope)?) && truthy(&eval(rhs, scope)?)))
        }
        Expr::Binary(BinOp::Or, lhs, rhs) => {
            Ok(Value::Bool(truthy(&eval(lhs, scope)?) || truthy(&eval(rhs, scope)?)))
        }
        Expr::Binary(op, lhs, rhs) => apply_binary(*op, eval(lhs, scope)?, eval(rhs, scope)?),
        Expr::Call(name, args) => eval_call(name, args, scope),
    }
}

/// The host helper whitelist. Everything an expression can call lives here.
fn eval_call(name: &str, args: &[Expr], scope: &Scope) -> Result<Value, EvalErrorKind> {
    match name {
        "defined" => {
            if args.len() != 1 {
                return Err(EvalErrorKind::Type(
                    "defined() takes exactly one argument".to_string(),
                ));
            }
            // `defined(author)` must not fail on the lookup it exists to
            // guard, so a bare identifier argument is inspected by name.
            let probe = match &args[0] {
                Expr::Ident(ident) => ident.clone(),
                other => match eval(other, scope)? {
                    Value::String(s) => s,
                    value => {
                        return Err(EvalErrorKind::Type(format!(
                            "defined() expects a name, got {}",
                            kind_name(&value)
                        )));
                    }
                },
            };
            Ok(Value::Bool(scope.contains_key(&probe)))
        }
        "join" => {
            if args.is_empty() {
                return Err(EvalErrorKind::Type(
                    "join() takes at least one argument".to_string(),
                ));
            }
            let mut parts = Vec::with_capacity(args.len());
            for arg in args {
                match eval(arg, scope)? {
                    Value::String(s) => parts.push(s),
                    value => {
                        return Err(EvalErrorKind::Type(format!(
                            "join() arguments must be strings, got {}",
                            kind_name(&value)
                        )));
                    }
                }
            }
            Ok(Value::String(parts.join("/")))
        }
        other => Err(EvalErrorKind::UnknownFunction(other.to_string())),
    }
}

fn apply_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, EvalErrorKind> {
    match op {
        BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinOp::Ne => Ok(Value::Bool(lhs != rhs)),
        BinOp::Add => match (lhs, rhs) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (Value::Number(a), Value::Number(b)) => arithmetic(op, &a, &b),
            (a, b) => Err(EvalErrorKind::Type(format!(
                "cannot add {} and {}",
                kind_name(&a),
                kind_name(&b)
            ))),
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => arithmetic(op, &a, &b),
            (a, b) => Err(EvalErrorKind::Type(format!(
                "arithmetic needs numbers, got {} and {}",
                kind_name(&a),
                kind_name(&b)
            ))),
        },
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = match (&lhs, &rhs) {
                (Value::Number(a), Value::Number(b)) => a
                    .as_f64()
                    .unwrap_or(f64::NAN)
                    .partial_cmp(&b.as_f64().unwrap_or(f64::NAN)),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let ordering = ordering.ok_or_else(|| {
                EvalErrorKind::Type(format!(
                    "cannot compare {} and {}",
                    kind_name(&lhs),
                    kind_name(&rhs)
                ))
            })?;
            let result = match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        BinOp::And | BinOp::Or => unreachable!("short-circuit ops handled in eval"),
    }
}

/// Integer arithmetic when both operands are integers and the result is
/// exact; float arithmetic otherwise.
fn arithmetic(
    op: BinOp,
    a: &serde_json::Number,
    b: &serde_json::Number,
) -> Result<Value, EvalErrorKind> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        let exact = match op {
            BinOp::Add => x.checked_add(y),
            BinOp::Sub => x.checked_sub(y),
            BinOp::Mul => x.checked_mul(y),
            BinOp::Div => (y != 0 && x % y == 0).then(|| x / y),
            BinOp::Mod => (y != 0).then(|| x % y),
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::from(n));
        }
    }
    let x = a.as_f64().unwrap_or(f64::NAN);
    let y = b.as_f64().unwrap_or(f64::NAN);
    if matches!(op, BinOp::Div | BinOp::Mod) && y == 0.0 {
        return Err(EvalErrorKind::Type("division by zero".to_string()));
    }
    let result = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div => x / y,
        BinOp::Mod => x % y,
        _ => unreachable!("arithmetic called with non-arithmetic op"),
    };
    Ok(Value::from(result))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(pairs: &[(&str, Value)]) -> Scope {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn eval_str(expression: &str, scope: &Scope) -> Value {
        evaluate(expression, scope).unwrap()
    }

    #[test]
    fn literals() {
        let empty = Scope::new();
        assert_eq!(eval_str("42", &empty), json!(42));
        assert_eq!(eval_str("2.5", &empty), json!(2.5));
        assert_eq!(eval_str("'hi'", &empty), json!("hi"));
        assert_eq!(eval_str("\"hi\"", &empty), json!("hi"));
        assert_eq!(eval_str("true", &empty), json!(true));
        assert_eq!(eval_str("null", &empty), Value::Null);
    }

    #[test]
    fn string_escapes() {
        let empty = Scope::new();
        assert_eq!(eval_str(r"'it\'s'", &empty), json!("it's"));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(eval_str("'a' + 'b'", &Scope::new()), json!("ab"));
    }

    #[test]
    fn arithmetic_precedence() {
        let empty = Scope::new();
        assert_eq!(eval_str("1 + 2 * 3", &empty), json!(7));
        assert_eq!(eval_str("(1 + 2) * 3", &empty), json!(9));
        assert_eq!(eval_str("10 % 3", &empty), json!(1));
        assert_eq!(eval_str("-2 + 5", &empty), json!(3));
    }

    #[test]
    fn integer_division_stays_integer_when_exact() {
        let empty = Scope::new();
        assert_eq!(eval_str("6 / 3", &empty), json!(2));
        assert_eq!(eval_str("7 / 2", &empty), json!(3.5));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = evaluate("1 / 0", &Scope::new()).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::Type(_)));
    }

    #[test]
    fn variable_lookup() {
        let s = scope(&[("x", json!(42))]);
        assert_eq!(eval_str("x", &s), json!(42));
        assert_eq!(eval_str("x + 1", &s), json!(43));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let err = evaluate("x", &Scope::new()).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::Undefined(ref n) if n == "x"));
        assert_eq!(err.expression, "x");
    }

    #[test]
    fn error_carries_scope_rendering() {
        let s = scope(&[("title", json!("Hello"))]);
        let err = evaluate("missing", &s).unwrap_err();
        assert!(err.scope.contains("Hello"));
    }

    #[test]
    fn property_access() {
        let s = scope(&[("author", json!({"name": "Ada", "meta": {"year": 1842}}))]);
        assert_eq!(eval_str("author.name", &s), json!("Ada"));
        assert_eq!(eval_str("author.meta.year", &s), json!(1842));
    }

    #[test]
    fn missing_property_is_an_error() {
        let s = scope(&[("author", json!({"name": "Ada"}))]);
        let err = evaluate("author.email", &s).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::UnknownProperty(_)));
    }

    #[test]
    fn comparisons() {
        let empty = Scope::new();
        assert_eq!(eval_str("1 < 2", &empty), json!(true));
        assert_eq!(eval_str("2 <= 2", &empty), json!(true));
        assert_eq!(eval_str("'a' < 'b'", &empty), json!(true));
        assert_eq!(eval_str("1 == 1", &empty), json!(true));
        assert_eq!(eval_str("1 != 2", &empty), json!(true));
    }

    #[test]
    fn boolean_operators_short_circuit() {
        let s = scope(&[("x", json!(1))]);
        // The right-hand lookup would fail if `&&` did not short-circuit.
        assert_eq!(eval_str("defined(y) && y", &s), json!(false));
        assert_eq!(eval_str("defined(x) && x > 0", &s), json!(true));
        assert_eq!(eval_str("!defined(y) || y", &s), json!(true));
    }

    #[test]
    fn truthiness_rules() {
        assert!(!truthy(&Value::Null));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!("x")));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!({})));
    }

    #[test]
    fn defined_checks_scope_membership() {
        let s = scope(&[("x", json!(null))]);
        assert_eq!(eval_str("defined(x)", &s), json!(true));
        assert_eq!(eval_str("defined('x')", &s), json!(true));
        assert_eq!(eval_str("defined(y)", &s), json!(false));
    }

    #[test]
    fn join_builds_paths() {
        let s = scope(&[("static_path", json!("../static"))]);
        assert_eq!(
            eval_str("join(static_path, 'style.css')", &s),
            json!("../static/style.css")
        );
    }

    #[test]
    fn unknown_function_is_an_error() {
        let err = evaluate("exec('rm -rf /')", &Scope::new()).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::UnknownFunction(_)));
    }

    #[test]
    fn parse_errors_are_reported() {
        for bad in ["1 +", "(1", "'open", "a b", "= 1", "1 &"] {
            let err = evaluate(bad, &Scope::new()).unwrap_err();
            assert!(
                matches!(err.kind, EvalErrorKind::Parse(_)),
                "expected parse error for `{bad}`"
            );
        }
    }

    #[test]
    fn to_text_renderings() {
        assert_eq!(to_text(&json!(42)), "42");
        assert_eq!(to_text(&json!(2.5)), "2.5");
        assert_eq!(to_text(&json!("hi")), "hi");
        assert_eq!(to_text(&json!(true)), "true");
        assert_eq!(to_text(&Value::Null), "undefined");
    }
}

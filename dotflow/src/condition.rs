//! Guard expression evaluation
//!
//! Edge guards and conditional nodes carry small boolean expressions
//! evaluated against two read-only roots: `context` (the current
//! context snapshot) and `graph` (graph-level attributes). The
//! evaluator is a closed grammar (boolean, comparison, and arithmetic
//! operators plus dotted/bracket lookup into plain data) with no
//! access to host operations of any kind.
//!
//! Guards fail closed: an absent or empty expression is `true`, and any
//! lex, parse, or evaluation error (unknown name, missing key, type
//! mismatch, division by zero) makes the whole guard `false`. A guard
//! can never abort a run.
//!
//! ```text
//! or    := and (("||" | "or") and)*
//! and   := not (("&&" | "and") not)*
//! not   := ("!" | "not") not | cmp
//! cmp   := add (("==" | "!=" | "<" | "<=" | ">" | ">=" | "in" | "not in") add)?
//! add   := mul (("+" | "-") mul)*
//! mul   := unary (("*" | "/" | "%") unary)*
//! unary := "-" unary | postfix
//! postfix := primary ("." ident | "[" or "]")*
//! primary := number | string | true | false | null | context | graph | "(" or ")"
//! ```

use serde_json::Value;
use std::collections::HashMap;

use crate::context::Context;
use crate::graph::AttrValue;

/// Evaluate a guard expression. Absent or blank expressions pass; every
/// error collapses to `false`.
pub fn evaluate_condition(
    expression: Option<&str>,
    context: &Context,
    graph_attrs: &HashMap<String, AttrValue>,
) -> bool {
    let Some(expression) = expression else {
        return true;
    };
    if expression.trim().is_empty() {
        return true;
    }
    let context_root = Value::Object(context.snapshot());
    let graph_root = Value::Object(
        graph_attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    );
    match eval_expression(expression, &context_root, &graph_root) {
        Ok(value) => is_truthy(&value),
        Err(err) => {
            tracing::trace!(expression, error = %err.0, "guard evaluation failed");
            false
        }
    }
}

/// Truthiness used by guards and boolean operators: null and `false`
/// are falsy, numbers are falsy at zero, strings and containers are
/// falsy when empty.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[derive(Debug)]
struct EvalError(String);

fn fail<T>(message: impl Into<String>) -> Result<T, EvalError> {
    Err(EvalError(message.into()))
}

fn eval_expression(expression: &str, context: &Value, graph: &Value) -> Result<Value, EvalError> {
    let tokens = lex(expression)?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return fail("trailing input after expression");
    }
    eval(&expr, context, graph)
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    OrOr,
    AndAnd,
    Bang,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
}

fn lex(expression: &str) -> Result<Vec<Tok>, EvalError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Tok::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Tok::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Tok::RBracket);
                i += 1;
            }
            '.' => {
                tokens.push(Tok::Dot);
                i += 1;
            }
            '+' => {
                tokens.push(Tok::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Tok::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Tok::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Tok::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Tok::Percent);
                i += 1;
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Tok::Ne);
                    i += 2;
                } else {
                    tokens.push(Tok::Bang);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Tok::Eq);
                    i += 2;
                } else {
                    return fail("single '=' is not a comparison");
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Tok::Le);
                    i += 2;
                } else {
                    tokens.push(Tok::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Tok::Ge);
                    i += 2;
                } else {
                    tokens.push(Tok::Gt);
                    i += 1;
                }
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Tok::AndAnd);
                    i += 2;
                } else {
                    return fail("single '&' is not an operator");
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Tok::OrOr);
                    i += 2;
                } else {
                    return fail("single '|' is not an operator");
                }
            }
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                i += 1;
                let mut closed = false;
                while i < chars.len() {
                    let c = chars[i];
                    if c == quote {
                        closed = true;
                        i += 1;
                        break;
                    }
                    if c == '\\' && i + 1 < chars.len() {
                        value.push(chars[i + 1]);
                        i += 2;
                    } else {
                        value.push(c);
                        i += 1;
                    }
                }
                if !closed {
                    return fail("unterminated string literal");
                }
                tokens.push(Tok::Str(value));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let mut is_float = false;
                if i < chars.len()
                    && chars[i] == '.'
                    && chars.get(i + 1).map(|c| c.is_ascii_digit()).unwrap_or(false)
                {
                    is_float = true;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                if is_float {
                    match text.parse::<f64>() {
                        Ok(f) => tokens.push(Tok::Float(f)),
                        Err(_) => return fail(format!("invalid number '{}'", text)),
                    }
                } else {
                    match text.parse::<i64>() {
                        Ok(n) => tokens.push(Tok::Int(n)),
                        Err(_) => return fail(format!("invalid number '{}'", text)),
                    }
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Tok::Ident(chars[start..i].iter().collect()));
            }
            other => return fail(format!("unexpected character '{}'", other)),
        }
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum RootKind {
    Context,
    Graph,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug)]
enum Expr {
    Literal(Value),
    Root(RootKind),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

struct ExprParser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Ident(w)) if w == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Tok::OrOr) || self.eat_keyword("or") {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Tok::AndAnd) || self.eat_keyword("and") {
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, EvalError> {
        // "not in" belongs to the comparison level, so only treat "not"
        // as a prefix when it is not immediately followed by "in"
        if self.eat(&Tok::Bang) {
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        if matches!(self.peek(), Some(Tok::Ident(w)) if w == "not")
            && !matches!(self.tokens.get(self.pos + 1), Some(Tok::Ident(w)) if w == "in")
        {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let lhs = self.parse_additive()?;
        let op = match self.peek() {
            Some(Tok::Eq) => Some(BinOp::Eq),
            Some(Tok::Ne) => Some(BinOp::Ne),
            Some(Tok::Lt) => Some(BinOp::Lt),
            Some(Tok::Le) => Some(BinOp::Le),
            Some(Tok::Gt) => Some(BinOp::Gt),
            Some(Tok::Ge) => Some(BinOp::Ge),
            Some(Tok::Ident(w)) if w == "in" => Some(BinOp::In),
            Some(Tok::Ident(w)) if w == "not" => {
                if matches!(self.tokens.get(self.pos + 1), Some(Tok::Ident(w)) if w == "in") {
                    self.pos += 1;
                    Some(BinOp::NotIn)
                } else {
                    None
                }
            }
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                let rhs = self.parse_additive()?;
                Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
            }
            None => Ok(lhs),
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                Some(Tok::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        if self.eat(&Tok::Minus) {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Tok::Dot) {
                match self.peek() {
                    Some(Tok::Ident(name)) => {
                        let name = name.clone();
                        self.pos += 1;
                        expr = Expr::Member(Box::new(expr), name);
                    }
                    _ => return fail("expected name after '.'"),
                }
            } else if self.eat(&Tok::LBracket) {
                let index = self.parse_or()?;
                if !self.eat(&Tok::RBracket) {
                    return fail("expected ']'");
                }
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.peek().cloned() {
            Some(Tok::Int(n)) => {
                self.pos += 1;
                Ok(Expr::Literal(Value::from(n)))
            }
            Some(Tok::Float(f)) => {
                self.pos += 1;
                Ok(Expr::Literal(Value::from(f)))
            }
            Some(Tok::Str(s)) => {
                self.pos += 1;
                Ok(Expr::Literal(Value::String(s)))
            }
            Some(Tok::Ident(word)) => {
                self.pos += 1;
                match word.as_str() {
                    "true" | "True" => Ok(Expr::Literal(Value::Bool(true))),
                    "false" | "False" => Ok(Expr::Literal(Value::Bool(false))),
                    "null" | "None" => Ok(Expr::Literal(Value::Null)),
                    "context" => Ok(Expr::Root(RootKind::Context)),
                    "graph" => Ok(Expr::Root(RootKind::Graph)),
                    other => fail(format!("unknown name '{}'", other)),
                }
            }
            Some(Tok::LParen) => {
                self.pos += 1;
                let expr = self.parse_or()?;
                if !self.eat(&Tok::RParen) {
                    return fail("expected ')'");
                }
                Ok(expr)
            }
            other => fail(format!("unexpected token {:?}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

fn eval(expr: &Expr, context: &Value, graph: &Value) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Root(RootKind::Context) => Ok(context.clone()),
        Expr::Root(RootKind::Graph) => Ok(graph.clone()),
        Expr::Member(base, name) => {
            let base = eval(base, context, graph)?;
            match base {
                Value::Object(map) => map
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError(format!("unknown key '{}'", name))),
                other => fail(format!("cannot access '{}' on {}", name, type_name(&other))),
            }
        }
        Expr::Index(base, index) => {
            let base = eval(base, context, graph)?;
            let index = eval(index, context, graph)?;
            match (&base, &index) {
                (Value::Object(map), Value::String(key)) => map
                    .get(key)
                    .cloned()
                    .ok_or_else(|| EvalError(format!("unknown key '{}'", key))),
                (Value::Array(items), Value::Number(n)) => {
                    let raw = n
                        .as_i64()
                        .ok_or_else(|| EvalError("array index must be an integer".into()))?;
                    let len = items.len() as i64;
                    let idx = if raw < 0 { len + raw } else { raw };
                    if idx < 0 || idx >= len {
                        return fail(format!("index {} out of range", raw));
                    }
                    Ok(items[idx as usize].clone())
                }
                _ => fail(format!(
                    "cannot index {} with {}",
                    type_name(&base),
                    type_name(&index)
                )),
            }
        }
        Expr::Not(inner) => {
            let value = eval(inner, context, graph)?;
            Ok(Value::Bool(!is_truthy(&value)))
        }
        Expr::Neg(inner) => {
            let value = eval(inner, context, graph)?;
            match value {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        i.checked_neg()
                            .map(Value::from)
                            .ok_or_else(|| EvalError("integer overflow".into()))
                    } else if let Some(f) = n.as_f64() {
                        Ok(Value::from(-f))
                    } else {
                        fail("cannot negate this number")
                    }
                }
                other => fail(format!("cannot negate {}", type_name(&other))),
            }
        }
        Expr::Or(lhs, rhs) => {
            let left = eval(lhs, context, graph)?;
            if is_truthy(&left) {
                Ok(left)
            } else {
                eval(rhs, context, graph)
            }
        }
        Expr::And(lhs, rhs) => {
            let left = eval(lhs, context, graph)?;
            if is_truthy(&left) {
                eval(rhs, context, graph)
            } else {
                Ok(left)
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let left = eval(lhs, context, graph)?;
            let right = eval(rhs, context, graph)?;
            apply_binary(*op, &left, &right)
        }
    }
}

fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Eq => Ok(Value::Bool(loose_eq(left, right))),
        BinOp::Ne => Ok(Value::Bool(!loose_eq(left, right))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare(left, right)?;
            let result = match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        BinOp::In => Ok(Value::Bool(contains(right, left)?)),
        BinOp::NotIn => Ok(Value::Bool(!contains(right, left)?)),
        BinOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => numeric_op(left, right, |a, b| a + b, i64::checked_add),
        },
        BinOp::Sub => numeric_op(left, right, |a, b| a - b, i64::checked_sub),
        BinOp::Mul => numeric_op(left, right, |a, b| a * b, i64::checked_mul),
        BinOp::Div => {
            let (a, b) = both_f64(left, right)?;
            if b == 0.0 {
                return fail("division by zero");
            }
            Ok(Value::from(a / b))
        }
        BinOp::Mod => match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => {
                if b == 0 {
                    return fail("modulo by zero");
                }
                Ok(Value::from(a % b))
            }
            _ => {
                let (a, b) = both_f64(left, right)?;
                if b == 0.0 {
                    return fail("modulo by zero");
                }
                Ok(Value::from(a % b))
            }
        },
    }
}

fn numeric_op(
    left: &Value,
    right: &Value,
    float_op: fn(f64, f64) -> f64,
    int_op: fn(i64, i64) -> Option<i64>,
) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return int_op(a, b)
            .map(Value::from)
            .ok_or_else(|| EvalError("integer overflow".into()));
    }
    let (a, b) = both_f64(left, right)?;
    Ok(Value::from(float_op(a, b)))
}

fn both_f64(left: &Value, right: &Value) -> Result<(f64, f64), EvalError> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => fail(format!(
            "arithmetic needs numbers, got {} and {}",
            type_name(left),
            type_name(right)
        )),
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a == b;
    }
    left == right
}

fn compare(left: &Value, right: &Value) -> Result<std::cmp::Ordering, EvalError> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a
            .partial_cmp(&b)
            .ok_or_else(|| EvalError("numbers are not comparable".into()));
    }
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    fail(format!(
        "cannot order {} and {}",
        type_name(left),
        type_name(right)
    ))
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::String(haystack) => match item {
            Value::String(needle) => Ok(haystack.contains(needle.as_str())),
            _ => fail("substring test needs a string"),
        },
        Value::Array(items) => Ok(items.iter().any(|candidate| loose_eq(candidate, item))),
        Value::Object(map) => match item {
            Value::String(key) => Ok(map.contains_key(key)),
            _ => fail("key test needs a string"),
        },
        other => fail(format!("cannot test membership in {}", type_name(other))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
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

    fn ctx(entries: &[(&str, Value)]) -> Context {
        let context = Context::new();
        for (key, value) in entries {
            context.set(*key, value.clone());
        }
        context
    }

    fn attrs(entries: &[(&str, AttrValue)]) -> HashMap<String, AttrValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn check(expression: &str, context: &Context) -> bool {
        evaluate_condition(Some(expression), context, &HashMap::new())
    }

    #[test]
    fn test_absent_or_empty_is_true() {
        let context = Context::new();
        assert!(evaluate_condition(None, &context, &HashMap::new()));
        assert!(evaluate_condition(Some(""), &context, &HashMap::new()));
        assert!(evaluate_condition(Some("   "), &context, &HashMap::new()));
    }

    #[test]
    fn test_literals_and_truthiness() {
        let context = Context::new();
        assert!(check("true", &context));
        assert!(!check("false", &context));
        assert!(!check("null", &context));
        assert!(check("1", &context));
        assert!(!check("0", &context));
        assert!(check("'x'", &context));
        assert!(!check("''", &context));
    }

    #[test]
    fn test_context_lookup() {
        let context = ctx(&[("phase", json!("review")), ("count", json!(3))]);
        assert!(check("context.phase == 'review'", &context));
        assert!(check("context['phase'] == \"review\"", &context));
        assert!(!check("context.phase == 'build'", &context));
        assert!(check("context.count >= 3", &context));
        assert!(check("context.count < 5 && context.count > 1", &context));
    }

    #[test]
    fn test_dotted_keys_via_brackets() {
        let context = ctx(&[("graph.goal", json!("ship")), ("internal.retry_count.a", json!(1))]);
        assert!(check("context['graph.goal'] == 'ship'", &context));
        assert!(check("context['internal.retry_count.a'] == 1", &context));
    }

    #[test]
    fn test_graph_root() {
        let context = Context::new();
        let graph = attrs(&[
            ("goal", AttrValue::Str("demo".into())),
            ("budget", AttrValue::Int(10)),
        ]);
        assert!(evaluate_condition(Some("graph.goal == 'demo'"), &context, &graph));
        assert!(evaluate_condition(Some("graph.budget * 2 == 20"), &context, &graph));
        assert!(!evaluate_condition(Some("graph.goal == 'other'"), &context, &graph));
    }

    #[test]
    fn test_boolean_operators_and_keywords() {
        let context = ctx(&[("ok", json!(true)), ("count", json!(0))]);
        assert!(check("context.ok || context.count > 0", &context));
        assert!(check("context.ok or context.count > 0", &context));
        assert!(!check("context.ok && context.count > 0", &context));
        assert!(!check("context.ok and context.count > 0", &context));
        assert!(check("!context.count", &context));
        assert!(check("not context.count", &context));
    }

    #[test]
    fn test_short_circuit_swallows_rhs_errors() {
        let context = ctx(&[("ok", json!(true))]);
        // rhs would fail (unknown key), but the lhs decides first
        assert!(check("context.ok || context.missing > 1", &context));
        assert!(!check("context.missing > 1 && context.ok", &context));
    }

    #[test]
    fn test_arithmetic() {
        let context = ctx(&[("n", json!(7))]);
        assert!(check("context.n + 1 == 8", &context));
        assert!(check("context.n % 2 == 1", &context));
        assert!(check("context.n / 2 == 3.5", &context));
        assert!(check("-context.n == -7", &context));
        assert!(check("context.n * 0 == 0", &context));
        assert!(check("'ab' + 'cd' == 'abcd'", &context));
    }

    #[test]
    fn test_numeric_coercion() {
        let context = ctx(&[("x", json!(2.0))]);
        assert!(check("context.x == 2", &context));
        assert!(check("context.x >= 1", &context));
    }

    #[test]
    fn test_membership() {
        let context = ctx(&[
            ("tags", json!(["alpha", "beta"])),
            ("name", json!("deploy-prod")),
            ("meta", json!({"owner": "ops"})),
        ]);
        assert!(check("'beta' in context.tags", &context));
        assert!(check("'gamma' not in context.tags", &context));
        assert!(check("'prod' in context.name", &context));
        assert!(check("'owner' in context.meta", &context));
    }

    #[test]
    fn test_array_indexing() {
        let context = ctx(&[("tags", json!(["alpha", "beta"]))]);
        assert!(check("context.tags[0] == 'alpha'", &context));
        assert!(check("context.tags[-1] == 'beta'", &context));
        assert!(!check("context.tags[5] == 'alpha'", &context));
    }

    #[test]
    fn test_errors_fail_closed() {
        let context = ctx(&[("n", json!(1))]);
        // unknown key
        assert!(!check("context.missing == 1", &context));
        // unknown root name
        assert!(!check("environ.n == 1", &context));
        // type mismatch
        assert!(!check("context.n > 'text'", &context));
        // division by zero
        assert!(!check("context.n / 0 == 1", &context));
        // syntax errors
        assert!(!check("context.n ==", &context));
        assert!(!check("context.n = 1", &context));
        assert!(!check("(context.n == 1", &context));
        assert!(!check("context.n £ 1", &context));
    }

    #[test]
    fn test_parenthesized_grouping() {
        let context = ctx(&[("a", json!(1)), ("b", json!(0))]);
        assert!(check("(context.a == 1 || context.b == 1) && context.b == 0", &context));
    }

    #[test]
    fn test_comparison_of_strings() {
        let context = ctx(&[("v", json!("b"))]);
        assert!(check("context.v > 'a'", &context));
        assert!(check("context.v <= 'b'", &context));
    }
}

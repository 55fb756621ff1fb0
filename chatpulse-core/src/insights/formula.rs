//! Restricted expression language for custom insights.
//!
//! ```text
//! expr    := or
//! or      := and ( "||" and )*
//! and     := eq ( "&&" eq )*
//! eq      := cmp ( ("==" | "!=") cmp )*
//! cmp     := sum ( (">" | "<" | ">=" | "<=") sum )*
//! sum     := product ( ("+" | "-") product )*
//! product := unary ( ("*" | "/" | "%") unary )*
//! unary   := ("-" | "!") unary | primary
//! primary := number | "true" | "false" | identifier | "(" expr ")"
//! ```
//!
//! Identifiers are looked up in a flat `name -> f64` map, normally the one
//! produced by [`crate::analytics::metrics_registry::resolve_variables`].
//! Nothing else is reachable from a formula.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::FormulaError;

type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Result of evaluating a formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    /// `true`, or any non-zero number.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
        }
    }

    /// Numeric view, booleans map to 1 / 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

// ============================================
// Tokens
// ============================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    True,
    False,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Gt,
    Lt,
    Ge,
    Le,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    /// Byte offset in the source
    position: usize,
}

fn syntax(position: usize, message: impl Into<String>) -> FormulaError {
    FormulaError::Syntax {
        position,
        message: message.into(),
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> FormulaResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(&(position, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }
            let kind = if c.is_ascii_digit() || c == '.' {
                self.number(position)?
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.identifier(position)
            } else {
                self.chars.next();
                self.operator(position, c)?
            };
            tokens.push(Token { kind, position });
        }
        Ok(tokens)
    }

    fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> &'a str {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        &self.source[start..end]
    }

    fn number(&mut self, start: usize) -> FormulaResult<TokenKind> {
        let text = self.take_while(start, |c| c.is_ascii_digit() || c == '.');
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| syntax(start, format!("invalid number '{}'", text)))
    }

    fn identifier(&mut self, start: usize) -> TokenKind {
        match self.take_while(start, |c| c.is_ascii_alphanumeric() || c == '_') {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            name => TokenKind::Ident(name.to_string()),
        }
    }

    fn next_is(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn operator(&mut self, position: usize, c: char) -> FormulaResult<TokenKind> {
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '>' if self.next_is('=') => TokenKind::Ge,
            '>' => TokenKind::Gt,
            '<' if self.next_is('=') => TokenKind::Le,
            '<' => TokenKind::Lt,
            '!' if self.next_is('=') => TokenKind::Ne,
            '!' => TokenKind::Bang,
            // a lone `=` reads as equality
            '=' => {
                self.next_is('=');
                TokenKind::EqEq
            }
            '&' if self.next_is('&') => TokenKind::AndAnd,
            '|' if self.next_is('|') => TokenKind::OrOr,
            '&' | '|' => return Err(syntax(position, format!("expected '{c}{c}'"))),
            other => return Err(syntax(position, format!("unexpected character '{}'", other))),
        };
        Ok(kind)
    }
}

// ============================================
// AST
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::Ge => ">=",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Bool(bool),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Parentheses and unary operators nested deeper than this are rejected.
const MAX_NESTING: usize = 256;

/// Longer formulas are rejected before parsing.
const MAX_TOKENS: usize = 1024;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Reported for errors past the last token
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |t| t.position)
    }

    fn descend(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(syntax(self.position(), "formula nested too deeply"));
        }
        Ok(())
    }

    fn advance(&mut self) -> Option<TokenKind> {
        let kind = self.tokens.get(self.pos).map(|t| t.kind.clone());
        self.pos += 1;
        kind
    }

    /// Parse one left-associative precedence level.
    fn binary_level(
        &mut self,
        ops: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> FormulaResult<Expr>,
    ) -> FormulaResult<Expr> {
        let mut lhs = next(self)?;
        while let Some(op) = self
            .peek()
            .and_then(|kind| ops.iter().find(|(k, _)| k == kind).map(|(_, op)| *op))
        {
            self.pos += 1;
            let rhs = next(self)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn expr(&mut self) -> FormulaResult<Expr> {
        self.binary_level(&[(TokenKind::OrOr, BinaryOp::Or)], Self::and)
    }

    fn and(&mut self) -> FormulaResult<Expr> {
        self.binary_level(&[(TokenKind::AndAnd, BinaryOp::And)], Self::equality)
    }

    fn equality(&mut self) -> FormulaResult<Expr> {
        self.binary_level(
            &[(TokenKind::EqEq, BinaryOp::Eq), (TokenKind::Ne, BinaryOp::Ne)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> FormulaResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Gt, BinaryOp::Gt),
                (TokenKind::Lt, BinaryOp::Lt),
                (TokenKind::Ge, BinaryOp::Ge),
                (TokenKind::Le, BinaryOp::Le),
            ],
            Self::sum,
        )
    }

    fn sum(&mut self) -> FormulaResult<Expr> {
        self.binary_level(
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
            Self::product,
        )
    }

    fn product(&mut self) -> FormulaResult<Expr> {
        self.binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> FormulaResult<Expr> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Bang) => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.descend()?;
        self.pos += 1;
        let inner = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(inner)))
    }

    fn primary(&mut self) -> FormulaResult<Expr> {
        let position = self.position();
        match self.advance() {
            Some(TokenKind::Number(n)) => Ok(Expr::Number(n)),
            Some(TokenKind::True) => Ok(Expr::Bool(true)),
            Some(TokenKind::False) => Ok(Expr::Bool(false)),
            Some(TokenKind::Ident(name)) => Ok(Expr::Variable(name)),
            Some(TokenKind::LParen) => {
                self.descend()?;
                let inner = self.expr()?;
                self.depth -= 1;
                let close = self.position();
                match self.advance() {
                    Some(TokenKind::RParen) => Ok(inner),
                    _ => Err(syntax(close, "expected ')'")),
                }
            }
            Some(_) => Err(syntax(position, "expected a value")),
            None => Err(syntax(position, "unexpected end of formula")),
        }
    }
}

// ============================================
// Formula
// ============================================

/// A parsed formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    root: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> FormulaResult<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        if let Some(token) = tokens.get(MAX_TOKENS) {
            return Err(syntax(token.position, "formula too long"));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            end: source.len(),
            depth: 0,
        };
        let root = parser.expr()?;
        if parser.pos < parser.tokens.len() {
            return Err(syntax(parser.position(), "unexpected trailing input"));
        }
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every identifier the formula references, sorted and deduplicated.
    pub fn variables(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        collect_variables(&self.root, &mut names);
        names.into_iter().collect()
    }

    /// Evaluate against resolved variables.
    ///
    /// All missing identifiers are reported together before anything is
    /// evaluated.
    pub fn evaluate(&self, vars: &BTreeMap<String, f64>) -> FormulaResult<Value> {
        let missing: Vec<String> = self
            .variables()
            .into_iter()
            .filter(|name| !vars.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(FormulaError::UnresolvedVariables(missing));
        }
        eval(&self.root, vars)
    }
}

fn collect_variables(expr: &Expr, names: &mut BTreeSet<String>) {
    match expr {
        Expr::Number(_) | Expr::Bool(_) => {}
        Expr::Variable(name) => {
            names.insert(name.clone());
        }
        Expr::Unary(_, inner) => collect_variables(inner, names),
        Expr::Binary(_, lhs, rhs) => {
            collect_variables(lhs, names);
            collect_variables(rhs, names);
        }
    }
}

fn number(value: Value, op: &str) -> FormulaResult<f64> {
    match value {
        Value::Number(n) => Ok(n),
        other => Err(FormulaError::Type(format!(
            "'{}' expects a number, got {}",
            op,
            other.type_name()
        ))),
    }
}

fn eval(expr: &Expr, vars: &BTreeMap<String, f64>) -> FormulaResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Variable(name) => vars
            .get(name)
            .map(|v| Value::Number(*v))
            .ok_or_else(|| FormulaError::UnresolvedVariables(vec![name.clone()])),
        Expr::Unary(UnaryOp::Neg, inner) => Ok(Value::Number(-number(eval(inner, vars)?, "-")?)),
        Expr::Unary(UnaryOp::Not, inner) => Ok(Value::Bool(!eval(inner, vars)?.is_truthy())),
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            let result = eval(lhs, vars)?.is_truthy() && eval(rhs, vars)?.is_truthy();
            Ok(Value::Bool(result))
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            let result = eval(lhs, vars)?.is_truthy() || eval(rhs, vars)?.is_truthy();
            Ok(Value::Bool(result))
        }
        Expr::Binary(op @ (BinaryOp::Eq | BinaryOp::Ne), lhs, rhs) => {
            let equal = match (eval(lhs, vars)?, eval(rhs, vars)?) {
                (Value::Number(a), Value::Number(b)) => a == b,
                (Value::Bool(a), Value::Bool(b)) => a == b,
                (a, b) => {
                    return Err(FormulaError::Type(format!(
                        "cannot compare {} with {}",
                        a.type_name(),
                        b.type_name()
                    )))
                }
            };
            Ok(Value::Bool(if *op == BinaryOp::Eq { equal } else { !equal }))
        }
        Expr::Binary(op, lhs, rhs) => {
            let a = number(eval(lhs, vars)?, op.symbol())?;
            let b = number(eval(rhs, vars)?, op.symbol())?;
            let value = match op {
                BinaryOp::Add => Value::Number(a + b),
                BinaryOp::Sub => Value::Number(a - b),
                BinaryOp::Mul => Value::Number(a * b),
                BinaryOp::Div | BinaryOp::Rem if b == 0.0 => {
                    return Err(FormulaError::DivisionByZero)
                }
                BinaryOp::Div => Value::Number(a / b),
                BinaryOp::Rem => Value::Number(a % b),
                BinaryOp::Gt => Value::Bool(a > b),
                BinaryOp::Lt => Value::Bool(a < b),
                BinaryOp::Ge => Value::Bool(a >= b),
                BinaryOp::Le => Value::Bool(a <= b),
                BinaryOp::Eq | BinaryOp::Ne | BinaryOp::And | BinaryOp::Or => {
                    unreachable!("handled above")
                }
            };
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn eval_str(source: &str, pairs: &[(&str, f64)]) -> FormulaResult<Value> {
        Formula::parse(source)?.evaluate(&vars(pairs))
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(eval_str("1 + 2 * 3", &[]), Ok(Value::Number(7.0)));
        assert_eq!(eval_str("(1 + 2) * 3", &[]), Ok(Value::Number(9.0)));
        assert_eq!(eval_str("10 - 4 - 3", &[]), Ok(Value::Number(3.0)));
        assert_eq!(eval_str("7 % 4", &[]), Ok(Value::Number(3.0)));
        assert_eq!(eval_str("-2 * -3", &[]), Ok(Value::Number(6.0)));
        assert_eq!(eval_str("1.5 / 0.5", &[]), Ok(Value::Number(3.0)));
    }

    #[test]
    fn test_comparisons_and_logic() {
        let v = [("top3_percentage", 85.0), ("member_count", 12.0)];
        assert_eq!(
            eval_str("top3_percentage >= 80 && member_count > 10", &v),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval_str("top3_percentage < 50 || member_count == 12", &v),
            Ok(Value::Bool(true))
        );
        assert_eq!(eval_str("!(member_count != 12)", &v), Ok(Value::Bool(true)));
        assert_eq!(eval_str("member_count = 12", &v), Ok(Value::Bool(true)));
        assert_eq!(eval_str("true == false", &[]), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_unresolved_variables_reported_together() {
        let err = eval_str("zeta > 1 && alpha < 2 && known > 0 && zeta > 2", &[("known", 1.0)])
            .unwrap_err();
        assert_eq!(
            err,
            FormulaError::UnresolvedVariables(vec!["alpha".to_string(), "zeta".to_string()])
        );
    }

    #[test]
    fn test_unresolved_checked_before_division() {
        let err = eval_str("1 / 0 + missing", &[]).unwrap_err();
        assert_eq!(err, FormulaError::UnresolvedVariables(vec!["missing".to_string()]));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_str("5 / 0", &[]), Err(FormulaError::DivisionByZero));
        assert_eq!(
            eval_str("5 % day_count", &[("day_count", 0.0)]),
            Err(FormulaError::DivisionByZero)
        );
    }

    #[test]
    fn test_type_errors() {
        assert!(matches!(eval_str("true + 1", &[]), Err(FormulaError::Type(_))));
        assert!(matches!(eval_str("(1 > 0) > 0", &[]), Err(FormulaError::Type(_))));
        assert!(matches!(eval_str("true == 1", &[]), Err(FormulaError::Type(_))));
        assert!(matches!(eval_str("-true", &[]), Err(FormulaError::Type(_))));
    }

    #[test]
    fn test_syntax_errors_carry_position() {
        assert_eq!(
            Formula::parse("1 + $").unwrap_err(),
            FormulaError::Syntax {
                position: 4,
                message: "unexpected character '$'".to_string()
            }
        );
        assert!(matches!(
            Formula::parse("(1 + 2"),
            Err(FormulaError::Syntax { position: 6, .. })
        ));
        assert!(matches!(
            Formula::parse("1 2"),
            Err(FormulaError::Syntax { position: 2, .. })
        ));
        assert!(matches!(
            Formula::parse("a & b"),
            Err(FormulaError::Syntax { position: 2, .. })
        ));
        assert!(matches!(Formula::parse(""), Err(FormulaError::Syntax { .. })));
        assert!(matches!(Formula::parse("1..2"), Err(FormulaError::Syntax { .. })));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

        assert!(Formula::parse(&nested(200)).is_ok());
        assert!(matches!(
            Formula::parse(&nested(300)),
            Err(FormulaError::Syntax { ref message, .. }) if message == "formula nested too deeply"
        ));
        assert!(matches!(
            Formula::parse(&format!("{}1", "!".repeat(300))),
            Err(FormulaError::Syntax { ref message, .. }) if message == "formula nested too deeply"
        ));
        assert!(matches!(
            Formula::parse(&nested(200_000)),
            Err(FormulaError::Syntax { ref message, .. }) if message == "formula too long"
        ));
        assert!(matches!(
            Formula::parse(&vec!["1"; 1000].join(" + ")),
            Err(FormulaError::Syntax { ref message, .. }) if message == "formula too long"
        ));
    }

    #[test]
    fn test_variables_listed_once() {
        let formula = Formula::parse("b + a * b > c_1").unwrap();
        assert_eq!(formula.variables(), vec!["a", "b", "c_1"]);
        assert_eq!(formula.source(), "b + a * b > c_1");
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Number(2.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert_eq!(Value::Bool(true).as_f64(), 1.0);
        assert_eq!(eval_str("0 || 3", &[]), Ok(Value::Bool(true)));
    }
}

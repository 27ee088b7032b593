//! Dynamic group membership expressions
//!
//! An expression is a boolean predicate over a device's [`AttributeSet`]:
//!
//! ```text
//! expr    := or
//! or      := and ( "or" and )*
//! and     := unary ( "and" unary )*
//! unary   := "not" unary | "(" expr ")" | term
//! term    := path ( "==" | "!=" | "contains" | "starts_with" ) literal
//!          | path "exists"
//! literal := "quoted \"string\"" | bare-word
//! ```
//!
//! Keywords are case-insensitive and `=` is accepted for `==`. Evaluation is
//! total: a comparison against an attribute the device does not have is
//! `false`, including `!=`.

use fleet_core::{AttributeSet, FleetError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deepest nesting of parentheses and `not` accepted by the parser
pub const MAX_NESTING: usize = 64;

/// Most comparisons a single expression may contain
pub const MAX_TERMS: usize = 256;

/// Expression parse failures. Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// Input was empty or whitespace
    #[error("expression is empty")]
    Empty,

    /// Character that starts no token
    #[error("unexpected character {ch:?} at {position}")]
    UnexpectedChar {
        /// Offending character
        ch: char,
        /// Byte offset
        position: usize,
    },

    /// Quoted literal without closing quote
    #[error("unterminated string starting at {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote
        position: usize,
    },

    /// Token that does not fit the grammar here
    #[error("expected {expected} at {position}, found {found:?}")]
    UnexpectedToken {
        /// What the parser wanted
        expected: &'static str,
        /// What it got
        found: String,
        /// Byte offset
        position: usize,
    },

    /// Input ended early
    #[error("expected {expected} at end of expression")]
    UnexpectedEnd {
        /// What the parser wanted
        expected: &'static str,
    },

    /// Word in attribute position that is not a valid attribute path
    #[error("invalid attribute path {path:?} at {position}")]
    InvalidPath {
        /// Offending word
        path: String,
        /// Byte offset
        position: usize,
    },

    /// Nesting beyond [`MAX_NESTING`]
    #[error("expression nested deeper than {max} levels")]
    TooDeep {
        /// The limit
        max: usize,
    },

    /// More than [`MAX_TERMS`] comparisons
    #[error("expression has more than {max} comparisons")]
    TooLarge {
        /// The limit
        max: usize,
    },
}

impl From<ExpressionError> for FleetError {
    fn from(err: ExpressionError) -> Self {
        FleetError::invalid_expression(err.to_string())
    }
}

/// Parsed membership predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// Attribute equals value
    Eq {
        /// Attribute path
        attribute: String,
        /// Expected value
        value: String,
    },
    /// Attribute present and different from value
    NotEq {
        /// Attribute path
        attribute: String,
        /// Rejected value
        value: String,
    },
    /// Attribute contains value as a substring
    Contains {
        /// Attribute path
        attribute: String,
        /// Substring
        value: String,
    },
    /// Attribute starts with value
    StartsWith {
        /// Attribute path
        attribute: String,
        /// Prefix
        value: String,
    },
    /// Attribute present
    Exists {
        /// Attribute path
        attribute: String,
    },
    /// Both hold
    And(Box<Expression>, Box<Expression>),
    /// Either holds
    Or(Box<Expression>, Box<Expression>),
    /// Negation
    Not(Box<Expression>),
}

impl Expression {
    /// Parse expression text
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let mut parser = Parser {
            tokens,
            cursor: 0,
            depth: 0,
            terms: 0,
        };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(ExpressionError::UnexpectedToken {
                expected: "end of expression",
                found: token.kind.describe(),
                position: token.position,
            }),
        }
    }

    /// `attribute == value`
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// `attribute exists`
    pub fn exists(attribute: impl Into<String>) -> Self {
        Self::Exists {
            attribute: attribute.into(),
        }
    }

    /// `self and other`
    pub fn and(self, other: Expression) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// `self or other`
    pub fn or(self, other: Expression) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// `not self`
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Whether a device with `attributes` satisfies this predicate
    pub fn matches(&self, attributes: &AttributeSet) -> bool {
        match self {
            Self::Eq { attribute, value } => attributes.get(attribute) == Some(value.as_str()),
            Self::NotEq { attribute, value } => attributes
                .get(attribute)
                .is_some_and(|actual| actual != value.as_str()),
            Self::Contains { attribute, value } => attributes
                .get(attribute)
                .is_some_and(|actual| actual.contains(value.as_str())),
            Self::StartsWith { attribute, value } => attributes
                .get(attribute)
                .is_some_and(|actual| actual.starts_with(value.as_str())),
            Self::Exists { attribute } => attributes.contains(attribute),
            Self::And(left, right) => left.matches(attributes) && right.matches(attributes),
            Self::Or(left, right) => left.matches(attributes) || right.matches(attributes),
            Self::Not(inner) => !inner.matches(attributes),
        }
    }

    /// Attribute paths referenced anywhere in the expression, sorted and deduplicated
    pub fn attributes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_attributes(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_attributes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Eq { attribute, .. }
            | Self::NotEq { attribute, .. }
            | Self::Contains { attribute, .. }
            | Self::StartsWith { attribute, .. }
            | Self::Exists { attribute } => out.push(attribute),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_attributes(out);
                right.collect_attributes(out);
            }
            Self::Not(inner) => inner.collect_attributes(out),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => 1,
            Self::And(..) => 2,
            _ => 3,
        }
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical form: lower-case keywords, `==`, every literal quoted, and
/// parentheses only where needed for the text to parse back to the same tree.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq { attribute, value } => write!(f, "{attribute} == {}", Quoted(value)),
            Self::NotEq { attribute, value } => write!(f, "{attribute} != {}", Quoted(value)),
            Self::Contains { attribute, value } => {
                write!(f, "{attribute} contains {}", Quoted(value))
            }
            Self::StartsWith { attribute, value } => {
                write!(f, "{attribute} starts_with {}", Quoted(value))
            }
            Self::Exists { attribute } => write!(f, "{attribute} exists"),
            Self::Or(left, right) => {
                write_operand(f, left, left.precedence() < 1)?;
                f.write_str(" or ")?;
                write_operand(f, right, right.precedence() <= 1)
            }
            Self::And(left, right) => {
                write_operand(f, left, left.precedence() < 2)?;
                f.write_str(" and ")?;
                write_operand(f, right, right.precedence() <= 2)
            }
            Self::Not(inner) => {
                f.write_str("not ")?;
                write_operand(f, inner, inner.precedence() < 3)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expression, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for ch in self.0.chars() {
            match ch {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                _ => write!(f, "{ch}")?,
            }
        }
        f.write_str("\"")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lexer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    LParen,
    RParen,
    Eq,
    NotEq,
    Word(String),
    Quoted(String),
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            Self::LParen => "(".to_string(),
            Self::RParen => ")".to_string(),
            Self::Eq => "==".to_string(),
            Self::NotEq => "!=".to_string(),
            Self::Word(w) => w.clone(),
            Self::Quoted(s) => format!("\"{s}\""),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | ':' | '-')
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            '=' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                }
                TokenKind::Eq
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => TokenKind::NotEq,
                    _ => return Err(ExpressionError::UnexpectedChar { ch, position }),
                }
            }
            '"' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, escaped)) => literal.push(escaped),
                            None => return Err(ExpressionError::UnterminatedString { position }),
                        },
                        Some((_, c)) => literal.push(c),
                        None => return Err(ExpressionError::UnterminatedString { position }),
                    }
                }
                TokenKind::Quoted(literal)
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                TokenKind::Word(word)
            }
            _ => return Err(ExpressionError::UnexpectedChar { ch, position }),
        };
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

const KEYWORDS: &[&str] = &["and", "or", "not", "contains", "starts_with", "exists"];

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
    terms: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self, expected: &'static str) -> Result<Token, ExpressionError> {
        let token = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or(ExpressionError::UnexpectedEnd { expected })?;
        self.cursor += 1;
        Ok(token)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_some_and(|t| t.kind.is_keyword(keyword)) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(ExpressionError::TooDeep { max: MAX_NESTING });
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = left.or(right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_unary()?;
        while self.eat_keyword("and") {
            let right = self.parse_unary()?;
            left = left.and(right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ExpressionError> {
        if self.eat_keyword("not") {
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(inner.negate());
        }

        if matches!(self.peek(), Some(Token { kind: TokenKind::LParen, .. })) {
            self.cursor += 1;
            self.descend()?;
            let inner = self.parse_or()?;
            self.depth -= 1;
            let close = self.next("\")\"")?;
            if close.kind != TokenKind::RParen {
                return Err(ExpressionError::UnexpectedToken {
                    expected: "\")\"",
                    found: close.kind.describe(),
                    position: close.position,
                });
            }
            return Ok(inner);
        }

        self.parse_term()
    }

    fn parse_term(&mut self) -> Result<Expression, ExpressionError> {
        // bounds the and/or chain length, and with it every recursive walk of the tree
        self.terms += 1;
        if self.terms > MAX_TERMS {
            return Err(ExpressionError::TooLarge { max: MAX_TERMS });
        }
        let token = self.next("attribute path")?;
        let attribute = match token.kind {
            TokenKind::Word(word) if is_valid_path(&word) => word,
            TokenKind::Word(word) => {
                return Err(ExpressionError::InvalidPath {
                    path: word,
                    position: token.position,
                })
            }
            other => {
                return Err(ExpressionError::UnexpectedToken {
                    expected: "attribute path",
                    found: other.describe(),
                    position: token.position,
                })
            }
        };

        let operator = self.next("comparison operator")?;
        let build: fn(String, String) -> Expression = match &operator.kind {
            TokenKind::Eq => |attribute, value| Expression::Eq { attribute, value },
            TokenKind::NotEq => |attribute, value| Expression::NotEq { attribute, value },
            kind if kind.is_keyword("contains") => {
                |attribute, value| Expression::Contains { attribute, value }
            }
            kind if kind.is_keyword("starts_with") => {
                |attribute, value| Expression::StartsWith { attribute, value }
            }
            kind if kind.is_keyword("exists") => return Ok(Expression::Exists { attribute }),
            other => {
                return Err(ExpressionError::UnexpectedToken {
                    expected: "comparison operator",
                    found: other.describe(),
                    position: operator.position,
                })
            }
        };

        let literal = self.next("literal")?;
        let value = match literal.kind {
            TokenKind::Quoted(value) => value,
            TokenKind::Word(word) if !KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k)) => {
                word
            }
            other => {
                return Err(ExpressionError::UnexpectedToken {
                    expected: "literal",
                    found: other.describe(),
                    position: literal.position,
                })
            }
        };

        Ok(build(attribute, value))
    }
}

fn is_valid_path(word: &str) -> bool {
    let mut chars = word.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        && !KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_simple_equality() {
        let expr = Expression::parse(r#"role == "sensor""#).unwrap();
        assert_eq!(expr, Expression::equals("role", "sensor"));

        // bare literal and single '=' are accepted
        assert_eq!(Expression::parse("role = sensor").unwrap(), expr);
    }

    #[test]
    fn test_precedence_and_binds_tighter() {
        let expr = Expression::parse("a == 1 or b == 2 and c == 3").unwrap();
        let expected =
            Expression::equals("a", "1").or(Expression::equals("b", "2").and(Expression::equals("c", "3")));
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let expr = Expression::parse("NOT hw.id EXISTS AND os Contains linux").unwrap();
        let expected = Expression::exists("hw.id").negate().and(Expression::Contains {
            attribute: "os".to_string(),
            value: "linux".to_string(),
        });
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_escaped_literal() {
        let expr = Expression::parse(r#"name == "say \"hi\" \\o/""#).unwrap();
        assert_eq!(expr, Expression::equals("name", r#"say "hi" \o/"#));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Expression::parse("   "), Err(ExpressionError::Empty));
        assert!(matches!(
            Expression::parse(r#"role == "sensor"#),
            Err(ExpressionError::UnterminatedString { position: 8 })
        ));
        assert!(matches!(
            Expression::parse("role =="),
            Err(ExpressionError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            Expression::parse("role ~ x"),
            Err(ExpressionError::UnexpectedChar { ch: '~', .. })
        ));
        assert!(matches!(
            Expression::parse("role == a b"),
            Err(ExpressionError::UnexpectedToken { position: 10, .. })
        ));
        assert!(matches!(
            Expression::parse("(role == a"),
            Err(ExpressionError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            Expression::parse("9lives == a"),
            Err(ExpressionError::InvalidPath { .. })
        ));
        assert!(matches!(
            Expression::parse("role == and"),
            Err(ExpressionError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            Expression::parse("role is x"),
            Err(ExpressionError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}a exists{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert_eq!(
            Expression::parse(&deep),
            Err(ExpressionError::TooDeep { max: MAX_NESTING })
        );

        let ok = format!("{}a exists{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(Expression::parse(&ok).is_ok());
    }

    #[test]
    fn test_term_limit() {
        let chain = |n: usize| vec!["a exists"; n].join(" and ");
        assert!(Expression::parse(&chain(MAX_TERMS)).is_ok());
        assert_eq!(
            Expression::parse(&chain(MAX_TERMS + 1)),
            Err(ExpressionError::TooLarge { max: MAX_TERMS })
        );
        assert_eq!(
            Expression::parse(&vec!["a == 1"; 20_000].join(" or ")),
            Err(ExpressionError::TooLarge { max: MAX_TERMS })
        );
    }

    #[test]
    fn test_missing_attribute_is_false() {
        let empty = AttributeSet::new();
        assert!(!Expression::equals("role", "sensor").matches(&empty));
        assert!(!Expression::parse("role != sensor").unwrap().matches(&empty));
        assert!(!Expression::parse("role contains s").unwrap().matches(&empty));
        assert!(!Expression::exists("role").matches(&empty));
        // negation is structural
        assert!(Expression::equals("role", "sensor").negate().matches(&empty));
    }

    #[test]
    fn test_matching() {
        let device = attrs(&[("role", "sensor"), ("hw.id", "rpi4-b"), ("fw", "2.1.0")]);
        let cases = [
            (r#"role == "sensor""#, true),
            (r#"role == "actuator""#, false),
            ("role != actuator", true),
            ("hw.id contains rpi", true),
            ("fw starts_with 2.", true),
            ("fw starts_with 3.", false),
            ("hw.id exists and not missing exists", true),
            ("(role == actuator or fw == 2.1.0) and hw.id exists", true),
        ];
        for (text, expected) in cases {
            let expr = Expression::parse(text).unwrap();
            assert_eq!(expr.matches(&device), expected, "{text}");
        }
    }

    #[test]
    fn test_referenced_attributes() {
        let expr = Expression::parse("b == 1 or (a exists and b != 2)").unwrap();
        assert_eq!(expr.attributes(), vec!["a", "b"]);
    }

    #[test]
    fn test_canonical_form() {
        let expr = Expression::parse("NOT (a = x OR b = y) AND c contains z").unwrap();
        assert_eq!(
            expr.to_string(),
            r#"not (a == "x" or b == "y") and c contains "z""#
        );
    }

    fn arb_expression() -> impl Strategy<Value = Expression> {
        let attribute = prop::sample::select(vec!["role", "hw.id", "fw", "network.hostname"]);
        let value = "[a-z\"\\\\ ]{0,6}";
        let leaf = prop_oneof![
            (attribute.clone(), value).prop_map(|(a, v)| Expression::equals(a, v)),
            (attribute.clone(), value).prop_map(|(a, v)| Expression::NotEq {
                attribute: a.to_string(),
                value: v,
            }),
            (attribute.clone(), value).prop_map(|(a, v)| Expression::Contains {
                attribute: a.to_string(),
                value: v,
            }),
            attribute.prop_map(|a| Expression::exists(a)),
        ];
        leaf.prop_recursive(4, 24, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(l, r)| l.and(r)),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| l.or(r)),
                inner.prop_map(Expression::negate),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_canonical_text_reparses(expr in arb_expression()) {
            let reparsed = Expression::parse(&expr.to_string()).unwrap();
            prop_assert_eq!(reparsed, expr);
        }

        #[test]
        fn prop_evaluation_is_total(
            expr in arb_expression(),
            role in proptest::option::of("[a-z]{0,4}"),
        ) {
            let mut device = AttributeSet::new();
            if let Some(role) = role {
                device.insert("role", role);
            }
            // never panics, and negation always flips the result
            prop_assert_eq!(expr.clone().negate().matches(&device), !expr.matches(&device));
        }
    }
}

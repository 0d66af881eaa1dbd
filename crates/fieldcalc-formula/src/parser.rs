//! Formula parser
//!
//! A recursive descent parser over the token stream with a fixed precedence
//! table (loosest to tightest):
//!
//! 1. Comparison and concatenation: `=`, `!=`, `<`, `<=`, `>`, `>=`, `&`
//! 2. Addition/Subtraction: `+`, `-`
//! 3. Multiplication/Division/Modulo: `*`, `/`, `%`
//! 4. Exponentiation: `^` (right associative)
//! 5. Unary minus (applies to a primary)
//! 6. Primary: literals, field references, function calls, parentheses
//!
//! Stored formulas are re-parsed on every load, so this table must not change.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::FormulaValue;
use crate::functions::registry;
use crate::lexer::{tokenize_with, Token, TokenKind};
use crate::options::EngineOptions;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a formula string into an AST
///
/// A single leading `=` is accepted and ignored.
///
/// # Example
/// ```rust
/// use fieldcalc_formula::parse_formula;
///
/// let ast = parse_formula("1 + 2").unwrap();
/// let ast = parse_formula("=SUM({Q1}, {Q2})").unwrap();
/// let ast = parse_formula("IF({Amount} > 0, \"Yes\", \"No\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    parse_formula_with(formula, &EngineOptions::default())
}

/// Parse a formula string into an AST using the given options
pub fn parse_formula_with(formula: &str, options: &EngineOptions) -> FormulaResult<FormulaExpr> {
    let tokens = tokenize_with(strip_leading_equals(formula), options)?;
    parse_with(&tokens, options)
}

/// Parse a token stream into an AST
pub fn parse(tokens: &[Token]) -> FormulaResult<FormulaExpr> {
    parse_with(tokens, &EngineOptions::default())
}

/// Parse a token stream into an AST using the given options
pub fn parse_with(tokens: &[Token], options: &EngineOptions) -> FormulaResult<FormulaExpr> {
    let mut parser = TokenParser::new(tokens, options.max_nesting_depth);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if let Some(token) = parser.current() {
        return Err(unexpected(token));
    }

    Ok(expr)
}

pub(crate) fn strip_leading_equals(formula: &str) -> &str {
    let trimmed = formula.trim_start();
    trimmed.strip_prefix('=').unwrap_or(trimmed)
}

fn unexpected(token: &Token) -> FormulaError {
    FormulaError::UnexpectedToken {
        lexeme: token.to_string(),
        position: token.position,
    }
}

struct TokenParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> TokenParser<'a> {
    fn new(tokens: &'a [Token], max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    // === Helper methods ===

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> FormulaResult<&'a Token> {
        let token = self.current().ok_or(FormulaError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> FormulaResult<()> {
        match self.current() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(FormulaError::Parse(format!(
                "Expected {} at position {}, got '{}'",
                what, token.position, token
            ))),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn current_operator(&self) -> Option<&'a str> {
        self.current()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.lexeme.as_str())
    }

    fn enter(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(FormulaError::NestingTooDeep {
                max: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // === Expression parsing with precedence ===

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.enter()?;
        let mut left = self.parse_term()?;

        while let Some(op) = self.current_operator().and_then(comparison_operator) {
            self.pos += 1;
            let right = self.parse_term()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.leave();
        Ok(left)
    }

    fn parse_term(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.current_operator() {
                Some("+") => BinaryOperator::Add,
                Some("-") => BinaryOperator::Subtract,
                _ => break,
            };

            self.pos += 1;
            let right = self.parse_factor()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_power()?;

        loop {
            let op = match self.current_operator() {
                Some("*") => BinaryOperator::Multiply,
                Some("/") => BinaryOperator::Divide,
                Some("%") => BinaryOperator::Modulo,
                _ => break,
            };

            self.pos += 1;
            let right = self.parse_power()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_power(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_unary()?;

        if self.current_operator() == Some("^") {
            self.pos += 1;
            self.enter()?;
            let right = self.parse_power()?; // Right associative
            self.leave();
            return Ok(FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        if self.current_operator() == Some("-") {
            self.pos += 1;
            let operand = self.parse_primary()?;
            return Ok(FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        let token = self.consume()?;

        match token.kind {
            TokenKind::Number => parse_number(token).map(FormulaExpr::Literal),

            TokenKind::String => Ok(FormulaExpr::Literal(FormulaValue::String(
                token.lexeme.clone(),
            ))),

            TokenKind::Bool => Ok(FormulaExpr::Literal(FormulaValue::Boolean(
                token.lexeme.eq_ignore_ascii_case("TRUE"),
            ))),

            TokenKind::FieldRef => Ok(FormulaExpr::FieldRef(token.lexeme.clone())),

            TokenKind::FuncName => self.parse_function_call(token),

            TokenKind::LParen => {
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }

            TokenKind::Ident => {
                if self
                    .current()
                    .map_or(false, |t| t.kind == TokenKind::LParen)
                {
                    Err(FormulaError::UnknownFunction(token.lexeme.to_uppercase()))
                } else {
                    Err(FormulaError::Parse(format!(
                        "Unknown identifier '{}' at position {} (field references are written as {{Name}})",
                        token.lexeme, token.position
                    )))
                }
            }

            TokenKind::Operator | TokenKind::RParen | TokenKind::Comma => Err(unexpected(token)),
        }
    }

    fn parse_function_call(&mut self, name_token: &Token) -> FormulaResult<FormulaExpr> {
        let name = name_token.lexeme.to_uppercase();
        self.expect(TokenKind::LParen, &format!("'(' after {}", name))?;
        self.enter()?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current(), Some(t) if t.kind == TokenKind::RParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current(), Some(t) if t.kind == TokenKind::Comma) {
                self.pos += 1;
                args.push(self.parse_expression()?);
            }
        }

        self.expect(TokenKind::RParen, "',' or ')'")?;
        self.leave();

        check_arity(&name, args.len())?;

        Ok(FormulaExpr::Call { name, args })
    }
}

fn comparison_operator(lexeme: &str) -> Option<BinaryOperator> {
    match lexeme {
        "=" | "==" => Some(BinaryOperator::Equal),
        "!=" => Some(BinaryOperator::NotEqual),
        "<" => Some(BinaryOperator::LessThan),
        "<=" => Some(BinaryOperator::LessEqual),
        ">" => Some(BinaryOperator::GreaterThan),
        ">=" => Some(BinaryOperator::GreaterEqual),
        "&" => Some(BinaryOperator::Concat),
        _ => None,
    }
}

fn parse_number(token: &Token) -> FormulaResult<FormulaValue> {
    let text = token.lexeme.trim_end_matches('.');
    let normalized = if text.starts_with('.') {
        format!("0{}", text)
    } else {
        text.to_string()
    };

    Decimal::from_str(&normalized)
        .map(FormulaValue::Number)
        .map_err(|_| {
            FormulaError::Parse(format!(
                "Invalid number '{}' at position {}",
                token.lexeme, token.position
            ))
        })
}

/// Check a call's argument count against the registry
pub(crate) fn check_arity(name: &str, actual: usize) -> FormulaResult<()> {
    let func = registry()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    if actual < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: func.arity_description(),
            actual,
        });
    }

    if let Some(max) = func.max_args {
        if actual > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: func.arity_description(),
                actual,
            });
        }
    }

    Ok(())
}

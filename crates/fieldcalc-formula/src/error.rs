//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    // === Definition-time (parse) errors ===
    /// Generic parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Tokens ran out while an expression was still expected
    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    /// A token appeared where the grammar does not allow it
    #[error("Unexpected '{lexeme}' at position {position}")]
    UnexpectedToken { lexeme: String, position: usize },

    /// String literal without closing quote
    #[error("Unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    /// Field reference without closing brace
    #[error("Missing closing '}}' for field reference starting at position {position}")]
    UnterminatedFieldRef { position: usize },

    /// Character that cannot start any token
    #[error("Unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    /// Unknown function or bare identifier
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Formula text exceeds the configured length
    #[error("Formula is too long: {length} bytes (max {max})")]
    FormulaTooLong { length: usize, max: usize },

    /// Formula exceeds the configured token count
    #[error("Formula has too many tokens (max {max})")]
    TooManyTokens { max: usize },

    /// Formula exceeds the configured nesting depth
    #[error("Formula is nested too deeply (max {max})")]
    NestingTooDeep { max: usize },

    // === Runtime (evaluation) errors ===
    /// Division or modulo by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Operand of the wrong type for an operator
    #[error("Cannot apply '{operator}' to {value}")]
    TypeMismatch { operator: String, value: String },

    /// Invalid function argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Error raised by ERROR()
    #[error("{0}")]
    Explicit(String),

    /// Other evaluation failure
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

impl FormulaError {
    /// Check if this error is a definition-time (structural) error
    ///
    /// Definition-time errors are reported when a formula is saved; all
    /// other errors only occur while evaluating against a record.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            FormulaError::Parse(_)
                | FormulaError::UnexpectedEnd
                | FormulaError::UnexpectedToken { .. }
                | FormulaError::UnterminatedString { .. }
                | FormulaError::UnterminatedFieldRef { .. }
                | FormulaError::UnexpectedCharacter { .. }
                | FormulaError::UnknownFunction(_)
                | FormulaError::ArgumentCount { .. }
                | FormulaError::FormulaTooLong { .. }
                | FormulaError::TooManyTokens { .. }
                | FormulaError::NestingTooDeep { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(FormulaError::UnexpectedEnd.is_definition_error());
        assert!(FormulaError::UnknownFunction("FOO".into()).is_definition_error());
        assert!(!FormulaError::DivisionByZero.is_definition_error());
        assert!(!FormulaError::Explicit("bad".into()).is_definition_error());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FormulaError::UnterminatedFieldRef { position: 4 }.to_string(),
            "Missing closing '}' for field reference starting at position 4"
        );
        assert_eq!(FormulaError::Explicit("Bad input".into()).to_string(), "Bad input");
    }
}

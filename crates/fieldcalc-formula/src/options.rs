//! Engine options

/// How the tokenizer treats characters that cannot start a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UnknownCharacterPolicy {
    /// Fail with a parse error
    #[default]
    Reject,
    /// Skip the character and keep scanning
    Skip,
}

/// Month/year arithmetic used by DATEADD and DATEDIF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DateArithmetic {
    /// A month is 30 days and a year is 365 days
    #[default]
    Approximate,
    /// Calendar months and years (end-of-month clamped)
    Calendar,
}

/// Options for parsing and evaluating formulas
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineOptions {
    /// Maximum formula length in bytes (default: 8192)
    pub max_formula_length: usize,
    /// Maximum number of tokens per formula (default: 2048)
    pub max_tokens: usize,
    /// Maximum parenthesis/call nesting depth (default: 64)
    pub max_nesting_depth: usize,
    /// Unknown character handling in the tokenizer (default: reject)
    pub unknown_characters: UnknownCharacterPolicy,
    /// Month/year arithmetic for date functions (default: approximate)
    pub date_arithmetic: DateArithmetic,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_formula_length: 8192,
            max_tokens: 2048,
            max_nesting_depth: 64,
            unknown_characters: UnknownCharacterPolicy::Reject,
            date_arithmetic: DateArithmetic::Approximate,
        }
    }
}

//! Formula tokenizer
//!
//! Turns formula text into a flat token stream. Field references are written
//! as `{Display Name}`, strings use double or single quotes (a doubled quote
//! inside a literal is an escaped quote), and identifiers are classified as
//! booleans, registered function names, or bare identifiers.

use crate::error::{FormulaError, FormulaResult};
use crate::functions::registry;
use crate::options::{EngineOptions, UnknownCharacterPolicy};
use std::fmt;

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Number,
    String,
    Bool,
    FieldRef,
    FuncName,
    Ident,
    Operator,
    LParen,
    RParen,
    Comma,
}

/// A single token
///
/// For strings and field references the lexeme holds the decoded contents
/// without delimiters; for everything else it is the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// Byte offset of the token in the formula text
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    /// Check if this is the operator `op`
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.lexeme == op
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::String => write!(f, "\"{}\"", self.lexeme),
            TokenKind::FieldRef => write!(f, "{{{}}}", self.lexeme),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

/// Tokenize a formula with default options
pub fn tokenize(text: &str) -> FormulaResult<Vec<Token>> {
    tokenize_with(text, &EngineOptions::default())
}

/// Tokenize a formula
pub fn tokenize_with(text: &str, options: &EngineOptions) -> FormulaResult<Vec<Token>> {
    if text.len() > options.max_formula_length {
        return Err(FormulaError::FormulaTooLong {
            length: text.len(),
            max: options.max_formula_length,
        });
    }

    let mut lexer = Lexer::new(text, options);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        if tokens.len() == options.max_tokens {
            return Err(FormulaError::TooManyTokens {
                max: options.max_tokens,
            });
        }
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    options: &'a EngineOptions,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, options: &'a EngineOptions) -> Self {
        Self {
            input,
            pos: 0,
            options,
        }
    }

    fn next_token(&mut self) -> FormulaResult<Option<Token>> {
        loop {
            self.skip_whitespace();

            let Some(c) = self.peek_char() else {
                return Ok(None);
            };
            let start = self.pos;

            match c {
                '+' | '-' | '*' | '/' | '%' | '^' | '&' => {
                    self.advance();
                    return Ok(Some(Token::new(TokenKind::Operator, c, start)));
                }
                '(' => {
                    self.advance();
                    return Ok(Some(Token::new(TokenKind::LParen, "(", start)));
                }
                ')' => {
                    self.advance();
                    return Ok(Some(Token::new(TokenKind::RParen, ")", start)));
                }
                ',' => {
                    self.advance();
                    return Ok(Some(Token::new(TokenKind::Comma, ",", start)));
                }
                '=' | '<' | '>' => {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                    }
                    let lexeme = &self.input[start..self.pos];
                    return Ok(Some(Token::new(TokenKind::Operator, lexeme, start)));
                }
                '!' if self.peek_char_at(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    return Ok(Some(Token::new(TokenKind::Operator, "!=", start)));
                }
                '{' => return self.scan_field_ref().map(Some),
                '"' | '\'' => return self.scan_string(c).map(Some),
                _ => {}
            }

            if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
            {
                return Ok(Some(self.scan_number()));
            }

            if c.is_ascii_alphabetic() || c == '_' {
                return Ok(Some(self.scan_identifier()));
            }

            match self.options.unknown_characters {
                UnknownCharacterPolicy::Reject => {
                    return Err(FormulaError::UnexpectedCharacter {
                        ch: c,
                        position: start,
                    })
                }
                UnknownCharacterPolicy::Skip => self.advance(),
            }
        }
    }

    fn scan_field_ref(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip '{'

        let content_start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '}' {
                let name = self.input[content_start..self.pos].trim();
                self.advance();
                return Ok(Token::new(TokenKind::FieldRef, name, start));
            }
            self.advance();
        }

        Err(FormulaError::UnterminatedFieldRef { position: start })
    }

    fn scan_string(&mut self, quote: char) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == quote {
                // Doubled quote is an escaped quote
                if self.peek_char_at(1) == Some(quote) {
                    s.push(quote);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    return Ok(Token::new(TokenKind::String, s, start));
                }
            } else {
                s.push(c);
                self.advance();
            }
        }

        Err(FormulaError::UnterminatedString { position: start })
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        let mut seen_dot = false;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Number, &self.input[start..self.pos], start)
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        let kind = if text.eq_ignore_ascii_case("TRUE") || text.eq_ignore_ascii_case("FALSE") {
            TokenKind::Bool
        } else if registry().contains(text) {
            TokenKind::FuncName
        } else {
            TokenKind::Ident
        };

        Token::new(kind, text, start)
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.lexeme))
            .collect()
    }

    #[test]
    fn test_tokenize_arithmetic() {
        assert_eq!(
            kinds("1 + 2.5*.5"),
            vec![
                (TokenKind::Number, "1".into()),
                (TokenKind::Operator, "+".into()),
                (TokenKind::Number, "2.5".into()),
                (TokenKind::Operator, "*".into()),
                (TokenKind::Number, ".5".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_field_refs_and_strings() {
        assert_eq!(
            kinds("{ Unit Price } & \"a \"\"b\"\"\" & 'it''s'"),
            vec![
                (TokenKind::FieldRef, "Unit Price".into()),
                (TokenKind::Operator, "&".into()),
                (TokenKind::String, "a \"b\"".into()),
                (TokenKind::Operator, "&".into()),
                (TokenKind::String, "it's".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_comparisons() {
        let ops: Vec<_> = kinds("1 = 2 == 3 != 4 < 5 <= 6 > 7 >= 8")
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Operator)
            .map(|(_, l)| l)
            .collect();
        assert_eq!(ops, vec!["=", "==", "!=", "<", "<=", ">", ">="]);
    }

    #[test]
    fn test_tokenize_identifiers() {
        assert_eq!(
            kinds("if(True, sum(1), foo)"),
            vec![
                (TokenKind::FuncName, "if".into()),
                (TokenKind::LParen, "(".into()),
                (TokenKind::Bool, "True".into()),
                (TokenKind::Comma, ",".into()),
                (TokenKind::FuncName, "sum".into()),
                (TokenKind::LParen, "(".into()),
                (TokenKind::Number, "1".into()),
                (TokenKind::RParen, ")".into()),
                (TokenKind::Comma, ",".into()),
                (TokenKind::Ident, "foo".into()),
                (TokenKind::RParen, ")".into()),
            ]
        );
    }

    #[test]
    fn test_number_with_two_dots_splits() {
        assert_eq!(
            kinds("1.2.3"),
            vec![
                (TokenKind::Number, "1.2".into()),
                (TokenKind::Number, ".3".into()),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("  {A} +  7").unwrap();
        let positions: Vec<_> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![2, 6, 9]);
    }

    #[test]
    fn test_unterminated() {
        assert_eq!(
            tokenize("{Amount + 1"),
            Err(FormulaError::UnterminatedFieldRef { position: 0 })
        );
        assert_eq!(
            tokenize("1 & \"abc"),
            Err(FormulaError::UnterminatedString { position: 4 })
        );
    }

    #[test]
    fn test_unknown_character_policy() {
        assert_eq!(
            tokenize("1 # 2"),
            Err(FormulaError::UnexpectedCharacter { ch: '#', position: 2 })
        );
        assert!(tokenize("!").is_err());

        let options = EngineOptions {
            unknown_characters: UnknownCharacterPolicy::Skip,
            ..EngineOptions::default()
        };
        let tokens = tokenize_with("1 # + $2", &options).unwrap();
        let lexemes: Vec<_> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["1", "+", "2"]);
    }

    #[test]
    fn test_resource_limits() {
        let options = EngineOptions {
            max_formula_length: 5,
            ..EngineOptions::default()
        };
        assert!(matches!(
            tokenize_with("1+2+3+4", &options),
            Err(FormulaError::FormulaTooLong { length: 7, max: 5 })
        ));

        let options = EngineOptions {
            max_tokens: 3,
            ..EngineOptions::default()
        };
        assert!(tokenize_with("1+2", &options).is_ok());
        assert_eq!(
            tokenize_with("1+2+3", &options),
            Err(FormulaError::TooManyTokens { max: 3 })
        );
    }

    #[test]
    fn test_token_display() {
        let tokens = tokenize("{A} & \"x\"").unwrap();
        let shown: Vec<_> = tokens.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["{A}", "&", "\"x\""]);
    }
}

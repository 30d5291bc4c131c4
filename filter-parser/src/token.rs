//! FILENAME: filter-parser/src/token.rs
//! PURPOSE: Token definitions for the filter lexer.

/// Tokens recognized by the filter lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    /// Raw text between operators, untrimmed.
    Operand(String),

    // Operators
    Equals,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    /// Range separator: <>
    RangeSeparator,

    // Special
    EOF,
}

impl Token {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Token::Equals | Token::LessThan | Token::GreaterThan | Token::LessEqual | Token::GreaterEqual
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Operand(s) => write!(f, "{}", s),
            Token::Equals => write!(f, "="),
            Token::LessThan => write!(f, "<"),
            Token::GreaterThan => write!(f, ">"),
            Token::LessEqual => write!(f, "<="),
            Token::GreaterEqual => write!(f, ">="),
            Token::RangeSeparator => write!(f, "<>"),
            Token::EOF => write!(f, "EOF"),
        }
    }
}

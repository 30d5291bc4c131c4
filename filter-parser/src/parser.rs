//! FILENAME: filter-parser/src/parser.rs
//! PURPOSE: Converts a stream of Tokens into a FilterExpression.
//! CONTEXT: The grammar is flat, so this is a small state machine over the
//! token stream rather than a full descent parser.
//!
//! GRAMMAR:
//!   filter      --> range | comparison | number
//!   range       --> NUMBER "<>" NUMBER
//!   comparison  --> ("<=" | ">=" | "<" | ">" | "=") NUMBER
//!   number      --> NUMBER
//!   NUMBER      --> operand that parses as a finite f64 once whitespace is removed
//!
//! Anything the grammar rejects is not an error for callers: `parse_filter`
//! falls back to free-text matching.

use crate::ast::{ComparisonOperator, FilterExpression};
use crate::lexer::Lexer;
use crate::token::Token;

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    /// Parses the entire input as a numeric filter.
    pub fn parse(&mut self) -> ParseResult<FilterExpression> {
        let expr = match self.current_token.clone() {
            Token::EOF => return Err(ParseError::new("Empty expression")),
            op if op.is_comparison() => {
                self.advance();
                let value = self.expect_number()?;
                FilterExpression::Compare {
                    op: comparison_operator(&op)?,
                    value,
                }
            }
            Token::Operand(text) => {
                let first = parse_operand(&text)?;
                self.advance();
                if self.current_token == Token::RangeSeparator {
                    self.advance();
                    let second = self.expect_number()?;
                    FilterExpression::Range {
                        min: first.min(second),
                        max: first.max(second),
                    }
                } else {
                    FilterExpression::NumberText(strip_whitespace(&text))
                }
            }
            other => {
                return Err(ParseError::new(format!("Unexpected token: {}", other)));
            }
        };

        // Ensure we consumed all tokens
        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected token after expression: {}",
                self.current_token
            )));
        }

        Ok(expr)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Consumes an operand token that must read as a number.
    fn expect_number(&mut self) -> ParseResult<f64> {
        match &self.current_token {
            Token::Operand(text) => {
                let value = parse_operand(text)?;
                self.advance();
                Ok(value)
            }
            other => Err(ParseError::new(format!("Expected number, found {}", other))),
        }
    }
}

fn comparison_operator(token: &Token) -> ParseResult<ComparisonOperator> {
    match token {
        Token::Equals => Ok(ComparisonOperator::Equal),
        Token::LessThan => Ok(ComparisonOperator::LessThan),
        Token::LessEqual => Ok(ComparisonOperator::LessEqual),
        Token::GreaterThan => Ok(ComparisonOperator::GreaterThan),
        Token::GreaterEqual => Ok(ComparisonOperator::GreaterEqual),
        other => Err(ParseError::new(format!("Not a comparison: {}", other))),
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Reads an operand as a finite number, ignoring internal whitespace.
fn parse_operand(text: &str) -> ParseResult<f64> {
    let cleaned = strip_whitespace(text);
    if cleaned.is_empty() {
        return Err(ParseError::new("Missing number"));
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ParseError::new(format!("Not a number: {}", cleaned))),
    }
}

/// Strict entry point: parses text as a numeric filter or fails.
pub fn parse(input: &str) -> ParseResult<FilterExpression> {
    Parser::new(input.trim()).parse()
}

/// Total entry point used by the filter engine. Blank input means "no
/// filter"; text the numeric grammar rejects becomes a free-text filter.
pub fn parse_filter(input: &str) -> Option<FilterExpression> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(parse(trimmed).unwrap_or_else(|_| FilterExpression::Text(trimmed.to_string())))
}

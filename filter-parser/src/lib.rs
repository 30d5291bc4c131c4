//! FILENAME: filter-parser/src/lib.rs
//! PURPOSE: Library root for the column filter expression parser.
//! CONTEXT: Numeric columns accept a small expression language in their filter
//! box. This crate turns the typed text into a `FilterExpression` and knows how
//! to test a cell against it.
//!
//! PIPELINE: Filter Text --> Lexer --> Tokens --> Parser --> FilterExpression
//!
//! SUPPORTED FORMS (checked in this order):
//! - Range: `10<>20` (bounds reordered so min <= max)
//! - Comparators: `<=5`, `>=5`, `<5`, `>5`, `=5`
//! - Bare number: `42` (substring match on the cell text)
//! - Anything else: case-insensitive substring match

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;


pub use ast::{ComparisonOperator, FilterExpression};
pub use lexer::Lexer;
pub use parser::{parse, parse_filter, ParseError, ParseResult, Parser};
pub use token::Token;

//! FILENAME: filter-parser/src/lexer.rs
//! PURPOSE: Scans filter text and produces a stream of Tokens.
//! CONTEXT: Only `<`, `>` and `=` are significant. Everything between them is
//! collected verbatim into an Operand token; the parser decides whether it
//! reads as a number.
//!
//! SUPPORTED OPERATORS:
//! - Single char: = < >
//! - Multi char: <= >= <>

use crate::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        match self.input.peek() {
            None => Token::EOF,
            Some('=') => {
                self.input.next();
                Token::Equals
            }
            Some('<') => {
                self.input.next();
                self.read_less_than_operator()
            }
            Some('>') => {
                self.input.next();
                self.read_greater_than_operator()
            }
            Some(_) => self.read_operand(),
        }
    }

    /// Handles operators starting with '<': <, <=, <>
    fn read_less_than_operator(&mut self) -> Token {
        match self.input.peek() {
            Some('=') => {
                self.input.next();
                Token::LessEqual
            }
            Some('>') => {
                self.input.next();
                Token::RangeSeparator
            }
            _ => Token::LessThan,
        }
    }

    /// Handles operators starting with '>': >, >=
    fn read_greater_than_operator(&mut self) -> Token {
        match self.input.peek() {
            Some('=') => {
                self.input.next();
                Token::GreaterEqual
            }
            _ => Token::GreaterThan,
        }
    }

    fn read_operand(&mut self) -> Token {
        let mut result = String::new();
        while let Some(&ch) = self.input.peek() {
            if is_operator_char(ch) {
                break;
            }
            result.push(ch);
            self.input.next();
        }
        Token::Operand(result)
    }
}

fn is_operator_char(ch: char) -> bool {
    matches!(ch, '<' | '>' | '=')
}

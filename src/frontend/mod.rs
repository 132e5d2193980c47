//! Frontend module - Lexer, Parser, AST

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;

use crate::utils::ParseErrors;

use ast::Program;
use lexer::Lexer;
use parser::Parser;

/// Parse a whole source text. Any parse error rejects the program.
pub fn parse(source: &str) -> Result<Program, ParseErrors> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse();
    let errors = parser.into_errors();

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(ParseErrors(errors))
    }
}

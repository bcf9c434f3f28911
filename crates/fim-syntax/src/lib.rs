pub mod ast;
pub mod lexer;
pub mod parser;
pub mod types;

use crate::ast::Program;
use crate::parser::Parser;

use fim_common::error::Result;

pub fn parse(source: &str) -> Result<Program> {
    let tokens = lexer::tokenize(source);
    let program = Parser::new(tokens).parse()?;
    tracing::debug!(stmts = program.stmts.len(), "parsed program");
    Ok(program)
}

pub mod token;
pub mod config;
pub mod error;
pub mod lexer;
pub mod types;
pub mod ast;
pub mod env;
pub mod context;
pub mod typeck;
pub mod reorder;
pub mod parser;
pub mod asm;
pub mod codegen;

use tracing::debug;

pub use asm::{decode_value, RuntimeValue};
pub use ast::{Node, NodeKind, Program};
pub use config::{CompileOptions, NewlineMode};
pub use context::CompilationContext;
pub use env::Environment;
pub use error::{CompileFailure, CompileResult, Diagnostic, DiagnosticKind, DiagnosticLog};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Position, Token, TokenKind};
pub use types::ValueType;

/// Lexes `source`, failing if any token was invalid.
pub fn tokenize(source: &str, options: &CompileOptions) -> CompileResult<Vec<Token>> {
    let mut log = DiagnosticLog::new();
    let tokens = lexer::tokenize(source, options, &mut log);
    log.check()?;
    Ok(tokens)
}

/// Lexes and parses `source` into a typed tree. Lexical diagnostics do not
/// stop parsing; everything found is reported together.
pub fn parse(source: &str, options: &CompileOptions) -> CompileResult<Program> {
    let mut ctx = CompilationContext::new(options.clone());
    let tokens = lexer::tokenize(source, options, &mut ctx.log);
    let program = Parser::new(tokens, &mut ctx).parse_program();
    ctx.log.check()?;
    Ok(program)
}

/// Compiles `source` to assembly text. No text is produced when any
/// diagnostic was recorded.
pub fn compile(source: &str, options: &CompileOptions) -> CompileResult<String> {
    let program = parse(source, options)?;
    let asm = codegen::generate(&program, options);
    debug!(source = %options.source_name, lines = asm.lines().count(), "compiled");
    Ok(asm)
}

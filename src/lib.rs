//! Kestrel
//!
//! A small imperative scripting language: lexer, parser and a tree-walking
//! interpreter with a pluggable builtin registry.

pub mod frontend;
pub mod interpreter;
pub mod stdlib;
pub mod utils;
pub mod feedback;

pub use interpreter::{Interpreter, Value};
pub use stdlib::BuiltinRegistry;
pub use utils::{Error, ParseError, ParseErrors, RuntimeError, Span};

/// Parse and run `source` with the standard builtins
pub fn run(source: &str) -> Result<(), Error> {
    Interpreter::new(BuiltinRegistry::standard()).eval_source(source)
}

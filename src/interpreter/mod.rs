//! Interpreter module - values, scopes and the tree-walking evaluator

pub mod value;
pub mod environment;
pub mod evaluator;

pub use environment::{Environment, ScopeId};
pub use evaluator::Interpreter;
pub use value::{Function, Value};

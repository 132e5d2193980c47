//! Standard library: builtins available to every script

pub mod builtins;

pub use builtins::{BuiltinFn, BuiltinRegistry, Input, Output};

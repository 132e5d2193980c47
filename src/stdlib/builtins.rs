//! Built-in Functions Registry
//!
//! Defines the builtins the interpreter falls back to when a called name has
//! no user-defined binding. Builtins never fail the run: misuse comes back
//! as a `Value::Error`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

use log::trace;

use crate::interpreter::Value;

/// A builtin: takes the evaluated arguments, returns one value
pub type BuiltinFn = Rc<dyn Fn(&[Value]) -> Value>;

/// Shared output sink used by `print` and the `input` prompt
pub type Output = Rc<RefCell<dyn Write>>;

/// Shared line source used by `input`
pub type Input = Rc<RefCell<dyn BufRead>>;

/// Registry of all built-in functions
#[derive(Clone)]
pub struct BuiltinRegistry {
    functions: HashMap<String, BuiltinFn>,
}

impl BuiltinRegistry {
    /// A registry with no builtins at all
    pub fn empty() -> Self {
        Self { functions: HashMap::new() }
    }

    /// The standard builtins wired to the process's stdin and stdout
    pub fn standard() -> Self {
        let output: Output = Rc::new(RefCell::new(io::stdout()));
        let input: Input = Rc::new(RefCell::new(BufReader::new(io::stdin())));
        Self::with_io(output, input)
    }

    /// The standard builtins reading from `input` and writing to `output`
    pub fn with_io(output: Output, input: Input) -> Self {
        let mut registry = Self::empty();

        let print_out = Rc::clone(&output);
        registry.register("print", move |args| print(&print_out, args));
        registry.register("input", move |args| read_input(&output, &input, args));
        registry.register("substr", substr);
        registry.register("length", length);
        registry.register("append", append);
        registry.register("string", string);

        registry
    }

    /// Add or replace a builtin
    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        self.functions.insert(name.to_string(), Rc::new(func));
    }

    /// Check if a function is a built-in
    pub fn is_builtin(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Get a built-in function by name
    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.functions.get(name).cloned()
    }

    /// Names of all registered builtins, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Writes nothing at all when called without arguments
fn print(output: &Output, args: &[Value]) -> Value {
    if args.is_empty() {
        return Value::Null;
    }
    let line = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().join(" ");
    let mut out = output.borrow_mut();
    match writeln!(out, "{}", line) {
        Ok(()) => Value::Null,
        Err(e) => Value::error(format!("print failed: {}", e)),
    }
}

fn read_input(output: &Output, input: &Input, args: &[Value]) -> Value {
    if args.len() > 1 {
        return Value::error(format!(
            "input expects 0 or 1 arguments but received {}",
            args.len()
        ));
    }

    if let Some(prompt) = args.first() {
        let prompt = match prompt.as_str() {
            Some(prompt) => prompt,
            None => {
                return Value::error(format!(
                    "input expects string argument but received object of type {}",
                    prompt.type_name()
                ))
            }
        };
        let mut out = output.borrow_mut();
        if let Err(e) = write!(out, "{}", prompt).and_then(|_| out.flush()) {
            return Value::error(format!("input failed: {}", e));
        }
    }

    let mut line = String::new();
    if let Err(e) = input.borrow_mut().read_line(&mut line) {
        return Value::error(format!("input failed: {}", e));
    }
    let trimmed = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
    trace!("input read {} bytes", trimmed.len());
    Value::string(trimmed)
}

fn substr(args: &[Value]) -> Value {
    let text = match args.first() {
        Some(Value::Str(text)) => text,
        Some(other) => {
            return Value::error(format!(
                "object of type {} has no function substr",
                other.type_name()
            ))
        }
        None => return Value::error("substr expects a string"),
    };

    if args.len() < 2 || args.len() > 3 {
        return Value::error("must provide one or two arguments to substr function");
    }

    let chars: Vec<char> = text.chars().collect();
    let start = match args[1].as_integer() {
        Some(start) => start,
        None => return Value::error("arguments must be integers"),
    };
    let end = match args.get(2) {
        Some(end) => match end.as_integer() {
            Some(end) => end,
            None => return Value::error("arguments must be integers"),
        },
        None => chars.len() as i64,
    };

    if start < 0 || end < start || end > chars.len() as i64 {
        return Value::error(format!(
            "substr range {}..{} out of bounds for string of length {}",
            start,
            end,
            chars.len()
        ));
    }

    Value::string(chars[start as usize..end as usize].iter().collect::<String>())
}

fn length(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error("length function takes no arguments");
    }

    match &args[0] {
        Value::Str(text) => Value::Integer(text.chars().count() as i64),
        Value::Array(items) => Value::Integer(items.borrow().len() as i64),
        other => Value::error(format!(
            "object of type {} has no function length",
            other.type_name()
        )),
    }
}

fn append(args: &[Value]) -> Value {
    let items = match args.first() {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Value::error(format!(
                "object of type {} has no function append",
                other.type_name()
            ))
        }
        None => return Value::error("append expects an array"),
    };

    if args.len() != 2 {
        return Value::error("append takes exactly one argument");
    }

    items.borrow_mut().push(args[1].clone());
    args[0].clone()
}

fn string(args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error("string takes exactly one argument");
    }
    Value::string(args[0].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn io_registry(stdin: &str) -> (BuiltinRegistry, Rc<RefCell<Vec<u8>>>) {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let output: Output = buffer.clone();
        let input: Input = Rc::new(RefCell::new(Cursor::new(stdin.as_bytes().to_vec())));
        (BuiltinRegistry::with_io(output, input), buffer)
    }

    fn call(registry: &BuiltinRegistry, name: &str, args: &[Value]) -> Value {
        let func = registry.get(name).expect("builtin registered");
        func(args)
    }

    #[test]
    fn test_standard_names() {
        let registry = BuiltinRegistry::standard();
        assert_eq!(
            registry.names(),
            vec!["append", "input", "length", "print", "string", "substr"]
        );
        assert!(!registry.is_builtin("open"));
    }

    #[test]
    fn test_print_joins_with_spaces() {
        let (registry, buffer) = io_registry("");
        let result = call(
            &registry,
            "print",
            &[Value::string("x ="), Value::Float(1.5), Value::error("oops")],
        );
        assert_eq!(result, Value::Null);
        assert_eq!(String::from_utf8_lossy(&buffer.borrow()), "x = 1.5 oops\n");
    }

    #[test]
    fn test_print_without_arguments_writes_nothing() {
        let (registry, buffer) = io_registry("");
        assert_eq!(call(&registry, "print", &[]), Value::Null);
        assert!(buffer.borrow().is_empty());
    }

    #[test]
    fn test_input_with_prompt() {
        let (registry, buffer) = io_registry("alice\r\nbob\n");
        assert_eq!(call(&registry, "input", &[Value::string("name? ")]), Value::string("alice"));
        assert_eq!(call(&registry, "input", &[]), Value::string("bob"));
        assert_eq!(String::from_utf8_lossy(&buffer.borrow()), "name? ");
        assert!(call(&registry, "input", &[Value::Integer(1)]).is_error());
    }

    #[test]
    fn test_substr() {
        let s = Value::string("héllo");
        assert_eq!(substr(&[s.clone(), Value::Integer(1), Value::Integer(3)]), Value::string("él"));
        assert_eq!(substr(&[s.clone(), Value::Integer(2)]), Value::string("llo"));
        assert!(substr(&[s.clone(), Value::Integer(4), Value::Integer(2)]).is_error());
        assert!(substr(&[s.clone(), Value::Integer(-1)]).is_error());
        assert!(substr(&[s.clone(), Value::Integer(0), Value::Integer(9)]).is_error());
        assert!(substr(&[s, Value::Float(1.0)]).is_error());
        assert!(substr(&[Value::Integer(3), Value::Integer(0)]).is_error());
    }

    #[test]
    fn test_length() {
        assert_eq!(length(&[Value::string("abc")]), Value::Integer(3));
        assert_eq!(
            length(&[Value::array(vec![Value::Null, Value::Null])]),
            Value::Integer(2)
        );
        assert_eq!(
            length(&[Value::Boolean(true)]),
            Value::error("object of type BOOLEAN has no function length")
        );
        assert!(length(&[Value::string("a"), Value::Integer(1)]).is_error());
    }

    #[test]
    fn test_append_mutates_in_place() {
        let arr = Value::array(vec![Value::Integer(1)]);
        let result = append(&[arr.clone(), Value::Integer(2)]);
        assert!(result.same_array(&arr));
        assert_eq!(arr.to_string(), "[1,2]");
        assert!(append(&[Value::string("no"), Value::Integer(2)]).is_error());
        assert!(append(&[arr]).is_error());
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(string(&[Value::Integer(12)]), Value::string("12"));
        assert_eq!(string(&[Value::array(vec![Value::Boolean(true)])]), Value::string("[true]"));
        assert!(string(&[]).is_error());
    }
}

//! Runtime values
//!
//! Every variant is copied on assignment except `Array`, which is shared:
//! appending through one handle is visible through every other handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::frontend::ast::Stmt;

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Str(Rc<str>),
    Boolean(bool),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    Null,
    /// A recoverable failure that flows through expressions like any other value
    Error(Rc<str>),
}

/// A user-defined function. Captures nothing: free variables resolve in the
/// scope of the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn error(message: impl AsRef<str>) -> Self {
        Value::Error(Rc::from(message.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Str(_) => "STRING",
            Value::Boolean(_) => "BOOLEAN",
            Value::Array(_) => "ARRAY",
            Value::Function(_) => "FUNCTION",
            Value::Null => "NULL",
            Value::Error(_) => "ERROR",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(s) = self {
            Some(s.as_ref())
        } else {
            None
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// True when both values are the same shared array
    pub fn same_array(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

type ArrayPtr = *const RefCell<Vec<Value>>;

/// Arrays can contain themselves. `open` holds the arrays currently being
/// walked; meeting one of them again renders `[...]`.
fn fmt_value(value: &Value, f: &mut fmt::Formatter<'_>, open: &mut Vec<ArrayPtr>) -> fmt::Result {
    match value {
        Value::Integer(i) => write!(f, "{}", i),
        Value::Float(x) => write!(f, "{}", x),
        Value::Str(s) => f.write_str(s),
        Value::Boolean(b) => write!(f, "{}", b),
        Value::Array(items) => {
            let ptr = Rc::as_ptr(items);
            if open.contains(&ptr) {
                return f.write_str("[...]");
            }
            open.push(ptr);
            f.write_str("[")?;
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                fmt_value(item, f, open)?;
            }
            open.pop();
            f.write_str("]")
        }
        Value::Function(_) => f.write_str("function"),
        Value::Null => f.write_str("null"),
        Value::Error(message) => f.write_str(message),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_value(self, f, &mut Vec::new())
    }
}

/// Structural equality. A pair of arrays already under comparison is
/// assumed equal, so cyclic arrays terminate.
fn values_eq(a: &Value, b: &Value, open: &mut Vec<(ArrayPtr, ArrayPtr)>) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let pair = (Rc::as_ptr(x), Rc::as_ptr(y));
            if open.contains(&pair) {
                return true;
            }
            let (xs, ys) = (x.borrow(), y.borrow());
            if xs.len() != ys.len() {
                return false;
            }
            open.push(pair);
            let equal = xs.iter().zip(ys.iter()).all(|(l, r)| values_eq(l, r, open));
            open.pop();
            equal
        }
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y) || x == y,
        (Value::Null, Value::Null) => true,
        (Value::Error(x), Value::Error(y)) => x == y,
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_eq(self, other, &mut Vec::new())
    }
}

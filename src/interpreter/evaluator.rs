//! Tree-walking evaluator
//!
//! Walks the AST against an [`Environment`]. Failures come in two tiers:
//! recoverable ones become `Value::Error` and keep flowing through the
//! program, fatal ones are returned as [`RuntimeError`] and end the run.
//!
//! Control flow is deliberately shallow. A `return` takes effect only when
//! it is a direct statement of the function body, or a direct statement of
//! an `if` that is itself a direct statement of the body. Anywhere deeper,
//! including inside a `while`, the returned expression is evaluated and the
//! value dropped.

use std::rc::Rc;

use log::{debug, trace};

use crate::frontend::ast::*;
use crate::interpreter::environment::{Environment, ScopeId};
use crate::interpreter::value::{Function, Value};
use crate::stdlib::BuiltinRegistry;
use crate::utils::{Error, Result, RuntimeError};

/// Nested user-function calls allowed before a run is stopped with
/// [`RuntimeError::RecursionLimit`]
pub const DEFAULT_MAX_CALL_DEPTH: usize = 512;

pub struct Interpreter {
    env: Environment,
    builtins: BuiltinRegistry,
    max_call_depth: usize,
}

impl Interpreter {
    pub fn new(builtins: BuiltinRegistry) -> Self {
        Self {
            env: Environment::new(),
            builtins,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Change the nesting limit for user-function calls. Every nested call
    /// uses host stack, so raise this only on a thread with a larger stack.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Run every top-level statement of `program` in the global scope
    pub fn run(&mut self, program: &Program) -> Result<()> {
        let root = self.env.root();
        for stmt in &program.statements {
            self.exec_statement(stmt, root)?;
        }
        Ok(())
    }

    /// Parse and run a source text. A program with parse errors is not run.
    pub fn eval_source(&mut self, source: &str) -> std::result::Result<(), Error> {
        let program = crate::frontend::parse(source)?;
        self.run(&program)?;
        Ok(())
    }

    /// Read a global binding
    pub fn get(&self, name: &str) -> Option<Value> {
        self.env.get(self.env.root(), name).cloned()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    // ==================== Statements ====================

    fn exec_statement(&mut self, stmt: &Stmt, scope: ScopeId) -> Result<()> {
        match stmt {
            Stmt::Var(var) => {
                let value = self.evaluate(&var.value, scope)?;
                self.env.declare(scope, var.name.as_str(), value);
            }
            Stmt::Assign(assign) => self.exec_assign(assign, scope)?,
            Stmt::Call(call) => {
                self.call_function(call, scope)?;
            }
            Stmt::While(while_stmt) => self.exec_while(while_stmt, scope)?,
            Stmt::If(if_stmt) => {
                self.exec_if(if_stmt, scope, false)?;
            }
            Stmt::FunctionDef(def) => {
                let function = Function {
                    params: def.params.clone(),
                    body: def.body.clone(),
                };
                self.env.declare(scope, def.name.as_str(), Value::Function(Rc::new(function)));
            }
            Stmt::Return(ret) => {
                // Not in a position where returning is honored
                self.evaluate(&ret.value, scope)?;
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, body: &[Stmt], scope: ScopeId) -> Result<()> {
        for stmt in body {
            self.exec_statement(stmt, scope)?;
        }
        Ok(())
    }

    fn exec_assign(&mut self, assign: &AssignStmt, scope: ScopeId) -> Result<()> {
        let current = self
            .env
            .get(scope, &assign.name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndeclaredVariable { name: assign.name.clone() })?;
        let rhs = self.evaluate(&assign.value, scope)?;

        let value = match assign.op.arithmetic() {
            Some(op) => eval_infix(op, &current, &rhs),
            None => rhs,
        };
        self.env.assign(scope, &assign.name, value);
        Ok(())
    }

    fn eval_condition(&mut self, condition: &Expr, scope: ScopeId) -> Result<bool> {
        match self.evaluate(condition, scope)? {
            Value::Boolean(b) => Ok(b),
            other => Err(RuntimeError::NonBooleanCondition { got: other.type_name() }),
        }
    }

    /// Run an `if` in the enclosing scope. With `honor_return`, a direct
    /// `return` in the body stops the body and hands its value back.
    fn exec_if(&mut self, stmt: &IfStmt, scope: ScopeId, honor_return: bool) -> Result<Option<Value>> {
        if !self.eval_condition(&stmt.condition, scope)? {
            return Ok(None);
        }

        for body_stmt in &stmt.body {
            match body_stmt {
                Stmt::Return(ret) if honor_return => {
                    return self.evaluate(&ret.value, scope).map(Some);
                }
                other => self.exec_statement(other, scope)?,
            }
        }
        Ok(None)
    }

    fn exec_while(&mut self, stmt: &WhileStmt, scope: ScopeId) -> Result<()> {
        let mut iterations: u64 = 0;
        while self.eval_condition(&stmt.condition, scope)? {
            self.exec_block(&stmt.body, scope)?;
            iterations += 1;
        }
        trace!("while loop finished after {} iterations", iterations);
        Ok(())
    }

    // ==================== Expressions ====================

    pub fn evaluate(&mut self, expr: &Expr, scope: ScopeId) -> Result<Value> {
        match expr {
            Expr::Integer(v) => Ok(Value::Integer(*v)),
            Expr::Float(v) => Ok(Value::Float(*v)),
            Expr::Str(s) => Ok(Value::string(s)),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Ident(name) => self
                .env
                .get(scope, name)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedIdentifier { name: name.clone() }),
            Expr::Infix { left, op, right } => {
                let left = self.evaluate(left, scope)?;
                let right = self.evaluate(right, scope)?;
                Ok(eval_infix(*op, &left, &right))
            }
            Expr::Array(items) => {
                let values = self.evaluate_all(items, scope)?;
                Ok(Value::array(values))
            }
            Expr::Index { array, index } => self.eval_index(array, index, scope),
            Expr::MethodCall { receiver, call } => self.eval_method_call(receiver, call, scope),
            Expr::Call(call) => self.call_function(call, scope),
        }
    }

    fn evaluate_all(&mut self, exprs: &[Expr], scope: ScopeId) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.evaluate(expr, scope)?);
        }
        Ok(values)
    }

    fn eval_index(&mut self, array: &Expr, index: &Expr, scope: ScopeId) -> Result<Value> {
        let array = self.evaluate(array, scope)?;
        let index = self.evaluate(index, scope)?;

        let items = match &array {
            Value::Array(items) => items,
            other => {
                return Ok(Value::error(format!(
                    "cannot index object of type {}",
                    other.type_name()
                )))
            }
        };
        let i = match index {
            Value::Integer(i) => i,
            other => {
                return Ok(Value::error(format!(
                    "cannot use object of type {} as index",
                    other.type_name()
                )))
            }
        };

        let items = items.borrow();
        if i < 0 || i as usize >= items.len() {
            return Ok(Value::error(format!(
                "array index {} out of bounds for length {}",
                i,
                items.len()
            )));
        }
        Ok(items[i as usize].clone())
    }

    // ==================== Calls ====================

    /// User-defined bindings win over builtins of the same name
    fn call_function(&mut self, call: &FunctionCall, scope: ScopeId) -> Result<Value> {
        match self.env.get(scope, &call.name).cloned() {
            Some(Value::Function(function)) => self.call_user_function(call, &function, scope),
            Some(other) => Err(RuntimeError::NotCallable {
                name: call.name.clone(),
                got: other.type_name(),
            }),
            None if self.builtins.is_builtin(&call.name) => {
                let args = self.evaluate_all(&call.args, scope)?;
                Ok(self.call_builtin(&call.name, &args))
            }
            None => Err(RuntimeError::UndefinedFunction { name: call.name.clone() }),
        }
    }

    /// The new frame chains to the caller's scope, not the definition site,
    /// so free variables in the body resolve dynamically.
    fn call_user_function(&mut self, call: &FunctionCall, function: &Function, caller: ScopeId) -> Result<Value> {
        if call.args.len() != function.params.len() {
            return Err(RuntimeError::ArgCountMismatch {
                name: call.name.clone(),
                expected: function.params.len(),
                got: call.args.len(),
            });
        }

        let args = self.evaluate_all(&call.args, caller)?;
        // The root frame is not a call
        if self.env.depth() > self.max_call_depth {
            return Err(RuntimeError::RecursionLimit {
                name: call.name.clone(),
                depth: self.max_call_depth,
            });
        }
        let frame = self.env.push_scope(caller);
        debug!(
            "call {}({} args), scope depth {}",
            call.name,
            args.len(),
            self.env.depth()
        );
        for (param, value) in function.params.iter().zip(args) {
            self.env.declare(frame, param.as_str(), value);
        }

        let result = self.run_function_body(&function.body, frame);
        self.env.pop_scope(frame);
        result
    }

    fn run_function_body(&mut self, body: &[Stmt], frame: ScopeId) -> Result<Value> {
        for stmt in body {
            match stmt {
                Stmt::Return(ret) => return self.evaluate(&ret.value, frame),
                Stmt::If(if_stmt) => {
                    if let Some(value) = self.exec_if(if_stmt, frame, true)? {
                        return Ok(value);
                    }
                }
                other => self.exec_statement(other, frame)?,
            }
        }
        Ok(Value::Null)
    }

    fn call_builtin(&self, name: &str, args: &[Value]) -> Value {
        trace!("builtin {} with {} args", name, args.len());
        match self.builtins.get(name) {
            Some(builtin) => builtin(args),
            None => Value::error(format!("function {} is not defined", name)),
        }
    }

    /// `receiver.name(args)` calls builtin `name` with the receiver prepended.
    /// User-defined functions are never dispatched this way.
    fn eval_method_call(&mut self, receiver: &Expr, call: &FunctionCall, scope: ScopeId) -> Result<Value> {
        let mut args = Vec::with_capacity(call.args.len() + 1);
        args.push(self.evaluate(receiver, scope)?);
        args.extend(self.evaluate_all(&call.args, scope)?);
        Ok(self.call_builtin(&call.name, &args))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(BuiltinRegistry::standard())
    }
}

// ==================== Operators ====================

/// Apply an infix operator. Only numeric operand pairs are supported; any
/// other pair yields `Null`.
pub fn eval_infix(op: InfixOp, left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer_infix(op, *a, *b, left, right),
        (Value::Integer(a), Value::Float(b)) => float_infix(op, *a as f64, *b, left, right),
        (Value::Float(a), Value::Integer(b)) => float_infix(op, *a, *b as f64, left, right),
        (Value::Float(a), Value::Float(b)) => float_infix(op, *a, *b, left, right),
        _ => Value::Null,
    }
}

fn unsupported(op: InfixOp, left: &Value, right: &Value) -> Value {
    Value::error(format!(
        "unsupported operator '{}' for types {}, {}",
        op.as_str(),
        left.type_name(),
        right.type_name()
    ))
}

/// Integer arithmetic wraps on overflow. Division always produces a float.
fn integer_infix(op: InfixOp, a: i64, b: i64, left: &Value, right: &Value) -> Value {
    match op {
        InfixOp::Add => Value::Integer(a.wrapping_add(b)),
        InfixOp::Sub => Value::Integer(a.wrapping_sub(b)),
        InfixOp::Mul => Value::Integer(a.wrapping_mul(b)),
        InfixOp::Div => Value::Float(a as f64 / b as f64),
        InfixOp::Lt => Value::Boolean(a < b),
        InfixOp::LtEq => Value::Boolean(a <= b),
        InfixOp::Eq => Value::Boolean(a == b),
        InfixOp::Gt => Value::Boolean(a > b),
        InfixOp::GtEq => Value::Boolean(a >= b),
        _ => unsupported(op, left, right),
    }
}

fn float_infix(op: InfixOp, a: f64, b: f64, left: &Value, right: &Value) -> Value {
    match op {
        InfixOp::Add => Value::Float(a + b),
        InfixOp::Sub => Value::Float(a - b),
        InfixOp::Mul => Value::Float(a * b),
        InfixOp::Div => Value::Float(a / b),
        InfixOp::Lt => Value::Boolean(a < b),
        InfixOp::LtEq => Value::Boolean(a <= b),
        InfixOp::Eq => Value::Boolean(a == b),
        InfixOp::Gt => Value::Boolean(a > b),
        InfixOp::GtEq => Value::Boolean(a >= b),
        _ => unsupported(op, left, right),
    }
}

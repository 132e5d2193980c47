use crate::interpreter::value::Value;
use std::collections::HashMap;

/// Handle to one scope frame inside an [`Environment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug)]
struct Frame {
    vars: HashMap<String, Value>,
    parent: Option<ScopeId>,
}

/// Scope frames for one program run, kept as a stack.
///
/// A frame is pushed for each function invocation and popped when the call
/// returns, so a child frame never outlives its parent. Blocks (`if`/`while`
/// bodies) reuse the frame they appear in.
#[derive(Debug)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame { vars: HashMap::new(), parent: None }],
        }
    }

    /// The global scope
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Push a new frame chained to `parent`
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.frames.push(Frame { vars: HashMap::new(), parent: Some(parent) });
        ScopeId(self.frames.len() - 1)
    }

    /// Discard `scope` and anything pushed after it. The root frame stays.
    pub fn pop_scope(&mut self, scope: ScopeId) {
        if scope.0 > 0 {
            self.frames.truncate(scope.0);
        }
    }

    /// Number of live frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Look a name up, walking from `scope` towards the root
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<&Value> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if let Some(value) = frame.vars.get(name) {
                return Some(value);
            }
            current = frame.parent;
        }
        None
    }

    /// Bind a name in `scope` itself, shadowing any binding further out.
    /// Used by `var`, function definitions and parameter binding.
    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>, value: Value) {
        self.frames[scope.0].vars.insert(name.into(), value);
    }

    /// Overwrite the nearest existing binding of `name`. When no frame on the
    /// chain has one, the value lands in the outermost frame reached.
    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Value) {
        let mut id = scope;
        loop {
            let frame = &self.frames[id.0];
            if frame.vars.contains_key(name) {
                break;
            }
            match frame.parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
        self.frames[id.0].vars.insert(name.to_string(), value);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

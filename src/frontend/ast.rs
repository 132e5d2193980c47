//! Abstract Syntax Tree definitions for Kestrel
//!
//! The tree is strict: every node owns its children. Nodes render back to
//! source-like text through `Display`.

use std::fmt;

/// A complete program: statements in source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

// ==================== Statements ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var(VarStmt),
    Assign(AssignStmt),
    /// A call evaluated for its side effects
    Call(FunctionCall),
    While(WhileStmt),
    If(IfStmt),
    FunctionDef(FunctionDef),
    Return(ReturnStmt),
}

/// `var name = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarStmt {
    pub name: String,
    pub value: Expr,
}

/// `name op value;` with `op` one of `=, +=, -=, *=, /=`
#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub name: String,
    pub op: AssignOp,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

/// `if (condition) { body }`; the language has no else branch
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Expr,
}

/// `name(args...)`, usable both as a statement and as an expression
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

// ==================== Expressions ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i64),
    Float(f64),
    Str(String),
    Boolean(bool),
    Ident(String),
    Infix {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
    },
    Array(Vec<Expr>),
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// `receiver.name(args...)`, sugar for a builtin call with the receiver first
    MethodCall {
        receiver: Box<Expr>,
        call: FunctionCall,
    },
    Call(FunctionCall),
}

/// Operators accepted in infix position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Lt,
    LtEq,
    Eq,
    Gt,
    GtEq,
}

impl InfixOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::AddAssign => "+=",
            InfixOp::SubAssign => "-=",
            InfixOp::MulAssign => "*=",
            InfixOp::DivAssign => "/=",
            InfixOp::Lt => "<",
            InfixOp::LtEq => "<=",
            InfixOp::Eq => "==",
            InfixOp::Gt => ">",
            InfixOp::GtEq => ">=",
        }
    }
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// The arithmetic a compound assignment applies; `None` for plain `=`
    pub fn arithmetic(&self) -> Option<InfixOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(InfixOp::Add),
            AssignOp::Sub => Some(InfixOp::Sub),
            AssignOp::Mul => Some(InfixOp::Mul),
            AssignOp::Div => Some(InfixOp::Div),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }
}

// ==================== Rendering ====================

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, body: &[Stmt]) -> fmt::Result {
    f.write_str("{ ")?;
    for stmt in body {
        write!(f, "{} ", stmt)?;
    }
    f.write_str("}")
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Var(s) => write!(f, "var {} = {};", s.name, s.value),
            Stmt::Assign(s) => write!(f, "{} {} {};", s.name, s.op.as_str(), s.value),
            Stmt::Call(call) => write!(f, "{};", call),
            Stmt::While(s) => {
                write!(f, "while({}) ", s.condition)?;
                write_block(f, &s.body)
            }
            Stmt::If(s) => {
                write!(f, "if({}) ", s.condition)?;
                write_block(f, &s.body)
            }
            Stmt::FunctionDef(def) => {
                write!(f, "fun {}(", def.name)?;
                write_list(f, &def.params, ", ")?;
                f.write_str(") ")?;
                write_block(f, &def.body)
            }
            Stmt::Return(s) => write!(f, "return {};", s.value),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_list(f, &self.args, ", ")?;
        f.write_str(")")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(v) => write!(f, "{}", v),
            // Keep a fractional part so the literal reads back as a float
            Expr::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{}.0", v),
            Expr::Float(v) => write!(f, "{}", v),
            Expr::Str(s) => write!(f, "\"{}\"", s),
            Expr::Boolean(b) => write!(f, "{}", b),
            Expr::Ident(name) => f.write_str(name),
            Expr::Infix { left, op, right } => write!(f, "({} {} {})", left, op.as_str(), right),
            Expr::Array(items) => {
                f.write_str("[")?;
                write_list(f, items, ",")?;
                f.write_str("]")
            }
            Expr::Index { array, index } => write!(f, "{}[{}]", array, index),
            Expr::MethodCall { receiver, call } => write!(f, "{}.{}", receiver, call),
            Expr::Call(call) => write!(f, "{}", call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_function_def() {
        let def = Stmt::FunctionDef(FunctionDef {
            name: "add".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body: vec![Stmt::Return(ReturnStmt {
                value: Expr::Infix {
                    left: Box::new(Expr::Ident("a".to_string())),
                    op: InfixOp::Add,
                    right: Box::new(Expr::Ident("b".to_string())),
                },
            })],
        });
        assert_eq!(def.to_string(), "fun add(a, b) { return (a + b); }");
    }

    #[test]
    fn test_render_method_call_and_index() {
        let expr = Expr::MethodCall {
            receiver: Box::new(Expr::Index {
                array: Box::new(Expr::Array(vec![Expr::Str("ab".into()), Expr::Float(1.5)])),
                index: Box::new(Expr::Integer(0)),
            }),
            call: FunctionCall { name: "length".into(), args: vec![] },
        };
        assert_eq!(expr.to_string(), "[\"ab\",1.5][0].length()");
    }

    #[test]
    fn test_whole_floats_keep_their_point() {
        assert_eq!(Expr::Float(2.0).to_string(), "2.0");
        assert_eq!(Expr::Float(0.25).to_string(), "0.25");

        let program = crate::frontend::parse("var x = 2.0 + 7.;").expect("parses");
        let rendered = program.to_string();
        assert_eq!(rendered, "var x = (2.0 + 7.0);\n");
        assert_eq!(crate::frontend::parse(&rendered), Ok(program));
    }

    #[test]
    fn test_compound_assign_maps_to_arithmetic() {
        assert_eq!(AssignOp::Assign.arithmetic(), None);
        assert_eq!(AssignOp::Mul.arithmetic(), Some(InfixOp::Mul));
        assert_eq!(AssignOp::Div.as_str(), "/=");
    }
}

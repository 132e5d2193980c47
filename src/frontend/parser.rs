//! Parser for Kestrel
//!
//! Recursive descent for statements, handler tables for expressions. Errors
//! are collected rather than returned early: a construct that fails to parse
//! is dropped from the tree, an error is recorded, and parsing resumes at the
//! next statement boundary.
//!
//! Binary operators carry no precedence levels. They all bind with equal
//! strength, strictly left to right, so `2 + 3 * 4` is `(2 + 3) * 4`. The
//! postfix forms `a[i]` and `a.f()` attach to the operand they follow.

use std::collections::HashMap;

use log::debug;

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::ParseError;

type PrefixFn = fn(&mut Parser) -> Option<Expr>;
type InfixFn = fn(&mut Parser, Expr) -> Option<Expr>;

/// The parser
pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
    prefix_fns: HashMap<TokenKind, PrefixFn>,
    infix_fns: HashMap<TokenKind, InfixFn>,
}

impl Parser {
    /// Create a new parser pulling tokens from a lexer
    pub fn new(mut lexer: Lexer) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();

        let mut prefix_fns: HashMap<TokenKind, PrefixFn> = HashMap::new();
        prefix_fns.insert(TokenKind::Int, Parser::parse_integer);
        prefix_fns.insert(TokenKind::Float, Parser::parse_float);
        prefix_fns.insert(TokenKind::Boolean, Parser::parse_boolean);
        prefix_fns.insert(TokenKind::Str, Parser::parse_string);
        prefix_fns.insert(TokenKind::Ident, Parser::parse_identifier);
        prefix_fns.insert(TokenKind::LBracket, Parser::parse_array);

        let mut infix_fns: HashMap<TokenKind, InfixFn> = HashMap::new();
        for kind in [
            TokenKind::Plus,
            TokenKind::PlusEq,
            TokenKind::Minus,
            TokenKind::MinusEq,
            TokenKind::Star,
            TokenKind::StarEq,
            TokenKind::Slash,
            TokenKind::SlashEq,
            TokenKind::Lt,
            TokenKind::LtEq,
            TokenKind::EqEq,
            TokenKind::Gt,
            TokenKind::GtEq,
        ] {
            infix_fns.insert(kind, Parser::parse_infix);
        }
        infix_fns.insert(TokenKind::Dot, Parser::parse_method_call);
        infix_fns.insert(TokenKind::LBracket, Parser::parse_index);

        Self {
            lexer,
            current,
            peek,
            errors: Vec::new(),
            prefix_fns,
            infix_fns,
        }
    }

    /// Errors recorded while parsing, in the order they were found
    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // ==================== Helper Methods ====================

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let peek = std::mem::replace(&mut self.peek, next);
        std::mem::replace(&mut self.current, peek)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&mut self, error: ParseError) {
        debug!("parse error at {}: {}", error.span(), error);
        self.errors.push(error);
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error(ParseError::UnexpectedToken {
                expected: kind.describe().to_string(),
                got: self.current.to_string(),
                span: self.current.span,
            });
            None
        }
    }

    fn expect_ident(&mut self) -> Option<String> {
        self.expect(TokenKind::Ident).map(|token| token.text)
    }

    /// Skip to the end of the broken statement: past the next `;`, or up to a
    /// closing `}` so the enclosing block can still finish.
    fn synchronize(&mut self) {
        while !matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            self.advance();
        }
        self.consume(TokenKind::Semicolon);
    }

    // ==================== Statements ====================

    /// Parse the whole token stream
    pub fn parse(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.check(TokenKind::Eof) {
            self.parse_list_item(&mut statements);
        }

        Program { statements }
    }

    fn starts_statement(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Var
                | TokenKind::While
                | TokenKind::If
                | TokenKind::Fun
                | TokenKind::Return
                | TokenKind::Ident
        )
    }

    /// Parse one entry of a statement list, recovering from any error.
    /// A token that cannot start a statement is reported and dropped on its own.
    fn parse_list_item(&mut self, statements: &mut Vec<Stmt>) {
        if self.consume(TokenKind::Semicolon) {
            return;
        }
        if !Self::starts_statement(self.current.kind) {
            let token = self.advance();
            self.error(ParseError::ExpectedStatement {
                got: token.to_string(),
                span: token.span,
            });
            return;
        }
        match self.parse_statement() {
            Some(stmt) => statements.push(stmt),
            None => self.synchronize(),
        }
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.current.kind {
            TokenKind::Var => self.parse_var(),
            TokenKind::While => self.parse_while(),
            TokenKind::If => self.parse_if(),
            TokenKind::Fun => self.parse_function_def(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Ident if self.peek.kind == TokenKind::LParen => {
                let call = self.parse_call()?;
                self.consume(TokenKind::Semicolon);
                Some(Stmt::Call(call))
            }
            TokenKind::Ident => self.parse_assign(),
            _ => {
                self.error(ParseError::ExpectedStatement {
                    got: self.current.to_string(),
                    span: self.current.span,
                });
                None
            }
        }
    }

    fn parse_var(&mut self) -> Option<Stmt> {
        self.expect(TokenKind::Var)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Some(Stmt::Var(VarStmt { name, value }))
    }

    fn parse_assign(&mut self) -> Option<Stmt> {
        let name = self.expect_ident()?;
        let op = match self.current.kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            _ => {
                self.error(ParseError::UnexpectedToken {
                    expected: "one of '=', '+=', '-=', '*=', '/='".to_string(),
                    got: self.current.to_string(),
                    span: self.current.span,
                });
                return None;
            }
        };
        self.advance();
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Some(Stmt::Assign(AssignStmt { name, op, value }))
    }

    /// `( condition ) { body }`, shared by `while` and `if`
    fn parse_condition_and_body(&mut self) -> Option<(Expr, Vec<Stmt>)> {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Some((condition, body))
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        self.expect(TokenKind::While)?;
        let (condition, body) = self.parse_condition_and_body()?;
        Some(Stmt::While(WhileStmt { condition, body }))
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        self.expect(TokenKind::If)?;
        let (condition, body) = self.parse_condition_and_body()?;
        Some(Stmt::If(IfStmt { condition, body }))
    }

    fn parse_function_def(&mut self) -> Option<Stmt> {
        self.expect(TokenKind::Fun)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let body = self.parse_block()?;
        Some(Stmt::FunctionDef(FunctionDef { name, params, body }))
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        self.expect(TokenKind::Return)?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon)?;
        Some(Stmt::Return(ReturnStmt { value }))
    }

    /// `{ statements }`. A broken statement inside is dropped and the rest
    /// of the block still parses.
    fn parse_block(&mut self) -> Option<Vec<Stmt>> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();

        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                self.error(ParseError::Unterminated { construct: "block", span: open.span });
                return None;
            }
            self.parse_list_item(&mut body);
        }

        self.advance();
        Some(body)
    }

    // ==================== Expressions ====================

    fn parse_expression(&mut self) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.check(TokenKind::Semicolon) {
            let infix = match self.infix_fns.get(&self.current.kind) {
                Some(infix) => *infix,
                None => break,
            };
            left = infix(self, left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.prefix_fns.get(&self.current.kind) {
            Some(prefix) => {
                let prefix = *prefix;
                prefix(self)
            }
            None => {
                self.error(ParseError::ExpectedExpr {
                    got: self.current.to_string(),
                    span: self.current.span,
                });
                None
            }
        }
    }

    /// Right-hand operand of a binary operator: a prefix expression plus any
    /// trailing index or method call.
    fn parse_operand(&mut self) -> Option<Expr> {
        let mut operand = self.parse_prefix()?;

        while matches!(self.current.kind, TokenKind::LBracket | TokenKind::Dot) {
            let postfix = match self.infix_fns.get(&self.current.kind) {
                Some(postfix) => *postfix,
                None => break,
            };
            operand = postfix(self, operand)?;
        }

        Some(operand)
    }

    fn parse_integer(&mut self) -> Option<Expr> {
        let token = self.advance();
        match token.text.parse::<i64>() {
            Ok(value) => Some(Expr::Integer(value)),
            Err(_) => {
                self.error(ParseError::InvalidInteger { literal: token.text, span: token.span });
                None
            }
        }
    }

    fn parse_float(&mut self) -> Option<Expr> {
        let token = self.advance();
        match token.text.parse::<f64>() {
            Ok(value) => Some(Expr::Float(value)),
            Err(_) => {
                self.error(ParseError::InvalidFloat { literal: token.text, span: token.span });
                None
            }
        }
    }

    fn parse_boolean(&mut self) -> Option<Expr> {
        let token = self.advance();
        Some(Expr::Boolean(token.text == "true"))
    }

    fn parse_string(&mut self) -> Option<Expr> {
        let token = self.advance();
        Some(Expr::Str(token.text))
    }

    /// A variable reference, or a call when the name is followed by `(`
    fn parse_identifier(&mut self) -> Option<Expr> {
        if self.peek.kind == TokenKind::LParen {
            return self.parse_call().map(Expr::Call);
        }
        let token = self.advance();
        Some(Expr::Ident(token.text))
    }

    /// Comma separated expressions up to `close`; the opening token is already consumed
    fn parse_expression_list(
        &mut self,
        close: TokenKind,
        construct: &'static str,
        open: &Token,
    ) -> Option<Vec<Expr>> {
        let mut items = Vec::new();

        if !self.check(close) {
            loop {
                if self.check(TokenKind::Eof) {
                    self.error(ParseError::Unterminated { construct, span: open.span });
                    return None;
                }
                items.push(self.parse_expression()?);
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
        }

        if self.check(TokenKind::Eof) {
            self.error(ParseError::Unterminated { construct, span: open.span });
            return None;
        }
        self.expect(close)?;
        Some(items)
    }

    fn parse_call(&mut self) -> Option<FunctionCall> {
        let name = self.expect_ident()?;
        let open = self.expect(TokenKind::LParen)?;
        let args = self.parse_expression_list(TokenKind::RParen, "argument list", &open)?;
        Some(FunctionCall { name, args })
    }

    fn parse_array(&mut self) -> Option<Expr> {
        let open = self.expect(TokenKind::LBracket)?;
        let items = self.parse_expression_list(TokenKind::RBracket, "array literal", &open)?;
        Some(Expr::Array(items))
    }

    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        let token = self.advance();
        let op = match token.kind {
            TokenKind::Plus => InfixOp::Add,
            TokenKind::Minus => InfixOp::Sub,
            TokenKind::Star => InfixOp::Mul,
            TokenKind::Slash => InfixOp::Div,
            TokenKind::PlusEq => InfixOp::AddAssign,
            TokenKind::MinusEq => InfixOp::SubAssign,
            TokenKind::StarEq => InfixOp::MulAssign,
            TokenKind::SlashEq => InfixOp::DivAssign,
            TokenKind::Lt => InfixOp::Lt,
            TokenKind::LtEq => InfixOp::LtEq,
            TokenKind::EqEq => InfixOp::Eq,
            TokenKind::Gt => InfixOp::Gt,
            TokenKind::GtEq => InfixOp::GtEq,
            _ => {
                self.error(ParseError::UnexpectedToken {
                    expected: "infix operator".to_string(),
                    got: token.to_string(),
                    span: token.span,
                });
                return None;
            }
        };
        let right = self.parse_operand()?;
        Some(Expr::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_index(&mut self, array: Expr) -> Option<Expr> {
        self.expect(TokenKind::LBracket)?;
        let index = self.parse_expression()?;
        self.expect(TokenKind::RBracket)?;
        Some(Expr::Index {
            array: Box::new(array),
            index: Box::new(index),
        })
    }

    fn parse_method_call(&mut self, receiver: Expr) -> Option<Expr> {
        let dot = self.expect(TokenKind::Dot)?;
        if !(self.check(TokenKind::Ident) && self.peek.kind == TokenKind::LParen) {
            self.error(ParseError::ExpectedCall { span: dot.span });
            return None;
        }
        let call = self.parse_call()?;
        Some(Expr::MethodCall {
            receiver: Box::new(receiver),
            call,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Program, Vec<ParseError>) {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse();
        (program, parser.into_errors())
    }

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        program
    }

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn test_var_then_while() {
        let program = parse_ok("var x = 1; while(x < 5) {x += 1;}");
        assert_eq!(
            program.statements,
            vec![
                Stmt::Var(VarStmt { name: "x".into(), value: Expr::Integer(1) }),
                Stmt::While(WhileStmt {
                    condition: Expr::Infix {
                        left: ident("x"),
                        op: InfixOp::Lt,
                        right: Box::new(Expr::Integer(5)),
                    },
                    body: vec![Stmt::Assign(AssignStmt {
                        name: "x".into(),
                        op: AssignOp::Add,
                        value: Expr::Integer(1),
                    })],
                }),
            ]
        );
    }

    #[test]
    fn test_operators_group_left_to_right() {
        let program = parse_ok("var r = 2 + 3 * 4;");
        assert_eq!(program.statements[0].to_string(), "var r = ((2 + 3) * 4);");

        let program = parse_ok("var r = 10 - 2 - 3;");
        assert_eq!(program.statements[0].to_string(), "var r = ((10 - 2) - 3);");
    }

    #[test]
    fn test_postfix_binds_to_operand() {
        let program = parse_ok("var r = n + xs[1] * s.length();");
        assert_eq!(program.statements[0].to_string(), "var r = ((n + xs[1]) * s.length());");
    }

    #[test]
    fn test_function_def_and_calls() {
        let program = parse_ok(
            "fun fib(n) { if(n <= 2) { return 1; } return fib(n-1)+fib(n-2); } print(fib(10));",
        );
        assert_eq!(program.statements.len(), 2);
        match &program.statements[0] {
            Stmt::FunctionDef(def) => {
                assert_eq!(def.name, "fib");
                assert_eq!(def.params, vec!["n".to_string()]);
                assert_eq!(def.body.len(), 2);
                assert!(matches!(def.body[0], Stmt::If(_)));
                assert_eq!(def.body[1].to_string(), "return (fib((n - 1)) + fib((n - 2)));");
            }
            other => panic!("expected function definition, got {:?}", other),
        }
        assert_eq!(program.statements[1].to_string(), "print(fib(10));");
    }

    #[test]
    fn test_function_without_params() {
        let program = parse_ok("fun hello() { print(\"hi\") }");
        match &program.statements[0] {
            Stmt::FunctionDef(def) => {
                assert!(def.params.is_empty());
                assert_eq!(def.body.len(), 1);
            }
            other => panic!("expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_arrays_and_indexing() {
        let program = parse_ok("var a = [1, 2.5, \"x\", [true]]; var b = a[3][0];");
        assert_eq!(program.statements[0].to_string(), "var a = [1,2.5,\"x\",[true]];");
        assert_eq!(program.statements[1].to_string(), "var b = a[3][0];");
    }

    #[test]
    fn test_method_call_sugar() {
        let program = parse_ok("var s = \"hello\".substr(1, 3);");
        match &program.statements[0] {
            Stmt::Var(VarStmt { value: Expr::MethodCall { receiver, call }, .. }) => {
                assert_eq!(**receiver, Expr::Str("hello".into()));
                assert_eq!(call.name, "substr");
                assert_eq!(call.args, vec![Expr::Integer(1), Expr::Integer(3)]);
            }
            other => panic!("expected method call, got {:?}", other),
        }
    }

    #[test]
    fn test_method_call_cannot_start_a_statement() {
        let (program, errors) = parse("var a = [1]; a.append(3); var b = 2;");
        assert_eq!(program.statements.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(
            matches!(&errors[0], ParseError::UnexpectedToken { got, span, .. } if got == "'.'" && span.column == 15),
            "{:?}",
            errors
        );
    }

    #[test]
    fn test_method_without_call_is_error() {
        let (_, errors) = parse("var n = s.length;");
        assert!(matches!(errors[0], ParseError::ExpectedCall { .. }));
    }

    #[test]
    fn test_errors_accumulate_and_parsing_continues() {
        let (program, errors) = parse("var = 1; var ok = 2; x 5; var also = 3;");
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ParseError::UnexpectedToken { .. }));
        assert!(matches!(errors[1], ParseError::UnexpectedToken { .. }));
        let names: Vec<String> = program
            .statements
            .iter()
            .map(|s| match s {
                Stmt::Var(v) => v.name.clone(),
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();
        assert_eq!(names, vec!["ok".to_string(), "also".to_string()]);
    }

    #[test]
    fn test_missing_prefix_handler() {
        let (_, errors) = parse("var x = -1;");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::ExpectedExpr { .. }));
        assert_eq!(errors[0].to_string(), "No prefix parse function for '-'");
    }

    #[test]
    fn test_unterminated_block() {
        let (program, errors) = parse("while (true) { x += 1;");
        assert!(program.statements.is_empty());
        assert!(matches!(errors.last(), Some(ParseError::Unterminated { construct: "block", .. })));
    }

    #[test]
    fn test_stray_closing_brace() {
        let (program, errors) = parse("} var x = 1;");
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(errors[0], ParseError::ExpectedStatement { .. }));
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        let (_, errors) = parse("var big = 99999999999999999999;");
        assert!(matches!(errors[0], ParseError::InvalidInteger { .. }));
    }
}

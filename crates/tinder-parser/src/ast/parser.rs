//! The statement-level parser.
//!
//! Statements are either keyword-led (`if`, `while`, `return`, `external`,
//! `class`) or begin with an expression. An expression followed by the end
//! of a statement is an expression statement; otherwise it is read as a
//! type and must be followed by an identifier, opening either a function
//! definition (identifier then `(`) or one or more variable definitions.
//!
//! The end of a statement is a `;`, a newline, or lookahead at `}` or the
//! end of the file.
//!
//! Parse routines return `None` to signal failure; the outermost driver
//! reports a single `unexpected <token>` diagnostic at the current token.

use tinder_core::{Loc, Log, NodeId};

use crate::ast::expr::{Expr, ExprKind};
use crate::ast::stmt::{Block, ClassDef, FuncDef, Stmt, StmtKind, VarDef};
use crate::ast::Module;
use crate::lexer::{tokenize, Token, TokenKind};

pub struct Parser<'src, 'a> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    log: &'a mut Log,
    next_id: u32,
    external_depth: u32,
    /// Set when a specific diagnostic was already recorded, so the driver
    /// does not add a generic "unexpected token" on top of it.
    pub(crate) reported: bool,
}

impl<'src, 'a> Parser<'src, 'a> {
    /// Parse a token stream into a module.
    ///
    /// Returns `None` (with at least one error in the log) on failure.
    pub fn parse(tokens: Vec<Token<'src>>, log: &'a mut Log) -> Option<Module> {
        let mut parser = Parser::new(tokens, log);
        let loc = parser.peek().loc;
        let mut stmts = Vec::new();
        if parser.parse_stmts_until(TokenKind::EndOfFile, &mut stmts).is_none() {
            parser.report_unexpected();
            return None;
        }
        Some(Module::new(Block::new(stmts, loc), parser.next_id))
    }

    /// Parse a single expression from source text. Test helper.
    pub fn expression(source: &'src str, log: &'a mut Log) -> Option<Expr> {
        let tokens = tokenize(source, log);
        if log.has_errors() {
            return None;
        }
        let mut parser = Parser::new(tokens, log);
        let expr = parser.parse_expr(0);
        if expr.is_none() {
            parser.report_unexpected();
        }
        expr
    }

    fn new(mut tokens: Vec<Token<'src>>, log: &'a mut Log) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::EndOfFile, "", Loc::new(1, 1)));
        }
        Self { tokens, pos: 0, log, next_id: 0, external_depth: 0, reported: false }
    }

    // =========================================
    // Token stream helpers
    // =========================================

    pub(crate) fn peek(&self) -> &Token<'src> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) -> Token<'src> {
        let token = *self.peek();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn log(&mut self) -> &mut Log {
        self.log
    }

    pub(crate) fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn expr(&mut self, kind: ExprKind, loc: Loc) -> Expr {
        Expr::new(self.fresh_id(), kind, loc)
    }

    fn stmt(&mut self, kind: StmtKind, loc: Loc) -> Stmt {
        Stmt { id: self.fresh_id(), kind, loc }
    }

    fn report_unexpected(&mut self) {
        if self.reported {
            return;
        }
        let token = *self.peek();
        // Error tokens were already reported by the lexer.
        if token.kind != TokenKind::Error {
            self.log.error(token.loc, format_args!("unexpected {}", token.kind));
        }
        self.reported = true;
    }

    // =========================================
    // Statement separators
    // =========================================

    fn skip_separators(&mut self) {
        while matches!(self.peek().kind, TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Semicolon | TokenKind::Newline | TokenKind::RightBrace | TokenKind::EndOfFile
        )
    }

    /// Consume the end of a statement: `;` or newline are eaten, while a
    /// `}` or end of file satisfies the rule by lookahead alone.
    fn eat_statement_end(&mut self) -> Option<()> {
        match self.peek().kind {
            TokenKind::Semicolon | TokenKind::Newline => {
                self.advance();
                Some(())
            }
            TokenKind::RightBrace | TokenKind::EndOfFile => Some(()),
            _ => None,
        }
    }

    // =========================================
    // Statements
    // =========================================

    fn parse_stmts_until(&mut self, end: TokenKind, out: &mut Vec<Stmt>) -> Option<()> {
        loop {
            self.skip_separators();
            if self.check(end) {
                return Some(());
            }
            if self.check(TokenKind::EndOfFile) {
                return None;
            }
            self.parse_statement(out)?;
        }
    }

    fn parse_statement(&mut self, out: &mut Vec<Stmt>) -> Option<()> {
        match self.peek().kind {
            TokenKind::If => {
                let stmt = self.parse_if()?;
                out.push(stmt);
                Some(())
            }
            TokenKind::While => {
                let loc = self.advance().loc;
                let test = self.parse_expr(0)?;
                let body = self.parse_braced_block()?;
                let stmt = self.stmt(StmtKind::While { test, body }, loc);
                out.push(stmt);
                Some(())
            }
            TokenKind::Return => {
                let loc = self.advance().loc;
                let value = if self.at_statement_end() { None } else { Some(self.parse_expr(0)?) };
                self.eat_statement_end()?;
                let stmt = self.stmt(StmtKind::Return(value), loc);
                out.push(stmt);
                Some(())
            }
            TokenKind::External => {
                let loc = self.advance().loc;
                self.external_depth += 1;
                let block = self.parse_braced_block();
                self.external_depth -= 1;
                let stmt = self.stmt(StmtKind::External(block?), loc);
                out.push(stmt);
                Some(())
            }
            TokenKind::Class => {
                let loc = self.advance().loc;
                let name = self.expect(TokenKind::Identifier)?;
                let body = self.parse_braced_block()?;
                let def = ClassDef {
                    name: name.text.to_string(),
                    name_loc: name.loc,
                    body,
                    symbol: None,
                    in_external: self.external_depth > 0,
                };
                let stmt = self.stmt(StmtKind::Class(def), loc);
                out.push(stmt);
                Some(())
            }
            TokenKind::Static => {
                let loc = self.advance().loc;
                let ty = self.parse_expr(0)?;
                self.parse_definition(ty, loc, true, out)
            }
            _ => {
                let loc = self.peek().loc;
                let expr = self.parse_expr(0)?;
                if self.at_statement_end() {
                    self.eat_statement_end()?;
                    let stmt = self.stmt(StmtKind::Expr(expr), loc);
                    out.push(stmt);
                    Some(())
                } else {
                    self.parse_definition(expr, loc, false, out)
                }
            }
        }
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let loc = self.advance().loc;
        let test = self.parse_expr(0)?;
        let then_block = self.parse_braced_block()?;

        self.skip_newlines();
        let else_block = if self.eat(TokenKind::Else).is_some() {
            if self.check(TokenKind::If) {
                // "else if" becomes a nested if rather than a one-statement
                // block the user had to write braces for.
                let nested_loc = self.peek().loc;
                let nested = self.parse_if()?;
                Some(Block::new(vec![nested], nested_loc))
            } else {
                Some(self.parse_braced_block()?)
            }
        } else {
            None
        };

        Some(self.stmt(StmtKind::If { test, then_block, else_block }, loc))
    }

    fn parse_braced_block(&mut self) -> Option<Block> {
        self.skip_newlines();
        let open = self.expect(TokenKind::LeftBrace)?;
        let mut stmts = Vec::new();
        self.parse_stmts_until(TokenKind::RightBrace, &mut stmts)?;
        self.expect(TokenKind::RightBrace)?;
        Some(Block::new(stmts, open.loc))
    }

    /// Parse the remainder of a definition whose type expression has
    /// already been consumed: `ident (` opens a function, anything else is
    /// one or more variable declarators sharing the type.
    fn parse_definition(
        &mut self,
        ty: Expr,
        loc: Loc,
        is_static: bool,
        out: &mut Vec<Stmt>,
    ) -> Option<()> {
        let in_external = self.external_depth > 0;
        let name = self.expect(TokenKind::Identifier)?;

        if self.check(TokenKind::LeftParen) {
            let def = self.parse_func_def(ty, name, is_static)?;
            let stmt = self.stmt(StmtKind::Func(def), loc);
            out.push(stmt);
            return Some(());
        }

        // `static` only modifies functions.
        if is_static {
            return None;
        }

        let mut name = name;
        loop {
            // Later declarators share the parsed type expression.
            let declared_ty = ty.clone();
            let init = if self.eat(TokenKind::Assign).is_some() {
                Some(self.parse_expr(0)?)
            } else {
                None
            };
            let def = VarDef {
                name: name.text.to_string(),
                name_loc: name.loc,
                declared_ty,
                init,
                symbol: None,
                in_external,
            };
            let stmt = self.stmt(StmtKind::Var(def), name.loc);
            out.push(stmt);

            if self.eat(TokenKind::Comma).is_some() {
                name = self.expect(TokenKind::Identifier)?;
            } else {
                break;
            }
        }
        self.eat_statement_end()
    }

    fn parse_func_def(
        &mut self,
        return_ty: Expr,
        name: Token<'src>,
        is_static: bool,
    ) -> Option<FuncDef> {
        let in_external = self.external_depth > 0;
        self.expect(TokenKind::LeftParen)?;

        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let arg_ty = self.parse_expr(0)?;
                let arg_name = self.expect(TokenKind::Identifier)?;
                // Default values are parsed here and rejected by the
                // structural check, which owns that rule.
                let init = if self.eat(TokenKind::Assign).is_some() {
                    Some(self.parse_expr(0)?)
                } else {
                    None
                };
                args.push(VarDef {
                    name: arg_name.text.to_string(),
                    name_loc: arg_name.loc,
                    declared_ty: arg_ty,
                    init,
                    symbol: None,
                    in_external,
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        let body = if self.check(TokenKind::LeftBrace) {
            Some(self.parse_braced_block()?)
        } else {
            self.eat_statement_end()?;
            None
        };

        Some(FuncDef {
            name: name.text.to_string(),
            name_loc: name.loc,
            is_static,
            return_ty,
            args,
            body,
            symbol: None,
            in_external,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Module {
        let mut log = Log::new("test.tn");
        let tokens = tokenize(source, &mut log);
        let module = Parser::parse(tokens, &mut log);
        assert!(!log.has_errors(), "unexpected errors: {log}");
        module.unwrap()
    }

    fn parse_err(source: &str) -> Log {
        let mut log = Log::new("test.tn");
        let tokens = tokenize(source, &mut log);
        let module = Parser::parse(tokens, &mut log);
        assert!(module.is_none());
        assert!(log.has_errors());
        log
    }

    #[test]
    fn empty_module() {
        let module = parse("");
        assert!(module.block.stmts.is_empty());
    }

    #[test]
    fn function_definition() {
        let module = parse("int add(int a, int b) { return a + b }");
        assert_eq!(module.block.stmts.len(), 1);
        match &module.block.stmts[0].kind {
            StmtKind::Func(def) => {
                assert_eq!(def.name, "add");
                assert!(!def.is_static);
                assert_eq!(def.args.len(), 2);
                assert_eq!(def.args[0].name, "a");
                assert!(def.body.is_some());
                assert!(matches!(
                    def.body.as_ref().unwrap().stmts[0].kind,
                    StmtKind::Return(Some(_))
                ));
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn static_function() {
        let module = parse("class Foo { static int f() { return 1 } }");
        match &module.block.stmts[0].kind {
            StmtKind::Class(class) => match &class.body.stmts[0].kind {
                StmtKind::Func(def) => assert!(def.is_static),
                other => panic!("expected function, got {other:?}"),
            },
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn variable_definitions_share_type() {
        let module = parse("int a = 1, b, c = 3");
        assert_eq!(module.block.stmts.len(), 3);
        for (index, name) in ["a", "b", "c"].iter().enumerate() {
            match &module.block.stmts[index].kind {
                StmtKind::Var(def) => {
                    assert_eq!(def.name, *name);
                    assert!(matches!(def.declared_ty.kind, ExprKind::TypeRef(_)));
                }
                other => panic!("expected var, got {other:?}"),
            }
        }
    }

    #[test]
    fn var_keyword_declaration() {
        let module = parse("var x = 1");
        match &module.block.stmts[0].kind {
            StmtKind::Var(def) => {
                assert!(matches!(def.declared_ty.kind, ExprKind::VarKw));
                assert!(def.init.is_some());
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn expression_statement_vs_declaration() {
        let module = parse("x = 1\nFoo y = 2");
        assert!(matches!(module.block.stmts[0].kind, StmtKind::Expr(_)));
        match &module.block.stmts[1].kind {
            StmtKind::Var(def) => {
                assert_eq!(def.name, "y");
                assert!(matches!(&def.declared_ty.kind, ExprKind::Ident { name, .. } if name == "Foo"));
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn if_else_chain_collapses() {
        let module = parse("void f() { if a { } else if b { } else { } }");
        let body = match &module.block.stmts[0].kind {
            StmtKind::Func(def) => def.body.as_ref().unwrap(),
            other => panic!("expected function, got {other:?}"),
        };
        match &body.stmts[0].kind {
            StmtKind::If { else_block, .. } => {
                let else_block = else_block.as_ref().unwrap();
                assert_eq!(else_block.stmts.len(), 1);
                match &else_block.stmts[0].kind {
                    StmtKind::If { else_block: inner_else, .. } => {
                        assert!(inner_else.is_some());
                    }
                    other => panic!("expected nested if, got {other:?}"),
                }
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn while_statement() {
        let module = parse("void f() { while x { y = 1 } }");
        let body = match &module.block.stmts[0].kind {
            StmtKind::Func(def) => def.body.as_ref().unwrap(),
            other => panic!("expected function, got {other:?}"),
        };
        assert!(matches!(body.stmts[0].kind, StmtKind::While { .. }));
    }

    #[test]
    fn bare_return() {
        let module = parse("void f() { return }");
        let body = match &module.block.stmts[0].kind {
            StmtKind::Func(def) => def.body.as_ref().unwrap(),
            other => panic!("expected function, got {other:?}"),
        };
        assert!(matches!(body.stmts[0].kind, StmtKind::Return(None)));
    }

    #[test]
    fn external_block_marks_definitions() {
        let module = parse("external { void print(string s)\nint version }");
        match &module.block.stmts[0].kind {
            StmtKind::External(block) => {
                assert_eq!(block.stmts.len(), 2);
                match &block.stmts[0].kind {
                    StmtKind::Func(def) => {
                        assert!(def.in_external);
                        assert!(def.body.is_none());
                    }
                    other => panic!("expected function, got {other:?}"),
                }
                match &block.stmts[1].kind {
                    StmtKind::Var(def) => assert!(def.in_external),
                    other => panic!("expected var, got {other:?}"),
                }
            }
            other => panic!("expected external, got {other:?}"),
        }
    }

    #[test]
    fn semicolons_and_newlines_both_terminate() {
        let module = parse("int a = 1; int b = 2\nint c = 3");
        assert_eq!(module.block.stmts.len(), 3);
    }

    #[test]
    fn nullable_and_generic_types_in_declarations() {
        let module = parse("int? x\nlist<int> ys");
        match &module.block.stmts[0].kind {
            StmtKind::Var(def) => {
                assert!(matches!(def.declared_ty.kind, ExprKind::Nullable { .. }))
            }
            other => panic!("expected var, got {other:?}"),
        }
        match &module.block.stmts[1].kind {
            StmtKind::Var(def) => assert!(matches!(def.declared_ty.kind, ExprKind::Param { .. })),
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn unexpected_token_reports_once() {
        let log = parse_err("int x = +");
        assert_eq!(log.error_count(), 1);
        let message = log.errors().next().unwrap().to_string();
        assert!(message.contains("unexpected"), "bad message: {message}");
    }

    #[test]
    fn missing_close_brace_fails() {
        parse_err("void f() { return");
    }

    #[test]
    fn class_with_members() {
        let module = parse("class Point { int x\nint y\nint sum() { return this.x + this.y } }");
        match &module.block.stmts[0].kind {
            StmtKind::Class(class) => {
                assert_eq!(class.name, "Point");
                assert_eq!(class.body.stmts.len(), 3);
            }
            other => panic!("expected class, got {other:?}"),
        }
    }
}

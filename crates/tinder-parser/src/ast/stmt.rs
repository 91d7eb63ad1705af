//! Statement and definition nodes.

use tinder_core::{Loc, NodeId, ScopeId, SymbolId};

use crate::ast::expr::Expr;

/// A sequence of statements. Blocks that introduce names get a scope
/// attached during symbol definition.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub scope: Option<ScopeId>,
    pub loc: Loc,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, loc: Loc) -> Self {
        Self { stmts, scope: None, loc }
    }
}

/// A statement.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub loc: Loc,
}

/// The statement variants.
#[derive(Debug, Clone)]
pub enum StmtKind {
    If { test: Expr, then_block: Block, else_block: Option<Block> },
    While { test: Expr, body: Block },
    Return(Option<Expr>),
    Expr(Expr),
    /// An `external { ... }` declaration-only region.
    External(Block),
    Var(VarDef),
    Func(FuncDef),
    Class(ClassDef),
}

/// A variable definition, as a statement, class field, or function
/// argument.
#[derive(Debug, Clone)]
pub struct VarDef {
    pub name: String,
    pub name_loc: Loc,
    /// The declared type expression; the keyword `var` requests
    /// inference from the initializer.
    pub declared_ty: Expr,
    pub init: Option<Expr>,
    pub symbol: Option<SymbolId>,
    pub in_external: bool,
}

/// A function definition.
#[derive(Debug, Clone)]
pub struct FuncDef {
    pub name: String,
    pub name_loc: Loc,
    pub is_static: bool,
    pub return_ty: Expr,
    pub args: Vec<VarDef>,
    /// Absent inside `external` blocks, required everywhere else.
    pub body: Option<Block>,
    pub symbol: Option<SymbolId>,
    pub in_external: bool,
}

/// A class definition.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub name_loc: Loc,
    pub body: Block,
    pub symbol: Option<SymbolId>,
    pub in_external: bool,
}

//! The Tinder abstract syntax tree.
//!
//! The tree is owned (`Box`/`Vec` children) and mutated in place by the
//! semantic passes: scopes get attached to blocks, symbols to definitions
//! and uses, computed types to expressions, and implicit casts and default
//! initializers are spliced in where needed. Shared structures (symbols,
//! scopes) are referenced by arena ids, never by pointers.

pub mod expr;
pub mod ops;
pub mod stmt;

pub(crate) mod expr_parser;
pub mod parser;

pub use expr::{Expr, ExprKind};
pub use ops::{BinaryOp, UnaryOp};
pub use stmt::{Block, ClassDef, FuncDef, Stmt, StmtKind, VarDef};

use tinder_core::NodeId;

/// A parsed source file: a single top-level block of declarations.
#[derive(Debug, Clone)]
pub struct Module {
    pub block: Block,
    /// The next unassigned [`NodeId`]. Passes that synthesize nodes
    /// (implicit casts, default initializers) draw ids from here.
    next_id: u32,
}

impl Module {
    pub(crate) fn new(block: Block, next_id: u32) -> Self {
        Self { block, next_id }
    }

    /// Allocate a fresh id for a synthesized node.
    pub fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// An upper bound on node ids in the tree, for sizing side tables.
    pub fn node_count(&self) -> usize {
        self.next_id as usize
    }

    /// Record ids allocated outside [`fresh_id`](Self::fresh_id), so a
    /// pass that drew from its own counter keeps the supply unique.
    pub fn advance_ids(&mut self, next_id: u32) {
        self.next_id = self.next_id.max(next_id);
    }
}

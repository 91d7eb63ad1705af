//! Per-function control-flow graph construction.
//!
//! The graph is built by visiting statements *in reverse* within each
//! block, threading the "current successor" backwards. Expressions that
//! produce booleans carry a (true-branch, false-branch) successor pair;
//! the pair collapses to a single node wherever a non-boolean construct
//! needs one entry point.
//!
//! Argument definitions are visited after the body (so, first in forward
//! order): their nullability is the knowledge at function entry.

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use tinder_core::{Loc, NodeId, SymbolId};
use tinder_parser::ast::{Block, BinaryOp, Expr, ExprKind, FuncDef, Stmt, StmtKind, UnaryOp, VarDef};

use super::lattice::{IsNull, Knowledge};
use crate::scope::ScopeTree;
use crate::symbol::SymbolTable;

/// The effect a flow node applies to the knowledge passing through it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Effect {
    /// No effect; a merge or sequence point.
    Plain,
    /// `knowledge[symbol] := value`
    Assign(SymbolId, IsNull),
    /// `knowledge[dst] := knowledge[src]`
    Alias(SymbolId, SymbolId),
    /// Narrow: `knowledge[symbol] &= value`; an empty result kills the path.
    Check(SymbolId, IsNull),
    /// Unconditionally terminates flow (`return`).
    Blocker,
}

#[derive(Debug)]
pub(crate) struct FlowNode {
    pub effect: Effect,
    /// Union of all knowledge that reached this node; `None` = unreached.
    pub knowledge: Option<Knowledge>,
}

/// A nullable-to-non-nullable cast site, to be checked after analysis.
#[derive(Debug, Clone)]
pub(crate) struct Deref {
    pub loc: Loc,
    /// The dereferenced name, when the operand is an identifier.
    pub name: Option<String>,
    /// For a local identifier: the flow node whose knowledge decides the
    /// warning, and the local's symbol.
    pub local: Option<(NodeIndex, SymbolId)>,
}

pub(crate) struct FuncFlow {
    pub graph: DiGraph<FlowNode, ()>,
    pub root: NodeIndex,
    pub exit: NodeIndex,
    /// Each statement's entry node, for dead-code detection.
    pub stmt_nodes: FxHashMap<NodeId, NodeIndex>,
    pub derefs: Vec<Deref>,
}

type Pair = (NodeIndex, NodeIndex);

/// Build the reverse CFG for a function with a body.
pub(crate) fn build(def: &FuncDef, scopes: &ScopeTree, symbols: &SymbolTable) -> FuncFlow {
    let mut builder = Builder {
        graph: DiGraph::new(),
        stmt_nodes: FxHashMap::default(),
        derefs: Vec::new(),
        scopes,
        symbols,
    };

    let exit = builder.node(Effect::Plain);
    let body = def.body.as_ref().expect("flow over a bodyless function");
    let mut succ = builder.visit_block(body, exit);

    for arg in def.args.iter().rev() {
        let Some(symbol) = arg.symbol else { continue };
        let value = if symbols.get(symbol).ty.is_nullable() { IsNull::MAYBE } else { IsNull::NO };
        succ = builder.node_to(Effect::Assign(symbol, value), succ);
    }

    FuncFlow {
        graph: builder.graph,
        root: succ,
        exit,
        stmt_nodes: builder.stmt_nodes,
        derefs: builder.derefs,
    }
}

struct Builder<'a> {
    graph: DiGraph<FlowNode, ()>,
    stmt_nodes: FxHashMap<NodeId, NodeIndex>,
    derefs: Vec<Deref>,
    scopes: &'a ScopeTree,
    symbols: &'a SymbolTable,
}

impl Builder<'_> {
    fn node(&mut self, effect: Effect) -> NodeIndex {
        self.graph.add_node(FlowNode { effect, knowledge: None })
    }

    fn node_to(&mut self, effect: Effect, succ: NodeIndex) -> NodeIndex {
        let node = self.node(effect);
        self.graph.add_edge(node, succ, ());
        node
    }

    /// Collapse a successor pair to a single entry point.
    fn collapse(&mut self, pair: Pair) -> NodeIndex {
        if pair.0 == pair.1 {
            pair.0
        } else {
            let node = self.node(Effect::Plain);
            self.graph.add_edge(node, pair.0, ());
            self.graph.add_edge(node, pair.1, ());
            node
        }
    }

    fn visit_block(&mut self, block: &Block, succ: NodeIndex) -> NodeIndex {
        let mut succ = succ;
        for stmt in block.stmts.iter().rev() {
            succ = self.visit_stmt(stmt, succ);
        }
        succ
    }

    fn visit_stmt(&mut self, stmt: &Stmt, succ: NodeIndex) -> NodeIndex {
        let entry = match &stmt.kind {
            StmtKind::Expr(expr) => {
                let pair = self.visit_expr(expr, (succ, succ));
                self.collapse(pair)
            }

            StmtKind::Return(value) => {
                let blocker = self.node_to(Effect::Blocker, succ);
                match value {
                    Some(value) => {
                        let pair = self.visit_expr(value, (blocker, blocker));
                        self.collapse(pair)
                    }
                    None => blocker,
                }
            }

            StmtKind::Var(def) => self.visit_var_binding(def, succ),

            StmtKind::If { test, then_block, else_block } => {
                // Each branch exits through a fresh node pointing at the
                // join, giving the merge its own knowledge.
                let else_exit = self.node_to(Effect::Plain, succ);
                let then_exit = self.node_to(Effect::Plain, succ);
                let then_entry = self.visit_block(then_block, then_exit);
                let else_entry = match else_block {
                    Some(block) => self.visit_block(block, else_exit),
                    None => else_exit,
                };
                let pair = self.visit_expr(test, (then_entry, else_entry));
                self.collapse(pair)
            }

            StmtKind::While { test, body } => {
                // The placeholder stands in for the loop head until the
                // test is built, then becomes the back edge.
                let placeholder = self.node(Effect::Plain);
                let body_entry = self.visit_block(body, placeholder);
                let pair = self.visit_expr(test, (body_entry, succ));
                let test_entry = self.collapse(pair);
                self.graph.add_edge(placeholder, test_entry, ());
                test_entry
            }

            // No flow contribution.
            StmtKind::External(_) | StmtKind::Func(_) | StmtKind::Class(_) => succ,
        };

        // Every statement gets a node of its own so unreachability maps
        // back to it precisely.
        let own = if entry == succ { self.node_to(Effect::Plain, succ) } else { entry };
        self.stmt_nodes.insert(stmt.id, own);
        own
    }

    fn visit_var_binding(&mut self, def: &VarDef, succ: NodeIndex) -> NodeIndex {
        let (Some(symbol), Some(init)) = (def.symbol, &def.init) else { return succ };
        let effect = self.binding_effect(symbol, init);
        let node = self.node_to(effect, succ);
        let pair = self.visit_expr(init, (node, node));
        self.collapse(pair)
    }

    /// The effect of binding `rhs` into `symbol`: an alias when the
    /// source is another local, otherwise an assignment of the source's
    /// static nullability. Casts and chained assignments are transparent.
    fn binding_effect(&self, symbol: SymbolId, rhs: &Expr) -> Effect {
        let src = source_of(rhs);
        if let ExprKind::Ident { symbol: Some(other), .. } = &src.kind {
            if self.scopes.is_local(self.symbols, *other) {
                return Effect::Alias(symbol, *other);
            }
        }
        let value = if matches!(src.ty(), tinder_core::Type::Null) {
            IsNull::YES
        } else if src.ty().is_nullable() {
            IsNull::MAYBE
        } else {
            IsNull::NO
        };
        Effect::Assign(symbol, value)
    }

    // =========================================
    // Expressions
    // =========================================

    fn visit_expr(&mut self, e: &Expr, succ: Pair) -> Pair {
        match &e.kind {
            ExprKind::Unary { op: UnaryOp::Not, value } => {
                self.visit_expr(value, (succ.1, succ.0))
            }
            ExprKind::Unary { op: UnaryOp::Negate, value } => self.chain(&[&**value], succ),

            ExprKind::Binary { op: BinaryOp::And, left, right } => {
                let right_pair = self.visit_expr(right, succ);
                let right_entry = self.collapse(right_pair);
                self.visit_expr(left, (right_entry, succ.1))
            }
            ExprKind::Binary { op: BinaryOp::Or, left, right } => {
                let right_pair = self.visit_expr(right, succ);
                let right_entry = self.collapse(right_pair);
                self.visit_expr(left, (succ.0, right_entry))
            }

            ExprKind::Binary { op: op @ (BinaryOp::Equal | BinaryOp::NotEqual), left, right } => {
                if let Some(symbol) = self.null_check(left, right) {
                    // The true branch of `x == null` knows x is null; the
                    // false branch knows it is not. `!=` is the dual.
                    let on_true =
                        if *op == BinaryOp::Equal { IsNull::YES } else { IsNull::NO };
                    let check_true = self.node_to(Effect::Check(symbol, on_true), succ.0);
                    let check_false =
                        self.node_to(Effect::Check(symbol, on_true.complement()), succ.1);
                    (check_true, check_false)
                } else {
                    self.chain(&[&**left, &**right], succ)
                }
            }

            ExprKind::Binary { op: BinaryOp::Assign, left, right } => {
                if let ExprKind::Ident { symbol: Some(symbol), .. } = &left.kind {
                    if self.scopes.is_local(self.symbols, *symbol) {
                        let end = self.collapse(succ);
                        let node = self.node_to(self.binding_effect(*symbol, right), end);
                        let pair = self.visit_expr(right, (node, node));
                        let entry = self.collapse(pair);
                        return (entry, entry);
                    }
                }
                self.chain(&[&**left, &**right], succ)
            }

            ExprKind::Binary { left, right, .. } => self.chain(&[&**left, &**right], succ),

            ExprKind::Cast { value, .. } => {
                if let Some(deref) = self.deref_site(e, value) {
                    let end = self.collapse(succ);
                    let node = self.node_to(Effect::Plain, end);
                    self.derefs.push(Deref {
                        loc: value.loc,
                        name: deref.0,
                        local: deref.1.map(|symbol| (node, symbol)),
                    });
                    let pair = self.visit_expr(value, (node, node));
                    let entry = self.collapse(pair);
                    (entry, entry)
                } else {
                    // Casts are otherwise transparent to flow.
                    self.visit_expr(value, succ)
                }
            }

            ExprKind::Call { callee, args, .. } => {
                let mut exprs: Vec<&Expr> = vec![&**callee];
                exprs.extend(args.iter());
                self.chain(&exprs, succ)
            }

            ExprKind::Member { obj, .. } => self.visit_expr(obj, succ),

            ExprKind::Index { obj, index } => self.chain(&[&**obj, &**index], succ),

            ExprKind::List(items) => {
                let refs: Vec<&Expr> = items.iter().collect();
                self.chain(&refs, succ)
            }

            // Type expressions and leaves carry no flow effects.
            ExprKind::Param { .. }
            | ExprKind::Nullable { .. }
            | ExprKind::TypeRef(_)
            | ExprKind::VarKw
            | ExprKind::Null
            | ExprKind::This
            | ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Ident { .. } => succ,
        }
    }

    /// Wire a sequence of sub-expressions, in source order, ending in the
    /// collapsed successor.
    fn chain(&mut self, exprs: &[&Expr], succ: Pair) -> Pair {
        let mut current = self.collapse(succ);
        for e in exprs.iter().rev() {
            let pair = self.visit_expr(e, (current, current));
            current = self.collapse(pair);
        }
        (current, current)
    }

    /// Recognize `x == null` / `null == x` over a function-local `x`.
    fn null_check(&self, left: &Expr, right: &Expr) -> Option<SymbolId> {
        let ident = if right.strip_casts().is_null_literal() {
            left
        } else if left.strip_casts().is_null_literal() {
            right
        } else {
            return None;
        };
        match &ident.strip_casts().kind {
            ExprKind::Ident { symbol: Some(symbol), .. }
                if self.scopes.is_local(self.symbols, *symbol) =>
            {
                Some(*symbol)
            }
            _ => None,
        }
    }

    /// Classify a cast as a dereference: a nullable value cast to a
    /// non-nullable type. Returns the display name and, for local
    /// identifiers, the symbol to consult the flow for.
    #[allow(clippy::type_complexity)]
    fn deref_site(
        &self,
        cast: &Expr,
        value: &Expr,
    ) -> Option<(Option<String>, Option<SymbolId>)> {
        let from = value.ty();
        let to = cast.ty();
        if to.is_error() || from.is_error() {
            return None;
        }
        // Only nullable sources count: the cast-of-null a default
        // initializer synthesizes is not a dereference.
        if !from.is_nullable() || to.is_nullable() {
            return None;
        }
        match &value.strip_casts().kind {
            ExprKind::Ident { name, symbol: Some(symbol), .. } => {
                let local = self.scopes.is_local(self.symbols, *symbol);
                Some((Some(name.clone()), local.then_some(*symbol)))
            }
            ExprKind::Ident { name, .. } => Some((Some(name.clone()), None)),
            _ => Some((None, None)),
        }
    }
}

/// Look through casts and chained assignments to the value a binding
/// really takes.
fn source_of(expr: &Expr) -> &Expr {
    let mut current = expr;
    loop {
        match &current.kind {
            ExprKind::Cast { value, .. } => current = value,
            ExprKind::Binary { op: BinaryOp::Assign, right, .. } => current = right,
            _ => return current,
        }
    }
}

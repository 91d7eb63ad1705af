//! Expression nodes.

use tinder_core::{Loc, NodeId, SymbolId, Type};

use crate::ast::ops::{BinaryOp, UnaryOp};

/// An expression.
///
/// `ty` is the computed type, assigned by the type pass; after a
/// successful compilation every expression has one.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub loc: Loc,
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind, loc: Loc) -> Self {
        Self { id, kind, loc, ty: None }
    }

    /// The computed type, or the poison type if the pass has not reached
    /// this node (only happens on the error path).
    pub fn ty(&self) -> &Type {
        static ERROR: Type = Type::Error;
        self.ty.as_ref().unwrap_or(&ERROR)
    }

    /// Look through cast wrappers to the underlying expression.
    pub fn strip_casts(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Cast { value, .. } = &expr.kind {
            expr = value;
        }
        expr
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Null)
    }
}

/// The expression variants.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// The keyword `var` used as a declared type (inference marker).
    VarKw,
    Null,
    This,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A name use; `symbol` is resolved by the type pass.
    Ident { name: String, symbol: Option<SymbolId> },
    /// A pre-parsed built-in type (`int`, `list`, ...). Also synthesized
    /// by later passes as the target of implicit casts and default
    /// initializers. Evaluates to the meta type of its payload.
    TypeRef(Type),
    /// A list literal `[a, b, c]`.
    List(Vec<Expr>),
    Unary { op: UnaryOp, value: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    /// A call; `is_ctor` is set when the callee is a class meta type.
    Call { callee: Box<Expr>, args: Vec<Expr>, is_ctor: bool },
    /// Generic instantiation `base<params...>`.
    Param { base: Box<Expr>, params: Vec<Expr> },
    /// A cast, explicit (`value as T`) or inserted for an implicit
    /// conversion. `target` is a type expression.
    Cast { value: Box<Expr>, target: Box<Expr> },
    /// Member access; `safe` for `?.`.
    Member { obj: Box<Expr>, name: String, safe: bool, symbol: Option<SymbolId> },
    Index { obj: Box<Expr>, index: Box<Expr> },
    /// The postfix `?` type constructor; `value` is a type expression.
    Nullable { value: Box<Expr> },
}

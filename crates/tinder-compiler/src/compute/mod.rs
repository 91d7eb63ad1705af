//! The type pass.
//!
//! Visits every expression bottom-up, setting its computed type, resolving
//! names and overloads, and materializing implicit conversions as cast
//! nodes. A rolling one-element [`Context`] carries "what type is wanted
//! here" downward: it is set by a parent immediately before visiting a
//! child and consumed (cleared) at the start of that visit.
//!
//! Split by expression family:
//! - [`exprs`]: literals, names, members, lists, indexing, casts
//! - [`binary`]: unary and binary operator dispatch
//! - [`calls`]: calls, overload resolution, generic instantiation

mod binary;
mod calls;
mod exprs;

use tinder_core::{Log, NodeId, ScopeId, SymbolId, Type};
use tinder_parser::ast::{Block, Expr, ExprKind, Module, Stmt, StmtKind, VarDef};

use crate::convert::convertible;
use crate::errors::ErrorKind;
use crate::scope::ScopeTree;
use crate::symbol::SymbolTable;

/// Run the type pass over a module.
pub fn run(module: &mut Module, scopes: &ScopeTree, symbols: &mut SymbolTable, log: &mut Log) {
    let mut ck = TypeCk::new(scopes, symbols, log, module.node_count() as u32);
    ck.visit_block(&mut module.block);
    let next = ck.finish();
    module.advance_ids(next);
}

/// The pending type context, consumed by the next expression visited.
#[derive(Debug, Default)]
pub(crate) struct Context {
    /// Argument types a call site offers for overload resolution.
    pub arg_types: Option<Vec<Type>>,
    /// The type the surrounding construct wants.
    pub target: Option<Type>,
}

#[derive(Clone)]
pub(crate) struct FuncCtx {
    pub ret: Type,
    pub is_static: bool,
}

pub(crate) struct TypeCk<'a> {
    pub(crate) scopes: &'a ScopeTree,
    pub(crate) symbols: &'a mut SymbolTable,
    pub(crate) log: &'a mut Log,
    pub(crate) ctx: Context,
    scope_stack: Vec<ScopeId>,
    class_stack: Vec<SymbolId>,
    func_stack: Vec<FuncCtx>,
    next_id: u32,
}

impl<'a> TypeCk<'a> {
    pub(crate) fn new(
        scopes: &'a ScopeTree,
        symbols: &'a mut SymbolTable,
        log: &'a mut Log,
        next_id: u32,
    ) -> Self {
        Self {
            scopes,
            symbols,
            log,
            ctx: Context::default(),
            scope_stack: Vec::new(),
            class_stack: Vec::new(),
            func_stack: Vec::new(),
            next_id,
        }
    }

    /// The next unassigned node id, handed back to the module.
    pub(crate) fn finish(self) -> u32 {
        self.next_id
    }

    pub(crate) fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn take_ctx(&mut self) -> Context {
        std::mem::take(&mut self.ctx)
    }

    pub(crate) fn current_scope(&self) -> ScopeId {
        *self.scope_stack.last().expect("no scope pushed")
    }

    pub(crate) fn push_scope(&mut self, scope: ScopeId) {
        self.scope_stack.push(scope);
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scope_stack.pop();
    }

    // =========================================
    // Statements
    // =========================================

    pub(crate) fn visit_block(&mut self, block: &mut Block) {
        self.push_scope(block.scope.expect("scopes not built"));
        for stmt in &mut block.stmts {
            self.visit_stmt(stmt);
        }
        self.pop_scope();
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        let loc = stmt.loc;
        match &mut stmt.kind {
            StmtKind::If { test, then_block, else_block } => {
                self.visit_test(test);
                self.visit_block(then_block);
                if let Some(else_block) = else_block {
                    self.visit_block(else_block);
                }
            }

            StmtKind::While { test, body } => {
                self.visit_test(test);
                self.visit_block(body);
            }

            StmtKind::Return(value) => {
                // Structural checking already rejected returns outside
                // functions.
                let Some(func) = self.func_stack.last().cloned() else { return };
                match (func.ret.is_void(), value) {
                    (true, None) => {}
                    (true, Some(value)) => {
                        self.visit_expr(value);
                        self.log.error(loc, ErrorKind::VoidReturn(true));
                    }
                    (false, None) => {
                        if !func.ret.is_error() {
                            self.log.error(loc, ErrorKind::VoidReturn(false));
                        }
                    }
                    (false, Some(value)) => {
                        self.ctx.target = Some(func.ret.clone());
                        self.visit_expr(value);
                        self.coerce(value, &func.ret);
                    }
                }
            }

            StmtKind::Expr(expr) => self.visit_expr(expr),

            StmtKind::Var(def) => self.visit_var_def(def),

            StmtKind::Func(def) => {
                let ret = match def.symbol.map(|s| &self.symbols.get(s).ty) {
                    Some(Type::Func { ret: Some(ret), .. }) => (**ret).clone(),
                    _ => Type::Error,
                };
                self.func_stack.push(FuncCtx { ret, is_static: def.is_static });
                if let Some(body) = &mut def.body {
                    self.visit_block(body);
                }
                self.func_stack.pop();
            }

            StmtKind::Class(def) => {
                if let Some(symbol) = def.symbol {
                    self.class_stack.push(symbol);
                    self.visit_block(&mut def.body);
                    self.class_stack.pop();
                } else {
                    self.visit_block(&mut def.body);
                }
            }

            StmtKind::External(body) => self.visit_block(body),
        }
    }

    /// Type a control expression and require it to be boolean.
    fn visit_test(&mut self, test: &mut Expr) {
        self.ctx.target = Some(Type::BOOL);
        self.visit_expr(test);
        let ty = test.ty().clone();
        if ty.is_error() || ty == Type::BOOL {
            return;
        }
        if convertible(&ty, &Type::BOOL) {
            self.insert_cast(test, Type::BOOL);
        } else {
            let found = self.symbols.type_name(&ty);
            self.log.error(
                test.loc,
                ErrorKind::TypeMismatch { expected: "bool".to_string(), found },
            );
        }
    }

    fn visit_var_def(&mut self, def: &mut VarDef) {
        let Some(symbol) = def.symbol else { return };

        if matches!(def.declared_ty.kind, ExprKind::VarKw) {
            // Inferred declaration: the initializer decides the type.
            match &mut def.init {
                None => {
                    self.log
                        .error(def.name_loc, ErrorKind::NotUseableType("var".to_string()));
                }
                Some(init) => {
                    self.visit_expr(init);
                    let ty = init.ty().clone();
                    if ty.is_error() || matches!(ty, Type::Overloaded(_)) {
                        // Already reported at the use site.
                    } else if matches!(ty, Type::Null | Type::Void)
                        || ty.is_meta()
                        || ty.has_free_params()
                    {
                        let name = self.symbols.type_name(&ty);
                        self.log.error(init.loc, ErrorKind::NotUseableType(name));
                    } else {
                        self.symbols.get_mut(symbol).ty = ty.clone();
                        def.declared_ty.ty = Some(Type::meta(ty));
                    }
                }
            }
            return;
        }

        let declared = self.symbols.get(symbol).ty.clone();
        if let Some(init) = &mut def.init {
            self.ctx.target = Some(declared.clone());
            self.visit_expr(init);
            self.coerce(init, &declared);
        }
    }

    // =========================================
    // Coercion helpers
    // =========================================

    /// Ensure `expr`'s type equals `target`, inserting an implicit cast
    /// when convertible and reporting a mismatch otherwise.
    pub(crate) fn coerce(&mut self, expr: &mut Expr, target: &Type) {
        let ty = expr.ty().clone();
        if ty.is_error() || target.is_error() {
            return;
        }
        if ty == *target {
            return;
        }
        if convertible(&ty, target) {
            self.insert_cast(expr, target.clone());
            return;
        }
        let expected = self.symbols.type_name(target);
        let found = self.symbols.type_name(&ty);
        self.log.error(expr.loc, ErrorKind::TypeMismatch { expected, found });
    }

    /// Wrap `expr` in a cast to `target`, replacing it in the tree.
    pub(crate) fn insert_cast(&mut self, expr: &mut Expr, target: Type) {
        let loc = expr.loc;
        let inner = std::mem::replace(expr, Expr::new(NodeId(u32::MAX), ExprKind::Null, loc));
        let mut target_expr = Expr::new(self.fresh_id(), ExprKind::TypeRef(target.clone()), loc);
        target_expr.ty = Some(Type::meta(target.clone()));
        let mut cast = Expr::new(
            self.fresh_id(),
            ExprKind::Cast { value: Box::new(inner), target: Box::new(target_expr) },
            loc,
        );
        cast.ty = Some(target);
        *expr = cast;
    }

    // =========================================
    // Context queries used across the submodules
    // =========================================

    pub(crate) fn this_type(&mut self, loc: tinder_core::Loc) -> Type {
        match (self.class_stack.last(), self.func_stack.last()) {
            (Some(&class), Some(func)) if !func.is_static => Type::Class(class),
            _ => {
                self.log.error(loc, ErrorKind::BadThis);
                Type::Error
            }
        }
    }

    pub(crate) fn type_name(&self, ty: &Type) -> String {
        self.symbols.type_name(ty)
    }
}

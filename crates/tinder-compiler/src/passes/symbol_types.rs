//! Declared-type resolution.
//!
//! Visits only the type expressions of variable and function declarations
//! (never bodies or initializers), using the type pass machinery as a
//! helper, and fills in each symbol's type. A type expression must
//! evaluate to a meta type whose instance has no free parameters; `void`
//! is accepted only as a function return type. Declarations using the
//! `var` keyword are left for the type pass to infer.

use tinder_core::{Log, Type};
use tinder_parser::ast::{Block, Expr, ExprKind, FuncDef, Module, StmtKind, VarDef};

use crate::compute::TypeCk;
use crate::errors::ErrorKind;
use crate::scope::ScopeTree;
use crate::symbol::SymbolTable;

pub fn run(module: &mut Module, scopes: &ScopeTree, symbols: &mut SymbolTable, log: &mut Log) {
    let mut ck = TypeCk::new(scopes, symbols, log, module.node_count() as u32);
    walk_block(&mut module.block, &mut ck);
    let next = ck.finish();
    module.advance_ids(next);
}

fn walk_block(block: &mut Block, ck: &mut TypeCk<'_>) {
    ck.push_scope(block.scope.expect("scopes not built"));
    for stmt in &mut block.stmts {
        match &mut stmt.kind {
            StmtKind::Var(def) => resolve_var(def, ck),
            StmtKind::Func(def) => resolve_func(def, ck),
            StmtKind::Class(def) => walk_block(&mut def.body, ck),
            StmtKind::External(body) => walk_block(body, ck),
            StmtKind::If { then_block, else_block, .. } => {
                walk_block(then_block, ck);
                if let Some(else_block) = else_block {
                    walk_block(else_block, ck);
                }
            }
            StmtKind::While { body, .. } => walk_block(body, ck),
            StmtKind::Return(_) | StmtKind::Expr(_) => {}
        }
    }
    ck.pop_scope();
}

fn resolve_var(def: &mut VarDef, ck: &mut TypeCk<'_>) {
    let Some(symbol) = def.symbol else { return };
    if matches!(def.declared_ty.kind, ExprKind::VarKw) {
        return; // inferred from the initializer by the type pass
    }
    ck.visit_expr(&mut def.declared_ty);
    let ty = instance_type(&def.declared_ty, false, ck);
    ck.symbols.get_mut(symbol).ty = ty;
}

fn resolve_func(def: &mut FuncDef, ck: &mut TypeCk<'_>) {
    ck.visit_expr(&mut def.return_ty);
    let ret = instance_type(&def.return_ty, true, ck);

    let mut arg_types = Vec::with_capacity(def.args.len());
    for arg in &mut def.args {
        ck.visit_expr(&mut arg.declared_ty);
        let ty = instance_type(&arg.declared_ty, false, ck);
        if let Some(symbol) = arg.symbol {
            ck.symbols.get_mut(symbol).ty = ty.clone();
        }
        arg_types.push(ty);
    }

    if let Some(symbol) = def.symbol {
        ck.symbols.get_mut(symbol).ty =
            Type::Func { ret: Some(Box::new(ret)), args: arg_types };
    }

    if let Some(body) = &mut def.body {
        walk_block(body, ck);
    }
}

/// Extract the usable instance type from an evaluated type expression.
fn instance_type(expr: &Expr, allow_void: bool, ck: &mut TypeCk<'_>) -> Type {
    match expr.ty() {
        Type::Meta(inner) => {
            if inner.has_free_params() {
                let printed = ck.symbols.type_name(inner);
                ck.log.error(expr.loc, ErrorKind::NotUseableType(printed));
                Type::Error
            } else if inner.is_void() && !allow_void {
                ck.log.error(expr.loc, ErrorKind::NotUseableType("void".to_string()));
                Type::Error
            } else {
                (**inner).clone()
            }
        }
        Type::Error => Type::Error,
        other => {
            let printed = ck.symbols.type_name(&other.clone());
            ck.log.error(expr.loc, ErrorKind::NotUseableType(printed));
            Type::Error
        }
    }
}

//! Flow validation.
//!
//! For every function with a body, builds a reverse control-flow graph,
//! runs the fixed-point nullability analysis, and reports:
//!
//! - *dead code*, once per block, at the first unreached statement
//! - *not all control paths return a value*, when a non-void function's
//!   body can fall off the end
//! - *definite* and *possible* null dereferences at the cast sites the
//!   graph builder recorded, with a conservative version for values the
//!   local analysis cannot track
//!
//! Class field initializers live outside any function; their dereference
//! casts get the conservative warning directly.

mod analyze;
mod graph;
mod lattice;

pub(crate) use lattice::IsNull;

use tinder_core::{Log, Type};
use tinder_parser::ast::{Block, Expr, ExprKind, FuncDef, Module, StmtKind};

use crate::errors::{deref_subject, ErrorKind, WarningKind};
use crate::scope::ScopeTree;
use crate::symbol::SymbolTable;

use graph::FuncFlow;

pub fn run(module: &Module, scopes: &ScopeTree, symbols: &SymbolTable, log: &mut Log) {
    let mut funcs = Vec::new();
    collect_funcs(&module.block, &mut funcs);

    for def in funcs {
        let Some(body) = &def.body else { continue };
        let mut flow = graph::build(def, scopes, symbols);
        analyze::analyze(&mut flow);
        report(def, body, &flow, symbols, log);
    }

    check_field_inits(&module.block, log);
}

/// Functions in source order: top level and class members.
fn collect_funcs<'a>(block: &'a Block, out: &mut Vec<&'a FuncDef>) {
    for stmt in &block.stmts {
        match &stmt.kind {
            StmtKind::Func(def) => out.push(def),
            StmtKind::Class(def) => collect_funcs(&def.body, out),
            StmtKind::External(body) => collect_funcs(body, out),
            _ => {}
        }
    }
}

fn report(def: &FuncDef, body: &Block, flow: &FuncFlow, symbols: &SymbolTable, log: &mut Log) {
    // A non-void function whose exit is still reachable can fall off the
    // end without returning.
    let ret = match def.symbol.map(|s| &symbols.get(s).ty) {
        Some(Type::Func { ret: Some(ret), .. }) => (**ret).clone(),
        _ => Type::Error,
    };
    if !ret.is_void() && !ret.is_error() && flow.graph[flow.exit].knowledge.is_some() {
        log.error(def.name_loc, ErrorKind::NotAllPathsReturnValue);
    }

    report_dead_code(body, flow, log);

    // Dereference checks, in source order for deterministic output.
    let mut derefs = flow.derefs.clone();
    derefs.sort_by_key(|d| (d.loc.line, d.loc.column));
    for deref in derefs {
        match deref.local {
            Some((node, symbol)) => {
                let Some(knowledge) = &flow.graph[node].knowledge else {
                    continue; // unreached; dead-code reporting covers it
                };
                let value = knowledge.get(symbol);
                if value == IsNull::YES {
                    log.warning(
                        deref.loc,
                        WarningKind::NullDereference(deref_subject(deref.name.as_deref())),
                    );
                } else if value == IsNull::MAYBE {
                    log.warning(
                        deref.loc,
                        WarningKind::NullableDereference(deref_subject(deref.name.as_deref())),
                    );
                }
            }
            None => {
                // Not a tracked local; the conservative warning stands.
                log.warning(
                    deref.loc,
                    WarningKind::NullableDereference(deref_subject(deref.name.as_deref())),
                );
            }
        }
    }
}

/// Report dead code once per block, at the first unreached statement.
fn report_dead_code(block: &Block, flow: &FuncFlow, log: &mut Log) {
    for stmt in &block.stmts {
        if let Some(&node) = flow.stmt_nodes.get(&stmt.id) {
            if flow.graph[node].knowledge.is_none() {
                log.warning(stmt.loc, WarningKind::DeadCode);
                return;
            }
        }
        match &stmt.kind {
            StmtKind::If { then_block, else_block, .. } => {
                report_dead_code(then_block, flow, log);
                if let Some(else_block) = else_block {
                    report_dead_code(else_block, flow, log);
                }
            }
            StmtKind::While { body, .. } => report_dead_code(body, flow, log),
            _ => {}
        }
    }
}

// =========================================
// Field initializers (outside any function)
// =========================================

fn check_field_inits(block: &Block, log: &mut Log) {
    for stmt in &block.stmts {
        match &stmt.kind {
            StmtKind::Class(def) => {
                for member in &def.body.stmts {
                    if let StmtKind::Var(var) = &member.kind {
                        if let Some(init) = &var.init {
                            scan_derefs(init, log);
                        }
                    }
                }
                check_field_inits(&def.body, log);
            }
            StmtKind::External(body) => check_field_inits(body, log),
            _ => {}
        }
    }
}

/// Conservative dereference warnings for casts outside flow analysis.
fn scan_derefs(e: &Expr, log: &mut Log) {
    if let ExprKind::Cast { value, .. } = &e.kind {
        if value.ty().is_nullable() && !e.ty().is_nullable() && !e.ty().is_error() {
            let name = match &value.strip_casts().kind {
                ExprKind::Ident { name, .. } => Some(name.as_str()),
                _ => None,
            };
            log.warning(value.loc, WarningKind::NullableDereference(deref_subject(name)));
        }
    }
    for child in children(e) {
        scan_derefs(child, log);
    }
}

fn children(e: &Expr) -> Vec<&Expr> {
    match &e.kind {
        ExprKind::Unary { value, .. } | ExprKind::Nullable { value } => vec![value],
        ExprKind::Binary { left, right, .. } => vec![left, right],
        ExprKind::Call { callee, args, .. } => {
            let mut out: Vec<&Expr> = vec![callee];
            out.extend(args.iter());
            out
        }
        ExprKind::Param { base, params } => {
            let mut out: Vec<&Expr> = vec![base];
            out.extend(params.iter());
            out
        }
        ExprKind::Cast { value, target } => vec![value, target],
        ExprKind::Member { obj, .. } => vec![obj],
        ExprKind::Index { obj, index } => vec![obj, index],
        ExprKind::List(items) => items.iter().collect(),
        _ => Vec::new(),
    }
}

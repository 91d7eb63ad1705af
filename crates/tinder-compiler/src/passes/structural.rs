//! Structural checks.
//!
//! Post-parse sanity checks that depend only on syntactic kinds and where
//! a statement appears:
//!
//! - module scope admits only `external`, class, variable, and function
//!   definitions
//! - class bodies admit nested classes, variables, and functions
//! - `external` blocks admit classes, variables, and functions
//! - function bodies admit variable, expression, `if`, `return`, and
//!   `while` statements
//! - variable initializers are forbidden at module scope and inside
//!   `external`
//! - function default arguments are forbidden
//! - a function inside `external` must have no body; outside, it must
//!   have one

use tinder_core::Log;
use tinder_parser::ast::{Block, FuncDef, Module, Stmt, StmtKind, VarDef};

use crate::errors::{ErrorKind, Place};

pub fn run(module: &Module, log: &mut Log) {
    check_block(&module.block, Place::Module, log);
}

fn check_block(block: &Block, place: Place, log: &mut Log) {
    for stmt in &block.stmts {
        check_stmt(stmt, place, log);
    }
}

fn check_stmt(stmt: &Stmt, place: Place, log: &mut Log) {
    match &stmt.kind {
        StmtKind::External(body) => {
            if place != Place::Module {
                log.error(stmt.loc, ErrorKind::StmtNotAllowed(place));
            }
            check_block(body, Place::External, log);
        }

        StmtKind::Class(def) => {
            if place == Place::Func {
                log.error(stmt.loc, ErrorKind::StmtNotAllowed(place));
            }
            check_block(&def.body, Place::Class, log);
        }

        StmtKind::Var(def) => check_var(def, stmt, place, log),

        StmtKind::Func(def) => {
            if place == Place::Func {
                log.error(stmt.loc, ErrorKind::StmtNotAllowed(place));
            }
            check_func(def, stmt, log);
        }

        StmtKind::If { then_block, else_block, .. } => {
            if place != Place::Func {
                log.error(stmt.loc, ErrorKind::StmtNotAllowed(place));
            }
            check_block(then_block, Place::Func, log);
            if let Some(else_block) = else_block {
                check_block(else_block, Place::Func, log);
            }
        }

        StmtKind::While { body, .. } => {
            if place != Place::Func {
                log.error(stmt.loc, ErrorKind::StmtNotAllowed(place));
            }
            check_block(body, Place::Func, log);
        }

        StmtKind::Return(_) | StmtKind::Expr(_) => {
            if place != Place::Func {
                log.error(stmt.loc, ErrorKind::StmtNotAllowed(place));
            }
        }
    }
}

fn check_var(def: &VarDef, stmt: &Stmt, place: Place, log: &mut Log) {
    if def.init.is_some() {
        if def.in_external {
            log.error(stmt.loc, ErrorKind::InitNotAllowed(Place::External));
        } else if place == Place::Module {
            log.error(stmt.loc, ErrorKind::InitNotAllowed(Place::Module));
        }
    }
}

fn check_func(def: &FuncDef, stmt: &Stmt, log: &mut Log) {
    for arg in &def.args {
        if arg.init.is_some() {
            log.error(arg.name_loc, ErrorKind::DefaultArgNotAllowed);
        }
    }

    // The in_external breadcrumb covers functions in classes that are
    // themselves inside an external block.
    if def.in_external {
        if def.body.is_some() {
            log.error(stmt.loc, ErrorKind::FunctionBody(true));
        }
    } else if def.body.is_none() {
        log.error(stmt.loc, ErrorKind::FunctionBody(false));
    }

    if let Some(body) = &def.body {
        check_block(body, Place::Func, log);
    }
}

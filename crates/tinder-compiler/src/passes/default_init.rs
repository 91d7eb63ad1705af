//! Default initialization.
//!
//! Synthesizes an initializer for every uninitialized variable: `false`,
//! `0`, `0.0`, or `""` for the primitive types, and a cast of `null` to
//! the declared type for everything else. This is the one place the core
//! produces a null value of a non-nullable type; emitters translate it
//! however suits the target.
//!
//! Declarations inside `external` blocks stay bare; they have no storage
//! to initialize. Synthesized nodes carry their computed types, since the
//! type pass has already run.

use tinder_core::{Loc, NodeId, Type};
use tinder_parser::ast::{Block, Expr, ExprKind, Module, StmtKind};

use crate::symbol::SymbolTable;

pub fn run(module: &mut Module, symbols: &SymbolTable) {
    let mut next_id = module.node_count() as u32;
    init_block(&mut module.block, symbols, &mut next_id);
    module.advance_ids(next_id);
}

fn init_block(block: &mut Block, symbols: &SymbolTable, next_id: &mut u32) {
    for stmt in &mut block.stmts {
        match &mut stmt.kind {
            StmtKind::Var(def) => {
                if def.init.is_none() && !def.in_external {
                    if let Some(symbol) = def.symbol {
                        let ty = symbols.get(symbol).ty.clone();
                        def.init = make_init(ty, def.name_loc, next_id);
                    }
                }
            }
            StmtKind::Func(def) => {
                if let Some(body) = &mut def.body {
                    init_block(body, symbols, next_id);
                }
            }
            StmtKind::Class(def) => init_block(&mut def.body, symbols, next_id),
            StmtKind::External(body) => init_block(body, symbols, next_id),
            StmtKind::If { then_block, else_block, .. } => {
                init_block(then_block, symbols, next_id);
                if let Some(else_block) = else_block {
                    init_block(else_block, symbols, next_id);
                }
            }
            StmtKind::While { body, .. } => init_block(body, symbols, next_id),
            StmtKind::Return(_) | StmtKind::Expr(_) => {}
        }
    }
}

fn make_init(ty: Type, loc: Loc, next_id: &mut u32) -> Option<Expr> {
    if ty.is_error() {
        return None;
    }

    let mut fresh = || {
        let id = NodeId(*next_id);
        *next_id += 1;
        id
    };

    let expr = match ty {
        Type::Prim(prim) => {
            use tinder_core::Primitive::*;
            let kind = match prim {
                Bool => ExprKind::Bool(false),
                Int => ExprKind::Int(0),
                Float => ExprKind::Float(0.0),
                String => ExprKind::Str(std::string::String::new()),
            };
            let mut expr = Expr::new(fresh(), kind, loc);
            expr.ty = Some(Type::Prim(prim));
            expr
        }
        other => {
            let mut value = Expr::new(fresh(), ExprKind::Null, loc);
            value.ty = Some(Type::Null);
            let mut target = Expr::new(fresh(), ExprKind::TypeRef(other.clone()), loc);
            target.ty = Some(Type::meta(other.clone()));
            let mut cast = Expr::new(
                fresh(),
                ExprKind::Cast { value: Box::new(value), target: Box::new(target) },
                loc,
            );
            cast.ty = Some(other);
            cast
        }
    };
    Some(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{define_symbols, symbol_types};
    use crate::scope::ScopeTree;
    use tinder_core::Log;
    use tinder_parser::{tokenize, Parser};

    fn init(source: &str) -> (Module, SymbolTable) {
        let mut log = Log::new("test.tn");
        let tokens = tokenize(source, &mut log);
        let mut module = Parser::parse(tokens, &mut log).expect("parse failure");
        let mut scopes = ScopeTree::new();
        let mut symbols = SymbolTable::new();
        define_symbols::run(&mut module, &mut scopes, &mut symbols, &mut log);
        symbol_types::run(&mut module, &scopes, &mut symbols, &mut log);
        assert!(!log.has_errors(), "{log}");
        run(&mut module, &symbols);
        (module, symbols)
    }

    fn first_init(module: &Module) -> &Expr {
        match &module.block.stmts[0].kind {
            StmtKind::Var(def) => def.init.as_ref().expect("no initializer synthesized"),
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn primitive_defaults() {
        let (module, _) = init("bool b");
        assert!(matches!(first_init(&module).kind, ExprKind::Bool(false)));

        let (module, _) = init("int x");
        assert!(matches!(first_init(&module).kind, ExprKind::Int(0)));

        let (module, _) = init("float f");
        assert!(matches!(first_init(&module).kind, ExprKind::Float(v) if v == 0.0));

        let (module, _) = init("string s");
        match &first_init(&module).kind {
            ExprKind::Str(s) => assert!(s.is_empty()),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn reference_types_get_null_cast() {
        let (module, _) = init("class Foo { }\nFoo f\n");
        match &module.block.stmts[1].kind {
            StmtKind::Var(def) => {
                let init = def.init.as_ref().unwrap();
                match &init.kind {
                    ExprKind::Cast { value, .. } => {
                        assert!(value.is_null_literal());
                        assert!(matches!(init.ty(), Type::Class(_)));
                    }
                    other => panic!("expected cast, got {other:?}"),
                }
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn nullable_gets_null_cast() {
        let (module, _) = init("int? x");
        match &first_init(&module).kind {
            ExprKind::Cast { value, .. } => assert!(value.is_null_literal()),
            other => panic!("expected cast, got {other:?}"),
        }
    }

    #[test]
    fn external_declarations_stay_bare() {
        let (module, _) = init("external { int x }");
        match &module.block.stmts[0].kind {
            StmtKind::External(block) => match &block.stmts[0].kind {
                StmtKind::Var(def) => assert!(def.init.is_none()),
                other => panic!("expected var, got {other:?}"),
            },
            other => panic!("expected external, got {other:?}"),
        }
    }

    #[test]
    fn existing_initializers_kept() {
        let (module, _) = init("void f() { int x = 7 }");
        match &module.block.stmts[0].kind {
            StmtKind::Func(def) => match &def.body.as_ref().unwrap().stmts[0].kind {
                StmtKind::Var(def) => {
                    assert!(matches!(def.init.as_ref().unwrap().kind, ExprKind::Int(7)))
                }
                other => panic!("expected var, got {other:?}"),
            },
            other => panic!("expected function, got {other:?}"),
        }
    }
}

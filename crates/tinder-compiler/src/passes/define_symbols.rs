//! Symbol definition.
//!
//! Builds the scope tree and defines every variable, function, and class
//! symbol into its enclosing scope. Class bodies open a class scope whose
//! parent is the enclosing scope; function bodies open a function scope
//! holding the arguments; `external` blocks share the enclosing scope.
//! Function overloading is handled by [`ScopeTree::define`].

use tinder_core::{Log, ScopeId, Type};
use tinder_parser::ast::{Block, Module, StmtKind, VarDef};

use crate::errors::ErrorKind;
use crate::scope::{DefineError, ScopeKind, ScopeTree};
use crate::symbol::{Symbol, SymbolKind, SymbolTable};

pub fn run(module: &mut Module, scopes: &mut ScopeTree, symbols: &mut SymbolTable, log: &mut Log) {
    let module_scope = scopes.alloc(None, ScopeKind::Module);
    let mut pass = DefineSymbols { scopes, symbols, log };
    pass.walk_block(&mut module.block, module_scope);
}

struct DefineSymbols<'a> {
    scopes: &'a mut ScopeTree,
    symbols: &'a mut SymbolTable,
    log: &'a mut Log,
}

impl DefineSymbols<'_> {
    fn walk_block(&mut self, block: &mut Block, scope: ScopeId) {
        block.scope = Some(scope);
        for stmt in &mut block.stmts {
            match &mut stmt.kind {
                StmtKind::Var(def) => self.define_var(def, scope),

                StmtKind::Func(def) => {
                    let symbol = Symbol::new(
                        SymbolKind::Func,
                        def.name.clone(),
                        def.is_static,
                        def.name_loc,
                    );
                    let id = self.symbols.alloc(symbol);
                    def.symbol = Some(id);
                    self.define(scope, id);

                    let func_scope = self.scopes.alloc(Some(scope), ScopeKind::Func);
                    for arg in &mut def.args {
                        self.define_var(arg, func_scope);
                    }
                    if let Some(body) = &mut def.body {
                        self.walk_block(body, func_scope);
                    }
                }

                StmtKind::Class(def) => {
                    let symbol =
                        Symbol::new(SymbolKind::Class, def.name.clone(), true, def.name_loc);
                    let id = self.symbols.alloc(symbol);
                    def.symbol = Some(id);
                    self.define(scope, id);

                    let class_scope = self.scopes.alloc(Some(scope), ScopeKind::Class);
                    self.symbols.get_mut(id).class_scope = Some(class_scope);
                    // Using the class name as an expression yields the
                    // type of the class, so the symbol's type is known now.
                    self.symbols.get_mut(id).ty = Type::meta(Type::Class(id));
                    self.walk_block(&mut def.body, class_scope);
                }

                // External blocks share the enclosing scope.
                StmtKind::External(body) => self.walk_block(body, scope),

                StmtKind::If { then_block, else_block, .. } => {
                    let then_scope = self.scopes.alloc(Some(scope), ScopeKind::Local);
                    self.walk_block(then_block, then_scope);
                    if let Some(else_block) = else_block {
                        let else_scope = self.scopes.alloc(Some(scope), ScopeKind::Local);
                        self.walk_block(else_block, else_scope);
                    }
                }

                StmtKind::While { body, .. } => {
                    let body_scope = self.scopes.alloc(Some(scope), ScopeKind::Local);
                    self.walk_block(body, body_scope);
                }

                StmtKind::Return(_) | StmtKind::Expr(_) => {}
            }
        }
    }

    fn define_var(&mut self, def: &mut VarDef, scope: ScopeId) {
        let symbol = Symbol::new(SymbolKind::Variable, def.name.clone(), false, def.name_loc);
        let id = self.symbols.alloc(symbol);
        def.symbol = Some(id);
        self.define(scope, id);
    }

    fn define(&mut self, scope: ScopeId, id: tinder_core::SymbolId) {
        let name = self.symbols.get(id).name.clone();
        let loc = self.symbols.get(id).def_loc;
        match self.scopes.define(scope, id, self.symbols) {
            Ok(()) => {}
            Err(DefineError::Redefinition) => {
                self.log.error(loc, ErrorKind::Redefinition(name));
            }
            Err(DefineError::ChangedModifier) => {
                self.log.error(loc, ErrorKind::OverloadChangedModifier(name));
            }
        }
    }
}

//! Scopes and name lookup.
//!
//! Scopes form a tree owned by an arena. Each scope maps a name to
//! exactly one symbol; defining a function over an existing function with
//! the same static-ness promotes the entry to an overload set instead of
//! being a redefinition.

use rustc_hash::FxHashMap;
use tinder_core::{ScopeId, SymbolId, Type};

use crate::symbol::{Symbol, SymbolKind, SymbolTable};

/// What kind of region a scope covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Func,
    Local,
}

/// The four lookup modes.
///
/// `Normal` skips class scopes while walking outward, because class
/// members are not visible by bare name inside methods. The member modes
/// search a single class scope, filtered by static-ness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Any,
    Normal,
    StaticMember,
    InstanceMember,
}

#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    symbols: FxHashMap<String, SymbolId>,
}

/// Why a definition was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineError {
    Redefinition,
    /// A function overload tried to change `static`.
    ChangedModifier,
}

/// Arena of all scopes in a compilation.
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope { parent, kind, symbols: FxHashMap::default() });
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ScopeId> {
        (0..self.scopes.len() as u32).map(ScopeId)
    }

    /// Whether a symbol lives in a function or local scope.
    pub fn is_local(&self, table: &SymbolTable, symbol: SymbolId) -> bool {
        table
            .get(symbol)
            .owner
            .is_some_and(|owner| matches!(self.get(owner).kind, ScopeKind::Func | ScopeKind::Local))
    }

    /// Define `symbol` into `scope`.
    ///
    /// Redefining a name fails unless both the existing and the new symbol
    /// are functions with the same static-ness, in which case the entry is
    /// promoted to an overload set.
    pub fn define(
        &mut self,
        scope: ScopeId,
        symbol: SymbolId,
        table: &mut SymbolTable,
    ) -> Result<(), DefineError> {
        let name = table.get(symbol).name.clone();

        let existing = self.get(scope).symbols.get(&name).copied();
        let Some(existing) = existing else {
            table.get_mut(symbol).owner = Some(scope);
            self.scopes[scope.0 as usize].symbols.insert(name, symbol);
            return Ok(());
        };

        if table.get(symbol).kind != SymbolKind::Func {
            return Err(DefineError::Redefinition);
        }

        match table.get(existing).kind {
            SymbolKind::Func => {
                if table.get(existing).is_static != table.get(symbol).is_static {
                    return Err(DefineError::ChangedModifier);
                }
                // Promote the existing entry to an overload set.
                let is_static = table.get(existing).is_static;
                let def_loc = table.get(existing).def_loc;
                let mut set = Symbol::new(SymbolKind::OverloadedFunc, name.clone(), is_static, def_loc);
                set.overloads = vec![existing, symbol];
                set.ty = Type::Overloaded(set.overloads.clone());
                set.owner = Some(scope);
                let set_id = table.alloc(set);
                table.get_mut(symbol).owner = Some(scope);
                self.scopes[scope.0 as usize].symbols.insert(name, set_id);
                Ok(())
            }
            SymbolKind::OverloadedFunc => {
                if table.get(existing).is_static != table.get(symbol).is_static {
                    return Err(DefineError::ChangedModifier);
                }
                table.get_mut(symbol).owner = Some(scope);
                let set = table.get_mut(existing);
                set.overloads.push(symbol);
                set.ty = Type::Overloaded(set.overloads.clone());
                Ok(())
            }
            _ => Err(DefineError::Redefinition),
        }
    }

    /// Look up `name` starting from `scope`.
    pub fn lookup(
        &self,
        scope: ScopeId,
        name: &str,
        mode: Lookup,
        table: &SymbolTable,
    ) -> Option<SymbolId> {
        match mode {
            Lookup::Any | Lookup::Normal => {
                let mut current = Some(scope);
                while let Some(id) = current {
                    let s = self.get(id);
                    let skip = mode == Lookup::Normal && s.kind == ScopeKind::Class;
                    if !skip {
                        if let Some(&symbol) = s.symbols.get(name) {
                            return Some(symbol);
                        }
                    }
                    current = s.parent;
                }
                None
            }
            Lookup::StaticMember | Lookup::InstanceMember => {
                let want_static = mode == Lookup::StaticMember;
                let &symbol = self.get(scope).symbols.get(name)?;
                (table.get(symbol).is_static == want_static).then_some(symbol)
            }
        }
    }
}

//! Symbols and the symbol table.
//!
//! Symbols are owned by an arena and referenced everywhere else by
//! [`SymbolId`]; symbol equality is id equality. A symbol's `final_name`
//! starts equal to its definition name and is rewritten by the rename
//! pass per emission target.

use tinder_core::{Loc, ScopeId, SymbolId, Type};

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Func,
    Class,
    /// A synthetic symbol holding two or more functions that share a name
    /// and static-ness; resolved per call site.
    OverloadedFunc,
}

/// A named program entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// The name an emitter should use; rewritten by the rename pass.
    pub final_name: String,
    pub is_static: bool,
    /// Filled in by the symbol-type pass; [`Type::Error`] until then.
    pub ty: Type,
    pub def_loc: Loc,
    /// The scope this symbol is defined in.
    pub owner: Option<ScopeId>,
    /// For classes: the scope of the class body, holding the members.
    pub class_scope: Option<ScopeId>,
    /// For overloaded-function symbols: the member function symbols.
    pub overloads: Vec<SymbolId>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>, is_static: bool, def_loc: Loc) -> Self {
        let name = name.into();
        Self {
            kind,
            final_name: name.clone(),
            name,
            is_static,
            ty: Type::Error,
            def_loc,
            owner: None,
            class_scope: None,
            overloads: Vec::new(),
        }
    }
}

/// Arena of all symbols in a compilation.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(i, s)| (SymbolId(i as u32), s))
    }

    /// Render a type the way it is written in source, for diagnostics.
    ///
    /// Class types need the table to recover the class name, which is why
    /// this is not a `Display` impl on [`Type`].
    pub fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Void => "void".to_string(),
            Type::Prim(p) => {
                use tinder_core::Primitive::*;
                match p {
                    Bool => "bool",
                    Int => "int",
                    Float => "float",
                    String => "string",
                }
                .to_string()
            }
            Type::List(None) => "list".to_string(),
            Type::List(Some(item)) => format!("list<{}>", self.type_name(item)),
            Type::Func { ret: None, .. } => "function".to_string(),
            Type::Func { ret: Some(ret), args } => {
                let mut parts = vec![self.type_name(ret)];
                parts.extend(args.iter().map(|a| self.type_name(a)));
                format!("function<{}>", parts.join(", "))
            }
            Type::Class(id) => self.get(*id).name.clone(),
            Type::Meta(inner) => self.type_name(inner),
            Type::Overloaded(_) => "overloaded function".to_string(),
            Type::Null => "null".to_string(),
            Type::Nullable(inner) => format!("{}?", self.type_name(inner)),
            Type::Error => "<error>".to_string(),
        }
    }

    /// Render an argument type list for call diagnostics: `int, float`.
    pub fn arg_list(&self, tys: &[Type]) -> String {
        tys.iter().map(|t| self.type_name(t)).collect::<Vec<_>>().join(", ")
    }
}

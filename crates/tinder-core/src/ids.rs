//! Opaque arena handles.
//!
//! The AST, the symbol table, and the scope tree all hand out small copyable
//! ids instead of references, so that later passes can decorate nodes and
//! share symbols without ownership cycles.

/// Identifies an AST node (statement or expression).
///
/// Assigned densely by the parser; passes that synthesize nodes draw fresh
/// ids from the module. Used as the key for pass side tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Identifies a symbol in the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

/// Identifies a scope in the scope tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub u32);

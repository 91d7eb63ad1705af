//! Shared foundation for the Tinder compiler.
//!
//! This crate holds the pieces every stage of the pipeline needs:
//! - [`Loc`]: a line/column position in the source being compiled
//! - [`Log`], [`Diagnostic`], [`Severity`]: the diagnostic collaborator
//!   that passes report into
//! - [`Type`]: the closed set of Tinder types, shared between the AST
//!   (computed types live on expressions) and the semantic passes
//! - The opaque arena handles [`NodeId`], [`SymbolId`], [`ScopeId`]

mod diagnostics;
mod ids;
mod loc;
mod types;

pub use diagnostics::{Diagnostic, Log, Severity};
pub use ids::{NodeId, ScopeId, SymbolId};
pub use loc::Loc;
pub use types::{Primitive, Type};

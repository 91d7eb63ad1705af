//! The pass pipeline, in execution order:
//!
//! 1. [`structural`]: statements in the wrong syntactic context
//! 2. [`define_symbols`]: scope tree and symbol definitions
//! 3. [`symbol_types`]: declared types on symbols
//! 4. the type pass in [`crate::compute`]
//! 5. [`default_init`]: synthesized initializers
//! 6. flow validation in [`crate::flow`]
//!
//! Each pass is skipped when an earlier pass reported errors.

pub mod default_init;
pub mod define_symbols;
pub mod structural;
pub mod symbol_types;

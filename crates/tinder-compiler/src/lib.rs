//! The Tinder compiler: semantic analysis and nullability flow checking.
//!
//! The pipeline runs leaves-first over a parsed module, each pass
//! decorating the tree in place:
//!
//! 1. structural check
//! 2. symbol definition (scope tree)
//! 3. declared symbol types
//! 4. expression typing (overloads, implicit conversions)
//! 5. default initialization
//! 6. flow validation (dead code, return paths, null dereferences)
//!
//! A pass is skipped as soon as an earlier pass has reported errors. The
//! decorated tree plus the symbol and scope tables form a [`Compilation`],
//! which emitters consume after running [`rename::rename_symbols`] with
//! their own [`rename::RenamePolicy`].

pub mod compute;
pub mod convert;
pub mod errors;
pub mod flow;
pub mod passes;
pub mod rename;
pub mod scope;
pub mod symbol;

pub use errors::{ErrorKind, WarningKind};
pub use rename::{rename_symbols, RenamePolicy};
pub use scope::{Lookup, ScopeKind, ScopeTree};
pub use symbol::{Symbol, SymbolKind, SymbolTable};

use log::debug;
use tinder_core::Log;
use tinder_parser::ast::Module;
use tinder_parser::{tokenize, Parser};

/// A fully analyzed program: the decorated tree and its symbol data.
#[derive(Debug)]
pub struct Compilation {
    pub module: Module,
    pub symbols: SymbolTable,
    pub scopes: ScopeTree,
}

/// What a compilation produced. The compilation is present iff no errors
/// were reported anywhere in the pipeline; the log always carries every
/// diagnostic, warnings included.
#[derive(Debug)]
pub struct CompileResult {
    pub compilation: Option<Compilation>,
    pub log: Log,
}

impl CompileResult {
    pub fn is_success(&self) -> bool {
        self.compilation.is_some()
    }
}

/// Compile a single source file.
pub fn compile(file_name: &str, source: &str) -> CompileResult {
    let mut log = Log::new(file_name);

    debug!("tokenizing \"{file_name}\"");
    let tokens = tokenize(source, &mut log);
    if log.has_errors() {
        return CompileResult { compilation: None, log };
    }

    debug!("parsing");
    let Some(mut module) = Parser::parse(tokens, &mut log) else {
        return CompileResult { compilation: None, log };
    };

    let mut scopes = ScopeTree::new();
    let mut symbols = SymbolTable::new();

    debug!("checking structure");
    passes::structural::run(&module, &mut log);
    if log.has_errors() {
        return CompileResult { compilation: None, log };
    }

    debug!("defining symbols");
    passes::define_symbols::run(&mut module, &mut scopes, &mut symbols, &mut log);
    if log.has_errors() {
        return CompileResult { compilation: None, log };
    }

    debug!("computing symbol types");
    passes::symbol_types::run(&mut module, &scopes, &mut symbols, &mut log);
    if log.has_errors() {
        return CompileResult { compilation: None, log };
    }

    debug!("computing expression types");
    compute::run(&mut module, &scopes, &mut symbols, &mut log);
    if log.has_errors() {
        return CompileResult { compilation: None, log };
    }

    debug!("default-initializing");
    passes::default_init::run(&mut module, &symbols);

    debug!("validating flow");
    flow::run(&module, &scopes, &symbols, &mut log);
    if log.has_errors() {
        return CompileResult { compilation: None, log };
    }

    CompileResult { compilation: Some(Compilation { module, symbols, scopes }), log }
}

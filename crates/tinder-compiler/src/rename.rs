//! Symbol renaming for emission targets.
//!
//! Runs once per emitter, before it walks the tree. Every symbol's
//! `final_name` is reset to its definition name, overloads are mangled
//! apart when the target cannot represent overloading, and any name that
//! clashes with the target's reserved words (or with another final name
//! in the same scope) gets `_` prepended until it is free. The pass is
//! re-runnable: the reset means per-emitter invocations do not compound.

use rustc_hash::FxHashSet;
use tinder_core::Type;

use crate::symbol::{SymbolKind, SymbolTable};
use crate::Compilation;

/// A target's renaming rules.
#[derive(Debug, Clone)]
pub struct RenamePolicy {
    /// Identifiers the target reserves.
    pub reserved: FxHashSet<String>,
    /// Whether overloaded functions must be renamed apart.
    pub mangle_overloads: bool,
}

impl RenamePolicy {
    pub fn new(reserved: &[&str], mangle_overloads: bool) -> Self {
        Self {
            reserved: reserved.iter().map(|s| s.to_string()).collect(),
            mangle_overloads,
        }
    }

    /// Rules for the dynamic (prototype-classes) target.
    pub fn dynamic_target() -> Self {
        Self::new(
            &[
                "arguments", "break", "case", "catch", "class", "const", "continue", "debugger",
                "default", "delete", "do", "else", "export", "extends", "finally", "for",
                "function", "if", "import", "in", "instanceof", "let", "new", "null", "return",
                "super", "switch", "this", "throw", "try", "typeof", "var", "void", "while",
                "with", "yield",
            ],
            true,
        )
    }

    /// Rules for the systems (value/pointer) target.
    pub fn systems_target() -> Self {
        Self::new(
            &[
                "auto", "bool", "break", "case", "catch", "char", "class", "const", "continue",
                "default", "delete", "do", "double", "else", "enum", "extern", "false", "float",
                "for", "goto", "if", "int", "long", "namespace", "new", "nullptr", "operator",
                "private", "protected", "public", "return", "short", "signed", "sizeof", "static",
                "struct", "switch", "template", "this", "true", "typedef", "union", "unsigned",
                "using", "virtual", "void", "while",
            ],
            true,
        )
    }
}

/// Rewrite every symbol's `final_name` for the given target.
pub fn rename_symbols(compilation: &mut Compilation, policy: &RenamePolicy) {
    let Compilation { symbols, scopes, .. } = compilation;

    // Start from a clean slate so repeated runs do not compound.
    let ids: Vec<_> = symbols.iter().map(|(id, _)| id).collect();
    for id in &ids {
        let symbol = symbols.get_mut(*id);
        symbol.final_name = symbol.name.clone();
    }

    // Mangle overload sets apart.
    if policy.mangle_overloads {
        for id in &ids {
            if symbols.get(*id).kind != SymbolKind::OverloadedFunc {
                continue;
            }
            let members = symbols.get(*id).overloads.clone();
            for member in members {
                let suffix = match &symbols.get(member).ty {
                    Type::Func { args, .. } => {
                        args.iter().map(|a| mangle_fragment(a, symbols)).collect::<String>()
                    }
                    _ => String::new(),
                };
                let symbol = symbols.get_mut(member);
                symbol.final_name = format!("{}{}", symbol.name, suffix);
            }
        }
    }

    // Reserved words and per-scope uniqueness, in definition order.
    for scope in scopes.ids() {
        let mut used: FxHashSet<String> = FxHashSet::default();
        let mut members: Vec<_> = ids
            .iter()
            .copied()
            .filter(|&id| symbols.get(id).owner == Some(scope))
            .collect();
        members.sort();
        for member in members {
            if symbols.get(member).kind == SymbolKind::OverloadedFunc {
                continue;
            }
            let mut name = symbols.get(member).final_name.clone();
            while policy.reserved.contains(&name) || used.contains(&name) {
                name.insert(0, '_');
            }
            used.insert(name.clone());
            symbols.get_mut(member).final_name = name;
        }
    }
}

/// A capitalized identifier-safe fragment of a type's printed form, used
/// to tell overloads apart in the mangled name.
fn mangle_fragment(ty: &Type, symbols: &SymbolTable) -> String {
    match ty {
        Type::Void => "Void".to_string(),
        Type::Prim(p) => {
            use tinder_core::Primitive::*;
            match p {
                Bool => "Bool",
                Int => "Int",
                Float => "Float",
                String => "String",
            }
            .to_string()
        }
        Type::List(Some(item)) => format!("List{}", mangle_fragment(item, symbols)),
        Type::List(None) => "List".to_string(),
        Type::Func { ret, args } => {
            let mut out = "Function".to_string();
            if let Some(ret) = ret {
                out.push_str(&mangle_fragment(ret, symbols));
            }
            for arg in args {
                out.push_str(&mangle_fragment(arg, symbols));
            }
            out
        }
        Type::Class(id) => capitalize(&symbols.get(*id).name),
        Type::Nullable(inner) => format!("{}OrNull", mangle_fragment(inner, symbols)),
        Type::Null => "Null".to_string(),
        Type::Meta(inner) => mangle_fragment(inner, symbols),
        Type::Overloaded(_) | Type::Error => String::new(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

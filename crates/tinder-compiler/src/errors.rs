//! The diagnostic taxonomy.
//!
//! The `Display` text of each kind is the exact user-facing message; the
//! passes format type and symbol names into the payloads before reporting.
//! Any diagnostic whose inputs include the poison type is dropped at the
//! report site, so one root cause does not fan out into noise.

use std::fmt;

use thiserror::Error;

/// Where a statement appeared, for context-sensitivity messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Module,
    Class,
    External,
    Func,
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Module => write!(f, "at module scope"),
            Place::Class => write!(f, "inside a class"),
            Place::External => write!(f, "inside an \"external\" block"),
            Place::Func => write!(f, "inside a function"),
        }
    }
}

/// Errors. These suppress later passes and downstream emission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("\"{0}\" is already defined")]
    Redefinition(String),

    #[error("statement is not allowed {0}")]
    StmtNotAllowed(Place),

    #[error("variable initializers are not allowed {0}")]
    InitNotAllowed(Place),

    #[error("default values for function arguments are not allowed")]
    DefaultArgNotAllowed,

    #[error("{}", function_body_text(.0))]
    FunctionBody(bool),

    #[error("\"{0}\" is not defined")]
    UndefinedSymbol(String),

    #[error("cannot use type \"{0}\" here")]
    NotUseableType(String),

    #[error("type \"{0}\" is already nullable")]
    BadNullableType(String),

    #[error("expected type \"{expected}\" but found type \"{found}\"")]
    TypeMismatch { expected: String, found: String },

    #[error("no unary operator \"{op}\" for type \"{ty}\"")]
    UnaryOpNotFound { op: String, ty: String },

    #[error("no binary operator \"{op}\" for types \"{left}\" and \"{right}\"")]
    BinaryOpNotFound { op: String, left: String, right: String },

    #[error("cannot cast from type \"{from}\" to type \"{to}\"")]
    InvalidCast { from: String, to: String },

    #[error("operator \"?.\" cannot be used on non-nullable type \"{0}\"")]
    BadSafeDereference(String),

    #[error("\"{name}\" is not a member of type \"{ty}\"")]
    BadMemberAccess { name: String, ty: String },

    #[error("cannot call \"{name}\" with arguments \"({args})\"")]
    CallNotFound { name: String, args: String },

    #[error("multiple overloads of \"{name}\" match arguments \"({args})\"")]
    MultipleOverloadsFound { name: String, args: String },

    #[error("\"this\" is only allowed inside non-static member functions")]
    BadThis,

    #[error("{}", void_return_text(.0))]
    VoidReturn(bool),

    #[error("not all control paths return a value")]
    NotAllPathsReturnValue,

    #[error("\"{0}\" is used before it is defined")]
    UseBeforeDefinition(String),

    #[error("overload of \"{0}\" cannot change \"static\"")]
    OverloadChangedModifier(String),

    #[error("cannot resolve overloaded function \"{0}\" without context")]
    NoOverloadContext(String),

    #[error("cannot resolve type of list literal without context")]
    NoListContext,

    #[error("type \"{0}\" cannot be used as a value")]
    MetaTypeExpr(String),

    #[error("type \"{ty}\" expects {expected} type parameters but got {found}")]
    BadTypeParamCount { ty: String, expected: usize, found: usize },

    #[error("keyword \"{0}\" is not allowed here")]
    BadKeyword(&'static str),
}

/// Warnings. Advisory; they do not suppress output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    #[error("dead code")]
    DeadCode,

    /// The payload is pre-formatted: `value "x"` for a named local,
    /// plain `value` otherwise.
    #[error("dereference of definitely null {0}")]
    NullDereference(String),

    #[error("dereference of possibly null {0}")]
    NullableDereference(String),
}

fn function_body_text(in_external: &bool) -> &'static str {
    if *in_external {
        "functions inside \"external\" cannot have an implementation"
    } else {
        "function must have an implementation"
    }
}

fn void_return_text(should_be_void: &bool) -> &'static str {
    if *should_be_void {
        "cannot return a value from a \"void\" function"
    } else {
        "function must return a value"
    }
}

/// Format a dereference subject for the null warnings.
pub(crate) fn deref_subject(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("value \"{name}\""),
        None => "value".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_texts() {
        assert_eq!(
            ErrorKind::Redefinition("x".into()).to_string(),
            "\"x\" is already defined"
        );
        assert_eq!(
            ErrorKind::CallNotFound { name: "p".into(), args: "bool".into() }.to_string(),
            "cannot call \"p\" with arguments \"(bool)\""
        );
        assert_eq!(
            ErrorKind::FunctionBody(true).to_string(),
            "functions inside \"external\" cannot have an implementation"
        );
        assert_eq!(
            ErrorKind::FunctionBody(false).to_string(),
            "function must have an implementation"
        );
        assert_eq!(
            ErrorKind::StmtNotAllowed(Place::Module).to_string(),
            "statement is not allowed at module scope"
        );
        assert_eq!(
            WarningKind::NullDereference(deref_subject(Some("x"))).to_string(),
            "dereference of definitely null value \"x\""
        );
        assert_eq!(
            WarningKind::NullableDereference(deref_subject(None)).to_string(),
            "dereference of possibly null value"
        );
    }
}

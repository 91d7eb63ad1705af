//! The implicit conversion relation.
//!
//! Implicit convertibility is the smallest relation satisfying:
//! - `int` converts to `float`
//! - `T` converts to `T?` for any non-nullable `T`
//! - `null` converts to any `T?`
//! - unwrapping a nullable source converts when the unwrapped conversion
//!   (or equality) already holds
//!
//! The relation is not reflexive; callers check equality separately. The
//! nullable-unwrap direction is what lets a `T?` flow into a `T` slot; it
//! materializes as a cast that the flow analyzer then checks for null.

use tinder_core::{Primitive, Type};

/// Whether `from` implicitly converts to `to`. Equality does not count.
pub fn convertible(from: &Type, to: &Type) -> bool {
    match (from, to) {
        (Type::Error, _) | (_, Type::Error) => false,
        (Type::Prim(Primitive::Int), Type::Prim(Primitive::Float)) => true,
        (Type::Null, Type::Nullable(_)) => true,
        (from, Type::Nullable(to_inner)) => from == to_inner.as_ref() || convertible(from, to_inner),
        (Type::Nullable(from_inner), to) => from_inner.as_ref() == to || convertible(from_inner, to),
        _ => false,
    }
}

/// Equality or implicit convertibility.
pub fn equal_or_convertible(from: &Type, to: &Type) -> bool {
    from == to || convertible(from, to)
}

/// Whether an explicit cast (`as`) from `from` to `to` is valid: equality,
/// implicit convertibility, or both sides numeric primitives.
pub fn valid_cast(from: &Type, to: &Type) -> bool {
    equal_or_convertible(from, to) || (from.is_numeric() && to.is_numeric())
}

/// The common type two operands widen to for arithmetic and comparison,
/// looking through nullables. `None` when they have no numeric/string
/// common ground.
pub fn widened(left: &Type, right: &Type) -> Option<Type> {
    let l = left.strip_nullable();
    let r = right.strip_nullable();
    if l.is_numeric() && r.is_numeric() {
        if *l == Type::FLOAT || *r == Type::FLOAT {
            Some(Type::FLOAT)
        } else {
            Some(Type::INT)
        }
    } else if *l == Type::STRING && *r == Type::STRING {
        Some(Type::STRING)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_opt() -> Type {
        Type::nullable(Type::INT)
    }

    #[test]
    fn int_to_float() {
        assert!(convertible(&Type::INT, &Type::FLOAT));
        assert!(!convertible(&Type::FLOAT, &Type::INT));
    }

    #[test]
    fn wrap_into_nullable() {
        assert!(convertible(&Type::INT, &int_opt()));
        assert!(convertible(&Type::Null, &int_opt()));
        // int -> float? through both rules.
        assert!(convertible(&Type::INT, &Type::nullable(Type::FLOAT)));
    }

    #[test]
    fn null_only_converts_to_nullables() {
        assert!(!convertible(&Type::Null, &Type::INT));
        assert!(!convertible(&Type::Null, &Type::STRING));
    }

    #[test]
    fn unwrap_nullable_source() {
        // T? flows into T (the flow analyzer warns about it).
        assert!(convertible(&int_opt(), &Type::INT));
        assert!(convertible(&int_opt(), &Type::FLOAT));
        assert!(convertible(&int_opt(), &Type::nullable(Type::FLOAT)));
        assert!(!convertible(&Type::nullable(Type::BOOL), &Type::INT));
    }

    #[test]
    fn not_reflexive() {
        assert!(!convertible(&Type::INT, &Type::INT));
        assert!(equal_or_convertible(&Type::INT, &Type::INT));
    }

    #[test]
    fn error_converts_to_nothing() {
        assert!(!convertible(&Type::Error, &Type::INT));
        assert!(!convertible(&Type::INT, &Type::Error));
        assert!(!equal_or_convertible(&Type::Error, &Type::Error));
    }

    #[test]
    fn casts() {
        assert!(valid_cast(&Type::FLOAT, &Type::INT)); // numeric downcast
        assert!(valid_cast(&Type::INT, &Type::INT)); // identity
        assert!(valid_cast(&int_opt(), &Type::INT)); // unwrap
        assert!(!valid_cast(&Type::BOOL, &Type::INT));
        assert!(!valid_cast(&Type::STRING, &Type::INT));
    }

    #[test]
    fn widening() {
        assert_eq!(widened(&Type::INT, &Type::FLOAT), Some(Type::FLOAT));
        assert_eq!(widened(&Type::INT, &Type::INT), Some(Type::INT));
        assert_eq!(widened(&int_opt(), &Type::INT), Some(Type::INT));
        assert_eq!(widened(&Type::STRING, &Type::STRING), Some(Type::STRING));
        assert_eq!(widened(&Type::STRING, &Type::INT), None);
        assert_eq!(widened(&Type::BOOL, &Type::BOOL), None);
    }
}

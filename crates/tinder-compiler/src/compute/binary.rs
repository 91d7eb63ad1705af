//! Unary and binary operator dispatch.
//!
//! "Widening" converts whichever operand needs it by inserting a cast,
//! using the implicit conversion relation; a nullable operand unwraps
//! through a cast that the flow pass later checks for null.

use tinder_core::{Loc, Type};
use tinder_parser::ast::{BinaryOp, Expr, UnaryOp};

use super::TypeCk;
use crate::convert::{convertible, equal_or_convertible, widened};
use crate::errors::ErrorKind;

impl TypeCk<'_> {
    pub(crate) fn visit_unary(&mut self, op: UnaryOp, value: &mut Expr, loc: Loc) -> Type {
        self.visit_expr(value);
        let ty = value.ty().clone();
        if ty.is_error() {
            return Type::Error;
        }
        if ty.is_meta() {
            let printed = self.type_name(&ty);
            self.log.error(loc, ErrorKind::MetaTypeExpr(printed));
            return Type::Error;
        }

        match op {
            UnaryOp::Negate => {
                let stripped = ty.strip_nullable().clone();
                if stripped.is_numeric() {
                    if ty != stripped {
                        self.insert_cast(value, stripped.clone());
                    }
                    stripped
                } else {
                    self.unary_not_found(op, &ty, loc)
                }
            }
            UnaryOp::Not => {
                if ty == Type::BOOL {
                    Type::BOOL
                } else if convertible(&ty, &Type::BOOL) {
                    self.insert_cast(value, Type::BOOL);
                    Type::BOOL
                } else {
                    self.unary_not_found(op, &ty, loc)
                }
            }
        }
    }

    fn unary_not_found(&mut self, op: UnaryOp, ty: &Type, loc: Loc) -> Type {
        let printed = self.type_name(ty);
        self.log
            .error(loc, ErrorKind::UnaryOpNotFound { op: op.to_string(), ty: printed });
        Type::Error
    }

    pub(crate) fn visit_binary(
        &mut self,
        op: BinaryOp,
        left: &mut Expr,
        right: &mut Expr,
        loc: Loc,
    ) -> Type {
        match op {
            BinaryOp::Assign => self.visit_assign(left, right),
            BinaryOp::NullCoalesce => self.visit_null_coalesce(op, left, right, loc),
            BinaryOp::And | BinaryOp::Or => self.visit_logical(op, left, right, loc),
            BinaryOp::Equal | BinaryOp::NotEqual => self.visit_equality(op, left, right, loc),
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
                self.visit_comparison(op, left, right, loc)
            }
            BinaryOp::Add => self.visit_arithmetic(op, left, right, loc, true),
            BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                self.visit_arithmetic(op, left, right, loc, false)
            }
            BinaryOp::ShiftLeft
            | BinaryOp::ShiftRight
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor => self.visit_integer_op(op, left, right, loc),
        }
    }

    fn visit_assign(&mut self, left: &mut Expr, right: &mut Expr) -> Type {
        self.visit_expr(left);
        let left_ty = left.ty().clone();
        if !left_ty.is_error() {
            self.ctx.target = Some(left_ty.clone());
        }
        self.visit_expr(right);
        if left_ty.is_error() || right.ty().is_error() {
            return Type::Error;
        }
        self.coerce(right, &left_ty);
        left_ty
    }

    fn visit_null_coalesce(
        &mut self,
        op: BinaryOp,
        left: &mut Expr,
        right: &mut Expr,
        loc: Loc,
    ) -> Type {
        self.visit_expr(left);
        let left_ty = left.ty().clone();
        match left_ty {
            Type::Nullable(inner) => {
                let inner = *inner;
                self.ctx.target = Some(inner.clone());
                self.visit_expr(right);
                self.coerce(right, &inner);
                inner
            }
            Type::Error => {
                self.visit_expr(right);
                Type::Error
            }
            _ => {
                self.visit_expr(right);
                self.op_not_found(op, left, right, loc)
            }
        }
    }

    fn visit_logical(&mut self, op: BinaryOp, left: &mut Expr, right: &mut Expr, loc: Loc) -> Type {
        self.visit_expr(left);
        self.visit_expr(right);
        let left_ty = left.ty().clone();
        let right_ty = right.ty().clone();
        if left_ty.is_error() || right_ty.is_error() {
            return Type::Error;
        }
        if self.check_meta(&left_ty, &right_ty, loc) {
            return Type::Error;
        }
        if !equal_or_convertible(&left_ty, &Type::BOOL)
            || !equal_or_convertible(&right_ty, &Type::BOOL)
        {
            return self.op_not_found(op, left, right, loc);
        }
        if left_ty != Type::BOOL {
            self.insert_cast(left, Type::BOOL);
        }
        if right_ty != Type::BOOL {
            self.insert_cast(right, Type::BOOL);
        }
        Type::BOOL
    }

    fn visit_equality(&mut self, op: BinaryOp, left: &mut Expr, right: &mut Expr, loc: Loc) -> Type {
        self.visit_expr(left);
        self.visit_expr(right);
        let left_ty = left.ty().clone();
        let right_ty = right.ty().clone();
        if left_ty.is_error() || right_ty.is_error() {
            return Type::Error;
        }
        if self.check_meta(&left_ty, &right_ty, loc) {
            return Type::Error;
        }

        if left_ty == right_ty {
            Type::BOOL
        } else if convertible(&right_ty, &left_ty) {
            self.insert_cast(right, left_ty);
            Type::BOOL
        } else if convertible(&left_ty, &right_ty) {
            self.insert_cast(left, right_ty);
            Type::BOOL
        } else {
            self.op_not_found(op, left, right, loc)
        }
    }

    fn visit_comparison(
        &mut self,
        op: BinaryOp,
        left: &mut Expr,
        right: &mut Expr,
        loc: Loc,
    ) -> Type {
        self.visit_expr(left);
        self.visit_expr(right);
        let left_ty = left.ty().clone();
        let right_ty = right.ty().clone();
        if left_ty.is_error() || right_ty.is_error() {
            return Type::Error;
        }
        if self.check_meta(&left_ty, &right_ty, loc) {
            return Type::Error;
        }
        match widened(&left_ty, &right_ty) {
            Some(common) => {
                self.coerce(left, &common);
                self.coerce(right, &common);
                Type::BOOL
            }
            None => self.op_not_found(op, left, right, loc),
        }
    }

    fn visit_arithmetic(
        &mut self,
        op: BinaryOp,
        left: &mut Expr,
        right: &mut Expr,
        loc: Loc,
        allow_strings: bool,
    ) -> Type {
        self.visit_expr(left);
        self.visit_expr(right);
        let left_ty = left.ty().clone();
        let right_ty = right.ty().clone();
        if left_ty.is_error() || right_ty.is_error() {
            return Type::Error;
        }
        if self.check_meta(&left_ty, &right_ty, loc) {
            return Type::Error;
        }
        match widened(&left_ty, &right_ty) {
            Some(common) if common.is_numeric() || allow_strings => {
                self.coerce(left, &common);
                self.coerce(right, &common);
                common
            }
            _ => self.op_not_found(op, left, right, loc),
        }
    }

    fn visit_integer_op(
        &mut self,
        op: BinaryOp,
        left: &mut Expr,
        right: &mut Expr,
        loc: Loc,
    ) -> Type {
        self.visit_expr(left);
        self.visit_expr(right);
        let left_ty = left.ty().clone();
        let right_ty = right.ty().clone();
        if left_ty.is_error() || right_ty.is_error() {
            return Type::Error;
        }
        if self.check_meta(&left_ty, &right_ty, loc) {
            return Type::Error;
        }
        if !equal_or_convertible(&left_ty, &Type::INT)
            || !equal_or_convertible(&right_ty, &Type::INT)
        {
            return self.op_not_found(op, left, right, loc);
        }
        if left_ty != Type::INT {
            self.insert_cast(left, Type::INT);
        }
        if right_ty != Type::INT {
            self.insert_cast(right, Type::INT);
        }
        Type::INT
    }

    /// Operators never apply to type descriptions.
    fn check_meta(&mut self, left: &Type, right: &Type, loc: Loc) -> bool {
        for ty in [left, right] {
            if ty.is_meta() {
                let printed = self.type_name(ty);
                self.log.error(loc, ErrorKind::MetaTypeExpr(printed));
                return true;
            }
        }
        false
    }

    fn op_not_found(&mut self, op: BinaryOp, left: &Expr, right: &Expr, loc: Loc) -> Type {
        let left = self.type_name(left.ty());
        let right = self.type_name(right.ty());
        self.log.error(
            loc,
            ErrorKind::BinaryOpNotFound { op: op.to_string(), left, right },
        );
        Type::Error
    }
}

//! Expression typing: dispatch plus the name, member, list, index, cast,
//! and nullable-type forms.

use tinder_core::{Loc, SymbolId, Type};
use tinder_parser::ast::{Expr, ExprKind};

use super::{Context, TypeCk};
use crate::convert::{convertible, valid_cast};
use crate::errors::ErrorKind;
use crate::scope::Lookup;
use crate::symbol::SymbolKind;

impl TypeCk<'_> {
    /// Type one expression. The pending context is consumed here; parents
    /// that want to pass one down set it immediately before the call.
    pub(crate) fn visit_expr(&mut self, e: &mut Expr) {
        let ctx = self.take_ctx();
        let loc = e.loc;
        let ty = match &mut e.kind {
            ExprKind::VarKw => {
                self.log.error(loc, ErrorKind::BadKeyword("var"));
                Type::Error
            }
            ExprKind::Null => Type::Null,
            ExprKind::This => self.this_type(loc),
            ExprKind::Bool(_) => Type::BOOL,
            ExprKind::Int(_) => Type::INT,
            ExprKind::Float(_) => Type::FLOAT,
            ExprKind::Str(_) => Type::STRING,
            ExprKind::TypeRef(inner) => Type::meta(inner.clone()),

            ExprKind::Ident { name, symbol } => {
                let name = name.clone();
                self.visit_ident(&name, symbol, loc, &ctx)
            }

            ExprKind::List(items) => self.visit_list(items, loc, ctx),

            ExprKind::Unary { op, value } => {
                let op = *op;
                self.visit_unary(op, value, loc)
            }

            ExprKind::Binary { op, left, right } => {
                let op = *op;
                self.visit_binary(op, left, right, loc)
            }

            ExprKind::Call { callee, args, is_ctor } => self.visit_call(callee, args, is_ctor, loc),

            ExprKind::Param { base, params } => self.visit_param(base, params, loc),

            ExprKind::Cast { value, target } => self.visit_cast(value, target),

            ExprKind::Member { obj, name, safe, symbol } => {
                let name = name.clone();
                let safe = *safe;
                self.visit_member(obj, &name, safe, symbol, loc, &ctx)
            }

            ExprKind::Index { obj, index } => self.visit_index(obj, index),

            ExprKind::Nullable { value } => self.visit_nullable(value, loc),
        };
        e.ty = Some(ty);
    }

    // =========================================
    // Names
    // =========================================

    fn visit_ident(
        &mut self,
        name: &str,
        symbol: &mut Option<SymbolId>,
        loc: Loc,
        ctx: &Context,
    ) -> Type {
        let scope = self.current_scope();
        let Some(found) = self.scopes.lookup(scope, name, Lookup::Normal, self.symbols) else {
            self.log.error(loc, ErrorKind::UndefinedSymbol(name.to_string()));
            return Type::Error;
        };

        self.check_use_before_def(name, found, loc);
        self.resolve_symbol(name, found, symbol, loc, ctx)
    }

    /// A local variable must not be used above its definition.
    fn check_use_before_def(&mut self, name: &str, symbol: SymbolId, loc: Loc) {
        let info = self.symbols.get(symbol);
        if info.kind != SymbolKind::Variable || !self.scopes.is_local(self.symbols, symbol) {
            return;
        }
        let def = self.symbols.get(symbol).def_loc;
        if (loc.line, loc.column) < (def.line, def.column) {
            self.log.error(loc, ErrorKind::UseBeforeDefinition(name.to_string()));
        }
    }

    /// Attach a symbol to a use site, resolving overload sets against the
    /// context's argument types.
    pub(crate) fn resolve_symbol(
        &mut self,
        name: &str,
        found: SymbolId,
        slot: &mut Option<SymbolId>,
        loc: Loc,
        ctx: &Context,
    ) -> Type {
        let ty = self.symbols.get(found).ty.clone();
        if let Type::Overloaded(ids) = &ty {
            return match &ctx.arg_types {
                Some(arg_types) => match self.resolve_overload(name, ids, arg_types, loc) {
                    Some(chosen) => {
                        *slot = Some(chosen);
                        self.symbols.get(chosen).ty.clone()
                    }
                    None => {
                        *slot = Some(found);
                        Type::Error
                    }
                },
                None => {
                    self.log.error(loc, ErrorKind::NoOverloadContext(name.to_string()));
                    *slot = Some(found);
                    // Keep the overload set visible so a call site can
                    // re-visit with argument context.
                    ty
                }
            };
        }
        *slot = Some(found);
        ty
    }

    // =========================================
    // List literals
    // =========================================

    fn visit_list(&mut self, items: &mut [Expr], loc: Loc, ctx: Context) -> Type {
        match ctx.target {
            Some(Type::List(Some(item))) => {
                let item = *item;
                for child in items.iter_mut() {
                    self.ctx.target = Some(item.clone());
                    self.visit_expr(child);
                    self.coerce(child, &item);
                }
                Type::List(Some(Box::new(item)))
            }
            Some(target) if target.is_error() => {
                for child in items.iter_mut() {
                    self.visit_expr(child);
                }
                Type::Error
            }
            _ => {
                for child in items.iter_mut() {
                    self.visit_expr(child);
                }
                self.log.error(loc, ErrorKind::NoListContext);
                Type::Error
            }
        }
    }

    // =========================================
    // Member access
    // =========================================

    fn visit_member(
        &mut self,
        obj: &mut Expr,
        name: &str,
        safe: bool,
        slot: &mut Option<SymbolId>,
        loc: Loc,
        ctx: &Context,
    ) -> Type {
        self.visit_expr(obj);
        let obj_ty = obj.ty().clone();
        if obj_ty.is_error() {
            return Type::Error;
        }

        // `?.` needs a nullable receiver.
        if safe && !obj_ty.is_nullable() {
            let printed = self.type_name(&obj_ty);
            self.log.error(loc, ErrorKind::BadSafeDereference(printed));
        }

        let (class, mode, widen) = match &obj_ty {
            Type::Meta(inner) => match inner.as_ref() {
                Type::Class(class) => (*class, Lookup::StaticMember, false),
                _ => return self.bad_member(name, &obj_ty, loc),
            },
            Type::Class(class) => (*class, Lookup::InstanceMember, false),
            Type::Nullable(inner) => match inner.as_ref() {
                Type::Class(class) => {
                    let class = *class;
                    if safe {
                        (class, Lookup::InstanceMember, true)
                    } else {
                        // Plain access on a nullable receiver unwraps it;
                        // the flow pass warns about the inserted cast.
                        self.insert_cast(obj, (**inner).clone());
                        (class, Lookup::InstanceMember, false)
                    }
                }
                _ => return self.bad_member(name, &obj_ty, loc),
            },
            _ => return self.bad_member(name, &obj_ty, loc),
        };

        let Some(class_scope) = self.symbols.get(class).class_scope else {
            return Type::Error;
        };
        let Some(found) = self.scopes.lookup(class_scope, name, mode, self.symbols) else {
            return self.bad_member(name, &obj_ty, loc);
        };

        let ty = self.resolve_symbol(name, found, slot, loc, ctx);
        if widen && !ty.is_error() && !matches!(ty, Type::Overloaded(_)) {
            // Safe dereference: the result is nullable again.
            Type::nullable(ty)
        } else {
            ty
        }
    }

    fn bad_member(&mut self, name: &str, obj_ty: &Type, loc: Loc) -> Type {
        let ty = self.type_name(obj_ty);
        self.log.error(loc, ErrorKind::BadMemberAccess { name: name.to_string(), ty });
        Type::Error
    }

    // =========================================
    // Indexing
    // =========================================

    fn visit_index(&mut self, obj: &mut Expr, index: &mut Expr) -> Type {
        self.visit_expr(obj);
        let mut obj_ty = obj.ty().clone();

        // A nullable list unwraps like a nullable member receiver does.
        if let Type::Nullable(inner) = &obj_ty {
            if matches!(inner.as_ref(), Type::List(_)) {
                let inner = (**inner).clone();
                self.insert_cast(obj, inner.clone());
                obj_ty = inner;
            }
        }

        let item = match &obj_ty {
            Type::Error => None,
            Type::List(Some(item)) => Some((**item).clone()),
            other => {
                let found = self.type_name(other);
                self.log.error(
                    obj.loc,
                    ErrorKind::TypeMismatch { expected: "list".to_string(), found },
                );
                None
            }
        };

        self.ctx.target = Some(Type::INT);
        self.visit_expr(index);
        let index_ty = index.ty().clone();
        if !index_ty.is_error() && index_ty != Type::INT {
            if convertible(&index_ty, &Type::INT) {
                self.insert_cast(index, Type::INT);
            } else {
                let found = self.type_name(&index_ty);
                self.log.error(
                    index.loc,
                    ErrorKind::TypeMismatch { expected: "int".to_string(), found },
                );
            }
        }

        item.unwrap_or(Type::Error)
    }

    // =========================================
    // Casts
    // =========================================

    pub(crate) fn visit_cast(&mut self, value: &mut Expr, target: &mut Expr) -> Type {
        self.visit_expr(target);
        let target_ty = match target.ty() {
            Type::Meta(inner) => {
                if inner.has_free_params() || inner.is_void() {
                    let printed = self.type_name(inner);
                    self.log.error(target.loc, ErrorKind::NotUseableType(printed));
                    Type::Error
                } else {
                    (**inner).clone()
                }
            }
            Type::Error => Type::Error,
            other => {
                let printed = self.type_name(&other.clone());
                self.log.error(target.loc, ErrorKind::NotUseableType(printed));
                Type::Error
            }
        };

        if !target_ty.is_error() {
            self.ctx.target = Some(target_ty.clone());
        }
        self.visit_expr(value);
        let value_ty = value.ty().clone();

        if target_ty.is_error() || value_ty.is_error() {
            return target_ty;
        }
        if !valid_cast(&value_ty, &target_ty) {
            let from = self.type_name(&value_ty);
            let to = self.type_name(&target_ty);
            self.log.error(value.loc, ErrorKind::InvalidCast { from, to });
        }
        target_ty
    }

    // =========================================
    // The nullable type suffix
    // =========================================

    fn visit_nullable(&mut self, value: &mut Expr, loc: Loc) -> Type {
        self.visit_expr(value);
        match value.ty().clone() {
            Type::Meta(inner) => {
                if inner.is_nullable() {
                    let printed = self.type_name(&inner);
                    self.log.error(loc, ErrorKind::BadNullableType(printed));
                    Type::meta(*inner)
                } else if inner.is_void() {
                    self.log.error(loc, ErrorKind::NotUseableType("void".to_string()));
                    Type::Error
                } else {
                    Type::meta(Type::nullable(*inner))
                }
            }
            Type::Error => Type::Error,
            other => {
                let printed = self.type_name(&other);
                self.log.error(loc, ErrorKind::NotUseableType(printed));
                Type::Error
            }
        }
    }
}

//! Call typing, overload resolution, and generic instantiation.

use tinder_core::{Loc, SymbolId, Type};
use tinder_parser::ast::{Expr, ExprKind};

use super::TypeCk;
use crate::convert::equal_or_convertible;
use crate::errors::ErrorKind;

impl TypeCk<'_> {
    /// Type a call.
    ///
    /// Overload resolution needs the argument types, but a normal call
    /// wants the function type first so each argument can be typed with
    /// its parameter as context. The callee is therefore visited once
    /// with diagnostics suspended to peek its type, then re-visited for
    /// real on whichever path applies.
    pub(crate) fn visit_call(
        &mut self,
        callee: &mut Expr,
        args: &mut Vec<Expr>,
        is_ctor: &mut bool,
        loc: Loc,
    ) -> Type {
        self.log.suspend();
        self.visit_expr(callee);
        self.log.resume();

        if matches!(callee.ty(), Type::Overloaded(_)) {
            return self.visit_overloaded_call(callee, args);
        }

        self.visit_expr(callee);
        let callee_ty = callee.ty().clone();
        match callee_ty {
            Type::Error => {
                self.visit_args_bare(args);
                Type::Error
            }

            // A constructor call: an instantiable class meta type with no
            // arguments.
            Type::Meta(inner) => {
                self.visit_args_bare(args);
                if matches!(*inner, Type::Class(_)) && !inner.has_free_params() && args.is_empty()
                {
                    *is_ctor = true;
                    *inner
                } else {
                    self.call_not_found(callee, args, loc)
                }
            }

            Type::Func { ret, args: params } => {
                self.check_call_args(callee, args, &params, loc);
                ret.map(|r| *r).unwrap_or(Type::Error)
            }

            // A safe method access produced a nullable function type; the
            // call unwraps it and the result is nullable again.
            Type::Nullable(inner) => match *inner {
                Type::Func { ret, args: params } if is_safe_member(callee) => {
                    self.check_call_args(callee, args, &params, loc);
                    match ret {
                        Some(ret) if !ret.is_void() => Type::nullable(*ret),
                        Some(ret) => *ret,
                        None => Type::Error,
                    }
                }
                _ => {
                    self.visit_args_bare(args);
                    self.call_not_found(callee, args, loc)
                }
            },

            _ => {
                self.visit_args_bare(args);
                self.call_not_found(callee, args, loc)
            }
        }
    }

    /// Overloaded callee: type the arguments first (no target context),
    /// then re-visit the callee with the argument types as context.
    fn visit_overloaded_call(&mut self, callee: &mut Expr, args: &mut Vec<Expr>) -> Type {
        self.visit_args_bare(args);
        let arg_types: Vec<Type> = args.iter().map(|a| a.ty().clone()).collect();
        if arg_types.iter().any(Type::is_error) {
            return Type::Error;
        }

        self.ctx.arg_types = Some(arg_types);
        self.visit_expr(callee);

        match callee.ty().clone() {
            Type::Func { ret, args: params } => {
                for (arg, param) in args.iter_mut().zip(&params) {
                    self.coerce(arg, param);
                }
                ret.map(|r| *r).unwrap_or(Type::Error)
            }
            Type::Nullable(inner) => match *inner {
                // Safe access to an overloaded method.
                Type::Func { ret, args: params } => {
                    for (arg, param) in args.iter_mut().zip(&params) {
                        self.coerce(arg, param);
                    }
                    match ret {
                        Some(ret) if !ret.is_void() => Type::nullable(*ret),
                        Some(ret) => *ret,
                        None => Type::Error,
                    }
                }
                _ => Type::Error,
            },
            // Resolution failed and was reported.
            _ => Type::Error,
        }
    }

    /// Type each argument with its parameter type as context and coerce.
    fn check_call_args(
        &mut self,
        callee: &Expr,
        args: &mut Vec<Expr>,
        params: &[Type],
        loc: Loc,
    ) {
        if args.len() != params.len() {
            self.visit_args_bare(args);
            self.call_not_found(callee, args, loc);
            return;
        }
        for (arg, param) in args.iter_mut().zip(params) {
            self.ctx.target = Some(param.clone());
            self.visit_expr(arg);
            self.coerce(arg, param);
        }
    }

    fn visit_args_bare(&mut self, args: &mut Vec<Expr>) {
        for arg in args.iter_mut() {
            self.visit_expr(arg);
        }
    }

    fn call_not_found(&mut self, callee: &Expr, args: &[Expr], loc: Loc) -> Type {
        if args.iter().any(|a| a.ty().is_error()) {
            return Type::Error;
        }
        let arg_types: Vec<Type> = args.iter().map(|a| a.ty().clone()).collect();
        self.log.error(
            loc,
            ErrorKind::CallNotFound {
                name: callee_name(callee),
                args: self.symbols.arg_list(&arg_types),
            },
        );
        Type::Error
    }

    /// Pick one overload for the given argument types.
    ///
    /// Exact matches (argument types equal element-wise) beat implicit
    /// matches (equal or implicitly convertible element-wise). An empty
    /// result is a call-not-found; more than one survivor is ambiguous.
    pub(crate) fn resolve_overload(
        &mut self,
        name: &str,
        candidates: &[SymbolId],
        arg_types: &[Type],
        loc: Loc,
    ) -> Option<SymbolId> {
        if arg_types.iter().any(Type::is_error) {
            return None;
        }

        let mut exact = Vec::new();
        let mut implicit = Vec::new();
        for &candidate in candidates {
            let Type::Func { args: params, .. } = &self.symbols.get(candidate).ty else {
                continue;
            };
            if params.len() != arg_types.len() {
                continue;
            }
            if params.iter().zip(arg_types).all(|(p, a)| p == a) {
                exact.push(candidate);
            } else if params.iter().zip(arg_types).all(|(p, a)| equal_or_convertible(a, p)) {
                implicit.push(candidate);
            }
        }

        let matched = if exact.is_empty() { &implicit } else { &exact };
        match matched.len() {
            1 => Some(matched[0]),
            0 => {
                let args = self.symbols.arg_list(arg_types);
                self.log
                    .error(loc, ErrorKind::CallNotFound { name: name.to_string(), args });
                None
            }
            _ => {
                let args = self.symbols.arg_list(arg_types);
                self.log.error(
                    loc,
                    ErrorKind::MultipleOverloadsFound { name: name.to_string(), args },
                );
                None
            }
        }
    }

    // =========================================
    // Generic instantiation
    // =========================================

    /// Type `base<params...>`: validate the parameter count against the
    /// base constructor and produce a fully instantiated meta type.
    pub(crate) fn visit_param(
        &mut self,
        base: &mut Expr,
        params: &mut Vec<Expr>,
        loc: Loc,
    ) -> Type {
        self.visit_expr(base);
        let base_ty = base.ty().clone();

        let mut param_types = Vec::with_capacity(params.len());
        for param in params.iter_mut() {
            self.visit_expr(param);
            param_types.push(self.type_param(param));
        }

        match base_ty {
            Type::Error => Type::Error,
            Type::Meta(inner) => match *inner {
                Type::List(None) => {
                    if param_types.len() != 1 {
                        self.log.error(
                            loc,
                            ErrorKind::BadTypeParamCount {
                                ty: "list".to_string(),
                                expected: 1,
                                found: param_types.len(),
                            },
                        );
                        return Type::Error;
                    }
                    let Some(item) = param_types.into_iter().next().unwrap() else {
                        return Type::Error;
                    };
                    if item.is_void() {
                        self.log.error(loc, ErrorKind::NotUseableType("void".to_string()));
                        return Type::Error;
                    }
                    Type::meta(Type::List(Some(Box::new(item))))
                }
                Type::Func { ret: None, .. } => {
                    // Arity is return type plus argument types, in that
                    // order, so at least one parameter is required.
                    if param_types.is_empty() {
                        self.log.error(
                            loc,
                            ErrorKind::BadTypeParamCount {
                                ty: "function".to_string(),
                                expected: 1,
                                found: 0,
                            },
                        );
                        return Type::Error;
                    }
                    let mut types = param_types.into_iter();
                    let Some(ret) = types.next().unwrap() else { return Type::Error };
                    let mut args = Vec::new();
                    for arg in types {
                        let Some(arg) = arg else { return Type::Error };
                        if arg.is_void() {
                            self.log
                                .error(loc, ErrorKind::NotUseableType("void".to_string()));
                            return Type::Error;
                        }
                        args.push(arg);
                    }
                    Type::meta(Type::Func { ret: Some(Box::new(ret)), args })
                }
                other => {
                    let printed = self.type_name(&other);
                    self.log.error(
                        loc,
                        ErrorKind::BadTypeParamCount {
                            ty: printed,
                            expected: 0,
                            found: param_types.len(),
                        },
                    );
                    Type::Error
                }
            },
            other => {
                let printed = self.type_name(&other);
                self.log.error(loc, ErrorKind::NotUseableType(printed));
                Type::Error
            }
        }
    }

    /// Read a type argument: it must be a meta type with no free
    /// parameters. `None` means an error was reported (or inherited).
    fn type_param(&mut self, param: &Expr) -> Option<Type> {
        match param.ty() {
            Type::Meta(inner) => {
                if inner.has_free_params() {
                    let printed = self.type_name(inner);
                    self.log.error(param.loc, ErrorKind::NotUseableType(printed));
                    None
                } else {
                    Some((**inner).clone())
                }
            }
            Type::Error => None,
            other => {
                let printed = self.type_name(&other.clone());
                self.log.error(param.loc, ErrorKind::NotUseableType(printed));
                None
            }
        }
    }
}

fn is_safe_member(callee: &Expr) -> bool {
    matches!(&callee.kind, ExprKind::Member { safe: true, .. })
}

fn callee_name(callee: &Expr) -> String {
    match &callee.strip_casts().kind {
        ExprKind::Ident { name, .. } => name.clone(),
        ExprKind::Member { name, .. } => name.clone(),
        ExprKind::TypeRef(_) | ExprKind::Param { .. } | ExprKind::Nullable { .. } => {
            "type".to_string()
        }
        _ => "expression".to_string(),
    }
}

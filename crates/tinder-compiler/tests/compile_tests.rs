//! End-to-end compiler scenarios: source text in, diagnostics out.

use tinder_compiler::{compile, CompileResult};

fn messages(result: &CompileResult) -> Vec<String> {
    result.log.iter().map(|d| d.to_string()).collect()
}

/// Compile and require a completely clean result.
fn compile_clean(source: &str) -> CompileResult {
    let result = compile("test.tn", source);
    assert!(
        result.log.is_empty(),
        "expected no diagnostics, got:\n{}",
        result.log
    );
    assert!(result.is_success());
    result
}

/// Compile and require exactly the given diagnostic substrings, in order.
fn compile_expecting(source: &str, expected: &[&str]) {
    let result = compile("test.tn", source);
    let messages = messages(&result);
    assert_eq!(
        messages.len(),
        expected.len(),
        "expected {} diagnostics, got:\n{}",
        expected.len(),
        result.log
    );
    for (message, want) in messages.iter().zip(expected) {
        assert!(
            message.contains(want),
            "expected {want:?} in {message:?}\nfull log:\n{}",
            result.log
        );
    }
}

// =========================================
// Nullability scenarios
// =========================================

#[test]
fn possibly_null_argument() {
    // Passing an int? where an int is wanted dereferences it.
    compile_expecting(
        "void use(int a) { }\nvoid f(int? x) { use(x) }",
        &["warning: dereference of possibly null value \"x\""],
    );
}

#[test]
fn narrowing_silences_the_warning() {
    compile_clean("void use(int a) { }\nvoid f(int? x) { if x != null { use(x) } }");
}

#[test]
fn definitely_null_dereference() {
    compile_expecting(
        "void use(int a) { }\nvoid f() { int? x = null\nuse(x) }",
        &["warning: dereference of definitely null value \"x\""],
    );
}

#[test]
fn narrowing_in_the_else_branch() {
    compile_clean(
        "void use(int a) { }\nvoid f(int? x) { if x == null { } else { use(x) } }",
    );
}

#[test]
fn assignment_updates_knowledge() {
    // x is proven non-null, then reassigned null.
    compile_expecting(
        "void use(int a) { }\nvoid f(int? x) { if x == null { return }\nx = null\nuse(x) }",
        &["warning: dereference of definitely null value \"x\""],
    );
}

#[test]
fn assignment_of_value_clears_null() {
    compile_clean("void use(int a) { }\nvoid f(int? x) { x = 3\nuse(x) }");
}

#[test]
fn alias_copies_current_knowledge() {
    // y takes x's nullability at the assignment.
    compile_expecting(
        "void use(int a) { }\nvoid f(int? x) { int? y = x\nuse(y) }",
        &["warning: dereference of possibly null value \"y\""],
    );
}

#[test]
fn early_return_narrows_the_rest() {
    compile_clean("void use(int a) { }\nvoid f(int? x) { if x == null { return }\nuse(x) }");
}

#[test]
fn and_short_circuit_narrows() {
    compile_clean("bool p(int a) { return true }\nvoid f(int? x) { if x != null and p(x) { } }");
}

#[test]
fn or_narrows_its_right_side() {
    // p(x) only runs when the null test failed, so x is non-null there.
    compile_clean("bool p(int a) { return true }\nvoid f(int? x) { if x == null or p(x) { } }");
}

#[test]
fn and_after_null_test_derefs_null() {
    // p(x) only runs when x == null held.
    compile_expecting(
        "bool p(int a) { return true }\nvoid f(int? x) { if x == null and p(x) { } }",
        &["warning: dereference of definitely null value \"x\""],
    );
}

#[test]
fn not_swaps_branches() {
    compile_clean("void use(int a) { }\nvoid f(int? x) { if not (x == null) { use(x) } }");
}

#[test]
fn while_loop_narrows_and_terminates() {
    compile_clean(
        "int? next() { return null }\nvoid use(int a) { }\nvoid f() { int? x = next()\nwhile x != null { use(x)\nx = next() } }",
    );
}

#[test]
fn safe_dereference_produces_no_warning() {
    compile_clean(
        "class Box { int value\nint get() { return this.value } }\nvoid f(Box? b) { int? v = b?.value }",
    );
}

#[test]
fn plain_access_on_nullable_receiver_warns() {
    compile_expecting(
        "class Box { int value }\nvoid f(Box? b) { int v = b.value }",
        &["warning: dereference of possibly null value \"b\""],
    );
}

#[test]
fn nullable_field_is_conservatively_possibly_null() {
    // Fields are not locals; the analyzer cannot track them.
    compile_expecting(
        "class Box { int? value }\nvoid use(int a) { }\nvoid f(Box b) { use(b.value) }",
        &["warning: dereference of possibly null value"],
    );
}

// =========================================
// Return-path and dead-code scenarios
// =========================================

#[test]
fn not_all_paths_return() {
    compile_expecting(
        "int f(int? x) { if x != null { return x } }",
        &["error: not all control paths return a value"],
    );
}

#[test]
fn both_branches_return() {
    compile_clean("int f(int? x) { if x != null { return x } else { return 0 } }");
}

#[test]
fn fallthrough_after_if_returns() {
    compile_clean("int f(int? x) { if x != null { return x }\nreturn 0 }");
}

#[test]
fn void_function_may_fall_off() {
    compile_clean("void f(bool b) { if b { return } }");
}

#[test]
fn dead_code_after_return() {
    compile_expecting("int f() { return 1\nreturn 2 }", &["warning: dead code"]);
}

#[test]
fn dead_code_reported_once_per_block() {
    compile_expecting(
        "int f() { return 1\nreturn 2\nreturn 3 }",
        &["warning: dead code"],
    );
}

#[test]
fn dead_code_inside_branch() {
    compile_expecting(
        "void f(bool b) { if b { return\nb = false } }",
        &["warning: dead code"],
    );
}

#[test]
fn while_false_like_checks_still_terminate() {
    // The loop body re-feeds the test; the memoized fixed point converges.
    compile_clean("void f(bool b) { while b { b = false } }");
}

// =========================================
// Overload scenarios
// =========================================

#[test]
fn exact_overload_beats_implicit() {
    compile_clean("void p(int a) { }\nvoid p(float a) { }\nvoid f() { p(1)\np(1.5) }");
}

#[test]
fn no_matching_overload() {
    compile_expecting(
        "void p(int a) { }\nvoid p(float a) { }\nvoid f() { p(true) }",
        &["error: cannot call \"p\" with arguments \"(bool)\""],
    );
}

#[test]
fn ambiguous_overload() {
    // int converts to both float and int?, and neither is exact.
    compile_expecting(
        "void p(float a) { }\nvoid p(int? a) { }\nvoid f() { p(1) }",
        &["error: multiple overloads of \"p\" match arguments \"(int)\""],
    );
}

#[test]
fn overload_without_context() {
    compile_expecting(
        "void p(int a) { }\nvoid p(float a) { }\nvoid f() { var g = p }",
        &["error: cannot resolve overloaded function \"p\" without context"],
    );
}

#[test]
fn arity_picks_the_overload() {
    compile_clean("int p() { return 0 }\nint p(int a) { return a }\nvoid f() { int x = p()\nint y = p(2) }");
}

// =========================================
// Typing scenarios
// =========================================

#[test]
fn list_literal_with_context() {
    compile_clean("void f() { list<int> xs = [1, 2, 3]\nint first = xs[0] }");
}

#[test]
fn list_literal_element_mismatch() {
    compile_expecting(
        "void f() { list<int> xs = [1, 1.5] }",
        &["error: expected type \"int\" but found type \"float\""],
    );
}

#[test]
fn list_literal_without_context() {
    compile_expecting(
        "void f() { var xs = [1, 2] }",
        &["error: cannot resolve type of list literal without context"],
    );
}

#[test]
fn list_items_widen_with_casts() {
    compile_clean("void f() { list<float> xs = [1, 1.5] }");
}

#[test]
fn numeric_widening() {
    compile_clean("void f() { float x = 1 + 2.5\nfloat y = 2 * 3\nint z = 7 / 2 }");
}

#[test]
fn string_concatenation() {
    compile_clean("void f() { string s = \"a\" + \"b\" }");
}

#[test]
fn string_minus_is_an_error() {
    compile_expecting(
        "void f() { var s = \"a\" - \"b\" }",
        &["error: no binary operator \"-\" for types \"string\" and \"string\""],
    );
}

#[test]
fn integer_only_operators() {
    compile_clean("void f() { int x = 1 << 2 | 3 & 4 ^ 5\nint y = 8 >> 1 }");
    compile_expecting(
        "void f() { var x = 1.5 << 2 }",
        &["error: no binary operator \"<<\" for types \"float\" and \"int\""],
    );
}

#[test]
fn null_coalesce_unwraps() {
    compile_clean("int f(int? x) { return x ?? 0 }");
}

#[test]
fn null_coalesce_needs_nullable() {
    compile_expecting(
        "int f(int x) { return x ?? 0 }",
        &["error: no binary operator \"??\" for types \"int\" and \"int\""],
    );
}

#[test]
fn comparison_against_null_requires_nullable() {
    compile_expecting(
        "void f(int x) { if x == null { } }",
        &["error: no binary operator \"==\" for types \"int\" and \"null\""],
    );
}

#[test]
fn var_inference() {
    compile_clean("void f() { var x = 1\nvar y = x + 2\nvar s = \"hi\" }");
}

#[test]
fn var_cannot_infer_null() {
    compile_expecting(
        "void f() { var x = null }",
        &["error: cannot use type \"null\" here"],
    );
}

#[test]
fn explicit_casts() {
    compile_clean("void f() { float x = 1 as float\nint y = 2.5 as int\nint? z = 3 as int? }");
    compile_expecting(
        "void f() { var x = true as int }",
        &["error: cannot cast from type \"bool\" to type \"int\""],
    );
}

#[test]
fn undefined_symbol() {
    compile_expecting("void f() { missing() }", &["error: \"missing\" is not defined"]);
}

#[test]
fn use_before_definition() {
    compile_expecting(
        "void f() { x = 1\nint x }",
        &["error: \"x\" is used before it is defined"],
    );
}

#[test]
fn condition_must_be_boolean() {
    compile_expecting(
        "void f() { if 1 { } }",
        &["error: expected type \"bool\" but found type \"int\""],
    );
}

#[test]
fn void_return_rules() {
    compile_expecting(
        "void f() { return 1 }",
        &["error: cannot return a value from a \"void\" function"],
    );
    compile_expecting("int f() { return }", &["error: function must return a value"]);
}

#[test]
fn return_inserts_conversion() {
    compile_clean("float f() { return 1 }");
}

#[test]
fn this_in_methods_only() {
    compile_expecting(
        "void f() { var t = this }",
        &["error: \"this\" is only allowed inside non-static member functions"],
    );
    compile_expecting(
        "class A { static int g() { return this.x }\nint x }",
        &["error: \"this\" is only allowed inside non-static member functions"],
    );
}

#[test]
fn class_members_and_constructor() {
    compile_clean(
        "class Point { int x\nint y\nint sum() { return this.x + this.y } }\nvoid f() { Point p = Point()\nint s = p.sum()\np.x = 3 }",
    );
}

#[test]
fn static_members_via_type_name() {
    compile_clean(
        "class Counter { static int bump(int n) { return n + 1 } }\nvoid f() { int x = Counter.bump(1) }",
    );
}

#[test]
fn instance_member_not_reachable_statically() {
    compile_expecting(
        "class A { int x }\nvoid f() { var v = A.x }",
        &["error: \"x\" is not a member of type \"A\""],
    );
}

#[test]
fn members_not_visible_bare_in_methods() {
    compile_expecting(
        "class A { int x\nint get() { return x } }",
        &["error: \"x\" is not defined"],
    );
}

#[test]
fn safe_dereference_needs_nullable() {
    compile_expecting(
        "class A { int x }\nvoid f(A a) { var v = a?.x }",
        &["error: operator \"?.\" cannot be used on non-nullable type \"A\""],
    );
}

#[test]
fn bad_member_access() {
    compile_expecting(
        "class A { int x }\nvoid f(A a) { var v = a.missing }",
        &["error: \"missing\" is not a member of type \"A\""],
    );
}

#[test]
fn generic_type_param_counts() {
    compile_expecting(
        "void f() { list<int, int> xs = [1] }",
        &["error: type \"list\" expects 1 type parameters but got 2"],
    );
    compile_expecting("int<int> x", &["error: type \"int\" expects 0 type parameters but got 1"]);
}

#[test]
fn function_typed_variables() {
    compile_clean(
        "int double(int a) { return a * 2 }\nvoid f() { function<int, int> g = double\nint x = g(3) }",
    );
}

#[test]
fn redefinition_of_variable() {
    compile_expecting("int x\nint x", &["error: \"x\" is already defined"]);
}

#[test]
fn nullable_never_nests() {
    compile_expecting("int? ? x", &["error: type \"int?\" is already nullable"]);
}

// =========================================
// Error suppression
// =========================================

#[test]
fn one_root_cause_one_diagnostic() {
    // The undefined name poisons everything downstream; nothing else is
    // reported.
    compile_expecting(
        "void f() { int x = missing + 1 }",
        &["error: \"missing\" is not defined"],
    );
}

#[test]
fn module_is_withheld_on_errors() {
    let result = compile("test.tn", "void f() { missing() }");
    assert!(!result.is_success());
    assert!(result.compilation.is_none());
    assert!(result.log.has_errors());
}

#[test]
fn warnings_do_not_withhold_the_module() {
    let result = compile("test.tn", "int f() { return 1\nreturn 2 }");
    assert!(result.is_success());
    assert_eq!(result.log.warning_count(), 1);
}

// =========================================
// Diagnostics format
// =========================================

#[test]
fn diagnostic_line_format() {
    let result = compile("demo.tn", "void f() { missing() }");
    let line = messages(&result).remove(0);
    assert!(
        line.starts_with("demo.tn:1:12: error: "),
        "unexpected format: {line}"
    );
}

// =========================================
// Tree contract properties
// =========================================

mod tree {
    use tinder_parser::ast::{Block, Expr, ExprKind, StmtKind};

    /// Collect every expression in a block, flagging the base operands of
    /// generic instantiations (the one place a free type may appear).
    pub fn exprs(block: &Block) -> Vec<(&Expr, bool)> {
        let mut out = Vec::new();
        collect_block(block, &mut out);
        out
    }

    fn collect_block<'a>(block: &'a Block, out: &mut Vec<(&'a Expr, bool)>) {
        for stmt in &block.stmts {
            match &stmt.kind {
                StmtKind::If { test, then_block, else_block } => {
                    collect(test, false, out);
                    collect_block(then_block, out);
                    if let Some(else_block) = else_block {
                        collect_block(else_block, out);
                    }
                }
                StmtKind::While { test, body } => {
                    collect(test, false, out);
                    collect_block(body, out);
                }
                StmtKind::Return(Some(value)) => collect(value, false, out),
                StmtKind::Return(None) => {}
                StmtKind::Expr(expr) => collect(expr, false, out),
                StmtKind::Var(def) => {
                    collect(&def.declared_ty, false, out);
                    if let Some(init) = &def.init {
                        collect(init, false, out);
                    }
                }
                StmtKind::Func(def) => {
                    collect(&def.return_ty, false, out);
                    for arg in &def.args {
                        collect(&arg.declared_ty, false, out);
                    }
                    if let Some(body) = &def.body {
                        collect_block(body, out);
                    }
                }
                StmtKind::Class(def) => collect_block(&def.body, out),
                StmtKind::External(body) => collect_block(body, out),
            }
        }
    }

    fn collect<'a>(e: &'a Expr, param_base: bool, out: &mut Vec<(&'a Expr, bool)>) {
        out.push((e, param_base));
        match &e.kind {
            ExprKind::List(items) => {
                for item in items {
                    collect(item, false, out);
                }
            }
            ExprKind::Unary { value, .. } | ExprKind::Nullable { value } => {
                collect(value, false, out)
            }
            ExprKind::Binary { left, right, .. } => {
                collect(left, false, out);
                collect(right, false, out);
            }
            ExprKind::Call { callee, args, .. } => {
                collect(callee, false, out);
                for arg in args {
                    collect(arg, false, out);
                }
            }
            ExprKind::Param { base, params } => {
                collect(base, true, out);
                for param in params {
                    collect(param, false, out);
                }
            }
            ExprKind::Cast { value, target } => {
                collect(value, false, out);
                collect(target, false, out);
            }
            ExprKind::Member { obj, .. } => collect(obj, false, out),
            ExprKind::Index { obj, index } => {
                collect(obj, false, out);
                collect(index, false, out);
            }
            _ => {}
        }
    }
}

#[test]
fn every_expression_is_typed_after_success() {
    let source = "class Box { int? value\nint get() { return this.value ?? 0 } }\n\
                  void p(int a) { }\nvoid p(float a) { }\n\
                  void f(Box? b) { list<int> xs = [1, 2]\nvar n = xs[0]\np(n)\nwhile n < 10 { n = n + 1 } }";
    let result = compile("test.tn", source);
    assert!(result.is_success(), "unexpected diagnostics:\n{}", result.log);
    let compilation = result.compilation.unwrap();

    for (expr, param_base) in tree::exprs(&compilation.module.block) {
        let ty = expr.ty.as_ref().unwrap_or_else(|| panic!("untyped expression {expr:?}"));
        assert!(
            !matches!(ty, tinder_core::Type::Overloaded(_)),
            "unresolved overload survived: {expr:?}"
        );
        if !param_base {
            assert!(!ty.has_free_params(), "free type survived: {expr:?}");
        }
    }
}

#[test]
fn implicit_conversions_are_materialized() {
    use tinder_parser::ast::ExprKind;

    // int-to-float on the return value must show up as a cast node.
    let result = compile("test.tn", "float f() { return 1 }");
    assert!(result.is_success());
    let compilation = result.compilation.unwrap();
    let casts = tree::exprs(&compilation.module.block)
        .into_iter()
        .filter(|(e, _)| matches!(e.kind, ExprKind::Cast { .. }))
        .count();
    assert_eq!(casts, 1, "expected exactly one inserted cast");
}

#[test]
fn default_initializers_are_materialized() {
    let result = compile("test.tn", "int counter\nclass A { A? next }");
    assert!(result.is_success(), "unexpected diagnostics:\n{}", result.log);
    let compilation = result.compilation.unwrap();

    match &compilation.module.block.stmts[0].kind {
        tinder_parser::ast::StmtKind::Var(def) => {
            assert!(def.init.is_some(), "module variable missing default initializer")
        }
        other => panic!("expected var, got {other:?}"),
    }
    match &compilation.module.block.stmts[1].kind {
        tinder_parser::ast::StmtKind::Class(class) => match &class.body.stmts[0].kind {
            tinder_parser::ast::StmtKind::Var(def) => {
                let init = def.init.as_ref().expect("field missing default initializer");
                assert!(matches!(init.kind, tinder_parser::ast::ExprKind::Cast { .. }));
            }
            other => panic!("expected var, got {other:?}"),
        },
        other => panic!("expected class, got {other:?}"),
    }
}

#[test]
fn identifiers_carry_symbols_after_success() {
    let source = "int add(int a, int b) { return a + b }\nvoid f() { int x = add(1, 2) }";
    let result = compile("test.tn", source);
    assert!(result.is_success());
    let compilation = result.compilation.unwrap();

    for (expr, _) in tree::exprs(&compilation.module.block) {
        if let tinder_parser::ast::ExprKind::Ident { name, symbol } = &expr.kind {
            assert!(symbol.is_some(), "unresolved identifier \"{name}\"");
        }
    }
}

#[test]
fn operators_reject_type_descriptions() {
    compile_expecting(
        "void f() { var x = int + 1 }",
        &["error: type \"int\" cannot be used as a value"],
    );
}

#[test]
fn unary_operator_not_found() {
    compile_expecting(
        "void f() { var x = -true }",
        &["error: no unary operator \"-\" for type \"bool\""],
    );
}

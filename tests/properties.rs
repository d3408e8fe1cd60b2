//! Properties the engines guarantee across calls.

mod common;

use std::sync::Arc;

use common::{Program, init_tracing};
use ember::ember_ast::{BinaryOp, ExprKind, TaggedValue, Type};
use ember::ember_core::Symbol;
use ember::ember_sema::{
    BuiltinOperators, ConstantEvaluator, DiscriminationValidator, MonoOutcome, Monomorphizer,
    SemaContext, ValidationOutcome,
};

#[test]
fn test_evaluation_is_idempotent() {
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();

    let six = program.ast.int_lit("6");
    let root = program.root;
    program
        .ast
        .declare_constant(root, Symbol::new("BASE"), six);
    let name = program.ast.name(Symbol::new("BASE"));
    let seven = program.ast.int_lit("7");
    let product = program.ast.binary(BinaryOp::Mul, name, seven);

    let evaluator = ConstantEvaluator::new(&db, &program.ast, &ctx.config);
    let first = evaluator.evaluate(product, root);
    let second = evaluator.evaluate(product, root);
    assert_eq!(first, Ok(TaggedValue::Int(42)));
    assert_eq!(first, second);
}

#[test]
fn test_resolution_ignores_unrelated_instantiations() {
    init_tracing();
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();

    let output = program
        .ast
        .alloc(ExprKind::PolymorphicType(Symbol::new("T")));
    let first = program.generic_function("first", vec![output]);
    let other = program.generic_function("other", vec![]);
    let target = program.argument(Type::i32(&db));

    let before = Monomorphizer::new(&db, &program.ast, &ctx)
        .resolve(first, &[target], program.root)
        .resolved()
        .unwrap();

    for ty in [Type::bool(&db), Type::f64(&db), Type::i64(&db)] {
        let arg = program.argument(ty);
        let outcome =
            Monomorphizer::new(&db, &program.ast, &ctx).resolve(other, &[arg], program.root);
        assert!(matches!(outcome, MonoOutcome::Resolved(_)));
    }

    let after = Monomorphizer::new(&db, &program.ast, &ctx)
        .resolve(first, &[target], program.root)
        .resolved()
        .unwrap();
    assert_eq!(before.set, after.set);
    assert_eq!(before.ty, after.ty);
    assert_eq!(before.instance.id, after.instance.id);
}

#[test]
fn test_equal_sets_share_one_instantiation() {
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();

    let generic = program.generic_function("generic", vec![]);
    let here = program.argument(Type::f64(&db));
    let there = program.argument(Type::f64(&db));

    let monomorphizer = Monomorphizer::new(&db, &program.ast, &ctx);
    let a = monomorphizer
        .resolve(generic, &[here], program.root)
        .resolved()
        .unwrap();
    let b = monomorphizer
        .resolve(generic, &[there], program.root)
        .resolved()
        .unwrap();
    assert!(Arc::ptr_eq(&a.instance, &b.instance));
    assert_eq!(ctx.monomorphizations.len(), 1);
}

/// Every subset of cases over an N-member enum, without a default: only
/// the ones naming each member exactly once validate.
#[test]
fn test_enum_exhaustiveness_is_exact() {
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();
    let operators = BuiltinOperators::new();

    let decl = program.enumeration("Quad", &["W", "X", "Y", "Z"]);
    let quad = program.type_of(decl);
    let names = ["W", "X", "Y", "Z"];

    let layouts: Vec<Vec<Vec<&'static str>>> = vec![
        vec![vec!["W", "X", "Y", "Z"]],
        vec![vec!["W"], vec!["X", "Y"], vec!["Z"]],
        vec![vec!["Z"], vec!["Y"], vec!["X"], vec!["W"]],
        vec![vec!["W", "X", "Y"]],
        vec![vec!["W"], vec!["X"], vec!["Y"], vec!["Z"], vec!["W"]],
        vec![vec!["W", "X"], vec!["X", "Y", "Z"]],
        vec![],
    ];
    for layout in layouts {
        let cases: Vec<&[&'static str]> = layout.iter().map(Vec::as_slice).collect();
        let id = program.discriminate(quad, &cases, false);
        let flat: Vec<&str> = layout.iter().flatten().copied().collect();
        let mut unique = flat.clone();
        unique.sort_unstable();
        unique.dedup();
        let expected = flat.len() == names.len() && unique.len() == names.len();

        let outcome = DiscriminationValidator::new(&db, &ctx.config, &operators)
            .validate(&mut program.ast, id);
        assert_eq!(
            matches!(outcome, ValidationOutcome::Valid(_)),
            expected,
            "cases {layout:?} gave {outcome:?}"
        );
    }
}

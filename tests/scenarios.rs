//! End-to-end behavior of the three engines through a driver session.

mod common;

use common::{Program, init_tracing};
use ember::ember_ast::{AggregateMember, AggregateSpec, BinaryOp, BlockKind, DiscriminationCase, ExprKind, TaggedValue, Type};
use ember::ember_core::{DiagnosticSink, ErrorKind, Span, Symbol};
use ember::ember_sema::{BuiltinOperators, MonomorphizationItem, SemaConfig, SemaContext};
use ember::{Session, Stage};

#[test]
fn test_arithmetic_follows_precedence() {
    init_tracing();
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::new(SemaConfig::default());
    let operators = BuiltinOperators::new();
    let sink = DiagnosticSink::new();
    let session = Session::new(&db, &ctx, &operators, &sink);

    let three = program.ast.int_lit("3");
    let four = program.ast.int_lit("4");
    let two = program.ast.int_lit("2");
    let product = program.ast.binary(BinaryOp::Mul, four, two);
    let sum = program.ast.binary(BinaryOp::Add, three, product);
    assert_eq!(
        session.evaluate(&program.ast, sum, program.root),
        Some(TaggedValue::Int(11))
    );
    assert!(sink.is_empty());
}

#[test]
fn test_boolean_and_equality() {
    init_tracing();
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();
    let operators = BuiltinOperators::new();
    let sink = DiagnosticSink::new();
    let session = Session::new(&db, &ctx, &operators, &sink);

    let yes = program.ast.bool_lit(true);
    let no = program.ast.bool_lit(false);
    let and = program.ast.binary(BinaryOp::And, yes, no);
    assert_eq!(
        session.evaluate(&program.ast, and, program.root),
        Some(TaggedValue::Bool(false))
    );

    let one = program.ast.int_lit("1");
    let other_one = program.ast.int_lit("1");
    let eq = program.ast.binary(BinaryOp::Eq, one, other_one);
    assert_eq!(
        session.evaluate(&program.ast, eq, program.root),
        Some(TaggedValue::Bool(true))
    );
}

#[test]
fn test_evaluation_failure_is_reported_once() {
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();
    let operators = BuiltinOperators::new();
    let sink = DiagnosticSink::new();
    let session = Session::new(&db, &ctx, &operators, &sink);

    let one = program.ast.int_lit("1");
    let zero = program.ast.alloc_at(
        ExprKind::Literal(ember::ember_ast::Literal::Int("0".to_string())),
        Span::new(4, 5),
    );
    let division = program.ast.binary(BinaryOp::Div, one, zero);
    assert_eq!(session.evaluate(&program.ast, division, program.root), None);

    let diagnostics = sink.take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, ErrorKind::WrongOperandKind);
}

#[test]
fn test_each_call_binds_its_own_type() {
    init_tracing();
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();
    let operators = BuiltinOperators::new();
    let sink = DiagnosticSink::new();
    let session = Session::new(&db, &ctx, &operators, &sink);

    let identity = program.generic_function("identity", vec![]);
    let int_arg = program.argument(Type::i64(&db));
    let real_arg = program.argument(Type::f64(&db));

    let ints = session
        .resolve(&program.ast, identity, &[int_arg], program.root)
        .done()
        .unwrap();
    let reals = session
        .resolve(&program.ast, identity, &[real_arg], program.root)
        .done()
        .unwrap();
    assert_eq!(
        ints.set.as_slice(),
        &[MonomorphizationItem::of_type(Symbol::new("T"), Type::i64(&db))]
    );
    assert_eq!(
        reals.set.as_slice(),
        &[MonomorphizationItem::of_type(Symbol::new("T"), Type::f64(&db))]
    );
    assert_eq!(ctx.monomorphizations.instances_of(identity).len(), 2);
}

#[test]
fn test_grouped_cases_cover_enum() {
    init_tracing();
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();
    let operators = BuiltinOperators::new();
    let sink = DiagnosticSink::new();
    let session = Session::new(&db, &ctx, &operators, &sink);

    let abc = program.enumeration("Abc", &["A", "B", "C"]);
    let abc = program.type_of(abc);
    let id = program.discriminate(abc, &[&["A"], &["B", "C"]], false);
    assert!(session.discriminate(&mut program.ast, id).done().is_some());
    assert!(sink.is_empty());
}

#[test]
fn test_missing_enum_members_are_listed() {
    init_tracing();
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();
    let operators = BuiltinOperators::new();
    let sink = DiagnosticSink::new();
    let session = Session::new(&db, &ctx, &operators, &sink);

    let abc = program.enumeration("Abc", &["A", "B", "C"]);
    let abc = program.type_of(abc);
    let id = program.discriminate(abc, &[&["A"]], false);
    assert_eq!(session.discriminate(&mut program.ast, id), Stage::Failed);

    let diagnostics = sink.take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, ErrorKind::IncompleteCoverage);
    insta::assert_snapshot!(
        diagnostics[0].to_string(),
        @"ERROR [0..1] incomplete coverage: discrimination of `Abc` does not handle `B`, `C`"
    );
}

#[test]
fn test_tagged_union_needs_default() {
    init_tracing();
    let db = salsa::DatabaseImpl::new();
    let mut program = Program::new(&db);
    let ctx = SemaContext::default();
    let operators = BuiltinOperators::new();
    let sink = DiagnosticSink::new();
    let session = Session::new(&db, &ctx, &operators, &sink);

    let member = |name: &'static str, ty| AggregateMember {
        name: Symbol::new(name),
        span: Span::default(),
        ty,
        implicit: false,
        constant: false,
    };
    let root = program.root;
    let shape = program.ast.declare_aggregate(
        &db,
        root,
        Symbol::new("Shape"),
        AggregateSpec {
            is_union: true,
            members: vec![
                member("Circle", Type::f64(&db)),
                member("Square", Type::f64(&db)),
            ],
            ..Default::default()
        },
    );
    program.ast.mark_validated(shape);
    let shape = program.type_of(shape);

    let without_default = program.discriminate(shape, &[&["Circle"], &["Square"]], false);
    assert_eq!(
        session.discriminate(&mut program.ast, without_default),
        Stage::Failed
    );
    assert_eq!(sink.take()[0].kind, ErrorKind::MissingDefault);

    let partial = program.discriminate(shape, &[&["Circle"]], false);
    assert_eq!(session.discriminate(&mut program.ast, partial), Stage::Failed);
    assert_eq!(sink.take()[0].kind, ErrorKind::MissingDefault);

    let subject = program.argument(shape);
    let callee = program.ast.name(Symbol::new("Circle"));
    let radius = program.ast.name(Symbol::new("radius"));
    let capture = program
        .ast
        .alloc(ExprKind::Call { callee, args: vec![radius] });
    let body = program.ast.add_block(root, BlockKind::Plain);
    let default = program.ast.add_block(root, BlockKind::Plain);
    let with_default = program.ast.add_discrimination(
        root,
        Span::default(),
        subject,
        vec![DiscriminationCase::new(capture, body)],
        Some(default),
    );
    let result = session
        .discriminate(&mut program.ast, with_default)
        .done()
        .unwrap();
    assert_eq!(result.captures.len(), 1);
    assert_eq!(
        program.ast.lookup_local(body, Symbol::new("radius")),
        Some(result.captures[0])
    );
}

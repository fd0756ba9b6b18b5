//! Host-backed classes: regex, companion members, and the Long/Char
//! constructor synthesis. Also exercises the recording tracer.

mod common;

use common::*;
use konsti::{
    EvalLimits, Evaluator, RecordingTracer, TraceEvent,
    ir::{ConstValue, IrExpr, IrType, PrimitiveKind, build::ModuleBuilder},
};

#[test]
fn regex_matches_requires_a_full_match() {
    let mut b = ModuleBuilder::new();
    let regex_class = b.builtins().regex;
    let ctor = b.constructor(regex_class);
    let matches = b.find_function(regex_class, "matches").expect("seeded member");

    let hit = b.call(
        matches,
        Some(b.construct(ctor, vec![string("[0-9]+")])),
        vec![string("12345")],
    );
    let miss = b.call(
        matches,
        Some(b.construct(ctor, vec![string("[0-9]+")])),
        vec![string("12a45")],
    );
    let module = b.build();
    assert!(expect_boolean(&Evaluator::new(&module).interpret(&hit)));
    assert!(!expect_boolean(&Evaluator::new(&module).interpret(&miss)));
}

#[test]
fn regex_replace_and_split_fold() {
    let mut b = ModuleBuilder::new();
    let regex_class = b.builtins().regex;
    let ctor = b.constructor(regex_class);
    let replace = b.find_function(regex_class, "replace").expect("seeded member");
    let split = b.find_function(regex_class, "split").expect("seeded member");
    let array_class = b.builtins().array;
    let size_fun = b.find_function(array_class, "size").expect("seeded member");

    let replaced = b.call(
        replace,
        Some(b.construct(ctor, vec![string("\\s+")])),
        vec![string("a  b   c"), string("_")],
    );
    let split_size = b.call(
        size_fun,
        Some(b.call(
            split,
            Some(b.construct(ctor, vec![string(",")])),
            vec![string("a,b,c")],
        )),
        vec![],
    );
    let module = b.build();
    assert_eq!(expect_string(&Evaluator::new(&module).interpret(&replaced)), "a_b_c");
    assert_eq!(expect_int(&Evaluator::new(&module).interpret(&split_size)), 3);
}

#[test]
fn find_yields_a_match_result_with_value_and_range() {
    let mut b = ModuleBuilder::new();
    let regex_class = b.builtins().regex;
    let match_class = b.builtins().match_result;
    let int_range = b.builtins().int_range;
    let ctor = b.constructor(regex_class);
    let find = b.find_function(regex_class, "find").expect("seeded member");
    let value_fun = b.find_function(match_class, "value").expect("seeded member");
    let range_fun = b.find_function(match_class, "range").expect("seeded member");
    let first_field = b.field_id(int_range, "first").expect("seeded field");
    let last_field = b.field_id(int_range, "last").expect("seeded field");

    let m = b.add_variable("m", IrType::class(match_class));
    let found = b.call(
        find,
        Some(b.construct(ctor, vec![string("[0-9]+")])),
        vec![string("ab 123 cd")],
    );
    let value_expr = block(vec![
        val(m, found.clone()),
        stmt(b.call(value_fun, Some(get(m)), vec![])),
    ]);
    let first_expr = block(vec![
        val(m, found.clone()),
        stmt(field(b.call(range_fun, Some(get(m)), vec![]), first_field)),
    ]);
    let last_expr = block(vec![
        val(m, found),
        stmt(field(b.call(range_fun, Some(get(m)), vec![]), last_field)),
    ]);
    let module = b.build();
    assert_eq!(expect_string(&Evaluator::new(&module).interpret(&value_expr)), "123");
    assert_eq!(expect_int(&Evaluator::new(&module).interpret(&first_expr)), 3);
    assert_eq!(expect_int(&Evaluator::new(&module).interpret(&last_expr)), 5);
}

#[test]
fn find_miss_folds_to_null() {
    let mut b = ModuleBuilder::new();
    let regex_class = b.builtins().regex;
    let ctor = b.constructor(regex_class);
    let find = b.find_function(regex_class, "find").expect("seeded member");
    let expr = b.call(
        find,
        Some(b.construct(ctor, vec![string("[0-9]+")])),
        vec![string("no digits")],
    );
    let module = b.build();
    match Evaluator::new(&module).interpret(&expr) {
        IrExpr::Const { value: ConstValue::Null, .. } => {}
        other => panic!("expected null constant, got {other:?}"),
    }
}

#[test]
fn malformed_pattern_projects_to_illegal_argument() {
    let mut b = ModuleBuilder::new();
    let regex_class = b.builtins().regex;
    let ctor = b.constructor(regex_class);
    let expr = b.construct(ctor, vec![string("(unclosed")]);
    let module = b.build();
    let message = expect_error(&Evaluator::new(&module).interpret(&expr));
    assert!(message.contains("IllegalArgumentException"), "{message}");
}

#[test]
fn companion_member_dispatches_through_the_singleton() {
    let mut b = ModuleBuilder::new();
    let regex_class = b.builtins().regex;
    let escape = b.find_function(regex_class, "escape").expect("seeded member");
    let call = b.call(
        escape,
        Some(IrExpr::GetCompanion { class: regex_class }),
        vec![string("1+1")],
    );
    let module = b.build();
    assert_eq!(expect_string(&Evaluator::new(&module).interpret(&call)), "1\\+1");
}

#[test]
fn long_constructor_synthesizes_from_halves() {
    let mut b = ModuleBuilder::new();
    let long_class = b.builtins().primitive_class(PrimitiveKind::Long).expect("seeded");
    let ctor = b.constructor(long_class);
    let expr = b.construct(ctor, vec![int(1), int(7)]);
    let module = b.build();
    match Evaluator::new(&module).interpret(&expr) {
        IrExpr::Const { value: ConstValue::Long(v), .. } => assert_eq!(v, (1i64 << 32) + 7),
        other => panic!("expected Long constant, got {other:?}"),
    }
}

#[test]
fn char_constructor_synthesizes_from_a_code() {
    let mut b = ModuleBuilder::new();
    let char_class = b.builtins().primitive_class(PrimitiveKind::Char).expect("seeded");
    let ctor = b.constructor(char_class);
    let expr = b.construct(ctor, vec![int(0x41)]);
    let module = b.build();
    match Evaluator::new(&module).interpret(&expr) {
        IrExpr::Const { value: ConstValue::Char('A'), .. } => {}
        other => panic!("expected Char constant, got {other:?}"),
    }
}

#[test]
fn recording_tracer_observes_calls_and_raises() {
    let mut b = ModuleBuilder::new();
    let file = b.file("Main.kt");
    let f = b.add_function(None, "boom", file, 1);
    let division = int_op(&mut b, "div", int(1), int(0));
    b.set_body(f, block(vec![stmt(ret(f, division))]));
    let call = call_with(f, None, vec![]);
    let module = b.build();

    let mut ev = Evaluator::with_tracer(&module, EvalLimits::default(), RecordingTracer::new());
    let result = ev.interpret(&call);
    expect_error(&result);

    let events = ev.tracer().events();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, TraceEvent::Call { name, .. } if name == "boom")),
        "{events:?}"
    );
    assert!(
        events.iter().any(|e| matches!(
            e,
            TraceEvent::Raise { class, .. } if class == "ArithmeticException"
        )),
        "{events:?}"
    );
    assert!(events.iter().any(|e| matches!(e, TraceEvent::Return { .. })), "{events:?}");
}

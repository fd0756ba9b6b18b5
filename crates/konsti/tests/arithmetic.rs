//! Arithmetic folding, constant round-trips, and recursion.

mod common;

use common::*;
use konsti::{
    Evaluator,
    ir::{ConstValue, FunId, IrExpr, IrType, Module, PrimitiveKind, build::ModuleBuilder},
};

/// Builds a module with the standard recursive Fibonacci over `Int`.
fn fib_module() -> (Module, FunId) {
    let mut b = ModuleBuilder::new();
    let file = b.file("Main.kt");
    let fib = b.add_function(None, "fib", file, 3);
    let n = b.param(fib, "n", IrType::Primitive(PrimitiveKind::Int));
    b.fun_mut(fib).return_ty = IrType::Primitive(PrimitiveKind::Int);

    let cond = int_op(&mut b, "lessOrEqual", get(n), int(1));
    let n1 = int_op(&mut b, "minus", get(n), int(1));
    let n2 = int_op(&mut b, "minus", get(n), int(2));
    let rec1 = b.call(fib, None, vec![n1]);
    let rec2 = b.call(fib, None, vec![n2]);
    let sum = int_op(&mut b, "plus", rec1, rec2);
    let body = ret(fib, if_else(cond, get(n), sum));
    b.set_body(fib, block(vec![stmt(body)]));

    (b.build(), fib)
}

#[test]
fn fib_10_folds_to_55() {
    let (module, fib) = fib_module();
    let call = call_with(fib, None, vec![Some(int(10))]);
    let result = Evaluator::new(&module).interpret(&call);
    assert_eq!(expect_int(&result), 55);
}

#[test]
fn evaluation_is_deterministic_across_fresh_evaluators() {
    let (module, fib) = fib_module();
    let call = call_with(fib, None, vec![Some(int(12))]);
    let first = Evaluator::new(&module).interpret(&call);
    let second = Evaluator::new(&module).interpret(&call);
    assert_eq!(expect_int(&first), expect_int(&second));
    assert_eq!(expect_int(&first), 144);
}

#[test]
fn constants_round_trip_bit_for_bit() {
    let module = ModuleBuilder::new().build();
    let mut ev = Evaluator::new(&module);

    let cases = [
        ConstValue::Boolean(true),
        ConstValue::Char('Ω'),
        ConstValue::Byte(-128),
        ConstValue::Short(-32_768),
        ConstValue::Int(i32::MIN),
        ConstValue::Long(i64::MAX),
        ConstValue::Long(-6_700_417_000_001),
        ConstValue::String("snow ❄".to_owned()),
        ConstValue::Null,
    ];
    for case in cases {
        let result = ev.interpret(&IrExpr::const_of(case.clone()));
        match result {
            IrExpr::Const { value, .. } => assert_eq!(value, case),
            other => panic!("expected constant for {case:?}, got {other:?}"),
        }
    }

    // Floats compare by bits so negative zero and precision survive.
    let double = ev.interpret(&IrExpr::const_of(ConstValue::Double(-0.0)));
    match double {
        IrExpr::Const { value: ConstValue::Double(v), .. } => {
            assert_eq!(v.to_bits(), (-0.0f64).to_bits());
        }
        other => panic!("expected Double constant, got {other:?}"),
    }
    let float = ev.interpret(&IrExpr::const_of(ConstValue::Float(0.1)));
    match float {
        IrExpr::Const { value: ConstValue::Float(v), .. } => {
            assert_eq!(v.to_bits(), 0.1f32.to_bits());
        }
        other => panic!("expected Float constant, got {other:?}"),
    }
}

#[test]
fn unsigned_constant_round_trips_through_its_wrapper() {
    let module = ModuleBuilder::new().build();
    let mut ev = Evaluator::new(&module);
    let result = ev.interpret(&IrExpr::const_of(ConstValue::UInt(-1)));
    match result {
        IrExpr::Const { value: ConstValue::UInt(-1), .. } => {}
        other => panic!("expected UInt constant, got {other:?}"),
    }
}

#[test]
fn unsigned_constant_prints_unsigned() {
    let module = ModuleBuilder::new().build();
    let mut ev = Evaluator::new(&module);
    let concat = IrExpr::StringConcat {
        args: vec![string("u="), IrExpr::const_of(ConstValue::UInt(-1))],
    };
    assert_eq!(expect_string(&ev.interpret(&concat)), "u=4294967295");
}

#[test]
fn long_arithmetic_keeps_width() {
    let mut b = ModuleBuilder::new();
    let expr = b.prim_op(
        PrimitiveKind::Long,
        "times",
        long(1 << 40),
        vec![(long(1 << 10), PrimitiveKind::Long)],
    );
    let module = b.build();
    let result = Evaluator::new(&module).interpret(&expr);
    match result {
        IrExpr::Const { value: ConstValue::Long(v), .. } => assert_eq!(v, 1i64 << 50),
        other => panic!("expected Long constant, got {other:?}"),
    }
}

#[test]
fn mixed_width_division_promotes_to_double() {
    let mut b = ModuleBuilder::new();
    let expr = b.prim_op(
        PrimitiveKind::Int,
        "div",
        int(7),
        vec![(IrExpr::const_of(ConstValue::Double(2.0)), PrimitiveKind::Double)],
    );
    let module = b.build();
    match Evaluator::new(&module).interpret(&expr) {
        IrExpr::Const { value: ConstValue::Double(v), .. } => assert_eq!(v, 3.5),
        other => panic!("expected Double constant, got {other:?}"),
    }
}

#[test]
fn string_concatenation_stringifies_primitives() {
    let module = ModuleBuilder::new().build();
    let concat = IrExpr::StringConcat {
        args: vec![
            string("v="),
            int(3),
            string(" d="),
            IrExpr::const_of(ConstValue::Double(1.0)),
            string(" b="),
            boolean(false),
            string(" n="),
            IrExpr::const_of(ConstValue::Null),
        ],
    };
    let result = Evaluator::new(&module).interpret(&concat);
    assert_eq!(expect_string(&result), "v=3 d=1.0 b=false n=null");
}

#[test]
fn string_methods_fold() {
    let mut b = ModuleBuilder::new();
    let sub = b.prim_op(
        PrimitiveKind::String,
        "substring",
        string("constant"),
        vec![(int(0), PrimitiveKind::Int), (int(5), PrimitiveKind::Int)],
    );
    let upper = b.prim_op(PrimitiveKind::String, "uppercase", sub, vec![]);
    let module = b.build();
    assert_eq!(expect_string(&Evaluator::new(&module).interpret(&upper)), "CONST");
}

#[test]
fn division_by_zero_surfaces_as_error_node() {
    let mut b = ModuleBuilder::new();
    let expr = int_op(&mut b, "div", int(1), int(0));
    let module = b.build();
    let message = expect_error(&Evaluator::new(&module).interpret(&expr));
    assert!(message.starts_with('\n'), "error must start with a newline: {message:?}");
    assert!(message.contains("ArithmeticException"), "{message}");
    assert!(message.contains("/ by zero"), "{message}");
}

//! User classes: data-class members, construction, inheritance, overrides
//! and super calls.

mod common;

use common::*;
use konsti::{
    Evaluator,
    ir::{
        ClassId, ClassInitializer, FunId, IrType, Modality, Module, PrimitiveKind,
        build::ModuleBuilder,
    },
};

/// Declares `data class Point(val x: Int, val y: Int)` with bodiless
/// `toString`/`equals`/`hashCode` members, as the frontend would.
fn declare_point(b: &mut ModuleBuilder) -> (ClassId, FunId) {
    let file = b.file("Point.kt");
    let point = b.add_class("Point", "test.Point");
    b.class_mut(point).is_data = true;
    let x_field = b.add_field(point, "x", IrType::Primitive(PrimitiveKind::Int));
    let y_field = b.add_field(point, "y", IrType::Primitive(PrimitiveKind::Int));

    let ctor = b.add_constructor(point, file, 1);
    let x_param = b.param(ctor, "x", IrType::Primitive(PrimitiveKind::Int));
    let y_param = b.param(ctor, "y", IrType::Primitive(PrimitiveKind::Int));
    b.class_mut(point).initializers = vec![
        ClassInitializer::Field { field: x_field, value: get(x_param) },
        ClassInitializer::Field { field: y_field, value: get(y_param) },
    ];
    let any_ctor = b.constructor(b.builtins().any);
    b.set_body(
        ctor,
        block(vec![
            stmt(delegating(any_ctor, vec![])),
            stmt(konsti::ir::IrExpr::InstanceInitializerCall { class: point }),
        ]),
    );

    for name in ["toString", "hashCode"] {
        let f = b.add_function(Some(point), name, file, 1);
        b.receiver(f, point);
    }
    let equals = b.add_function(Some(point), "equals", file, 1);
    b.receiver(equals, point);
    b.param(equals, "other", IrType::nullable(b.builtins().any));

    (point, ctor)
}

#[test]
fn data_class_to_string_lists_fields_in_order() {
    let mut b = ModuleBuilder::new();
    let (_, ctor) = declare_point(&mut b);
    let concat = konsti::ir::IrExpr::StringConcat {
        args: vec![string("x="), b.construct(ctor, vec![int(1), int(2)])],
    };
    let module = b.build();
    assert_eq!(
        expect_string(&Evaluator::new(&module).interpret(&concat)),
        "x=Point(x=1, y=2)"
    );
}

#[test]
fn data_class_equality_is_structural() {
    let mut b = ModuleBuilder::new();
    let (point, ctor) = declare_point(&mut b);
    let equals = b.find_function(point, "equals").expect("declared above");

    let same = b.call(
        equals,
        Some(b.construct(ctor, vec![int(1), int(2)])),
        vec![b.construct(ctor, vec![int(1), int(2)])],
    );
    let different = b.call(
        equals,
        Some(b.construct(ctor, vec![int(1), int(2)])),
        vec![b.construct(ctor, vec![int(9), int(2)])],
    );
    let module = b.build();
    assert!(expect_boolean(&Evaluator::new(&module).interpret(&same)));
    assert!(!expect_boolean(&Evaluator::new(&module).interpret(&different)));
}

#[test]
fn equal_instances_share_a_hash_code() {
    let mut b = ModuleBuilder::new();
    let (point, ctor) = declare_point(&mut b);
    let hash = b.find_function(point, "hashCode").expect("declared above");

    let h1 = b.call(hash, Some(b.construct(ctor, vec![int(3), int(4)])), vec![]);
    let h2 = b.call(hash, Some(b.construct(ctor, vec![int(3), int(4)])), vec![]);
    let module = b.build();
    let first = expect_int(&Evaluator::new(&module).interpret(&h1));
    let second = expect_int(&Evaluator::new(&module).interpret(&h2));
    assert_eq!(first, second);
}

/// An abstract base with a concrete template method, plus an override.
fn shapes_module() -> (Module, FunId, FunId) {
    let mut b = ModuleBuilder::new();
    let file = b.file("Shapes.kt");
    let any_ctor = b.constructor(b.builtins().any);

    let shape = b.add_class("Shape", "test.Shape");
    b.class_mut(shape).modality = Modality::Abstract;
    let shape_ctor = b.add_constructor(shape, file, 1);
    b.set_body(shape_ctor, block(vec![stmt(delegating(any_ctor, vec![]))]));

    let area = b.add_function(Some(shape), "area", file, 2);
    b.receiver(area, shape);
    b.fun_mut(area).modality = Modality::Abstract;
    b.fun_mut(area).return_ty = IrType::Primitive(PrimitiveKind::Int);

    // fun describe() = "area=" + area()  — dynamic dispatch from a base body
    let describe = b.add_function(Some(shape), "describe", file, 3);
    let describe_this = b.receiver(describe, shape);
    let area_call = b.call(area, Some(get(describe_this)), vec![]);
    b.set_body(
        describe,
        block(vec![stmt(ret(
            describe,
            konsti::ir::IrExpr::StringConcat { args: vec![string("area="), area_call] },
        ))]),
    );

    let square = b.add_class("Square", "test.Square");
    b.class_mut(square).super_class = Some(shape);
    let side = b.add_field(square, "side", IrType::Primitive(PrimitiveKind::Int));
    let square_ctor = b.add_constructor(square, file, 6);
    let side_param = b.param(square_ctor, "side", IrType::Primitive(PrimitiveKind::Int));
    b.class_mut(square).initializers =
        vec![ClassInitializer::Field { field: side, value: get(side_param) }];
    b.set_body(
        square_ctor,
        block(vec![
            stmt(delegating(shape_ctor, vec![])),
            stmt(konsti::ir::IrExpr::InstanceInitializerCall { class: square }),
        ]),
    );

    let square_area = b.add_function(Some(square), "area", file, 7);
    let square_this = b.receiver(square_area, square);
    b.fun_mut(square_area).overridden = vec![area];
    let body = b.prim_op(
        PrimitiveKind::Int,
        "times",
        field(get(square_this), side),
        vec![(field(get(square_this), side), PrimitiveKind::Int)],
    );
    b.set_body(square_area, block(vec![stmt(ret(square_area, body))]));

    (b.build(), square_ctor, describe)
}

#[test]
fn abstract_call_dispatches_on_the_runtime_class() {
    let (module, square_ctor, describe) = shapes_module();
    let receiver = konsti::ir::IrExpr::ConstructorCall(konsti::ir::IrCall {
        function: square_ctor,
        dispatch_receiver: None,
        extension_receiver: None,
        args: vec![Some(int(4))],
        super_qualifier: None,
        type_args: Vec::new(),
    });
    let call = konsti::ir::IrExpr::Call(konsti::ir::IrCall {
        function: describe,
        dispatch_receiver: Some(Box::new(receiver)),
        extension_receiver: None,
        args: vec![],
        super_qualifier: None,
        type_args: Vec::new(),
    });
    assert_eq!(expect_string(&Evaluator::new(&module).interpret(&call)), "area=16");
}

#[test]
fn super_call_reenters_the_base_body() {
    let mut b = ModuleBuilder::new();
    let file = b.file("Names.kt");
    let any_ctor = b.constructor(b.builtins().any);

    let base = b.add_class("Base", "test.Base");
    b.class_mut(base).modality = Modality::Open;
    let base_ctor = b.add_constructor(base, file, 1);
    b.set_body(base_ctor, block(vec![stmt(delegating(any_ctor, vec![]))]));
    let name = b.add_function(Some(base), "name", file, 2);
    b.receiver(name, base);
    b.fun_mut(name).modality = Modality::Open;
    b.set_body(name, block(vec![stmt(ret(name, string("base")))]));

    let derived = b.add_class("Derived", "test.Derived");
    b.class_mut(derived).super_class = Some(base);
    let derived_ctor = b.add_constructor(derived, file, 5);
    b.set_body(derived_ctor, block(vec![stmt(delegating(base_ctor, vec![]))]));
    let derived_name = b.add_function(Some(derived), "name", file, 6);
    b.receiver(derived_name, derived);
    b.fun_mut(derived_name).overridden = vec![name];
    b.set_body(derived_name, block(vec![stmt(ret(derived_name, string("derived")))]));

    // fun parent() = super.name()
    let parent = b.add_function(Some(derived), "parent", file, 7);
    let parent_this = b.receiver(parent, derived);
    let super_call = konsti::ir::IrExpr::Call(konsti::ir::IrCall {
        function: name,
        dispatch_receiver: Some(Box::new(get(parent_this))),
        extension_receiver: None,
        args: vec![],
        super_qualifier: Some(base),
        type_args: Vec::new(),
    });
    b.set_body(parent, block(vec![stmt(ret(parent, super_call))]));

    let virtual_call = b.call(name, Some(b.construct(derived_ctor, vec![])), vec![]);
    let super_path = b.call(parent, Some(b.construct(derived_ctor, vec![])), vec![]);
    let module = b.build();
    assert_eq!(expect_string(&Evaluator::new(&module).interpret(&virtual_call)), "derived");
    assert_eq!(expect_string(&Evaluator::new(&module).interpret(&super_path)), "base");
}

#[test]
fn fake_override_forwards_to_the_interface_default() {
    // interface Greeter { fun greet() = "hi" }
    // class G : Greeter   — G carries a compiler-synthesized fake override
    let mut b = ModuleBuilder::new();
    let file = b.file("Greeter.kt");
    let any_ctor = b.constructor(b.builtins().any);

    let greeter = b.add_class("Greeter", "test.Greeter");
    b.class_mut(greeter).kind = konsti::ir::ClassKind::Interface;
    b.class_mut(greeter).modality = Modality::Open;
    let greet = b.add_function(Some(greeter), "greet", file, 2);
    b.receiver(greet, greeter);
    b.fun_mut(greet).modality = Modality::Open;
    b.set_body(greet, block(vec![stmt(ret(greet, string("hi")))]));

    let g = b.add_class("G", "test.G");
    b.class_mut(g).interfaces = vec![greeter];
    let g_ctor = b.add_constructor(g, file, 5);
    b.set_body(g_ctor, block(vec![stmt(delegating(any_ctor, vec![]))]));
    let fake = b.add_function(Some(g), "greet", file, 5);
    b.receiver(fake, g);
    b.fun_mut(fake).overridden = vec![greet];
    b.fun_mut(fake).is_fake_override = true;

    let call = b.call(fake, Some(b.construct(g_ctor, vec![])), vec![]);
    let module = b.build();
    assert_eq!(expect_string(&Evaluator::new(&module).interpret(&call)), "hi");
}

#[test]
fn extension_function_binds_its_receiver() {
    // fun Int.twice(): Int = this * 2
    let mut b = ModuleBuilder::new();
    let file = b.file("Ext.kt");
    let twice = b.add_function(None, "twice", file, 1);
    let receiver = b.add_variable("<this>", IrType::Primitive(PrimitiveKind::Int));
    b.fun_mut(twice).extension_receiver = Some(receiver);
    b.fun_mut(twice).return_ty = IrType::Primitive(PrimitiveKind::Int);
    let body = b.prim_op(
        PrimitiveKind::Int,
        "times",
        get(receiver),
        vec![(int(2), PrimitiveKind::Int)],
    );
    b.set_body(twice, block(vec![stmt(ret(twice, body))]));

    let call = konsti::ir::IrExpr::Call(konsti::ir::IrCall {
        function: twice,
        dispatch_receiver: None,
        extension_receiver: Some(Box::new(int(21))),
        args: vec![],
        super_qualifier: None,
        type_args: Vec::new(),
    });
    let module = b.build();
    assert_eq!(expect_int(&Evaluator::new(&module).interpret(&call)), 42);
}

#[test]
fn secondary_constructor_copies_the_sibling_state() {
    // class Box(val v: Int) { constructor() : this(99) }
    let mut b = ModuleBuilder::new();
    let file = b.file("Box.kt");
    let any_ctor = b.constructor(b.builtins().any);

    let box_class = b.add_class("Box", "test.Box");
    let v_field = b.add_field(box_class, "v", IrType::Primitive(PrimitiveKind::Int));
    let primary = b.add_constructor(box_class, file, 1);
    let v_param = b.param(primary, "v", IrType::Primitive(PrimitiveKind::Int));
    b.class_mut(box_class).initializers =
        vec![ClassInitializer::Field { field: v_field, value: get(v_param) }];
    b.set_body(
        primary,
        block(vec![
            stmt(delegating(any_ctor, vec![])),
            stmt(konsti::ir::IrExpr::InstanceInitializerCall { class: box_class }),
        ]),
    );
    let secondary = b.add_constructor(box_class, file, 2);
    b.set_body(secondary, block(vec![stmt(delegating(primary, vec![Some(int(99))]))]));

    let read = field(b.construct(secondary, vec![]), v_field);
    let module = b.build();
    assert_eq!(expect_int(&Evaluator::new(&module).interpret(&read)), 99);
}

#[test]
fn anonymous_initializers_run_in_declaration_order() {
    // class Tally { var total = 1; init { total = total * 10 } }
    let mut b = ModuleBuilder::new();
    let file = b.file("Tally.kt");
    let any_ctor = b.constructor(b.builtins().any);

    let tally = b.add_class("Tally", "test.Tally");
    let total = b.add_field(tally, "total", IrType::Primitive(PrimitiveKind::Int));
    let ctor = b.add_constructor(tally, file, 1);
    let this = b.fun_mut(ctor).dispatch_receiver.expect("ctor receiver");
    let bump = konsti::ir::IrExpr::SetField {
        receiver: Box::new(get(this)),
        field: total,
        value: Box::new(b.prim_op(
            PrimitiveKind::Int,
            "times",
            field(get(this), total),
            vec![(int(10), PrimitiveKind::Int)],
        )),
    };
    b.class_mut(tally).initializers = vec![
        ClassInitializer::Field { field: total, value: int(1) },
        ClassInitializer::Anonymous { body: block(vec![stmt(bump)]) },
    ];
    b.set_body(
        ctor,
        block(vec![
            stmt(delegating(any_ctor, vec![])),
            stmt(konsti::ir::IrExpr::InstanceInitializerCall { class: tally }),
        ]),
    );

    let read = field(b.construct(ctor, vec![]), total);
    let module = b.build();
    assert_eq!(expect_int(&Evaluator::new(&module).interpret(&read)), 10);
}

//! Shared IR-assembly helpers for the integration tests.

use konsti::ir::{
    ConstValue, FunId, IrCall, IrExpr, IrStatement, PrimitiveKind, VarId, WhenBranch,
    build::ModuleBuilder,
};

pub fn int(v: i32) -> IrExpr {
    IrExpr::const_of(ConstValue::Int(v))
}

pub fn long(v: i64) -> IrExpr {
    IrExpr::const_of(ConstValue::Long(v))
}

pub fn boolean(v: bool) -> IrExpr {
    IrExpr::const_of(ConstValue::Boolean(v))
}

pub fn string(v: &str) -> IrExpr {
    IrExpr::const_of(ConstValue::String(v.to_owned()))
}

pub fn get(var: VarId) -> IrExpr {
    IrExpr::GetValue { var }
}

pub fn set(var: VarId, value: IrExpr) -> IrExpr {
    IrExpr::SetValue { var, value: Box::new(value) }
}

pub fn val(var: VarId, init: IrExpr) -> IrStatement {
    IrStatement::Val { var, init: Some(init) }
}

pub fn stmt(expr: IrExpr) -> IrStatement {
    IrStatement::Expr(expr)
}

pub fn block(statements: Vec<IrStatement>) -> IrExpr {
    IrExpr::Block { label: None, statements }
}

pub fn ret(target: FunId, value: IrExpr) -> IrExpr {
    IrExpr::Return { target, value: Box::new(value) }
}

pub fn if_else(condition: IrExpr, then: IrExpr, otherwise: IrExpr) -> IrExpr {
    IrExpr::When {
        branches: vec![
            WhenBranch { condition, result: then },
            WhenBranch { condition: boolean(true), result: otherwise },
        ],
    }
}

pub fn while_loop(condition: IrExpr, body: IrExpr) -> IrExpr {
    IrExpr::While { label: None, condition: Box::new(condition), body: Box::new(body) }
}

pub fn field(receiver: IrExpr, field: konsti::ir::FieldId) -> IrExpr {
    IrExpr::GetField { receiver: Box::new(receiver), field }
}

/// A delegating constructor call; `args` slots may be `None` for synthetic
/// or defaulted parameters.
pub fn delegating(ctor: FunId, args: Vec<Option<IrExpr>>) -> IrExpr {
    IrExpr::DelegatingCall(IrCall {
        function: ctor,
        dispatch_receiver: None,
        extension_receiver: None,
        args,
        super_qualifier: None,
        type_args: Vec::new(),
    })
}

/// A call with explicit `Option` argument slots (for default parameters).
pub fn call_with(function: FunId, receiver: Option<IrExpr>, args: Vec<Option<IrExpr>>) -> IrExpr {
    IrExpr::Call(IrCall {
        function,
        dispatch_receiver: receiver.map(Box::new),
        extension_receiver: None,
        args,
        super_qualifier: None,
        type_args: Vec::new(),
    })
}

/// Shorthand for an `Int` binary operator call.
pub fn int_op(b: &mut ModuleBuilder, name: &str, lhs: IrExpr, rhs: IrExpr) -> IrExpr {
    b.prim_op(PrimitiveKind::Int, name, lhs, vec![(rhs, PrimitiveKind::Int)])
}

// === Result extraction =================================================

pub fn expect_int(result: &IrExpr) -> i32 {
    match result {
        IrExpr::Const { value: ConstValue::Int(v), .. } => *v,
        other => panic!("expected Int constant, got {other:?}"),
    }
}

pub fn expect_boolean(result: &IrExpr) -> bool {
    match result {
        IrExpr::Const { value: ConstValue::Boolean(v), .. } => *v,
        other => panic!("expected Boolean constant, got {other:?}"),
    }
}

pub fn expect_string(result: &IrExpr) -> String {
    match result {
        IrExpr::Const { value: ConstValue::String(v), .. } => v.clone(),
        other => panic!("expected String constant, got {other:?}"),
    }
}

pub fn expect_error(result: &IrExpr) -> String {
    match result {
        IrExpr::Error { message } => message.clone(),
        other => panic!("expected error node, got {other:?}"),
    }
}

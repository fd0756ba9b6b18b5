//! Expression and statement nodes of the IR tree.

use serde::{Deserialize, Serialize};

use super::{ClassId, FieldId, FunId, IrType, PrimitiveKind, VarId};

/// A compile-time constant payload.
///
/// Unsigned values carry their signed two's-complement representation; the
/// evaluator synthesizes the unsigned wrapper object on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Null,
    Boolean(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    UByte(i8),
    UShort(i16),
    UInt(i32),
    ULong(i64),
}

impl ConstValue {
    /// The primitive kind of this constant; `None` for `Null`.
    #[must_use]
    pub fn kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Null => None,
            Self::Boolean(_) => Some(PrimitiveKind::Boolean),
            Self::Char(_) => Some(PrimitiveKind::Char),
            Self::Byte(_) => Some(PrimitiveKind::Byte),
            Self::Short(_) => Some(PrimitiveKind::Short),
            Self::Int(_) => Some(PrimitiveKind::Int),
            Self::Long(_) => Some(PrimitiveKind::Long),
            Self::Float(_) => Some(PrimitiveKind::Float),
            Self::Double(_) => Some(PrimitiveKind::Double),
            Self::String(_) => Some(PrimitiveKind::String),
            Self::UByte(_) => Some(PrimitiveKind::UByte),
            Self::UShort(_) => Some(PrimitiveKind::UShort),
            Self::UInt(_) => Some(PrimitiveKind::UInt),
            Self::ULong(_) => Some(PrimitiveKind::ULong),
        }
    }
}

/// The type-operator forms of [`IrExpr::TypeOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeOperator {
    /// `x as T` — raises a cast exception on failure.
    Cast,
    /// Compiler-inserted cast; same behavior without user-visible framing.
    ImplicitCast,
    /// `x as? T` — substitutes `null` on failure.
    SafeCast,
    /// `x is T`.
    InstanceOf,
    /// `x !is T`.
    NotInstanceOf,
    /// Discards the value, producing `Unit`.
    CoercionToUnit,
}

/// One branch of a `when` expression: the first branch whose condition holds
/// produces the result. `else` branches carry a constant `true` condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhenBranch {
    pub condition: IrExpr,
    pub result: IrExpr,
}

/// A catch clause. The catch parameter's declared type selects which thrown
/// kinds the clause handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrCatch {
    pub param: VarId,
    pub body: IrExpr,
}

/// One element of a vararg expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VarargElement {
    Regular(IrExpr),
    /// `*array` — flattened element-wise into the result array.
    Spread(IrExpr),
}

/// A resolved call: target function plus receivers and value arguments.
///
/// `args` is in value-parameter order; `None` slots take the parameter's
/// default expression, evaluated in a sub-frame that already contains the
/// previously-bound parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrCall {
    pub function: FunId,
    pub dispatch_receiver: Option<Box<IrExpr>>,
    pub extension_receiver: Option<Box<IrExpr>>,
    pub args: Vec<Option<IrExpr>>,
    /// Forces static dispatch into the named class (`super.f()`).
    pub super_qualifier: Option<ClassId>,
    /// Reified type arguments for intrinsics such as `enumValueOf`.
    pub type_args: Vec<IrType>,
}

/// A statement inside a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IrStatement {
    /// A local declaration; binds `var` in the current frame.
    Val { var: VarId, init: Option<IrExpr> },
    Expr(IrExpr),
}

/// An expression node.
///
/// The tree is a DAG at the declaration level (expressions reference
/// declarations by id) but each expression node has a single parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IrExpr {
    /// A literal; materializes directly into a primitive value, except for
    /// unsigned kinds which synthesize an unsigned-class constructor call.
    Const { value: ConstValue, ty: IrType },
    /// Evaluates each argument, stringifies it, and concatenates.
    StringConcat { args: Vec<IrExpr> },
    /// Reads a variable binding from the frame stack.
    GetValue { var: VarId },
    /// Mutates an existing binding in the frame where it was found.
    SetValue { var: VarId, value: Box<IrExpr> },
    GetField { receiver: Box<IrExpr>, field: FieldId },
    SetField { receiver: Box<IrExpr>, field: FieldId, value: Box<IrExpr> },
    /// A lexical block; evaluates statements in a sub-frame and yields the
    /// value of the last expression statement (or `Unit`).
    Block { label: Option<String>, statements: Vec<IrStatement> },
    /// `while` loop; the condition is re-evaluated each iteration.
    While { label: Option<String>, condition: Box<IrExpr>, body: Box<IrExpr> },
    /// Branch scan in source order; the first true condition wins.
    When { branches: Vec<WhenBranch> },
    Break { label: Option<String> },
    Continue { label: Option<String> },
    Call(IrCall),
    ConstructorCall(IrCall),
    /// The delegating call that must open a constructor body: to the super
    /// constructor, a sibling constructor, or the enum super-constructor.
    DelegatingCall(IrCall),
    /// Runs the receiver class's property initializers and `init` blocks in
    /// declaration order.
    InstanceInitializerCall { class: ClassId },
    Return { target: FunId, value: Box<IrExpr> },
    Throw { value: Box<IrExpr> },
    Try { block: Box<IrExpr>, catches: Vec<IrCatch>, finally: Option<Box<IrExpr>> },
    TypeOp { op: TypeOperator, operand: Box<IrExpr>, target: IrType },
    /// Materializes a host array of `element_ty`, flattening spreads.
    Vararg { element_ty: IrType, elements: Vec<VarargElement> },
    /// A reference to an enum entry; interned per evaluation.
    GetEnumValue { class: ClassId, entry: String },
    /// A lambda or function reference satisfying a functional interface.
    FunctionExpr { function: FunId, interface: ClassId },
    /// The companion-object singleton of an intrinsic class.
    GetCompanion { class: ClassId },
    /// An error node synthesized by the evaluator on failure; never a valid
    /// input node.
    Error { message: String },
}

impl IrExpr {
    /// Constant `Unit`-like empty block.
    #[must_use]
    pub fn unit_block() -> Self {
        Self::Block { label: None, statements: Vec::new() }
    }

    /// Shorthand for a typed constant node.
    #[must_use]
    pub fn const_of(value: ConstValue) -> Self {
        let ty = match value.kind() {
            Some(kind) => IrType::Primitive(kind),
            None => IrType::Nothing,
        };
        Self::Const { value, ty }
    }
}

//! The tree-walking evaluator.
//!
//! [`Evaluator::interpret`] resets the per-call state (frame stack, command
//! counter, enum interns), walks the expression, and converts the final
//! value back into an IR constant node — or an IR error node when an
//! exception surfaces or an internal limit trips.

pub(crate) mod flow;

mod calls;
mod ctor;
mod exceptions;

use ahash::AHashMap;

use crate::{
    builtins,
    exception::{BuiltinExc, ExceptionValue},
    intrinsics,
    intrinsics::array::{ArrayBuffer, array_value},
    ir::{
        ClassId, ConstValue, FieldId, FunId, IrExpr, IrStatement, IrType, Module, PrimitiveKind,
        TypeOperator, VarargElement, WhenBranch,
    },
    frame::FrameStack,
    limits::{CommandCounter, EvalLimits},
    tracer::{EvalTracer, NoopTracer},
    value::{Primitive, Value, Wrapped},
};

use self::flow::{EvalFault, Flow, InternalError, Interrupt};

/// One evaluation engine over a module fragment.
///
/// All mutable state (frames, counters, enum interns, stack trace) belongs
/// to one evaluator instance; concurrent evaluations need separate
/// instances. The tracer is a type parameter so the no-op default costs
/// nothing.
#[derive(Debug)]
pub struct Evaluator<'a, Tr: EvalTracer = NoopTracer> {
    module: &'a Module,
    limits: EvalLimits,
    tracer: Tr,
    stack: FrameStack,
    counter: CommandCounter,
    /// Enum entries constructed during this call, keyed by `(class, entry)`.
    enum_interns: AHashMap<(ClassId, String), Value>,
    /// `(name, ordinal)` for the enum entry whose initializer is running.
    pending_enum: Option<(String, i32)>,
    /// Functions whose bodies are currently executing, innermost last.
    call_functions: Vec<FunId>,
}

impl<'a> Evaluator<'a, NoopTracer> {
    /// Creates an evaluator with default limits and no tracing.
    #[must_use]
    pub fn new(module: &'a Module) -> Self {
        Self::with_tracer(module, EvalLimits::default(), NoopTracer)
    }

    /// Creates an evaluator with custom limits.
    #[must_use]
    pub fn with_limits(module: &'a Module, limits: EvalLimits) -> Self {
        Self::with_tracer(module, limits, NoopTracer)
    }
}

impl<'a, Tr: EvalTracer> Evaluator<'a, Tr> {
    /// Creates an evaluator with custom limits and a tracer.
    #[must_use]
    pub fn with_tracer(module: &'a Module, limits: EvalLimits, tracer: Tr) -> Self {
        Self {
            module,
            limits,
            tracer,
            stack: FrameStack::new(),
            counter: CommandCounter::default(),
            enum_interns: AHashMap::new(),
            pending_enum: None,
            call_functions: Vec::new(),
        }
    }

    /// The tracer, for reading back recorded events.
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    /// Number of evaluation steps spent by the last `interpret` call.
    #[must_use]
    pub fn commands_used(&self) -> usize {
        self.counter.count()
    }

    /// Evaluates one expression to an IR constant, or an IR error node.
    ///
    /// Per-call state is reset on entry, so an evaluator can be reused for
    /// independent expressions of the same module.
    pub fn interpret(&mut self, expr: &IrExpr) -> IrExpr {
        self.stack.reset();
        self.counter.reset();
        self.enum_interns.clear();
        self.pending_enum = None;
        self.call_functions.clear();

        self.stack.push_frame();
        let result = self.eval(expr);
        match result {
            Ok(value) => self.materialize(&value),
            Err(Interrupt::Exception(exc)) => IrExpr::Error {
                message: format!("\n{}", exc.render(self.module)),
            },
            Err(Interrupt::Fatal(err)) => IrExpr::Error {
                message: format!("\nkonsti interpreter error: {err}"),
            },
            Err(other) => IrExpr::Error {
                message: format!("\nkonsti interpreter error: control-flow signal escaped the expression: {other:?}"),
            },
        }
    }

    /// One evaluation step. The command counter is checked here, so every
    /// node visit costs one command.
    pub(crate) fn eval(&mut self, expr: &IrExpr) -> Flow {
        if !self.counter.step(self.limits.max_commands) {
            return Err(Interrupt::Fatal(InternalError::TimeOut { limit: self.limits.max_commands }));
        }
        match expr {
            IrExpr::Const { value, .. } => self.eval_const(value),
            IrExpr::StringConcat { args } => self.eval_string_concat(args),
            IrExpr::GetValue { var } => self.stack.load(*var).ok_or_else(|| {
                Interrupt::Fatal(InternalError::UnboundVariable {
                    name: self.module.variable(*var).name.clone(),
                })
            }),
            IrExpr::SetValue { var, value } => {
                let v = self.eval(value)?;
                if self.stack.store(*var, v) {
                    Ok(Value::unit())
                } else {
                    Err(Interrupt::Fatal(InternalError::UnboundVariable {
                        name: self.module.variable(*var).name.clone(),
                    }))
                }
            }
            IrExpr::GetField { receiver, field } => self.eval_get_field(receiver, *field),
            IrExpr::SetField { receiver, field, value } => self.eval_set_field(receiver, *field, value),
            IrExpr::Block { statements, .. } => {
                self.stack.push_sub_frame();
                let result = self.eval_statements(statements);
                self.stack.pop_frame();
                result
            }
            IrExpr::While { label, condition, body } => self.eval_while(label.as_ref(), condition, body),
            IrExpr::When { branches } => self.eval_when(branches),
            IrExpr::Break { label } => Err(Interrupt::Break { label: label.clone() }),
            IrExpr::Continue { label } => Err(Interrupt::Continue { label: label.clone() }),
            IrExpr::Call(call) => self.eval_call(call),
            IrExpr::ConstructorCall(call) => self.eval_constructor_call(call),
            IrExpr::DelegatingCall(call) => self.eval_delegating_call(call),
            IrExpr::InstanceInitializerCall { class } => self.eval_instance_initializer(*class),
            IrExpr::Return { target, value } => {
                let v = self.eval(value)?;
                Err(Interrupt::Return { target: *target, value: v })
            }
            IrExpr::Throw { value } => self.eval_throw(value),
            IrExpr::Try { block, catches, finally } => {
                self.eval_try(block, catches, finally.as_deref())
            }
            IrExpr::TypeOp { op, operand, target } => self.eval_type_op(*op, operand, target),
            IrExpr::Vararg { element_ty, elements } => self.eval_vararg(element_ty, elements),
            IrExpr::GetEnumValue { class, entry } => self.eval_enum_value(*class, entry),
            IrExpr::FunctionExpr { function, interface } => {
                Ok(Value::Lambda { function: *function, interface: *interface })
            }
            IrExpr::GetCompanion { class } => {
                intrinsics::companion(self.module, *class).map_err(|f| self.fault(f))
            }
            IrExpr::Error { message } => Err(Interrupt::Fatal(InternalError::UnsupportedNode(format!(
                "error node in input: {message}"
            )))),
        }
    }

    // === Leaf helpers ===================================================

    fn eval_const(&mut self, value: &ConstValue) -> Flow {
        let primitive = match value {
            ConstValue::Null => Primitive::Null,
            ConstValue::Boolean(v) => Primitive::Boolean(*v),
            ConstValue::Char(v) => Primitive::Char(*v),
            ConstValue::Byte(v) => Primitive::Byte(*v),
            ConstValue::Short(v) => Primitive::Short(*v),
            ConstValue::Int(v) => Primitive::Int(*v),
            ConstValue::Long(v) => Primitive::Long(*v),
            ConstValue::Float(v) => Primitive::Float(*v),
            ConstValue::Double(v) => Primitive::Double(*v),
            ConstValue::String(v) => return Ok(Value::string(v.as_str())),
            // Unsigned constants become constructor calls on the unsigned
            // class; the signed representation is the backing field.
            ConstValue::UByte(v) => return self.construct_unsigned(PrimitiveKind::UByte, Primitive::Byte(*v)),
            ConstValue::UShort(v) => {
                return self.construct_unsigned(PrimitiveKind::UShort, Primitive::Short(*v));
            }
            ConstValue::UInt(v) => return self.construct_unsigned(PrimitiveKind::UInt, Primitive::Int(*v)),
            ConstValue::ULong(v) => return self.construct_unsigned(PrimitiveKind::ULong, Primitive::Long(*v)),
        };
        Ok(Value::Primitive(primitive))
    }

    fn eval_string_concat(&mut self, args: &[IrExpr]) -> Flow {
        let mut out = String::new();
        for arg in args {
            let value = self.eval(arg)?;
            out.push_str(&self.stringify(&value)?);
        }
        Ok(Value::string(out))
    }

    fn eval_statements(&mut self, statements: &[IrStatement]) -> Flow {
        let mut last = Value::unit();
        for statement in statements {
            match statement {
                IrStatement::Val { var, init } => {
                    let value = match init {
                        Some(expr) => self.eval(expr)?,
                        None => Value::null(),
                    };
                    self.stack.declare(*var, value);
                    last = Value::unit();
                }
                IrStatement::Expr(expr) => last = self.eval(expr)?,
            }
        }
        Ok(last)
    }

    fn eval_get_field(&mut self, receiver: &IrExpr, field: FieldId) -> Flow {
        let value = self.eval(receiver)?;
        if value.is_null() {
            let exc = self.raise(BuiltinExc::NullPointerException, None);
            return Err(Interrupt::Exception(exc));
        }
        let module = self.module;
        if let Value::Exception(exc) = &value {
            return match module.field(field).name.as_str() {
                "message" => Ok(exc.message.as_ref().map_or_else(Value::null, |m| Value::string(m.as_str()))),
                "cause" => Ok(exc
                    .cause
                    .as_ref()
                    .map_or_else(Value::null, |c| Value::Exception((**c).clone()))),
                other => Err(Interrupt::Fatal(InternalError::UnsupportedNode(format!(
                    "field '{other}' on exception value"
                )))),
            };
        }
        // An uninitialized field reads as null, matching field slots that
        // the constructor has not written yet.
        Ok(value.get_field(field).unwrap_or_else(Value::null))
    }

    fn eval_set_field(&mut self, receiver: &IrExpr, field: FieldId, value: &IrExpr) -> Flow {
        let target = self.eval(receiver)?;
        if target.is_null() {
            let exc = self.raise(BuiltinExc::NullPointerException, None);
            return Err(Interrupt::Exception(exc));
        }
        let v = self.eval(value)?;
        if target.set_field(field, v, self.module) {
            Ok(Value::unit())
        } else {
            Err(Interrupt::Fatal(InternalError::UnsupportedNode(format!(
                "field write on {}",
                target.type_name(self.module)
            ))))
        }
    }

    // === Control flow ====================================================

    fn eval_while(&mut self, label: Option<&String>, condition: &IrExpr, body: &IrExpr) -> Flow {
        loop {
            let cond = self.eval(condition)?;
            if cond.as_bool() != Some(true) {
                return Ok(Value::unit());
            }
            match self.eval(body) {
                Ok(_) => {}
                Err(Interrupt::Break { label: l }) if Interrupt::label_matches(l.as_ref(), label) => {
                    return Ok(Value::unit());
                }
                Err(Interrupt::Continue { label: l }) if Interrupt::label_matches(l.as_ref(), label) => {}
                Err(other) => return Err(other),
            }
        }
    }

    /// Scans branches in source order; the winning branch's value travels
    /// out of the scan as a `BreakWhen` signal, absorbed here so it never
    /// escapes the `when` expression.
    fn eval_when(&mut self, branches: &[WhenBranch]) -> Flow {
        match self.scan_when_branches(branches) {
            Err(Interrupt::BreakWhen { value }) => Ok(value),
            other => other,
        }
    }

    fn scan_when_branches(&mut self, branches: &[WhenBranch]) -> Flow {
        for branch in branches {
            let cond = self.eval(&branch.condition)?;
            if cond.as_bool() == Some(true) {
                let value = self.eval(&branch.result)?;
                return Err(Interrupt::BreakWhen { value });
            }
        }
        Ok(Value::unit())
    }

    // === Type operators ==================================================

    fn eval_type_op(&mut self, op: TypeOperator, operand: &IrExpr, target: &IrType) -> Flow {
        let value = self.eval(operand)?;
        let module = self.module;
        match op {
            TypeOperator::CoercionToUnit => Ok(Value::unit()),
            TypeOperator::InstanceOf => {
                Ok(Value::Primitive(Primitive::Boolean(self.instance_of(&value, target))))
            }
            TypeOperator::NotInstanceOf => {
                Ok(Value::Primitive(Primitive::Boolean(!self.instance_of(&value, target))))
            }
            TypeOperator::SafeCast => {
                if self.instance_of(&value, target) {
                    Ok(value)
                } else {
                    Ok(Value::null())
                }
            }
            TypeOperator::Cast | TypeOperator::ImplicitCast => {
                if value.is_null() {
                    if target.is_nullable() {
                        return Ok(value);
                    }
                    let message = format!(
                        "null cannot be cast to non-null type {}",
                        module.type_name(target)
                    );
                    let exc = self.raise(BuiltinExc::NullPointerException, Some(message));
                    return Err(Interrupt::Exception(exc));
                }
                if self.instance_of(&value, target) {
                    Ok(value)
                } else {
                    let message = format!(
                        "{} cannot be cast to {}",
                        value.type_name(module),
                        module.type_name(target)
                    );
                    let exc = self.raise(BuiltinExc::ClassCastException, Some(message));
                    Err(Interrupt::Exception(exc))
                }
            }
        }
    }

    fn instance_of(&self, value: &Value, target: &IrType) -> bool {
        let module = self.module;
        match value {
            Value::Primitive(Primitive::Null) => target.is_nullable(),
            Value::Primitive(Primitive::Unit) => matches!(target, IrType::Unit),
            Value::Primitive(p) => match target {
                IrType::Primitive(kind) => p.kind() == Some(*kind),
                IrType::Class { class, .. } => {
                    *class == module.builtins.any
                        || p.kind().and_then(|k| module.builtins.primitive_class(k)) == Some(*class)
                }
                _ => false,
            },
            _ => match target {
                IrType::Class { class, .. } => value
                    .runtime_class(module)
                    .is_some_and(|rc| module.is_subclass(rc, *class)),
                _ => false,
            },
        }
    }

    // === Varargs =========================================================

    fn eval_vararg(&mut self, element_ty: &IrType, elements: &[VarargElement]) -> Flow {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                VarargElement::Regular(expr) => values.push(self.eval(expr)?),
                VarargElement::Spread(expr) => {
                    let spread = self.eval(expr)?;
                    match spread {
                        Value::Wrapped(Wrapped::Array(buf)) => values.extend(buf.borrow().to_values()),
                        other => values.push(other),
                    }
                }
            }
        }
        let kind = match element_ty {
            IrType::Primitive(kind) if *kind != PrimitiveKind::String => Some(*kind),
            _ => None,
        };
        let buffer = ArrayBuffer::from_values(kind, values).map_err(|f| self.fault(f))?;
        Ok(array_value(buffer))
    }

    // === Stringification and materialization ============================

    /// Converts a value to its string form, dispatching `toString` through
    /// the override resolver for user objects.
    pub(crate) fn stringify(&mut self, value: &Value) -> Result<String, Interrupt> {
        if let Value::Object(obj) = value {
            let class = obj.borrow().class;
            if let Some(to_string) = self.find_bodied_method(class, "toString") {
                let result = self.invoke(to_string, Some(value.clone()), None, Vec::new(), true)?;
                return match result {
                    Value::Primitive(Primitive::String(s)) => Ok(s.to_string()),
                    other => Ok(other.default_to_string(self.module)),
                };
            }
            let result = builtins::call_builtin(self.module, "toString", value, &[])
                .map_err(|f| self.fault(f))?;
            if let Value::Primitive(Primitive::String(s)) = result {
                return Ok(s.to_string());
            }
        }
        Ok(value.default_to_string(self.module))
    }

    /// Converts the final value into an IR constant node, or an error node
    /// when the value has no constant form.
    fn materialize(&self, value: &Value) -> IrExpr {
        let module = self.module;
        let constant = match value {
            Value::Primitive(p) => match p {
                Primitive::Null => Some(ConstValue::Null),
                Primitive::Boolean(v) => Some(ConstValue::Boolean(*v)),
                Primitive::Char(v) => Some(ConstValue::Char(*v)),
                Primitive::Byte(v) => Some(ConstValue::Byte(*v)),
                Primitive::Short(v) => Some(ConstValue::Short(*v)),
                Primitive::Int(v) => Some(ConstValue::Int(*v)),
                Primitive::Long(v) => Some(ConstValue::Long(*v)),
                Primitive::Float(v) => Some(ConstValue::Float(*v)),
                Primitive::Double(v) => Some(ConstValue::Double(*v)),
                Primitive::String(s) => Some(ConstValue::String(s.to_string())),
                Primitive::Unit => None,
            },
            // Unsigned wrappers round-trip back into unsigned constants.
            Value::Object(obj) => {
                let class = obj.borrow().class;
                let backing = module
                    .field_named(class, "data")
                    .and_then(|field| value.get_field(field));
                match backing {
                    Some(Value::Primitive(Primitive::Byte(v))) if class == module.builtins.ubyte => {
                        Some(ConstValue::UByte(v))
                    }
                    Some(Value::Primitive(Primitive::Short(v))) if class == module.builtins.ushort => {
                        Some(ConstValue::UShort(v))
                    }
                    Some(Value::Primitive(Primitive::Int(v))) if class == module.builtins.uint => {
                        Some(ConstValue::UInt(v))
                    }
                    Some(Value::Primitive(Primitive::Long(v))) if class == module.builtins.ulong => {
                        Some(ConstValue::ULong(v))
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        match constant {
            Some(value) => IrExpr::const_of(value),
            None => IrExpr::Error {
                message: format!(
                    "\nkonsti interpreter error: {}",
                    InternalError::NotAConstant { type_name: value.type_name(module) }
                ),
            },
        }
    }

    // === Fault lifting ===================================================

    /// Builds a source-language exception, freezing the stack trace at this
    /// raise site.
    pub(crate) fn raise(&mut self, kind: BuiltinExc, message: Option<String>) -> ExceptionValue {
        let class = kind.class_id(&self.module.builtins);
        let mut exc = ExceptionValue::new(class, message);
        exc.trace = self.stack.snapshot_trace();
        self.tracer.on_raise(kind.into(), exc.message.as_deref());
        exc
    }

    /// Lifts a builtin/intrinsic failure into a control-flow signal.
    pub(crate) fn fault(&mut self, fault: EvalFault) -> Interrupt {
        match fault {
            EvalFault::Exc { kind, message } => Interrupt::Exception(self.raise(kind, Some(message))),
            EvalFault::Internal(err) => Interrupt::Fatal(err),
        }
    }
}

//! Throw, try/catch/finally, and conversion of thrown objects into
//! exception values.

use crate::{
    exception::{BuiltinExc, ExceptionValue},
    interp::{
        Evaluator,
        flow::{Flow, InternalError, Interrupt},
    },
    ir::{IrCatch, IrExpr, IrType},
    tracer::EvalTracer,
    value::{Primitive, Value},
};

impl<'a, Tr: EvalTracer> Evaluator<'a, Tr> {
    /// Evaluates a `throw`. Thrown user objects are converted into
    /// exception values, taking the message from the `message` field; a
    /// rethrown exception value keeps its originally frozen trace.
    pub(crate) fn eval_throw(&mut self, value_expr: &IrExpr) -> Flow {
        let value = self.eval(value_expr)?;
        let module = self.module;
        let exc = match value {
            Value::Exception(exc) => exc,
            Value::Object(_) => {
                let mut exc = self.throwable_to_exception(&value)?;
                exc.trace = self.stack.snapshot_trace();
                self.tracer.on_raise(&module.class(exc.kind).name, exc.message.as_deref());
                exc
            }
            Value::Primitive(Primitive::Null) => self.raise(BuiltinExc::NullPointerException, None),
            other => {
                return Err(Interrupt::Fatal(InternalError::UnsupportedNode(format!(
                    "throw of {}",
                    other.type_name(module)
                ))));
            }
        };
        Err(Interrupt::Exception(exc))
    }

    /// Converts a throwable instance into an exception value, taking the
    /// message from the `message` field and converting the `cause` field's
    /// chain recursively.
    fn throwable_to_exception(&mut self, value: &Value) -> Result<ExceptionValue, Interrupt> {
        let module = self.module;
        let class = match value {
            Value::Object(obj) => obj.borrow().class,
            Value::Exception(exc) => return Ok(exc.clone()),
            other => {
                return Err(Interrupt::Fatal(InternalError::UnsupportedNode(format!(
                    "throw of {}",
                    other.type_name(module)
                ))));
            }
        };
        if !module.is_subclass(class, module.builtins.throwable) {
            return Err(Interrupt::Fatal(InternalError::UnsupportedNode(format!(
                "throw of non-throwable {}",
                module.class(class).fq_name
            ))));
        }
        let message = module
            .field_named(class, "message")
            .and_then(|field| value.get_field(field))
            .and_then(|v| match v {
                Value::Primitive(Primitive::String(s)) => Some(s.to_string()),
                _ => None,
            });
        let mut exc = ExceptionValue::new(class, message);
        let cause_value = module
            .field_named(class, "cause")
            .and_then(|field| value.get_field(field))
            .filter(|v| !v.is_null());
        if let Some(cause_value) = cause_value {
            exc = exc.with_cause(self.throwable_to_exception(&cause_value)?);
        }
        Ok(exc)
    }

    /// Evaluates try/catch/finally.
    ///
    /// The finally block always runs; its result supersedes the pending
    /// try/catch result unless it completes normally, in which case the
    /// pending result is preserved. An exception raised inside finally
    /// therefore supersedes any pending exception.
    pub(crate) fn eval_try(
        &mut self,
        block: &IrExpr,
        catches: &[IrCatch],
        finally: Option<&IrExpr>,
    ) -> Flow {
        let result = match self.eval(block) {
            Err(Interrupt::Exception(exc)) => self.run_catches(exc, catches),
            other => other,
        };
        match finally {
            None => result,
            Some(finally_block) => match self.eval(finally_block) {
                Ok(_) => result,
                superseding => superseding,
            },
        }
    }

    /// Scans catch clauses in source order; the first whose declared class
    /// is a supertype of the thrown kind binds the exception value to its
    /// parameter in a fresh sub-frame and runs its body.
    fn run_catches(&mut self, exc: ExceptionValue, catches: &[IrCatch]) -> Flow {
        let module = self.module;
        for catch in catches {
            let handler = match &module.variable(catch.param).ty {
                IrType::Class { class, .. } => *class,
                other => {
                    return Err(Interrupt::Fatal(InternalError::UnsupportedNode(format!(
                        "catch parameter of type {}",
                        module.type_name(other)
                    ))));
                }
            };
            if exc.matches(handler, module) {
                self.stack.push_sub_frame();
                self.stack.declare(catch.param, Value::Exception(exc));
                let result = self.eval(&catch.body);
                self.stack.pop_frame();
                return result;
            }
        }
        Err(Interrupt::Exception(exc))
    }
}

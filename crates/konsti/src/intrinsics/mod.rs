//! The host bridge for intrinsic-marked classes.
//!
//! Classes carrying the intrinsic marker delegate their construction and
//! methods to host code in this module: regex compilation and matching,
//! `Long`/`Char` synthesis from their constructor arguments, array buffers,
//! and companion singletons. The dispatch here must be total for marked
//! classes — a miss is an interpreter error, never a source-level one.

pub mod array;
pub mod regex_mod;

use crate::{
    interp::flow::{EvalFault, InternalError},
    ir::{ClassId, Module, PrimitiveKind},
    value::{Primitive, Value, Wrapped},
};

/// Host construction for intrinsic classes whose instances the host
/// represents directly: `Long` from its 32-bit halves, `Char` from an
/// integer code, `Regex` from a pattern.
///
/// Arrays are not handled here — their optional initializer lambda needs the
/// evaluator, so the constructor path allocates them itself.
pub(crate) fn construct(module: &Module, class: ClassId, args: &[Value]) -> Result<Value, EvalFault> {
    let builtins = &module.builtins;
    if Some(class) == builtins.primitive_class(PrimitiveKind::Long) {
        if let [Value::Primitive(Primitive::Int(high)), Value::Primitive(Primitive::Int(low))] = args {
            let value = (i64::from(*high) << 32) + i64::from(*low);
            return Ok(Value::Primitive(Primitive::Long(value)));
        }
    } else if Some(class) == builtins.primitive_class(PrimitiveKind::Char) {
        if let [Value::Primitive(Primitive::Int(code))] = args
            && let Some(c) = char::from_u32(*code as u32)
        {
            return Ok(Value::Primitive(Primitive::Char(c)));
        }
    } else if class == builtins.regex {
        if let [Value::Primitive(Primitive::String(pattern))] = args {
            return regex_mod::construct(pattern);
        }
    }
    Err(missing(module, class, "<init>"))
}

/// Instance-method dispatch for host-wrapped receivers.
pub(crate) fn call_method(
    module: &Module,
    receiver: &Wrapped,
    name: &str,
    args: &[Value],
) -> Result<Value, EvalFault> {
    match receiver {
        Wrapped::Regex(re) => {
            regex_mod::call_method(re, name, args).unwrap_or_else(|| Err(missing(module, module.builtins.regex, name)))
        }
        Wrapped::Match(m) => regex_mod::call_match(module, m, name, args)
            .unwrap_or_else(|| Err(missing(module, module.builtins.match_result, name))),
        Wrapped::Array(buf) => {
            let class = buf.borrow().class(module);
            match (name, args) {
                ("get", [index]) => {
                    let i = array_index(index, module, class, name)?;
                    buf.borrow().get(i)
                }
                ("set", [index, value]) => {
                    let i = array_index(index, module, class, name)?;
                    buf.borrow_mut().set(i, value.clone())?;
                    Ok(Value::unit())
                }
                ("size", []) => Ok(Value::Primitive(Primitive::Int(buf.borrow().len() as i32))),
                ("toString", []) => Ok(Value::string(receiver.display(module))),
                _ => Err(missing(module, class, name)),
            }
        }
        Wrapped::Companion(class) if *class == module.builtins.regex => {
            regex_mod::call_companion(name, args).unwrap_or_else(|| Err(missing(module, *class, name)))
        }
        Wrapped::Companion(class) => Err(missing(module, *class, name)),
    }
}

/// The companion-object singleton of an intrinsic class.
pub(crate) fn companion(module: &Module, class: ClassId) -> Result<Value, EvalFault> {
    if module.class(class).intrinsic {
        Ok(Value::Wrapped(Wrapped::Companion(class)))
    } else {
        Err(missing(module, class, "Companion"))
    }
}

fn array_index(index: &Value, module: &Module, class: ClassId, name: &str) -> Result<usize, EvalFault> {
    let i = index.as_int().ok_or_else(|| missing(module, class, name))?;
    usize::try_from(i).map_err(|_| {
        EvalFault::exc(
            crate::exception::BuiltinExc::IndexOutOfBoundsException,
            format!("index {i} out of bounds"),
        )
    })
}

fn missing(module: &Module, class: ClassId, member: &str) -> EvalFault {
    InternalError::MissingIntrinsic {
        class: module.class(class).fq_name.clone(),
        member: member.to_owned(),
    }
    .into()
}

//! Built-in operations on primitive receivers and default members of user
//! objects.
//!
//! Operations are selected by a compile-time function key: the method name
//! plus the runtime kinds of the receiver and arguments. Three arities are
//! supported (receiver only, receiver + 1, receiver + 2); anything else is
//! an interpreter error. `rangeTo` is special-cased by the call dispatcher,
//! which synthesizes a constructor call on the range's IR class instead of
//! consulting these tables.

mod numbers;
mod strings;

use crate::{
    interp::flow::{EvalFault, InternalError},
    ir::{ClassId, ClassKind, Module},
    value::{Primitive, Value},
};

/// Dispatches a built-in by `(name, [kind])` key.
///
/// `receiver` is the dispatch or extension receiver; `args` are the value
/// arguments. Misses report an internal error naming the key — the walker
/// only routes bodiless functions here, so a miss means a gap in the
/// tables, not in the evaluated program.
pub(crate) fn call_builtin(
    module: &Module,
    name: &str,
    receiver: &Value,
    args: &[Value],
) -> Result<Value, EvalFault> {
    if args.len() > 2 {
        return Err(miss(module, name, receiver, args));
    }
    match receiver {
        Value::Primitive(Primitive::String(_)) => {
            if let Some(result) = strings::dispatch(module, name, receiver, args)? {
                return Ok(result);
            }
            // equality and stringification fall through to the shared forms
            shared_ops(module, name, receiver, args).ok_or_else(|| miss(module, name, receiver, args))
        }
        Value::Primitive(p) => {
            if let Some(result) = numbers::dispatch(name, p, args)? {
                return Ok(result);
            }
            shared_ops(module, name, receiver, args).ok_or_else(|| miss(module, name, receiver, args))
        }
        Value::Object(obj) => {
            let class = obj.borrow().class;
            let decl = module.class(class);
            // Enum members print and compare through their identity.
            if decl.kind == ClassKind::Enum && name == "toString" {
                if let Some(field) = module.field_named(class, "name")
                    && let Some(value) = receiver.get_field(field)
                {
                    return Ok(value);
                }
            }
            if module.builtins.unsigned_class_ids().contains(&class) && name == "toString" {
                return unsigned_to_string(module, receiver, class);
            }
            shared_ops(module, name, receiver, args).ok_or_else(|| miss(module, name, receiver, args))
        }
        _ => shared_ops(module, name, receiver, args).ok_or_else(|| miss(module, name, receiver, args)),
    }
}

/// `equals`/`hashCode`/`toString` forms shared by every value.
fn shared_ops(module: &Module, name: &str, receiver: &Value, args: &[Value]) -> Option<Value> {
    match (name, args) {
        ("equals" | "EQEQ", [other]) => {
            Some(Value::Primitive(Primitive::Boolean(receiver.structural_eq(other, module))))
        }
        ("EQEQEQ", [other]) => {
            Some(Value::Primitive(Primitive::Boolean(receiver.identity_eq(other))))
        }
        ("hashCode", []) => Some(Value::Primitive(Primitive::Int(receiver.structural_hash(module)))),
        ("toString", []) => Some(Value::string(receiver.default_to_string(module))),
        _ => None,
    }
}

/// Formats an unsigned wrapper object from its signed backing field.
fn unsigned_to_string(module: &Module, receiver: &Value, class: ClassId) -> Result<Value, EvalFault> {
    let field = module
        .field_named(class, "data")
        .ok_or_else(|| InternalError::MissingImplementation {
            function: format!("{}.toString", module.class(class).fq_name),
        })?;
    let backing = receiver.get_field(field).ok_or_else(|| {
        InternalError::MissingImplementation {
            function: format!("{}.toString", module.class(class).fq_name),
        }
    })?;
    let text = match backing {
        Value::Primitive(Primitive::Byte(v)) => (v as u8).to_string(),
        Value::Primitive(Primitive::Short(v)) => (v as u16).to_string(),
        Value::Primitive(Primitive::Int(v)) => (v as u32).to_string(),
        Value::Primitive(Primitive::Long(v)) => (v as u64).to_string(),
        other => other.default_to_string(module),
    };
    Ok(Value::string(text))
}

/// Builds the internal-error value for a table miss.
fn miss(module: &Module, name: &str, receiver: &Value, args: &[Value]) -> EvalFault {
    let mut signature = receiver.type_name(module);
    for arg in args {
        signature.push_str(", ");
        signature.push_str(&arg.type_name(module));
    }
    InternalError::MissingBuiltin { name: name.to_owned(), signature }.into()
}

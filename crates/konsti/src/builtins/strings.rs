//! String built-ins over host string APIs.
//!
//! Indices are in characters, not bytes, matching the source language's
//! UTF-16-free view of strings closely enough for constant folding; all
//! index failures raise the source index/bounds exceptions.

use std::rc::Rc;

use crate::{
    exception::BuiltinExc,
    interp::flow::EvalFault,
    ir::Module,
    value::{Primitive, Value},
};

fn int(v: i32) -> Value {
    Value::Primitive(Primitive::Int(v))
}

fn boolean(v: bool) -> Value {
    Value::Primitive(Primitive::Boolean(v))
}

fn out_of_bounds(index: i32, length: usize) -> EvalFault {
    EvalFault::exc(
        BuiltinExc::IndexOutOfBoundsException,
        format!("index: {index}, length: {length}"),
    )
}

fn number_format(kind: &str, text: &str) -> EvalFault {
    EvalFault::exc(
        BuiltinExc::IllegalArgumentException,
        format!("Invalid {kind} value: \"{text}\""),
    )
}

/// String dispatch; `Ok(None)` defers to the shared equality/hash forms.
pub(super) fn dispatch(
    module: &Module,
    name: &str,
    receiver: &Value,
    args: &[Value],
) -> Result<Option<Value>, EvalFault> {
    let Value::Primitive(Primitive::String(s)) = receiver else { return Ok(None) };
    let result = match (name, args) {
        ("length", []) => Some(int(s.chars().count() as i32)),
        ("isEmpty", []) => Some(boolean(s.is_empty())),
        ("isNotEmpty", []) => Some(boolean(!s.is_empty())),
        ("lowercase", []) => Some(Value::string(s.to_lowercase())),
        ("uppercase", []) => Some(Value::string(s.to_uppercase())),
        ("trim", []) => Some(Value::string(s.trim())),
        ("reversed", []) => Some(Value::string(s.chars().rev().collect::<String>())),
        ("toInt", []) => Some(
            s.parse::<i32>()
                .map(int)
                .map_err(|_| number_format("Int", s))?,
        ),
        ("toLong", []) => Some(
            s.parse::<i64>()
                .map(|v| Value::Primitive(Primitive::Long(v)))
                .map_err(|_| number_format("Long", s))?,
        ),
        ("toDouble", []) => Some(
            s.parse::<f64>()
                .map(|v| Value::Primitive(Primitive::Double(v)))
                .map_err(|_| number_format("Double", s))?,
        ),
        ("get", [index]) => {
            let i = index.as_int().ok_or_else(|| signature_miss(module, name, args))?;
            let c = usize::try_from(i).ok().and_then(|i| s.chars().nth(i));
            Some(c.map(|c| Value::Primitive(Primitive::Char(c)))
                .ok_or_else(|| out_of_bounds(i, s.chars().count()))?)
        }
        ("plus", [other]) => {
            let mut out = s.to_string();
            out.push_str(&other.default_to_string(module));
            Some(Value::string(out))
        }
        ("contains", [Value::Primitive(Primitive::String(n))]) => Some(boolean(s.contains(&**n))),
        ("contains", [Value::Primitive(Primitive::Char(c))]) => Some(boolean(s.contains(*c))),
        ("startsWith", [Value::Primitive(Primitive::String(n))]) => Some(boolean(s.starts_with(&**n))),
        ("endsWith", [Value::Primitive(Primitive::String(n))]) => Some(boolean(s.ends_with(&**n))),
        ("indexOf", [Value::Primitive(Primitive::String(n))]) => Some(int(char_index_of(s, n))),
        ("indexOf", [Value::Primitive(Primitive::Char(c))]) => {
            Some(int(char_index_of(s, &c.to_string())))
        }
        ("compareTo", [Value::Primitive(Primitive::String(other))]) => {
            Some(int(match s.cmp(other) {
                std::cmp::Ordering::Less => -1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => 1,
            }))
        }
        ("repeat", [count]) => {
            let n = count.as_int().ok_or_else(|| signature_miss(module, name, args))?;
            let n = usize::try_from(n)
                .map_err(|_| EvalFault::exc(BuiltinExc::IllegalArgumentException, format!("Count 'n' must be non-negative, but was {n}.")))?;
            Some(Value::string(s.repeat(n)))
        }
        ("substring", [start]) => {
            let from = start.as_int().ok_or_else(|| signature_miss(module, name, args))?;
            Some(substring(s, from, s.chars().count() as i32)?)
        }
        ("substring", [start, end]) => {
            let from = start.as_int().ok_or_else(|| signature_miss(module, name, args))?;
            let to = end.as_int().ok_or_else(|| signature_miss(module, name, args))?;
            Some(substring(s, from, to)?)
        }
        (
            "replace",
            [Value::Primitive(Primitive::String(from)), Value::Primitive(Primitive::String(to))],
        ) => Some(Value::string(s.replace(&**from, to))),
        _ => None,
    };
    Ok(result)
}

/// Character (not byte) index of the first occurrence, `-1` when absent.
fn char_index_of(haystack: &Rc<str>, needle: &str) -> i32 {
    match haystack.find(needle) {
        Some(byte_idx) => haystack[..byte_idx].chars().count() as i32,
        None => -1,
    }
}

fn substring(s: &Rc<str>, from: i32, to: i32) -> Result<Value, EvalFault> {
    let length = s.chars().count() as i32;
    if from < 0 || to > length || from > to {
        return Err(EvalFault::exc(
            BuiltinExc::IndexOutOfBoundsException,
            format!("begin {from}, end {to}, length {length}"),
        ));
    }
    let taken: String = s
        .chars()
        .skip(from as usize)
        .take((to - from) as usize)
        .collect();
    Ok(Value::string(taken))
}

fn signature_miss(module: &Module, name: &str, args: &[Value]) -> EvalFault {
    let signature = args
        .iter()
        .map(|a| a.type_name(module))
        .collect::<Vec<_>>()
        .join(", ");
    crate::interp::flow::InternalError::MissingBuiltin { name: name.to_owned(), signature }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build::ModuleBuilder;

    fn module() -> Module {
        ModuleBuilder::new().build()
    }

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    #[test]
    fn substring_two_arg_form() {
        let m = module();
        let v = dispatch(&m, "substring", &s("hello"), &[int(1), int(3)]).unwrap().unwrap();
        assert!(matches!(v, Value::Primitive(Primitive::String(ref r)) if &**r == "el"));
    }

    #[test]
    fn get_out_of_bounds_raises() {
        let m = module();
        let err = dispatch(&m, "get", &s("ab"), &[int(5)]).unwrap_err();
        assert!(matches!(err, EvalFault::Exc { kind: BuiltinExc::IndexOutOfBoundsException, .. }));
    }

    #[test]
    fn to_int_rejects_garbage() {
        let m = module();
        let err = dispatch(&m, "toInt", &s("12x"), &[]).unwrap_err();
        assert!(matches!(err, EvalFault::Exc { kind: BuiltinExc::IllegalArgumentException, .. }));
    }

    #[test]
    fn index_of_counts_chars() {
        let m = module();
        let v = dispatch(&m, "indexOf", &s("äbc"), &[s("c")]).unwrap().unwrap();
        assert!(matches!(v, Value::Primitive(Primitive::Int(2))));
    }
}

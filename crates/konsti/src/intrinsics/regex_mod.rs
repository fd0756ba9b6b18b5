//! The regex intrinsic class, backed by the host `regex` crate.
//!
//! Pattern compilation failures are host errors; they are projected into the
//! source taxonomy as `IllegalArgumentException`, matching what the source
//! runtime throws for malformed patterns.

use std::rc::Rc;

use crate::{
    exception::BuiltinExc,
    interp::flow::EvalFault,
    intrinsics::array::{ArrayBuffer, array_value},
    ir::Module,
    value::{Primitive, Value, Wrapped},
};

/// A compiled pattern plus its source text.
#[derive(Debug)]
pub struct CompiledRegex {
    pattern: String,
    regex: regex::Regex,
}

impl CompiledRegex {
    /// The original pattern text; also the regex's `toString`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// A single successful match, stored as plain data.
///
/// Positions are character (not byte) indices into the searched string,
/// matching the character-based indexing of the string built-ins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexMatch {
    value: String,
    start: usize,
    end: usize,
}

impl RegexMatch {
    /// The matched substring.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Character index of the first matched character.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Character index one past the last matched character.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }
}

/// Compiles a pattern into a wrapped regex value.
pub(crate) fn construct(pattern: &str) -> Result<Value, EvalFault> {
    match regex::Regex::new(pattern) {
        Ok(regex) => Ok(Value::Wrapped(Wrapped::Regex(Rc::new(CompiledRegex {
            pattern: pattern.to_owned(),
            regex,
        })))),
        Err(err) => Err(EvalFault::exc(BuiltinExc::IllegalArgumentException, err.to_string())),
    }
}

/// Instance-method dispatch for wrapped regex receivers.
pub(crate) fn call_method(re: &CompiledRegex, name: &str, args: &[Value]) -> Option<Result<Value, EvalFault>> {
    let result = match (name, args) {
        ("matches", [Value::Primitive(Primitive::String(input))]) => {
            let matched = re
                .regex
                .find(input)
                .is_some_and(|m| m.start() == 0 && m.end() == input.len());
            Value::Primitive(Primitive::Boolean(matched))
        }
        ("containsMatchIn", [Value::Primitive(Primitive::String(input))]) => {
            Value::Primitive(Primitive::Boolean(re.regex.is_match(input)))
        }
        ("find", [Value::Primitive(Primitive::String(input))]) => match re.regex.find(input) {
            Some(m) => {
                let start = input[..m.start()].chars().count();
                let end = start + m.as_str().chars().count();
                Value::Wrapped(Wrapped::Match(Rc::new(RegexMatch {
                    value: m.as_str().to_owned(),
                    start,
                    end,
                })))
            }
            None => Value::null(),
        },
        (
            "replace",
            [
                Value::Primitive(Primitive::String(input)),
                Value::Primitive(Primitive::String(replacement)),
            ],
        ) => Value::string(re.regex.replace_all(input, replacement.as_ref()).into_owned()),
        ("split", [Value::Primitive(Primitive::String(input))]) => {
            let parts: Vec<Value> = re.regex.split(input).map(Value::string).collect();
            array_value(ArrayBuffer::Object(parts))
        }
        ("toString", []) => Value::string(re.pattern()),
        _ => return None,
    };
    Some(Ok(result))
}

/// Instance-method dispatch for wrapped match results.
pub(crate) fn call_match(
    module: &Module,
    m: &RegexMatch,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, EvalFault>> {
    let result = match (name, args) {
        ("value", []) | ("toString", []) => Value::string(m.value()),
        // The matched range, inclusive of the last character like the
        // source language's ranges. An empty match yields an empty range.
        ("range", []) => {
            let int_range = module.builtins.int_range;
            let first = module.field_named(int_range, "first")?;
            let last = module.field_named(int_range, "last")?;
            let range = Value::Object(Value::new_instance(int_range));
            range.set_field(first, Value::Primitive(Primitive::Int(m.start() as i32)), module);
            range.set_field(last, Value::Primitive(Primitive::Int(m.end() as i32 - 1)), module);
            range
        }
        _ => return None,
    };
    Some(Ok(result))
}

/// Companion-member dispatch (`Regex.escape`).
pub(crate) fn call_companion(name: &str, args: &[Value]) -> Option<Result<Value, EvalFault>> {
    match (name, args) {
        ("escape", [Value::Primitive(Primitive::String(literal))]) => {
            Some(Ok(Value::string(regex::escape(literal))))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex(pattern: &str) -> Rc<CompiledRegex> {
        match construct(pattern).unwrap() {
            Value::Wrapped(Wrapped::Regex(re)) => re,
            other => panic!("expected regex, got {other:?}"),
        }
    }

    #[test]
    fn matches_requires_full_match() {
        let re = regex("a+");
        let hit = call_method(&re, "matches", &[Value::string("aaa")]).unwrap().unwrap();
        assert!(matches!(hit, Value::Primitive(Primitive::Boolean(true))));
        let miss = call_method(&re, "matches", &[Value::string("aab")]).unwrap().unwrap();
        assert!(matches!(miss, Value::Primitive(Primitive::Boolean(false))));
    }

    #[test]
    fn find_returns_null_on_miss() {
        let re = regex("[0-9]+");
        let miss = call_method(&re, "find", &[Value::string("abc")]).unwrap().unwrap();
        assert!(miss.is_null());
    }

    #[test]
    fn find_positions_are_char_offsets() {
        let re = regex("[0-9]+");
        let hit = call_method(&re, "find", &[Value::string("äb 123 c")]).unwrap().unwrap();
        let Value::Wrapped(Wrapped::Match(m)) = hit else {
            panic!("expected match result, got {hit:?}");
        };
        assert_eq!(m.value(), "123");
        assert_eq!(m.start(), 3);
        assert_eq!(m.end(), 6);
    }

    #[test]
    fn bad_pattern_projects_to_illegal_argument() {
        let err = construct("(unclosed").unwrap_err();
        assert!(matches!(err, EvalFault::Exc { kind: BuiltinExc::IllegalArgumentException, .. }));
    }
}

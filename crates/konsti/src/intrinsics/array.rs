//! Host array buffers backing the primitive and object array classes.
//!
//! Buffers are typed by element kind so that reads produce correctly-kinded
//! primitives and vararg materialization keeps the IR element type. Object
//! arrays hold arbitrary values.

use std::{cell::RefCell, rc::Rc};

use crate::{
    exception::BuiltinExc,
    interp::flow::EvalFault,
    ir::{ClassId, Module, PrimitiveKind},
    value::{Primitive, Value, Wrapped},
};

/// A mutable, shared array buffer.
#[derive(Debug, Clone)]
pub enum ArrayBuffer {
    Boolean(Vec<bool>),
    Char(Vec<char>),
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Object(Vec<Value>),
}

impl ArrayBuffer {
    /// Allocates a zero-filled buffer of `size` elements.
    ///
    /// `kind` is `None` for object arrays, whose slots start as `null`.
    #[must_use]
    pub fn with_size(kind: Option<PrimitiveKind>, size: usize) -> Self {
        match kind {
            Some(PrimitiveKind::Boolean) => Self::Boolean(vec![false; size]),
            Some(PrimitiveKind::Char) => Self::Char(vec!['\u{0}'; size]),
            Some(PrimitiveKind::Byte) => Self::Byte(vec![0; size]),
            Some(PrimitiveKind::Short) => Self::Short(vec![0; size]),
            Some(PrimitiveKind::Int) => Self::Int(vec![0; size]),
            Some(PrimitiveKind::Long) => Self::Long(vec![0; size]),
            Some(PrimitiveKind::Float) => Self::Float(vec![0.0; size]),
            Some(PrimitiveKind::Double) => Self::Double(vec![0.0; size]),
            _ => Self::Object(vec![Value::null(); size]),
        }
    }

    /// Builds a buffer from already-evaluated element values.
    pub fn from_values(kind: Option<PrimitiveKind>, values: Vec<Value>) -> Result<Self, EvalFault> {
        let mut buffer = Self::with_size(kind, values.len());
        for (i, value) in values.into_iter().enumerate() {
            buffer.set(i, value)?;
        }
        Ok(buffer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Long(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Object(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads one element as a correctly-kinded value.
    pub fn get(&self, index: usize) -> Result<Value, EvalFault> {
        if index >= self.len() {
            return Err(self.out_of_bounds(index));
        }
        Ok(match self {
            Self::Boolean(v) => Value::Primitive(Primitive::Boolean(v[index])),
            Self::Char(v) => Value::Primitive(Primitive::Char(v[index])),
            Self::Byte(v) => Value::Primitive(Primitive::Byte(v[index])),
            Self::Short(v) => Value::Primitive(Primitive::Short(v[index])),
            Self::Int(v) => Value::Primitive(Primitive::Int(v[index])),
            Self::Long(v) => Value::Primitive(Primitive::Long(v[index])),
            Self::Float(v) => Value::Primitive(Primitive::Float(v[index])),
            Self::Double(v) => Value::Primitive(Primitive::Double(v[index])),
            Self::Object(v) => v[index].clone(),
        })
    }

    /// Writes one element, requiring the element kind to match the buffer.
    pub fn set(&mut self, index: usize, value: Value) -> Result<(), EvalFault> {
        if index >= self.len() {
            return Err(self.out_of_bounds(index));
        }
        match (self, &value) {
            (Self::Boolean(v), Value::Primitive(Primitive::Boolean(b))) => v[index] = *b,
            (Self::Char(v), Value::Primitive(Primitive::Char(c))) => v[index] = *c,
            (Self::Byte(v), Value::Primitive(Primitive::Byte(b))) => v[index] = *b,
            (Self::Short(v), Value::Primitive(Primitive::Short(s))) => v[index] = *s,
            (Self::Int(v), Value::Primitive(Primitive::Int(i))) => v[index] = *i,
            (Self::Long(v), Value::Primitive(Primitive::Long(l))) => v[index] = *l,
            (Self::Float(v), Value::Primitive(Primitive::Float(f))) => v[index] = *f,
            (Self::Double(v), Value::Primitive(Primitive::Double(d))) => v[index] = *d,
            (Self::Object(v), _) => v[index] = value,
            _ => {
                return Err(EvalFault::exc(
                    BuiltinExc::IllegalArgumentException,
                    "array element kind mismatch",
                ));
            }
        }
        Ok(())
    }

    /// Snapshot of the elements as values, used by vararg spreading.
    #[must_use]
    pub fn to_values(&self) -> Vec<Value> {
        (0..self.len())
            .map(|i| self.get(i).expect("index within bounds"))
            .collect()
    }

    /// The element kind; `None` for object arrays.
    #[must_use]
    pub fn element_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Boolean(_) => Some(PrimitiveKind::Boolean),
            Self::Char(_) => Some(PrimitiveKind::Char),
            Self::Byte(_) => Some(PrimitiveKind::Byte),
            Self::Short(_) => Some(PrimitiveKind::Short),
            Self::Int(_) => Some(PrimitiveKind::Int),
            Self::Long(_) => Some(PrimitiveKind::Long),
            Self::Float(_) => Some(PrimitiveKind::Float),
            Self::Double(_) => Some(PrimitiveKind::Double),
            Self::Object(_) => None,
        }
    }

    /// The IR array class for this buffer.
    #[must_use]
    pub fn class(&self, module: &Module) -> ClassId {
        match self.element_kind() {
            Some(kind) => module
                .class_by_fq(&format!("kotlin.{kind}Array"))
                .unwrap_or(module.builtins.array),
            None => module.builtins.array,
        }
    }

    fn out_of_bounds(&self, index: usize) -> EvalFault {
        EvalFault::exc(
            BuiltinExc::IndexOutOfBoundsException,
            format!("index {index} out of bounds for length {}", self.len()),
        )
    }
}

/// Wraps a buffer into a shared array value.
#[must_use]
pub(crate) fn array_value(buffer: ArrayBuffer) -> Value {
    Value::Wrapped(Wrapped::Array(Rc::new(RefCell::new(buffer))))
}

/// Classifies an array class: `Some(None)` for the object array class,
/// `Some(Some(kind))` for a primitive array class, `None` otherwise.
#[must_use]
pub(crate) fn array_kind_of(module: &Module, class: ClassId) -> Option<Option<PrimitiveKind>> {
    if class == module.builtins.array {
        return Some(None);
    }
    let fq = &module.class(class).fq_name;
    let kind = fq.strip_prefix("kotlin.")?.strip_suffix("Array")?;
    kind.parse::<PrimitiveKind>().ok().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_buffer_round_trips_kind() {
        let mut buf = ArrayBuffer::with_size(Some(PrimitiveKind::Int), 3);
        buf.set(1, Value::Primitive(Primitive::Int(7))).unwrap();
        assert!(matches!(buf.get(1).unwrap(), Value::Primitive(Primitive::Int(7))));
        assert_eq!(buf.element_kind(), Some(PrimitiveKind::Int));
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut buf = ArrayBuffer::with_size(Some(PrimitiveKind::Int), 1);
        let err = buf.set(0, Value::string("nope")).unwrap_err();
        assert!(matches!(err, EvalFault::Exc { kind: BuiltinExc::IllegalArgumentException, .. }));
    }

    #[test]
    fn out_of_bounds_read_raises() {
        let buf = ArrayBuffer::with_size(None, 1);
        let err = buf.get(3).unwrap_err();
        assert!(matches!(err, EvalFault::Exc { kind: BuiltinExc::IndexOutOfBoundsException, .. }));
    }
}

//! Runtime values produced and consumed by the evaluator.
//!
//! A [`Value`] is one of five variants: a primitive, a host-wrapped object,
//! a user-class instance, a lambda, or a thrown exception. Instances and
//! host buffers are shared handles (`Rc`) so that aliasing through variables
//! and fields behaves like reference semantics in the source language; the
//! handles never outlive the `interpret()` call that created them.

use std::{cell::RefCell, fmt::Write, rc::Rc};

use indexmap::IndexMap;

use crate::{
    exception::ExceptionValue,
    intrinsics::{array::ArrayBuffer, regex_mod::{CompiledRegex, RegexMatch}},
    ir::{ClassId, FieldId, FunId, Module, PrimitiveKind},
};

/// A primitive value with its host representation stored inline.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Unit,
    Null,
    Boolean(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Rc<str>),
}

impl Primitive {
    /// The IR kind used when materializing this value; `None` for `Unit`
    /// and `Null`, which have no primitive kind of their own.
    #[must_use]
    pub fn kind(&self) -> Option<PrimitiveKind> {
        match self {
            Self::Unit | Self::Null => None,
            Self::Boolean(_) => Some(PrimitiveKind::Boolean),
            Self::Char(_) => Some(PrimitiveKind::Char),
            Self::Byte(_) => Some(PrimitiveKind::Byte),
            Self::Short(_) => Some(PrimitiveKind::Short),
            Self::Int(_) => Some(PrimitiveKind::Int),
            Self::Long(_) => Some(PrimitiveKind::Long),
            Self::Float(_) => Some(PrimitiveKind::Float),
            Self::Double(_) => Some(PrimitiveKind::Double),
            Self::String(_) => Some(PrimitiveKind::String),
        }
    }

    /// Host formatting used by string concatenation and `toString`.
    ///
    /// Floats use the shortest round-trip form (`1.0`, not `1`), matching
    /// the source language's formatting.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Unit => "kotlin.Unit".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Boolean(b) => b.to_string(),
            Self::Char(c) => c.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::Short(v) => v.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Long(v) => v.to_string(),
            Self::Float(v) => {
                if v.is_finite() {
                    ryu::Buffer::new().format(*v).to_owned()
                } else {
                    special_float(f64::from(*v))
                }
            }
            Self::Double(v) => {
                if v.is_finite() {
                    ryu::Buffer::new().format(*v).to_owned()
                } else {
                    special_float(*v)
                }
            }
            Self::String(s) => s.to_string(),
        }
    }

    /// JVM-style hash code, used by the structural `hashCode` built-in.
    #[must_use]
    pub fn hash_code(&self) -> i32 {
        match self {
            Self::Unit | Self::Null => 0,
            Self::Boolean(b) => {
                if *b {
                    1231
                } else {
                    1237
                }
            }
            Self::Char(c) => *c as i32,
            Self::Byte(v) => i32::from(*v),
            Self::Short(v) => i32::from(*v),
            Self::Int(v) => *v,
            Self::Long(v) => (*v ^ (*v >> 32)) as i32,
            Self::Float(v) => v.to_bits() as i32,
            Self::Double(v) => {
                let bits = v.to_bits() as i64;
                (bits ^ (bits >> 32)) as i32
            }
            Self::String(s) => s
                .chars()
                .fold(0i32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as i32)),
        }
    }
}

fn special_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_owned()
    } else if v > 0.0 {
        "Infinity".to_owned()
    } else {
        "-Infinity".to_owned()
    }
}

/// A user-class instance: field slots plus the super-class portion.
///
/// Each link of the `super_instance` chain corresponds to one level of the
/// class hierarchy and owns that level's backing fields. The chain is built
/// during construction and never relinked, so it is acyclic by construction.
#[derive(Debug)]
pub struct Instance {
    pub class: ClassId,
    /// Backing-field slots in declaration order.
    pub fields: IndexMap<FieldId, Value>,
    pub super_instance: Option<ObjRef>,
}

/// Shared handle to an instance.
pub type ObjRef = Rc<RefCell<Instance>>;

/// A value whose behavior is supplied by the host runtime.
#[derive(Debug, Clone)]
pub enum Wrapped {
    /// A compiled regular expression (`kotlin.text.Regex`).
    Regex(Rc<CompiledRegex>),
    /// A match result produced by `Regex.find`: matched text plus range.
    Match(Rc<RegexMatch>),
    /// A primitive or object array buffer, shared and mutable.
    Array(Rc<RefCell<ArrayBuffer>>),
    /// The companion-object singleton of an intrinsic class.
    Companion(ClassId),
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Primitive(Primitive),
    Wrapped(Wrapped),
    Object(ObjRef),
    /// A first-class function; free variables resolve through the enclosing
    /// frame stack at call time.
    Lambda { function: FunId, interface: ClassId },
    Exception(ExceptionValue),
}

impl Value {
    /// Shorthand for the `Unit` primitive.
    #[must_use]
    pub fn unit() -> Self {
        Self::Primitive(Primitive::Unit)
    }

    /// Shorthand for the `null` primitive.
    #[must_use]
    pub fn null() -> Self {
        Self::Primitive(Primitive::Null)
    }

    /// Shorthand for a string value.
    #[must_use]
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Self::Primitive(Primitive::String(s.into()))
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Null))
    }

    /// Extracts a boolean, coercing nothing: only `Boolean` qualifies.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Primitive(Primitive::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    /// Extracts an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Primitive(Primitive::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Allocates a fresh instance of `class` with no fields bound yet.
    #[must_use]
    pub fn new_instance(class: ClassId) -> ObjRef {
        Rc::new(RefCell::new(Instance { class, fields: IndexMap::new(), super_instance: None }))
    }

    /// The runtime class of this value, where one exists.
    #[must_use]
    pub fn runtime_class(&self, module: &Module) -> Option<ClassId> {
        match self {
            Self::Primitive(p) => p.kind().and_then(|k| module.builtins.primitive_class(k)),
            Self::Wrapped(w) => Some(w.class(module)),
            Self::Object(obj) => Some(obj.borrow().class),
            Self::Lambda { interface, .. } => Some(*interface),
            Self::Exception(exc) => Some(exc.kind),
        }
    }

    /// A short name for diagnostics: class name, primitive kind, or `null`.
    #[must_use]
    pub fn type_name(&self, module: &Module) -> String {
        match self {
            Self::Primitive(Primitive::Null) => "null".to_owned(),
            Self::Primitive(Primitive::Unit) => "kotlin.Unit".to_owned(),
            Self::Primitive(p) => p.kind().map_or_else(|| "?".to_owned(), |k| k.to_string()),
            Self::Wrapped(w) => module.class(w.class(module)).fq_name.clone(),
            Self::Object(obj) => module.class(obj.borrow().class).fq_name.clone(),
            Self::Lambda { interface, .. } => module.class(*interface).fq_name.clone(),
            Self::Exception(exc) => module.class(exc.kind).fq_name.clone(),
        }
    }

    /// Reads a field slot, walking the super-instance chain to the level
    /// whose class declares the field.
    #[must_use]
    pub fn get_field(&self, field: FieldId) -> Option<Value> {
        let Self::Object(obj) = self else { return None };
        let mut current = Rc::clone(obj);
        loop {
            let next = {
                let inst = current.borrow();
                if let Some(v) = inst.fields.get(&field) {
                    return Some(v.clone());
                }
                inst.super_instance.clone()
            };
            current = next?;
        }
    }

    /// Writes a field slot on the level that declares it, falling back to
    /// the level owning the field per the module's declaration.
    pub fn set_field(&self, field: FieldId, value: Value, module: &Module) -> bool {
        let Self::Object(obj) = self else { return false };
        let owner = module.field(field).owner;
        let mut current = Rc::clone(obj);
        loop {
            let next = {
                let mut inst = current.borrow_mut();
                if inst.class == owner || inst.fields.contains_key(&field) {
                    inst.fields.insert(field, value);
                    return true;
                }
                inst.super_instance.clone()
            };
            match next {
                Some(obj) => current = obj,
                // No level of the chain declares the field; write it on the
                // most-derived level so constructors can initialize early.
                None => {
                    if let Self::Object(obj) = self {
                        obj.borrow_mut().fields.insert(field, value);
                    }
                    return true;
                }
            }
        }
    }

    /// Structural equality used by the `EQEQ`/`equals` built-ins.
    ///
    /// Primitives compare by value (numeric kinds only across identical
    /// kinds — the IR inserts conversions for mixed-kind comparisons),
    /// instances compare by identity unless their class is a data class, in
    /// which case fields compare structurally in declaration order.
    #[must_use]
    pub fn structural_eq(&self, other: &Self, module: &Module) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (ca, cb) = (a.borrow().class, b.borrow().class);
                if ca != cb || !module.class(ca).is_data {
                    return false;
                }
                let fa = field_values(a);
                let fb = field_values(b);
                fa.len() == fb.len()
                    && fa.iter().zip(fb.iter()).all(|((ka, va), (kb, vb))| {
                        ka == kb && va.structural_eq(vb, module)
                    })
            }
            (Self::Wrapped(Wrapped::Array(a)), Self::Wrapped(Wrapped::Array(b))) => Rc::ptr_eq(a, b),
            (Self::Wrapped(Wrapped::Regex(a)), Self::Wrapped(Wrapped::Regex(b))) => Rc::ptr_eq(a, b),
            (Self::Wrapped(Wrapped::Match(a)), Self::Wrapped(Wrapped::Match(b))) => a == b,
            (Self::Wrapped(Wrapped::Companion(a)), Self::Wrapped(Wrapped::Companion(b))) => a == b,
            (Self::Lambda { function: a, .. }, Self::Lambda { function: b, .. }) => a == b,
            _ => false,
        }
    }

    /// Reference identity (`===`).
    #[must_use]
    pub fn identity_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Wrapped(Wrapped::Array(a)), Self::Wrapped(Wrapped::Array(b))) => Rc::ptr_eq(a, b),
            (Self::Wrapped(Wrapped::Regex(a)), Self::Wrapped(Wrapped::Regex(b))) => Rc::ptr_eq(a, b),
            (Self::Wrapped(Wrapped::Match(a)), Self::Wrapped(Wrapped::Match(b))) => Rc::ptr_eq(a, b),
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            _ => false,
        }
    }

    /// Structural hash matching [`Self::structural_eq`]: data-class
    /// instances hash their fields in declaration order, everything else
    /// hashes by identity or primitive value.
    #[must_use]
    pub fn structural_hash(&self, module: &Module) -> i32 {
        match self {
            Self::Primitive(p) => p.hash_code(),
            Self::Object(obj) => {
                if module.class(obj.borrow().class).is_data {
                    field_values(obj)
                        .iter()
                        .fold(0i32, |acc, (_, v)| {
                            acc.wrapping_mul(31).wrapping_add(v.structural_hash(module))
                        })
                } else {
                    identity_hash(obj)
                }
            }
            Self::Wrapped(Wrapped::Array(buf)) => Rc::as_ptr(buf) as usize as i32,
            _ => 0,
        }
    }

    /// Data-class `toString`: `Name(field1=value1, field2=value2)`.
    ///
    /// Non-data instances and other values fall back to identity or host
    /// formatting; objects with an overriding `toString` body never reach
    /// this path (the override resolver runs first).
    #[must_use]
    pub fn default_to_string(&self, module: &Module) -> String {
        match self {
            Self::Primitive(p) => p.display(),
            Self::Object(obj) => {
                let class = module.class(obj.borrow().class);
                if class.is_data {
                    let mut out = String::new();
                    let _ = write!(out, "{}(", class.name);
                    for (i, (field, value)) in field_values(obj).iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        let _ = write!(out, "{}={}", module.field(*field).name, value.default_to_string(module));
                    }
                    out.push(')');
                    out
                } else {
                    format!("{}@{:x}", class.name, identity_hash(obj))
                }
            }
            Self::Wrapped(w) => w.display(module),
            Self::Lambda { interface, .. } => {
                format!("Function<{}>", module.class(*interface).name)
            }
            Self::Exception(exc) => exc.header(module),
        }
    }
}

impl Wrapped {
    /// The IR class this host object belongs to.
    #[must_use]
    pub fn class(&self, module: &Module) -> ClassId {
        match self {
            Self::Regex(_) => module.builtins.regex,
            Self::Match(_) => module.builtins.match_result,
            Self::Array(buf) => buf.borrow().class(module),
            Self::Companion(class) => *class,
        }
    }

    /// Host `toString` for wrapped values.
    #[must_use]
    pub fn display(&self, module: &Module) -> String {
        match self {
            Self::Regex(re) => re.pattern().to_owned(),
            Self::Match(m) => m.value().to_owned(),
            Self::Array(buf) => format!("{}@{:x}", module.class(buf.borrow().class(module)).name, Rc::as_ptr(buf) as usize),
            Self::Companion(class) => format!("{}.Companion", module.class(*class).name),
        }
    }
}

/// Snapshot of the full field map of an instance, outermost class first,
/// walking the super-instance chain.
fn field_values(obj: &ObjRef) -> Vec<(FieldId, Value)> {
    let mut out = Vec::new();
    let mut current = Some(Rc::clone(obj));
    while let Some(inst) = current {
        let borrow = inst.borrow();
        for (field, value) in &borrow.fields {
            out.push((*field, value.clone()));
        }
        current = borrow.super_instance.clone();
    }
    out
}

/// Identity hash derived from the handle address.
fn identity_hash(obj: &ObjRef) -> i32 {
    (Rc::as_ptr(obj) as usize as u64 >> 4) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_display_keeps_fraction() {
        assert_eq!(Primitive::Double(1.0).display(), "1.0");
        assert_eq!(Primitive::Float(2.5).display(), "2.5");
        assert_eq!(Primitive::Double(f64::NAN).display(), "NaN");
        assert_eq!(Primitive::Double(f64::NEG_INFINITY).display(), "-Infinity");
    }

    #[test]
    fn string_hash_matches_reference_formula() {
        // "Ab" => 'A' * 31 + 'b' = 65 * 31 + 98
        let h = Primitive::String("Ab".into()).hash_code();
        assert_eq!(h, 65 * 31 + 98);
    }

    #[test]
    fn boolean_hash_uses_jvm_constants() {
        assert_eq!(Primitive::Boolean(true).hash_code(), 1231);
        assert_eq!(Primitive::Boolean(false).hash_code(), 1237);
    }
}

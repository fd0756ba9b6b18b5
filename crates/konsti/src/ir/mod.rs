//! The typed, tree-shaped intermediate representation consumed by the evaluator.
//!
//! A [`Module`] is an arena-style fragment: declarations live in flat vectors
//! and refer to each other through `u32` index newtypes ([`ClassId`],
//! [`FunId`], [`VarId`], [`FieldId`], [`FileId`]). The evaluator observes the
//! module strictly read-only; all runtime state lives in the evaluator itself.
//!
//! Construction of the IR (parsing, name resolution, type checking) is the
//! job of an external frontend. [`build::ModuleBuilder`] exists only so that
//! drivers and tests have an ergonomic way to assemble already-resolved
//! fragments.

pub mod build;
mod expr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

pub use self::expr::{
    ConstValue, IrCall, IrCatch, IrExpr, IrStatement, TypeOperator, VarargElement, WhenBranch,
};

/// Index of a class declaration in [`Module::classes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u32);

/// Index of a function declaration in [`Module::functions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunId(u32);

/// Index of a variable declaration in [`Module::variables`].
///
/// Variables cover value parameters, locals, catch parameters and the
/// synthetic dispatch/extension receivers of functions. Identity of the
/// `VarId` is identity of the symbol: two bindings of the same `VarId` in
/// nested scopes shadow each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(u32);

/// Index of a backing field declaration in [`Module::fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(u32);

/// Index of a source file in [`Module::files`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(u32);

macro_rules! impl_id {
    ($($id:ident),*) => {$(
        impl $id {
            pub(crate) fn new(index: usize) -> Self {
                Self(u32::try_from(index).expect("arena index exceeds u32"))
            }

            /// Returns the raw arena index.
            #[inline]
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    )*};
}

impl_id!(ClassId, FunId, VarId, FieldId, FileId);

/// Primitive value kinds of the source language.
///
/// The unsigned kinds only occur on constants: the evaluator rewrites an
/// unsigned constant into a constructor call on the matching unsigned class,
/// whose single backing field carries the signed representation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
pub enum PrimitiveKind {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    UByte,
    UShort,
    UInt,
    ULong,
}

impl PrimitiveKind {
    /// Returns the signed backing kind for an unsigned constant kind.
    ///
    /// Non-unsigned kinds return `None`.
    #[must_use]
    pub fn unsigned_backing(self) -> Option<Self> {
        match self {
            Self::UByte => Some(Self::Byte),
            Self::UShort => Some(Self::Short),
            Self::UInt => Some(Self::Int),
            Self::ULong => Some(Self::Long),
            _ => None,
        }
    }
}

/// A resolved type reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrType {
    Primitive(PrimitiveKind),
    Class { class: ClassId, nullable: bool },
    Unit,
    /// The bottom type of `throw` and non-terminating expressions.
    Nothing,
}

impl IrType {
    /// Non-nullable class type shorthand.
    #[must_use]
    pub fn class(class: ClassId) -> Self {
        Self::Class { class, nullable: false }
    }

    /// Nullable class type shorthand.
    #[must_use]
    pub fn nullable(class: ClassId) -> Self {
        Self::Class { class, nullable: true }
    }

    /// Whether `null` inhabits this type.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Class { nullable: true, .. })
    }
}

/// Declaration kind of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
}

/// Openness of a class or function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    Final,
    Open,
    Abstract,
}

/// Kind of a function declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Constructor,
}

/// One enum entry of an enum class, in declaration order.
///
/// The ordinal of an entry is its index in [`IrClass::enum_entries`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrEnumEntry {
    pub name: String,
    /// Constructor call producing the entry instance. The enum
    /// super-constructor inside receives the entry name and ordinal as
    /// synthetic arguments at evaluation time.
    pub initializer: IrExpr,
}

/// A property initializer or anonymous `init` block, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassInitializer {
    /// A property with an initializer expression: writes into `field`.
    Field { field: FieldId, value: IrExpr },
    /// An anonymous initializer block evaluated for effect.
    Anonymous { body: IrExpr },
}

/// A class declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrClass {
    pub name: String,
    pub fq_name: String,
    pub kind: ClassKind,
    pub modality: Modality,
    /// Whether structural `equals`/`hashCode`/`toString` are generated for
    /// this class (data-class semantics for bodiless members).
    pub is_data: bool,
    pub super_class: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    /// Backing fields in declaration order.
    pub fields: Vec<FieldId>,
    pub functions: Vec<FunId>,
    pub enum_entries: Vec<IrEnumEntry>,
    /// Property initializers and `init` blocks, run by
    /// [`IrExpr::InstanceInitializerCall`] in declaration order.
    pub initializers: Vec<ClassInitializer>,
    /// Marks a class whose construction and methods delegate to host code.
    pub intrinsic: bool,
}

/// A value parameter of a function, with its optional default expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrParam {
    pub var: VarId,
    pub default: Option<IrExpr>,
}

/// A function or constructor declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrFunction {
    pub name: String,
    pub fq_name: String,
    pub kind: FunctionKind,
    pub parent: Option<ClassId>,
    /// The callee-side `this` symbol for member functions.
    pub dispatch_receiver: Option<VarId>,
    /// The callee-side extension receiver symbol, if any.
    pub extension_receiver: Option<VarId>,
    pub params: Vec<IrParam>,
    pub return_ty: IrType,
    pub body: Option<IrExpr>,
    /// Functions this declaration overrides, nearest first.
    pub overridden: Vec<FunId>,
    pub modality: Modality,
    /// A compiler-synthesized override with no body of its own; dispatch
    /// walks [`Self::overridden`] to the nearest real implementation.
    pub is_fake_override: bool,
    /// Marks a function whose implementation is supplied by host code,
    /// selected by fully-qualified name.
    pub intrinsic: bool,
    pub file: FileId,
    pub line: u32,
}

/// A variable symbol: value parameter, local, catch parameter or receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrVariable {
    pub name: String,
    pub ty: IrType,
}

/// A backing field of a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrField {
    pub name: String,
    pub ty: IrType,
    pub owner: ClassId,
}

/// A source file referenced by stack frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name with extension, e.g. `Main.kt`.
    pub name: String,
}

impl SourceFile {
    /// The JVM-style facade name used in stack frames: `Main.kt` → `MainKt`.
    #[must_use]
    pub fn facade(&self) -> String {
        let base = self.name.strip_suffix(".kt").unwrap_or(&self.name);
        format!("{base}Kt")
    }
}

/// The well-known classes the evaluator needs handles for.
///
/// Provided by the module fragment; the builder seeds all of them. Every
/// entry must point at a class in the same module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinClasses {
    pub any: ClassId,
    pub string: ClassId,
    pub throwable: ClassId,
    pub exception: ClassId,
    pub arithmetic_exception: ClassId,
    pub class_cast_exception: ClassId,
    pub illegal_argument_exception: ClassId,
    pub null_pointer_exception: ClassId,
    pub no_such_element_exception: ClassId,
    pub index_out_of_bounds_exception: ClassId,
    pub unsupported_operation_exception: ClassId,
    pub stack_overflow_error: ClassId,
    /// Base class of all enum classes; owns the `name` and `ordinal` fields.
    pub enum_base: ClassId,
    /// Boxed forms of the primitive number/char/boolean/string kinds.
    pub primitives: Vec<(PrimitiveKind, ClassId)>,
    pub int_range: ClassId,
    pub long_range: ClassId,
    pub char_range: ClassId,
    pub ubyte: ClassId,
    pub ushort: ClassId,
    pub uint: ClassId,
    pub ulong: ClassId,
    /// The object array class; primitive array classes are recognized by
    /// fully-qualified name.
    pub array: ClassId,
    pub regex: ClassId,
    /// Host-produced match results of the regex class's `find`.
    pub match_result: ClassId,
}

impl BuiltinClasses {
    /// Returns the boxed class of a primitive kind, if the table has one.
    #[must_use]
    pub fn primitive_class(&self, kind: PrimitiveKind) -> Option<ClassId> {
        self.primitives.iter().find(|(k, _)| *k == kind).map(|(_, c)| *c)
    }

    /// Returns the unsigned wrapper class for an unsigned constant kind.
    #[must_use]
    pub fn unsigned_class(&self, kind: PrimitiveKind) -> Option<ClassId> {
        match kind {
            PrimitiveKind::UByte => Some(self.ubyte),
            PrimitiveKind::UShort => Some(self.ushort),
            PrimitiveKind::UInt => Some(self.uint),
            PrimitiveKind::ULong => Some(self.ulong),
            _ => None,
        }
    }

    /// The four unsigned wrapper classes.
    #[must_use]
    pub fn unsigned_class_ids(&self) -> [ClassId; 4] {
        [self.ubyte, self.ushort, self.uint, self.ulong]
    }

    /// Returns the range class produced by `rangeTo` on the given kind.
    #[must_use]
    pub fn range_class(&self, kind: PrimitiveKind) -> Option<ClassId> {
        match kind {
            PrimitiveKind::Int | PrimitiveKind::Byte | PrimitiveKind::Short => Some(self.int_range),
            PrimitiveKind::Long => Some(self.long_range),
            PrimitiveKind::Char => Some(self.char_range),
            _ => None,
        }
    }
}

/// A fully-resolved module fragment: the evaluator's read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub classes: Vec<IrClass>,
    pub functions: Vec<IrFunction>,
    pub variables: Vec<IrVariable>,
    pub fields: Vec<IrField>,
    pub files: Vec<SourceFile>,
    pub builtins: BuiltinClasses,
}

impl Module {
    /// Looks up a class declaration.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &IrClass {
        &self.classes[id.index()]
    }

    /// Looks up a function declaration.
    #[must_use]
    pub fn function(&self, id: FunId) -> &IrFunction {
        &self.functions[id.index()]
    }

    /// Looks up a variable symbol.
    #[must_use]
    pub fn variable(&self, id: VarId) -> &IrVariable {
        &self.variables[id.index()]
    }

    /// Looks up a field declaration.
    #[must_use]
    pub fn field(&self, id: FieldId) -> &IrField {
        &self.fields[id.index()]
    }

    /// Looks up a source file.
    #[must_use]
    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.index()]
    }

    /// Whether `sub` is `sup` or a transitive subclass/subinterface of it.
    ///
    /// Every class is a subtype of the builtin `any` class.
    #[must_use]
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        if sup == self.builtins.any || sub == sup {
            return true;
        }
        let class = self.class(sub);
        if let Some(parent) = class.super_class
            && self.is_subclass(parent, sup)
        {
            return true;
        }
        class.interfaces.iter().any(|&i| self.is_subclass(i, sup))
    }

    /// Returns the first declared constructor of a class, if any.
    #[must_use]
    pub fn constructor_of(&self, class: ClassId) -> Option<FunId> {
        self.class(class)
            .functions
            .iter()
            .copied()
            .find(|&f| self.function(f).kind == FunctionKind::Constructor)
    }

    /// Whether `candidate` transitively overrides `base`.
    #[must_use]
    pub fn overrides(&self, candidate: FunId, base: FunId) -> bool {
        if candidate == base {
            return true;
        }
        self.function(candidate)
            .overridden
            .iter()
            .any(|&o| self.overrides(o, base))
    }

    /// Finds a class by fully-qualified name.
    #[must_use]
    pub fn class_by_fq(&self, fq_name: &str) -> Option<ClassId> {
        self.classes.iter().position(|c| c.fq_name == fq_name).map(ClassId::new)
    }

    /// Finds a function by fully-qualified name.
    #[must_use]
    pub fn function_by_fq(&self, fq_name: &str) -> Option<FunId> {
        self.functions.iter().position(|f| f.fq_name == fq_name).map(FunId::new)
    }

    /// Finds a field by name on a class or any of its superclasses.
    #[must_use]
    pub fn field_named(&self, class: ClassId, name: &str) -> Option<FieldId> {
        let c = self.class(class);
        c.fields
            .iter()
            .copied()
            .find(|&f| self.field(f).name == name)
            .or_else(|| c.super_class.and_then(|sup| self.field_named(sup, name)))
    }

    /// Finds the enum entry index (the ordinal) for an entry name.
    #[must_use]
    pub fn enum_ordinal(&self, class: ClassId, entry: &str) -> Option<usize> {
        self.class(class).enum_entries.iter().position(|e| e.name == entry)
    }

    /// Formats one stack frame for a function:
    /// `MainKt.fib(Main.kt:3)` — the `at ` prefix is added when rendering.
    #[must_use]
    pub fn frame_text(&self, fun: FunId) -> String {
        let f = self.function(fun);
        let file = self.file(f.file);
        format!("{}.{}({}:{})", file.facade(), f.fq_name, file.name, f.line)
    }

    /// Human-readable name of a type for diagnostics.
    #[must_use]
    pub fn type_name(&self, ty: &IrType) -> String {
        match ty {
            IrType::Primitive(kind) => kind.to_string(),
            IrType::Class { class, nullable } => {
                let name = &self.class(*class).fq_name;
                if *nullable { format!("{name}?") } else { name.clone() }
            }
            IrType::Unit => "Unit".to_owned(),
            IrType::Nothing => "Nothing".to_owned(),
        }
    }
}

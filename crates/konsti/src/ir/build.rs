//! Assembly of already-resolved module fragments.
//!
//! [`ModuleBuilder`] is plumbing for drivers and tests: it allocates
//! declarations into the module arenas and seeds the builtin class table the
//! evaluator requires (number classes, throwables, ranges, unsigned wrappers,
//! arrays, regex). It performs no name resolution and no type checking — the
//! caller is responsible for handing the evaluator well-formed IR, exactly as
//! a real frontend would.

use ahash::AHashMap;

use super::{
    BuiltinClasses, ClassId, ClassKind, ConstValue, FieldId, FileId, FunId, FunctionKind, IrCall,
    IrClass, IrExpr, IrField, IrFunction, IrParam, IrStatement, IrType, IrVariable, Modality, Module,
    PrimitiveKind, SourceFile, VarId,
};

/// Incrementally assembles a [`Module`].
#[derive(Debug)]
pub struct ModuleBuilder {
    classes: Vec<IrClass>,
    functions: Vec<IrFunction>,
    variables: Vec<IrVariable>,
    fields: Vec<IrField>,
    files: Vec<SourceFile>,
    builtins: BuiltinClasses,
    builtins_file: FileId,
    /// Memoized bodiless operator declarations, keyed by
    /// `(owner class, name, arity)`.
    op_cache: AHashMap<(ClassId, String, usize), FunId>,
}

impl ModuleBuilder {
    /// Creates a builder with the builtin class table fully seeded.
    #[must_use]
    pub fn new() -> Self {
        Seeder::seed()
    }

    /// The seeded builtin class table.
    #[must_use]
    pub fn builtins(&self) -> &BuiltinClasses {
        &self.builtins
    }

    /// Registers a source file for stack-frame formatting.
    pub fn file(&mut self, name: &str) -> FileId {
        let id = FileId::new(self.files.len());
        self.files.push(SourceFile { name: name.to_owned() });
        id
    }

    /// Declares a final class extending the builtin `Any`.
    pub fn add_class(&mut self, name: &str, fq_name: &str) -> ClassId {
        let super_class = Some(self.builtins.any);
        self.push_class(name, fq_name, ClassKind::Class, Modality::Final, super_class)
    }

    /// Mutable access to a class record for follow-up configuration
    /// (modality, data flag, interfaces, enum entries, initializers).
    pub fn class_mut(&mut self, id: ClassId) -> &mut IrClass {
        &mut self.classes[id.index()]
    }

    /// Declares a variable symbol.
    pub fn add_variable(&mut self, name: &str, ty: IrType) -> VarId {
        let id = VarId::new(self.variables.len());
        self.variables.push(IrVariable { name: name.to_owned(), ty });
        id
    }

    /// Declares a backing field on a class.
    pub fn add_field(&mut self, class: ClassId, name: &str, ty: IrType) -> FieldId {
        let id = FieldId::new(self.fields.len());
        self.fields.push(IrField { name: name.to_owned(), ty, owner: class });
        self.classes[class.index()].fields.push(id);
        id
    }

    /// Declares a function. Top-level when `parent` is `None`; member
    /// functions get their dispatch receiver via [`Self::receiver`].
    pub fn add_function(&mut self, parent: Option<ClassId>, name: &str, file: FileId, line: u32) -> FunId {
        let fq_name = match parent {
            Some(class) => format!("{}.{name}", self.classes[class.index()].name),
            None => name.to_owned(),
        };
        let id = FunId::new(self.functions.len());
        self.functions.push(IrFunction {
            name: name.to_owned(),
            fq_name,
            kind: FunctionKind::Function,
            parent,
            dispatch_receiver: None,
            extension_receiver: None,
            params: Vec::new(),
            return_ty: IrType::Unit,
            body: None,
            overridden: Vec::new(),
            modality: Modality::Final,
            is_fake_override: false,
            intrinsic: false,
            file,
            line,
        });
        if let Some(class) = parent {
            self.classes[class.index()].functions.push(id);
        }
        id
    }

    /// Declares a constructor of `class` with its receiver already bound.
    pub fn add_constructor(&mut self, class: ClassId, file: FileId, line: u32) -> FunId {
        let id = self.add_function(Some(class), "<init>", file, line);
        self.functions[id.index()].kind = FunctionKind::Constructor;
        self.functions[id.index()].fq_name = format!("{}.<init>", self.classes[class.index()].name);
        self.receiver(id, class);
        id
    }

    /// Mutable access to a function record.
    pub fn fun_mut(&mut self, id: FunId) -> &mut IrFunction {
        &mut self.functions[id.index()]
    }

    /// Adds a value parameter to a function, optionally with a default.
    pub fn param(&mut self, fun: FunId, name: &str, ty: IrType) -> VarId {
        let var = self.add_variable(name, ty);
        self.functions[fun.index()].params.push(IrParam { var, default: None });
        var
    }

    /// Adds a value parameter carrying a default expression.
    pub fn param_with_default(&mut self, fun: FunId, name: &str, ty: IrType, default: IrExpr) -> VarId {
        let var = self.add_variable(name, ty);
        self.functions[fun.index()].params.push(IrParam { var, default: Some(default) });
        var
    }

    /// Creates a dispatch-receiver symbol (`this`) for a member function.
    pub fn receiver(&mut self, fun: FunId, class: ClassId) -> VarId {
        let var = self.add_variable("<this>", IrType::class(class));
        self.functions[fun.index()].dispatch_receiver = Some(var);
        var
    }

    /// Installs a function body.
    pub fn set_body(&mut self, fun: FunId, body: IrExpr) {
        self.functions[fun.index()].body = Some(body);
    }

    /// A call expression to a declared function.
    #[must_use]
    pub fn call(&self, function: FunId, dispatch_receiver: Option<IrExpr>, args: Vec<IrExpr>) -> IrExpr {
        IrExpr::Call(IrCall {
            function,
            dispatch_receiver: dispatch_receiver.map(Box::new),
            extension_receiver: None,
            args: args.into_iter().map(Some).collect(),
            super_qualifier: None,
            type_args: Vec::new(),
        })
    }

    /// A constructor-call expression.
    #[must_use]
    pub fn construct(&self, ctor: FunId, args: Vec<IrExpr>) -> IrExpr {
        IrExpr::ConstructorCall(IrCall {
            function: ctor,
            dispatch_receiver: None,
            extension_receiver: None,
            args: args.into_iter().map(Some).collect(),
            super_qualifier: None,
            type_args: Vec::new(),
        })
    }

    /// A call to a built-in operation on a primitive receiver, declaring a
    /// memoized bodiless member function on the receiver kind's boxed class.
    ///
    /// `args` pairs each argument expression with its primitive kind, which
    /// becomes the declared parameter type.
    pub fn prim_op(
        &mut self,
        kind: PrimitiveKind,
        name: &str,
        receiver: IrExpr,
        args: Vec<(IrExpr, PrimitiveKind)>,
    ) -> IrExpr {
        let class = self
            .builtins
            .primitive_class(kind)
            .expect("primitive kind has a seeded boxed class");
        let key = (class, name.to_owned(), args.len());
        let fun = if let Some(&fun) = self.op_cache.get(&key) {
            fun
        } else {
            let file = self.builtins_file;
            let fun = self.add_function(Some(class), name, file, 0);
            self.receiver(fun, class);
            for (i, (_, arg_kind)) in args.iter().enumerate() {
                let var = self.add_variable(&format!("arg{i}"), IrType::Primitive(*arg_kind));
                self.functions[fun.index()].params.push(IrParam { var, default: None });
            }
            self.op_cache.insert(key, fun);
            fun
        };
        self.call(fun, Some(receiver), args.into_iter().map(|(e, _)| e).collect())
    }

    /// The seeded top-level `enumValueOf` intrinsic.
    #[must_use]
    pub fn enum_value_of(&self, enum_class: ClassId, name: IrExpr) -> IrExpr {
        IrExpr::Call(IrCall {
            function: self.enum_value_of_fun(),
            dispatch_receiver: None,
            extension_receiver: None,
            args: vec![Some(name)],
            super_qualifier: None,
            type_args: vec![IrType::class(enum_class)],
        })
    }

    /// The `FunId` of the seeded `enumValueOf` intrinsic.
    #[must_use]
    pub fn enum_value_of_fun(&self) -> FunId {
        self.functions
            .iter()
            .position(|f| f.fq_name == "kotlin.enumValueOf")
            .map(FunId::new)
            .expect("enumValueOf is seeded")
    }

    /// Finishes the module.
    #[must_use]
    pub fn build(self) -> Module {
        Module {
            classes: self.classes,
            functions: self.functions,
            variables: self.variables,
            fields: self.fields,
            files: self.files,
            builtins: self.builtins,
        }
    }

    fn push_class(
        &mut self,
        name: &str,
        fq_name: &str,
        kind: ClassKind,
        modality: Modality,
        super_class: Option<ClassId>,
    ) -> ClassId {
        let id = ClassId::new(self.classes.len());
        self.classes.push(IrClass {
            name: name.to_owned(),
            fq_name: fq_name.to_owned(),
            kind,
            modality,
            is_data: false,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            functions: Vec::new(),
            enum_entries: Vec::new(),
            initializers: Vec::new(),
            intrinsic: false,
        });
        id
    }
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal helper that seeds the builtin declarations in a fixed order.
struct Seeder {
    b: ModuleBuilder,
    file: FileId,
}

impl Seeder {
    fn seed() -> ModuleBuilder {
        // Bootstrap with a placeholder builtins table; every id is filled in
        // before the builder is handed out.
        let placeholder = ClassId::new(0);
        let mut b = ModuleBuilder {
            classes: Vec::new(),
            functions: Vec::new(),
            variables: Vec::new(),
            fields: Vec::new(),
            files: vec![SourceFile { name: "Builtins.kt".to_owned() }],
            builtins: BuiltinClasses {
                any: placeholder,
                string: placeholder,
                throwable: placeholder,
                exception: placeholder,
                arithmetic_exception: placeholder,
                class_cast_exception: placeholder,
                illegal_argument_exception: placeholder,
                null_pointer_exception: placeholder,
                no_such_element_exception: placeholder,
                index_out_of_bounds_exception: placeholder,
                unsupported_operation_exception: placeholder,
                stack_overflow_error: placeholder,
                enum_base: placeholder,
                primitives: Vec::new(),
                int_range: placeholder,
                long_range: placeholder,
                char_range: placeholder,
                ubyte: placeholder,
                ushort: placeholder,
                uint: placeholder,
                ulong: placeholder,
                array: placeholder,
                regex: placeholder,
                match_result: placeholder,
            },
            builtins_file: FileId::new(0),
            op_cache: AHashMap::new(),
        };
        let file = b.builtins_file;

        let any = b.push_class("Any", "kotlin.Any", ClassKind::Class, Modality::Open, None);
        b.builtins.any = any;
        // Root constructor: empty body, no delegation.
        let any_ctor = b.add_constructor(any, file, 0);
        b.set_body(any_ctor, IrExpr::unit_block());

        let mut seeder = Self { b, file };
        seeder.primitives();
        seeder.throwables(any_ctor);
        seeder.enum_base(any_ctor);
        seeder.ranges(any_ctor);
        seeder.unsigned(any_ctor);
        seeder.arrays();
        seeder.regex();
        seeder.enum_value_of();
        seeder.b
    }

    fn primitives(&mut self) {
        use PrimitiveKind as K;
        for kind in [K::Boolean, K::Char, K::Byte, K::Short, K::Int, K::Long, K::Float, K::Double, K::String] {
            let name: &'static str = kind.into();
            let fq = format!("kotlin.{name}");
            let id = self.b.push_class(name, &fq, ClassKind::Class, Modality::Final, Some(self.b.builtins.any));
            self.b.builtins.primitives.push((kind, id));
            if kind == K::String {
                self.b.builtins.string = id;
            }
        }
        // Long and Char construction is host-provided: Long from its two
        // 32-bit halves, Char from an integer code.
        let long = self.b.builtins.primitive_class(K::Long).expect("seeded");
        self.b.class_mut(long).intrinsic = true;
        let long_ctor = self.b.add_constructor(long, self.file, 0);
        self.b.param(long_ctor, "high", IrType::Primitive(K::Int));
        self.b.param(long_ctor, "low", IrType::Primitive(K::Int));

        let char_class = self.b.builtins.primitive_class(K::Char).expect("seeded");
        self.b.class_mut(char_class).intrinsic = true;
        let char_ctor = self.b.add_constructor(char_class, self.file, 0);
        self.b.param(char_ctor, "code", IrType::Primitive(K::Int));
    }

    fn throwables(&mut self, any_ctor: FunId) {
        let any = self.b.builtins.any;
        let throwable =
            self.b
                .push_class("Throwable", "kotlin.Throwable", ClassKind::Class, Modality::Open, Some(any));
        self.b.builtins.throwable = throwable;
        let message = self.b.add_field(throwable, "message", IrType::Primitive(PrimitiveKind::String));
        let cause = self.b.add_field(throwable, "cause", IrType::nullable(throwable));
        let ctor = self.b.add_constructor(throwable, self.file, 0);
        let msg = self.b.param_with_default(
            ctor,
            "message",
            IrType::Primitive(PrimitiveKind::String),
            IrExpr::const_of(ConstValue::Null),
        );
        let cause_p = self.b.param_with_default(
            ctor,
            "cause",
            IrType::nullable(throwable),
            IrExpr::const_of(ConstValue::Null),
        );
        let this = self.b.functions[ctor.index()].dispatch_receiver.expect("ctor receiver");
        self.b.set_body(
            ctor,
            IrExpr::Block {
                label: None,
                statements: vec![
                    IrStatement::Expr(delegate(any_ctor, vec![])),
                    IrStatement::Expr(IrExpr::SetField {
                        receiver: Box::new(IrExpr::GetValue { var: this }),
                        field: message,
                        value: Box::new(IrExpr::GetValue { var: msg }),
                    }),
                    IrStatement::Expr(IrExpr::SetField {
                        receiver: Box::new(IrExpr::GetValue { var: this }),
                        field: cause,
                        value: Box::new(IrExpr::GetValue { var: cause_p }),
                    }),
                ],
            },
        );

        let throwable_ctor = self.b.constructor(throwable);
        let exception = self.subthrowable_with_ctor("Exception", "kotlin.Exception", throwable, throwable_ctor);
        self.b.builtins.exception = exception;
        let exc_ctor = self.b.constructor(exception);

        self.b.builtins.arithmetic_exception =
            self.subthrowable_with_ctor("ArithmeticException", "kotlin.ArithmeticException", exception, exc_ctor);
        self.b.builtins.class_cast_exception =
            self.subthrowable_with_ctor("ClassCastException", "kotlin.ClassCastException", exception, exc_ctor);
        self.b.builtins.illegal_argument_exception = self.subthrowable_with_ctor(
            "IllegalArgumentException",
            "kotlin.IllegalArgumentException",
            exception,
            exc_ctor,
        );
        self.b.builtins.null_pointer_exception = self.subthrowable_with_ctor(
            "NullPointerException",
            "kotlin.NullPointerException",
            exception,
            exc_ctor,
        );
        self.b.builtins.no_such_element_exception = self.subthrowable_with_ctor(
            "NoSuchElementException",
            "kotlin.NoSuchElementException",
            exception,
            exc_ctor,
        );
        self.b.builtins.index_out_of_bounds_exception = self.subthrowable_with_ctor(
            "IndexOutOfBoundsException",
            "kotlin.IndexOutOfBoundsException",
            exception,
            exc_ctor,
        );
        self.b.builtins.unsupported_operation_exception = self.subthrowable_with_ctor(
            "UnsupportedOperationException",
            "kotlin.UnsupportedOperationException",
            exception,
            exc_ctor,
        );
        // StackOverflowError sits directly under Throwable, like the JVM's
        // Error branch: `catch (e: Exception)` must not swallow it.
        self.b.builtins.stack_overflow_error = self.subthrowable_with_ctor(
            "StackOverflowError",
            "kotlin.StackOverflowError",
            throwable,
            throwable_ctor,
        );
    }

    /// Declares an open throwable subclass whose constructor delegates its
    /// optional message to the given superclass constructor.
    fn subthrowable_with_ctor(&mut self, name: &str, fq: &str, super_class: ClassId, super_ctor: FunId) -> ClassId {
        let id = self.b.push_class(name, fq, ClassKind::Class, Modality::Open, Some(super_class));
        let ctor = self.b.add_constructor(id, self.file, 0);
        let msg = self.b.param_with_default(
            ctor,
            "message",
            IrType::Primitive(PrimitiveKind::String),
            IrExpr::const_of(ConstValue::Null),
        );
        self.b.set_body(
            ctor,
            IrExpr::Block {
                label: None,
                statements: vec![IrStatement::Expr(delegate(super_ctor, vec![IrExpr::GetValue { var: msg }]))],
            },
        );
        id
    }

    fn enum_base(&mut self, any_ctor: FunId) {
        let id = self.b.push_class(
            "Enum",
            "kotlin.Enum",
            ClassKind::Class,
            Modality::Abstract,
            Some(self.b.builtins.any),
        );
        self.b.builtins.enum_base = id;
        let name_field = self.b.add_field(id, "name", IrType::Primitive(PrimitiveKind::String));
        let ordinal_field = self.b.add_field(id, "ordinal", IrType::Primitive(PrimitiveKind::Int));
        let ctor = self.b.add_constructor(id, self.file, 0);
        let name = self.b.param(ctor, "name", IrType::Primitive(PrimitiveKind::String));
        let ordinal = self.b.param(ctor, "ordinal", IrType::Primitive(PrimitiveKind::Int));
        let this = self.b.functions[ctor.index()].dispatch_receiver.expect("ctor receiver");
        self.b.set_body(
            ctor,
            IrExpr::Block {
                label: None,
                statements: vec![
                    IrStatement::Expr(delegate(any_ctor, vec![])),
                    IrStatement::Expr(IrExpr::SetField {
                        receiver: Box::new(IrExpr::GetValue { var: this }),
                        field: name_field,
                        value: Box::new(IrExpr::GetValue { var: name }),
                    }),
                    IrStatement::Expr(IrExpr::SetField {
                        receiver: Box::new(IrExpr::GetValue { var: this }),
                        field: ordinal_field,
                        value: Box::new(IrExpr::GetValue { var: ordinal }),
                    }),
                ],
            },
        );
    }

    fn ranges(&mut self, any_ctor: FunId) {
        self.b.builtins.int_range = self.range_class("IntRange", "kotlin.ranges.IntRange", PrimitiveKind::Int, any_ctor);
        self.b.builtins.long_range =
            self.range_class("LongRange", "kotlin.ranges.LongRange", PrimitiveKind::Long, any_ctor);
        self.b.builtins.char_range =
            self.range_class("CharRange", "kotlin.ranges.CharRange", PrimitiveKind::Char, any_ctor);
    }

    fn range_class(&mut self, name: &str, fq: &str, kind: PrimitiveKind, any_ctor: FunId) -> ClassId {
        let id = self.b.push_class(name, fq, ClassKind::Class, Modality::Final, Some(self.b.builtins.any));
        let first = self.b.add_field(id, "first", IrType::Primitive(kind));
        let last = self.b.add_field(id, "last", IrType::Primitive(kind));
        let ctor = self.b.add_constructor(id, self.file, 0);
        let first_p = self.b.param(ctor, "start", IrType::Primitive(kind));
        let last_p = self.b.param(ctor, "endInclusive", IrType::Primitive(kind));
        let this = self.b.functions[ctor.index()].dispatch_receiver.expect("ctor receiver");
        self.b.set_body(
            ctor,
            IrExpr::Block {
                label: None,
                statements: vec![
                    IrStatement::Expr(delegate(any_ctor, vec![])),
                    IrStatement::Expr(IrExpr::SetField {
                        receiver: Box::new(IrExpr::GetValue { var: this }),
                        field: first,
                        value: Box::new(IrExpr::GetValue { var: first_p }),
                    }),
                    IrStatement::Expr(IrExpr::SetField {
                        receiver: Box::new(IrExpr::GetValue { var: this }),
                        field: last,
                        value: Box::new(IrExpr::GetValue { var: last_p }),
                    }),
                ],
            },
        );
        id
    }

    fn unsigned(&mut self, any_ctor: FunId) {
        self.b.builtins.ubyte = self.unsigned_class("UByte", "kotlin.UByte", PrimitiveKind::Byte, any_ctor);
        self.b.builtins.ushort = self.unsigned_class("UShort", "kotlin.UShort", PrimitiveKind::Short, any_ctor);
        self.b.builtins.uint = self.unsigned_class("UInt", "kotlin.UInt", PrimitiveKind::Int, any_ctor);
        self.b.builtins.ulong = self.unsigned_class("ULong", "kotlin.ULong", PrimitiveKind::Long, any_ctor);
    }

    fn unsigned_class(&mut self, name: &str, fq: &str, backing: PrimitiveKind, any_ctor: FunId) -> ClassId {
        let id = self.b.push_class(name, fq, ClassKind::Class, Modality::Final, Some(self.b.builtins.any));
        let data = self.b.add_field(id, "data", IrType::Primitive(backing));
        let ctor = self.b.add_constructor(id, self.file, 0);
        let data_p = self.b.param(ctor, "data", IrType::Primitive(backing));
        let this = self.b.functions[ctor.index()].dispatch_receiver.expect("ctor receiver");
        self.b.set_body(
            ctor,
            IrExpr::Block {
                label: None,
                statements: vec![
                    IrStatement::Expr(delegate(any_ctor, vec![])),
                    IrStatement::Expr(IrExpr::SetField {
                        receiver: Box::new(IrExpr::GetValue { var: this }),
                        field: data,
                        value: Box::new(IrExpr::GetValue { var: data_p }),
                    }),
                ],
            },
        );
        id
    }

    fn arrays(&mut self) {
        let object_array = self.array_class("Array", "kotlin.Array");
        self.b.builtins.array = object_array;
        for name in [
            "BooleanArray",
            "CharArray",
            "ByteArray",
            "ShortArray",
            "IntArray",
            "LongArray",
            "FloatArray",
            "DoubleArray",
        ] {
            self.array_class(name, &format!("kotlin.{name}"));
        }
    }

    fn array_class(&mut self, name: &str, fq: &str) -> ClassId {
        let id = self.b.push_class(name, fq, ClassKind::Class, Modality::Final, Some(self.b.builtins.any));
        self.b.class_mut(id).intrinsic = true;
        let ctor = self.b.add_constructor(id, self.file, 0);
        self.b.param(ctor, "size", IrType::Primitive(PrimitiveKind::Int));
        self.b.param_with_default(
            ctor,
            "init",
            IrType::nullable(self.b.builtins.any),
            IrExpr::const_of(ConstValue::Null),
        );
        for (method, arity) in [("get", 1), ("set", 2), ("size", 0)] {
            let fun = self.b.add_function(Some(id), method, self.file, 0);
            self.b.receiver(fun, id);
            self.b.fun_mut(fun).intrinsic = true;
            if arity >= 1 {
                self.b.param(fun, "index", IrType::Primitive(PrimitiveKind::Int));
            }
            if arity >= 2 {
                self.b.param(fun, "value", IrType::nullable(self.b.builtins.any));
            }
        }
        id
    }

    fn regex(&mut self) {
        let id = self.b.push_class(
            "Regex",
            "kotlin.text.Regex",
            ClassKind::Class,
            Modality::Final,
            Some(self.b.builtins.any),
        );
        self.b.class_mut(id).intrinsic = true;
        self.b.builtins.regex = id;
        let ctor = self.b.add_constructor(id, self.file, 0);
        self.b.param(ctor, "pattern", IrType::Primitive(PrimitiveKind::String));

        let string = IrType::Primitive(PrimitiveKind::String);
        for (name, params) in [
            ("matches", vec![("input", string.clone())]),
            ("containsMatchIn", vec![("input", string.clone())]),
            ("find", vec![("input", string.clone())]),
            ("replace", vec![("input", string.clone()), ("replacement", string.clone())]),
            ("split", vec![("input", string.clone())]),
            ("toString", vec![]),
        ] {
            let fun = self.b.add_function(Some(id), name, self.file, 0);
            self.b.receiver(fun, id);
            self.b.fun_mut(fun).intrinsic = true;
            for (pname, pty) in params {
                self.b.param(fun, pname, pty);
            }
        }
        // Companion member, dispatched through the companion singleton.
        let escape = self.b.add_function(Some(id), "escape", self.file, 0);
        self.b.receiver(escape, id);
        self.b.fun_mut(escape).intrinsic = true;
        self.b.param(escape, "literal", string);

        // Match results are host-produced by `find`; the class exists only
        // so call sites can reference its accessors.
        let match_result = self.b.push_class(
            "MatchResult",
            "kotlin.text.MatchResult",
            ClassKind::Class,
            Modality::Final,
            Some(self.b.builtins.any),
        );
        self.b.class_mut(match_result).intrinsic = true;
        self.b.builtins.match_result = match_result;
        for name in ["value", "range", "toString"] {
            let fun = self.b.add_function(Some(match_result), name, self.file, 0);
            self.b.receiver(fun, match_result);
            self.b.fun_mut(fun).intrinsic = true;
        }
    }

    fn enum_value_of(&mut self) {
        let fun = self.b.add_function(None, "enumValueOf", self.file, 0);
        self.b.fun_mut(fun).fq_name = "kotlin.enumValueOf".to_owned();
        self.b.fun_mut(fun).intrinsic = true;
        self.b.param(fun, "name", IrType::Primitive(PrimitiveKind::String));
    }
}

impl ModuleBuilder {
    /// Finds a declared class by fully-qualified name.
    #[must_use]
    pub fn find_class(&self, fq_name: &str) -> Option<ClassId> {
        self.classes.iter().position(|c| c.fq_name == fq_name).map(ClassId::new)
    }

    /// Finds a field by name on a class or any of its superclasses.
    #[must_use]
    pub fn field_id(&self, class: ClassId, name: &str) -> Option<FieldId> {
        let c = &self.classes[class.index()];
        c.fields
            .iter()
            .copied()
            .find(|&f| self.fields[f.index()].name == name)
            .or_else(|| c.super_class.and_then(|sup| self.field_id(sup, name)))
    }

    /// Finds a member function of a class by name.
    #[must_use]
    pub fn find_function(&self, class: ClassId, name: &str) -> Option<FunId> {
        self.classes[class.index()]
            .functions
            .iter()
            .copied()
            .find(|&f| self.functions[f.index()].name == name)
    }

    /// The first declared constructor of a class.
    ///
    /// # Panics
    /// Panics if the class has no constructor; the seeded builtins all do.
    #[must_use]
    pub fn constructor(&self, class: ClassId) -> FunId {
        self.classes[class.index()]
            .functions
            .iter()
            .copied()
            .find(|&f| self.functions[f.index()].kind == FunctionKind::Constructor)
            .expect("class has a constructor")
    }
}

/// A delegating constructor call with every argument supplied.
fn delegate(ctor: FunId, args: Vec<IrExpr>) -> IrExpr {
    IrExpr::DelegatingCall(IrCall {
        function: ctor,
        dispatch_receiver: None,
        extension_receiver: None,
        args: args.into_iter().map(Some).collect(),
        super_qualifier: None,
        type_args: Vec::new(),
    })
}

//! Call evaluation: argument binding, the dispatch cascade, and function
//! body interpretation.
//!
//! Target selection follows a fixed cascade, first match wins: host-wrapped
//! receivers, intrinsic-marked functions, dynamic override resolution
//! (covering abstract methods and fake overrides), the built-in signature
//! tables for bodiless members, and finally the function's own IR body.

use crate::{
    builtins,
    exception::BuiltinExc,
    interp::{
        Evaluator,
        flow::{Flow, InternalError, Interrupt},
    },
    intrinsics,
    ir::{ClassId, ClassKind, FunId, FunctionKind, IrCall, IrType, Modality},
    tracer::EvalTracer,
    value::{Primitive, Value},
};

impl<'a, Tr: EvalTracer> Evaluator<'a, Tr> {
    /// Evaluates a call expression: dispatch receiver first, then the
    /// extension receiver, then each value argument in IR order.
    pub(crate) fn eval_call(&mut self, call: &IrCall) -> Flow {
        let module = self.module;
        let fun = module.function(call.function);

        let dispatch = match &call.dispatch_receiver {
            Some(expr) => Some(self.eval(expr)?),
            None => None,
        };
        let extension = match &call.extension_receiver {
            Some(expr) => Some(self.eval(expr)?),
            None => None,
        };
        let args = self.bind_args(call, call.function, &dispatch, &extension)?;

        // Top-level intrinsics need the call's reified type arguments, which
        // only exist here.
        if fun.intrinsic && fun.parent.is_none() {
            return self.intrinsic_static(call, &args);
        }

        // rangeTo builds the range object through the regular constructor
        // path instead of the builtin tables.
        if fun.name == "rangeTo" && fun.body.is_none()
            && let Some(receiver) = dispatch.as_ref().or(extension.as_ref())
            && let Some(result) = self.try_range_to(receiver, &args)?
        {
            return Ok(result);
        }

        // `super.f()` selects the implementation statically from the named
        // class and re-enters it with the same instance.
        let statically = call.super_qualifier.is_some();
        let target = match call.super_qualifier {
            Some(qualifier) => self
                .find_override_in_chain(qualifier, call.function)
                .unwrap_or(call.function),
            None => call.function,
        };
        self.invoke(target, dispatch, extension, args, statically)
    }

    /// Binds value arguments left to right. Missing arguments evaluate the
    /// parameter's default expression in a sub-frame that already contains
    /// the previously-bound parameters and the callee's receivers.
    pub(crate) fn bind_args(
        &mut self,
        call: &IrCall,
        fun_id: FunId,
        dispatch: &Option<Value>,
        extension: &Option<Value>,
    ) -> Result<Vec<Value>, Interrupt> {
        let module = self.module;
        let fun = module.function(fun_id);

        let mut values: Vec<Option<Value>> = Vec::with_capacity(fun.params.len());
        let mut need_defaults = false;
        for (i, _) in fun.params.iter().enumerate() {
            match call.args.get(i).and_then(Option::as_ref) {
                Some(expr) => values.push(Some(self.eval(expr)?)),
                None => {
                    values.push(None);
                    need_defaults = true;
                }
            }
        }

        if need_defaults {
            self.stack.push_sub_frame();
            if let (Some(var), Some(value)) = (fun.dispatch_receiver, dispatch) {
                self.stack.declare(var, value.clone());
            }
            if let (Some(var), Some(value)) = (fun.extension_receiver, extension) {
                self.stack.declare(var, value.clone());
            }
            for (i, param) in fun.params.iter().enumerate() {
                if let Some(value) = &values[i] {
                    self.stack.declare(param.var, value.clone());
                    continue;
                }
                let Some(default) = &param.default else {
                    self.stack.pop_frame();
                    return Err(Interrupt::Fatal(InternalError::UnsupportedNode(format!(
                        "call to {} missing argument '{}' with no default",
                        fun.fq_name,
                        module.variable(param.var).name
                    ))));
                };
                match self.eval(default) {
                    Ok(value) => {
                        self.stack.declare(param.var, value.clone());
                        values[i] = Some(value);
                    }
                    Err(interrupt) => {
                        self.stack.pop_frame();
                        return Err(interrupt);
                    }
                }
            }
            self.stack.pop_frame();
        }

        Ok(values.into_iter().map(|v| v.expect("all arguments bound")).collect())
    }

    /// The dispatch cascade over an already-selected base function.
    pub(crate) fn invoke(
        &mut self,
        fun_id: FunId,
        dispatch: Option<Value>,
        extension: Option<Value>,
        args: Vec<Value>,
        statically: bool,
    ) -> Flow {
        let module = self.module;
        let fun = module.function(fun_id);

        // 1. Host-wrapped receivers dispatch into the intrinsic tables —
        //    except interface defaults, which evaluate their IR body.
        if let Some(Value::Wrapped(wrapped)) = &dispatch {
            let interface_default = fun
                .parent
                .is_some_and(|c| module.class(c).kind == ClassKind::Interface)
                && fun.body.is_some();
            if !interface_default {
                return intrinsics::call_method(module, wrapped, &fun.name, &args)
                    .map_err(|f| self.fault(f));
            }
        }

        // 2. Remaining intrinsic-marked functions have no host binding for
        //    this receiver shape; the registry must be total.
        if fun.intrinsic {
            return Err(Interrupt::Fatal(InternalError::MissingIntrinsic {
                class: fun
                    .parent
                    .map_or_else(|| "<top-level>".to_owned(), |c| module.class(c).fq_name.clone()),
                member: fun.name.clone(),
            }));
        }

        // Lambda values invoked through their functional-interface method.
        if let Some(Value::Lambda { function, .. }) = &dispatch
            && fun.body.is_none()
        {
            return self.interpret_lambda(*function, args);
        }

        // 3./4. Dynamic dispatch: the runtime class of the receiver selects
        // the concrete override; fake overrides forward to the nearest real
        // implementation or fall back to the ultimate base signature.
        let target = self.select_target(&dispatch, fun_id, statically);
        let fun = module.function(target);

        if fun.body.is_none() {
            if fun.modality == Modality::Abstract {
                return Err(Interrupt::Fatal(InternalError::MissingImplementation {
                    function: fun.fq_name.clone(),
                }));
            }
            // 5. Primitive and other bodiless members use the builtin
            //    signature tables.
            let Some(receiver) = dispatch.as_ref().or(extension.as_ref()) else {
                return Err(Interrupt::Fatal(InternalError::MissingImplementation {
                    function: fun.fq_name.clone(),
                }));
            };
            return builtins::call_builtin(module, &fun.name, receiver, &args)
                .map_err(|f| self.fault(f));
        }

        // 6. Default: evaluate the function's IR body.
        self.interpret_function(target, dispatch, extension, args)
    }

    /// Evaluates a function body in a fresh full frame, with receivers and
    /// arguments rebound to the callee's own symbols.
    pub(crate) fn interpret_function(
        &mut self,
        fun_id: FunId,
        dispatch: Option<Value>,
        extension: Option<Value>,
        args: Vec<Value>,
    ) -> Flow {
        let module = self.module;
        let fun = module.function(fun_id);
        let Some(body) = fun.body.as_ref() else {
            return Err(Interrupt::Fatal(InternalError::MissingImplementation {
                function: fun.fq_name.clone(),
            }));
        };
        self.with_function_frame(fun_id, false, move |ev| {
            if let (Some(var), Some(value)) = (fun.dispatch_receiver, dispatch) {
                ev.stack.declare(var, value);
            }
            if let (Some(var), Some(value)) = (fun.extension_receiver, extension) {
                ev.stack.declare(var, value);
            }
            for (param, value) in fun.params.iter().zip(args) {
                ev.stack.declare(param.var, value);
            }
            ev.eval(body)
        })
    }

    /// Evaluates a lambda body. The body runs in a sub-frame so free
    /// variables resolve through the enclosing frame stack at call time.
    pub(crate) fn interpret_lambda(&mut self, fun_id: FunId, args: Vec<Value>) -> Flow {
        let module = self.module;
        let fun = module.function(fun_id);
        let Some(body) = fun.body.as_ref() else {
            return Err(Interrupt::Fatal(InternalError::MissingImplementation {
                function: fun.fq_name.clone(),
            }));
        };
        self.with_function_frame(fun_id, true, move |ev| {
            for (param, value) in fun.params.iter().zip(args) {
                ev.stack.declare(param.var, value);
            }
            ev.eval(body)
        })
    }

    /// Function-entry bookkeeping shared by bodies, lambdas and
    /// constructors: the depth check against the stack-trace cap, the trace
    /// push/pop on all exit paths, the tracer hooks, and interception of the
    /// function's own `Return` signal.
    ///
    /// This is the evaluator's single suspension point; no work for the call
    /// happens before the checks here.
    pub(crate) fn with_function_frame(
        &mut self,
        fun_id: FunId,
        sub: bool,
        run: impl FnOnce(&mut Self) -> Flow,
    ) -> Flow {
        let module = self.module;
        if self.stack.depth() >= self.limits.max_stack_depth {
            let message = format!("call depth exceeded {}", self.limits.max_stack_depth);
            let exc = self.raise(BuiltinExc::StackOverflowError, Some(message));
            return Err(Interrupt::Exception(exc));
        }
        self.stack.push_trace(module.frame_text(fun_id));
        self.tracer.on_call(&module.function(fun_id).fq_name, self.stack.depth());
        if sub {
            self.stack.push_sub_frame();
        } else {
            self.stack.push_frame();
        }
        self.call_functions.push(fun_id);

        let result = run(&mut *self);

        self.call_functions.pop();
        self.stack.pop_frame();
        self.stack.pop_trace();
        self.tracer.on_return(self.stack.depth());

        match result {
            Err(Interrupt::Return { target, value }) if target == fun_id => Ok(value),
            other => other,
        }
    }

    // === Target selection ===============================================

    /// Picks the concrete implementation for `base` given the receiver's
    /// runtime class (the innermost instance of the super chain).
    fn select_target(&self, dispatch: &Option<Value>, base: FunId, statically: bool) -> FunId {
        let module = self.module;
        let mut chosen = base;
        if !statically
            && let Some(Value::Object(obj)) = dispatch
        {
            let runtime = obj.borrow().class;
            if let Some(found) = self.find_override_in_chain(runtime, base) {
                chosen = found;
            }
        }
        if module.function(chosen).is_fake_override
            && let Some(real) = self.nearest_real(chosen)
        {
            chosen = real;
        }
        chosen
    }

    /// Scans the most-derived class first, walking the super chain, then the
    /// transitive interfaces, for a function overriding `base`.
    pub(crate) fn find_override_in_chain(&self, class: ClassId, base: FunId) -> Option<FunId> {
        let module = self.module;
        let mut current = Some(class);
        while let Some(c) = current {
            let decl = module.class(c);
            for &f in &decl.functions {
                if module.function(f).kind == FunctionKind::Function && module.overrides(f, base) {
                    return Some(f);
                }
            }
            current = decl.super_class;
        }
        self.find_in_interfaces(class, base)
    }

    fn find_in_interfaces(&self, class: ClassId, base: FunId) -> Option<FunId> {
        let module = self.module;
        let mut current = Some(class);
        while let Some(c) = current {
            let decl = module.class(c);
            for &interface in &decl.interfaces {
                for &f in &module.class(interface).functions {
                    let fd = module.function(f);
                    if fd.kind == FunctionKind::Function && fd.body.is_some() && module.overrides(f, base) {
                        return Some(f);
                    }
                }
                if let Some(found) = self.find_in_interfaces(interface, base) {
                    return Some(found);
                }
            }
            current = decl.super_class;
        }
        None
    }

    /// Walks a fake override's `overridden` list to the nearest real
    /// implementation; with no real implementation anywhere, surfaces the
    /// ultimate base so the builtin tables see the base signature.
    fn nearest_real(&self, fake: FunId) -> Option<FunId> {
        let module = self.module;
        let fun = module.function(fake);
        for &overridden in &fun.overridden {
            let decl = module.function(overridden);
            if decl.body.is_some() && !decl.is_fake_override {
                return Some(overridden);
            }
            if decl.is_fake_override
                && let Some(real) = self.nearest_real(overridden)
            {
                return Some(real);
            }
        }
        fun.overridden.first().map(|&o| self.ultimate_base(o))
    }

    fn ultimate_base(&self, fun: FunId) -> FunId {
        match self.module.function(fun).overridden.first() {
            Some(&overridden) => self.ultimate_base(overridden),
            None => fun,
        }
    }

    /// Finds a zero-parameter method with a body by name, most-derived
    /// class first. Used by the stringification path for `toString`.
    pub(crate) fn find_bodied_method(&self, class: ClassId, name: &str) -> Option<FunId> {
        let module = self.module;
        let mut current = Some(class);
        while let Some(c) = current {
            let decl = module.class(c);
            for &f in &decl.functions {
                let fd = module.function(f);
                if fd.name == name
                    && fd.kind == FunctionKind::Function
                    && fd.body.is_some()
                    && fd.params.is_empty()
                {
                    return Some(f);
                }
            }
            current = decl.super_class;
        }
        None
    }

    // === Special cases ==================================================

    /// `rangeTo` synthesizes a constructor call on the range's IR class
    /// with the two endpoints, evaluated through the normal path.
    fn try_range_to(&mut self, receiver: &Value, args: &[Value]) -> Result<Option<Value>, Interrupt> {
        let module = self.module;
        let Value::Primitive(p) = receiver else { return Ok(None) };
        let Some(kind) = p.kind() else { return Ok(None) };
        let Some(range_class) = module.builtins.range_class(kind) else { return Ok(None) };
        let Some(ctor) = module.constructor_of(range_class) else {
            return Err(Interrupt::Fatal(InternalError::MissingImplementation {
                function: format!("{}.<init>", module.class(range_class).fq_name),
            }));
        };
        let end = args.first().cloned().unwrap_or_else(Value::null);
        let value = self.instantiate(range_class, ctor, vec![receiver.clone(), end])?;
        Ok(Some(value))
    }

    /// Static host implementations selected by fully-qualified name.
    fn intrinsic_static(&mut self, call: &IrCall, args: &[Value]) -> Flow {
        let module = self.module;
        let fun = module.function(call.function);
        match fun.fq_name.as_str() {
            "kotlin.enumValueOf" => {
                let Some(IrType::Class { class, .. }) = call.type_args.first() else {
                    return Err(Interrupt::Fatal(InternalError::MissingIntrinsic {
                        class: "<top-level>".to_owned(),
                        member: "enumValueOf without enum type argument".to_owned(),
                    }));
                };
                let Some(Value::Primitive(Primitive::String(name))) = args.first() else {
                    return Err(Interrupt::Fatal(InternalError::MissingIntrinsic {
                        class: "<top-level>".to_owned(),
                        member: "enumValueOf without name argument".to_owned(),
                    }));
                };
                let entry = name.to_string();
                if module.enum_ordinal(*class, &entry).is_some() {
                    self.eval_enum_value(*class, &entry)
                } else {
                    let message =
                        format!("No enum constant {}.{entry}", module.class(*class).fq_name);
                    let exc = self.raise(BuiltinExc::IllegalArgumentException, Some(message));
                    Err(Interrupt::Exception(exc))
                }
            }
            other => Err(Interrupt::Fatal(InternalError::MissingIntrinsic {
                class: "<top-level>".to_owned(),
                member: other.to_owned(),
            })),
        }
    }
}

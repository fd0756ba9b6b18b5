//! Thrown exception values and their rendering.

use strum::{Display, EnumString, IntoStaticStr};

use crate::ir::{BuiltinClasses, ClassId, Module};

/// The well-known exception classes the evaluator itself can raise.
///
/// The string representation is the simple class name, which is also used to
/// project host-side failures back into the source taxonomy by name match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum BuiltinExc {
    Throwable,
    Exception,
    ArithmeticException,
    ClassCastException,
    NullPointerException,
    IllegalArgumentException,
    NoSuchElementException,
    IndexOutOfBoundsException,
    UnsupportedOperationException,
    StackOverflowError,
}

impl BuiltinExc {
    /// Resolves the IR class for this exception kind.
    #[must_use]
    pub fn class_id(self, builtins: &BuiltinClasses) -> ClassId {
        match self {
            Self::Throwable => builtins.throwable,
            Self::Exception => builtins.exception,
            Self::ArithmeticException => builtins.arithmetic_exception,
            Self::ClassCastException => builtins.class_cast_exception,
            Self::NullPointerException => builtins.null_pointer_exception,
            Self::IllegalArgumentException => builtins.illegal_argument_exception,
            Self::NoSuchElementException => builtins.no_such_element_exception,
            Self::IndexOutOfBoundsException => builtins.index_out_of_bounds_exception,
            Self::UnsupportedOperationException => builtins.unsupported_operation_exception,
            Self::StackOverflowError => builtins.stack_overflow_error,
        }
    }

    /// Projects a host failure's simple type name into the source taxonomy,
    /// falling back to `Throwable` for unrecognized names.
    #[must_use]
    pub fn from_simple_name(name: &str) -> Self {
        name.parse().unwrap_or(Self::Throwable)
    }
}

/// A thrown value: exception kind, message, cause chain and the stack trace
/// frozen at the throw site.
#[derive(Debug, Clone)]
pub struct ExceptionValue {
    /// The IR class of the exception.
    pub kind: ClassId,
    pub message: Option<String>,
    pub cause: Option<Box<ExceptionValue>>,
    /// Formatted frame descriptions, innermost first, captured when the
    /// exception was first raised and immutable afterwards.
    pub trace: Vec<String>,
}

impl ExceptionValue {
    /// Creates an exception with an empty trace; the evaluator freezes the
    /// trace at the raise site.
    #[must_use]
    pub fn new(kind: ClassId, message: Option<String>) -> Self {
        Self { kind, message, cause: None, trace: Vec::new() }
    }

    /// Attaches a cause, keeping any existing chain below it.
    #[must_use]
    pub fn with_cause(mut self, cause: ExceptionValue) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Whether this exception would be caught by a handler of `handler` type.
    #[must_use]
    pub fn matches(&self, handler: ClassId, module: &Module) -> bool {
        module.is_subclass(self.kind, handler)
    }

    /// The `ClassName: message` header line.
    #[must_use]
    pub fn header(&self, module: &Module) -> String {
        let name = &module.class(self.kind).fq_name;
        match &self.message {
            Some(msg) => format!("{name}: {msg}"),
            None => name.clone(),
        }
    }

    /// Full rendering: header, one `at` line per frozen frame, and the
    /// cause chain, each cause introduced by `Caused by:`.
    #[must_use]
    pub fn render(&self, module: &Module) -> String {
        let mut out = self.header(module);
        for frame in &self.trace {
            out.push_str("\n\tat ");
            out.push_str(frame);
        }
        if let Some(cause) = &self.cause {
            out.push_str("\nCaused by: ");
            out.push_str(&cause.render(module));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name_projection_falls_back_to_throwable() {
        assert_eq!(BuiltinExc::from_simple_name("ArithmeticException"), BuiltinExc::ArithmeticException);
        assert_eq!(BuiltinExc::from_simple_name("SomethingUnknown"), BuiltinExc::Throwable);
    }

    #[test]
    fn display_matches_simple_name() {
        assert_eq!(BuiltinExc::ClassCastException.to_string(), "ClassCastException");
    }
}

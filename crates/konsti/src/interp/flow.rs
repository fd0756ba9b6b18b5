//! The control-flow signal returned from every evaluation step.
//!
//! Every step produces `Result<Value, Interrupt>`: `Ok` is the Next signal
//! carrying the step's value, and [`Interrupt`] carries every non-Next
//! label with its payload. The `?` operator is the run-then-check
//! combinator — a child's non-Next signal propagates to the caller
//! unchanged. `BreakWhen` never escapes the branch scan of a `when`
//! expression; `Exception` propagates until a matching catch intercepts it
//! or the outermost frame is unwound. `Fatal` signals are interpreter
//! errors that no catch can observe.

use std::fmt;

use crate::{
    exception::{BuiltinExc, ExceptionValue},
    ir::FunId,
    value::Value,
};

/// Result of one evaluation step.
pub(crate) type Flow = Result<Value, Interrupt>;

/// A non-Next control-flow signal.
#[derive(Debug)]
pub(crate) enum Interrupt {
    /// `return` unwinding to the body of `target`, carrying the value.
    Return { target: FunId, value: Value },
    /// `break` unwinding to the matching (optionally labeled) loop.
    Break { label: Option<String> },
    /// `continue` unwinding to the matching (optionally labeled) loop.
    Continue { label: Option<String> },
    /// Internal signal ending the branch scan of a `when` expression,
    /// carrying the selected branch's value.
    BreakWhen { value: Value },
    /// A source-language exception in flight.
    Exception(ExceptionValue),
    /// An interpreter error; surfaces directly as an IR error node.
    Fatal(InternalError),
}

impl Interrupt {
    /// Whether a `break`/`continue` label matches a loop's label.
    ///
    /// An unlabeled jump matches any loop; a labeled jump only the loop
    /// carrying the same label.
    pub fn label_matches(label: Option<&String>, loop_label: Option<&String>) -> bool {
        match label {
            None => true,
            Some(l) => loop_label == Some(l),
        }
    }
}

/// Interpreter internal errors: the evaluator cannot proceed.
///
/// These are not catchable from evaluated code and always carry enough
/// context to debug the interpreter itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    /// An IR node shape the walker does not evaluate.
    UnsupportedNode(String),
    /// No host binding registered for a member of an intrinsic class.
    MissingIntrinsic { class: String, member: String },
    /// No concrete implementation found for a function.
    MissingImplementation { function: String },
    /// A built-in was invoked with an unsupported name/signature.
    MissingBuiltin { name: String, signature: String },
    /// A variable was read without a visible binding (malformed IR).
    UnboundVariable { name: String },
    /// The command budget was exhausted.
    TimeOut { limit: usize },
    /// The evaluated value cannot be materialized as an IR constant.
    NotAConstant { type_name: String },
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedNode(node) => write!(f, "unsupported IR node: {node}"),
            Self::MissingIntrinsic { class, member } => {
                write!(f, "missing intrinsic binding for {class}.{member}")
            }
            Self::MissingImplementation { function } => {
                write!(f, "no concrete implementation for {function}")
            }
            Self::MissingBuiltin { name, signature } => {
                write!(f, "no built-in operation {name}({signature})")
            }
            Self::UnboundVariable { name } => write!(f, "unbound variable '{name}'"),
            Self::TimeOut { limit } => write!(f, "command budget exhausted after {limit} steps"),
            Self::NotAConstant { type_name } => {
                write!(f, "result of type {type_name} is not a compile-time constant")
            }
        }
    }
}

impl std::error::Error for InternalError {}

/// Failure reported by built-ins and intrinsics, which have no access to
/// the frame stack. The walker lifts `Exc` into a trace-frozen
/// [`Interrupt::Exception`] at the raise site and `Internal` into
/// [`Interrupt::Fatal`].
#[derive(Debug)]
pub(crate) enum EvalFault {
    Exc { kind: BuiltinExc, message: String },
    Internal(InternalError),
}

impl EvalFault {
    pub fn exc(kind: BuiltinExc, message: impl Into<String>) -> Self {
        Self::Exc { kind, message: message.into() }
    }
}

impl From<InternalError> for EvalFault {
    fn from(err: InternalError) -> Self {
        Self::Internal(err)
    }
}

#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "numeric narrowing mirrors the source language")]
#![expect(clippy::cast_sign_loss, reason = "sign-changing casts back unsigned wrappers")]
#![expect(clippy::cast_possible_wrap, reason = "wrap behavior mirrors the source language")]

mod builtins;
mod exception;
mod frame;
mod interp;
mod intrinsics;
pub mod ir;
mod limits;
mod tracer;
mod value;

pub use crate::{
    exception::{BuiltinExc, ExceptionValue},
    interp::{Evaluator, flow::InternalError},
    intrinsics::array::ArrayBuffer,
    intrinsics::regex_mod::{CompiledRegex, RegexMatch},
    limits::{DEFAULT_MAX_COMMANDS, DEFAULT_MAX_STACK_DEPTH, EvalLimits},
    tracer::{EvalTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
    value::{Instance, ObjRef, Primitive, Value, Wrapped},
};

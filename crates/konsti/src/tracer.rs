//! Evaluation tracing infrastructure.
//!
//! A trait-based tracing system with zero-cost abstraction: the evaluator
//! carries the tracer as a type parameter, so with [`NoopTracer`] every hook
//! compiles away through monomorphization. Implementations override only the
//! hooks they care about.

/// Trace event emitted during evaluation.
///
/// Used by [`RecordingTracer`] to capture a full event log for post-mortem
/// inspection of a fold attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A function body was entered.
    Call {
        /// Fully-qualified function name.
        name: String,
        /// Call depth after the push.
        depth: usize,
    },
    /// A function body was exited (on any path).
    Return {
        /// Call depth after the pop.
        depth: usize,
    },
    /// An exception was raised.
    Raise {
        /// Simple class name of the exception.
        class: String,
        message: Option<String>,
    },
    /// An enum entry was constructed and interned.
    EnumIntern {
        class: String,
        entry: String,
    },
}

/// Hook points for observing one evaluation.
///
/// All methods have default no-op bodies; [`NoopTracer`] adds nothing and
/// costs nothing.
pub trait EvalTracer: std::fmt::Debug {
    /// Called at the single suspension point, before a function body runs.
    #[inline(always)]
    fn on_call(&mut self, _name: &str, _depth: usize) {}

    /// Called when a function body is exited on any path.
    #[inline(always)]
    fn on_return(&mut self, _depth: usize) {}

    /// Called when an exception value is first raised.
    #[inline(always)]
    fn on_raise(&mut self, _class: &str, _message: Option<&str>) {}

    /// Called when an enum entry is constructed and interned.
    #[inline(always)]
    fn on_enum_intern(&mut self, _class: &str, _entry: &str) {}
}

/// Zero-cost tracer; the production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Human-readable execution log on stderr, for debugging fold attempts.
#[derive(Debug, Default)]
pub struct StderrTracer;

impl EvalTracer for StderrTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        eprintln!("{:depth$}-> {name}", "");
    }

    fn on_return(&mut self, depth: usize) {
        eprintln!("{:depth$}<-", "");
    }

    fn on_raise(&mut self, class: &str, message: Option<&str>) {
        eprintln!("!! {class}: {}", message.unwrap_or(""));
    }

    fn on_enum_intern(&mut self, class: &str, entry: &str) {
        eprintln!("== intern {class}.{entry}");
    }
}

/// Records every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events, in order.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }
}

impl EvalTracer for RecordingTracer {
    fn on_call(&mut self, name: &str, depth: usize) {
        self.events.push(TraceEvent::Call { name: name.to_owned(), depth });
    }

    fn on_return(&mut self, depth: usize) {
        self.events.push(TraceEvent::Return { depth });
    }

    fn on_raise(&mut self, class: &str, message: Option<&str>) {
        self.events.push(TraceEvent::Raise {
            class: class.to_owned(),
            message: message.map(ToOwned::to_owned),
        });
    }

    fn on_enum_intern(&mut self, class: &str, entry: &str) {
        self.events.push(TraceEvent::EnumIntern { class: class.to_owned(), entry: entry.to_owned() });
    }
}

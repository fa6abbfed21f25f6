#![forbid(unsafe_code)]

//! Warning sink for listener-leak diagnostics.
//!
//! The reactive primitives never log on their own; they report through an
//! injected [`WarnSink`] capability. The default sink routes to `tracing`,
//! and [`MemoryWarnSink`] captures messages for assertions in tests.

use std::cell::RefCell;

/// Receiver for diagnostic warnings emitted by reactive primitives.
///
/// Implementations must not call back into the observable that emitted the
/// warning; a warning is observational only and never alters state.
pub trait WarnSink {
    /// Report a single warning message.
    fn warn(&self, message: &str);
}

/// Default sink: forwards warnings to `tracing::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWarnSink;

impl WarnSink for TracingWarnSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "weft::reactive", "{message}");
    }
}

/// Capturing sink that stores messages in memory.
#[derive(Debug, Default)]
pub struct MemoryWarnSink {
    messages: RefCell<Vec<String>>,
}

impl MemoryWarnSink {
    /// Create an empty capturing sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured messages, in emission order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Number of captured messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    /// True when nothing has been captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}

impl WarnSink for MemoryWarnSink {
    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::trace::StackFrame;

/// One intercepted command invocation.
/// This is the "write" side: the interceptor creates these the instant a
/// command is issued and hands them off to whoever is listening.
#[derive(Debug, Clone, Serialize)]
pub struct Call {
    /// Command name exactly as issued, e.g. "HGETALL"
    pub function: String,
    /// The primary key the command targets; empty when the command takes none
    pub key: String,
    /// Human-readable rendering of the remaining arguments
    pub args: String,
    /// Rendered reply, filled in only if the underlying call succeeded
    pub return_value: Option<String>,
    /// Call-site stack captured at issue time; empty when capture is disabled
    pub trace: Vec<StackFrame>,
    /// Display string for `trace`, rendered once at recording time
    pub trace_rendered: Option<String>,
}

/// One grouped execution: a pipeline of commands timed as a single unit,
/// or a singleton wrapping a lone command.
#[derive(Debug, Clone, Serialize)]
pub struct CallBatch {
    /// Wall-clock time the batch was issued
    pub started_at: DateTime<Utc>,
    /// Elapsed time for the whole batch, bracketing exactly the delegated call
    pub duration_ms: f64,
    /// Calls in command-issue order; one per queued command
    pub calls: Vec<Call>,
}

impl CallBatch {
    /// Number of calls in this batch.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

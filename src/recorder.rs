use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::calls::CallBatch;
use crate::events::{CallEvent, CallListener};
use crate::report::PanelContent;
use crate::trace::render_stacktrace;

/// Totals for the one-line navigation label.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PanelSummary {
    pub calls: usize,
    pub duration_ms: f64,
}

impl PanelSummary {
    /// `"1 call in 0.52ms"` / `"3 calls in 1.94ms"`.
    pub fn label(&self) -> String {
        let noun = if self.calls == 1 { "call" } else { "calls" };
        format!("{} {} in {:.2}ms", self.calls, noun, self.duration_ms)
    }
}

/// Request-scoped accumulator of tracked calls.
///
/// Create one per request, subscribe it to the tracking client for that
/// request, and drop it when the response has been rendered. The inner
/// mutex exists so the recorder can sit behind an `Arc` as a listener;
/// sharing one recorder across concurrent requests is not supported and
/// would interleave unrelated calls into one report.
pub struct CallRecorder {
    id: Uuid,
    inner: Mutex<Inner>,
}

struct Inner {
    batches: Vec<CallBatch>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Mutex::new(Inner {
                batches: Vec::new(),
            }),
        }
    }

    /// Identifies this recorder's request scope in log output.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Panel display name.
    pub fn title(&self) -> &'static str {
        "Redis"
    }

    /// Append one event. Lone commands are wrapped into a singleton batch;
    /// each call's raw trace is rendered into its display string here,
    /// exactly once.
    pub fn record(&self, event: &CallEvent) {
        let mut batch = match event {
            CallEvent::Command {
                call,
                started_at,
                duration_ms,
            } => CallBatch {
                started_at: *started_at,
                duration_ms: *duration_ms,
                calls: vec![call.clone()],
            },
            CallEvent::Pipeline { batch } => batch.clone(),
        };

        for call in &mut batch.calls {
            if call.trace_rendered.is_none() && !call.trace.is_empty() {
                call.trace_rendered = Some(render_stacktrace(&call.trace));
            }
        }

        tracing::trace!(recorder = %self.id, calls = batch.len(), "recorded batch");
        self.inner.lock().batches.push(batch);
    }

    /// Total call count and duration across everything recorded so far.
    pub fn summary(&self) -> PanelSummary {
        let inner = self.inner.lock();
        PanelSummary {
            calls: inner.batches.iter().map(CallBatch::len).sum(),
            duration_ms: inner.batches.iter().map(|b| b.duration_ms).sum(),
        }
    }

    /// The navigation label, e.g. `"3 calls in 1.94ms"`.
    pub fn nav_subtitle(&self) -> String {
        self.summary().label()
    }

    /// Snapshot of the accumulated batches, in arrival order.
    pub fn batches(&self) -> Vec<CallBatch> {
        self.inner.lock().batches.clone()
    }

    /// Build the two-part report over everything recorded so far.
    pub fn content(&self) -> PanelContent {
        PanelContent::from_batches(&self.inner.lock().batches)
    }

    /// Wipe all recorded state.
    pub fn reset(&self) {
        self.inner.lock().batches.clear();
    }
}

impl Default for CallRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CallListener for CallRecorder {
    fn on_event(&self, event: &CallEvent) {
        self.record(event);
    }
}

impl std::fmt::Debug for CallRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallRecorder")
            .field("id", &self.id)
            .field("batches", &self.inner.lock().batches.len())
            .finish()
    }
}

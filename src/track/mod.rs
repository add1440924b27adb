//! Command and pipeline interception.
//!
//! [`TrackingClient`] wraps whatever actually talks to the store behind the
//! [`CommandExecutor`] seam. Interception is a pure observation tap: the
//! wrapped call's reply or error always reaches the caller verbatim, the
//! timestamps bracket exactly the delegated call, and one event fires per
//! execution whether it succeeded or not.

pub mod pipeline;

pub use pipeline::TrackedPipeline;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use redis::{RedisResult, Value};

use crate::calls::{Call, CallBatch};
use crate::config::PanelConfig;
use crate::events::{CallDispatcher, CallEvent, CallListener};
use crate::trace::{capture_stack, StackFrame};

/// One command waiting to be executed: name plus positional arguments.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// The delegation seam: whatever can run one command, or a queued batch of
/// them, against the underlying store.
///
/// The tracking layer composes by holding one of these rather than
/// inheriting from a client type, so any executor (the bundled Redis one,
/// or a scripted stand-in under test) can sit underneath.
pub trait CommandExecutor {
    /// Run a single command and return its raw reply.
    fn run_command(&mut self, command: &QueuedCommand) -> RedisResult<Value>;

    /// Run the queued commands as one pipeline, returning one reply per
    /// command in issue order.
    fn run_pipeline(&mut self, commands: &[QueuedCommand]) -> RedisResult<Vec<Value>>;
}

// ─── Reply formatting ────────────────────────────────────────────

/// Renders a raw reply the way redis-cli would print it.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Okay => "OK".to_string(),
        Value::Int(n) => n.to_string(),
        Value::Status(status) => status.clone(),
        Value::Data(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Bulk(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(", "))
        }
    }
}

// ─── Tracking client ─────────────────────────────────────────────

/// Instrumented front for a store executor.
///
/// Every command issued through this type is timed and broadcast to the
/// registered listeners; the underlying result is returned unchanged.
pub struct TrackingClient<E> {
    executor: E,
    config: PanelConfig,
    dispatcher: CallDispatcher,
}

impl<E: CommandExecutor> TrackingClient<E> {
    pub fn new(executor: E, config: PanelConfig) -> Self {
        Self {
            executor,
            config,
            dispatcher: CallDispatcher::new(),
        }
    }

    /// Register a listener for every event this client emits.
    pub fn subscribe(&self, listener: Arc<dyn CallListener>) {
        self.dispatcher.subscribe(listener);
    }

    pub fn dispatcher(&self) -> &CallDispatcher {
        &self.dispatcher
    }

    /// Unwrap the client, dropping the instrumentation.
    pub fn into_inner(self) -> E {
        self.executor
    }

    /// Execute one command, e.g. `execute_command("SET", &["key", "value"])`.
    ///
    /// Returns exactly what the underlying executor returned. The emitted
    /// event carries a `return_value` only when the call succeeded.
    pub fn execute_command(&mut self, name: &str, args: &[&str]) -> RedisResult<Value> {
        let command = QueuedCommand {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        };
        let mut call = synthesize_call(&command, self.capture_trace());

        let started_at = Utc::now();
        let started = Instant::now();
        let result = self.executor.run_command(&command);
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Ok(value) = &result {
            call.return_value = Some(format_value(value));
        }
        self.dispatcher.emit(&CallEvent::Command {
            call,
            started_at,
            duration_ms,
        });
        tracing::trace!(command = name, duration_ms, "tracked command");

        result
    }

    /// Execute a queued pipeline as one unit.
    ///
    /// One call is synthesized per queued command up front, all sharing the
    /// batch's single captured trace; per-command replies are assigned by
    /// position once the pipeline returns. An empty pipeline is a no-op.
    pub fn execute_pipeline(&mut self, pipeline: &TrackedPipeline) -> RedisResult<Vec<Value>> {
        if pipeline.is_empty() {
            return Ok(Vec::new());
        }

        let trace = self.capture_trace();
        let mut calls: Vec<Call> = pipeline
            .commands()
            .iter()
            .map(|command| synthesize_call(command, trace.clone()))
            .collect();

        let started_at = Utc::now();
        let started = Instant::now();
        let result = self.executor.run_pipeline(pipeline.commands());
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Ok(values) = &result {
            for (call, value) in calls.iter_mut().zip(values) {
                call.return_value = Some(format_value(value));
            }
        }
        self.dispatcher.emit(&CallEvent::Pipeline {
            batch: CallBatch {
                started_at,
                duration_ms,
                calls,
            },
        });
        tracing::trace!(commands = pipeline.len(), duration_ms, "tracked pipeline");

        result
    }

    fn capture_trace(&self) -> Vec<StackFrame> {
        if self.config.enable_stacktraces {
            capture_stack(self.config.skip_frames)
        } else {
            Vec::new()
        }
    }
}

impl<E> std::fmt::Debug for TrackingClient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingClient")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

/// Builds the issue-time record for one command. The first positional
/// argument is the key; the rest render into the display args string.
fn synthesize_call(command: &QueuedCommand, trace: Vec<StackFrame>) -> Call {
    Call {
        function: command.name.clone(),
        key: command.args.first().cloned().unwrap_or_default(),
        args: command.args.iter().skip(1).cloned().collect::<Vec<_>>().join(" "),
        return_value: None,
        trace,
        trace_rendered: None,
    }
}

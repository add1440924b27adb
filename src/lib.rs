//! Tracked Redis instrumentation for a per-request debug panel.
//!
//! Wraps whatever executes Redis commands so every command, and every
//! pipelined batch of commands, is timed and recorded with its arguments,
//! reply, and an optional call-site stack trace. The pieces:
//!
//! - [`TrackingClient`]: intercepts single commands and pipelines
//! - [`CallRecorder`]: request-scoped accumulator with summary totals
//! - [`PanelContent`]: per-command counts plus the detailed call table
//!
//! Interception never changes what the wrapped call returns or raises; it
//! only observes. Create one [`CallRecorder`] per request, subscribe it,
//! and read it back when the response is rendered.
//!
//! ```no_run
//! use std::sync::Arc;
//! use redis_debug_panel::{CallRecorder, PanelConfig, TrackedPipeline, TrackingClient};
//!
//! fn main() -> redis::RedisResult<()> {
//!     let executor = redis_debug_panel::connect("redis://127.0.0.1:6379/")?;
//!     let mut client = TrackingClient::new(executor, PanelConfig::default());
//!
//!     let recorder = Arc::new(CallRecorder::new());
//!     client.subscribe(recorder.clone());
//!
//!     client.execute_command("SET", &["greeting", "hello"])?;
//!     client.execute_command("GET", &["greeting"])?;
//!
//!     let mut pipe = TrackedPipeline::new();
//!     pipe.cmd("SET").arg("counter").arg(1).cmd("INCR").arg("counter");
//!     client.execute_pipeline(&pipe)?;
//!
//!     println!("{}", recorder.nav_subtitle());
//!     println!("{}", recorder.content().render_text());
//!     Ok(())
//! }
//! ```

pub mod calls;
pub mod config;
pub mod events;
pub mod recorder;
pub mod redis_client;
pub mod report;
pub mod trace;
pub mod track;

pub use calls::{Call, CallBatch};
pub use config::PanelConfig;
pub use events::{CallDispatcher, CallEvent, CallListener, LoggingListener};
pub use recorder::{CallRecorder, PanelSummary};
pub use redis_client::{connect, RedisExecutor};
pub use report::{command_counts, BatchGroup, CallRow, PanelContent};
pub use trace::{capture_stack, render_stacktrace, StackFrame};
pub use track::{format_value, CommandExecutor, QueuedCommand, TrackedPipeline, TrackingClient};

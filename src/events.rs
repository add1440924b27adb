//! Call events and their best-effort broadcast to registered listeners.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::calls::{Call, CallBatch};

/// Event emitted for every tracked command execution.
#[derive(Debug, Clone)]
pub enum CallEvent {
    /// A single command ran on its own.
    Command {
        call: Call,
        started_at: DateTime<Utc>,
        duration_ms: f64,
    },
    /// A pipeline of queued commands ran as one unit.
    Pipeline { batch: CallBatch },
}

impl CallEvent {
    /// Total number of calls carried by this event.
    pub fn call_count(&self) -> usize {
        match self {
            CallEvent::Command { .. } => 1,
            CallEvent::Pipeline { batch } => batch.len(),
        }
    }
}

/// Listener for tracked-call events.
pub trait CallListener: Send + Sync {
    fn on_event(&self, event: &CallEvent);
}

/// A listener that logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct LoggingListener;

impl LoggingListener {
    pub fn new() -> Self {
        Self
    }
}

impl CallListener for LoggingListener {
    fn on_event(&self, event: &CallEvent) {
        match event {
            CallEvent::Command {
                call, duration_ms, ..
            } => {
                tracing::debug!(
                    command = %call.function,
                    key = %call.key,
                    duration_ms,
                    ok = call.return_value.is_some(),
                    "redis command"
                );
            }
            CallEvent::Pipeline { batch } => {
                tracing::debug!(
                    commands = batch.len(),
                    duration_ms = batch.duration_ms,
                    "redis pipeline"
                );
            }
        }
    }
}

/// Broadcasts events to registered listeners.
///
/// Delivery is send-and-don't-fail: a listener that panics is caught and
/// logged, and neither the call site nor the remaining listeners ever see
/// the failure.
#[derive(Default)]
pub struct CallDispatcher {
    listeners: RwLock<Vec<Arc<dyn CallListener>>>,
}

impl CallDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for the lifetime of this dispatcher.
    pub fn subscribe(&self, listener: Arc<dyn CallListener>) {
        self.listeners.write().push(listener);
    }

    /// Drop all registered listeners.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Deliver `event` to every listener, best-effort.
    pub fn emit(&self, event: &CallEvent) {
        let listeners = self.listeners.read();
        for listener in listeners.iter() {
            let delivery = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if delivery.is_err() {
                tracing::warn!(
                    calls = event.call_count(),
                    "call listener panicked; event dropped for this listener"
                );
            }
        }
    }
}

impl std::fmt::Debug for CallDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallDispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Collecting {
        seen: Mutex<Vec<usize>>,
    }

    impl Collecting {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl CallListener for Collecting {
        fn on_event(&self, event: &CallEvent) {
            self.seen.lock().push(event.call_count());
        }
    }

    struct Panicking;

    impl CallListener for Panicking {
        fn on_event(&self, _event: &CallEvent) {
            panic!("listener bug");
        }
    }

    fn command_event() -> CallEvent {
        CallEvent::Command {
            call: Call {
                function: "GET".into(),
                key: "k".into(),
                args: String::new(),
                return_value: Some("v".into()),
                trace: Vec::new(),
                trace_rendered: None,
            },
            started_at: Utc::now(),
            duration_ms: 0.5,
        }
    }

    #[test]
    fn delivers_to_every_listener() {
        let dispatcher = CallDispatcher::new();
        let first = Arc::new(Collecting::new());
        let second = Arc::new(Collecting::new());
        dispatcher.subscribe(first.clone());
        dispatcher.subscribe(second.clone());

        dispatcher.emit(&command_event());

        assert_eq!(*first.seen.lock(), vec![1]);
        assert_eq!(*second.seen.lock(), vec![1]);
    }

    #[test]
    fn panicking_listener_does_not_block_later_listeners() {
        let dispatcher = CallDispatcher::new();
        let collecting = Arc::new(Collecting::new());
        dispatcher.subscribe(Arc::new(Panicking));
        dispatcher.subscribe(collecting.clone());

        dispatcher.emit(&command_event());

        assert_eq!(collecting.seen.lock().len(), 1);
    }

    #[test]
    fn clear_removes_listeners() {
        let dispatcher = CallDispatcher::new();
        dispatcher.subscribe(Arc::new(Collecting::new()));
        assert_eq!(dispatcher.listener_count(), 1);

        dispatcher.clear();
        assert_eq!(dispatcher.listener_count(), 0);
    }
}

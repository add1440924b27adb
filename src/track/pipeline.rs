use super::QueuedCommand;

/// Client-side queue of commands to execute as one pipeline.
///
/// Mirrors the `cmd(..).arg(..)` builder of `redis::Pipeline`; nothing is
/// sent until the queue is handed to
/// [`TrackingClient::execute_pipeline`](super::TrackingClient::execute_pipeline).
#[derive(Debug, Clone, Default)]
pub struct TrackedPipeline {
    commands: Vec<QueuedCommand>,
}

impl TrackedPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start queueing a new command.
    pub fn cmd(&mut self, name: &str) -> &mut Self {
        self.commands.push(QueuedCommand {
            name: name.to_string(),
            args: Vec::new(),
        });
        self
    }

    /// Append an argument to the command started by the last `cmd` call.
    /// A no-op when no command has been started yet.
    pub fn arg(&mut self, arg: impl ToString) -> &mut Self {
        if let Some(command) = self.commands.last_mut() {
            command.args.push(arg.to_string());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn commands(&self) -> &[QueuedCommand] {
        &self.commands
    }
}

use serde::Deserialize;

/// Host-provided panel configuration.
///
/// Deserializes from whatever configuration document the host application
/// carries; every field falls back to its default when absent, so an empty
/// document is a valid configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    /// Capture a call-site stack trace for every tracked command.
    #[serde(default = "default_enable_stacktraces")]
    pub enable_stacktraces: bool,

    /// How many leading stack frames belong to the tracking wrapper itself
    /// and should be discarded so the trace starts at the caller.
    ///
    /// The default covers this crate's own two wrapper layers. Raise it if
    /// you put additional layers of your own between application code and
    /// [`TrackingClient`](crate::TrackingClient).
    #[serde(default = "default_skip_frames")]
    pub skip_frames: usize,
}

fn default_enable_stacktraces() -> bool {
    true
}
fn default_skip_frames() -> usize {
    2
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enable_stacktraces: default_enable_stacktraces(),
            skip_frames: default_skip_frames(),
        }
    }
}

impl PanelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle stack-trace capture.
    pub fn with_stacktraces(mut self, enabled: bool) -> Self {
        self.enable_stacktraces = enabled;
        self
    }

    /// Set the number of wrapper frames to discard from captured traces.
    pub fn with_skip_frames(mut self, frames: usize) -> Self {
        self.skip_frames = frames;
        self
    }
}

//! Host-side display collaborator.

/// The console the commands are typed into.
///
/// Both methods must return promptly: `print` enqueues onto the host's own
/// task queue and does not wait for the text to render.
pub trait ConsoleHost: Send + Sync {
    /// Queues one chunk of text for display.
    fn print(&self, text: String);

    /// Asks the host to dismiss its input surface.
    fn close_input(&self);
}

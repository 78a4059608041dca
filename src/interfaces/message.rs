//! Message/notification surface contract.

/// Text output shown to the player. The engine only enqueues lines and
/// asks whether a message is on screen (which suspends ATB).
pub trait MessageSurface {
    /// Enqueue one line of battle text.
    fn push_line(&mut self, line: &str);

    /// A message window is currently visible.
    fn is_message_visible(&self) -> bool;
}

//! Diagnostics sink abstraction.
//!
//! The snapshot engine never touches global logger state; whoever constructs
//! a [`Snapshotter`](crate::snapshot::Snapshotter) hands it a sink and decides
//! where the messages go (a tracing subscriber, a host-plugin logger, or
//! nowhere at all).

/// Receives low-level progress messages from a snapshot pass.
///
/// Implementations must be cheap: the engine emits a handful of messages per
/// tick and never buffers them.
pub trait Diagnostics: Send + Sync {
    /// Finest-grained progress message (one per pass stage).
    fn trace(&self, message: &str);

    /// Coarser progress message (one per device or partition).
    fn debug(&self, message: &str);
}

/// Sink that discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn trace(&self, _message: &str) {}

    fn debug(&self, _message: &str) {}
}

//! Progress delivery for research runs.
//!
//! The orchestrator pushes [`ProgressEvent`]s through a caller-supplied
//! sink. Delivery is fire-and-forget: a sink must never block the research
//! loop, and a broken or slow sink degrades to "no progress observed",
//! never a failed run.

use tokio::sync::mpsc;

use crate::types::events::ProgressEvent;

/// Single-consumer notification sink for research progress.
pub trait ProgressSink: Send + Sync {
    /// Deliver one event. Must not block and must not fail the caller.
    fn notify(&self, event: ProgressEvent);
}

/// Sink backed by a bounded tokio channel.
///
/// Events are delivered with `try_send`: when the consumer is slower than
/// the producer or has gone away, events are dropped rather than queued
/// without bound or blocking the loop.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    /// Create a sink and its receiving half with the given buffer capacity.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Wrap an existing sender.
    pub fn from_sender(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn notify(&self, event: ProgressEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::debug!(error = %e, "Progress event dropped");
        }
    }
}

/// Sink wrapping a plain closure.
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    /// Wrap a closure as a sink.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn notify(&self, event: ProgressEvent) {
        (self.0)(event);
    }
}

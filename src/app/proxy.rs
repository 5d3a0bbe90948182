//! Defines an abstraction over the event sending mechanism.

use super::events::TreeEvent;
use tokio::sync::mpsc::UnboundedSender;

/// A trait that abstracts the sending of tree events to the host.
/// This is "fire-and-forget" and doesn't return a result, simplifying its use.
pub trait EventProxy: Send + Sync + Clone + 'static {
    fn send_event(&self, event: TreeEvent);
}

/// Hosts that consume events on another task use an unbounded channel.
impl EventProxy for UnboundedSender<TreeEvent> {
    fn send_event(&self, event: TreeEvent) {
        // A closed receiver means the host is gone; there is nothing to refresh.
        if let Err(e) = self.send(event) {
            tracing::warn!("Failed to send event to host: {}", e);
        }
    }
}

/// A proxy for hosts without a live display, such as the command line.
/// Informational messages are logged; refresh signals are counted only.
#[derive(Debug, Clone, Default)]
pub struct LoggingProxy;

impl EventProxy for LoggingProxy {
    fn send_event(&self, event: TreeEvent) {
        match event {
            TreeEvent::Refresh => tracing::debug!("Tree refresh requested"),
            TreeEvent::Info(message) => tracing::info!("{}", message),
        }
    }
}

//! Violation reporting.
//!
//! Every denial (or would-be denial, in report-only mode) is mirrored as a
//! single log line and forwarded to whatever sink the host registered.
//! Delivery is best-effort: checks run on the document's thread and must
//! never block on, or fail because of, the notification path.

use std::sync::mpsc::{channel, Receiver, Sender};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The notification emitted when a policy call finds reflected content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViolationReport {
    /// Which policy was violated ("Inline Script", "External Script", ...).
    pub policy: String,
    /// The content or URL that was about to execute or load.
    pub content: String,
    /// The violating registrable domain, when the check was domain-based.
    pub domain: String,
    /// The URL of the document whose filter raised the violation.
    pub document_url: String,
    /// Whether block mode was in effect, so observers can distinguish a
    /// cancelled load from a merely blocked script.
    pub block_mode: bool,
}

/// Host-registered receiver for violations. Implementations must not block;
/// the report arrives on whatever thread ran the check.
pub trait ViolationSink: Send + Sync {
    fn report(&self, violation: ViolationReport);
}

/// A [`ViolationSink`] that queues violations onto a channel, FIFO, for a
/// consumer on another thread (typically the host's UI context). If the
/// consumer has gone away the violation is dropped; it was already logged.
pub struct ChannelSink {
    sender: Sender<ViolationReport>,
}

impl ChannelSink {
    pub fn new() -> (ChannelSink, Receiver<ViolationReport>) {
        let (sender, receiver) = channel();
        (ChannelSink { sender }, receiver)
    }
}

impl ViolationSink for ChannelSink {
    fn report(&self, violation: ViolationReport) {
        if self.sender.send(violation).is_err() {
            debug!("violation observer disconnected, notification dropped");
        }
    }
}

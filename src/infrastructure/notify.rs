use crate::messaging::RealtimeEvent;
use crate::messaging::listeners::panic_message;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-facing message. How it is rendered is up to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::new("Connection Error", message, Severity::Error)
    }

    /// The notification the UI shows for an inbound event, if any.
    pub fn for_event(event: &RealtimeEvent) -> Option<Self> {
        match event {
            RealtimeEvent::GenerationError(payload) => Some(Self::new(
                "Generation Error",
                payload.message_or("Image generation failed"),
                Severity::Error,
            )),
            RealtimeEvent::FeedbackError(payload) => Some(Self::new(
                "Feedback Error",
                payload.message_or("Feedback processing failed"),
                Severity::Error,
            )),
            RealtimeEvent::Error(payload) => Some(Self::connection_error(
                payload.message_or("Connection error occurred"),
            )),
            RealtimeEvent::FeedbackComplete(payload) => Some(Self::new(
                "Feedback Processed!",
                payload.response.clone(),
                Severity::Success,
            )),
            _ => None,
        }
    }
}

/// UI update seam. Called from the client's background tasks, so
/// implementations must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Hands `notification` to a host-supplied notifier. A notifier that panics
/// is logged and the panic stops here.
pub(crate) fn deliver(notifier: &dyn Notifier, notification: Notification) {
    let title = notification.title.clone();
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| notifier.notify(notification))) {
        tracing::error!(
            title = %title,
            "Error in notifier: {}",
            panic_message(panic.as_ref())
        );
    }
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => {
                tracing::error!(title = %notification.title, "{}", notification.message)
            }
            Severity::Warning => {
                tracing::warn!(title = %notification.title, "{}", notification.message)
            }
            Severity::Info | Severity::Success => {
                tracing::info!(title = %notification.title, "{}", notification.message)
            }
        }
    }
}

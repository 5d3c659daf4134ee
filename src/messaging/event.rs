use super::payload::{
    ErrorPayload, FeedbackCompletePayload, FeedbackProcessingPayload, GenerationCompletePayload,
    GenerationStartedPayload, ProgressPayload, StatusPayload,
};
use crate::types::constants::{client_events, server_events};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Key that listeners register against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Disconnected,
    Reconnecting,
    ConnectionLost,
    Status,
    GenerationStarted,
    GenerationProgress,
    GenerationComplete,
    GenerationError,
    FeedbackProcessing,
    FeedbackComplete,
    FeedbackError,
    Error,
    /// Any event name the client has no variant for
    Other(String),
}

impl EventKind {
    /// Parse a wire name into an EventKind
    pub fn parse(s: &str) -> Self {
        match s {
            server_events::CONNECT => Self::Connected,
            server_events::DISCONNECT => Self::Disconnected,
            client_events::RECONNECTING => Self::Reconnecting,
            client_events::CONNECTION_LOST => Self::ConnectionLost,
            server_events::STATUS => Self::Status,
            server_events::GENERATION_STARTED => Self::GenerationStarted,
            server_events::GENERATION_PROGRESS => Self::GenerationProgress,
            server_events::GENERATION_COMPLETE => Self::GenerationComplete,
            server_events::GENERATION_ERROR => Self::GenerationError,
            server_events::FEEDBACK_PROCESSING => Self::FeedbackProcessing,
            server_events::FEEDBACK_COMPLETE => Self::FeedbackComplete,
            server_events::FEEDBACK_ERROR => Self::FeedbackError,
            server_events::ERROR => Self::Error,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Convert kind to its wire name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connected => server_events::CONNECT,
            Self::Disconnected => server_events::DISCONNECT,
            Self::Reconnecting => client_events::RECONNECTING,
            Self::ConnectionLost => client_events::CONNECTION_LOST,
            Self::Status => server_events::STATUS,
            Self::GenerationStarted => server_events::GENERATION_STARTED,
            Self::GenerationProgress => server_events::GENERATION_PROGRESS,
            Self::GenerationComplete => server_events::GENERATION_COMPLETE,
            Self::GenerationError => server_events::GENERATION_ERROR,
            Self::FeedbackProcessing => server_events::FEEDBACK_PROCESSING,
            Self::FeedbackComplete => server_events::FEEDBACK_COMPLETE,
            Self::FeedbackError => server_events::FEEDBACK_ERROR,
            Self::Error => server_events::ERROR,
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a listener can observe, from the backend or from the client itself.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    Connected,
    Disconnected,
    /// A reconnect was scheduled; `delay` is how long the client waits first
    Reconnecting { attempt: u32, delay: Duration },
    /// Retries are exhausted; the realtime channel stays down
    ConnectionLost,
    Status(StatusPayload),
    GenerationStarted(GenerationStartedPayload),
    GenerationProgress(ProgressPayload),
    GenerationComplete(GenerationCompletePayload),
    GenerationError(ErrorPayload),
    FeedbackProcessing(FeedbackProcessingPayload),
    FeedbackComplete(FeedbackCompletePayload),
    FeedbackError(ErrorPayload),
    Error(ErrorPayload),
    Other { name: String, data: Value },
}

impl RealtimeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Disconnected => EventKind::Disconnected,
            Self::Reconnecting { .. } => EventKind::Reconnecting,
            Self::ConnectionLost => EventKind::ConnectionLost,
            Self::Status(_) => EventKind::Status,
            Self::GenerationStarted(_) => EventKind::GenerationStarted,
            Self::GenerationProgress(_) => EventKind::GenerationProgress,
            Self::GenerationComplete(_) => EventKind::GenerationComplete,
            Self::GenerationError(_) => EventKind::GenerationError,
            Self::FeedbackProcessing(_) => EventKind::FeedbackProcessing,
            Self::FeedbackComplete(_) => EventKind::FeedbackComplete,
            Self::FeedbackError(_) => EventKind::FeedbackError,
            Self::Error(_) => EventKind::Error,
            Self::Other { name, .. } => EventKind::Other(name.clone()),
        }
    }

    /// Builds the typed event for a backend event name and payload.
    ///
    /// A known name whose payload does not fit its shape comes back as
    /// `Other` with the raw payload, and a warning is logged.
    pub fn from_wire(name: &str, data: Value) -> Self {
        let typed = match EventKind::parse(name) {
            EventKind::Status => parse(&data).map(Self::Status),
            EventKind::GenerationStarted => parse(&data).map(Self::GenerationStarted),
            EventKind::GenerationProgress => parse(&data).map(Self::GenerationProgress),
            EventKind::GenerationComplete => parse(&data).map(Self::GenerationComplete),
            EventKind::GenerationError => parse(&data).map(Self::GenerationError),
            EventKind::FeedbackProcessing => parse(&data).map(Self::FeedbackProcessing),
            EventKind::FeedbackComplete => parse(&data).map(Self::FeedbackComplete),
            EventKind::FeedbackError => parse(&data).map(Self::FeedbackError),
            EventKind::Error => parse(&data).map(Self::Error),
            // Lifecycle kinds come from the client's own state, never the wire
            EventKind::Connected
            | EventKind::Disconnected
            | EventKind::Reconnecting
            | EventKind::ConnectionLost
            | EventKind::Other(_) => {
                return Self::Other {
                    name: name.to_string(),
                    data,
                };
            }
        };

        typed.unwrap_or_else(|e| {
            tracing::warn!(event = name, "Payload does not match expected shape: {}", e);
            Self::Other {
                name: name.to_string(),
                data,
            }
        })
    }
}

/// Null payloads deserialize as the type's defaults.
fn parse<T: DeserializeOwned + Default>(data: &Value) -> Result<T, serde_json::Error> {
    if data.is_null() {
        return Ok(T::default());
    }
    T::deserialize(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kind_parse() {
        assert_eq!(EventKind::parse("connect"), EventKind::Connected);
        assert_eq!(
            EventKind::parse("generation_complete"),
            EventKind::GenerationComplete
        );
        assert_eq!(EventKind::parse("error"), EventKind::Error);
        assert_eq!(
            EventKind::parse("brand_new_event"),
            EventKind::Other("brand_new_event".to_string())
        );
    }

    #[test]
    fn test_event_kind_names_round_trip() {
        let kinds = vec![
            EventKind::Connected,
            EventKind::Disconnected,
            EventKind::Reconnecting,
            EventKind::ConnectionLost,
            EventKind::Status,
            EventKind::GenerationStarted,
            EventKind::GenerationProgress,
            EventKind::GenerationComplete,
            EventKind::GenerationError,
            EventKind::FeedbackProcessing,
            EventKind::FeedbackComplete,
            EventKind::FeedbackError,
            EventKind::Error,
        ];
        for kind in kinds {
            assert_eq!(EventKind::parse(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_from_wire_generation_progress() {
        let event = RealtimeEvent::from_wire(
            "generation_progress",
            json!({"status": "Processing requirements with AI...", "progress": 40}),
        );
        assert_eq!(
            event,
            RealtimeEvent::GenerationProgress(ProgressPayload {
                status: "Processing requirements with AI...".to_string(),
                progress: 40.0,
            })
        );
    }

    #[test]
    fn test_from_wire_generation_complete() {
        let event = RealtimeEvent::from_wire(
            "generation_complete",
            json!({"images": ["a.png"], "progress": 100, "message": "done"}),
        );
        let RealtimeEvent::GenerationComplete(payload) = event else {
            panic!("expected generation_complete");
        };
        assert_eq!(payload.images, vec!["a.png".to_string()]);
        assert_eq!(payload.progress, Some(100.0));
    }

    #[test]
    fn test_from_wire_malformed_payload_becomes_other() {
        let data = json!({"images": "not-a-list"});
        let event = RealtimeEvent::from_wire("generation_complete", data.clone());
        assert_eq!(
            event,
            RealtimeEvent::Other {
                name: "generation_complete".to_string(),
                data
            }
        );
        assert_eq!(
            event.kind(),
            EventKind::Other("generation_complete".to_string())
        );
    }

    #[test]
    fn test_from_wire_client_kinds_are_not_spoofable() {
        for name in ["connect", "disconnect", "reconnecting", "connection_lost"] {
            let event = RealtimeEvent::from_wire(name, Value::Null);
            assert_eq!(
                event,
                RealtimeEvent::Other {
                    name: name.to_string(),
                    data: Value::Null,
                },
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_from_wire_error_null_payload() {
        let event = RealtimeEvent::from_wire("feedback_error", Value::Null);
        let RealtimeEvent::FeedbackError(payload) = event else {
            panic!("expected feedback_error");
        };
        assert_eq!(payload.message_or("Feedback processing failed"), "Feedback processing failed");
    }
}

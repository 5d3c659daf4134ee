// Messaging module - wire packets, typed events and dispatch
pub mod command;
pub mod event;
pub mod listeners;
pub mod packet;
pub mod payload;
pub mod router;

pub use command::{Command, JoinSession, LeaveSession, RealtimeFeedback, StartGeneration};
pub use event::{EventKind, RealtimeEvent};
pub use listeners::{EventBus, ListenerId};
pub use packet::{Handshake, Packet};
pub use payload::{
    ErrorPayload, FeedbackCompletePayload, FeedbackProcessingPayload, GenerationCompletePayload,
    GenerationStartedPayload, ProgressPayload, StatusPayload,
};
pub use router::{MessageRouter, Routed};

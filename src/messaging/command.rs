use super::packet::Packet;
use crate::types::constants::commands;
use crate::types::{Result, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `join_session{session_id, user_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSession {
    pub session_id: SessionId,
    pub user_id: String,
}

/// `leave_session{session_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveSession {
    pub session_id: SessionId,
}

/// `start_realtime_generation{requirements, session_id, timestamp}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartGeneration {
    pub requirements: String,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
}

/// `realtime_feedback{image_url, feedback, session_id, timestamp}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeFeedback {
    pub image_url: String,
    pub feedback: String,
    pub session_id: Option<SessionId>,
    pub timestamp: DateTime<Utc>,
}

/// Fire-and-forget commands sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    JoinSession(JoinSession),
    LeaveSession(LeaveSession),
    StartGeneration(StartGeneration),
    Feedback(RealtimeFeedback),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinSession(_) => commands::JOIN_SESSION,
            Self::LeaveSession(_) => commands::LEAVE_SESSION,
            Self::StartGeneration(_) => commands::START_REALTIME_GENERATION,
            Self::Feedback(_) => commands::REALTIME_FEEDBACK,
        }
    }

    pub fn payload(&self) -> Result<serde_json::Value> {
        let value = match self {
            Self::JoinSession(p) => serde_json::to_value(p)?,
            Self::LeaveSession(p) => serde_json::to_value(p)?,
            Self::StartGeneration(p) => serde_json::to_value(p)?,
            Self::Feedback(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }

    pub fn to_packet(&self) -> Result<Packet> {
        Ok(Packet::event(self.name(), self.payload()?))
    }
}

impl From<JoinSession> for Command {
    fn from(p: JoinSession) -> Self {
        Self::JoinSession(p)
    }
}

impl From<LeaveSession> for Command {
    fn from(p: LeaveSession) -> Self {
        Self::LeaveSession(p)
    }
}

impl From<StartGeneration> for Command {
    fn from(p: StartGeneration) -> Self {
        Self::StartGeneration(p)
    }
}

impl From<RealtimeFeedback> for Command {
    fn from(p: RealtimeFeedback) -> Self {
        Self::Feedback(p)
    }
}

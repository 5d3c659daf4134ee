use super::connection::ConnectionState;
use crate::infrastructure::{Backoff, TaskManager};
use crate::types::SessionId;

/// Consolidated mutable state for RealtimeClient
/// Using a single struct reduces lock contention
pub struct ClientState {
    /// Reconnect attempt counter and delay schedule
    pub backoff: Backoff,

    /// Session joined through `join_session`
    pub session_id: Option<SessionId>,

    /// Background task manager (read loop)
    pub task_manager: TaskManager,

    /// Whether the disconnect was manual (prevents auto-reconnect)
    pub was_manual_disconnect: bool,

    /// Set once retries are exhausted; cleared by the next successful connect
    pub connection_lost: bool,

    /// Bumped on every connect and manual disconnect. Drop signals carry the
    /// epoch of the transport they belong to.
    pub epoch: u64,
}

impl ClientState {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            backoff,
            session_id: None,
            task_manager: TaskManager::new(),
            was_manual_disconnect: false,
            connection_lost: false,
            epoch: 0,
        }
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(Backoff::default())
    }
}

/// Point-in-time view of the client, as returned by `RealtimeClient::status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub is_connected: bool,
    pub session_id: Option<SessionId>,
    pub reconnect_attempts: u32,
    pub connection_lost: bool,
}

use crate::messaging::Packet;
use crate::types::{RealtimeError, Result};
use crate::websocket::FrameSink;
use futures::SinkExt;
use tokio::sync::{Mutex, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owns the outbound half of the transport and the connection state.
///
/// The state lives in a watch channel so every transition is also observable
/// through [`subscribe`](Self::subscribe).
pub struct ConnectionManager {
    writer: Mutex<Option<FrameSink>>,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(None),
            state: watch::Sender::new(ConnectionState::Disconnected),
        }
    }

    /// Moves `Disconnected -> Connecting`. Returns `false` without changing
    /// anything if a connection is already open or being opened.
    pub fn try_begin_connect(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn set_state(&self, new_state: ConnectionState) {
        self.state.send_if_modified(|state| {
            if *state == new_state {
                return false;
            }
            tracing::debug!("Connection state {:?} -> {:?}", state, new_state);
            *state = new_state;
            true
        });
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Installs the write half after a successful handshake.
    pub async fn set_writer(&self, writer: FrameSink) {
        *self.writer.lock().await = Some(writer);
    }

    pub async fn send_packet(&self, packet: &Packet) -> Result<()> {
        let frame = packet.encode()?;
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(sink) => sink.send(frame).await,
            None => Err(RealtimeError::NotConnected),
        }
    }

    /// Says goodbye to the namespace and closes the transport.
    pub async fn close(&self) -> Result<()> {
        let writer = self.writer.lock().await.take();
        let result = match writer {
            Some(mut sink) => {
                if let Err(e) = sink.send(Packet::Disconnect.encode()?).await {
                    tracing::debug!("Could not send disconnect packet: {}", e);
                }
                sink.close().await
            }
            None => Ok(()),
        };
        self.set_state(ConnectionState::Disconnected);
        result
    }

    /// Drops the write half without a close handshake (the transport is gone).
    pub async fn clear_writer(&self) {
        self.writer.lock().await.take();
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

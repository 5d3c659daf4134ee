use super::{ClientState, ConnectionManager, ConnectionState, RealtimeClient};
use crate::config::ClientConfig;
use crate::infrastructure::{Notification, Notifier, deliver};
use crate::messaging::{EventBus, RealtimeEvent};
use crate::types::CONNECTION_LOST_MESSAGE;
use crate::websocket::Connector;
use std::sync::{Arc, Weak};
use tokio::sync::{RwLock, mpsc};
use url::Url;

/// Reports from the read loop and from `connect()` to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionSignal {
    /// The transport opened at `epoch` ended without a manual disconnect
    TransportLost { epoch: u64 },
    /// An explicit connect attempt failed
    ConnectFailed,
    /// Stop supervising; sent by `shutdown()`
    Shutdown,
}

/// Client handle that does not keep the client alive. The supervisor holds
/// one of these so it exits once every `RealtimeClient` is dropped.
pub(crate) struct WeakClient {
    config: Arc<ClientConfig>,
    socket_url: Url,
    connector: Arc<dyn Connector>,
    connection: Arc<ConnectionManager>,
    state: Weak<RwLock<ClientState>>,
    listeners: Arc<EventBus>,
    notifier: Arc<dyn Notifier>,
    signals: mpsc::WeakUnboundedSender<ConnectionSignal>,
}

impl WeakClient {
    pub(crate) fn upgrade(&self) -> Option<RealtimeClient> {
        Some(RealtimeClient {
            config: Arc::clone(&self.config),
            socket_url: self.socket_url.clone(),
            connector: Arc::clone(&self.connector),
            connection: Arc::clone(&self.connection),
            state: self.state.upgrade()?,
            listeners: Arc::clone(&self.listeners),
            notifier: Arc::clone(&self.notifier),
            signals: self.signals.upgrade()?,
        })
    }
}

impl RealtimeClient {
    pub(crate) fn downgrade(&self) -> WeakClient {
        WeakClient {
            config: Arc::clone(&self.config),
            socket_url: self.socket_url.clone(),
            connector: Arc::clone(&self.connector),
            connection: Arc::clone(&self.connection),
            state: Arc::downgrade(&self.state),
            listeners: Arc::clone(&self.listeners),
            notifier: Arc::clone(&self.notifier),
            signals: self.signals.downgrade(),
        }
    }

    /// Marks the connection down if `epoch` is still the live transport.
    async fn accept_transport_loss(&self, epoch: u64) -> bool {
        let state = self.state.write().await;
        if state.epoch != epoch || self.connection.state() != ConnectionState::Connected {
            tracing::debug!(epoch, "Ignoring loss of a stale transport");
            return false;
        }

        self.connection.clear_writer().await;
        self.connection.set_state(ConnectionState::Disconnected);
        tracing::warn!("Disconnected from realtime service");
        self.emit(&RealtimeEvent::Disconnected);
        drop(state);
        true
    }

    /// Retries with `base * attempt` delays until connected, manually
    /// disconnected, or out of attempts. Running out emits `ConnectionLost`
    /// and notifies once; no further attempts are scheduled.
    pub(crate) async fn reconnect(&self) {
        loop {
            let (attempt, delay) = {
                let mut state = self.state.write().await;
                if state.was_manual_disconnect {
                    tracing::info!("Manual disconnect detected, will not attempt to reconnect");
                    return;
                }
                if state.connection_lost {
                    tracing::debug!("Connection already given up, not retrying");
                    return;
                }
                if self.connection.state() != ConnectionState::Disconnected {
                    tracing::info!("Already connected or connecting, stopping reconnection attempts");
                    return;
                }

                let next = state.backoff.next_delay();
                match next {
                    Some(delay) => (state.backoff.attempts(), delay),
                    None => {
                        state.connection_lost = true;
                        tracing::error!(
                            attempts = state.backoff.max_attempts(),
                            "Reconnect attempts exhausted, giving up"
                        );
                        self.emit(&RealtimeEvent::ConnectionLost);
                        drop(state);
                        deliver(
                            self.notifier.as_ref(),
                            Notification::connection_error(CONNECTION_LOST_MESSAGE),
                        );
                        return;
                    }
                }
            };

            tracing::info!(
                "Attempting to reconnect ({}/{}) in {:?}",
                attempt,
                self.config.max_reconnect_attempts,
                delay
            );
            self.emit(&RealtimeEvent::Reconnecting { attempt, delay });
            tokio::time::sleep(delay).await;

            if self.state.read().await.was_manual_disconnect {
                tracing::info!("Manual disconnect during backoff, will not attempt to reconnect");
                return;
            }

            match self.open_transport().await {
                Ok(true) => {
                    tracing::info!("Reconnected successfully");
                    return;
                }
                Ok(false) => {
                    tracing::info!("Already connected or connecting, stopping reconnection attempts");
                    return;
                }
                Err(e) => tracing::warn!(attempt, "Reconnection attempt failed: {}", e),
            }
        }
    }
}

/// Consumes connection signals for the lifetime of the client.
pub(crate) async fn supervise(
    client: WeakClient,
    mut signals: mpsc::UnboundedReceiver<ConnectionSignal>,
) {
    while let Some(signal) = signals.recv().await {
        let Some(client) = client.upgrade() else {
            break;
        };

        match signal {
            ConnectionSignal::TransportLost { epoch } => {
                if client.accept_transport_loss(epoch).await {
                    client.reconnect().await;
                }
            }
            ConnectionSignal::ConnectFailed => client.reconnect().await,
            ConnectionSignal::Shutdown => break,
        }
    }
    tracing::info!("Reconnection supervisor finished");
}

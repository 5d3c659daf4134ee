use super::reconnect::supervise;
use super::{ClientState, ConnectionManager, RealtimeClient};
use crate::config::ClientConfig;
use crate::infrastructure::{Backoff, LogNotifier, Notifier};
use crate::messaging::EventBus;
use crate::types::Result;
use crate::websocket::{Connector, WebSocketConnector};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use url::Url;

/// Builder for RealtimeClient that handles initialization
pub struct RealtimeClientBuilder {
    config: ClientConfig,
    socket_url: Url,
    connector: Arc<dyn Connector>,
    notifier: Arc<dyn Notifier>,
}

impl RealtimeClientBuilder {
    /// Create a new builder. The configuration is validated here.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let socket_url = config.socket_url()?;

        Ok(Self {
            config,
            socket_url,
            connector: Arc::new(WebSocketConnector),
            notifier: Arc::new(LogNotifier),
        })
    }

    /// Replace the transport (the default opens a WebSocket).
    pub fn connector(mut self, connector: impl Connector + 'static) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    /// Replace where user-facing notifications go (the default logs them).
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Build the client and spawn the reconnect supervisor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> RealtimeClient {
        let backoff = Backoff::new(
            self.config.reconnect_base_delay,
            self.config.max_reconnect_attempts,
        );
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();

        let client = RealtimeClient {
            config: Arc::new(self.config),
            socket_url: self.socket_url,
            connector: self.connector,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(ClientState::new(backoff))),
            listeners: Arc::new(EventBus::new()),
            notifier: self.notifier,
            signals: signals_tx,
        };

        // The supervisor only holds a weak handle and stops with the last client
        tokio::spawn(supervise(client.downgrade(), signals_rx));

        client
    }
}

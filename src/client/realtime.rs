use super::reconnect::ConnectionSignal;
use super::{
    ClientState, ConnectionManager, ConnectionState, ConnectionStatus, RealtimeClientBuilder,
};
use crate::config::ClientConfig;
use crate::infrastructure::{Heartbeat, Notification, Notifier, deliver};
use crate::messaging::{
    Command, ErrorPayload, EventBus, EventKind, Handshake, JoinSession, LeaveSession, ListenerId,
    MessageRouter, Packet, RealtimeEvent, RealtimeFeedback, Routed, StartGeneration,
};
use crate::types::{NOT_CONNECTED_MESSAGE, RealtimeError, Result, SessionId};
use crate::websocket::{Connector, FrameStream, Transport, handshake};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, watch};
use url::Url;

/// Realtime connection to the Echo backend.
///
/// `RealtimeClient` owns one Socket.IO connection, reconnects it with a
/// linearly growing delay when it drops, and fans inbound events out to
/// listeners registered with [`on`](Self::on). Cloning is cheap; every
/// clone drives the same connection.
///
/// # Example
///
/// ```no_run
/// use echo_realtime::{ClientConfig, EventKind, RealtimeClient, RealtimeEvent};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RealtimeClient::new(ClientConfig::new("https://echo.example.com"))?;
///
/// client.on(EventKind::GenerationProgress, |event| {
///     if let RealtimeEvent::GenerationProgress(progress) = event {
///         println!("{}% {}", progress.progress, progress.status);
///     }
/// });
///
/// client.connect().await?;
/// client.join_session("session_1", "user_42").await?;
/// client.start_generation("a lighthouse at dusk", None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) socket_url: Url,
    pub(crate) connector: Arc<dyn Connector>,

    // Connection manager
    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,

    pub(crate) listeners: Arc<EventBus>,
    pub(crate) notifier: Arc<dyn Notifier>,

    // Read loop and connect failures report here; consumed by the reconnect supervisor
    pub(crate) signals: mpsc::UnboundedSender<ConnectionSignal>,
}

impl RealtimeClient {
    /// Creates a client using the WebSocket transport and the log notifier.
    ///
    /// No connection is made until [`connect()`](Self::connect) is called.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Config`] or [`RealtimeError::UrlParse`] if the
    /// configuration does not validate.
    pub fn new(config: ClientConfig) -> Result<Self> {
        RealtimeClientBuilder::new(config).map(|builder| builder.build())
    }

    pub fn builder(config: ClientConfig) -> Result<RealtimeClientBuilder> {
        RealtimeClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens the connection and performs the Socket.IO handshake.
    ///
    /// Calling this while connected or connecting does nothing. A successful
    /// connect resets the reconnect counter, including after the client gave up
    /// with [`RealtimeEvent::ConnectionLost`]. A failed connect is returned to the
    /// caller and also hands over to the automatic reconnect schedule.
    ///
    /// # Errors
    ///
    /// - [`RealtimeError::Timeout`] if transport plus handshake exceed `connect_timeout`
    /// - [`RealtimeError::Auth`] if the server refuses the namespace connect
    /// - [`RealtimeError::WebSocket`] / [`RealtimeError::Connection`] for transport failures
    ///
    /// # Example
    ///
    /// ```no_run
    /// use echo_realtime::{ClientConfig, RealtimeClient};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = RealtimeClient::new(ClientConfig::default())?;
    /// client.connect().await?;
    /// assert!(client.is_connected());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(&self) -> Result<()> {
        self.state.write().await.was_manual_disconnect = false;

        match self.open_transport().await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::error!("Connection attempt failed: {}", e);
                self.signal(ConnectionSignal::ConnectFailed);
                Err(e)
            }
        }
    }

    /// One connection attempt. `Ok(false)` means another attempt already owns
    /// the connection, or a manual disconnect is in effect, and nothing was done.
    pub(crate) async fn open_transport(&self) -> Result<bool> {
        // Taken together under the state lock: disconnect() bumps the epoch
        // while holding it, so a changed epoch later means this attempt was
        // cancelled and the connection state is no longer ours
        let attempt_epoch = {
            let state = self.state.read().await;
            if state.was_manual_disconnect {
                tracing::debug!("Manual disconnect requested, not connecting");
                return Ok(false);
            }
            if !self.connection.try_begin_connect() {
                tracing::debug!("Already connected or connecting");
                return Ok(false);
            }
            state.epoch
        };

        tracing::info!("Connecting to {}", self.socket_url);
        let established = tokio::time::timeout(self.config.connect_timeout, self.establish())
            .await
            .unwrap_or(Err(RealtimeError::Timeout));

        let mut state = self.state.write().await;
        let cancelled = state.epoch != attempt_epoch;

        let (transport, handshake) = match established {
            Ok(established) => established,
            Err(e) => {
                if !cancelled {
                    self.connection.set_state(ConnectionState::Disconnected);
                }
                return Err(e);
            }
        };

        if cancelled {
            drop(state);
            tracing::info!("Connection attempt was cancelled, discarding transport");
            let Transport { mut sink, .. } = transport;
            if let Err(e) = sink.close().await {
                tracing::debug!("Could not close discarded transport: {}", e);
            }
            return Err(RealtimeError::Connection(
                "disconnected while connecting".to_string(),
            ));
        }

        let Transport { sink, stream } = transport;
        self.connection.set_writer(sink).await;

        state.epoch += 1;
        state.backoff.reset();
        state.connection_lost = false;
        let epoch = state.epoch;

        let router = MessageRouter::new(
            Arc::clone(&self.connection),
            Arc::clone(&self.listeners),
            Arc::clone(&self.notifier),
        );
        state.task_manager.spawn(read_loop(
            stream,
            router,
            Heartbeat::from_handshake(&handshake),
            epoch,
            self.signals.clone(),
        ));

        self.connection.set_state(ConnectionState::Connected);
        tracing::info!(sid = %handshake.sid, "Connected to realtime service");
        // Still under the state lock so a drop on the new transport is
        // reported after this event, not before
        self.emit(&RealtimeEvent::Connected);
        Ok(true)
    }

    async fn establish(&self) -> Result<(Transport, Handshake)> {
        let mut transport = self.connector.open(&self.socket_url).await?;
        let handshake = handshake::perform(&mut transport).await?;
        Ok((transport, handshake))
    }

    /// Closes the connection and turns automatic reconnection off.
    ///
    /// Call [`connect()`](Self::connect) again to reconnect.
    pub async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.was_manual_disconnect = true;

        if self.connection.state() == ConnectionState::Disconnected {
            return Ok(());
        }
        tracing::info!("Disconnecting from realtime service");

        // Abort the read loop and invalidate any drop signal it already sent
        state.task_manager.abort_all();
        state.epoch += 1;

        let result = self.connection.close().await;
        self.emit(&RealtimeEvent::Disconnected);
        drop(state);

        tracing::info!("Disconnected from realtime service");
        result
    }

    /// Disconnects and stops the reconnect supervisor for every clone of
    /// this client. After this the client never reconnects on its own.
    pub async fn shutdown(self) -> Result<()> {
        let result = self.disconnect().await;
        self.signal(ConnectionSignal::Shutdown);
        tracing::info!("Realtime client shut down");
        result
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub async fn status(&self) -> ConnectionStatus {
        let state = self.state.read().await;
        let connection_state = self.connection.state();
        ConnectionStatus {
            state: connection_state,
            is_connected: connection_state == ConnectionState::Connected,
            session_id: state.session_id.clone(),
            reconnect_attempts: state.backoff.attempts(),
            connection_lost: state.connection_lost,
        }
    }

    /// Watch channel of connection state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Registers `handler` for every event of `kind`.
    ///
    /// Handlers run on the client's read task and must not block. A handler
    /// that panics is logged and skipped; the others still run.
    pub fn on<F>(&self, kind: impl Into<EventKind>, handler: F) -> ListenerId
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        self.listeners.on(kind, handler)
    }

    /// Removes one handler. Returns `false` if it was not registered under `kind`.
    pub fn off(&self, kind: impl Into<EventKind>, id: ListenerId) -> bool {
        self.listeners.off(&kind.into(), id)
    }

    /// Sends a command to the backend.
    ///
    /// # Errors
    ///
    /// Without a connection this returns [`RealtimeError::NotConnected`] and
    /// nothing is written. An `Error` event and a "Not connected" notification
    /// are raised as well, so listeners see the failure too. A write that fails
    /// because the transport just died is reported the same way.
    pub async fn send(&self, command: impl Into<Command>) -> Result<()> {
        let command = command.into();
        let result = if self.is_connected() {
            tracing::debug!(command = command.name(), "Sending command");
            self.connection.send_packet(&command.to_packet()?).await
        } else {
            Err(RealtimeError::NotConnected)
        };

        match result {
            Err(RealtimeError::NotConnected) => {}
            // The transport died and the read loop has not reported it yet
            Err(e @ (RealtimeError::WebSocket(_) | RealtimeError::Connection(_))) => {
                tracing::warn!(command = command.name(), "Write on a dead transport: {}", e);
            }
            other => return other,
        }

        tracing::warn!(command = command.name(), "Cannot send command: not connected");
        self.emit(&RealtimeEvent::Error(ErrorPayload::new(NOT_CONNECTED_MESSAGE)));
        deliver(
            self.notifier.as_ref(),
            Notification::connection_error(NOT_CONNECTED_MESSAGE),
        );
        Err(RealtimeError::NotConnected)
    }

    /// Joins a session and remembers it for later generation requests.
    pub async fn join_session(
        &self,
        session_id: impl Into<SessionId>,
        user_id: impl Into<String>,
    ) -> Result<()> {
        let session_id = session_id.into();
        self.send(JoinSession {
            session_id: session_id.clone(),
            user_id: user_id.into(),
        })
        .await?;

        tracing::info!(session = %session_id, "Joined session");
        self.state.write().await.session_id = Some(session_id);
        Ok(())
    }

    pub async fn leave_session(&self, session_id: impl Into<SessionId>) -> Result<()> {
        let session_id = session_id.into();
        self.send(LeaveSession {
            session_id: session_id.clone(),
        })
        .await?;

        let mut state = self.state.write().await;
        if state.session_id.as_ref() == Some(&session_id) {
            state.session_id = None;
        }
        Ok(())
    }

    /// Requests streamed image generation.
    ///
    /// Without an explicit `session_id` the joined session is used, and
    /// without one of those a fresh id is generated. Returns the id the
    /// request was sent under.
    pub async fn start_generation(
        &self,
        requirements: impl Into<String>,
        session_id: Option<SessionId>,
    ) -> Result<SessionId> {
        let session_id = match session_id {
            Some(id) => id,
            None => self
                .state
                .read()
                .await
                .session_id
                .clone()
                .unwrap_or_else(SessionId::generate),
        };

        self.send(StartGeneration {
            requirements: requirements.into(),
            session_id: session_id.clone(),
            timestamp: Utc::now(),
        })
        .await?;
        Ok(session_id)
    }

    /// Sends feedback on a generated image. Falls back to the joined session.
    pub async fn send_feedback(
        &self,
        image_url: impl Into<String>,
        feedback: impl Into<String>,
        session_id: Option<SessionId>,
    ) -> Result<()> {
        let session_id = match session_id {
            Some(id) => Some(id),
            None => self.state.read().await.session_id.clone(),
        };

        self.send(RealtimeFeedback {
            image_url: image_url.into(),
            feedback: feedback.into(),
            session_id,
            timestamp: Utc::now(),
        })
        .await
    }

    pub(crate) fn emit(&self, event: &RealtimeEvent) -> usize {
        self.listeners.emit(event)
    }

    pub(crate) fn signal(&self, signal: ConnectionSignal) {
        if self.signals.send(signal).is_err() {
            tracing::debug!("Reconnect supervisor is gone, dropping signal");
        }
    }
}

/// Reads frames until the transport ends, the server closes the session, or
/// no frame arrives within the heartbeat deadline. Then reports the loss.
async fn read_loop(
    mut stream: FrameStream,
    router: MessageRouter,
    heartbeat: Heartbeat,
    epoch: u64,
    signals: mpsc::UnboundedSender<ConnectionSignal>,
) {
    tracing::info!("Starting read task");
    let deadline = heartbeat.deadline();

    loop {
        let frame = match tokio::time::timeout(deadline, stream.next()).await {
            Err(_) => {
                tracing::warn!("No frame from server within {:?}, dropping connection", deadline);
                break;
            }
            Ok(None) => {
                tracing::warn!("Transport closed by server");
                break;
            }
            Ok(Some(Err(e))) => {
                tracing::error!("WebSocket read error: {}", e);
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        tracing::trace!("Received frame: {}", frame);
        match Packet::decode(&frame) {
            Ok(packet) => {
                if router.route(packet).await == Routed::Closed {
                    break;
                }
            }
            Err(e) => tracing::error!("Failed to parse frame: {} - Raw: {}", e, frame),
        }
    }

    tracing::info!("Read task finished");
    if signals
        .send(ConnectionSignal::TransportLost { epoch })
        .is_err()
    {
        tracing::debug!("Reconnect supervisor is gone");
    }
}

//! In-memory transport and observers shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use echo_realtime::messaging::{Handshake, Packet};
use echo_realtime::websocket::{Connector, Transport};
use echo_realtime::{
    ClientConfig, EventKind, Notification, Notifier, RealtimeClient, RealtimeError, RealtimeEvent,
};
use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// How the fake server answers one `open`.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Completes the handshake
    Accept,
    /// Opens, then refuses the namespace with `44`
    Refuse(&'static str),
    /// The transport cannot be opened at all
    Unreachable,
    /// Opens but never acknowledges the namespace connect
    Silent,
}

/// Server end of one fake connection.
pub struct ServerSession {
    from_client: fmpsc::UnboundedReceiver<String>,
    to_client: fmpsc::UnboundedSender<Result<String, RealtimeError>>,
}

impl ServerSession {
    pub fn send(&self, frame: impl Into<String>) {
        let _ = self.to_client.unbounded_send(Ok(frame.into()));
    }

    pub fn emit(&self, name: &str, data: Value) {
        self.send(Packet::event(name, data).encode().unwrap());
    }

    /// Next frame the client wrote, or `None` once it closed its side.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(60), self.from_client.next())
            .await
            .expect("timed out waiting for a client frame")
    }

    /// Next client event packet, skipping handshake and heartbeat frames.
    pub async fn recv_event(&mut self) -> (String, Value) {
        loop {
            let frame = self.recv().await.expect("client closed the transport");
            if let Packet::Event { name, data } = Packet::decode(&frame).unwrap() {
                return (name, data);
            }
        }
    }
}

struct FakeState {
    script: VecDeque<Behavior>,
    fallback: Behavior,
    opens: usize,
    ping_interval: u64,
    ping_timeout: u64,
    sessions: mpsc::UnboundedSender<ServerSession>,
}

#[derive(Clone)]
pub struct FakeConnector {
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerSession>) {
        let (sessions_tx, sessions_rx) = mpsc::unbounded_channel();
        let connector = Self {
            state: Arc::new(Mutex::new(FakeState {
                script: VecDeque::new(),
                fallback: Behavior::Accept,
                opens: 0,
                // Long enough that paused-clock jumps never trip it by accident
                ping_interval: 3_600_000,
                ping_timeout: 3_600_000,
                sessions: sessions_tx,
            })),
        };
        (connector, sessions_rx)
    }

    pub fn script(&self, behaviors: impl IntoIterator<Item = Behavior>) {
        self.state.lock().unwrap().script.extend(behaviors);
    }

    pub fn fallback(&self, behavior: Behavior) {
        self.state.lock().unwrap().fallback = behavior;
    }

    pub fn heartbeat(&self, ping_interval_ms: u64, ping_timeout_ms: u64) {
        let mut state = self.state.lock().unwrap();
        state.ping_interval = ping_interval_ms;
        state.ping_timeout = ping_timeout_ms;
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn open(&self, _url: &Url) -> echo_realtime::Result<Transport> {
        let mut state = self.state.lock().unwrap();
        state.opens += 1;
        let scripted = state.script.pop_front();
        let behavior = scripted.unwrap_or_else(|| state.fallback.clone());

        if let Behavior::Unreachable = behavior {
            return Err(RealtimeError::Connection("connection refused".to_string()));
        }

        let (client_tx, server_rx) = fmpsc::unbounded::<String>();
        let (server_tx, client_rx) = fmpsc::unbounded::<Result<String, RealtimeError>>();
        let session = ServerSession {
            from_client: server_rx,
            to_client: server_tx,
        };

        let handshake = Handshake {
            sid: format!("sid-{}", state.opens),
            upgrades: Vec::new(),
            ping_interval: state.ping_interval,
            ping_timeout: state.ping_timeout,
            max_payload: Some(1_000_000),
        };
        session.send(Packet::Open(handshake).encode().unwrap());
        match behavior {
            Behavior::Accept => session.send(r#"40{"sid":"socket"}"#),
            Behavior::Refuse(message) => {
                session.send(Packet::ConnectError(message.to_string()).encode().unwrap())
            }
            Behavior::Silent | Behavior::Unreachable => {}
        }
        let _ = state.sessions.send(session);

        let sink = client_tx.sink_map_err(|e| RealtimeError::Connection(e.to_string()));
        Ok(Transport {
            sink: Box::pin(sink),
            stream: Box::pin(client_rx),
        })
    }
}

/// Collects notifications for later assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notes: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn notes(&self) -> Vec<Notification> {
        self.notes.lock().unwrap().clone()
    }

    pub fn count_message(&self, message: &str) -> usize {
        self.notes()
            .iter()
            .filter(|note| note.message == message)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notes.lock().unwrap().push(notification);
    }
}

pub const ALL_KINDS: [EventKind; 13] = [
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

/// Every event the client emits, in order.
pub struct EventRecorder {
    rx: mpsc::UnboundedReceiver<RealtimeEvent>,
}

impl EventRecorder {
    pub fn attach(client: &RealtimeClient) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        for kind in ALL_KINDS {
            let tx = tx.clone();
            client.on(kind, move |event| {
                let _ = tx.send(event.clone());
            });
        }
        Self { rx }
    }

    pub async fn next(&mut self) -> RealtimeEvent {
        tokio::time::timeout(Duration::from_secs(300), self.rx.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed")
    }

    pub async fn next_of(&mut self, kind: EventKind) -> RealtimeEvent {
        loop {
            let event = self.next().await;
            if event.kind() == kind {
                return event;
            }
        }
    }

    /// Whatever has been emitted so far without waiting.
    pub fn drain(&mut self) -> Vec<RealtimeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

pub struct Harness {
    pub client: RealtimeClient,
    pub connector: FakeConnector,
    pub sessions: mpsc::UnboundedReceiver<ServerSession>,
    pub events: EventRecorder,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new("http://echo.test"))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let (connector, sessions) = FakeConnector::new();
        let notifier = RecordingNotifier::default();
        let client = RealtimeClient::builder(config)
            .unwrap()
            .connector(connector.clone())
            .notifier(notifier.clone())
            .build();
        let events = EventRecorder::attach(&client);

        Self {
            client,
            connector,
            sessions,
            events,
            notifier,
        }
    }

    /// Connects and returns the server end with the client's `40` consumed.
    pub async fn connect(&mut self) -> ServerSession {
        self.client.connect().await.unwrap();
        self.accept_session().await
    }

    pub async fn accept_session(&mut self) -> ServerSession {
        let mut session = self.sessions.recv().await.expect("no session opened");
        assert_eq!(session.recv().await.as_deref(), Some("40"));
        session
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

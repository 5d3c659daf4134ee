//! # Echo Realtime
//!
//! Client for the Echo image-briefing backend: a Socket.IO session that
//! streams generation progress and feedback results, plus the REST fallback,
//! health probes and metrics that go with it.
//!
//! ## Example
//!
//! ```no_run
//! use echo_realtime::{ClientConfig, EventKind, RealtimeClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RealtimeClient::new(ClientConfig::from_env()?)?;
//!
//!     client.on(EventKind::GenerationComplete, |event| println!("{:?}", event));
//!     client.connect().await?;
//!     client.start_generation("a lighthouse at dusk", None).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod generation;
pub mod infrastructure;
pub mod messaging;
pub mod types;
pub mod websocket;

pub use client::{ConnectionState, ConnectionStatus, RealtimeClient, RealtimeClientBuilder};
pub use config::ClientConfig;
pub use generation::{GenerationOutcome, GenerationRequest, GenerationService};
pub use infrastructure::{
    CloudService, HealthBoard, HealthMonitor, LogNotifier, MetricsBuffer, Notification, Notifier,
    PerformanceSummary, RestClient, Severity,
};
pub use messaging::{Command, EventKind, ListenerId, RealtimeEvent};
pub use types::{RealtimeError, Result, SessionId};
pub use websocket::{Connector, Transport, WebSocketConnector};

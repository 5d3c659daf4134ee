// WebSocket module - transport creation and session handshake
pub mod factory;
pub mod handshake;

pub use factory::{Connector, FrameSink, FrameStream, Transport, WebSocketConnector};

// Module declarations
mod builder;
mod connection;
mod realtime;
mod reconnect;
mod state;

// Public API exports
pub use builder::RealtimeClientBuilder;
pub use connection::{ConnectionManager, ConnectionState};
pub use realtime::RealtimeClient;
pub use state::{ClientState, ConnectionStatus};

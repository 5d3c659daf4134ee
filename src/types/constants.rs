/// Inbound event names (magic strings layer)
pub mod server_events {
    pub const CONNECT: &str = "connect";
    pub const DISCONNECT: &str = "disconnect";
    pub const STATUS: &str = "status";
    pub const GENERATION_STARTED: &str = "generation_started";
    pub const GENERATION_PROGRESS: &str = "generation_progress";
    pub const GENERATION_COMPLETE: &str = "generation_complete";
    pub const GENERATION_ERROR: &str = "generation_error";
    pub const FEEDBACK_PROCESSING: &str = "feedback_processing";
    pub const FEEDBACK_COMPLETE: &str = "feedback_complete";
    pub const FEEDBACK_ERROR: &str = "feedback_error";
    pub const ERROR: &str = "error";
}

/// Events raised by the client itself, never by the backend
pub mod client_events {
    pub const RECONNECTING: &str = "reconnecting";
    pub const CONNECTION_LOST: &str = "connection_lost";
}

/// Outbound command names
pub mod commands {
    pub const JOIN_SESSION: &str = "join_session";
    pub const LEAVE_SESSION: &str = "leave_session";
    pub const START_REALTIME_GENERATION: &str = "start_realtime_generation";
    pub const REALTIME_FEEDBACK: &str = "realtime_feedback";
}

/// REST paths on the backend
pub mod rest_paths {
    pub const GENERATE_IMAGES: &str = "/api/briefing/generate-images";
    pub const METRICS: &str = "/api/metrics";
    pub const HEALTH_PREFIX: &str = "/api/aws";
}

/// Engine.IO protocol revision spoken by the backend
pub const ENGINE_IO_VERSION: &str = "4";

/// Engine.IO transport name
pub const TRANSPORT_WEBSOCKET: &str = "websocket";

/// Default Socket.IO mount path
pub const DEFAULT_SOCKET_PATH: &str = "/socket.io/";

/// Default backend endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

/// Default connect/handshake timeout (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 20_000;

/// Base reconnect delay, multiplied by the attempt number (milliseconds)
pub const RECONNECT_BASE_DELAY: u64 = 2_000;

/// Reconnect attempts before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Health probe interval (milliseconds)
pub const HEALTH_CHECK_INTERVAL: u64 = 30_000;

/// Periodic metrics flush interval (milliseconds)
pub const METRICS_FLUSH_INTERVAL: u64 = 60_000;

/// Buffered metrics that trigger an immediate flush
pub const METRICS_BATCH_SIZE: usize = 10;

/// Service tag attached to every metric
pub const METRICS_SERVICE_TAG: &str = "echo-platform";

/// Shown when a command is attempted without a connection
pub const NOT_CONNECTED_MESSAGE: &str = "Not connected to real-time service";

/// Shown once reconnect attempts are exhausted
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost. Please refresh the page.";

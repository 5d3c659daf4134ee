//! Client configuration.
//!
//! Defaults mirror the values the web UI shipped with. Every field can be
//! overridden from the environment (or a `.env` file) via
//! [`ClientConfig::from_env`].

use crate::types::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT, DEFAULT_SOCKET_PATH, ENGINE_IO_VERSION,
    HEALTH_CHECK_INTERVAL, MAX_RECONNECT_ATTEMPTS, METRICS_BATCH_SIZE, METRICS_FLUSH_INTERVAL,
    RECONNECT_BASE_DELAY, RealtimeError, Result, TRANSPORT_WEBSOCKET,
};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; `http(s)` and `ws(s)` schemes are both accepted
    pub endpoint: String,
    /// Socket.IO mount path
    pub socket_path: String,
    /// Limit for opening the transport plus the Socket.IO handshake
    pub connect_timeout: Duration,
    /// Multiplied by the attempt number to get each reconnect delay
    pub reconnect_base_delay: Duration,
    pub max_reconnect_attempts: u32,
    pub health_check_interval: Duration,
    pub metrics_flush_interval: Duration,
    pub metrics_batch_size: usize,
    /// Value of the `environment` tag on metrics
    pub environment: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            socket_path: DEFAULT_SOCKET_PATH.to_string(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT),
            reconnect_base_delay: Duration::from_millis(RECONNECT_BASE_DELAY),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            health_check_interval: Duration::from_millis(HEALTH_CHECK_INTERVAL),
            metrics_flush_interval: Duration::from_millis(METRICS_FLUSH_INTERVAL),
            metrics_batch_size: METRICS_BATCH_SIZE,
            environment: "production".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Loads `.env` if present, then reads `ECHO_*` variables over the defaults.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("ECHO_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(path) = lookup("ECHO_SOCKET_PATH") {
            config.socket_path = path;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "ECHO_CONNECT_TIMEOUT_MS")? {
            config.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "ECHO_RECONNECT_BASE_DELAY_MS")? {
            config.reconnect_base_delay = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<u32>(&lookup, "ECHO_MAX_RECONNECT_ATTEMPTS")? {
            config.max_reconnect_attempts = n;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "ECHO_HEALTH_CHECK_INTERVAL_MS")? {
            config.health_check_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "ECHO_METRICS_FLUSH_INTERVAL_MS")? {
            config.metrics_flush_interval = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<usize>(&lookup, "ECHO_METRICS_BATCH_SIZE")? {
            config.metrics_batch_size = n;
        }
        if let Some(environment) = lookup("ECHO_ENVIRONMENT") {
            config.environment = environment;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.socket_url()?;
        if self.reconnect_base_delay.is_zero() {
            return Err(RealtimeError::Config(
                "reconnect base delay must be greater than zero".to_string(),
            ));
        }
        if self.metrics_batch_size == 0 {
            return Err(RealtimeError::Config(
                "metrics batch size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// WebSocket URL for the Engine.IO transport.
    pub fn socket_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(RealtimeError::Config(format!(
                    "unsupported endpoint scheme '{}'",
                    other
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| RealtimeError::Config(format!("cannot use scheme '{}'", scheme)))?;
        url.set_path(&self.socket_path);
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("EIO", ENGINE_IO_VERSION)
            .append_pair("transport", TRANSPORT_WEBSOCKET);
        Ok(url)
    }

    /// Base URL for the REST endpoints.
    pub fn http_base(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)?;
        let scheme = match url.scheme() {
            "ws" | "http" => "http",
            "wss" | "https" => "https",
            other => {
                return Err(RealtimeError::Config(format!(
                    "unsupported endpoint scheme '{}'",
                    other
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| RealtimeError::Config(format!("cannot use scheme '{}'", scheme)))?;
        url.set_query(None);
        Ok(url)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RealtimeError::Config(format!("{}='{}': {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(20));
        assert_eq!(config.reconnect_base_delay, Duration::from_secs(2));
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.metrics_batch_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_url_from_http_endpoint() {
        let config = ClientConfig::new("https://echo.example.com");
        assert_eq!(
            config.socket_url().unwrap().as_str(),
            "wss://echo.example.com/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_socket_url_keeps_port_and_drops_query() {
        let config = ClientConfig::new("ws://localhost:5000/?foo=bar");
        assert_eq!(
            config.socket_url().unwrap().as_str(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_http_base_from_ws_endpoint() {
        let config = ClientConfig::new("wss://echo.example.com");
        assert_eq!(
            config.http_base().unwrap().as_str(),
            "https://echo.example.com/"
        );
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let config = ClientConfig::new("ftp://echo.example.com");
        assert!(matches!(config.validate(), Err(RealtimeError::Config(_))));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("ECHO_ENDPOINT", "http://10.0.0.5:8080"),
            ("ECHO_RECONNECT_BASE_DELAY_MS", "500"),
            ("ECHO_MAX_RECONNECT_ATTEMPTS", "3"),
            ("ECHO_ENVIRONMENT", "staging"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "http://10.0.0.5:8080");
        assert_eq!(config.reconnect_base_delay, Duration::from_millis(500));
        assert_eq!(config.max_reconnect_attempts, 3);
        assert_eq!(config.environment, "staging");
        assert_eq!(config.connect_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = ClientConfig::from_lookup(lookup_from(&[("ECHO_METRICS_BATCH_SIZE", "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains("ECHO_METRICS_BATCH_SIZE"));

        let err = ClientConfig::from_lookup(lookup_from(&[("ECHO_METRICS_BATCH_SIZE", "0")]))
            .unwrap_err();
        assert!(matches!(err, RealtimeError::Config(_)));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        // SAFETY: serialized with every other env-mutating test
        unsafe {
            std::env::set_var("ECHO_CONNECT_TIMEOUT_MS", "1500");
        }
        let config = ClientConfig::from_env();
        unsafe {
            std::env::remove_var("ECHO_CONNECT_TIMEOUT_MS");
        }

        assert_eq!(config.unwrap().connect_timeout, Duration::from_millis(1500));
    }
}

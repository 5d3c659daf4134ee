use crate::messaging::Handshake;
use std::time::Duration;

/// Liveness window negotiated in the Engine.IO handshake.
///
/// The server sends a ping every `ping_interval` and expects a pong within
/// `ping_timeout`. If nothing at all arrives for the sum of both, the
/// connection is treated as dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    ping_interval: Duration,
    ping_timeout: Duration,
}

impl Heartbeat {
    pub fn new(ping_interval: Duration, ping_timeout: Duration) -> Self {
        Self {
            ping_interval,
            ping_timeout,
        }
    }

    pub fn from_handshake(handshake: &Handshake) -> Self {
        Self::new(handshake.ping_interval(), handshake.ping_timeout())
    }

    /// Longest silence tolerated on the read side.
    pub fn deadline(&self) -> Duration {
        self.ping_interval.saturating_add(self.ping_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_from_handshake() {
        let handshake = Handshake {
            sid: "sid".to_string(),
            upgrades: Vec::new(),
            ping_interval: 25_000,
            ping_timeout: 20_000,
            max_payload: None,
        };
        assert_eq!(
            Heartbeat::from_handshake(&handshake).deadline(),
            Duration::from_secs(45)
        );
    }
}

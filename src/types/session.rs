use serde::{Deserialize, Serialize};
use std::fmt;

/// Client-chosen identifier grouping one user's generation/feedback exchanges.
///
/// Only lives as long as the client that created it; nothing persists it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a fresh `session_<unix millis>` identifier.
    pub fn generate() -> Self {
        Self(format!("session_{}", chrono::Utc::now().timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_session_id_format() {
        let id = SessionId::generate();
        let millis = id
            .as_str()
            .strip_prefix("session_")
            .expect("missing session_ prefix");
        assert!(millis.parse::<i64>().is_ok(), "suffix should be millis: {id}");
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let id = SessionId::from("s1");
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("s1"));
    }
}

//! Image generation over whichever path is available.
//!
//! With a live realtime connection the request is streamed: a session is
//! created and joined, and results arrive as `generation_*` events. Otherwise
//! the blocking REST endpoint is called and the URLs come back directly.

use crate::client::RealtimeClient;
use crate::infrastructure::{MetricsBuffer, RestClient};
use crate::types::{RealtimeError, Result, SessionId};
use std::sync::Arc;
use tokio::time::Instant;

/// What the user asked for. Style and color scheme are folded into the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub requirements: String,
    pub style: Option<String>,
    pub color_scheme: Option<String>,
    /// Prefer the streamed path when connected
    pub realtime: bool,
}

impl GenerationRequest {
    pub fn new(requirements: impl Into<String>) -> Self {
        Self {
            requirements: requirements.into(),
            style: None,
            color_scheme: None,
            realtime: true,
        }
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn color_scheme(mut self, color_scheme: impl Into<String>) -> Self {
        self.color_scheme = Some(color_scheme.into());
        self
    }

    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// The text sent to the backend.
    pub fn prompt(&self) -> String {
        let mut prompt = self.requirements.trim().to_string();
        if let Some(style) = &self.style {
            prompt.push_str(&format!(". Style: {}", style));
        }
        if let Some(color_scheme) = &self.color_scheme {
            prompt.push_str(&format!(". Color scheme: {}", color_scheme));
        }
        if self.style.is_some() || self.color_scheme.is_some() {
            prompt.push('.');
        }
        prompt
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Progress and results will arrive as events for this session
    Streaming { session_id: SessionId },
    /// The REST endpoint answered with the finished images
    Completed { image_urls: Vec<String> },
}

pub struct GenerationService {
    client: RealtimeClient,
    rest: Arc<RestClient>,
    metrics: Option<Arc<MetricsBuffer>>,
    user_id: String,
}

impl GenerationService {
    pub fn new(client: RealtimeClient, rest: Arc<RestClient>) -> Self {
        Self {
            client,
            rest,
            metrics: None,
            user_id: format!("user_{}", chrono::Utc::now().timestamp_millis()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsBuffer>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn generate(&self, requirements: &str, realtime: bool) -> Result<GenerationOutcome> {
        self.submit(&GenerationRequest::new(requirements).realtime(realtime))
            .await
    }

    /// Runs one generation request.
    ///
    /// # Errors
    ///
    /// [`RealtimeError::InvalidInput`] for blank requirements or when the REST
    /// endpoint returns no images. Transport and HTTP errors pass through.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        if request.requirements.trim().is_empty() {
            return Err(RealtimeError::InvalidInput(
                "Please provide design requirements".to_string(),
            ));
        }

        let prompt = request.prompt();
        let streamed = request.realtime && self.client.is_connected();
        self.record(if streamed { "realtime" } else { "rest" }).await;
        if let Some(metrics) = &self.metrics {
            metrics.track_generation();
        }

        if streamed {
            let session_id = SessionId::generate();
            self.client
                .join_session(session_id.clone(), self.user_id.clone())
                .await?;
            self.client
                .start_generation(prompt, Some(session_id.clone()))
                .await?;
            tracing::info!(session = %session_id, "Started realtime generation");
            return Ok(GenerationOutcome::Streaming { session_id });
        }

        if request.realtime {
            tracing::info!("Realtime connection unavailable, using REST generation");
        }
        let started = Instant::now();
        let result = self.rest.generate_images(&prompt).await;
        if let Some(metrics) = &self.metrics {
            metrics.track_request(started.elapsed(), result.is_ok());
        }
        let image_urls = result?;
        if image_urls.is_empty() {
            return Err(RealtimeError::InvalidInput(
                "No images generated".to_string(),
            ));
        }
        Ok(GenerationOutcome::Completed { image_urls })
    }

    async fn record(&self, path: &str) {
        if let Some(metrics) = &self.metrics {
            metrics
                .record(
                    "generation_request",
                    "1",
                    [("path".to_string(), path.to_string())],
                )
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_preferences_is_trimmed_requirements() {
        let request = GenerationRequest::new("  a lighthouse at dusk ");
        assert_eq!(request.prompt(), "a lighthouse at dusk");
    }

    #[test]
    fn test_prompt_folds_in_style_and_colors() {
        let request = GenerationRequest::new("a lighthouse")
            .style("watercolor")
            .color_scheme("warm");
        assert_eq!(
            request.prompt(),
            "a lighthouse. Style: watercolor. Color scheme: warm."
        );
    }

    #[test]
    fn test_realtime_is_default() {
        assert!(GenerationRequest::new("x").realtime);
        assert!(!GenerationRequest::new("x").realtime(false).realtime);
    }
}

use crate::types::constants::rest_paths;
use crate::types::{RealtimeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Cloud services whose health endpoints the backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudService {
    Lambda,
    DynamoDb,
    Bedrock,
}

impl CloudService {
    pub const ALL: [CloudService; 3] = [Self::Lambda, Self::DynamoDb, Self::Bedrock];

    /// Path segment under `/api/aws/`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lambda => "lambda",
            Self::DynamoDb => "dynamodb",
            Self::Bedrock => "bedrock",
        }
    }
}

impl fmt::Display for CloudService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One buffered metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: String,
    /// Unix millis
    pub timestamp: i64,
    pub tags: std::collections::BTreeMap<String, String>,
}

#[derive(Serialize)]
struct GenerateImagesRequest<'a> {
    requirements: &'a str,
}

#[derive(Deserialize)]
struct GenerateImagesResponse {
    #[serde(default)]
    image_urls: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Serialize)]
struct MetricsBatch<'a> {
    metrics: &'a [Metric],
}

/// Plain request/response calls to the backend, used when the realtime
/// channel is not wanted or not available.
#[derive(Debug, Clone)]
pub struct RestClient {
    base: Url,
    http: reqwest::Client,
}

impl RestClient {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            http: reqwest::Client::new(),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// Generates images synchronously via `POST /api/briefing/generate-images`.
    pub async fn generate_images(&self, requirements: &str) -> Result<Vec<String>> {
        let response = self
            .http
            .post(self.url(rest_paths::GENERATE_IMAGES)?)
            .json(&GenerateImagesRequest { requirements })
            .send()
            .await
            .map_err(|e| RealtimeError::Connection(format!("Image generation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| status.to_string());
            return Err(RealtimeError::Connection(format!(
                "Image generation failed with status {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let body: GenerateImagesResponse = response.json().await?;
        tracing::debug!("REST generation returned {} images", body.image_urls.len());
        Ok(body.image_urls)
    }

    /// `true` for a 2xx answer from `/api/aws/<service>/health`, `false` for any
    /// other status. Transport failures are errors.
    pub async fn probe(&self, service: CloudService) -> Result<bool> {
        let path = format!("{}/{}/health", rest_paths::HEALTH_PREFIX, service);
        let response = self.http.get(self.url(&path)?).send().await?;
        let healthy = response.status().is_success();
        if !healthy {
            tracing::debug!(
                service = %service,
                "Health check failed: {}",
                response.status()
            );
        }
        Ok(healthy)
    }

    pub async fn post_metrics(&self, metrics: &[Metric]) -> Result<()> {
        let response = self
            .http
            .post(self.url(rest_paths::METRICS)?)
            .json(&MetricsBatch { metrics })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RealtimeError::Connection(format!(
                "Metrics upload of {} samples failed with status: {}",
                metrics.len(),
                response.status()
            )));
        }
        Ok(())
    }
}

use super::http::{CloudService, RestClient};
use super::metrics::MetricsBuffer;
use crate::client::RealtimeClient;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Last known status of the services behind the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthBoard {
    pub lambda: bool,
    pub dynamodb: bool,
    pub bedrock: bool,
    pub websocket: bool,
    pub checked_at: Option<DateTime<Utc>>,
}

impl HealthBoard {
    pub fn service(&self, service: CloudService) -> bool {
        match service {
            CloudService::Lambda => self.lambda,
            CloudService::DynamoDb => self.dynamodb,
            CloudService::Bedrock => self.bedrock,
        }
    }

    pub fn all_healthy(&self) -> bool {
        self.lambda && self.dynamodb && self.bedrock && self.websocket
    }
}

/// Polls the health endpoints and the realtime connection.
///
/// Nothing here is fatal: a failing probe only flips its flag on the board.
pub struct HealthMonitor {
    rest: Arc<RestClient>,
    client: RealtimeClient,
    metrics: Option<Arc<MetricsBuffer>>,
    board: RwLock<HealthBoard>,
}

impl HealthMonitor {
    pub fn new(rest: Arc<RestClient>, client: RealtimeClient) -> Self {
        Self {
            rest,
            client,
            metrics: None,
            board: RwLock::new(HealthBoard::default()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsBuffer>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Probes every service concurrently and updates the board.
    pub async fn check_all(&self) -> HealthBoard {
        let (lambda, dynamodb, bedrock) = futures::join!(
            self.check(CloudService::Lambda),
            self.check(CloudService::DynamoDb),
            self.check(CloudService::Bedrock),
        );

        let websocket = self.client.is_connected();
        if !websocket {
            tracing::warn!("Realtime connection check failed: not connected");
        }
        self.record("websocket_connection", websocket).await;

        let board = HealthBoard {
            lambda,
            dynamodb,
            bedrock,
            websocket,
            checked_at: Some(Utc::now()),
        };
        *self.board.write().await = board.clone();
        board
    }

    async fn check(&self, service: CloudService) -> bool {
        let healthy = match self.rest.probe(service).await {
            Ok(true) => {
                tracing::debug!(service = %service, "Health check passed");
                true
            }
            Ok(false) => {
                tracing::warn!(service = %service, "Health check returned a failure status");
                false
            }
            Err(e) => {
                tracing::warn!(service = %service, "Health check failed: {}", e);
                false
            }
        };
        self.record(&format!("{}_connection", service), healthy).await;
        healthy
    }

    async fn record(&self, name: &str, healthy: bool) {
        if let Some(metrics) = &self.metrics {
            let value = if healthy { "success" } else { "failed" };
            metrics.record(name, value, std::iter::empty()).await;
        }
    }

    pub async fn board(&self) -> HealthBoard {
        self.board.read().await.clone()
    }

    /// Runs [`check_all`](Self::check_all) immediately and then every `interval`.
    pub fn spawn(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let monitor = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(monitor) = monitor.upgrade() else {
                    break;
                };
                let board = monitor.check_all().await;
                tracing::info!(
                    lambda = board.lambda,
                    dynamodb = board.dynamodb,
                    bedrock = board.bedrock,
                    websocket = board.websocket,
                    "Service health updated"
                );
            }
            tracing::debug!("Health monitor task finished");
        })
    }
}

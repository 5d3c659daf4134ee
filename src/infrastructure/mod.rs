// Infrastructure module - background services and utilities around the client
pub mod backoff;
pub mod health;
pub mod heartbeat;
pub mod http;
pub mod metrics;
pub mod notify;
pub mod task_manager;

pub use backoff::Backoff;
pub use health::{HealthBoard, HealthMonitor};
pub use heartbeat::Heartbeat;
pub use http::{CloudService, Metric, RestClient};
pub use metrics::{MetricsBuffer, PerformanceSummary};
pub use notify::{LogNotifier, Notification, Notifier, Severity};
pub(crate) use notify::deliver;
pub use task_manager::TaskManager;

use echo_realtime::{ClientConfig, HealthMonitor, MetricsBuffer, RealtimeClient, RestClient};
use std::sync::Arc;

/// Polls service health and uploads the results as metrics until Ctrl-C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    let rest = Arc::new(RestClient::new(config.http_base()?));
    let metrics = Arc::new(MetricsBuffer::new(
        Arc::clone(&rest),
        config.metrics_batch_size,
        config.environment.clone(),
    ));
    let flush_task = metrics.spawn_periodic_flush(config.metrics_flush_interval);
    let interval = config.health_check_interval;

    let client = RealtimeClient::new(config)?;
    if let Err(e) = client.connect().await {
        println!("Realtime connection failed: {}", e);
    }

    let monitor = Arc::new(HealthMonitor::new(rest, client.clone()).with_metrics(Arc::clone(&metrics)));
    let health_task = monitor.spawn(interval);

    tokio::signal::ctrl_c().await?;

    health_task.abort();
    flush_task.abort();
    let board = monitor.board().await;
    println!(
        "lambda={} dynamodb={} bedrock={} websocket={}",
        board.lambda, board.dynamodb, board.bedrock, board.websocket
    );
    println!("flushed {} remaining metrics", metrics.flush().await);

    client.shutdown().await?;
    Ok(())
}

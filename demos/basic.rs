use echo_realtime::{ClientConfig, EventKind, RealtimeClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ECHO_ENDPOINT and friends, from the environment or .env
    let client = RealtimeClient::new(ClientConfig::from_env()?)?;

    client.on(EventKind::Status, |event| println!("status: {:?}", event));
    client.on(EventKind::Reconnecting, |event| println!("{:?}", event));

    println!("Connecting to {}...", client.config().endpoint);
    client.connect().await?;
    println!("Connected!");

    // Keep connection alive
    tokio::signal::ctrl_c().await?;

    println!("Disconnecting...");
    client.shutdown().await?;
    println!("Disconnected!");

    Ok(())
}

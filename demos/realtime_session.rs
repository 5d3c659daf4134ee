use echo_realtime::{
    ClientConfig, EventKind, GenerationOutcome, GenerationService, RealtimeClient, RealtimeEvent,
    RestClient,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Streams one generation and sends feedback on the first image.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let requirements = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "A minimalist poster for a jazz night".to_string());

    let config = ClientConfig::from_env()?;
    let rest = Arc::new(RestClient::new(config.http_base()?));
    let client = RealtimeClient::new(config)?;

    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    client.on(EventKind::GenerationProgress, |event| {
        if let RealtimeEvent::GenerationProgress(progress) = event {
            println!("[{:>5.1}%] {}", progress.progress, progress.status);
        }
    });
    let complete_tx = done_tx.clone();
    client.on(EventKind::GenerationComplete, move |event| {
        if let RealtimeEvent::GenerationComplete(complete) = event {
            let _ = complete_tx.send(Ok(complete.images.clone()));
        }
    });
    client.on(EventKind::GenerationError, move |event| {
        if let RealtimeEvent::GenerationError(error) = event {
            let _ = done_tx.send(Err(error.message_or("generation failed").to_string()));
        }
    });

    if let Err(e) = client.connect().await {
        println!("Realtime unavailable ({}), using REST", e);
    }

    let service = GenerationService::new(client.clone(), rest);
    let images = match service.generate(&requirements, true).await? {
        GenerationOutcome::Completed { image_urls } => image_urls,
        GenerationOutcome::Streaming { session_id } => {
            println!("Streaming generation in {}", session_id);
            match done_rx.recv().await {
                Some(Ok(images)) => images,
                Some(Err(message)) => return Err(message.into()),
                None => return Err("client went away".into()),
            }
        }
    };

    for url in &images {
        println!("image: {}", url);
    }

    if let Some(first) = images.first()
        && client.is_connected()
    {
        client.on(EventKind::FeedbackComplete, |event| {
            if let RealtimeEvent::FeedbackComplete(result) = event {
                println!("feedback: {} -> {:?}", result.response, result.new_image_url);
            }
        });
        client.send_feedback(first.clone(), "Make it warmer", None).await?;
        tokio::signal::ctrl_c().await?;
    }

    client.shutdown().await?;
    Ok(())
}

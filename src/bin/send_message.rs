// Producer demo: obtain a client-credentials token and publish one
// message onto the relay queue.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_gateway::auth::TokenClient;
use relay_gateway::broker::RelayProducer;
use relay_gateway::config::Config;
use relay_gateway::relay::OutboundPublisher;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to read configuration")?;

    let tokens = TokenClient::from_config(&config).context("Failed to build token client")?;
    let producer = RelayProducer::new(&config.broker)?;
    let publisher = OutboundPublisher::new(tokens, producer, &config.credential_header);

    let payload = format!("hello world @ {}", chrono::Utc::now().timestamp_millis());
    let message_id = publisher.send(&payload).await?;

    tracing::info!(message_id = %message_id, "sent");
    Ok(())
}

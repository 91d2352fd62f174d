// ============================================================================
// Relay Gateway - Consumer Entry Point
// ============================================================================
//
// Consumes envelopes from the durable queue and runs each one through the
// secure inbound pipeline. Offsets commit only after a terminal outcome,
// so a crash mid-message redelivers rather than loses it.
//
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_gateway::audit;
use relay_gateway::auth::{
    AuthorizationGate, Policy, RemoteKeySet, SubjectTranslator, TokenValidator,
};
use relay_gateway::broker::{MessageSource, RelayConsumer};
use relay_gateway::config::Config;
use relay_gateway::relay::{LoggingDispatcher, MessageEnvelope, SecureInboundPipeline};

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

    let keys = RemoteKeySet::new(
        &config.auth.issuer_uri,
        Duration::from_secs(config.auth.http_timeout_secs),
        Duration::from_secs(config.auth.jwks_cache_ttl_secs),
    )
    .context("Failed to build key source")?;

    let validator = TokenValidator::from_config(Arc::new(keys), &config.auth, &config.log_hash_salt);

    let pipeline = SecureInboundPipeline::new(
        validator,
        Arc::new(SubjectTranslator),
        AuthorizationGate::new(Policy::RequireAuthenticated),
        Arc::new(LoggingDispatcher),
        &config.credential_header,
    );

    let consumer = RelayConsumer::new(&config.broker)?;

    info!(
        destination = %config.broker.destination,
        issuer = %config.auth.issuer_uri,
        "relay gateway started"
    );

    run(&consumer, &pipeline, &config.log_hash_salt).await
}

async fn run(
    consumer: &RelayConsumer,
    pipeline: &SecureInboundPipeline,
    hash_salt: &str,
) -> Result<()> {
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("shutdown signal received");
                return Ok(());
            }
            delivered = consumer.next() => {
                match delivered {
                    Ok(Some(wire)) => {
                        if let Err(reason) = wire.validate() {
                            warn!(reason = %reason, "dropping structurally invalid envelope");
                            consumer.commit().await?;
                            continue;
                        }

                        let message_id = wire.message_id.clone();
                        let outcome = pipeline.deliver(MessageEnvelope::from(wire)).await;
                        audit::record_outcome(&message_id, &outcome, hash_salt);

                        // Terminal either way: this component never re-queues
                        consumer.commit().await?;
                    }
                    Ok(None) => {
                        info!("message source closed");
                        return Ok(());
                    }
                    Err(e) => {
                        error!(error = %e, "consumer error, backing off");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }
}

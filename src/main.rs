use anyhow::{Context, Result};
use std::sync::Arc;

use fusion_jwt_client::auth::{CredentialManager, HttpAuthEndpoint};
use fusion_jwt_client::config::Config;
use fusion_jwt_client::error::FatalError;
use fusion_jwt_client::query::RequestIssuer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("🚀 Fusion JWT client {} starting...", env!("CARGO_PKG_VERSION"));
    tracing::debug!("API: {}, user: {}", config.api_url, config.user);

    // One client for both the renewal task and the query loop
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to create HTTP client")?;

    let endpoint = HttpAuthEndpoint::new(
        client.clone(),
        config.token_url(),
        config.user.clone(),
        config.password.clone(),
    );
    let manager = Arc::new(CredentialManager::new(endpoint));

    // The first token is in place before any query can run
    let renewal = match manager.start().await {
        Ok(handle) => handle,
        Err(e) => exit_fatal(e),
    };

    let issuer = RequestIssuer::new(client, config.full_query_url(), manager.token_reader());
    tracing::info!(
        "Querying {} every {} milliseconds...",
        issuer.url(),
        config.interval.as_millis()
    );

    // Neither side returns unless something went wrong
    let err = tokio::select! {
        result = renewal.wait() => match result {
            Ok(err) => err,
            Err(e) => return Err(e).context("Token renewal task ended unexpectedly"),
        },
        result = issuer.run(config.interval) => match result {
            Ok(never) => match never {},
            Err(err) => err,
        },
    };

    exit_fatal(err)
}

/// Log a fatal error and terminate with its exit code
fn exit_fatal(err: FatalError) -> ! {
    tracing::error!(
        kind = ?err.kind(),
        status = ?err.status(),
        "{}. Exiting...",
        err
    );
    std::process::exit(err.exit_code());
}

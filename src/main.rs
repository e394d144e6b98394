// Load configuration
// Set up logging
// Open the wallet store and snapshot cache
// Build clients for the enabled providers
// Aggregate the wallet given on the command line and print the result,
// or with --saved print what is already stored for it

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_aggregator::{provider, service, AppState, Aggregator, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let saved_only = match args.iter().position(|arg| arg == "--saved") {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    };
    let wallet_address = args.into_iter().next().unwrap_or_default();

    let config = Config::from_env();
    tracing::info!(
        "Configuration loaded: database {}, timeout {:?}",
        config.database_url,
        config.aggregate_timeout
    );

    let providers = provider::build_providers(&config)?;
    let state = Arc::new(AppState::connect(config).await?);
    tracing::info!("Database connection established");

    if saved_only {
        let data = service::fetch_saved_data(&state, &wallet_address).await?;
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding providers");
            signal_token.cancel();
        }
    });

    let aggregator = Aggregator::new(state, providers);
    let outcome = aggregator.aggregate(&wallet_address, &shutdown).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

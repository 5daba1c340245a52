use chrono::Local;
use shared::config::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod datasets;
mod warmup;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before the subscriber so RUST_LOG from it applies
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Vantage dashboard");

    match dotenv {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env();
    info!(
        "Using {} store (data dir: {})",
        config.store.name(),
        config.data_dir
    );

    let store = match storage_engine::open_store(&config.store) {
        Ok(store) => store,
        Err(e) if config.store.is_durable() => {
            warn!(
                "Failed to open durable store: {}. Running in-memory mode.",
                e
            );
            storage_engine::open_store(&config.fallback_store())?
        }
        Err(e) => return Err(e.into()),
    };

    let today = Local::now().date_naive();
    let report = warmup::warm_dashboard(store, today);

    if report.dropped > 0 {
        warn!(
            "{} dataset(s) could not be cached and will be rebuilt on next load",
            report.dropped
        );
    }

    Ok(())
}

mod aggregator;
mod api;
mod catalog;
mod config;
mod model;
mod normalizer;
mod parser;
mod scraper;
mod utils;

use api::AppState;
use catalog::ItemCatalog;
use config::load_config;
use scraper::{FetchClient, Fetcher};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {}", panic_info);
    }));

    let config_path = std::env::var("SKYBLOCK_LENS_CONFIG").unwrap_or_else(|_| "config.json".into());
    let config = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    // A missing catalog degrades to an empty one; /api/health reports the cause
    let (catalog, catalog_error) = match ItemCatalog::load(&config.catalog_path) {
        Ok(catalog) => (catalog, None),
        Err(e) => {
            warn!("Failed to load item catalog from {}: {}", config.catalog_path, e);
            (ItemCatalog::default(), Some(e.to_string()))
        }
    };

    let fetcher: Arc<dyn Fetcher> = match FetchClient::new(&config.fetch, &config.user_agent) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    let state = match AppState::new(config.clone(), Arc::new(catalog), catalog_error, fetcher) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize scraper: {}", e);
            return;
        }
    };

    let addr = config.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };

    info!("SkyBlock API listening on {}", addr);
    if let Err(e) = axum::serve(listener, api::router(state)).await {
        error!("Server error: {}", e);
    }
}

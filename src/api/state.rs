use std::sync::Arc;

use crate::aggregator::{HealthService, ItemService};
use crate::catalog::ItemCatalog;
use crate::config::AppConfig;
use crate::model::ScraperError;
use crate::scraper::{Fetcher, PatchNoteScraper};

/// Shared, read-only state handed to every request.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub items: ItemService,
    pub scraper: Arc<PatchNoteScraper>,
    pub health: HealthService,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        catalog: Arc<ItemCatalog>,
        catalog_error: Option<String>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, ScraperError> {
        let scraper = Arc::new(PatchNoteScraper::new(fetcher.clone(), &config)?);
        Ok(Self {
            items: ItemService::new(catalog.clone(), fetcher.clone(), &config),
            health: HealthService::new(catalog, catalog_error, fetcher, scraper.clone(), &config),
            scraper,
            config,
        })
    }
}

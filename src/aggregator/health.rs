use crate::catalog::ItemCatalog;
use crate::config::AppConfig;
use crate::scraper::{FetchOptions, Fetcher, PatchNoteScraper};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct CatalogHealth {
    pub ok: bool,
    pub count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpstreamHealth {
    pub ok: bool,
    pub sample: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    #[serde(rename = "neuDB")]
    pub neu_db: CatalogHealth,
    #[serde(rename = "bazaarAPI")]
    pub bazaar_api: UpstreamHealth,
    pub patchnotes: UpstreamHealth,
    pub timestamp: DateTime<Utc>,
}

/// Runs one cheap probe per dependency. Probes never fail the report.
pub struct HealthService {
    catalog: Arc<ItemCatalog>,
    catalog_error: Option<String>,
    fetcher: Arc<dyn Fetcher>,
    scraper: Arc<PatchNoteScraper>,
    probe_opts: FetchOptions,
    bazaar_url: String,
    patchnotes_url: String,
}

impl HealthService {
    pub fn new(
        catalog: Arc<ItemCatalog>,
        catalog_error: Option<String>,
        fetcher: Arc<dyn Fetcher>,
        scraper: Arc<PatchNoteScraper>,
        config: &AppConfig,
    ) -> Self {
        Self {
            catalog,
            catalog_error,
            fetcher,
            scraper,
            probe_opts: FetchOptions {
                max_retries: 1,
                ..FetchOptions::from_config(&config.fetch)
            },
            bazaar_url: config.bazaar_url.clone(),
            patchnotes_url: config.patchnotes_url.clone(),
        }
    }

    pub async fn report(&self) -> HealthReport {
        let (bazaar_api, patchnotes) = futures::join!(self.probe_bazaar(), self.probe_patchnotes());
        HealthReport {
            neu_db: CatalogHealth {
                ok: self.catalog_error.is_none() && !self.catalog.is_empty(),
                count: self.catalog.len(),
                error: self.catalog_error.clone(),
            },
            bazaar_api,
            patchnotes,
            timestamp: Utc::now(),
        }
    }

    async fn probe_bazaar(&self) -> UpstreamHealth {
        match self.fetcher.fetch_json(&self.bazaar_url, &self.probe_opts).await {
            Ok(Some(payload)) => UpstreamHealth {
                ok: true,
                sample: first_product(&payload),
                error: None,
            },
            Ok(None) => UpstreamHealth {
                ok: false,
                sample: None,
                error: Some("no data (404)".into()),
            },
            Err(e) => {
                warn!("Bazaar health probe failed: {}", e);
                UpstreamHealth {
                    ok: false,
                    sample: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn probe_patchnotes(&self) -> UpstreamHealth {
        let result = self
            .scraper
            .scrape_with(&self.patchnotes_url, 1, false, &self.probe_opts)
            .await;
        match result {
            Ok(entries) => UpstreamHealth {
                ok: !entries.is_empty(),
                sample: entries.into_iter().next().map(|e| e.title),
                error: None,
            },
            Err(e) => {
                warn!("Patch notes health probe failed: {}", e);
                UpstreamHealth {
                    ok: false,
                    sample: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn first_product(payload: &Value) -> Option<String> {
    payload
        .get("products")
        .unwrap_or(payload)
        .as_object()
        .and_then(|products| products.keys().next().cloned())
}

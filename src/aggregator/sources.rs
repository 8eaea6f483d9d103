use crate::catalog::ItemCatalog;
use crate::config::AppConfig;
use crate::model::{BazaarQuote, FetchError, ItemLookupError, ItemResponse};
use crate::normalizer::resolve;
use crate::scraper::{FetchOptions, Fetcher};

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one upstream call within an aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome<T> {
    Available(T),
    /// Upstream answered, but has nothing for this item.
    Empty,
    /// Upstream failed after retries; the reason is kept for logging.
    Unavailable(String),
}

impl<T> SourceOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            SourceOutcome::Available(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SourceOutcome::Unavailable(_))
    }

    fn from_fetch(result: Result<Option<Value>, FetchError>, pick: impl FnOnce(Value) -> Option<T>) -> Self {
        match result {
            Ok(Some(value)) => pick(value).map_or(SourceOutcome::Empty, SourceOutcome::Available),
            Ok(None) => SourceOutcome::Empty,
            Err(e) => SourceOutcome::Unavailable(e.to_string()),
        }
    }
}

/// Resolves an item and merges the economy quote and auction history.
pub struct ItemService {
    catalog: Arc<ItemCatalog>,
    fetcher: Arc<dyn Fetcher>,
    opts: FetchOptions,
    bazaar_url: String,
    auction_history_url: String,
}

impl ItemService {
    pub fn new(catalog: Arc<ItemCatalog>, fetcher: Arc<dyn Fetcher>, config: &AppConfig) -> Self {
        Self {
            catalog,
            fetcher,
            opts: FetchOptions::from_config(&config.fetch),
            bazaar_url: config.bazaar_url.clone(),
            auction_history_url: config.auction_history_url.clone(),
        }
    }

    /// Only an unresolvable identifier fails; each upstream degrades to null.
    pub async fn get_item(&self, raw_input: &str) -> Result<ItemResponse, ItemLookupError> {
        if raw_input.is_empty() {
            return Err(ItemLookupError::MissingIdentifier);
        }
        let entry = resolve(&self.catalog, raw_input)
            .and_then(|id| self.catalog.get(id))
            .ok_or_else(|| ItemLookupError::NotFound(raw_input.to_string()))?;
        info!("Resolved '{}' to {}", raw_input, entry.id);

        let (bazaar, history) = futures::join!(self.bazaar_quote(&entry.id), self.auction_history(&entry.id));

        for (source, degraded) in [("bazaar", bazaar.is_degraded()), ("auctionHistory", history.is_degraded())] {
            if degraded {
                warn!("Source {} unavailable for {}", source, entry.id);
            }
        }

        Ok(ItemResponse {
            identifier_input: raw_input.to_string(),
            normalized_id: entry.id.clone(),
            neu: entry.metadata.clone(),
            bazaar: bazaar.into_option(),
            auction_history: history.into_option(),
        })
    }

    pub async fn bazaar_quote(&self, id: &str) -> SourceOutcome<BazaarQuote> {
        let result = self.fetcher.fetch_json(&self.bazaar_url, &self.opts).await;
        if let Ok(Some(payload)) = &result {
            if let Some(cause) = rejected_cause(payload) {
                return SourceOutcome::Unavailable(cause);
            }
        }
        let outcome = SourceOutcome::from_fetch(result, |payload| extract_quote(&payload, id));
        if outcome == SourceOutcome::Empty {
            debug!("No bazaar quote for {}", id);
        }
        outcome
    }

    pub async fn auction_history(&self, id: &str) -> SourceOutcome<Value> {
        let url = self.auction_history_url.replace("{tag}", id);
        let result = self.fetcher.fetch_json(&url, &self.opts).await;
        SourceOutcome::from_fetch(result, |value| (!value.is_null()).then_some(value))
    }
}

/// `{"success": false, "cause": ...}` payloads are upstream refusals.
fn rejected_cause(payload: &Value) -> Option<String> {
    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        let cause = payload.get("cause").and_then(Value::as_str).unwrap_or("request rejected");
        return Some(cause.to_string());
    }
    None
}

/// Finds the product entry for `id` in a full bazaar snapshot. Accepts both
/// `products.<ID>.quick_status` and a flat `<ID>` map.
pub fn extract_quote(payload: &Value, id: &str) -> Option<BazaarQuote> {
    let product = payload
        .get("products")
        .and_then(|products| products.get(id))
        .or_else(|| payload.get(id))
        .filter(|p| p.is_object())?;
    let status = product.get("quick_status").unwrap_or(product);
    Some(BazaarQuote::from_status(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::scraper::FetchClient;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog() -> Arc<ItemCatalog> {
        Arc::new(ItemCatalog::from_entries([
            ("HYPERION".to_string(), json!({"displayname": "Hyperion", "tier": "LEGENDARY"})),
            ("ENCHANTED_COAL".to_string(), json!({"displayname": "Enchanted Coal"})),
        ]))
    }

    fn service(server: &MockServer) -> ItemService {
        let mut config = AppConfig::default();
        config.fetch = FetchConfig {
            backoff_ms: 1,
            max_retries: 2,
            ..FetchConfig::default()
        };
        config.bazaar_url = format!("{}/bazaar", server.uri());
        config.auction_history_url = format!("{}/averageAuction?tag={{tag}}", server.uri());
        let client = FetchClient::new(&config.fetch, "skyblock-lens-test").unwrap();
        ItemService::new(catalog(), Arc::new(client), &config)
    }

    fn bazaar_payload() -> Value {
        json!({
            "success": true,
            "products": {
                "HYPERION": {"quick_status": {
                    "buyPrice": 1.5e9, "sellPrice": 1.4e9, "buyVolume": 3,
                    "sellVolume": 2, "buyMovingWeek": 40, "sellMovingWeek": 35,
                    "buyOrders": 4, "sellOrders": 6
                }}
            }
        })
    }

    #[test]
    fn extracts_nested_and_flat_quotes() {
        let quote = extract_quote(&bazaar_payload(), "HYPERION").unwrap();
        assert_eq!(quote.buy_price, Some(1.5e9));
        assert_eq!(quote.sell_orders, Some(6.0));

        let flat = json!({"ENCHANTED_COAL": {"buyPrice": 12.5}});
        let quote = extract_quote(&flat, "ENCHANTED_COAL").unwrap();
        assert_eq!(quote.buy_price, Some(12.5));
        assert_eq!(quote.sell_price, None);

        assert_eq!(extract_quote(&bazaar_payload(), "ENCHANTED_COAL"), None);
    }

    #[tokio::test]
    async fn merges_both_sources() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bazaar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bazaar_payload()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/averageAuction"))
            .and(query_param("tag", "HYPERION"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"price": 1.2e9}])))
            .mount(&server)
            .await;

        let item = service(&server).get_item("hyp").await.unwrap();
        assert_eq!(item.identifier_input, "hyp");
        assert_eq!(item.normalized_id, "HYPERION");
        assert_eq!(item.neu["tier"], "LEGENDARY");
        assert_eq!(item.bazaar.unwrap().buy_orders, Some(4.0));
        assert_eq!(item.auction_history, Some(json!([{"price": 1.2e9}])));
    }

    #[tokio::test]
    async fn failing_sources_degrade_to_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bazaar"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/averageAuction"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let service = service(&server);
        assert!(service.bazaar_quote("HYPERION").await.is_degraded());
        assert_eq!(service.auction_history("HYPERION").await, SourceOutcome::Empty);

        let item = service.get_item("Hyperion").await.unwrap();
        assert_eq!(item.normalized_id, "HYPERION");
        assert!(item.bazaar.is_none());
        assert!(item.auction_history.is_none());
    }

    #[tokio::test]
    async fn rejected_bazaar_payload_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bazaar"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": false, "cause": "Key throttle"})),
            )
            .mount(&server)
            .await;

        let outcome = service(&server).bazaar_quote("HYPERION").await;
        assert_eq!(outcome, SourceOutcome::Unavailable("Key throttle".into()));
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let server = MockServer::start().await;
        let service = service(&server);
        assert!(matches!(
            service.get_item("doesnotexist").await,
            Err(ItemLookupError::NotFound(_))
        ));
        assert!(matches!(
            service.get_item("").await,
            Err(ItemLookupError::MissingIdentifier)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

// Core structs: CatalogEntry, BazaarQuote, PatchNoteEntry, ItemResponse
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// One item of the static catalog snapshot, keyed by its uppercase id.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: Option<String>,
    pub name: Option<String>,
    /// Lowercased label as stored in the snapshot.
    pub search_name: String,
    /// Lowercased label with `§x` formatting codes removed.
    pub plain_name: String,
    /// Raw snapshot object, passed through as `neu` in item responses.
    pub metadata: Value,
}

impl CatalogEntry {
    /// Display name with a fallback to the secondary name field.
    pub fn label(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BazaarQuote {
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub buy_volume: Option<f64>,
    pub sell_volume: Option<f64>,
    pub buy_moving_week: Option<f64>,
    pub sell_moving_week: Option<f64>,
    pub buy_orders: Option<f64>,
    pub sell_orders: Option<f64>,
}

impl BazaarQuote {
    /// Reads the quote fields from an upstream product status object.
    pub fn from_status(status: &Value) -> Self {
        let num = |key: &str| status.get(key).and_then(Value::as_f64);
        Self {
            buy_price: num("buyPrice"),
            sell_price: num("sellPrice"),
            buy_volume: num("buyVolume"),
            sell_volume: num("sellVolume"),
            buy_moving_week: num("buyMovingWeek"),
            sell_moving_week: num("sellMovingWeek"),
            buy_orders: num("buyOrders"),
            sell_orders: num("sellOrders"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchNoteEntry {
    pub raw_date: String,
    pub normalized_date: String,
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub detailed_content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForumThreadSummary {
    pub title: String,
    pub url: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    pub identifier_input: String,
    pub normalized_id: String,
    pub neu: Value,
    pub bazaar: Option<BazaarQuote>,
    #[serde(rename = "auctionHistory")]
    pub auction_history: Option<Value>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("empty body")]
    EmptyBody,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("listing fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog root must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum ItemLookupError {
    #[error("Missing 'identifier' query parameter")]
    MissingIdentifier,
    #[error("Item not found in NEU database: {0}")]
    NotFound(String),
}

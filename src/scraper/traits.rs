use crate::model::FetchError;
use crate::scraper::fetcher::FetchOptions;
use serde_json::Value;

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// `Ok(None)` means the upstream answered 404, i.e. it has no data.
    async fn fetch_json(&self, url: &str, opts: &FetchOptions) -> Result<Option<Value>, FetchError>;

    async fn fetch_html(&self, url: &str, opts: &FetchOptions) -> Result<String, FetchError>;
}

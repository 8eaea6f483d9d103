use crate::config::FetchConfig;
use crate::model::FetchError;
use crate::scraper::traits::Fetcher;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::future::Future;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl FetchOptions {
    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_millis(cfg.timeout_ms),
            max_retries: cfg.max_retries,
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Fixed-interval retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay to wait after `attempt` (1-based) failed, or `None` once the
    /// budget is spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.backoff)
    }
}

/// Result of a single request attempt.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    NoData,
    Retry(FetchError),
}

pub struct FetchClient {
    client: Client,
    backoff: Duration,
    min_body_len: usize,
}

impl FetchClient {
    pub fn new(cfg: &FetchConfig, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            backoff: Duration::from_millis(cfg.backoff_ms),
            min_body_len: cfg.min_body_len,
        })
    }

    fn policy(&self, opts: &FetchOptions) -> RetryPolicy {
        RetryPolicy::new(opts.max_retries, self.backoff)
    }

    /// Drives attempts until one succeeds, reports no data, or the policy
    /// runs out. The error of the last attempt is returned.
    async fn run<T, F, Fut>(&self, url: &str, policy: RetryPolicy, mut attempt: F) -> Result<Option<T>, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AttemptOutcome<T>>,
    {
        let mut attempt_no = 0;
        loop {
            attempt_no += 1;
            match attempt().await {
                AttemptOutcome::Success(value) => return Ok(Some(value)),
                AttemptOutcome::NoData => {
                    debug!("No data at {}", url);
                    return Ok(None);
                }
                AttemptOutcome::Retry(err) => {
                    warn!("Fetch attempt {} for {} failed: {}", attempt_no, url, err);
                    match policy.next_delay(attempt_no) {
                        Some(delay) => sleep(delay).await,
                        None => return Err(err),
                    }
                }
            }
        }
    }

    /// One GET bounded by `limit`. `Ok(None)` is a 404.
    async fn attempt_text(&self, url: &str, limit: Duration) -> AttemptOutcome<String> {
        let request = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::Http(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            response
                .text()
                .await
                .map(Some)
                .map_err(|e| FetchError::Http(e.to_string()))
        };

        match timeout(limit, request).await {
            Err(_) => AttemptOutcome::Retry(FetchError::Timeout(limit.as_millis() as u64)),
            Ok(Err(e)) => AttemptOutcome::Retry(e),
            Ok(Ok(None)) => AttemptOutcome::NoData,
            Ok(Ok(Some(body))) => AttemptOutcome::Success(body),
        }
    }
}

/// Parses a JSON body, rejecting bodies too short to be a JSON document.
pub fn parse_json_body(body: &str, min_len: usize) -> Result<Value, FetchError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.len() < min_len {
        return Err(FetchError::EmptyBody);
    }
    serde_json::from_str(trimmed).map_err(|e| FetchError::InvalidJson(e.to_string()))
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    async fn fetch_json(&self, url: &str, opts: &FetchOptions) -> Result<Option<Value>, FetchError> {
        self.run(url, self.policy(opts), move || async move {
            match self.attempt_text(url, opts.timeout).await {
                AttemptOutcome::Success(body) => match parse_json_body(&body, self.min_body_len) {
                    Ok(value) => AttemptOutcome::Success(value),
                    Err(e) => AttemptOutcome::Retry(e),
                },
                AttemptOutcome::NoData => AttemptOutcome::NoData,
                AttemptOutcome::Retry(e) => AttemptOutcome::Retry(e),
            }
        })
        .await
    }

    /// A missing page is an error here, not "no data".
    async fn fetch_html(&self, url: &str, opts: &FetchOptions) -> Result<String, FetchError> {
        self.run(url, self.policy(opts), move || self.attempt_text(url, opts.timeout))
            .await?
            .ok_or(FetchError::Status(StatusCode::NOT_FOUND.as_u16()))
    }
}

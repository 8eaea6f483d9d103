use crate::config::AppConfig;
use crate::model::{ForumThreadSummary, PatchNoteEntry, ScraperError};
use crate::parser::ChangelogParser;
use crate::scraper::fetcher::FetchOptions;
use crate::scraper::traits::Fetcher;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Paginated scraper for the changelog table and the patch-notes forum.
pub struct PatchNoteScraper {
    fetcher: Arc<dyn Fetcher>,
    parser: ChangelogParser,
    opts: FetchOptions,
    max_pages: usize,
    forum_url: String,
}

fn parse_url(url: &str) -> Result<Url, ScraperError> {
    Url::parse(url).map_err(|e| ScraperError::InvalidUrl(format!("{url}: {e}")))
}

impl PatchNoteScraper {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &AppConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            fetcher,
            parser: ChangelogParser::new(&config.scrape.detail_selector)?,
            opts: FetchOptions::from_config(&config.fetch),
            max_pages: config.scrape.max_pages.max(1),
            forum_url: config.forum_url.clone(),
        })
    }

    /// Walks listing pages from `start_url` until `limit` entries are
    /// collected, no next page exists, or the page budget runs out.
    /// A failed listing fetch aborts the whole scrape.
    pub async fn scrape(
        &self,
        start_url: &str,
        limit: usize,
        with_details: bool,
    ) -> Result<Vec<PatchNoteEntry>, ScraperError> {
        self.scrape_with(start_url, limit, with_details, &self.opts).await
    }

    /// Same as [`scrape`](Self::scrape) with caller-supplied fetch options.
    pub async fn scrape_with(
        &self,
        start_url: &str,
        limit: usize,
        with_details: bool,
        opts: &FetchOptions,
    ) -> Result<Vec<PatchNoteEntry>, ScraperError> {
        let mut entries = Vec::new();
        let mut visited = HashSet::new();
        let mut cursor = Some(start_url.to_string());
        let mut pages = 0;

        while let Some(url) = cursor.take() {
            if entries.len() >= limit {
                break;
            }
            if pages >= self.max_pages {
                info!("Stopping at page budget ({}) with {} entries", self.max_pages, entries.len());
                break;
            }
            if !visited.insert(url.clone()) {
                warn!("Next-page link loops back to {}", url);
                break;
            }
            pages += 1;

            let page_url = parse_url(&url)?;
            debug!("Fetching listing page {}: {}", pages, url);
            let html = self.fetcher.fetch_html(&url, opts).await?;
            let page = self.parser.parse_listing(&html, &page_url);

            let remaining = limit - entries.len();
            entries.extend(page.entries.into_iter().take(remaining));
            cursor = page.next;
        }

        if with_details {
            self.attach_details(&mut entries, opts).await;
        }
        info!("Scraped {} patch notes from {} page(s)", entries.len(), pages);
        Ok(entries)
    }

    /// Fetches each linked page one at a time. Failures leave the field empty.
    async fn attach_details(&self, entries: &mut [PatchNoteEntry], opts: &FetchOptions) {
        for entry in entries.iter_mut() {
            let Some(link) = entry.link.clone() else {
                continue;
            };
            match self.fetcher.fetch_html(&link, opts).await {
                Ok(html) => entry.detailed_content = self.parser.parse_detail(&html),
                Err(e) => warn!("Detail fetch failed for {}: {}", link, e),
            }
        }
    }

    /// Searches forum listing pages `1..=max_pages` for threads whose title
    /// or version contains `term` (case-insensitive).
    pub async fn search_threads(
        &self,
        term: &str,
        limit: usize,
        max_pages: usize,
    ) -> Result<Vec<ForumThreadSummary>, ScraperError> {
        let term = term.trim().to_lowercase();
        let max_pages = max_pages.clamp(1, self.max_pages);
        let mut seen = HashSet::new();
        let mut matches = Vec::new();

        for page in 1..=max_pages {
            if matches.len() >= limit {
                break;
            }
            let url = forum_page_url(&self.forum_url, page);
            let page_url = parse_url(&url)?;
            let html = self.fetcher.fetch_html(&url, &self.opts).await?;
            let threads = self.parser.parse_threads(&html, &page_url);
            if threads.is_empty() {
                debug!("No threads on forum page {}, stopping", page);
                break;
            }

            for thread in threads {
                if !seen.insert(thread.url.clone()) {
                    continue;
                }
                let hit = thread.title.to_lowercase().contains(&term)
                    || thread.version.as_deref().is_some_and(|v| v.contains(&term));
                if hit {
                    matches.push(thread);
                    if matches.len() >= limit {
                        break;
                    }
                }
            }
        }

        info!("Forum search '{}' matched {} thread(s)", term, matches.len());
        Ok(matches)
    }
}

/// Forum pagination: the listing itself, then `page-N`.
pub fn forum_page_url(base: &str, page: usize) -> String {
    if page <= 1 {
        return base.to_string();
    }
    let sep = if base.ends_with('/') { "" } else { "/" };
    format!("{base}{sep}page-{page}")
}

// Changelog and forum HTML parsing
use crate::model::{ForumThreadSummary, PatchNoteEntry, ScraperError};
use crate::utils::{absolutize, collapse_whitespace, normalize_date};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(?:\.\d+)*").expect("version pattern is valid"));

/// Rows scraped from one listing page plus the link to the following page.
#[derive(Debug, Default)]
pub struct ListingPage {
    pub entries: Vec<PatchNoteEntry>,
    pub next: Option<String>,
}

pub struct ChangelogParser {
    row: Selector,
    data_cell: Selector,
    cell: Selector,
    link: Selector,
    rel_next: Selector,
    thread_link: Selector,
    detail: Selector,
}

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::Selector(format!("{css}: {e}")))
}

fn text_of(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

impl ChangelogParser {
    pub fn new(detail_selector: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            row: selector("table tr")?,
            data_cell: selector("td")?,
            cell: selector("td, th")?,
            link: selector("a[href]")?,
            rel_next: selector(r#"a[rel~="next"][href]"#)?,
            thread_link: selector(r#"a[href*="/threads/"]"#)?,
            detail: selector(detail_selector)?,
        })
    }

    /// Extracts patch-note rows (date, title, description) from a listing table.
    pub fn parse_listing(&self, html: &str, page_url: &Url) -> ListingPage {
        let document = Html::parse_document(html);
        let mut entries = Vec::new();

        for row in document.select(&self.row) {
            if row.select(&self.data_cell).next().is_none() {
                continue; // header row
            }
            let cells: Vec<ElementRef> = row.select(&self.cell).collect();
            if cells.len() < 3 {
                continue;
            }

            let raw_date = text_of(cells[0]);
            let title = text_of(cells[1]);
            if raw_date.is_empty() && title.is_empty() {
                continue;
            }
            let link = row
                .select(&self.link)
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| absolutize(page_url, href));

            entries.push(PatchNoteEntry {
                normalized_date: normalize_date(&raw_date),
                raw_date,
                title,
                description: text_of(cells[2]),
                link,
                detailed_content: None,
            });
        }

        ListingPage {
            entries,
            next: self.next_page(&document, page_url),
        }
    }

    fn next_page(&self, document: &Html, page_url: &Url) -> Option<String> {
        let by_rel = document
            .select(&self.rel_next)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| absolutize(page_url, href));

        by_rel.or_else(|| {
            document
                .select(&self.link)
                .filter(|a| is_next_label(&text_of(*a)))
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| absolutize(page_url, href))
        })
    }

    /// Text of the designated content region of a detail page.
    pub fn parse_detail(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.detail)
            .next()
            .map(text_of)
            .filter(|text| !text.is_empty())
    }

    /// Thread links on a forum listing page, in page order.
    pub fn parse_threads(&self, html: &str, page_url: &Url) -> Vec<ForumThreadSummary> {
        let document = Html::parse_document(html);
        document
            .select(&self.thread_link)
            .filter_map(|a| {
                let title = text_of(a);
                if title.is_empty() {
                    return None;
                }
                let url = absolutize(page_url, a.value().attr("href")?)?;
                Some(ForumThreadSummary {
                    version: extract_version(&title),
                    title,
                    url,
                })
            })
            .collect()
    }
}

fn is_next_label(text: &str) -> bool {
    let label = text
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '»' | '›' | '→' | '>'))
        .to_lowercase();
    label == "next" || label == "next page"
}

/// First dotted version number in a thread title, e.g. `0.23.4`.
pub fn extract_version(title: &str) -> Option<String> {
    VERSION_RE.find(title).map(|m| m.as_str().to_string())
}

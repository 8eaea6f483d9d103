// Utility functions
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[/.\- ]\s*([A-Za-z]+)\.?\s*[/.,\- ]\s*(\d{1,2})\b")
        .expect("date pattern is valid")
});

static FORMATTING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"§.").expect("formatting pattern is valid"));

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Best-effort conversion of a changelog date like `PATCH 2025/November 9`
/// into `YYYY-MM-DD`. Anything that does not match is returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    DATE_RE
        .captures(raw)
        .and_then(|caps| {
            let year = caps[1].parse().ok()?;
            let month = month_number(&caps[2])?;
            let day = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Accepts full month names and three-letter abbreviations.
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| *m == name || (name.len() == 3 && m.starts_with(&name)))
        .map(|i| i as u32 + 1)
}

/// Removes Minecraft `§x` formatting codes from a name.
pub fn strip_formatting(text: &str) -> String {
    FORMATTING_RE.replace_all(text, "").into_owned()
}

/// Resolves `href` against the page it was found on.
pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// Collapses runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

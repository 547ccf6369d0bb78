use crate::config::RenameRule;
use crate::scraper::error::ScrapeError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use url::Url;

/// Placeholder inside a [`RenameRule`] standing for a four-digit year.
pub const YEAR_MARKER: &str = "@yyyy@";

static RE_ORDINAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(st|nd|rd|th)").expect("invalid regex: ordinal suffix")
});

// ── Text ──────────────────────────────────────────────────────────────────────

/// Trimmed, case-insensitive equality.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub fn contains_ignore_case(text: &str, needle: &str) -> bool {
    text.to_lowercase().contains(&needle.to_lowercase())
}

pub fn contains_any(text: &str, needles: &[String]) -> bool {
    let text = text.to_lowercase();
    needles.iter().any(|n| text.contains(&n.to_lowercase()))
}

/// "Velogames Tour de France" → "Tour de France" when `prefix` = "velogames".
/// Only a leading occurrence is removed.
pub fn strip_prefix_ignore_case(text: &str, prefix: &str) -> String {
    let text = text.trim();
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return text.to_string();
    }
    let re = RegexBuilder::new(&format!("^{}", regex::escape(prefix)))
        .case_insensitive(true)
        .build()
        .expect("escaped literal is a valid regex");
    re.replace(text, "").trim().to_string()
}

/// Remove every occurrence of every token (case-insensitive), then collapse whitespace.
pub fn remove_tokens(text: &str, tokens: &[String]) -> String {
    let mut cleaned = text.to_string();
    for token in tokens.iter().filter(|t| !t.trim().is_empty()) {
        let re = RegexBuilder::new(&regex::escape(token.trim()))
            .case_insensitive(true)
            .build()
            .expect("escaped literal is a valid regex");
        cleaned = re.replace_all(&cleaned, " ").into_owned();
    }
    normalize_whitespace(&cleaned)
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Apply a rename rule, carrying the year matched by [`YEAR_MARKER`] into the replacement.
///
/// "Tour de France 2024" with `Tour de France @yyyy@` → `Tour de France Men @yyyy@`
/// gives "Tour de France Men 2024".
pub fn replace_keeping_year(text: &str, rule: &RenameRule) -> String {
    if rule.from.is_empty() {
        return text.to_string();
    }

    let pattern = rule
        .from
        .split(YEAR_MARKER)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"(\d{4})");
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("escaped literal is a valid regex");

    re.replace_all(text, |caps: &regex::Captures<'_>| match caps.get(1) {
        Some(year) => rule.to.replace(YEAR_MARKER, year.as_str()),
        None => rule.to.clone(),
    })
    .into_owned()
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// "29th June" → "29 June". Idempotent.
pub fn strip_ordinal_suffixes(text: &str) -> String {
    RE_ORDINAL_SUFFIX.replace_all(text, "$1").into_owned()
}

/// Append `year` to a two-token date ("14 August"); anything else is returned as-is.
pub fn complete_year(text: &str, year: i32) -> String {
    if text.split(' ').count() == 2 {
        format!("{} {}", text, year)
    } else {
        text.to_string()
    }
}

/// Parse with a date-time format, or with a date-only format at midnight.
pub fn parse_date(text: &str, format: &str) -> Result<NaiveDateTime, ScrapeError> {
    let text = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(text, format)
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|source| ScrapeError::DateParse {
            raw: text.to_string(),
            format: format.to_string(),
            source,
        })
}

pub fn format_date(date: &NaiveDateTime, format: &str) -> String {
    date.format(format).to_string()
}

pub fn add_days(date: NaiveDateTime, days: i64) -> Result<NaiveDateTime, ScrapeError> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or(ScrapeError::DateRange { date, days })
}

// ── Urls and ordinals ─────────────────────────────────────────────────────────

/// Resolve `href` against `base` unless it is already absolute.
pub fn absolute_url(base: &str, href: &str) -> Result<String, ScrapeError> {
    let href = href.trim();
    if let Ok(url) = Url::parse(href) {
        return Ok(url.to_string());
    }
    let base_url = Url::parse(base).map_err(|source| ScrapeError::Url {
        url: base.to_string(),
        source,
    })?;
    base_url
        .join(href)
        .map(|u| u.to_string())
        .map_err(|source| ScrapeError::Url {
            url: href.to_string(),
            source,
        })
}

/// Undo the classics-table defect where the rendered date is glued onto the ordinal:
/// "12024-03-02 11:00:00Strade Bianche" → "1".
pub fn correct_ordinal(raw: &str, rendered_date: &str) -> String {
    if rendered_date.is_empty() {
        return raw.to_string();
    }
    match raw.find(rendered_date) {
        Some(pos) => raw[..pos].trim().to_string(),
        None => raw.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

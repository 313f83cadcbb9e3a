//! Mapping from the listing's embedded JSON to [`ReviewRecord`]s.
//!
//! The payload shape is `props.pageProps.{filters.pagination.totalPages, reviews[]}`.
//! Every field is optional in the raw structures; the defaults applied when a
//! field is missing live in [`RawReview::into_record`].

use crate::error::ExtractionError;
use crate::results::{NOT_AVAILABLE, PageExtraction, ReviewRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Reviews whose trimmed body is shorter than this are dropped
pub const MIN_REVIEW_TEXT_CHARS: usize = 10;

#[derive(Debug, Default, Deserialize)]
struct NextData {
    #[serde(default)]
    props: Option<Props>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Props {
    #[serde(default)]
    page_props: Option<PageProps>,
}

#[derive(Debug, Default, Deserialize)]
struct PageProps {
    #[serde(default)]
    filters: Option<Filters>,
    #[serde(default)]
    reviews: Option<Vec<RawReview>>,
}

#[derive(Debug, Default, Deserialize)]
struct Filters {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    #[serde(default)]
    total_pages: Option<u32>,
}

/// One review as it appears in the payload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    #[serde(default)]
    pub consumer: Option<RawConsumer>,
    #[serde(default)]
    pub dates: Option<RawDates>,
    #[serde(default)]
    pub rating: Option<RawRating>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConsumer {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDates {
    #[serde(default)]
    pub experienced_date: Option<String>,
}

/// Ratings are numbers on the live site; tolerate strings too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawRating {
    Number(serde_json::Number),
    Text(String),
}

impl RawRating {
    fn render(&self) -> Option<String> {
        match self {
            RawRating::Number(n) => Some(n.to_string()),
            RawRating::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            RawRating::Text(_) => None,
        }
    }
}

impl RawReview {
    /// Convert to a record, or `None` if the body text is too short to keep
    pub fn into_record(self) -> Option<ReviewRecord> {
        let text = self.text?;
        if text.trim().chars().count() < MIN_REVIEW_TEXT_CHARS {
            return None;
        }

        let reviewer_name = self
            .consumer
            .and_then(|c| c.display_name)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let date_experience = self
            .dates
            .and_then(|d| d.experienced_date)
            .and_then(|d| format_experience_date(&d))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let rating = self
            .rating
            .and_then(|r| r.render())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let title = self
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Some(ReviewRecord {
            reviewer_name,
            date_experience,
            rating,
            title,
            review_text: text,
        })
    }
}

/// Parse the embedded payload text into a page extraction
pub fn parse_payload(payload: &str) -> Result<PageExtraction, ExtractionError> {
    let value: Value = serde_json::from_str(payload).map_err(ExtractionError::InvalidJson)?;
    let data: NextData = serde_json::from_value(value).map_err(ExtractionError::Structure)?;

    let Some(page_props) = data.props.and_then(|p| p.page_props) else {
        ::log::debug!("Payload carries no page props");
        return Ok(PageExtraction::empty());
    };

    let total_pages = page_props
        .filters
        .and_then(|f| f.pagination)
        .and_then(|p| p.total_pages)
        .unwrap_or(0);

    let raw = page_props.reviews.unwrap_or_default();
    let raw_count = raw.len();
    let records: Vec<ReviewRecord> = raw.into_iter().filter_map(RawReview::into_record).collect();

    if records.len() < raw_count {
        ::log::debug!(
            "Dropped {} of {} reviews with body text under {} characters",
            raw_count - records.len(),
            raw_count,
            MIN_REVIEW_TEXT_CHARS
        );
    }

    Ok(PageExtraction {
        records,
        total_pages,
    })
}

/// Render an ISO-8601 timestamp or date as e.g. "January 5, 2024"
pub fn format_experience_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()?;

    Some(date.format("%B %-d, %Y").to_string())
}

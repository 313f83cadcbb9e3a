use serde::{Deserialize, Serialize};

/// Placeholder used for any field the listing did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// One review pulled from a listing page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    /// Display name of the reviewer
    pub reviewer_name: String,

    /// Long-form date of the experience, e.g. "January 5, 2024"
    pub date_experience: String,

    /// Star rating rendered as text
    pub rating: String,

    /// Review headline
    pub title: String,

    /// Body text, at least ten characters long
    pub review_text: String,
}

impl ReviewRecord {
    /// Create a new review record
    pub fn new(
        reviewer_name: impl Into<String>,
        date_experience: impl Into<String>,
        rating: impl Into<String>,
        title: impl Into<String>,
        review_text: impl Into<String>,
    ) -> Self {
        Self {
            reviewer_name: reviewer_name.into(),
            date_experience: date_experience.into(),
            rating: rating.into(),
            title: title.into(),
            review_text: review_text.into(),
        }
    }
}

/// What a single listing page yielded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageExtraction {
    /// Valid records in payload order
    pub records: Vec<ReviewRecord>,

    /// Page count reported by the listing
    pub total_pages: u32,
}

impl PageExtraction {
    /// A page with no embedded data
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

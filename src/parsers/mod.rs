pub mod embedded;
pub mod reviews;

#[cfg(test)]
mod tests;

use crate::crawlers::driver::RenderedDocument;
use crate::error::ExtractionError;
use crate::results::PageExtraction;

/// Pull review records and pagination metadata out of a rendered page.
///
/// A page without an embedded payload yields an empty extraction, which the
/// traversal treats as the end of the data. A payload that is present but
/// malformed is an [`ExtractionError`].
pub fn extract(document: &RenderedDocument) -> Result<PageExtraction, ExtractionError> {
    match document.embedded_payload() {
        Some(payload) => {
            let extraction = reviews::parse_payload(&payload)?;
            ::log::debug!(
                "Extracted {} reviews from {} (total pages reported: {})",
                extraction.records.len(),
                document.url,
                extraction.total_pages
            );
            Ok(extraction)
        }
        None => {
            ::log::debug!("No embedded payload found in {}", document.url);
            Ok(PageExtraction::empty())
        }
    }
}

use scraper::{Html, Selector};

/// The script tag a Next.js page hydrates from
pub const PAYLOAD_SELECTOR: &str = r#"script[id="__NEXT_DATA__"]"#;

/// Returns the raw text of the embedded data script, if the page has one.
///
/// The text is returned as-is; validating it is the caller's job so that a
/// malformed payload can be told apart from a missing one.
pub fn find_payload(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse(PAYLOAD_SELECTOR).ok()?;

    let element = doc.select(&selector).next()?;
    let text = element.text().collect::<String>();

    if text.trim().is_empty() {
        ::log::debug!("Embedded data script is present but empty");
        return None;
    }
    Some(text)
}

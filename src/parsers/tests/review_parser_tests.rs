use crate::parsers::reviews::{
    MIN_REVIEW_TEXT_CHARS, RawReview, format_experience_date, parse_payload,
};
use crate::results::NOT_AVAILABLE;

fn raw(json: &str) -> RawReview {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_full_review_maps_every_field() {
    let record = raw(r#"{
        "consumer": { "displayName": "  Dana Smith " },
        "dates": { "experiencedDate": "2024-01-05T00:00:00.000Z" },
        "rating": 4,
        "title": "Solid service",
        "text": "Arrived on time and well packed."
    }"#)
    .into_record()
    .unwrap();

    assert_eq!(record.reviewer_name, "Dana Smith");
    assert_eq!(record.date_experience, "January 5, 2024");
    assert_eq!(record.rating, "4");
    assert_eq!(record.title, "Solid service");
    assert_eq!(record.review_text, "Arrived on time and well packed.");
}

#[test]
fn test_missing_fields_fall_back_to_placeholder() {
    let record = raw(r#"{ "text": "Only the body text is present here." }"#)
        .into_record()
        .unwrap();

    assert_eq!(record.reviewer_name, NOT_AVAILABLE);
    assert_eq!(record.date_experience, NOT_AVAILABLE);
    assert_eq!(record.rating, NOT_AVAILABLE);
    assert_eq!(record.title, NOT_AVAILABLE);
}

#[test]
fn test_null_and_blank_fields_fall_back_to_placeholder() {
    let record = raw(r#"{
        "consumer": { "displayName": "   " },
        "dates": { "experiencedDate": "sometime last spring" },
        "rating": null,
        "title": "",
        "text": "Body text that is long enough."
    }"#)
    .into_record()
    .unwrap();

    assert_eq!(record.reviewer_name, NOT_AVAILABLE);
    assert_eq!(record.date_experience, NOT_AVAILABLE);
    assert_eq!(record.rating, NOT_AVAILABLE);
    assert_eq!(record.title, NOT_AVAILABLE);
}

#[test]
fn test_short_or_missing_text_is_dropped() {
    assert!(raw(r#"{ "title": "No body" }"#).into_record().is_none());
    assert!(raw(r#"{ "text": "123456789" }"#).into_record().is_none());
    // padding does not count toward the minimum
    assert!(raw(r#"{ "text": "   short    " }"#).into_record().is_none());

    let exact = "x".repeat(MIN_REVIEW_TEXT_CHARS);
    let json = format!(r#"{{ "text": "{}" }}"#, exact);
    assert_eq!(raw(&json).into_record().unwrap().review_text, exact);
}

#[test]
fn test_fractional_and_text_ratings() {
    let record = raw(r#"{ "rating": 4.5, "text": "Fractional rating review." }"#)
        .into_record()
        .unwrap();
    assert_eq!(record.rating, "4.5");

    let record = raw(r#"{ "rating": "3", "text": "String rating review text." }"#)
        .into_record()
        .unwrap();
    assert_eq!(record.rating, "3");
}

#[test]
fn test_date_formats() {
    assert_eq!(
        format_experience_date("2023-12-31T23:59:59Z").as_deref(),
        Some("December 31, 2023")
    );
    assert_eq!(
        format_experience_date("2024-03-09").as_deref(),
        Some("March 9, 2024")
    );
    assert_eq!(
        format_experience_date("2024-07-04T10:00:00.000").as_deref(),
        Some("July 4, 2024")
    );
    assert!(format_experience_date("not a date").is_none());
}

#[test]
fn test_total_pages_defaults_to_zero() {
    let result = parse_payload(
        r#"{ "props": { "pageProps": { "reviews": [ { "text": "A review without pagination." } ] } } }"#,
    )
    .unwrap();
    assert_eq!(result.total_pages, 0);
    assert_eq!(result.records.len(), 1);
}

#[test]
fn test_all_short_reviews_yield_empty_page() {
    let result = parse_payload(
        r#"{ "props": { "pageProps": {
            "filters": { "pagination": { "totalPages": 5 } },
            "reviews": [ { "text": "meh" }, { "text": "ok" } ]
        } } }"#,
    )
    .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.total_pages, 5);
}

//! Final dataset shaping and the JSON / CSV writers.

use crate::error::OutputError;
use crate::results::ReviewRecord;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const CSV_HEADER: &str = "Reviewer Name,Date of Experience,Rating,Title,Review Text";

/// Where the dataset ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Written {
        json: PathBuf,
        csv: PathBuf,
        count: usize,
    },
    /// Nothing to write; no files were created
    Skipped,
}

/// Drop exact duplicates (keeping the first) and cap the length.
///
/// Record content and relative order are untouched, so applying this to its
/// own output returns the same sequence.
pub fn finalize(records: Vec<ReviewRecord>, max_records: usize) -> Vec<ReviewRecord> {
    let before = records.len();
    let mut seen = HashSet::with_capacity(records.len());
    let mut unique: Vec<ReviewRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect();

    if unique.len() < before {
        ::log::debug!("Removed {} duplicate reviews", before - unique.len());
    }
    if max_records > 0 {
        unique.truncate(max_records);
    }
    unique
}

/// Pretty-printed JSON array of records
pub fn to_json(records: &[ReviewRecord]) -> Result<String, OutputError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Header row plus one fully quoted row per record, newline separated
pub fn to_csv(records: &[ReviewRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for r in records {
        let fields = [
            &r.reviewer_name,
            &r.date_experience,
            &r.rating,
            &r.title,
            &r.review_text,
        ];
        let row = fields
            .iter()
            .map(|f| quote_field(f))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }
    lines.join("\n")
}

fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Write `<stem>.json` and `<stem>.csv` into `dir`.
/// An empty dataset writes nothing and returns [`PersistOutcome::Skipped`].
pub fn persist(
    records: &[ReviewRecord],
    dir: &Path,
    stem: &str,
) -> Result<PersistOutcome, OutputError> {
    if records.is_empty() {
        ::log::info!("No reviews found; no output files written");
        return Ok(PersistOutcome::Skipped);
    }

    fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let json_path = dir.join(format!("{}.json", stem));
    let csv_path = dir.join(format!("{}.csv", stem));

    write_file(&json_path, &to_json(records)?)?;
    write_file(&csv_path, &to_csv(records))?;

    ::log::info!(
        "Saved {} reviews to {} and {}",
        records.len(),
        json_path.display(),
        csv_path.display()
    );
    Ok(PersistOutcome::Written {
        json: json_path,
        csv: csv_path,
        count: records.len(),
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), OutputError> {
    fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, text: &str) -> ReviewRecord {
        ReviewRecord::new(name, "January 5, 2024", "5", "Title", text)
    }

    #[test]
    fn test_finalize_caps_and_keeps_order() {
        let records: Vec<_> = (0..8)
            .map(|i| record(&format!("r{}", i), "long enough text"))
            .collect();
        let capped = finalize(records, 5);
        let names: Vec<_> = capped.iter().map(|r| r.reviewer_name.as_str()).collect();
        assert_eq!(names, vec!["r0", "r1", "r2", "r3", "r4"]);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let records = vec![
            record("a", "first text body"),
            record("b", "second text body"),
            record("a", "first text body"),
            record("c", "third text body"),
        ];
        let once = finalize(records, 2);
        let twice = finalize(once.clone(), 2);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_finalize_collapses_exact_duplicates_only() {
        let records = vec![
            record("a", "same text body"),
            record("b", "same text body"),
            record("a", "same text body"),
        ];
        let out = finalize(records, 0);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].reviewer_name, "a");
        assert_eq!(out[1].reviewer_name, "b");
    }

    #[test]
    fn test_csv_quotes_every_field_and_doubles_quotes() {
        let records = vec![ReviewRecord::new(
            "Jo \"JJ\" Lee",
            "N/A",
            "4",
            "Okay, I guess",
            "Line one\nsaid \"fine\"",
        )];
        let csv = to_csv(&records);
        let expected = format!(
            "{}\n\"Jo \"\"JJ\"\" Lee\",\"N/A\",\"4\",\"Okay, I guess\",\"Line one\nsaid \"\"fine\"\"\"",
            CSV_HEADER
        );
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let json = to_json(&[record("Ana", "body of the review")]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["reviewerName"], "Ana");
        assert_eq!(value[0]["dateExperience"], "January 5, 2024");
        assert_eq!(value[0]["reviewText"], "body of the review");
    }

    #[test]
    fn test_persist_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("Ana", "body of the review")];

        let outcome = persist(&records, dir.path(), "trustpilot_example").unwrap();
        let PersistOutcome::Written { json, csv, count } = outcome else {
            panic!("expected files to be written");
        };
        assert_eq!(count, 1);
        assert_eq!(json, dir.path().join("trustpilot_example.json"));

        let csv_text = std::fs::read_to_string(csv).unwrap();
        assert!(csv_text.starts_with(CSV_HEADER));
        let parsed: Vec<ReviewRecord> =
            serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_persist_skips_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = persist(&[], dir.path(), "trustpilot_example").unwrap();
        assert_eq!(outcome, PersistOutcome::Skipped);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

use crate::config::DelayWindow;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// Registry suffixes stripped from a domain when naming output files.
/// Ordered most specific first so `.co.uk` wins over `.uk`.
const SUFFIX_PATTERNS: &[&str] = &[
    r"(?i)\.co\.uk$",
    r"(?i)\.com\.au$",
    r"(?i)\.co\.nz$",
    r"(?i)\.co\.za$",
    r"(?i)\.co\.jp$",
    r"(?i)\.co\.il$",
    r"(?i)\.org\.uk$",
    r"(?i)\.ac\.uk$",
    r"(?i)\.gov\.uk$",
    r"(?i)\.com$",
    r"(?i)\.org$",
    r"(?i)\.net$",
    r"(?i)\.info$",
    r"(?i)\.biz$",
    r"(?i)\.uk$",
    r"(?i)\.us$",
    r"(?i)\.ca$",
    r"(?i)\.au$",
    r"(?i)\.de$",
    r"(?i)\.fr$",
    r"(?i)\.jp$",
    r"(?i)\.nz$",
];

static SUFFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    SUFFIX_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("suffix patterns are valid"))
        .collect()
});

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("static pattern is valid"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static pattern is valid"));

/// Build the output file stem for a company domain and optional search term.
///
/// `"my.shop.co.uk"` with `"late delivery"` becomes
/// `"trustpilot_my_shop_late_delivery"`.
pub fn derive_output_prefix(domain: &str, search_term: &str) -> String {
    let host = domain
        .trim()
        .split('?')
        .next()
        .unwrap_or_default()
        .split('/')
        .next()
        .unwrap_or_default();

    let mut base = host.to_string();
    if let Some(suffix) = SUFFIXES.iter().find(|re| re.is_match(&base)) {
        base = suffix.replace(&base, "").into_owned();
    }

    let mut name = INVALID_NAME_CHARS
        .replace_all(&base.replace('.', "_"), "")
        .into_owned();
    if name.is_empty() {
        name = "domain".to_string();
    }

    let term = WHITESPACE_RUN.replace_all(search_term.trim(), "_");
    let term = INVALID_NAME_CHARS.replace_all(&term, "");

    if term.is_empty() {
        format!("trustpilot_{}", name)
    } else {
        format!("trustpilot_{}_{}", name, term)
    }
}

/// Pick a politeness delay uniformly from the inclusive window
pub fn random_delay(window: DelayWindow) -> Duration {
    if window.max_ms <= window.min_ms {
        return Duration::from_millis(window.min_ms);
    }
    let ms = rand::thread_rng().gen_range(window.min_ms..=window.max_ms);
    Duration::from_millis(ms)
}

/// Shorten text for log previews, marking the cut with `...`
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}

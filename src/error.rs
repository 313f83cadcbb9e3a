use thiserror::Error;

/// A single failed navigation attempt. Always retryable.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("webdriver command failed for {url}: {message}")]
    Command { url: String, message: String },

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("unexpected response status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Marks an operation whose retry budget is spent. Carries the last error seen.
#[derive(Debug, Error)]
pub enum RetryError<E: std::error::Error + 'static> {
    #[error("{label} failed after {attempts} attempts: {last}")]
    Exhausted {
        label: String,
        attempts: u32,
        #[source]
        last: E,
    },
}

impl<E: std::error::Error + 'static> RetryError<E> {
    /// The error returned by the final attempt
    pub fn last(&self) -> &E {
        match self {
            RetryError::Exhausted { last, .. } => last,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// The embedded payload exists but does not have the expected shape
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("embedded payload is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("embedded payload has an unexpected structure: {0}")]
    Structure(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no listing target supplied (pass a company domain or a config file)")]
    MissingTarget,

    #[error("invalid listing URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("max_retries must be at least 1")]
    ZeroRetries,

    #[error("inter-request delay window is inverted ({min_ms}ms > {max_ms}ms)")]
    InvertedDelay { min_ms: u64, max_ms: u64 },

    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise records: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("could not open a WebDriver session at {url} or any fallback endpoint")]
    Connect { url: String },

    #[error("webdriver command failed: {0}")]
    Command(String),
}

/// Top-level error for a harvest run
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("fatal navigation error: {0}")]
    FatalNavigation(#[from] RetryError<NavigationError>),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

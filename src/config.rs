use crate::error::ConfigError;
use crate::utils::derive_output_prefix;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Review pages live under this prefix, followed by the company domain
pub const REVIEW_SITE_BASE: &str = "https://www.trustpilot.com/review/";

/// Configuration for one harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Listing URL for page 1, without the search filter
    #[serde(default)]
    pub listing_base_url: String,

    /// Optional search term appended as `search=<term>`
    #[serde(default)]
    pub search_filter: Option<String>,

    /// Maximum number of pages to visit (0 = no limit)
    #[serde(default)]
    pub max_pages: u32,

    /// Maximum number of records to keep (0 = no limit)
    #[serde(default)]
    pub max_records: usize,

    /// Navigation attempts per page
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Randomised pause before extracting every page after the first
    #[serde(default)]
    pub inter_request_delay: DelayWindow,

    /// Upper bound for a single navigation
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Treat a page as loaded only once this CSS selector matches
    #[serde(default)]
    pub wait_for_selector: Option<String>,

    /// File name stem for the JSON and CSV outputs
    #[serde(default)]
    pub output_name_prefix: String,

    /// Directory the outputs are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Save a PNG of every processed page here when set
    #[serde(default)]
    pub screenshot_dir: Option<PathBuf>,

    /// Browser session settings
    #[serde(default)]
    pub driver: DriverConfig,
}

/// Inclusive window for the randomised politeness delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelayWindow {
    fn default() -> Self {
        Self {
            min_ms: 2000,
            max_ms: 5000,
        }
    }
}

impl DelayWindow {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No delay at all
    pub fn none() -> Self {
        Self::new(0, 0)
    }
}

/// Which user agent pool the browser draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAgentProfile {
    #[default]
    Desktop,
    Mobile,
}

/// Settings handed to the WebDriver session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default)]
    pub user_agent_profile: UserAgentProfile,

    /// `http://…` or `socks…://…` proxy passed to the browser
    #[serde(default)]
    pub proxy: Option<String>,

    #[serde(default = "default_headless")]
    pub headless: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            user_agent_profile: UserAgentProfile::default(),
            proxy: None,
            headless: default_headless(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_navigation_timeout_ms() -> u64 {
    60_000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

impl RunConfig {
    /// Create a configuration for an arbitrary listing URL with default values
    pub fn new(listing_base_url: &str) -> Self {
        Self {
            listing_base_url: listing_base_url.to_string(),
            search_filter: None,
            max_pages: 0,
            max_records: 0,
            max_retries: default_max_retries(),
            inter_request_delay: DelayWindow::default(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            wait_for_selector: None,
            output_name_prefix: String::new(),
            output_dir: default_output_dir(),
            screenshot_dir: None,
            driver: DriverConfig::default(),
        }
    }

    /// Create a configuration for the review page of a company domain
    pub fn for_domain(domain: &str, search_filter: Option<&str>) -> Self {
        let mut config = Self::new(&format!("{}{}", REVIEW_SITE_BASE, domain.trim()));
        config.search_filter = search_filter
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        config.output_name_prefix = derive_output_prefix(domain, search_filter.unwrap_or(""));
        config
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Reject configurations that cannot start a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listing_base_url.trim().is_empty() {
            return Err(ConfigError::MissingTarget);
        }
        self.listing_url()?;
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        let window = self.inter_request_delay;
        if window.min_ms > window.max_ms {
            return Err(ConfigError::InvertedDelay {
                min_ms: window.min_ms,
                max_ms: window.max_ms,
            });
        }
        Ok(())
    }

    /// The page 1 URL, including the search filter when one is set
    pub fn listing_url(&self) -> Result<Url, ConfigError> {
        let mut url =
            Url::parse(self.listing_base_url.trim()).map_err(|source| ConfigError::InvalidUrl {
                url: self.listing_base_url.clone(),
                source,
            })?;
        if let Some(term) = self.search_filter.as_deref().filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("search", term);
        }
        Ok(url)
    }

    /// Company domain when the listing is a review-site company page
    pub fn review_site_domain(&self) -> Option<&str> {
        self.listing_base_url
            .trim()
            .strip_prefix(REVIEW_SITE_BASE)
            .map(|rest| rest.trim_end_matches('/'))
            .filter(|domain| !domain.is_empty())
    }

    /// File name stem for outputs, falling back to a generic name
    pub fn output_stem(&self) -> &str {
        if self.output_name_prefix.is_empty() {
            "reviews"
        } else {
            &self.output_name_prefix
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

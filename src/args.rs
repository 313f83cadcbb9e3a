use clap::{Parser, ValueEnum};
use review_harvest::config::{RunConfig, UserAgentProfile};
use review_harvest::error::ConfigError;
use review_harvest::utils::derive_output_prefix;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "review-harvest")]
#[command(about = "Collects reviews from a paginated review listing into JSON and CSV")]
#[command(version)]
pub struct Args {
    /// Company domain as it appears in the review URL (e.g. "example.com")
    pub target: Option<String>,

    /// Shorthand for --max-reviews
    pub max_reviews_shorthand: Option<usize>,

    /// Company domain; takes precedence over the positional form
    #[arg(long)]
    pub domain: Option<String>,

    /// Only collect reviews matching this search term
    #[arg(long, alias = "searchTerm")]
    pub search_term: Option<String>,

    /// Maximum number of pages to visit (0 = no limit)
    #[arg(long, alias = "maxpages")]
    pub max_pages: Option<u32>,

    /// Maximum number of reviews to collect (0 = no limit)
    #[arg(long, alias = "maxreviews")]
    pub max_reviews: Option<usize>,

    /// Proxy URL (http://… or socks5://…) for the browser
    #[arg(long)]
    pub proxy: Option<String>,

    /// Save a screenshot of every processed page under ./debug
    #[arg(long)]
    pub screenshot: bool,

    /// Visible browser, debug logging and screenshots
    #[arg(long)]
    pub debug: bool,

    /// User agent pool to draw from [default: desktop]
    #[arg(long, value_enum, alias = "useragent")]
    pub user_agent: Option<UserAgentArg>,

    /// WebDriver endpoint (defaults to $WEBDRIVER_URL or http://localhost:4444)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// JSON run configuration; command-line flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the JSON and CSV outputs
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum UserAgentArg {
    Desktop,
    Mobile,
}

impl From<UserAgentArg> for UserAgentProfile {
    fn from(arg: UserAgentArg) -> Self {
        match arg {
            UserAgentArg::Desktop => UserAgentProfile::Desktop,
            UserAgentArg::Mobile => UserAgentProfile::Mobile,
        }
    }
}

impl Args {
    /// Build and validate the run configuration from the command line
    pub fn into_config(self) -> Result<RunConfig, ConfigError> {
        let domain = self.domain.or(self.target);
        let search_term = self
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let mut config = match (&self.config, &domain) {
            (Some(path), _) => {
                let mut config = RunConfig::from_file(path)?;
                if let Some(domain) = &domain {
                    config.listing_base_url = RunConfig::for_domain(domain, None).listing_base_url;
                }
                if let Some(term) = search_term {
                    config.search_filter = Some(term.to_string());
                }
                // Review-site listings are renamed after a new target or filter
                if domain.is_some() || search_term.is_some() {
                    if let Some(site_domain) = config.review_site_domain() {
                        let prefix = derive_output_prefix(
                            site_domain,
                            config.search_filter.as_deref().unwrap_or(""),
                        );
                        config.output_name_prefix = prefix;
                    }
                }
                config
            }
            (None, Some(domain)) => RunConfig::for_domain(domain, search_term),
            (None, None) => return Err(ConfigError::MissingTarget),
        };

        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(max_reviews) = self.max_reviews.or(self.max_reviews_shorthand) {
            config.max_records = max_reviews;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.screenshot || self.debug {
            config.screenshot_dir = Some(PathBuf::from("debug"));
        }

        if let Some(user_agent) = self.user_agent {
            config.driver.user_agent_profile = user_agent.into();
        }
        if self.proxy.is_some() {
            config.driver.proxy = self.proxy;
        }
        if self.debug {
            config.driver.headless = false;
        }

        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                config.driver.webdriver_url = webdriver_url;
            }
        }
        if let Some(url) = self.webdriver_url {
            config.driver.webdriver_url = url;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("review-harvest").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_positional_domain_and_review_shorthand() {
        let config = parse(&["example.com", "50"]).into_config().unwrap();
        assert_eq!(
            config.listing_base_url,
            "https://www.trustpilot.com/review/example.com"
        );
        assert_eq!(config.max_records, 50);
        assert_eq!(config.max_pages, 0);
        assert_eq!(config.output_name_prefix, "trustpilot_example");
    }

    #[test]
    fn test_named_flags() {
        let config = parse(&[
            "--domain",
            "shop.co.uk",
            "--search-term",
            "shipping",
            "--max-pages",
            "10",
            "--max-reviews",
            "25",
            "--user-agent",
            "mobile",
            "--output-dir",
            "out",
        ])
        .into_config()
        .unwrap();

        assert_eq!(config.search_filter.as_deref(), Some("shipping"));
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.max_records, 25);
        assert_eq!(config.output_name_prefix, "trustpilot_shop_shipping");
        assert_eq!(config.driver.user_agent_profile, UserAgentProfile::Mobile);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.screenshot_dir.is_none());
    }

    #[test]
    fn test_debug_shows_browser_and_takes_screenshots() {
        let config = parse(&["example.com", "--debug"]).into_config().unwrap();
        assert!(!config.driver.headless);
        assert_eq!(config.screenshot_dir, Some(PathBuf::from("debug")));
    }

    #[test]
    fn test_missing_domain_is_a_config_error() {
        assert!(matches!(
            parse(&["--max-pages", "3"]).into_config(),
            Err(ConfigError::MissingTarget)
        ));
    }

    #[test]
    fn test_config_file_with_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{ "listing_base_url": "https://reviews.test/acme", "max_pages": 4, "max_records": 9 }"#,
        )
        .unwrap();

        let config = parse(&["--config", path.to_str().unwrap(), "--max-pages", "2"])
            .into_config()
            .unwrap();
        assert_eq!(config.listing_base_url, "https://reviews.test/acme");
        assert_eq!(config.max_pages, 2);
        assert_eq!(config.max_records, 9);
    }

    #[test]
    fn test_config_file_user_agent_kept_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{ "listing_base_url": "https://reviews.test/acme", "driver": { "user_agent_profile": "mobile" } }"#,
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let config = parse(&["--config", path]).into_config().unwrap();
        assert_eq!(config.driver.user_agent_profile, UserAgentProfile::Mobile);

        let config = parse(&["--config", path, "--user-agent", "desktop"])
            .into_config()
            .unwrap();
        assert_eq!(config.driver.user_agent_profile, UserAgentProfile::Desktop);
    }

    #[test]
    fn test_search_term_renames_config_file_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{
                "listing_base_url": "https://www.trustpilot.com/review/example.com",
                "output_name_prefix": "trustpilot_example"
            }"#,
        )
        .unwrap();

        let config = parse(&["--config", path.to_str().unwrap(), "--search-term", "refund"])
            .into_config()
            .unwrap();
        assert_eq!(config.search_filter.as_deref(), Some("refund"));
        assert_eq!(config.output_name_prefix, "trustpilot_example_refund");
    }

    #[test]
    fn test_search_term_keeps_prefix_of_other_listings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{ "listing_base_url": "https://reviews.test/acme", "output_name_prefix": "acme" }"#,
        )
        .unwrap();

        let config = parse(&["--config", path.to_str().unwrap(), "--search-term", "refund"])
            .into_config()
            .unwrap();
        assert_eq!(config.search_filter.as_deref(), Some("refund"));
        assert_eq!(config.output_name_prefix, "acme");
    }
}

use crate::config::{DriverConfig, UserAgentProfile};
use crate::crawlers::driver::{
    NavigateOptions, Navigation, PageDriver, RenderedDocument, STATUS_OK, WaitCondition,
};
use crate::error::{DriverError, NavigationError};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use rand::seq::SliceRandom;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::time::timeout;

const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

const MOBILE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 10; SM-G975U) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.43 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/120.0.6099.43 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 13; SM-S918B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.43 Mobile Safari/537.36",
];

/// Alternative endpoints tried when the configured WebDriver URL refuses us
const FALLBACK_WEBDRIVER_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://127.0.0.1:4444",
];

/// Reads the main document's HTTP status from Navigation Timing, if exposed
const RESPONSE_STATUS_SCRIPT: &str = r#"
    const entry = performance.getEntriesByType('navigation')[0];
    return entry && entry.responseStatus ? entry.responseStatus : null;
"#;

/// Pick a user agent string from the pool for `profile`
pub fn pick_user_agent(profile: UserAgentProfile) -> &'static str {
    let pool = match profile {
        UserAgentProfile::Desktop => DESKTOP_USER_AGENTS,
        UserAgentProfile::Mobile => MOBILE_USER_AGENTS,
    };
    pool.choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DESKTOP_USER_AGENTS[0])
}

fn window_size(profile: UserAgentProfile) -> (u32, u32) {
    match profile {
        UserAgentProfile::Desktop => (1920, 1080),
        UserAgentProfile::Mobile => (375, 812),
    }
}

/// Build browser capabilities carrying the user agent, window size and proxy
pub fn build_capabilities(config: &DriverConfig, user_agent: &str) -> Map<String, Value> {
    let (width, height) = window_size(config.user_agent_profile);
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-setuid-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        format!("--window-size={},{}", width, height),
        format!("--user-agent={}", user_agent),
        "--lang=en-US".to_string(),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }
    if let Some(proxy) = config.proxy.as_deref() {
        if proxy.starts_with("http") || proxy.starts_with("socks") {
            ::log::info!("Using proxy: {}", proxy);
            args.push(format!("--proxy-server={}", proxy));
        } else {
            ::log::warn!("Ignoring proxy without an http/socks scheme: {}", proxy);
        }
    }

    let mut firefox_args = vec![format!("--width={}", width), format!("--height={}", height)];
    if config.headless {
        firefox_args.push("-headless".to_string());
    }

    let mut caps = Map::new();
    caps.insert("pageLoadStrategy".to_string(), json!("normal"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({
            "args": firefox_args,
            "prefs": { "general.useragent.override": user_agent },
        }),
    );
    caps
}

/// A single WebDriver browser session
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Open a session, trying common fallback endpoints if the configured one fails
    pub async fn connect(config: &DriverConfig) -> Result<Self, DriverError> {
        let user_agent = pick_user_agent(config.user_agent_profile);
        ::log::info!(
            "Using {:?} user agent: {}...",
            config.user_agent_profile,
            user_agent.chars().take(50).collect::<String>()
        );
        let caps = build_capabilities(config, user_agent);

        match connect_with(&config.webdriver_url, &caps).await {
            Ok(client) => return Ok(Self { client }),
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    config.webdriver_url,
                    e
                );
            }
        }

        for url in FALLBACK_WEBDRIVER_URLS.iter() {
            if *url == config.webdriver_url {
                continue;
            }
            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = connect_with(url, &caps).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self { client });
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(DriverError::Connect {
            url: config.webdriver_url.clone(),
        })
    }

    async fn response_status(&self) -> u16 {
        match self.client.execute(RESPONSE_STATUS_SCRIPT, Vec::new()).await {
            Ok(value) => value
                .as_u64()
                .and_then(|s| u16::try_from(s).ok())
                .unwrap_or(STATUS_OK),
            Err(e) => {
                ::log::debug!("Could not read response status, assuming OK: {}", e);
                STATUS_OK
            }
        }
    }

    async fn load(
        &self,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<Navigation, NavigationError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| handle_navigation_error(e, "navigating to", url))?;

        if let WaitCondition::Selector(selector) = &options.wait {
            self.client
                .wait()
                .at_most(options.timeout)
                .for_element(Locator::Css(selector))
                .await
                .map_err(|e| handle_navigation_error(e, "waiting for content on", url))?;
        }

        let status = self.response_status().await;
        let html = self
            .client
            .source()
            .await
            .map_err(|e| handle_navigation_error(e, "getting source for", url))?;

        Ok(Navigation {
            status,
            document: RenderedDocument::new(url, html),
        })
    }
}

async fn connect_with(
    webdriver_url: &str,
    caps: &Map<String, Value>,
) -> Result<Client, fantoccini::error::NewSessionError> {
    let client = ClientBuilder::native()
        .capabilities(caps.clone())
        .connect(webdriver_url)
        .await?;
    ::log::debug!("Connected to WebDriver at {}", webdriver_url);
    Ok(client)
}

#[async_trait]
impl PageDriver for WebDriverSession {
    async fn navigate(
        &self,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<Navigation, NavigationError> {
        ::log::debug!("Navigating to {}", url);
        match timeout(options.timeout, self.load(url, options)).await {
            Ok(result) => result,
            Err(_) => Err(NavigationError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout_millis(options.timeout),
            }),
        }
    }

    async fn dismiss_consent(&self, selector: &str) -> bool {
        let button = match self.client.find(Locator::Css(selector)).await {
            Ok(button) => button,
            Err(_) => return false,
        };
        ::log::info!("Accepting cookies...");
        if let Err(e) = button.click().await {
            ::log::debug!("Cookie consent click failed: {}", e);
            return false;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        true
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.client
            .screenshot()
            .await
            .map_err(|e| DriverError::Command(e.to_string()))
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| DriverError::Command(e.to_string()))
    }
}

/// Whole milliseconds in `timeout`, saturating at `u64::MAX`
fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Log a WebDriver command failure and turn it into a retryable navigation error
fn handle_navigation_error(
    error: fantoccini::error::CmdError,
    context: &str,
    url: &str,
) -> NavigationError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {} {}", context, url);
    } else {
        ::log::debug!("Failed {} {}: {}", context, url, error);
    }
    NavigationError::Command {
        url: url.to_string(),
        message: error.to_string(),
    }
}

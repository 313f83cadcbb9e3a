use crate::error::{DriverError, NavigationError};
use crate::parsers::embedded;
use async_trait::async_trait;
use std::time::Duration;

/// The only response status treated as a successful navigation
pub const STATUS_OK: u16 = 200;

/// Cookie-consent buttons clicked away on the first page
pub const CONSENT_SELECTOR: &str = r#"button#onetrust-accept-btn-handler, button.cookie-consent-button, button[aria-label="Accept All Cookies"]"#;

/// What a navigation waits for before it is considered complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// The document load event
    Load,
    /// An element matching the CSS selector exists
    Selector(String),
}

#[derive(Debug, Clone)]
pub struct NavigateOptions {
    pub wait: WaitCondition,
    pub timeout: Duration,
}

impl NavigateOptions {
    pub fn new(wait: WaitCondition, timeout: Duration) -> Self {
        Self { wait, timeout }
    }
}

/// Snapshot of a rendered page
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// URL the document was loaded from
    pub url: String,

    /// Serialized DOM after rendering
    pub html: String,
}

impl RenderedDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// Raw text of the embedded structured-data script, if present
    pub fn embedded_payload(&self) -> Option<String> {
        embedded::find_payload(&self.html)
    }
}

/// Result of a navigation that reached the server
#[derive(Debug, Clone)]
pub struct Navigation {
    pub status: u16,
    pub document: RenderedDocument,
}

/// A browser-like session that can load a URL and hand back the rendered page.
///
/// One session is used for a whole run; [`PageDriver::close`] releases it.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and return its status and rendered document
    async fn navigate(
        &self,
        url: &str,
        options: &NavigateOptions,
    ) -> Result<Navigation, NavigationError>;

    /// Click the first element matching `selector`, returning whether one was found
    async fn dismiss_consent(&self, selector: &str) -> bool;

    /// PNG capture of the current page
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// End the session
    async fn close(&self) -> Result<(), DriverError>;
}

//! Page-by-page traversal of a review listing.
//!
//! Each iteration navigates to page N (with backoff retry), waits out the
//! politeness delay for pages after the first, extracts the page and then
//! evaluates the stop conditions in a fixed order:
//!
//! 1. adopt `total_pages` from page 1
//! 2. an empty page ends the run
//! 3. append the page's records, skipping exact duplicates of earlier ones
//! 4. the record cap truncates and ends the run
//! 5. the page cap ends the run
//! 6. the last reported page ends the run
//!
//! The run never returns an error. Fatal failures are reported in
//! [`TraversalReport::failure`] next to whatever was accumulated before them,
//! and the page driver is closed on every exit path.

use crate::config::RunConfig;
use crate::crawlers::driver::{
    CONSENT_SELECTOR, NavigateOptions, Navigation, PageDriver, STATUS_OK, WaitCondition,
};
use crate::error::{HarvestError, NavigationError};
use crate::parsers;
use crate::results::{PageExtraction, ReviewRecord};
use crate::retry::{Backoff, retry_with};
use crate::utils::random_delay;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use url::Url;

/// Why a traversal stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    MaxRecordsReached,
    MaxPagesReached,
    LastPageReached,
    EmptyPage,
    ExtractionError,
    NavigationFailed,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::MaxRecordsReached => "max-records-reached",
            TerminationReason::MaxPagesReached => "max-pages-reached",
            TerminationReason::LastPageReached => "last-page-reached",
            TerminationReason::EmptyPage => "empty-page",
            TerminationReason::ExtractionError => "extraction-error",
            TerminationReason::NavigationFailed => "navigation-failed",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a finished traversal hands to the dataset sink
#[derive(Debug)]
pub struct TraversalReport {
    /// Records in page order, already capped at `max_records`
    pub records: Vec<ReviewRecord>,

    pub reason: TerminationReason,

    /// Page number the run stopped on
    pub last_page: u32,

    /// Page count adopted from page 1
    pub total_pages: u32,

    /// The error that aborted the run, if any
    pub failure: Option<HarvestError>,
}

impl TraversalReport {
    pub fn is_fatal(&self) -> bool {
        self.failure.is_some()
    }
}

/// Outcome of evaluating one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop(TerminationReason),
}

/// Mutable state of one run
#[derive(Debug)]
pub struct TraversalState {
    pub current_page: u32,
    pub total_pages: u32,
    pub accumulated: Vec<ReviewRecord>,
    seen: HashSet<ReviewRecord>,
}

impl Default for TraversalState {
    fn default() -> Self {
        Self::new()
    }
}

impl TraversalState {
    pub fn new() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            accumulated: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Fold one page into the state and decide whether to continue.
    /// A limit of 0 means unbounded.
    pub fn evaluate(&mut self, page: PageExtraction, max_pages: u32, max_records: usize) -> Step {
        if self.current_page == 1 {
            self.total_pages = page.total_pages;
            ::log::info!("Total pages available: {}", self.total_pages);
        }

        if page.records.is_empty() {
            ::log::info!("No reviews found on page {}", self.current_page);
            return Step::Stop(TerminationReason::EmptyPage);
        }

        let found = page.records.len();
        let before = self.accumulated.len();
        for record in page.records {
            if self.seen.insert(record.clone()) {
                self.accumulated.push(record);
            }
        }
        let added = self.accumulated.len() - before;
        if added < found {
            ::log::debug!(
                "Skipped {} duplicate reviews on page {}",
                found - added,
                self.current_page
            );
        }
        ::log::info!(
            "Found {} reviews on page {} ({} total)",
            found,
            self.current_page,
            self.accumulated.len()
        );

        if max_records > 0 && self.accumulated.len() >= max_records {
            ::log::info!("Reached the maximum number of reviews ({})", max_records);
            self.accumulated.truncate(max_records);
            return Step::Stop(TerminationReason::MaxRecordsReached);
        }

        if max_pages > 0 && self.current_page >= max_pages {
            ::log::info!("Reached the maximum number of pages ({})", max_pages);
            return Step::Stop(TerminationReason::MaxPagesReached);
        }

        if self.current_page >= self.total_pages {
            ::log::info!("Reached last page");
            return Step::Stop(TerminationReason::LastPageReached);
        }

        self.current_page += 1;
        Step::Continue
    }
}

/// URL of `page` within the listing; page 1 is the listing URL itself
pub fn page_url(listing: &Url, page: u32) -> String {
    if page <= 1 {
        return listing.to_string();
    }
    let mut url = listing.clone();
    url.query_pairs_mut().append_pair("page", &page.to_string());
    url.to_string()
}

/// Drives a [`PageDriver`] through the listing one page at a time
pub struct TraversalController<'a, D: PageDriver> {
    config: &'a RunConfig,
    driver: D,
    backoff: Backoff,
    options: NavigateOptions,
}

impl<'a, D: PageDriver> TraversalController<'a, D> {
    pub fn new(config: &'a RunConfig, driver: D) -> Self {
        let wait = match &config.wait_for_selector {
            Some(selector) => WaitCondition::Selector(selector.clone()),
            None => WaitCondition::Load,
        };
        Self {
            config,
            driver,
            backoff: Backoff::default(),
            options: NavigateOptions::new(wait, config.navigation_timeout()),
        }
    }

    /// Replace the retry wait schedule
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run the traversal to completion and release the driver
    pub async fn run(self) -> TraversalReport {
        let mut state = TraversalState::new();
        let outcome = self.traverse(&mut state).await;

        match self.driver.close().await {
            Ok(()) => ::log::info!("Browser closed"),
            Err(e) => ::log::warn!("Failed to close browser session: {}", e),
        }

        let (reason, failure) = match outcome {
            Ok(reason) => (reason, None),
            Err((reason, error)) => {
                ::log::error!(
                    "Stopping at page {} with {} reviews collected: {}",
                    state.current_page,
                    state.accumulated.len(),
                    error
                );
                (reason, Some(error))
            }
        };
        ::log::info!("Traversal finished: {}", reason);

        TraversalReport {
            records: state.accumulated,
            reason,
            last_page: state.current_page,
            total_pages: state.total_pages,
            failure,
        }
    }

    async fn traverse(
        &self,
        state: &mut TraversalState,
    ) -> Result<TerminationReason, (TerminationReason, HarvestError)> {
        let listing = self
            .config
            .listing_url()
            .map_err(|e| (TerminationReason::NavigationFailed, HarvestError::from(e)))?;

        loop {
            let page = state.current_page;
            let url = page_url(&listing, page);
            let label = if page == 1 {
                "Page navigation".to_string()
            } else {
                format!("Page {} navigation", page)
            };

            ::log::info!("Navigating to: {}", url);
            let navigation = retry_with(
                &self.backoff,
                || self.navigate_ok(&url),
                self.config.max_retries,
                &label,
            )
            .await
            .map_err(|e| (TerminationReason::NavigationFailed, HarvestError::from(e)))?;

            if page > 1 {
                let delay = random_delay(self.config.inter_request_delay);
                ::log::info!("Waiting for {}ms...", delay.as_millis());
                tokio::time::sleep(delay).await;
            } else if self.driver.dismiss_consent(CONSENT_SELECTOR).await {
                ::log::debug!("Dismissed cookie consent dialog");
            }

            ::log::info!("Processing page {}...", page);
            if let Some(dir) = &self.config.screenshot_dir {
                self.capture_screenshot(dir, page).await;
            }

            let extraction = parsers::extract(&navigation.document).map_err(|e| {
                ::log::error!("Error processing page {}: {}", page, e);
                (TerminationReason::ExtractionError, HarvestError::from(e))
            })?;

            match state.evaluate(extraction, self.config.max_pages, self.config.max_records) {
                Step::Continue => continue,
                Step::Stop(reason) => return Ok(reason),
            }
        }
    }

    /// One navigation attempt; any status other than OK counts as a failure
    async fn navigate_ok(&self, url: &str) -> Result<Navigation, NavigationError> {
        let navigation = self.driver.navigate(url, &self.options).await?;
        ::log::debug!("HTTP Response Code: {}", navigation.status);
        if navigation.status != STATUS_OK {
            return Err(NavigationError::Status {
                url: url.to_string(),
                status: navigation.status,
            });
        }
        Ok(navigation)
    }

    async fn capture_screenshot(&self, dir: &Path, page: u32) {
        let path = dir.join(format!("{}_page{}.png", self.config.output_stem(), page));
        let png = match self.driver.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                ::log::warn!("Screenshot of page {} failed: {}", page, e);
                return;
            }
        };
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            ::log::warn!("Could not create screenshot directory {}: {}", dir.display(), e);
            return;
        }
        match tokio::fs::write(&path, png).await {
            Ok(()) => ::log::debug!("Saved screenshot {}", path.display()),
            Err(e) => ::log::warn!("Could not write {}: {}", path.display(), e),
        }
    }
}

//! Resilient extraction of review records from a paginated, JavaScript-rendered
//! listing.
//!
//! A run walks the listing one page at a time through a [`PageDriver`],
//! retrying navigation with exponential backoff, and stops on the first of:
//! record cap, page cap, last page, an empty page, or a fatal error. Whatever
//! was collected is then de-duplicated, capped and written as JSON and CSV.

pub mod config;
pub mod crawlers;
pub mod error;
pub mod output;
pub mod parsers;
pub mod results;
pub mod retry;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::RunConfig;
pub use crawlers::{PageDriver, TerminationReason, TraversalController, TraversalReport};
pub use error::HarvestError;
pub use output::PersistOutcome;
pub use results::ReviewRecord;

use crawlers::web::WebDriverSession;

/// What a completed run produced
#[derive(Debug)]
pub struct RunSummary {
    /// The final dataset, as written
    pub records: Vec<ReviewRecord>,

    pub reason: TerminationReason,

    /// Last page visited
    pub last_page: u32,

    pub total_pages: u32,

    pub output: PersistOutcome,

    /// Set when the traversal was aborted; partial results were still persisted
    pub failure: Option<HarvestError>,
}

/// Validate the configuration, open a WebDriver session and harvest the listing
pub async fn harvest(config: &RunConfig) -> Result<RunSummary, HarvestError> {
    config.validate()?;
    let session = WebDriverSession::connect(&config.driver).await?;
    harvest_with(config, session).await
}

/// Harvest the listing with an already-acquired driver.
///
/// The driver is closed before this returns. Output errors are the only
/// errors returned directly; traversal failures end up in
/// [`RunSummary::failure`] after the partial dataset has been written.
pub async fn harvest_with<D: PageDriver>(
    config: &RunConfig,
    driver: D,
) -> Result<RunSummary, HarvestError> {
    let report = TraversalController::new(config, driver).run().await;

    let records = output::finalize(report.records, config.max_records);
    let output = output::persist(&records, &config.output_dir, config.output_stem())?;

    Ok(RunSummary {
        records,
        reason: report.reason,
        last_page: report.last_page,
        total_pages: report.total_pages,
        output,
        failure: report.failure,
    })
}

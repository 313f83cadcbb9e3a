use clap::Parser;
use review_harvest::output::PersistOutcome;
use review_harvest::utils::preview;
use review_harvest::{RunConfig, RunSummary};

mod args;
use args::Args;

/// Records shown in the closing sample
const SAMPLE_SIZE: usize = 3;
const SAMPLE_TEXT_CHARS: usize = 100;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging; RUST_LOG still wins when set
    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    log_config(&config);
    println!("Note: harvesting requires a WebDriver server (e.g., ChromeDriver or geckodriver).");
    println!(
        "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
    );

    let start_time = std::time::Instant::now();
    let summary = match review_harvest::harvest(&config).await {
        Ok(summary) => summary,
        Err(e) => {
            ::log::error!("Harvest failed: {}", e);
            std::process::exit(1);
        }
    };

    report(&summary);
    ::log::info!(
        "Finished in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    if summary.failure.is_some() {
        std::process::exit(1);
    }
}

fn log_config(config: &RunConfig) {
    ::log::info!("Target: {}", config.listing_base_url);
    if let Some(term) = &config.search_filter {
        ::log::info!("Search filter: {}", term);
    }
    ::log::info!(
        "Limits: {} pages, {} reviews (0 = no limit)",
        config.max_pages,
        config.max_records
    );
    ::log::info!(
        "Browser: {:?} user agent, headless={}, proxy={}",
        config.driver.user_agent_profile,
        config.driver.headless,
        config.driver.proxy.as_deref().unwrap_or("none")
    );
    if let Some(dir) = &config.screenshot_dir {
        ::log::info!("Screenshots: {}", dir.display());
    }
}

fn report(summary: &RunSummary) {
    ::log::info!(
        "Stopped after page {} of {}: {}",
        summary.last_page,
        summary.total_pages,
        summary.reason
    );

    match &summary.output {
        PersistOutcome::Written { json, csv, count } => {
            ::log::info!("{} reviews written", count);
            ::log::info!("JSON: {}", json.display());
            ::log::info!("CSV: {}", csv.display());
        }
        PersistOutcome::Skipped => ::log::warn!("No reviews collected"),
    }

    if let Some(failure) = &summary.failure {
        ::log::error!("Run aborted: {}", failure);
    }

    for (i, record) in summary.records.iter().take(SAMPLE_SIZE).enumerate() {
        ::log::info!(
            "Sample {}: {} | {} | {} stars | {}",
            i + 1,
            record.reviewer_name,
            record.date_experience,
            record.rating,
            preview(&record.review_text, SAMPLE_TEXT_CHARS)
        );
    }
}

use std::process::ExitCode;

use anyhow::Context;
use tori_watch::notify::TelegramNotifier;
use tori_watch::scrapers::ToriScraper;
use tori_watch::store::{FsStore, GcsStore, StateStore, StoreLocation};
use tori_watch::{run_once, Config, RunOutcome};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EXIT_CONFIG: u8 = 3;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let (scraper, store) = match collaborators(&config) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup failed: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let notifier = TelegramNotifier::new(&config.telegram_token);

    info!(keyword = %config.keyword, category = %config.category, "Checking tori for new ads");

    match run_once(&config.run_config(), &scraper, store.as_ref(), &notifier).await {
        Ok(RunOutcome::NoNewItems) => {
            info!("Run finished: no new items");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Notified { new_items, failures }) => {
            for failure in &failures {
                warn!(url = %failure.url, "Undelivered: {}", failure.error);
            }
            info!(failed = failures.len(), "Run finished: {new_items} new items notified");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Run failed: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn collaborators(config: &Config) -> anyhow::Result<(ToriScraper, Box<dyn StateStore>)> {
    let scraper = ToriScraper::new().context("Failed to create HTTP client")?;

    let location = StoreLocation::parse(&config.bucket).context("Invalid BUCKET")?;
    let store: Box<dyn StateStore> = match location {
        StoreLocation::Gcs(bucket) => Box::new(
            GcsStore::new(bucket, config.gcs_token.clone()).context("Failed to create GCS client")?,
        ),
        StoreLocation::Fs(dir) => Box::new(FsStore::new(dir)),
    };

    Ok((scraper, store))
}

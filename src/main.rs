//! Entrypoint for the automated check-in. Loads the account list, runs the
//! sequential sign-in loop, logs the summary, and pushes the report if a
//! notification endpoint is configured. Only configuration problems exit
//! non-zero; individual sign-in failures are reported, not fatal.

use std::env;
use std::process;

use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use wps_checkin::config::load_config;
use wps_checkin::notify::Notifier;
use wps_checkin::runner::{log_summary, render_report, CheckinRunner};

const CONFIG_ENV_VAR: &str = "WPS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/token.json";

const NOTIFY_TITLE: &str = "WPS check-in results";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            error!("configuration failed: {err}");
            eprintln!("configuration failed: {err}");
            process::exit(1);
        }
    };

    if config.accounts.is_empty() {
        warn!("no accounts configured under the wps node; nothing to do");
        return;
    }

    let runner = CheckinRunner::new(config.accounts);
    let results = runner.run().await;
    log_summary(&results);

    if let Some(bark) = config.bark {
        let report = render_report(&results);
        Notifier::new(bark).send(NOTIFY_TITLE, &report).await;
    }
}

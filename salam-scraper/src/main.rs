use std::env;
use std::process::ExitCode;

mod cli;
mod fetch;
mod scrape;

use scrape::{RunError, Scraper};

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "salam_scraper=info,salam_parser=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::parse(env::args().skip(1).collect());

    setup_logging();

    let scraper = match Scraper::new(args.config) {
        Ok(scraper) => scraper,
        Err(err) => {
            log::error!("Failed to set up HTTP client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match scraper.run().await {
        Ok(outcome) => outcome,
        Err(RunError::NothingToWrite) => {
            log::error!("No events found and no existing calendar!");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&outcome.new_events) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                log::error!("Failed to serialize events: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    log::info!(
        "Scraping complete: {} new, {} total",
        outcome.report.added,
        outcome.report.total
    );

    ExitCode::SUCCESS
}

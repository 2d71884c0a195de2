use std::collections::HashSet;

use reqwest::Client;
use salam_parser::{
    extract_event, load_existing_keys, parse_feed, scan_new_events, write_calendar, DedupKey,
    EventRecord, MergeReport, WriteError,
};

use crate::cli::Config;
use crate::fetch::{self, FetchError};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("no events found and no existing calendar")]
    NothingToWrite,
    #[error(transparent)]
    Write(#[from] WriteError),
}

#[derive(Debug)]
pub struct RunOutcome {
    pub new_events: Vec<EventRecord>,
    pub report: MergeReport,
}

pub struct Scraper {
    config: Config,
    client: Client,
}

impl Scraper {
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let client = fetch::client(&config)?;
        Ok(Self { config, client })
    }

    /// Load existing keys, scrape the feed, merge what is new into the calendar.
    ///
    /// A failed fetch or a broken feed counts as "nothing new": the calendar is
    /// still rewritten with its existing events, unless there are none.
    pub async fn run(&self) -> Result<RunOutcome, RunError> {
        let known = load_existing_keys(&self.config.output);
        let new_events = self.scrape(&known).await;

        if new_events.is_empty() && known.is_empty() {
            return Err(RunError::NothingToWrite);
        }

        let report = write_calendar(&self.config.output, &new_events)?;

        Ok(RunOutcome { new_events, report })
    }

    async fn scrape(&self, known: &HashSet<DedupKey>) -> Vec<EventRecord> {
        let body = match fetch::fetch_feed(&self.client, &self.config.feed_url).await {
            Ok(body) => body,
            Err(err) => {
                log::error!("Error scraping events: {err}");
                return Vec::new();
            }
        };

        let entries = parse_feed(&body).unwrap_or_else(|err| {
            log::warn!("Could not parse feed: {err}");
            Vec::new()
        });

        if entries.is_empty() {
            log::info!("No events found in feed");
            return Vec::new();
        }

        log::info!("Found {} items in feed", entries.len());

        let tz = self.config.timezone;
        let events = entries.iter().filter_map(|entry| {
            extract_event(entry, tz)
                .map_err(|reason| log::warn!("Skipped {:?}: {reason}", entry.title))
                .ok()
        });

        let new_events = scan_new_events(events, known);
        log::info!("Total new events scraped: {}", new_events.len());

        new_events
    }
}

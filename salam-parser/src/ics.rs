use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use ics::escape_text;
use ics::properties::{Description, DtEnd, DtStart, Location, Summary};
use tempfile::NamedTempFile;

use crate::calendar::{event_blocks, read_calendar, CalendarBlock};
use crate::{utc_stamp, EventRecord};

pub const PRODID: &str = "-//Salam Center//Events Scraper//EN";

const CRLF: &str = "\r\n";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("event ends ({end}) before it starts ({start})")]
    EndBeforeStart { start: String, end: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("could not read existing calendar: {0}")]
    Read(#[source] io::Error),
    #[error("could not write calendar: {0}")]
    Write(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub preserved: usize,
    pub added: usize,
    pub total: usize,
}

impl EventRecord {
    #[must_use]
    pub fn uid(&self) -> String {
        let digest = format!("{:x}", md5::compute(self.title.as_bytes()));
        format!("{}-{}", self.start.format("%Y%m%d%H%M%S"), &digest[..8])
    }

    #[must_use]
    pub fn ics_description(&self) -> String {
        match (self.description.is_empty(), self.url.is_empty()) {
            (_, true) => self.description.clone(),
            (true, false) => format!("More info: {}", self.url),
            (false, false) => format!("{}\n\nMore info: {}", self.description, self.url),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_valid_range() {
            Ok(())
        } else {
            Err(ValidationError::EndBeforeStart {
                start: utc_stamp(&self.start),
                end: utc_stamp(&self.end),
            })
        }
    }

    #[must_use]
    pub fn to_ics(&self, dtstamp: &str) -> ics::Event<'_> {
        let mut ics_event = ics::Event::new(self.uid(), dtstamp.to_string());

        ics_event.push(Summary::new(escape_text(self.title.as_str())));
        ics_event.push(DtStart::new(utc_stamp(&self.start)));
        ics_event.push(DtEnd::new(utc_stamp(&self.end)));
        ics_event.push(Description::new(escape_text(self.ics_description())));

        if !self.location.is_empty() {
            ics_event.push(Location::new(escape_text(self.location.as_str())));
        }

        ics_event
    }
}

/// Serializes the valid events into blocks, dropping (and logging) invalid ones.
pub fn generate_blocks(events: &[EventRecord], now: DateTime<Utc>) -> Vec<CalendarBlock> {
    let dtstamp = utc_stamp(&now);
    let mut icalendar = ics::ICalendar::new("2.0", PRODID);

    for event in events {
        if let Err(err) = event.validate() {
            log::warn!("Skipping event {:?}: {err}", event.title);
            continue;
        }
        icalendar.add_event(event.to_ics(&dtstamp));
    }

    // The serializer emits its own VCALENDAR envelope; only the VEVENTs are kept.
    event_blocks(icalendar.to_string().as_bytes())
        .into_iter()
        .map(CalendarBlock::Generated)
        .collect()
}

pub fn render_calendar(blocks: &[CalendarBlock], now: DateTime<Utc>) -> Vec<u8> {
    let header = [
        String::from("BEGIN:VCALENDAR"),
        String::from("VERSION:2.0"),
        format!("PRODID:{PRODID}"),
        format!("COMMENT:Generated at {}", now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    ];

    let mut out = Vec::new();
    for line in header {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(CRLF.as_bytes());
    }

    let generated = blocks.iter().filter(|block| matches!(block, CalendarBlock::Generated(_)));
    let preserved = blocks.iter().filter(|block| matches!(block, CalendarBlock::Preserved(_)));
    for block in generated.chain(preserved) {
        out.extend_from_slice(block.bytes());
    }

    out.extend_from_slice(b"END:VCALENDAR");
    out.extend_from_slice(CRLF.as_bytes());
    out
}

/// Prepends `events` to the blocks already stored at `path` and rewrites it.
pub fn write_calendar(path: &Path, events: &[EventRecord]) -> Result<MergeReport, WriteError> {
    let now = Utc::now();

    let preserved = match read_calendar(path).map_err(WriteError::Read)? {
        Some(content) => {
            let blocks = event_blocks(&content);
            log::info!("Preserved {} existing events from {}", blocks.len(), path.display());
            blocks
        }
        None => {
            log::info!("No existing calendar at {}, creating a new one", path.display());
            Vec::new()
        }
    };

    let mut blocks = generate_blocks(events, now);
    let report = MergeReport {
        preserved: preserved.len(),
        added: blocks.len(),
        total: preserved.len() + blocks.len(),
    };
    blocks.extend(preserved.into_iter().map(CalendarBlock::Preserved));

    replace_file(path, &render_calendar(&blocks, now))?;

    log::info!(
        "Wrote {}: {} existing, {} new, {} total",
        path.display(),
        report.preserved,
        report.added,
        report.total
    );

    Ok(report)
}

fn replace_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        file.as_file().set_permissions(metadata.permissions())?;
    }

    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

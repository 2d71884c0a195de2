mod calendar;
mod dedup;
mod extract;
mod feed;
mod html;
mod structs;

#[cfg(feature = "ics")]
mod ics;

pub use calendar::{
    event_blocks, existing_keys, load_existing_keys, read_calendar, unescape_text, CalendarBlock,
};
pub use dedup::scan_new_events;
pub use extract::{extract_event, SkipReason};
pub use feed::{parse_feed, ParseError};
pub use html::clean_text;
pub use structs::{utc_stamp, DedupKey, EventRecord, FeedEntry};

#[cfg(feature = "ics")]
pub use crate::ics::{
    generate_blocks, render_calendar, write_calendar, MergeReport, ValidationError, WriteError,
    PRODID,
};

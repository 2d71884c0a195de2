use std::collections::HashSet;

use crate::{DedupKey, EventRecord};

/// Takes events from a newest-first feed until the first one already in `known`.
///
/// Everything after that event is assumed to have been stored by an earlier run
/// and is not looked at. An unknown event that follows a known one is therefore
/// never returned.
pub fn scan_new_events<I>(events: I, known: &HashSet<DedupKey>) -> Vec<EventRecord>
where
    I: IntoIterator<Item = EventRecord>,
{
    let mut new_events = Vec::new();

    for event in events {
        if known.contains(&event.dedup_key()) {
            log::info!("Existing: {}", event.title);
            log::info!("Reached existing events, stopping scan");
            break;
        }

        log::info!("NEW: {} - {}", event.title, event.start_display());
        new_events.push(event);
    }

    new_events
}

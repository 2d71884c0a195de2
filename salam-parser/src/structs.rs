use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeedEntry {
    pub title: String,
    pub published: Option<String>,
    pub content: Option<String>,
    pub link: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EventRecord {
    pub title: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub location: String,
    pub description: String,
    pub url: String,
}

/// Identity used to recognise an event that was already written in a previous run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub title: String,
    pub start: String,
}

pub fn utc_stamp<Z: chrono::TimeZone>(time: &DateTime<Z>) -> String {
    time.with_timezone(&Utc)
        .format("%Y%m%dT%H%M%SZ")
        .to_string()
}

impl EventRecord {
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.title, utc_stamp(&self.start))
    }

    #[must_use]
    pub fn is_valid_range(&self) -> bool {
        self.end >= self.start
    }

    #[must_use]
    pub fn start_display(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

impl DedupKey {
    pub fn new<T: Into<String>, S: Into<String>>(title: T, start: S) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
        }
    }
}

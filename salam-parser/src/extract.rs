use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::html::clean_optional;
use crate::{EventRecord, FeedEntry};

const DEFAULT_DURATION_HOURS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("entry has no title")]
    MissingTitle,
    #[error("no usable start date")]
    NoStartDate,
    #[error("could not parse start date {0:?}")]
    InvalidStartDate(String),
    #[error("{0} does not exist in the configured timezone")]
    NonexistentLocalTime(String),
}

pub fn extract_event(entry: &FeedEntry, tz: Tz) -> Result<EventRecord, SkipReason> {
    if entry.title.is_empty() {
        return Err(SkipReason::MissingTitle);
    }

    let published = entry
        .published
        .as_deref()
        .filter(|date| !date.is_empty())
        .and_then(|date| parse_published(date, tz));

    let start = match (published, entry.start_date.as_deref()) {
        (Some(start), _) => start,
        (None, Some(raw)) => {
            let date =
                parse_bare_date(raw).ok_or_else(|| SkipReason::InvalidStartDate(raw.into()))?;
            at_local_time(tz, date, 9)?
        }
        (None, None) => return Err(SkipReason::NoStartDate),
    };

    let end = entry
        .end_date
        .as_deref()
        .and_then(parse_bare_date)
        .and_then(|date| at_local_time(tz, date, 17).ok())
        .unwrap_or_else(|| start + Duration::hours(DEFAULT_DURATION_HOURS));

    let description = clean_optional(entry.content.as_deref());

    let location = entry
        .location
        .clone()
        .filter(|location| !location.is_empty())
        .or_else(|| location_from_description(&description))
        .unwrap_or_default();

    Ok(EventRecord {
        title: entry.title.clone(),
        start,
        end,
        location,
        description,
        url: entry.link.clone(),
    })
}

/// Feed publish dates are RFC 2822 in RSS and RFC 3339 in Atom.
fn parse_published(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    match DateTime::parse_from_rfc2822(raw).or_else(|_| DateTime::parse_from_rfc3339(raw)) {
        Ok(date) => Some(date.with_timezone(&tz)),
        Err(err) => {
            log::warn!("Could not parse date {raw:?}: {err}");
            None
        }
    }
}

fn parse_bare_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn at_local_time(tz: Tz, date: NaiveDate, hour: u32) -> Result<DateTime<Tz>, SkipReason> {
    let naive = date
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| SkipReason::NonexistentLocalTime(date.to_string()))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| SkipReason::NonexistentLocalTime(naive.to_string()))
}

/// First line of the form `Location: ...` (case-insensitive, colon optional).
fn location_from_description(description: &str) -> Option<String> {
    static LOCATION: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?im)^[^\S\n]*location\b[^\S\n]*:?[^\S\n]*(\S[^\n]*)").unwrap()
    });

    LOCATION
        .captures(description)
        .and_then(|captures| captures.get(1))
        .map(|location| location.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use chrono_tz::America::Los_Angeles;

    use super::*;
    use crate::feed::{parse_feed, tests::SAMPLE_RSS};

    fn entry(title: &str) -> FeedEntry {
        FeedEntry {
            title: title.into(),
            link: "https://salamcenter.org/events/x/".into(),
            ..FeedEntry::default()
        }
    }

    #[test]
    fn empty_title_is_skipped() {
        let mut entry = entry("");
        entry.published = Some("Thu, 25 Dec 2025 17:00:00 -0800".into());
        entry.start_date = Some("2025-12-25".into());
        entry.location = Some("Hall".into());
        assert_eq!(extract_event(&entry, Los_Angeles), Err(SkipReason::MissingTitle));
    }

    #[test]
    fn published_date_converted_to_local_time() {
        let mut entry = entry("Community Dinner");
        entry.published = Some("Fri, 26 Dec 2025 04:00:00 +0000".into());

        let event = extract_event(&entry, Los_Angeles).unwrap();
        assert_eq!(event.start, Los_Angeles.with_ymd_and_hms(2025, 12, 25, 20, 0, 0).unwrap());
        assert_eq!(event.end - event.start, Duration::hours(2));
        assert_eq!(event.url, "https://salamcenter.org/events/x/");
    }

    #[test]
    fn vendor_start_date_defaults_to_nine_am() {
        let mut entry = entry("Food Drive");
        entry.start_date = Some("2026-01-09".into());

        let event = extract_event(&entry, Los_Angeles).unwrap();
        assert_eq!(event.start, Los_Angeles.with_ymd_and_hms(2026, 1, 9, 9, 0, 0).unwrap());
        assert_eq!(event.end.hour(), 11);
    }

    #[test]
    fn unparseable_published_falls_back_to_vendor_date() {
        let mut entry = entry("Food Drive");
        entry.published = Some("sometime soon".into());
        entry.start_date = Some("2026-01-09".into());

        let event = extract_event(&entry, Los_Angeles).unwrap();
        assert_eq!(event.start.hour(), 9);
    }

    #[test]
    fn bad_vendor_start_date_is_skipped() {
        let mut entry = entry("Food Drive");
        entry.start_date = Some("09/01/2026".into());
        assert_eq!(
            extract_event(&entry, Los_Angeles),
            Err(SkipReason::InvalidStartDate("09/01/2026".into()))
        );
    }

    #[test]
    fn missing_dates_are_skipped() {
        assert_eq!(extract_event(&entry("Open House"), Los_Angeles), Err(SkipReason::NoStartDate));
    }

    #[test]
    fn vendor_end_date_sets_five_pm() {
        let mut entry = entry("Retreat");
        entry.start_date = Some("2026-01-09".into());
        entry.end_date = Some("2026-01-11".into());

        let event = extract_event(&entry, Los_Angeles).unwrap();
        assert_eq!(event.end, Los_Angeles.with_ymd_and_hms(2026, 1, 11, 17, 0, 0).unwrap());
    }

    #[test]
    fn bad_vendor_end_date_keeps_default_duration() {
        let mut entry = entry("Retreat");
        entry.start_date = Some("2026-01-09".into());
        entry.end_date = Some("next week".into());

        let event = extract_event(&entry, Los_Angeles).unwrap();
        assert_eq!(event.end, event.start + Duration::hours(2));
    }

    #[test]
    fn vendor_location_wins_over_description() {
        let mut entry = entry("Retreat");
        entry.start_date = Some("2026-01-09".into());
        entry.location = Some("Camp Wildwood".into());
        entry.content = Some("<p>Location: Main Hall</p>".into());

        let event = extract_event(&entry, Los_Angeles).unwrap();
        assert_eq!(event.location, "Camp Wildwood");
        assert_eq!(event.description, "Location: Main Hall");
    }

    #[test]
    fn location_read_from_description_line() {
        let mut entry = entry("Halaqa");
        entry.start_date = Some("2026-01-09".into());
        entry.content = Some("<p>Weekly circle.</p>\n<p>LOCATION   Room 4 &amp; 5 </p>\n<p>Location: ignored</p>".into());

        let event = extract_event(&entry, Los_Angeles).unwrap();
        assert_eq!(event.location, "Room 4 & 5");
    }

    #[test]
    fn location_colon_is_not_part_of_the_value() {
        let mut entry = entry("Halaqa");
        entry.start_date = Some("2026-01-09".into());

        entry.content = Some("<p>Location:&nbsp;Main Hall</p>".into());
        assert_eq!(extract_event(&entry, Los_Angeles).unwrap().location, "Main Hall");

        entry.content = Some("<p>Location:Hall</p>".into());
        assert_eq!(extract_event(&entry, Los_Angeles).unwrap().location, "Hall");

        entry.content = Some("<p>Location :  Youth Room</p>".into());
        assert_eq!(extract_event(&entry, Los_Angeles).unwrap().location, "Youth Room");
    }

    #[test]
    fn no_location_anywhere_is_empty() {
        let mut entry = entry("Halaqa");
        entry.start_date = Some("2026-01-09".into());
        entry.content = Some("<p>Relocation is not a location line</p>\n<p>Locations vary by week</p>".into());

        let event = extract_event(&entry, Los_Angeles).unwrap();
        assert_eq!(event.location, "");
    }

    #[test]
    fn extracts_sample_feed() {
        let events = parse_feed(SAMPLE_RSS.as_bytes())
            .unwrap()
            .iter()
            .map(|entry| extract_event(entry, Los_Angeles))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(events[0].start, Los_Angeles.with_ymd_and_hms(2025, 12, 26, 12, 0, 0).unwrap());
        assert_eq!(events[0].location, "Main Prayer Hall");
        assert_eq!(events[1].location, "Parking Lot");
        assert_eq!(events[1].end, Los_Angeles.with_ymd_and_hms(2026, 1, 10, 17, 0, 0).unwrap());
    }
}

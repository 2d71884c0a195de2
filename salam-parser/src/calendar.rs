use std::collections::HashSet;
use std::path::Path;
use std::{fs, io};

use crate::DedupKey;

const BEGIN_EVENT: &str = "BEGIN:VEVENT";
const END_EVENT: &str = "END:VEVENT";

/// One `VEVENT` in an output calendar, including its line terminators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarBlock {
    /// Carried over from a previous run, byte for byte.
    Preserved(Vec<u8>),
    Generated(Vec<u8>),
}

impl CalendarBlock {
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match self {
            CalendarBlock::Preserved(bytes) | CalendarBlock::Generated(bytes) => bytes,
        }
    }
}

pub fn read_calendar(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Dedup keys of every event already present in the calendar at `path`.
///
/// A missing or unreadable file yields an empty set; the next run then treats
/// every feed entry as new instead of failing.
pub fn load_existing_keys(path: &Path) -> HashSet<DedupKey> {
    match read_calendar(path) {
        Ok(Some(content)) => {
            let keys = existing_keys(&String::from_utf8_lossy(&content));
            log::info!("Loaded {} existing events from {}", keys.len(), path.display());
            keys
        }
        Ok(None) => {
            log::warn!("No existing calendar at {}, a new one will be created", path.display());
            HashSet::new()
        }
        Err(err) => {
            log::warn!("Error reading existing calendar {}: {err}", path.display());
            HashSet::new()
        }
    }
}

pub fn existing_keys(content: &str) -> HashSet<DedupKey> {
    let mut keys = HashSet::new();
    let mut in_event = false;
    let mut summary = String::new();
    let mut start = String::new();

    for line in unfolded_lines(content) {
        if line.starts_with(BEGIN_EVENT) {
            in_event = true;
            summary.clear();
            start.clear();
        } else if line.starts_with(END_EVENT) {
            if in_event && !summary.is_empty() && !start.is_empty() {
                keys.insert(DedupKey::new(summary.as_str(), start.as_str()));
            }
            in_event = false;
        } else if in_event {
            if let Some(value) = line.strip_prefix("SUMMARY:") {
                summary = unescape_text(value);
            } else if let Some(value) = line.strip_prefix("DTSTART:") {
                start = value.trim().to_string();
            }
        }
    }

    keys
}

/// Raw bytes of every `VEVENT`, including its own line terminators, in file order.
pub fn event_blocks(content: &[u8]) -> Vec<Vec<u8>> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    for line in content.split_inclusive(|&byte| byte == b'\n') {
        if line.starts_with(BEGIN_EVENT.as_bytes()) {
            current = Some(line.to_vec());
        } else if let Some(block) = current.as_mut() {
            block.extend_from_slice(line);
            if line.starts_with(END_EVENT.as_bytes()) {
                let mut block = current.take().unwrap_or_default();
                if !block.ends_with(b"\n") {
                    block.push(b'\n');
                }
                blocks.push(block);
            }
        }
    }

    blocks
}

/// Joins RFC 5545 folded lines (continuations start with a space or tab).
fn unfolded_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for line in content.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match (line.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(continuation), Some(last)) => last.push_str(continuation),
            _ => lines.push(line.to_string()),
        }
    }

    lines
}

/// Reverses RFC 5545 text escaping (`\,` `\;` `\\` `\n`).
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

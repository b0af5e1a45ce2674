use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to parse date: {raw:?}")]
pub struct DateParseError {
    pub raw: String,
}

#[derive(Clone, Copy, Debug)]
enum Layout {
    Rfc3339,
    Date(&'static str),
    Rfc2822,
}

// Tried in order; first match wins.
const LAYOUTS: [Layout; 5] = [
    Layout::Rfc3339,
    Layout::Date("%Y-%m-%d"),
    Layout::Date("%m/%d/%Y"),
    Layout::Date("%d-%b-%y"),
    Layout::Rfc2822,
];

// Parse a feed timestamp into UTC. Accepts RFC3339 ("2024-03-05T10:00:00Z"),
// "YYYY-MM-DD", "MM/DD/YYYY", "DD-Mon-YY" and RSS pubDate ("Tue, 02 Sep 2025 04:30:00 +0000").
// Date-only layouts resolve to midnight UTC.
pub fn parse_published(raw: &str) -> Result<DateTime<Utc>, DateParseError> {
    let s = raw.trim();
    for layout in LAYOUTS {
        if let Some(dt) = try_layout(layout, s) {
            return Ok(dt);
        }
    }
    Err(DateParseError { raw: s.to_string() })
}

fn try_layout(layout: Layout, s: &str) -> Option<DateTime<Utc>> {
    match layout {
        Layout::Rfc3339 => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)),
        Layout::Date(fmt) => {
            let nd = NaiveDate::parse_from_str(s, fmt).ok()?;
            Some(nd.and_hms_opt(0, 0, 0)?.and_utc())
        }
        Layout::Rfc2822 => DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.with_timezone(&Utc)),
    }
}

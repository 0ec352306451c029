use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde_json::Value;

/// One requested calendar day, with boundaries computed in local time.
///
/// Built once from the `YYYY-MM-DD` argument and threaded to every source.
#[derive(Debug, Clone)]
pub struct DayWindow {
    pub date: String,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl DayWindow {
    /// Parse a `YYYY-MM-DD` string into a local-time day window.
    pub fn for_date(date: &str) -> Option<DayWindow> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        let start = Local
            .from_local_datetime(&day.and_hms_opt(0, 0, 0)?)
            .earliest()?;
        let end = Local
            .from_local_datetime(&day.and_hms_milli_opt(23, 59, 59, 999)?)
            .earliest()?;
        Some(DayWindow {
            date: date.to_string(),
            start,
            end,
        })
    }

    pub fn today() -> DayWindow {
        let now = Local::now();
        let date = now.format("%Y-%m-%d").to_string();
        // Midnight can be skipped by a DST transition; degrade to a
        // point-in-time window rather than failing.
        DayWindow::for_date(&date).unwrap_or(DayWindow {
            date,
            start: now,
            end: now,
        })
    }

    pub fn contains(&self, ts: &DateTime<Local>) -> bool {
        *ts >= self.start && *ts <= self.end
    }

    /// Clamp a timestamp into the window.
    pub fn clip(&self, ts: DateTime<Local>) -> DateTime<Local> {
        ts.clamp(self.start, self.end)
    }
}

/// Parse a timestamp from a JSON value: RFC 3339 strings, or epoch numbers
/// in seconds or milliseconds (sources disagree on the unit).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Local>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let raw = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            parse_epoch(raw)
        }
        _ => None,
    }
}

pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Local>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Local));
    }
    // Some sources write epoch numbers as strings.
    s.trim().parse::<i64>().ok().and_then(parse_epoch)
}

/// Epoch values above this are treated as milliseconds (the cutoff is
/// ~5138 AD in seconds, ~1973 in milliseconds).
const EPOCH_MILLIS_CUTOFF: i64 = 100_000_000_000;

fn parse_epoch(raw: i64) -> Option<DateTime<Local>> {
    if raw <= 0 {
        return None;
    }
    let utc = if raw >= EPOCH_MILLIS_CUTOFF {
        Utc.timestamp_millis_opt(raw).single()?
    } else {
        Utc.timestamp_opt(raw, 0).single()?
    };
    Some(utc.with_timezone(&Local))
}

pub mod recap;
pub mod sources;
pub mod usage;

use anyhow::{anyhow, Result};

use crate::sources::DayWindow;

/// Resolve the requested day, defaulting to today. An unparsable date is a
/// fatal configuration error at the command boundary.
pub(crate) fn resolve_window(date: Option<String>) -> Result<DayWindow> {
    match date {
        Some(date) => DayWindow::for_date(&date)
            .ok_or_else(|| anyhow!("Invalid date '{}', expected YYYY-MM-DD", date)),
        None => Ok(DayWindow::today()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_window_validates() {
        assert!(resolve_window(Some("2026-02-05".into())).is_ok());
        assert!(resolve_window(Some("nope".into())).is_err());
        assert!(resolve_window(None).is_ok());
    }
}

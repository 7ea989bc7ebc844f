//! Current broadcast season resolution.

use chrono::{DateTime, Datelike, TimeZone};
use shared::{Season, SeasonToken};

/// Season token for the given instant, e.g. "summer_2025" for any day in July 2025
///
/// The caller supplies `now`; nothing here reads the system clock.
pub fn resolve_current_season<Tz: TimeZone>(now: &DateTime<Tz>) -> SeasonToken {
    SeasonToken::new(Season::from_month(now.month()), now.year())
}

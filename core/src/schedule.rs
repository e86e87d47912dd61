use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, TimeZone};

/// First valid local instant of the given calendar day.
///
/// Midnight can be skipped or duplicated by DST transitions; a skipped
/// midnight resolves to the first instant that exists, an ambiguous one to
/// the earlier of the two.
pub fn local_midnight(date: NaiveDate) -> Result<DateTime<Local>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("date out of range for midnight")?;
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt),
        LocalResult::None => Local
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .context("could not resolve local midnight"),
    }
}

/// Next wall-clock local midnight strictly after `now`.
///
/// The daily reset loop recomputes this after every firing instead of
/// sleeping a fixed 24 h, so clock changes never accumulate drift.
pub fn next_midnight(now: DateTime<Local>) -> Result<DateTime<Local>> {
    let tomorrow = now
        .date_naive()
        .succ_opt()
        .context("date out of range for next midnight")?;
    local_midnight(tomorrow)
}

use chrono::{Datelike, Days, NaiveDate};

use super::PlanWriteError;

const DEFAULT_SPAN_DAYS: u64 = 90;

/// Fills in a missing plan window: start defaults to the first of the current
/// month, end to 90 days after start.
pub fn resolve_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), PlanWriteError> {
    let start = start.unwrap_or_else(|| today.with_day(1).unwrap_or(today));
    let end = match end {
        Some(end) => end,
        None => start
            .checked_add_days(Days::new(DEFAULT_SPAN_DAYS))
            .ok_or(PlanWriteError::InvalidDateRange { start, end: start })?,
    };
    if end < start {
        return Err(PlanWriteError::InvalidDateRange { start, end });
    }
    Ok((start, end))
}

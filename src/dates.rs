// Date arguments: `YYYY-MM-DD` or one of the keywords `today`, `tomorrow`,
// `yesterday`, plus the calendar shortcuts `--week`, `--month` and
// `--days N`. Everything is computed against an explicit `today` so the
// rules can be tested without a clock.

use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::error::{Error, Result};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolve a date argument to `YYYY-MM-DD`.
pub fn normalize(value: &str, today: NaiveDate) -> Result<String> {
    let date = match value.trim().to_ascii_lowercase().as_str() {
        "today" => today,
        "tomorrow" => today + Duration::days(1),
        "yesterday" => today - Duration::days(1),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_err(|_| {
            Error::InvalidInput(format!(
                "`{value}` is not a date; use YYYY-MM-DD, today, tomorrow or yesterday"
            ))
        })?,
    };
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Calendar range selection as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RangeArgs {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub week: bool,
    pub month: bool,
    pub days: Option<u32>,
}

/// Inclusive `(from, to)` range. `--days` wins over `--week`, which wins
/// over `--month`; explicit dates default to today.
pub fn resolve_range(args: &RangeArgs, today: NaiveDate) -> Result<(String, String)> {
    let fmt = |d: NaiveDate| d.format("%Y-%m-%d").to_string();
    if let Some(days) = args.days.filter(|d| *d > 0) {
        return Ok((fmt(today), fmt(today + Duration::days(i64::from(days)))));
    }
    if args.week {
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        return Ok((fmt(monday), fmt(monday + Duration::days(6))));
    }
    if args.month {
        let first = today.with_day(1).unwrap_or(today);
        let next_month = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
        };
        let last = next_month.map_or(first, |d| d - Duration::days(1));
        return Ok((fmt(first), fmt(last)));
    }
    let from = normalize(args.date_from.as_deref().unwrap_or("today"), today)?;
    let to = normalize(args.date_to.as_deref().unwrap_or("today"), today)?;
    if from > to {
        return Err(Error::InvalidInput(format!(
            "date range ends ({to}) before it starts ({from})"
        )));
    }
    Ok((from, to))
}

//! Calendar-to-ordinate time normalization.
//!
//! Measurements carry calendar dates; interpolation needs a single scalar
//! that orders and spaces them. This module maps `(year, month, day)` to
//! that ordinate under a selectable granularity ([`TimeDomain`]).
//!
//! All three domains share one scale: `year * 366 + day_of_year`. The 366
//! stride keeps ordinates strictly increasing across year boundaries while
//! leaving same-year differences equal to plain day-of-year differences,
//! so within one calendar year the ordinate behaves exactly like the day
//! number. Coarser domains snap to the first day of the month or year.

use serde::{Deserialize, Serialize};

/// Days elapsed before the first of each month in a non-leap year.
const CUMULATIVE_DAYS: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Ordinate stride between consecutive years. Strictly larger than any
/// day-of-year value, so ordering across year boundaries is preserved.
const YEAR_STRIDE: f64 = 366.0;

/// Granularity used to reduce a calendar date to a time ordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeDomain {
    /// Reduce to the year (ordinate of January 1st).
    Year,
    /// Reduce to year and month (ordinate of the month's first day).
    YearMonth,
    /// Full calendar-day resolution.
    #[default]
    YearMonthDay,
}

impl TimeDomain {
    /// Parse a time-domain name from the job configuration.
    ///
    /// Accepts the request-form spellings (`"Year"`, `"Year Month"`,
    /// `"Year Month Day"`) and the historical single-word aliases
    /// (`"YEAR"`, `"MONTH"`, `"DAY"`), case-insensitively. An unknown
    /// name logs a warning and falls back to [`TimeDomain::Year`]; a bad
    /// mode degrades the ordinate resolution but never fails the job.
    pub fn parse(name: &str) -> TimeDomain {
        match name.trim().to_ascii_lowercase().as_str() {
            "year" => TimeDomain::Year,
            "year month" | "month" => TimeDomain::YearMonth,
            "year month day" | "day" => TimeDomain::YearMonthDay,
            other => {
                log::warn!(
                    "Unknown time domain '{}', falling back to Year",
                    other
                );
                TimeDomain::Year
            }
        }
    }

    /// Normalize a calendar date to a scalar ordinate under this domain.
    pub fn normalize(&self, year: i32, month: u32, day: u32) -> f64 {
        let doy = match self {
            TimeDomain::Year => 1,
            TimeDomain::YearMonth => first_day_of_month(year, month),
            TimeDomain::YearMonthDay => day_of_year(year, month, day),
        };
        year as f64 * YEAR_STRIDE + doy as f64
    }
}

/// Gregorian leap-year predicate.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Day of year for a calendar date, 1-based (Jan 1 = 1, Dec 31 = 365/366).
///
/// `month` is clamped into `[1, 12]`; out-of-range input rows never make
/// it past the parser, but the clamp keeps this function total.
pub fn day_of_year(year: i32, month: u32, day: u32) -> u32 {
    let m = month.clamp(1, 12) as usize;
    let mut doy = CUMULATIVE_DAYS[m - 1] + day;
    if month > 2 && is_leap_year(year) {
        doy += 1;
    }
    doy
}

/// Day-of-year of the first day of `month`.
fn first_day_of_month(year: i32, month: u32) -> u32 {
    day_of_year(year, month, 1)
}

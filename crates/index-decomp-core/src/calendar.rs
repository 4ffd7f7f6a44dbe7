//! Date normalisation shared by every lookup and aggregation path.
//!
//! The fiscal-year rollback rule lives here and nowhere else.

use chrono::{Datelike, NaiveDate};

use crate::error::DecompError;
use crate::types::Year;
use crate::DecompResult;

/// Statement periods ending in months 1..=5 belong to the prior fiscal year.
pub const FISCAL_ROLLBACK_LAST_MONTH: u32 = 5;

/// Sentinel year for open-ended membership intervals and identifier links.
pub const OPEN_ENDED_YEAR: Year = 2099;

/// Far-future sentinel date (2099-12-31) used for open-ended intervals.
pub fn open_ended() -> NaiveDate {
    NaiveDate::from_ymd_opt(OPEN_ENDED_YEAR, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Fiscal year a statement dated `report_date` is assigned to.
pub fn fiscal_year_of(report_date: NaiveDate) -> Year {
    if report_date.month() <= FISCAL_ROLLBACK_LAST_MONTH {
        report_date.year() - 1
    } else {
        report_date.year()
    }
}

/// Fixed in-year anchor used to resolve identifiers for an analysis year.
pub fn anchor_date(year: Year, month: u32, day: u32) -> DecompResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        DecompError::DateError(format!(
            "invalid anchor date {year}-{month:02}-{day:02}"
        ))
    })
}

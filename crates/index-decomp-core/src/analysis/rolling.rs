//! Annualised N-year decompositions over the index series and their
//! dispersion across window lengths.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::IndexYearRecord;
use crate::analysis::stats::{annualize, describe, mean_defined, DescriptiveStats, Variance};
use crate::config::PeExpansionMethod;
use crate::error::DecompError;
use crate::types::{Rate, Year};
use crate::DecompResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingWindowRecord {
    pub window: u32,
    pub start_year: Year,
    pub end_year: Year,
    pub price_return: Rate,
    /// `None` unless earnings are positive at both endpoints
    pub earnings_growth: Option<Rate>,
    pub pe_expansion: Option<Rate>,
    /// Mean single-year yield over `start_year + 1 ..= end_year`
    pub dividend_yield: Option<Rate>,
    pub total_return: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSummary {
    pub window: u32,
    /// Dispersion of annualised total return (population σ)
    pub total_return: Option<DescriptiveStats>,
    pub mean_price_return: Option<Rate>,
    pub mean_earnings_growth: Option<Rate>,
    pub mean_pe_expansion: Option<Rate>,
    pub mean_dividend_yield: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingAnalysis {
    /// Sorted by window then end year
    pub records: Vec<RollingWindowRecord>,
    pub summaries: Vec<WindowSummary>,
}

/// First-to-last decomposition of the whole index series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullPeriodDecomposition {
    pub start_year: Year,
    pub end_year: Year,
    pub years: u32,
    pub price_return: Rate,
    pub earnings_growth: Option<Rate>,
    pub pe_expansion: Option<Rate>,
    pub dividend_yield: Option<Rate>,
    pub total_return: Rate,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

fn window_decomposition(
    by_year: &BTreeMap<Year, &IndexYearRecord>,
    start: &IndexYearRecord,
    end: &IndexYearRecord,
    method: PeExpansionMethod,
) -> Option<FullPeriodDecomposition> {
    let years = u32::try_from(end.year - start.year).ok()?;
    let price_return = annualize(end.market_cap, start.market_cap, years)?;
    let earnings_growth = annualize(end.earnings, start.earnings, years);
    let pe_expansion = earnings_growth.and_then(|eg| method.expansion(price_return, eg));
    let dividend_yield = mean_defined(
        by_year
            .range(start.year + 1..=end.year)
            .map(|(_, r)| r.dividend_yield),
    );
    Some(FullPeriodDecomposition {
        start_year: start.year,
        end_year: end.year,
        years,
        price_return,
        earnings_growth,
        pe_expansion,
        dividend_yield,
        total_return: price_return + dividend_yield.unwrap_or(Decimal::ZERO),
    })
}

fn summarize(window: u32, records: &[RollingWindowRecord]) -> WindowSummary {
    let totals: Vec<Decimal> = records.iter().map(|r| r.total_return).collect();
    WindowSummary {
        window,
        total_return: describe(&totals, Variance::Population),
        mean_price_return: mean_defined(records.iter().map(|r| Some(r.price_return))),
        mean_earnings_growth: mean_defined(records.iter().map(|r| r.earnings_growth)),
        mean_pe_expansion: mean_defined(records.iter().map(|r| r.pe_expansion)),
        mean_dividend_yield: mean_defined(records.iter().map(|r| r.dividend_yield)),
    }
}

/// Slide every window length across every end year that has a full
/// lookback in `index`.
pub fn analyze_rolling(
    index: &[IndexYearRecord],
    windows: &[u32],
    method: PeExpansionMethod,
) -> DecompResult<RollingAnalysis> {
    if windows.iter().any(|w| *w == 0) {
        return Err(DecompError::InvalidInput {
            field: "rolling_windows".into(),
            reason: "Window lengths must be at least one year".into(),
        });
    }
    let by_year: BTreeMap<Year, &IndexYearRecord> = index.iter().map(|r| (r.year, r)).collect();

    let mut records = Vec::new();
    let mut summaries = Vec::with_capacity(windows.len());

    for &window in windows {
        let mut window_records = Vec::new();
        for (&end_year, end) in &by_year {
            let start_year = Year::try_from(window)
                .ok()
                .and_then(|w| end_year.checked_sub(w));
            let Some(start) = start_year.and_then(|y| by_year.get(&y)) else {
                continue;
            };
            match window_decomposition(&by_year, start, end, method) {
                Some(d) => window_records.push(RollingWindowRecord {
                    window,
                    start_year: d.start_year,
                    end_year: d.end_year,
                    price_return: d.price_return,
                    earnings_growth: d.earnings_growth,
                    pe_expansion: d.pe_expansion,
                    dividend_yield: d.dividend_yield,
                    total_return: d.total_return,
                }),
                None => tracing::debug!(window, end_year, "non-positive market cap, window skipped"),
            }
        }
        summaries.push(summarize(window, &window_records));
        records.extend(window_records);
    }

    tracing::info!(windows = windows.len(), records = records.len(), "rolling windows analysed");
    Ok(RollingAnalysis { records, summaries })
}

/// Decomposition from the first to the last year of `index`.
pub fn full_period(
    index: &[IndexYearRecord],
    method: PeExpansionMethod,
) -> Option<FullPeriodDecomposition> {
    let by_year: BTreeMap<Year, &IndexYearRecord> = index.iter().map(|r| (r.year, r)).collect();
    let (_, first) = by_year.first_key_value()?;
    let (_, last) = by_year.last_key_value()?;
    if first.year == last.year {
        return None;
    }
    window_decomposition(&by_year, first, last, method)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

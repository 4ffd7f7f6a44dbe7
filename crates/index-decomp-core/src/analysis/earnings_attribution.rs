//! Which sectors drove the change in index earnings over multi-year periods.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::SectorYearRecord;
use crate::types::{Money, Rate, Sector, Year};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorEarningsShare {
    pub sector: Sector,
    pub start_earnings: Money,
    pub end_earnings: Money,
    pub change: Money,
    /// `Δsector / Δindex`; `None` when either index total is not positive or
    /// the index total did not change
    pub share: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsAttributionPeriod {
    pub start_year: Year,
    pub end_year: Year,
    pub start_total: Money,
    pub end_total: Money,
    pub sectors: Vec<SectorEarningsShare>,
}

/// Consecutive periods of `step` years from the first year, the last one cut
/// at `last`, followed by the whole span when there is more than one.
fn attribution_periods(first: Year, last: Year, step: Year) -> Vec<(Year, Year)> {
    let mut periods = Vec::new();
    let mut start = first;
    while start < last {
        let end = start.saturating_add(step).min(last);
        periods.push((start, end));
        start = end;
    }
    if periods.len() > 1 {
        periods.push((first, last));
    }
    periods
}

/// Each sector's share of the change in summed index earnings per period.
/// A sector absent in one endpoint year counts as zero earnings there. The
/// unclassified bucket is included so defined shares sum to one.
pub fn sector_earnings_attribution(
    sectors: &[SectorYearRecord],
    period_years: u32,
) -> Vec<EarningsAttributionPeriod> {
    let Some(step) = Year::try_from(period_years).ok().filter(|s| *s > 0) else {
        return Vec::new();
    };
    let mut by_year: BTreeMap<Year, BTreeMap<Sector, Money>> = BTreeMap::new();
    for s in sectors {
        *by_year
            .entry(s.year)
            .or_default()
            .entry(s.sector)
            .or_insert(Decimal::ZERO) += s.earnings;
    }
    let (Some(&first), Some(&last)) = (by_year.keys().next(), by_year.keys().next_back()) else {
        return Vec::new();
    };

    let empty = BTreeMap::new();
    attribution_periods(first, last, step)
        .into_iter()
        .map(|(start_year, end_year)| {
            let start = by_year.get(&start_year).unwrap_or(&empty);
            let end = by_year.get(&end_year).unwrap_or(&empty);
            let start_total: Money = start.values().copied().sum();
            let end_total: Money = end.values().copied().sum();
            let delta_total = end_total - start_total;
            let defined = start_total > Decimal::ZERO
                && end_total > Decimal::ZERO
                && !delta_total.is_zero();

            let mut names: Vec<Sector> = start.keys().chain(end.keys()).copied().collect();
            names.sort();
            names.dedup();
            let shares = names
                .into_iter()
                .map(|sector| {
                    let start_earnings = start.get(&sector).copied().unwrap_or_default();
                    let end_earnings = end.get(&sector).copied().unwrap_or_default();
                    let change = end_earnings - start_earnings;
                    SectorEarningsShare {
                        sector,
                        start_earnings,
                        end_earnings,
                        change,
                        share: defined.then(|| change / delta_total),
                    }
                })
                .collect();

            EarningsAttributionPeriod {
                start_year,
                end_year,
                start_total,
                end_total,
                sectors: shares,
            }
        })
        .collect()
}

//! Additive-consistency checks between the three aggregation levels.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::aggregation::{CompanyYearRecord, IndexYearRecord, SectorYearRecord};
use crate::config::EngineConfig;
use crate::types::{Money, Rate, Year};

const BPS: Decimal = dec!(10000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyCheck {
    /// Σ company earnings vs index earnings
    Earnings,
    /// Σ company market cap vs index market cap
    MarketCap,
    /// Σ sector price contributions vs index price return (bps)
    PriceContribution,
}

impl fmt::Display for ConsistencyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsistencyCheck::Earnings => "earnings sum",
            ConsistencyCheck::MarketCap => "market cap sum",
            ConsistencyCheck::PriceContribution => "price contribution sum",
        };
        f.write_str(s)
    }
}

/// A level-to-level mismatch beyond tolerance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyAnomaly {
    pub year: Year,
    pub check: ConsistencyCheck,
    pub difference: Decimal,
    pub tolerance: Decimal,
}

impl fmt::Display for ConsistencyAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} differs by {} (tolerance {})",
            self.year, self.check, self.difference, self.tolerance
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRow {
    pub year: Year,
    pub company_earnings: Money,
    pub index_earnings: Money,
    pub earnings_diff: Money,
    pub company_market_cap: Money,
    pub index_market_cap: Money,
    pub market_cap_diff: Money,
    /// Σ sector price contributions; `None` when the index return is undefined
    pub contribution_sum: Option<Rate>,
    pub index_price_return: Option<Rate>,
    /// `(index price return − contribution sum) × 10,000`
    pub return_diff_bps: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub rows: Vec<VerificationRow>,
    pub max_earnings_diff: Money,
    pub max_market_cap_diff: Money,
    pub max_return_diff_bps: Decimal,
    pub sums_pass: bool,
    pub contributions_pass: bool,
    /// Both checks passed
    pub passed: bool,
    pub anomalies: Vec<ConsistencyAnomaly>,
}

#[derive(Default)]
struct CompanySums {
    earnings: Money,
    market_cap: Money,
}

/// Compare company-level sums and sector contributions against the index
/// series. Mismatches are reported, never raised.
pub fn verify(
    companies: &[CompanyYearRecord],
    sectors: &[SectorYearRecord],
    index: &[IndexYearRecord],
    config: &EngineConfig,
) -> VerificationReport {
    let mut sums: BTreeMap<Year, CompanySums> = BTreeMap::new();
    for c in companies {
        let s = sums.entry(c.year).or_default();
        s.earnings += c.earnings.unwrap_or(Decimal::ZERO);
        s.market_cap += c.market_cap.unwrap_or(Decimal::ZERO);
    }

    let mut contributions: BTreeMap<Year, Rate> = BTreeMap::new();
    for s in sectors {
        let price = s.contribution.and_then(|c| c.price);
        let entry = contributions.entry(s.year).or_insert(Decimal::ZERO);
        if let Some(p) = price {
            *entry += p;
        }
    }

    let mut rows = Vec::with_capacity(index.len());
    let mut anomalies = Vec::new();
    let mut max_earnings_diff = Decimal::ZERO;
    let mut max_market_cap_diff = Decimal::ZERO;
    let mut max_return_diff_bps = Decimal::ZERO;

    for idx in index {
        let company = sums.get(&idx.year);
        let company_earnings = company.map_or(Decimal::ZERO, |s| s.earnings);
        let company_market_cap = company.map_or(Decimal::ZERO, |s| s.market_cap);
        let earnings_diff = (company_earnings - idx.earnings).abs();
        let market_cap_diff = (company_market_cap - idx.market_cap).abs();

        let contribution_sum = idx
            .price_return
            .map(|_| contributions.get(&idx.year).copied().unwrap_or(Decimal::ZERO));
        let return_diff_bps = match (idx.price_return, contribution_sum) {
            (Some(pr), Some(sum)) => Some((pr - sum) * BPS),
            _ => None,
        };

        max_earnings_diff = max_earnings_diff.max(earnings_diff);
        max_market_cap_diff = max_market_cap_diff.max(market_cap_diff);

        if earnings_diff > config.sum_tolerance {
            anomalies.push(ConsistencyAnomaly {
                year: idx.year,
                check: ConsistencyCheck::Earnings,
                difference: earnings_diff,
                tolerance: config.sum_tolerance,
            });
        }
        if market_cap_diff > config.sum_tolerance {
            anomalies.push(ConsistencyAnomaly {
                year: idx.year,
                check: ConsistencyCheck::MarketCap,
                difference: market_cap_diff,
                tolerance: config.sum_tolerance,
            });
        }
        if let Some(bps) = return_diff_bps {
            max_return_diff_bps = max_return_diff_bps.max(bps.abs());
            if bps.abs() > config.return_tolerance_bps {
                anomalies.push(ConsistencyAnomaly {
                    year: idx.year,
                    check: ConsistencyCheck::PriceContribution,
                    difference: bps,
                    tolerance: config.return_tolerance_bps,
                });
            }
        }

        rows.push(VerificationRow {
            year: idx.year,
            company_earnings,
            index_earnings: idx.earnings,
            earnings_diff,
            company_market_cap,
            index_market_cap: idx.market_cap,
            market_cap_diff,
            contribution_sum,
            index_price_return: idx.price_return,
            return_diff_bps,
        });
    }

    for a in &anomalies {
        tracing::warn!(
            year = a.year,
            check = %a.check,
            difference = %a.difference,
            "consistency anomaly"
        );
    }

    let sums_pass = max_earnings_diff <= config.sum_tolerance
        && max_market_cap_diff <= config.sum_tolerance;
    let contributions_pass = max_return_diff_bps <= config.return_tolerance_bps;
    tracing::info!(years = rows.len(), sums_pass, contributions_pass, "verification complete");

    VerificationReport {
        rows,
        max_earnings_diff,
        max_market_cap_diff,
        max_return_diff_bps,
        sums_pass,
        contributions_pass,
        passed: sums_pass && contributions_pass,
        anomalies,
    }
}

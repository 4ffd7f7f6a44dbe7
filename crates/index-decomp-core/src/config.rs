use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DecompError;
use crate::types::{Money, Multiple, Rate, Year};
use crate::DecompResult;

/// How the valuation-multiple component is separated from earnings growth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeExpansionMethod {
    /// `price_return - earnings_growth`; components add up exactly.
    #[default]
    Additive,
    /// `(1 + price_return) / (1 + earnings_growth) - 1`; components compound.
    Multiplicative,
}

impl PeExpansionMethod {
    /// PE expansion implied by a price return and an earnings growth rate.
    /// Multiplicative form is undefined when earnings growth is -100%.
    pub fn expansion(&self, price_return: Rate, earnings_growth: Rate) -> Option<Rate> {
        match self {
            PeExpansionMethod::Additive => Some(price_return - earnings_growth),
            PeExpansionMethod::Multiplicative => {
                let denom = Decimal::ONE + earnings_growth;
                if denom.is_zero() {
                    None
                } else {
                    Some((Decimal::ONE + price_return) / denom - Decimal::ONE)
                }
            }
        }
    }
}

/// Run-wide settings. Every field has a default so partial config files work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// First analysis year; derived from the fundamentals when absent
    pub start_year: Option<Year>,
    /// Last analysis year; derived from the fundamentals when absent
    pub end_year: Option<Year>,
    /// Month of the identifier-resolution anchor date
    pub anchor_month: u32,
    /// Day of the identifier-resolution anchor date
    pub anchor_day: u32,
    /// Rolling window lengths in years
    pub rolling_windows: Vec<u32>,
    pub pe_expansion: PeExpansionMethod,
    /// Max |Σ entity - index| for earnings / market cap sums
    pub sum_tolerance: Money,
    /// Max |Σ contributions - index price return| in basis points
    pub return_tolerance_bps: Decimal,
    /// Engine year Y is compared against reference period Y + offset
    pub reference_offset_years: i32,
    /// Sector PE observations at or above this cap are treated as outliers
    pub pe_outlier_cap: Multiple,
    /// Minimum sector PE history for reversion statistics
    pub min_pe_history: usize,
    /// Entities listed per year in the contributor tables
    pub top_contributors: usize,
    /// Length of the consecutive periods used for sector earnings-change shares
    pub attribution_period_years: u32,
    /// Minimum common years for a sector-pair PE change correlation
    pub min_correlation_overlap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            start_year: None,
            end_year: None,
            anchor_month: 6,
            anchor_day: 30,
            rolling_windows: vec![5, 10, 20],
            pe_expansion: PeExpansionMethod::Additive,
            sum_tolerance: dec!(1),
            return_tolerance_bps: dec!(1),
            reference_offset_years: 1,
            pe_outlier_cap: dec!(100),
            min_pe_history: 10,
            top_contributors: 10,
            attribution_period_years: 10,
            min_correlation_overlap: 15,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> DecompResult<()> {
        if let (Some(start), Some(end)) = (self.start_year, self.end_year) {
            if start > end {
                return Err(DecompError::InvalidInput {
                    field: "start_year".into(),
                    reason: format!("start_year {start} is after end_year {end}"),
                });
            }
        }
        if self.rolling_windows.iter().any(|w| *w == 0) {
            return Err(DecompError::InvalidInput {
                field: "rolling_windows".into(),
                reason: "Window lengths must be at least one year".into(),
            });
        }
        if self.sum_tolerance < Decimal::ZERO || self.return_tolerance_bps < Decimal::ZERO {
            return Err(DecompError::InvalidInput {
                field: "tolerance".into(),
                reason: "Tolerances cannot be negative".into(),
            });
        }
        if self.pe_outlier_cap <= Decimal::ZERO {
            return Err(DecompError::InvalidInput {
                field: "pe_outlier_cap".into(),
                reason: "PE outlier cap must be positive".into(),
            });
        }
        if self.attribution_period_years == 0 {
            return Err(DecompError::InvalidInput {
                field: "attribution_period_years".into(),
                reason: "Attribution periods must be at least one year".into(),
            });
        }
        if self.min_correlation_overlap < 2 {
            return Err(DecompError::InvalidInput {
                field: "min_correlation_overlap".into(),
                reason: "Correlation needs at least two common years".into(),
            });
        }
        // non-leap year: the anchor must exist in every analysis year
        crate::calendar::anchor_date(2001, self.anchor_month, self.anchor_day)?;
        Ok(())
    }
}

//! Level 2: (year, sector) buckets summed from company-year records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::{growth, market_return, ratio, CompanyYearRecord, SectorContribution};
use crate::config::PeExpansionMethod;
use crate::types::{Money, Multiple, Rate, Sector, Year};

/// Number of entities that supplied a non-null value to each additive sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidCounts {
    pub earnings: usize,
    pub prior_earnings: usize,
    pub market_cap: usize,
    pub prior_market_cap: usize,
    pub dividends: usize,
}

impl ValidCounts {
    pub(crate) fn absorb(&mut self, other: &ValidCounts) {
        self.earnings += other.earnings;
        self.prior_earnings += other.prior_earnings;
        self.market_cap += other.market_cap;
        self.prior_market_cap += other.prior_market_cap;
        self.dividends += other.dividends;
    }
}

/// Running sums shared by the sector and index levels. Missing values add
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Totals {
    pub earnings: Money,
    pub prior_earnings: Money,
    pub market_cap: Money,
    pub prior_market_cap: Money,
    pub dividends: Money,
    pub counts: ValidCounts,
    pub entities: usize,
}

fn add_opt(sum: &mut Money, count: &mut usize, value: Option<Money>) {
    if let Some(v) = value {
        *sum += v;
        *count += 1;
    }
}

impl Totals {
    fn push(&mut self, r: &CompanyYearRecord) {
        add_opt(&mut self.earnings, &mut self.counts.earnings, r.earnings);
        add_opt(
            &mut self.prior_earnings,
            &mut self.counts.prior_earnings,
            r.prior_earnings,
        );
        add_opt(&mut self.market_cap, &mut self.counts.market_cap, r.market_cap);
        add_opt(
            &mut self.prior_market_cap,
            &mut self.counts.prior_market_cap,
            r.prior_market_cap,
        );
        add_opt(&mut self.dividends, &mut self.counts.dividends, r.dividends);
        self.entities += 1;
    }

    pub(crate) fn merge(&mut self, other: &Totals) {
        self.earnings += other.earnings;
        self.prior_earnings += other.prior_earnings;
        self.market_cap += other.market_cap;
        self.prior_market_cap += other.prior_market_cap;
        self.dividends += other.dividends;
        self.counts.absorb(&other.counts);
        self.entities += other.entities;
    }

    pub(crate) fn decompose(&self, method: PeExpansionMethod) -> Decomposition {
        let price_return = market_return(self.market_cap, self.prior_market_cap);
        let earnings_growth = growth(self.earnings, self.prior_earnings);
        let pe_expansion = match (price_return, earnings_growth) {
            (Some(pr), Some(eg)) => method.expansion(pr, eg),
            _ => None,
        };
        Decomposition {
            price_return,
            earnings_growth,
            pe_expansion,
            dividend_yield: ratio(self.dividends, self.prior_market_cap),
            pe: ratio(self.market_cap, self.earnings),
            pe_prior: ratio(self.prior_market_cap, self.prior_earnings),
        }
    }
}

/// Derived ratios for one bucket. Every field is `None` when its
/// denominator is not positive.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Decomposition {
    pub price_return: Option<Rate>,
    pub earnings_growth: Option<Rate>,
    pub pe_expansion: Option<Rate>,
    pub dividend_yield: Option<Rate>,
    pub pe: Option<Multiple>,
    pub pe_prior: Option<Multiple>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorYearRecord {
    pub year: Year,
    pub sector: Sector,
    pub company_count: usize,
    pub earnings: Money,
    pub prior_earnings: Money,
    pub market_cap: Money,
    pub prior_market_cap: Money,
    pub dividends: Money,
    pub valid_counts: ValidCounts,
    pub price_return: Option<Rate>,
    pub earnings_growth: Option<Rate>,
    pub pe_expansion: Option<Rate>,
    pub dividend_yield: Option<Rate>,
    pub pe: Option<Multiple>,
    pub pe_prior: Option<Multiple>,
    /// Share of the year's total prior market cap, unclassified bucket included
    pub weight: Option<Rate>,
    /// Filled by [`crate::aggregation::apply_contributions`]
    pub contribution: Option<SectorContribution>,
}

impl SectorYearRecord {
    pub(crate) fn totals(&self) -> Totals {
        Totals {
            earnings: self.earnings,
            prior_earnings: self.prior_earnings,
            market_cap: self.market_cap,
            prior_market_cap: self.prior_market_cap,
            dividends: self.dividends,
            counts: self.valid_counts,
            entities: self.company_count,
        }
    }
}

/// Sum company-year records into (year, sector) buckets, sorted by year then
/// sector, and derive each bucket's decomposition and weight.
pub fn aggregate_sectors(
    records: &[CompanyYearRecord],
    method: PeExpansionMethod,
) -> Vec<SectorYearRecord> {
    let mut buckets: BTreeMap<(Year, Sector), Totals> = BTreeMap::new();
    for r in records {
        buckets.entry((r.year, r.sector)).or_default().push(r);
    }

    let mut year_prior_mc: BTreeMap<Year, Money> = BTreeMap::new();
    for ((year, _), t) in &buckets {
        *year_prior_mc.entry(*year).or_insert(Decimal::ZERO) += t.prior_market_cap;
    }

    let out: Vec<SectorYearRecord> = buckets
        .into_iter()
        .map(|((year, sector), t)| {
            let d = t.decompose(method);
            let total_prior = year_prior_mc.get(&year).copied().unwrap_or_default();
            SectorYearRecord {
                year,
                sector,
                company_count: t.entities,
                earnings: t.earnings,
                prior_earnings: t.prior_earnings,
                market_cap: t.market_cap,
                prior_market_cap: t.prior_market_cap,
                dividends: t.dividends,
                valid_counts: t.counts,
                price_return: d.price_return,
                earnings_growth: d.earnings_growth,
                pe_expansion: d.pe_expansion,
                dividend_yield: d.dividend_yield,
                pe: d.pe,
                pe_prior: d.pe_prior,
                weight: ratio(t.prior_market_cap, total_prior),
                contribution: None,
            }
        })
        .collect();

    tracing::info!(buckets = out.len(), "sector-year records aggregated");
    out
}

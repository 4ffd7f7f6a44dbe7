//! Comparison of the bottom-up index series against an independently dated
//! reference series.
//!
//! The two series date their returns differently: reference period `P`
//! measures roughly the same calendar span as engine year `P - offset`.
//! Every pairing goes through [`compare_pair`], which rejects any pair whose
//! periods disagree with the declared offset.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::{growth, ratio, IndexYearRecord};
use crate::analysis::stats::{describe, mean_defined, DescriptiveStats, Variance};
use crate::config::PeExpansionMethod;
use crate::error::DecompError;
use crate::types::{Multiple, Rate, Year};
use crate::DecompResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One observation of the reference series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub period: Year,
    pub index_price: Decimal,
    pub trailing_pe: Option<Multiple>,
    /// Decimal fraction (0.02 = 2%)
    pub trailing_dividend_yield: Option<Rate>,
}

/// Annual decomposition of the reference series, labelled with the later of
/// the two periods it spans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDecomposition {
    pub period: Year,
    pub price_return: Rate,
    pub eps_growth: Option<Rate>,
    pub pe_expansion: Option<Rate>,
    /// Start-of-period yield
    pub dividend_yield: Option<Rate>,
    pub total_return: Rate,
    pub pe: Option<Multiple>,
}

/// Number of periods the reference series runs ahead of engine years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOffset(pub i32);

impl ReferenceOffset {
    pub fn reference_period(&self, engine_year: Year) -> Year {
        engine_year + self.0
    }
}

/// Signed differences `reference − engine` for one aligned pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationRow {
    pub engine_year: Year,
    pub reference_period: Year,
    pub engine_price_return: Option<Rate>,
    pub reference_price_return: Rate,
    pub price_return_diff: Option<Rate>,
    pub earnings_growth_diff: Option<Rate>,
    pub pe_expansion_diff: Option<Rate>,
    pub pe_diff: Option<Multiple>,
    pub dividend_yield_diff: Option<Rate>,
    pub total_return_diff: Option<Rate>,
}

/// Difference statistics per component (sample σ).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DifferenceSummary {
    pub price_return: Option<DescriptiveStats>,
    pub earnings_growth: Option<DescriptiveStats>,
    pub pe_expansion: Option<DescriptiveStats>,
    pub pe: Option<DescriptiveStats>,
    pub dividend_yield: Option<DescriptiveStats>,
    pub total_return: Option<DescriptiveStats>,
}

/// Averages over the aligned overlap for each series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LongRunComparison {
    pub engine_price_return: Option<Rate>,
    pub reference_price_return: Option<Rate>,
    pub engine_dividend_yield: Option<Rate>,
    pub reference_dividend_yield: Option<Rate>,
    pub engine_total_return: Option<Rate>,
    pub reference_total_return: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub offset: ReferenceOffset,
    pub reference: Vec<ReferenceDecomposition>,
    pub rows: Vec<CrossValidationRow>,
    pub summary: DifferenceSummary,
    pub long_run: LongRunComparison,
}

// ---------------------------------------------------------------------------
// Reference decomposition
// ---------------------------------------------------------------------------

/// Decompose consecutive reference periods. EPS is implied as
/// `price / trailing_pe`. Duplicate periods are rejected.
pub fn reference_decomposition(
    points: &[ReferencePoint],
    method: PeExpansionMethod,
) -> DecompResult<Vec<ReferenceDecomposition>> {
    let mut by_period: BTreeMap<Year, &ReferencePoint> = BTreeMap::new();
    for p in points {
        if by_period.insert(p.period, p).is_some() {
            return Err(DecompError::InvalidInput {
                field: "reference".into(),
                reason: format!("Duplicate reference period {}", p.period),
            });
        }
    }

    let implied_eps = |p: &ReferencePoint| ratio(p.index_price, p.trailing_pe?);

    let mut out = Vec::new();
    let ordered: Vec<&ReferencePoint> = by_period.values().copied().collect();
    for pair in ordered.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        if p1.period - p0.period != 1 {
            continue;
        }
        let Some(price_ratio) = ratio(p1.index_price, p0.index_price) else {
            tracing::debug!(period = p1.period, "non-positive reference price, period skipped");
            continue;
        };
        let price_return = price_ratio - Decimal::ONE;
        let eps_growth = match (implied_eps(p1), implied_eps(p0)) {
            (Some(e1), Some(e0)) => growth(e1, e0),
            _ => None,
        };
        let pe_expansion = eps_growth.and_then(|eg| method.expansion(price_return, eg));
        let dividend_yield = p0.trailing_dividend_yield;
        out.push(ReferenceDecomposition {
            period: p1.period,
            price_return,
            eps_growth,
            pe_expansion,
            dividend_yield,
            total_return: price_return + dividend_yield.unwrap_or(Decimal::ZERO),
            pe: p1.trailing_pe,
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Alignment and comparison
// ---------------------------------------------------------------------------

fn diff(reference: Option<Decimal>, engine: Option<Decimal>) -> Option<Decimal> {
    Some(reference? - engine?)
}

/// Differences for one pair. Fails with `AlignmentMismatch` when the
/// reference period is not `engine.year + offset`.
pub fn compare_pair(
    engine: &IndexYearRecord,
    reference: &ReferenceDecomposition,
    offset: ReferenceOffset,
) -> DecompResult<CrossValidationRow> {
    if reference.period != offset.reference_period(engine.year) {
        return Err(DecompError::AlignmentMismatch {
            engine_year: engine.year,
            reference_period: reference.period,
            offset: offset.0,
        });
    }
    Ok(CrossValidationRow {
        engine_year: engine.year,
        reference_period: reference.period,
        engine_price_return: engine.price_return,
        reference_price_return: reference.price_return,
        price_return_diff: diff(Some(reference.price_return), engine.price_return),
        earnings_growth_diff: diff(reference.eps_growth, engine.earnings_growth),
        pe_expansion_diff: diff(reference.pe_expansion, engine.pe_expansion),
        pe_diff: diff(reference.pe, engine.pe),
        dividend_yield_diff: diff(reference.dividend_yield, engine.dividend_yield),
        total_return_diff: diff(Some(reference.total_return), engine.total_return),
    })
}

fn stats_of<F>(rows: &[CrossValidationRow], field: F) -> Option<DescriptiveStats>
where
    F: Fn(&CrossValidationRow) -> Option<Decimal>,
{
    let values: Vec<Decimal> = rows.iter().filter_map(field).collect();
    describe(&values, Variance::Sample)
}

/// Decompose `reference`, pair each engine year with the reference period
/// `offset` years later, and summarise the differences.
pub fn cross_validate(
    index: &[IndexYearRecord],
    reference: &[ReferencePoint],
    offset: ReferenceOffset,
    method: PeExpansionMethod,
) -> DecompResult<CrossValidationReport> {
    let decomposed = reference_decomposition(reference, method)?;
    let by_period: BTreeMap<Year, &ReferenceDecomposition> =
        decomposed.iter().map(|d| (d.period, d)).collect();

    let mut rows = Vec::new();
    let mut engine_paired = Vec::new();
    let mut reference_paired = Vec::new();
    for engine in index {
        let Some(r) = by_period.get(&offset.reference_period(engine.year)) else {
            continue;
        };
        rows.push(compare_pair(engine, r, offset)?);
        engine_paired.push(engine);
        reference_paired.push(*r);
    }

    if rows.is_empty() {
        tracing::warn!(offset = offset.0, "no overlapping periods with the reference series");
    }

    let summary = DifferenceSummary {
        price_return: stats_of(&rows, |r| r.price_return_diff),
        earnings_growth: stats_of(&rows, |r| r.earnings_growth_diff),
        pe_expansion: stats_of(&rows, |r| r.pe_expansion_diff),
        pe: stats_of(&rows, |r| r.pe_diff),
        dividend_yield: stats_of(&rows, |r| r.dividend_yield_diff),
        total_return: stats_of(&rows, |r| r.total_return_diff),
    };
    let long_run = LongRunComparison {
        engine_price_return: mean_defined(engine_paired.iter().map(|e| e.price_return)),
        reference_price_return: mean_defined(
            reference_paired.iter().map(|r| Some(r.price_return)),
        ),
        engine_dividend_yield: mean_defined(engine_paired.iter().map(|e| e.dividend_yield)),
        reference_dividend_yield: mean_defined(reference_paired.iter().map(|r| r.dividend_yield)),
        engine_total_return: mean_defined(engine_paired.iter().map(|e| e.total_return)),
        reference_total_return: mean_defined(
            reference_paired.iter().map(|r| Some(r.total_return)),
        ),
    };

    tracing::info!(pairs = rows.len(), offset = offset.0, "cross-validation complete");
    Ok(CrossValidationReport {
        offset,
        reference: decomposed,
        rows,
        summary,
        long_run,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

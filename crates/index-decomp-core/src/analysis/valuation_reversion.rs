//! Per-sector PE history, how often above-average valuations fell back,
//! how sector PE moves co-vary, and what full reversion would do to the
//! index multiple.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::{ratio, SectorYearRecord};
use crate::analysis::stats::{describe, mean, std_dev, Variance};
use crate::config::EngineConfig;
use crate::types::{Multiple, Rate, Sector, Year};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PePoint {
    pub year: Year,
    pub pe: Multiple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorValuationStats {
    pub sector: Sector,
    pub history: Vec<PePoint>,
    pub mean_pe: Multiple,
    /// Population σ
    pub std_dev: Multiple,
    pub min_pe: Multiple,
    pub max_pe: Multiple,
    pub current_year: Year,
    pub current_pe: Multiple,
    /// `(current − mean) / σ`; `None` for a flat history
    pub deviation_sigma: Option<Decimal>,
    /// Share of above-mean observations followed by a lower PE
    pub reversion_rate: Option<Rate>,
}

/// Sector PE series: market cap over earnings where both are positive and
/// the multiple is below `config.pe_outlier_cap`. Sectors with fewer than
/// `config.min_pe_history` points are left out. The unclassified bucket is
/// not a sector and is skipped.
pub fn sector_valuation_reversion(
    sectors: &[SectorYearRecord],
    config: &EngineConfig,
) -> Vec<SectorValuationStats> {
    let mut histories: BTreeMap<Sector, Vec<PePoint>> = BTreeMap::new();
    for s in sectors {
        if s.sector == Sector::Unclassified {
            continue;
        }
        if s.market_cap <= Decimal::ZERO || s.earnings <= Decimal::ZERO {
            continue;
        }
        let pe = s.market_cap / s.earnings;
        if pe < config.pe_outlier_cap {
            histories
                .entry(s.sector)
                .or_default()
                .push(PePoint { year: s.year, pe });
        }
    }

    let mut out = Vec::new();
    for (sector, mut history) in histories {
        if history.len() < config.min_pe_history {
            tracing::debug!(%sector, points = history.len(), "PE history too short");
            continue;
        }
        history.sort_by_key(|p| p.year);
        let pes: Vec<Multiple> = history.iter().map(|p| p.pe).collect();
        let Some(stats) = describe(&pes, Variance::Population) else {
            continue;
        };
        let Some(current) = history.last().copied() else {
            continue;
        };

        let mut above = 0u32;
        let mut reverted = 0u32;
        for pair in history.windows(2) {
            if pair[0].pe > stats.mean {
                above += 1;
                if pair[1].pe < pair[0].pe {
                    reverted += 1;
                }
            }
        }

        out.push(SectorValuationStats {
            sector,
            mean_pe: stats.mean,
            std_dev: stats.std_dev,
            min_pe: stats.min,
            max_pe: stats.max,
            current_year: current.year,
            current_pe: current.pe,
            deviation_sigma: if stats.std_dev.is_zero() {
                None
            } else {
                Some((current.pe - stats.mean) / stats.std_dev)
            },
            reversion_rate: if above == 0 {
                None
            } else {
                Some(Decimal::from(reverted) / Decimal::from(above))
            },
            history,
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Cross-sector PE co-movement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeCorrelation {
    pub sector_a: Sector,
    pub sector_b: Sector,
    /// Years with a PE change in both sectors
    pub overlap: usize,
    pub correlation: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeCorrelationSummary {
    /// Sorted from least to most correlated
    pub pairs: Vec<PeCorrelation>,
    pub mean_correlation: Option<Decimal>,
}

/// Year-over-year PE change keyed by the later year; gaps in the history
/// produce no change.
fn pe_changes(history: &[PePoint]) -> BTreeMap<Year, Rate> {
    history
        .windows(2)
        .filter(|w| w[1].year == w[0].year + 1)
        .filter_map(|w| ratio(w[1].pe, w[0].pe).map(|r| (w[1].year, r - Decimal::ONE)))
        .collect()
}

/// Pearson correlation (population moments); `None` for a flat series.
fn correlation(a: &[Decimal], b: &[Decimal]) -> Option<Decimal> {
    let (ma, mb) = (mean(a)?, mean(b)?);
    let cov = a
        .iter()
        .zip(b)
        .map(|(x, y)| (*x - ma) * (*y - mb))
        .sum::<Decimal>()
        / Decimal::from(a.len() as u64);
    let (sa, sb) = (std_dev(a, Variance::Population), std_dev(b, Variance::Population));
    if sa.is_zero() || sb.is_zero() {
        return None;
    }
    Some(cov / (sa * sb))
}

/// Correlation of annual PE changes for every pair of sectors in `stats`
/// sharing at least `min_overlap` years of changes. Low correlation means
/// sectors rotate, which pulls the index multiple back on its own.
pub fn sector_pe_correlation(
    stats: &[SectorValuationStats],
    min_overlap: usize,
) -> PeCorrelationSummary {
    let changes: Vec<(Sector, BTreeMap<Year, Rate>)> = stats
        .iter()
        .map(|s| (s.sector, pe_changes(&s.history)))
        .collect();

    let mut pairs = Vec::new();
    for (i, (sector_a, ca)) in changes.iter().enumerate() {
        for (sector_b, cb) in &changes[i + 1..] {
            let (xs, ys): (Vec<Decimal>, Vec<Decimal>) = ca
                .iter()
                .filter_map(|(year, x)| cb.get(year).map(|y| (*x, *y)))
                .unzip();
            if xs.len() < min_overlap {
                continue;
            }
            if let Some(c) = correlation(&xs, &ys) {
                pairs.push(PeCorrelation {
                    sector_a: *sector_a,
                    sector_b: *sector_b,
                    overlap: xs.len(),
                    correlation: c,
                });
            }
        }
    }
    pairs.sort_by(|a, b| a.correlation.cmp(&b.correlation));
    let values: Vec<Decimal> = pairs.iter().map(|p| p.correlation).collect();
    PeCorrelationSummary {
        mean_correlation: mean(&values),
        pairs,
    }
}

// ---------------------------------------------------------------------------
// Reversion impact on the index multiple
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorReversionImpact {
    pub sector: Sector,
    pub mean_pe: Multiple,
    pub current_pe: Multiple,
    pub deviation_sigma: Option<Decimal>,
    /// Share of the latest year's index market cap
    pub weight: Option<Rate>,
    /// `(mean_pe − current_pe) × weight`
    pub pe_impact: Option<Multiple>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversionImpact {
    pub year: Year,
    pub index_pe: Option<Multiple>,
    /// Index PE with every profitable sector at its mean PE; sectors
    /// without statistics keep their market cap
    pub reverted_index_pe: Option<Multiple>,
    pub pe_change: Option<Rate>,
    pub sectors: Vec<SectorReversionImpact>,
}

/// Effect on the latest year's index PE of each sector reverting to its
/// mean PE. All buckets of that year, unclassified included, form the index.
pub fn sector_reversion_impact(
    sectors: &[SectorYearRecord],
    stats: &[SectorValuationStats],
) -> Option<ReversionImpact> {
    let year = sectors.iter().map(|s| s.year).max()?;
    let latest: Vec<&SectorYearRecord> = sectors.iter().filter(|s| s.year == year).collect();
    let total_mc: Decimal = latest.iter().map(|s| s.market_cap).sum();
    let total_earnings: Decimal = latest.iter().map(|s| s.earnings).sum();
    let by_sector: BTreeMap<Sector, &SectorValuationStats> =
        stats.iter().map(|s| (s.sector, s)).collect();

    let impacts = stats
        .iter()
        .map(|st| {
            let mc = latest
                .iter()
                .find(|s| s.sector == st.sector)
                .map_or(Decimal::ZERO, |s| s.market_cap);
            let weight = ratio(mc, total_mc);
            SectorReversionImpact {
                sector: st.sector,
                mean_pe: st.mean_pe,
                current_pe: st.current_pe,
                deviation_sigma: st.deviation_sigma,
                weight,
                pe_impact: weight.map(|w| (st.mean_pe - st.current_pe) * w),
            }
        })
        .collect();

    let reverted_mc: Decimal = latest
        .iter()
        .filter(|s| s.earnings > Decimal::ZERO)
        .map(|s| match by_sector.get(&s.sector) {
            Some(st) => s.earnings * st.mean_pe,
            None => s.market_cap,
        })
        .sum();
    let index_pe = ratio(total_mc, total_earnings);
    let reverted_index_pe = ratio(reverted_mc, total_earnings);
    let pe_change = match (reverted_index_pe, index_pe) {
        (Some(r), Some(c)) => ratio(r, c).map(|x| x - Decimal::ONE),
        _ => None,
    };

    Some(ReversionImpact {
        year,
        index_pe,
        reverted_index_pe,
        pe_change,
        sectors: impacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::ValidCounts;
    use rust_decimal_macros::dec;

    fn bucket(year: Year, sector: Sector, mc: Decimal, earnings: Decimal) -> SectorYearRecord {
        SectorYearRecord {
            year,
            sector,
            company_count: 3,
            earnings,
            prior_earnings: Decimal::ZERO,
            market_cap: mc,
            prior_market_cap: Decimal::ZERO,
            dividends: Decimal::ZERO,
            valid_counts: ValidCounts::default(),
            price_return: None,
            earnings_growth: None,
            pe_expansion: None,
            dividend_yield: None,
            pe: None,
            pe_prior: None,
            weight: None,
            contribution: None,
        }
    }

    fn config(min: usize) -> EngineConfig {
        EngineConfig {
            min_pe_history: min,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_reversion_statistics() {
        // PE path: 10, 20, 15, 25, 10
        let pes = [dec!(10), dec!(20), dec!(15), dec!(25), dec!(10)];
        let rows: Vec<SectorYearRecord> = pes
            .iter()
            .enumerate()
            .map(|(i, pe)| bucket(2000 + i as Year, Sector::Energy, *pe * dec!(10), dec!(10)))
            .collect();

        let out = sector_valuation_reversion(&rows, &config(5));
        assert_eq!(out.len(), 1);
        let s = &out[0];
        assert_eq!(s.mean_pe, dec!(16));
        assert_eq!(s.min_pe, dec!(10));
        assert_eq!(s.max_pe, dec!(25));
        assert_eq!(s.current_year, 2004);
        assert_eq!(s.current_pe, dec!(10));
        // above mean: 20 (→15 fell), 25 (→10 fell)
        assert_eq!(s.reversion_rate, Some(Decimal::ONE));
        let dev = s.deviation_sigma.unwrap();
        assert!(dev < Decimal::ZERO);
    }

    #[test]
    fn test_outliers_and_losses_excluded() {
        let rows = vec![
            bucket(2000, Sector::Energy, dec!(100), dec!(10)),
            bucket(2001, Sector::Energy, dec!(5000), dec!(10)),
            bucket(2002, Sector::Energy, dec!(100), dec!(-10)),
            bucket(2003, Sector::Energy, dec!(120), dec!(10)),
        ];
        let out = sector_valuation_reversion(&rows, &config(2));
        let years: Vec<Year> = out[0].history.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2000, 2003]);
    }

    fn alternating(sector: Sector, start: Decimal, up_first: bool) -> Vec<SectorYearRecord> {
        let (up, down) = (dec!(1.1), dec!(0.9));
        let mut pe = start;
        let mut rows = vec![bucket(2000, sector, pe * dec!(10), dec!(10))];
        for i in 0..4 {
            let rising = (i % 2 == 0) == up_first;
            pe *= if rising { up } else { down };
            rows.push(bucket(2001 + i, sector, pe * dec!(10), dec!(10)));
        }
        rows
    }

    #[test]
    fn test_pe_change_correlation() {
        let mut rows = alternating(Sector::Energy, dec!(10), true);
        rows.extend(alternating(Sector::Materials, dec!(20), true));
        rows.extend(alternating(Sector::Utilities, dec!(10), false));
        let stats = sector_valuation_reversion(&rows, &config(5));
        assert_eq!(stats.len(), 3);

        let summary = sector_pe_correlation(&stats, 4);
        assert_eq!(summary.pairs.len(), 3);
        let close = |a: Decimal, b: Decimal| (a - b).abs() < dec!(0.000001);
        // Utilities moves against both others
        assert!(close(summary.pairs[0].correlation, dec!(-1)));
        assert!(close(summary.pairs[1].correlation, dec!(-1)));
        let last = &summary.pairs[2];
        assert_eq!((last.sector_a, last.sector_b), (Sector::Energy, Sector::Materials));
        assert_eq!(last.overlap, 4);
        assert!(close(last.correlation, Decimal::ONE));
        let mean = summary.mean_correlation.unwrap();
        assert!(close(mean, dec!(-1) / dec!(3)), "mean {mean}");

        let sparse = sector_pe_correlation(&stats, 5);
        assert!(sparse.pairs.is_empty());
        assert!(sparse.mean_correlation.is_none());
    }

    #[test]
    fn test_reversion_impact_on_index_pe() {
        let rows = vec![
            bucket(2000, Sector::Energy, dec!(100), dec!(10)),
            bucket(2000, Sector::Materials, dec!(200), dec!(10)),
            bucket(2001, Sector::Energy, dec!(200), dec!(10)),
            bucket(2001, Sector::Materials, dec!(200), dec!(10)),
            bucket(2001, Sector::Unclassified, dec!(100), dec!(5)),
        ];
        let stats = sector_valuation_reversion(&rows, &config(2));
        let impact = sector_reversion_impact(&rows, &stats).unwrap();
        assert_eq!(impact.year, 2001);
        assert_eq!(impact.index_pe, Some(dec!(20)));
        // 10 × 15 + 10 × 20 + unclassified kept at 100
        assert_eq!(impact.reverted_index_pe, Some(dec!(18)));
        assert_eq!(impact.pe_change, Some(dec!(-0.1)));

        let energy = &impact.sectors[0];
        assert_eq!(energy.sector, Sector::Energy);
        assert_eq!(energy.mean_pe, dec!(15));
        assert_eq!(energy.weight, Some(dec!(0.4)));
        assert_eq!(energy.pe_impact, Some(dec!(-2)));
        assert_eq!(impact.sectors[1].pe_impact, Some(Decimal::ZERO));
        assert!(sector_reversion_impact(&[], &stats).is_none());
    }

    #[test]
    fn test_short_history_and_unclassified_skipped() {
        let rows = vec![
            bucket(2000, Sector::Energy, dec!(100), dec!(10)),
            bucket(2000, Sector::Unclassified, dec!(100), dec!(10)),
            bucket(2001, Sector::Unclassified, dec!(100), dec!(10)),
        ];
        assert!(sector_valuation_reversion(&rows, &config(2)).is_empty());
    }
}

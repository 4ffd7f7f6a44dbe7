//! Level 1: one record per year summed over every sector bucket.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregation::sector::{Totals, ValidCounts};
use crate::aggregation::SectorYearRecord;
use crate::config::PeExpansionMethod;
use crate::types::{Money, Multiple, Rate, Year};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexYearRecord {
    pub year: Year,
    pub company_count: usize,
    pub sector_count: usize,
    pub earnings: Money,
    pub prior_earnings: Money,
    pub market_cap: Money,
    pub prior_market_cap: Money,
    pub dividends: Money,
    pub valid_counts: ValidCounts,
    pub price_return: Option<Rate>,
    pub dividend_yield: Option<Rate>,
    /// `price_return + dividend_yield`, a null yield counting as zero
    pub total_return: Option<Rate>,
    pub earnings_growth: Option<Rate>,
    pub pe_expansion: Option<Rate>,
    pub pe: Option<Multiple>,
    pub pe_prior: Option<Multiple>,
}

/// Sum sector buckets (unclassified included) into one record per year,
/// sorted by year.
pub fn aggregate_index(
    sectors: &[SectorYearRecord],
    method: PeExpansionMethod,
) -> Vec<IndexYearRecord> {
    let mut years: BTreeMap<Year, (Totals, usize)> = BTreeMap::new();
    for s in sectors {
        let (totals, count) = years.entry(s.year).or_default();
        totals.merge(&s.totals());
        *count += 1;
    }

    let out: Vec<IndexYearRecord> = years
        .into_iter()
        .map(|(year, (t, sector_count))| {
            let d = t.decompose(method);
            IndexYearRecord {
                year,
                company_count: t.entities,
                sector_count,
                earnings: t.earnings,
                prior_earnings: t.prior_earnings,
                market_cap: t.market_cap,
                prior_market_cap: t.prior_market_cap,
                dividends: t.dividends,
                valid_counts: t.counts,
                price_return: d.price_return,
                dividend_yield: d.dividend_yield,
                total_return: d
                    .price_return
                    .map(|pr| pr + d.dividend_yield.unwrap_or(Decimal::ZERO)),
                earnings_growth: d.earnings_growth,
                pe_expansion: d.pe_expansion,
                pe: d.pe,
                pe_prior: d.pe_prior,
            }
        })
        .collect();

    tracing::info!(years = out.len(), "index-year records aggregated");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate_sectors;
    use crate::aggregation::CompanyYearRecord;
    use crate::lookup::MatchKind;
    use crate::types::Sector;
    use rust_decimal_macros::dec;

    fn company(
        year: Year,
        sec: &str,
        sector: Sector,
        mc: Money,
        mc_prior: Money,
    ) -> CompanyYearRecord {
        CompanyYearRecord {
            year,
            security_id: sec.into(),
            company_id: sec.into(),
            link_match: MatchKind::Dated,
            sector,
            earnings: Some(mc / dec!(20)),
            prior_earnings: Some(mc_prior / dec!(20)),
            market_cap: Some(mc),
            prior_market_cap: Some(mc_prior),
            dividends: Some(mc_prior / dec!(50)),
            price_return: None,
            dividend_yield: None,
            earnings_growth: None,
            pe: None,
            pe_prior: None,
        }
    }

    #[test]
    fn test_index_sums_all_sectors() {
        let recs = vec![
            company(2020, "1", Sector::Energy, dec!(120), dec!(100)),
            company(2020, "2", Sector::Utilities, dec!(90), dec!(100)),
            company(2020, "3", Sector::Unclassified, dec!(110), dec!(100)),
            company(2021, "1", Sector::Energy, dec!(130), dec!(120)),
        ];
        let sectors = aggregate_sectors(&recs, PeExpansionMethod::Additive);
        let index = aggregate_index(&sectors, PeExpansionMethod::Additive);

        assert_eq!(index.len(), 2);
        let y = &index[0];
        assert_eq!(y.year, 2020);
        assert_eq!(y.sector_count, 3);
        assert_eq!(y.company_count, 3);
        assert_eq!(y.market_cap, dec!(320));
        assert_eq!(y.prior_market_cap, dec!(300));
        assert_eq!(y.dividends, dec!(6));
        assert_eq!(y.dividend_yield, Some(dec!(0.02)));
        let pr = y.price_return.unwrap();
        assert!((pr - dec!(0.0666666667)).abs() < dec!(0.000001), "pr {pr}");
        assert_eq!(y.total_return, Some(pr + dec!(0.02)));
        assert_eq!(y.pe, Some(dec!(20)));
        assert_eq!(y.valid_counts.market_cap, 3);
    }

    #[test]
    fn test_null_dividend_yield_counts_as_zero_in_total() {
        let mut rec = company(2020, "1", Sector::Energy, dec!(120), dec!(100));
        rec.dividends = None;
        let sectors = aggregate_sectors(&[rec], PeExpansionMethod::Additive);
        let y = &aggregate_index(&sectors, PeExpansionMethod::Additive)[0];
        assert_eq!(y.dividend_yield, Some(Decimal::ZERO));
        assert_eq!(y.total_return, Some(dec!(0.2)));
    }

    #[test]
    fn test_zero_prior_market_cap_gives_null_returns() {
        let rec = company(2020, "1", Sector::Energy, dec!(120), Decimal::ZERO);
        let sectors = aggregate_sectors(&[rec], PeExpansionMethod::Additive);
        let y = &aggregate_index(&sectors, PeExpansionMethod::Additive)[0];
        assert!(y.price_return.is_none());
        assert!(y.dividend_yield.is_none());
        assert!(y.total_return.is_none());
    }

    #[test]
    fn test_multiplicative_expansion() {
        let mut rec = company(2020, "1", Sector::Energy, dec!(120), dec!(100));
        rec.earnings = Some(dec!(8));
        rec.prior_earnings = Some(dec!(5));
        let sectors = aggregate_sectors(&[rec], PeExpansionMethod::Multiplicative);
        let y = &aggregate_index(&sectors, PeExpansionMethod::Multiplicative)[0];
        // 1.2 / 1.6 - 1
        assert_eq!(y.pe_expansion, Some(dec!(-0.25)));
    }
}

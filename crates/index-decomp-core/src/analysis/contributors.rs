//! Entities that moved the index most in a given year.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::aggregation::CompanyYearRecord;
use crate::types::{CompanyId, Money, Multiple, Sector, SecurityId, Year};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsMover {
    pub security_id: SecurityId,
    pub company_id: CompanyId,
    pub sector: Sector,
    pub change: Money,
    pub earnings: Money,
    pub prior_earnings: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeMover {
    pub security_id: SecurityId,
    pub company_id: CompanyId,
    pub sector: Sector,
    pub pe_change: Multiple,
    pub pe: Multiple,
    pub pe_prior: Multiple,
    pub market_cap: Money,
    /// `ΔPE × market cap`
    pub impact: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearContributors {
    pub year: Year,
    pub earnings: Vec<EarningsMover>,
    pub pe: Vec<PeMover>,
}

fn by_magnitude(a: Money, b: Money) -> Ordering {
    b.abs().cmp(&a.abs())
}

/// Per year, the `n` largest absolute earnings changes and the `n` largest
/// absolute `ΔPE × market cap` moves. Ties keep security order.
pub fn top_contributors(records: &[CompanyYearRecord], n: usize) -> Vec<YearContributors> {
    let mut by_year: BTreeMap<Year, Vec<&CompanyYearRecord>> = BTreeMap::new();
    for r in records {
        by_year.entry(r.year).or_default().push(r);
    }

    by_year
        .into_iter()
        .map(|(year, mut recs)| {
            recs.sort_by(|a, b| a.security_id.cmp(&b.security_id));

            let mut earnings: Vec<EarningsMover> = recs
                .iter()
                .filter_map(|r| {
                    let (cur, prev) = (r.earnings?, r.prior_earnings?);
                    Some(EarningsMover {
                        security_id: r.security_id.clone(),
                        company_id: r.company_id.clone(),
                        sector: r.sector,
                        change: cur - prev,
                        earnings: cur,
                        prior_earnings: prev,
                    })
                })
                .collect();
            earnings.sort_by(|a, b| by_magnitude(a.change, b.change));
            earnings.truncate(n);

            let mut pe: Vec<PeMover> = recs
                .iter()
                .filter_map(|r| {
                    let (cur, prev, mc) = (r.pe?, r.pe_prior?, r.market_cap?);
                    Some(PeMover {
                        security_id: r.security_id.clone(),
                        company_id: r.company_id.clone(),
                        sector: r.sector,
                        pe_change: cur - prev,
                        pe: cur,
                        pe_prior: prev,
                        market_cap: mc,
                        impact: (cur - prev) * mc,
                    })
                })
                .collect();
            pe.sort_by(|a, b| by_magnitude(a.impact, b.impact));
            pe.truncate(n);

            YearContributors { year, earnings, pe }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::MatchKind;
    use rust_decimal_macros::dec;

    fn rec(
        sec: &str,
        earnings: Option<Money>,
        prior: Option<Money>,
        pe: Option<Multiple>,
        pe_prior: Option<Multiple>,
        mc: Option<Money>,
    ) -> CompanyYearRecord {
        CompanyYearRecord {
            year: 2020,
            security_id: sec.into(),
            company_id: sec.into(),
            link_match: MatchKind::Dated,
            sector: Sector::Industrials,
            earnings,
            prior_earnings: prior,
            market_cap: mc,
            prior_market_cap: None,
            dividends: None,
            price_return: None,
            dividend_yield: None,
            earnings_growth: None,
            pe,
            pe_prior,
        }
    }

    #[test]
    fn test_ranked_by_absolute_change() {
        let recs = vec![
            rec("a", Some(dec!(10)), Some(dec!(15)), Some(dec!(20)), Some(dec!(10)), Some(dec!(100))),
            rec("b", Some(dec!(50)), Some(dec!(20)), Some(dec!(12)), Some(dec!(15)), Some(dec!(500))),
            rec("c", Some(dec!(-40)), Some(dec!(0)), None, Some(dec!(15)), Some(dec!(900))),
            rec("d", None, Some(dec!(20)), Some(dec!(30)), Some(dec!(29)), Some(dec!(10))),
        ];
        let out = top_contributors(&recs, 2);
        assert_eq!(out.len(), 1);

        let e: Vec<&str> = out[0].earnings.iter().map(|m| m.security_id.0.as_str()).collect();
        assert_eq!(e, vec!["c", "b"]);
        assert_eq!(out[0].earnings[0].change, dec!(-40));

        // impacts: a = 1000, b = -1500, d = 10
        let p: Vec<&str> = out[0].pe.iter().map(|m| m.security_id.0.as_str()).collect();
        assert_eq!(p, vec!["b", "a"]);
        assert_eq!(out[0].pe[0].impact, dec!(-1500));
    }

    #[test]
    fn test_ties_keep_security_order() {
        let recs = vec![
            rec("z", Some(dec!(10)), Some(dec!(0)), None, None, None),
            rec("y", Some(dec!(-10)), Some(dec!(0)), None, None, None),
        ];
        let out = top_contributors(&recs, 10);
        let e: Vec<&str> = out[0].earnings.iter().map(|m| m.security_id.0.as_str()).collect();
        assert_eq!(e, vec!["y", "z"]);
        assert!(out[0].pe.is_empty());
    }
}

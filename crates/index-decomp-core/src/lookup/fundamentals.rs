//! Per-company, per-fiscal-year financial statement store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::calendar::fiscal_year_of;
use crate::types::{CompanyId, Money, Year};

/// One annual statement row as delivered by the data provider.
/// Monetary totals are in millions; per-share values in currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialStatementRecord {
    #[serde(alias = "entity_id")]
    pub company_id: CompanyId,
    pub report_date: NaiveDate,
    #[serde(default)]
    pub net_income: Option<Money>,
    /// Millions of shares
    #[serde(default)]
    pub shares_outstanding: Option<Decimal>,
    #[serde(default)]
    pub price_per_share: Option<Decimal>,
    #[serde(default)]
    pub eps: Option<Decimal>,
    #[serde(default)]
    pub dividend_per_share: Option<Decimal>,
    #[serde(default)]
    pub revenue: Option<Money>,
    #[serde(default)]
    pub equity: Option<Money>,
    /// Raw industry classification code, e.g. "451020"
    #[serde(default)]
    pub sector_code: Option<String>,
}

impl FinancialStatementRecord {
    pub fn fiscal_year(&self) -> Year {
        fiscal_year_of(self.report_date)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FundamentalsLookup {
    by_company: HashMap<CompanyId, HashMap<Year, FinancialStatementRecord>>,
    records: usize,
    superseded: usize,
}

impl FundamentalsLookup {
    /// Key rows by (company, fiscal year). When several rows share a key the
    /// latest `report_date` wins; on an exact date tie the first row is kept.
    pub fn build(rows: &[FinancialStatementRecord]) -> Self {
        let mut by_company: HashMap<CompanyId, HashMap<Year, FinancialStatementRecord>> =
            HashMap::new();
        let mut records = 0usize;
        let mut superseded = 0usize;

        for row in rows {
            let years = by_company.entry(row.company_id.clone()).or_default();
            match years.get_mut(&row.fiscal_year()) {
                Some(existing) => {
                    superseded += 1;
                    if row.report_date > existing.report_date {
                        *existing = row.clone();
                    }
                }
                None => {
                    years.insert(row.fiscal_year(), row.clone());
                    records += 1;
                }
            }
        }

        tracing::debug!(records, superseded, "fundamentals lookup built");
        FundamentalsLookup {
            by_company,
            records,
            superseded,
        }
    }

    pub fn get(&self, company: &CompanyId, fiscal_year: Year) -> Option<&FinancialStatementRecord> {
        self.by_company.get(company)?.get(&fiscal_year)
    }

    /// Earliest and latest fiscal years present.
    pub fn fiscal_year_span(&self) -> Option<(Year, Year)> {
        let years = || self.by_company.values().flat_map(|m| m.keys().copied());
        Some((years().min()?, years().max()?))
    }

    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Rows dropped because another row for the same key was kept.
    pub fn superseded(&self) -> usize {
        self.superseded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(co: &str, date: NaiveDate, ni: Decimal) -> FinancialStatementRecord {
        FinancialStatementRecord {
            company_id: co.into(),
            report_date: date,
            net_income: Some(ni),
            shares_outstanding: None,
            price_per_share: None,
            eps: None,
            dividend_per_share: None,
            revenue: None,
            equity: None,
            sector_code: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_rollback_assigns_prior_fiscal_year() {
        let lookup = FundamentalsLookup::build(&[row("A", d(2021, 3, 31), dec!(5))]);
        assert!(lookup.get(&"A".into(), 2021).is_none());
        assert_eq!(lookup.get(&"A".into(), 2020).unwrap().net_income, Some(dec!(5)));
    }

    #[test]
    fn test_latest_restatement_wins() {
        let lookup = FundamentalsLookup::build(&[
            row("A", d(2021, 1, 31), dec!(1)),
            row("A", d(2020, 12, 31), dec!(2)),
            row("A", d(2020, 6, 30), dec!(3)),
        ]);
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.superseded(), 2);
        assert_eq!(lookup.get(&"A".into(), 2020).unwrap().net_income, Some(dec!(1)));
    }

    #[test]
    fn test_exact_tie_keeps_first_row() {
        let lookup = FundamentalsLookup::build(&[
            row("A", d(2020, 12, 31), dec!(7)),
            row("A", d(2020, 12, 31), dec!(8)),
        ]);
        assert_eq!(lookup.get(&"A".into(), 2020).unwrap().net_income, Some(dec!(7)));
    }

    #[test]
    fn test_missing_key_not_found() {
        let lookup = FundamentalsLookup::build(&[row("A", d(2020, 12, 31), dec!(1))]);
        assert!(lookup.get(&"B".into(), 2020).is_none());
        assert_eq!(lookup.fiscal_year_span(), Some((2020, 2020)));
    }

    #[test]
    fn test_numeric_fields_accept_strings_and_numbers() {
        let r: FinancialStatementRecord = serde_json::from_str(
            r#"{"entity_id":"A","report_date":"2020-12-31","net_income":"12.5","eps":2,"sector_code":"451020"}"#,
        )
        .unwrap();
        assert_eq!(r.net_income, Some(dec!(12.5)));
        assert_eq!(r.eps, Some(dec!(2)));
        assert!(r.price_per_share.is_none());
        assert_eq!(r.fiscal_year(), 2020);
    }
}

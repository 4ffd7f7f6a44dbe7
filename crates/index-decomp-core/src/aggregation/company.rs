//! Level 3: one record per (year, security) joined from the three lookups.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::aggregation::{growth, ratio};
use crate::calendar::anchor_date;
use crate::config::EngineConfig;
use crate::lookup::{
    FinancialStatementRecord, FundamentalsLookup, IdentityResolver, MatchKind, MembershipIndex,
};
use crate::types::{CompanyId, Money, Multiple, Rate, Sector, SecurityId, Year};
use crate::DecompResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyYearRecord {
    pub year: Year,
    pub security_id: SecurityId,
    pub company_id: CompanyId,
    pub link_match: MatchKind,
    pub sector: Sector,
    /// Net income, current fiscal year
    pub earnings: Option<Money>,
    pub prior_earnings: Option<Money>,
    pub market_cap: Option<Money>,
    pub prior_market_cap: Option<Money>,
    /// Dividend per share × shares outstanding
    pub dividends: Option<Money>,
    pub price_return: Option<Rate>,
    pub dividend_yield: Option<Rate>,
    pub earnings_growth: Option<Rate>,
    pub pe: Option<Multiple>,
    pub pe_prior: Option<Multiple>,
}

/// Per-year accounting of which members made it into Level 3.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub year: Year,
    pub members: usize,
    /// Members resolved to a company id
    pub mapped: usize,
    /// Resolutions that fell back to the highest-priority link
    pub fallback_links: usize,
    /// Mapped members with a current-year statement
    pub with_fundamentals: usize,
    pub missing_mapping: usize,
    pub missing_fundamentals: usize,
    /// Securities whose company was already counted this year
    pub duplicate_company: usize,
    /// Records retained without a prior-year statement
    pub missing_prior: usize,
    pub retained: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyLevel {
    /// Sorted by (year, security_id)
    pub records: Vec<CompanyYearRecord>,
    pub coverage: Vec<CoverageRecord>,
}

// ---------------------------------------------------------------------------
// Field derivations
// ---------------------------------------------------------------------------

fn market_cap(stmt: &FinancialStatementRecord) -> Option<Money> {
    match (stmt.shares_outstanding, stmt.price_per_share) {
        (Some(shares), Some(price)) if price > Decimal::ZERO => Some(shares * price),
        _ => None,
    }
}

fn dividends(stmt: &FinancialStatementRecord) -> Option<Money> {
    Some(stmt.dividend_per_share? * stmt.shares_outstanding?)
}

fn pe(stmt: &FinancialStatementRecord) -> Option<Multiple> {
    ratio(stmt.price_per_share?, stmt.eps?)
}

fn derive_record(
    year: Year,
    security_id: &SecurityId,
    company_id: &CompanyId,
    link_match: MatchKind,
    current: &FinancialStatementRecord,
    prior: Option<&FinancialStatementRecord>,
) -> CompanyYearRecord {
    let mc = market_cap(current);
    let mc_prior = prior.and_then(market_cap);
    let divs = dividends(current);
    let earnings = current.net_income;
    let prior_earnings = prior.and_then(|p| p.net_income);

    let price_return = match (current.price_per_share, prior.and_then(|p| p.price_per_share)) {
        (Some(cur), Some(prev)) => ratio(cur, prev).map(|r| r - Decimal::ONE),
        _ => None,
    };
    let dividend_yield = match (divs, mc_prior) {
        (Some(d), Some(p)) => ratio(d, p),
        _ => None,
    };
    let earnings_growth = match (earnings, prior_earnings) {
        (Some(cur), Some(prev)) => growth(cur, prev),
        _ => None,
    };
    let sector = current
        .sector_code
        .as_deref()
        .map_or(Sector::Unclassified, Sector::from_industry_code);

    CompanyYearRecord {
        year,
        security_id: security_id.clone(),
        company_id: company_id.clone(),
        link_match,
        sector,
        earnings,
        prior_earnings,
        market_cap: mc,
        prior_market_cap: mc_prior,
        dividends: divs,
        price_return,
        dividend_yield,
        earnings_growth,
        pe: pe(current),
        pe_prior: prior.and_then(pe),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build Level-3 records for every member of every year in `start..=end`.
///
/// A member is excluded for the year when it has no identifier link or no
/// current-year statement. A missing prior-year statement only nulls the
/// prior-dependent fields.
pub fn build_company_records(
    resolver: &IdentityResolver,
    membership: &MembershipIndex,
    fundamentals: &FundamentalsLookup,
    start: Year,
    end: Year,
    config: &EngineConfig,
) -> DecompResult<CompanyLevel> {
    let mut records = Vec::new();
    let mut coverage = Vec::with_capacity((end - start + 1).max(0) as usize);

    for year in start..=end {
        let anchor = anchor_date(year, config.anchor_month, config.anchor_day)?;
        let members = membership.members_at(year);
        let mut cov = CoverageRecord {
            year,
            members: members.len(),
            ..Default::default()
        };
        let mut seen: HashSet<&CompanyId> = HashSet::new();

        for security in members {
            let Some(resolution) = resolver.resolve_detailed(security, anchor) else {
                tracing::debug!(%security, year, "no identifier link");
                cov.missing_mapping += 1;
                continue;
            };
            cov.mapped += 1;
            if resolution.kind == MatchKind::Fallback {
                cov.fallback_links += 1;
            }

            let company = resolution.company_id;
            let Some(current) = fundamentals.get(company, year) else {
                tracing::debug!(%security, %company, year, "no fundamentals");
                cov.missing_fundamentals += 1;
                continue;
            };
            cov.with_fundamentals += 1;
            if !seen.insert(company) {
                tracing::debug!(%security, %company, year, "company already counted");
                cov.duplicate_company += 1;
                continue;
            }

            let prior = fundamentals.get(company, year - 1);
            if prior.is_none() {
                cov.missing_prior += 1;
            }
            records.push(derive_record(
                year,
                security,
                company,
                resolution.kind,
                current,
                prior,
            ));
            cov.retained += 1;
        }

        coverage.push(cov);
    }

    tracing::info!(records = records.len(), start, end, "company-year records built");
    Ok(CompanyLevel { records, coverage })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! End-to-end runs: lookups → three aggregation levels → analyses.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::aggregation::{
    aggregate_index, aggregate_sectors, apply_contributions, build_company_records,
    CompanyYearRecord, CoverageRecord, IndexYearRecord, SectorYearRecord,
};
use crate::analysis::{
    analyze_rolling, cross_validate, full_period, sector_earnings_attribution,
    sector_pe_correlation, sector_reversion_impact, sector_valuation_reversion, top_contributors,
    verify, CrossValidationReport, EarningsAttributionPeriod, FullPeriodDecomposition,
    PeCorrelationSummary, ReferenceOffset, ReferencePoint, ReversionImpact, RollingAnalysis,
    SectorValuationStats, VerificationReport, YearContributors,
};
use crate::config::EngineConfig;
use crate::error::DecompError;
use crate::lookup::{
    FinancialStatementRecord, FundamentalsLookup, IdentifierLink, IdentityResolver,
    MembershipIndex, MembershipInterval,
};
use crate::types::{with_metadata, ComputationOutput, Year};
use crate::DecompResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// The three source tables plus an optional reference series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecompositionInput {
    #[serde(alias = "links")]
    pub identifier_links: Vec<IdentifierLink>,
    pub membership: Vec<MembershipInterval>,
    #[serde(alias = "fundamentals")]
    pub statements: Vec<FinancialStatementRecord>,
    #[serde(default)]
    pub reference: Option<Vec<ReferencePoint>>,
    #[serde(default)]
    pub config: Option<EngineConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionOutput {
    pub start_year: Year,
    pub end_year: Year,
    pub coverage: Vec<CoverageRecord>,
    pub companies: Vec<CompanyYearRecord>,
    pub sectors: Vec<SectorYearRecord>,
    pub index: Vec<IndexYearRecord>,
    pub verification: VerificationReport,
    pub rolling: RollingAnalysis,
    pub full_period: Option<FullPeriodDecomposition>,
    pub valuation_reversion: Vec<SectorValuationStats>,
    pub pe_correlation: PeCorrelationSummary,
    pub reversion_impact: Option<ReversionImpact>,
    pub earnings_attribution: Vec<EarningsAttributionPeriod>,
    pub top_contributors: Vec<YearContributors>,
    pub cross_validation: Option<CrossValidationReport>,
}

/// A previously computed index series to analyse on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSeriesInput {
    pub index: Vec<IndexYearRecord>,
    #[serde(default)]
    pub reference: Option<Vec<ReferencePoint>>,
    #[serde(default)]
    pub config: Option<EngineConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingOutput {
    pub rolling: RollingAnalysis,
    pub full_period: Option<FullPeriodDecomposition>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn analysis_window(
    config: &EngineConfig,
    fundamentals: &FundamentalsLookup,
) -> DecompResult<(Year, Year)> {
    let span = fundamentals.fiscal_year_span();
    let start = match (config.start_year, span) {
        (Some(y), _) => y,
        // first fiscal year has no prior-year statements to compare against
        (None, Some((first, _))) => first + 1,
        (None, None) => {
            return Err(DecompError::InsufficientData(
                "No financial statements and no start_year configured".into(),
            ))
        }
    };
    let end = match (config.end_year, span) {
        (Some(y), _) => y,
        (None, Some((_, last))) => last,
        (None, None) => {
            return Err(DecompError::InsufficientData(
                "No financial statements and no end_year configured".into(),
            ))
        }
    };
    if start > end {
        return Err(DecompError::InsufficientData(format!(
            "Analysis window {start}..={end} is empty"
        )));
    }
    Ok((start, end))
}

fn rolling_warnings(rolling: &RollingAnalysis, warnings: &mut Vec<String>) {
    for s in &rolling.summaries {
        if s.total_return.is_none() {
            warnings.push(format!(
                "Rolling window of {} years has no complete lookback in the index series",
                s.window
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build every level and run every analysis over `input`.
pub fn run_decomposition(
    input: &DecompositionInput,
) -> DecompResult<ComputationOutput<DecompositionOutput>> {
    let started = Instant::now();
    let config = input.config.clone().unwrap_or_default();
    config.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    // --- Lookups ---
    let resolver = IdentityResolver::build(&input.identifier_links);
    let membership = MembershipIndex::build(&input.membership);
    let fundamentals = FundamentalsLookup::build(&input.statements);
    warnings.extend(resolver.warnings().iter().cloned());
    warnings.extend(membership.warnings().iter().cloned());
    if fundamentals.superseded() > 0 {
        warnings.push(format!(
            "{} financial statement row(s) superseded by a later report for the same fiscal year",
            fundamentals.superseded()
        ));
    }
    tracing::info!(
        securities = resolver.security_count(),
        members = membership.security_count(),
        statements = fundamentals.len(),
        "lookups built"
    );

    let (start_year, end_year) = analysis_window(&config, &fundamentals)?;

    // --- Levels 3 → 2 → 1 ---
    let level3 = build_company_records(
        &resolver,
        &membership,
        &fundamentals,
        start_year,
        end_year,
        &config,
    )?;
    let mut sectors = aggregate_sectors(&level3.records, config.pe_expansion);
    apply_contributions(&mut sectors);
    let index = aggregate_index(&sectors, config.pe_expansion);

    let unmapped: usize = level3.coverage.iter().map(|c| c.missing_mapping).sum();
    let unfunded: usize = level3.coverage.iter().map(|c| c.missing_fundamentals).sum();
    if unmapped + unfunded > 0 {
        warnings.push(format!(
            "Excluded member-years: {unmapped} without an identifier link, \
             {unfunded} without current fundamentals"
        ));
    }

    // --- Analyses ---
    let verification = verify(&level3.records, &sectors, &index, &config);
    warnings.extend(verification.anomalies.iter().map(|a| a.to_string()));

    let rolling = analyze_rolling(&index, &config.rolling_windows, config.pe_expansion)?;
    rolling_warnings(&rolling, &mut warnings);
    let full = full_period(&index, config.pe_expansion);
    let valuation_reversion = sector_valuation_reversion(&sectors, &config);
    let pe_correlation =
        sector_pe_correlation(&valuation_reversion, config.min_correlation_overlap);
    let reversion_impact = sector_reversion_impact(&sectors, &valuation_reversion);
    let earnings_attribution =
        sector_earnings_attribution(&sectors, config.attribution_period_years);
    let top = top_contributors(&level3.records, config.top_contributors);

    let cross_validation = match &input.reference {
        Some(reference) => Some(cross_validate(
            &index,
            reference,
            ReferenceOffset(config.reference_offset_years),
            config.pe_expansion,
        )?),
        None => None,
    };

    let output = DecompositionOutput {
        start_year,
        end_year,
        coverage: level3.coverage,
        companies: level3.records,
        sectors,
        index,
        verification,
        rolling,
        full_period: full,
        valuation_reversion,
        pe_correlation,
        reversion_impact,
        earnings_attribution,
        top_contributors: top,
        cross_validation,
    };

    let elapsed = started.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bottom-up total return decomposition (company → sector → index)",
        &config,
        warnings,
        elapsed,
        output,
    ))
}

/// Rolling-window and full-period analysis of an existing index series.
pub fn run_rolling(input: &IndexSeriesInput) -> DecompResult<ComputationOutput<RollingOutput>> {
    let started = Instant::now();
    let config = input.config.clone().unwrap_or_default();
    config.validate()?;
    if input.index.is_empty() {
        return Err(DecompError::InsufficientData("Index series is empty".into()));
    }
    let mut warnings = Vec::new();

    let rolling = analyze_rolling(&input.index, &config.rolling_windows, config.pe_expansion)?;
    rolling_warnings(&rolling, &mut warnings);
    let output = RollingOutput {
        full_period: full_period(&input.index, config.pe_expansion),
        rolling,
    };

    let elapsed = started.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rolling N-year annualised decomposition",
        &config,
        warnings,
        elapsed,
        output,
    ))
}

/// Cross-validate an existing index series against `input.reference`.
pub fn run_cross_validation(
    input: &IndexSeriesInput,
) -> DecompResult<ComputationOutput<CrossValidationReport>> {
    let started = Instant::now();
    let config = input.config.clone().unwrap_or_default();
    config.validate()?;
    let reference = input.reference.as_deref().ok_or_else(|| DecompError::InvalidInput {
        field: "reference".into(),
        reason: "A reference series is required for cross-validation".into(),
    })?;
    let mut warnings = Vec::new();

    let report = cross_validate(
        &input.index,
        reference,
        ReferenceOffset(config.reference_offset_years),
        config.pe_expansion,
    )?;
    if report.rows.is_empty() {
        warnings.push(format!(
            "No engine year overlaps the reference series at an offset of {} year(s)",
            config.reference_offset_years
        ));
    }

    let elapsed = started.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cross-validation against a reference index series",
        &config,
        warnings,
        elapsed,
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_insufficient_data() {
        let err = run_decomposition(&DecompositionInput::default()).unwrap_err();
        assert!(matches!(err, DecompError::InsufficientData(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let input = DecompositionInput {
            config: Some(EngineConfig {
                rolling_windows: vec![0],
                ..EngineConfig::default()
            }),
            ..DecompositionInput::default()
        };
        assert!(matches!(
            run_decomposition(&input),
            Err(DecompError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_cross_validation_requires_reference() {
        let input = IndexSeriesInput {
            index: Vec::new(),
            reference: None,
            config: None,
        };
        assert!(run_cross_validation(&input).is_err());
    }

    #[test]
    fn test_configured_window_without_statements() {
        let input = DecompositionInput {
            config: Some(EngineConfig {
                start_year: Some(2000),
                end_year: Some(2001),
                ..EngineConfig::default()
            }),
            ..DecompositionInput::default()
        };
        let out = run_decomposition(&input).unwrap();
        assert_eq!(out.result.coverage.len(), 2);
        assert!(out.result.index.is_empty());
        assert!(out.result.verification.passed);
    }
}

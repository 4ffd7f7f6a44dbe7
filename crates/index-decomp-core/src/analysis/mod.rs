//! Analyses that consume the aggregated levels: consistency checks, rolling
//! windows, reference comparison and the sector/entity diagnostics.

pub mod contributors;
pub mod cross_validation;
pub mod earnings_attribution;
pub mod rolling;
pub mod stats;
pub mod valuation_reversion;
pub mod verification;

pub use contributors::{top_contributors, EarningsMover, PeMover, YearContributors};
pub use cross_validation::{
    compare_pair, cross_validate, reference_decomposition, CrossValidationReport,
    CrossValidationRow, DifferenceSummary, LongRunComparison, ReferenceDecomposition,
    ReferenceOffset, ReferencePoint,
};
pub use earnings_attribution::{
    sector_earnings_attribution, EarningsAttributionPeriod, SectorEarningsShare,
};
pub use rolling::{
    analyze_rolling, full_period, FullPeriodDecomposition, RollingAnalysis, RollingWindowRecord,
    WindowSummary,
};
pub use stats::DescriptiveStats;
pub use valuation_reversion::{
    sector_pe_correlation, sector_reversion_impact, sector_valuation_reversion, PeCorrelation,
    PeCorrelationSummary, PePoint, ReversionImpact, SectorReversionImpact, SectorValuationStats,
};
pub use verification::{
    verify, ConsistencyAnomaly, ConsistencyCheck, VerificationReport, VerificationRow,
};

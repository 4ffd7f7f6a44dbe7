//! Three-level roll-up: company-year (L3) → sector-year (L2) → index-year (L1).
//!
//! Null semantics are fixed per field. Additive sums (earnings, market cap,
//! dividends) treat a missing entity value as zero. Ratios and growth rates
//! are `None` whenever their denominator is not strictly positive; they are
//! never zero-filled. Market-cap returns follow the additive sums: a bucket
//! whose current caps are all missing returns −1 against its prior cap.

pub mod company;
pub mod contribution;
pub mod index;
pub mod sector;

pub use company::{build_company_records, CompanyLevel, CompanyYearRecord, CoverageRecord};
pub use contribution::{apply_contributions, SectorContribution};
pub use index::{aggregate_index, IndexYearRecord};
pub use sector::{aggregate_sectors, SectorYearRecord, ValidCounts};

use rust_decimal::Decimal;

use crate::types::Rate;

/// `numerator / denominator`, defined only for a positive denominator.
pub(crate) fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator > Decimal::ZERO {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// `current / prior - 1`, defined only when both ends are positive.
pub(crate) fn growth(current: Decimal, prior: Decimal) -> Option<Rate> {
    if current > Decimal::ZERO && prior > Decimal::ZERO {
        Some(current / prior - Decimal::ONE)
    } else {
        None
    }
}

/// `current / prior - 1` over summed market caps, defined whenever the prior
/// sum is positive. Keeps Σ weight × return equal to the index return.
pub(crate) fn market_return(current: Decimal, prior: Decimal) -> Option<Rate> {
    ratio(current, prior).map(|r| r - Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ratio_requires_positive_denominator() {
        assert_eq!(ratio(dec!(3), dec!(4)), Some(dec!(0.75)));
        assert_eq!(ratio(dec!(3), Decimal::ZERO), None);
        assert_eq!(ratio(dec!(3), dec!(-1)), None);
    }

    #[test]
    fn test_growth_requires_both_ends_positive() {
        assert_eq!(growth(dec!(110), dec!(100)), Some(dec!(0.1)));
        assert_eq!(growth(dec!(10), dec!(-5)), None);
        assert_eq!(growth(dec!(-10), dec!(5)), None);
        assert_eq!(growth(Decimal::ZERO, dec!(5)), None);
    }

    #[test]
    fn test_market_return_needs_only_prior() {
        assert_eq!(market_return(dec!(120), dec!(100)), Some(dec!(0.2)));
        assert_eq!(market_return(Decimal::ZERO, dec!(100)), Some(dec!(-1)));
        assert_eq!(market_return(dec!(120), Decimal::ZERO), None);
    }
}

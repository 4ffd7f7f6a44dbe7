use serde::{Deserialize, Serialize};

use crate::aggregation::SectorYearRecord;
use crate::types::Rate;

/// A sector's weighted share of each index-level component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorContribution {
    pub price: Option<Rate>,
    pub dividend: Option<Rate>,
    pub earnings: Option<Rate>,
    pub pe: Option<Rate>,
}

fn weighted(weight: Option<Rate>, component: Option<Rate>) -> Option<Rate> {
    Some(weight? * component?)
}

/// Fill `contribution` on every sector record as `weight × component`.
///
/// Price and dividend contributions sum across a year's sectors to the
/// index price return and dividend yield. Earnings and PE contributions do
/// not, since their denominators are earnings rather than market cap.
pub fn apply_contributions(sectors: &mut [SectorYearRecord]) {
    for s in sectors.iter_mut() {
        s.contribution = Some(SectorContribution {
            price: weighted(s.weight, s.price_return),
            dividend: weighted(s.weight, s.dividend_yield),
            earnings: weighted(s.weight, s.earnings_growth),
            pe: weighted(s.weight, s.pe_expansion),
        });
    }
}

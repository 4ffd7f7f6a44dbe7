//! Descriptive statistics over Decimal series.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

/// Divisor used for the variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variance {
    /// ÷ N
    Population,
    /// ÷ (N − 1)
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub mean: Decimal,
    pub std_dev: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub range: Decimal,
    pub samples: usize,
}

pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().copied().sum::<Decimal>() / Decimal::from(values.len() as u64))
}

/// Standard deviation; zero when there are too few values for the divisor.
pub fn std_dev(values: &[Decimal], kind: Variance) -> Decimal {
    let n = values.len() as u64;
    let divisor = match kind {
        Variance::Population => n,
        Variance::Sample => n.saturating_sub(1),
    };
    let Some(m) = mean(values) else {
        return Decimal::ZERO;
    };
    if divisor == 0 {
        return Decimal::ZERO;
    }
    let variance = values
        .iter()
        .map(|v| (*v - m) * (*v - m))
        .sum::<Decimal>()
        / Decimal::from(divisor);
    variance.sqrt().unwrap_or(Decimal::ZERO)
}

pub fn describe(values: &[Decimal], kind: Variance) -> Option<DescriptiveStats> {
    let mean = mean(values)?;
    let min = values.iter().copied().min()?;
    let max = values.iter().copied().max()?;
    Some(DescriptiveStats {
        mean,
        std_dev: std_dev(values, kind),
        min,
        max,
        range: max - min,
        samples: values.len(),
    })
}

/// Mean of the defined values; `None` when none are defined.
pub fn mean_defined<I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    let defined: Vec<Decimal> = values.into_iter().flatten().collect();
    mean(&defined)
}

/// Compound annual growth rate `(end / start)^(1/years) − 1`.
///
/// Defined only for positive endpoints and a positive horizon.
pub fn annualize(end: Decimal, start: Decimal, years: u32) -> Option<Rate> {
    if end <= Decimal::ZERO || start <= Decimal::ZERO || years == 0 {
        return None;
    }
    let growth = end / start;
    if years == 1 {
        return Some(growth - Decimal::ONE);
    }
    let root = growth.checked_powd(Decimal::ONE / Decimal::from(years))?;
    Some(root - Decimal::ONE)
}

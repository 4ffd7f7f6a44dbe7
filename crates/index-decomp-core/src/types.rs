use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All monetary values (millions of the reporting currency).
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 18.5x price / earnings)
pub type Multiple = Decimal;

/// Calendar / fiscal year label
pub type Year = i32;

/// Identifier in the security (index membership / pricing) scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityId(pub String);

/// Identifier in the company (financial statement) scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub String);

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SecurityId {
    fn from(s: &str) -> Self {
        SecurityId(s.to_string())
    }
}

impl From<&str> for CompanyId {
    fn from(s: &str) -> Self {
        CompanyId(s.to_string())
    }
}

/// Economic sector, keyed by the two-digit prefix of the industry code.
///
/// Declaration order is the reporting order; `Unclassified` sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Energy,
    Materials,
    Industrials,
    ConsumerDiscretionary,
    ConsumerStaples,
    HealthCare,
    Financials,
    InformationTechnology,
    CommunicationServices,
    Utilities,
    RealEstate,
    Unclassified,
}

impl Sector {
    pub const CLASSIFIED: [Sector; 11] = [
        Sector::Energy,
        Sector::Materials,
        Sector::Industrials,
        Sector::ConsumerDiscretionary,
        Sector::ConsumerStaples,
        Sector::HealthCare,
        Sector::Financials,
        Sector::InformationTechnology,
        Sector::CommunicationServices,
        Sector::Utilities,
        Sector::RealEstate,
    ];

    /// Map a raw industry code (e.g. "451020") to its sector.
    /// Anything that does not start with a known two-digit code is unclassified.
    pub fn from_industry_code(code: &str) -> Sector {
        let code = code.trim();
        match code.get(..2) {
            Some("10") => Sector::Energy,
            Some("15") => Sector::Materials,
            Some("20") => Sector::Industrials,
            Some("25") => Sector::ConsumerDiscretionary,
            Some("30") => Sector::ConsumerStaples,
            Some("35") => Sector::HealthCare,
            Some("40") => Sector::Financials,
            Some("45") => Sector::InformationTechnology,
            Some("50") => Sector::CommunicationServices,
            Some("55") => Sector::Utilities,
            Some("60") => Sector::RealEstate,
            _ => Sector::Unclassified,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Sector::Energy => "10",
            Sector::Materials => "15",
            Sector::Industrials => "20",
            Sector::ConsumerDiscretionary => "25",
            Sector::ConsumerStaples => "30",
            Sector::HealthCare => "35",
            Sector::Financials => "40",
            Sector::InformationTechnology => "45",
            Sector::CommunicationServices => "50",
            Sector::Utilities => "55",
            Sector::RealEstate => "60",
            Sector::Unclassified => "XX",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sector::Energy => "Energy",
            Sector::Materials => "Materials",
            Sector::Industrials => "Industrials",
            Sector::ConsumerDiscretionary => "Consumer Discretionary",
            Sector::ConsumerStaples => "Consumer Staples",
            Sector::HealthCare => "Health Care",
            Sector::Financials => "Financials",
            Sector::InformationTechnology => "Information Technology",
            Sector::CommunicationServices => "Communication Services",
            Sector::Utilities => "Utilities",
            Sector::RealEstate => "Real Estate",
            Sector::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

impl<T: Serialize> ComputationOutput<T> {
    /// Replace the result, keeping methodology, warnings and metadata.
    pub fn map<U: Serialize>(self, f: impl FnOnce(T) -> U) -> ComputationOutput<U> {
        ComputationOutput {
            result: f(self.result),
            methodology: self.methodology,
            assumptions: self.assumptions,
            warnings: self.warnings,
            metadata: self.metadata,
        }
    }
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_from_industry_code() {
        assert_eq!(Sector::from_industry_code("451020"), Sector::InformationTechnology);
        assert_eq!(Sector::from_industry_code(" 4010 "), Sector::Financials);
        assert_eq!(Sector::from_industry_code("60"), Sector::RealEstate);
    }

    #[test]
    fn test_unknown_industry_code_is_unclassified() {
        assert_eq!(Sector::from_industry_code(""), Sector::Unclassified);
        assert_eq!(Sector::from_industry_code("9"), Sector::Unclassified);
        assert_eq!(Sector::from_industry_code("99"), Sector::Unclassified);
    }

    #[test]
    fn test_unclassified_sorts_last() {
        let mut sectors = vec![Sector::Unclassified, Sector::Utilities, Sector::Energy];
        sectors.sort();
        assert_eq!(
            sectors,
            vec![Sector::Energy, Sector::Utilities, Sector::Unclassified]
        );
    }

    #[test]
    fn test_sector_code_round_trip() {
        for s in Sector::CLASSIFIED {
            assert_eq!(Sector::from_industry_code(s.code()), s);
        }
    }

    #[test]
    fn test_output_map_keeps_envelope() {
        let out = with_metadata("m", &"a", vec!["w".into()], 7, 2i32);
        let mapped = out.map(|v| v * 10);
        assert_eq!(mapped.result, 20);
        assert_eq!(mapped.methodology, "m");
        assert_eq!(mapped.warnings, vec!["w".to_string()]);
        assert_eq!(mapped.metadata.computation_time_us, 7);
    }
}

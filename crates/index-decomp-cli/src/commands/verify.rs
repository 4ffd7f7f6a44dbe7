use serde::Serialize;
use serde_json::Value;

use index_decomp_core::aggregation::CoverageRecord;
use index_decomp_core::analysis::VerificationReport;
use index_decomp_core::pipeline::{run_decomposition, DecompositionInput};
use index_decomp_core::Year;

use super::{load, BundleArgs, Context};

#[derive(Serialize)]
struct VerificationView {
    start_year: Year,
    end_year: Year,
    verification: VerificationReport,
    coverage: Vec<CoverageRecord>,
}

/// Run the full pipeline and report only the consistency checks.
pub fn run_verify(args: BundleArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let (bundle, config) = load(&args, ctx, "verify")?;
    let mut input: DecompositionInput = serde_json::from_value(bundle)?;
    input.config = Some(config);
    let result = run_decomposition(&input)?.map(|out| VerificationView {
        start_year: out.start_year,
        end_year: out.end_year,
        verification: out.verification,
        coverage: out.coverage,
    });
    Ok(serde_json::to_value(result)?)
}

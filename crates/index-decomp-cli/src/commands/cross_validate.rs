use serde_json::Value;

use index_decomp_core::pipeline::{
    run_cross_validation, run_decomposition, DecompositionInput, IndexSeriesInput,
};

use super::{is_index_series, load, BundleArgs, Context};

/// Compare the index series against the bundle's `reference` series.
pub fn run_cross_validate(
    args: BundleArgs,
    ctx: &Context,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (bundle, config) = load(&args, ctx, "cross-validate")?;
    if is_index_series(&bundle) {
        let mut input: IndexSeriesInput = serde_json::from_value(bundle)?;
        input.config = Some(config);
        let result = run_cross_validation(&input)?;
        return Ok(serde_json::to_value(result)?);
    }

    let mut input: DecompositionInput = serde_json::from_value(bundle)?;
    if input.reference.is_none() {
        return Err("the input bundle needs a `reference` series for cross-validate".into());
    }
    input.config = Some(config);
    let output = run_decomposition(&input)?;
    let Some(report) = output.result.cross_validation.clone() else {
        return Err("cross-validation produced no report".into());
    };
    Ok(serde_json::to_value(output.map(|_| report))?)
}

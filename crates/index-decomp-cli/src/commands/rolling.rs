use serde_json::Value;

use index_decomp_core::pipeline::{
    run_decomposition, run_rolling as run_series_rolling, DecompositionInput, IndexSeriesInput,
    RollingOutput,
};

use super::{is_index_series, load, BundleArgs, Context};

/// Rolling-window analysis of either a precomputed index series or the
/// series built from the source tables.
pub fn run_rolling(args: BundleArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let (bundle, config) = load(&args, ctx, "rolling")?;
    if is_index_series(&bundle) {
        let mut input: IndexSeriesInput = serde_json::from_value(bundle)?;
        input.config = Some(config);
        let result = run_series_rolling(&input)?;
        return Ok(serde_json::to_value(result)?);
    }

    let mut input: DecompositionInput = serde_json::from_value(bundle)?;
    input.config = Some(config);
    let result = run_decomposition(&input)?.map(|out| RollingOutput {
        rolling: out.rolling,
        full_period: out.full_period,
    });
    Ok(serde_json::to_value(result)?)
}

use serde_json::Value;

use index_decomp_core::pipeline::{run_decomposition, DecompositionInput};

use super::{load, BundleArgs, Context};

pub fn run_decompose(args: BundleArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let (bundle, config) = load(&args, ctx, "decompose")?;
    let mut input: DecompositionInput = serde_json::from_value(bundle)?;
    input.config = Some(config);
    let result = run_decomposition(&input)?;
    Ok(serde_json::to_value(result)?)
}

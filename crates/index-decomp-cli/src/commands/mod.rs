pub mod cross_validate;
pub mod decompose;
pub mod rolling;
pub mod verify;

use clap::Args;
use index_decomp_core::EngineConfig;
use serde_json::Value;
use std::path::PathBuf;

use crate::{input, settings};

/// Settings shared by every subcommand.
pub struct Context {
    pub config_path: PathBuf,
}

/// Input bundle location, shared by every subcommand
#[derive(Args)]
pub struct BundleArgs {
    /// Path to JSON input bundle (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Read the bundle and resolve its layered configuration.
pub(crate) fn load(
    args: &BundleArgs,
    ctx: &Context,
    command: &str,
) -> Result<(Value, EngineConfig), Box<dyn std::error::Error>> {
    let bundle = input::read_bundle(args.input.as_deref(), command)?;
    settings::resolve(bundle, &ctx.config_path)
}

/// True when the bundle carries a precomputed index series rather than the
/// three source tables.
pub(crate) fn is_index_series(bundle: &Value) -> bool {
    bundle.get("index").is_some_and(Value::is_array)
}

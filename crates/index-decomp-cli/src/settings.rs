//! Engine configuration: TOML file, then `IDX_DECOMP_*` environment
//! variables, then the bundle's inline `config` object.

use config::{Config, Environment, File, FileFormat};
use index_decomp_core::EngineConfig;
use serde_json::Value;
use std::path::Path;

pub const ENV_PREFIX: &str = "IDX_DECOMP";

pub fn load_engine_config(
    path: &Path,
    inline: Option<&Value>,
) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut builder = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("rolling_windows"),
        );
    if let Some(inline) = inline {
        builder = builder.add_source(File::from_str(&inline.to_string(), FileFormat::Json));
    }

    let settings = builder
        .build()
        .map_err(|e| format!("Failed to load configuration: {e}"))?;
    let engine: EngineConfig = settings
        .try_deserialize()
        .map_err(|e| format!("Invalid configuration: {e}"))?;
    engine.validate()?;
    tracing::debug!(?engine, "engine configuration loaded");
    Ok(engine)
}

/// Split the inline `config` object off a bundle and resolve the layered
/// configuration, returning the bundle without it.
pub fn resolve(
    mut bundle: Value,
    path: &Path,
) -> Result<(Value, EngineConfig), Box<dyn std::error::Error>> {
    let inline = bundle.as_object_mut().and_then(|m| m.remove("config"));
    let engine = load_engine_config(path, inline.as_ref())?;
    Ok((bundle, engine))
}

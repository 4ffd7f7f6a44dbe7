pub mod file;
pub mod stdin;

use serde_json::Value;

/// Load the JSON bundle from `--input` or, failing that, piped stdin.
pub fn read_bundle(path: Option<&str>, command: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_json_value(path);
    }
    match stdin::read_stdin()? {
        Some(value) => Ok(value),
        None => Err(format!("--input <bundle.json> or stdin required for {command}").into()),
    }
}

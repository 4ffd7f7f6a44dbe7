pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Text fields that may look numeric but are never rounded.
const VERBATIM_KEYS: &[&str] = &["id", "version", "methodology", "precision"];

fn is_verbatim_key(key: &str) -> bool {
    VERBATIM_KEYS.contains(&key) || key.ends_with("_id")
}

/// Round every decimal string in `value` to `dp` places. Engine values
/// serialise as strings; identifier and envelope text fields are skipped
/// even when they parse as numbers.
pub fn round_decimals(value: &mut Value, dp: u32) {
    match value {
        Value::String(s) if s.contains('.') => {
            if let Ok(d) = Decimal::from_str(s) {
                *s = d.round_dp(dp).to_string();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_decimals(v, dp)),
        Value::Object(map) => map
            .iter_mut()
            .filter(|(k, _)| !is_verbatim_key(k))
            .for_each(|(_, v)| round_decimals(v, dp)),
        _ => {}
    }
}

/// Scalar rendering shared by the table, CSV and minimal formatters.
pub(crate) fn format_scalar(value: &Value, null: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => null.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_decimals_only_touches_decimal_strings() {
        let mut v = json!({
            "year": 2020,
            "company_id": "001234",
            "price_return": "0.0751234567",
            "rows": [{ "pe": "21.456" }, { "pe": null }],
            "sector": "energy"
        });
        round_decimals(&mut v, 2);
        assert_eq!(v["year"], json!(2020));
        assert_eq!(v["company_id"], json!("001234"));
        assert_eq!(v["price_return"], json!("0.08"));
        assert_eq!(v["rows"][0]["pe"], json!("21.46"));
        assert_eq!(v["rows"][1]["pe"], Value::Null);
        assert_eq!(v["sector"], json!("energy"));
    }

    #[test]
    fn test_round_decimals_skips_identifier_fields() {
        let mut v = json!({
            "result": {
                "companies": [{
                    "security_id": "10001.5",
                    "company_id": "12.345",
                    "market_cap": "1234.5678"
                }]
            },
            "metadata": { "version": "0.1.0", "precision": "1.5" }
        });
        round_decimals(&mut v, 1);
        let company = &v["result"]["companies"][0];
        assert_eq!(company["security_id"], json!("10001.5"));
        assert_eq!(company["company_id"], json!("12.345"));
        assert_eq!(company["market_cap"], json!("1234.6"));
        assert_eq!(v["metadata"]["precision"], json!("1.5"));
    }
}

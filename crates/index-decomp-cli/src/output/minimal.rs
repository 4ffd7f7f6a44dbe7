use serde_json::Value;

use super::format_scalar;

/// Headline fields, most specific first.
const PRIORITY_KEYS: [&str; 4] = ["passed", "total_return", "price_return", "mean"];

/// Print one headline number per command.
///
/// Looks for a headline field on the result, then on its `full_period`,
/// `verification` and `summary.total_return` sections, and finally falls
/// back to the first field.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let candidates = [
        Some(result),
        result.get("full_period"),
        result.get("verification"),
        result.get("summary").and_then(|s| s.get("total_return")),
    ];
    for section in candidates.into_iter().flatten() {
        for key in PRIORITY_KEYS {
            if let Some(val) = section.get(key) {
                if !val.is_null() {
                    println!("{key}: {}", format_scalar(val, "null"));
                    return;
                }
            }
        }
    }

    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        println!("{key}: {}", format_scalar(val, "null"));
        return;
    }
    println!("{}", format_scalar(result, "null"));
}

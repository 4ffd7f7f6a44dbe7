use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::format_scalar;

/// Print the result envelope as tables: scalar fields first, then one table
/// per list of records, then warnings and methodology.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result(result, map),
            None => print_object("", map),
        },
        Value::Array(arr) => print_records("", arr),
        _ => println!("{value}"),
    }
}

fn print_result(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res) => print_object("", res),
        Value::Array(arr) => print_records("", arr),
        other => println!("{}", format_scalar(other, "null")),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

/// Scalars as a Field/Value table; nested records and objects get their
/// own titled section.
fn print_object(title: &str, map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    for (key, val) in map {
        if !is_section(val) {
            builder.push_record([key.as_str(), &format_cell(val)]);
            scalars += 1;
        }
    }
    if scalars > 0 {
        print_title(title);
        println!("{}", Table::from(builder));
    }

    for (key, val) in map {
        let name = if title.is_empty() {
            key.clone()
        } else {
            format!("{title}.{key}")
        };
        match val {
            Value::Array(arr) if is_section(val) => print_records(&name, arr),
            Value::Object(inner) => print_object(&name, inner),
            _ => {}
        }
    }
}

fn print_records(title: &str, arr: &[Value]) {
    print_title(title);
    if arr.is_empty() {
        println!("(empty)");
        return;
    }
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", format_cell(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_cell).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_title(title: &str) {
    if !title.is_empty() {
        println!("\n{title}");
    }
}

fn is_section(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(arr) => arr.iter().any(Value::is_object),
        _ => false,
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Array(arr) => arr
            .iter()
            .map(format_cell)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
        other => format_scalar(other, "-"),
    }
}

//! Structured-record sources (JSON).

use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::error::{PipelineError, Result};
use crate::table::{Table, Value};

/// Read a JSON document of records into a table.
///
/// Accepts a top-level array of objects, or an object whose first
/// array-valued member holds the records. Nested objects are flattened
/// with dotted keys; arrays are kept as JSON text.
pub fn read_json_records(name: &str, path: &Path) -> Result<Table> {
    let text = super::read_text(path)?;
    let document: Json = serde_json::from_str(&text)?;
    records_to_table(name, &document)
}

pub(crate) fn records_to_table(name: &str, document: &Json) -> Result<Table> {
    let records = match document {
        Json::Array(items) => items.as_slice(),
        Json::Object(map) => map
            .values()
            .find_map(|v| v.as_array())
            .map(Vec::as_slice)
            .ok_or_else(|| PipelineError::source(name, "JSON object holds no record array"))?,
        _ => return Err(PipelineError::source(name, "expected an array of records")),
    };

    let mut flattened = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let object = record
            .as_object()
            .ok_or_else(|| PipelineError::source(name, format!("record {idx} is not an object")))?;
        let mut fields = IndexMap::new();
        flatten("", object, &mut fields);
        flattened.push(fields);
    }

    let mut headers: Vec<String> = Vec::new();
    for fields in &flattened {
        for key in fields.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = flattened
        .into_iter()
        .map(|mut fields| {
            headers
                .iter()
                .map(|h| fields.swap_remove(h).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(Table::from_value_rows(name, headers, rows))
}

fn flatten(prefix: &str, object: &Map<String, Json>, out: &mut IndexMap<String, Value>) {
    for (key, value) in object {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Json::Object(inner) => flatten(&key, inner, out),
            other => {
                out.insert(key, json_value(other));
            }
        }
    }
}

fn json_value(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::text(b.to_string()),
        Json::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        Json::String(s) if Value::is_null_marker(s) => Value::Null,
        Json::String(s) => Value::text(s.as_str()),
        other => Value::text(other.to_string()),
    }
}

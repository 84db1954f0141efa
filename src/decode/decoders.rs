//! Decoder implementations

use crate::error::{Error, Result};
use serde_json::Value;

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// JSONPath to extract records
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            record_path: if path == "$" { None } else { Some(path) },
        }
    }

    /// Extract records from an already-parsed document
    pub fn extract(&self, value: &Value) -> Result<Vec<Value>> {
        match &self.record_path {
            Some(path) => {
                // Wildcards go through jsonpath-rust; plain dot paths are walked directly
                if path.contains('*') {
                    extract_with_jsonpath(value, path)
                } else {
                    match extract_simple_path(value, path) {
                        Some(Value::Array(arr)) => Ok(arr.clone()),
                        Some(Value::Null) | None => Ok(vec![]),
                        Some(v) => Ok(vec![v.clone()]),
                    }
                }
            }
            None => match value {
                Value::Array(arr) => Ok(arr.clone()),
                Value::Null => Ok(vec![]),
                _ => Ok(vec![value.clone()]),
            },
        }
    }

    /// The configured path, `$` when the whole document is used
    pub fn path(&self) -> &str {
        self.record_path.as_deref().unwrap_or("$")
    }
}

fn extract_simple_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    let mut current = value;
    for part in path.split('.').filter(|p| !p.is_empty()) {
        current = current.get(part)?;
    }
    Some(current)
}

fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::RecordExtraction {
        path: path.to_string(),
        message: format!("Invalid JSONPath: {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}

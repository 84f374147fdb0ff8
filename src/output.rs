//! Output formatting and control utilities.
//!
//! CHANGELOG:
//! - 02/12/2026 - Char-boundary safe truncation
//! - 01/27/2026 - Initial implementation

use serde::Serialize;
use serde_json::{json, Value};

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
    pub fields: Option<String>,
    pub max_text_chars: Option<u32>,
}

impl OutputControls {
    /// Emit data according to output controls.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let value = serde_json::to_value(data).unwrap_or(json!(null));

        let filtered = match self.fields {
            Some(ref fields) => filter_fields(&value, fields),
            None => value,
        };

        let truncated = match self.max_text_chars {
            Some(max_chars) => truncate_text_fields(&filtered, max_chars as usize),
            None => filtered,
        };

        if self.compact {
            serde_json::to_string(&truncated).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string_pretty(&truncated).unwrap_or_else(|_| "{}".to_string())
        }
    }

    /// Print data to stdout according to output controls.
    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.emit(data));
    }

    /// Shorten free text for the human-readable output.
    pub fn preview(&self, text: &str) -> String {
        let limit = self.max_text_chars.map(|n| n as usize).unwrap_or(80);
        truncate(text, limit)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

/// Filter JSON value to only include specified fields.
fn filter_fields(value: &Value, fields: &str) -> Value {
    let field_list: Vec<&str> = fields.split(',').map(|s| s.trim()).collect();

    match value {
        Value::Array(arr) => {
            Value::Array(arr.iter().map(|v| filter_fields(v, fields)).collect())
        }
        Value::Object(map) => {
            let mut filtered = serde_json::Map::new();
            for field in &field_list {
                if let Some(v) = map.get(*field) {
                    filtered.insert(field.to_string(), v.clone());
                }
            }
            Value::Object(filtered)
        }
        _ => value.clone(),
    }
}

/// Truncate string fields in JSON value.
fn truncate_text_fields(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) => Value::String(truncate(s, max_chars)),
        Value::Array(arr) => {
            Value::Array(arr.iter().map(|v| truncate_text_fields(v, max_chars)).collect())
        }
        Value::Object(map) => {
            let mut truncated = serde_json::Map::new();
            for (k, v) in map {
                truncated.insert(k.clone(), truncate_text_fields(v, max_chars));
            }
            Value::Object(truncated)
        }
        _ => value.clone(),
    }
}

/// Format error as JSON.
pub fn format_error(error: &str) -> String {
    serde_json::to_string(&json!({
        "error": error,
        "success": false
    }))
    .unwrap_or_else(|_| format!(r#"{{"error":"{}"}}"#, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_allowlist() {
        let controls = OutputControls {
            compact: true,
            fields: Some("id, body".to_string()),
            ..Default::default()
        };
        let out = controls.emit(&json!([{"id": 1, "body": "x", "uid": "u"}]));
        assert_eq!(out, r#"[{"body":"x","id":1}]"#);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let controls = OutputControls {
            compact: true,
            max_text_chars: Some(2),
            ..Default::default()
        };
        assert_eq!(controls.emit(&json!({"body": "äöü"})), r#"{"body":"äö..."}"#);
        assert_eq!(controls.preview("héllo"), "hé...");
    }

    #[test]
    fn test_format_error() {
        assert_eq!(format_error("boom"), r#"{"error":"boom","success":false}"#);
    }
}

// Final JSON syntax gate for emitted documents
use crate::{Error, Result};
use log::warn;
use serde_json::Value;

/// Returns true when `json` parses as a JSON object or a JSON array.
pub fn is_valid_json(json: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(json),
        Ok(Value::Object(_)) | Ok(Value::Array(_))
    )
}

/// Passes `json` through unchanged if it is a well-formed object or array.
///
/// Only generic JSON syntax is checked, not the OIM shape.
pub fn ensure_well_formed(json: String) -> Result<String> {
    match serde_json::from_str::<Value>(&json) {
        Ok(Value::Object(_)) | Ok(Value::Array(_)) => Ok(json),
        Ok(other) => {
            warn!("emitted text is JSON but not an object or array");
            Err(Error::Malformed(format!(
                "expected object or array, found {}",
                kind(&other)
            )))
        }
        Err(e) => {
            warn!("emitted text is not valid JSON: {}", e);
            Err(Error::Malformed(e.to_string()))
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_object_and_array() {
        assert!(is_valid_json(r#"{"a": 1}"#));
        assert!(is_valid_json(r#"[{"a": 1}, 2]"#));
        assert!(ensure_well_formed("[]".to_string()).is_ok());
    }

    #[test]
    fn test_rejects_trailing_comma() {
        assert!(!is_valid_json(r#"{"a": 1,}"#));
        let err = ensure_well_formed(r#"[{"a": "b"},]"#.to_string()).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_rejects_scalars() {
        assert!(!is_valid_json("42"));
        assert!(!is_valid_json(r#""report""#));
        assert!(!is_valid_json(""));
    }
}

//! Serde helper functions for request deserialization.
//!
//! Optional text fields treat blank strings as "no value". Patch fields are
//! three-state: absent (leave unchanged), `null`/blank (clear) or a value.

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating empty strings as None.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// Deserialize a patch field.
///
/// Must be combined with `#[serde(default)]` so that a missing field stays
/// `None`. A present field becomes `Some(None)` when null or blank.
pub fn deserialize_patch_string<'de, D>(
    deserializer: D,
) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_optional_string(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestStruct {
        #[serde(default, deserialize_with = "deserialize_optional_string")]
        string_field: Option<String>,
        #[serde(default, deserialize_with = "deserialize_patch_string")]
        patch_field: Option<Option<String>>,
    }

    #[test]
    fn test_deserialize_optional_string_empty() {
        let result: TestStruct = serde_json::from_str(r#"{"string_field": ""}"#).unwrap();
        assert_eq!(result.string_field, None);
    }

    #[test]
    fn test_deserialize_optional_string_whitespace() {
        let result: TestStruct = serde_json::from_str(r#"{"string_field": "   "}"#).unwrap();
        assert_eq!(result.string_field, None);
    }

    #[test]
    fn test_deserialize_optional_string_value() {
        let result: TestStruct = serde_json::from_str(r#"{"string_field": " hello "}"#).unwrap();
        assert_eq!(result.string_field, Some("hello".to_string()));
    }

    #[test]
    fn test_patch_field_absent_is_unchanged() {
        let result: TestStruct = serde_json::from_str("{}").unwrap();
        assert_eq!(result.patch_field, None);
    }

    #[test]
    fn test_patch_field_null_clears() {
        let result: TestStruct = serde_json::from_str(r#"{"patch_field": null}"#).unwrap();
        assert_eq!(result.patch_field, Some(None));
    }

    #[test]
    fn test_patch_field_value_sets() {
        let result: TestStruct = serde_json::from_str(r#"{"patch_field": "books"}"#).unwrap();
        assert_eq!(result.patch_field, Some(Some("books".to_string())));
    }
}

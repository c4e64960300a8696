//! Serialized form of the flag table and validator registry.
//!
//! The flag table is a JSON array of [`FlagRecord`]s. Value schemas use a
//! compact encoding that is normalized into [`ValueNode`] trees once, when
//! the record is converted:
//!
//! | JSON | Node |
//! |------|------|
//! | `null` / missing | [`ValueNode::Empty`] |
//! | `"name"` in a value slot | [`ValueNode::Validator`] |
//! | `"text"` inside `one_of` / `any_of` | [`ValueNode::Literal`] |
//! | `{"literal": "x"}` | [`ValueNode::Literal`] |
//! | `{"validator": "name"}` | [`ValueNode::Validator`] |
//! | `{"one_of": [..]}` / `{"any_of": [..]}` | [`ValueNode::OneOf`] / [`ValueNode::AnyOf`] |
//! | `{"list": node, "delimiter": ","}` | [`ValueNode::List`] |
//!
//! A value slot is the record's `values` field or a list's element.
//!
//! # Examples
//!
//! ```
//! use sbatch_lint_core::{FlagRecord, ValueNode};
//!
//! let record: FlagRecord = serde_json::from_str(
//!     r#"{"long": "open-mode", "short": null, "values": {"one_of": ["append", "truncate"]}}"#,
//! ).unwrap();
//! let flag = record.into_descriptor().unwrap();
//! assert_eq!(
//!     flag.values,
//!     ValueNode::one_of(vec![ValueNode::literal("append"), ValueNode::literal("truncate")])
//! );
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::builtins::Builtin;
use crate::error::SchemaError;
use crate::registry::{Validator, ValidatorRegistry};
use crate::types::{DEFAULT_LIST_DELIMITER, FlagDescriptor, ValueNode};

/// One entry of the flag table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagRecord {
    /// Long name without dashes.
    #[serde(default)]
    pub long: Option<String>,
    /// Short name without the dash.
    #[serde(default)]
    pub short: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Encoded value schema.
    #[serde(default)]
    pub values: Value,
}

impl FlagRecord {
    /// Normalizes the record into a [`FlagDescriptor`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingFlagName`] when both names are absent and
    /// [`SchemaError::InvalidValueSchema`] when `values` is malformed.
    pub fn into_descriptor(self) -> Result<FlagDescriptor, SchemaError> {
        let label = match (&self.long, &self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => return Err(SchemaError::MissingFlagName),
        };
        let values = value_slot(&self.values, &label)?;
        Ok(FlagDescriptor {
            long: self.long,
            short: self.short,
            description: self.description,
            values,
        })
    }
}

/// One entry of the validator table: either a bare regular expression or a
/// detailed rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidatorSpec {
    /// Regular expression matched against the whole value.
    Pattern(String),
    /// Detailed rule.
    Rule(ValidatorRule),
}

/// Detailed validator rule: exactly one of `pattern` or `builtin`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Validator table keyed by validator name.
pub type ValidatorTable = BTreeMap<String, ValidatorSpec>;

/// Builds a registry from the builtins plus every entry of `table`.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidPattern`], [`SchemaError::UnknownBuiltin`]
/// or [`SchemaError::InvalidValidatorRule`] for malformed entries.
pub fn registry_from_table(table: &ValidatorTable) -> Result<ValidatorRegistry, SchemaError> {
    let mut registry = ValidatorRegistry::new();

    for (name, spec) in table {
        match spec {
            ValidatorSpec::Pattern(pattern) => registry.register_pattern(name, pattern)?,
            ValidatorSpec::Rule(rule) => {
                let validator = match (&rule.pattern, &rule.builtin) {
                    (Some(pattern), None) => Validator::pattern(name, pattern)?,
                    (None, Some(builtin)) => Builtin::from_name(builtin)
                        .map(Validator::Builtin)
                        .ok_or_else(|| SchemaError::UnknownBuiltin {
                            name: name.clone(),
                            builtin: builtin.clone(),
                        })?,
                    _ => return Err(SchemaError::InvalidValidatorRule(name.clone())),
                };
                registry.register(name.as_str(), validator);
                if let Some(description) = &rule.description {
                    registry.describe(name, description.as_str());
                }
            }
        }
    }

    Ok(registry)
}

fn invalid(flag: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidValueSchema {
        flag: flag.to_string(),
        reason: reason.into(),
    }
}

fn value_slot(value: &Value, flag: &str) -> Result<ValueNode, SchemaError> {
    match value {
        Value::String(name) => Ok(ValueNode::Validator(name.clone())),
        other => node(other, flag),
    }
}

fn alternative(value: &Value, flag: &str) -> Result<ValueNode, SchemaError> {
    match value {
        Value::String(text) => Ok(ValueNode::Literal(text.clone())),
        other => node(other, flag),
    }
}

fn node(value: &Value, flag: &str) -> Result<ValueNode, SchemaError> {
    match value {
        Value::Null => Ok(ValueNode::Empty),
        Value::String(name) => Ok(ValueNode::Validator(name.clone())),
        Value::Object(map) => object_node(map, flag),
        Value::Bool(_) => Err(invalid(flag, "unexpected boolean")),
        Value::Number(_) => Err(invalid(flag, "unexpected number")),
        Value::Array(_) => Err(invalid(
            flag,
            "bare array; wrap alternatives in one_of or any_of",
        )),
    }
}

fn object_node(map: &Map<String, Value>, flag: &str) -> Result<ValueNode, SchemaError> {
    if let Some(element) = map.get("list") {
        return list_node(map, element, flag);
    }
    if map.len() != 1 {
        return Err(invalid(flag, "expected exactly one key per node"));
    }
    let Some((key, inner)) = map.iter().next() else {
        return Err(invalid(flag, "empty node"));
    };

    match key.as_str() {
        "literal" => match inner {
            Value::String(text) => Ok(ValueNode::Literal(text.clone())),
            _ => Err(invalid(flag, "literal must be a string")),
        },
        "validator" => match inner {
            Value::String(name) => Ok(ValueNode::Validator(name.clone())),
            _ => Err(invalid(flag, "validator must be a string")),
        },
        "one_of" => Ok(ValueNode::OneOf(alternatives(inner, key, flag)?)),
        "any_of" => Ok(ValueNode::AnyOf(alternatives(inner, key, flag)?)),
        other => Err(invalid(flag, format!("unknown node kind: {other}"))),
    }
}

fn alternatives(value: &Value, key: &str, flag: &str) -> Result<Vec<ValueNode>, SchemaError> {
    let Value::Array(items) = value else {
        return Err(invalid(flag, format!("{key} must be an array")));
    };
    if items.is_empty() {
        return Err(invalid(flag, format!("{key} must not be empty")));
    }
    items.iter().map(|item| alternative(item, flag)).collect()
}

fn list_node(map: &Map<String, Value>, element: &Value, flag: &str) -> Result<ValueNode, SchemaError> {
    if let Some(extra) = map.keys().find(|key| !matches!(key.as_str(), "list" | "delimiter")) {
        return Err(invalid(flag, format!("unexpected key in list node: {extra}")));
    }

    let delimiter = match map.get("delimiter") {
        None => DEFAULT_LIST_DELIMITER,
        Some(Value::String(text)) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => ch,
                _ => return Err(invalid(flag, "list delimiter must be a single character")),
            }
        }
        Some(_) => return Err(invalid(flag, "list delimiter must be a string")),
    };

    Ok(ValueNode::list_with(value_slot(element, flag)?, delimiter))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> FlagRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_values_is_empty() {
        let flag = record(r#"{"long": "hold", "short": "H"}"#)
            .into_descriptor()
            .unwrap();
        assert_eq!(flag.values, ValueNode::Empty);
    }

    #[test]
    fn test_top_level_string_is_validator() {
        let flag = record(r#"{"long": "time", "values": "duration"}"#)
            .into_descriptor()
            .unwrap();
        assert_eq!(flag.values, ValueNode::validator("duration"));
    }

    #[test]
    fn test_strings_inside_alternatives_become_literals() {
        let flag = record(
            r#"{"long": "exclusive", "values": {"any_of": [null, {"one_of": ["user", "mcs"]}]}}"#,
        )
        .into_descriptor()
        .unwrap();
        assert_eq!(
            flag.values,
            ValueNode::any_of(vec![
                ValueNode::Empty,
                ValueNode::one_of(vec![ValueNode::literal("user"), ValueNode::literal("mcs")]),
            ])
        );
    }

    #[test]
    fn test_list_element_string_is_validator() {
        let flag = record(r#"{"long": "partition", "values": {"list": "word", "delimiter": ","}}"#)
            .into_descriptor()
            .unwrap();
        assert_eq!(flag.values, ValueNode::list(ValueNode::validator("word")));
    }

    #[test]
    fn test_explicit_validator_inside_alternatives() {
        let flag = record(r#"{"long": "begin", "values": {"any_of": ["now", {"validator": "datetime"}]}}"#)
            .into_descriptor()
            .unwrap();
        assert_eq!(
            flag.values,
            ValueNode::any_of(vec![ValueNode::literal("now"), ValueNode::validator("datetime")])
        );
    }

    #[test]
    fn test_missing_names_rejected() {
        let err = record(r#"{"values": null}"#).into_descriptor().unwrap_err();
        assert!(matches!(err, SchemaError::MissingFlagName));
    }

    #[test]
    fn test_malformed_nodes_rejected() {
        for values in [
            r#"{"one_of": []}"#,
            r#"{"list": "word", "delimiter": ",;"}"#,
            r#"{"list": "word", "extra": 1}"#,
            r#"{"literal": 3}"#,
            r#"{"sequence": ["a"]}"#,
            r#"["a", "b"]"#,
            r#"true"#,
        ] {
            let json = format!(r#"{{"long": "x", "values": {values}}}"#);
            let err = record(&json).into_descriptor().unwrap_err();
            assert!(
                matches!(err, SchemaError::InvalidValueSchema { .. }),
                "{values} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn test_registry_from_table() {
        let table: ValidatorTable = serde_json::from_str(
            r#"{
                "integer": "[0-9]+",
                "memory": {"pattern": "[0-9]+[KMGT]?", "description": "memory size"},
                "time_limit": {"builtin": "duration"}
            }"#,
        )
        .unwrap();
        let registry = registry_from_table(&table).unwrap();
        assert!(registry.accepts("integer", "12"));
        assert!(registry.accepts("memory", "16G"));
        assert_eq!(registry.description("memory"), "memory size");
        assert!(registry.accepts("time_limit", "1-00:00:00"));
        assert!(registry.contains("duration"));
    }

    #[test]
    fn test_registry_rejects_bad_rules() {
        let table: ValidatorTable =
            serde_json::from_str(r#"{"x": {"builtin": "teleport"}}"#).unwrap();
        assert!(matches!(
            registry_from_table(&table),
            Err(SchemaError::UnknownBuiltin { .. })
        ));

        let table: ValidatorTable =
            serde_json::from_str(r#"{"x": {"pattern": "a", "builtin": "duration"}}"#).unwrap();
        assert!(matches!(
            registry_from_table(&table),
            Err(SchemaError::InvalidValidatorRule(_))
        ));
    }
}

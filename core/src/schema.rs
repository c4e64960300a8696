//! The loaded schema: flag index plus validator registry.

use tracing::debug;

use crate::error::SchemaError;
use crate::index::FlagIndex;
use crate::registry::ValidatorRegistry;
use crate::table::{FlagRecord, ValidatorTable, registry_from_table};
use crate::types::{FlagDescriptor, ValueNode};

/// Immutable schema shared by every validation pass.
///
/// Construction checks that every validator referenced by a flag is
/// registered, so validation never meets an unknown name.
///
/// # Examples
///
/// ```
/// use sbatch_lint_core::{FlagDescriptor, Schema, ValidatorRegistry, ValueNode};
///
/// let schema = Schema::new(
///     vec![FlagDescriptor::new(Some("time"), Some("t"), ValueNode::validator("duration"))],
///     ValidatorRegistry::new(),
/// )
/// .unwrap();
/// assert_eq!(schema.index().len(), 1);
///
/// let broken = Schema::new(
///     vec![FlagDescriptor::new(Some("mem"), None, ValueNode::validator("memory"))],
///     ValidatorRegistry::new(),
/// );
/// assert!(broken.is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    index: FlagIndex,
    validators: ValidatorRegistry,
}

impl Schema {
    /// Builds a schema from descriptors and a registry.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownValidator`] when a value schema names a
    /// validator missing from `validators`, or any error from
    /// [`FlagIndex::build`].
    pub fn new(flags: Vec<FlagDescriptor>, validators: ValidatorRegistry) -> Result<Self, SchemaError> {
        for flag in &flags {
            if let Some(missing) = flag
                .values
                .validator_names()
                .into_iter()
                .find(|name| !validators.contains(name))
            {
                return Err(SchemaError::UnknownValidator {
                    flag: flag.canonical_name(),
                    validator: missing.to_string(),
                });
            }
        }

        let index = FlagIndex::build(flags)?;
        debug!(
            flags = index.len(),
            validators = validators.len(),
            "Built directive schema"
        );
        Ok(Self { index, validators })
    }

    /// Builds a schema from the deserialized flag and validator tables.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found while normalizing records,
    /// compiling validators, or indexing flags.
    pub fn from_tables(records: Vec<FlagRecord>, validators: &ValidatorTable) -> Result<Self, SchemaError> {
        let registry = registry_from_table(validators)?;
        let flags = records
            .into_iter()
            .map(FlagRecord::into_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(flags, registry)
    }

    /// The flag index.
    pub fn index(&self) -> &FlagIndex {
        &self.index
    }

    /// The validator registry.
    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    /// Describes `node` using validator descriptions from the registry.
    pub fn expected(&self, node: &ValueNode) -> String {
        node.describe_with(&|name| self.validators.description(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_validator_names_flag() {
        let err = Schema::new(
            vec![FlagDescriptor::new(
                Some("partition"),
                Some("p"),
                ValueNode::list(ValueNode::validator("word")),
            )],
            ValidatorRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownValidator { ref flag, ref validator }
                if flag == "--partition" && validator == "word"
        ));
    }

    #[test]
    fn test_from_tables() {
        let records: Vec<FlagRecord> = serde_json::from_str(
            r#"[
                {"long": "time", "short": "t", "values": "duration"},
                {"long": "partition", "short": "p", "values": {"list": "word"}},
                {"long": null, "short": "H"}
            ]"#,
        )
        .unwrap();
        let validators: ValidatorTable =
            serde_json::from_str(r#"{"word": {"pattern": "[A-Za-z0-9_]+", "description": "word"}}"#)
                .unwrap();

        let schema = Schema::from_tables(records, &validators).unwrap();
        assert_eq!(schema.index().len(), 3);
        assert!(schema.index().get_short("H").is_some());

        let partition = schema.index().get_long("partition").unwrap();
        assert_eq!(schema.expected(&partition.values), "','-separated list of word");
    }

    #[test]
    fn test_expected_uses_builtin_descriptions() {
        let schema = Schema::new(Vec::new(), ValidatorRegistry::new()).unwrap();
        assert_eq!(
            schema.expected(&ValueNode::validator("number_list")),
            "number list (e.g. 1,2,4-6)"
        );
    }
}

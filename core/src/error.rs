//! Schema construction errors.
//!
//! These describe defects in the static flag table or validator registry.
//! They surface once, when a [`Schema`](crate::Schema) is built, and never
//! while validating lines.

use thiserror::Error;

/// Errors raised while building a schema from its tables.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A flag record has neither a long nor a short name.
    #[error("flag must define a long or short name")]
    MissingFlagName,

    /// A flag name is empty, starts with a dash, or contains `=` or a space.
    #[error("invalid flag name: {0:?}")]
    InvalidFlagName(String),

    /// Two flags share the same long name.
    #[error("duplicate long flag: --{0}")]
    DuplicateLongName(String),

    /// Two flags share the same short name.
    #[error("duplicate short flag: -{0}")]
    DuplicateShortName(String),

    /// A flag's value schema references a validator that is not registered.
    #[error("flag {flag} references unknown validator: {validator}")]
    UnknownValidator { flag: String, validator: String },

    /// A validator rule names a builtin that does not exist.
    #[error("validator {name} references unknown builtin: {builtin}")]
    UnknownBuiltin { name: String, builtin: String },

    /// A validator pattern is not a valid regular expression.
    #[error("validator {name} has an invalid pattern: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// A validator rule defines neither or both of `pattern` and `builtin`.
    #[error("validator {0} must define exactly one of `pattern` or `builtin`")]
    InvalidValidatorRule(String),

    /// A value schema node has an unrecognized shape.
    #[error("flag {flag} has an invalid value schema: {reason}")]
    InvalidValueSchema { flag: String, reason: String },

    /// The directive tag is empty.
    #[error("directive tag cannot be empty")]
    EmptyDirectiveTag,
}

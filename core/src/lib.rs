//! Validation of `#SBATCH` directive lines embedded in shell scripts.
//!
//! A directive line is split into slots by the [`DirectiveParser`]:
//!
//! ```text
//! #SBATCH --time=01:00:00
//! ^^^^^^^ ^^ ^^^^^^^^^^^^^
//! tag     |  flag, separator, value
//!         dashes
//! ```
//!
//! The flag token is resolved through a [`FlagIndex`] built once from the
//! flag table, the dash style is checked against the names the flag defines,
//! and the value is matched against the flag's [`ValueNode`] tree with
//! [`check`]. Every problem becomes a positioned [`Diagnostic`].
//!
//! - [`Schema`] — immutable flag index plus [`ValidatorRegistry`], built from
//!   [`FlagRecord`] and [`ValidatorTable`] tables or programmatically.
//! - [`Linter`] — the document entry point; publishes to a
//!   [`DiagnosticSink`].
//!
//! # Example
//!
//! ```
//! use sbatch_lint_core::*;
//!
//! let mut registry = ValidatorRegistry::new();
//! registry.register_pattern("memory", "[0-9]+[KMGT]?").unwrap();
//!
//! let schema = Schema::new(
//!     vec![
//!         FlagDescriptor::new(Some("time"), Some("t"), ValueNode::validator("duration")),
//!         FlagDescriptor::new(Some("mem"), None, ValueNode::validator("memory")),
//!     ],
//!     registry,
//! )
//! .unwrap();
//! let linter = Linter::new(schema);
//!
//! assert!(linter.validate_line("#SBATCH --time=01:00:00").is_empty());
//!
//! let found = linter.validate_line("#SBATCH -mem=4G");
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].message, "-- required for long flag: mem");
//! ```

mod builtins;
mod diagnostic;
mod error;
mod index;
mod lint;
mod parse;
mod registry;
mod resolve;
mod schema;
mod table;
mod types;
mod value;

pub use builtins::Builtin;
pub use diagnostic::{Diagnostic, LineDiagnostic, Rule, Severity, Span};
pub use error::SchemaError;
pub use index::{FlagIndex, Resolution};
pub use lint::{DEFAULT_EXTENSION, DiagnosticCollection, DiagnosticSink, Document, Linter};
pub use parse::{DashStyle, DirectiveParser, ParsedLine};
pub use registry::{Validator, ValidatorRegistry};
pub use resolve::{Resolved, resolve_and_check};
pub use schema::Schema;
pub use table::{FlagRecord, ValidatorRule, ValidatorSpec, ValidatorTable, registry_from_table};
pub use types::*;
pub use value::{Mismatch, check, check_value, validate};

//! Schema table loading and lint configuration for `#SBATCH` validation.
//!
//! This crate turns the two static tables that drive validation, the flag
//! table and the validator table, into a ready [`Schema`](sbatch_lint_core::Schema).
//! Tables can come from a directory, from explicit files, or from the Slurm
//! tables bundled into the crate, optionally chained with fallbacks.
//!
//! # Quick start
//!
//! ```
//! use sbatch_lint_db::{LintConfig, SchemaDatabase};
//!
//! let db = SchemaDatabase::builder()
//!     .from_dir("/etc/sbatch-lint/schema")
//!     .with_bundled()
//!     .build()
//!     .unwrap();
//!
//! let linter = LintConfig::default().linter(&db).unwrap();
//! assert!(linter.validate_line("#SBATCH --nodes=2").is_empty());
//! assert_eq!(linter.validate_line("#SBATCH --nodes=two").len(), 1);
//! ```

mod config;
mod error;
mod loader;

pub use config::{CONFIG_VERSION, LintConfig, SchemaConfig};
pub use error::{DatabaseError, Result};
pub use loader::{DatabaseBuilder, DatabaseSource, FLAGS_FILE, SchemaDatabase, VALIDATORS_FILE};

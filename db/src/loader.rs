//! Schema loading with builder pattern and fallback chains.
//!
//! A schema is described by two JSON tables: `flags.json`, an array of
//! [`FlagRecord`]s, and `validators.json`, a [`ValidatorTable`]. They can be
//! loaded from a directory, from two explicit files, or from the copy of the
//! Slurm tables compiled into this crate.
//!
//! # Loading patterns
//!
//! ```no_run
//! use sbatch_lint_db::SchemaDatabase;
//!
//! // Tables shipped with the crate
//! let db = SchemaDatabase::bundled().unwrap();
//! assert!(db.get("--time").is_some());
//!
//! // A directory holding flags.json and validators.json
//! let db = SchemaDatabase::from_dir("site-schema/").unwrap();
//!
//! // Site tables when present, bundled tables otherwise
//! let db = SchemaDatabase::builder()
//!     .from_dir("site-schema/")
//!     .with_bundled()
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sbatch_lint_core::{FlagDescriptor, FlagRecord, Schema, ValidatorTable};
use tracing::{debug, warn};

use crate::error::{DatabaseError, Result};

/// File name of the flag table inside a schema directory.
pub const FLAGS_FILE: &str = "flags.json";
/// File name of the validator table inside a schema directory.
pub const VALIDATORS_FILE: &str = "validators.json";

const BUNDLED_FLAGS: &str = include_str!("../schemas/flags.json");
const BUNDLED_VALIDATORS: &str = include_str!("../schemas/validators.json");

/// Describes where a [`SchemaDatabase`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSource {
    /// A directory holding [`FLAGS_FILE`] and optionally [`VALIDATORS_FILE`].
    Directory(PathBuf),
    /// Explicit flag and validator table files.
    Files { flags: PathBuf, validators: PathBuf },
    /// The tables compiled into the crate.
    Bundled,
    /// Loaded via a fallback chain; `loaded` is the source that succeeded.
    Multiple {
        tried: Vec<DatabaseSource>,
        loaded: Box<DatabaseSource>,
    },
}

impl fmt::Display for DatabaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "directory {}", path.display()),
            Self::Files { flags, validators } => {
                write!(f, "files {} + {}", flags.display(), validators.display())
            }
            Self::Bundled => write!(f, "bundled tables"),
            Self::Multiple { loaded, .. } => write!(f, "{loaded} (via fallback chain)"),
        }
    }
}

/// A loaded, validated [`Schema`] together with where it came from.
///
/// The schema sits behind an [`Arc`] so linters running on several threads
/// can share it without copying the index.
///
/// # Examples
///
/// ```
/// use sbatch_lint_db::{DatabaseSource, SchemaDatabase};
///
/// let db = SchemaDatabase::bundled().unwrap();
/// assert_eq!(db.source(), &DatabaseSource::Bundled);
/// assert!(db.len() > 50);
///
/// let time = db.get("-t").unwrap();
/// assert_eq!(time.canonical_name(), "--time");
/// ```
#[derive(Debug, Clone)]
pub struct SchemaDatabase {
    schema: Arc<Schema>,
    source: DatabaseSource,
}

impl SchemaDatabase {
    /// Returns a new [`DatabaseBuilder`] for configuring a fallback chain.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Loads `flags.json` and, when present, `validators.json` from `path`.
    ///
    /// A missing validator table means only the builtin validators are
    /// available.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IoError`] if the flag table cannot be read,
    /// [`DatabaseError::JsonError`] if either table is malformed, or
    /// [`DatabaseError::SchemaError`] if the tables are inconsistent.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let flags = std::fs::read_to_string(path.join(FLAGS_FILE))?;
        let validators = match std::fs::read_to_string(path.join(VALIDATORS_FILE)) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %path.display(), "No validator table, using builtins only");
                None
            }
            Err(err) => return Err(err.into()),
        };

        Self::from_json(
            &flags,
            validators.as_deref(),
            DatabaseSource::Directory(path.to_path_buf()),
        )
    }

    /// Loads the flag and validator tables from two explicit files.
    ///
    /// # Errors
    ///
    /// Same as [`from_dir`](Self::from_dir), except that both files must
    /// exist.
    pub fn from_files(flags: impl AsRef<Path>, validators: impl AsRef<Path>) -> Result<Self> {
        let (flags, validators) = (flags.as_ref(), validators.as_ref());
        let flags_text = std::fs::read_to_string(flags)?;
        let validators_text = std::fs::read_to_string(validators)?;

        Self::from_json(
            &flags_text,
            Some(&validators_text),
            DatabaseSource::Files {
                flags: flags.to_path_buf(),
                validators: validators.to_path_buf(),
            },
        )
    }

    /// Loads the Slurm tables compiled into the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded tables are broken, which the crate's tests
    /// rule out.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_FLAGS, Some(BUNDLED_VALIDATORS), DatabaseSource::Bundled)
    }

    /// Builds a database from table text.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::JsonError`] or [`DatabaseError::SchemaError`].
    pub fn from_json(flags: &str, validators: Option<&str>, source: DatabaseSource) -> Result<Self> {
        let records: Vec<FlagRecord> = serde_json::from_str(flags)?;
        let table: ValidatorTable = match validators {
            Some(text) => serde_json::from_str(text)?,
            None => ValidatorTable::new(),
        };
        let schema = Schema::from_tables(records, &table)?;

        debug!(
            source = %source,
            flags = schema.index().len(),
            validators = schema.validators().len(),
            "Loaded schema tables"
        );
        Ok(Self {
            schema: Arc::new(schema),
            source,
        })
    }

    /// The loaded schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A shared handle to the schema, for building linters.
    pub fn shared(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Looks up a flag as written in a directive: `--time`, `-t`, or a bare
    /// name.
    pub fn get(&self, written: &str) -> Option<&FlagDescriptor> {
        self.schema.index().find(written)
    }

    /// Returns the number of flags in the schema.
    pub fn len(&self) -> usize {
        self.schema.index().len()
    }

    /// Returns `true` if the schema defines no flags.
    pub fn is_empty(&self) -> bool {
        self.schema.index().is_empty()
    }

    /// Returns an iterator over the flags in table order.
    pub fn flags(&self) -> impl Iterator<Item = &FlagDescriptor> {
        self.schema.index().flags()
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &DatabaseSource {
        &self.source
    }
}

/// Builder for constructing a [`SchemaDatabase`] with a fallback chain.
///
/// Sources are tried in the order they are added. A source that does not
/// exist is skipped with a warning; a source that exists but fails to load
/// stops the chain with its error, so a broken site table is never silently
/// replaced by the bundled one. If every source is missing,
/// [`DatabaseError::NoSourcesAvailable`] is returned.
///
/// # Example
///
/// ```
/// use sbatch_lint_db::SchemaDatabase;
///
/// let db = SchemaDatabase::builder()
///     .from_dir("/nonexistent/site-schema")
///     .with_bundled()
///     .build()
///     .unwrap();
/// assert!(db.get("--partition").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    sources: Vec<DatabaseSource>,
}

impl DatabaseBuilder {
    /// Creates a new builder with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the bundled tables as a source.
    pub fn with_bundled(mut self) -> Self {
        self.sources.push(DatabaseSource::Bundled);
        self
    }

    /// Adds a schema directory as a source.
    pub fn from_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DatabaseSource::Directory(path.into()));
        self
    }

    /// Adds a pair of explicit table files as a source.
    pub fn from_files(mut self, flags: impl Into<PathBuf>, validators: impl Into<PathBuf>) -> Self {
        self.sources.push(DatabaseSource::Files {
            flags: flags.into(),
            validators: validators.into(),
        });
        self
    }

    /// Loads from the first source that exists.
    ///
    /// # Errors
    ///
    /// Returns the load error of the first existing source that fails, or
    /// [`DatabaseError::NoSourcesAvailable`] when no source exists.
    pub fn build(self) -> Result<SchemaDatabase> {
        for source in &self.sources {
            let result = match source {
                DatabaseSource::Directory(path) => SchemaDatabase::from_dir(path),
                DatabaseSource::Files { flags, validators } => {
                    SchemaDatabase::from_files(flags, validators)
                }
                DatabaseSource::Bundled => SchemaDatabase::bundled(),
                DatabaseSource::Multiple { .. } => continue,
            };

            match result {
                Ok(mut db) => {
                    if self.sources.len() > 1 {
                        db.source = DatabaseSource::Multiple {
                            tried: self.sources.clone(),
                            loaded: Box::new(db.source),
                        };
                    }
                    return Ok(db);
                }
                Err(err) if err.is_missing_source() => {
                    warn!(source = %source, "Schema source missing, trying next");
                }
                Err(err) => return Err(err),
            }
        }

        let tried = self
            .sources
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(DatabaseError::NoSourcesAvailable(if tried.is_empty() {
            "none configured".to_string()
        } else {
            tried
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLAGS: &str = r#"[
        {"long": "time", "short": "t", "values": "duration"},
        {"long": "partition", "short": "p", "values": {"list": "word"}},
        {"long": "hold", "short": "H"}
    ]"#;
    const VALIDATORS: &str = r#"{"word": "[A-Za-z0-9_]+"}"#;

    fn write_tables(dir: &Path, validators: Option<&str>) {
        std::fs::write(dir.join(FLAGS_FILE), FLAGS).unwrap();
        if let Some(validators) = validators {
            std::fs::write(dir.join(VALIDATORS_FILE), validators).unwrap();
        }
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path(), Some(VALIDATORS));

        let db = SchemaDatabase::from_dir(dir.path()).unwrap();
        assert_eq!(db.len(), 3);
        assert!(db.get("--partition").is_some());
        assert!(db.get("-H").is_some());
        assert_eq!(db.source(), &DatabaseSource::Directory(dir.path().to_path_buf()));
    }

    #[test]
    fn test_from_dir_without_validators_uses_builtins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(FLAGS_FILE),
            r#"[{"long": "time", "short": "t", "values": "duration"}]"#,
        )
        .unwrap();

        let db = SchemaDatabase::from_dir(dir.path()).unwrap();
        assert!(db.schema().validators().accepts("duration", "1:00:00"));
    }

    #[test]
    fn test_from_dir_reports_unknown_validator() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path(), None);

        let err = SchemaDatabase::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DatabaseError::SchemaError(_)), "got {err:?}");
    }

    #[test]
    fn test_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let flags = dir.path().join("site-flags.json");
        let validators = dir.path().join("site-validators.json");
        std::fs::write(&flags, FLAGS).unwrap();
        std::fs::write(&validators, VALIDATORS).unwrap();

        let db = SchemaDatabase::from_files(&flags, &validators).unwrap();
        assert_eq!(db.len(), 3);
        assert!(matches!(db.source(), DatabaseSource::Files { .. }));
    }

    #[test]
    fn test_bundled_tables_load() {
        let db = SchemaDatabase::bundled().unwrap();
        assert!(!db.is_empty());
        for name in ["--time", "-N", "--mail-type", "--exclusive", "-p", "--gres"] {
            assert!(db.get(name).is_some(), "{name} missing from bundled tables");
        }
    }

    #[test]
    fn test_builder_first_source_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path(), Some(VALIDATORS));

        let db = SchemaDatabase::builder()
            .from_dir(dir.path())
            .with_bundled()
            .build()
            .unwrap();
        assert_eq!(db.len(), 3);
        let DatabaseSource::Multiple { tried, loaded } = db.source() else {
            panic!("expected a chained source");
        };
        assert_eq!(tried.len(), 2);
        assert!(matches!(**loaded, DatabaseSource::Directory(_)));
    }

    #[test]
    fn test_builder_skips_missing_sources() {
        let db = SchemaDatabase::builder()
            .from_dir("/nonexistent/sbatch-schema")
            .from_files("/nonexistent/flags.json", "/nonexistent/validators.json")
            .with_bundled()
            .build()
            .unwrap();
        let DatabaseSource::Multiple { loaded, .. } = db.source() else {
            panic!("expected a chained source");
        };
        assert_eq!(**loaded, DatabaseSource::Bundled);
    }

    #[test]
    fn test_builder_stops_on_malformed_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FLAGS_FILE), "{not json").unwrap();

        let result = SchemaDatabase::builder()
            .from_dir(dir.path())
            .with_bundled()
            .build();
        assert!(matches!(result, Err(DatabaseError::JsonError(_))));
    }

    #[test]
    fn test_builder_all_missing() {
        let err = SchemaDatabase::builder()
            .from_dir("/nonexistent/dir1")
            .from_dir("/nonexistent/dir2")
            .build()
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NoSourcesAvailable(_)));
        assert!(err.to_string().contains("/nonexistent/dir2"));

        let err = SchemaDatabase::builder().build().unwrap_err();
        assert!(err.to_string().contains("none configured"));
    }
}

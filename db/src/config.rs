//! Lint configuration.
//!
//! A YAML file, conventionally `.sbatch-lint.yml` at the repository root,
//! selects the directive tag, the file extensions to validate and where the
//! schema tables live. Every field is optional.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! tag: "#SBATCH"
//! extensions: [sh, slurm]
//! schema:
//!   dir: site-schema/
//! ```
//!
//! Relative schema paths are resolved against the directory holding the
//! configuration file.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use sbatch_lint_core::{DEFAULT_EXTENSION, DIRECTIVE_TAG, DirectiveParser, Linter};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::loader::SchemaDatabase;

/// Current configuration format version.
pub const CONFIG_VERSION: &str = "1.0";

/// Where the flag and validator tables come from.
///
/// With nothing set the bundled tables are used. Explicit `flags` and
/// `validators` files must be given together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory holding `flags.json` and `validators.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Explicit flag table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<PathBuf>,
    /// Explicit validator table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validators: Option<PathBuf>,
}

impl SchemaConfig {
    /// Returns `true` if no source is configured.
    pub fn is_empty(&self) -> bool {
        self.dir.is_none() && self.flags.is_none() && self.validators.is_none()
    }

    fn resolve_against(&mut self, base: &Path) {
        for path in [&mut self.dir, &mut self.flags, &mut self.validators]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Top-level lint configuration.
///
/// # Examples
///
/// ```
/// use sbatch_lint_db::LintConfig;
///
/// let config: LintConfig = serde_yaml::from_str("extensions: [sh, slurm]").unwrap();
/// assert_eq!(config.tag, "#SBATCH");
/// assert_eq!(config.extensions, vec!["sh", "slurm"]);
/// assert!(config.schema.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Directive tag that starts a checked line.
    pub tag: String,
    /// File extensions to validate, without the leading dot.
    pub extensions: Vec<String>,
    /// Schema table location.
    pub schema: SchemaConfig,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            tag: DIRECTIVE_TAG.to_string(),
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            schema: SchemaConfig::default(),
        }
    }
}

impl LintConfig {
    /// Conventional configuration file name.
    pub const FILE_NAME: &'static str = ".sbatch-lint.yml";

    /// Loads and validates configuration from a YAML file.
    ///
    /// Relative schema paths are made absolute against the file's parent
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DatabaseError::IoError) if the file cannot be
    /// read, [`YamlError`](DatabaseError::YamlError) if parsing fails, or
    /// [`InvalidConfig`](DatabaseError::InvalidConfig) if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: Self = serde_yaml::from_reader(reader)?;

        if let Some(base) = path.parent() {
            config.schema.resolve_against(base);
        }
        config.validate()?;
        debug!(path = %path.display(), "Loaded lint configuration");
        Ok(config)
    }

    /// Looks for [`FILE_NAME`](Self::FILE_NAME) in `dir` and its ancestors.
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        dir.as_ref()
            .ancestors()
            .map(|ancestor| ancestor.join(Self::FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](DatabaseError::IoError) if the file cannot be
    /// written, or [`YamlError`](DatabaseError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks the configuration for values the linter cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](DatabaseError::InvalidConfig) naming the
    /// first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.tag.is_empty() {
            return Err(DatabaseError::InvalidConfig("tag must not be empty".into()));
        }
        if self.tag.chars().any(char::is_whitespace) {
            return Err(DatabaseError::InvalidConfig(format!(
                "tag must not contain whitespace: {:?}",
                self.tag
            )));
        }
        if self.extensions.is_empty() {
            return Err(DatabaseError::InvalidConfig(
                "at least one extension is required".into(),
            ));
        }
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|ext| ext.trim_start_matches('.').is_empty())
        {
            return Err(DatabaseError::InvalidConfig(format!(
                "invalid extension: {bad:?}"
            )));
        }
        if self.schema.flags.is_some() != self.schema.validators.is_some() {
            return Err(DatabaseError::InvalidConfig(
                "schema.flags and schema.validators must be given together".into(),
            ));
        }
        Ok(())
    }

    /// Loads the configured schema.
    ///
    /// Explicit files are tried first, then the schema directory, then the
    /// bundled tables. Missing sources fall through; malformed ones fail.
    ///
    /// # Errors
    ///
    /// Returns any error from [`DatabaseBuilder::build`](crate::DatabaseBuilder::build).
    pub fn database(&self) -> Result<SchemaDatabase> {
        let mut builder = SchemaDatabase::builder();
        if let (Some(flags), Some(validators)) = (&self.schema.flags, &self.schema.validators) {
            builder = builder.from_files(flags, validators);
        }
        if let Some(dir) = &self.schema.dir {
            builder = builder.from_dir(dir);
        }
        builder.with_bundled().build()
    }

    /// Builds a linter over `database` honoring the configured tag and
    /// extensions.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`](DatabaseError::SchemaError) if the tag is
    /// rejected by the parser.
    pub fn linter(&self, database: &SchemaDatabase) -> Result<Linter> {
        let parser = DirectiveParser::new(&self.tag)?;
        Ok(Linter::new(database.shared())
            .with_parser(parser)
            .with_extensions(&self.extensions))
    }
}

//! Named leaf validators referenced by value schemas.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::builtins::Builtin;
use crate::error::SchemaError;

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A single named leaf predicate.
#[derive(Clone)]
pub enum Validator {
    /// Regular expression that must match the whole value.
    Pattern(Regex),
    /// One of the builtin validators.
    Builtin(Builtin),
    /// Host-supplied predicate.
    Custom(Predicate),
}

impl Validator {
    /// Compiles `pattern` anchored to the whole value.
    pub fn pattern(name: &str, pattern: &str) -> Result<Self, SchemaError> {
        Regex::new(&format!("^(?:{pattern})$"))
            .map(Self::Pattern)
            .map_err(|source| SchemaError::InvalidPattern {
                name: name.to_string(),
                source,
            })
    }

    /// Returns `true` if `text` is accepted.
    pub fn accepts(&self, text: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(text),
            Self::Builtin(builtin) => builtin.accepts(text),
            Self::Custom(predicate) => predicate(text),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    validator: Validator,
    description: Option<String>,
}

/// Registry of named validators.
///
/// Every [`Builtin`] is registered under its own name on construction;
/// tables and hosts add or override entries afterwards.
///
/// # Examples
///
/// ```
/// use sbatch_lint_core::ValidatorRegistry;
///
/// let mut registry = ValidatorRegistry::new();
/// registry.register_pattern("memory", r"[0-9]+[KMGT]?").unwrap();
/// assert!(registry.accepts("memory", "4G"));
/// assert!(!registry.accepts("memory", "4 GB"));
/// assert!(registry.accepts("duration", "01:00:00"));
/// ```
#[derive(Debug, Clone)]
pub struct ValidatorRegistry {
    entries: HashMap<String, Entry>,
}

impl ValidatorRegistry {
    /// Creates a registry holding the builtin validators.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for builtin in Builtin::ALL {
            registry.register(builtin.name(), Validator::Builtin(builtin));
        }
        registry
    }

    /// Creates a registry with no validators at all.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers (or replaces) a validator.
    pub fn register(&mut self, name: impl Into<String>, validator: Validator) {
        self.entries.insert(
            name.into(),
            Entry {
                validator,
                description: None,
            },
        );
    }

    /// Registers a regular-expression validator.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidPattern`] if `pattern` does not compile.
    pub fn register_pattern(&mut self, name: &str, pattern: &str) -> Result<(), SchemaError> {
        let validator = Validator::pattern(name, pattern)?;
        self.register(name, validator);
        Ok(())
    }

    /// Registers a host-supplied predicate.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.register(name, Validator::Custom(Arc::new(predicate)));
    }

    /// Attaches a description to an already registered validator.
    pub fn describe(&mut self, name: &str, description: impl Into<String>) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.description = Some(description.into());
        }
    }

    /// Looks up a validator by name.
    pub fn get(&self, name: &str) -> Option<&Validator> {
        self.entries.get(name).map(|entry| &entry.validator)
    }

    /// Returns `true` if a validator is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Runs the named validator; unknown names never match.
    pub fn accepts(&self, name: &str, text: &str) -> bool {
        self.get(name)
            .is_some_and(|validator| validator.accepts(text))
    }

    /// Description for diagnostics, falling back to the builtin text or the
    /// bare name.
    pub fn description(&self, name: &str) -> String {
        match self.entries.get(name) {
            Some(Entry {
                description: Some(description),
                ..
            }) => description.clone(),
            Some(Entry {
                validator: Validator::Builtin(builtin),
                ..
            }) => builtin.description().to_string(),
            _ => name.to_string(),
        }
    }

    /// Returns the number of registered validators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no validators are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

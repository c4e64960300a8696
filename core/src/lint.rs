//! Document-level validation and diagnostic publishing.
//!
//! [`Linter`] is the single entry point hosts call: it validates every line
//! of a document and hands the complete, ordered diagnostic set to a
//! [`DiagnosticSink`], replacing whatever the sink held for that document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::diagnostic::{Diagnostic, LineDiagnostic};
use crate::parse::DirectiveParser;
use crate::resolve::resolve_and_check;
use crate::schema::Schema;
use crate::value::check_value;

/// File extension validated when none is configured.
pub const DEFAULT_EXTENSION: &str = "sh";

/// A document to validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifying path; its extension decides whether it is validated.
    pub path: PathBuf,
    pub text: String,
}

impl Document {
    /// Creates a document.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Receiver of per-document diagnostic sets.
///
/// Each call replaces the document's previous set wholesale.
pub trait DiagnosticSink {
    /// Replaces the diagnostics held for `document`.
    fn publish(&mut self, document: &Path, diagnostics: Vec<LineDiagnostic>);

    /// Drops any diagnostics held for `document`.
    fn clear(&mut self, document: &Path);
}

/// In-memory [`DiagnosticSink`] keyed by document path.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    entries: HashMap<PathBuf, Vec<LineDiagnostic>>,
}

impl DiagnosticCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics currently held for `document`.
    pub fn get(&self, document: &Path) -> Option<&[LineDiagnostic]> {
        self.entries.get(document).map(Vec::as_slice)
    }

    /// Number of documents with a published set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no document has a published set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(document, diagnostics)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[LineDiagnostic])> {
        self.entries
            .iter()
            .map(|(path, diagnostics)| (path.as_path(), diagnostics.as_slice()))
    }
}

impl DiagnosticSink for DiagnosticCollection {
    fn publish(&mut self, document: &Path, diagnostics: Vec<LineDiagnostic>) {
        self.entries.insert(document.to_path_buf(), diagnostics);
    }

    fn clear(&mut self, document: &Path) {
        self.entries.remove(document);
    }
}

/// Validates directive lines against a shared [`Schema`].
///
/// The schema is read-only, so one linter can serve many documents
/// concurrently.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use sbatch_lint_core::{
///     DiagnosticCollection, Document, FlagDescriptor, Linter, Rule, Schema, ValidatorRegistry,
///     ValueNode,
/// };
///
/// let schema = Schema::new(
///     vec![FlagDescriptor::new(Some("time"), Some("t"), ValueNode::validator("duration"))],
///     ValidatorRegistry::new(),
/// )
/// .unwrap();
/// let linter = Linter::new(schema);
///
/// let found = linter.validate_document("#!/bin/bash\n#SBATCH --time=1:00:00\n#SBATCH -x\n");
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].line, 2);
/// assert_eq!(found[0].diagnostic.rule, Rule::UnknownFlag);
///
/// let mut sink = DiagnosticCollection::new();
/// linter.lint(&Document::new("job.sh", "#SBATCH --time=bad\n"), &mut sink);
/// assert_eq!(sink.get(Path::new("job.sh")).unwrap().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Linter {
    schema: Arc<Schema>,
    parser: DirectiveParser,
    extensions: Vec<String>,
    any_extension: bool,
}

impl Linter {
    /// Creates a linter for `#SBATCH` directives in `.sh` files.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            parser: DirectiveParser::default(),
            extensions: vec![DEFAULT_EXTENSION.to_string()],
            any_extension: false,
        }
    }

    /// Uses a parser for a different directive tag.
    pub fn with_parser(mut self, parser: DirectiveParser) -> Self {
        self.parser = parser;
        self
    }

    /// Replaces the validated file extensions (leading dots are ignored).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
            .collect();
        self
    }

    /// Validates every document regardless of its extension, including
    /// paths with none.
    pub fn with_any_extension(mut self) -> Self {
        self.any_extension = true;
        self
    }

    /// The schema in use.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The directive parser in use.
    pub fn parser(&self) -> &DirectiveParser {
        &self.parser
    }

    /// Returns `true` if documents at `path` are validated.
    pub fn applies_to(&self, path: &Path) -> bool {
        self.any_extension
            || path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }

    /// Validates one line. Lines without the directive tag produce nothing.
    pub fn validate_line(&self, line: &str) -> Vec<Diagnostic> {
        let Some(parsed) = self.parser.parse(line) else {
            return Vec::new();
        };

        let mut resolved = resolve_and_check(&parsed, self.schema.index(), self.parser.tag());
        if let Some(flag) = resolved.flag {
            resolved
                .diagnostics
                .extend(check_value(flag, &parsed, &self.schema));
        }
        resolved.diagnostics
    }

    /// Validates every line of `text`, in line order.
    pub fn validate_document(&self, text: &str) -> Vec<LineDiagnostic> {
        // `lines()` keeps a lone trailing `\r` on a final unterminated line.
        text.lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .flat_map(|(line, content)| {
                self.validate_line(content)
                    .into_iter()
                    .map(move |diagnostic| LineDiagnostic { line, diagnostic })
            })
            .collect()
    }

    /// Validates `document` and publishes the result to `sink`.
    ///
    /// Documents whose extension is not validated have their diagnostics
    /// cleared instead.
    pub fn lint(&self, document: &Document, sink: &mut dyn DiagnosticSink) {
        if !self.applies_to(&document.path) {
            debug!(path = %document.path.display(), "Skipping document");
            sink.clear(&document.path);
            return;
        }

        let diagnostics = self.validate_document(&document.text);
        debug!(
            path = %document.path.display(),
            diagnostics = diagnostics.len(),
            "Validated document"
        );
        sink.publish(&document.path, diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlagDescriptor, Rule, Severity, ValidatorRegistry, ValueNode};

    fn hhmmss(text: &str) -> bool {
        let parts: Vec<&str> = text.split(':').collect();
        parts.len() == 3
            && parts
                .iter()
                .all(|part| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit()))
    }

    fn linter() -> Linter {
        let mut registry = ValidatorRegistry::empty();
        registry.register_fn("hhmmss", hhmmss);
        registry.register_pattern("integer", "[0-9]+").unwrap();
        registry.register_pattern("memory", "[0-9]+[KMGT]?").unwrap();

        let schema = Schema::new(
            vec![
                FlagDescriptor::new(Some("time"), Some("t"), ValueNode::validator("hhmmss")),
                FlagDescriptor::new(Some("mem"), None, ValueNode::validator("memory")),
                FlagDescriptor::new(Some("nodes"), None, ValueNode::validator("integer")),
                FlagDescriptor::new(
                    Some("mail-type"),
                    None,
                    ValueNode::list(ValueNode::one_of(vec![
                        ValueNode::literal("BEGIN"),
                        ValueNode::literal("END"),
                        ValueNode::literal("FAIL"),
                    ])),
                ),
            ],
            registry,
        )
        .unwrap();
        Linter::new(schema)
    }

    fn rules(found: &[Diagnostic]) -> Vec<Rule> {
        found.iter().map(|diagnostic| diagnostic.rule).collect()
    }

    #[test]
    fn test_valid_long_flag_has_no_diagnostics() {
        assert!(linter().validate_line("#SBATCH --time=01:00:00").is_empty());
    }

    #[test]
    fn test_short_flag_missing_value() {
        let found = linter().validate_line("#SBATCH -t");
        assert_eq!(rules(&found), vec![Rule::InvalidValue]);
        assert_eq!(found[0].severity, Severity::Error);
    }

    #[test]
    fn test_missing_space_with_valid_value() {
        let found = linter().validate_line("#SBATCH--mem=4G");
        assert_eq!(rules(&found), vec![Rule::MissingSpace]);
        assert_eq!(found[0].message, "space missing after #SBATCH");
    }

    #[test]
    fn test_single_dash_on_long_flag_with_valid_value() {
        let found = linter().validate_line("#SBATCH -nodes=2");
        assert_eq!(rules(&found), vec![Rule::LongFlagNeedsDoubleDash]);
        assert_eq!(found[0].message, "-- required for long flag: nodes");
    }

    #[test]
    fn test_dash_mismatch_does_not_hide_value_errors() {
        let found = linter().validate_line("#SBATCH -nodes=two");
        assert_eq!(
            rules(&found),
            vec![Rule::LongFlagNeedsDoubleDash, Rule::InvalidValue]
        );
    }

    #[test]
    fn test_unknown_flag_skips_value_validation() {
        let found = linter().validate_line("#SBATCH --gpus=lots");
        assert_eq!(rules(&found), vec![Rule::UnknownFlag]);
    }

    #[test]
    fn test_list_value_reports_element() {
        let found = linter().validate_line("#SBATCH --mail-type=BEGIN,START");
        assert_eq!(rules(&found), vec![Rule::InvalidValue]);
        assert!(found[0].message.contains("element 2 \"START\""));
    }

    #[test]
    fn test_space_separator() {
        assert!(linter().validate_line("#SBATCH --nodes 4").is_empty());
    }

    #[test]
    fn test_non_directive_lines_are_ignored() {
        let linter = linter();
        for line in ["", "echo $SLURM_JOB_ID", "# SBATCH --bogus", "srun -n 4 ./a.out"] {
            assert!(linter.validate_line(line).is_empty(), "{line:?}");
        }
    }

    #[test]
    fn test_document_lines_are_independent() {
        let linter = linter();
        let directive = "#SBATCH --nodes=x";
        let alone = linter.validate_document(directive);
        let surrounded = linter.validate_document(&format!(
            "#!/bin/bash\n\n   \necho start\n{directive}\nsrun hostname\n"
        ));

        assert_eq!(alone.len(), 1);
        assert_eq!(surrounded.len(), 1);
        assert_eq!(alone[0].line, 0);
        assert_eq!(surrounded[0].line, 4);
        assert_eq!(alone[0].diagnostic, surrounded[0].diagnostic);
    }

    #[test]
    fn test_crlf_line_endings() {
        let found = linter().validate_document("#SBATCH --nodes=2\r\n#SBATCH --mem=4G\r\n");
        assert!(found.is_empty(), "{found:?}");

        let found = linter().validate_document("#SBATCH --nodes=2\r\n#SBATCH --nodes=3\r");
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn test_validation_is_idempotent() {
        let linter = linter();
        let text = "#SBATCH -t\n#SBATCH--mem=4G\n#SBATCH --bogus\n#SBATCH\n";
        let first = linter.validate_document(text);
        let second = linter.validate_document(text);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_lint_publishes_and_clears() {
        let linter = linter();
        let mut sink = DiagnosticCollection::new();

        linter.lint(&Document::new("job.sh", "#SBATCH --bogus\n"), &mut sink);
        assert_eq!(sink.get(Path::new("job.sh")).unwrap().len(), 1);

        linter.lint(&Document::new("job.sh", "#SBATCH --nodes=1\n"), &mut sink);
        assert_eq!(sink.get(Path::new("job.sh")).unwrap().len(), 0);

        sink.publish(Path::new("notes.txt"), Vec::new());
        linter.lint(&Document::new("notes.txt", "#SBATCH --bogus\n"), &mut sink);
        assert!(sink.get(Path::new("notes.txt")).is_none());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_extension_filter() {
        let linter = linter().with_extensions([".sbatch", "slurm"]);
        assert!(linter.applies_to(Path::new("run.sbatch")));
        assert!(linter.applies_to(Path::new("dir/run.slurm")));
        assert!(!linter.applies_to(Path::new("run.sh")));
        assert!(!linter.applies_to(Path::new("Makefile")));

        let linter = linter.with_any_extension();
        assert!(linter.applies_to(Path::new("run.sh")));
        assert!(linter.applies_to(Path::new("Makefile")));

        let mut sink = DiagnosticCollection::new();
        linter.lint(&Document::new("submit", "#SBATCH --bogus\n"), &mut sink);
        assert_eq!(sink.get(Path::new("submit")).unwrap().len(), 1);
    }

    #[test]
    fn test_custom_tag() {
        let linter = linter().with_parser(DirectiveParser::new("#BSUB").unwrap());
        assert!(linter.validate_line("#SBATCH --bogus").is_empty());
        let found = linter.validate_line("#BSUB-nodes=1");
        assert_eq!(
            rules(&found),
            vec![Rule::MissingSpace, Rule::LongFlagNeedsDoubleDash]
        );
        assert_eq!(found[0].message, "space missing after #BSUB");
    }
}

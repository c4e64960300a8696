//! Directive line grammar.
//!
//! A directive line has the shape
//!
//! ```text
//! <tag>[ ][-|--]<flag>[(=| )<value>]
//! ```
//!
//! anchored at both ends. Every line that starts with the tag produces a
//! [`ParsedLine`], even when every slot after the tag is empty, so later
//! stages can point at the exact element that is missing. Absent slots are
//! zero-length spans placed right after the previous slot.

use regex::{Captures, Regex};

use crate::diagnostic::Span;
use crate::error::SchemaError;
use crate::types::DIRECTIVE_TAG;

/// Number of dashes written before the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DashStyle {
    /// No dashes (`#SBATCH time=1`).
    #[default]
    None,
    /// One dash (`-t`).
    Single,
    /// Two dashes (`--time`).
    Double,
}

impl DashStyle {
    fn from_len(len: usize) -> Self {
        match len {
            0 => Self::None,
            1 => Self::Single,
            _ => Self::Double,
        }
    }

    /// Number of dashes (0, 1 or 2).
    pub fn count(self) -> usize {
        match self {
            Self::None => 0,
            Self::Single => 1,
            Self::Double => 2,
        }
    }
}

/// Slot-by-slot breakdown of one directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    pub tag: Span,
    pub space: Span,
    pub dashes: Span,
    pub flag: Span,
    /// `=` or space between flag and value.
    pub separator: Span,
    pub value: Span,
    pub flag_text: &'a str,
    pub value_text: &'a str,
    pub dash_style: DashStyle,
    /// Length of the whole line in bytes.
    pub line_len: usize,
}

/// Splits lines into directive slots.
///
/// # Examples
///
/// ```
/// use sbatch_lint_core::{DashStyle, DirectiveParser};
///
/// let parser = DirectiveParser::default();
/// let parsed = parser.parse("#SBATCH --time=01:00:00").unwrap();
/// assert_eq!(parsed.flag_text, "time");
/// assert_eq!(parsed.dash_style, DashStyle::Double);
/// assert_eq!(parsed.value_text, "01:00:00");
///
/// assert!(parser.parse("echo hello").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct DirectiveParser {
    tag: String,
    pattern: Regex,
}

impl DirectiveParser {
    /// Creates a parser for lines introduced by `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyDirectiveTag`] for an empty tag, which
    /// would turn every line into a directive.
    pub fn new(tag: &str) -> Result<Self, SchemaError> {
        if tag.is_empty() {
            return Err(SchemaError::EmptyDirectiveTag);
        }
        Ok(Self::compile(tag))
    }

    fn compile(tag: &str) -> Self {
        let pattern = Regex::new(&format!(
            r"(?s)^(?P<tag>{})(?P<space> )?(?P<dashes>-{{1,2}})?(?P<flag>[^= ]*)(?:(?P<separator>[= ])(?P<value>.*))?$",
            regex::escape(tag)
        ))
        .expect("escaped directive pattern must compile");

        Self {
            tag: tag.to_string(),
            pattern,
        }
    }

    /// The directive tag this parser recognizes.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Parses one line, or returns `None` when it does not start with the tag.
    pub fn parse<'a>(&self, line: &'a str) -> Option<ParsedLine<'a>> {
        let captures = self.pattern.captures(line)?;

        let mut cursor = 0;
        let tag = slot(&captures, "tag", &mut cursor);
        let space = slot(&captures, "space", &mut cursor);
        let dashes = slot(&captures, "dashes", &mut cursor);
        let flag = slot(&captures, "flag", &mut cursor);
        let separator = slot(&captures, "separator", &mut cursor);
        let value = slot(&captures, "value", &mut cursor);

        Some(ParsedLine {
            tag,
            space,
            dashes,
            flag,
            separator,
            value,
            flag_text: &line[flag.start..flag.end],
            value_text: &line[value.start..value.end],
            dash_style: DashStyle::from_len(dashes.len()),
            line_len: line.len(),
        })
    }
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self::compile(DIRECTIVE_TAG)
    }
}

fn slot(captures: &Captures<'_>, name: &str, cursor: &mut usize) -> Span {
    let span = match captures.name(name) {
        Some(found) => Span::new(found.start(), found.end()),
        None => Span::empty(*cursor),
    };
    *cursor = span.end;
    span
}

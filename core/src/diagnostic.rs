//! Diagnostics reported for directive lines.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open byte range (`start..end`) within a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates a zero-length span at `offset`.
    pub fn empty(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` for zero-length spans.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Widens a zero-length span to one visible character.
    ///
    /// The character following the span is used when there is one; at the
    /// end of the line the last character is used instead.
    pub fn visible(self, line_len: usize) -> Self {
        if !self.is_empty() {
            return self;
        }
        if self.start < line_len {
            Self::new(self.start, self.start + 1)
        } else if line_len > 0 {
            Self::new(line_len - 1, line_len)
        } else {
            self
        }
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// The rule that produced a diagnostic.
///
/// Every rule has a stable code and a fixed severity.
///
/// | Rule | Code | Severity |
/// |------|------|----------|
/// | [`MissingFlag`](Rule::MissingFlag) | `missing-flag` | error |
/// | [`MissingSpace`](Rule::MissingSpace) | `missing-space` | error |
/// | [`MissingDashes`](Rule::MissingDashes) | `missing-dashes` | error |
/// | [`UnknownFlag`](Rule::UnknownFlag) | `unknown-flag` | error |
/// | [`LongFlagNeedsDoubleDash`](Rule::LongFlagNeedsDoubleDash) | `long-flag-needs-double-dash` | error |
/// | [`ShortFlagNeedsSingleDash`](Rule::ShortFlagNeedsSingleDash) | `short-flag-needs-single-dash` | error |
/// | [`InvalidValue`](Rule::InvalidValue) | `invalid-value` | error |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    MissingFlag,
    MissingSpace,
    MissingDashes,
    UnknownFlag,
    LongFlagNeedsDoubleDash,
    ShortFlagNeedsSingleDash,
    InvalidValue,
}

impl Rule {
    /// Stable kebab-case code.
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingFlag => "missing-flag",
            Self::MissingSpace => "missing-space",
            Self::MissingDashes => "missing-dashes",
            Self::UnknownFlag => "unknown-flag",
            Self::LongFlagNeedsDoubleDash => "long-flag-needs-double-dash",
            Self::ShortFlagNeedsSingleDash => "short-flag-needs-single-dash",
            Self::InvalidValue => "invalid-value",
        }
    }

    /// Severity reported for this rule.
    pub fn severity(self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One problem found on a directive line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: Rule,
    pub severity: Severity,
    pub message: String,
    /// Byte range within the line.
    pub span: Span,
}

impl Diagnostic {
    /// Creates a diagnostic with the rule's severity.
    pub fn new(rule: Rule, span: Span, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: rule.severity(),
            message: message.into(),
            span,
        }
    }
}

/// A [`Diagnostic`] placed on a zero-based line of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiagnostic {
    /// Zero-based line index.
    pub line: usize,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

impl LineDiagnostic {
    /// One-based line and column of the diagnostic start, for display.
    pub fn position(&self) -> (usize, usize) {
        (self.line + 1, self.diagnostic.span.start + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_keeps_non_empty_spans() {
        assert_eq!(Span::new(2, 5).visible(10), Span::new(2, 5));
    }

    #[test]
    fn test_visible_widens_inside_line() {
        assert_eq!(Span::empty(7).visible(10), Span::new(7, 8));
    }

    #[test]
    fn test_visible_at_end_of_line_uses_last_char() {
        assert_eq!(Span::empty(10).visible(10), Span::new(9, 10));
        assert_eq!(Span::empty(0).visible(0), Span::empty(0));
    }

    #[test]
    fn test_rule_codes_serialize_as_kebab_case() {
        let diagnostic = Diagnostic::new(Rule::LongFlagNeedsDoubleDash, Span::new(8, 14), "x");
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["rule"], "long-flag-needs-double-dash");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["span"]["start"], 8);
        assert_eq!(diagnostic.rule.to_string(), diagnostic.rule.code());
    }

    #[test]
    fn test_line_diagnostic_position_is_one_based() {
        let entry = LineDiagnostic {
            line: 3,
            diagnostic: Diagnostic::new(Rule::UnknownFlag, Span::new(9, 12), "unrecognized flag: foo"),
        };
        assert_eq!(entry.position(), (4, 10));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["line"], 3);
        assert_eq!(json["rule"], "unknown-flag");
    }
}

//! Flag resolution and dash-style checks for one parsed directive.

use crate::diagnostic::{Diagnostic, Rule, Span};
use crate::index::FlagIndex;
use crate::parse::{DashStyle, ParsedLine};
use crate::types::FlagDescriptor;

/// Diagnostics for the structural part of a directive plus the resolved
/// flag, if any.
#[derive(Debug, Clone, Default)]
pub struct Resolved<'s> {
    pub diagnostics: Vec<Diagnostic>,
    /// Set whenever the flag token is recognized, even if the dash style is
    /// wrong.
    pub flag: Option<&'s FlagDescriptor>,
}

/// Resolves the flag token and checks the tag/space/dash structure.
///
/// Checks run in a fixed order and each adds its own diagnostic:
///
/// 1. empty flag: reported over the whole line, nothing else is checked
/// 2. missing space after the tag
/// 3. missing dashes before the flag
/// 4. unrecognized flag: no flag is resolved
/// 5. single dash on a flag that has no short name
/// 6. double dash on a flag that has no long name
pub fn resolve_and_check<'s>(parsed: &ParsedLine<'_>, index: &'s FlagIndex, tag: &str) -> Resolved<'s> {
    let mut resolved = Resolved::default();
    let flag = parsed.flag_text;

    if flag.is_empty() {
        resolved.diagnostics.push(Diagnostic::new(
            Rule::MissingFlag,
            Span::new(0, parsed.line_len),
            format!(
                "{tag} flag is missing. Format should be one of the following:\n  \
                 {tag} -<short_flag>[=values]\n  \
                 {tag} --<long_flag>[=values]"
            ),
        ));
        return resolved;
    }

    if parsed.space.is_empty() {
        resolved.diagnostics.push(Diagnostic::new(
            Rule::MissingSpace,
            parsed.space.visible(parsed.line_len),
            format!("space missing after {tag}"),
        ));
    }

    if parsed.dashes.is_empty() {
        // Points at the separating space, or where it should have been.
        let start = if parsed.space.is_empty() {
            parsed.space.start
        } else {
            parsed.flag.start.saturating_sub(1)
        };
        resolved.diagnostics.push(Diagnostic::new(
            Rule::MissingDashes,
            Span::new(start, start + 1),
            "dashes missing on flag",
        ));
    }

    let resolution = index.resolve(flag);
    if !resolution.is_known() {
        resolved.diagnostics.push(Diagnostic::new(
            Rule::UnknownFlag,
            parsed.flag,
            format!("unrecognized flag: {flag}"),
        ));
        return resolved;
    }

    let written = Span::new(parsed.dashes.start, parsed.flag.end);
    match parsed.dash_style {
        DashStyle::Single if !resolution.accepts_single_dash() => {
            resolved.diagnostics.push(Diagnostic::new(
                Rule::LongFlagNeedsDoubleDash,
                written,
                format!("-- required for long flag: {flag}"),
            ));
        }
        DashStyle::Double if !resolution.accepts_double_dash() => {
            resolved.diagnostics.push(Diagnostic::new(
                Rule::ShortFlagNeedsSingleDash,
                written,
                format!("- required for short flag: {flag}"),
            ));
        }
        _ => {}
    }

    resolved.flag = resolution.descriptor_for(parsed.dash_style);
    resolved
}

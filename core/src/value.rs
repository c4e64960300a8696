//! Recursive value-schema matching.
//!
//! [`check`] walks a [`ValueNode`] tree against the raw value text and
//! reports the first reason it does not match. Alternatives evaluate every
//! child: `OneOf` needs exactly one match and reports ambiguity when more
//! than one child accepts the text, `AnyOf` needs at least one.

use crate::diagnostic::{Diagnostic, Rule};
use crate::parse::ParsedLine;
use crate::registry::ValidatorRegistry;
use crate::schema::Schema;
use crate::types::{FlagDescriptor, ValueNode};

/// Why a value did not match its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Text was supplied where no value is accepted.
    UnexpectedValue,
    /// Text differs from the expected literal.
    Literal { expected: String },
    /// The named validator rejected the text.
    Validator { name: String },
    /// Empty text for a list whose elements cannot be empty.
    EmptyList,
    /// A list element failed; `index` is zero-based.
    Element {
        index: usize,
        text: String,
        cause: Box<Mismatch>,
    },
    /// No alternative matched.
    NoAlternative,
    /// More than one alternative of an exactly-one-of node matched.
    Ambiguous { matches: usize },
}

/// Matches `text` against `node`.
///
/// An empty value checked against a list passes only when the list's
/// element schema itself accepts the empty string.
///
/// # Examples
///
/// ```
/// use sbatch_lint_core::{Mismatch, ValidatorRegistry, ValueNode, check};
///
/// let registry = ValidatorRegistry::new();
/// let node = ValueNode::list(ValueNode::literal("x"));
/// assert!(check(&node, "x,x,x", &registry).is_ok());
///
/// let Err(Mismatch::Element { index, .. }) = check(&node, "x,y", &registry) else {
///     panic!("second element should fail");
/// };
/// assert_eq!(index, 1);
/// ```
pub fn check(node: &ValueNode, text: &str, registry: &ValidatorRegistry) -> Result<(), Mismatch> {
    match node {
        ValueNode::Literal(expected) => {
            if text == expected {
                Ok(())
            } else {
                Err(Mismatch::Literal {
                    expected: expected.clone(),
                })
            }
        }
        ValueNode::Empty => {
            if text.is_empty() {
                Ok(())
            } else {
                Err(Mismatch::UnexpectedValue)
            }
        }
        ValueNode::Validator(name) => {
            if registry.accepts(name, text) {
                Ok(())
            } else {
                Err(Mismatch::Validator { name: name.clone() })
            }
        }
        ValueNode::List { element, delimiter } => {
            if text.is_empty() {
                return check(element, text, registry).map_err(|_| Mismatch::EmptyList);
            }
            for (index, part) in text.split(*delimiter).enumerate() {
                check(element, part, registry).map_err(|cause| Mismatch::Element {
                    index,
                    text: part.to_string(),
                    cause: Box::new(cause),
                })?;
            }
            Ok(())
        }
        ValueNode::OneOf(children) => match count_matches(children, text, registry) {
            1 => Ok(()),
            0 => Err(Mismatch::NoAlternative),
            matches => Err(Mismatch::Ambiguous { matches }),
        },
        ValueNode::AnyOf(children) => match count_matches(children, text, registry) {
            0 => Err(Mismatch::NoAlternative),
            _ => Ok(()),
        },
    }
}

/// Returns `true` if `text` matches `node`.
pub fn validate(node: &ValueNode, text: &str, registry: &ValidatorRegistry) -> bool {
    check(node, text, registry).is_ok()
}

fn count_matches(children: &[ValueNode], text: &str, registry: &ValidatorRegistry) -> usize {
    children
        .iter()
        .filter(|child| validate(child, text, registry))
        .count()
}

/// Validates the value slot of a resolved directive.
///
/// Returns one [`Rule::InvalidValue`] diagnostic over the value slot when the
/// value does not match the flag's schema.
pub fn check_value(flag: &FlagDescriptor, parsed: &ParsedLine<'_>, schema: &Schema) -> Option<Diagnostic> {
    let text = parsed.value_text;
    let mismatch = check(&flag.values, text, schema.validators()).err()?;

    let name = flag.canonical_name();
    let expected = schema.expected(&flag.values);
    let message = match &mismatch {
        Mismatch::UnexpectedValue => format!("{name} does not take a value (got \"{text}\")"),
        Mismatch::Ambiguous { matches } => format!(
            "ambiguous value for {name}: \"{text}\" matches {matches} alternatives ({expected})"
        ),
        Mismatch::Element {
            index,
            text: element,
            ..
        } => format!(
            "invalid value for {name}: element {} \"{element}\" does not match (expected {expected})",
            index + 1
        ),
        _ if text.is_empty() => format!("value required for {name} (expected {expected})"),
        _ => format!("invalid value for {name}: \"{text}\" (expected {expected})"),
    };

    Some(Diagnostic::new(
        Rule::InvalidValue,
        parsed.value.visible(parsed.line_len),
        message,
    ))
}

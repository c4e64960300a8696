//! Flag and value-schema type definitions.
//!
//! This module defines the in-memory model of the directive schema: every
//! recognized flag is a [`FlagDescriptor`] whose accepted value is described
//! by a [`ValueNode`] tree. Both are immutable once a
//! [`Schema`](crate::Schema) has been built.

use std::fmt;

/// Directive marker that introduces a scheduler directive line.
pub const DIRECTIVE_TAG: &str = "#SBATCH";

/// Delimiter used by list nodes when the table does not name one.
pub const DEFAULT_LIST_DELIMITER: char = ',';

/// Shape a directive value must take.
///
/// Nodes nest: lists hold an element node, alternatives hold child nodes.
/// Trees come from static configuration, so they are always finite.
///
/// # Examples
///
/// ```
/// use sbatch_lint_core::ValueNode;
///
/// let mode = ValueNode::one_of(vec![
///     ValueNode::literal("append"),
///     ValueNode::literal("truncate"),
/// ]);
/// assert_eq!(mode.describe(), "one of: \"append\", \"truncate\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueNode {
    /// Value must equal the text exactly.
    Literal(String),
    /// Value must satisfy the named validator from the registry.
    Validator(String),
    /// Value must be absent.
    Empty,
    /// Value is split on `delimiter` and every element must match `element`.
    List {
        element: Box<ValueNode>,
        delimiter: char,
    },
    /// Exactly one child must match.
    OneOf(Vec<ValueNode>),
    /// At least one child must match.
    AnyOf(Vec<ValueNode>),
}

impl ValueNode {
    /// Creates a literal node.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Creates a node delegating to a named validator.
    pub fn validator(name: impl Into<String>) -> Self {
        Self::Validator(name.into())
    }

    /// Creates a list node using the default `,` delimiter.
    pub fn list(element: ValueNode) -> Self {
        Self::list_with(element, DEFAULT_LIST_DELIMITER)
    }

    /// Creates a list node with an explicit delimiter.
    pub fn list_with(element: ValueNode, delimiter: char) -> Self {
        Self::List {
            element: Box::new(element),
            delimiter,
        }
    }

    /// Creates an exactly-one-of node.
    pub fn one_of(children: Vec<ValueNode>) -> Self {
        Self::OneOf(children)
    }

    /// Creates an at-least-one-of node.
    pub fn any_of(children: Vec<ValueNode>) -> Self {
        Self::AnyOf(children)
    }

    /// Returns every validator name referenced anywhere in this tree.
    pub fn validator_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_validator_names(&mut names);
        names
    }

    fn collect_validator_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Validator(name) => names.push(name),
            Self::List { element, .. } => element.collect_validator_names(names),
            Self::OneOf(children) | Self::AnyOf(children) => {
                for child in children {
                    child.collect_validator_names(names);
                }
            }
            Self::Literal(_) | Self::Empty => {}
        }
    }

    /// Human-readable description of what this node accepts.
    ///
    /// Alternatives are enumerated so a failure message can list every
    /// accepted form.
    pub fn describe(&self) -> String {
        self.describe_with(&|name| name.to_string())
    }

    /// Like [`describe`](Self::describe), with validator names rendered by
    /// `name_of`.
    pub fn describe_with(&self, name_of: &dyn Fn(&str) -> String) -> String {
        match self {
            Self::Literal(text) => format!("\"{text}\""),
            Self::Validator(name) => name_of(name),
            Self::Empty => "no value".to_string(),
            Self::List { element, delimiter } => {
                format!(
                    "'{delimiter}'-separated list of {}",
                    element.describe_with(name_of)
                )
            }
            Self::OneOf(children) => {
                format!("one of: {}", describe_children(children, name_of))
            }
            Self::AnyOf(children) => {
                format!("any of: {}", describe_children(children, name_of))
            }
        }
    }
}

impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// One recognized directive flag.
///
/// Names are stored without their leading dashes: a flag written as
/// `--time` / `-t` has `long = Some("time")` and `short = Some("t")`.
///
/// # Examples
///
/// ```
/// use sbatch_lint_core::{FlagDescriptor, ValueNode};
///
/// let time = FlagDescriptor::new(Some("time"), Some("t"), ValueNode::validator("duration"))
///     .with_description("Limit on the total run time");
/// assert_eq!(time.canonical_name(), "--time");
/// assert!(time.matches("t"));
///
/// let hold = FlagDescriptor::new(None, Some("H"), ValueNode::Empty);
/// assert_eq!(hold.canonical_name(), "-H");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDescriptor {
    /// Long name, written with two dashes (e.g. "time").
    pub long: Option<String>,
    /// Short name, written with one dash (e.g. "t").
    pub short: Option<String>,
    /// Description shown by listings.
    pub description: Option<String>,
    /// Accepted value shape.
    pub values: ValueNode,
}

impl FlagDescriptor {
    /// Creates a descriptor.
    pub fn new(long: Option<&str>, short: Option<&str>, values: ValueNode) -> Self {
        Self {
            long: long.map(String::from),
            short: short.map(String::from),
            description: None,
            values,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Returns the name as written in a directive, long form preferred.
    pub fn canonical_name(&self) -> String {
        match (&self.long, &self.short) {
            (Some(long), _) => format!("--{long}"),
            (None, Some(short)) => format!("-{short}"),
            (None, None) => String::new(),
        }
    }

    /// Returns `true` if `name` is either the long or the short name.
    pub fn matches(&self, name: &str) -> bool {
        self.long.as_deref() == Some(name) || self.short.as_deref() == Some(name)
    }

    /// Returns `"--long, -short"` style usage text.
    pub fn usage(&self) -> String {
        let mut forms = Vec::new();
        if let Some(long) = &self.long {
            forms.push(format!("--{long}"));
        }
        if let Some(short) = &self.short {
            forms.push(format!("-{short}"));
        }
        forms.join(", ")
    }
}

fn describe_children(children: &[ValueNode], name_of: &dyn Fn(&str) -> String) -> String {
    children
        .iter()
        .map(|child| child.describe_with(name_of))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_nested_nodes() {
        let node = ValueNode::any_of(vec![
            ValueNode::Empty,
            ValueNode::list(ValueNode::one_of(vec![
                ValueNode::literal("BEGIN"),
                ValueNode::literal("END"),
            ])),
        ]);
        assert_eq!(
            node.describe(),
            "any of: no value, ','-separated list of one of: \"BEGIN\", \"END\""
        );
    }

    #[test]
    fn test_describe_distinguishes_any_of_from_one_of() {
        let choices = vec![ValueNode::literal("user"), ValueNode::literal("mcs")];
        assert_eq!(
            ValueNode::one_of(choices.clone()).describe(),
            "one of: \"user\", \"mcs\""
        );
        assert_eq!(
            ValueNode::any_of(choices).describe(),
            "any of: \"user\", \"mcs\""
        );
    }

    #[test]
    fn test_validator_names_walks_tree() {
        let node = ValueNode::any_of(vec![
            ValueNode::validator("datetime"),
            ValueNode::list(ValueNode::validator("word")),
            ValueNode::literal("now"),
        ]);
        assert_eq!(node.validator_names(), vec!["datetime", "word"]);
    }

    #[test]
    fn test_usage_lists_both_forms() {
        let flag = FlagDescriptor::new(Some("nodes"), Some("N"), ValueNode::validator("integer"));
        assert_eq!(flag.usage(), "--nodes, -N");
        assert_eq!(flag.canonical_name(), "--nodes");
        assert!(flag.matches("nodes"));
        assert!(!flag.matches("n"));
    }
}

//! Long-name / short-name lookup over the flag table.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tracing::debug;

use crate::error::SchemaError;
use crate::parse::DashStyle;
use crate::types::FlagDescriptor;

/// Outcome of looking a flag token up in both mappings.
///
/// Each field is set when the token is a key of the corresponding mapping.
/// Usually at most one descriptor is involved; both fields point at
/// different descriptors only when one flag's long name equals another
/// flag's short name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolution<'a> {
    /// Descriptor whose long name is the token.
    pub long: Option<&'a FlagDescriptor>,
    /// Descriptor whose short name is the token.
    pub short: Option<&'a FlagDescriptor>,
}

impl<'a> Resolution<'a> {
    /// Returns `true` if the token is in either mapping.
    pub fn is_known(&self) -> bool {
        self.long.is_some() || self.short.is_some()
    }

    /// Returns `true` if the token may be written with a single dash.
    pub fn accepts_single_dash(&self) -> bool {
        self.short.is_some()
    }

    /// Returns `true` if the token may be written with two dashes.
    pub fn accepts_double_dash(&self) -> bool {
        self.long.is_some()
    }

    /// Picks the descriptor for the dash style actually written.
    ///
    /// The mapping matching the observed dash count wins; otherwise the
    /// long-name mapping is preferred over the short-name one.
    pub fn descriptor_for(&self, dashes: DashStyle) -> Option<&'a FlagDescriptor> {
        match dashes {
            DashStyle::Single if self.short.is_some() => self.short,
            DashStyle::Double if self.long.is_some() => self.long,
            _ => self.long.or(self.short),
        }
    }
}

/// Two disjoint lookup tables built once from the flag descriptors.
///
/// A descriptor with both a long and a short name is shared between the two
/// mappings.
///
/// # Examples
///
/// ```
/// use sbatch_lint_core::{FlagDescriptor, FlagIndex, ValueNode};
///
/// let index = FlagIndex::build(vec![
///     FlagDescriptor::new(Some("time"), Some("t"), ValueNode::validator("duration")),
///     FlagDescriptor::new(Some("nodes"), None, ValueNode::validator("integer")),
/// ])
/// .unwrap();
///
/// let t = index.resolve("t");
/// assert!(t.accepts_single_dash() && !t.accepts_double_dash());
/// assert!(index.resolve("nodes").accepts_double_dash());
/// assert!(!index.resolve("mem").is_known());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlagIndex {
    flags: Vec<Arc<FlagDescriptor>>,
    by_long: HashMap<String, Arc<FlagDescriptor>>,
    by_short: HashMap<String, Arc<FlagDescriptor>>,
}

impl FlagIndex {
    /// Builds the index.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingFlagName`] for a nameless descriptor,
    /// [`SchemaError::InvalidFlagName`] for names that could never be matched
    /// on a directive line, and [`SchemaError::DuplicateLongName`] /
    /// [`SchemaError::DuplicateShortName`] for clashing keys.
    pub fn build(descriptors: impl IntoIterator<Item = FlagDescriptor>) -> Result<Self, SchemaError> {
        let mut index = Self::default();

        for descriptor in descriptors {
            if descriptor.long.is_none() && descriptor.short.is_none() {
                return Err(SchemaError::MissingFlagName);
            }
            let descriptor = Arc::new(descriptor);

            if let Some(long) = &descriptor.long {
                check_name(long)?;
                match index.by_long.entry(long.clone()) {
                    Entry::Occupied(_) => return Err(SchemaError::DuplicateLongName(long.clone())),
                    Entry::Vacant(slot) => {
                        slot.insert(Arc::clone(&descriptor));
                    }
                }
            }

            if let Some(short) = &descriptor.short {
                check_name(short)?;
                match index.by_short.entry(short.clone()) {
                    Entry::Occupied(_) => {
                        return Err(SchemaError::DuplicateShortName(short.clone()));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(Arc::clone(&descriptor));
                    }
                }
            }

            index.flags.push(descriptor);
        }

        debug!(
            flags = index.flags.len(),
            long = index.by_long.len(),
            short = index.by_short.len(),
            "Built flag index"
        );
        Ok(index)
    }

    /// Looks `token` up in both mappings.
    pub fn resolve(&self, token: &str) -> Resolution<'_> {
        Resolution {
            long: self.by_long.get(token).map(Arc::as_ref),
            short: self.by_short.get(token).map(Arc::as_ref),
        }
    }

    /// Looks up a flag by long name.
    pub fn get_long(&self, name: &str) -> Option<&FlagDescriptor> {
        self.by_long.get(name).map(Arc::as_ref)
    }

    /// Looks up a flag by short name.
    pub fn get_short(&self, name: &str) -> Option<&FlagDescriptor> {
        self.by_short.get(name).map(Arc::as_ref)
    }

    /// Finds a flag written as `--long`, `-short`, or a bare name.
    pub fn find(&self, written: &str) -> Option<&FlagDescriptor> {
        if let Some(long) = written.strip_prefix("--") {
            return self.get_long(long);
        }
        if let Some(short) = written.strip_prefix('-') {
            return self.get_short(short);
        }
        self.resolve(written).descriptor_for(DashStyle::None)
    }

    /// Iterates descriptors in table order.
    pub fn flags(&self) -> impl Iterator<Item = &FlagDescriptor> {
        self.flags.iter().map(Arc::as_ref)
    }

    /// Returns the number of flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns `true` if the index holds no flags.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

fn check_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() || name.starts_with('-') || name.contains(['=', ' ']) {
        return Err(SchemaError::InvalidFlagName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::ValueNode;

    use super::*;

    fn flag(long: Option<&str>, short: Option<&str>) -> FlagDescriptor {
        FlagDescriptor::new(long, short, ValueNode::Empty)
    }

    #[test]
    fn test_both_names_share_one_descriptor() {
        let index = FlagIndex::build(vec![flag(Some("time"), Some("t"))]).unwrap();
        let by_long = index.get_long("time").unwrap();
        let by_short = index.get_short("t").unwrap();
        assert!(std::ptr::eq(by_long, by_short));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_resolution_dash_requirements() {
        let index = FlagIndex::build(vec![
            flag(Some("nodes"), Some("N")),
            flag(Some("exclusive"), None),
            flag(None, Some("H")),
        ])
        .unwrap();

        let exclusive = index.resolve("exclusive");
        assert!(exclusive.accepts_double_dash());
        assert!(!exclusive.accepts_single_dash());

        let hold = index.resolve("H");
        assert!(hold.accepts_single_dash());
        assert!(!hold.accepts_double_dash());

        assert!(!index.resolve("n").is_known());
    }

    #[test]
    fn test_degenerate_token_uses_observed_dashes() {
        let index = FlagIndex::build(vec![
            flag(Some("x"), None).with_description("long x"),
            flag(Some("exclude"), Some("x")).with_description("short x"),
        ])
        .unwrap();

        let x = index.resolve("x");
        assert_eq!(
            x.descriptor_for(DashStyle::Double).unwrap().description.as_deref(),
            Some("long x")
        );
        assert_eq!(
            x.descriptor_for(DashStyle::Single).unwrap().description.as_deref(),
            Some("short x")
        );
        assert_eq!(
            x.descriptor_for(DashStyle::None).unwrap().description.as_deref(),
            Some("long x")
        );
    }

    #[test]
    fn test_find_written_forms() {
        let index = FlagIndex::build(vec![flag(Some("time"), Some("t"))]).unwrap();
        assert!(index.find("--time").is_some());
        assert!(index.find("-t").is_some());
        assert!(index.find("time").is_some());
        assert!(index.find("-time").is_none());
        assert!(index.find("--t").is_none());
    }

    #[test]
    fn test_duplicates_rejected() {
        let err = FlagIndex::build(vec![flag(Some("time"), None), flag(Some("time"), None)])
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateLongName(ref name) if name == "time"));

        let err = FlagIndex::build(vec![flag(None, Some("t")), flag(Some("tmp"), Some("t"))])
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateShortName(ref name) if name == "t"));
    }

    #[test]
    fn test_invalid_names_rejected() {
        for bad in ["", "-t", "a=b", "a b"] {
            let err = FlagIndex::build(vec![flag(Some(bad), None)]).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidFlagName(_)), "{bad:?}");
        }
        let err = FlagIndex::build(vec![flag(None, None)]).unwrap_err();
        assert!(matches!(err, SchemaError::MissingFlagName));
    }
}

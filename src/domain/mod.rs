//! Core data model: parameters, path hierarchies, tag filters, and selections.

use crate::error::ValidationError;
use std::collections::HashSet;
use std::fmt;

/// Separator between segments of a hierarchical parameter name.
pub const PATH_SEPARATOR: char = '/';

/// Prefix the store expects on tag filter keys.
pub const TAG_KEY_PREFIX: &str = "tag:";

/// Parameter type as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterKind {
    #[default]
    String,
    SecureString,
    StringList,
}

/// A fully resolved parameter. `value` is already decrypted.
#[derive(Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: ParameterKind) -> Self {
        Self { name: name.into(), value: value.into(), kind }
    }
}

// Values may be secrets; keep them out of debug output and logs.
impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// A path hierarchy such as `/prod/app/`. Always contains a separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSpec(String);

impl PathSpec {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if !trimmed.contains(PATH_SEPARATOR) {
            return Err(ValidationError::FlatPath(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tag existence filter. `Environment` and `tag:Environment` are equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagFilter(String);

impl TagFilter {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let key = trimmed.strip_prefix(TAG_KEY_PREFIX).unwrap_or(trimmed);
        if key.is_empty() {
            return Err(ValidationError::EmptyTag);
        }
        Ok(Self(format!("{TAG_KEY_PREFIX}{key}")))
    }

    /// The filter key as sent to the store, e.g. `tag:Environment`.
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which parameters to fetch. At least one of `paths` or `tags` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    paths: Vec<PathSpec>,
    tags: Vec<TagFilter>,
}

impl Selection {
    pub fn new(paths: Vec<PathSpec>, tags: Vec<TagFilter>) -> Result<Self, ValidationError> {
        if paths.is_empty() && tags.is_empty() {
            return Err(ValidationError::NothingSelected);
        }
        Ok(Self { paths, tags })
    }

    /// Validate raw CLI/config strings into a selection.
    pub fn parse<P, T>(paths: P, tags: T) -> Result<Self, ValidationError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .map(|p| PathSpec::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let tags =
            tags.into_iter().map(|t| TagFilter::parse(t.as_ref())).collect::<Result<Vec<_>, _>>()?;
        Self::new(paths, tags)
    }

    pub fn paths(&self) -> &[PathSpec] {
        &self.paths
    }

    pub fn tags(&self) -> &[TagFilter] {
        &self.tags
    }
}

/// Ordered parameters, unique by name. Later duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    items: Vec<Parameter>,
    seen: HashSet<String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `param` unless a parameter with the same name is present.
    /// Returns whether it was inserted.
    pub fn insert(&mut self, param: Parameter) -> bool {
        if !self.seen.insert(param.name.clone()) {
            return false;
        }
        self.items.push(param);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|p| p.name.as_str()).collect()
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for param in iter {
            set.insert(param);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_spec_requires_separator() {
        assert_eq!(PathSpec::parse("prod"), Err(ValidationError::FlatPath("prod".into())));
        assert_eq!(PathSpec::parse("/prod/app/").unwrap().as_str(), "/prod/app/");
        assert_eq!(PathSpec::parse("  /prod ").unwrap().as_str(), "/prod");
    }

    #[test]
    fn tag_filter_adds_prefix_once() {
        assert_eq!(TagFilter::parse("Environment").unwrap().key(), "tag:Environment");
        assert_eq!(TagFilter::parse("tag:Environment").unwrap().key(), "tag:Environment");
        assert_eq!(TagFilter::parse("tag:"), Err(ValidationError::EmptyTag));
    }

    #[test]
    fn selection_rejects_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(Selection::parse(empty, empty), Err(ValidationError::NothingSelected));
    }

    #[test]
    fn selection_rejects_flat_path_even_with_tags() {
        let err = Selection::parse(["/ok", "prod"], ["Team"]).unwrap_err();
        assert_eq!(err, ValidationError::FlatPath("prod".into()));
    }

    #[test]
    fn parameter_set_keeps_first_occurrence_order() {
        let set: ParameterSet = [
            Parameter::new("/a/X", "1", ParameterKind::String),
            Parameter::new("/a/Y", "2", ParameterKind::String),
            Parameter::new("/a/X", "3", ParameterKind::String),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.names(), vec!["/a/X", "/a/Y"]);
        assert_eq!(set.iter().next().map(|p| p.value.as_str()), Some("1"));
    }

    #[test]
    fn parameter_debug_hides_value() {
        let param = Parameter::new("/a/PASSWORD", "hunter2", ParameterKind::SecureString);
        let rendered = format!("{param:?}");
        assert!(rendered.contains("/a/PASSWORD"));
        assert!(!rendered.contains("hunter2"));
    }
}

//! Request-scoped selection of fields and embedded relations.
//!
//! Query syntax understood by [`RequestSelection::from_query`]:
//! - `fields[Person]=name,email` restricts the fields of resources typed `Person`
//! - `embedded=author,author.organization` lists the relation paths to inline

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The pair of predicates governing what a document contains.
///
/// Both predicates must be pure for the duration of one write.
pub trait SelectionPolicy: Send + Sync {
    /// Whether `field` may be written for a resource carrying `type_names`.
    fn field_allowed(&self, type_names: &[String], field: &str) -> bool;

    /// Whether the relation at `dot_path` (e.g. `author.organization`) is inlined.
    fn embed_allowed(&self, dot_path: &str) -> bool;
}

/// Every field, no embedding.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SelectionPolicy for AllowAll {
    fn field_allowed(&self, _type_names: &[String], _field: &str) -> bool {
        true
    }

    fn embed_allowed(&self, _dot_path: &str) -> bool {
        false
    }
}

/// Selection built from two closures.
pub struct FnSelection<F, E> {
    field: F,
    embed: E,
}

impl<F, E> FnSelection<F, E>
where
    F: Fn(&[String], &str) -> bool + Send + Sync,
    E: Fn(&str) -> bool + Send + Sync,
{
    #[must_use]
    pub fn new(field: F, embed: E) -> Self {
        Self { field, embed }
    }
}

impl<F, E> SelectionPolicy for FnSelection<F, E>
where
    F: Fn(&[String], &str) -> bool + Send + Sync,
    E: Fn(&str) -> bool + Send + Sync,
{
    fn field_allowed(&self, type_names: &[String], field: &str) -> bool {
        (self.field)(type_names, field)
    }

    fn embed_allowed(&self, dot_path: &str) -> bool {
        (self.embed)(dot_path)
    }
}

impl<F, E> fmt::Debug for FnSelection<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSelection").finish_non_exhaustive()
    }
}

/// Per-type field lists (`fields[Type]=a,b`).
///
/// A resource none of whose type names has an entry keeps all of its fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseFieldsets(BTreeMap<String, BTreeSet<String>>);

impl SparseFieldsets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<I, S>(&mut self, type_name: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(type_name.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn allows(&self, type_names: &[String], field: &str) -> bool {
        let mut restricted = false;
        for name in type_names {
            if let Some(fields) = self.0.get(name) {
                if fields.contains(field) {
                    return true;
                }
                restricted = true;
            }
        }
        !restricted
    }
}

/// Finite set of relation paths to embed. Listing `a.b` implies `a`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedPaths(BTreeSet<String>);

impl EmbeddedPaths {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dot_path: &str) {
        let mut prefix = String::new();
        for segment in dot_path.split('.').map(str::trim).filter(|s| !s.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            self.0.insert(prefix.clone());
        }
    }

    #[must_use]
    pub fn contains(&self, dot_path: &str) -> bool {
        self.0.contains(dot_path)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for EmbeddedPaths {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut paths = Self::new();
        for path in iter {
            paths.insert(path);
        }
        paths
    }
}

/// Selection derived from request query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSelection {
    pub fields: SparseFieldsets,
    pub embedded: EmbeddedPaths,
}

impl RequestSelection {
    /// Parse `fields[Type]=...` and `embedded=...` out of a raw query string.
    /// Unrelated parameters are ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut selection = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            if key == "embedded" {
                for path in value.split(',') {
                    selection.embedded.insert(path);
                }
            } else if let Some(type_name) = key
                .strip_prefix("fields[")
                .and_then(|rest| rest.strip_suffix(']'))
            {
                selection.fields.insert(
                    type_name,
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty()),
                );
            }
        }
        selection
    }
}

impl SelectionPolicy for RequestSelection {
    fn field_allowed(&self, type_names: &[String], field: &str) -> bool {
        self.fields.allows(type_names, field)
    }

    fn embed_allowed(&self, dot_path: &str) -> bool {
        self.embedded.contains(dot_path)
    }
}

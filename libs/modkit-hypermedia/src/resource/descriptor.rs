//! Per-type resource metadata.
//!
//! A [`ResourceSpec`] is the single, explicit configuration value describing how
//! instances of one domain type are represented. [`ResourceType::from_spec`]
//! erases the domain type and produces an immutable [`ResourceType`] that the
//! registry owns from then on.
//!
//! ```ignore
//! let person = ResourceType::from_spec(ResourceSpec {
//!     collection: Some("person".to_owned()),
//!     types: vec!["Person".to_owned()],
//!     fields: vec![Field::scalar("name", |p: &Person| Some(p.name.clone()))],
//!     links: vec![("avatar".to_owned(), "http://x/a.png".to_owned())],
//!     ..ResourceSpec::new("person", Identifier::new(|p: &Person| p.id.to_string()))
//! });
//! ```

use std::any::{Any, type_name};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::AccessorError;
use crate::model::{Instance, ResourceTypeId};

/// Opaque value produced by a related collection and understood by a filter provider.
pub type FilterValue = Arc<dyn Any + Send + Sync>;

type ValueFn<T> = Box<dyn Fn(&T) -> Result<Option<Value>, AccessorError> + Send + Sync>;
type LocalizedFn<T> =
    Box<dyn Fn(&T, &[String]) -> Result<Option<Value>, AccessorError> + Send + Sync>;
type BinaryFn<T> = Box<dyn Fn(&T) -> Result<Option<BinaryFile>, AccessorError> + Send + Sync>;
type RelationFn<T> = Box<dyn Fn(&T) -> Result<Option<Arc<Instance>>, AccessorError> + Send + Sync>;
type FilterFn<T> = Box<dyn Fn(&T) -> Result<FilterValue, AccessorError> + Send + Sync>;

type ErasedValueFn = Arc<dyn Fn(&Instance) -> Result<Option<Value>, AccessorError> + Send + Sync>;
type ErasedLocalizedFn =
    Arc<dyn Fn(&Instance, &[String]) -> Result<Option<Value>, AccessorError> + Send + Sync>;
type ErasedBinaryFn =
    Arc<dyn Fn(&Instance) -> Result<Option<BinaryFile>, AccessorError> + Send + Sync>;
type ErasedRelationFn =
    Arc<dyn Fn(&Instance) -> Result<Option<Arc<Instance>>, AccessorError> + Send + Sync>;
type ErasedFilterFn = Arc<dyn Fn(&Instance) -> Result<FilterValue, AccessorError> + Send + Sync>;
type ErasedIdentifierFn = Arc<dyn Fn(&Instance) -> Result<String, AccessorError> + Send + Sync>;

fn downcast<T: Any>(instance: &Instance) -> Result<&T, AccessorError> {
    instance
        .downcast_ref::<T>()
        .ok_or(AccessorError::TypeMismatch {
            expected: type_name::<T>(),
        })
}

/// Binary content exposed by a binary field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFile {
    pub content: Vec<u8>,
    pub mime_type: String,
}

/// Tag describing how a field value is produced and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
    /// Resolved against the request's preferred languages.
    Localized,
    /// Per-instance URL rendered on the link channel.
    Link,
    /// Rendered as the URL of the binary endpoint serving the content.
    Binary,
}

enum FieldAccessor<T> {
    Value(ValueFn<T>),
    Localized(LocalizedFn<T>),
    Binary(BinaryFn<T>),
}

/// A field of a resource type, typed over the domain instance.
pub struct Field<T> {
    key: String,
    kind: FieldKind,
    accessor: FieldAccessor<T>,
}

impl<T: Any> Field<T> {
    #[must_use]
    pub fn scalar<V, F>(key: impl Into<String>, f: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> Option<V> + Send + Sync + 'static,
    {
        Self::try_scalar(key, move |t| Ok(f(t).map(Into::into)))
    }

    #[must_use]
    pub fn try_scalar<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T) -> Result<Option<Value>, AccessorError> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            kind: FieldKind::Scalar,
            accessor: FieldAccessor::Value(Box::new(f)),
        }
    }

    #[must_use]
    pub fn list<V, F>(key: impl Into<String>, f: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> Option<Vec<V>> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            kind: FieldKind::List,
            accessor: FieldAccessor::Value(Box::new(move |t| {
                Ok(f(t).map(|items| Value::Array(items.into_iter().map(Into::into).collect())))
            })),
        }
    }

    /// Field whose value depends on the request's preferred languages (best first).
    #[must_use]
    pub fn localized<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T, &[String]) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            kind: FieldKind::Localized,
            accessor: FieldAccessor::Localized(Box::new(move |t, languages| {
                Ok(f(t, languages).map(Value::String))
            })),
        }
    }

    #[must_use]
    pub fn link<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            kind: FieldKind::Link,
            accessor: FieldAccessor::Value(Box::new(move |t| Ok(f(t).map(Value::String)))),
        }
    }

    /// Binary field. The accessor is only used by binary endpoints; documents
    /// carry the URL under which the content is served.
    #[must_use]
    pub fn binary<F>(key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&T) -> Option<BinaryFile> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            kind: FieldKind::Binary,
            accessor: FieldAccessor::Binary(Box::new(move |t| Ok(f(t)))),
        }
    }
}

/// Identifier accessor of a resource type.
pub struct Identifier<T>(Box<dyn Fn(&T) -> Result<String, AccessorError> + Send + Sync>);

impl<T: Any> Identifier<T> {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self(Box::new(move |t| Ok(f(t))))
    }

    #[must_use]
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(&T) -> Result<String, AccessorError> + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }
}

/// A to-one relation from `T` to another registered resource type.
pub struct Relation<T> {
    key: String,
    target: ResourceTypeId,
    accessor: RelationFn<T>,
}

impl<T: Any> Relation<T> {
    #[must_use]
    pub fn new<U, F>(key: impl Into<String>, target: impl Into<ResourceTypeId>, f: F) -> Self
    where
        U: Any + Send + Sync,
        F: Fn(&T) -> Option<U> + Send + Sync + 'static,
    {
        Self::try_new(key, target, move |t| {
            Ok(f(t).map(|u| Arc::new(u) as Arc<Instance>))
        })
    }

    #[must_use]
    pub fn try_new<F>(key: impl Into<String>, target: impl Into<ResourceTypeId>, f: F) -> Self
    where
        F: Fn(&T) -> Result<Option<Arc<Instance>>, AccessorError> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            target: target.into(),
            accessor: Box::new(f),
        }
    }
}

/// A to-many relation, always rendered as a filtered collection URL.
pub struct CollectionRelation<T> {
    key: String,
    target: ResourceTypeId,
    filter: String,
    accessor: FilterFn<T>,
}

impl<T: Any> CollectionRelation<T> {
    /// `filter` names the provider that turns the produced value into query parameters.
    #[must_use]
    pub fn new<V, F>(
        key: impl Into<String>,
        target: impl Into<ResourceTypeId>,
        filter: impl Into<String>,
        f: F,
    ) -> Self
    where
        V: Any + Send + Sync,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            target: target.into(),
            filter: filter.into(),
            accessor: Box::new(move |t| Ok(Arc::new(f(t)) as FilterValue)),
        }
    }
}

/// Complete metadata for one resource type.
pub struct ResourceSpec<T> {
    pub id: ResourceTypeId,
    /// Collection name used in URIs; types without one have no URLs of their own.
    pub collection: Option<String>,
    pub types: Vec<String>,
    pub identifier: Identifier<T>,
    pub fields: Vec<Field<T>>,
    /// Static links, rendered in order.
    pub links: Vec<(String, String)>,
    pub embedded: Vec<Relation<T>>,
    pub linked: Vec<Relation<T>>,
    pub collections: Vec<CollectionRelation<T>>,
}

impl<T: Any> ResourceSpec<T> {
    /// Spec with no fields or relations; the collection name defaults to the id.
    #[must_use]
    pub fn new(id: impl Into<ResourceTypeId>, identifier: Identifier<T>) -> Self {
        let id = id.into();
        Self {
            collection: Some(id.as_str().to_owned()),
            types: Vec::new(),
            identifier,
            fields: Vec::new(),
            links: Vec::new(),
            embedded: Vec::new(),
            linked: Vec::new(),
            collections: Vec::new(),
            id,
        }
    }
}

/// Erased field accessor.
#[derive(Clone)]
pub struct FieldFunction {
    key: String,
    kind: FieldKind,
    accessor: ErasedFieldAccessor,
}

#[derive(Clone)]
enum ErasedFieldAccessor {
    Value(ErasedValueFn),
    Localized(ErasedLocalizedFn),
    Binary,
}

impl FieldFunction {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Compute the field value. Binary fields have no inline value.
    ///
    /// # Errors
    /// Propagates the accessor's failure.
    pub fn value(
        &self,
        instance: &Instance,
        languages: &[String],
    ) -> Result<Option<Value>, AccessorError> {
        match &self.accessor {
            ErasedFieldAccessor::Value(f) => f(instance),
            ErasedFieldAccessor::Localized(f) => f(instance, languages),
            ErasedFieldAccessor::Binary => Ok(None),
        }
    }
}

/// Erased binary accessor.
#[derive(Clone)]
pub struct BinaryFunction {
    key: String,
    accessor: ErasedBinaryFn,
}

impl BinaryFunction {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// # Errors
    /// Propagates the accessor's failure.
    pub fn fetch(&self, instance: &Instance) -> Result<Option<BinaryFile>, AccessorError> {
        (self.accessor)(instance)
    }
}

/// Erased to-one relation.
#[derive(Clone)]
pub struct RelatedModel {
    key: String,
    target: ResourceTypeId,
    accessor: ErasedRelationFn,
}

impl RelatedModel {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn target(&self) -> &ResourceTypeId {
        &self.target
    }

    /// # Errors
    /// Propagates the accessor's failure.
    pub fn fetch(&self, instance: &Instance) -> Result<Option<Arc<Instance>>, AccessorError> {
        (self.accessor)(instance)
    }
}

/// Erased to-many relation.
#[derive(Clone)]
pub struct RelatedCollection {
    key: String,
    target: ResourceTypeId,
    filter: String,
    accessor: ErasedFilterFn,
}

impl RelatedCollection {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn target(&self) -> &ResourceTypeId {
        &self.target
    }

    #[must_use]
    pub fn filter_name(&self) -> &str {
        &self.filter
    }

    /// # Errors
    /// Propagates the accessor's failure.
    pub fn filter_value(&self, instance: &Instance) -> Result<FilterValue, AccessorError> {
        (self.accessor)(instance)
    }
}

/// Immutable, type-erased metadata of a registered resource type.
pub struct ResourceType {
    id: ResourceTypeId,
    collection: Option<String>,
    types: Vec<String>,
    identifier: ErasedIdentifierFn,
    fields: Vec<FieldFunction>,
    binaries: Vec<BinaryFunction>,
    links: Vec<(String, String)>,
    embedded: Vec<RelatedModel>,
    linked: Vec<RelatedModel>,
    collections: Vec<RelatedCollection>,
}

impl ResourceType {
    #[must_use]
    pub fn from_spec<T: Any + Send + Sync>(spec: ResourceSpec<T>) -> Self {
        let mut fields = Vec::with_capacity(spec.fields.len());
        let mut binaries = Vec::new();

        for field in spec.fields {
            let accessor = match field.accessor {
                FieldAccessor::Value(f) => ErasedFieldAccessor::Value(Arc::new(move |i| {
                    f(downcast::<T>(i)?)
                })),
                FieldAccessor::Localized(f) => {
                    ErasedFieldAccessor::Localized(Arc::new(move |i, languages| {
                        f(downcast::<T>(i)?, languages)
                    }))
                }
                FieldAccessor::Binary(f) => {
                    binaries.push(BinaryFunction {
                        key: field.key.clone(),
                        accessor: Arc::new(move |i| f(downcast::<T>(i)?)),
                    });
                    ErasedFieldAccessor::Binary
                }
            };
            fields.push(FieldFunction {
                key: field.key,
                kind: field.kind,
                accessor,
            });
        }

        let identifier = spec.identifier.0;

        Self {
            id: spec.id,
            collection: spec.collection,
            types: spec.types,
            identifier: Arc::new(move |i| identifier(downcast::<T>(i)?)),
            fields,
            binaries,
            links: spec.links,
            embedded: spec.embedded.into_iter().map(erase_relation).collect(),
            linked: spec.linked.into_iter().map(erase_relation).collect(),
            collections: spec
                .collections
                .into_iter()
                .map(|c| {
                    let f = c.accessor;
                    RelatedCollection {
                        key: c.key,
                        target: c.target,
                        filter: c.filter,
                        accessor: Arc::new(move |i| f(downcast::<T>(i)?)),
                    }
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &ResourceTypeId {
        &self.id
    }

    #[must_use]
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    #[must_use]
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// # Errors
    /// Propagates the identifier accessor's failure.
    pub fn identifier(&self, instance: &Instance) -> Result<String, AccessorError> {
        (self.identifier)(instance)
    }

    #[must_use]
    pub fn field_functions(&self) -> &[FieldFunction] {
        &self.fields
    }

    #[must_use]
    pub fn binary_functions(&self) -> &[BinaryFunction] {
        &self.binaries
    }

    #[must_use]
    pub fn binary_function(&self, key: &str) -> Option<&BinaryFunction> {
        self.binaries.iter().find(|b| b.key == key)
    }

    #[must_use]
    pub fn links(&self) -> &[(String, String)] {
        &self.links
    }

    #[must_use]
    pub fn embedded_related_models(&self) -> &[RelatedModel] {
        &self.embedded
    }

    #[must_use]
    pub fn linked_related_models(&self) -> &[RelatedModel] {
        &self.linked
    }

    #[must_use]
    pub fn related_collections(&self) -> &[RelatedCollection] {
        &self.collections
    }

    /// First key declared more than once across fields, links, relations and collections.
    ///
    /// Plain JSON and JSON-LD write all of them into the same object.
    #[must_use]
    pub fn duplicate_key(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .map(|f| f.key.as_str())
            .chain(self.links.iter().map(|(key, _)| key.as_str()))
            .chain(self.embedded.iter().map(|r| r.key.as_str()))
            .chain(self.linked.iter().map(|r| r.key.as_str()))
            .chain(self.collections.iter().map(|c| c.key.as_str()))
            .find(|key| !seen.insert(*key))
    }
}

fn erase_relation<T: Any + Send + Sync>(relation: Relation<T>) -> RelatedModel {
    let f = relation.accessor;
    RelatedModel {
        key: relation.key,
        target: relation.target,
        accessor: Arc::new(move |i| f(downcast::<T>(i)?)),
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceType")
            .field("id", &self.id)
            .field("collection", &self.collection)
            .field("types", &self.types)
            .field(
                "fields",
                &self.fields.iter().map(|x| x.key.as_str()).collect::<Vec<_>>(),
            )
            .field("links", &self.links)
            .field(
                "embedded",
                &self.embedded.iter().map(|x| x.key.as_str()).collect::<Vec<_>>(),
            )
            .field(
                "linked",
                &self.linked.iter().map(|x| x.key.as_str()).collect::<Vec<_>>(),
            )
            .field(
                "collections",
                &self
                    .collections
                    .iter()
                    .map(|x| x.key.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

//! Values handed to the writers: single models, pages and embedded paths.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::HypermediaError;

/// A type-erased domain instance.
pub type Instance = dyn Any + Send + Sync;

/// Stable identifier of a registered resource type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceTypeId(Arc<str>);

impl ResourceTypeId {
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceTypeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceTypeId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for ResourceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ResourceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One domain instance paired with the identifier of its resource type.
#[derive(Clone)]
pub struct SingleModel {
    instance: Arc<Instance>,
    resource_type: ResourceTypeId,
}

impl SingleModel {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(
        instance: T,
        resource_type: impl Into<ResourceTypeId>,
    ) -> Self {
        Self::from_arc(Arc::new(instance), resource_type)
    }

    #[must_use]
    pub fn from_arc(instance: Arc<Instance>, resource_type: impl Into<ResourceTypeId>) -> Self {
        Self {
            instance,
            resource_type: resource_type.into(),
        }
    }

    #[must_use]
    pub fn instance(&self) -> &Instance {
        self.instance.as_ref()
    }

    #[must_use]
    pub fn resource_type(&self) -> &ResourceTypeId {
        &self.resource_type
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }
}

impl fmt::Debug for SingleModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleModel")
            .field("resource_type", &self.resource_type)
            .finish_non_exhaustive()
    }
}

/// An ordered slice of instances of one resource type plus pagination data.
#[derive(Clone)]
pub struct Page {
    resource_type: ResourceTypeId,
    items: Vec<Arc<Instance>>,
    pub items_per_page: u32,
    pub page_number: u32,
    pub total_count: u64,
    /// Path the page was requested on; defaults to the type's collection path.
    pub origin_path: Option<String>,
}

impl Page {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(
        resource_type: impl Into<ResourceTypeId>,
        items: Vec<T>,
        page_number: u32,
        items_per_page: u32,
        total_count: u64,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            items: items
                .into_iter()
                .map(|item| Arc::new(item) as Arc<Instance>)
                .collect(),
            items_per_page,
            page_number,
            total_count,
            origin_path: None,
        }
    }

    #[must_use]
    pub fn with_origin_path(mut self, path: impl Into<String>) -> Self {
        self.origin_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn resource_type(&self) -> &ResourceTypeId {
        &self.resource_type
    }

    /// Items of the page as single models, in page order.
    pub fn models(&self) -> impl Iterator<Item = SingleModel> + '_ {
        self.items
            .iter()
            .map(|item| SingleModel::from_arc(Arc::clone(item), self.resource_type.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `max(1, ceil(total_count / items_per_page))`
    #[must_use]
    pub fn last_page_number(&self) -> u64 {
        let per_page = u64::from(self.items_per_page.max(1));
        self.total_count.div_ceil(per_page).max(1)
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page_number) < self.last_page_number()
    }

    /// # Errors
    /// Returns `HypermediaError::InvalidPage` if `items_per_page` or `page_number` is zero.
    pub fn validate(&self) -> Result<(), HypermediaError> {
        if self.items_per_page == 0 {
            return Err(HypermediaError::InvalidPage(
                "items_per_page must be at least 1".to_owned(),
            ));
        }
        if self.page_number == 0 {
            return Err(HypermediaError::InvalidPage(
                "page_number must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("resource_type", &self.resource_type)
            .field("items", &self.items.len())
            .field("items_per_page", &self.items_per_page)
            .field("page_number", &self.page_number)
            .field("total_count", &self.total_count)
            .field("origin_path", &self.origin_path)
            .finish()
    }
}

/// Relation keys leading from the document root to the current position.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct EmbeddedPath(Vec<String>);

impl EmbeddedPath {
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path one level deeper, ending in `key`.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(key.to_owned());
        Self(segments)
    }

    /// Path of the owning resource; the root is its own parent.
    #[must_use]
    pub fn parent(&self) -> Self {
        match self.0.split_last() {
            Some((_, rest)) => Self(rest.to_vec()),
            None => Self::root(),
        }
    }

    /// Last relation key, `None` at the root.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn dot_path(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Debug for EmbeddedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EmbeddedPath({})", self.dot_path())
    }
}

impl fmt::Display for EmbeddedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dot_path())
    }
}

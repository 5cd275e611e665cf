//! Registry of resource types and filter providers.
//!
//! Registration swaps an immutable snapshot, so writers load one snapshot per
//! write and never take a lock while walking a graph. Registrations that land
//! during a write become visible to the next one.

use std::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::descriptor::{FilterValue, ResourceType};
use crate::error::{AccessorError, HypermediaError};
use crate::model::ResourceTypeId;

/// Translates the filter value of a related collection into URL query parameters.
pub trait FilterProvider: Send + Sync + 'static {
    type Filter: Any + Send + Sync;

    /// Value of the `filterName` query parameter.
    fn filter_name(&self, filter: &Self::Filter) -> String;

    fn query_param_map(&self, filter: &Self::Filter) -> BTreeMap<String, String>;
}

/// Object-safe view of a [`FilterProvider`] working on erased filter values.
pub trait ErasedFilterProvider: Send + Sync {
    /// # Errors
    /// Returns `AccessorError::TypeMismatch` if the value is not the provider's filter type.
    fn filter_name(&self, filter: &FilterValue) -> Result<String, AccessorError>;

    /// # Errors
    /// Returns `AccessorError::TypeMismatch` if the value is not the provider's filter type.
    fn query_param_map(&self, filter: &FilterValue) -> Result<BTreeMap<String, String>, AccessorError>;
}

fn downcast_filter<F: Any>(filter: &FilterValue) -> Result<&F, AccessorError> {
    filter
        .downcast_ref::<F>()
        .ok_or(AccessorError::TypeMismatch {
            expected: type_name::<F>(),
        })
}

impl<P: FilterProvider> ErasedFilterProvider for P {
    fn filter_name(&self, filter: &FilterValue) -> Result<String, AccessorError> {
        Ok(FilterProvider::filter_name(
            self,
            downcast_filter::<P::Filter>(filter)?,
        ))
    }

    fn query_param_map(&self, filter: &FilterValue) -> Result<BTreeMap<String, String>, AccessorError> {
        Ok(FilterProvider::query_param_map(
            self,
            downcast_filter::<P::Filter>(filter)?,
        ))
    }
}

/// Point-in-time view of every registration.
#[derive(Clone, Default)]
pub struct RegistrySnapshot {
    types: HashMap<ResourceTypeId, Arc<ResourceType>>,
    filters: HashMap<String, Arc<dyn ErasedFilterProvider>>,
}

impl RegistrySnapshot {
    /// # Errors
    /// Returns `HypermediaError::UnregisteredType` if no type is registered under `id`.
    pub fn resource_type(&self, id: &ResourceTypeId) -> Result<&Arc<ResourceType>, HypermediaError> {
        self.types
            .get(id)
            .ok_or_else(|| HypermediaError::UnregisteredType(id.to_string()))
    }

    #[must_use]
    pub fn filter_provider(&self, name: &str) -> Option<&Arc<dyn ErasedFilterProvider>> {
        self.filters.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.types.keys().collect();
        types.sort();
        let mut filters: Vec<_> = self.filters.keys().collect();
        filters.sort();
        f.debug_struct("RegistrySnapshot")
            .field("types", &types)
            .field("filters", &filters)
            .finish()
    }
}

/// Shared registry of resource types, read concurrently by writers.
#[derive(Default)]
pub struct ResourceRegistry {
    inner: ArcSwap<RegistrySnapshot>,
}

impl ResourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type, replacing any previous registration with the same id.
    ///
    /// # Errors
    /// Returns `HypermediaError::DuplicateKey` if two fields, links, relations or
    /// collections of the type share a key. The registry is left unchanged.
    pub fn register(
        &self,
        resource_type: ResourceType,
    ) -> Result<Option<Arc<ResourceType>>, HypermediaError> {
        if let Some(key) = resource_type.duplicate_key() {
            tracing::warn!(
                resource_type = %resource_type.id(),
                key,
                "Rejecting resource type with duplicate key"
            );
            return Err(HypermediaError::DuplicateKey {
                resource_type: resource_type.id().to_string(),
                key: key.to_owned(),
            });
        }
        let resource_type = Arc::new(resource_type);
        let id = resource_type.id().clone();
        tracing::debug!(resource_type = %id, "Registering resource type");
        let previous = self.inner.rcu(|current| {
            let mut next = RegistrySnapshot::clone(current);
            next.types.insert(id.clone(), Arc::clone(&resource_type));
            next
        });
        Ok(previous.types.get(&id).cloned())
    }

    pub fn deregister(&self, id: &ResourceTypeId) -> Option<Arc<ResourceType>> {
        tracing::debug!(resource_type = %id, "Deregistering resource type");
        let previous = self.inner.rcu(|current| {
            let mut next = RegistrySnapshot::clone(current);
            next.types.remove(id);
            next
        });
        previous.types.get(id).cloned()
    }

    /// Register the provider resolving filters declared under `name`.
    pub fn register_filter_provider<P: FilterProvider>(&self, name: impl Into<String>, provider: P) {
        let name = name.into();
        let provider: Arc<dyn ErasedFilterProvider> = Arc::new(provider);
        self.inner.rcu(|current| {
            let mut next = RegistrySnapshot::clone(current);
            next.filters.insert(name.clone(), Arc::clone(&provider));
            next
        });
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.inner.load_full()
    }

    #[must_use]
    pub fn get(&self, id: &ResourceTypeId) -> Option<Arc<ResourceType>> {
        self.inner.load().types.get(id).cloned()
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceRegistry")
            .field(&*self.inner.load())
            .finish()
    }
}

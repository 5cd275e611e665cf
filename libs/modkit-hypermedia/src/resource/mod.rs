//! Resource metadata and its registry.

pub mod descriptor;
pub mod registry;

pub use descriptor::{
    BinaryFile, BinaryFunction, CollectionRelation, Field, FieldFunction, FieldKind, FilterValue,
    Identifier, RelatedCollection, RelatedModel, Relation, ResourceSpec, ResourceType,
};
pub use registry::{ErasedFilterProvider, FilterProvider, RegistrySnapshot, ResourceRegistry};

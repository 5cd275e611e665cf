//! Hypermedia document writer for `ModKit`
//!
//! Turns domain objects into HAL, JSON-LD or plain JSON documents using
//! per-type metadata registered at runtime. It includes:
//! - Resource metadata and a concurrent registry (`ResourceType`, `ResourceRegistry`)
//! - URL resolution with a rewrite hook (`UrlResolver`)
//! - Graph, page and error writers driving pluggable format mappers
//! - Media-type dispatch and `Accept` negotiation (`MapperRegistry`, `negotiate`)
//! - Layered configuration (`HypermediaConfig`)
//!
//! ```ignore
//! let registry = Arc::new(ResourceRegistry::new());
//! registry.register(ResourceType::from_spec(person_spec()))?;
//!
//! let representor = Representor::with_default_mappers(HypermediaConfig::default(), registry)?;
//! let ctx = RequestContext::new(Url::parse("http://host/api")?);
//! let rendered = representor.write_single(HAL_JSON, &SingleModel::new(person, "person"), &AllowAll, &ctx)?;
//! ```
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod paging;
pub mod problem;
pub mod representor;
pub mod request;
pub mod resource;
pub mod selection;
pub mod url_resolver;
pub mod writer;

pub use config::{ConfigError, HypermediaConfig, PagingConfig, RewriteRule};
pub use error::{AccessorError, ErrorKind, HypermediaError};
pub use mapper::{
    APPLICATION_JSON, Document, ErrorMessageMapper, HAL_JSON, JSON_LD, MapperRegistry,
    MessageMapper, PageMessageMapper, negotiate,
};
pub use model::{EmbeddedPath, Instance, Page, ResourceTypeId, SingleModel};
pub use paging::PageRequest;
pub use problem::{APPLICATION_PROBLEM_JSON, Problem};
pub use representor::Representor;
pub use request::RequestContext;
pub use resource::{
    BinaryFile, CollectionRelation, Field, FilterProvider, Identifier, Relation, ResourceRegistry,
    ResourceSpec, ResourceType,
};
pub use selection::{AllowAll, FnSelection, RequestSelection, SelectionPolicy};
pub use url_resolver::{PrefixRewriter, UriRewriter, UrlResolver};
pub use writer::Rendered;

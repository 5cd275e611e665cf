//! Format strategies.
//!
//! A writer walks a resource graph and reports what it finds to a mapper; the
//! mapper decides where in the [`Document`] each piece lands. For one resource
//! the callbacks arrive in this order:
//!
//! ```text
//! on_start
//!   (map_field | map_link | map_types)*
//!   map_self_url?
//!   (map_embedded_resource_url <nested resource> | map_linked_resource_url)*
//! on_finish
//! ```
//!
//! A nested resource repeats the same sequence one level deeper, between the
//! `map_embedded_resource_url` call for its relation and the next callback of
//! its owner. Each callback receives the [`EmbeddedPath`] of the resource being
//! written (empty at the root). The two relation callbacks instead receive the
//! child path: `path.parent()` is the owner and `path.key()` the relation key.
//!
//! Every callback has a no-op default, so a format only implements what it renders.

pub mod dispatch;
pub mod document;
pub mod hal;
pub mod json_ld;
pub mod plain;
pub mod problem_json;

use serde_json::Value;
use url::Url;

use crate::model::{EmbeddedPath, Page, SingleModel};
use crate::problem::Problem;

pub use dispatch::{
    ErrorMapperRegistry, MapperRegistry, PageMapperRegistry, SingleMapperRegistry, negotiate,
};
pub use document::Document;
pub use hal::{HAL_JSON, HalMapper, HalPageMapper};
pub use json_ld::{HydraErrorMapper, JSON_LD, JsonLdMapper, JsonLdPageMapper};
pub use plain::{APPLICATION_JSON, PlainJsonMapper, PlainJsonPageMapper};
pub use problem_json::ProblemJsonMapper;

/// Renders one resource graph.
#[allow(unused_variables)]
pub trait MessageMapper: Send + Sync {
    /// Media type this mapper produces.
    fn media_type(&self) -> &str;

    fn on_start(&self, doc: &mut Document, path: &EmbeddedPath, model: &SingleModel) {}

    fn map_field(&self, doc: &mut Document, path: &EmbeddedPath, key: &str, value: &Value) {}

    fn map_link(&self, doc: &mut Document, path: &EmbeddedPath, key: &str, url: &str) {}

    fn map_types(&self, doc: &mut Document, path: &EmbeddedPath, types: &[String]) {}

    fn map_self_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {}

    /// Called before the related resource at `path` is written inline.
    fn map_embedded_resource_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {}

    /// Called for a relation rendered as a reference only.
    fn map_linked_resource_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {}

    fn on_finish(&self, doc: &mut Document, path: &EmbeddedPath, model: &SingleModel) {}
}

/// Renders a page of resources.
///
/// Items are written with [`PageMessageMapper::item_mapper`] into their own
/// documents, then handed over through `map_item` in page order. Afterwards the
/// counts and navigation URLs are reported:
///
/// ```text
/// on_start map_item* map_total_count map_item_count map_collection_url
///   map_current_page_url map_first_page_url map_previous_page_url?
///   map_next_page_url? map_last_page_url on_finish
/// ```
#[allow(unused_variables)]
pub trait PageMessageMapper: Send + Sync {
    fn media_type(&self) -> &str;

    /// Mapper used for every item of the page.
    fn item_mapper(&self) -> &dyn MessageMapper;

    fn on_start(&self, doc: &mut Document, page: &Page) {}

    fn map_item(&self, doc: &mut Document, page: &Page, item: Document) {}

    fn map_total_count(&self, doc: &mut Document, total_count: u64) {}

    fn map_item_count(&self, doc: &mut Document, count: usize) {}

    fn map_collection_url(&self, doc: &mut Document, url: &Url) {}

    fn map_current_page_url(&self, doc: &mut Document, url: &Url) {}

    fn map_first_page_url(&self, doc: &mut Document, url: &Url) {}

    fn map_previous_page_url(&self, doc: &mut Document, url: &Url) {}

    fn map_next_page_url(&self, doc: &mut Document, url: &Url) {}

    fn map_last_page_url(&self, doc: &mut Document, url: &Url) {}

    fn on_finish(&self, doc: &mut Document, page: &Page) {}
}

/// Renders a problem.
pub trait ErrorMessageMapper: Send + Sync {
    fn media_type(&self) -> &str;

    fn map(&self, doc: &mut Document, problem: &Problem);
}

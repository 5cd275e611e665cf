//! HAL (`application/hal+json`).
//!
//! Embedded resources live under `_embedded.<key>` of their owner; every
//! relation also gets a `_links.<key>.href` entry on the owner.

use serde_json::{Value, json};
use url::Url;

use super::{Document, MessageMapper, PageMessageMapper};
use crate::model::{EmbeddedPath, Page};

pub const HAL_JSON: &str = "application/hal+json";

const EMBEDDED: &str = "_embedded";
const LINKS: &str = "_links";

fn position(path: &EmbeddedPath) -> Vec<&str> {
    path.segments()
        .iter()
        .flat_map(|key| [EMBEDDED, key.as_str()])
        .collect()
}

fn put_link(doc: &mut Document, owner: &EmbeddedPath, rel: &str, href: &str) {
    let mut at = position(owner);
    at.extend([LINKS, rel]);
    doc.insert_at(&at, "href", Value::String(href.to_owned()));
}

fn put_relation(doc: &mut Document, child: &EmbeddedPath, url: &Url) {
    if let Some(key) = child.key() {
        put_link(doc, &child.parent(), key, url.as_str());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HalMapper;

impl MessageMapper for HalMapper {
    fn media_type(&self) -> &str {
        HAL_JSON
    }

    fn map_field(&self, doc: &mut Document, path: &EmbeddedPath, key: &str, value: &Value) {
        doc.insert_at(&position(path), key, value.clone());
    }

    fn map_link(&self, doc: &mut Document, path: &EmbeddedPath, key: &str, url: &str) {
        put_link(doc, path, key, url);
    }

    fn map_self_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        put_link(doc, path, "self", url.as_str());
    }

    fn map_embedded_resource_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        put_relation(doc, path, url);
    }

    fn map_linked_resource_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        put_relation(doc, path, url);
    }
}

/// HAL collection page: items under `_embedded.<resource type>`, counts at the
/// top level and navigation under `_links`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalPageMapper {
    item: HalMapper,
}

impl HalPageMapper {
    fn link(doc: &mut Document, rel: &str, url: &Url) {
        doc.insert_at(&[LINKS, rel], "href", Value::String(url.to_string()));
    }
}

impl PageMessageMapper for HalPageMapper {
    fn media_type(&self) -> &str {
        HAL_JSON
    }

    fn item_mapper(&self) -> &dyn MessageMapper {
        &self.item
    }

    fn on_start(&self, doc: &mut Document, page: &Page) {
        doc.insert_at(&[EMBEDDED], page.resource_type().as_str(), json!([]));
    }

    fn map_item(&self, doc: &mut Document, page: &Page, item: Document) {
        doc.push_at(&[EMBEDDED], page.resource_type().as_str(), item.into_value());
    }

    fn map_total_count(&self, doc: &mut Document, total_count: u64) {
        doc.insert_at::<&str>(&[], "total", json!(total_count));
    }

    fn map_item_count(&self, doc: &mut Document, count: usize) {
        doc.insert_at::<&str>(&[], "count", json!(count));
    }

    fn map_collection_url(&self, doc: &mut Document, url: &Url) {
        Self::link(doc, "collection", url);
    }

    fn map_current_page_url(&self, doc: &mut Document, url: &Url) {
        Self::link(doc, "self", url);
    }

    fn map_first_page_url(&self, doc: &mut Document, url: &Url) {
        Self::link(doc, "first", url);
    }

    fn map_previous_page_url(&self, doc: &mut Document, url: &Url) {
        Self::link(doc, "prev", url);
    }

    fn map_next_page_url(&self, doc: &mut Document, url: &Url) {
        Self::link(doc, "next", url);
    }

    fn map_last_page_url(&self, doc: &mut Document, url: &Url) {
        Self::link(doc, "last", url);
    }
}

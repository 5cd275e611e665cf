//! Plain JSON (`application/json`).
//!
//! Fields and links are properties, `self` holds the resource URL, linked
//! relations are URL strings and embedded relations nested objects.

use serde_json::{Value, json};
use url::Url;

use super::{Document, MessageMapper, PageMessageMapper};
use crate::model::{EmbeddedPath, Page};

pub const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJsonMapper;

impl MessageMapper for PlainJsonMapper {
    fn media_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn map_field(&self, doc: &mut Document, path: &EmbeddedPath, key: &str, value: &Value) {
        doc.insert_at(path.segments(), key, value.clone());
    }

    fn map_link(&self, doc: &mut Document, path: &EmbeddedPath, key: &str, url: &str) {
        doc.insert_at(path.segments(), key, Value::String(url.to_owned()));
    }

    fn map_self_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        doc.insert_at(path.segments(), "self", Value::String(url.to_string()));
    }

    fn map_embedded_resource_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        if let Some(key) = path.key() {
            doc.insert_at(path.parent().segments(), key, json!({ "self": url.as_str() }));
        }
    }

    fn map_linked_resource_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        if let Some(key) = path.key() {
            doc.insert_at(path.parent().segments(), key, Value::String(url.to_string()));
        }
    }
}

/// `{"items": [...], "total": n, "count": n, "collection": url, "pages": {...}}`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJsonPageMapper {
    item: PlainJsonMapper,
}

impl PlainJsonPageMapper {
    fn page_link(doc: &mut Document, key: &str, url: &Url) {
        doc.insert_at(&["pages"], key, Value::String(url.to_string()));
    }
}

impl PageMessageMapper for PlainJsonPageMapper {
    fn media_type(&self) -> &str {
        APPLICATION_JSON
    }

    fn item_mapper(&self) -> &dyn MessageMapper {
        &self.item
    }

    fn on_start(&self, doc: &mut Document, _page: &Page) {
        doc.insert_at::<&str>(&[], "items", json!([]));
    }

    fn map_item(&self, doc: &mut Document, _page: &Page, item: Document) {
        doc.push_at::<&str>(&[], "items", item.into_value());
    }

    fn map_total_count(&self, doc: &mut Document, total_count: u64) {
        doc.insert_at::<&str>(&[], "total", json!(total_count));
    }

    fn map_item_count(&self, doc: &mut Document, count: usize) {
        doc.insert_at::<&str>(&[], "count", json!(count));
    }

    fn map_collection_url(&self, doc: &mut Document, url: &Url) {
        doc.insert_at::<&str>(&[], "collection", Value::String(url.to_string()));
    }

    fn map_current_page_url(&self, doc: &mut Document, url: &Url) {
        Self::page_link(doc, "current", url);
    }

    fn map_first_page_url(&self, doc: &mut Document, url: &Url) {
        Self::page_link(doc, "first", url);
    }

    fn map_previous_page_url(&self, doc: &mut Document, url: &Url) {
        Self::page_link(doc, "prev", url);
    }

    fn map_next_page_url(&self, doc: &mut Document, url: &Url) {
        Self::page_link(doc, "next", url);
    }

    fn map_last_page_url(&self, doc: &mut Document, url: &Url) {
        Self::page_link(doc, "last", url);
    }
}

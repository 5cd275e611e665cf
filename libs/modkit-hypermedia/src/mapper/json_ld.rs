//! JSON-LD (`application/ld+json`) with Hydra collections and errors.

use serde_json::{Value, json};
use url::Url;

use super::{Document, ErrorMessageMapper, MessageMapper, PageMessageMapper};
use crate::model::{EmbeddedPath, Page, SingleModel};
use crate::problem::Problem;

pub const JSON_LD: &str = "application/ld+json";

const SCHEMA_VOCAB: &str = "http://schema.org/";
const HYDRA_CONTEXT: &str = "http://www.w3.org/ns/hydra/context.jsonld";

fn position(path: &EmbeddedPath) -> &[String] {
    path.segments()
}

fn node_ref(url: &str) -> Value {
    json!({ "@id": url })
}

/// Resources as JSON-LD nodes; relations become nested nodes keyed by relation name.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLdMapper;

impl MessageMapper for JsonLdMapper {
    fn media_type(&self) -> &str {
        JSON_LD
    }

    fn on_start(&self, doc: &mut Document, path: &EmbeddedPath, _model: &SingleModel) {
        if path.is_root() {
            doc.insert_at::<&str>(&[], "@context", json!({ "@vocab": SCHEMA_VOCAB }));
        }
    }

    fn map_field(&self, doc: &mut Document, path: &EmbeddedPath, key: &str, value: &Value) {
        doc.insert_at(position(path), key, value.clone());
    }

    fn map_link(&self, doc: &mut Document, path: &EmbeddedPath, key: &str, url: &str) {
        doc.insert_at(position(path), key, node_ref(url));
    }

    fn map_types(&self, doc: &mut Document, path: &EmbeddedPath, types: &[String]) {
        if !types.is_empty() {
            doc.insert_at(position(path), "@type", json!(types));
        }
    }

    fn map_self_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        doc.insert_at(position(path), "@id", Value::String(url.to_string()));
    }

    fn map_embedded_resource_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        if let Some(key) = path.key() {
            doc.insert_at(position(&path.parent()), key, node_ref(url.as_str()));
        }
    }

    fn map_linked_resource_url(&self, doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        if let Some(key) = path.key() {
            doc.insert_at(position(&path.parent()), key, node_ref(url.as_str()));
        }
    }
}

/// Hydra `Collection` with a `PartialCollectionView` for navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLdPageMapper {
    item: JsonLdMapper,
}

impl JsonLdPageMapper {
    fn view(doc: &mut Document, key: &str, url: &Url) {
        doc.insert_at(&["view"], key, Value::String(url.to_string()));
    }
}

impl PageMessageMapper for JsonLdPageMapper {
    fn media_type(&self) -> &str {
        JSON_LD
    }

    fn item_mapper(&self) -> &dyn MessageMapper {
        &self.item
    }

    fn on_start(&self, doc: &mut Document, _page: &Page) {
        doc.insert_at::<&str>(
            &[],
            "@context",
            json!([HYDRA_CONTEXT, { "@vocab": SCHEMA_VOCAB }]),
        );
        doc.insert_at::<&str>(&[], "@type", json!("Collection"));
        doc.insert_at::<&str>(&[], "member", json!([]));
    }

    fn map_item(&self, doc: &mut Document, _page: &Page, mut item: Document) {
        // Members share the collection's context.
        item.remove("@context");
        doc.push_at::<&str>(&[], "member", item.into_value());
    }

    fn map_total_count(&self, doc: &mut Document, total_count: u64) {
        doc.insert_at::<&str>(&[], "totalItems", json!(total_count));
    }

    fn map_item_count(&self, doc: &mut Document, count: usize) {
        doc.insert_at::<&str>(&[], "numberOfItems", json!(count));
    }

    fn map_collection_url(&self, doc: &mut Document, url: &Url) {
        doc.insert_at::<&str>(&[], "@id", Value::String(url.to_string()));
    }

    fn map_current_page_url(&self, doc: &mut Document, url: &Url) {
        Self::view(doc, "@id", url);
        doc.insert_at(&["view"], "@type", json!("PartialCollectionView"));
    }

    fn map_first_page_url(&self, doc: &mut Document, url: &Url) {
        Self::view(doc, "first", url);
    }

    fn map_previous_page_url(&self, doc: &mut Document, url: &Url) {
        Self::view(doc, "previous", url);
    }

    fn map_next_page_url(&self, doc: &mut Document, url: &Url) {
        Self::view(doc, "next", url);
    }

    fn map_last_page_url(&self, doc: &mut Document, url: &Url) {
        Self::view(doc, "last", url);
    }
}

/// Hydra `Error` node.
#[derive(Debug, Clone, Copy, Default)]
pub struct HydraErrorMapper;

impl ErrorMessageMapper for HydraErrorMapper {
    fn media_type(&self) -> &str {
        JSON_LD
    }

    fn map(&self, doc: &mut Document, problem: &Problem) {
        let root = doc.object_at::<&str>(&[]);
        root.insert("@context".to_owned(), json!(HYDRA_CONTEXT));
        root.insert("@type".to_owned(), json!("Error"));
        root.insert("title".to_owned(), json!(problem.title));
        root.insert("description".to_owned(), json!(problem.detail));
        root.insert("statusCode".to_owned(), json!(problem.status.as_u16()));
        if !problem.code.is_empty() {
            root.insert("code".to_owned(), json!(problem.code));
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn root_node_carries_context_types_and_id() {
        let mapper = JsonLdMapper;
        let mut doc = Document::new();
        let root = EmbeddedPath::root();
        let model = SingleModel::new((), "person");

        mapper.on_start(&mut doc, &root, &model);
        mapper.map_types(&mut doc, &root, &["Person".to_owned()]);
        mapper.map_self_url(&mut doc, &root, &Url::parse("http://host/p/person/1").unwrap());
        mapper.map_linked_resource_url(
            &mut doc,
            &root.child("employer"),
            &Url::parse("http://host/p/organization/3").unwrap(),
        );

        assert_eq!(
            doc.into_value(),
            json!({
                "@context": {"@vocab": "http://schema.org/"},
                "@type": ["Person"],
                "@id": "http://host/p/person/1",
                "employer": {"@id": "http://host/p/organization/3"}
            })
        );
    }

    #[test]
    fn nested_nodes_get_no_context() {
        let mut doc = Document::new();
        let author = EmbeddedPath::root().child("author");
        JsonLdMapper.on_start(&mut doc, &author, &SingleModel::new((), "person"));
        assert!(doc.is_empty());
    }

    #[test]
    fn members_drop_their_own_context() {
        let mapper = JsonLdPageMapper::default();
        let page = Page::new::<u8>("person", vec![], 1, 10, 0);
        let mut doc = Document::new();
        mapper.on_start(&mut doc, &page);

        let mut item = Document::new();
        item.insert_at::<&str>(&[], "@context", json!({"@vocab": SCHEMA_VOCAB}));
        item.insert_at::<&str>(&[], "name", json!("Ann"));
        mapper.map_item(&mut doc, &page, item);

        assert_eq!(doc.get("member"), Some(&json!([{"name": "Ann"}])));
    }

    #[test]
    fn hydra_error_shape() {
        let mut doc = Document::new();
        let problem = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "page must be at least 1")
            .with_code("HYPERMEDIA_INVALID_PAGE");
        HydraErrorMapper.map(&mut doc, &problem);
        assert_eq!(
            doc.into_value(),
            json!({
                "@context": HYDRA_CONTEXT,
                "@type": "Error",
                "title": "Bad Request",
                "description": "page must be at least 1",
                "statusCode": 400,
                "code": "HYPERMEDIA_INVALID_PAGE"
            })
        );
    }
}

#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Page writing: counts, navigation links and item rendering.

mod common;

use common::{Person, ann, ctx, frank, representor};
use modkit_hypermedia::{
    AllowAll, ErrorKind, HAL_JSON, HypermediaError, JSON_LD, Page, PageRequest, PagingConfig,
    Problem, RequestContext, RequestSelection,
};
use serde_json::{Value, json};
use url::Url;

fn people(count: u64) -> Vec<Person> {
    (1..=count)
        .map(|id| Person {
            id,
            name: format!("P{id}"),
            ..ann()
        })
        .collect()
}

fn hal_page(page: &Page) -> Value {
    let rendered = representor()
        .write_page(HAL_JSON, page, &AllowAll, &ctx())
        .unwrap();
    assert_eq!(rendered.media_type, HAL_JSON);
    serde_json::from_str(&rendered.body).unwrap()
}

#[test]
fn middle_page_links_both_ways() {
    let page = Page::new("person", people(2), 2, 2, 5);
    assert_eq!(page.last_page_number(), 3);

    let body = hal_page(&page);
    assert_eq!(body["total"], 5);
    assert_eq!(body["count"], 2);
    assert_eq!(
        body["_links"],
        json!({
            "collection": {"href": "http://host/p/person"},
            "self": {"href": "http://host/p/person?page=2&per_page=2"},
            "first": {"href": "http://host/p/person?page=1&per_page=2"},
            "prev": {"href": "http://host/p/person?page=1&per_page=2"},
            "next": {"href": "http://host/p/person?page=3&per_page=2"},
            "last": {"href": "http://host/p/person?page=3&per_page=2"}
        })
    );

    let items = body["_embedded"]["person"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "P1");
    assert_eq!(items[0]["_links"]["self"]["href"], "http://host/p/person/1");
    assert_eq!(items[1]["_links"]["self"]["href"], "http://host/p/person/2");
}

#[test]
fn first_page_has_no_previous_link() {
    let body = hal_page(&Page::new("person", people(2), 1, 2, 5));
    assert!(body["_links"].get("prev").is_none());
    assert!(body["_links"].get("next").is_some());
}

#[test]
fn last_page_has_no_next_link() {
    let body = hal_page(&Page::new("person", people(1), 3, 2, 5));
    assert!(body["_links"].get("prev").is_some());
    assert!(body["_links"].get("next").is_none());
    assert_eq!(
        body["_links"]["last"]["href"],
        "http://host/p/person?page=3&per_page=2"
    );
}

#[test]
fn empty_collection_is_a_single_page() {
    let body = hal_page(&Page::new::<Person>("person", vec![], 1, 30, 0));
    assert_eq!(body["total"], 0);
    assert_eq!(body["count"], 0);
    assert_eq!(body["_embedded"]["person"], json!([]));
    assert!(body["_links"].get("prev").is_none());
    assert!(body["_links"].get("next").is_none());
    assert_eq!(
        body["_links"]["last"]["href"],
        "http://host/p/person?page=1&per_page=30"
    );
}

#[test]
fn navigation_presence_matches_page_bounds() {
    for total in [0_u64, 1, 4, 5, 6, 17] {
        for per_page in [1_u32, 2, 5] {
            let last = total.div_ceil(u64::from(per_page)).max(1);
            for number in 1..=u32::try_from(last).unwrap() + 1 {
                let page = Page::new::<Person>("person", vec![], number, per_page, total);
                let body = hal_page(&page);
                let links = &body["_links"];
                assert_eq!(links.get("prev").is_some(), number > 1, "{total}/{per_page}/{number}");
                assert_eq!(
                    links.get("next").is_some(),
                    u64::from(number) < last,
                    "{total}/{per_page}/{number}"
                );
                assert_eq!(
                    links["last"]["href"],
                    format!("http://host/p/person?page={last}&per_page={per_page}")
                );
            }
        }
    }
}

#[test]
fn origin_path_drives_navigation_urls() {
    let page = Page::new("person", people(1), 1, 1, 2).with_origin_path("/p/person?sort=name&page=7");
    let body = hal_page(&page);
    assert_eq!(
        body["_links"]["collection"]["href"],
        "http://host/p/person?sort=name&page=7"
    );
    assert_eq!(
        body["_links"]["next"]["href"],
        "http://host/p/person?sort=name&page=2&per_page=1"
    );
}

#[test]
fn items_are_independent_traversal_roots() {
    let mut first = frank();
    first.id = 10;
    let second = frank();
    let page = Page::new("person", vec![first, second], 1, 2, 2);
    let selection = RequestSelection::from_query("embedded=employer");

    let rendered = representor()
        .write_page(HAL_JSON, &page, &selection, &ctx())
        .unwrap();
    let body: Value = serde_json::from_str(&rendered.body).unwrap();

    for item in body["_embedded"]["person"].as_array().unwrap() {
        assert_eq!(item["_embedded"]["employer"]["name"], "Acme");
        assert!(item["_embedded"]["employer"].get("_embedded").is_none());
    }
}

#[test]
fn hydra_collection_shape() {
    let page = Page::new("person", people(2), 2, 2, 5);
    let rendered = representor()
        .write_page(JSON_LD, &page, &AllowAll, &ctx())
        .unwrap();
    let body: Value = serde_json::from_str(&rendered.body).unwrap();

    assert_eq!(body["@type"], "Collection");
    assert_eq!(body["@id"], "http://host/p/person");
    assert_eq!(body["totalItems"], 5);
    assert_eq!(body["numberOfItems"], 2);
    assert_eq!(body["view"]["@type"], "PartialCollectionView");
    assert_eq!(body["view"]["previous"], "http://host/p/person?page=1&per_page=2");
    assert_eq!(body["view"]["next"], "http://host/p/person?page=3&per_page=2");

    let members = body["member"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m.get("@context").is_none()));
    assert_eq!(members[0]["@id"], "http://host/p/person/1");
}

#[test]
fn plain_json_page_shape() {
    let page = Page::new("person", people(1), 1, 1, 1);
    let rendered = representor()
        .write_page("application/json", &page, &AllowAll, &ctx())
        .unwrap();
    let body: Value = serde_json::from_str(&rendered.body).unwrap();

    assert_eq!(body["collection"], "http://host/p/person");
    assert_eq!(body["items"][0]["self"], "http://host/p/person/1");
    assert_eq!(
        body["pages"],
        json!({
            "current": "http://host/p/person?page=1&per_page=1",
            "first": "http://host/p/person?page=1&per_page=1",
            "last": "http://host/p/person?page=1&per_page=1"
        })
    );
}

#[test]
fn zero_page_size_is_rejected() {
    let err = representor()
        .write_page(HAL_JSON, &Page::new("person", people(1), 1, 0, 1), &AllowAll, &ctx())
        .unwrap_err();
    assert!(matches!(err, HypermediaError::InvalidPage(_)));
    assert_eq!(err.kind(), ErrorKind::Request);
    assert_eq!(Problem::from(&err).status, http::StatusCode::BAD_REQUEST);
}

#[test]
fn page_of_unregistered_type_fails() {
    let err = representor()
        .write_page(HAL_JSON, &Page::new("ghost", people(1), 1, 1, 1), &AllowAll, &ctx())
        .unwrap_err();
    assert!(matches!(err, HypermediaError::UnregisteredType(_)));
}

#[test]
fn unknown_page_media_type_fails() {
    let err = representor()
        .write_page("text/csv", &Page::new("person", people(1), 1, 1, 1), &AllowAll, &ctx())
        .unwrap_err();
    assert!(matches!(
        err,
        HypermediaError::NoMapper { ref media_type, ref resource_type }
            if media_type == "text/csv" && resource_type == "person"
    ));
}

#[test]
fn page_request_feeds_page_numbers() {
    let config = PagingConfig::default();
    let request = PageRequest::from_query("page=2&per_page=3", &config).unwrap();
    let all = people(7);
    let offset = usize::try_from(request.offset()).unwrap();
    let items: Vec<Person> = all.into_iter().skip(offset).take(3).collect();
    let page = Page::new("person", items, request.page_number, request.items_per_page, 7);

    let ctx = RequestContext::new(Url::parse("http://host/api/").unwrap());
    let rendered = representor()
        .write_page(HAL_JSON, &page, &AllowAll, &ctx)
        .unwrap();
    let body: Value = serde_json::from_str(&rendered.body).unwrap();

    assert_eq!(body["_embedded"]["person"][0]["name"], "P4");
    assert_eq!(
        body["_links"]["next"]["href"],
        "http://host/api/p/person?page=3&per_page=3"
    );
}

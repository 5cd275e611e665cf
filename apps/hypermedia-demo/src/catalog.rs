//! In-memory book catalog and its resource metadata.

use std::collections::BTreeMap;
use std::sync::Arc;

use modkit_hypermedia::{
    CollectionRelation, Field, FilterProvider, HypermediaError, Identifier, Relation,
    ResourceRegistry, ResourceSpec, ResourceType,
};

pub const BOOK: &str = "book";
pub const AUTHOR: &str = "author";

#[derive(Debug, Clone)]
pub struct Author {
    pub id: u32,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub original_title: Option<String>,
    pub year: u16,
    pub tags: Vec<String>,
    pub author: Author,
}

/// Filter value of an author's `books` collection.
pub struct WrittenBy(u32);

struct WrittenByProvider;

impl FilterProvider for WrittenByProvider {
    type Filter = WrittenBy;

    fn filter_name(&self, _filter: &WrittenBy) -> String {
        "writtenBy".to_owned()
    }

    fn query_param_map(&self, filter: &WrittenBy) -> BTreeMap<String, String> {
        BTreeMap::from([("authorId".to_owned(), filter.0.to_string())])
    }
}

fn author_type() -> ResourceType {
    ResourceType::from_spec(ResourceSpec {
        types: vec!["Person".to_owned()],
        fields: vec![
            Field::scalar("name", |a: &Author| Some(a.name.clone())),
            Field::scalar("country", |a: &Author| a.country.clone()),
        ],
        collections: vec![CollectionRelation::new(
            "books",
            BOOK,
            "writtenBy",
            |a: &Author| WrittenBy(a.id),
        )],
        ..ResourceSpec::new(AUTHOR, Identifier::new(|a: &Author| a.id.to_string()))
    })
}

fn book_type() -> ResourceType {
    ResourceType::from_spec(ResourceSpec {
        types: vec!["Book".to_owned()],
        fields: vec![
            Field::localized("title", |b: &Book, languages: &[String]| {
                let prefers_original = languages
                    .first()
                    .is_some_and(|lang| !lang.starts_with("en"));
                match &b.original_title {
                    Some(original) if prefers_original => Some(original.clone()),
                    _ => Some(b.title.clone()),
                }
            }),
            Field::scalar("year", |b: &Book| Some(b.year)),
            Field::list("tags", |b: &Book| (!b.tags.is_empty()).then(|| b.tags.clone())),
            Field::link("lookup", |b: &Book| {
                Some(format!("https://openlibrary.org/isbn/{}", b.isbn))
            }),
        ],
        embedded: vec![Relation::new("author", AUTHOR, |b: &Book| {
            Some(b.author.clone())
        })],
        ..ResourceSpec::new(BOOK, Identifier::new(|b: &Book| b.isbn.clone()))
    })
}

/// Registry with the catalog's resource types and filter providers.
pub fn registry() -> Result<Arc<ResourceRegistry>, HypermediaError> {
    let registry = Arc::new(ResourceRegistry::new());
    registry.register(author_type())?;
    registry.register(book_type())?;
    registry.register_filter_provider("writtenBy", WrittenByProvider);
    Ok(registry)
}

pub fn books() -> Vec<Book> {
    let lem = Author {
        id: 1,
        name: "Stanislaw Lem".to_owned(),
        country: Some("PL".to_owned()),
    };
    let le_guin = Author {
        id: 2,
        name: "Ursula K. Le Guin".to_owned(),
        country: Some("US".to_owned()),
    };

    vec![
        Book {
            isbn: "9780156027601".to_owned(),
            title: "Solaris".to_owned(),
            original_title: None,
            year: 1961,
            tags: vec!["science-fiction".to_owned()],
            author: lem.clone(),
        },
        Book {
            isbn: "9780156262606".to_owned(),
            title: "The Cyberiad".to_owned(),
            original_title: Some("Cyberiada".to_owned()),
            year: 1965,
            tags: vec!["science-fiction".to_owned(), "satire".to_owned()],
            author: lem,
        },
        Book {
            isbn: "9780441478125".to_owned(),
            title: "The Left Hand of Darkness".to_owned(),
            original_title: None,
            year: 1969,
            tags: Vec::new(),
            author: le_guin,
        },
    ]
}

pub fn find_book(isbn: &str) -> Option<Book> {
    books().into_iter().find(|b| b.isbn == isbn)
}

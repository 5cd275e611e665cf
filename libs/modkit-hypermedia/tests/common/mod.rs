#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

//! Shared fixtures: a small library domain (people, organizations, books) and a
//! mapper recording every callback it receives.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use modkit_hypermedia::mapper::MessageMapper;
use modkit_hypermedia::{
    BinaryFile, CollectionRelation, Document, EmbeddedPath, Field, FilterProvider,
    HypermediaConfig, Identifier, Relation, RequestContext, ResourceRegistry, ResourceSpec,
    ResourceType, Representor, SingleModel,
};
use serde_json::Value;
use url::Url;

pub const SERVER: &str = "http://host";
pub const RECORDING: &str = "application/x-recording";

#[derive(Debug, Clone)]
pub struct Organization {
    pub id: u64,
    pub name: String,
    pub parent: Option<Box<Organization>>,
}

#[derive(Debug, Clone)]
pub struct Person {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub nicknames: Vec<String>,
    pub employer: Option<Organization>,
}

#[derive(Debug, Clone)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<Person>,
    pub publisher: Option<Organization>,
    pub cover: Option<Vec<u8>>,
}

/// Filter value of the `books` collection of a person.
pub struct ByAuthor(pub u64);

pub struct ByAuthorProvider;

impl FilterProvider for ByAuthorProvider {
    type Filter = ByAuthor;

    fn filter_name(&self, _filter: &ByAuthor) -> String {
        "byAuthor".to_owned()
    }

    fn query_param_map(&self, filter: &ByAuthor) -> BTreeMap<String, String> {
        BTreeMap::from([("authorId".to_owned(), filter.0.to_string())])
    }
}

pub fn ann() -> Person {
    Person {
        id: 1,
        name: "Ann".to_owned(),
        email: None,
        nicknames: Vec::new(),
        employer: None,
    }
}

pub fn acme() -> Organization {
    Organization {
        id: 3,
        name: "Acme".to_owned(),
        parent: Some(Box::new(Organization {
            id: 4,
            name: "Acme Holding".to_owned(),
            parent: None,
        })),
    }
}

pub fn frank() -> Person {
    Person {
        id: 7,
        name: "Frank".to_owned(),
        email: Some("frank@example.org".to_owned()),
        nicknames: vec!["F".to_owned()],
        employer: Some(acme()),
    }
}

pub fn dune() -> Book {
    Book {
        id: "dune".to_owned(),
        title: "Dune".to_owned(),
        author: Some(frank()),
        publisher: Some(Organization {
            id: 9,
            name: "Chilton".to_owned(),
            parent: None,
        }),
        cover: Some(vec![0x89, 0x50]),
    }
}

pub fn person_type() -> ResourceType {
    ResourceType::from_spec(ResourceSpec {
        types: vec!["Person".to_owned()],
        fields: vec![
            Field::scalar("name", |p: &Person| Some(p.name.clone())),
            Field::scalar("email", |p: &Person| p.email.clone()),
            Field::list("nicknames", |p: &Person| {
                (!p.nicknames.is_empty()).then(|| p.nicknames.clone())
            }),
        ],
        links: vec![("avatar".to_owned(), "http://x/a.png".to_owned())],
        embedded: vec![Relation::new("employer", "organization", |p: &Person| {
            p.employer.clone()
        })],
        collections: vec![CollectionRelation::new(
            "books",
            "book",
            "byAuthor",
            |p: &Person| ByAuthor(p.id),
        )],
        ..ResourceSpec::new("person", Identifier::new(|p: &Person| p.id.to_string()))
    })
}

pub fn organization_type() -> ResourceType {
    ResourceType::from_spec(ResourceSpec {
        types: vec!["Organization".to_owned()],
        fields: vec![Field::scalar("name", |o: &Organization| Some(o.name.clone()))],
        embedded: vec![Relation::new("parent", "organization", |o: &Organization| {
            o.parent.as_deref().cloned()
        })],
        ..ResourceSpec::new(
            "organization",
            Identifier::new(|o: &Organization| o.id.to_string()),
        )
    })
}

pub fn book_type() -> ResourceType {
    ResourceType::from_spec(ResourceSpec {
        types: vec!["Book".to_owned(), "CreativeWork".to_owned()],
        fields: vec![
            Field::scalar("title", |b: &Book| Some(b.title.clone())),
            Field::binary("cover", |b: &Book| {
                b.cover.clone().map(|content| BinaryFile {
                    content,
                    mime_type: "image/png".to_owned(),
                })
            }),
            Field::localized("summary", |_: &Book, languages: &[String]| {
                let spanish = languages.first().is_some_and(|l| l.starts_with("es"));
                Some(if spanish { "Planeta desierto" } else { "Desert planet" }.to_owned())
            }),
        ],
        embedded: vec![Relation::new("author", "person", |b: &Book| b.author.clone())],
        linked: vec![Relation::new("publisher", "organization", |b: &Book| {
            b.publisher.clone()
        })],
        ..ResourceSpec::new("book", Identifier::new(|b: &Book| b.id.clone()))
    })
}

/// Registry holding the person, organization and book types plus the `byAuthor` filter.
pub fn registry() -> Arc<ResourceRegistry> {
    let registry = Arc::new(ResourceRegistry::new());
    registry.register(person_type()).unwrap();
    registry.register(organization_type()).unwrap();
    registry.register(book_type()).unwrap();
    registry.register_filter_provider("byAuthor", ByAuthorProvider);
    registry
}

pub fn representor() -> Representor {
    Representor::with_default_mappers(HypermediaConfig::default(), registry()).unwrap()
}

pub fn ctx() -> RequestContext {
    RequestContext::new(Url::parse(SERVER).unwrap())
}

pub fn person_model(person: Person) -> SingleModel {
    SingleModel::new(person, "person")
}

pub fn book_model(book: Book) -> SingleModel {
    SingleModel::new(book, "book")
}

/// Mapper writing nothing and recording every callback as one line.
#[derive(Debug, Default)]
pub struct RecordingMapper {
    events: Mutex<Vec<String>>,
}

impl RecordingMapper {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Return the recorded events and start over.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

fn at(path: &EmbeddedPath) -> String {
    if path.is_root() {
        "$".to_owned()
    } else {
        format!("$.{path}")
    }
}

impl MessageMapper for RecordingMapper {
    fn media_type(&self) -> &str {
        RECORDING
    }

    fn on_start(&self, _doc: &mut Document, path: &EmbeddedPath, _model: &SingleModel) {
        self.record(format!("start {}", at(path)));
    }

    fn map_field(&self, _doc: &mut Document, path: &EmbeddedPath, key: &str, value: &Value) {
        self.record(format!("field {} {key}={value}", at(path)));
    }

    fn map_link(&self, _doc: &mut Document, path: &EmbeddedPath, key: &str, url: &str) {
        self.record(format!("link {} {key}={url}", at(path)));
    }

    fn map_types(&self, _doc: &mut Document, path: &EmbeddedPath, types: &[String]) {
        self.record(format!("types {} {}", at(path), types.join(",")));
    }

    fn map_self_url(&self, _doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        self.record(format!("self {} {url}", at(path)));
    }

    fn map_embedded_resource_url(&self, _doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        self.record(format!("embedded {} {url}", at(path)));
    }

    fn map_linked_resource_url(&self, _doc: &mut Document, path: &EmbeddedPath, url: &Url) {
        self.record(format!("linked {} {url}", at(path)));
    }

    fn on_finish(&self, _doc: &mut Document, path: &EmbeddedPath, _model: &SingleModel) {
        self.record(format!("finish {}", at(path)));
    }
}

/// Representor over `registry` with the default mappers plus the recording mapper.
pub fn recording_representor_with(
    config: HypermediaConfig,
    registry: Arc<ResourceRegistry>,
) -> (Representor, Arc<RecordingMapper>) {
    let recorder = RecordingMapper::shared();
    let mut representor = Representor::with_default_mappers(config, registry).unwrap();
    representor
        .single_mappers_mut()
        .register(RECORDING, Arc::clone(&recorder) as Arc<dyn MessageMapper>);
    (representor, recorder)
}

pub fn recording_representor() -> (Representor, Arc<RecordingMapper>) {
    recording_representor_with(HypermediaConfig::default(), registry())
}

#[derive(Clone, Default)]
struct WarningCapture {
    warnings: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarningCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.warnings.lock().unwrap().push(visitor.0);
        }
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Messages of the warnings emitted while `f` runs on this thread.
pub fn capture_warnings(f: impl FnOnce()) -> Vec<String> {
    use tracing_subscriber::layer::SubscriberExt;

    let capture = WarningCapture::default();
    let warnings = Arc::clone(&capture.warnings);
    tracing::subscriber::with_default(tracing_subscriber::registry().with(capture), f);
    warnings.lock().unwrap().clone()
}

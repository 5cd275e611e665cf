//! Writers turning models into documents through a mapper.

pub mod error;
pub mod graph;
pub mod page;

use std::fmt;

use crate::request::RequestContext;
use crate::resource::RegistrySnapshot;
use crate::selection::SelectionPolicy;
use crate::url_resolver::UrlResolver;

pub use error::ErrorWriter;
pub use graph::GraphWriter;
pub use page::PageWriter;

/// Everything shared by the writers of one request.
///
/// The registry snapshot is taken once, so a concurrent registration never
/// shows up halfway through a document.
pub struct WriteContext<'a> {
    pub snapshot: &'a RegistrySnapshot,
    pub resolver: &'a UrlResolver,
    pub policy: &'a dyn SelectionPolicy,
    pub request: &'a RequestContext,
    /// Relation paths longer than this are linked instead of embedded.
    pub max_embed_depth: usize,
}

impl fmt::Debug for WriteContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteContext")
            .field("snapshot", &self.snapshot)
            .field("resolver", &self.resolver)
            .field("request", &self.request)
            .field("max_embed_depth", &self.max_embed_depth)
            .finish_non_exhaustive()
    }
}

/// A serialized document and the media type it was rendered as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub media_type: String,
    pub body: String,
}

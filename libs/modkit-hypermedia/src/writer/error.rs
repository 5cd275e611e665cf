//! Writer for problems. Never fails.

use http::HeaderMap;

use crate::mapper::{Document, ErrorMapperRegistry, ErrorMessageMapper, ProblemJsonMapper};
use crate::problem::Problem;

use super::Rendered;

pub struct ErrorWriter<'a> {
    mappers: &'a ErrorMapperRegistry,
    default_media_type: &'a str,
}

impl<'a> ErrorWriter<'a> {
    #[must_use]
    pub fn new(mappers: &'a ErrorMapperRegistry, default_media_type: &'a str) -> Self {
        Self {
            mappers,
            default_media_type,
        }
    }

    /// Render `problem` as `media_type`.
    ///
    /// Without a mapper for `media_type` the default media type is used, and
    /// without a mapper for that one the built-in problem+json rendering.
    #[must_use]
    pub fn write(&self, media_type: Option<&str>, problem: &Problem, headers: &HeaderMap) -> Rendered {
        if let Some(mapper) =
            media_type.and_then(|media_type| self.mappers.select(media_type, problem, headers))
        {
            return render(mapper.as_ref(), problem);
        }

        if let Some(requested) = media_type {
            tracing::warn!(
                requested,
                fallback = self.default_media_type,
                "No error mapper for requested media type, using default"
            );
        }
        match self.mappers.select(self.default_media_type, problem, headers) {
            Some(mapper) => render(mapper.as_ref(), problem),
            None => render(&ProblemJsonMapper::default(), problem),
        }
    }
}

fn render(mapper: &dyn ErrorMessageMapper, problem: &Problem) -> Rendered {
    let mut doc = Document::new();
    mapper.map(&mut doc, problem);
    Rendered {
        media_type: mapper.media_type().to_owned(),
        body: doc.to_string(),
    }
}

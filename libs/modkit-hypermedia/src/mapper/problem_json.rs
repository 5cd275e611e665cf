//! Problem details as JSON.

use serde_json::Value;

use super::{Document, ErrorMessageMapper};
use crate::problem::{APPLICATION_PROBLEM_JSON, Problem};

/// Serializes the [`Problem`] as is.
///
/// Registered for `application/problem+json` by default; the same shape can be
/// served under other JSON media types through [`ProblemJsonMapper::with_media_type`].
#[derive(Debug, Clone)]
pub struct ProblemJsonMapper {
    media_type: String,
}

impl Default for ProblemJsonMapper {
    fn default() -> Self {
        Self::with_media_type(APPLICATION_PROBLEM_JSON)
    }
}

impl ProblemJsonMapper {
    #[must_use]
    pub fn with_media_type(media_type: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
        }
    }
}

impl ErrorMessageMapper for ProblemJsonMapper {
    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn map(&self, doc: &mut Document, problem: &Problem) {
        match serde_json::to_value(problem) {
            Ok(Value::Object(map)) => doc.object_at::<&str>(&[]).extend(map),
            Ok(_) | Err(_) => {
                tracing::error!(title = %problem.title, "Problem did not serialize to an object");
            }
        }
    }
}

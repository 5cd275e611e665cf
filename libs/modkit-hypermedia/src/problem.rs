//! RFC 9457 problem details rendered on the error path.

use http::StatusCode;
use serde::{Serialize, Serializer};

use crate::error::{ErrorKind, HypermediaError};

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Problem details describing a failed write.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    #[serde(serialize_with = "serialize_status_code")]
    pub status: StatusCode,
    pub detail: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instance: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: title.into(),
            status,
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            trace_id: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }
}

impl From<&HypermediaError> for Problem {
    fn from(err: &HypermediaError) -> Self {
        let (status, title) = match err.kind() {
            ErrorKind::Configuration => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Resource Not Correctly Registered",
            ),
            ErrorKind::Data => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            ErrorKind::Request => (StatusCode::BAD_REQUEST, "Bad Request"),
        };
        Problem::new(status, title, err.to_string()).with_code(err.code())
    }
}

impl From<HypermediaError> for Problem {
    fn from(err: HypermediaError) -> Self {
        Problem::from(&err)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn problem_builder_pattern() {
        let p = Problem::new(StatusCode::NOT_FOUND, "Not Found", "no such person")
            .with_code("PERSON_NOT_FOUND")
            .with_instance("/p/person/42")
            .with_trace_id("req-1");

        assert_eq!(p.status, StatusCode::NOT_FOUND);
        assert_eq!(p.code, "PERSON_NOT_FOUND");
        assert_eq!(p.instance, "/p/person/42");
        assert_eq!(p.trace_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn problem_serializes_status_as_u16_and_skips_empty() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "nope");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["type"], "about:blank");
        assert!(json.get("instance").is_none());
        assert!(json.get("trace_id").is_none());
    }

    #[test]
    fn configuration_error_maps_to_500() {
        let err = HypermediaError::UnregisteredType("person".to_owned());
        let p = Problem::from(&err);
        assert_eq!(p.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(p.code, "HYPERMEDIA_UNREGISTERED_TYPE");
        assert!(p.detail.contains("person"));
    }

    #[test]
    fn request_error_maps_to_400() {
        let p: Problem = HypermediaError::InvalidPage("page must be >= 1".to_owned()).into();
        assert_eq!(p.status, StatusCode::BAD_REQUEST);
        assert_eq!(p.code, "HYPERMEDIA_INVALID_PAGE");
    }
}

//! Error types for hypermedia document writing.
//!
//! Three families of failures are distinguished:
//! - **Configuration**: a resource type, mapper or filter provider was not wired
//!   (no matching mapper, unregistered type, missing filter provider, unresolvable
//!   self URI). Never retried, never silently defaulted.
//! - **Data**: an accessor failed while computing a field, relation or identifier.
//!   The whole document is discarded.
//! - **Request**: the client supplied unusable paging parameters.
//!
//! An optional relation whose accessor yields nothing is not an error at all.

use std::fmt;

/// Coarse classification used when mapping errors to problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Data,
    Request,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => f.write_str("configuration"),
            ErrorKind::Data => f.write_str("data"),
            ErrorKind::Request => f.write_str("request"),
        }
    }
}

/// Failure reported by a user-supplied accessor.
#[derive(thiserror::Error, Debug)]
pub enum AccessorError {
    /// The erased instance handed to the accessor was not of the declared type.
    #[error("instance is not a `{expected}`")]
    TypeMismatch { expected: &'static str },

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl AccessorError {
    /// Convenience constructor for ad-hoc accessor failures.
    #[must_use]
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Failed(anyhow::Error::msg(message))
    }
}

/// Unified error type for resolving, dispatching and writing documents.
#[derive(thiserror::Error, Debug)]
pub enum HypermediaError {
    #[error("no message mapper for media type '{media_type}' and resource type '{resource_type}'")]
    NoMapper {
        media_type: String,
        resource_type: String,
    },

    #[error("resource type '{0}' is not registered")]
    UnregisteredType(String),

    #[error("resource type '{resource_type}' declares key '{key}' more than once")]
    DuplicateKey { resource_type: String, key: String },

    #[error(
        "no filter provider '{filter}' for collection '{key}' of resource type '{resource_type}'"
    )]
    MissingFilterProvider {
        resource_type: String,
        key: String,
        filter: String,
    },

    #[error("unable to resolve URI for resource type '{resource_type}': {reason}")]
    UnresolvableUri {
        resource_type: String,
        reason: String,
    },

    #[error("accessor '{key}' of resource type '{resource_type}' failed: {source}")]
    Accessor {
        resource_type: String,
        key: String,
        #[source]
        source: AccessorError,
    },

    #[error("invalid page: {0}")]
    InvalidPage(String),

    #[error("failed to serialize document: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HypermediaError {
    pub(crate) fn accessor(
        resource_type: impl Into<String>,
        key: impl Into<String>,
        source: AccessorError,
    ) -> Self {
        Self::Accessor {
            resource_type: resource_type.into(),
            key: key.into(),
            source,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            HypermediaError::NoMapper { .. }
            | HypermediaError::UnregisteredType(_)
            | HypermediaError::DuplicateKey { .. }
            | HypermediaError::MissingFilterProvider { .. }
            | HypermediaError::UnresolvableUri { .. } => ErrorKind::Configuration,
            HypermediaError::Accessor { .. } | HypermediaError::Serialization(_) => {
                ErrorKind::Data
            }
            HypermediaError::InvalidPage(_) => ErrorKind::Request,
        }
    }

    /// Stable machine-readable code carried into problem documents.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            HypermediaError::NoMapper { .. } => "HYPERMEDIA_NO_MAPPER",
            HypermediaError::UnregisteredType(_) => "HYPERMEDIA_UNREGISTERED_TYPE",
            HypermediaError::DuplicateKey { .. } => "HYPERMEDIA_DUPLICATE_KEY",
            HypermediaError::MissingFilterProvider { .. } => "HYPERMEDIA_MISSING_FILTER_PROVIDER",
            HypermediaError::UnresolvableUri { .. } => "HYPERMEDIA_UNRESOLVABLE_URI",
            HypermediaError::Accessor { .. } => "HYPERMEDIA_ACCESSOR_FAILED",
            HypermediaError::InvalidPage(_) => "HYPERMEDIA_INVALID_PAGE",
            HypermediaError::Serialization(_) => "HYPERMEDIA_SERIALIZATION",
        }
    }
}

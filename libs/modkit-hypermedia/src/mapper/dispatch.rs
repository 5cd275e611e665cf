//! Media-type negotiation and mapper selection.
//!
//! Mappers are registered as `(media type, predicate, strategy)` entries. The
//! first entry, in registration order, whose media type equals the requested one
//! and whose predicate accepts the subject wins.

use std::fmt;
use std::sync::Arc;

use http::HeaderMap;

use super::{ErrorMessageMapper, MessageMapper, PageMessageMapper};
use crate::model::{Page, SingleModel};
use crate::problem::Problem;
use crate::request::parse_quality;

/// Predicate deciding whether an entry handles a given subject.
pub type SupportsFn<S> = Arc<dyn Fn(&S, &HeaderMap) -> bool + Send + Sync>;

struct MapperEntry<M: ?Sized, S: ?Sized> {
    media_type: String,
    supports: SupportsFn<S>,
    strategy: Arc<M>,
}

/// Ordered list of mapper entries for one kind of subject.
pub struct MapperRegistry<M: ?Sized, S: ?Sized> {
    entries: Vec<MapperEntry<M, S>>,
}

pub type SingleMapperRegistry = MapperRegistry<dyn MessageMapper, SingleModel>;
pub type PageMapperRegistry = MapperRegistry<dyn PageMessageMapper, Page>;
pub type ErrorMapperRegistry = MapperRegistry<dyn ErrorMessageMapper, Problem>;

impl<M: ?Sized, S: ?Sized> Default for MapperRegistry<M, S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<M: ?Sized, S: ?Sized + 'static> MapperRegistry<M, S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `strategy` for every subject of `media_type`.
    pub fn register(&mut self, media_type: impl Into<String>, strategy: Arc<M>) {
        self.register_with(media_type, |_: &S, _: &HeaderMap| true, strategy);
    }

    /// Register `strategy` for the subjects of `media_type` accepted by `supports`.
    pub fn register_with<F>(&mut self, media_type: impl Into<String>, supports: F, strategy: Arc<M>)
    where
        F: Fn(&S, &HeaderMap) -> bool + Send + Sync + 'static,
    {
        let media_type = media_type.into();
        tracing::debug!(media_type = %media_type, position = self.entries.len(), "Registering mapper");
        self.entries.push(MapperEntry {
            media_type,
            supports: Arc::new(supports),
            strategy,
        });
    }

    /// First entry matching `media_type` whose predicate accepts `subject`.
    #[must_use]
    pub fn select(&self, media_type: &str, subject: &S, headers: &HeaderMap) -> Option<Arc<M>> {
        self.entries
            .iter()
            .find(|entry| {
                entry.media_type.eq_ignore_ascii_case(media_type) && (entry.supports)(subject, headers)
            })
            .map(|entry| Arc::clone(&entry.strategy))
    }

    /// Registered media types, first registration first, without duplicates.
    #[must_use]
    pub fn media_types(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.iter().any(|m| m.eq_ignore_ascii_case(&entry.media_type)) {
                seen.push(&entry.media_type);
            }
        }
        seen
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<M: ?Sized, S: ?Sized + 'static> fmt::Debug for MapperRegistry<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("media_types", &self.media_types())
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Pick the media type from `available` the `accept` header prefers.
///
/// Each available type takes the q-value of the most specific matching range
/// (`type/subtype` over `type/*` over `*/*`). The highest q-value wins and ties
/// go to the earlier entry of `available`. Without an `Accept` header the first
/// available type is chosen. `None` means nothing acceptable is available.
#[must_use]
pub fn negotiate(accept: Option<&str>, available: &[&str]) -> Option<String> {
    let Some(accept) = accept.map(str::trim).filter(|a| !a.is_empty()) else {
        return available.first().map(|m| (*m).to_owned());
    };

    let ranges: Vec<(mime::Mime, u16)> = accept
        .split(',')
        .filter_map(|raw| {
            let range: mime::Mime = raw.trim().parse().ok()?;
            let quality = range
                .get_param("q")
                .map_or(Some(1000), |q| parse_quality(q.as_str()))?;
            Some((range, quality))
        })
        .collect();

    let mut best: Option<(&str, u16)> = None;
    for candidate in available {
        let Ok(parsed) = candidate.parse::<mime::Mime>() else {
            continue;
        };
        let Some(quality) = quality_of(&parsed, &ranges) else {
            continue;
        };
        if quality > 0 && best.is_none_or(|(_, q)| quality > q) {
            best = Some((*candidate, quality));
        }
    }
    best.map(|(media_type, _)| media_type.to_owned())
}

fn quality_of(candidate: &mime::Mime, ranges: &[(mime::Mime, u16)]) -> Option<u16> {
    ranges
        .iter()
        .filter_map(|(range, quality)| {
            let specificity = if range.type_() == mime::STAR {
                1
            } else if range.type_() != candidate.type_() {
                return None;
            } else if range.subtype() == mime::STAR {
                2
            } else if range.essence_str().eq_ignore_ascii_case(candidate.essence_str()) {
                3
            } else {
                return None;
            };
            Some((specificity, *quality))
        })
        .max_by_key(|(specificity, _)| *specificity)
        .map(|(_, quality)| quality)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::mapper::Document;
    use http::HeaderValue;

    struct Named(&'static str);

    impl ErrorMessageMapper for Named {
        fn media_type(&self) -> &str {
            self.0
        }

        fn map(&self, doc: &mut Document, _problem: &Problem) {
            doc.insert_at::<&str>(&[], "by", serde_json::json!(self.0));
        }
    }

    fn problem(status: http::StatusCode) -> Problem {
        Problem::new(status, "t", "d")
    }

    #[test]
    fn first_matching_entry_wins() {
        let mut registry = ErrorMapperRegistry::new();
        registry.register("application/json", Arc::new(Named("first")));
        registry.register("application/json", Arc::new(Named("second")));

        let picked = registry
            .select("application/json", &problem(http::StatusCode::BAD_REQUEST), &HeaderMap::new())
            .unwrap();
        assert_eq!(picked.media_type(), "first");
    }

    #[test]
    fn predicate_can_skip_entries() {
        let mut registry = ErrorMapperRegistry::new();
        registry.register_with(
            "application/json",
            |p: &Problem, _: &HeaderMap| p.status.is_server_error(),
            Arc::new(Named("server")),
        );
        registry.register("application/json", Arc::new(Named("fallback")));

        let headers = HeaderMap::new();
        let server = registry
            .select("application/json", &problem(http::StatusCode::BAD_GATEWAY), &headers)
            .unwrap();
        let client = registry
            .select("application/json", &problem(http::StatusCode::NOT_FOUND), &headers)
            .unwrap();
        assert_eq!(server.media_type(), "server");
        assert_eq!(client.media_type(), "fallback");
    }

    #[test]
    fn predicates_see_request_headers() {
        let mut registry = ErrorMapperRegistry::new();
        registry.register_with(
            "application/json",
            |_: &Problem, h: &HeaderMap| h.contains_key("x-debug"),
            Arc::new(Named("debug")),
        );

        let mut headers = HeaderMap::new();
        let p = problem(http::StatusCode::BAD_REQUEST);
        assert!(registry.select("application/json", &p, &headers).is_none());
        headers.insert("x-debug", HeaderValue::from_static("1"));
        assert!(registry.select("application/json", &p, &headers).is_some());
    }

    #[test]
    fn unknown_media_type_selects_nothing() {
        let mut registry = ErrorMapperRegistry::new();
        registry.register("application/json", Arc::new(Named("json")));
        assert!(
            registry
                .select("text/html", &problem(http::StatusCode::BAD_REQUEST), &HeaderMap::new())
                .is_none()
        );
        assert_eq!(registry.media_types(), vec!["application/json"]);
    }

    const AVAILABLE: [&str; 3] = ["application/hal+json", "application/ld+json", "application/json"];

    #[test]
    fn missing_accept_picks_first_registered() {
        assert_eq!(
            negotiate(None, &AVAILABLE).as_deref(),
            Some("application/hal+json")
        );
        assert_eq!(negotiate(Some("  "), &AVAILABLE).as_deref(), Some("application/hal+json"));
        assert_eq!(negotiate(None, &[]), None);
    }

    #[test]
    fn highest_quality_wins() {
        let accept = "application/json;q=0.5, application/ld+json";
        assert_eq!(
            negotiate(Some(accept), &AVAILABLE).as_deref(),
            Some("application/ld+json")
        );
    }

    #[test]
    fn specific_ranges_override_wildcards() {
        let accept = "application/*;q=0.9, application/hal+json;q=0.1";
        assert_eq!(
            negotiate(Some(accept), &AVAILABLE).as_deref(),
            Some("application/ld+json")
        );
    }

    #[test]
    fn wildcard_ties_go_to_registration_order() {
        assert_eq!(
            negotiate(Some("*/*"), &AVAILABLE).as_deref(),
            Some("application/hal+json")
        );
    }

    #[test]
    fn unacceptable_types_yield_none() {
        assert_eq!(negotiate(Some("text/html"), &AVAILABLE), None);
        assert_eq!(
            negotiate(Some("application/json;q=0"), &["application/json"]),
            None
        );
    }
}

//! Request-scoped inputs of a write.

use http::HeaderMap;
use http::header::{ACCEPT, ACCEPT_LANGUAGE};
use url::Url;

/// Everything a write needs to know about the request it answers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    server_url: Url,
    headers: HeaderMap,
    languages: Vec<String>,
}

impl RequestContext {
    /// Context for a request served under `server_url` (e.g. `http://host/api`).
    #[must_use]
    pub fn new(server_url: Url) -> Self {
        Self {
            server_url,
            headers: HeaderMap::new(),
            languages: Vec::new(),
        }
    }

    /// Attach request headers; preferred languages are taken from `Accept-Language`.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.languages = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(parse_accept_language)
            .unwrap_or_default();
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Preferred languages, best first.
    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Raw `Accept` header, if any.
    #[must_use]
    pub fn accept(&self) -> Option<&str> {
        self.headers.get(ACCEPT).and_then(|v| v.to_str().ok())
    }
}

/// Parse an `Accept-Language` header into language tags ordered by q-value.
///
/// Tags with `q=0` are dropped, as is the `*` wildcard. Ties keep header order.
#[must_use]
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(u16, String)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let weight = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(parse_quality)
                .unwrap_or(1000);
            (weight > 0).then(|| (weight, tag.to_owned()))
        })
        .collect();
    weighted.sort_by(|a, b| b.0.cmp(&a.0));
    weighted.into_iter().map(|(_, tag)| tag).collect()
}

/// Parse a q-value into thousandths, so that weights compare as integers.
pub(crate) fn parse_quality(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    let (int, frac) = raw.split_once('.').unwrap_or((raw, ""));
    if frac.len() > 3 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let frac_value: u16 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<3}").parse().ok()?
    };
    match int {
        "0" => Some(frac_value),
        "1" if frac_value == 0 => Some(1000),
        _ => None,
    }
}

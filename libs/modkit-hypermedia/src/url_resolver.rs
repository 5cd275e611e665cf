//! Resolution of absolute item, collection, filtered-collection and binary URLs.
//!
//! Relative paths are built from the configured prefixes and the type's
//! collection name, passed through the optional rewrite hook and then made
//! absolute against the request's server URL. A path that cannot be turned into
//! a valid URL resolves to `None`; callers decide whether that is fatal.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::config::{HypermediaConfig, RewriteRule};
use crate::error::AccessorError;
use crate::model::Instance;
use crate::paging::{PAGE_PARAM, PER_PAGE_PARAM};
use crate::request::RequestContext;
use crate::resource::{ErasedFilterProvider, FilterValue, ResourceType};

/// Query parameter carrying the provider's filter name.
pub const FILTER_NAME_PARAM: &str = "filterName";

/// Hook transforming relative paths before they are made absolute.
pub trait UriRewriter: Send + Sync {
    fn rewrite(&self, path: &str) -> String;
}

/// Ordered prefix replacements; the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct PrefixRewriter {
    rules: Vec<RewriteRule>,
}

impl PrefixRewriter {
    #[must_use]
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }
}

impl UriRewriter for PrefixRewriter {
    fn rewrite(&self, path: &str) -> String {
        self.rules
            .iter()
            .find_map(|rule| {
                path.strip_prefix(rule.from.as_str())
                    .filter(|rest| rest.is_empty() || rest.starts_with(['/', '?']))
                    .map(|rest| format!("{}{rest}", rule.to))
            })
            .unwrap_or_else(|| path.to_owned())
    }
}

pub struct UrlResolver {
    resource_prefix: String,
    binary_prefix: String,
    rewriter: Option<Arc<dyn UriRewriter>>,
}

impl UrlResolver {
    /// Resolver using the configured prefixes and, if any, the configured rewrites.
    #[must_use]
    pub fn new(config: &HypermediaConfig) -> Self {
        let rewriter: Option<Arc<dyn UriRewriter>> = if config.rewrites.is_empty() {
            None
        } else {
            Some(Arc::new(PrefixRewriter::new(config.rewrites.clone())))
        };
        Self {
            resource_prefix: config.resource_prefix.trim_matches('/').to_owned(),
            binary_prefix: config.binary_prefix.trim_matches('/').to_owned(),
            rewriter,
        }
    }

    /// Replace the rewrite hook.
    #[must_use]
    pub fn with_rewriter(mut self, rewriter: Arc<dyn UriRewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    /// Relative collection path of `resource_type`, e.g. `/p/person`.
    #[must_use]
    pub fn collection_path(&self, resource_type: &ResourceType) -> Option<String> {
        let name = resource_type.collection()?;
        Some(format!(
            "/{}/{}",
            self.resource_prefix,
            urlencoding::encode(name)
        ))
    }

    #[must_use]
    pub fn resolve_collection_url(
        &self,
        ctx: &RequestContext,
        resource_type: &ResourceType,
    ) -> Option<Url> {
        let path = self.collection_path(resource_type)?;
        self.absolute(ctx, &path)
    }

    /// `None` means the type has no URL of its own or the result is not a valid URL.
    ///
    /// # Errors
    /// Propagates a failure of the identifier accessor.
    pub fn resolve_item_url(
        &self,
        ctx: &RequestContext,
        resource_type: &ResourceType,
        instance: &Instance,
    ) -> Result<Option<Url>, AccessorError> {
        let Some(base) = self.collection_path(resource_type) else {
            return Ok(None);
        };
        let id = resource_type.identifier(instance)?;
        let path = format!("{base}/{}", urlencoding::encode(&id));
        Ok(self.absolute(ctx, &path))
    }

    /// Collection URL of `resource_type` narrowed by `filter`.
    ///
    /// # Errors
    /// Returns an error if the provider rejects the filter value.
    pub fn resolve_filtered_collection_url(
        &self,
        ctx: &RequestContext,
        resource_type: &ResourceType,
        provider: &dyn ErasedFilterProvider,
        filter: &FilterValue,
    ) -> Result<Option<Url>, AccessorError> {
        let Some(mut url) = self.resolve_collection_url(ctx, resource_type) else {
            return Ok(None);
        };
        let params = provider.query_param_map(filter)?;
        let filter_name = provider.filter_name(filter)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(FILTER_NAME_PARAM, &filter_name);
        }
        Ok(Some(url))
    }

    /// URL serving the binary field `key` of the instance identified by `id`.
    #[must_use]
    pub fn resolve_binary_url(
        &self,
        ctx: &RequestContext,
        resource_type: &ResourceType,
        id: &str,
        key: &str,
    ) -> Option<Url> {
        let name = resource_type.collection()?;
        let path = format!(
            "/{}/{}/{}/{}",
            self.binary_prefix,
            urlencoding::encode(name),
            urlencoding::encode(id),
            urlencoding::encode(key)
        );
        self.absolute(ctx, &path)
    }

    /// Resolve a caller-supplied relative path (e.g. a page's origin path).
    #[must_use]
    pub fn resolve_path(&self, ctx: &RequestContext, path: &str) -> Option<Url> {
        self.absolute(ctx, path)
    }

    fn absolute(&self, ctx: &RequestContext, path: &str) -> Option<Url> {
        let path = match &self.rewriter {
            Some(rewriter) => rewriter.rewrite(path),
            None => path.to_owned(),
        };
        let base = directory_of(ctx.server_url());
        // "./" keeps a first segment containing ':' from reading as a scheme.
        let relative = format!("./{}", path.trim_start_matches('/'));
        match base.join(&relative) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::debug!(base = %base, path = %relative, error = %err, "Discarding unparsable URL");
                None
            }
        }
    }
}

/// `server` without query or fragment, with a trailing slash so joins append to its path.
fn directory_of(server: &Url) -> Url {
    let mut base = server.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

impl fmt::Debug for UrlResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlResolver")
            .field("resource_prefix", &self.resource_prefix)
            .field("binary_prefix", &self.binary_prefix)
            .field("rewriter", &self.rewriter.is_some())
            .finish()
    }
}

/// `collection` with `page` and `per_page` set, replacing any previous values.
#[must_use]
pub fn page_url(collection: &Url, page_number: u64, items_per_page: u32) -> Url {
    let mut url = collection.clone();
    let kept: Vec<(String, String)> = collection
        .query_pairs()
        .filter(|(k, _)| k != PAGE_PARAM && k != PER_PAGE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(PAGE_PARAM, &page_number.to_string());
        pairs.append_pair(PER_PAGE_PARAM, &items_per_page.to_string());
    }
    url
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::resource::{FilterProvider, Identifier, ResourceSpec};
    use std::collections::BTreeMap;

    struct Person {
        id: String,
    }

    struct ByName(&'static str);

    struct ByNameProvider;

    impl FilterProvider for ByNameProvider {
        type Filter = ByName;

        fn filter_name(&self, _filter: &ByName) -> String {
            "byName".to_owned()
        }

        fn query_param_map(&self, filter: &ByName) -> BTreeMap<String, String> {
            BTreeMap::from([("name".to_owned(), filter.0.to_owned())])
        }
    }

    fn person_type() -> ResourceType {
        ResourceType::from_spec(ResourceSpec::new(
            "person",
            Identifier::new(|p: &Person| p.id.clone()),
        ))
    }

    fn ctx(server: &str) -> RequestContext {
        RequestContext::new(Url::parse(server).unwrap())
    }

    #[test]
    fn item_url_is_base_path_plus_identifier() {
        let resolver = UrlResolver::new(&HypermediaConfig::default());
        let url = resolver
            .resolve_item_url(&ctx("http://host"), &person_type(), &Person { id: "1".into() })
            .unwrap()
            .unwrap();
        assert_eq!(url.as_str(), "http://host/p/person/1");
    }

    #[test]
    fn server_path_prefix_is_preserved() {
        let resolver = UrlResolver::new(&HypermediaConfig::default());
        let url = resolver
            .resolve_collection_url(&ctx("http://host/api/"), &person_type())
            .unwrap();
        assert_eq!(url.as_str(), "http://host/api/p/person");
    }

    #[test]
    fn identifiers_are_percent_encoded() {
        let resolver = UrlResolver::new(&HypermediaConfig::default());
        let url = resolver
            .resolve_item_url(
                &ctx("http://host"),
                &person_type(),
                &Person {
                    id: "a b/c".into(),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(url.as_str(), "http://host/p/person/a%20b%2Fc");
    }

    #[test]
    fn type_without_collection_has_no_urls() {
        let resolver = UrlResolver::new(&HypermediaConfig::default());
        let rt = ResourceType::from_spec(ResourceSpec {
            collection: None,
            ..ResourceSpec::new("person", Identifier::new(|p: &Person| p.id.clone()))
        });
        assert!(resolver.resolve_collection_url(&ctx("http://host"), &rt).is_none());
        assert!(
            resolver
                .resolve_item_url(&ctx("http://host"), &rt, &Person { id: "1".into() })
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn configured_rewrites_apply_before_absolutizing() {
        let config = HypermediaConfig {
            rewrites: vec![RewriteRule {
                from: "/p/person".to_owned(),
                to: "/people".to_owned(),
            }],
            ..HypermediaConfig::default()
        };
        let resolver = UrlResolver::new(&config);
        let url = resolver
            .resolve_item_url(&ctx("http://host"), &person_type(), &Person { id: "7".into() })
            .unwrap()
            .unwrap();
        assert_eq!(url.as_str(), "http://host/people/7");
    }

    #[test]
    fn prefix_rewrite_respects_segment_boundaries() {
        let rewriter = PrefixRewriter::new(vec![RewriteRule {
            from: "/p/person".to_owned(),
            to: "/people".to_owned(),
        }]);
        assert_eq!(rewriter.rewrite("/p/personal/1"), "/p/personal/1");
        assert_eq!(rewriter.rewrite("/p/person"), "/people");
        assert_eq!(rewriter.rewrite("/p/person?x=1"), "/people?x=1");
    }

    #[test]
    fn filtered_collection_url_carries_filter_params() {
        let resolver = UrlResolver::new(&HypermediaConfig::default());
        let filter: FilterValue = Arc::new(ByName("Ann Lee"));
        let url = resolver
            .resolve_filtered_collection_url(
                &ctx("http://host"),
                &person_type(),
                &ByNameProvider,
                &filter,
            )
            .unwrap()
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://host/p/person?name=Ann+Lee&filterName=byName"
        );
    }

    #[test]
    fn binary_url_uses_binary_prefix() {
        let resolver = UrlResolver::new(&HypermediaConfig::default());
        let url = resolver
            .resolve_binary_url(&ctx("http://host"), &person_type(), "1", "avatar")
            .unwrap();
        assert_eq!(url.as_str(), "http://host/b/person/1/avatar");
    }

    #[test]
    fn relative_origin_paths_resolve_against_server() {
        let resolver = UrlResolver::new(&HypermediaConfig::default());
        let url = resolver
            .resolve_path(&ctx("http://host/api"), "p/person?sort=name")
            .unwrap();
        assert_eq!(url.as_str(), "http://host/api/p/person?sort=name");
    }

    #[test]
    fn server_query_and_fragment_are_not_carried_into_urls() {
        let resolver = UrlResolver::new(&HypermediaConfig::default());
        let server = ctx("http://host/api?tenant=1#top");

        let item = resolver
            .resolve_item_url(&server, &person_type(), &Person { id: "1".into() })
            .unwrap()
            .unwrap();
        assert_eq!(item.as_str(), "http://host/api/p/person/1");

        let origin = resolver
            .resolve_path(&server, "/p/person?sort=name&page=7")
            .unwrap();
        assert_eq!(origin.as_str(), "http://host/api/p/person?sort=name&page=7");

        let filtered = resolver
            .resolve_filtered_collection_url(
                &server,
                &person_type(),
                &ByNameProvider,
                &(Arc::new(ByName("Ann")) as FilterValue),
            )
            .unwrap()
            .unwrap();
        assert_eq!(filtered.as_str(), "http://host/api/p/person?name=Ann&filterName=byName");
    }

    #[test]
    fn rewritten_segments_with_colons_stay_relative() {
        let config = HypermediaConfig {
            rewrites: vec![RewriteRule {
                from: "/p/person".to_owned(),
                to: "/v1:people".to_owned(),
            }],
            ..HypermediaConfig::default()
        };
        let url = UrlResolver::new(&config)
            .resolve_item_url(&ctx("http://host"), &person_type(), &Person { id: "7".into() })
            .unwrap()
            .unwrap();
        assert_eq!(url.as_str(), "http://host/v1:people/7");
    }

    #[test]
    fn page_url_replaces_existing_paging_params() {
        let collection = Url::parse("http://host/p/person?sort=name&page=9").unwrap();
        let url = page_url(&collection, 2, 10);
        assert_eq!(
            url.as_str(),
            "http://host/p/person?sort=name&page=2&per_page=10"
        );
    }
}

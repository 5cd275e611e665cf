//! Facade tying registry, URL resolution and mapper dispatch together.

use std::fmt;
use std::sync::Arc;

use crate::config::{ConfigError, HypermediaConfig};
use crate::error::{ErrorKind, HypermediaError};
use crate::mapper::{
    APPLICATION_JSON, ErrorMapperRegistry, HAL_JSON, HalMapper, HalPageMapper, HydraErrorMapper,
    JSON_LD, JsonLdMapper, JsonLdPageMapper, PageMapperRegistry, PlainJsonMapper,
    PlainJsonPageMapper, ProblemJsonMapper, SingleMapperRegistry, negotiate,
};
use crate::model::{Page, SingleModel};
use crate::problem::{APPLICATION_PROBLEM_JSON, Problem};
use crate::request::RequestContext;
use crate::resource::{RegistrySnapshot, ResourceRegistry};
use crate::selection::SelectionPolicy;
use crate::url_resolver::{UriRewriter, UrlResolver};
use crate::writer::{ErrorWriter, GraphWriter, PageWriter, Rendered, WriteContext};

/// Entry point for rendering resources, pages and errors.
///
/// Mappers are registered at startup through the `*_mappers_mut` accessors;
/// resource types may be registered at any time through [`Representor::registry`].
pub struct Representor {
    config: HypermediaConfig,
    registry: Arc<ResourceRegistry>,
    resolver: UrlResolver,
    single_mappers: SingleMapperRegistry,
    page_mappers: PageMapperRegistry,
    error_mappers: ErrorMapperRegistry,
}

impl Representor {
    /// Representor with no mappers registered.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if [`HypermediaConfig::validate`] rejects `config`.
    pub fn new(
        config: HypermediaConfig,
        registry: Arc<ResourceRegistry>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolver = UrlResolver::new(&config);
        Ok(Self {
            config,
            registry,
            resolver,
            single_mappers: SingleMapperRegistry::new(),
            page_mappers: PageMapperRegistry::new(),
            error_mappers: ErrorMapperRegistry::new(),
        })
    }

    /// Representor with the built-in HAL, JSON-LD and plain JSON mappers, HAL first.
    ///
    /// # Errors
    /// Same as [`Representor::new`].
    pub fn with_default_mappers(
        config: HypermediaConfig,
        registry: Arc<ResourceRegistry>,
    ) -> Result<Self, ConfigError> {
        let mut representor = Self::new(config, registry)?;

        representor.single_mappers.register(HAL_JSON, Arc::new(HalMapper));
        representor.single_mappers.register(JSON_LD, Arc::new(JsonLdMapper));
        representor
            .single_mappers
            .register(APPLICATION_JSON, Arc::new(PlainJsonMapper));

        representor
            .page_mappers
            .register(HAL_JSON, Arc::new(HalPageMapper::default()));
        representor
            .page_mappers
            .register(JSON_LD, Arc::new(JsonLdPageMapper::default()));
        representor
            .page_mappers
            .register(APPLICATION_JSON, Arc::new(PlainJsonPageMapper::default()));

        representor
            .error_mappers
            .register(APPLICATION_PROBLEM_JSON, Arc::new(ProblemJsonMapper::default()));
        representor
            .error_mappers
            .register(JSON_LD, Arc::new(HydraErrorMapper));
        representor.error_mappers.register(
            APPLICATION_JSON,
            Arc::new(ProblemJsonMapper::with_media_type(APPLICATION_JSON)),
        );
        // HAL has no error format of its own.
        representor.error_mappers.register(
            HAL_JSON,
            Arc::new(ProblemJsonMapper::with_media_type(APPLICATION_PROBLEM_JSON)),
        );

        Ok(representor)
    }

    /// Replace the rewrite hook applied to every relative path.
    #[must_use]
    pub fn with_rewriter(mut self, rewriter: Arc<dyn UriRewriter>) -> Self {
        self.resolver = self.resolver.with_rewriter(rewriter);
        self
    }

    #[must_use]
    pub fn config(&self) -> &HypermediaConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    pub fn single_mappers_mut(&mut self) -> &mut SingleMapperRegistry {
        &mut self.single_mappers
    }

    pub fn page_mappers_mut(&mut self) -> &mut PageMapperRegistry {
        &mut self.page_mappers
    }

    pub fn error_mappers_mut(&mut self) -> &mut ErrorMapperRegistry {
        &mut self.error_mappers
    }

    /// Media type for a single resource, chosen from the request's `Accept` header.
    #[must_use]
    pub fn negotiate_single(&self, ctx: &RequestContext) -> Option<String> {
        negotiate(ctx.accept(), &self.single_mappers.media_types())
    }

    /// Media type for a page, chosen from the request's `Accept` header.
    #[must_use]
    pub fn negotiate_page(&self, ctx: &RequestContext) -> Option<String> {
        negotiate(ctx.accept(), &self.page_mappers.media_types())
    }

    /// Media type for an error, chosen from the request's `Accept` header.
    #[must_use]
    pub fn negotiate_error(&self, ctx: &RequestContext) -> Option<String> {
        negotiate(ctx.accept(), &self.error_mappers.media_types())
    }

    /// Render one resource graph.
    ///
    /// # Errors
    /// `NoMapper` if no single mapper matches, or any error of [`GraphWriter::write`].
    #[tracing::instrument(
        skip_all,
        fields(media_type = %media_type, resource_type = %model.resource_type())
    )]
    pub fn write_single(
        &self,
        media_type: &str,
        model: &SingleModel,
        policy: &dyn SelectionPolicy,
        ctx: &RequestContext,
    ) -> Result<Rendered, HypermediaError> {
        let mapper = self
            .single_mappers
            .select(media_type, model, ctx.headers())
            .ok_or_else(|| HypermediaError::NoMapper {
                media_type: media_type.to_owned(),
                resource_type: model.resource_type().to_string(),
            })?;
        tracing::debug!(
            media_type = mapper.media_type(),
            resource_type = %model.resource_type(),
            "Writing single resource"
        );

        let snapshot = self.registry.snapshot();
        let write_ctx = self.write_context(&snapshot, policy, ctx);
        let doc = GraphWriter::new(mapper.as_ref(), &write_ctx).write(model)?;
        Ok(Rendered {
            media_type: mapper.media_type().to_owned(),
            body: doc.to_json()?,
        })
    }

    /// Render a page of resources.
    ///
    /// # Errors
    /// `NoMapper` if no page mapper matches, or any error of [`PageWriter::write`].
    #[tracing::instrument(
        skip_all,
        fields(media_type = %media_type, resource_type = %page.resource_type(), page = page.page_number)
    )]
    pub fn write_page(
        &self,
        media_type: &str,
        page: &Page,
        policy: &dyn SelectionPolicy,
        ctx: &RequestContext,
    ) -> Result<Rendered, HypermediaError> {
        let mapper = self
            .page_mappers
            .select(media_type, page, ctx.headers())
            .ok_or_else(|| HypermediaError::NoMapper {
                media_type: media_type.to_owned(),
                resource_type: page.resource_type().to_string(),
            })?;

        let snapshot = self.registry.snapshot();
        let write_ctx = self.write_context(&snapshot, policy, ctx);
        let doc = PageWriter::new(mapper.as_ref(), &write_ctx).write(page)?;
        Ok(Rendered {
            media_type: mapper.media_type().to_owned(),
            body: doc.to_json()?,
        })
    }

    /// Render `err` as a problem. Never fails.
    #[must_use]
    pub fn write_error(
        &self,
        media_type: Option<&str>,
        err: &HypermediaError,
        ctx: &RequestContext,
    ) -> Rendered {
        match err.kind() {
            ErrorKind::Request => {
                tracing::debug!(error = %err, "Rendering request error");
            }
            ErrorKind::Configuration | ErrorKind::Data => {
                tracing::error!(error = %err, code = err.code(), "Rendering write failure");
            }
        }
        self.write_problem(media_type, &Problem::from(err), ctx)
    }

    /// Render an application-supplied problem. Never fails.
    #[must_use]
    pub fn write_problem(
        &self,
        media_type: Option<&str>,
        problem: &Problem,
        ctx: &RequestContext,
    ) -> Rendered {
        ErrorWriter::new(&self.error_mappers, &self.config.default_error_media_type).write(
            media_type,
            problem,
            ctx.headers(),
        )
    }

    fn write_context<'a>(
        &'a self,
        snapshot: &'a RegistrySnapshot,
        policy: &'a dyn SelectionPolicy,
        ctx: &'a RequestContext,
    ) -> WriteContext<'a> {
        WriteContext {
            snapshot,
            resolver: &self.resolver,
            policy,
            request: ctx,
            max_embed_depth: self.config.max_embed_depth,
        }
    }
}

impl fmt::Debug for Representor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Representor")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .field("single_mappers", &self.single_mappers)
            .field("page_mappers", &self.page_mappers)
            .field("error_mappers", &self.error_mappers)
            .finish()
    }
}

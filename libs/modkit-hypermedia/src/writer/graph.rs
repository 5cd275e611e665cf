//! Depth-first writer for one resource and the relations reachable from it.

use std::sync::Arc;

use serde_json::Value;
use url::Url;

use super::WriteContext;
use crate::error::HypermediaError;
use crate::mapper::{Document, MessageMapper};
use crate::model::{EmbeddedPath, Instance, SingleModel};
use crate::resource::{FieldKind, RelatedModel, ResourceType};

/// Key reported when the identifier accessor fails.
const IDENTIFIER_KEY: &str = "identifier";

/// A related instance together with its type and URL.
struct Related<'r> {
    instance: Arc<Instance>,
    resource_type: &'r Arc<ResourceType>,
    url: Url,
}

/// Walks a [`SingleModel`] and feeds a [`MessageMapper`].
///
/// For every resource it reports, in order: the selected fields and field links,
/// the static links, the type names, the self URL, the embedded relations (each
/// followed by the nested resource when it is inlined), the linked relations and
/// the filtered collections.
pub struct GraphWriter<'a> {
    mapper: &'a dyn MessageMapper,
    ctx: &'a WriteContext<'a>,
}

impl<'a> GraphWriter<'a> {
    #[must_use]
    pub fn new(mapper: &'a dyn MessageMapper, ctx: &'a WriteContext<'a>) -> Self {
        Self { mapper, ctx }
    }

    /// Write `model` into a fresh document.
    ///
    /// # Errors
    /// - `UnregisteredType` if the model's type or a relation target is unknown
    /// - `UnresolvableUri` if the root resource has no valid URL
    /// - `MissingFilterProvider` if a collection relation names an unknown filter
    /// - `Accessor` if any accessor fails; nothing of the document survives
    pub fn write(&self, model: &SingleModel) -> Result<Document, HypermediaError> {
        let resource_type = self.ctx.snapshot.resource_type(model.resource_type())?;
        let self_url = self
            .ctx
            .resolver
            .resolve_item_url(self.ctx.request, resource_type, model.instance())
            .map_err(|e| HypermediaError::accessor(resource_type.id().as_str(), IDENTIFIER_KEY, e))?
            .ok_or_else(|| HypermediaError::UnresolvableUri {
                resource_type: resource_type.id().to_string(),
                reason: "no collection name or the item URL is not valid".to_owned(),
            })?;

        let mut doc = Document::new();
        self.write_resource(&mut doc, model, resource_type, &EmbeddedPath::root(), &self_url)?;
        Ok(doc)
    }

    fn write_resource(
        &self,
        doc: &mut Document,
        model: &SingleModel,
        resource_type: &ResourceType,
        path: &EmbeddedPath,
        self_url: &Url,
    ) -> Result<(), HypermediaError> {
        tracing::trace!(resource_type = %resource_type.id(), path = %path, "Writing resource");
        let instance = model.instance();

        self.mapper.on_start(doc, path, model);
        self.write_fields(doc, resource_type, instance, path)?;
        self.write_links(doc, resource_type, path);
        self.mapper.map_types(doc, path, resource_type.types());
        self.mapper.map_self_url(doc, path, self_url);
        self.write_embedded(doc, resource_type, instance, path)?;
        self.write_linked(doc, resource_type, instance, path)?;
        self.write_collections(doc, resource_type, instance, path)?;
        self.mapper.on_finish(doc, path, model);
        Ok(())
    }

    fn write_fields(
        &self,
        doc: &mut Document,
        resource_type: &ResourceType,
        instance: &Instance,
        path: &EmbeddedPath,
    ) -> Result<(), HypermediaError> {
        let type_names = resource_type.types();
        let mut identifier: Option<String> = None;

        for field in resource_type.field_functions() {
            if !self.ctx.policy.field_allowed(type_names, field.key()) {
                continue;
            }
            let fail = |e| HypermediaError::accessor(resource_type.id().as_str(), field.key(), e);

            match field.kind() {
                FieldKind::Binary => {
                    if identifier.is_none() {
                        identifier = Some(resource_type.identifier(instance).map_err(|e| {
                            HypermediaError::accessor(resource_type.id().as_str(), IDENTIFIER_KEY, e)
                        })?);
                    }
                    let id = identifier.as_deref().unwrap_or_default();
                    if let Some(url) = self.ctx.resolver.resolve_binary_url(
                        self.ctx.request,
                        resource_type,
                        id,
                        field.key(),
                    ) {
                        self.mapper.map_field(doc, path, field.key(), &Value::String(url.into()));
                    }
                }
                FieldKind::Link => {
                    if let Some(Value::String(url)) =
                        field.value(instance, self.ctx.request.languages()).map_err(fail)?
                    {
                        self.mapper.map_link(doc, path, field.key(), &url);
                    }
                }
                FieldKind::Scalar | FieldKind::List | FieldKind::Localized => {
                    match field.value(instance, self.ctx.request.languages()).map_err(fail)? {
                        None | Some(Value::Null) => {}
                        Some(value) => self.mapper.map_field(doc, path, field.key(), &value),
                    }
                }
            }
        }
        Ok(())
    }

    fn write_links(&self, doc: &mut Document, resource_type: &ResourceType, path: &EmbeddedPath) {
        for (key, url) in resource_type.links() {
            if self.ctx.policy.field_allowed(resource_type.types(), key) {
                self.mapper.map_link(doc, path, key, url);
            }
        }
    }

    /// Fetch a related instance and resolve its URL.
    ///
    /// `None` when the relation is absent or its target has no valid URL.
    fn resolve_related(
        &self,
        owner: &ResourceType,
        instance: &Instance,
        relation: &RelatedModel,
    ) -> Result<Option<Related<'a>>, HypermediaError> {
        let target = self.ctx.snapshot.resource_type(relation.target())?;
        let Some(related) = relation
            .fetch(instance)
            .map_err(|e| HypermediaError::accessor(owner.id().as_str(), relation.key(), e))?
        else {
            return Ok(None);
        };
        let url = self
            .ctx
            .resolver
            .resolve_item_url(self.ctx.request, target, related.as_ref())
            .map_err(|e| HypermediaError::accessor(target.id().as_str(), IDENTIFIER_KEY, e))?;
        match url {
            Some(url) => Ok(Some(Related {
                instance: related,
                resource_type: target,
                url,
            })),
            None => {
                tracing::debug!(
                    resource_type = %owner.id(),
                    relation = relation.key(),
                    target = %target.id(),
                    "Omitting relation without a resolvable URL"
                );
                Ok(None)
            }
        }
    }

    fn write_embedded(
        &self,
        doc: &mut Document,
        resource_type: &ResourceType,
        instance: &Instance,
        path: &EmbeddedPath,
    ) -> Result<(), HypermediaError> {
        for relation in resource_type.embedded_related_models() {
            let Some(related) = self.resolve_related(resource_type, instance, relation)? else {
                continue;
            };
            let child = path.child(relation.key());

            if self.should_inline(&child) {
                self.mapper
                    .map_embedded_resource_url(doc, &child, &related.url);
                let model =
                    SingleModel::from_arc(related.instance, related.resource_type.id().clone());
                self.write_resource(doc, &model, related.resource_type, &child, &related.url)?;
            } else {
                self.mapper.map_linked_resource_url(doc, &child, &related.url);
            }
        }
        Ok(())
    }

    fn should_inline(&self, child: &EmbeddedPath) -> bool {
        if !self.ctx.policy.embed_allowed(&child.dot_path()) {
            return false;
        }
        if child.len() > self.ctx.max_embed_depth {
            tracing::warn!(
                path = %child,
                max_embed_depth = self.ctx.max_embed_depth,
                "Embedding depth exceeded, writing relation as a link"
            );
            return false;
        }
        true
    }

    fn write_linked(
        &self,
        doc: &mut Document,
        resource_type: &ResourceType,
        instance: &Instance,
        path: &EmbeddedPath,
    ) -> Result<(), HypermediaError> {
        for relation in resource_type.linked_related_models() {
            if let Some(related) = self.resolve_related(resource_type, instance, relation)? {
                self.mapper
                    .map_linked_resource_url(doc, &path.child(relation.key()), &related.url);
            }
        }
        Ok(())
    }

    fn write_collections(
        &self,
        doc: &mut Document,
        resource_type: &ResourceType,
        instance: &Instance,
        path: &EmbeddedPath,
    ) -> Result<(), HypermediaError> {
        for collection in resource_type.related_collections() {
            if !self
                .ctx
                .policy
                .field_allowed(resource_type.types(), collection.key())
            {
                continue;
            }
            let target = self.ctx.snapshot.resource_type(collection.target())?;
            let provider = self
                .ctx
                .snapshot
                .filter_provider(collection.filter_name())
                .ok_or_else(|| HypermediaError::MissingFilterProvider {
                    resource_type: resource_type.id().to_string(),
                    key: collection.key().to_owned(),
                    filter: collection.filter_name().to_owned(),
                })?;
            let fail = |e| HypermediaError::accessor(resource_type.id().as_str(), collection.key(), e);

            let filter = collection.filter_value(instance).map_err(fail)?;
            let url = self
                .ctx
                .resolver
                .resolve_filtered_collection_url(self.ctx.request, target, provider.as_ref(), &filter)
                .map_err(fail)?;
            match url {
                Some(url) => {
                    self.mapper
                        .map_linked_resource_url(doc, &path.child(collection.key()), &url);
                }
                None => tracing::debug!(
                    resource_type = %resource_type.id(),
                    collection = collection.key(),
                    "Omitting collection without a resolvable URL"
                ),
            }
        }
        Ok(())
    }
}

//! Writer for a page of resources.

use url::Url;

use super::WriteContext;
use super::graph::GraphWriter;
use crate::error::HypermediaError;
use crate::mapper::{Document, PageMessageMapper};
use crate::model::Page;
use crate::url_resolver::page_url;

pub struct PageWriter<'a> {
    mapper: &'a dyn PageMessageMapper,
    ctx: &'a WriteContext<'a>,
}

impl<'a> PageWriter<'a> {
    #[must_use]
    pub fn new(mapper: &'a dyn PageMessageMapper, ctx: &'a WriteContext<'a>) -> Self {
        Self { mapper, ctx }
    }

    /// Write every item of `page`, then its counts and navigation URLs.
    ///
    /// Navigation URLs derive from the page's origin path when it has one and
    /// from the type's collection URL otherwise. `prev` is written only past the
    /// first page, `next` only before the last one.
    ///
    /// # Errors
    /// - `InvalidPage` if the page size or number is zero
    /// - `UnresolvableUri` if the collection URL cannot be resolved
    /// - any error of writing an item; the page is discarded as a whole
    pub fn write(&self, page: &Page) -> Result<Document, HypermediaError> {
        page.validate()?;
        let collection_url = self.collection_url(page)?;
        tracing::debug!(
            resource_type = %page.resource_type(),
            page = page.page_number,
            items = page.len(),
            total = page.total_count,
            "Writing page"
        );

        let mut doc = Document::new();
        self.mapper.on_start(&mut doc, page);

        let items = GraphWriter::new(self.mapper.item_mapper(), self.ctx);
        for model in page.models() {
            let item = items.write(&model)?;
            self.mapper.map_item(&mut doc, page, item);
        }

        let per_page = page.items_per_page;
        let current = u64::from(page.page_number);
        self.mapper.map_total_count(&mut doc, page.total_count);
        self.mapper.map_item_count(&mut doc, page.len());
        self.mapper.map_collection_url(&mut doc, &collection_url);
        self.mapper
            .map_current_page_url(&mut doc, &page_url(&collection_url, current, per_page));
        self.mapper
            .map_first_page_url(&mut doc, &page_url(&collection_url, 1, per_page));
        if page.has_previous() {
            self.mapper
                .map_previous_page_url(&mut doc, &page_url(&collection_url, current - 1, per_page));
        }
        if page.has_next() {
            self.mapper
                .map_next_page_url(&mut doc, &page_url(&collection_url, current + 1, per_page));
        }
        self.mapper.map_last_page_url(
            &mut doc,
            &page_url(&collection_url, page.last_page_number(), per_page),
        );
        self.mapper.on_finish(&mut doc, page);
        Ok(doc)
    }

    fn collection_url(&self, page: &Page) -> Result<Url, HypermediaError> {
        let unresolvable = |reason: &str| HypermediaError::UnresolvableUri {
            resource_type: page.resource_type().to_string(),
            reason: reason.to_owned(),
        };
        match &page.origin_path {
            Some(path) => self
                .ctx
                .resolver
                .resolve_path(self.ctx.request, path)
                .ok_or_else(|| unresolvable("origin path is not a valid URL")),
            None => {
                let resource_type = self.ctx.snapshot.resource_type(page.resource_type())?;
                self.ctx
                    .resolver
                    .resolve_collection_url(self.ctx.request, resource_type)
                    .ok_or_else(|| unresolvable("no collection name or the collection URL is not valid"))
            }
        }
    }
}

//! `page` / `per_page` request parameters.

use crate::config::PagingConfig;
use crate::error::HypermediaError;

/// Query parameter carrying the 1-based page number.
pub const PAGE_PARAM: &str = "page";
/// Query parameter carrying the page size.
pub const PER_PAGE_PARAM: &str = "per_page";

/// Requested page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u32,
    pub items_per_page: u32,
}

impl PageRequest {
    /// Parse paging parameters out of a raw query string.
    ///
    /// Missing values fall back to page 1 and the configured default size;
    /// sizes above the configured maximum are clamped.
    ///
    /// # Errors
    /// Returns `HypermediaError::InvalidPage` for non-numeric or zero values.
    pub fn from_query(query: &str, config: &PagingConfig) -> Result<Self, HypermediaError> {
        let mut page_number = 1;
        let mut items_per_page = config.default_items_per_page;

        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            if key == PAGE_PARAM {
                page_number = parse_positive(PAGE_PARAM, &value)?;
            } else if key == PER_PAGE_PARAM {
                items_per_page = parse_positive(PER_PAGE_PARAM, &value)?;
            }
        }

        Ok(Self {
            page_number,
            items_per_page: items_per_page.min(config.max_items_per_page),
        })
    }

    /// Zero-based offset of the first item of this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.items_per_page)
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u32, HypermediaError> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(HypermediaError::InvalidPage(format!(
            "{name} must be at least 1"
        ))),
        Ok(v) => Ok(v),
        Err(_) => Err(HypermediaError::InvalidPage(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
    }
}

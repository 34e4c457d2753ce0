//! Catalog queries and result pages.
//!
//! Page numbers are 1-based throughout, matching the backend's `page`
//! parameter.

use url::Url;

use crate::backend::types::Product;

/// Search/filter parameters for a product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    keyword: Option<String>,
    category: Option<String>,
    page: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            category: None,
            page: 1,
        }
    }
}

impl CatalogQuery {
    /// First page of the unfiltered catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by a search keyword. Blank keywords are ignored.
    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = non_blank(keyword.into());
        self
    }

    /// Filter by category. Blank categories are ignored.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(category.into());
        self
    }

    /// Select a page. Page 0 is treated as page 1.
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// The requested page (1-based).
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// The keyword filter, if any.
    #[must_use]
    pub fn keyword_filter(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    /// The category filter, if any.
    #[must_use]
    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Append `keyword`, `page` and (when set) `category` to a listing URL.
    ///
    /// `keyword` is always sent, empty when unset, as the backend's search
    /// builder expects it.
    pub fn apply_to(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("keyword", self.keyword.as_deref().unwrap_or(""));
        pairs.append_pair("page", &self.page.to_string());
        if let Some(category) = &self.category {
            pairs.append_pair("category", category);
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Number of products matching the query, across all pages.
    pub total_count: u64,
    /// Products per page as configured on the backend.
    pub page_size: u32,
}

impl ProductPage {
    /// `ceil(total_count / page_size)`; zero when the page size is unknown.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_count, self.page_size)
    }
}

/// `ceil(total_count / page_size)`, zero when `page_size` is zero.
#[must_use]
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

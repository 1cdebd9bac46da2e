//! Catalog filtering and sorting.
//!
//! Pure functions over a product slice: nothing here reads storage or
//! touches presentation. The surface keeps a [`CatalogQuery`] and a
//! [`SortMode`] and asks [`filter_and_sort`] for the visible list whenever
//! either changes.

mod normalize;

use std::cmp::Ordering;

use acchiappasogni_core::{Money, SortMode};

use crate::catalog::Product;

pub use normalize::fold;

/// Category predicate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Sentinel that matches every product.
    #[default]
    All,
    /// Exact category name.
    Only(String),
}

impl CategoryFilter {
    /// Parse user input: blank or `all` (any case) is the sentinel.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => product.category == *category,
        }
    }
}

/// Inclusive price bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceRange {
    pub min: Option<Money>,
    pub max: Option<Money>,
}

impl PriceRange {
    fn contains(&self, price: Money) -> bool {
        self.min.is_none_or(|min| price >= min) && self.max.is_none_or(|max| price <= max)
    }
}

/// Everything the shopper can filter on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogQuery {
    pub category: CategoryFilter,
    /// Free text; blank matches everything.
    pub query: String,
    /// Every tag listed must be on the product.
    pub tags: Vec<String>,
    pub price_range: PriceRange,
    pub in_stock_only: bool,
    pub featured_only: bool,
}

impl CatalogQuery {
    /// Whether a product passes every predicate.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_folded(&fold(self.query.trim()), product)
    }

    fn matches_folded(&self, folded_query: &str, product: &Product) -> bool {
        self.category.matches(product)
            && (!self.featured_only || product.featured)
            && (!self.in_stock_only || product.is_in_stock())
            && self.price_range.contains(product.price)
            && self.matches_tags(product)
            && matches_text(folded_query, product)
    }

    fn matches_tags(&self, product: &Product) -> bool {
        self.tags.iter().all(|wanted| {
            let wanted = fold(wanted.trim());
            wanted.is_empty() || product.tags.iter().any(|t| fold(t.trim()) == wanted)
        })
    }
}

fn matches_text(folded_query: &str, product: &Product) -> bool {
    if folded_query.is_empty() {
        return true;
    }
    let haystack = fold(&format!(
        "{} {} {}",
        product.title,
        product.description.as_deref().unwrap_or_default(),
        product.category
    ));
    haystack.contains(folded_query)
}

/// Apply the query, then order by `sort`.
///
/// Every sort is stable: products with equal keys keep catalog order.
#[must_use]
pub fn filter_and_sort<'a>(
    products: &'a [Product],
    query: &CatalogQuery,
    sort: SortMode,
) -> Vec<&'a Product> {
    let folded_query = fold(query.query.trim());
    let mut visible: Vec<&Product> = products
        .iter()
        .filter(|p| query.matches_folded(&folded_query, p))
        .collect();

    match sort {
        SortMode::Featured => {
            visible.sort_by(|a, b| b.featured.cmp(&a.featured).then_with(|| newest_first(a, b)));
        }
        SortMode::Newest => visible.sort_by(|a, b| newest_first(a, b)),
        SortMode::Title => visible.sort_by_cached_key(|p| (fold(&p.title), p.title.clone())),
        SortMode::PriceAsc => visible.sort_by_key(|p| p.price),
        SortMode::PriceDesc => visible.sort_by(|a, b| b.price.cmp(&a.price)),
    }

    visible
}

/// Descending by `createdAt`; undated products count as oldest.
fn newest_first(a: &Product, b: &Product) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

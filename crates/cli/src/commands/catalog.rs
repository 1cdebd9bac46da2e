//! Catalog listing.
//!
//! # Usage
//!
//! ```bash
//! acchiappasogni catalog
//! acchiappasogni catalog --category "Acchiappasogni Classici" --query luna
//! acchiappasogni catalog --tag blu --min-price 10 --max-price 40 --sort price-asc
//! acchiappasogni catalog --featured --in-stock
//! ```

use acchiappasogni_core::{Money, SortMode};
use acchiappasogni_storefront::catalog::CatalogOrigin;
use acchiappasogni_storefront::search::{CatalogQuery, CategoryFilter, PriceRange};
use clap::Args;

use super::{Context, out};

#[derive(Args, Debug, Default)]
pub struct CatalogArgs {
    /// Category name, or "all"
    #[arg(long, default_value = "all")]
    pub category: String,

    /// Free-text search over title, description and category
    #[arg(long, default_value = "")]
    pub query: String,

    /// Require this tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Minimum price in euros
    #[arg(long)]
    pub min_price: Option<Money>,

    /// Maximum price in euros
    #[arg(long)]
    pub max_price: Option<Money>,

    /// Only products in stock
    #[arg(long)]
    pub in_stock: bool,

    /// Only featured products
    #[arg(long)]
    pub featured: bool,

    /// featured, newest, title, price-asc or price-desc
    #[arg(long, default_value_t = SortMode::Featured)]
    pub sort: SortMode,

    /// List the categories instead of products
    #[arg(long)]
    pub categories: bool,
}

impl CatalogArgs {
    fn query(&self) -> CatalogQuery {
        CatalogQuery {
            category: CategoryFilter::parse(&self.category),
            query: self.query.clone(),
            tags: self.tags.clone(),
            price_range: PriceRange {
                min: self.min_price,
                max: self.max_price,
            },
            in_stock_only: self.in_stock,
            featured_only: self.featured,
        }
    }
}

/// Print the products matching the filters.
///
/// # Errors
///
/// Returns an error if the products document could not be loaded.
pub async fn list(ctx: &Context, args: CatalogArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut shop = ctx.storefront().await;
    if let Some(failure) = shop.load_failure() {
        return Err(format!("Catalog unavailable: {failure}").into());
    }

    if args.categories {
        for category in shop.catalog().categories() {
            out(category)?;
        }
        return Ok(());
    }

    shop.query = args.query();
    shop.sort = args.sort;

    let config = shop.config();
    if shop.origin() == CatalogOrigin::Override {
        out("(showing the catalog edited on this device)")?;
    }

    let visible = shop.visible_products();
    if visible.is_empty() {
        out("No products match.")?;
        return Ok(());
    }

    for product in visible {
        let mut line = format!(
            "{:<16} {:<40} {:>12}",
            product.id,
            product.title,
            config.format(product.price)
        );
        if !product.category.is_empty() {
            line.push_str(&format!("  [{}]", product.category));
        }
        if product.featured {
            line.push_str("  ★");
        }
        if !product.is_in_stock() {
            line.push_str("  (out of stock)");
        }
        out(line)?;
    }

    let count = shop.cart().total_item_count();
    if count > 0 {
        out(format!("\nCart: {count} item(s)"))?;
    }
    Ok(())
}

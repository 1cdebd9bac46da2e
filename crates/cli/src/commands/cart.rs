//! Cart commands.
//!
//! The cart lives in device storage, so every command reloads it, applies
//! one change and prints the new item count.
//!
//! # Usage
//!
//! ```bash
//! acchiappasogni cart add AE-1
//! acchiappasogni cart set AE-1 3
//! acchiappasogni cart inc AE-1
//! acchiappasogni cart show --pickup
//! acchiappasogni cart clear
//! ```

use acchiappasogni_core::{DeliveryMethod, ProductId};
use acchiappasogni_storefront::cart::CartUpdate;
use acchiappasogni_storefront::state::Storefront;
use clap::Subcommand;

use super::{Context, out};

#[derive(Subcommand, Debug)]
pub enum CartAction {
    /// Show cart lines and totals
    Show {
        /// Show totals for pickup instead of shipping
        #[arg(long)]
        pickup: bool,
    },
    /// Add a product with quantity one
    Add { id: String },
    /// Set a quantity; zero or less removes the line
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: f64,
    },
    /// Increase a quantity by one
    Inc { id: String },
    /// Decrease a quantity by one
    Dec { id: String },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
}

/// Run a cart subcommand.
///
/// # Errors
///
/// Returns an error for an unknown product or invalid id.
pub async fn run(ctx: &Context, action: CartAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut shop = ctx.storefront().await;

    let update = match action {
        CartAction::Show { pickup } => {
            if pickup {
                shop.delivery = DeliveryMethod::Pickup;
            }
            return show(&shop);
        }
        CartAction::Add { id } => shop.add_to_cart(&id)?,
        CartAction::Set { id, quantity } => shop.set_quantity(&id, quantity)?,
        CartAction::Inc { id } => shop.cart_mut().increment(ProductId::parse(&id)?),
        CartAction::Dec { id } => shop.cart_mut().decrement(ProductId::parse(&id)?),
        CartAction::Remove { id } => shop.cart_mut().remove(ProductId::parse(&id)?),
        CartAction::Clear => shop.cart_mut().clear(),
    };

    report(&update)
}

fn report(update: &CartUpdate) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(warning) = &update.storage_warning {
        tracing::warn!(error = %warning, "cart was updated but could not be saved");
    }
    out(format!("Cart: {} item(s)", update.total_items))?;
    Ok(())
}

fn show(shop: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let config = shop.config();
    let cart = shop.cart().cart();
    if cart.is_empty() {
        out("Your cart is empty.")?;
        return Ok(());
    }

    for line in cart.resolved_lines(shop.catalog()) {
        out(format!(
            "{:>3} × {:<40} {:>12}",
            line.quantity,
            line.product.title,
            config.format(line.product.price.times(line.quantity))
        ))?;
    }

    let totals = shop.totals();
    out(format!("\nDelivery: {}", shop.delivery.label()))?;
    out(format!("Subtotal: {}", config.format(totals.subtotal)))?;
    out(format!("Shipping: {}", config.format(totals.shipping)))?;
    out(format!("Total:    {}", config.format(totals.total)))?;
    if let Some(hint) = totals.hint.text(config.currency) {
        out(format!("({hint})"))?;
    }
    Ok(())
}

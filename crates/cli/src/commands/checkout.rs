//! Checkout and custom request links.
//!
//! # Usage
//!
//! ```bash
//! acchiappasogni checkout --pickup --name Giulia
//! acchiappasogni checkout --name Giulia --phone 3401234567 \
//!     --street "Via Roma 1" --postal-code 00100 --city Roma --design luna
//! acchiappasogni custom-request
//! ```

use acchiappasogni_core::DeliveryMethod;
use acchiappasogni_storefront::designer::SavedDesigns;
use acchiappasogni_storefront::order::CustomerFields;
use acchiappasogni_storefront::storage::SharedStorage;
use clap::Args;

use super::{Context, out};

#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Collect in person instead of shipping
    #[arg(long)]
    pub pickup: bool,

    #[arg(long, default_value = "")]
    pub name: String,

    /// Customer phone number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Required for shipping
    #[arg(long, default_value = "")]
    pub street: String,

    /// Required for shipping
    #[arg(long, default_value = "")]
    pub postal_code: String,

    /// Required for shipping
    #[arg(long, default_value = "")]
    pub city: String,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// Mention a saved design in the message
    #[arg(long)]
    pub design: Option<String>,

    /// Print only the link
    #[arg(long)]
    pub link_only: bool,
}

/// Print the order message and the WhatsApp link carrying it.
///
/// # Errors
///
/// Returns an error if the shop has no WhatsApp number, the cart is empty,
/// shipping fields are missing, or the named design does not exist.
pub async fn checkout(ctx: &Context, args: CheckoutArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut shop = ctx.storefront().await;
    shop.delivery = if args.pickup {
        DeliveryMethod::Pickup
    } else {
        DeliveryMethod::Shipping
    };

    if let Some(name) = &args.design {
        SavedDesigns::load(SharedStorage::clone(&ctx.storage)).require(name)?;
    }

    let customer = CustomerFields {
        name: args.name,
        phone: args.phone,
        street: args.street,
        postal_code: args.postal_code,
        city: args.city,
        notes: args.notes,
        design: args.design,
    };

    let link = shop.checkout_link(&customer)?;
    if !args.link_only {
        out(shop.order_message(&customer)?)?;
        out("")?;
    }
    out(link)?;

    if customer.design.is_some() {
        tracing::info!("attach the exported design PNG in the WhatsApp chat");
    }
    Ok(())
}

/// Print the WhatsApp link for a custom dreamcatcher request.
///
/// # Errors
///
/// Returns an error if the shop has no WhatsApp number.
pub async fn custom_request(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let shop = ctx.storefront().await;
    out(shop.custom_request_link()?)?;
    Ok(())
}

//! Admin commands for editing the catalog on this device.
//!
//! Editing needs an unlocked gate (`admin unlock <PIN>`). Every command that
//! changes the catalog publishes it as the device override straight away, so
//! the storefront commands see the change on their next run.
//!
//! # Usage
//!
//! ```bash
//! acchiappasogni admin unlock 1234
//! acchiappasogni admin change-pin 1234 98765
//! acchiappasogni admin add --title "Luna" --price 24.50 --category "Classici"
//! acchiappasogni admin edit AE-1 --price 19 --featured true
//! acchiappasogni admin image AE-1 ./luna.jpg
//! acchiappasogni admin set-all-prices 5
//! acchiappasogni admin export catalog.json
//! acchiappasogni admin reset
//! acchiappasogni admin lock
//! ```

use std::path::{Path, PathBuf};

use acchiappasogni_admin::{AdminEditor, AdminGate, ProductDraft, ProductPatch};
use acchiappasogni_core::Money;
use acchiappasogni_storefront::catalog::{Catalog, CatalogOrigin};
use acchiappasogni_storefront::storage::SharedStorage;
use clap::{Args, Subcommand};
use secrecy::SecretString;
use thiserror::Error;

use super::{Context, out};

/// Errors specific to the admin commands.
#[derive(Debug, Error)]
pub enum AdminCommandError {
    #[error("Catalog unavailable, refusing to edit: {0}")]
    CatalogUnavailable(String),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot tell the image type of {0}; use .jpg, .png, .webp or .gif")]
    UnknownImageType(PathBuf),
}

#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// Unlock editing with the admin PIN
    Unlock { pin: String },
    /// Lock editing again
    Lock,
    /// Replace the admin PIN
    ChangePin { current: String, new: String },
    /// List products with their ids
    List,
    /// Add a product at the top of the catalog
    Add(AddArgs),
    /// Change fields of a product
    Edit(EditArgs),
    /// Delete a product
    Delete { id: String },
    /// Set every product to the same price
    SetAllPrices { price: Money },
    /// Attach a photo to a product
    Image { id: String, file: PathBuf },
    /// Publish the current catalog as the device override
    Publish,
    /// Drop the device override and go back to the shared catalog
    Reset,
    /// Write the catalog as JSON to a file, or stdout
    Export { file: Option<PathBuf> },
    /// Replace the catalog with a JSON file
    Import { file: PathBuf },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Price in euros
    #[arg(long)]
    pub price: Option<Money>,
    /// Image URL
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub featured: bool,
    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Mark in or out of stock
    #[arg(long)]
    pub in_stock: Option<bool>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Price in euros
    #[arg(long)]
    pub price: Option<Money>,
    /// Image URL
    #[arg(long)]
    pub image: Option<String>,
    /// New description; an empty string clears it
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub featured: Option<bool>,
    /// Replace tags with this list (repeatable)
    #[arg(long = "tag")]
    pub tags: Option<Vec<String>>,
    #[arg(long)]
    pub in_stock: Option<bool>,
    /// Forget the stock flag
    #[arg(long, conflicts_with = "in_stock")]
    pub clear_stock: bool,
}

impl From<AddArgs> for ProductDraft {
    fn from(args: AddArgs) -> Self {
        let defaults = Self::default();
        Self {
            title: args.title.unwrap_or(defaults.title),
            category: args.category.unwrap_or(defaults.category),
            price: args.price.unwrap_or(defaults.price),
            image: args.image.unwrap_or_default(),
            description: args.description,
            featured: args.featured,
            tags: args.tags,
            in_stock: args.in_stock,
        }
    }
}

impl EditArgs {
    fn patch(self) -> ProductPatch {
        ProductPatch {
            title: self.title,
            category: self.category,
            price: self.price,
            image: self.image,
            description: self
                .description
                .map(|d| if d.trim().is_empty() { None } else { Some(d) }),
            featured: self.featured,
            tags: self.tags,
            in_stock: if self.clear_stock {
                Some(None)
            } else {
                self.in_stock.map(Some)
            },
        }
    }
}

/// Run an admin subcommand.
///
/// # Errors
///
/// Returns an error if the gate is locked, the PIN is wrong, the catalog
/// could not be loaded, or an edit is rejected.
pub async fn run(ctx: &Context, action: AdminAction) -> Result<(), Box<dyn std::error::Error>> {
    let gate = AdminGate::new(SharedStorage::clone(&ctx.storage));

    match action {
        AdminAction::Unlock { pin } => {
            gate.unlock(&SecretString::from(pin))?;
            if !gate.has_custom_pin() {
                tracing::warn!("still using the default PIN, change it with `admin change-pin`");
            }
            out("Admin unlocked.")?;
        }
        AdminAction::Lock => {
            gate.lock()?;
            out("Admin locked.")?;
        }
        AdminAction::ChangePin { current, new } => {
            gate.change_pin(&SecretString::from(current), &SecretString::from(new))?;
            out("PIN changed.")?;
        }
        AdminAction::List => {
            let (catalog, origin) = current_catalog(ctx).await?;
            let editor = AdminEditor::open(&gate, catalog)?;
            list(editor.catalog(), origin)?;
        }
        AdminAction::Add(args) => {
            let mut editor = open_editor(ctx, &gate).await?;
            let id = editor.create(args.into())?;
            editor.publish()?;
            out(format!("Created {id}"))?;
        }
        AdminAction::Edit(args) => {
            let mut editor = open_editor(ctx, &gate).await?;
            let id = args.id.clone();
            let product = editor.update(&id, args.patch())?;
            out(format!("Updated {} ({})", product.id, product.title))?;
            editor.publish()?;
        }
        AdminAction::Delete { id } => {
            let mut editor = open_editor(ctx, &gate).await?;
            let removed = editor.delete(&id)?;
            editor.publish()?;
            out(format!("Deleted {} ({})", removed.id, removed.title))?;
        }
        AdminAction::SetAllPrices { price } => {
            let mut editor = open_editor(ctx, &gate).await?;
            let changed = editor.set_all_prices(price);
            editor.publish()?;
            out(format!("Set {changed} product(s) to {price}"))?;
        }
        AdminAction::Image { id, file } => {
            let mime = image_mime(&file)?;
            let bytes = std::fs::read(&file).map_err(|source| AdminCommandError::Read {
                path: file.clone(),
                source,
            })?;
            let mut editor = open_editor(ctx, &gate).await?;
            editor.attach_image(&id, &bytes, mime)?;
            editor.publish()?;
            out(format!("Attached {} to {id}", file.display()))?;
        }
        AdminAction::Publish => {
            let editor = open_editor(ctx, &gate).await?;
            editor.publish()?;
            out(format!("Published {} product(s).", editor.catalog().len()))?;
        }
        AdminAction::Reset => {
            let editor = AdminEditor::open(&gate, Catalog::new())?;
            editor.reset_override()?;
            out("Override removed; the shared catalog is back.")?;
        }
        AdminAction::Export { file } => {
            let editor = open_editor(ctx, &gate).await?;
            let json = editor.export_json()?;
            match file {
                Some(path) => {
                    std::fs::write(&path, json)
                        .map_err(|source| AdminCommandError::Write { path: path.clone(), source })?;
                    out(format!("Exported to {}", path.display()))?;
                }
                None => out(json)?,
            }
        }
        AdminAction::Import { file } => {
            let text = std::fs::read_to_string(&file).map_err(|source| AdminCommandError::Read {
                path: file.clone(),
                source,
            })?;
            // Import replaces everything, so an unreachable catalog is fine here
            let catalog = match current_catalog(ctx).await {
                Ok((catalog, _)) => catalog,
                Err(_) => Catalog::new(),
            };
            let mut editor = AdminEditor::open(&gate, catalog)?;
            let count = editor.import_json(&text)?;
            editor.publish()?;
            out(format!("Imported {count} product(s)."))?;
        }
    }

    Ok(())
}

/// The catalog the storefront would show: the override if published,
/// otherwise the shared document.
async fn current_catalog(ctx: &Context) -> Result<(Catalog, CatalogOrigin), AdminCommandError> {
    let loaded = ctx.loader.load(ctx.storage.as_ref()).await;
    if let Some(failure) = loaded.failure {
        return Err(AdminCommandError::CatalogUnavailable(failure.to_string()));
    }
    Ok((loaded.catalog, loaded.origin))
}

async fn open_editor(ctx: &Context, gate: &AdminGate) -> Result<AdminEditor, Box<dyn std::error::Error>> {
    // Check the gate before touching the network
    if !gate.is_unlocked() {
        return Err(acchiappasogni_admin::AdminError::Locked.into());
    }
    let (catalog, _) = current_catalog(ctx).await?;
    Ok(AdminEditor::open(gate, catalog)?)
}

fn list(catalog: &Catalog, origin: CatalogOrigin) -> std::io::Result<()> {
    let source = match origin {
        CatalogOrigin::Override => "device override",
        CatalogOrigin::Remote => "shared catalog",
    };
    out(format!("{} product(s) from the {source}", catalog.len()))?;
    for product in catalog.iter() {
        out(format!(
            "{:<20} {:<40} {:>10}  {}",
            product.id, product.title, product.price, product.category
        ))?;
    }
    Ok(())
}

fn image_mime(path: &Path) -> Result<&'static str, AdminCommandError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => Ok("image/jpeg"),
        Some("png") => Ok("image/png"),
        Some("webp") => Ok("image/webp"),
        Some("gif") => Ok("image/gif"),
        _ => Err(AdminCommandError::UnknownImageType(path.to_path_buf())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime_from_extension() {
        assert_eq!(image_mime(Path::new("a/luna.JPG")).unwrap(), "image/jpeg");
        assert_eq!(image_mime(Path::new("luna.png")).unwrap(), "image/png");
        assert!(image_mime(Path::new("luna.tiff")).is_err());
        assert!(image_mime(Path::new("luna")).is_err());
    }

    #[test]
    fn test_edit_args_patch() {
        let args = EditArgs {
            id: "AE-1".to_string(),
            title: None,
            category: None,
            price: None,
            image: None,
            description: Some("  ".to_string()),
            featured: Some(true),
            tags: None,
            in_stock: None,
            clear_stock: true,
        };
        let patch = args.patch();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.in_stock, Some(None));
        assert_eq!(patch.featured, Some(true));
        assert_eq!(patch.title, None);
    }

    #[test]
    fn test_add_args_fill_defaults() {
        let args = AddArgs {
            title: None,
            category: None,
            price: None,
            image: None,
            description: None,
            featured: false,
            tags: vec![],
            in_stock: None,
        };
        let draft = ProductDraft::from(args);
        assert_eq!(draft, ProductDraft::default());
    }
}

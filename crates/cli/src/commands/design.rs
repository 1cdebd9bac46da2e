//! Dreamcatcher designer commands.
//!
//! Designs are saved by name in device storage. Coordinates for stickers
//! are in the 600×600 logical surface, whatever size the PNG is exported at.
//!
//! # Usage
//!
//! ```bash
//! acchiappasogni design new luna --rings 3 --feathers 5 --ring-color "#334455"
//! acchiappasogni design edit luna --banner "Sogni d'oro" --symbol moon
//! acchiappasogni design place luna 120 80 star
//! acchiappasogni design undo luna
//! acchiappasogni design export luna luna.png --size 1200
//! ```

use std::path::PathBuf;

use acchiappasogni_core::DesignName;
use acchiappasogni_storefront::designer::{DreamcatcherDesign, Ornament, Rgb, SavedDesigns, export_png};
use acchiappasogni_storefront::storage::SharedStorage;
use clap::{Args, Subcommand};

use super::{Context, out};

#[derive(Subcommand, Debug)]
pub enum DesignAction {
    /// Create or overwrite a design
    New {
        name: String,
        #[command(flatten)]
        shape: ShapeArgs,
    },
    /// Change parameters of a saved design
    Edit {
        name: String,
        #[command(flatten)]
        shape: ShapeArgs,
    },
    /// Place a sticker (star, heart, moon, sparkle, dot, flower)
    Place {
        name: String,
        #[arg(allow_negative_numbers = true)]
        x: f32,
        #[arg(allow_negative_numbers = true)]
        y: f32,
        kind: Ornament,
    },
    /// Remove the last placed sticker
    Undo { name: String },
    /// Remove every sticker
    ClearStickers { name: String },
    /// Print a design's parameters
    Show { name: String },
    /// List saved designs
    List,
    /// Delete a saved design
    Delete { name: String },
    /// Render a design to a PNG file
    Export {
        name: String,
        file: PathBuf,
        /// Edge length in pixels
        #[arg(long, default_value_t = 600)]
        size: u32,
    },
}

/// Shape parameters; anything left out keeps its current value.
#[derive(Args, Debug, Default)]
pub struct ShapeArgs {
    /// Concentric rings, 1-5
    #[arg(long)]
    pub rings: Option<u8>,
    /// Hoop diameter, 120-440
    #[arg(long)]
    pub diameter: Option<f32>,
    /// Hanging feathers, 0-9
    #[arg(long)]
    pub feathers: Option<u8>,
    /// Feather length, 30-200
    #[arg(long)]
    pub feather_length: Option<f32>,
    #[arg(long)]
    pub ring_color: Option<Rgb>,
    #[arg(long)]
    pub web_color: Option<Rgb>,
    #[arg(long)]
    pub feather_color: Option<Rgb>,
    #[arg(long)]
    pub bead_color: Option<Rgb>,
    #[arg(long)]
    pub background: Option<Rgb>,
    /// Ornament in the center of the web
    #[arg(long)]
    pub symbol: Option<Ornament>,
    /// Remove the center ornament
    #[arg(long, conflicts_with = "symbol")]
    pub no_symbol: bool,
    /// Banner text on a ribbon above the hoop; empty removes it
    #[arg(long)]
    pub banner: Option<String>,
}

impl ShapeArgs {
    fn apply(self, design: &mut DreamcatcherDesign) {
        if let Some(v) = self.rings {
            design.ring_count = v;
        }
        if let Some(v) = self.diameter {
            design.diameter = v;
        }
        if let Some(v) = self.feathers {
            design.feather_count = v;
        }
        if let Some(v) = self.feather_length {
            design.feather_length = v;
        }
        if let Some(v) = self.ring_color {
            design.ring_color = v;
        }
        if let Some(v) = self.web_color {
            design.web_color = v;
        }
        if let Some(v) = self.feather_color {
            design.feather_color = v;
        }
        if let Some(v) = self.bead_color {
            design.bead_color = v;
        }
        if let Some(v) = self.background {
            design.background = v;
        }
        if self.no_symbol {
            design.symbol = None;
        } else if self.symbol.is_some() {
            design.symbol = self.symbol;
        }
        if let Some(banner) = self.banner {
            design.banner = Some(banner).filter(|b| !b.trim().is_empty());
        }
    }
}

/// Run a designer subcommand.
///
/// # Errors
///
/// Returns an error for an unknown design, out-of-range parameters, or a
/// storage or file failure.
pub fn run(ctx: &Context, action: DesignAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut saved = SavedDesigns::load(SharedStorage::clone(&ctx.storage));

    match action {
        DesignAction::New { name, shape } => {
            let name = DesignName::parse(&name)?;
            let mut design = DreamcatcherDesign::default();
            shape.apply(&mut design);
            saved.save(&name, design)?;
            out(format!("Saved {name}"))?;
        }
        DesignAction::Edit { name, shape } => {
            modify(&mut saved, &name, |design| {
                shape.apply(design);
                Ok(())
            })?;
            out(format!("Saved {name}"))?;
        }
        DesignAction::Place { name, x, y, kind } => {
            modify(&mut saved, &name, |design| design.place(x, y, kind))?;
            out(format!("Placed {kind} at ({x}, {y})"))?;
        }
        DesignAction::Undo { name } => {
            let mut removed = None;
            modify(&mut saved, &name, |design| {
                removed = design.undo();
                Ok(())
            })?;
            match removed {
                Some(sticker) => out(format!("Removed {} at ({}, {})", sticker.kind, sticker.x, sticker.y))?,
                None => out("No stickers to undo.")?,
            }
        }
        DesignAction::ClearStickers { name } => {
            modify(&mut saved, &name, |design| {
                design.clear_stickers();
                Ok(())
            })?;
            out("Stickers cleared.")?;
        }
        DesignAction::Show { name } => show(saved.require(&name)?)?,
        DesignAction::List => {
            let names = saved.names();
            if names.is_empty() {
                out("No saved designs.")?;
            }
            for name in names {
                out(name)?;
            }
        }
        DesignAction::Delete { name } => {
            saved.delete(&name)?;
            out(format!("Deleted {name}"))?;
        }
        DesignAction::Export { name, file, size } => {
            let png = export_png(saved.require(&name)?, size, size)?;
            std::fs::write(&file, png)?;
            tracing::info!(design = %name, path = %file.display(), size, "design exported");
            out(format!("Wrote {}", file.display()))?;
        }
    }

    Ok(())
}

fn modify(
    saved: &mut SavedDesigns,
    name: &str,
    change: impl FnOnce(&mut DreamcatcherDesign) -> Result<(), acchiappasogni_storefront::designer::DesignError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let name = DesignName::parse(name)?;
    let mut design = saved.require(name.as_str())?.clone();
    change(&mut design)?;
    saved.save(&name, design)?;
    Ok(())
}

fn show(design: &DreamcatcherDesign) -> std::io::Result<()> {
    out(format!("rings:          {}", design.ring_count))?;
    out(format!("diameter:       {}", design.diameter))?;
    out(format!("feathers:       {} × {}", design.feather_count, design.feather_length))?;
    out(format!("ring color:     {}", design.ring_color))?;
    out(format!("web color:      {}", design.web_color))?;
    out(format!("feather color:  {}", design.feather_color))?;
    out(format!("bead color:     {}", design.bead_color))?;
    out(format!("background:     {}", design.background))?;
    if let Some(symbol) = design.symbol {
        out(format!("symbol:         {symbol}"))?;
    }
    if let Some(banner) = design.banner_text() {
        out(format!("banner:         {banner}"))?;
    }
    for (i, sticker) in design.stickers.iter().enumerate() {
        out(format!("sticker {:>2}:     {} at ({}, {})", i + 1, sticker.kind, sticker.x, sticker.y))?;
    }
    Ok(())
}

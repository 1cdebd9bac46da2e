//! Dreamcatcher configurator.
//!
//! A [`DreamcatcherDesign`] is a handful of shape parameters plus an
//! append-only list of stickers placed on a 600×600 logical surface.
//! [`render`] rasterizes it at any size and [`export_png`] encodes the result
//! for attaching to an order. Named designs persist through [`SavedDesigns`].

mod render;
mod saved;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

pub use render::{export_png, render};
pub use saved::SavedDesigns;

/// Side of the logical drawing surface.
pub const LOGICAL_SIZE: f32 = 600.0;

/// Largest raster edge [`render`] accepts.
pub const MAX_RENDER_SIZE: u32 = 4096;

/// Longest banner text, in characters.
pub const MAX_BANNER_CHARS: usize = 24;

/// Errors from building, drawing or storing a design.
#[derive(Debug, Error)]
pub enum DesignError {
    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("banner is longer than {MAX_BANNER_CHARS} characters")]
    BannerTooLong,

    #[error("sticker coordinates must be finite")]
    InvalidCoordinates,

    #[error("unknown sticker {0:?}")]
    UnknownOrnament(String),

    #[error("render size {width}x{height} is outside 1..={MAX_RENDER_SIZE}")]
    InvalidSize { width: u32, height: u32 },

    #[error("no design named {0:?}")]
    NotFound(String),

    #[error("banner text layout failed: {0}")]
    Text(#[from] resvg::usvg::Error),

    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// =============================================================================
// Colors
// =============================================================================

/// Opaque sRGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb`, `rrggbb` or the short `#rgb` form.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidColor`] for anything else.
    pub fn parse(s: &str) -> Result<Self, DesignError> {
        let invalid = || DesignError::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(invalid)
        };

        match hex.len() {
            6 => Ok(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            3 => {
                let (r, g, b) = (channel(0..1)?, channel(1..2)?, channel(2..3)?);
                Ok(Self(r * 17, g * 17, b * 17))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = DesignError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

// =============================================================================
// Ornaments and stickers
// =============================================================================

/// Decoration shape, used for stickers and the center symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ornament {
    Star,
    Heart,
    Moon,
    Sparkle,
    Dot,
    Flower,
}

impl Ornament {
    /// Every ornament, in palette order.
    pub const ALL: [Self; 6] = [
        Self::Star,
        Self::Heart,
        Self::Moon,
        Self::Sparkle,
        Self::Dot,
        Self::Flower,
    ];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Star => "star",
            Self::Heart => "heart",
            Self::Moon => "moon",
            Self::Sparkle => "sparkle",
            Self::Dot => "dot",
            Self::Flower => "flower",
        }
    }
}

impl fmt::Display for Ornament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ornament {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == wanted)
            .ok_or_else(|| DesignError::UnknownOrnament(s.to_string()))
    }
}

/// A decoration placed by the user, in logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub x: f32,
    pub y: f32,
    pub kind: Ornament,
}

// =============================================================================
// Design
// =============================================================================

/// Shape parameters plus placed stickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DreamcatcherDesign {
    /// Concentric rings, 1-5.
    pub ring_count: u8,
    /// Hoop diameter in logical units, 120-440.
    pub diameter: f32,
    pub ring_color: Rgb,
    pub web_color: Rgb,
    /// Hanging feathers, 0-9.
    pub feather_count: u8,
    /// Feather length in logical units, 30-200.
    pub feather_length: f32,
    pub feather_color: Rgb,
    pub bead_color: Rgb,
    pub background: Rgb,
    pub symbol: Option<Ornament>,
    pub banner: Option<String>,
    pub stickers: Vec<Sticker>,
}

impl Default for DreamcatcherDesign {
    fn default() -> Self {
        Self {
            ring_count: 2,
            diameter: 300.0,
            ring_color: Rgb(0x8b, 0x5e, 0x3c),
            web_color: Rgb(0xd8, 0xc3, 0xa5),
            feather_count: 3,
            feather_length: 110.0,
            feather_color: Rgb(0xf2, 0xe8, 0xdc),
            bead_color: Rgb(0x4a, 0x90, 0xa4),
            background: Rgb(0xff, 0xfa, 0xf3),
            symbol: None,
            banner: None,
            stickers: Vec::new(),
        }
    }
}

impl DreamcatcherDesign {
    /// Check every parameter range.
    ///
    /// # Errors
    ///
    /// Returns the first parameter that is out of range.
    pub fn validate(&self) -> Result<(), DesignError> {
        check_range("ringCount", f32::from(self.ring_count), 1.0, 5.0)?;
        check_range("diameter", self.diameter, 120.0, 440.0)?;
        check_range("featherCount", f32::from(self.feather_count), 0.0, 9.0)?;
        check_range("featherLength", self.feather_length, 30.0, 200.0)?;

        if self
            .banner
            .as_deref()
            .is_some_and(|b| b.chars().count() > MAX_BANNER_CHARS)
        {
            return Err(DesignError::BannerTooLong);
        }

        if self
            .stickers
            .iter()
            .any(|s| !s.x.is_finite() || !s.y.is_finite())
        {
            return Err(DesignError::InvalidCoordinates);
        }

        Ok(())
    }

    /// Append a sticker at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidCoordinates`] for NaN or infinite input.
    pub fn place(&mut self, x: f32, y: f32, kind: Ornament) -> Result<(), DesignError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(DesignError::InvalidCoordinates);
        }
        self.stickers.push(Sticker { x, y, kind });
        Ok(())
    }

    /// Remove the most recently placed sticker.
    pub fn undo(&mut self) -> Option<Sticker> {
        self.stickers.pop()
    }

    /// Remove every sticker.
    pub fn clear_stickers(&mut self) {
        self.stickers.clear();
    }

    /// Banner text, if set and not blank.
    #[must_use]
    pub fn banner_text(&self) -> Option<&str> {
        self.banner.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), DesignError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DesignError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_parse_and_display() {
        assert_eq!(Rgb::parse("#8b5e3c").unwrap(), Rgb(0x8b, 0x5e, 0x3c));
        assert_eq!(Rgb::parse("FFFFFF").unwrap(), Rgb(255, 255, 255));
        assert_eq!(Rgb::parse("#f0a").unwrap(), Rgb(255, 0, 170));
        assert_eq!(Rgb(1, 2, 255).to_string(), "#0102ff");

        assert!(Rgb::parse("#12345").is_err());
        assert!(Rgb::parse("#gggggg").is_err());
        assert!(Rgb::parse("#ééé").is_err());
    }

    #[test]
    fn test_ornament_from_str() {
        assert_eq!("Heart".parse::<Ornament>().unwrap(), Ornament::Heart);
        assert!(matches!(
            "unicorn".parse::<Ornament>(),
            Err(DesignError::UnknownOrnament(_))
        ));
    }

    #[test]
    fn test_place_appends_and_undo_pops_last() {
        let mut design = DreamcatcherDesign::default();
        design.place(10.0, 20.0, Ornament::Star).unwrap();
        design.place(30.0, 40.0, Ornament::Heart).unwrap();
        design.place(50.0, 60.0, Ornament::Moon).unwrap();

        let kinds: Vec<_> = design.stickers.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![Ornament::Star, Ornament::Heart, Ornament::Moon]);

        let undone = design.undo().unwrap();
        assert_eq!(undone.kind, Ornament::Moon);
        assert_eq!(design.stickers.len(), 2);
        assert_eq!(design.stickers.last().unwrap().kind, Ornament::Heart);

        design.clear_stickers();
        assert!(design.undo().is_none());
    }

    #[test]
    fn test_place_rejects_non_finite() {
        let mut design = DreamcatcherDesign::default();
        assert!(design.place(f32::NAN, 1.0, Ornament::Dot).is_err());
        assert!(design.stickers.is_empty());
    }

    #[test]
    fn test_validate_ranges() {
        assert!(DreamcatcherDesign::default().validate().is_ok());

        let design = DreamcatcherDesign {
            ring_count: 0,
            ..DreamcatcherDesign::default()
        };
        assert!(matches!(
            design.validate(),
            Err(DesignError::OutOfRange { field: "ringCount", .. })
        ));

        let design = DreamcatcherDesign {
            banner: Some("x".repeat(MAX_BANNER_CHARS + 1)),
            ..DreamcatcherDesign::default()
        };
        assert!(matches!(design.validate(), Err(DesignError::BannerTooLong)));
    }

    #[test]
    fn test_serde_shape() {
        let mut design = DreamcatcherDesign {
            symbol: Some(Ornament::Moon),
            ..DreamcatcherDesign::default()
        };
        design.place(1.0, 2.0, Ornament::Flower).unwrap();

        let json = serde_json::to_value(&design).unwrap();
        assert_eq!(json["ringColor"], "#8b5e3c");
        assert_eq!(json["symbol"], "moon");
        assert_eq!(json["stickers"][0]["kind"], "flower");

        let back: DreamcatcherDesign = serde_json::from_value(json).unwrap();
        assert_eq!(back, design);

        let partial: DreamcatcherDesign = serde_json::from_str(r#"{"ringCount": 4}"#).unwrap();
        assert_eq!(partial.ring_count, 4);
        assert_eq!(partial.diameter, 300.0);
    }
}

//! Rasterizer for [`DreamcatcherDesign`].
//!
//! Shapes are built as `tiny_skia` paths in logical coordinates and painted
//! through one logical-to-pixel transform. The banner text is laid out by
//! `usvg` with an embedded DejaVu Sans Bold face and drawn by `resvg` onto
//! the same pixmap, so output does not depend on the fonts installed on the
//! machine.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use std::f32::consts::{PI, TAU};
use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use image::{ImageFormat, RgbaImage};
use resvg::tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Mask, Paint, Path, PathBuilder, Pixmap, Rect, Stroke,
    Transform,
};
use resvg::usvg;

use super::{DesignError, DreamcatcherDesign, LOGICAL_SIZE, MAX_RENDER_SIZE, Ornament, Rgb};

const STICKER_SIZE: f32 = 18.0;
const STRING_COLOR: Rgb = Rgb(0x6b, 0x4a, 0x2f);
const BANNER_COLOR: Rgb = Rgb(0xc9, 0x4f, 0x6d);
const BANNER_TEXT_COLOR: Rgb = Rgb(0xff, 0xf8, 0xee);
const BANNER_FONT_SIZE: f32 = 20.0;

static BANNER_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Draw a design onto an opaque `width`×`height` surface.
///
/// The 600×600 logical surface is scaled uniformly to fit and centered.
///
/// # Errors
///
/// Returns [`DesignError::InvalidSize`] for a zero or oversized surface,
/// [`DesignError::Text`] if the banner cannot be laid out, and any
/// validation error of the design.
pub fn render(design: &DreamcatcherDesign, width: u32, height: u32) -> Result<RgbaImage, DesignError> {
    if !(1..=MAX_RENDER_SIZE).contains(&width) || !(1..=MAX_RENDER_SIZE).contains(&height) {
        return Err(DesignError::InvalidSize { width, height });
    }
    design.validate()?;

    let mut canvas = Canvas::new(width, height, design.background)?;
    let layout = Layout::of(design);

    draw_banner(&mut canvas, design)?;
    draw_feathers(&mut canvas, design, &layout);
    draw_web(&mut canvas, design, &layout);
    draw_rings(&mut canvas, design, &layout);
    if let Some(symbol) = design.symbol {
        draw_ornament(&mut canvas, symbol, layout.cx, layout.cy, layout.radius * 0.16);
    }
    for sticker in &design.stickers {
        draw_ornament(&mut canvas, sticker.kind, sticker.x, sticker.y, STICKER_SIZE);
    }

    canvas.into_image()
}

/// Render and encode as PNG.
///
/// # Errors
///
/// Same as [`render`], plus [`DesignError::Image`] if encoding fails.
pub fn export_png(design: &DreamcatcherDesign, width: u32, height: u32) -> Result<Vec<u8>, DesignError> {
    let image = render(design, width, height)?;
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

// =============================================================================
// Layout
// =============================================================================

struct Layout {
    cx: f32,
    cy: f32,
    radius: f32,
}

impl Layout {
    fn of(design: &DreamcatcherDesign) -> Self {
        let radius = design.diameter / 2.0;
        // lift the hoop to leave room for feathers underneath
        let hanging = if design.feather_count > 0 {
            design.feather_length + 40.0
        } else {
            0.0
        };
        let cy = ((LOGICAL_SIZE - hanging) / 2.0 + 20.0).max(radius + 10.0);
        Self {
            cx: LOGICAL_SIZE / 2.0,
            cy,
            radius,
        }
    }
}

// =============================================================================
// Parts
// =============================================================================

fn draw_rings(canvas: &mut Canvas, design: &DreamcatcherDesign, layout: &Layout) {
    let color = design.ring_color;
    if let Some(hoop) = PathBuilder::from_circle(layout.cx, layout.cy, layout.radius) {
        canvas.stroke(&hoop, 8.0, color);
    }

    for i in 1..design.ring_count {
        let r = layout.radius * (1.0 - f32::from(i) * 0.14);
        if let Some(ring) = PathBuilder::from_circle(layout.cx, layout.cy, r) {
            canvas.stroke(&ring, 3.0, color);
        }
    }
}

fn draw_web(canvas: &mut Canvas, design: &DreamcatcherDesign, layout: &Layout) {
    let color = design.web_color;
    let inner = layout.radius * 0.12;
    let spokes = 8 + 2 * u32::from(design.ring_count);

    let mut pb = PathBuilder::new();
    for i in 0..spokes {
        let angle = TAU * i as f32 / spokes as f32;
        let (sin, cos) = angle.sin_cos();
        pb.move_to(layout.cx + cos * inner, layout.cy + sin * inner);
        pb.line_to(layout.cx + cos * layout.radius, layout.cy + sin * layout.radius);
    }

    // archimedean spiral from the center out to the innermost ring
    let turns = 3.0 + f32::from(design.ring_count) * 0.5;
    let steps = (turns * 48.0).round() as u32;
    let max_r = layout.radius * 0.86;
    pb.move_to(layout.cx + inner, layout.cy);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        let angle = t * turns * TAU;
        let r = inner + (max_r - inner) * t;
        pb.line_to(layout.cx + angle.cos() * r, layout.cy + angle.sin() * r);
    }

    if let Some(web) = pb.finish() {
        canvas.stroke(&web, 1.5, color);
    }
    if let Some(bead) = PathBuilder::from_circle(layout.cx, layout.cy, inner * 0.6) {
        canvas.fill(&bead, design.bead_color);
    }
}

fn draw_feathers(canvas: &mut Canvas, design: &DreamcatcherDesign, layout: &Layout) {
    let count = design.feather_count;
    if count == 0 {
        return;
    }

    let length = design.feather_length;
    let half_width = (length * 0.16).max(7.0);

    for i in 0..count {
        // spread along the lower arc of the hoop
        let t = (f32::from(i) + 1.0) / (f32::from(count) + 1.0);
        let angle = PI * (0.85 - 0.7 * t);
        let (x, top) = (
            layout.cx + angle.cos() * layout.radius,
            layout.cy + angle.sin() * layout.radius,
        );
        let drop = 24.0 + 10.0 * (f32::from(i) % 2.0);
        let tip = top + drop;

        let mut string = PathBuilder::new();
        string.move_to(x, top);
        string.line_to(x, tip);
        if let Some(string) = string.finish() {
            canvas.stroke(&string, 2.0, STRING_COLOR);
        }
        if let Some(bead) = PathBuilder::from_circle(x, top + drop * 0.55, 5.0) {
            canvas.fill(&bead, design.bead_color);
        }

        // teardrop, widest in the lower third
        let bottom = tip + length;
        let mut vane = PathBuilder::new();
        vane.move_to(x, tip);
        vane.cubic_to(
            x - half_width * 0.5,
            tip + length * 0.25,
            x - half_width * 1.3,
            tip + length * 0.8,
            x,
            bottom,
        );
        vane.cubic_to(
            x + half_width * 1.3,
            tip + length * 0.8,
            x + half_width * 0.5,
            tip + length * 0.25,
            x,
            tip,
        );
        vane.close();
        if let Some(vane) = vane.finish() {
            canvas.fill(&vane, design.feather_color);
        }

        let mut quill = PathBuilder::new();
        quill.move_to(x, tip);
        quill.line_to(x, bottom);
        if let Some(quill) = quill.finish() {
            canvas.stroke(&quill, 1.2, STRING_COLOR);
        }
    }
}

fn draw_banner(canvas: &mut Canvas, design: &DreamcatcherDesign) -> Result<(), DesignError> {
    let Some(text) = design.banner_text() else {
        return Ok(());
    };

    let chars = text.chars().count() as f32;
    let half = (chars * 7.0 + 30.0).min(LOGICAL_SIZE / 2.0 - 40.0);
    let (cx, top, bottom) = (LOGICAL_SIZE / 2.0, 24.0, 58.0);
    let mid = (top + bottom) / 2.0;

    // swallow-tail ends sit slightly lower, behind the ribbon
    for side in [-1.0_f32, 1.0] {
        let inner = cx + side * half;
        let outer = inner + side * 26.0;
        let tail = polygon([
            (inner, top + 6.0),
            (outer, top + 6.0),
            (outer - side * 12.0, mid + 6.0),
            (outer, bottom + 6.0),
            (inner, bottom + 6.0),
        ]);
        if let Some(tail) = tail {
            canvas.fill(&tail, BANNER_COLOR);
        }
    }
    if let Some(ribbon) = Rect::from_ltrb(cx - half, top, cx + half, bottom) {
        canvas.fill(&PathBuilder::from_rect(ribbon), BANNER_COLOR);
    }

    let baseline = mid + BANNER_FONT_SIZE * 0.36;
    canvas.text(text, cx, baseline, BANNER_FONT_SIZE, BANNER_TEXT_COLOR)
}

fn draw_ornament(canvas: &mut Canvas, kind: Ornament, cx: f32, cy: f32, size: f32) {
    match kind {
        Ornament::Dot => {
            if let Some(dot) = PathBuilder::from_circle(cx, cy, size * 0.5) {
                canvas.fill(&dot, Rgb(0x4a, 0x90, 0xa4));
            }
        }
        Ornament::Star => {
            if let Some(star) = star(cx, cy, size, size * 0.45, 5) {
                canvas.fill(&star, Rgb(0xf5, 0xc2, 0x3c));
            }
        }
        Ornament::Sparkle => {
            if let Some(sparkle) = star(cx, cy, size, size * 0.22, 4) {
                canvas.fill(&sparkle, Rgb(0xff, 0xf4, 0xb8));
            }
        }
        Ornament::Heart => {
            if let Some(heart) = heart(cx, cy, size) {
                canvas.fill(&heart, Rgb(0xe0, 0x50, 0x6e));
            }
        }
        Ornament::Moon => {
            let disc = PathBuilder::from_circle(cx, cy, size);
            let bite = PathBuilder::from_circle(cx + size * 0.45, cy - size * 0.2, size * 0.85);
            if let (Some(disc), Some(bite)) = (disc, bite) {
                canvas.fill_outside(&disc, &bite, Rgb(0xf0, 0xe6, 0xaa));
            }
        }
        Ornament::Flower => {
            let mut petals = PathBuilder::new();
            for i in 0..5 {
                let angle = TAU * i as f32 / 5.0 - PI / 2.0;
                petals.push_circle(
                    cx + angle.cos() * size * 0.55,
                    cy + angle.sin() * size * 0.55,
                    size * 0.42,
                );
            }
            if let Some(petals) = petals.finish() {
                canvas.fill(&petals, Rgb(0xf0, 0x8c, 0xc8));
            }
            if let Some(heart) = PathBuilder::from_circle(cx, cy, size * 0.3) {
                canvas.fill(&heart, Rgb(0xf5, 0xc2, 0x3c));
            }
        }
    }
}

// =============================================================================
// Shapes
// =============================================================================

fn polygon(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for (i, (x, y)) in points.into_iter().enumerate() {
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}

fn star(cx: f32, cy: f32, outer: f32, inner: f32, points: u32) -> Option<Path> {
    polygon((0..points * 2).map(|i| {
        let r = if i % 2 == 0 { outer } else { inner };
        let angle = PI * i as f32 / points as f32 - PI / 2.0;
        (cx + angle.cos() * r, cy + angle.sin() * r)
    }))
}

fn heart(cx: f32, cy: f32, size: f32) -> Option<Path> {
    let scale = size / 17.0;
    polygon((0..64).map(|i| {
        let t = TAU * i as f32 / 64.0;
        let x = 16.0 * t.sin().powi(3);
        let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
        (cx + x * scale, cy - y * scale)
    }))
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Font database holding only the embedded banner face, set as the
/// `sans-serif` family.
fn banner_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    let fonts = FONTS.get_or_init(|| {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_font_data(BANNER_FONT.to_vec());
        let family = fontdb
            .faces()
            .next()
            .and_then(|face| face.families.first().map(|(name, _)| name.clone()));
        match family {
            Some(name) => fontdb.set_sans_serif_family(name),
            None => tracing::warn!("embedded banner font has no family name"),
        }
        Arc::new(fontdb)
    });
    Arc::clone(fonts)
}

// =============================================================================
// Canvas
// =============================================================================

impl Rgb {
    fn paint(self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(self.0, self.1, self.2, 255);
        paint.anti_alias = true;
        paint
    }
}

/// Pixmap addressed in logical coordinates.
struct Canvas {
    pixmap: Pixmap,
    transform: Transform,
    scale: f32,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Rgb) -> Result<Self, DesignError> {
        let mut pixmap = Pixmap::new(width, height).ok_or(DesignError::InvalidSize { width, height })?;
        pixmap.fill(Color::from_rgba8(background.0, background.1, background.2, 255));

        let scale = width.min(height) as f32 / LOGICAL_SIZE;
        let transform = Transform::from_scale(scale, scale).post_translate(
            (width as f32 - LOGICAL_SIZE * scale) / 2.0,
            (height as f32 - LOGICAL_SIZE * scale) / 2.0,
        );
        Ok(Self {
            pixmap,
            transform,
            scale,
        })
    }

    /// The background is opaque, so every pixel has full alpha and the
    /// premultiplied buffer is already straight RGBA.
    fn into_image(self) -> Result<RgbaImage, DesignError> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        RgbaImage::from_raw(width, height, self.pixmap.take())
            .ok_or(DesignError::InvalidSize { width, height })
    }

    fn fill(&mut self, path: &Path, color: Rgb) {
        self.pixmap
            .fill_path(path, &color.paint(), FillRule::Winding, self.transform, None);
    }

    /// Fill `path` except where it overlaps `hole`.
    fn fill_outside(&mut self, path: &Path, hole: &Path, color: Rgb) {
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        mask.fill_path(hole, FillRule::Winding, true, self.transform);
        mask.invert();
        self.pixmap
            .fill_path(path, &color.paint(), FillRule::Winding, self.transform, Some(&mask));
    }

    /// Stroke `width` logical units wide, never thinner than one pixel.
    fn stroke(&mut self, path: &Path, width: f32, color: Rgb) {
        let stroke = Stroke {
            width: width.max(1.0 / self.scale),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &color.paint(), &stroke, self.transform, None);
    }

    /// Centered single-line text with its baseline at `y`.
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgb) -> Result<(), DesignError> {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{LOGICAL_SIZE}" height="{LOGICAL_SIZE}" viewBox="0 0 {LOGICAL_SIZE} {LOGICAL_SIZE}"><text x="{x}" y="{y}" font-family="sans-serif" font-weight="bold" font-size="{size}" text-anchor="middle" fill="{color}">{}</text></svg>"#,
            xml_escape(text)
        );

        let opt = usvg::Options {
            fontdb: banner_fonts(),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opt)?;
        resvg::render(&tree, self.transform, &mut self.pixmap.as_mut());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{GenericImageView, Rgba};

    use super::*;

    fn opaque(color: Rgb) -> Rgba<u8> {
        Rgba([color.0, color.1, color.2, 255])
    }

    fn bannered(text: &str) -> DreamcatcherDesign {
        DreamcatcherDesign {
            banner: Some(text.to_string()),
            ..DreamcatcherDesign::default()
        }
    }

    #[test]
    fn test_render_dimensions_and_background() {
        let design = DreamcatcherDesign::default();
        let image = render(&design, 300, 200).unwrap();
        assert_eq!(image.dimensions(), (300, 200));
        assert_eq!(*image.get_pixel(0, 0), opaque(design.background));
        assert!(image.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_render_draws_hoop() {
        let design = DreamcatcherDesign::default();
        let layout = Layout::of(&design);
        let image = render(&design, 600, 600).unwrap();

        // rightmost point of the outer ring
        let x = (layout.cx + layout.radius) as u32;
        let y = layout.cy as u32;
        assert_eq!(*image.get_pixel(x, y), opaque(design.ring_color));
    }

    #[test]
    fn test_sticker_is_drawn_where_placed() {
        let mut design = DreamcatcherDesign {
            feather_count: 0,
            ..DreamcatcherDesign::default()
        };
        design.place(40.0, 560.0, Ornament::Dot).unwrap();
        let image = render(&design, 600, 600).unwrap();
        assert_ne!(*image.get_pixel(40, 560), opaque(design.background));

        design.undo();
        let image = render(&design, 600, 600).unwrap();
        assert_eq!(*image.get_pixel(40, 560), opaque(design.background));
    }

    #[test]
    fn test_moon_leaves_its_bite_empty() {
        let mut design = DreamcatcherDesign {
            feather_count: 0,
            ..DreamcatcherDesign::default()
        };
        design.place(60.0, 540.0, Ornament::Moon).unwrap();
        let image = render(&design, 600, 600).unwrap();

        // left limb is painted, the bitten-out side is not
        assert_ne!(*image.get_pixel(46, 540), opaque(design.background));
        assert_eq!(*image.get_pixel(68, 536), opaque(design.background));
    }

    #[test]
    fn test_sticker_off_canvas_is_clipped() {
        let mut design = DreamcatcherDesign::default();
        design.place(-500.0, 9000.0, Ornament::Star).unwrap();
        assert!(render(&design, 64, 64).is_ok());
    }

    #[test]
    fn test_invalid_size() {
        let design = DreamcatcherDesign::default();
        assert!(matches!(
            render(&design, 0, 10),
            Err(DesignError::InvalidSize { .. })
        ));
        assert!(render(&design, MAX_RENDER_SIZE + 1, 10).is_err());
    }

    #[test]
    fn test_banner_text_is_drawn() {
        let luna = render(&bannered("LUNA"), 600, 600).unwrap();
        let sole = render(&bannered("SOLE"), 600, 600).unwrap();
        assert_ne!(luna.as_raw(), sole.as_raw());

        let text_color = opaque(BANNER_TEXT_COLOR);
        let ribbon = luna.view(240, 24, 120, 34);
        assert!(ribbon.pixels().any(|(_, _, p)| p == text_color));
    }

    #[test]
    fn test_banner_text_is_escaped() {
        let image = render(&bannered("<Sogni & \"stelle\">"), 200, 200).unwrap();
        assert_eq!(image.dimensions(), (200, 200));
    }

    #[test]
    fn test_export_png_signature() {
        let design = DreamcatcherDesign {
            symbol: Some(Ornament::Heart),
            banner: Some("Sogni d'oro".to_string()),
            ..DreamcatcherDesign::default()
        };
        let png = export_png(&design, 120, 120).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]));

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), 120);
    }
}

//! Text measurement and painting.
//!
//! The compositor and the compliance checks only need two things from a
//! font: the pixel box a run of text occupies, and a way to paint it.
//! [`BuiltinFont`] answers both deterministically with a scaled 5×8 bitmap
//! face, so renders never depend on what is installed on the host.

use std::fmt;

use image::{Rgba, RgbaImage};
use retailor_core::{Rect, Rgb};

use crate::error::RenderResult;
use crate::raster::blend_over;

/// Measures and paints single-line text runs.
pub trait FontRasterizer: Send + Sync + fmt::Debug {
    /// Pixel box of `text` at `font_size` with its top-left anchored at `origin`.
    ///
    /// Empty text yields an empty box at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::Font`] if the text cannot be laid out.
    fn measure(&self, text: &str, font_size: u32, origin: (i32, i32)) -> RenderResult<Rect>;

    /// Paint `text` onto `canvas` in `color` with its top-left at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RenderError::Font`] if the text cannot be rasterized.
    fn paint(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: u32,
        origin: (i32, i32),
        color: Rgb,
    ) -> RenderResult<()>;
}

const GLYPH_COLUMNS: u32 = 5;
const GLYPH_ROWS: u32 = 8;
const ADVANCE: u32 = GLYPH_COLUMNS + 1;
const FIRST_GLYPH: u8 = b' ';

/// Column-major glyph bitmaps for `' '..='_'`; bit 0 is the top row.
const GLYPHS: [[u8; 5]; 64] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x56, 0x20, 0x50], // &
    [0x00, 0x08, 0x07, 0x03, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x2A, 0x1C, 0x7F, 0x1C, 0x2A], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x80, 0x70, 0x30, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x00, 0x60, 0x60, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x72, 0x49, 0x49, 0x49, 0x46], // 2
    [0x21, 0x41, 0x49, 0x4D, 0x33], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x31], // 6
    [0x41, 0x21, 0x11, 0x09, 0x07], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x46, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x00, 0x14, 0x00, 0x00], // :
    [0x00, 0x40, 0x34, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x00, 0x41, 0x22, 0x14, 0x08], // >
    [0x02, 0x01, 0x59, 0x09, 0x06], // ?
    [0x3E, 0x41, 0x5D, 0x59, 0x4E], // @
    [0x7C, 0x12, 0x11, 0x12, 0x7C], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x41, 0x3E], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x09, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x73], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x1C, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x26, 0x49, 0x49, 0x49, 0x32], // S
    [0x03, 0x01, 0x7F, 0x01, 0x03], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x59, 0x49, 0x4D, 0x43], // Z
    [0x00, 0x7F, 0x41, 0x41, 0x41], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // \
    [0x00, 0x41, 0x41, 0x41, 0x7F], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
];

/// Deterministic bitmap font built into the renderer.
///
/// Each glyph is a 5×8 cell followed by one blank column, scaled by
/// `round(font_size / 8)` (at least 1). Lowercase letters render as
/// uppercase; anything else outside the table renders as `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFont;

impl BuiltinFont {
    /// Create the built-in font.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Pixel size of one font unit at `font_size`.
    #[must_use]
    pub fn scale(font_size: u32) -> u32 {
        let rounded = (u64::from(font_size) + u64::from(GLYPH_ROWS / 2)) / u64::from(GLYPH_ROWS);
        u32::try_from(rounded).unwrap_or(u32::MAX).max(1)
    }

    fn glyph(c: char) -> &'static [u8; 5] {
        let c = c.to_ascii_uppercase();
        let index = u8::try_from(c)
            .ok()
            .and_then(|b| b.checked_sub(FIRST_GLYPH))
            .map(usize::from)
            .filter(|&i| i < GLYPHS.len())
            .unwrap_or(usize::from(b'?' - FIRST_GLYPH));
        &GLYPHS[index]
    }
}

impl FontRasterizer for BuiltinFont {
    fn measure(&self, text: &str, font_size: u32, origin: (i32, i32)) -> RenderResult<Rect> {
        let (x, y) = (i64::from(origin.0), i64::from(origin.1));
        let count = text.chars().count() as u64;
        if count == 0 {
            return Ok(Rect::new(x, y, 0, 0));
        }
        let s = u64::from(Self::scale(font_size));
        let width = count * u64::from(ADVANCE) * s - s;
        Ok(Rect::new(x, y, width, u64::from(GLYPH_ROWS) * s))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn paint(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        font_size: u32,
        origin: (i32, i32),
        color: Rgb,
    ) -> RenderResult<()> {
        let s = i64::from(Self::scale(font_size));
        let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
        let ink = Rgba(color.with_alpha(255));

        let mut pen = i64::from(origin.0);
        let top = i64::from(origin.1);
        for c in text.chars() {
            for (col, bits) in Self::glyph(c).iter().enumerate() {
                for row in 0..GLYPH_ROWS {
                    if bits & (1 << row) == 0 {
                        continue;
                    }
                    let x0 = pen + col as i64 * s;
                    let y0 = top + i64::from(row) * s;
                    for py in y0.max(0)..(y0 + s).min(ch) {
                        for px in x0.max(0)..(x0 + s).min(cw) {
                            blend_over(canvas.get_pixel_mut(px as u32, py as u32), ink);
                        }
                    }
                }
            }
            pen += i64::from(ADVANCE) * s;
        }
        Ok(())
    }
}

#[cfg(feature = "system-fonts")]
pub use system::SystemFontRasterizer;

#[cfg(feature = "system-fonts")]
mod system {
    use std::fmt::Write;

    use image::{Rgba, RgbaImage};
    use retailor_core::{Rect, Rgb};

    use super::{BuiltinFont, FontRasterizer};
    use crate::error::{RenderError, RenderResult};
    use crate::raster::overlay;

    /// Rasterizes through the host's installed sans-serif faces via
    /// usvg/resvg, falling back to [`BuiltinFont`] when no face is found.
    pub struct SystemFontRasterizer {
        options: usvg::Options<'static>,
        fallback: BuiltinFont,
    }

    impl std::fmt::Debug for SystemFontRasterizer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SystemFontRasterizer")
                .field("faces", &self.options.fontdb.len())
                .finish()
        }
    }

    impl Default for SystemFontRasterizer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SystemFontRasterizer {
        /// Load the system font database.
        #[must_use]
        pub fn new() -> Self {
            let mut options = usvg::Options::default();
            options.fontdb_mut().load_system_fonts();
            tracing::debug!("Loaded {} system font faces", options.fontdb.len());
            Self {
                options,
                fallback: BuiltinFont::new(),
            }
        }

        /// Lay the text out as an SVG tree anchored at the origin.
        ///
        /// Returns `None` when no installed face produced any glyphs.
        fn layout(&self, text: &str, font_size: u32, color: Rgb) -> RenderResult<Option<usvg::Tree>> {
            let width = font_size.saturating_mul(u32::try_from(text.chars().count()).unwrap_or(u32::MAX)).max(1);
            let height = font_size.saturating_mul(2).max(1);
            let mut svg = String::new();
            let _ = write!(
                svg,
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><text x="0" y="{font_size}" font-family="sans-serif" font-size="{font_size}" fill="{color}">{}</text></svg>"#,
                escape_xml(text)
            );
            let tree = usvg::Tree::from_str(&svg, &self.options)
                .map_err(|e| RenderError::Font(format!("text layout failed: {e}")))?;
            Ok(tree.root().has_children().then_some(tree))
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn bounds(tree: &usvg::Tree, origin: (i32, i32)) -> Rect {
        let b = tree.root().abs_bounding_box();
        let x0 = b.left().floor() as i64;
        let y0 = b.top().floor() as i64;
        let x1 = b.right().ceil() as i64;
        let y1 = b.bottom().ceil() as i64;
        Rect::from_corners(
            i64::from(origin.0) + x0,
            i64::from(origin.1) + y0,
            i64::from(origin.0) + x1,
            i64::from(origin.1) + y1,
        )
    }

    impl FontRasterizer for SystemFontRasterizer {
        fn measure(&self, text: &str, font_size: u32, origin: (i32, i32)) -> RenderResult<Rect> {
            if text.is_empty() {
                return self.fallback.measure(text, font_size, origin);
            }
            match self.layout(text, font_size, Rgb::BLACK)? {
                Some(tree) => Ok(bounds(&tree, origin)),
                None => self.fallback.measure(text, font_size, origin),
            }
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        fn paint(
            &self,
            canvas: &mut RgbaImage,
            text: &str,
            font_size: u32,
            origin: (i32, i32),
            color: Rgb,
        ) -> RenderResult<()> {
            let Some(tree) = self.layout(text, font_size, color)? else {
                return self.fallback.paint(canvas, text, font_size, origin, color);
            };
            let size = tree.size();
            let mut pixmap = tiny_skia::Pixmap::new(
                size.width().ceil() as u32,
                size.height().ceil() as u32,
            )
            .ok_or_else(|| RenderError::Font("failed to create pixmap".to_string()))?;
            resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

            let mut layer = RgbaImage::new(pixmap.width(), pixmap.height());
            for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
                let c = src.demultiply();
                *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
            }
            overlay(canvas, &layer, i64::from(origin.0), i64::from(origin.1));
            Ok(())
        }
    }

    fn escape_xml(input: &str) -> String {
        input
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}

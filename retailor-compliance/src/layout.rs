//! Layout suggestions built around a product image.
//!
//! The product shot drives two choices: its mean colour picks black or
//! white text, and its brightest region decides where the full-bleed
//! hero is anchored. Suggestions come back as [`Template`]s whose layers
//! already point at the caller's assets.

use image::{imageops, RgbaImage};
use retailor_core::{AssetId, Layer, Rect, Rgb, Template, DEFAULT_HEIGHT, DEFAULT_WIDTH, LOGO_ROLE};
use serde::{Deserialize, Serialize};

use crate::contrast::best_text_color;
use crate::metrics::sample_mean_rgb;

/// Side of the grid the focal point search runs on.
pub const FOCAL_GRID: u32 = 32;

const HERO_SIZE: u32 = 600;
const LOGO_SIZE: u32 = 180;

/// What a set of suggestions is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutBrief {
    /// Product image placed in every layout.
    pub product: AssetId,
    /// Optional brand logo, added to every layout.
    pub logo: Option<AssetId>,
    /// Headline text.
    pub headline: String,
    /// Call-to-action text.
    pub cta: String,
}

impl LayoutBrief {
    /// A brief with the stock headline and call to action.
    #[must_use]
    pub fn new(product: impl Into<AssetId>) -> Self {
        Self {
            product: product.into(),
            logo: None,
            headline: "Your Product Headline".to_string(),
            cta: "Shop Now".to_string(),
        }
    }

    /// Add a logo.
    #[must_use]
    pub fn with_logo(mut self, logo: impl Into<AssetId>) -> Self {
        self.logo = Some(logo.into());
        self
    }

    /// Replace the headline.
    #[must_use]
    pub fn with_headline(mut self, headline: impl Into<String>) -> Self {
        self.headline = headline.into();
        self
    }

    /// Replace the call to action.
    #[must_use]
    pub fn with_cta(mut self, cta: impl Into<String>) -> Self {
        self.cta = cta.into();
        self
    }
}

/// Centre of the brightest cell when `img` is reduced to a
/// [`FOCAL_GRID`]-square greyscale grid, in `img` pixels.
///
/// Ties go to the first cell in row-major order.
#[must_use]
pub fn focal_point(img: &RgbaImage) -> (u32, u32) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let grid = imageops::resize(
        &imageops::grayscale(img),
        FOCAL_GRID,
        FOCAL_GRID,
        imageops::FilterType::Triangle,
    );

    let mut best = (0, 0, 0u8);
    for (x, y, pixel) in grid.enumerate_pixels() {
        if pixel.0[0] > best.2 {
            best = (x, y, pixel.0[0]);
        }
    }
    let centre = |cell: u32, size: u32| {
        let scaled = (u64::from(cell) * 2 + 1) * u64::from(size) / u64::from(FOCAL_GRID * 2);
        u32::try_from(scaled).unwrap_or(size)
    };
    (centre(best.0, width), centre(best.1, height))
}

/// Mean colour of the whole image, ignoring alpha.
#[must_use]
pub fn mean_color(img: &RgbaImage) -> Rgb {
    sample_mean_rgb(
        img,
        Rect::new(0, 0, u64::from(img.width()), u64::from(img.height())),
    )
}

/// Offset that puts `focal` (in an image `source` pixels long) at the
/// canvas centre once the image is stretched to `HERO_SIZE`, kept on canvas.
fn hero_offset(focal: u32, source: u32, canvas: u32) -> i32 {
    let on_hero = i64::from(focal) * i64::from(HERO_SIZE) / i64::from(source.max(1));
    let max = i64::from(canvas.saturating_sub(HERO_SIZE));
    let offset = (i64::from(canvas / 2) - on_hero).clamp(0, max);
    i32::try_from(offset).unwrap_or(0)
}

/// Three starter layouts for a 1080×1080 canvas around `product`.
///
/// `product` is the decoded image behind `brief.product`. A logo, when
/// given, sits in the top-right corner `logo_margin` pixels in from the
/// edges.
#[must_use]
pub fn suggest_layouts(brief: &LayoutBrief, product: &RgbaImage, logo_margin: i64) -> Vec<Template> {
    let backdrop = mean_color(product);
    let ink = best_text_color(backdrop);
    let (fx, fy) = focal_point(product);
    let hero = (
        hero_offset(fx, product.width(), DEFAULT_WIDTH),
        hero_offset(fy, product.height(), DEFAULT_HEIGHT),
    );

    let layout = |name: &str, layers: Vec<Layer>| Template {
        name: name.to_string(),
        width: DEFAULT_WIDTH,
        height: DEFAULT_HEIGHT,
        background_color: backdrop,
        layers,
    };
    let image = |w, h| Layer::image(brief.product.clone(), w, h);
    let text = |s: &str, size| Layer::text(s, size, ink);

    let mut layouts = vec![
        layout(
            "Centered Hero",
            vec![
                image(680, 680).at(200, 200),
                text(&brief.headline, 64).at(150, 920),
                text(&brief.cta, 48).at(380, 1000),
            ],
        ),
        layout(
            "Left Hero + Right Text",
            vec![
                image(500, 500).at(100, 200),
                text(&brief.headline, 60).at(650, 250),
                text(&brief.cta, 46).at(650, 350),
            ],
        ),
        layout(
            "Full Background",
            vec![
                image(HERO_SIZE, HERO_SIZE).at(hero.0, hero.1),
                text(&brief.headline, 62).at(100, 900),
            ],
        ),
    ];

    if let Some(logo) = &brief.logo {
        let margin = i32::try_from(logo_margin.max(0)).unwrap_or(0);
        let right = i32::try_from(DEFAULT_WIDTH - LOGO_SIZE).unwrap_or(0) - margin;
        for suggestion in &mut layouts {
            suggestion.layers.push(
                Layer::image(logo.clone(), LOGO_SIZE, LOGO_SIZE)
                    .at(right, margin)
                    .with_role(LOGO_ROLE),
            );
        }
    }
    layouts
}

#[cfg(test)]
mod tests {
    use image::Rgba;
    use retailor_core::LayerKind;

    use super::*;

    fn text_colors(layouts: &[Template]) -> Vec<Rgb> {
        layouts
            .iter()
            .flat_map(|t| &t.layers)
            .filter_map(|l| match &l.kind {
                LayerKind::Text { color, .. } => Some(*color),
                LayerKind::Image { .. } => None,
            })
            .collect()
    }

    fn hero(layouts: &[Template]) -> (i32, i32) {
        let full = layouts
            .iter()
            .find(|t| t.name == "Full Background")
            .expect("full background");
        (full.layers[0].x, full.layers[0].y)
    }

    #[test]
    fn test_focal_point_finds_brightest_cell() {
        let mut img = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 255]));
        img.put_pixel(5, 7, Rgba([255, 255, 255, 255]));
        assert_eq!(focal_point(&img), (5, 7));
    }

    #[test]
    fn test_dark_product_gets_white_text() {
        let product = RgbaImage::from_pixel(40, 40, Rgba([20, 20, 30, 255]));
        let layouts = suggest_layouts(&LayoutBrief::new("p"), &product, 54);

        assert_eq!(layouts.len(), 3);
        let colors = text_colors(&layouts);
        assert_eq!(colors.len(), 5);
        assert!(colors.iter().all(|c| *c == Rgb::WHITE));
        assert!(layouts.iter().all(|t| t.background_color == Rgb::new(20, 20, 30)));
    }

    #[test]
    fn test_light_product_gets_black_text() {
        let product = RgbaImage::from_pixel(40, 40, Rgba([240, 240, 230, 255]));
        let layouts = suggest_layouts(&LayoutBrief::new("p"), &product, 54);
        assert!(text_colors(&layouts).iter().all(|c| *c == Rgb::BLACK));
    }

    #[test]
    fn test_hero_follows_bright_region() {
        let mut top_left = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
        let mut bottom_right = top_left.clone();
        for y in 0..8 {
            for x in 0..8 {
                top_left.put_pixel(x, y, Rgba([255, 255, 255, 255]));
                bottom_right.put_pixel(56 + x, 56 + y, Rgba([255, 255, 255, 255]));
            }
        }
        let brief = LayoutBrief::new("p");

        // a bright top-left corner pushes the hero right and down
        let (x, y) = hero(&suggest_layouts(&brief, &top_left, 54));
        assert!(x >= 400 && y >= 400, "({x}, {y})");

        // a bright bottom-right corner pulls it towards the origin
        let (x, y) = hero(&suggest_layouts(&brief, &bottom_right, 54));
        assert!(x <= 100 && y <= 100, "({x}, {y})");
    }

    #[test]
    fn test_logo_inside_margin() {
        let product = RgbaImage::from_pixel(8, 8, Rgba([200, 200, 200, 255]));
        let brief = LayoutBrief::new("p").with_logo("l").with_headline("Fresh").with_cta("Buy");
        let layouts = suggest_layouts(&brief, &product, 54);

        for layout in &layouts {
            let logo = layout.layers.last().expect("logo");
            assert!(logo.is_logo());
            assert_eq!((logo.x, logo.y), (846, 54));
        }
        assert!(matches!(
            &layouts[0].layers[1].kind,
            LayerKind::Text { text, .. } if text == "Fresh"
        ));
    }
}

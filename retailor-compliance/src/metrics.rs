//! Measurements taken from a rendered canvas and layer geometry.

use image::{ImageBuffer, Pixel};
use retailor_core::{Rect, Rgb};

/// Mean colour of the canvas under `region`.
///
/// The region is grown to at least 1×1 and clipped to the canvas. An empty
/// clip samples as white. Channel means are truncated to integers; alpha
/// is ignored.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sample_mean_rgb<P>(canvas: &ImageBuffer<P, Vec<u8>>, region: Rect) -> Rgb
where
    P: Pixel<Subpixel = u8>,
{
    let region = Rect::new(region.x, region.y, region.width.max(1), region.height.max(1));
    let Some(clip) = region.clamp_to(canvas.width(), canvas.height()) else {
        return Rgb::WHITE;
    };

    let mut sums = [0u64; 3];
    for y in clip.y..clip.bottom() {
        for x in clip.x..clip.right() {
            let pixel = canvas.get_pixel(x as u32, y as u32).to_rgb();
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += u64::from(channel);
            }
        }
    }
    let count = clip.area();
    Rgb::new(
        (sums[0] / count) as u8,
        (sums[1] / count) as u8,
        (sums[2] / count) as u8,
    )
}

/// Canvas pixels a text box actually covers.
#[must_use]
pub fn covered_area(bbox: Rect, canvas_width: u32, canvas_height: u32) -> u64 {
    bbox.clamp_to(canvas_width, canvas_height)
        .map_or(0, |clip| clip.area())
}

/// Whether `bounds` sits closer than `margin` pixels to any canvas edge.
#[must_use]
pub fn breaches_margin(bounds: Rect, canvas_width: u32, canvas_height: u32, margin: i64) -> bool {
    bounds.x < margin
        || bounds.y < margin
        || i64::from(canvas_width) - bounds.right() < margin
        || i64::from(canvas_height) - bounds.bottom() < margin
}

/// Overlap share above which two images are considered to collide.
pub const OVERLAP_THRESHOLD: f64 = 0.4;

/// Intersection area of `a` and `b` when it exceeds 40% of the smaller box.
#[must_use]
pub fn significant_overlap(a: Rect, b: Rect) -> Option<u64> {
    let overlap = a.intersection(&b)?.area();
    let smaller = a.area().min(b.area());
    // overlap / smaller > 0.4, kept in integers
    (smaller > 0 && u128::from(overlap) * 5 > u128::from(smaller) * 2).then_some(overlap)
}

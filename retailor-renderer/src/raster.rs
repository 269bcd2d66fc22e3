//! Pixel-level primitives shared by the compositor and the rasterizers.
//!
//! All blending is straight (non-premultiplied) alpha with integer
//! arithmetic, so results are bit-identical across platforms.

use image::{imageops, Rgba, RgbaImage};

/// Paint `src` over `dst` with source-over compositing.
#[allow(clippy::cast_possible_truncation)]
pub fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return;
    }
    if sa == 255 {
        *dst = src;
        return;
    }
    let da = u32::from(dst[3]);
    let inv = 255 - sa;
    // Output alpha scaled by 255.
    let out = sa * 255 + da * inv;
    for i in 0..3 {
        let c = u32::from(src[i]) * sa * 255 + u32::from(dst[i]) * da * inv;
        dst[i] = ((c + out / 2) / out) as u8;
    }
    dst[3] = ((out + 127) / 255) as u8;
}

/// Composite `layer` onto `canvas` with its top-left corner at `(x, y)`.
/// Pixels falling outside the canvas are dropped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn overlay(canvas: &mut RgbaImage, layer: &RgbaImage, x: i64, y: i64) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    let (lw, lh) = (i64::from(layer.width()), i64::from(layer.height()));

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + lw).min(cw);
    let y1 = (y + lh).min(ch);
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    for cy in y0..y1 {
        for cx in x0..x1 {
            let src = *layer.get_pixel((cx - x) as u32, (cy - y) as u32);
            blend_over(canvas.get_pixel_mut(cx as u32, cy as u32), src);
        }
    }
}

/// Multiply every alpha value by `opacity`, truncating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_alpha(img: &mut RgbaImage, opacity: f32) {
    if opacity >= 1.0 {
        return;
    }
    let opacity = opacity.max(0.0);
    for pixel in img.pixels_mut() {
        pixel[3] = (f32::from(pixel[3]) * opacity) as u8;
    }
}

/// Stretch to exactly `width × height` with Catmull-Rom filtering.
#[must_use]
pub fn stretch(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, imageops::FilterType::CatmullRom)
}

/// Size of the box that holds a `width × height` image rotated by `degrees`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn rotated_size(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let theta = f64::from(degrees).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (f64::from(width), f64::from(height));
    // Shave float noise so exact quarter turns do not grow by a pixel.
    let nw = (w * cos + h * sin - 1e-6).ceil().max(1.0);
    let nh = (w * sin + h * cos - 1e-6).ceil().max(1.0);
    (nw as u32, nh as u32)
}

/// Rotate counter-clockwise by `degrees` about the image centre into an
/// expanded transparent box, sampling nearest-neighbour.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]
pub fn rotate_expand(img: &RgbaImage, degrees: f32) -> RgbaImage {
    if degrees.rem_euclid(360.0) == 0.0 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    let (nw, nh) = rotated_size(w, h, degrees);
    let theta = f64::from(degrees).to_radians();
    let (sin, cos) = theta.sin_cos();

    let (scx, scy) = (f64::from(w) / 2.0, f64::from(h) / 2.0);
    let (dcx, dcy) = (f64::from(nw) / 2.0, f64::from(nh) / 2.0);

    let mut out = RgbaImage::new(nw, nh);
    for (dx, dy, pixel) in out.enumerate_pixels_mut() {
        let px = f64::from(dx) + 0.5 - dcx;
        let py = f64::from(dy) + 0.5 - dcy;
        let sx = (px * cos - py * sin + scx).floor();
        let sy = (px * sin + py * cos + scy).floor();
        if sx >= 0.0 && sy >= 0.0 && sx < f64::from(w) && sy < f64::from(h) {
            *pixel = *img.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_opaque_replaces() {
        let mut dst = Rgba([10, 20, 30, 255]);
        blend_over(&mut dst, Rgba([200, 100, 50, 255]));
        assert_eq!(dst, Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_blend_transparent_is_noop() {
        let mut dst = Rgba([10, 20, 30, 255]);
        blend_over(&mut dst, Rgba([200, 100, 50, 0]));
        assert_eq!(dst, Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_blend_half_over_opaque() {
        let mut dst = Rgba([0, 0, 0, 255]);
        blend_over(&mut dst, Rgba([255, 255, 255, 128]));
        assert_eq!(dst, Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_overlay_clips_negative_offsets() {
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let layer = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        overlay(&mut canvas, &layer, -2, -2);
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_scale_alpha_truncates() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        scale_alpha(&mut img, 0.5);
        assert_eq!(img.get_pixel(0, 0)[3], 127);
    }

    #[test]
    fn test_quarter_turn_swaps_dimensions() {
        assert_eq!(rotated_size(100, 40, 90.0), (40, 100));
        assert_eq!(rotated_size(100, 40, 180.0), (100, 40));
        let (w, h) = rotated_size(100, 100, 45.0);
        assert_eq!((w, h), (142, 142));
    }

    #[test]
    fn test_rotate_ccw_moves_right_edge_to_top() {
        let mut img = RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 255]));
        for y in 0..2 {
            img.put_pixel(3, y, Rgba([255, 0, 0, 255]));
        }
        let rotated = rotate_expand(&img, 90.0);
        assert_eq!(rotated.dimensions(), (2, 4));
        assert_eq!(*rotated.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*rotated.get_pixel(1, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*rotated.get_pixel(0, 3), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_stretch_ignores_aspect() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 255]));
        assert_eq!(stretch(&img, 30, 5).dimensions(), (30, 5));
    }
}

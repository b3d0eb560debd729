//! Layer builders and whole-image adjustments used by the card renderer.
use image::imageops::{self, fast_blur};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect as PixelRect;

/// A rendered layer plus the offset of its top-left corner relative to the
/// shape it was built around. Blurred layers carry transparent padding so
/// their soft edges are not clipped.
#[derive(Debug, Clone)]
pub struct Layer {
    pub image: RgbaImage,
    pub offset: (i64, i64),
}

/// Coverage mask of a rounded rectangle. The radius is clamped to half of
/// the shorter side.
pub fn rounded_mask(width: u32, height: u32, radius: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }
    let white = Luma([255u8]);
    let radius = radius.min(width / 2).min(height / 2);
    if radius == 0 {
        mask.pixels_mut().for_each(|pixel| *pixel = white);
        return mask;
    }

    let (w, h, r) = (width as i32, height as i32, radius as i32);
    if w > 2 * r {
        draw_filled_rect_mut(
            &mut mask,
            PixelRect::at(r, 0).of_size((w - 2 * r) as u32, height),
            white,
        );
    }
    if h > 2 * r {
        draw_filled_rect_mut(
            &mut mask,
            PixelRect::at(0, r).of_size(width, (h - 2 * r) as u32),
            white,
        );
    }
    for center in [(r, r), (w - 1 - r, r), (r, h - 1 - r), (w - 1 - r, h - 1 - r)] {
        draw_filled_circle_mut(&mut mask, center, r, white);
    }
    mask
}

/// Multiplies the layer's alpha by `mask`, pixel for pixel.
pub fn apply_mask(layer: &mut RgbaImage, mask: &GrayImage) {
    for (x, y, pixel) in layer.enumerate_pixels_mut() {
        let coverage = if x < mask.width() && y < mask.height() {
            mask.get_pixel(x, y)[0]
        } else {
            0
        };
        pixel[3] = mul_alpha(pixel[3], coverage);
    }
}

fn mul_alpha(alpha: u8, coverage: u8) -> u8 {
    ((alpha as u16 * coverage as u16 + 127) / 255) as u8
}

fn blur(image: &RgbaImage, sigma: f32) -> RgbaImage {
    if sigma > 0.0 {
        fast_blur(image, sigma)
    } else {
        image.clone()
    }
}

fn blur_padding(sigma: f32) -> u32 {
    (sigma * 2.0).ceil().max(0.0) as u32
}

/// Soft luminous copy of a rounded rectangle: the shape is filled with
/// `color`, surrounded by transparent padding, and blurred. The padding is
/// pre-tinted with the same color so only the alpha fades.
pub fn glow(width: u32, height: u32, radius: u32, color: Rgba<u8>, sigma: f32) -> Layer {
    let pad = blur_padding(sigma);
    let [r, g, b, a] = color.0;
    let mut image = RgbaImage::from_pixel(width + pad * 2, height + pad * 2, Rgba([r, g, b, 0]));
    let mask = rounded_mask(width, height, radius);
    for (x, y, coverage) in mask.enumerate_pixels() {
        if coverage[0] > 0 {
            image.put_pixel(x + pad, y + pad, Rgba([r, g, b, mul_alpha(a, coverage[0])]));
        }
    }
    Layer {
        image: blur(&image, sigma),
        offset: (-(pad as i64), -(pad as i64)),
    }
}

/// Frosted-glass fill: translucent white, blurred, with a faint white
/// overlay on top.
pub fn glass_panel(
    width: u32,
    height: u32,
    transparency: u8,
    sigma: f32,
    border_alpha: u8,
) -> RgbaImage {
    let glass = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, transparency]));
    let mut glass = blur(&glass, sigma);
    let border = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, border_alpha]));
    imageops::overlay(&mut glass, &border, 0, 0);
    glass
}

/// Solid `rgb` layer shaped by the alpha channel of `source`.
pub fn silhouette(source: &RgbaImage, rgb: [u8; 3]) -> RgbaImage {
    let mut layer = RgbaImage::new(source.width(), source.height());
    for (dst, src) in layer.pixels_mut().zip(source.pixels()) {
        *dst = Rgba([rgb[0], rgb[1], rgb[2], src[3]]);
    }
    layer
}

/// Blurred silhouette, padded by the blur extent on every side.
pub fn blurred_silhouette(source: &RgbaImage, rgb: [u8; 3], sigma: f32) -> Layer {
    let pad = blur_padding(sigma);
    let mut padded = RgbaImage::from_pixel(
        source.width() + pad * 2,
        source.height() + pad * 2,
        Rgba([rgb[0], rgb[1], rgb[2], 0]),
    );
    imageops::replace(&mut padded, &silhouette(source, rgb), pad as i64, pad as i64);
    Layer {
        image: blur(&padded, sigma),
        offset: (-(pad as i64), -(pad as i64)),
    }
}

pub fn scale_alpha(image: &mut RgbaImage, ratio: f32) {
    for pixel in image.pixels_mut() {
        pixel[3] = (pixel[3] as f32 * ratio).clamp(0.0, 255.0) as u8;
    }
}

pub fn blurred(image: &RgbaImage, sigma: f32) -> RgbaImage {
    blur(image, sigma)
}

/// Scales color channels towards black by `factor`.
pub fn adjust_brightness(image: &mut RgbaImage, factor: f32) {
    for pixel in image.pixels_mut() {
        for channel in 0..3 {
            pixel[channel] = clamp_channel(pixel[channel] as f32 * factor);
        }
    }
}

/// Pushes color channels away from the image's mean luminance by `factor`.
pub fn adjust_contrast(image: &mut RgbaImage, factor: f32) {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return;
    }
    let luminance_sum: u64 = image
        .pixels()
        .map(|p| (p[0] as u64 * 299 + p[1] as u64 * 587 + p[2] as u64 * 114) / 1000)
        .sum();
    let mean = (luminance_sum as f64 / count as f64 + 0.5).floor() as f32;
    for pixel in image.pixels_mut() {
        for channel in 0..3 {
            pixel[channel] = clamp_channel(mean + (pixel[channel] as f32 - mean) * factor);
        }
    }
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Black overlay whose alpha grows linearly from 0 on the first row to just
/// under `max_alpha` on the last.
pub fn vignette(width: u32, height: u32, max_alpha: u8) -> RgbaImage {
    let mut overlay = RgbaImage::new(width, height);
    for (_, y, pixel) in overlay.enumerate_pixels_mut() {
        let alpha = (max_alpha as u64 * y as u64 / height as u64) as u8;
        *pixel = Rgba([0, 0, 0, alpha]);
    }
    overlay
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounded_mask_clears_corners_only() {
        let mask = rounded_mask(100, 60, 20);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(99, 59)[0], 0);
        assert_eq!(mask.get_pixel(99, 0)[0], 0);
        assert_eq!(mask.get_pixel(50, 30)[0], 255);
        assert_eq!(mask.get_pixel(50, 0)[0], 255);
        assert_eq!(mask.get_pixel(0, 30)[0], 255);
        assert_eq!(mask.get_pixel(99, 30)[0], 255);
    }

    #[test]
    fn zero_radius_mask_is_solid() {
        let mask = rounded_mask(4, 3, 0);
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn glow_keeps_color_and_fades_alpha() {
        let layer = glow(40, 20, 5, Rgba([10, 200, 30, 120]), 4.0);
        assert_eq!(layer.offset, (-8, -8));
        assert_eq!(layer.image.dimensions(), (56, 36));
        let center = layer.image.get_pixel(28, 18);
        for (channel, expected) in [10u8, 200, 30].into_iter().enumerate() {
            assert!(center[channel].abs_diff(expected) <= 1);
        }
        assert!(center[3] > 100);
        assert!(layer.image.get_pixel(0, 0)[3] < center[3]);
    }

    #[test]
    fn vignette_ramps_from_transparent() {
        let overlay = vignette(8, 720, 30);
        assert_eq!(overlay.get_pixel(3, 0)[3], 0);
        assert_eq!(overlay.get_pixel(3, 360)[3], 15);
        assert_eq!(overlay.get_pixel(3, 719)[3], 29);
    }

    #[test]
    fn brightness_halves_channels() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 51, 255]));
        adjust_brightness(&mut image, 0.5);
        assert_eq!(image.get_pixel(1, 1).0, [100, 50, 26, 255]);
    }

    #[test]
    fn contrast_pivots_on_mean_luminance() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([100, 100, 100, 255]));
        image.put_pixel(1, 0, Rgba([200, 200, 200, 255]));
        adjust_contrast(&mut image, 1.3);
        assert_eq!(image.get_pixel(0, 0).0, [85, 85, 85, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [215, 215, 215, 255]);
    }

    #[test]
    fn silhouette_copies_alpha() {
        let mut icon = RgbaImage::new(2, 1);
        icon.put_pixel(0, 0, Rgba([1, 2, 3, 40]));
        icon.put_pixel(1, 0, Rgba([4, 5, 6, 0]));
        let white = silhouette(&icon, [255, 255, 255]);
        assert_eq!(white.get_pixel(0, 0).0, [255, 255, 255, 40]);
        assert_eq!(white.get_pixel(1, 0).0, [255, 255, 255, 0]);
    }

    #[test]
    fn scale_alpha_truncates() {
        let mut image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        scale_alpha(&mut image, 0.9);
        assert_eq!(image.get_pixel(0, 0)[3], 229);
    }

    #[test]
    fn apply_mask_multiplies_alpha() {
        let mut layer = RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 200]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(0, 0, Luma([255]));
        apply_mask(&mut layer, &mask);
        assert_eq!(layer.get_pixel(0, 0)[3], 200);
        assert_eq!(layer.get_pixel(1, 0)[3], 0);
    }
}

//! Mutable raster that a single render builds up layer by layer.
use image::{GrayImage, Rgba, RgbaImage};

use crate::effects::{apply_mask, rounded_mask, Layer};
use crate::layout::{Point, Rect};
use crate::text::Face;

#[derive(Debug)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, base: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, base),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.image.width() && y < self.image.height()).then(|| *self.image.get_pixel(x, y))
    }

    /// Alpha-composites `layer` with its top-left corner at `(x, y)`.
    /// Out-of-bounds parts are clipped.
    pub fn composite(&mut self, layer: &RgbaImage, x: i64, y: i64) {
        let (width, height) = (self.image.width() as i64, self.image.height() as i64);
        let left = x.max(0);
        let top = y.max(0);
        let right = (x + layer.width() as i64).min(width);
        let bottom = (y + layer.height() as i64).min(height);
        for cy in top..bottom {
            for cx in left..right {
                let source = *layer.get_pixel((cx - x) as u32, (cy - y) as u32);
                blend_over(self.image.get_pixel_mut(cx as u32, cy as u32), source);
            }
        }
    }

    /// Composites a padded layer built around a shape whose top-left corner
    /// is `anchor`.
    pub fn composite_layer(&mut self, layer: &Layer, anchor: Point) {
        self.composite(
            &layer.image,
            anchor.x as i64 + layer.offset.0,
            anchor.y as i64 + layer.offset.1,
        );
    }

    /// Composites `layer` after multiplying its alpha by `mask`.
    pub fn composite_masked(&mut self, layer: &RgbaImage, mask: &GrayImage, x: i64, y: i64) {
        let mut clipped = layer.clone();
        apply_mask(&mut clipped, mask);
        self.composite(&clipped, x, y);
    }

    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: u32, color: Rgba<u8>) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        let fill = RgbaImage::from_pixel(rect.width, rect.height, color);
        let mask = rounded_mask(rect.width, rect.height, radius);
        self.composite_masked(&fill, &mask, rect.x as i64, rect.y as i64);
    }

    pub fn draw_text(&mut self, face: &Face, text: &str, origin: Point, color: Rgba<u8>) {
        face.draw(&mut self.image, text, origin, color);
    }

    pub fn finish(self) -> RgbaImage {
        self.image
    }
}

/// Porter-Duff "over" in integer arithmetic. An opaque destination stays
/// exactly opaque.
pub(crate) fn blend_over(destination: &mut Rgba<u8>, source: Rgba<u8>) {
    let source_alpha = source[3] as u32;
    if source_alpha == 0 {
        return;
    }
    if source_alpha == 255 {
        *destination = source;
        return;
    }
    let kept = (destination[3] as u32 * (255 - source_alpha) + 127) / 255;
    let alpha = source_alpha + kept;
    for channel in 0..3 {
        let mixed = source[channel] as u32 * source_alpha + destination[channel] as u32 * kept;
        destination[channel] = ((mixed + alpha / 2) / alpha) as u8;
    }
    destination[3] = alpha as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_over_keeps_opaque_destination_opaque() {
        for source_alpha in [1u8, 64, 128, 200, 254] {
            let mut destination = Rgba([10, 20, 30, 255]);
            blend_over(&mut destination, Rgba([250, 200, 100, source_alpha]));
            assert_eq!(destination[3], 255, "source alpha {source_alpha}");
        }

        let mut half = Rgba([0, 0, 0, 255]);
        blend_over(&mut half, Rgba([255, 255, 255, 128]));
        assert_eq!(half, Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn blend_over_onto_transparent_takes_source() {
        let mut destination = Rgba([0, 0, 0, 0]);
        blend_over(&mut destination, Rgba([90, 180, 40, 100]));
        assert_eq!(destination, Rgba([90, 180, 40, 100]));

        let mut untouched = Rgba([5, 6, 7, 255]);
        blend_over(&mut untouched, Rgba([255, 255, 255, 0]));
        assert_eq!(untouched, Rgba([5, 6, 7, 255]));
    }

    #[test]
    fn composite_clips_negative_offsets() {
        let mut canvas = Canvas::new(4, 4, Rgba([0, 0, 0, 255]));
        let layer = RgbaImage::from_pixel(3, 3, Rgba([0, 255, 0, 255]));
        canvas.composite(&layer, -2, -2);
        assert_eq!(canvas.pixel(0, 0), Some(Rgba([0, 255, 0, 255])));
        assert_eq!(canvas.pixel(1, 0), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn new_canvas_is_filled_with_base() {
        let canvas = Canvas::new(8, 4, Rgba([20, 20, 30, 255]));
        assert_eq!(canvas.dimensions(), (8, 4));
        assert_eq!(canvas.pixel(7, 3), Some(Rgba([20, 20, 30, 255])));
        assert_eq!(canvas.pixel(8, 0), None);
    }

    #[test]
    fn composite_blends_and_clips() {
        let mut canvas = Canvas::new(4, 4, Rgba([0, 0, 0, 255]));
        let layer = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        canvas.composite(&layer, 2, 2);
        assert_eq!(canvas.pixel(3, 3), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(canvas.pixel(1, 1), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn composite_layer_applies_offset() {
        let mut canvas = Canvas::new(10, 10, Rgba([0, 0, 0, 255]));
        let layer = Layer {
            image: RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])),
            offset: (-2, -2),
        };
        canvas.composite_layer(&layer, Point::new(5, 5));
        assert_eq!(canvas.pixel(3, 3), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(canvas.pixel(5, 5), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn rounded_fill_leaves_corners_untouched() {
        let mut canvas = Canvas::new(60, 60, Rgba([0, 0, 0, 255]));
        canvas.fill_rounded_rect(Rect::new(10, 10, 40, 40), 10, Rgba([255, 105, 180, 255]));
        assert_eq!(canvas.pixel(10, 10), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(canvas.pixel(30, 30), Some(Rgba([255, 105, 180, 255])));
        assert_eq!(canvas.pixel(5, 30), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn translucent_fill_keeps_canvas_opaque() {
        let mut canvas = Canvas::new(4, 4, Rgba([0, 0, 0, 255]));
        canvas.fill_rounded_rect(Rect::new(0, 0, 4, 4), 0, Rgba([255, 255, 255, 128]));
        let pixel = canvas.pixel(1, 1).unwrap();
        assert_eq!(pixel[3], 255);
        assert!(pixel[0] > 100 && pixel[0] < 160);
    }
}

//! Accent color extraction. The cover is shrunk to a small grid, the most
//! frequent colors are collected, and the most saturated of the top few wins.
use std::collections::HashMap;

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbImage};

pub const FALLBACK_ACCENT: ColorRgb = ColorRgb::new(80, 120, 200);

const SAMPLE_SIZE: u32 = 50;
const MAX_PALETTE: usize = 2500;
const CANDIDATES: usize = 5;
const ENHANCE_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorRgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorRgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sum of pairwise channel distances; zero for any gray.
    pub fn vibrancy(self) -> u32 {
        let (r, g, b) = (self.r as i32, self.g as i32, self.b as i32);
        ((r - g).abs() + (g - b).abs() + (b - r).abs()) as u32
    }

    pub fn enhance(self) -> Self {
        let boost = |channel: u8| (channel as f64 * ENHANCE_FACTOR).floor().min(255.0) as u8;
        Self::new(boost(self.r), boost(self.g), boost(self.b))
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

pub fn extract_accent(image: &DynamicImage) -> ColorRgb {
    let sample = image
        .resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::CatmullRom)
        .to_rgb8();
    let histogram = color_histogram(&sample, MAX_PALETTE);
    match pick_vibrant(&histogram) {
        Some(color) => color.enhance(),
        None => FALLBACK_ACCENT,
    }
}

/// Counts distinct colors, most frequent first; equal counts keep the order in
/// which the colors were first seen. Returns an empty list when the image
/// holds more than `max_colors` distinct colors.
pub fn color_histogram(image: &RgbImage, max_colors: usize) -> Vec<(u32, ColorRgb)> {
    let mut slots: HashMap<ColorRgb, usize> = HashMap::new();
    let mut entries: Vec<(u32, ColorRgb)> = Vec::new();
    for pixel in image.pixels() {
        let color = ColorRgb::new(pixel[0], pixel[1], pixel[2]);
        match slots.get(&color) {
            Some(&slot) => entries[slot].0 += 1,
            None => {
                if entries.len() == max_colors {
                    return Vec::new();
                }
                slots.insert(color, entries.len());
                entries.push((1, color));
            }
        }
    }
    entries.sort_by(|a, b| b.0.cmp(&a.0));
    entries
}

/// Picks the most vibrant of the most frequent colors. Ties go to the more
/// frequent entry.
pub fn pick_vibrant(histogram: &[(u32, ColorRgb)]) -> Option<ColorRgb> {
    let mut best: Option<ColorRgb> = None;
    for &(_, color) in histogram.iter().take(CANDIDATES) {
        match best {
            Some(current) if color.vibrancy() <= current.vibrancy() => {}
            _ => best = Some(color),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    #[test]
    fn saturated_cover_is_enhanced() {
        assert_eq!(extract_accent(&solid(64, 64, [200, 0, 0])), ColorRgb::new(220, 0, 0));
        assert_eq!(
            extract_accent(&solid(120, 90, [250, 10, 10])),
            ColorRgb::new(255, 11, 11)
        );
    }

    #[test]
    fn gray_cover_still_yields_a_color() {
        assert_eq!(
            extract_accent(&solid(50, 50, [128, 128, 128])),
            ColorRgb::new(140, 140, 140)
        );
    }

    #[test]
    fn empty_histogram_falls_back() {
        let mut image = RgbImage::new(4, 1);
        for (x, pixel) in image.pixels_mut().enumerate() {
            *pixel = Rgb([x as u8, 0, 0]);
        }
        assert!(color_histogram(&image, 3).is_empty());
        assert_eq!(pick_vibrant(&[]), None);
    }

    #[test]
    fn histogram_orders_by_count_then_first_seen() {
        let mut image = RgbImage::from_pixel(3, 2, Rgb([1, 1, 1]));
        image.put_pixel(0, 0, Rgb([9, 9, 9]));
        image.put_pixel(1, 0, Rgb([5, 5, 5]));
        image.put_pixel(2, 1, Rgb([5, 5, 5]));
        image.put_pixel(2, 0, Rgb([9, 9, 9]));
        let histogram = color_histogram(&image, 10);
        assert_eq!(
            histogram,
            vec![
                (2, ColorRgb::new(9, 9, 9)),
                (2, ColorRgb::new(5, 5, 5)),
                (2, ColorRgb::new(1, 1, 1)),
            ]
        );
    }

    #[test]
    fn vibrant_pick_is_limited_to_top_five() {
        let histogram = vec![
            (50, ColorRgb::new(100, 100, 100)),
            (40, ColorRgb::new(120, 80, 80)),
            (30, ColorRgb::new(10, 10, 10)),
            (20, ColorRgb::new(200, 200, 200)),
            (10, ColorRgb::new(90, 90, 110)),
            (5, ColorRgb::new(255, 0, 0)),
        ];
        assert_eq!(pick_vibrant(&histogram), Some(ColorRgb::new(120, 80, 80)));
    }

    #[test]
    fn vibrancy_ties_favor_the_more_frequent_color() {
        let histogram = vec![
            (9, ColorRgb::new(0, 0, 0)),
            (8, ColorRgb::new(100, 0, 0)),
            (7, ColorRgb::new(0, 100, 0)),
        ];
        assert_eq!(pick_vibrant(&histogram), Some(ColorRgb::new(100, 0, 0)));
    }

    #[test]
    fn vibrancy_of_grays_is_zero() {
        assert_eq!(ColorRgb::new(77, 77, 77).vibrancy(), 0);
        assert_eq!(ColorRgb::new(255, 0, 0).vibrancy(), 510);
    }
}

//! Font loading, glyph drawing, and width-aware truncation.
//!
//! - `TextMeasure` abstracts "how wide is this string" so truncation can be
//!   exercised without a real font.
//! - `Face` pairs a loaded font with a pixel size and draws text with the top
//!   of the ascender at the requested point.
//! - `FontSet` holds one face per text role; `FontSet::discover` tries the
//!   configured files first and then well-known system fonts.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::canvas::blend_over;
use crate::layout::Point;

pub const ELLIPSIS: char = '…';

const TITLE_SIZE: f32 = 52.0;
const ARTIST_SIZE: f32 = 32.0;
const DURATION_SIZE: f32 = 26.0;
const SMALL_SIZE: f32 = 22.0;

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/gnu-free/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub trait TextMeasure {
    /// Advance width of `text` in pixels.
    fn text_width(&self, text: &str) -> f32;
}

/// Returns `text` unchanged when it fits in `max_width`; otherwise the
/// longest character prefix that still fits once an ellipsis is appended,
/// or a lone ellipsis when nothing does.
pub fn trim_to_width<M: TextMeasure + ?Sized>(
    text: &str,
    measure: &M,
    max_width: f32,
) -> String {
    if measure.text_width(text) <= max_width {
        return text.to_string();
    }
    let boundaries: Vec<usize> = text.char_indices().map(|(index, _)| index).collect();
    for length in (1..boundaries.len()).rev() {
        let prefix = &text[..boundaries[length]];
        let mut candidate = String::with_capacity(prefix.len() + ELLIPSIS.len_utf8());
        candidate.push_str(prefix);
        candidate.push(ELLIPSIS);
        if measure.text_width(&candidate) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("font assets are not configured")]
    NotConfigured,
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a usable font file")]
    Invalid(PathBuf),
    #[error("no system font found among {0} candidates")]
    NoSystemFont(usize),
}

#[derive(Clone)]
pub struct Face {
    font: Arc<FontVec>,
    scale: PxScale,
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("font", &"FontVec")
            .field("scale", &self.scale.y)
            .finish()
    }
}

impl Face {
    /// `size` is the em size in pixels, as a point size is in most
    /// text engines. ab_glyph scales by ascent-to-descent height instead.
    pub fn new(font: Arc<FontVec>, size: f32) -> Self {
        let scale = match font.units_per_em() {
            Some(em) if em > 0.0 => PxScale::from(size * font.height_unscaled() / em),
            _ => PxScale::from(size),
        };
        Self { font, scale }
    }

    fn layout(&self, text: &str, origin: Point) -> Vec<Glyph> {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = point(origin.x as f32, origin.y as f32 + scaled.ascent());
        let mut previous = None;
        let mut glyphs = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(previous) = previous {
                caret.x += scaled.kern(previous, id);
            }
            glyphs.push(id.with_scale_and_position(self.scale, caret));
            caret.x += scaled.h_advance(id);
            previous = Some(id);
        }
        glyphs
    }

    /// Blends `text` onto `target`, scaling `color`'s alpha by glyph coverage.
    pub fn draw(&self, target: &mut RgbaImage, text: &str, origin: Point, color: Rgba<u8>) {
        let (width, height) = (target.width() as i32, target.height() as i32);
        for glyph in self.layout(text, origin) {
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }
                let alpha = (color[3] as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
                if alpha == 0 {
                    return;
                }
                let source = Rgba([color[0], color[1], color[2], alpha]);
                blend_over(target.get_pixel_mut(x as u32, y as u32), source);
            });
        }
    }
}

impl TextMeasure for Face {
    fn text_width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0;
        let mut previous = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(previous) = previous {
                width += scaled.kern(previous, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }
}

#[derive(Debug, Clone)]
pub struct FontSet {
    pub title: Face,
    pub artist: Face,
    pub duration: Face,
    pub small: Face,
}

impl FontSet {
    pub fn from_fonts(title_font: Arc<FontVec>, body_font: Arc<FontVec>) -> Self {
        Self {
            title: Face::new(title_font, TITLE_SIZE),
            artist: Face::new(body_font.clone(), ARTIST_SIZE),
            duration: Face::new(body_font.clone(), DURATION_SIZE),
            small: Face::new(body_font, SMALL_SIZE),
        }
    }

    pub fn load(title_path: &Path, body_path: &Path) -> Result<Self, FontError> {
        let title = read_font(title_path)?;
        let body = if body_path == title_path {
            title.clone()
        } else {
            read_font(body_path)?
        };
        Ok(Self::from_fonts(title, body))
    }

    /// Uses the first readable system font for every role.
    pub fn system() -> Result<Self, FontError> {
        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            match read_font(path) {
                Ok(font) => {
                    debug!(path = %path.display(), "using system font");
                    return Ok(Self::from_fonts(font.clone(), font));
                }
                Err(err) => debug!(path = %path.display(), error = %err, "skipping system font"),
            }
        }
        Err(FontError::NoSystemFont(SYSTEM_FONT_CANDIDATES.len()))
    }

    /// Loads the configured fonts, falling back to a system font for all
    /// roles. A single configured font serves both roles. `None` means no
    /// usable font exists and text should be skipped.
    pub fn discover(title_path: Option<&Path>, body_path: Option<&Path>) -> Option<Self> {
        let configured = match (title_path, body_path) {
            (Some(title), Some(body)) => Self::load(title, body),
            (Some(only), None) | (None, Some(only)) => Self::load(only, only),
            (None, None) => Err(FontError::NotConfigured),
        };
        match configured {
            Ok(fonts) => return Some(fonts),
            Err(FontError::NotConfigured) => debug!("no font assets configured"),
            Err(err) => {
                warn!(error = %err, "failed to load configured fonts; trying system fonts")
            }
        }
        match Self::system() {
            Ok(fonts) => Some(fonts),
            Err(err) => {
                warn!(error = %err, "no usable font found; text will not be drawn");
                None
            }
        }
    }
}

fn read_font(path: &Path) -> Result<Arc<FontVec>, FontError> {
    let data = fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let font = FontVec::try_from_vec(data).map_err(|_| FontError::Invalid(path.to_path_buf()))?;
    Ok(Arc::new(font))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is ten pixels wide, the ellipsis included.
    struct Monospace;

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str) -> f32 {
            text.chars().count() as f32 * 10.0
        }
    }

    #[test]
    fn fitting_text_is_unchanged() {
        assert_eq!(trim_to_width("Hello", &Monospace, 50.0), "Hello");
        let once = trim_to_width("Hello World", &Monospace, 200.0);
        assert_eq!(trim_to_width(&once, &Monospace, 200.0), once);
    }

    #[test]
    fn keeps_the_longest_fitting_prefix() {
        assert_eq!(trim_to_width("Hello World", &Monospace, 85.0), "Hello W…");
        assert_eq!(trim_to_width("Hello World", &Monospace, 80.0), "Hello W…");
        assert_eq!(trim_to_width("Hello World", &Monospace, 79.0), "Hello …");
    }

    #[test]
    fn falls_back_to_bare_ellipsis() {
        assert_eq!(trim_to_width("Hello", &Monospace, 15.0), "…");
        assert_eq!(trim_to_width("Hello", &Monospace, 0.0), "…");
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(trim_to_width("ÄÖÜßéè", &Monospace, 40.0), "ÄÖÜ…");
    }

    #[test]
    fn trimmed_output_is_stable() {
        let once = trim_to_width("A fairly long track title", &Monospace, 120.0);
        assert_eq!(once, "A fairly lo…");
        assert_eq!(trim_to_width(&once, &Monospace, 120.0), once);
    }

    #[test]
    fn face_size_is_an_em_size() {
        let Ok(fonts) = FontSet::system() else {
            return;
        };
        let font = &fonts.title.font;
        let Some(em) = font.units_per_em() else {
            return;
        };
        let expected = font.h_advance_unscaled(font.glyph_id('H')) * TITLE_SIZE / em;
        let measured = fonts.title.text_width("H");
        assert!(
            (measured - expected).abs() < 0.01,
            "measured {measured}, expected {expected}"
        );
    }

    #[test]
    fn drawn_text_marks_target_and_keeps_it_opaque() {
        let Ok(fonts) = FontSet::system() else {
            return;
        };
        let base = Rgba([20, 20, 30, 255]);
        let mut target = RgbaImage::from_pixel(200, 60, base);
        fonts
            .small
            .draw(&mut target, "Hello", Point::new(4, 4), Rgba([255, 255, 255, 230]));
        assert!(target.pixels().any(|pixel| *pixel != base));
        assert!(target.pixels().all(|pixel| pixel[3] == 255));
        assert!(fonts.small.text_width("Hello") > 0.0);
    }

    #[test]
    fn missing_font_file_is_a_read_error() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("absent.ttf");
        assert!(matches!(
            FontSet::load(&missing, &missing),
            Err(FontError::Read { .. })
        ));
    }

    #[test]
    fn garbage_font_file_is_invalid() {
        let temp = tempfile::tempdir().unwrap();
        let bogus = temp.path().join("bogus.ttf");
        fs::write(&bogus, b"definitely not a font").unwrap();
        assert!(matches!(
            FontSet::load(&bogus, &bogus),
            Err(FontError::Invalid(_))
        ));
    }
}

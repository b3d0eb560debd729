//! Raster compositor for "now playing" cards.
//!
//! A card is built in fixed passes over one exclusive `Canvas`:
//!
//! ```text
//!   cover ──▶ CardRenderer::accent ──▶ ColorRgb
//!     │                                   │
//!     ▼                                   ▼
//!   CardRenderer::render
//!     background ─▶ glass panel ─▶ corner glow ─▶ thumbnail ─▶ text
//!     ─▶ progress bar ─▶ icons ─▶ signature ─▶ vignette
//!     │
//!     ▼
//!   encode_png (RGB, best compression, adaptive filtering)
//! ```
//!
//! Geometry lives in `LayoutGeometry` and is validated once when the renderer
//! is constructed. Everything here is synchronous and CPU bound; callers on an
//! async runtime should move `render` onto a blocking thread.

mod canvas;
mod card;
mod color;
mod effects;
mod layout;
mod style;
mod text;

use std::io::Write;
use std::path::Path;

use image::buffer::ConvertBuffer;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageReader, RgbImage, RgbaImage,
};

pub use canvas::Canvas;
pub use card::{load_icon, CardContent, CardRenderer, IconError};
pub use color::{color_histogram, extract_accent, pick_vibrant, ColorRgb, FALLBACK_ACCENT};
pub use effects::Layer;
pub use layout::{LayoutError, LayoutGeometry, Point, Rect};
pub use style::{CardStyle, Palette};
pub use text::{trim_to_width, Face, FontError, FontSet, TextMeasure, ELLIPSIS};

/// Decodes a cover image, sniffing the format from its contents since
/// downloads are stored without an extension.
pub fn load_cover(path: &Path) -> Result<DynamicImage, ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

/// Flattens `image` to RGB and writes it as PNG.
pub fn encode_png<W: Write>(image: &RgbaImage, writer: W) -> Result<(), ImageError> {
    let rgb: RgbImage = image.convert();
    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Best, FilterType::Adaptive);
    encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
}

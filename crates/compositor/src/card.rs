use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageError, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::color::{extract_accent, ColorRgb};
use crate::effects;
use crate::layout::{LayoutError, Point, Rect};
use crate::style::CardStyle;
use crate::text::{trim_to_width, FontSet};

const BACKGROUND_BLUR: f32 = 30.0;
const BACKGROUND_BRIGHTNESS: f32 = 0.5;
const BACKGROUND_CONTRAST: f32 = 1.3;
const GLASS_BLUR: f32 = 20.0;
const GLASS_BORDER_ALPHA: u8 = 30;
const CORNER_GLOW_SPREAD: u32 = 30;
const CORNER_GLOW_SHIFT: i32 = 5;
const CORNER_GLOW_RADIUS: u32 = 50;
const CORNER_GLOW_ALPHA: u8 = 120;
const CORNER_GLOW_BLUR: f32 = 15.0;
const THUMB_GLOW_SPREAD: u32 = 20;
const THUMB_GLOW_ALPHA: u8 = 100;
const THUMB_GLOW_BLUR: f32 = 20.0;
const TITLE_SHADOW_OFFSET: i32 = 3;
const PROGRESS_GLOW_MARGIN: u32 = 10;
const PROGRESS_GLOW_ALPHA: u8 = 80;
const PROGRESS_GLOW_BLUR: f32 = 10.0;
const PROGRESS_START_LABEL: &str = "0:00";
const ICON_GLOW_BLUR: f32 = 10.0;
const ICON_GLOW_OFFSET: i32 = -8;
const ICON_TOP_ALPHA: f32 = 0.9;
const PLAY_BUTTON_WIDTH: u32 = 200;
const PLAY_BUTTON_HEIGHT: u32 = 50;
const PLAY_BUTTON_RADIUS: u32 = 10;
const PLAY_LABEL: &str = "▶ PLAY";
const PLAY_LABEL_OFFSET: (i32, i32) = (70, 10);
const SIGNATURE_ALPHA: u8 = 120;
const SIGNATURE_BLUR: f32 = 5.0;
const VIGNETTE_MAX_ALPHA: u8 = 30;

/// Text drawn onto a card. Strings are used as given apart from width trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardContent<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub duration: &'a str,
}

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("no icon asset configured")]
    NotConfigured,
    #[error("icon asset {0} does not exist")]
    Missing(PathBuf),
    #[error("failed to decode icon {path}: {source}")]
    Decode { path: PathBuf, source: ImageError },
}

pub fn load_icon(path: &Path, width: u32, height: u32) -> Result<RgbaImage, IconError> {
    if !path.is_file() {
        return Err(IconError::Missing(path.to_path_buf()));
    }
    let icon = image::open(path).map_err(|source| IconError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(icon.resize_exact(width, height, FilterType::Lanczos3).to_rgba8())
}

/// Composites cards from a fixed style. Fonts and the icon are optional; a
/// missing font skips text and a missing icon draws a play button instead.
#[derive(Debug, Clone)]
pub struct CardRenderer {
    style: CardStyle,
    fonts: Option<FontSet>,
    icon: Option<PathBuf>,
}

impl CardRenderer {
    pub fn new(
        style: CardStyle,
        fonts: Option<FontSet>,
        icon: Option<PathBuf>,
    ) -> Result<Self, LayoutError> {
        style.layout.validate()?;
        Ok(Self { style, fonts, icon })
    }

    /// Accent color of `cover` as it appears stretched over the canvas.
    pub fn accent(&self, cover: &DynamicImage) -> ColorRgb {
        let (width, height) = self.style.layout.size();
        extract_accent(&self.fill_canvas(cover, width, height))
    }

    pub fn render(
        &self,
        content: &CardContent<'_>,
        cover: &DynamicImage,
        accent: ColorRgb,
    ) -> RgbaImage {
        let (width, height) = self.style.layout.size();
        let mut canvas = Canvas::new(width, height, self.style.palette.base);

        self.draw_background(&mut canvas, cover);
        self.draw_glass_panel(&mut canvas);
        self.draw_corner_glow(&mut canvas, accent);
        self.draw_thumbnail(&mut canvas, cover, accent);
        self.draw_text(&mut canvas, content);
        self.draw_progress_bar(&mut canvas, content, accent);
        self.draw_icons(&mut canvas);
        self.draw_signature(&mut canvas);
        canvas.composite(&effects::vignette(width, height, VIGNETTE_MAX_ALPHA), 0, 0);

        canvas.finish()
    }

    fn fill_canvas(&self, cover: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        cover.resize_exact(width, height, FilterType::CatmullRom)
    }

    fn draw_background(&self, canvas: &mut Canvas, cover: &DynamicImage) {
        let (width, height) = canvas.dimensions();
        let scaled = self.fill_canvas(cover, width, height).to_rgba8();
        let mut background = effects::blurred(&scaled, BACKGROUND_BLUR);
        effects::adjust_brightness(&mut background, BACKGROUND_BRIGHTNESS);
        effects::adjust_contrast(&mut background, BACKGROUND_CONTRAST);
        canvas.composite(&background, 0, 0);
    }

    fn draw_glass_panel(&self, canvas: &mut Canvas) {
        let panel = self.style.layout.panel;
        let glass = effects::glass_panel(
            panel.width,
            panel.height,
            self.style.glass_alpha,
            GLASS_BLUR,
            GLASS_BORDER_ALPHA,
        );
        let mask = effects::rounded_mask(panel.width, panel.height, self.style.layout.panel_radius);
        canvas.composite_masked(&glass, &mask, panel.x as i64, panel.y as i64);
    }

    fn draw_corner_glow(&self, canvas: &mut Canvas, accent: ColorRgb) {
        let area = self.style.layout.panel.expand(CORNER_GLOW_SPREAD);
        let layer = effects::glow(
            area.width,
            area.height,
            CORNER_GLOW_RADIUS,
            accent.with_alpha(CORNER_GLOW_ALPHA),
            CORNER_GLOW_BLUR,
        );
        let anchor = Point::new(area.x, area.y).offset(CORNER_GLOW_SHIFT, CORNER_GLOW_SHIFT);
        canvas.composite_layer(&layer, anchor);
    }

    fn draw_thumbnail(&self, canvas: &mut Canvas, cover: &DynamicImage, accent: ColorRgb) {
        let layout = &self.style.layout;
        let thumb = layout.thumb;
        let shadow = thumb.expand(THUMB_GLOW_SPREAD);
        let layer = effects::glow(
            shadow.width,
            shadow.height,
            0,
            accent.with_alpha(THUMB_GLOW_ALPHA),
            THUMB_GLOW_BLUR,
        );
        canvas.composite_layer(&layer, Point::new(shadow.x, shadow.y));

        let resized = cover
            .resize_exact(thumb.width, thumb.height, FilterType::Lanczos3)
            .to_rgba8();
        let mask = effects::rounded_mask(thumb.width, thumb.height, layout.thumb_radius);
        canvas.composite_masked(&resized, &mask, thumb.x as i64, thumb.y as i64);
    }

    fn draw_text(&self, canvas: &mut Canvas, content: &CardContent<'_>) {
        let Some(fonts) = &self.fonts else {
            return;
        };
        let layout = &self.style.layout;
        let palette = &self.style.palette;

        let title = trim_to_width(content.title, &fonts.title, layout.max_title_width as f32);
        let artist = trim_to_width(content.artist, &fonts.artist, layout.max_artist_width as f32);
        canvas.draw_text(
            &fonts.title,
            &title,
            layout.title.offset(TITLE_SHADOW_OFFSET, TITLE_SHADOW_OFFSET),
            palette.title_shadow,
        );
        canvas.draw_text(&fonts.title, &title, layout.title, palette.text_primary);
        canvas.draw_text(&fonts.artist, &artist, layout.artist, palette.text_secondary);
        canvas.draw_text(
            &fonts.duration,
            &format!("Duration: {}", content.duration),
            layout.duration,
            palette.text_tertiary,
        );
    }

    fn draw_progress_bar(
        &self,
        canvas: &mut Canvas,
        content: &CardContent<'_>,
        accent: ColorRgb,
    ) {
        let layout = &self.style.layout;
        canvas.fill_rounded_rect(layout.bar, layout.bar_radius, self.style.palette.bar_track);

        let progress = layout.progress();
        let halo = progress.expand(PROGRESS_GLOW_MARGIN);
        let layer = effects::glow(
            halo.width,
            halo.height,
            0,
            accent.with_alpha(PROGRESS_GLOW_ALPHA),
            PROGRESS_GLOW_BLUR,
        );
        canvas.composite_layer(&layer, Point::new(halo.x, halo.y));
        canvas.fill_rounded_rect(progress, layout.bar_radius, accent.with_alpha(255));

        if let Some(fonts) = &self.fonts {
            let color = self.style.palette.text_tertiary;
            canvas.draw_text(&fonts.small, PROGRESS_START_LABEL, layout.bar_start_label, color);
            canvas.draw_text(&fonts.small, content.duration, layout.bar_end_label, color);
        }
    }

    fn draw_icons(&self, canvas: &mut Canvas) {
        let area = self.style.layout.icons;
        let loaded = match &self.icon {
            Some(path) => load_icon(path, area.width, area.height),
            None => Err(IconError::NotConfigured),
        };
        match loaded {
            Ok(icon) => self.draw_icon_overlay(canvas, &icon, area),
            Err(IconError::NotConfigured) => {
                debug!("no icon configured; drawing play button");
                self.draw_play_button(canvas, area);
            }
            Err(err @ (IconError::Missing(_) | IconError::Decode { .. })) => {
                warn!(error = %err, "icon unavailable; drawing play button");
                self.draw_play_button(canvas, area);
            }
        }
    }

    fn draw_icon_overlay(&self, canvas: &mut Canvas, icon: &RgbaImage, area: Rect) {
        let [r, g, b, _] = self.style.palette.accent_glow.0;
        let glow = effects::blurred_silhouette(icon, [r, g, b], ICON_GLOW_BLUR);
        let glow_anchor = Point::new(area.x, area.y).offset(ICON_GLOW_OFFSET, ICON_GLOW_OFFSET);
        canvas.composite_layer(&glow, glow_anchor);

        let white = effects::silhouette(icon, [255, 255, 255]);
        canvas.composite(&white, area.x as i64, area.y as i64);

        let mut top = icon.clone();
        effects::scale_alpha(&mut top, ICON_TOP_ALPHA);
        canvas.composite(&top, area.x as i64, area.y as i64);
    }

    fn draw_play_button(&self, canvas: &mut Canvas, area: Rect) {
        let button = Rect::new(area.x, area.y, PLAY_BUTTON_WIDTH, PLAY_BUTTON_HEIGHT);
        canvas.fill_rounded_rect(button, PLAY_BUTTON_RADIUS, self.style.palette.play_button);
        if let Some(fonts) = &self.fonts {
            let (dx, dy) = PLAY_LABEL_OFFSET;
            let origin = Point::new(area.x, area.y).offset(dx, dy);
            canvas.draw_text(&fonts.small, PLAY_LABEL, origin, self.style.palette.text_primary);
        }
    }

    fn draw_signature(&self, canvas: &mut Canvas) {
        let layout = &self.style.layout;
        let plate = layout.signature_box;
        let layer = effects::glow(
            plate.width,
            plate.height,
            0,
            Rgba([0, 0, 0, SIGNATURE_ALPHA]),
            SIGNATURE_BLUR,
        );
        canvas.composite_layer(&layer, Point::new(plate.x, plate.y));
        if let Some(fonts) = &self.fonts {
            canvas.draw_text(
                &fonts.small,
                &self.style.signature,
                layout.signature_text,
                self.style.palette.text_primary,
            );
        }
    }
}

use image::Rgba;

use crate::layout::LayoutGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text_primary: Rgba<u8>,
    pub text_secondary: Rgba<u8>,
    pub text_tertiary: Rgba<u8>,
    /// Tint for the icon glow. Only its color channels are used; the glow
    /// takes its alpha from the icon itself.
    pub accent_glow: Rgba<u8>,
    pub base: Rgba<u8>,
    pub bar_track: Rgba<u8>,
    pub title_shadow: Rgba<u8>,
    pub play_button: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            text_primary: Rgba([255, 255, 255, 255]),
            text_secondary: Rgba([200, 200, 200, 255]),
            text_tertiary: Rgba([150, 150, 150, 255]),
            accent_glow: Rgba([255, 105, 180, 180]),
            base: Rgba([20, 20, 30, 255]),
            bar_track: Rgba([60, 60, 70, 255]),
            title_shadow: Rgba([0, 0, 0, 80]),
            play_button: Rgba([255, 105, 180, 200]),
        }
    }
}

/// Everything about a card that does not change between renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStyle {
    pub layout: LayoutGeometry,
    pub palette: Palette,
    pub glass_alpha: u8,
    pub signature: String,
}

impl CardStyle {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            layout: LayoutGeometry::standard(),
            palette: Palette::default(),
            glass_alpha: 90,
            signature: signature.into(),
        }
    }

    pub fn with_accent_glow(mut self, rgba: [u8; 4]) -> Self {
        self.palette.accent_glow = Rgba(rgba);
        self
    }
}

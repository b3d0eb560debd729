//! Fixed card geometry. Every rectangle is derived from a handful of
//! constants once and then only read.

/// Axis-aligned pixel rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Grows the rectangle by `amount` on every side.
    pub fn expand(&self, amount: u32) -> Rect {
        Rect::new(
            self.x - amount as i32,
            self.y - amount as i32,
            self.width + amount * 2,
            self.height + amount * 2,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("panel {0:?} does not fit inside the canvas")]
    PanelOutsideCanvas(Rect),
    #[error("{element} {rect:?} does not fit inside the panel")]
    OutsidePanel { element: &'static str, rect: Rect },
}

const CANVAS_WIDTH: u32 = 1280;
const CANVAS_HEIGHT: u32 = 720;
const PANEL_WIDTH: u32 = 1000;
const PANEL_HEIGHT: u32 = 320;
const PANEL_RADIUS: u32 = 40;
const THUMB_SIZE: u32 = 280;
const THUMB_INSET: i32 = 40;
const THUMB_RADIUS: u32 = 30;
const TEXT_GAP: i32 = 40;
const TITLE_DROP: i32 = 25;
const ARTIST_DROP: i32 = 70;
const DURATION_DROP: i32 = 45;
const BAR_DROP: i32 = 40;
const BAR_LENGTH: u32 = 500;
const BAR_HEIGHT: u32 = 6;
const BAR_RADIUS: u32 = 3;
const PROGRESS_WIDTH: u32 = 200;
const BAR_LABEL_DROP: i32 = 12;
const BAR_END_LABEL_INSET: i32 = 60;
const ICONS_DROP: i32 = 35;
const ICONS_WIDTH: u32 = 280;
const ICONS_HEIGHT: u32 = 60;
const MAX_TEXT_WIDTH: u32 = 580;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutGeometry {
    pub canvas: Rect,
    pub panel: Rect,
    pub panel_radius: u32,
    pub thumb: Rect,
    pub thumb_radius: u32,
    pub title: Point,
    pub artist: Point,
    pub duration: Point,
    pub max_title_width: u32,
    pub max_artist_width: u32,
    pub bar: Rect,
    pub bar_radius: u32,
    pub progress_width: u32,
    pub bar_start_label: Point,
    pub bar_end_label: Point,
    pub icons: Rect,
    pub signature_box: Rect,
    pub signature_text: Point,
}

impl LayoutGeometry {
    pub fn standard() -> Self {
        let canvas = Rect::new(0, 0, CANVAS_WIDTH, CANVAS_HEIGHT);
        let panel = Rect::new(
            ((CANVAS_WIDTH - PANEL_WIDTH) / 2) as i32,
            ((CANVAS_HEIGHT - PANEL_HEIGHT) / 2) as i32,
            PANEL_WIDTH,
            PANEL_HEIGHT,
        );
        let thumb = Rect::new(
            panel.x + THUMB_INSET,
            panel.y + ((PANEL_HEIGHT - THUMB_SIZE) / 2) as i32,
            THUMB_SIZE,
            THUMB_SIZE,
        );
        let text_x = thumb.x + THUMB_SIZE as i32 + TEXT_GAP;
        let title = Point::new(text_x, thumb.y + TITLE_DROP);
        let artist = title.offset(0, ARTIST_DROP);
        let duration = artist.offset(0, DURATION_DROP);
        let bar = Rect::new(text_x, duration.y + BAR_DROP, BAR_LENGTH, BAR_HEIGHT);
        let bar_start_label = Point::new(bar.x, bar.y + BAR_LABEL_DROP);
        let bar_end_label = Point::new(
            bar.x + BAR_LENGTH as i32 - BAR_END_LABEL_INSET,
            bar.y + BAR_LABEL_DROP,
        );
        let icons = Rect::new(text_x, bar.y + ICONS_DROP, ICONS_WIDTH, ICONS_HEIGHT);
        let signature_box = Rect::new(35, CANVAS_HEIGHT as i32 - 50, 220, 35);
        let signature_text = Point::new(50, CANVAS_HEIGHT as i32 - 45);

        Self {
            canvas,
            panel,
            panel_radius: PANEL_RADIUS,
            thumb,
            thumb_radius: THUMB_RADIUS,
            title,
            artist,
            duration,
            max_title_width: MAX_TEXT_WIDTH,
            max_artist_width: MAX_TEXT_WIDTH,
            bar,
            bar_radius: BAR_RADIUS,
            progress_width: PROGRESS_WIDTH,
            bar_start_label,
            bar_end_label,
            icons,
            signature_box,
            signature_text,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.canvas.width, self.canvas.height)
    }

    pub fn progress(&self) -> Rect {
        Rect::new(self.bar.x, self.bar.y, self.progress_width, self.bar.height)
    }

    /// Checks that the panel sits inside the canvas and that every
    /// foreground element, text at its maximum width included, sits inside
    /// the panel.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !self.canvas.contains(&self.panel) {
            return Err(LayoutError::PanelOutsideCanvas(self.panel));
        }

        let text_line = |anchor: Point, width: u32| Rect::new(anchor.x, anchor.y, width, 1);
        let elements = [
            ("thumbnail", self.thumb),
            ("title", text_line(self.title, self.max_title_width)),
            ("artist", text_line(self.artist, self.max_artist_width)),
            ("duration", text_line(self.duration, 1)),
            ("progress bar", self.bar),
            ("progress", self.progress()),
            ("icons", self.icons),
        ];
        for (element, rect) in elements {
            if !self.panel.contains(&rect) {
                return Err(LayoutError::OutsidePanel { element, rect });
            }
        }
        if !self.canvas.contains(&self.signature_box) {
            return Err(LayoutError::OutsidePanel {
                element: "signature",
                rect: self.signature_box,
            });
        }
        Ok(())
    }
}

impl Default for LayoutGeometry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_matches_reference_positions() {
        let layout = LayoutGeometry::standard();
        assert_eq!(layout.size(), (1280, 720));
        assert_eq!(layout.panel, Rect::new(140, 200, 1000, 320));
        assert_eq!(layout.thumb, Rect::new(180, 220, 280, 280));
        assert_eq!(layout.title, Point::new(500, 245));
        assert_eq!(layout.artist, Point::new(500, 315));
        assert_eq!(layout.duration, Point::new(500, 360));
        assert_eq!(layout.bar, Rect::new(500, 400, 500, 6));
        assert_eq!(layout.bar_end_label, Point::new(940, 412));
        assert_eq!(layout.icons, Rect::new(500, 435, 280, 60));
    }

    #[test]
    fn standard_layout_is_valid() {
        assert_eq!(LayoutGeometry::standard().validate(), Ok(()));
    }

    #[test]
    fn rejects_text_overflowing_panel() {
        let mut layout = LayoutGeometry::standard();
        layout.max_title_width = 700;
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::OutsidePanel { element: "title", .. })
        ));
    }

    #[test]
    fn rejects_panel_outside_canvas() {
        let mut layout = LayoutGeometry::standard();
        layout.panel.x = 400;
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::PanelOutsideCanvas(_))
        ));
    }

    #[test]
    fn rect_expand_and_contains() {
        let rect = Rect::new(10, 10, 20, 20);
        let grown = rect.expand(5);
        assert_eq!(grown, Rect::new(5, 5, 30, 30));
        assert!(grown.contains(&rect));
        assert!(!rect.contains(&grown));
    }
}

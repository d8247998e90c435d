//! Canvas ↔ screen coordinate mapping.
//!
//! `screen = canvas * zoom + (x, y)`; the inverse is
//! `canvas = (screen - (x, y)) / zoom`. Screen space is the canvas viewport;
//! client (page) space additionally includes the sidebar to its left, so
//! client coordinates are shifted by the sidebar width first.

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;

/// Zoom + pan of the canvas viewport. Also the persisted "view settings".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Uniform zoom factor (`scale` in the settings record).
    #[serde(rename = "scale")]
    pub zoom: f64,
    /// Translation, applied after scaling.
    pub x: f64,
    pub y: f64,
}

pub type ViewSettings = ViewTransform;

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        zoom: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(zoom: f64, x: f64, y: f64) -> Self {
        Self { zoom, x, y }
    }

    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// The transform as a kurbo affine (scale, then translate).
    pub fn as_affine(&self) -> Affine {
        Affine::translate(self.translation()) * Affine::scale(self.zoom)
    }

    pub fn canvas_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.x, p.y * self.zoom + self.y)
    }

    pub fn screen_to_canvas(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.zoom, (p.y - self.y) / self.zoom)
    }

    /// Convert a page/client pointer position to canvas space. The canvas
    /// viewport starts `sidebar_width` pixels from the page origin.
    pub fn client_to_canvas(&self, p: Point, sidebar_width: f64) -> Point {
        self.screen_to_canvas(Point::new(p.x - sidebar_width, p.y))
    }

    pub fn canvas_to_client(&self, p: Point, sidebar_width: f64) -> Point {
        let s = self.canvas_to_screen(p);
        Point::new(s.x + sidebar_width, s.y)
    }

    pub fn rect_to_screen(&self, r: Rect) -> Rect {
        let p0 = self.canvas_to_screen(r.origin());
        Rect::new(
            p0.x,
            p0.y,
            p0.x + r.width() * self.zoom,
            p0.y + r.height() * self.zoom,
        )
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Multiply the zoom by `factor`, keeping `anchor` (screen space) fixed.
    /// The result is clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn zoom_about(&mut self, anchor: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let before = self.screen_to_canvas(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.x = anchor.x - before.x * self.zoom;
        self.y = anchor.y - before.y * self.zoom;
    }
}

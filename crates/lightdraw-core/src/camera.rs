//! Viewport module for pan/zoom transforms.
//!
//! The viewport is the camera over the world: `(x, y)` is the world-space
//! point shown at the top-left pixel of the canvas and `zoom` is the number
//! of screen pixels per world unit.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom level that corresponds to "100%" in the UI.
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Allowed zoom range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl ZoomLimits {
    /// Narrow range used by the toolbar zoom controls.
    pub const STANDARD: Self = Self { min: 0.5, max: 2.0 };
    /// Wide range for large boards.
    pub const WIDE: Self = Self { min: 0.1, max: 5.0 };

    /// Clamp a zoom value into the range. NaN collapses to `min`.
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.max(self.min).min(self.max)
    }

    pub fn contains(&self, zoom: f64) -> bool {
        zoom >= self.min && zoom <= self.max
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Pan offset plus zoom factor, mapping world space to screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// World-space x of the visible area's top-left corner.
    pub x: f64,
    /// World-space y of the visible area's top-left corner.
    pub y: f64,
    /// Screen pixels per world unit.
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl Viewport {
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom }
    }

    /// World-space origin (top-left of the visible area).
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Affine transform from world to screen coordinates, for renderers.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(-self.origin().to_vec2())
    }

    /// Affine transform from screen to world coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(self.origin().to_vec2()) * Affine::scale(1.0 / self.zoom)
    }

    /// `world = origin + screen / zoom`
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(self.x + screen.x / self.zoom, self.y + screen.y / self.zoom)
    }

    /// `screen = (world - origin) * zoom`
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new((world.x - self.x) * self.zoom, (world.y - self.y) * self.zoom)
    }

    /// Convert a screen-space movement into a world-space movement.
    pub fn screen_delta_to_world(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }

    /// World-space rectangle currently visible in a canvas of `size` pixels.
    pub fn visible_world_rect(&self, size: Size) -> Rect {
        Rect::from_origin_size(
            self.origin(),
            Size::new(size.width / self.zoom, size.height / self.zoom),
        )
    }

    /// Set the zoom while keeping the world point under `screen_point` fixed.
    ///
    /// Returns false when the clamped zoom equals the current zoom.
    pub fn zoom_at(&mut self, screen_point: Point, zoom: f64, limits: ZoomLimits) -> bool {
        let new_zoom = limits.clamp(zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return false;
        }

        let anchor = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        self.x = anchor.x - screen_point.x / new_zoom;
        self.y = anchor.y - screen_point.y / new_zoom;
        true
    }

    /// Ctrl+wheel zoom: `zoom - delta_y / divisor`, anchored on the cursor.
    pub fn wheel_zoom(
        &mut self,
        screen_point: Point,
        delta_y: f64,
        divisor: f64,
        limits: ZoomLimits,
    ) -> bool {
        self.zoom_at(screen_point, self.zoom - delta_y / divisor, limits)
    }

    /// Plain wheel pan. Shift turns vertical wheel motion into horizontal pan.
    pub fn wheel_pan(&mut self, delta: Vec2, shift: bool, speed: f64) {
        let scaled = self.screen_delta_to_world(delta * speed);
        if shift {
            self.x += scaled.y;
        } else {
            self.x += scaled.x;
            self.y += scaled.y;
        }
    }

    /// Drag pan: move the origin against the pointer, relative to the origin
    /// captured when the drag started.
    pub fn drag_pan(&mut self, start_origin: Point, screen_delta: Vec2) {
        let world = self.screen_delta_to_world(screen_delta);
        self.x = start_origin.x - world.x;
        self.y = start_origin.y - world.y;
    }

    /// Clamp the zoom into `limits`, e.g. after loading a persisted viewport.
    pub fn clamp_zoom(&mut self, limits: ZoomLimits) {
        self.zoom = limits.clamp(self.zoom);
    }

    /// Reset to the default position and zoom.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

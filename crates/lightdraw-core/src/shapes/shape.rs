//! Rectangles, circles and text boxes.

use super::{Color, Entity, EntityId};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest width or height a shape can be resized to, in world units.
pub const MIN_SHAPE_SIZE: f64 = 10.0;

pub(crate) const DEFAULT_FILL: Color = Color::rgb(0x3b, 0x82, 0xf6);
pub(crate) const DEFAULT_STROKE: Color = Color::rgb(0x1e, 0x40, 0xaf);
pub(crate) const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub(crate) const DEFAULT_FONT_SIZE: f64 = 16.0;
pub(crate) const DEFAULT_FONT_FAMILY: &str = "Inter, sans-serif";

fn default_fill() -> Color {
    DEFAULT_FILL
}

fn default_stroke() -> Color {
    DEFAULT_STROKE
}

fn default_stroke_width() -> f64 {
    DEFAULT_STROKE_WIDTH
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

/// The shape-specific part of a [`Shape`], tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default)]
        text: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
        #[serde(default = "default_font_family")]
        font_family: String,
    },
}

impl ShapeKind {
    /// A text kind with the default font.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }

    /// Name used in the persisted `"type"` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Text { .. } => "text",
        }
    }
}

/// A box-like entity positioned by its top-left corner.
///
/// `rotation` is in degrees, clockwise, around the center of the box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: EntityId,
    #[serde(flatten)]
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_fill")]
    pub fill: Color,
    #[serde(default = "default_stroke")]
    pub stroke: Color,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
}

impl Shape {
    /// Create a shape with a fresh id and default style.
    pub fn new(kind: ShapeKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: EntityId::generate("shape"),
            kind,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            fill: DEFAULT_FILL,
            stroke: DEFAULT_STROKE,
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }

    pub fn with_style(mut self, fill: Color, stroke: Color, stroke_width: f64) -> Self {
        self.fill = fill;
        self.stroke = stroke;
        self.stroke_width = stroke_width;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Unrotated box.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Transform from the shape's unrotated frame to world space.
    pub fn rotation_transform(&self) -> Affine {
        Affine::rotate_about(self.rotation.to_radians(), self.center())
    }

    /// Map a world point into the shape's unrotated frame.
    pub fn to_local(&self, point: Point) -> Point {
        if self.rotation == 0.0 {
            return point;
        }
        self.rotation_transform().inverse() * point
    }

    /// Map a world-space delta into the shape's unrotated frame.
    pub fn delta_to_local(&self, delta: Vec2) -> Vec2 {
        if self.rotation == 0.0 {
            return delta;
        }
        Affine::rotate(-self.rotation.to_radians()) * delta.to_point() - Point::ZERO
    }

    /// Set position and size, clamping the size to [`MIN_SHAPE_SIZE`].
    pub fn set_frame(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.x = x;
        self.y = y;
        self.width = clamp_size(width);
        self.height = clamp_size(height);
    }

    /// Apply a patch; fields left as `None` are unchanged.
    pub fn apply(&mut self, patch: &ShapePatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = clamp_size(width);
        }
        if let Some(height) = patch.height {
            self.height = clamp_size(height);
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(fill) = patch.fill {
            self.fill = fill;
        }
        if let Some(stroke) = patch.stroke {
            self.stroke = stroke;
        }
        if let Some(stroke_width) = patch.stroke_width {
            self.stroke_width = stroke_width;
        }
        if let ShapeKind::Text {
            text,
            font_size,
            font_family,
        } = &mut self.kind
        {
            if let Some(value) = &patch.text {
                text.clone_from(value);
            }
            if let Some(value) = patch.font_size {
                *font_size = value;
            }
            if let Some(value) = &patch.font_family {
                font_family.clone_from(value);
            }
        }
    }
}

/// NaN and anything below the minimum collapse to the minimum.
fn clamp_size(value: f64) -> f64 {
    value.max(MIN_SHAPE_SIZE)
}

impl Entity for Shape {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        let rect = self.rect();
        if self.rotation == 0.0 {
            return rect;
        }
        let xf = self.rotation_transform();
        let corners = [
            xf * Point::new(rect.x0, rect.y0),
            xf * Point::new(rect.x1, rect.y0),
            xf * Point::new(rect.x1, rect.y1),
            xf * Point::new(rect.x0, rect.y1),
        ];
        corners[1..]
            .iter()
            .fold(Rect::from_points(corners[0], corners[0]), |acc, p| {
                acc.union_pt(*p)
            })
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = self.to_local(point);
        match self.kind {
            ShapeKind::Circle => {
                let radius = self.width.min(self.height) / 2.0;
                (local - self.center()).hypot() <= radius + tolerance
            }
            ShapeKind::Rectangle | ShapeKind::Text { .. } => {
                self.rect().inflate(tolerance, tolerance).contains(local)
            }
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Partial update for a [`Shape`]. Text fields only apply to text shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub text: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
}

impl ShapePatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation: Some(degrees),
            ..Self::default()
        }
    }
}

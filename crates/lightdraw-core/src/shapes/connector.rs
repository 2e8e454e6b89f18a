//! Straight connectors between two world points.

use super::{Color, Entity, EntityId, point_to_segment_dist};
use kurbo::{Line, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_CONNECTOR_STROKE: Color = Color::rgb(0x37, 0x41, 0x51);
pub(crate) const DEFAULT_CONNECTOR_WIDTH: f64 = 2.0;

/// Dash pattern used by dotted connectors when none is stored.
pub const DEFAULT_DASH: &str = "5,5";

fn default_stroke() -> Color {
    DEFAULT_CONNECTOR_STROKE
}

fn default_stroke_width() -> f64 {
    DEFAULT_CONNECTOR_WIDTH
}

/// Visual variant of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorKind {
    Arrow,
    Line,
    DoubleArrow,
    Dotted,
}

impl ConnectorKind {
    pub const ALL: [Self; 4] = [Self::Arrow, Self::Line, Self::DoubleArrow, Self::Dotted];

    /// Arrowhead at the target end.
    pub fn has_end_head(&self) -> bool {
        matches!(self, Self::Arrow | Self::DoubleArrow)
    }

    /// Arrowhead at the source end.
    pub fn has_start_head(&self) -> bool {
        matches!(self, Self::DoubleArrow)
    }

    /// Dash pattern a new connector of this kind starts with.
    pub fn default_dash(&self) -> Option<&'static str> {
        match self {
            Self::Dotted => Some(DEFAULT_DASH),
            Self::Arrow | Self::Line | Self::DoubleArrow => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Arrow => "arrow",
            Self::Line => "line",
            Self::DoubleArrow => "double-arrow",
            Self::Dotted => "dotted",
        }
    }
}

/// A segment from `(x, y)` to `(target_x, target_y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: ConnectorKind,
    pub x: f64,
    pub y: f64,
    pub target_x: f64,
    pub target_y: f64,
    #[serde(default = "default_stroke")]
    pub stroke: Color,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
}

impl Connector {
    pub fn new(kind: ConnectorKind, start: Point, end: Point) -> Self {
        Self {
            id: EntityId::generate("connector"),
            kind,
            x: start.x,
            y: start.y,
            target_x: end.x,
            target_y: end.y,
            stroke: DEFAULT_CONNECTOR_STROKE,
            stroke_width: DEFAULT_CONNECTOR_WIDTH,
            dash_array: kind.default_dash().map(str::to_string),
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn end(&self) -> Point {
        Point::new(self.target_x, self.target_y)
    }

    pub fn line(&self) -> Line {
        Line::new(self.start(), self.end())
    }

    /// Dash pattern to draw with. Dotted connectors fall back to [`DEFAULT_DASH`].
    pub fn effective_dash(&self) -> Option<&str> {
        self.dash_array
            .as_deref()
            .or_else(|| self.kind.default_dash())
    }

    pub fn apply(&mut self, patch: &ConnectorPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(target_x) = patch.target_x {
            self.target_x = target_x;
        }
        if let Some(target_y) = patch.target_y {
            self.target_y = target_y;
        }
        if let Some(stroke) = patch.stroke {
            self.stroke = stroke;
        }
        if let Some(stroke_width) = patch.stroke_width {
            self.stroke_width = stroke_width;
        }
        if let Some(dash) = &patch.dash_array {
            self.dash_array = dash.clone();
        }
    }
}

impl Entity for Connector {
    fn id(&self) -> &EntityId {
        &self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start(), self.end())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start(), self.end())
            <= tolerance + self.stroke_width / 2.0
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
        self.target_x += delta.x;
        self.target_y += delta.y;
    }
}

/// Partial update for a [`Connector`].
///
/// `dash_array: Some(None)` removes a stored dash pattern.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorPatch {
    pub kind: Option<ConnectorKind>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub target_x: Option<f64>,
    pub target_y: Option<f64>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub dash_array: Option<Option<String>>,
}

impl ConnectorPatch {
    pub fn endpoints(start: Point, end: Point) -> Self {
        Self {
            x: Some(start.x),
            y: Some(start.y),
            target_x: Some(end.x),
            target_y: Some(end.y),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_gets_default_dash() {
        let c = Connector::new(ConnectorKind::Dotted, Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(c.dash_array.as_deref(), Some("5,5"));
        let a = Connector::new(ConnectorKind::Arrow, Point::ZERO, Point::new(10.0, 0.0));
        assert!(a.dash_array.is_none());
        assert!(a.effective_dash().is_none());
    }

    #[test]
    fn test_bounds_from_endpoints() {
        let c = Connector::new(ConnectorKind::Line, Point::new(50.0, 10.0), Point::new(0.0, 40.0));
        assert_eq!(c.bounds(), Rect::new(0.0, 10.0, 50.0, 40.0));
    }

    #[test]
    fn test_hit_test_near_segment() {
        let c = Connector::new(ConnectorKind::Arrow, Point::ZERO, Point::new(100.0, 0.0));
        assert!(c.hit_test(Point::new(50.0, 4.0), 4.0));
        assert!(!c.hit_test(Point::new(50.0, 10.0), 4.0));
    }

    #[test]
    fn test_serde_uses_type_tag() {
        let json = r#"{"id":"c1","type":"double-arrow","x":0,"y":0,"targetX":100,"targetY":0}"#;
        let c: Connector = serde_json::from_str(json).unwrap();
        assert_eq!(c.kind, ConnectorKind::DoubleArrow);
        assert!(c.kind.has_start_head() && c.kind.has_end_head());
        assert_eq!(c.stroke, DEFAULT_CONNECTOR_STROKE);

        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["type"], "double-arrow");
        assert_eq!(value["targetX"], 100.0);
        assert!(value.get("dashArray").is_none());
    }

    #[test]
    fn test_translate_moves_both_ends() {
        let mut c = Connector::new(ConnectorKind::Line, Point::ZERO, Point::new(10.0, 10.0));
        c.translate(Vec2::new(5.0, -5.0));
        assert_eq!(c.start(), Point::new(5.0, -5.0));
        assert_eq!(c.end(), Point::new(15.0, 5.0));
    }
}

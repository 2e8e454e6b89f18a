//! Tool modes and the entities they place.

use crate::shapes::{Color, Connector, ConnectorKind, Shape, ShapeKind};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text a new text shape starts with.
pub const DEFAULT_TEXT: &str = "Hello World";

/// The armed creation tool. `None` means clicks select and drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolMode {
    #[default]
    None,
    Rectangle,
    Circle,
    Text,
    Arrow,
    Line,
    DoubleArrow,
    Dotted,
}

impl ToolMode {
    pub const ALL: [Self; 8] = [
        Self::None,
        Self::Rectangle,
        Self::Circle,
        Self::Text,
        Self::Arrow,
        Self::Line,
        Self::DoubleArrow,
        Self::Dotted,
    ];

    /// Tools that place a shape with one click.
    pub fn is_shape_tool(&self) -> bool {
        matches!(self, Self::Rectangle | Self::Circle | Self::Text)
    }

    /// Tools that place a connector with two clicks.
    pub fn is_connector_tool(&self) -> bool {
        self.connector_kind().is_some()
    }

    pub fn connector_kind(&self) -> Option<ConnectorKind> {
        match self {
            Self::Arrow => Some(ConnectorKind::Arrow),
            Self::Line => Some(ConnectorKind::Line),
            Self::DoubleArrow => Some(ConnectorKind::DoubleArrow),
            Self::Dotted => Some(ConnectorKind::Dotted),
            Self::None | Self::Rectangle | Self::Circle | Self::Text => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Text => "text",
            Self::Arrow => "arrow",
            Self::Line => "line",
            Self::DoubleArrow => "double-arrow",
            Self::Dotted => "dotted",
        }
    }

    /// Build the shape this tool places, centered on `center` (world space).
    /// Returns `None` for tools that do not place shapes.
    pub fn place_shape(&self, center: Point) -> Option<Shape> {
        let (kind, width, height, fill, stroke, stroke_width) = match self {
            Self::Rectangle => (
                ShapeKind::Rectangle,
                120.0,
                80.0,
                Color::rgb(0x3b, 0x82, 0xf6),
                Color::rgb(0x1e, 0x40, 0xaf),
                2.0,
            ),
            Self::Circle => (
                ShapeKind::Circle,
                100.0,
                100.0,
                Color::rgb(0x10, 0xb9, 0x81),
                Color::rgb(0x05, 0x96, 0x69),
                2.0,
            ),
            Self::Text => (
                ShapeKind::text(DEFAULT_TEXT),
                150.0,
                40.0,
                Color::rgb(0x37, 0x41, 0x51),
                Color::rgb(0x6b, 0x72, 0x80),
                1.0,
            ),
            _ => return None,
        };
        let shape = Shape::new(kind, center.x - width / 2.0, center.y - height / 2.0, width, height)
            .with_style(fill, stroke, stroke_width);
        Some(shape)
    }

    /// Build the connector this tool places between two world points.
    pub fn place_connector(&self, start: Point, end: Point) -> Option<Connector> {
        self.connector_kind()
            .map(|kind| Connector::new(kind, start, end))
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for tool names that are not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool mode: {0:?}")]
pub struct UnknownToolMode(pub String);

impl FromStr for ToolMode {
    type Err = UnknownToolMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| UnknownToolMode(s.to_string()))
    }
}

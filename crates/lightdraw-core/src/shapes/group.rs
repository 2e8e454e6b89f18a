//! Groups of shapes and connectors that move as one unit.

use super::{Color, EntityId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Space between the members' union box and the group box, in world units.
pub const GROUP_PADDING: f64 = 10.0;

pub(crate) const DEFAULT_GROUP_STROKE: Color = Color::rgb(0x63, 0x66, 0xf1);
pub(crate) const DEFAULT_GROUP_OPACITY: f64 = 0.1;

fn default_stroke() -> Color {
    DEFAULT_GROUP_STROKE
}

fn default_fill() -> Color {
    Color::transparent()
}

fn default_opacity() -> f64 {
    DEFAULT_GROUP_OPACITY
}

/// A flat group: members are shapes or connectors, never other groups.
///
/// The box is derived from the members and is refreshed whenever a member
/// moves or is resized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub entity_ids: Vec<EntityId>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_stroke")]
    pub stroke: Color,
    #[serde(default = "default_fill")]
    pub fill: Color,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Group {
    /// Create a group around members whose union box is `members_bounds`.
    pub fn new(entity_ids: Vec<EntityId>, name: Option<String>, members_bounds: Rect) -> Self {
        let mut group = Self {
            id: EntityId::generate("group"),
            name,
            entity_ids,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            stroke: DEFAULT_GROUP_STROKE,
            fill: Color::transparent(),
            opacity: DEFAULT_GROUP_OPACITY,
        };
        group.fit(members_bounds);
        group
    }

    /// Padded group box.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Resize the box to surround `members_bounds` plus [`GROUP_PADDING`].
    pub fn fit(&mut self, members_bounds: Rect) {
        let padded = members_bounds.inflate(GROUP_PADDING, GROUP_PADDING);
        self.x = padded.x0;
        self.y = padded.y0;
        self.width = padded.width();
        self.height = padded.height();
    }

    pub fn contains_member(&self, id: &EntityId) -> bool {
        self.entity_ids.contains(id)
    }

    /// Drop a member id. Returns true if it was present.
    pub fn remove_member(&mut self, id: &EntityId) -> bool {
        let before = self.entity_ids.len();
        self.entity_ids.retain(|member| member != id);
        self.entity_ids.len() != before
    }

    /// A group needs at least two members to exist.
    pub fn is_viable(&self) -> bool {
        self.entity_ids.len() >= 2
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.rect().contains(point)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

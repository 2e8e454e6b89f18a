//! Entity definitions for the canvas: shapes, connectors and groups.

mod color;
mod connector;
mod group;
mod shape;

pub use color::{Color, ParseColorError};
pub use connector::{Connector, ConnectorKind, ConnectorPatch, DEFAULT_DASH};
pub use group::{GROUP_PADDING, Group};
pub use shape::{MIN_SHAPE_SIZE, Shape, ShapeKind, ShapePatch};

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Unique identifier for shapes, connectors and groups.
///
/// Ids are unique across the union of all entity kinds. Generated ids look
/// like `shape-1718000000000-3f9a1c2b7`: a kind prefix, a millisecond
/// timestamp and a random suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a fresh id with the given kind prefix.
    pub fn generate(prefix: &str) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}-{}", prefix, epoch_millis(), &random[..9]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which collection an entity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Shape,
    Connector,
    Group,
}

/// Common behavior of everything placed on the canvas.
pub trait Entity {
    /// Get the unique identifier.
    fn id(&self) -> &EntityId;

    /// Axis-aligned bounding box in world coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a world point hits this entity.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Move by a world-space delta.
    fn translate(&mut self, delta: Vec2);
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Union of a set of rectangles, or `None` when empty.
pub fn union_bounds(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

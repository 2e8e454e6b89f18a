//! Selection set and manipulation handles.

use crate::document::CanvasDocument;
use crate::shapes::{EntityId, MIN_SHAPE_SIZE, Shape};
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Distance from the top edge to the rotation handle (in world units).
pub const ROTATE_HANDLE_OFFSET: f64 = 16.0;

/// Ordered set of selected entity ids. No id appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: Vec<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    /// The selected id when exactly one entity is selected.
    pub fn single(&self) -> Option<&EntityId> {
        match self.ids.as_slice() {
            [id] => Some(id),
            _ => None,
        }
    }

    /// Replace the selection with one id.
    pub fn select(&mut self, id: EntityId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Replace the selection with `ids`, dropping duplicates.
    pub fn select_many(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        self.ids.clear();
        for id in ids {
            self.add(id);
        }
    }

    pub fn add(&mut self, id: EntityId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: &EntityId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| selected != id);
        self.ids.len() != before
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: EntityId) {
        if !self.remove(&id) {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer exist in `document`.
    pub fn retain_existing(&mut self, document: &CanvasDocument) {
        self.ids.retain(|id| document.contains(id));
    }

    /// Selected ids that are shapes or connectors.
    pub fn groupable_ids(&self, document: &CanvasDocument) -> Vec<EntityId> {
        self.ids
            .iter()
            .filter(|id| !document.is_group(id))
            .cloned()
            .collect()
    }

    /// Selected ids that are groups.
    pub fn group_ids(&self, document: &CanvasDocument) -> Vec<EntityId> {
        self.ids
            .iter()
            .filter(|id| document.is_group(id))
            .cloned()
            .collect()
    }

    /// At least two non-group entities are selected.
    pub fn can_group(&self, document: &CanvasDocument) -> bool {
        self.groupable_ids(document).len() >= 2
    }

    /// At least one group is selected.
    pub fn can_ungroup(&self, document: &CanvasDocument) -> bool {
        self.ids.iter().any(|id| document.is_group(id))
    }
}

/// One of the eight resize handles, named by compass direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    Nw,
    N,
    Ne,
    W,
    E,
    Sw,
    S,
    Se,
}

impl ResizeHandle {
    pub const ALL: [Self; 8] = [
        Self::Nw,
        Self::N,
        Self::Ne,
        Self::W,
        Self::E,
        Self::Sw,
        Self::S,
        Self::Se,
    ];

    pub fn moves_left(&self) -> bool {
        matches!(self, Self::Nw | Self::W | Self::Sw)
    }

    pub fn moves_right(&self) -> bool {
        matches!(self, Self::Ne | Self::E | Self::Se)
    }

    pub fn moves_top(&self) -> bool {
        matches!(self, Self::Nw | Self::N | Self::Ne)
    }

    pub fn moves_bottom(&self) -> bool {
        matches!(self, Self::Sw | Self::S | Self::Se)
    }

    /// Position in the shape's unrotated frame, as fractions of width/height.
    fn anchor(&self) -> (f64, f64) {
        let fx = if self.moves_left() {
            0.0
        } else if self.moves_right() {
            1.0
        } else {
            0.5
        };
        let fy = if self.moves_top() {
            0.0
        } else if self.moves_bottom() {
            1.0
        } else {
            0.5
        };
        (fx, fy)
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Resize(ResizeHandle),
    Rotate,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Resize and rotate handles of a shape, rotated with it.
pub fn handles_for(shape: &Shape) -> Vec<Handle> {
    let rect = shape.rect();
    let xf = shape.rotation_transform();
    let mut handles: Vec<Handle> = ResizeHandle::ALL
        .iter()
        .map(|handle| {
            let (fx, fy) = handle.anchor();
            let local = Point::new(rect.x0 + rect.width() * fx, rect.y0 + rect.height() * fy);
            Handle::new(xf * local, HandleKind::Resize(*handle))
        })
        .collect();
    let rotate = Point::new(rect.center().x, rect.y0 - ROTATE_HANDLE_OFFSET);
    handles.push(Handle::new(xf * rotate, HandleKind::Rotate));
    handles
}

/// Find which handle (if any) is hit at the given point.
/// The rotate handle wins over resize handles it overlaps.
pub fn hit_test_handles(shape: &Shape, point: Point, tolerance: f64) -> Option<HandleKind> {
    let handles = handles_for(shape);
    handles
        .iter()
        .rev()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// New `(x, y, width, height)` after dragging `handle` of `original` by a
/// world-space delta.
///
/// The delta is rotated into the shape's frame. The edges the handle does
/// not touch stay where they are in world space, also when the size clamps
/// to [`MIN_SHAPE_SIZE`].
pub fn resize_frame(original: &Shape, handle: ResizeHandle, world_delta: Vec2) -> (f64, f64, f64, f64) {
    let d = original.delta_to_local(world_delta);
    let (mut left, mut top) = (0.0, 0.0);
    let (mut right, mut bottom) = (original.width, original.height);

    if handle.moves_left() {
        left += d.x;
    }
    if handle.moves_right() {
        right += d.x;
    }
    if handle.moves_top() {
        top += d.y;
    }
    if handle.moves_bottom() {
        bottom += d.y;
    }

    if (right - left).is_nan() || right - left < MIN_SHAPE_SIZE {
        if handle.moves_left() {
            left = right - MIN_SHAPE_SIZE;
        } else {
            right = left + MIN_SHAPE_SIZE;
        }
    }
    if (bottom - top).is_nan() || bottom - top < MIN_SHAPE_SIZE {
        if handle.moves_top() {
            top = bottom - MIN_SHAPE_SIZE;
        } else {
            bottom = top + MIN_SHAPE_SIZE;
        }
    }

    let width = right - left;
    let height = bottom - top;
    let shift_local = Vec2::new(
        (left + right - original.width) / 2.0,
        (top + bottom - original.height) / 2.0,
    );
    let shift = Affine::rotate(original.rotation.to_radians()) * shift_local.to_point() - Point::ZERO;
    let center = original.center() + shift;
    (center.x - width / 2.0, center.y - height / 2.0, width, height)
}

/// Angle of `pointer` around `center`, in degrees (0 = pointing right,
/// clockwise positive in screen space).
pub fn pointer_angle(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees()
}

//! Canvas document: the shapes, connectors and groups being edited.

use crate::shapes::{
    Connector, ConnectorPatch, Entity, EntityId, EntityKind, Group, Shape, ShapePatch,
    union_bounds,
};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// All entities of one canvas. Vector order is z-order (back to front).
///
/// Ids are unique across shapes, connectors and groups. Groups are kept
/// consistent with their members: a group always has at least two members
/// that exist in the document, and its box surrounds them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasDocument {
    pub shapes: Vec<Shape>,
    pub connectors: Vec<Connector>,
    pub groups: Vec<Group>,
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connectors.is_empty() && self.groups.is_empty()
    }

    /// Total number of entities, groups included.
    pub fn len(&self) -> usize {
        self.shapes.len() + self.connectors.len() + self.groups.len()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.connectors.clear();
        self.groups.clear();
    }

    /// Add a shape on top of everything else.
    pub fn add_shape(&mut self, shape: Shape) -> EntityId {
        let id = shape.id.clone();
        self.shapes.push(shape);
        id
    }

    pub fn add_connector(&mut self, connector: Connector) -> EntityId {
        let id = connector.id.clone();
        self.connectors.push(connector);
        id
    }

    pub fn shape(&self, id: &EntityId) -> Option<&Shape> {
        self.shapes.iter().find(|s| &s.id == id)
    }

    pub fn shape_mut(&mut self, id: &EntityId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| &s.id == id)
    }

    pub fn connector(&self, id: &EntityId) -> Option<&Connector> {
        self.connectors.iter().find(|c| &c.id == id)
    }

    pub fn connector_mut(&mut self, id: &EntityId) -> Option<&mut Connector> {
        self.connectors.iter_mut().find(|c| &c.id == id)
    }

    pub fn group(&self, id: &EntityId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn group_mut(&mut self, id: &EntityId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| &g.id == id)
    }

    /// Which collection holds `id`, if any.
    pub fn kind_of(&self, id: &EntityId) -> Option<EntityKind> {
        if self.shape(id).is_some() {
            Some(EntityKind::Shape)
        } else if self.connector(id).is_some() {
            Some(EntityKind::Connector)
        } else if self.group(id).is_some() {
            Some(EntityKind::Group)
        } else {
            None
        }
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn is_group(&self, id: &EntityId) -> bool {
        self.group(id).is_some()
    }

    /// Every id in the document: shapes, then connectors, then groups.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.shapes
            .iter()
            .map(|s| &s.id)
            .chain(self.connectors.iter().map(|c| &c.id))
            .chain(self.groups.iter().map(|g| &g.id))
    }

    /// The group `id` belongs to, if any.
    pub fn group_of(&self, id: &EntityId) -> Option<&Group> {
        self.groups.iter().find(|g| g.contains_member(id))
    }

    /// World bounds of a shape, connector or group.
    pub fn bounds_of(&self, id: &EntityId) -> Option<Rect> {
        if let Some(shape) = self.shape(id) {
            return Some(shape.bounds());
        }
        if let Some(connector) = self.connector(id) {
            return Some(connector.bounds());
        }
        self.group(id).map(Group::rect)
    }

    /// Union of the bounds of the given shapes and connectors.
    pub fn members_bounds(&self, ids: &[EntityId]) -> Option<Rect> {
        union_bounds(ids.iter().filter_map(|id| {
            self.shape(id)
                .map(Entity::bounds)
                .or_else(|| self.connector(id).map(Entity::bounds))
        }))
    }

    /// Bounding box of every shape and connector.
    pub fn bounds(&self) -> Option<Rect> {
        union_bounds(
            self.shapes
                .iter()
                .map(Entity::bounds)
                .chain(self.connectors.iter().map(Entity::bounds)),
        )
    }

    /// Apply a patch to a shape. Returns false if no such shape exists.
    pub fn update_shape(&mut self, id: &EntityId, patch: &ShapePatch) -> bool {
        let Some(shape) = self.shape_mut(id) else {
            return false;
        };
        shape.apply(patch);
        self.refresh_group_containing(id);
        true
    }

    pub fn update_connector(&mut self, id: &EntityId, patch: &ConnectorPatch) -> bool {
        let Some(connector) = self.connector_mut(id) else {
            return false;
        };
        connector.apply(patch);
        self.refresh_group_containing(id);
        true
    }

    /// Move a shape or connector by a world delta.
    pub fn translate_entity(&mut self, id: &EntityId, delta: Vec2) -> bool {
        let moved = if let Some(shape) = self.shape_mut(id) {
            shape.translate(delta);
            true
        } else if let Some(connector) = self.connector_mut(id) {
            connector.translate(delta);
            true
        } else {
            false
        };
        if moved {
            self.refresh_group_containing(id);
        }
        moved
    }

    /// Set the rotation of a shape, in degrees.
    pub fn rotate_shape(&mut self, id: &EntityId, degrees: f64) -> bool {
        let Some(shape) = self.shape_mut(id) else {
            return false;
        };
        shape.rotation = degrees;
        self.refresh_group_containing(id);
        true
    }

    /// Set a shape's frame. Width and height are clamped to the minimum size.
    pub fn resize_shape(&mut self, id: &EntityId, width: f64, height: f64, x: f64, y: f64) -> bool {
        let Some(shape) = self.shape_mut(id) else {
            return false;
        };
        shape.set_frame(x, y, width, height);
        self.refresh_group_containing(id);
        true
    }

    /// Remove an entity.
    ///
    /// For a shape or connector, the id is also pruned from its group and a
    /// group left with fewer than two members is dissolved. For a group, only
    /// the group record goes; members stay. Returns false if `id` is unknown.
    pub fn delete_entity(&mut self, id: &EntityId) -> bool {
        let before = self.shapes.len() + self.connectors.len();
        self.shapes.retain(|s| &s.id != id);
        self.connectors.retain(|c| &c.id != id);
        if self.shapes.len() + self.connectors.len() != before {
            self.prune_member(id);
            return true;
        }
        self.remove_group(id).is_some()
    }

    /// Group the given shapes and connectors.
    ///
    /// Group ids and unknown ids are filtered out first. Returns `None`
    /// without touching the document if fewer than two members remain. A
    /// member that already belongs to another group is moved to the new one.
    pub fn add_group(&mut self, entity_ids: &[EntityId], name: Option<String>) -> Option<EntityId> {
        let mut members: Vec<EntityId> = Vec::new();
        for id in entity_ids {
            let valid = self.shape(id).is_some() || self.connector(id).is_some();
            if valid && !members.contains(id) {
                members.push(id.clone());
            }
        }
        if members.len() < 2 {
            return None;
        }

        let bounds = self.members_bounds(&members)?;
        for id in &members {
            self.prune_member(id);
        }
        let group = Group::new(members, name, bounds);
        let id = group.id.clone();
        self.groups.push(group);
        Some(id)
    }

    /// Remove a group record, leaving its members in place.
    pub fn remove_group(&mut self, id: &EntityId) -> Option<Group> {
        let index = self.groups.iter().position(|g| &g.id == id)?;
        Some(self.groups.remove(index))
    }

    /// Ids a drag starting on `id` should move: a group's members, or the
    /// entity itself.
    pub fn movable_ids(&self, id: &EntityId) -> Vec<EntityId> {
        match self.group(id) {
            Some(group) => group.entity_ids.clone(),
            None => vec![id.clone()],
        }
    }

    /// Topmost entity under a world point.
    ///
    /// Connectors are tested before shapes, front to back. A hit on a group
    /// member resolves to the group. Failing any hit, a point inside a group
    /// box selects that group.
    pub fn entity_at(&self, point: Point, shape_tolerance: f64, connector_tolerance: f64) -> Option<EntityId> {
        let hit = self
            .connectors
            .iter()
            .rev()
            .find(|c| c.hit_test(point, connector_tolerance))
            .map(|c| &c.id)
            .or_else(|| {
                self.shapes
                    .iter()
                    .rev()
                    .find(|s| s.hit_test(point, shape_tolerance))
                    .map(|s| &s.id)
            });

        match hit {
            Some(id) => Some(
                self.group_of(id)
                    .map(|g| g.id.clone())
                    .unwrap_or_else(|| id.clone()),
            ),
            None => self
                .groups
                .iter()
                .rev()
                .find(|g| g.hit_test(point))
                .map(|g| g.id.clone()),
        }
    }

    fn prune_member(&mut self, id: &EntityId) {
        for group in &mut self.groups {
            group.remove_member(id);
        }
        self.groups.retain(Group::is_viable);
        self.refresh_all_groups();
    }

    fn refresh_group_containing(&mut self, member: &EntityId) {
        let Some(index) = self.groups.iter().position(|g| g.contains_member(member)) else {
            return;
        };
        if let Some(bounds) = self.members_bounds(&self.groups[index].entity_ids) {
            self.groups[index].fit(bounds);
        }
    }

    /// Drop members that no longer exist, dissolve groups that fall below two
    /// members and refit the rest. Used after loading untrusted records.
    pub fn normalize_groups(&mut self) {
        let existing: HashSet<EntityId> = self
            .shapes
            .iter()
            .map(|s| s.id.clone())
            .chain(self.connectors.iter().map(|c| c.id.clone()))
            .collect();
        for group in &mut self.groups {
            let mut seen = HashSet::new();
            group
                .entity_ids
                .retain(|id| existing.contains(id) && seen.insert(id.clone()));
        }
        self.groups.retain(Group::is_viable);
        self.refresh_all_groups();
    }

    fn refresh_all_groups(&mut self) {
        for index in 0..self.groups.len() {
            if let Some(bounds) = self.members_bounds(&self.groups[index].entity_ids) {
                self.groups[index].fit(bounds);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ConnectorKind, GROUP_PADDING, ShapeKind};

    fn rect_at(id: &str, x: f64, y: f64) -> Shape {
        let mut shape = Shape::new(ShapeKind::Rectangle, x, y, 10.0, 10.0);
        shape.id = id.into();
        shape
    }

    fn two_shape_doc() -> CanvasDocument {
        let mut doc = CanvasDocument::new();
        doc.add_shape(rect_at("a", 0.0, 0.0));
        doc.add_shape(rect_at("b", 100.0, 100.0));
        doc
    }

    #[test]
    fn test_group_bounding_box() {
        let mut doc = two_shape_doc();
        let id = doc.add_group(&["a".into(), "b".into()], None).unwrap();
        let group = doc.group(&id).unwrap();
        assert!((group.x - -10.0).abs() < f64::EPSILON);
        assert!((group.y - -10.0).abs() < f64::EPSILON);
        assert!((group.width - 130.0).abs() < f64::EPSILON);
        assert!((group.height - 130.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_group_filters_invalid_members() {
        let mut doc = two_shape_doc();
        let group_id = doc.add_group(&["a".into(), "b".into()], Some("pair".into())).unwrap();
        assert!(doc.add_group(&["a".into(), group_id.clone()], None).is_none());
        assert!(doc.add_group(&["a".into(), "missing".into()], None).is_none());
        assert!(doc.add_group(&["a".into(), "a".into()], None).is_none());
        assert_eq!(doc.groups.len(), 1);
        assert_eq!(doc.group(&group_id).unwrap().name.as_deref(), Some("pair"));
    }

    #[test]
    fn test_delete_member_dissolves_small_group() {
        let mut doc = two_shape_doc();
        doc.add_group(&["a".into(), "b".into()], None).unwrap();
        assert!(doc.delete_entity(&"a".into()));
        assert!(doc.groups.is_empty());
        assert_eq!(doc.shapes.len(), 1);
    }

    #[test]
    fn test_delete_member_prunes_larger_group() {
        let mut doc = two_shape_doc();
        doc.add_shape(rect_at("c", 200.0, 0.0));
        let id = doc.add_group(&["a".into(), "b".into(), "c".into()], None).unwrap();
        doc.delete_entity(&"c".into());
        let group = doc.group(&id).unwrap();
        assert_eq!(group.entity_ids, vec![EntityId::from("a"), EntityId::from("b")]);
        assert!((group.width - 130.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delete_group_keeps_members() {
        let mut doc = two_shape_doc();
        let id = doc.add_group(&["a".into(), "b".into()], None).unwrap();
        assert!(doc.delete_entity(&id));
        assert!(doc.groups.is_empty());
        assert_eq!(doc.shapes.len(), 2);
        assert!(!doc.delete_entity(&id));
    }

    #[test]
    fn test_member_move_refits_group() {
        let mut doc = two_shape_doc();
        let id = doc.add_group(&["a".into(), "b".into()], None).unwrap();
        doc.translate_entity(&"b".into(), Vec2::new(50.0, 0.0));
        let group = doc.group(&id).unwrap();
        assert!((group.width - (160.0 + 2.0 * GROUP_PADDING)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut doc = two_shape_doc();
        assert!(doc.resize_shape(&"a".into(), -5.0, -5.0, 3.0, 4.0));
        let shape = doc.shape(&"a".into()).unwrap();
        assert!((shape.width - 10.0).abs() < f64::EPSILON);
        assert!((shape.height - 10.0).abs() < f64::EPSILON);
        assert!((shape.x - 3.0).abs() < f64::EPSILON);
        assert!(!doc.resize_shape(&"missing".into(), 20.0, 20.0, 0.0, 0.0));
    }

    #[test]
    fn test_entity_at_prefers_connectors_and_resolves_groups() {
        let mut doc = two_shape_doc();
        let mut connector = Connector::new(ConnectorKind::Line, Point::new(0.0, 5.0), Point::new(10.0, 5.0));
        connector.id = "c".into();
        doc.add_connector(connector);
        assert_eq!(doc.entity_at(Point::new(5.0, 5.0), 0.0, 2.0), Some("c".into()));

        let group = doc.add_group(&["a".into(), "b".into()], None).unwrap();
        assert_eq!(doc.entity_at(Point::new(105.0, 105.0), 0.0, 2.0), Some(group.clone()));
        assert_eq!(doc.entity_at(Point::new(50.0, 50.0), 0.0, 2.0), Some(group));
        assert_eq!(doc.entity_at(Point::new(500.0, 500.0), 0.0, 2.0), None);
    }

    #[test]
    fn test_normalize_groups_drops_stale_members() {
        let mut doc = two_shape_doc();
        doc.groups.push(Group::new(
            vec!["a".into(), "ghost".into()],
            None,
            Rect::ZERO,
        ));
        doc.normalize_groups();
        assert!(doc.groups.is_empty());
    }

    #[test]
    fn test_normalize_groups_removes_repeated_members() {
        let mut doc = two_shape_doc();
        doc.groups.push(Group::new(
            vec!["a".into(), "b".into(), "a".into()],
            None,
            Rect::ZERO,
        ));
        doc.normalize_groups();
        assert_eq!(doc.groups.len(), 1);
        assert_eq!(doc.groups[0].entity_ids, vec![EntityId::from("a"), EntityId::from("b")]);
    }
}

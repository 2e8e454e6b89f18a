//! The canvas store: document, viewport, selection, tool and history.

use crate::camera::Viewport;
use crate::config::CanvasConfig;
use crate::document::CanvasDocument;
use crate::history::History;
use crate::interaction::{Interaction, InteractionKind};
use crate::selection::{Handle, Selection, handles_for};
use crate::shapes::{Connector, ConnectorPatch, EntityId, Group, Shape, ShapePatch};
use crate::tools::ToolMode;
use kurbo::{Point, Rect, Size, Vec2};
use serde::Serialize;

/// What changed in the store since the last [`Canvas::drain_changes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CanvasChange {
    /// Shapes, connectors or groups changed.
    Document,
    Viewport,
    Selection,
    ToolMode,
    /// The undo stack changed.
    History,
    /// The whole state was replaced, e.g. by a load or reset.
    Restored,
}

impl CanvasChange {
    /// Changes that must eventually reach durable storage.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Document | Self::Viewport)
    }
}

/// Read-only view of everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene<'a> {
    pub viewport: Viewport,
    pub canvas_size: Size,
    pub shapes: &'a [Shape],
    pub connectors: &'a [Connector],
    pub groups: &'a [Group],
    pub selected_entity_ids: &'a [EntityId],
    pub tool_mode: ToolMode,
    pub interaction: InteractionKind,
    /// First click of a connector being placed, in world space.
    pub pending_connector_start: Option<Point>,
    /// Handles of the selected shape when exactly one shape is selected.
    pub handles: Vec<Handle>,
    pub can_undo: bool,
}

/// Runtime canvas state. Owns the document; every mutation goes through here
/// so that history and change notifications stay consistent.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub(crate) document: CanvasDocument,
    pub(crate) viewport: Viewport,
    /// Canvas element rectangle in client coordinates.
    pub(crate) canvas_bounds: Rect,
    pub(crate) selection: Selection,
    pub(crate) tool: ToolMode,
    pub(crate) history: History,
    pub(crate) interaction: Interaction,
    pub(crate) config: CanvasConfig,
    changes: Vec<CanvasChange>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl Canvas {
    /// Create a new canvas with an empty document.
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            document: CanvasDocument::new(),
            viewport: Viewport::default(),
            canvas_bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
            selection: Selection::new(),
            tool: ToolMode::None,
            history: History::new(config.history_limit),
            interaction: Interaction::Idle,
            config,
            changes: Vec::new(),
        }
    }

    /// Create a canvas with an existing document and viewport.
    pub fn with_document(config: CanvasConfig, document: CanvasDocument, viewport: Viewport) -> Self {
        let mut canvas = Self::new(config);
        canvas.restore(document, viewport);
        canvas.changes.clear();
        canvas
    }

    pub fn document(&self) -> &CanvasDocument {
        &self.document
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.tool
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas_bounds.size()
    }

    /// Take the change notifications accumulated since the last call.
    pub fn drain_changes(&mut self) -> Vec<CanvasChange> {
        std::mem::take(&mut self.changes)
    }

    pub(crate) fn mark(&mut self, change: CanvasChange) {
        if self.changes.last() != Some(&change) {
            self.changes.push(change);
        }
    }

    /// Push a pre-mutation snapshot of the document.
    fn record(&mut self) {
        self.history.push(&self.document);
        self.mark(CanvasChange::History);
    }

    // --- geometry ---

    /// Re-measure the canvas element. Does not touch zoom or origin.
    pub fn set_canvas_bounds(&mut self, bounds: Rect) {
        self.canvas_bounds = bounds;
    }

    /// Client coordinates to canvas-local screen coordinates.
    pub fn client_to_screen(&self, client: Point) -> Point {
        client - self.canvas_bounds.origin().to_vec2()
    }

    pub fn client_to_world(&self, client: Point) -> Point {
        self.viewport.screen_to_world(self.client_to_screen(client))
    }

    /// World rectangle currently visible.
    pub fn visible_world_rect(&self) -> Rect {
        self.viewport.visible_world_rect(self.canvas_size())
    }

    /// Topmost entity under a world point, resolved to its group.
    pub fn entity_at(&self, world: Point) -> Option<EntityId> {
        self.document.entity_at(
            world,
            0.0,
            self.config.connector_hit_tolerance / self.viewport.zoom,
        )
    }

    // --- viewport ---

    /// Replace the viewport; zoom is clamped to the configured limits.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.viewport.clamp_zoom(self.config.zoom_limits);
        self.mark(CanvasChange::Viewport);
    }

    /// Set the zoom, keeping the center of the canvas fixed.
    pub fn set_zoom(&mut self, zoom: f64) {
        let center = Rect::from_origin_size(Point::ZERO, self.canvas_size()).center();
        if self.viewport.zoom_at(center, zoom, self.config.zoom_limits) {
            self.mark(CanvasChange::Viewport);
        }
    }

    /// Pan by a screen-space delta.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        let world = self.viewport.screen_delta_to_world(screen_delta);
        self.viewport.x -= world.x;
        self.viewport.y -= world.y;
        self.mark(CanvasChange::Viewport);
    }

    pub fn reset_viewport(&mut self) {
        self.viewport.reset();
        self.mark(CanvasChange::Viewport);
    }

    // --- entities ---

    /// Add a shape on top. Records one history entry.
    pub fn add_shape(&mut self, shape: Shape) -> EntityId {
        self.record();
        log::debug!("add {} shape", shape.kind.name());
        let id = self.document.add_shape(shape);
        self.mark(CanvasChange::Document);
        id
    }

    pub fn add_connector(&mut self, connector: Connector) -> EntityId {
        self.record();
        let id = self.document.add_connector(connector);
        self.mark(CanvasChange::Document);
        id
    }

    /// Patch a shape. With `record_history` false the change joins the
    /// active gesture (if any) instead of creating its own undo step.
    pub fn update_shape(&mut self, id: &EntityId, patch: &ShapePatch, record_history: bool) -> bool {
        if self.document.shape(id).is_none() {
            return false;
        }
        self.before_update(record_history);
        self.document.update_shape(id, patch);
        self.mark(CanvasChange::Document);
        true
    }

    pub fn update_connector(&mut self, id: &EntityId, patch: &ConnectorPatch, record_history: bool) -> bool {
        if self.document.connector(id).is_none() {
            return false;
        }
        self.before_update(record_history);
        self.document.update_connector(id, patch);
        self.mark(CanvasChange::Document);
        true
    }

    fn before_update(&mut self, record_history: bool) {
        if record_history {
            self.record();
        } else {
            self.capture_gesture_snapshot();
        }
    }

    /// Delete a shape, connector or group. See [`CanvasDocument::delete_entity`].
    pub fn delete_entity(&mut self, id: &EntityId) -> bool {
        if !self.document.contains(id) {
            return false;
        }
        self.record();
        self.document.delete_entity(id);
        self.after_delete();
        true
    }

    pub fn move_shape(&mut self, id: &EntityId, dx: f64, dy: f64) -> bool {
        if self.document.shape(id).is_none() {
            return false;
        }
        self.record();
        self.document.translate_entity(id, Vec2::new(dx, dy));
        self.mark(CanvasChange::Document);
        true
    }

    pub fn rotate_shape(&mut self, id: &EntityId, degrees: f64) -> bool {
        if self.document.shape(id).is_none() {
            return false;
        }
        self.record();
        self.document.rotate_shape(id, degrees);
        self.mark(CanvasChange::Document);
        true
    }

    /// Set a shape's frame; width and height clamp to the minimum size.
    pub fn resize_shape(&mut self, id: &EntityId, width: f64, height: f64, x: f64, y: f64) -> bool {
        if self.document.shape(id).is_none() {
            return false;
        }
        self.record();
        self.document.resize_shape(id, width, height, x, y);
        self.mark(CanvasChange::Document);
        true
    }

    /// Group shapes and connectors. No-op returning `None` when fewer than
    /// two valid members remain after filtering.
    pub fn add_group(&mut self, entity_ids: &[EntityId], name: Option<String>) -> Option<EntityId> {
        let snapshot = self.document.clone();
        let id = self.document.add_group(entity_ids, name)?;
        self.history.push_snapshot(snapshot);
        self.mark(CanvasChange::History);
        self.mark(CanvasChange::Document);
        log::debug!("group {id} created");
        Some(id)
    }

    /// Remove a group record. Members are unaffected.
    pub fn ungroup_group(&mut self, id: &EntityId) -> bool {
        if !self.document.is_group(id) {
            return false;
        }
        self.record();
        self.document.remove_group(id);
        self.selection.remove(id);
        self.mark(CanvasChange::Document);
        self.mark(CanvasChange::Selection);
        true
    }

    pub fn delete_group(&mut self, id: &EntityId) -> bool {
        self.ungroup_group(id)
    }

    /// Group the selected shapes and connectors and select the new group.
    pub fn group_selected(&mut self, name: Option<String>) -> Option<EntityId> {
        let ids = self.selection.groupable_ids(&self.document);
        let id = self.add_group(&ids, name)?;
        self.selection.select(id.clone());
        self.mark(CanvasChange::Selection);
        Some(id)
    }

    /// Dissolve every selected group, selecting their former members.
    /// One history entry covers all of them. Returns the number dissolved.
    pub fn ungroup_selected(&mut self) -> usize {
        let groups = self.selection.group_ids(&self.document);
        if groups.is_empty() {
            return 0;
        }
        self.record();
        for id in &groups {
            self.selection.remove(id);
            if let Some(group) = self.document.remove_group(id) {
                for member in group.entity_ids {
                    self.selection.add(member);
                }
            }
        }
        self.mark(CanvasChange::Document);
        self.mark(CanvasChange::Selection);
        groups.len()
    }

    /// Delete everything selected as one history entry.
    /// Returns the number of entities removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids: Vec<EntityId> = self
            .selection
            .ids()
            .iter()
            .filter(|id| self.document.contains(id))
            .cloned()
            .collect();
        if ids.is_empty() {
            return 0;
        }
        self.record();
        let removed = ids
            .iter()
            .filter(|id| self.document.delete_entity(id))
            .count();
        self.after_delete();
        log::debug!("deleted {removed} selected entities");
        removed
    }

    fn after_delete(&mut self) {
        self.selection.retain_existing(&self.document);
        self.mark(CanvasChange::Document);
        self.mark(CanvasChange::Selection);
    }

    // --- selection ---

    pub fn select_entity(&mut self, id: EntityId) {
        self.selection.select(id);
        self.mark(CanvasChange::Selection);
    }

    pub fn select_entities(&mut self, ids: Vec<EntityId>) {
        self.selection.select_many(ids);
        self.mark(CanvasChange::Selection);
    }

    pub fn toggle_selection(&mut self, id: EntityId) {
        self.selection.toggle(id);
        self.mark(CanvasChange::Selection);
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.mark(CanvasChange::Selection);
        }
    }

    /// Select every shape, connector and group.
    pub fn select_all(&mut self) {
        let ids: Vec<EntityId> = self.document.ids().cloned().collect();
        self.selection.select_many(ids);
        self.mark(CanvasChange::Selection);
    }

    pub fn can_group(&self) -> bool {
        self.selection.can_group(&self.document)
    }

    pub fn can_ungroup(&self) -> bool {
        self.selection.can_ungroup(&self.document)
    }

    // --- tool mode ---

    /// Arm a tool. Any pending connector or gesture is abandoned.
    pub fn set_tool_mode(&mut self, mode: ToolMode) {
        self.cancel_interaction();
        if self.tool != mode {
            log::debug!("tool: {} -> {}", self.tool, mode);
            self.tool = mode;
            self.mark(CanvasChange::ToolMode);
        }
    }

    pub fn clear_tool_mode(&mut self) {
        self.set_tool_mode(ToolMode::None);
    }

    /// Escape: disarm the tool and abandon the active gesture.
    pub fn cancel(&mut self) {
        self.clear_tool_mode();
    }

    // --- history ---

    /// Restore the most recent snapshot. Clears the selection.
    /// Returns false (and changes nothing) when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.cancel_interaction();
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        self.document = snapshot;
        self.selection.clear();
        self.mark(CanvasChange::History);
        self.mark(CanvasChange::Document);
        self.mark(CanvasChange::Selection);
        log::debug!("undo ({} left)", self.history.len());
        true
    }

    // --- whole-state ---

    /// Replace document and viewport, e.g. after loading. History,
    /// selection, tool and gesture state are reset.
    pub fn restore(&mut self, mut document: CanvasDocument, mut viewport: Viewport) {
        document.normalize_groups();
        viewport.clamp_zoom(self.config.zoom_limits);
        self.interaction = Interaction::Idle;
        self.document = document;
        self.viewport = viewport;
        self.selection.clear();
        self.tool = ToolMode::None;
        self.history.clear();
        // Restored supersedes anything still queued.
        self.changes.clear();
        self.mark(CanvasChange::Restored);
    }

    /// Empty canvas with the default viewport and no history.
    pub fn reset(&mut self) {
        self.restore(CanvasDocument::new(), Viewport::default());
    }

    /// Snapshot of everything a renderer needs.
    pub fn scene(&self) -> Scene<'_> {
        let handles = self
            .selection
            .single()
            .and_then(|id| self.document.shape(id))
            .map(handles_for)
            .unwrap_or_default();
        Scene {
            viewport: self.viewport,
            canvas_size: self.canvas_size(),
            shapes: &self.document.shapes,
            connectors: &self.document.connectors,
            groups: &self.document.groups,
            selected_entity_ids: self.selection.ids(),
            tool_mode: self.tool,
            interaction: self.interaction.kind(),
            pending_connector_start: self.interaction.pending_connector_start(),
            handles,
            can_undo: self.history.can_undo(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ConnectorKind, ShapeKind};

    fn rect(x: f64, y: f64) -> Shape {
        Shape::new(ShapeKind::Rectangle, x, y, 10.0, 10.0)
    }

    #[test]
    fn test_add_records_history_and_changes() {
        let mut canvas = Canvas::default();
        canvas.add_shape(rect(0.0, 0.0));
        assert!(canvas.can_undo());
        let changes = canvas.drain_changes();
        assert!(changes.contains(&CanvasChange::Document));
        assert!(canvas.drain_changes().is_empty());
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut canvas = Canvas::default();
        let before = canvas.document().clone();
        assert!(!canvas.undo());
        assert_eq!(canvas.document(), &before);
        assert!(canvas.drain_changes().is_empty());
    }

    #[test]
    fn test_update_without_history() {
        let mut canvas = Canvas::default();
        let id = canvas.add_shape(rect(0.0, 0.0));
        canvas.update_shape(&id, &ShapePatch::position(5.0, 5.0), false);
        assert_eq!(canvas.history.len(), 1);
        canvas.update_shape(&id, &ShapePatch::rotation(45.0), true);
        assert_eq!(canvas.history.len(), 2);
        assert!(!canvas.update_shape(&"missing".into(), &ShapePatch::default(), true));
        assert_eq!(canvas.history.len(), 2);
    }

    #[test]
    fn test_multi_select_delete_is_one_entry() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(rect(0.0, 0.0));
        let b = canvas.add_shape(rect(50.0, 0.0));
        let c = canvas.add_connector(Connector::new(ConnectorKind::Arrow, Point::ZERO, Point::new(1.0, 1.0)));
        canvas.history.clear();

        canvas.toggle_selection(a.clone());
        canvas.toggle_selection(b.clone());
        assert_eq!(canvas.delete_selected(), 2);
        assert!(canvas.document().shapes.is_empty());
        assert!(canvas.document().connector(&c).is_some());
        assert!(canvas.selection().is_empty());
        assert_eq!(canvas.history.len(), 1);

        canvas.undo();
        assert_eq!(canvas.document().shapes.len(), 2);
    }

    #[test]
    fn test_delete_selected_with_nothing_selected() {
        let mut canvas = Canvas::default();
        canvas.add_shape(rect(0.0, 0.0));
        canvas.history.clear();
        assert_eq!(canvas.delete_selected(), 0);
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_group_and_ungroup_selected() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(rect(0.0, 0.0));
        let b = canvas.add_shape(rect(100.0, 100.0));
        canvas.select_entities(vec![a.clone(), b.clone()]);
        assert!(canvas.can_group());

        let group = canvas.group_selected(Some("pair".into())).unwrap();
        assert_eq!(canvas.selection().ids(), &[group.clone()]);
        assert!(canvas.can_ungroup());

        assert_eq!(canvas.ungroup_selected(), 1);
        assert!(canvas.document().groups.is_empty());
        assert_eq!(canvas.selection().ids(), &[a, b]);
    }

    #[test]
    fn test_failed_group_records_nothing() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(rect(0.0, 0.0));
        canvas.history.clear();
        assert!(canvas.add_group(&[a], None).is_none());
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_undo_clears_selection() {
        let mut canvas = Canvas::default();
        let id = canvas.add_shape(rect(0.0, 0.0));
        canvas.move_shape(&id, 10.0, 0.0);
        canvas.select_entity(id.clone());
        assert!(canvas.undo());
        assert!(canvas.selection().is_empty());
        assert!(canvas.document().shape(&id).unwrap().x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_history_limit() {
        let config = CanvasConfig {
            history_limit: 3,
            ..CanvasConfig::default()
        };
        let mut canvas = Canvas::new(config);
        for i in 0..10 {
            canvas.add_shape(rect(f64::from(i), 0.0));
        }
        let mut undone = 0;
        while canvas.undo() {
            undone += 1;
        }
        assert_eq!(undone, 3);
        assert_eq!(canvas.document().shapes.len(), 7);
    }

    #[test]
    fn test_set_viewport_clamps_zoom() {
        let mut canvas = Canvas::default();
        canvas.set_viewport(Viewport::new(0.0, 0.0, 10.0));
        assert!((canvas.viewport().zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_zoom_keeps_center() {
        let mut canvas = Canvas::default();
        canvas.set_canvas_bounds(Rect::new(0.0, 0.0, 800.0, 600.0));
        let center = canvas.viewport().screen_to_world(Point::new(400.0, 300.0));
        canvas.set_zoom(2.0);
        let after = canvas.viewport().screen_to_world(Point::new(400.0, 300.0));
        assert!((center - after).hypot() < 1e-9);
    }

    #[test]
    fn test_canvas_resize_keeps_viewport() {
        let mut canvas = Canvas::default();
        canvas.set_viewport(Viewport::new(5.0, 6.0, 1.5));
        canvas.set_canvas_bounds(Rect::new(10.0, 10.0, 1210.0, 910.0));
        assert_eq!(canvas.viewport(), Viewport::new(5.0, 6.0, 1.5));
        assert_eq!(canvas.canvas_size(), Size::new(1200.0, 900.0));
    }

    #[test]
    fn test_scene_exposes_handles_for_single_shape() {
        let mut canvas = Canvas::default();
        let id = canvas.add_shape(rect(0.0, 0.0));
        assert!(canvas.scene().handles.is_empty());
        canvas.select_entity(id);
        let scene = canvas.scene();
        assert_eq!(scene.handles.len(), 9);
        assert_eq!(scene.shapes.len(), 1);
        assert!(scene.can_undo);
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["toolMode"], "none");
        assert_eq!(json["interaction"], "idle");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut canvas = Canvas::default();
        let id = canvas.add_shape(rect(0.0, 0.0));
        canvas.select_entity(id);
        canvas.set_viewport(Viewport::new(100.0, 100.0, 1.5));
        canvas.reset();
        assert!(canvas.document().is_empty());
        assert!(canvas.selection().is_empty());
        assert!(!canvas.can_undo());
        assert_eq!(canvas.viewport(), Viewport::default());
    }

    #[test]
    fn test_reset_drops_queued_changes() {
        let mut canvas = Canvas::default();
        canvas.add_shape(rect(0.0, 0.0));
        canvas.set_viewport(Viewport::new(10.0, 10.0, 1.0));
        canvas.reset();
        assert_eq!(canvas.drain_changes(), vec![CanvasChange::Restored]);
    }
}

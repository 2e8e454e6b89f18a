//! Pointer-driven interaction state machine.
//!
//! One [`Interaction`] is active at a time. Each gesture owns its scratch
//! state (start point, original geometry, pre-gesture snapshot) for as long
//! as it runs; nothing survives past mouse-up or cancel.

use crate::canvas::{Canvas, CanvasChange};
use crate::document::CanvasDocument;
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::selection::{HandleKind, ResizeHandle, hit_test_handles, pointer_angle, resize_frame};
use crate::shapes::{ConnectorPatch, EntityId, Shape, ShapePatch};
use kurbo::{Point, Vec2};

/// Scratch state shared by the mutating gestures.
#[derive(Debug, Clone)]
pub struct GestureContext {
    /// Pointer position at gesture start, canvas-local screen pixels.
    pub start: Point,
    /// Document as it was before the first mutating frame.
    snapshot: Option<CanvasDocument>,
}

impl GestureContext {
    pub fn new(start: Point) -> Self {
        Self {
            start,
            snapshot: None,
        }
    }

    /// Capture the pre-gesture document unless it was captured already.
    fn capture(&mut self, document: &CanvasDocument) {
        if self.snapshot.is_none() {
            self.snapshot = Some(document.clone());
        }
    }

    /// Whether any frame of this gesture changed the document.
    pub fn has_mutated(&self) -> bool {
        self.snapshot.is_some()
    }

    fn into_snapshot(self) -> Option<CanvasDocument> {
        self.snapshot
    }
}

/// Original geometry of one entity being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum MovedEntity {
    Shape { id: EntityId, origin: Point },
    Connector { id: EntityId, start: Point, end: Point },
}

#[derive(Debug, Clone)]
pub struct PanContext {
    pub start: Point,
    pub start_origin: Point,
    pub button: MouseButton,
}

#[derive(Debug, Clone)]
pub struct DragContext {
    pub gesture: GestureContext,
    /// Entity under the pointer at press time (a group if a member was hit).
    pub target: EntityId,
    /// Empty until the pointer passes the drag threshold.
    pub moved: Vec<MovedEntity>,
    pub dragging: bool,
    /// Ctrl/Cmd was held at press time; a click toggles instead of replacing.
    pub toggle: bool,
}

#[derive(Debug, Clone)]
pub struct ResizeContext {
    pub gesture: GestureContext,
    pub handle: ResizeHandle,
    pub original: Shape,
}

#[derive(Debug, Clone)]
pub struct RotateContext {
    pub gesture: GestureContext,
    pub shape_id: EntityId,
    pub initial_rotation: f64,
    /// Pointer angle around the shape center at press time, in degrees.
    pub initial_angle: f64,
}

/// The active interaction. Variants are mutually exclusive.
#[derive(Debug, Clone, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Panning(PanContext),
    /// A connector tool is armed and the first click has been recorded.
    PlacingPending { start: Point },
    Dragging(DragContext),
    Resizing(ResizeContext),
    Rotating(RotateContext),
}

/// Discriminant of [`Interaction`], for hosts that only need the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Idle,
    Panning,
    PlacingPending,
    DraggingEntities,
    Resizing,
    Rotating,
}

impl Interaction {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::Idle => InteractionKind::Idle,
            Self::Panning(_) => InteractionKind::Panning,
            Self::PlacingPending { .. } => InteractionKind::PlacingPending,
            Self::Dragging(_) => InteractionKind::DraggingEntities,
            Self::Resizing(_) => InteractionKind::Resizing,
            Self::Rotating(_) => InteractionKind::Rotating,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Start point of a pending connector, in world space.
    pub fn pending_connector_start(&self) -> Option<Point> {
        match self {
            Self::PlacingPending { start } => Some(*start),
            _ => None,
        }
    }

    /// Button that started the active interaction. Only its release ends it.
    fn button(&self) -> Option<MouseButton> {
        match self {
            Self::Panning(ctx) => Some(ctx.button),
            Self::Dragging(_) | Self::Resizing(_) | Self::Rotating(_) => Some(MouseButton::Left),
            Self::Idle | Self::PlacingPending { .. } => None,
        }
    }

    fn gesture_mut(&mut self) -> Option<&mut GestureContext> {
        match self {
            Self::Dragging(ctx) => Some(&mut ctx.gesture),
            Self::Resizing(ctx) => Some(&mut ctx.gesture),
            Self::Rotating(ctx) => Some(&mut ctx.gesture),
            Self::Idle | Self::Panning(_) | Self::PlacingPending { .. } => None,
        }
    }
}

impl Canvas {
    /// Feed one pointer event into the state machine.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.on_pointer_down(self.client_to_screen(position), button, modifiers),
            PointerEvent::Move { position, .. } => self.on_pointer_move(self.client_to_screen(position)),
            PointerEvent::Up { position, button, .. } => self.on_pointer_up(self.client_to_screen(position), button),
            PointerEvent::Wheel {
                position,
                delta,
                modifiers,
            } => self.on_wheel(self.client_to_screen(position), delta, modifiers),
        }
    }

    /// Abandon the active gesture and any pending connector.
    ///
    /// A gesture that already changed the document is rolled back to its
    /// pre-gesture snapshot; a pan returns the viewport to where it started.
    pub fn cancel_interaction(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::Idle => {}
            Interaction::PlacingPending { .. } => {
                log::debug!("pending connector discarded");
            }
            Interaction::Panning(ctx) => {
                self.viewport.x = ctx.start_origin.x;
                self.viewport.y = ctx.start_origin.y;
                self.mark(CanvasChange::Viewport);
                log::debug!("pan cancelled");
            }
            Interaction::Dragging(DragContext { gesture, .. })
            | Interaction::Resizing(ResizeContext { gesture, .. })
            | Interaction::Rotating(RotateContext { gesture, .. }) => {
                if let Some(snapshot) = gesture.into_snapshot() {
                    self.document = snapshot;
                    self.selection.retain_existing(&self.document);
                    self.mark(CanvasChange::Document);
                }
                log::debug!("gesture cancelled");
            }
        }
    }

    /// Enter a new interaction, finishing whatever was active.
    fn enter(&mut self, next: Interaction) {
        if !self.interaction.is_idle() {
            self.finish_interaction();
        }
        log::debug!("interaction: {:?}", next.kind());
        self.interaction = next;
    }

    /// End the active interaction normally, committing one history entry for
    /// a gesture that changed the document.
    fn finish_interaction(&mut self) {
        match std::mem::take(&mut self.interaction) {
            Interaction::Idle | Interaction::Panning(_) => {}
            Interaction::PlacingPending { .. } => {
                log::debug!("pending connector discarded");
            }
            Interaction::Dragging(DragContext { gesture, .. })
            | Interaction::Resizing(ResizeContext { gesture, .. })
            | Interaction::Rotating(RotateContext { gesture, .. }) => {
                if let Some(snapshot) = gesture.into_snapshot() {
                    self.history.push_snapshot(snapshot);
                    self.mark(CanvasChange::History);
                }
            }
        }
    }

    fn on_pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        let world = self.viewport.screen_to_world(screen);

        if button == MouseButton::Middle {
            self.begin_pan(screen, button);
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        if self.tool.is_shape_tool() {
            if let Some(shape) = self.tool.place_shape(world) {
                self.add_shape(shape);
            }
            self.clear_tool_mode();
            return;
        }

        if let Some(kind) = self.tool.connector_kind() {
            match self.interaction.pending_connector_start() {
                Some(start) => {
                    self.interaction = Interaction::Idle;
                    if let Some(connector) = self.tool.place_connector(start, world) {
                        log::debug!("placing {} connector", kind.name());
                        self.add_connector(connector);
                    }
                    self.clear_tool_mode();
                }
                None => self.enter(Interaction::PlacingPending { start: world }),
            }
            return;
        }

        if let Some(handle) = self.selected_handle_at(world) {
            self.begin_handle_gesture(screen, handle);
            return;
        }

        let hit = self.entity_at(world);
        if modifiers.meta && hit.is_none() {
            self.begin_pan(screen, button);
            return;
        }

        match hit {
            Some(target) => self.enter(Interaction::Dragging(DragContext {
                gesture: GestureContext::new(screen),
                target,
                moved: Vec::new(),
                dragging: false,
                toggle: modifiers.command(),
            })),
            None => {
                if !modifiers.command() {
                    self.clear_selection();
                }
            }
        }
    }

    fn on_pointer_move(&mut self, screen: Point) {
        match &self.interaction {
            Interaction::Panning(ctx) => {
                let start_origin = ctx.start_origin;
                let delta = screen - ctx.start;
                self.viewport.drag_pan(start_origin, delta);
                self.mark(CanvasChange::Viewport);
            }
            Interaction::Dragging(_) => self.drag_to(screen),
            Interaction::Resizing(_) => self.resize_to(screen),
            Interaction::Rotating(_) => self.rotate_to(screen),
            Interaction::Idle | Interaction::PlacingPending { .. } => {}
        }
    }

    fn on_pointer_up(&mut self, _screen: Point, button: MouseButton) {
        if self.interaction.button().is_some_and(|started| started != button) {
            return;
        }
        match &self.interaction {
            Interaction::Dragging(ctx) if !ctx.dragging => {
                let target = ctx.target.clone();
                let toggle = ctx.toggle;
                self.interaction = Interaction::Idle;
                if toggle {
                    self.toggle_selection(target);
                } else {
                    self.select_entity(target);
                }
            }
            Interaction::PlacingPending { .. } | Interaction::Idle => {}
            _ => {
                let kind = self.interaction.kind();
                self.finish_interaction();
                log::debug!("gesture finished: {kind:?}");
            }
        }
    }

    fn on_wheel(&mut self, screen: Point, delta: Vec2, modifiers: Modifiers) {
        if modifiers.ctrl {
            if self.viewport.wheel_zoom(
                screen,
                delta.y,
                self.config.wheel_zoom_divisor,
                self.config.zoom_limits,
            ) {
                self.mark(CanvasChange::Viewport);
            }
        } else {
            self.viewport
                .wheel_pan(delta, modifiers.shift, self.config.wheel_pan_speed);
            self.mark(CanvasChange::Viewport);
        }
    }

    fn begin_pan(&mut self, screen: Point, button: MouseButton) {
        self.enter(Interaction::Panning(PanContext {
            start: screen,
            start_origin: self.viewport.origin(),
            button,
        }));
    }

    /// Handle of the single selected shape under `world`, if any.
    fn selected_handle_at(&self, world: Point) -> Option<(EntityId, HandleKind)> {
        let id = self.selection.single()?;
        let shape = self.document.shape(id)?;
        let tolerance = self.config.handle_hit_tolerance / self.viewport.zoom;
        hit_test_handles(shape, world, tolerance).map(|kind| (id.clone(), kind))
    }

    fn begin_handle_gesture(&mut self, screen: Point, (id, kind): (EntityId, HandleKind)) {
        let Some(shape) = self.document.shape(&id).cloned() else {
            return;
        };
        let gesture = GestureContext::new(screen);
        let next = match kind {
            HandleKind::Resize(handle) => Interaction::Resizing(ResizeContext {
                gesture,
                handle,
                original: shape,
            }),
            HandleKind::Rotate => {
                let center = self.viewport.world_to_screen(shape.center());
                Interaction::Rotating(RotateContext {
                    gesture,
                    shape_id: id,
                    initial_rotation: shape.rotation,
                    initial_angle: pointer_angle(center, screen),
                })
            }
        };
        self.enter(next);
    }

    fn drag_to(&mut self, screen: Point) {
        let Interaction::Dragging(ctx) = &self.interaction else {
            return;
        };
        let screen_delta = screen - ctx.gesture.start;
        if !ctx.dragging {
            if screen_delta.hypot() <= self.config.drag_threshold {
                return;
            }
            let target = ctx.target.clone();
            self.start_drag(target);
        }

        let delta = self.viewport.screen_delta_to_world(screen_delta);
        let Interaction::Dragging(ctx) = &mut self.interaction else {
            return;
        };
        ctx.gesture.capture(&self.document);
        for moved in &ctx.moved {
            match moved {
                MovedEntity::Shape { id, origin } => {
                    let to = *origin + delta;
                    self.document.update_shape(id, &ShapePatch::position(to.x, to.y));
                }
                MovedEntity::Connector { id, start, end } => {
                    self.document
                        .update_connector(id, &ConnectorPatch::endpoints(*start + delta, *end + delta));
                }
            }
        }
        self.mark(CanvasChange::Document);
    }

    /// The pointer crossed the drag threshold: settle the selection and
    /// record the original positions of everything that will move.
    fn start_drag(&mut self, target: EntityId) {
        if !self.selection.contains(&target) {
            self.select_entity(target);
        }

        let mut ids: Vec<EntityId> = Vec::new();
        for selected in self.selection.ids() {
            for id in self.document.movable_ids(selected) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        let moved: Vec<MovedEntity> = ids
            .into_iter()
            .filter_map(|id| {
                if let Some(shape) = self.document.shape(&id) {
                    Some(MovedEntity::Shape {
                        origin: shape.position(),
                        id,
                    })
                } else {
                    self.document.connector(&id).map(|c| MovedEntity::Connector {
                        start: c.start(),
                        end: c.end(),
                        id,
                    })
                }
            })
            .collect();

        log::debug!("dragging {} entities", moved.len());
        if let Interaction::Dragging(ctx) = &mut self.interaction {
            ctx.dragging = true;
            ctx.moved = moved;
        }
    }

    fn resize_to(&mut self, screen: Point) {
        let Interaction::Resizing(ctx) = &mut self.interaction else {
            return;
        };
        let delta = self.viewport.screen_delta_to_world(screen - ctx.gesture.start);
        let (x, y, width, height) = resize_frame(&ctx.original, ctx.handle, delta);
        ctx.gesture.capture(&self.document);
        let id = ctx.original.id.clone();
        self.document.resize_shape(&id, width, height, x, y);
        self.mark(CanvasChange::Document);
    }

    fn rotate_to(&mut self, screen: Point) {
        let Interaction::Rotating(ctx) = &mut self.interaction else {
            return;
        };
        let Some(center) = self.document.shape(&ctx.shape_id).map(Shape::center) else {
            return;
        };
        let angle = pointer_angle(self.viewport.world_to_screen(center), screen);
        let rotation = ctx.initial_rotation + (angle - ctx.initial_angle);
        ctx.gesture.capture(&self.document);
        let id = ctx.shape_id.clone();
        self.document.rotate_shape(&id, rotation);
        self.mark(CanvasChange::Document);
    }

    /// Capture hook used by programmatic frame updates during a gesture.
    pub(crate) fn capture_gesture_snapshot(&mut self) {
        if let Some(gesture) = self.interaction.gesture_mut() {
            gesture.capture(&self.document);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::canvas::Canvas;
    use crate::config::CanvasConfig;
    use crate::input::{Modifiers, MouseButton, PointerEvent};
    use crate::interaction::InteractionKind;
    use crate::shapes::{Shape, ShapeKind};
    use crate::tools::ToolMode;
    use kurbo::{Point, Rect, Vec2};

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new(CanvasConfig::default());
        canvas.set_canvas_bounds(Rect::new(0.0, 0.0, 800.0, 600.0));
        canvas
    }

    fn left_click(canvas: &mut Canvas, x: f64, y: f64, modifiers: Modifiers) {
        canvas.handle_pointer_event(PointerEvent::down(x, y, MouseButton::Left, modifiers));
        canvas.handle_pointer_event(PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers,
        });
    }

    fn add_rect(canvas: &mut Canvas, x: f64, y: f64) -> crate::shapes::EntityId {
        let id = canvas.add_shape(Shape::new(ShapeKind::Rectangle, x, y, 100.0, 100.0));
        canvas.history.clear();
        id
    }

    #[test]
    fn test_place_and_undo() {
        let mut canvas = canvas();
        canvas.set_tool_mode(ToolMode::Rectangle);
        left_click(&mut canvas, 50.0, 50.0, Modifiers::NONE);

        assert_eq!(canvas.document().shapes.len(), 1);
        assert_eq!(canvas.document().shapes[0].center(), Point::new(50.0, 50.0));
        assert_eq!(canvas.tool_mode(), ToolMode::None);
        assert!(canvas.can_undo());

        assert!(canvas.undo());
        assert!(canvas.document().shapes.is_empty());
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_place_respects_viewport() {
        let mut canvas = canvas();
        canvas.set_canvas_bounds(Rect::new(100.0, 50.0, 900.0, 650.0));
        canvas.set_viewport(crate::camera::Viewport::new(10.0, 20.0, 2.0));
        canvas.set_tool_mode(ToolMode::Circle);
        left_click(&mut canvas, 200.0, 150.0, Modifiers::NONE);
        assert_eq!(canvas.document().shapes[0].center(), Point::new(60.0, 70.0));
    }

    #[test]
    fn test_connector_two_click_placement() {
        let mut canvas = canvas();
        canvas.set_tool_mode(ToolMode::Arrow);
        left_click(&mut canvas, 0.0, 0.0, Modifiers::NONE);
        assert!(canvas.document().connectors.is_empty());
        assert_eq!(canvas.interaction().kind(), InteractionKind::PlacingPending);
        assert_eq!(canvas.interaction().pending_connector_start(), Some(Point::ZERO));

        left_click(&mut canvas, 100.0, 0.0, Modifiers::NONE);
        let connectors = &canvas.document().connectors;
        assert_eq!(connectors.len(), 1);
        assert!((connectors[0].x).abs() < f64::EPSILON);
        assert!((connectors[0].y).abs() < f64::EPSILON);
        assert!((connectors[0].target_x - 100.0).abs() < f64::EPSILON);
        assert!((connectors[0].target_y).abs() < f64::EPSILON);
        assert_eq!(canvas.tool_mode(), ToolMode::None);
        assert!(canvas.interaction().is_idle());
    }

    #[test]
    fn test_rearming_tool_discards_pending_connector() {
        let mut canvas = canvas();
        canvas.set_tool_mode(ToolMode::Line);
        left_click(&mut canvas, 0.0, 0.0, Modifiers::NONE);
        canvas.set_tool_mode(ToolMode::Dotted);
        assert!(canvas.interaction().is_idle());

        left_click(&mut canvas, 10.0, 10.0, Modifiers::NONE);
        assert!(canvas.document().connectors.is_empty());
        assert_eq!(canvas.interaction().pending_connector_start(), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_escape_cancels_pending_connector() {
        let mut canvas = canvas();
        canvas.set_tool_mode(ToolMode::Arrow);
        left_click(&mut canvas, 0.0, 0.0, Modifiers::NONE);
        canvas.cancel();
        assert!(canvas.interaction().is_idle());
        assert_eq!(canvas.tool_mode(), ToolMode::None);
        assert!(canvas.document().connectors.is_empty());
    }

    #[test]
    fn test_single_snapshot_per_drag() {
        let mut canvas = canvas();
        let id = add_rect(&mut canvas, 0.0, 0.0);

        canvas.handle_pointer_event(PointerEvent::down(50.0, 50.0, MouseButton::Left, Modifiers::NONE));
        for step in 1..=20 {
            canvas.handle_pointer_event(PointerEvent::moved(50.0 + f64::from(step), 50.0));
        }
        assert_eq!(canvas.interaction().kind(), InteractionKind::DraggingEntities);
        canvas.handle_pointer_event(PointerEvent::up(70.0, 50.0, MouseButton::Left));

        assert_eq!(canvas.history.len(), 1);
        let shape = canvas.document().shape(&id).unwrap();
        assert!((shape.x - 20.0).abs() < 1e-9);
        assert!(canvas.selection().contains(&id));

        assert!(canvas.undo());
        assert!(canvas.document().shape(&id).unwrap().x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_uses_world_delta() {
        let mut canvas = canvas();
        canvas.set_viewport(crate::camera::Viewport::new(0.0, 0.0, 2.0));
        let id = add_rect(&mut canvas, 0.0, 0.0);
        canvas.handle_pointer_event(PointerEvent::down(20.0, 20.0, MouseButton::Left, Modifiers::NONE));
        canvas.handle_pointer_event(PointerEvent::moved(60.0, 20.0));
        canvas.handle_pointer_event(PointerEvent::up(60.0, 20.0, MouseButton::Left));
        assert!((canvas.document().shape(&id).unwrap().x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_motion_is_a_click() {
        let mut canvas = canvas();
        let a = add_rect(&mut canvas, 0.0, 0.0);
        let b = add_rect(&mut canvas, 200.0, 0.0);

        canvas.handle_pointer_event(PointerEvent::down(50.0, 50.0, MouseButton::Left, Modifiers::NONE));
        canvas.handle_pointer_event(PointerEvent::moved(52.0, 50.0));
        canvas.handle_pointer_event(PointerEvent::up(52.0, 50.0, MouseButton::Left));
        assert_eq!(canvas.selection().ids(), &[a.clone()]);
        assert!(!canvas.can_undo());
        assert!((canvas.document().shape(&a).unwrap().x).abs() < f64::EPSILON);

        left_click(&mut canvas, 250.0, 50.0, Modifiers::ctrl());
        assert_eq!(canvas.selection().ids(), &[a.clone(), b]);
        left_click(&mut canvas, 50.0, 50.0, Modifiers::meta());
        assert_eq!(canvas.selection().len(), 1);
        assert!(!canvas.selection().contains(&a));
    }

    #[test]
    fn test_click_toggle_uses_press_modifiers() {
        let mut canvas = canvas();
        let a = add_rect(&mut canvas, 0.0, 0.0);
        let b = add_rect(&mut canvas, 200.0, 0.0);

        for x in [50.0, 250.0] {
            canvas.handle_pointer_event(PointerEvent::down(x, 50.0, MouseButton::Left, Modifiers::ctrl()));
            canvas.handle_pointer_event(PointerEvent::up(x, 50.0, MouseButton::Left));
        }
        assert_eq!(canvas.selection().ids(), &[a, b]);
    }

    #[test]
    fn test_release_of_other_button_keeps_gesture() {
        let mut canvas = canvas();
        let a = add_rect(&mut canvas, 0.0, 0.0);

        canvas.handle_pointer_event(PointerEvent::down(50.0, 50.0, MouseButton::Left, Modifiers::NONE));
        canvas.handle_pointer_event(PointerEvent::up(50.0, 50.0, MouseButton::Right));
        canvas.handle_pointer_event(PointerEvent::up(50.0, 50.0, MouseButton::Middle));
        assert_eq!(canvas.interaction().kind(), InteractionKind::DraggingEntities);
        assert!(canvas.selection().is_empty());

        canvas.handle_pointer_event(PointerEvent::up(50.0, 50.0, MouseButton::Left));
        assert!(canvas.interaction().is_idle());
        assert_eq!(canvas.selection().ids(), &[a]);
    }

    #[test]
    fn test_empty_click_clears_unless_ctrl() {
        let mut canvas = canvas();
        let a = add_rect(&mut canvas, 0.0, 0.0);
        canvas.select_entity(a);
        left_click(&mut canvas, 500.0, 500.0, Modifiers::ctrl());
        assert_eq!(canvas.selection().len(), 1);
        left_click(&mut canvas, 500.0, 500.0, Modifiers::NONE);
        assert!(canvas.selection().is_empty());
    }

    #[test]
    fn test_multi_selection_drag_moves_all() {
        let mut canvas = canvas();
        let a = add_rect(&mut canvas, 0.0, 0.0);
        let b = add_rect(&mut canvas, 200.0, 0.0);
        canvas.select_entities(vec![a.clone(), b.clone()]);

        canvas.handle_pointer_event(PointerEvent::down(50.0, 50.0, MouseButton::Left, Modifiers::NONE));
        canvas.handle_pointer_event(PointerEvent::moved(50.0, 80.0));
        canvas.handle_pointer_event(PointerEvent::up(50.0, 80.0, MouseButton::Left));

        assert!((canvas.document().shape(&a).unwrap().y - 30.0).abs() < 1e-9);
        assert!((canvas.document().shape(&b).unwrap().y - 30.0).abs() < 1e-9);
        assert_eq!(canvas.selection().len(), 2);
    }

    #[test]
    fn test_dragging_member_moves_group() {
        let mut canvas = canvas();
        let a = add_rect(&mut canvas, 0.0, 0.0);
        let b = add_rect(&mut canvas, 200.0, 0.0);
        let group = canvas.add_group(&[a.clone(), b.clone()], None).unwrap();
        canvas.history.clear();

        canvas.handle_pointer_event(PointerEvent::down(50.0, 50.0, MouseButton::Left, Modifiers::NONE));
        canvas.handle_pointer_event(PointerEvent::moved(60.0, 50.0));
        canvas.handle_pointer_event(PointerEvent::up(60.0, 50.0, MouseButton::Left));

        assert_eq!(canvas.selection().ids(), &[group.clone()]);
        assert!((canvas.document().shape(&b).unwrap().x - 210.0).abs() < 1e-9);
        assert!((canvas.document().group(&group).unwrap().x - 0.0).abs() < 1e-9);
        assert_eq!(canvas.history.len(), 1);
    }

    #[test]
    fn test_resize_gesture() {
        let mut canvas = canvas();
        let id = add_rect(&mut canvas, 0.0, 0.0);
        canvas.select_entity(id.clone());

        // South-east handle sits at (100, 100).
        canvas.handle_pointer_event(PointerEvent::down(100.0, 100.0, MouseButton::Left, Modifiers::NONE));
        assert_eq!(canvas.interaction().kind(), InteractionKind::Resizing);
        canvas.handle_pointer_event(PointerEvent::moved(130.0, 110.0));
        canvas.handle_pointer_event(PointerEvent::moved(140.0, 120.0));
        canvas.handle_pointer_event(PointerEvent::up(140.0, 120.0, MouseButton::Left));

        let shape = canvas.document().shape(&id).unwrap();
        assert!((shape.width - 140.0).abs() < 1e-9);
        assert!((shape.height - 120.0).abs() < 1e-9);
        assert_eq!(canvas.history.len(), 1);
    }

    #[test]
    fn test_resize_never_below_minimum() {
        let mut canvas = canvas();
        let id = add_rect(&mut canvas, 0.0, 0.0);
        canvas.select_entity(id.clone());
        canvas.handle_pointer_event(PointerEvent::down(100.0, 50.0, MouseButton::Left, Modifiers::NONE));
        canvas.handle_pointer_event(PointerEvent::moved(-400.0, 50.0));
        canvas.handle_pointer_event(PointerEvent::up(-400.0, 50.0, MouseButton::Left));
        let shape = canvas.document().shape(&id).unwrap();
        assert!((shape.width - 10.0).abs() < 1e-9);
        assert!((shape.x).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_gesture() {
        let mut canvas = canvas();
        let id = add_rect(&mut canvas, 0.0, 0.0);
        canvas.select_entity(id.clone());

        // Rotate handle sits 16 units above the top-center: (50, -16).
        canvas.set_viewport(crate::camera::Viewport::new(0.0, -100.0, 1.0));
        canvas.handle_pointer_event(PointerEvent::down(50.0, 84.0, MouseButton::Left, Modifiers::NONE));
        assert_eq!(canvas.interaction().kind(), InteractionKind::Rotating);
        // Center is at screen (50, 150); move from straight above to the right.
        canvas.handle_pointer_event(PointerEvent::moved(150.0, 150.0));
        canvas.handle_pointer_event(PointerEvent::up(150.0, 150.0, MouseButton::Left));

        let shape = canvas.document().shape(&id).unwrap();
        assert!((shape.rotation - 90.0).abs() < 1e-9);
        assert_eq!(canvas.history.len(), 1);
    }

    #[test]
    fn test_handle_click_without_motion_records_nothing() {
        let mut canvas = canvas();
        let id = add_rect(&mut canvas, 0.0, 0.0);
        canvas.select_entity(id);
        canvas.handle_pointer_event(PointerEvent::down(100.0, 100.0, MouseButton::Left, Modifiers::NONE));
        canvas.handle_pointer_event(PointerEvent::up(100.0, 100.0, MouseButton::Left));
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_escape_rolls_back_drag() {
        let mut canvas = canvas();
        let id = add_rect(&mut canvas, 0.0, 0.0);
        canvas.handle_pointer_event(PointerEvent::down(50.0, 50.0, MouseButton::Left, Modifiers::NONE));
        canvas.handle_pointer_event(PointerEvent::moved(90.0, 50.0));
        canvas.cancel();
        assert!(canvas.interaction().is_idle());
        assert!(canvas.document().shape(&id).unwrap().x.abs() < f64::EPSILON);
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_middle_button_pans() {
        let mut canvas = canvas();
        canvas.set_viewport(crate::camera::Viewport::new(0.0, 0.0, 2.0));
        canvas.handle_pointer_event(PointerEvent::down(100.0, 100.0, MouseButton::Middle, Modifiers::NONE));
        assert_eq!(canvas.interaction().kind(), InteractionKind::Panning);
        canvas.handle_pointer_event(PointerEvent::moved(140.0, 80.0));
        assert!((canvas.viewport().x - -20.0).abs() < 1e-9);
        assert!((canvas.viewport().y - 10.0).abs() < 1e-9);
        canvas.handle_pointer_event(PointerEvent::up(140.0, 80.0, MouseButton::Left));
        assert_eq!(canvas.interaction().kind(), InteractionKind::Panning);
        canvas.handle_pointer_event(PointerEvent::up(140.0, 80.0, MouseButton::Middle));
        assert!(canvas.interaction().is_idle());
    }

    #[test]
    fn test_meta_drag_on_empty_canvas_pans() {
        let mut canvas = canvas();
        canvas.handle_pointer_event(PointerEvent::down(10.0, 10.0, MouseButton::Left, Modifiers::meta()));
        assert_eq!(canvas.interaction().kind(), InteractionKind::Panning);
    }

    #[test]
    fn test_ctrl_wheel_zooms_at_cursor() {
        let mut canvas = canvas();
        let cursor = Point::new(400.0, 300.0);
        let before = canvas.viewport().screen_to_world(cursor);
        canvas.handle_pointer_event(PointerEvent::wheel(400.0, 300.0, Vec2::new(0.0, -250.0), Modifiers::ctrl()));
        assert!((canvas.viewport().zoom - 1.25).abs() < 1e-9);
        let after = canvas.viewport().screen_to_world(cursor);
        assert!((before - after).hypot() < 1e-9);
    }

    #[test]
    fn test_wheel_pans() {
        let mut canvas = canvas();
        canvas.handle_pointer_event(PointerEvent::wheel(0.0, 0.0, Vec2::new(10.0, 100.0), Modifiers::NONE));
        assert!((canvas.viewport().x - 3.0).abs() < 1e-9);
        assert!((canvas.viewport().y - 30.0).abs() < 1e-9);
    }
}

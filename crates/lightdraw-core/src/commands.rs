//! Command surface and keyboard shortcut registry.

use crate::canvas::Canvas;
use crate::input::KeyPress;
use crate::tools::ToolMode;
use serde::{Deserialize, Serialize};

/// A discrete user command, typically produced by a keyboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", content = "mode", rename_all = "camelCase")]
pub enum Command {
    DeleteSelected,
    SetToolMode(ToolMode),
    ClearToolMode,
    /// Escape: clear the tool and abandon the active gesture.
    Cancel,
    Undo,
    Group,
    Ungroup,
    SelectAll,
    /// Reset to an empty canvas. The session also clears durable storage.
    ClearAll,
}

impl Canvas {
    /// Run a command against the store. Returns whether anything changed.
    pub fn dispatch(&mut self, command: Command) -> bool {
        log::debug!("dispatch {command:?}");
        match command {
            Command::DeleteSelected => self.delete_selected() > 0,
            Command::SetToolMode(mode) => {
                let changed = self.tool_mode() != mode;
                self.set_tool_mode(mode);
                changed
            }
            Command::ClearToolMode => {
                let changed = self.tool_mode() != ToolMode::None;
                self.clear_tool_mode();
                changed
            }
            Command::Cancel => {
                let changed = self.tool_mode() != ToolMode::None || !self.interaction().is_idle();
                self.cancel();
                changed
            }
            Command::Undo => self.undo(),
            Command::Group => self.group_selected(None).is_some(),
            Command::Ungroup => self.ungroup_selected() > 0,
            Command::SelectAll => {
                self.select_all();
                !self.selection().is_empty()
            }
            Command::ClearAll => {
                self.reset();
                true
            }
        }
    }

    /// Resolve a key press through `registry` and dispatch it.
    /// Returns the command that ran, if the key was bound.
    pub fn handle_key(&mut self, registry: &ShortcutRegistry, key: &KeyPress) -> Option<Command> {
        let command = registry.resolve(key)?;
        self.dispatch(command);
        Some(command)
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub command: Command,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, shift: bool, command: Command, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            command,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+G").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Keys compare case-insensitively; Ctrl and Cmd are interchangeable.
    /// Shift only matters for shortcuts that also need Ctrl.
    pub fn matches(&self, press: &KeyPress) -> bool {
        if !self.key.eq_ignore_ascii_case(&press.key) {
            return false;
        }
        let mods = press.modifiers;
        if mods.command() != self.ctrl || mods.alt {
            return false;
        }
        !self.ctrl || mods.shift == self.shift
    }
}

/// Registry of keyboard shortcuts.
#[derive(Debug, Clone)]
pub struct ShortcutRegistry {
    shortcuts: Vec<Shortcut>,
}

impl Default for ShortcutRegistry {
    fn default() -> Self {
        Self::new(Self::defaults())
    }
}

impl ShortcutRegistry {
    pub fn new(shortcuts: Vec<Shortcut>) -> Self {
        Self { shortcuts }
    }

    /// The built-in bindings.
    pub fn defaults() -> Vec<Shortcut> {
        use Command::*;
        vec![
            Shortcut::new("Delete", false, false, DeleteSelected, "Delete selected entities"),
            Shortcut::new("Backspace", false, false, DeleteSelected, "Delete selected entities"),
            Shortcut::new("Escape", false, false, Cancel, "Cancel current action"),
            Shortcut::new("V", false, false, ClearToolMode, "Select tool"),
            Shortcut::new("R", false, false, SetToolMode(ToolMode::Rectangle), "Rectangle tool"),
            Shortcut::new("C", false, false, SetToolMode(ToolMode::Circle), "Circle tool"),
            Shortcut::new("T", false, false, SetToolMode(ToolMode::Text), "Text tool"),
            Shortcut::new("A", false, false, SetToolMode(ToolMode::Arrow), "Arrow tool"),
            Shortcut::new("L", false, false, SetToolMode(ToolMode::Line), "Line tool"),
            Shortcut::new("D", false, false, SetToolMode(ToolMode::DoubleArrow), "Double arrow tool"),
            Shortcut::new("O", false, false, SetToolMode(ToolMode::Dotted), "Dotted line tool"),
            Shortcut::new("Z", true, false, Undo, "Undo"),
            Shortcut::new("A", true, false, SelectAll, "Select all"),
            Shortcut::new("G", true, false, Group, "Group selected entities"),
            Shortcut::new("G", true, true, Ungroup, "Ungroup selected groups"),
        ]
    }

    pub fn all(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// First command bound to this key press.
    pub fn resolve(&self, press: &KeyPress) -> Option<Command> {
        self.shortcuts
            .iter()
            .find(|shortcut| shortcut.matches(press))
            .map(|shortcut| shortcut.command)
    }

    /// Shortcuts bound to a command, for tooltips and help screens.
    pub fn shortcuts_for(&self, command: Command) -> impl Iterator<Item = &Shortcut> {
        self.shortcuts.iter().filter(move |s| s.command == command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Modifiers, MouseButton, PointerEvent};
    use crate::shapes::{Shape, ShapeKind};

    fn press(key: &str, modifiers: Modifiers) -> KeyPress {
        KeyPress::new(key, modifiers)
    }

    #[test]
    fn test_resolve_defaults() {
        let registry = ShortcutRegistry::default();
        assert_eq!(registry.resolve(&press("r", Modifiers::NONE)), Some(Command::SetToolMode(ToolMode::Rectangle)));
        assert_eq!(registry.resolve(&press("a", Modifiers::NONE)), Some(Command::SetToolMode(ToolMode::Arrow)));
        assert_eq!(registry.resolve(&press("a", Modifiers::ctrl())), Some(Command::SelectAll));
        assert_eq!(registry.resolve(&press("z", Modifiers::meta())), Some(Command::Undo));
        assert_eq!(registry.resolve(&press("Backspace", Modifiers::NONE)), Some(Command::DeleteSelected));
        assert_eq!(registry.resolve(&press("x", Modifiers::NONE)), None);
    }

    #[test]
    fn test_shift_distinguishes_group_and_ungroup() {
        let registry = ShortcutRegistry::default();
        let ungroup = Modifiers {
            shift: true,
            ..Modifiers::ctrl()
        };
        assert_eq!(registry.resolve(&press("g", Modifiers::ctrl())), Some(Command::Group));
        assert_eq!(registry.resolve(&press("G", ungroup)), Some(Command::Ungroup));
        assert_eq!(registry.resolve(&press("g", Modifiers::NONE)), None);
    }

    #[test]
    fn test_format() {
        let registry = ShortcutRegistry::default();
        let labels: Vec<String> = registry.shortcuts_for(Command::Ungroup).map(Shortcut::format).collect();
        assert_eq!(labels, vec!["Ctrl+Shift+G".to_string()]);
    }

    #[test]
    fn test_ctrl_click_then_delete() {
        let mut canvas = Canvas::default();
        let a = canvas.add_shape(Shape::new(ShapeKind::Rectangle, 0.0, 0.0, 50.0, 50.0));
        let b = canvas.add_shape(Shape::new(ShapeKind::Circle, 100.0, 0.0, 50.0, 50.0));
        canvas.history.clear();

        for x in [25.0, 125.0] {
            canvas.handle_pointer_event(PointerEvent::down(x, 25.0, MouseButton::Left, Modifiers::ctrl()));
            canvas.handle_pointer_event(PointerEvent::up(x, 25.0, MouseButton::Left));
        }
        assert_eq!(canvas.selection().ids(), &[a, b]);

        let registry = ShortcutRegistry::default();
        assert_eq!(
            canvas.handle_key(&registry, &press("Delete", Modifiers::NONE)),
            Some(Command::DeleteSelected)
        );
        assert!(canvas.document().shapes.is_empty());
        assert!(canvas.selection().is_empty());
        assert_eq!(canvas.history.len(), 1);
    }

    #[test]
    fn test_escape_clears_tool() {
        let mut canvas = Canvas::default();
        assert!(canvas.dispatch(Command::SetToolMode(ToolMode::Arrow)));
        canvas.handle_pointer_event(PointerEvent::down(0.0, 0.0, MouseButton::Left, Modifiers::NONE));
        assert!(canvas.dispatch(Command::Cancel));
        assert_eq!(canvas.tool_mode(), ToolMode::None);
        assert!(canvas.interaction().is_idle());
        assert!(!canvas.dispatch(Command::Cancel));
    }

    #[test]
    fn test_group_commands() {
        let mut canvas = Canvas::default();
        canvas.add_shape(Shape::new(ShapeKind::Rectangle, 0.0, 0.0, 10.0, 10.0));
        canvas.add_shape(Shape::new(ShapeKind::Rectangle, 100.0, 100.0, 10.0, 10.0));
        assert!(!canvas.dispatch(Command::Group));
        assert!(canvas.dispatch(Command::SelectAll));
        assert!(canvas.dispatch(Command::Group));
        assert_eq!(canvas.document().groups.len(), 1);
        assert!(canvas.dispatch(Command::Ungroup));
        assert!(canvas.document().groups.is_empty());
        assert!(canvas.dispatch(Command::Undo));
        assert_eq!(canvas.document().groups.len(), 1);
    }

    #[test]
    fn test_clear_all_drops_history() {
        let mut canvas = Canvas::default();
        canvas.add_shape(Shape::new(ShapeKind::Rectangle, 0.0, 0.0, 10.0, 10.0));
        assert!(canvas.dispatch(Command::ClearAll));
        assert!(canvas.document().is_empty());
        assert!(!canvas.dispatch(Command::Undo));
    }

    #[test]
    fn test_command_json() {
        let json = serde_json::to_string(&Command::SetToolMode(ToolMode::DoubleArrow)).unwrap();
        assert_eq!(json, r#"{"command":"setToolMode","mode":"double-arrow"}"#);
        let undo: Command = serde_json::from_str(r#"{"command":"undo"}"#).unwrap();
        assert_eq!(undo, Command::Undo);
    }
}

//! LightDraw Core Library
//!
//! Headless canvas engine for the LightDraw whiteboard: entity model,
//! viewport, pointer interaction, undo history and debounced persistence.

pub mod camera;
pub mod canvas;
pub mod commands;
pub mod config;
pub mod document;
pub mod history;
pub mod input;
pub mod interaction;
pub mod selection;
pub mod session;
pub mod shapes;
pub mod storage;
pub mod tools;

pub use camera::{Viewport, ZoomLimits};
pub use canvas::{Canvas, CanvasChange, Scene};
pub use commands::{Command, Shortcut, ShortcutRegistry};
pub use config::CanvasConfig;
pub use document::CanvasDocument;
pub use history::History;
pub use input::{KeyPress, Modifiers, MouseButton, PointerEvent};
pub use interaction::{Interaction, InteractionKind};
pub use selection::{Handle, HandleKind, ResizeHandle, Selection};
pub use session::Session;
pub use shapes::{Color, Connector, ConnectorKind, EntityId, Group, Shape, ShapeKind};
pub use storage::{AutoSaveManager, MemoryStorage, PersistedCanvas, Storage, StorageError, StorageResult};
pub use tools::ToolMode;

//! Slide editor engine: selection handles, drag, resize, inline text
//! editing, clipboard, undo/redo and save, driven by host input events.
//!
//! The host owns the real surface and forwards pointer, keyboard, toolbar
//! and animation-frame events to [`SlideEditor`]; everything it needs to
//! draw above the slide comes back as an [`OverlayState`].

pub mod clipboard;
pub mod config;
pub mod coords;
pub mod document;
pub mod drag;
pub mod editor;
pub mod handles;
pub mod history;
pub mod hit;
pub mod input;
pub mod persist;
pub mod resize;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod text_edit;
pub mod toolbar;

pub use config::{EditorConfig, ScaleSource};
pub use coords::Point;
pub use editor::{EventOutcome, OverlayState, SlideEditor};
pub use handles::HandleRole;
pub use history::HistoryKind;
pub use input::InputEvent;
pub use persist::SaveSink;
pub use text_edit::FormatCommand;
pub use toolbar::ToolbarCommand;

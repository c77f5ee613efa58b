//! Input abstraction layer.
//!
//! Normalizes host events into a unified `InputEvent` enum. Pointer
//! coordinates are client (viewport) pixels; every event carries the host
//! clock in milliseconds.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    /// Pointer pressed.
    #[serde(rename_all = "camelCase")]
    PointerDown {
        x: f32,
        y: f32,
        pointer_id: i32,
        time_ms: f64,
    },

    /// Pointer moved. Without a running gesture this is hover.
    #[serde(rename_all = "camelCase")]
    PointerMove {
        x: f32,
        y: f32,
        pointer_id: i32,
        time_ms: f64,
    },

    /// Pointer released.
    #[serde(rename_all = "camelCase")]
    PointerUp {
        x: f32,
        y: f32,
        pointer_id: i32,
        time_ms: f64,
    },

    /// The platform took the pointer away.
    #[serde(rename_all = "camelCase")]
    PointerCancel { pointer_id: i32, time_ms: f64 },

    /// Pointer left the canvas.
    PointerLeave,

    /// The editing surface lost focus.
    #[serde(rename_all = "camelCase")]
    Blur { time_ms: f64 },

    /// Keyboard event.
    #[serde(rename_all = "camelCase")]
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        meta: bool,
        #[serde(default)]
        repeat: bool,
        time_ms: f64,
    },

    /// The canvas origin moved in client space (scroll, resize).
    #[serde(rename_all = "camelCase")]
    Scroll { origin_x: f32, origin_y: f32 },

    /// Next animation frame.
    #[serde(rename_all = "camelCase")]
    AnimationFrame { time_ms: f64 },
}

impl InputEvent {
    /// Pointer id of pointer events.
    pub fn pointer_id(&self) -> Option<i32> {
        match self {
            InputEvent::PointerDown { pointer_id, .. }
            | InputEvent::PointerMove { pointer_id, .. }
            | InputEvent::PointerUp { pointer_id, .. }
            | InputEvent::PointerCancel { pointer_id, .. } => Some(*pointer_id),
            _ => None,
        }
    }

    pub fn key(key: &str, time_ms: f64) -> Self {
        InputEvent::Key {
            key: key.to_string(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
            repeat: false,
            time_ms,
        }
    }

    /// ⌘/Ctrl + `key`.
    pub fn command(key: &str, time_ms: f64) -> Self {
        InputEvent::Key {
            key: key.to_string(),
            ctrl: true,
            shift: false,
            alt: false,
            meta: false,
            repeat: false,
            time_ms,
        }
    }
}

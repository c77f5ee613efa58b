//! WASM bridge for the slide editor: exposes `SlideEditor` to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the DOM
//! surface, forwards events here as JSON or plain arguments, and draws the
//! overlay state it gets back.

use slide_core::id::NodeId;
use slide_editor::persist::SaveSink;
use slide_editor::{EditorConfig, EventOutcome, InputEvent, ScaleSource, SlideEditor};
use wasm_bindgen::prelude::*;

/// The JS-facing editor handle.
#[wasm_bindgen]
pub struct SlideCanvas {
    editor: SlideEditor,
}

/// Build an editor from markup and an optional JSON config.
fn build_editor(markup: &str, config_json: Option<&str>) -> Result<SlideEditor, String> {
    let config = match config_json.map(str::trim).filter(|s| !s.is_empty()) {
        Some(json) => EditorConfig::from_json(json).map_err(|e| format!("bad config: {e}"))?,
        None => EditorConfig::default(),
    };
    SlideEditor::new(markup, config).map_err(|e| e.to_string())
}

fn outcome_json(outcome: EventOutcome) -> String {
    serde_json::to_string(&outcome)
        .unwrap_or_else(|_| r#"{"handled":false,"mutated":false}"#.to_string())
}

#[wasm_bindgen]
impl SlideCanvas {
    /// Parse `markup` and build the editor. Malformed markup is an error and
    /// no editor is created.
    #[wasm_bindgen(constructor)]
    pub fn new(markup: &str, config_json: Option<String>) -> Result<SlideCanvas, JsValue> {
        console_setup();
        build_editor(markup, config_json.as_deref())
            .map(|editor| SlideCanvas { editor })
            .map_err(|e| JsValue::from_str(&e))
    }

    // ─── Surface ─────────────────────────────────────────────────────────

    /// The canvas element is mounted with its top-left at this client point.
    pub fn attach(&mut self, origin_x: f32, origin_y: f32) {
        self.editor.attach_surface(origin_x, origin_y);
    }

    pub fn detach(&mut self) {
        self.editor.detach_surface();
    }

    /// Scale source as JSON: `{"mode":"fixed","factor":0.9}` or
    /// `{"mode":"fitWidth","containerWidth":1152}`.
    pub fn set_scale(&mut self, json: &str) -> bool {
        match serde_json::from_str::<ScaleSource>(json) {
            Ok(source) => self.editor.set_scale_source(source),
            Err(e) => {
                log::warn!("bad scale source {json}: {e}");
                false
            }
        }
    }

    pub fn scale(&self) -> f32 {
        self.editor.scale()
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Feed one event as JSON (`{"type":"pointerDown",...}`). Returns
    /// `{"handled":bool,"mutated":bool}`.
    pub fn handle_event(&mut self, json: &str) -> String {
        match serde_json::from_str::<InputEvent>(json) {
            Ok(event) => outcome_json(self.editor.handle_event(event)),
            Err(e) => {
                log::warn!("unreadable event {json}: {e}");
                outcome_json(EventOutcome::IGNORED)
            }
        }
    }

    pub fn handle_pointer_down(&mut self, x: f32, y: f32, pointer_id: i32, time_ms: f64) -> String {
        outcome_json(self.editor.handle_event(InputEvent::PointerDown {
            x,
            y,
            pointer_id,
            time_ms,
        }))
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32, pointer_id: i32, time_ms: f64) -> String {
        outcome_json(self.editor.handle_event(InputEvent::PointerMove {
            x,
            y,
            pointer_id,
            time_ms,
        }))
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32, pointer_id: i32, time_ms: f64) -> String {
        outcome_json(self.editor.handle_event(InputEvent::PointerUp {
            x,
            y,
            pointer_id,
            time_ms,
        }))
    }

    /// Handle a keyboard event. Returns `{"handled":bool,"mutated":bool}`.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        repeat: bool,
        time_ms: f64,
    ) -> String {
        outcome_json(self.editor.handle_event(InputEvent::Key {
            key: key.to_string(),
            ctrl,
            shift,
            alt,
            meta,
            repeat,
            time_ms,
        }))
    }

    /// Returns `true` when a deferred re-measure ran.
    pub fn animation_frame(&mut self, time_ms: f64) -> bool {
        self.editor
            .handle_event(InputEvent::AnimationFrame { time_ms })
            .mutated
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Run a toolbar command by name (`bold`, `fontSize`, `insertLink`, ...).
    pub fn toolbar(&mut self, name: &str, value: Option<String>, time_ms: f64) -> bool {
        self.editor.toolbar(name, value.as_deref(), time_ms)
    }

    /// The pointer left the toolbar.
    pub fn release_toolbar(&mut self) {
        self.editor.release_busy();
    }

    /// Content of the editing node changed in the page.
    pub fn set_text(&mut self, node_id: &str, content: &str, time_ms: f64) -> bool {
        self.editor
            .set_text(NodeId::intern(node_id), content, time_ms)
    }

    pub fn undo(&mut self, time_ms: f64) -> bool {
        self.editor.undo(time_ms, false)
    }

    pub fn redo(&mut self, time_ms: f64) -> bool {
        self.editor.redo(time_ms, false)
    }

    pub fn select_by_id(&mut self, node_id: &str) -> bool {
        self.editor.select(NodeId::intern(node_id))
    }

    pub fn deselect(&mut self) -> bool {
        self.editor.deselect()
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Overlay state as JSON: handles, ghost, hover and editing outline.
    pub fn overlay(&self) -> String {
        serde_json::to_string(&self.editor.overlay()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Current markup including editor state.
    pub fn markup(&self) -> String {
        self.editor.markup()
    }

    pub fn cleaned_markup(&self) -> String {
        self.editor.cleaned_markup()
    }

    /// Selected node id, or empty.
    pub fn get_selected_id(&self) -> String {
        self.editor
            .selected()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Editing node id, or empty.
    pub fn get_editing_id(&self) -> String {
        self.editor
            .editing()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Border box of a node as `{"x","y","width","height"}`, or `null`.
    pub fn get_node_bounds(&self, node_id: &str) -> String {
        match self.editor.bounds_of(NodeId::intern(node_id)) {
            Some(b) => serde_json::to_string(&b).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    pub fn is_closed(&self) -> bool {
        self.editor.is_closed()
    }

    // ─── Save ────────────────────────────────────────────────────────────

    /// Clean the slide, hand the markup to `callback` and close the editor.
    /// Returns the markup, or `undefined` when already closed.
    pub fn save(&mut self, callback: &js_sys::Function) -> Option<String> {
        let mut sink = JsSink(callback);
        self.editor.save(&mut sink)
    }
}

/// Forwards saved markup to a JS callback.
struct JsSink<'a>(&'a js_sys::Function);

impl SaveSink for JsSink<'_> {
    fn save(&mut self, markup: &str) {
        if let Err(e) = self.0.call1(&JsValue::NULL, &JsValue::from_str(markup)) {
            log::error!("save callback threw: {e:?}");
        }
    }
}

// ─── Console ─────────────────────────────────────────────────────────────

/// Route panics and `log` records to the browser console. Only once.
fn console_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("slide WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&CONSOLE_LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Info);
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            _ => web_sys::console::log_1(&msg),
        }
    }

    fn flush(&self) {}
}

// ─── Standalone validation (no editor needed) ────────────────────────────

/// Validate slide markup. Returns JSON: `{"ok":true}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(markup: &str) -> String {
    let result = match slide_core::parse_slide(markup) {
        Ok(_) => serde_json::json!({ "ok": true }),
        Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }),
    };
    result.to_string()
}

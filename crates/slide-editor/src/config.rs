//! Editor configuration.
//!
//! Every tunable the interaction engines read lives here. The host may pass
//! a JSON object; missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use slide_core::{CANVAS_HEIGHT, CANVAS_WIDTH};

/// Where the display scale comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ScaleSource {
    /// A fixed factor, e.g. the 0.9 preview scale.
    Fixed { factor: f32 },
    /// Fit the canvas into a container of the given width.
    FitWidth {
        #[serde(rename = "containerWidth")]
        container_width: f32,
    },
}

impl Default for ScaleSource {
    fn default() -> Self {
        ScaleSource::Fixed { factor: 0.9 }
    }
}

impl ScaleSource {
    /// Resolve to a factor for a canvas of `canvas_width` pixels. Returns
    /// `None` for degenerate inputs.
    pub fn scale(&self, canvas_width: f32) -> Option<f32> {
        let s = match *self {
            ScaleSource::Fixed { factor } => factor,
            ScaleSource::FitWidth { container_width } => container_width / canvas_width,
        };
        (s.is_finite() && s > 0.0).then_some(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub scale: ScaleSource,

    /// Floor for width and height after any editor resize.
    pub min_size: f32,
    /// Edge length of a resize handle.
    pub resize_handle_size: f32,
    /// Edge length of the move handle.
    pub move_handle_size: f32,
    /// Distance from the box top to the move handle center.
    pub move_handle_inset: f32,

    /// Offset applied to duplicated absolute nodes.
    pub duplicate_offset: f32,
    /// Offset from the anchor for pasted nodes.
    pub paste_offset: f32,

    pub history_depth: usize,
    /// A copy this soon after the previous one is ignored.
    pub copy_debounce_ms: f64,
    /// Undo/redo invocations this soon after a step are ignored.
    pub history_lock_ms: f64,
    /// The toolbar busy flag releases itself after this long.
    pub busy_release_ms: f64,

    /// Width of a text box created from the toolbar.
    pub text_box_width: f32,
    pub text_box_min_height: f32,
    pub text_box_font_size: f32,
    /// Size of an image inserted from the toolbar.
    pub image_insert_size: (f32, f32),
    /// Stacking order for inserted nodes, and the base a duplicate without
    /// its own z-index is bumped from.
    pub insert_z_index: i32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            scale: ScaleSource::default(),
            min_size: 20.0,
            resize_handle_size: 10.0,
            move_handle_size: 12.0,
            move_handle_inset: 16.0,
            duplicate_offset: 20.0,
            paste_offset: 20.0,
            history_depth: 50,
            copy_debounce_ms: 300.0,
            history_lock_ms: 150.0,
            busy_release_ms: 1500.0,
            text_box_width: 600.0,
            text_box_min_height: 96.0,
            text_box_font_size: 28.0,
            image_insert_size: (360.0, 240.0),
            insert_z_index: 1000,
        }
    }
}

impl EditorConfig {
    /// Read a configuration from JSON. Unknown fields are ignored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_preview_scale() {
        let cfg = EditorConfig::default();
        assert_eq!(cfg.scale.scale(cfg.canvas_width), Some(0.9));
        assert_eq!(cfg.history_depth, 50);
        assert_eq!(cfg.min_size, 20.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = EditorConfig::from_json(
            r#"{"scale":{"mode":"fitWidth","containerWidth":640},"historyDepth":5}"#,
        )
        .unwrap();
        assert_eq!(cfg.scale.scale(1280.0), Some(0.5));
        assert_eq!(cfg.history_depth, 5);
        assert_eq!(cfg.copy_debounce_ms, 300.0);
    }

    #[test]
    fn degenerate_scale_is_rejected() {
        assert_eq!(ScaleSource::Fixed { factor: 0.0 }.scale(1280.0), None);
        assert_eq!(
            ScaleSource::FitWidth {
                container_width: f32::NAN
            }
            .scale(1280.0),
            None
        );
    }
}

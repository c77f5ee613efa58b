//! Inline text editing.
//!
//! Entering edit mode pins the node's box to its rendered pixels so typing
//! cannot reflow the slide, and records the box model it replaced. Leaving
//! puts that box model back. Both transitions are pure functions over node
//! data; the editor decides where the record lives.

use slide_core::{
    BoxSizing, Bounds, Edges, FontStyle, NodeId, RestoreRecord, SizeLockRecord, SlideNode,
    TextAlign,
};

/// Lock `node` for editing at its rendered box.
pub fn enter_edit(node: &SlideNode, rendered: &Bounds) -> (SlideNode, RestoreRecord) {
    let record = RestoreRecord {
        box_model: node.box_model.clone(),
        size: node.size,
    };
    let mut editing = node.clone();
    editing.size.lock(rendered.width, rendered.height);
    editing.box_model.box_sizing = Some(BoxSizing::BorderBox);
    editing.box_model.overflow = Some("hidden".into());
    editing.box_model.white_space = Some("pre-wrap".into());
    editing.editable = true;
    (editing, record)
}

/// Put back the box model from `record`. Style, content and position are
/// left as they are.
pub fn exit_edit(node: &SlideNode, record: &RestoreRecord) -> SlideNode {
    let mut done = node.clone();
    done.box_model = record.box_model.clone();
    done.size = record.size;
    done.editable = false;
    done.restore = None;
    done
}

/// Fold the node's current pixel lock into its restore record so leaving
/// edit mode keeps the new size. Outside edit mode this is a no-op.
pub fn adopt_locked_size(node: &mut SlideNode) -> bool {
    let Some(record) = node.restore.as_mut() else {
        return false;
    };
    if node.size_lock.is_none() {
        node.size_lock = Some(SizeLockRecord {
            box_sizing: record.box_model.box_sizing,
            overflow: record.box_model.overflow.clone(),
            white_space: record.box_model.white_space.clone(),
        });
    }
    record.box_model.box_sizing = Some(BoxSizing::BorderBox);
    record.size = node.size;
    true
}

/// Drop the node's margin once it has been placed at absolute pixels. A
/// node in edit mode drops it from its restore record too, so leaving edit
/// mode does not shift it again.
pub fn clear_margin(node: &mut SlideNode) {
    node.box_model.margin = Edges::ZERO;
    if let Some(record) = node.restore.as_mut() {
        record.box_model.margin = Edges::ZERO;
    }
}

/// Pin a node to a pixel box, editing or not.
pub fn pin_size(node: &mut SlideNode, width: f32, height: f32) {
    if node.restore.is_some() {
        node.size.lock(width, height);
        adopt_locked_size(node);
    } else {
        node.lock_size(width, height);
    }
}

// ─── Formatting ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Align(TextAlign),
    FontSize(f32),
    FontFamily(String),
    TextColor(String),
    BackgroundColor(String),
}

/// Follow-up layout work a format change needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatEffect {
    None,
    /// Measure now and pin the height to the new content.
    RelockHeight,
    /// Height was released; measure on the next animation frame.
    RemeasureNextFrame,
}

pub fn apply_format(node: &mut SlideNode, cmd: &FormatCommand) -> FormatEffect {
    let style = &mut node.style;
    match cmd {
        FormatCommand::Bold => {
            style.font_weight = Some(if style.is_bold() { 400 } else { 700 });
            FormatEffect::RelockHeight
        }
        FormatCommand::Italic => {
            style.font_style = Some(if style.is_italic() {
                FontStyle::Normal
            } else {
                FontStyle::Italic
            });
            FormatEffect::RelockHeight
        }
        FormatCommand::Underline => {
            style.decoration.underline = !style.decoration.underline;
            FormatEffect::None
        }
        FormatCommand::Strikethrough => {
            style.decoration.line_through = !style.decoration.line_through;
            FormatEffect::None
        }
        FormatCommand::Align(a) => {
            style.text_align = Some(*a);
            FormatEffect::None
        }
        FormatCommand::FontSize(px) => {
            style.font_size = Some(*px);
            node.size.release_height();
            if node.editable {
                node.box_model.overflow = None;
            }
            FormatEffect::RemeasureNextFrame
        }
        FormatCommand::FontFamily(f) => {
            style.font_family = Some(f.clone());
            FormatEffect::None
        }
        FormatCommand::TextColor(c) => {
            style.color = Some(c.clone());
            FormatEffect::None
        }
        FormatCommand::BackgroundColor(c) => {
            style.background = Some(c.clone());
            FormatEffect::None
        }
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

/// The node currently in edit mode.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub node: NodeId,
    /// Character offset of the caret in the node's plain text.
    pub caret: usize,
    /// An `edit` history entry was pushed for typed changes.
    pub text_recorded: bool,
}

impl EditSession {
    pub fn new(node: NodeId, caret: usize) -> Self {
        Self {
            node,
            caret,
            text_recorded: false,
        }
    }
}

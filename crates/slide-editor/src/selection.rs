//! Single selection and its handle set.

use crate::config::EditorConfig;
use crate::handles::HandleSet;
use slide_core::{Bounds, NodeId};

#[derive(Debug, Default)]
pub struct Selection {
    node: Option<NodeId>,
    handles: Option<HandleSet>,
    hover: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection. The previous handle set is dropped before the
    /// new one is built.
    pub fn select(&mut self, id: NodeId, rendered: Bounds, cfg: &EditorConfig) {
        self.handles = None;
        self.node = Some(id);
        self.handles = Some(HandleSet::anchored_to(rendered, cfg));
        log::trace!("selected {id}");
    }

    pub fn deselect(&mut self) -> Option<NodeId> {
        self.handles = None;
        self.node.take()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.node
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.node == Some(id)
    }

    pub fn handles(&self) -> Option<&HandleSet> {
        self.handles.as_ref()
    }

    /// Re-anchor the handles to `target`. Without a selection nothing
    /// happens.
    pub fn refresh(&mut self, target: Bounds, cfg: &EditorConfig) -> bool {
        if self.node.is_none() {
            return false;
        }
        self.handles = Some(HandleSet::anchored_to(target, cfg));
        true
    }

    /// Drop the handle set but keep the selected id (the node vanished
    /// from layout for this frame).
    pub fn hide_handles(&mut self) {
        self.handles = None;
    }

    pub fn hover(&self) -> Option<NodeId> {
        self.hover
    }

    pub fn set_hover(&mut self, id: Option<NodeId>) {
        self.hover = id;
    }
}

//! Capability classification.
//!
//! What the editor may do with a node depends only on the node itself, so
//! the answer is computed once and cached until the node changes.

use crate::id::NodeId;
use crate::model::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub movable: bool,
    pub resizable: bool,
    pub text_editable: bool,
    pub aspect_locked: bool,
}

impl Capabilities {
    /// Nodes that can carry the selection.
    pub fn selectable(&self) -> bool {
        self.movable || self.resizable
    }
}

pub fn classify(node: &SlideNode) -> Capabilities {
    match &node.kind {
        NodeKind::Root
        | NodeKind::Raw { .. }
        | NodeKind::Placeholder
        | NodeKind::Overlay(_) => Capabilities::default(),
        // Bare text runs have no box of their own to move.
        NodeKind::Text { .. } if node.tag == TEXT_RUN_TAG => Capabilities::default(),
        NodeKind::Text { .. } => Capabilities {
            movable: true,
            resizable: true,
            text_editable: true,
            aspect_locked: node.aspect_locked,
        },
        NodeKind::Image { .. } | NodeKind::Vector { .. } | NodeKind::Shape => Capabilities {
            movable: true,
            resizable: true,
            text_editable: false,
            aspect_locked: node.aspect_locked,
        },
    }
}

/// Per-tree cache of `classify` results.
#[derive(Debug, Default)]
pub struct CapabilityCache {
    entries: HashMap<NodeId, Capabilities>,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, node: &SlideNode) -> Capabilities {
        *self
            .entries
            .entry(node.id)
            .or_insert_with(|| classify(node))
    }

    /// Forget one node after it was mutated.
    pub fn invalidate(&mut self, id: NodeId) {
        self.entries.remove(&id);
    }

    /// Forget everything after the tree was replaced.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Single-slot clipboard and subtree cloning.
//!
//! A copied subtree is stored as MessagePack bytes, so a paste always
//! materializes new node values and never aliases the live tree.

use crate::session::SessionContext;
use serde::{Deserialize, Serialize};
use slide_core::transient::apply_restore;
use slide_core::{Bounds, NodeIndex, SlideNode, SlideTree};

/// A node with its descendants, detached from any tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipNode {
    pub node: SlideNode,
    pub children: Vec<ClipNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub root: ClipNode,
    /// Rendered border box of the source at copy time.
    pub rendered: Bounds,
}

/// Snapshot the subtree at `idx`.
pub fn capture(tree: &SlideTree, idx: NodeIndex) -> ClipNode {
    ClipNode {
        node: tree.graph[idx].clone(),
        children: tree
            .children(idx)
            .into_iter()
            .filter(|&c| !tree.graph[c].is_transient())
            .map(|c| capture(tree, c))
            .collect(),
    }
}

/// Where a materialized subtree goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Last (topmost) child of a parent.
    Append(NodeIndex),
    /// Directly after a sibling in document order.
    After(NodeIndex),
}

/// Insert a copy of `clip` with fresh ids. Edit-mode state is not carried
/// over. Returns the index of the new subtree root.
pub fn instantiate(
    tree: &mut SlideTree,
    ctx: &mut SessionContext,
    clip: &ClipNode,
    place: Placement,
) -> Option<NodeIndex> {
    let mut node = clip.node.clone();
    node.id = ctx.copy_id(tree, node.id);
    node.editable = false;
    if let Some(record) = node.restore.take() {
        apply_restore(&mut node, &record);
    }

    let idx = match place {
        Placement::Append(parent) => tree.add_node(parent, node),
        Placement::After(sibling) => tree.insert_after(sibling, node)?,
    };
    for child in &clip.children {
        instantiate(tree, ctx, child, Placement::Append(idx))?;
    }
    Some(idx)
}

#[derive(Debug)]
pub struct Clipboard {
    slot: Option<Vec<u8>>,
    last_copy: Option<f64>,
    debounce_ms: f64,
}

impl Clipboard {
    pub fn new(debounce_ms: f64) -> Self {
        Self {
            slot: None,
            last_copy: None,
            debounce_ms,
        }
    }

    /// Overwrite the slot. A copy within the debounce window of the
    /// previous one is ignored.
    pub fn copy(&mut self, root: ClipNode, rendered: Bounds, now: f64) -> bool {
        if self
            .last_copy
            .is_some_and(|last| now - last < self.debounce_ms)
        {
            log::trace!("copy debounced");
            return false;
        }
        let payload = ClipboardPayload { root, rendered };
        match rmp_serde::to_vec_named(&payload) {
            Ok(bytes) => {
                self.slot = Some(bytes);
                self.last_copy = Some(now);
                true
            }
            Err(e) => {
                log::warn!("clipboard encode failed: {e}");
                false
            }
        }
    }

    /// Decode the slot. The slot itself is left in place.
    pub fn read(&self) -> Option<ClipboardPayload> {
        let bytes = self.slot.as_ref()?;
        rmp_serde::from_slice(bytes)
            .map_err(|e| log::warn!("clipboard decode failed: {e}"))
            .ok()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

//! Hit testing: point → node lookup.
//!
//! Reverse-walks the tree front-to-back to find which node is at a canvas
//! position. Siblings paint in document order, reordered by `z-index`.

use slide_core::{Bounds, NodeId, NodeIndex, NodeKind, SlideTree};
use std::collections::HashMap;

/// Children of `idx` in paint order (back to front).
pub fn paint_sorted_children(tree: &SlideTree, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut children = tree.children(idx);
    children.sort_by_key(|&c| tree.graph[c].style.z_index.unwrap_or(0));
    children
}

/// Find the topmost visible node at `(px, py)`. Returns `None` on the bare
/// canvas.
pub fn hit_test(
    tree: &SlideTree,
    bounds: &HashMap<NodeIndex, Bounds>,
    px: f32,
    py: f32,
) -> Option<NodeId> {
    hit_test_node(tree, tree.root, bounds, px, py)
}

fn hit_test_node(
    tree: &SlideTree,
    idx: NodeIndex,
    bounds: &HashMap<NodeIndex, Bounds>,
    px: f32,
    py: f32,
) -> Option<NodeId> {
    let node = &tree.graph[idx];
    if node.is_transient() || node.style.hidden || matches!(node.kind, NodeKind::Raw { .. }) {
        return None;
    }

    for child in paint_sorted_children(tree, idx).into_iter().rev() {
        if let Some(hit) = hit_test_node(tree, child, bounds, px, py) {
            return Some(hit);
        }
    }

    if matches!(node.kind, NodeKind::Root) {
        return None;
    }
    bounds
        .get(&idx)
        .filter(|b| b.contains(px, py))
        .map(|_| node.id)
}

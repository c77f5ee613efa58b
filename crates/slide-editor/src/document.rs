//! The live slide document.
//!
//! Holds the authoritative tree and its resolved layout. Every interaction
//! engine writes through `apply`, which re-resolves layout afterwards so
//! `bounds_of` always answers for the current tree.

use slide_core::layout::content_box;
use slide_core::metrics::plain_text;
use slide_core::{
    Bounds, BoxSizing, Capabilities, CapabilityCache, NodeId, NodeIndex, NodeKind,
    ParseError, Positioning, SlideNode, SlideTree, Style, TextMetrics, effective_style, emit_markup,
    parse_slide, resolve_layout, settle_snapshot,
};
use smallvec::smallvec;
use std::collections::HashMap;

use crate::text_edit::{clear_margin, pin_size};

/// Class given to flow-slot stand-ins so stray ones are recognized on load.
pub const PLACEHOLDER_CLASS: &str = "drag-placeholder";

/// Write inherited text properties onto a node's own style so it renders
/// the same outside its current ancestors.
pub fn materialize_inherited(own: &mut Style, inherited: Style) {
    own.font_family = own.font_family.take().or(inherited.font_family);
    own.font_size = own.font_size.or(inherited.font_size);
    own.font_weight = own.font_weight.or(inherited.font_weight);
    own.font_style = own.font_style.or(inherited.font_style);
    own.line_height = own.line_height.take().or(inherited.line_height);
    own.text_align = own.text_align.or(inherited.text_align);
}

/// A primitive edit of the slide tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideMutation {
    /// Place a node's border box at canvas `(left, top)`. Margin is folded
    /// into the position.
    MoveTo { id: NodeId, left: f32, top: f32 },
    /// Write a resized box: position plus pinned width, and pinned height
    /// unless the height follows content.
    SetBox {
        id: NodeId,
        bounds: Bounds,
        lock_height: bool,
    },
    /// Lift a flow node out to absolute positioning at its current box,
    /// leaving a same-size placeholder in its flow slot.
    Promote { id: NodeId, placeholder: NodeId },
    /// Move an absolute node up to the canvas root, keeping the inherited
    /// text style it renders with.
    Hoist { id: NodeId },
    /// Pin the height to what the content measures now.
    RelockHeight { id: NodeId },
    /// Swap in new node data, keeping the node's place in the tree.
    Replace { node: Box<SlideNode> },
    SetContent { id: NodeId, content: String },
    Remove { id: NodeId },
}

pub struct SlideDocument {
    pub tree: SlideTree,
    /// Resolved border boxes (recomputed after every mutation).
    pub bounds: HashMap<NodeIndex, Bounds>,
    metrics: Box<dyn TextMetrics>,
    capabilities: CapabilityCache,
}

impl SlideDocument {
    pub fn from_markup(markup: &str, metrics: Box<dyn TextMetrics>) -> Result<Self, ParseError> {
        let tree = parse_slide(markup)?;
        let bounds = resolve_layout(&tree, metrics.as_ref());
        Ok(Self {
            tree,
            bounds,
            metrics,
            capabilities: CapabilityCache::new(),
        })
    }

    pub fn markup(&self) -> String {
        emit_markup(&self.tree)
    }

    /// Replace the whole tree with a snapshot. Overlays serialized by
    /// accident are dropped and nodes caught mid-edit are settled.
    pub fn restore(&mut self, snapshot: &str) -> Result<(), ParseError> {
        let mut tree = parse_slide(snapshot)?;
        let stray = settle_snapshot(&mut tree);
        if stray > 0 {
            log::warn!("dropped {stray} overlay node(s) from snapshot");
        }
        self.tree = tree;
        self.capabilities.clear();
        self.relayout();
        Ok(())
    }

    pub fn relayout(&mut self) {
        self.bounds = resolve_layout(&self.tree, self.metrics.as_ref());
    }

    pub fn metrics(&self) -> &dyn TextMetrics {
        self.metrics.as_ref()
    }

    pub fn node(&self, id: NodeId) -> Option<&SlideNode> {
        self.tree.get_by_id(id)
    }

    /// Mutable access outside `apply`; the caller relayouts when done.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SlideNode> {
        self.capabilities.invalidate(id);
        self.tree.get_by_id_mut(id)
    }

    pub fn bounds_of(&self, id: NodeId) -> Option<Bounds> {
        let idx = self.tree.index_of(id)?;
        self.bounds.get(&idx).copied()
    }

    pub fn capabilities(&mut self, id: NodeId) -> Option<Capabilities> {
        let node = self.tree.get_by_id(id)?;
        Some(self.capabilities.get(node))
    }

    /// Caret offset in the node's plain text for a canvas point.
    pub fn caret_at(&self, id: NodeId, x: f32, y: f32) -> usize {
        let Some(idx) = self.tree.index_of(id) else {
            return 0;
        };
        let node = &self.tree.graph[idx];
        let NodeKind::Text { content } = &node.kind else {
            return 0;
        };
        let Some(b) = self.bounds.get(&idx) else {
            return 0;
        };
        let cb = content_box(node, b);
        let style = effective_style(&self.tree, idx);
        self.metrics
            .caret_offset(content, &style, cb.width, x - cb.x, y - cb.y)
    }

    /// Plain-text length of a text node.
    pub fn text_len(&self, id: NodeId) -> usize {
        match self.node(id).map(|n| &n.kind) {
            Some(NodeKind::Text { content }) => plain_text(content).chars().count(),
            _ => 0,
        }
    }

    /// Apply a mutation and re-resolve layout. Returns `false` when the
    /// target is missing or the mutation does not apply.
    pub fn apply(&mut self, mutation: SlideMutation) -> bool {
        let applied = self.apply_inner(mutation);
        if applied {
            self.relayout();
        }
        applied
    }

    fn apply_inner(&mut self, mutation: SlideMutation) -> bool {
        match mutation {
            SlideMutation::MoveTo { id, left, top } => {
                let Some(node) = self.node_mut(id) else {
                    return false;
                };
                node.position = Positioning::Absolute { left, top };
                clear_margin(node);
                true
            }
            SlideMutation::SetBox {
                id,
                bounds,
                lock_height,
            } => {
                let Some(node) = self.node_mut(id) else {
                    return false;
                };
                node.position = Positioning::Absolute {
                    left: bounds.x,
                    top: bounds.y,
                };
                clear_margin(node);
                pin_size(node, bounds.width, bounds.height);
                if !lock_height {
                    node.size.release_height();
                }
                true
            }
            SlideMutation::Promote { id, placeholder } => self.promote(id, placeholder),
            SlideMutation::Hoist { id } => self.hoist(id),
            SlideMutation::RelockHeight { id } => {
                let Some(node) = self.node_mut(id) else {
                    return false;
                };
                node.size.release_height();
                self.relayout();
                let Some(b) = self.bounds_of(id) else {
                    return false;
                };
                let Some(node) = self.node_mut(id) else {
                    return false;
                };
                pin_size(node, b.width, b.height);
                true
            }
            SlideMutation::Replace { node } => {
                let id = node.id;
                let Some(slot) = self.node_mut(id) else {
                    return false;
                };
                *slot = *node;
                true
            }
            SlideMutation::SetContent { id, content } => {
                let Some(node) = self.node_mut(id) else {
                    return false;
                };
                match &mut node.kind {
                    NodeKind::Text { content: c } => {
                        *c = content;
                        true
                    }
                    _ => false,
                }
            }
            SlideMutation::Remove { id } => {
                let Some(idx) = self.tree.index_of(id) else {
                    return false;
                };
                self.capabilities.invalidate(id);
                self.tree.remove_node(idx).is_some()
            }
        }
    }

    fn promote(&mut self, id: NodeId, placeholder: NodeId) -> bool {
        let Some(idx) = self.tree.index_of(id) else {
            return false;
        };
        let Some(b) = self.bounds.get(&idx).copied() else {
            log::debug!("{id} has no box to promote from");
            return false;
        };
        let node = &self.tree.graph[idx];
        if node.position.is_absolute() {
            return false;
        }

        let mut stand_in = SlideNode::new(placeholder, NodeKind::Placeholder, "div");
        stand_in.attrs = smallvec![("class".to_string(), PLACEHOLDER_CLASS.to_string())];
        stand_in.box_model.margin = node.box_model.margin;
        stand_in.box_model.box_sizing = Some(BoxSizing::BorderBox);
        stand_in.size.lock(b.width, b.height);
        stand_in.style.hidden = true;
        let text_like = matches!(node.kind, NodeKind::Text { .. });
        if self.tree.insert_before(idx, stand_in).is_none() {
            return false;
        }

        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.position = Positioning::Absolute { left: b.x, top: b.y };
        clear_margin(node);
        pin_size(node, b.width, b.height);
        if text_like && node.restore.is_none() {
            node.size.release_height();
        }
        log::debug!("promoted {id} to absolute at ({}, {})", b.x, b.y);
        true
    }

    fn hoist(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.tree.index_of(id) else {
            return false;
        };
        let root = self.tree.root;
        if self.tree.parent(idx) == Some(root) {
            return false;
        }
        let inherited = effective_style(&self.tree, idx);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        materialize_inherited(&mut node.style, inherited);
        self.tree.reparent_node(idx, root);
        true
    }
}

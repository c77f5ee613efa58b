//! Core data model for a single slide.
//!
//! The slide is a tree rooted at the canvas: a fixed 1280×720 coordinate
//! space. Children are stored in a `StableDiGraph` (parent → child edges)
//! with an explicit per-parent child order, which doubles as z-order:
//! later siblings paint above earlier ones.
//!
//! Nodes either flow inside their parent (document order, stacked
//! vertically) or are absolutely positioned with `left`/`top` in canvas
//! pixels. Resolved bounds are border boxes; declared sizes follow the
//! node's `box-sizing`.

use crate::id::NodeId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Logical canvas width in pixels.
pub const CANVAS_WIDTH: f32 = 1280.0;
/// Logical canvas height in pixels.
pub const CANVAS_HEIGHT: f32 = 720.0;

// ─── Box model ───────────────────────────────────────────────────────────

/// Four-sided pixel lengths (margin, padding).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const ZERO: Edges = Edges {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxSizing {
    ContentBox,
    BorderBox,
}

/// Box-model properties that editing temporarily overrides and later restores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxModel {
    pub margin: Edges,
    pub padding: Edges,
    /// Raw `border` shorthand, kept verbatim.
    pub border: Option<String>,
    pub box_sizing: Option<BoxSizing>,
    pub overflow: Option<String>,
    pub white_space: Option<String>,
}

/// Explicit size declarations. `None` means `auto` (or unconstrained for
/// min/max). Setting a value together with its min and max locks the axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeSpec {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub min_width: Option<f32>,
    pub min_height: Option<f32>,
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
}

impl SizeSpec {
    pub fn lock_width(&mut self, w: f32) {
        self.width = Some(w);
        self.min_width = Some(w);
        self.max_width = Some(w);
    }

    pub fn lock_height(&mut self, h: f32) {
        self.height = Some(h);
        self.min_height = Some(h);
        self.max_height = Some(h);
    }

    pub fn lock(&mut self, w: f32, h: f32) {
        self.lock_width(w);
        self.lock_height(h);
    }

    /// Let the height follow content again.
    pub fn release_height(&mut self) {
        self.height = None;
        self.min_height = None;
        self.max_height = None;
    }

    pub fn is_height_locked(&self) -> bool {
        self.height.is_some() && self.height == self.min_height && self.height == self.max_height
    }
}

/// How a node is placed inside its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Positioning {
    /// Laid out in document order inside the parent's content box.
    #[default]
    Flow,
    /// Canvas-space coordinates of the margin box's top-left corner.
    Absolute { left: f32, top: f32 },
}

impl Positioning {
    pub fn is_absolute(&self) -> bool {
        matches!(self, Positioning::Absolute { .. })
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectFit {
    Fill,
    Contain,
    Cover,
    None,
    ScaleDown,
}

impl ObjectFit {
    pub fn as_css(&self) -> &'static str {
        match self {
            ObjectFit::Fill => "fill",
            ObjectFit::Contain => "contain",
            ObjectFit::Cover => "cover",
            ObjectFit::None => "none",
            ObjectFit::ScaleDown => "scale-down",
        }
    }
}

/// `text-decoration` lines. Both may be set at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextDecoration {
    pub underline: bool,
    pub line_through: bool,
}

/// Visual style of a node. Declarations the editor does not understand are
/// kept in `extra`, in source order, and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    /// CSS numeric weight; 400 = normal, 700 = bold.
    pub font_weight: Option<u16>,
    pub font_style: Option<FontStyle>,
    pub line_height: Option<String>,
    pub color: Option<String>,
    pub background: Option<String>,
    pub decoration: TextDecoration,
    pub text_align: Option<TextAlign>,
    pub object_fit: Option<ObjectFit>,
    pub object_position: Option<String>,
    pub z_index: Option<i32>,
    pub outline: Option<String>,
    /// `visibility: hidden`; still occupies layout space.
    pub hidden: bool,
    pub extra: SmallVec<[(String, String); 4]>,
}

impl Style {
    pub fn is_bold(&self) -> bool {
        self.font_weight.is_some_and(|w| w >= 600)
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == Some(FontStyle::Italic)
    }

    /// Effective font size, defaulting to the 16 px browser default.
    pub fn font_size_or_default(&self) -> f32 {
        self.font_size.unwrap_or(16.0)
    }
}

// ─── Editor bookkeeping records ──────────────────────────────────────────

/// Box-model state captured when a node enters inline text editing, so the
/// exact properties can be put back on exit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RestoreRecord {
    pub box_model: BoxModel,
    pub size: SizeSpec,
}

/// Flow-related properties recorded the first time a node is pinned to its
/// rendered pixel size. Save puts these back while keeping the new size.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeLockRecord {
    pub box_sizing: Option<BoxSizing>,
    pub overflow: Option<String>,
    pub white_space: Option<String>,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Editor overlay roles that can leak into markup if a tree was serialized
/// mid-interaction. They are never part of a clean slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayRole {
    MoveHandle,
    ResizeHandle,
    Ghost,
    TextInput,
}

/// Tag used for bare text runs sitting between elements of a container.
pub const TEXT_RUN_TAG: &str = "#text";

/// The node kinds of the slide tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The canvas itself.
    Root,

    /// Text-bearing element whose content is direct text (plus inline
    /// formatting). `content` is the inner markup, already escaped.
    Text { content: String },

    /// Raster image.
    Image { src: String },

    /// Box / container; may hold child nodes.
    Shape,

    /// Inline vector graphic. `source` is the raw inner markup of the `<svg>`.
    Vector { source: String },

    /// Non-visual raw-text element (`<style>`, `<script>`), kept verbatim.
    Raw { source: String },

    /// Invisible stand-in holding a flow slot for a node that was lifted to
    /// absolute positioning.
    Placeholder,

    /// Serialized editor overlay (handle, ghost).
    Overlay(OverlayRole),
}

/// A single node of the slide tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Element tag name (`div`, `h1`, `img`, ...).
    pub tag: String,
    /// Attributes the editor does not interpret, in source order.
    pub attrs: SmallVec<[(String, String); 2]>,
    pub style: Style,
    pub box_model: BoxModel,
    pub position: Positioning,
    pub size: SizeSpec,
    /// Corner resizes preserve the width/height ratio (uploaded images).
    pub aspect_locked: bool,
    /// Currently accepting typed input.
    pub editable: bool,
    pub restore: Option<RestoreRecord>,
    pub size_lock: Option<SizeLockRecord>,
}

impl SlideNode {
    pub fn new(id: NodeId, kind: NodeKind, tag: &str) -> Self {
        Self {
            id,
            kind,
            tag: tag.to_string(),
            attrs: SmallVec::new(),
            style: Style::default(),
            box_model: BoxModel::default(),
            position: Positioning::Flow,
            size: SizeSpec::default(),
            aspect_locked: false,
            editable: false,
            restore: None,
            size_lock: None,
        }
    }

    /// Look up a pass-through attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    /// True for nodes that must never reach saved output.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, NodeKind::Placeholder | NodeKind::Overlay(_))
    }

    /// Pin the node's border box to a pixel size, recording flow properties
    /// the first time.
    pub fn lock_size(&mut self, width: f32, height: f32) {
        if self.size_lock.is_none() {
            self.size_lock = Some(SizeLockRecord {
                box_sizing: self.box_model.box_sizing,
                overflow: self.box_model.overflow.clone(),
                white_space: self.box_model.white_space.clone(),
            });
        }
        self.box_model.box_sizing = Some(BoxSizing::BorderBox);
        self.size.lock(width, height);
    }
}

// ─── Slide tree ──────────────────────────────────────────────────────────

/// The complete slide: a tree of `SlideNode` values under the canvas root.
#[derive(Debug, Clone)]
pub struct SlideTree {
    /// The underlying directed graph (parent → child edges).
    pub graph: StableDiGraph<SlideNode, ()>,

    /// The canvas root index.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    /// Child order per parent (document order, back to front).
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl SlideTree {
    /// Create an empty slide containing only the canvas root.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = NodeId::intern("root");
        let root = graph.add_node(SlideNode::new(root_id, NodeKind::Root, "body"));

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
        }
    }

    /// Append a node as the last (topmost) child of `parent`.
    pub fn add_node(&mut self, parent: NodeIndex, node: SlideNode) -> NodeIndex {
        let len = self.child_order.get(&parent).map_or(0, Vec::len);
        self.insert_child(parent, len, node)
    }

    /// Insert a node at `position` among the children of `parent`.
    pub fn insert_child(&mut self, parent: NodeIndex, position: usize, node: SlideNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        let order = self.child_order.entry(parent).or_default();
        let position = position.min(order.len());
        order.insert(position, idx);
        idx
    }

    /// Insert a node directly after `sibling` in document order.
    pub fn insert_after(&mut self, sibling: NodeIndex, node: SlideNode) -> Option<NodeIndex> {
        let parent = self.parent(sibling)?;
        let pos = self.position_in_parent(sibling)?;
        Some(self.insert_child(parent, pos + 1, node))
    }

    /// Insert a node directly before `sibling` in document order.
    pub fn insert_before(&mut self, sibling: NodeIndex, node: SlideNode) -> Option<NodeIndex> {
        let parent = self.parent(sibling)?;
        let pos = self.position_in_parent(sibling)?;
        Some(self.insert_child(parent, pos, node))
    }

    /// Remove a node and its whole subtree, keeping indices synchronized.
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<SlideNode> {
        if idx == self.root {
            return None;
        }
        for child in self.children(idx) {
            self.remove_node(child);
        }
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|&c| c != idx);
        }
        self.child_order.remove(&idx);
        let removed = self.graph.remove_node(idx);
        if let Some(removed_node) = &removed {
            self.id_index.remove(&removed_node.id);
        }
        removed
    }

    /// Look up a node by id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&SlideNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up a node mutably by id.
    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut SlideNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&SlideNode> {
        self.graph.node_weight(idx)
    }

    /// Get the index for a NodeId.
    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Get the parent index of a node.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in document order (back to front).
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.child_order.get(&idx).cloned().unwrap_or_default()
    }

    pub fn position_in_parent(&self, idx: NodeIndex) -> Option<usize> {
        let parent = self.parent(idx)?;
        self.child_order.get(&parent)?.iter().position(|&c| c == idx)
    }

    /// Move a node under a new parent, appended on top.
    pub fn reparent_node(&mut self, child: NodeIndex, new_parent: NodeIndex) {
        if let Some(old_parent) = self.parent(child) {
            if let Some(edge) = self.graph.find_edge(old_parent, child) {
                self.graph.remove_edge(edge);
            }
            if let Some(order) = self.child_order.get_mut(&old_parent) {
                order.retain(|&c| c != child);
            }
        }
        self.graph.add_edge(new_parent, child, ());
        self.child_order.entry(new_parent).or_default().push(child);
    }

    /// Move a child to the front of its siblings' z-order.
    pub fn bring_to_front(&mut self, child: NodeIndex) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        let Some(order) = self.child_order.get_mut(&parent) else {
            return false;
        };
        let Some(pos) = order.iter().position(|&c| c == child) else {
            return false;
        };
        if pos + 1 == order.len() {
            return false;
        }
        let c = order.remove(pos);
        order.push(c);
        true
    }

    /// Pre-order traversal of the subtree rooted at `idx` (inclusive).
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// All non-root nodes in paint order (back to front).
    pub fn paint_order(&self) -> Vec<NodeIndex> {
        let mut all = self.descendants(self.root);
        all.remove(0);
        all
    }

    /// Check if `ancestor_id` is a parent/grandparent/etc. of `descendant_id`.
    pub fn is_ancestor_of(&self, ancestor_id: NodeId, descendant_id: NodeId) -> bool {
        if ancestor_id == descendant_id {
            return false;
        }
        let mut current_idx = match self.index_of(descendant_id) {
            Some(idx) => idx,
            None => return false,
        };
        while let Some(parent_idx) = self.parent(current_idx) {
            if self.graph[parent_idx].id == ancestor_id {
                return true;
            }
            current_idx = parent_idx;
        }
        false
    }

    /// Number of non-root nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SlideTree {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Resolved geometry (output of layout) ────────────────────────────────

/// Axis-aligned border box in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Point at a fractional position inside the box (`(0,0)` top-left,
    /// `(1,1)` bottom-right).
    pub fn anchor(&self, fx: f32, fy: f32) -> (f32, f32) {
        (self.x + fx * self.width, self.y + fy * self.height)
    }

    /// Check if this bounds intersects with another (AABB overlap).
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Bounds {
        Bounds::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn approx_eq(&self, other: &Bounds, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

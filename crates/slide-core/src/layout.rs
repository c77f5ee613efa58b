//! Layout resolution.
//!
//! Computes the border box of every node in canvas pixels. Flow children
//! stack vertically inside their parent's content box (block layout);
//! absolute children are placed at their `left`/`top` in canvas space and
//! do not take part in their parent's flow. Auto heights come from text
//! measurement or from the flow children.

use crate::css::border_width;
use crate::metrics::TextMetrics;
use crate::model::*;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Default intrinsic size of an `<img>` without dimensions.
pub const DEFAULT_IMAGE_SIZE: (f32, f32) = (300.0, 200.0);
/// Default intrinsic size of an `<svg>` without dimensions.
pub const DEFAULT_VECTOR_SIZE: (f32, f32) = (300.0, 150.0);

/// Resolve all node boxes in the slide.
///
/// Returns a map from `NodeIndex` → border-box `Bounds` in canvas pixels.
pub fn resolve_layout(tree: &SlideTree, metrics: &dyn TextMetrics) -> HashMap<NodeIndex, Bounds> {
    let mut bounds = HashMap::new();
    bounds.insert(tree.root, Bounds::new(0.0, 0.0, CANVAS_WIDTH, CANVAS_HEIGHT));

    let root_style = tree.graph[tree.root].style.clone();
    layout_children(tree, tree.root, &root_style, metrics, &mut bounds);
    bounds
}

/// Style with inherited font properties filled in from the ancestors.
pub fn effective_style(tree: &SlideTree, idx: NodeIndex) -> Style {
    let mut chain = vec![idx];
    let mut current = idx;
    while let Some(parent) = tree.parent(current) {
        chain.push(parent);
        current = parent;
    }
    let mut style = Style::default();
    for &i in chain.iter().rev() {
        style = inherit(&style, &tree.graph[i].style);
    }
    style
}

fn inherit(parent: &Style, own: &Style) -> Style {
    let mut s = own.clone();
    s.font_family = s.font_family.or_else(|| parent.font_family.clone());
    s.font_size = s.font_size.or(parent.font_size);
    s.font_weight = s.font_weight.or(parent.font_weight);
    s.font_style = s.font_style.or(parent.font_style);
    s.line_height = s.line_height.or_else(|| parent.line_height.clone());
    s.text_align = s.text_align.or(parent.text_align);
    s
}

/// Horizontal and vertical space taken by padding and border.
pub fn insets(node: &SlideNode) -> (f32, f32) {
    let bw = border_width(node.box_model.border.as_deref());
    (
        node.box_model.padding.horizontal() + 2.0 * bw,
        node.box_model.padding.vertical() + 2.0 * bw,
    )
}

/// Content box of a node given its border box.
pub fn content_box(node: &SlideNode, b: &Bounds) -> Bounds {
    let bw = border_width(node.box_model.border.as_deref());
    let p = &node.box_model.padding;
    Bounds::new(
        b.x + p.left + bw,
        b.y + p.top + bw,
        (b.width - p.horizontal() - 2.0 * bw).max(0.0),
        (b.height - p.vertical() - 2.0 * bw).max(0.0),
    )
}

fn is_border_box(node: &SlideNode) -> bool {
    node.box_model.box_sizing == Some(BoxSizing::BorderBox)
}

/// Declared length converted to a border-box length.
fn to_border_box(node: &SlideNode, declared: Option<f32>, inset: f32) -> Option<f32> {
    declared.map(|v| if is_border_box(node) { v } else { v + inset })
}

fn clamp_axis(v: f32, min: Option<f32>, max: Option<f32>) -> f32 {
    let mut v = v;
    if let Some(max) = max {
        v = v.min(max);
    }
    if let Some(min) = min {
        v = v.max(min);
    }
    v.max(0.0)
}

fn intrinsic_media_size(node: &SlideNode) -> Option<(f32, f32)> {
    let default = match node.kind {
        NodeKind::Image { .. } => DEFAULT_IMAGE_SIZE,
        NodeKind::Vector { .. } => DEFAULT_VECTOR_SIZE,
        _ => return None,
    };
    let w = node.attr("width").and_then(crate::css::parse_px);
    let h = node.attr("height").and_then(crate::css::parse_px);
    Some(match (w, h) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * default.1 / default.0),
        (None, Some(h)) => (h * default.0 / default.1, h),
        (None, None) => default,
    })
}

fn layout_children(
    tree: &SlideTree,
    parent: NodeIndex,
    parent_style: &Style,
    metrics: &dyn TextMetrics,
    bounds: &mut HashMap<NodeIndex, Bounds>,
) {
    let parent_node = &tree.graph[parent];
    let Some(parent_bounds) = bounds.get(&parent).copied() else {
        return;
    };
    let content = content_box(parent_node, &parent_bounds);
    let mut cursor_y = content.y;

    for child in tree.children(parent) {
        let node = &tree.graph[child];
        let style = inherit(parent_style, &node.style);

        if matches!(node.kind, NodeKind::Raw { .. }) {
            bounds.insert(child, Bounds::new(content.x, cursor_y, 0.0, 0.0));
            continue;
        }

        let margin = node.box_model.margin;
        let (origin_x, origin_y, available) = match node.position {
            Positioning::Flow => (
                content.x + margin.left,
                cursor_y + margin.top,
                (content.width - margin.horizontal()).max(0.0),
            ),
            Positioning::Absolute { left, top } => (
                left + margin.left,
                top + margin.top,
                (CANVAS_WIDTH - left - margin.horizontal()).max(0.0),
            ),
        };

        let b = layout_node(tree, child, &style, origin_x, origin_y, available, metrics, bounds);

        if !node.position.is_absolute() {
            cursor_y = b.bottom() + margin.bottom;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn layout_node(
    tree: &SlideTree,
    idx: NodeIndex,
    style: &Style,
    x: f32,
    y: f32,
    available: f32,
    metrics: &dyn TextMetrics,
    bounds: &mut HashMap<NodeIndex, Bounds>,
) -> Bounds {
    let node = &tree.graph[idx];
    let (inset_w, inset_h) = insets(node);
    let size = &node.size;
    let media = intrinsic_media_size(node);

    let declared_w = to_border_box(node, size.width, inset_w);
    let declared_h = to_border_box(node, size.height, inset_h);
    let min_w = to_border_box(node, size.min_width, inset_w);
    let max_w = to_border_box(node, size.max_width, inset_w);
    let min_h = to_border_box(node, size.min_height, inset_h);
    let max_h = to_border_box(node, size.max_height, inset_h);

    let auto_w = match (&node.kind, media) {
        (_, Some((mw, mh))) => match declared_h {
            // Replaced elements keep their ratio when only height is given.
            Some(h) => (h - inset_h).max(0.0) * mw / mh.max(f32::EPSILON) + inset_w,
            None => mw + inset_w,
        },
        (NodeKind::Text { content }, None) if node.position.is_absolute() => {
            let (w, _) = metrics.measure(content, style, Some((available - inset_w).max(0.0)));
            w + inset_w
        }
        _ => available,
    };
    let width = clamp_axis(declared_w.unwrap_or(auto_w), min_w, max_w);

    let mut b = Bounds::new(x, y, width, 0.0);
    bounds.insert(idx, b);

    let auto_h = match &node.kind {
        NodeKind::Text { content } => {
            let inner_w = (width - inset_w).max(0.0);
            metrics.measure(content, style, Some(inner_w)).1 + inset_h
        }
        NodeKind::Image { .. } | NodeKind::Vector { .. } => {
            let (mw, mh) = media.unwrap_or(DEFAULT_IMAGE_SIZE);
            (width - inset_w).max(0.0) * mh / mw.max(f32::EPSILON) + inset_h
        }
        NodeKind::Shape | NodeKind::Overlay(_) | NodeKind::Root => {
            layout_children(tree, idx, style, metrics, bounds);
            let bw = border_width(node.box_model.border.as_deref());
            let padding = node.box_model.padding;
            let content_top = y + padding.top + bw;
            let flow_bottom = tree
                .children(idx)
                .into_iter()
                .filter(|c| !tree.graph[*c].position.is_absolute())
                .filter_map(|c| {
                    let cb = bounds.get(&c)?;
                    Some(cb.bottom() + tree.graph[c].box_model.margin.bottom)
                })
                .fold(content_top, f32::max);
            flow_bottom - y + padding.bottom + bw
        }
        NodeKind::Placeholder | NodeKind::Raw { .. } => inset_h,
    };

    b.height = clamp_axis(declared_h.unwrap_or(auto_h), min_h, max_h);
    bounds.insert(idx, b);
    b
}

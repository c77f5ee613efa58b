//! Emitter: SlideTree → slide markup.
//!
//! Output re-parses to an equivalent tree, and emitting that tree again
//! yields the same text. Anonymous ids are never written.

use crate::css::{format_style_attribute, style_declarations};
use crate::model::*;
use crate::parser::{KEEP_ASPECT_ATTR, RESTORE_ATTR, SIZE_LOCK_ATTR, is_void_tag};
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Emit a whole slide.
#[must_use]
pub fn emit_markup(tree: &SlideTree) -> String {
    let mut out = String::with_capacity(1024);
    for child in tree.children(tree.root) {
        emit_node(&mut out, tree, child, 0);
    }
    out
}

/// Emit a single subtree (used by the clipboard preview and tests).
#[must_use]
pub fn emit_subtree(tree: &SlideTree, idx: NodeIndex) -> String {
    let mut out = String::new();
    emit_node(&mut out, tree, idx, 0);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn emit_node(out: &mut String, tree: &SlideTree, idx: NodeIndex, depth: usize) {
    let node = &tree.graph[idx];

    if let NodeKind::Text { content } = &node.kind
        && node.tag == TEXT_RUN_TAG
    {
        indent(out, depth);
        out.push_str(content);
        out.push('\n');
        return;
    }
    if matches!(node.kind, NodeKind::Root) {
        return;
    }

    indent(out, depth);
    emit_open_tag(out, node);

    match &node.kind {
        NodeKind::Image { .. } => {
            out.push('\n');
        }
        _ if is_void_tag(&node.tag) => {
            out.push('\n');
        }
        NodeKind::Text { content } => {
            let _ = writeln!(out, "{content}</{}>", node.tag);
        }
        NodeKind::Vector { source } | NodeKind::Raw { source } => {
            let _ = writeln!(out, "{source}</{}>", node.tag);
        }
        NodeKind::Shape | NodeKind::Placeholder | NodeKind::Overlay(_) => {
            let children = tree.children(idx);
            if children.is_empty() {
                let _ = writeln!(out, "</{}>", node.tag);
            } else {
                out.push('\n');
                for child in children {
                    emit_node(out, tree, child, depth + 1);
                }
                indent(out, depth);
                let _ = writeln!(out, "</{}>", node.tag);
            }
        }
        NodeKind::Root => {}
    }
}

fn emit_open_tag(out: &mut String, node: &SlideNode) {
    let _ = write!(out, "<{}", node.tag);

    if !node.id.is_anonymous() {
        write_attr(out, "id", node.id.as_str());
    }
    if let NodeKind::Image { src } = &node.kind {
        write_attr(out, "src", src);
    }
    for (name, value) in &node.attrs {
        write_attr(out, name, value);
    }

    let decls = style_declarations(node);
    if !decls.is_empty() {
        write_attr(out, "style", &format_style_attribute(&decls));
    }

    if node.aspect_locked {
        write_attr(out, KEEP_ASPECT_ATTR, "true");
    }
    if node.editable {
        write_attr(out, "contenteditable", "true");
    }
    if let Some(record) = &node.restore
        && let Ok(json) = serde_json::to_string(record)
    {
        write_attr(out, RESTORE_ATTR, &json);
    }
    if let Some(record) = &node.size_lock
        && let Ok(json) = serde_json::to_string(record)
    {
        write_attr(out, SIZE_LOCK_ATTR, &json);
    }

    out.push('>');
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    if value.is_empty() {
        let _ = write!(out, " {name}");
    } else {
        let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
    }
}

/// Escape an attribute value for double-quoted output.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text content.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

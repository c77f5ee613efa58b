//! Removal of editor artifacts before markup leaves the editor.

use crate::layout::insets;
use crate::model::*;
use petgraph::graph::NodeIndex;

/// Outcome of `clean_for_save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanReport {
    /// Overlay and placeholder subtrees removed.
    pub removed: usize,
    /// Nodes whose box model was put back from an editing restore record.
    pub restored: usize,
    /// Nodes whose size-lock bookkeeping was unwound.
    pub unlocked: usize,
}

/// Remove overlay and placeholder nodes. Returns how many subtrees went.
pub fn strip_transients(tree: &mut SlideTree) -> usize {
    let doomed: Vec<NodeIndex> = tree
        .paint_order()
        .into_iter()
        .filter(|&idx| tree.graph[idx].is_transient())
        .collect();

    let mut removed = 0;
    for idx in doomed {
        // A transient nested in another one is already gone.
        if tree.node(idx).is_some() && tree.remove_node(idx).is_some() {
            removed += 1;
        }
    }
    removed
}

/// Bring a snapshot back to an idle editing state: overlay subtrees that
/// were serialized by accident go, and any node caught mid text-edit is put
/// back to its recorded box model. Placeholders stay, they hold flow slots.
pub fn settle_snapshot(tree: &mut SlideTree) -> usize {
    let overlays: Vec<NodeIndex> = tree
        .paint_order()
        .into_iter()
        .filter(|&idx| matches!(tree.graph[idx].kind, NodeKind::Overlay(_)))
        .collect();
    let mut removed = 0;
    for idx in overlays {
        if tree.node(idx).is_some() && tree.remove_node(idx).is_some() {
            removed += 1;
        }
    }
    for idx in tree.paint_order() {
        let node = &mut tree.graph[idx];
        node.editable = false;
        if let Some(record) = node.restore.take() {
            apply_restore(node, &record);
        }
    }
    removed
}

/// Put back the box model captured when text editing started.
pub fn apply_restore(node: &mut SlideNode, record: &RestoreRecord) {
    node.box_model = record.box_model.clone();
    node.size = record.size;
}

/// Undo the flow-property overrides of a size lock while keeping the
/// rendered size. Locked sizes are border-box; if the original sizing was
/// content-box they are converted back.
pub fn release_size_lock(node: &mut SlideNode) -> bool {
    let Some(record) = node.size_lock.take() else {
        return false;
    };
    let was_border_box = node.box_model.box_sizing == Some(BoxSizing::BorderBox);
    let restores_border_box = record.box_sizing == Some(BoxSizing::BorderBox);

    if was_border_box && !restores_border_box {
        let (iw, ih) = insets(node);
        let shrink = |v: Option<f32>, by: f32| v.map(|v| (v - by).max(0.0));
        let s = &mut node.size;
        s.width = shrink(s.width, iw);
        s.min_width = shrink(s.min_width, iw);
        s.max_width = shrink(s.max_width, iw);
        s.height = shrink(s.height, ih);
        s.min_height = shrink(s.min_height, ih);
        s.max_height = shrink(s.max_height, ih);
    }

    node.box_model.box_sizing = record.box_sizing;
    node.box_model.overflow = record.overflow;
    node.box_model.white_space = record.white_space;
    true
}

/// Strip everything the editor added: overlays, placeholders, editable
/// flags, restore records and size-lock bookkeeping.
pub fn clean_for_save(tree: &mut SlideTree) -> CleanReport {
    let mut report = CleanReport {
        removed: strip_transients(tree),
        ..CleanReport::default()
    };

    for idx in tree.paint_order() {
        let node = &mut tree.graph[idx];
        node.editable = false;
        if let Some(record) = node.restore.take() {
            apply_restore(node, &record);
            report.restored += 1;
        }
        if release_size_lock(node) {
            report.unlocked += 1;
        }
    }

    log::debug!(
        "cleaned slide: {} transient, {} restored, {} unlocked",
        report.removed,
        report.restored,
        report.unlocked
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::emit_markup;
    use crate::id::NodeId;
    use crate::parser::parse_slide;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_overlays_and_placeholders() {
        let mut tree = parse_slide(
            r#"<div class="resize-handle"></div><div class="drag-placeholder" style="height:40px"></div><p id="keep_me">x</p><div class="drag-preview"></div>"#,
        )
        .unwrap();
        assert_eq!(strip_transients(&mut tree), 3);
        assert_eq!(emit_markup(&tree), "<p id=\"keep_me\">x</p>\n");
    }

    #[test]
    fn settled_snapshot_keeps_placeholders() {
        let mut tree = parse_slide(
            r#"<div class="drag-handle"></div><div class="drag-placeholder"></div><p id="mid_edit" contenteditable="true" style="width:90px">x</p>"#,
        )
        .unwrap();
        let node = tree.get_by_id_mut(NodeId::intern("mid_edit")).unwrap();
        node.restore = Some(RestoreRecord::default());

        assert_eq!(settle_snapshot(&mut tree), 1);
        assert_eq!(
            emit_markup(&tree),
            "<div class=\"drag-placeholder\"></div>\n<p id=\"mid_edit\">x</p>\n"
        );
    }

    #[test]
    fn size_lock_is_unwound_to_content_box() {
        let mut tree =
            parse_slide(r#"<p id="locked_p" style="padding:10px;white-space:nowrap">x</p>"#).unwrap();
        let node = tree.get_by_id_mut(NodeId::intern("locked_p")).unwrap();
        node.lock_size(220.0, 60.0);
        node.box_model.white_space = Some("normal".into());

        let report = clean_for_save(&mut tree);
        assert_eq!(report.unlocked, 1);
        let node = tree.get_by_id(NodeId::intern("locked_p")).unwrap();
        assert_eq!(node.size.width, Some(200.0));
        assert_eq!(node.size.height, Some(40.0));
        assert_eq!(node.box_model.box_sizing, None);
        assert_eq!(node.box_model.white_space.as_deref(), Some("nowrap"));
        assert!(node.size_lock.is_none());
    }

    #[test]
    fn restore_record_and_editable_flag_are_cleared() {
        let mut tree = parse_slide(r#"<p id="was_editing" style="padding:4px">x</p>"#).unwrap();
        let node = tree.get_by_id_mut(NodeId::intern("was_editing")).unwrap();
        node.restore = Some(RestoreRecord {
            box_model: node.box_model.clone(),
            size: node.size,
        });
        node.size.lock(100.0, 30.0);
        node.box_model.padding = Edges::ZERO;
        node.editable = true;

        let report = clean_for_save(&mut tree);
        assert_eq!(report.restored, 1);
        assert_eq!(
            emit_markup(&tree),
            "<p id=\"was_editing\" style=\"padding: 4px\">x</p>\n"
        );
    }
}

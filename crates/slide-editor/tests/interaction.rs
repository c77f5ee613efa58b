//! Integration tests: pointer gestures, text editing, clipboard and save
//! driven through `SlideEditor::handle_event`.
//!
//! The surface is attached at the client origin with scale 1.0 so client
//! and canvas coordinates coincide.

use pretty_assertions::assert_eq;
use slide_core::id::NodeId;
use slide_core::model::*;
use slide_editor::handles::HandleRole;
use slide_editor::{EditorConfig, EventOutcome, InputEvent, ScaleSource, SlideEditor};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn editor() -> SlideEditor {
    editor_from(include_str!("fixtures/editor_scene.html"))
}

fn editor_from(markup: &str) -> SlideEditor {
    init_logging();
    let config = EditorConfig {
        scale: ScaleSource::Fixed { factor: 1.0 },
        ..EditorConfig::default()
    };
    let mut editor = SlideEditor::new(markup, config).unwrap();
    editor.attach_surface(0.0, 0.0);
    editor
}

/// A margined text box, a bare shape and an image without an aspect lock.
const LOOSE_SCENE: &str = r#"<div id="note" style="position: absolute; left: 100px; top: 100px; width: 200px; height: 50px; margin: 30px">Note</div>
<div id="swatch" style="position: absolute; left: 100px; top: 400px; width: 200px; height: 100px"></div>
<img id="snap" src="snap.png" alt="" style="position: absolute; left: 700px; top: 300px; width: 300px; height: 200px">"#;

fn id(name: &str) -> NodeId {
    NodeId::intern(name)
}

fn down(x: f32, y: f32, t: f64) -> InputEvent {
    InputEvent::PointerDown {
        x,
        y,
        pointer_id: 1,
        time_ms: t,
    }
}

fn mv(x: f32, y: f32, t: f64) -> InputEvent {
    InputEvent::PointerMove {
        x,
        y,
        pointer_id: 1,
        time_ms: t,
    }
}

fn up(x: f32, y: f32, t: f64) -> InputEvent {
    InputEvent::PointerUp {
        x,
        y,
        pointer_id: 1,
        time_ms: t,
    }
}

fn handle_center(editor: &SlideEditor, role: HandleRole) -> (f32, f32) {
    editor
        .handles()
        .and_then(|h| h.get(role))
        .map(|h| h.center())
        .expect("handle attached")
}

fn move_handle_center(editor: &SlideEditor) -> (f32, f32) {
    editor.handles().expect("handles attached").move_handle.center()
}

/// Handles sit on the box they belong to.
fn assert_handles_track(editor: &SlideEditor, target: Bounds) {
    let handles = editor.handles().expect("handles attached");
    assert!(
        handles.target.approx_eq(&target, 1.0),
        "handles at {:?}, box at {target:?}",
        handles.target
    );
    for role in HandleRole::ALL {
        let spec = role.spec();
        let (ax, ay) = target.anchor(spec.anchor.0, spec.anchor.1);
        let (cx, cy) = handles.get(role).unwrap().center();
        assert!((ax - cx).abs() <= 1.0 && (ay - cy).abs() <= 1.0, "{role:?} drifted");
    }
}

fn resize(editor: &mut SlideEditor, role: HandleRole, dx: f32, dy: f32, t: f64) {
    let (hx, hy) = handle_center(editor, role);
    assert!(editor.handle_event(down(hx, hy, t)).handled, "{role:?} grabbed");
    editor.handle_event(mv(hx + dx, hy + dy, t + 1.0));
    editor.handle_event(up(hx + dx, hy + dy, t + 2.0));
}

// ─── Resize ─────────────────────────────────────────────────────────────

#[test]
fn resize_text_from_bottom_right() {
    let mut editor = editor();
    editor.handle_event(down(150.0, 120.0, 0.0));
    assert_eq!(editor.selected(), Some(id("title")));

    resize(&mut editor, HandleRole::SE, 50.0, 20.0, 10.0);
    assert_eq!(
        editor.bounds_of(id("title")),
        Some(Bounds::new(100.0, 100.0, 250.0, 70.0))
    );
    assert!(!editor.is_resizing());
}

#[test]
fn aspect_locked_corner_keeps_ratio() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    assert_eq!(editor.selected(), Some(id("photo")));

    resize(&mut editor, HandleRole::NE, 150.0, 0.0, 10.0);
    let b = editor.bounds_of(id("photo")).unwrap();
    assert_eq!((b.width, b.height), (450.0, 300.0));
    assert_eq!(b.x, 500.0, "west edge stays put");
    assert_eq!(b.bottom(), 400.0, "south edge stays put");
}

#[test]
fn aspect_locked_edge_changes_one_dimension() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));

    resize(&mut editor, HandleRole::E, 60.0, 0.0, 10.0);
    let b = editor.bounds_of(id("photo")).unwrap();
    assert_eq!((b.width, b.height), (360.0, 200.0));
}

#[test]
fn resize_never_goes_below_floor() {
    for role in HandleRole::ALL {
        let mut editor = editor();
        editor.handle_event(down(600.0, 300.0, 0.0));
        resize(&mut editor, role, -2000.0 * role_sign_x(role), -2000.0 * role_sign_y(role), 10.0);

        let b = editor.bounds_of(id("photo")).unwrap();
        assert!(b.width >= 20.0 - 0.01, "{role:?}: width {}", b.width);
        assert!(b.height >= 20.0 - 0.01, "{role:?}: height {}", b.height);
    }
}

/// Direction that shrinks the box for a handle.
fn role_sign_x(role: HandleRole) -> f32 {
    if role.moves_left() { -1.0 } else { 1.0 }
}

fn role_sign_y(role: HandleRole) -> f32 {
    if role.moves_top() { -1.0 } else { 1.0 }
}

#[test]
fn handles_follow_every_resize_tick() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    let (hx, hy) = handle_center(&editor, HandleRole::SW);
    editor.handle_event(down(hx, hy, 10.0));

    for step in 1..=5 {
        let d = step as f32 * 12.0;
        editor.handle_event(mv(hx - d, hy + d, 10.0 + step as f64));
        let b = editor.bounds_of(id("photo")).unwrap();
        assert_handles_track(&editor, b);
    }
    editor.handle_event(up(hx - 60.0, hy + 60.0, 20.0));
    assert_handles_track(&editor, editor.bounds_of(id("photo")).unwrap());
}

#[test]
fn width_only_resize_relocks_height_to_content() {
    let mut editor = editor();
    editor.handle_event(down(150.0, 410.0, 0.0));
    assert_eq!(editor.selected(), Some(id("intro")));
    let before = editor.bounds_of(id("intro")).unwrap();

    resize(&mut editor, HandleRole::E, 100.0, 0.0, 10.0);
    let b = editor.bounds_of(id("intro")).unwrap();
    assert_eq!((b.x, b.y, b.width), (100.0, 400.0, 400.0));
    assert!((b.height - before.height).abs() < 0.01, "one line either way");

    let node = editor.node(id("intro")).unwrap();
    assert!(node.size.is_height_locked());
    assert!(node.position.is_absolute());
}

#[test]
fn edge_resize_keeps_height_of_shapes_and_images() {
    for (name, click, start) in [
        ("swatch", (200.0, 450.0), Bounds::new(100.0, 400.0, 200.0, 100.0)),
        ("snap", (850.0, 400.0), Bounds::new(700.0, 300.0, 300.0, 200.0)),
    ] {
        for (role, dx) in [(HandleRole::E, 50.0), (HandleRole::W, -50.0)] {
            let mut editor = editor_from(LOOSE_SCENE);
            editor.handle_event(down(click.0, click.1, 0.0));
            assert_eq!(editor.selected(), Some(id(name)));
            assert_eq!(editor.editing(), None);

            let (hx, hy) = handle_center(&editor, role);
            editor.handle_event(down(hx, hy, 10.0));
            for step in 1..=5 {
                let d = dx * step as f32 / 5.0;
                editor.handle_event(mv(hx + d, hy, 10.0 + step as f64));
                let b = editor.bounds_of(id(name)).unwrap();
                assert_eq!(b.height, start.height, "{name} {role:?} tick {step}");
            }
            editor.handle_event(up(hx + dx, hy, 20.0));

            let b = editor.bounds_of(id(name)).unwrap();
            assert_eq!(b.width, start.width + 50.0, "{name} {role:?}");
            assert_eq!((b.y, b.height), (start.y, start.height), "{name} {role:?}");
            assert!(editor.node(id(name)).unwrap().size.is_height_locked());
        }
    }
}

#[test]
fn foreign_pointer_is_ignored_during_gesture() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    let (hx, hy) = handle_center(&editor, HandleRole::SE);
    editor.handle_event(down(hx, hy, 10.0));

    let foreign = InputEvent::PointerMove {
        x: hx + 300.0,
        y: hy + 300.0,
        pointer_id: 7,
        time_ms: 11.0,
    };
    assert_eq!(editor.handle_event(foreign), EventOutcome::IGNORED);
    assert_eq!(
        editor.bounds_of(id("photo")),
        Some(Bounds::new(500.0, 200.0, 300.0, 200.0))
    );
    // A second gesture cannot start while this one runs.
    assert_eq!(editor.handle_event(down(150.0, 120.0, 12.0)), EventOutcome::IGNORED);
    assert!(editor.is_resizing());
}

#[test]
fn resize_cancel_keeps_last_geometry() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    let (hx, hy) = handle_center(&editor, HandleRole::SE);
    editor.handle_event(down(hx, hy, 10.0));
    editor.handle_event(mv(hx + 30.0, hy + 30.0, 11.0));
    editor.handle_event(InputEvent::PointerCancel {
        pointer_id: 1,
        time_ms: 12.0,
    });

    assert!(!editor.is_resizing());
    let b = editor.bounds_of(id("photo")).unwrap();
    assert!(b.approx_eq(&Bounds::new(500.0, 200.0, 345.0, 230.0), 0.01), "{b:?}");
    assert!(editor.can_undo());
}

// ─── Drag ───────────────────────────────────────────────────────────────

#[test]
fn drag_moves_absolute_node() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    let (mx, my) = move_handle_center(&editor);

    editor.handle_event(down(mx, my, 10.0));
    for step in 1..=4 {
        let d = step as f32 * 25.0;
        editor.handle_event(mv(mx + d, my + d / 2.0, 10.0 + step as f64));
        let ghost = editor.overlay().ghost.unwrap();
        assert_handles_track(&editor, ghost);
    }
    editor.handle_event(up(mx + 100.0, my + 50.0, 20.0));

    assert!(!editor.is_dragging());
    assert_eq!(
        editor.bounds_of(id("photo")),
        Some(Bounds::new(600.0, 250.0, 300.0, 200.0))
    );
    assert_eq!(editor.overlay().ghost, None);
    assert_handles_track(&editor, Bounds::new(600.0, 250.0, 300.0, 200.0));
}

#[test]
fn drag_lifts_flow_node_to_canvas() {
    let mut editor = editor();
    editor.handle_event(down(150.0, 410.0, 0.0));
    assert_eq!(editor.selected(), Some(id("intro")));
    let (mx, my) = move_handle_center(&editor);

    editor.handle_event(down(mx, my, 10.0));
    editor.handle_event(mv(mx + 300.0, my + 100.0, 11.0));
    editor.handle_event(up(mx + 300.0, my + 100.0, 12.0));

    let doc = editor.document();
    let intro = doc.tree.index_of(id("intro")).unwrap();
    assert_eq!(doc.tree.parent(intro), Some(doc.tree.root));
    let b = editor.bounds_of(id("intro")).unwrap();
    assert!(b.approx_eq(&Bounds::new(400.0, 500.0, 300.0, 28.0), 0.01), "{b:?}");
    // The vacated slot keeps its height, so the sibling does not jump.
    let detail = editor.bounds_of(id("detail")).unwrap();
    assert!((detail.y - 428.0).abs() < 0.01, "{detail:?}");
    assert_eq!(detail.x, 100.0);
    // Inherited font size travels with the node.
    let node = editor.node(id("intro")).unwrap();
    assert_eq!(node.style.font_size, Some(20.0));
}

#[test]
fn margined_text_stays_put_when_editing_ends_after_drag() {
    let mut editor = editor_from(LOOSE_SCENE);
    assert_eq!(
        editor.bounds_of(id("note")),
        Some(Bounds::new(130.0, 130.0, 200.0, 50.0))
    );
    editor.handle_event(down(200.0, 150.0, 0.0));
    assert_eq!(editor.editing(), Some(id("note")));

    let (mx, my) = move_handle_center(&editor);
    editor.handle_event(down(mx, my, 10.0));
    editor.handle_event(mv(mx + 50.0, my, 11.0));
    editor.handle_event(up(mx + 50.0, my, 12.0));
    let dropped = Bounds::new(180.0, 130.0, 200.0, 50.0);
    assert_eq!(editor.bounds_of(id("note")), Some(dropped));

    editor.handle_event(InputEvent::key("Escape", 20.0));
    assert_eq!(editor.editing(), None);
    assert_eq!(editor.bounds_of(id("note")), Some(dropped));
    assert_eq!(editor.node(id("note")).unwrap().box_model.margin, Edges::ZERO);
}

#[test]
fn margined_text_stays_put_when_editing_ends_after_resize() {
    let mut editor = editor_from(LOOSE_SCENE);
    editor.handle_event(down(200.0, 150.0, 0.0));
    assert_eq!(editor.editing(), Some(id("note")));

    resize(&mut editor, HandleRole::SE, 20.0, 10.0, 10.0);
    let resized = Bounds::new(130.0, 130.0, 220.0, 60.0);
    assert_eq!(editor.bounds_of(id("note")), Some(resized));

    editor.handle_event(InputEvent::key("Escape", 20.0));
    assert_eq!(editor.editing(), None);
    assert_eq!(editor.bounds_of(id("note")), Some(resized));
}

#[test]
fn drag_cancel_unwinds_everything() {
    let mut editor = editor();
    editor.handle_event(down(150.0, 410.0, 0.0));
    let before = editor.markup();
    let (mx, my) = move_handle_center(&editor);

    editor.handle_event(down(mx, my, 10.0));
    editor.handle_event(mv(mx + 200.0, my + 40.0, 11.0));
    assert!(editor.markup().contains("drag-placeholder"));
    editor.handle_event(InputEvent::PointerCancel {
        pointer_id: 1,
        time_ms: 12.0,
    });

    assert_eq!(editor.markup(), before);
    assert!(!editor.can_undo());
    assert_eq!(editor.overlay().ghost, None);
}

// ─── Text editing ───────────────────────────────────────────────────────

#[test]
fn edit_mode_only_listens_for_exit_keys() {
    let mut editor = editor();
    editor.handle_event(down(150.0, 120.0, 0.0));
    assert_eq!(editor.editing(), Some(id("title")));

    assert_eq!(editor.handle_event(InputEvent::command("z", 1.0)), EventOutcome::IGNORED);
    assert_eq!(editor.handle_event(InputEvent::key("Delete", 2.0)), EventOutcome::IGNORED);
    let shift_enter = InputEvent::Key {
        key: "Enter".into(),
        ctrl: false,
        shift: true,
        alt: false,
        meta: false,
        repeat: false,
        time_ms: 3.0,
    };
    assert_eq!(editor.handle_event(shift_enter), EventOutcome::IGNORED);
    assert_eq!(editor.editing(), Some(id("title")));

    assert!(editor.handle_event(InputEvent::key("Enter", 4.0)).mutated);
    assert_eq!(editor.editing(), None);
    assert_eq!(editor.selected(), None, "handles detach with the edit");
}

#[test]
fn typing_records_one_history_entry() {
    let mut editor = editor();
    editor.handle_event(down(150.0, 120.0, 0.0));
    assert!(editor.set_text(id("title"), "Titl", 10.0));
    assert!(editor.set_text(id("title"), "Title!", 20.0));
    assert_eq!(editor.history().undo_depth(), 1);
    assert!(!editor.set_text(id("photo"), "nope", 30.0));

    editor.handle_event(InputEvent::key("Escape", 40.0));
    match &editor.node(id("title")).unwrap().kind {
        NodeKind::Text { content } => assert_eq!(content, "Title!"),
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn toolbar_keeps_edit_alive_across_blur() {
    let mut editor = editor();
    editor.handle_event(down(150.0, 120.0, 0.0));
    assert!(editor.toolbar("italic", None, 100.0));

    editor.handle_event(InputEvent::Blur { time_ms: 200.0 });
    assert_eq!(editor.editing(), Some(id("title")), "busy toolbar");

    editor.handle_event(InputEvent::Blur { time_ms: 2000.0 });
    assert_eq!(editor.editing(), None, "busy flag released itself");
    assert!(editor.node(id("title")).unwrap().style.is_italic());
}

#[test]
fn font_size_height_settles_on_next_frame() {
    let mut editor = editor();
    editor.handle_event(down(150.0, 120.0, 0.0));
    assert!(editor.toolbar("fontSize", Some("40px"), 10.0));

    let out = editor.handle_event(InputEvent::AnimationFrame { time_ms: 26.0 });
    assert!(out.mutated);
    let node = editor.node(id("title")).unwrap();
    assert!(node.size.is_height_locked());
    let h = node.size.height.unwrap();
    assert!((h - 56.0).abs() < 0.01, "height {h}");
    assert_eq!(node.box_model.overflow.as_deref(), Some("hidden"));

    // Nothing pending any more.
    let again = editor.handle_event(InputEvent::AnimationFrame { time_ms: 42.0 });
    assert!(!again.mutated);

    // Leaving edit mode keeps the new height.
    editor.handle_event(InputEvent::key("Escape", 50.0));
    let b = editor.bounds_of(id("title")).unwrap();
    assert!((b.height - 56.0).abs() < 0.01);
    assert_eq!(b.width, 200.0);
}

#[test]
fn insert_text_box_enters_editing() {
    let mut editor = editor();
    assert!(editor.toolbar("insertTextBox", None, 0.0));

    let editing = editor.editing().expect("new box is editing");
    assert!(editing.as_str().starts_with("text-box-"));
    let b = editor.bounds_of(editing).unwrap();
    assert_eq!((b.x, b.y, b.width, b.height), (340.0, 312.0, 600.0, 96.0));
    assert_eq!(editor.caret(), Some(editor.document().text_len(editing)));
    assert_eq!(editor.history().peek_undo(), Some(slide_editor::HistoryKind::Paste));
}

#[test]
fn insert_image_outside_editing_creates_locked_image() {
    let mut editor = editor();
    assert!(editor.toolbar("insertImage", Some("chart.png"), 0.0));

    let image = editor.selected().unwrap();
    assert_eq!(editor.inserted_images(), &[image]);
    let b = editor.bounds_of(image).unwrap();
    assert_eq!(b, Bounds::new(460.0, 240.0, 360.0, 240.0));
    assert!(editor.node(image).unwrap().aspect_locked);
}

#[test]
fn insert_link_needs_editing() {
    let mut editor = editor();
    assert!(!editor.toolbar("insertLink", Some(r#"{"url":"https://example.com","text":"docs"}"#), 0.0));

    editor.handle_event(down(150.0, 120.0, 10.0));
    assert!(editor.toolbar("insertLink", Some(r#"{"url":"https://example.com","text":"docs"}"#), 20.0));
    match &editor.node(id("title")).unwrap().kind {
        NodeKind::Text { content } => {
            assert_eq!(content, r#"Title<a href="https://example.com">docs</a>"#)
        }
        other => panic!("expected text, got {other:?}"),
    }
}

// ─── Clipboard ──────────────────────────────────────────────────────────

#[test]
fn pastes_are_independent() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    assert!(editor.handle_event(InputEvent::command("c", 10.0)).handled);

    assert!(editor.handle_event(InputEvent::command("v", 20.0)).mutated);
    let first = editor.selected().unwrap();
    assert!(editor.handle_event(InputEvent::command("v", 30.0)).mutated);
    let second = editor.selected().unwrap();

    assert_ne!(first, second);
    assert_ne!(first, id("photo"));
    assert_ne!(second, id("photo"));
    let a = editor.bounds_of(first).unwrap();
    let b = editor.bounds_of(second).unwrap();
    assert_eq!((a.x, a.y), (520.0, 220.0));
    assert_eq!((b.x, b.y), (540.0, 240.0));
    assert_eq!((b.width, b.height), (300.0, 200.0));
    assert!(editor.node(second).unwrap().aspect_locked);
    assert_eq!(editor.history().undo_depth(), 2);
}

#[test]
fn paste_with_empty_clipboard_is_a_noop() {
    let mut editor = editor();
    assert!(!editor.paste(0.0));
    assert!(!editor.can_undo());
}

#[test]
fn copies_are_debounced() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    assert!(editor.copy(1000.0));
    assert!(!editor.copy(1100.0));
    assert!(editor.copy(1400.0));
}

#[test]
fn duplicate_offsets_absolute_clone() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    assert!(editor.handle_event(InputEvent::command("d", 10.0)).mutated);

    let clone = editor.selected().unwrap();
    assert!(clone.as_str().starts_with("photo-copy-"));
    assert_eq!(
        editor.bounds_of(clone),
        Some(Bounds::new(520.0, 220.0, 300.0, 200.0))
    );
    assert_eq!(
        editor.bounds_of(id("photo")),
        Some(Bounds::new(500.0, 200.0, 300.0, 200.0))
    );
    // No z-index of its own: the clone stacks just above inserted nodes.
    assert_eq!(editor.node(id("photo")).unwrap().style.z_index, None);
    assert_eq!(editor.node(clone).unwrap().style.z_index, Some(1001));
}

#[test]
fn duplicate_bumps_existing_z_index() {
    let mut editor = editor_from(
        r#"<div id="badge" style="position: absolute; left: 40px; top: 40px; width: 80px; height: 80px; z-index: 7"></div>"#,
    );
    editor.handle_event(down(80.0, 80.0, 0.0));
    assert!(editor.duplicate(10.0));
    let clone = editor.selected().unwrap();
    assert_ne!(clone, id("badge"));
    assert_eq!(editor.node(clone).unwrap().style.z_index, Some(8));
}

#[test]
fn delete_removes_selection() {
    let mut editor = editor();
    editor.handle_event(down(600.0, 300.0, 0.0));
    assert!(editor.handle_event(InputEvent::key("Delete", 10.0)).mutated);
    assert!(editor.node(id("photo")).is_none());
    assert_eq!(editor.selected(), None);
    assert_eq!(editor.history().peek_undo(), Some(slide_editor::HistoryKind::Delete));
}

// ─── Save ───────────────────────────────────────────────────────────────

#[test]
fn save_strips_editor_state_and_closes() {
    let mut editor = editor();
    // Leave a placeholder behind and stop mid-edit.
    editor.handle_event(down(150.0, 410.0, 0.0));
    let (mx, my) = move_handle_center(&editor);
    editor.handle_event(down(mx, my, 10.0));
    editor.handle_event(up(mx + 300.0, my + 100.0, 11.0));
    editor.handle_event(down(150.0, 120.0, 20.0));
    assert_eq!(editor.editing(), Some(id("title")));

    let mut saved = String::new();
    let returned = editor.save(&mut |markup: &str| saved = markup.to_string());
    assert_eq!(returned.as_deref(), Some(saved.as_str()));

    for artifact in [
        "contenteditable",
        "data-restore",
        "data-size-lock",
        "drag-placeholder",
        "drag-handle",
    ] {
        assert!(!saved.contains(artifact), "{artifact} leaked into {saved}");
    }
    assert!(saved.contains(r#"id="intro""#));

    assert!(editor.is_closed());
    assert_eq!(editor.handle_event(down(600.0, 300.0, 30.0)), EventOutcome::IGNORED);
    assert!(editor.save(&mut |_: &str| {}).is_none());
}

#[test]
fn malformed_markup_is_rejected() {
    init_logging();
    assert!(SlideEditor::new("<div><p>open", EditorConfig::default()).is_err());
}

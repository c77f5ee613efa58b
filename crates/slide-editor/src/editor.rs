//! Editor façade.
//!
//! `SlideEditor` owns the document and every interaction engine, and is the
//! one place host events enter. Each operation follows the same pattern:
//! resolve the target, push a history snapshot, mutate through the
//! document, then re-anchor the selection handles.

use crate::clipboard::{Clipboard, Placement, capture, instantiate};
use crate::config::{EditorConfig, ScaleSource};
use crate::coords::{CoordinateMapper, Point};
use crate::document::{SlideDocument, SlideMutation, materialize_inherited};
use crate::drag::{DragEngine, DragSession};
use crate::handles::{HandleHit, HandleRole, HandleSet};
use crate::history::{History, HistoryKind};
use crate::hit::hit_test;
use crate::input::InputEvent;
use crate::persist::{SaveSink, cleaned_markup};
use crate::resize::{ResizeEngine, ResizeSession};
use crate::selection::Selection;
use crate::session::SessionContext;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::text_edit::{
    EditSession, FormatCommand, FormatEffect, apply_format, enter_edit, exit_edit, pin_size,
};
use crate::toolbar::{BusyFlag, LinkSpec, ToolbarCommand};
use serde::Serialize;
use slide_core::emitter::{escape_attr, escape_text};
use slide_core::{
    ApproxMetrics, BoxSizing, Bounds, Edges, NodeId, NodeKind, ObjectFit, ParseError, Positioning,
    SlideNode, TextMetrics, effective_style,
};

/// Content of a freshly inserted text box.
pub const TEXT_BOX_PLACEHOLDER: &str = "Type your text";

/// What the editor did with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EventOutcome {
    /// The event meant something to the editor.
    pub handled: bool,
    /// The slide tree changed.
    pub mutated: bool,
}

impl EventOutcome {
    pub const IGNORED: EventOutcome = EventOutcome {
        handled: false,
        mutated: false,
    };

    fn handled() -> Self {
        Self {
            handled: true,
            mutated: false,
        }
    }

    fn from_mutation(mutated: bool) -> Self {
        Self {
            handled: mutated,
            mutated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditingOverlay {
    pub id: String,
    pub outline: Bounds,
    pub caret: usize,
}

/// Everything the host draws above the slide, in canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub scale: f32,
    pub selected: Option<String>,
    pub handles: Option<HandleSet>,
    /// Dashed proxy box while dragging.
    pub ghost: Option<Bounds>,
    /// Node hidden while its ghost is dragged.
    pub hidden: Option<String>,
    pub hover: Option<Bounds>,
    pub editing: Option<EditingOverlay>,
}

pub struct SlideEditor {
    config: EditorConfig,
    doc: SlideDocument,
    mapper: CoordinateMapper,
    selection: Selection,
    drag: DragEngine,
    resize: ResizeEngine,
    editing: Option<EditSession>,
    /// Node whose height is re-measured on the next animation frame.
    pending_remeasure: Option<NodeId>,
    clipboard: Clipboard,
    history: History,
    session: SessionContext,
    busy: BusyFlag,
    closed: bool,
}

impl SlideEditor {
    /// Build an editor over `markup` with fixed-advance text metrics.
    pub fn new(markup: &str, config: EditorConfig) -> Result<Self, ParseError> {
        Self::with_metrics(markup, config, Box::new(ApproxMetrics::default()))
    }

    pub fn with_metrics(
        markup: &str,
        config: EditorConfig,
        metrics: Box<dyn TextMetrics>,
    ) -> Result<Self, ParseError> {
        let doc = SlideDocument::from_markup(markup, metrics)?;
        let scale = config.scale.scale(config.canvas_width).unwrap_or_else(|| {
            log::warn!("unusable scale {:?}, falling back to 1.0", config.scale);
            1.0
        });
        log::debug!("editor ready: {} nodes, scale {scale}", doc.tree.len());
        Ok(Self {
            mapper: CoordinateMapper::new(scale),
            selection: Selection::new(),
            drag: DragEngine::new(),
            resize: ResizeEngine::new(),
            editing: None,
            pending_remeasure: None,
            clipboard: Clipboard::new(config.copy_debounce_ms),
            history: History::new(config.history_depth, config.history_lock_ms),
            session: SessionContext::new(),
            busy: BusyFlag::new(config.busy_release_ms),
            closed: false,
            doc,
            config,
        })
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &SlideDocument {
        &self.doc
    }

    /// Current markup, editor state included.
    pub fn markup(&self) -> String {
        self.doc.markup()
    }

    /// Current markup as it would be saved.
    pub fn cleaned_markup(&self) -> String {
        cleaned_markup(&self.doc.tree)
    }

    pub fn bounds_of(&self, id: NodeId) -> Option<Bounds> {
        self.doc.bounds_of(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SlideNode> {
        self.doc.node(id)
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selection.selected()
    }

    pub fn handles(&self) -> Option<&HandleSet> {
        self.selection.handles()
    }

    pub fn editing(&self) -> Option<NodeId> {
        self.editing.as_ref().map(|e| e.node)
    }

    pub fn caret(&self) -> Option<usize> {
        self.editing.as_ref().map(|e| e.caret)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn inserted_images(&self) -> &[NodeId] {
        self.session.inserted_images()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_active()
    }

    pub fn scale(&self) -> f32 {
        self.mapper.scale()
    }

    fn session_active(&self) -> bool {
        self.drag.is_active() || self.resize.is_active()
    }

    fn capturing_pointer(&self) -> Option<i32> {
        self.drag
            .session()
            .map(|s| s.pointer_id)
            .or_else(|| self.resize.session().map(|s| s.pointer_id))
    }

    pub fn overlay(&self) -> OverlayState {
        let drag = self.drag.session();
        let hover = if self.session_active() {
            None
        } else {
            self.selection
                .hover()
                .filter(|&h| !self.selection.is_selected(h))
                .and_then(|h| self.doc.bounds_of(h))
        };
        OverlayState {
            scale: self.mapper.scale(),
            selected: self.selection.selected().map(|id| id.as_str().to_string()),
            handles: self.selection.handles().cloned(),
            ghost: drag.map(|s| s.ghost),
            hidden: drag.map(|s| s.node.as_str().to_string()),
            hover,
            editing: self.editing.as_ref().and_then(|e| {
                Some(EditingOverlay {
                    id: e.node.as_str().to_string(),
                    outline: self.doc.bounds_of(e.node)?,
                    caret: e.caret,
                })
            }),
        }
    }

    // ─── Surface ─────────────────────────────────────────────────────────

    pub fn attach_surface(&mut self, origin_x: f32, origin_y: f32) {
        self.mapper.attach(origin_x, origin_y);
        self.refresh_handles();
    }

    pub fn detach_surface(&mut self) {
        self.mapper.detach();
    }

    /// The canvas moved in client space (scroll, container resize).
    pub fn set_surface_origin(&mut self, origin_x: f32, origin_y: f32) -> bool {
        let moved = self.mapper.update_origin(origin_x, origin_y);
        self.refresh_handles();
        moved
    }

    pub fn set_scale_source(&mut self, source: ScaleSource) -> bool {
        let Some(scale) = source.scale(self.config.canvas_width) else {
            log::warn!("ignoring scale source {source:?}");
            return false;
        };
        self.config.scale = source;
        self.mapper.set_scale(scale)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node. A different node in text editing is committed first.
    pub fn select(&mut self, id: NodeId) -> bool {
        if !self
            .doc
            .capabilities(id)
            .is_some_and(|c| c.selectable())
        {
            return false;
        }
        if self.editing().is_some_and(|e| e != id) {
            self.exit_text_edit();
        }
        let Some(b) = self.doc.bounds_of(id) else {
            log::debug!("{id} has no box, not selecting");
            return false;
        };
        self.selection.select(id, b, &self.config);
        true
    }

    pub fn deselect(&mut self) -> bool {
        self.exit_text_edit();
        self.selection.deselect().is_some()
    }

    /// Re-anchor handles to the selection's current box (the ghost while
    /// dragging).
    pub fn refresh_handles(&mut self) {
        let Some(id) = self.selection.selected() else {
            return;
        };
        let target = match self.drag.session() {
            Some(s) if s.node == id => Some(s.ghost),
            _ => self.doc.bounds_of(id),
        };
        match target {
            Some(b) => {
                self.selection.refresh(b, &self.config);
            }
            None => {
                log::debug!("selection {id} lost its box");
                self.selection.hide_handles();
            }
        }
    }

    /// Topmost selectable node under a canvas point.
    fn selectable_at(&mut self, p: Point) -> Option<NodeId> {
        let mut id = hit_test(&self.doc.tree, &self.doc.bounds, p.x, p.y)?;
        loop {
            if self.doc.capabilities(id).is_some_and(|c| c.selectable()) {
                return Some(id);
            }
            let idx = self.doc.tree.index_of(id)?;
            let parent = self.doc.tree.parent(idx)?;
            id = self.doc.tree.graph[parent].id;
        }
    }

    // ─── Event dispatch ──────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: InputEvent) -> EventOutcome {
        if self.closed {
            return EventOutcome::IGNORED;
        }
        if let (Some(pid), Some(captured)) = (event.pointer_id(), self.capturing_pointer())
            && pid != captured
        {
            log::trace!("pointer {pid} ignored while {captured} holds capture");
            return EventOutcome::IGNORED;
        }

        match event {
            InputEvent::PointerDown {
                x,
                y,
                pointer_id,
                time_ms,
            } => self.pointer_down(Point::new(x, y), pointer_id, time_ms),
            InputEvent::PointerMove { x, y, pointer_id, .. } => {
                self.pointer_move(Point::new(x, y), pointer_id)
            }
            InputEvent::PointerUp { x, y, pointer_id, .. } => {
                self.pointer_up(Point::new(x, y), pointer_id)
            }
            InputEvent::PointerCancel { .. } => self.pointer_cancel(),
            InputEvent::PointerLeave => {
                self.selection.set_hover(None);
                EventOutcome::handled()
            }
            InputEvent::Blur { time_ms } => self.blur(time_ms),
            InputEvent::Key {
                key,
                ctrl,
                shift,
                alt,
                meta,
                repeat,
                time_ms,
            } => self.key(&key, ctrl, shift, alt, meta, repeat, time_ms),
            InputEvent::Scroll { origin_x, origin_y } => {
                self.set_surface_origin(origin_x, origin_y);
                EventOutcome::handled()
            }
            InputEvent::AnimationFrame { .. } => EventOutcome::from_mutation(self.animation_frame()),
        }
    }

    fn pointer_down(&mut self, client: Point, pointer_id: i32, now: f64) -> EventOutcome {
        if self.session_active() {
            return EventOutcome::IGNORED;
        }
        let Some(p) = self.mapper.to_canvas_xy(client.x, client.y) else {
            log::debug!("pointer down without a surface");
            return EventOutcome::IGNORED;
        };

        if let Some(id) = self.selection.selected()
            && let Some(hit) = self.selection.handles().and_then(|h| h.hit(p.x, p.y))
        {
            let started = match hit {
                HandleHit::Move => self.begin_drag(id, pointer_id, p, now),
                HandleHit::Resize(role) => self.begin_resize(id, role, pointer_id, client, now),
            };
            return EventOutcome {
                handled: started,
                mutated: started,
            };
        }

        match self.selectable_at(p) {
            Some(id) if self.editing() == Some(id) => {
                let caret = self.doc.caret_at(id, p.x, p.y);
                if let Some(e) = &mut self.editing {
                    e.caret = caret;
                }
                EventOutcome::handled()
            }
            Some(id) => {
                self.select(id);
                let text = self.doc.capabilities(id).is_some_and(|c| c.text_editable);
                let mutated = text && self.enter_text_edit(id, Some(p));
                EventOutcome {
                    handled: true,
                    mutated,
                }
            }
            None => {
                let mutated = self.editing.is_some();
                self.deselect();
                EventOutcome {
                    handled: true,
                    mutated,
                }
            }
        }
    }

    fn pointer_move(&mut self, client: Point, pointer_id: i32) -> EventOutcome {
        if self.drag.is_active() {
            let Some(p) = self.mapper.to_canvas_xy(client.x, client.y) else {
                log::debug!("drag tick skipped: no surface");
                return EventOutcome::IGNORED;
            };
            if self.drag.on_move(pointer_id, p).is_none() {
                return EventOutcome::IGNORED;
            }
            self.refresh_handles();
            return EventOutcome::handled();
        }

        if self.resize.is_active() {
            if !self.mapper.is_attached() {
                log::debug!("resize tick skipped: no surface");
                return EventOutcome::IGNORED;
            }
            let follows = self
                .resize
                .session()
                .is_some_and(|s| s.height_follows_content);
            let Some((id, b)) =
                self.resize
                    .on_move(pointer_id, client, &self.mapper, self.config.min_size)
            else {
                return EventOutcome::IGNORED;
            };
            self.doc.apply(SlideMutation::SetBox {
                id,
                bounds: b,
                lock_height: !follows,
            });
            match self.doc.bounds_of(id) {
                Some(rendered) => self.resize.settle(rendered),
                None => log::warn!("{id} has no box after resize tick"),
            }
            self.refresh_handles();
            return EventOutcome {
                handled: true,
                mutated: true,
            };
        }

        // Plain hover.
        let hover = self
            .mapper
            .to_canvas_xy(client.x, client.y)
            .and_then(|p| self.selectable_at(p));
        self.selection.set_hover(hover);
        EventOutcome::IGNORED
    }

    fn pointer_up(&mut self, client: Point, pointer_id: i32) -> EventOutcome {
        if self.drag.is_active() {
            let p = self
                .mapper
                .to_canvas_xy(client.x, client.y)
                .or_else(|| {
                    // Surface went away mid-drag: land where the ghost is.
                    self.drag.session().map(|s| {
                        Point::new(s.ghost.x + s.delta.0, s.ghost.y + s.delta.1)
                    })
                });
            let Some(p) = p else {
                return EventOutcome::IGNORED;
            };
            let Some(session) = self.drag.finish(pointer_id, p) else {
                return EventOutcome::IGNORED;
            };
            self.commit_drag(&session);
            return EventOutcome {
                handled: true,
                mutated: true,
            };
        }

        if self.resize.is_active() {
            let Some(session) = self.resize.finish(pointer_id) else {
                return EventOutcome::IGNORED;
            };
            self.end_resize(&session);
            return EventOutcome {
                handled: true,
                mutated: true,
            };
        }
        EventOutcome::IGNORED
    }

    fn pointer_cancel(&mut self) -> EventOutcome {
        if let Some(session) = self.drag.cancel() {
            self.cancel_drag(session);
            return EventOutcome {
                handled: true,
                mutated: true,
            };
        }
        if let Some(session) = self.resize.cancel() {
            self.end_resize(&session);
            return EventOutcome {
                handled: true,
                mutated: true,
            };
        }
        EventOutcome::IGNORED
    }

    fn blur(&mut self, now: f64) -> EventOutcome {
        if self.editing.is_none() || self.busy.is_busy(now) {
            return EventOutcome::IGNORED;
        }
        EventOutcome::from_mutation(self.exit_text_edit())
    }

    #[allow(clippy::too_many_arguments)]
    fn key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        repeat: bool,
        now: f64,
    ) -> EventOutcome {
        if self.editing.is_some() {
            return match ShortcutMap::resolve_editing(key, shift) {
                Some(ShortcutAction::ExitEdit) => {
                    EventOutcome::from_mutation(self.exit_text_edit())
                }
                _ => EventOutcome::IGNORED,
            };
        }

        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return EventOutcome::IGNORED;
        };
        match action {
            ShortcutAction::Undo => EventOutcome::from_mutation(self.undo(now, repeat)),
            ShortcutAction::Redo => EventOutcome::from_mutation(self.redo(now, repeat)),
            ShortcutAction::Copy => EventOutcome {
                handled: self.copy(now),
                mutated: false,
            },
            ShortcutAction::Paste => EventOutcome::from_mutation(self.paste(now)),
            ShortcutAction::Duplicate => EventOutcome::from_mutation(self.duplicate(now)),
            ShortcutAction::Delete => EventOutcome::from_mutation(self.delete(now)),
            ShortcutAction::Bold => EventOutcome::from_mutation(self.format(FormatCommand::Bold, now)),
            ShortcutAction::Italic => {
                EventOutcome::from_mutation(self.format(FormatCommand::Italic, now))
            }
            ShortcutAction::Underline => {
                EventOutcome::from_mutation(self.format(FormatCommand::Underline, now))
            }
            ShortcutAction::Deselect | ShortcutAction::ExitEdit => EventOutcome {
                handled: self.deselect(),
                mutated: false,
            },
        }
    }

    // ─── Drag ────────────────────────────────────────────────────────────

    fn begin_drag(&mut self, id: NodeId, pointer_id: i32, p: Point, now: f64) -> bool {
        if !self.doc.capabilities(id).is_some_and(|c| c.movable) {
            return false;
        }
        let (Some(start), Some(original)) = (self.doc.bounds_of(id), self.doc.node(id).cloned())
        else {
            return false;
        };

        self.history
            .push_undo(HistoryKind::Move, self.doc.markup(), now);
        let mut session = DragSession::new(id, pointer_id, p, start, original);

        if !session.original.position.is_absolute() {
            let placeholder = self.session.anonymous_id(&self.doc.tree, 'p');
            if self.doc.apply(SlideMutation::Promote { id, placeholder }) {
                session.placeholder = Some(placeholder);
            }
        } else if matches!(session.original.kind, NodeKind::Image { .. }) {
            self.doc.apply(SlideMutation::SetBox {
                id,
                bounds: start,
                lock_height: true,
            });
        }

        self.drag.begin(session);
        self.refresh_handles();
        true
    }

    fn commit_drag(&mut self, session: &DragSession) {
        let id = session.node;
        self.doc.apply(SlideMutation::MoveTo {
            id,
            left: session.ghost.x,
            top: session.ghost.y,
        });
        self.doc.apply(SlideMutation::Hoist { id });
        log::debug!("dropped {id} at ({}, {})", session.ghost.x, session.ghost.y);
        self.refresh_handles();
    }

    fn cancel_drag(&mut self, session: DragSession) {
        let id = session.node;
        self.doc.apply(SlideMutation::Replace {
            node: Box::new(session.original),
        });
        if let Some(placeholder) = session.placeholder {
            self.doc.apply(SlideMutation::Remove { id: placeholder });
        }
        self.history.withdraw(HistoryKind::Move);
        log::debug!("drag of {id} cancelled");
        self.refresh_handles();
    }

    // ─── Resize ──────────────────────────────────────────────────────────

    fn begin_resize(
        &mut self,
        id: NodeId,
        role: HandleRole,
        pointer_id: i32,
        client: Point,
        now: f64,
    ) -> bool {
        let Some(caps) = self.doc.capabilities(id).filter(|c| c.resizable) else {
            return false;
        };
        let Some(start) = self.doc.bounds_of(id) else {
            return false;
        };

        self.history
            .push_undo(HistoryKind::Resize, self.doc.markup(), now);
        if self.doc.node(id).is_some_and(|n| !n.position.is_absolute()) {
            let placeholder = self.session.anonymous_id(&self.doc.tree, 'p');
            self.doc.apply(SlideMutation::Promote { id, placeholder });
        }
        let session = ResizeSession::new(
            id,
            pointer_id,
            role,
            client,
            start,
            caps.aspect_locked,
            caps.text_editable,
        );
        self.doc.apply(SlideMutation::SetBox {
            id,
            bounds: start,
            lock_height: !session.height_follows_content,
        });
        self.resize.begin(session);
        self.refresh_handles();
        true
    }

    fn end_resize(&mut self, session: &ResizeSession) {
        let id = session.node;
        if session.height_follows_content {
            self.doc.apply(SlideMutation::RelockHeight { id });
            if let Some(b) = self.doc.bounds_of(id)
                && b.height < self.config.min_size
            {
                self.doc.apply(SlideMutation::SetBox {
                    id,
                    bounds: Bounds::new(b.x, b.y, b.width, self.config.min_size),
                    lock_height: true,
                });
            }
        }
        log::debug!("resized {id} to {:?}", self.doc.bounds_of(id));
        self.refresh_handles();
    }

    // ─── Text editing ────────────────────────────────────────────────────

    /// Put a text node into edit mode, caret nearest `at` (or at the end).
    pub fn enter_text_edit(&mut self, id: NodeId, at: Option<Point>) -> bool {
        if self.editing() == Some(id) {
            return false;
        }
        if !self.doc.capabilities(id).is_some_and(|c| c.text_editable) {
            return false;
        }
        self.exit_text_edit();
        let (Some(rendered), Some(node)) = (self.doc.bounds_of(id), self.doc.node(id)) else {
            return false;
        };
        let (mut editing, record) = enter_edit(node, &rendered);
        editing.restore = Some(record);
        self.doc.apply(SlideMutation::Replace {
            node: Box::new(editing),
        });

        let caret = match at {
            Some(p) => self.doc.caret_at(id, p.x, p.y),
            None => self.doc.text_len(id),
        };
        self.editing = Some(EditSession::new(id, caret));
        self.selection.select(id, rendered, &self.config);
        log::debug!("editing {id}, caret {caret}");
        true
    }

    /// Leave edit mode, restoring the recorded box model. Handles go too.
    pub fn exit_text_edit(&mut self) -> bool {
        let Some(session) = self.editing.take() else {
            return false;
        };
        let id = session.node;
        if self.pending_remeasure == Some(id) {
            // Settle the height now; the frame would come too late.
            self.remeasure(id);
            self.pending_remeasure = None;
        }
        let Some(node) = self.doc.node(id) else {
            return false;
        };
        let done = match &node.restore {
            Some(record) => exit_edit(node, record),
            None => {
                let mut n = node.clone();
                n.editable = false;
                n
            }
        };
        self.doc.apply(SlideMutation::Replace {
            node: Box::new(done),
        });
        if self.selection.is_selected(id) {
            self.selection.deselect();
        }
        log::debug!("left editing {id}");
        true
    }

    /// Replace the editing node's content with what the host reports.
    pub fn set_text(&mut self, id: NodeId, content: &str, now: f64) -> bool {
        let Some(session) = self.editing.as_mut().filter(|e| e.node == id) else {
            return false;
        };
        if !session.text_recorded {
            self.history
                .push_undo(HistoryKind::Edit, self.doc.markup(), now);
            session.text_recorded = true;
        }
        let applied = self.doc.apply(SlideMutation::SetContent {
            id,
            content: content.to_string(),
        });
        let len = self.doc.text_len(id);
        if let Some(e) = &mut self.editing {
            e.caret = e.caret.min(len);
        }
        applied
    }

    /// Node formatting commands act on: the editing node, else a selected
    /// text node.
    fn format_target(&mut self) -> Option<NodeId> {
        if let Some(id) = self.editing() {
            return Some(id);
        }
        let id = self.selection.selected()?;
        self.doc
            .capabilities(id)
            .is_some_and(|c| c.text_editable)
            .then_some(id)
    }

    pub fn format(&mut self, cmd: FormatCommand, now: f64) -> bool {
        let Some(id) = self.format_target() else {
            return false;
        };
        if self.doc.node(id).is_none() {
            return false;
        }
        self.history
            .push_undo(HistoryKind::Edit, self.doc.markup(), now);
        let Some(node) = self.doc.node_mut(id) else {
            return false;
        };
        let was_locked = node.editable || node.size.is_height_locked();
        let effect = apply_format(node, &cmd);
        self.doc.relayout();

        match effect {
            FormatEffect::RelockHeight if was_locked => {
                self.doc.apply(SlideMutation::RelockHeight { id });
            }
            FormatEffect::RemeasureNextFrame if was_locked => {
                self.pending_remeasure = Some(id);
            }
            _ => {}
        }
        self.refresh_handles();
        true
    }

    fn remeasure(&mut self, id: NodeId) -> bool {
        self.doc.relayout();
        let Some(b) = self.doc.bounds_of(id) else {
            log::debug!("{id} vanished before re-measure");
            return false;
        };
        let Some(node) = self.doc.node_mut(id) else {
            return false;
        };
        pin_size(node, b.width, b.height);
        if node.editable {
            node.box_model.overflow = Some("hidden".into());
        }
        self.doc.relayout();
        true
    }

    fn animation_frame(&mut self) -> bool {
        let Some(id) = self.pending_remeasure.take() else {
            return false;
        };
        let done = self.remeasure(id);
        self.refresh_handles();
        done
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    pub fn copy(&mut self, now: f64) -> bool {
        let Some(id) = self.selection.selected() else {
            return false;
        };
        let (Some(idx), Some(rendered)) = (self.doc.tree.index_of(id), self.doc.bounds_of(id))
        else {
            return false;
        };
        let mut root = capture(&self.doc.tree, idx);
        materialize_inherited(&mut root.node.style, effective_style(&self.doc.tree, idx));
        self.clipboard.copy(root, rendered, now)
    }

    pub fn paste(&mut self, now: f64) -> bool {
        let Some(payload) = self.clipboard.read() else {
            return false;
        };
        let anchor = self
            .selection
            .selected()
            .and_then(|id| self.doc.bounds_of(id))
            .unwrap_or(payload.rendered);
        self.exit_text_edit();
        self.history
            .push_undo(HistoryKind::Paste, self.doc.markup(), now);

        let root = self.doc.tree.root;
        let Some(idx) = instantiate(
            &mut self.doc.tree,
            &mut self.session,
            &payload.root,
            Placement::Append(root),
        ) else {
            return false;
        };
        let off = self.config.paste_offset;
        let node = &mut self.doc.tree.graph[idx];
        node.position = Positioning::Absolute {
            left: anchor.x + off,
            top: anchor.y + off,
        };
        node.box_model.margin = Edges::ZERO;
        pin_size(node, payload.rendered.width, payload.rendered.height);
        let id = node.id;
        self.doc.relayout();
        log::debug!("pasted {id}");
        self.select(id)
    }

    pub fn duplicate(&mut self, now: f64) -> bool {
        let Some(source) = self.selection.selected() else {
            return false;
        };
        self.exit_text_edit();
        let Some(idx) = self.doc.tree.index_of(source) else {
            return false;
        };
        self.history
            .push_undo(HistoryKind::Paste, self.doc.markup(), now);

        let clip = capture(&self.doc.tree, idx);
        let Some(copy) = instantiate(
            &mut self.doc.tree,
            &mut self.session,
            &clip,
            Placement::After(idx),
        ) else {
            return false;
        };
        let off = self.config.duplicate_offset;
        let base_z = self.config.insert_z_index;
        let node = &mut self.doc.tree.graph[copy];
        if let Positioning::Absolute { left, top } = node.position {
            node.position = Positioning::Absolute {
                left: left + off,
                top: top + off,
            };
            node.style.z_index = Some(node.style.z_index.unwrap_or(base_z) + 1);
        }
        let id = node.id;
        self.doc.relayout();
        log::debug!("duplicated {source} as {id}");
        self.select(id)
    }

    pub fn delete(&mut self, now: f64) -> bool {
        let Some(id) = self.selection.selected() else {
            return false;
        };
        self.exit_text_edit();
        self.history
            .push_undo(HistoryKind::Delete, self.doc.markup(), now);
        let removed = self.doc.apply(SlideMutation::Remove { id });
        self.selection.deselect();
        self.selection.set_hover(None);
        removed
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self, now: f64, repeat: bool) -> bool {
        self.step_history(now, repeat, true)
    }

    pub fn redo(&mut self, now: f64, repeat: bool) -> bool {
        self.step_history(now, repeat, false)
    }

    fn step_history(&mut self, now: f64, repeat: bool, undo: bool) -> bool {
        if self.session_active() || !self.history.accepts(now, repeat) {
            return false;
        }
        let available = if undo {
            self.history.can_undo()
        } else {
            self.history.can_redo()
        };
        if !available {
            return false;
        }

        self.exit_text_edit();
        let current = self.doc.markup();
        let entry = if undo {
            self.history.undo(current, now, repeat)
        } else {
            self.history.redo(current, now, repeat)
        };
        let Some(entry) = entry else {
            return false;
        };
        if let Err(e) = self.doc.restore(&entry.before_snapshot) {
            log::warn!("history snapshot failed to parse: {e}");
            return false;
        }
        self.selection.deselect();
        self.selection.set_hover(None);
        self.pending_remeasure = None;
        log::debug!("{} {:?}", if undo { "undo" } else { "redo" }, entry.kind);
        true
    }

    // ─── Toolbar ─────────────────────────────────────────────────────────

    /// Run a named toolbar command. Marks the toolbar busy so the focus
    /// change it causes does not end text editing.
    pub fn toolbar(&mut self, name: &str, value: Option<&str>, now: f64) -> bool {
        self.busy.set(now);
        let Some(cmd) = ToolbarCommand::parse(name, value) else {
            log::debug!("unknown or incomplete toolbar command {name}");
            return false;
        };
        self.run_toolbar(cmd, now)
    }

    pub fn run_toolbar(&mut self, cmd: ToolbarCommand, now: f64) -> bool {
        if self.closed {
            return false;
        }
        self.busy.set(now);
        match cmd {
            ToolbarCommand::Format(f) => self.format(f, now),
            ToolbarCommand::InsertTextBox => self.insert_text_box(now),
            ToolbarCommand::InsertImage(src) => self.insert_image(&src, now),
            ToolbarCommand::InsertLink(link) => self.insert_link(&link, now),
            ToolbarCommand::Duplicate => self.duplicate(now),
            ToolbarCommand::Delete => self.delete(now),
        }
    }

    /// The toolbar interaction is over.
    pub fn release_busy(&mut self) {
        self.busy.release();
    }

    fn insert_text_box(&mut self, now: f64) -> bool {
        self.exit_text_edit();
        self.history
            .push_undo(HistoryKind::Paste, self.doc.markup(), now);

        let cfg = &self.config;
        let id = self.session.fresh_id(&self.doc.tree, "text-box");
        let mut node = SlideNode::new(
            id,
            NodeKind::Text {
                content: TEXT_BOX_PLACEHOLDER.to_string(),
            },
            "div",
        );
        node.position = Positioning::Absolute {
            left: (cfg.canvas_width - cfg.text_box_width) / 2.0,
            top: (cfg.canvas_height - cfg.text_box_min_height) / 2.0,
        };
        node.size.width = Some(cfg.text_box_width);
        node.size.min_height = Some(cfg.text_box_min_height);
        node.box_model.padding = Edges {
            top: 12.0,
            right: 16.0,
            bottom: 12.0,
            left: 16.0,
        };
        node.box_model.box_sizing = Some(BoxSizing::BorderBox);
        node.box_model.white_space = Some("pre-wrap".into());
        node.style.font_size = Some(cfg.text_box_font_size);
        node.style.line_height = Some("1.4".into());
        node.style.color = Some("#111827".into());
        node.style.z_index = Some(cfg.insert_z_index);

        let root = self.doc.tree.root;
        self.doc.tree.add_node(root, node);
        self.doc.relayout();
        self.select(id);
        self.enter_text_edit(id, None)
    }

    fn insert_image(&mut self, src: &str, now: f64) -> bool {
        let (w, h) = self.config.image_insert_size;

        if let Some(id) = self.editing() {
            let Some(NodeKind::Text { content }) = self.doc.node(id).map(|n| &n.kind) else {
                return false;
            };
            self.history
                .push_undo(HistoryKind::Paste, self.doc.markup(), now);
            let content = format!(
                "{content}<img src=\"{}\" style=\"width: {w}px; height: {h}px; object-fit: contain\">",
                escape_attr(src)
            );
            return self.doc.apply(SlideMutation::SetContent { id, content });
        }

        self.history
            .push_undo(HistoryKind::Paste, self.doc.markup(), now);
        let cfg = &self.config;
        let id = self.session.fresh_id(&self.doc.tree, "image");
        let mut node = SlideNode::new(
            id,
            NodeKind::Image {
                src: src.to_string(),
            },
            "img",
        );
        node.position = Positioning::Absolute {
            left: (cfg.canvas_width - w) / 2.0,
            top: (cfg.canvas_height - h) / 2.0,
        };
        node.lock_size(w, h);
        node.style.object_fit = Some(ObjectFit::Fill);
        node.style.z_index = Some(cfg.insert_z_index);
        node.aspect_locked = true;

        let root = self.doc.tree.root;
        self.doc.tree.add_node(root, node);
        self.doc.relayout();
        self.session.record_inserted_image(id);
        self.select(id)
    }

    fn insert_link(&mut self, link: &LinkSpec, now: f64) -> bool {
        let Some(id) = self.editing() else {
            return false;
        };
        let Some(NodeKind::Text { content }) = self.doc.node(id).map(|n| &n.kind) else {
            return false;
        };
        let text = if link.text.is_empty() {
            &link.url
        } else {
            &link.text
        };
        let content = format!(
            "{content}<a href=\"{}\">{}</a>",
            escape_attr(&link.url),
            escape_text(text)
        );
        self.history
            .push_undo(HistoryKind::Paste, self.doc.markup(), now);
        self.doc.apply(SlideMutation::SetContent { id, content })
    }

    // ─── Save ────────────────────────────────────────────────────────────

    /// Hand cleaned markup to `sink` and close the editor. Running gestures
    /// are cancelled and text editing is committed first.
    pub fn save(&mut self, sink: &mut dyn SaveSink) -> Option<String> {
        if self.closed {
            return None;
        }
        if let Some(session) = self.drag.cancel() {
            self.cancel_drag(session);
        }
        if let Some(session) = self.resize.cancel() {
            self.end_resize(&session);
        }
        self.exit_text_edit();
        self.selection.deselect();

        let markup = self.cleaned_markup();
        sink.save(&markup);
        self.closed = true;
        log::debug!("saved slide ({} bytes), editor closed", markup.len());
        Some(markup)
    }
}

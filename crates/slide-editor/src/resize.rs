//! Resize engine.
//!
//! `resize_box` is the whole geometry rule: a start box, a handle role and
//! a canvas-space pointer delta in, the new box out. The engine around it
//! only tracks the gesture.

use crate::coords::{CoordinateMapper, Point};
use crate::handles::HandleRole;
use slide_core::{Bounds, NodeId};

/// Apply a handle drag of `(dx, dy)` canvas pixels to `start`.
///
/// Corner handles on aspect-locked boxes keep the start ratio, following
/// whichever axis changed proportionally more. Everything else resizes the
/// affected axes freely. Width and height never drop below `min`, and the
/// edge opposite the handle stays put.
pub fn resize_box(
    role: HandleRole,
    start: Bounds,
    dx: f32,
    dy: f32,
    aspect_locked: bool,
    min: f32,
) -> Bounds {
    let raw_w = if role.moves_left() {
        start.width - dx
    } else {
        start.width + dx
    };
    let raw_h = if role.moves_top() {
        start.height - dy
    } else {
        start.height + dy
    };

    let (w, h) = if aspect_locked && role.is_corner() && start.width > 0.0 && start.height > 0.0
    {
        let sx = raw_w / start.width;
        let sy = raw_h / start.height;
        let s = if (sx - 1.0).abs() >= (sy - 1.0).abs() {
            sx
        } else {
            sy
        };
        let (w, h) = (start.width * s, start.height * s);
        if w < min || h < min {
            let k = (min / start.width).max(min / start.height);
            (start.width * k, start.height * k)
        } else {
            (w, h)
        }
    } else {
        let w = if role.affects_width() {
            raw_w.max(min)
        } else {
            start.width
        };
        let h = if role.affects_height() {
            raw_h.max(min)
        } else {
            start.height
        };
        (w, h)
    };

    let x = if role.moves_left() {
        start.right() - w
    } else {
        start.x
    };
    let y = if role.moves_top() {
        start.bottom() - h
    } else {
        start.y
    };
    Bounds::new(x, y, w, h)
}

// ─── Session ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ResizeSession {
    pub node: NodeId,
    pub pointer_id: i32,
    pub role: HandleRole,
    /// Client-space pointer position at press.
    pub start_pointer: Point,
    pub start_box: Bounds,
    pub aspect_locked: bool,
    /// Width-only gesture on an unlocked text node: height is measured from
    /// content while it runs. Every other node keeps its start height.
    pub height_follows_content: bool,
    /// Last box written to the node.
    pub last: Bounds,
}

impl ResizeSession {
    pub fn new(
        node: NodeId,
        pointer_id: i32,
        role: HandleRole,
        start_pointer: Point,
        start_box: Bounds,
        aspect_locked: bool,
        text: bool,
    ) -> Self {
        Self {
            node,
            pointer_id,
            role,
            start_pointer,
            start_box,
            aspect_locked,
            height_follows_content: text && !aspect_locked && !role.affects_height(),
            last: start_box,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResizeEngine {
    session: Option<ResizeSession>,
}

impl ResizeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&ResizeSession> {
        self.session.as_ref()
    }

    /// Start a gesture. Refused while another one runs.
    pub fn begin(&mut self, session: ResizeSession) -> bool {
        if self.session.is_some() {
            return false;
        }
        log::debug!("resize {} from {:?} via {:?}", session.node, session.start_box, session.role);
        self.session = Some(session);
        true
    }

    /// Pointer moved to `client`. Returns the box to write, or `None` when
    /// there is no session for this pointer.
    pub fn on_move(
        &mut self,
        pointer_id: i32,
        client: Point,
        mapper: &CoordinateMapper,
        min: f32,
    ) -> Option<(NodeId, Bounds)> {
        let session = self.session.as_mut().filter(|s| s.pointer_id == pointer_id)?;
        let (dx, dy) = mapper.delta_to_canvas(
            client.x - session.start_pointer.x,
            client.y - session.start_pointer.y,
        );
        let next = resize_box(
            session.role,
            session.start_box,
            dx,
            dy,
            session.aspect_locked,
            min,
        );
        session.last = next;
        Some((session.node, next))
    }

    /// Record the box the node actually rendered at after a tick.
    pub fn settle(&mut self, rendered: Bounds) {
        if let Some(s) = &mut self.session {
            s.last = rendered;
        }
    }

    pub fn finish(&mut self, pointer_id: i32) -> Option<ResizeSession> {
        if self.session.as_ref()?.pointer_id != pointer_id {
            return None;
        }
        self.session.take()
    }

    /// End the gesture where it stands.
    pub fn cancel(&mut self) -> Option<ResizeSession> {
        self.session.take()
    }
}

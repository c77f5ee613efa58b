//! Drag engine: `Idle → Dragging → Idle`.
//!
//! While dragging, the real node is hidden and a ghost box follows the
//! pointer. The node itself is only written once, on release.

use crate::coords::Point;
use slide_core::{Bounds, NodeId, SlideNode};

#[derive(Debug, Clone)]
pub struct DragSession {
    pub node: NodeId,
    pub pointer_id: i32,
    /// Pointer offset from the node's top-left at press.
    pub delta: (f32, f32),
    pub start_box: Bounds,
    pub ghost: Bounds,
    /// Node data before the drag touched it, for cancellation.
    pub original: SlideNode,
    /// Flow slot stand-in inserted when the node was promoted.
    pub placeholder: Option<NodeId>,
}

impl DragSession {
    pub fn new(
        node: NodeId,
        pointer_id: i32,
        pointer: Point,
        start_box: Bounds,
        original: SlideNode,
    ) -> Self {
        Self {
            node,
            pointer_id,
            delta: (pointer.x - start_box.x, pointer.y - start_box.y),
            start_box,
            ghost: start_box,
            original,
            placeholder: None,
        }
    }

    /// Top-left the node lands on for a pointer at `p`.
    pub fn target(&self, p: Point) -> (f32, f32) {
        (p.x - self.delta.0, p.y - self.delta.1)
    }
}

#[derive(Debug, Default)]
pub enum DragEngine {
    #[default]
    Idle,
    Dragging(DragSession),
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self, DragEngine::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            DragEngine::Dragging(s) => Some(s),
            DragEngine::Idle => None,
        }
    }

    pub fn begin(&mut self, session: DragSession) -> bool {
        if self.is_active() {
            return false;
        }
        log::debug!("drag {} from {:?}", session.node, session.start_box);
        *self = DragEngine::Dragging(session);
        true
    }

    /// Move the ghost. Returns its new box, or `None` for foreign pointers
    /// and when idle.
    pub fn on_move(&mut self, pointer_id: i32, p: Point) -> Option<Bounds> {
        let DragEngine::Dragging(s) = self else {
            return None;
        };
        if s.pointer_id != pointer_id {
            return None;
        }
        let (x, y) = s.target(p);
        s.ghost = Bounds::new(x, y, s.ghost.width, s.ghost.height);
        Some(s.ghost)
    }

    /// Release: hands back the session with the final ghost position.
    pub fn finish(&mut self, pointer_id: i32, p: Point) -> Option<DragSession> {
        if self.session()?.pointer_id != pointer_id {
            return None;
        }
        self.on_move(pointer_id, p);
        match std::mem::take(self) {
            DragEngine::Dragging(s) => Some(s),
            DragEngine::Idle => None,
        }
    }

    pub fn cancel(&mut self) -> Option<DragSession> {
        match std::mem::take(self) {
            DragEngine::Dragging(s) => Some(s),
            DragEngine::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_core::NodeKind;

    fn session(pointer: Point) -> DragSession {
        let id = NodeId::intern("drag_me");
        DragSession::new(
            id,
            7,
            pointer,
            Bounds::new(100.0, 100.0, 200.0, 50.0),
            SlideNode::new(id, NodeKind::Shape, "div"),
        )
    }

    #[test]
    fn ghost_keeps_grab_offset() {
        let mut engine = DragEngine::new();
        assert!(engine.begin(session(Point::new(110.0, 120.0))));
        let ghost = engine.on_move(7, Point::new(310.0, 220.0)).unwrap();
        assert_eq!(ghost, Bounds::new(300.0, 200.0, 200.0, 50.0));
    }

    #[test]
    fn foreign_pointer_is_ignored() {
        let mut engine = DragEngine::new();
        engine.begin(session(Point::new(110.0, 120.0)));
        assert!(engine.on_move(8, Point::new(0.0, 0.0)).is_none());
        assert!(engine.finish(8, Point::new(0.0, 0.0)).is_none());
        assert!(engine.is_active());
    }

    #[test]
    fn second_drag_is_refused() {
        let mut engine = DragEngine::new();
        assert!(engine.begin(session(Point::new(110.0, 120.0))));
        assert!(!engine.begin(session(Point::new(0.0, 0.0))));
    }

    #[test]
    fn finish_returns_final_ghost() {
        let mut engine = DragEngine::new();
        engine.begin(session(Point::new(110.0, 120.0)));
        let s = engine.finish(7, Point::new(60.0, 70.0)).unwrap();
        assert_eq!((s.ghost.x, s.ghost.y), (50.0, 50.0));
        assert!(!engine.is_active());
        assert!(engine.cancel().is_none());
    }
}

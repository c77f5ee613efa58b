//! Undo/redo history.
//!
//! Every mutating action pushes the full markup snapshot taken *before* it
//! ran. Undo swaps the current markup onto the redo stack and hands back
//! the snapshot to restore; redo is the mirror image. The history never
//! touches the document itself, the editor restores what it is given.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Move,
    Resize,
    Paste,
    Delete,
    Edit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub before_snapshot: String,
    /// Host time of the push, in milliseconds.
    pub timestamp: f64,
}

/// Bounded undo and redo stacks.
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    /// Maximum depth of each stack; the oldest entries are dropped.
    max_depth: usize,
    lock_ms: f64,
    /// Undo/redo are ignored until this host time.
    locked_until: f64,
    /// Redo stack cleared by the last push, kept so a withdrawn push can
    /// put it back.
    cleared_redo: Option<Vec<HistoryEntry>>,
}

impl History {
    pub fn new(max_depth: usize, lock_ms: f64) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::new(),
            max_depth,
            lock_ms,
            locked_until: f64::NEG_INFINITY,
            cleared_redo: None,
        }
    }

    /// Record the state before a mutation. Clears redo.
    pub fn push_undo(&mut self, kind: HistoryKind, before_snapshot: String, now: f64) {
        self.undo_stack.push(HistoryEntry {
            kind,
            before_snapshot,
            timestamp: now,
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.cleared_redo = Some(std::mem::take(&mut self.redo_stack));
        log::trace!("history push {kind:?} (depth {})", self.undo_stack.len());
    }

    /// Take back the most recent push when the action it guarded turned out
    /// to change nothing. The redo stack it cleared comes back.
    pub fn withdraw(&mut self, kind: HistoryKind) -> Option<HistoryEntry> {
        if self.undo_stack.last()?.kind != kind {
            return None;
        }
        let entry = self.undo_stack.pop();
        if let Some(redo) = self.cleared_redo.take() {
            self.redo_stack = redo;
        }
        entry
    }

    /// Whether an undo/redo step at `now` would be honoured: key repeats
    /// are ignored and a short lock follows every step.
    pub fn accepts(&self, now: f64, repeat: bool) -> bool {
        !repeat && now >= self.locked_until
    }

    /// Pop the last entry, leaving `current` on the redo stack. Returns the
    /// snapshot to restore, or `None` if empty, repeated or locked.
    pub fn undo(&mut self, current: String, now: f64, repeat: bool) -> Option<HistoryEntry> {
        if !self.accepts(now, repeat) {
            return None;
        }
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(HistoryEntry {
            kind: entry.kind,
            before_snapshot: current,
            timestamp: now,
        });
        if self.redo_stack.len() > self.max_depth {
            self.redo_stack.remove(0);
        }
        self.cleared_redo = None;
        self.locked_until = now + self.lock_ms;
        Some(entry)
    }

    pub fn redo(&mut self, current: String, now: f64, repeat: bool) -> Option<HistoryEntry> {
        if !self.accepts(now, repeat) {
            return None;
        }
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(HistoryEntry {
            kind: entry.kind,
            before_snapshot: current,
            timestamp: now,
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.cleared_redo = None;
        self.locked_until = now + self.lock_ms;
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Kind of the entry the next undo would restore.
    pub fn peek_undo(&self) -> Option<HistoryKind> {
        self.undo_stack.last().map(|e| e.kind)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.cleared_redo = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn history() -> History {
        History::new(50, 150.0)
    }

    #[test]
    fn undo_hands_back_before_snapshot() {
        let mut h = history();
        h.push_undo(HistoryKind::Move, "A".into(), 0.0);
        let entry = h.undo("B".into(), 10.0, false).unwrap();
        assert_eq!(entry.before_snapshot, "A");
        assert_eq!(entry.kind, HistoryKind::Move);
        assert!(h.can_redo());

        let entry = h.redo("A".into(), 500.0, false).unwrap();
        assert_eq!(entry.before_snapshot, "B");
        assert!(h.can_undo());
    }

    #[test]
    fn push_clears_redo() {
        let mut h = history();
        h.push_undo(HistoryKind::Move, "A".into(), 0.0);
        h.undo("B".into(), 0.0, false);
        assert!(h.can_redo());
        h.push_undo(HistoryKind::Resize, "A".into(), 500.0);
        assert!(!h.can_redo());
    }

    #[test]
    fn withdraw_restores_cleared_redo() {
        let mut h = history();
        h.push_undo(HistoryKind::Move, "A".into(), 0.0);
        h.undo("B".into(), 0.0, false);
        h.push_undo(HistoryKind::Move, "A".into(), 500.0);
        assert!(h.withdraw(HistoryKind::Resize).is_none());
        assert!(h.withdraw(HistoryKind::Move).is_some());
        assert_eq!(h.redo_depth(), 1);
        assert_eq!(h.undo_depth(), 0);
    }

    #[test]
    fn depth_is_bounded() {
        let mut h = History::new(3, 0.0);
        for i in 0..5 {
            h.push_undo(HistoryKind::Edit, format!("s{i}"), i as f64);
        }
        assert_eq!(h.undo_depth(), 3);
        assert_eq!(h.undo("now".into(), 10.0, false).unwrap().before_snapshot, "s4");
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut h = history();
        assert!(h.undo("x".into(), 0.0, false).is_none());
        assert!(h.redo("x".into(), 0.0, false).is_none());
    }

    #[test]
    fn repeat_and_lock_are_ignored() {
        let mut h = history();
        h.push_undo(HistoryKind::Delete, "A".into(), 0.0);
        h.push_undo(HistoryKind::Delete, "B".into(), 0.0);
        assert!(h.undo("C".into(), 0.0, true).is_none(), "key repeat");
        assert!(h.undo("C".into(), 0.0, false).is_some());
        assert!(h.undo("B".into(), 100.0, false).is_none(), "inside lock");
        assert!(h.undo("B".into(), 150.0, false).is_some());
    }
}

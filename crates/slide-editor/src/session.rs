//! Per-editor identity allocation and insert bookkeeping.

use slide_core::{NodeId, SlideTree};

#[derive(Debug, Default)]
pub struct SessionContext {
    next: u64,
    inserted_images: Vec<NodeId>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// A fresh id for a copy of `base`. Named nodes get `{base}-copy-{n}`,
    /// anonymous ones stay anonymous.
    pub fn copy_id(&mut self, tree: &SlideTree, base: NodeId) -> NodeId {
        loop {
            let n = self.bump();
            let id = if base.is_anonymous() {
                NodeId::anonymous('c', n)
            } else {
                NodeId::intern(&format!("{}-copy-{n}", base.as_str()))
            };
            if !tree.contains(id) {
                return id;
            }
        }
    }

    /// A fresh anonymous id; it is never written to markup.
    pub fn anonymous_id(&mut self, tree: &SlideTree, tag: char) -> NodeId {
        loop {
            let id = NodeId::anonymous(tag, self.bump());
            if !tree.contains(id) {
                return id;
            }
        }
    }

    /// A fresh `{prefix}-{n}` id for an inserted node.
    pub fn fresh_id(&mut self, tree: &SlideTree, prefix: &str) -> NodeId {
        loop {
            let id = NodeId::intern(&format!("{prefix}-{}", self.bump()));
            if !tree.contains(id) {
                return id;
            }
        }
    }

    pub fn record_inserted_image(&mut self, id: NodeId) {
        self.inserted_images.push(id);
    }

    /// Images created through the toolbar in this session, oldest first.
    pub fn inserted_images(&self) -> &[NodeId] {
        &self.inserted_images
    }
}

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for node IDs: fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Prefix marking identifiers the editor invented for elements that had no
/// `id` attribute. Anonymous ids are never written back into markup.
pub const ANONYMOUS_PREFIX: char = '_';

/// A lightweight, interned identifier for nodes in the slide tree.
/// Internally a `Spur` index: 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a new string as a NodeId, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Anonymous id with the given ordinal (`_n3`, `_c7`, ...).
    pub fn anonymous(tag: char, n: u64) -> Self {
        Self::intern(&format!("{ANONYMOUS_PREFIX}{tag}{n}"))
    }

    /// True for ids that did not come from an `id` attribute.
    pub fn is_anonymous(&self) -> bool {
        self.as_str().starts_with(ANONYMOUS_PREFIX)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("slide_title");
        let b = NodeId::intern("slide_title");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "slide_title");
        assert!(!a.is_anonymous());
    }

    #[test]
    fn anonymous_ids_are_marked() {
        let a = NodeId::anonymous('n', 1);
        let b = NodeId::anonymous('n', 2);
        assert_ne!(a, b);
        assert!(a.is_anonymous());
        assert_eq!(a.as_str(), "_n1");
    }
}

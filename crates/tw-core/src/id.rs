use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for node identifiers pushed from the design tool.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A stable, interned identifier for a node in the live tree.
///
/// Identifiers arrive as base64-shaped strings from the external source;
/// interning keeps lookups and comparisons O(1) and the handle `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing handle.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Look up an already-interned identifier without interning it.
    ///
    /// Returns `None` when no node has ever been given this id, which lets
    /// read-only lookups avoid growing the interner with garbage ids.
    pub fn existing(s: &str) -> Option<Self> {
        INTERNER.get(s).map(NodeId)
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Derive a child identifier, e.g. `btn` → `btn_label`.
    pub fn suffixed(&self, suffix: &str) -> Self {
        Self::intern(&format!("{}_{suffix}", self.as_str()))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
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
        let a = NodeId::intern("aGVhZGVy+/=");
        let b = NodeId::intern("aGVhZGVy+/=");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "aGVhZGVy+/=");
    }

    #[test]
    fn existing_does_not_intern() {
        assert!(NodeId::existing("never_seen_before_id_42").is_none());
        let id = NodeId::intern("seen_id");
        assert_eq!(NodeId::existing("seen_id"), Some(id));
    }

    #[test]
    fn suffixed_ids() {
        let btn = NodeId::intern("submit");
        assert_eq!(btn.suffixed("label").as_str(), "submit_label");
    }
}

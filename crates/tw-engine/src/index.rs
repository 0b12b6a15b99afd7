//! Identifier → live node lookup.
//!
//! Entries are added when a node is inserted (or when the host registers a
//! pre-existing node) and are never removed: there is no delete operation.

use std::collections::HashMap;
use tw_core::{NodeId, NodeIndex, NodeTree, Reference};

#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    entries: HashMap<NodeId, NodeIndex>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: NodeId, idx: NodeIndex) {
        if let Some(previous) = self.entries.insert(id, idx)
            && previous != idx
        {
            log::debug!("index entry {id} now points at a new node");
        }
    }

    pub fn lookup_id(&self, id: NodeId) -> Option<NodeIndex> {
        self.entries.get(&id).copied()
    }

    /// Look up by raw string without interning unknown ids.
    pub fn lookup(&self, id: &str) -> Option<NodeIndex> {
        NodeId::existing(id).and_then(|id| self.lookup_id(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `self` → the context node, `superview` → its parent, anything else →
    /// index lookup.
    pub fn resolve_reference(
        &self,
        reference: Reference<'_>,
        context: NodeIndex,
        tree: &NodeTree,
    ) -> Option<NodeIndex> {
        match reference {
            Reference::SelfNode => Some(context),
            Reference::Superview => tree.parent(context),
            Reference::Id(id) => self.lookup(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tw_core::{Node, NodeKind};

    #[test]
    fn resolves_self_superview_and_ids() {
        let mut tree = NodeTree::new();
        let root = tree.root();
        let panel = tree.add_child(root, Node::new(NodeId::intern("panel"), NodeKind::View));
        let badge = tree.add_child(panel, Node::new(NodeId::intern("badge"), NodeKind::View));

        let mut registry = NodeRegistry::new();
        registry.register(NodeId::intern("panel"), panel);

        assert_eq!(registry.resolve_reference(Reference::SelfNode, badge, &tree), Some(badge));
        assert_eq!(registry.resolve_reference(Reference::Superview, badge, &tree), Some(panel));
        assert_eq!(registry.resolve_reference(Reference::Id("panel"), badge, &tree), Some(panel));
        assert_eq!(registry.resolve_reference(Reference::Id("badge"), panel, &tree), None);
        assert_eq!(registry.resolve_reference(Reference::Superview, root, &tree), None);
    }

    #[test]
    fn lookup_of_unknown_id_does_not_intern() {
        let registry = NodeRegistry::new();
        assert!(registry.lookup("definitely_not_an_id_7781").is_none());
        assert!(NodeId::existing("definitely_not_an_id_7781").is_none());
    }
}

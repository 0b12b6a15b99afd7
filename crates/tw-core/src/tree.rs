//! The live node tree and its constraint arena.
//!
//! Nodes live in a `StableDiGraph` with parent → child edges and an explicit
//! child order per parent. Constraints live in an arena owned by the tree
//! and are *installed* on the nearest common ancestor of the nodes they
//! relate, which mirrors where a platform layout system keeps them.
//! Deactivated constraints are uninstalled but stay in the arena so their
//! ids remain valid.

use crate::anchor::{Attribute, Relation};
use crate::id::NodeId;
use crate::model::{Node, NodeKind};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use std::collections::HashMap;

/// Priority of a constraint that must be satisfied.
pub const PRIORITY_REQUIRED: f32 = 1000.0;

/// Identifier of the root node every tree starts with.
pub const ROOT_ID: &str = "root";

/// Handle into the tree's constraint arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub usize);

/// One end of a constraint: a node plus one of its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub node: NodeIndex,
    pub attribute: Attribute,
}

impl Anchor {
    pub fn new(node: NodeIndex, attribute: Attribute) -> Self {
        Self { node, attribute }
    }
}

/// A single geometric relationship:
/// `first  (relation)  second * multiplier + constant`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConstraint {
    pub first: Anchor,
    /// `None` for constant-valued (dimension) constraints.
    pub second: Option<Anchor>,
    pub relation: Relation,
    pub multiplier: f64,
    pub constant: f64,
    pub active: bool,
    pub priority: f32,
    /// Created by a tweak rather than present in the node's baseline.
    pub added: bool,
    /// Node the constraint is currently installed on.
    owner: Option<NodeIndex>,
}

impl LayoutConstraint {
    /// `first == second + constant`, inactive until activated by the tree.
    pub fn equal(first: Anchor, second: Option<Anchor>, constant: f64) -> Self {
        Self {
            first,
            second,
            relation: Relation::Equal,
            multiplier: 1.0,
            constant,
            active: false,
            priority: PRIORITY_REQUIRED,
            added: false,
            owner: None,
        }
    }

    pub fn owner(&self) -> Option<NodeIndex> {
        self.owner
    }
}

/// The live component tree.
#[derive(Debug, Clone)]
pub struct NodeTree {
    graph: StableDiGraph<Node, ()>,
    root: NodeIndex,
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
    constraints: Vec<LayoutConstraint>,
}

impl NodeTree {
    /// Create a tree holding only a root view with id `root`.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Node::new(NodeId::intern(ROOT_ID), NodeKind::View));
        Self {
            graph,
            root,
            child_order: HashMap::new(),
            constraints: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.graph.node_weight(idx)
    }

    pub fn node_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.graph.node_weight_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Insert `node` under `parent` at child position `index` (clamped to
    /// the current child count). Returns the new node's index.
    pub fn insert_child(&mut self, parent: NodeIndex, node: Node, index: usize) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        let order = self.child_order.entry(parent).or_default();
        let at = index.min(order.len());
        order.insert(at, idx);
        idx
    }

    /// Append `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeIndex, node: Node) -> NodeIndex {
        self.insert_child(parent, node, usize::MAX)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(idx, Direction::Incoming).next()
    }

    /// Children in insertion order.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A direct child of `parent` with the given id.
    pub fn child_with_id(&self, parent: NodeIndex, id: NodeId) -> Option<NodeIndex> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.graph[c].id == id)
    }

    /// `idx` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(Some(idx), move |&n| self.parent(n))
    }

    pub fn common_ancestor(&self, a: NodeIndex, b: NodeIndex) -> Option<NodeIndex> {
        let lineage: Vec<NodeIndex> = self.ancestors(a).collect();
        self.ancestors(b).find(|n| lineage.contains(n))
    }

    // ─── Constraints ─────────────────────────────────────────────────────

    pub fn constraint(&self, id: ConstraintId) -> Option<&LayoutConstraint> {
        self.constraints.get(id.0)
    }

    /// Every constraint in the arena, active or not.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &LayoutConstraint)> {
        self.constraints
            .iter()
            .enumerate()
            .map(|(i, c)| (ConstraintId(i), c))
    }

    /// Where a constraint between these anchors is installed.
    pub fn owner_for(&self, first: Anchor, second: Option<Anchor>) -> Option<NodeIndex> {
        match second {
            Some(second) => self.common_ancestor(first.node, second.node),
            None => self.node(first.node).map(|_| first.node),
        }
    }

    /// Store a constraint in the arena, activating it if its `active` flag
    /// is set. Returns its id.
    pub fn add_constraint(&mut self, constraint: LayoutConstraint) -> ConstraintId {
        let activate = constraint.active;
        let id = ConstraintId(self.constraints.len());
        self.constraints.push(LayoutConstraint {
            active: false,
            owner: None,
            ..constraint
        });
        self.activate_stored(id, activate);
        id
    }

    /// Deactivate `prior` and store `replacement` in its slot, activating
    /// it if its `active` flag is set. A slot still addressed by a snapshot
    /// list is kept, and the replacement is appended instead.
    pub fn replace_constraint(
        &mut self,
        prior: ConstraintId,
        replacement: LayoutConstraint,
    ) -> ConstraintId {
        self.set_active(prior, false);
        if self.is_snapshotted(prior) {
            return self.add_constraint(replacement);
        }
        let activate = replacement.active;
        let Some(slot) = self.constraints.get_mut(prior.0) else {
            return self.add_constraint(replacement);
        };
        *slot = LayoutConstraint {
            active: false,
            owner: None,
            ..replacement
        };
        self.activate_stored(prior, activate);
        prior
    }

    fn activate_stored(&mut self, id: ConstraintId, activate: bool) {
        if activate && !self.set_active(id, true) {
            log::debug!("constraint {id:?} could not be installed");
        }
    }

    /// True when some node's snapshot list addresses `id`.
    pub fn is_snapshotted(&self, id: ConstraintId) -> bool {
        self.graph
            .node_indices()
            .any(|n| self.graph[n].constraints_state.contains(&id))
    }

    /// Activate (install) or deactivate (uninstall) a constraint.
    /// Returns false when the constraint cannot be installed because its
    /// anchors share no ancestor.
    pub fn set_active(&mut self, id: ConstraintId, active: bool) -> bool {
        let Some(constraint) = self.constraints.get(id.0) else {
            return false;
        };
        if constraint.active == active {
            return true;
        }

        if active {
            let Some(owner) = self.owner_for(constraint.first, constraint.second) else {
                return false;
            };
            self.graph[owner].installed.push(id);
            let constraint = &mut self.constraints[id.0];
            constraint.owner = Some(owner);
            constraint.active = true;
        } else {
            let owner = constraint.owner;
            if let Some(node) = owner.and_then(|o| self.graph.node_weight_mut(o)) {
                node.installed.retain(|c| *c != id);
            }
            let constraint = &mut self.constraints[id.0];
            constraint.owner = None;
            constraint.active = false;
        }
        true
    }

    /// In-place update of an existing constraint's mutable fields.
    pub fn update_constraint(&mut self, id: ConstraintId, constant: f64, active: bool, priority: f32) {
        if let Some(constraint) = self.constraints.get_mut(id.0) {
            constraint.constant = constant;
            constraint.priority = priority;
        }
        self.set_active(id, active);
    }

    /// Constraints installed on `idx`.
    pub fn installed(&self, idx: NodeIndex) -> &[ConstraintId] {
        self.node(idx).map(|n| n.installed.as_slice()).unwrap_or(&[])
    }

    /// First active constraint installed on `owner` whose first anchor is
    /// `anchor`. Only the first match is returned even if several exist.
    pub fn find_installed(&self, owner: NodeIndex, anchor: Anchor) -> Option<ConstraintId> {
        self.installed(owner)
            .iter()
            .copied()
            .find(|&id| self.constraints[id.0].first == anchor)
    }

    /// First installed constraint whose first anchor is `anchor`, searched
    /// on the anchor's node and then each ancestor. Only the first match is
    /// returned even if several exist.
    pub fn find_installed_on_lineage(&self, anchor: Anchor) -> Option<ConstraintId> {
        self.ancestors(anchor.node)
            .find_map(|owner| self.find_installed(owner, anchor))
    }

    /// Active constraints anywhere in the tree whose first anchor is `anchor`.
    pub fn active_constraints_on(&self, anchor: Anchor) -> Vec<ConstraintId> {
        self.constraints()
            .filter(|(_, c)| c.active && c.first == anchor)
            .map(|(id, _)| id)
            .collect()
    }

    /// Record the constraints currently installed on `idx` as its
    /// addressable snapshot list.
    pub fn capture_constraints_state(&mut self, idx: NodeIndex) {
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.constraints_state = node.installed.to_vec();
        }
    }

    pub fn constraints_state(&self, idx: NodeIndex) -> &[ConstraintId] {
        self.node(idx)
            .map(|n| n.constraints_state.as_slice())
            .unwrap_or(&[])
    }

    /// Append to the snapshot list without touching existing positions.
    pub fn push_constraint_state(&mut self, idx: NodeIndex, id: ConstraintId) {
        if let Some(node) = self.graph.node_weight_mut(idx) {
            node.constraints_state.push(id);
        }
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

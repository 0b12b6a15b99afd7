//! Serializable constraint descriptions.
//!
//! A `ConstraintConfig` is the wire shape of one constraint: two anchors,
//! relation, constant, multiplier, active flag, priority and its position in
//! the owning node's snapshot list. Configs arrive in indexed `constraints`
//! lists of modify entries and are produced when a node's baseline is
//! captured for transmission.

use crate::anchor::{Attribute, Relation, SymbolOrCode};
use crate::id::NodeId;
use crate::tree::{Anchor, ConstraintId, LayoutConstraint, NodeTree, PRIORITY_REQUIRED};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot MessagePack encode: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),
    #[error("snapshot MessagePack decode: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),
}

/// `{ item, attribute }`. The attribute may be a name or an integer code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub attribute: Option<SymbolOrCode>,
}

impl AnchorConfig {
    pub fn new(item: &str, attribute: impl Into<SymbolOrCode>) -> Self {
        Self {
            item: Some(item.to_string()),
            attribute: Some(attribute.into()),
        }
    }

    fn attribute(&self) -> Option<Attribute> {
        self.attribute.as_ref().and_then(Attribute::resolve)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintConfig {
    pub first: AnchorConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<AnchorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<SymbolOrCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "default_priority")]
    pub priority: f32,
    /// Position in the node's snapshot list; absent means "append".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<usize>,
    #[serde(default)]
    pub added: bool,
}

fn default_active() -> bool {
    true
}

fn default_priority() -> f32 {
    PRIORITY_REQUIRED
}

impl ConstraintConfig {
    /// Build a live constraint for `node`.
    ///
    /// Items resolve against the node itself and its direct children only.
    /// Returns `None` (the constraint is dropped) when the first item or
    /// attribute does not resolve, when a given second anchor does not
    /// resolve, or when the two attributes are on different axes.
    pub fn to_live(&self, tree: &NodeTree, node: NodeIndex) -> Option<LayoutConstraint> {
        let first = Anchor::new(
            item_from_id(tree, node, self.first.item.as_deref()?)?,
            self.first.attribute()?,
        );

        let second = match &self.second {
            Some(second) => Some(Anchor::new(
                item_from_id(tree, node, second.item.as_deref()?)?,
                second.attribute()?,
            )),
            None => None,
        };

        if let Some(second) = second
            && second.attribute.axis() != first.attribute.axis()
        {
            log::debug!(
                "axis mismatch: {} vs {}",
                first.attribute,
                second.attribute
            );
            return None;
        }

        let relation = self
            .relation
            .as_ref()
            .and_then(Relation::resolve)
            .unwrap_or_default();

        let mut constraint = LayoutConstraint::equal(first, second, self.constant.unwrap_or(0.0));
        constraint.relation = relation;
        constraint.multiplier = self.multiplier.unwrap_or(1.0);
        constraint.active = self.is_active;
        constraint.priority = self.priority;
        constraint.added = self.added;
        Some(constraint)
    }

    /// Describe a live constraint at snapshot position `idx`.
    pub fn from_live(tree: &NodeTree, id: ConstraintId, idx: usize) -> Option<Self> {
        let constraint = tree.constraint(id)?;
        let anchor = |a: Anchor| -> Option<AnchorConfig> {
            let node = tree.node(a.node)?;
            Some(AnchorConfig::new(node.id.as_str(), a.attribute.code()))
        };
        Some(Self {
            first: anchor(constraint.first)?,
            second: match constraint.second {
                Some(second) => Some(anchor(second)?),
                None => None,
            },
            relation: Some(SymbolOrCode::Code(constraint.relation.code())),
            constant: Some(constraint.constant),
            multiplier: Some(constraint.multiplier),
            is_active: constraint.active,
            priority: constraint.priority,
            idx: Some(idx),
            added: constraint.added,
        })
    }
}

/// Resolve an item id against `node` and its direct children.
fn item_from_id(tree: &NodeTree, node: NodeIndex, item: &str) -> Option<NodeIndex> {
    let id = NodeId::existing(item)?;
    if tree.node(node)?.id == id {
        return Some(node);
    }
    tree.child_with_id(node, id)
}

/// Describe every constraint in a node's snapshot list.
pub fn capture_baseline(tree: &NodeTree, node: NodeIndex) -> Vec<ConstraintConfig> {
    tree.constraints_state(node)
        .iter()
        .enumerate()
        .filter_map(|(idx, &id)| ConstraintConfig::from_live(tree, id, idx))
        .collect()
}

// ─── Transmission encodings ──────────────────────────────────────────────

pub fn encode_snapshots_json(configs: &[ConstraintConfig]) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(configs)?)
}

pub fn decode_snapshots_json(text: &str) -> Result<Vec<ConstraintConfig>, SnapshotError> {
    Ok(serde_json::from_str(text)?)
}

/// Compact binary baseline; field names are kept so decoders stay tolerant.
pub fn encode_snapshots_msgpack(configs: &[ConstraintConfig]) -> Result<Vec<u8>, SnapshotError> {
    Ok(rmp_serde::to_vec_named(configs)?)
}

pub fn decode_snapshots_msgpack(bytes: &[u8]) -> Result<Vec<ConstraintConfig>, SnapshotError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeKind};
    use pretty_assertions::assert_eq;

    fn card_tree() -> (NodeTree, NodeIndex, NodeIndex) {
        let mut tree = NodeTree::new();
        let card = tree.add_child(tree.root(), Node::new(NodeId::intern("card"), NodeKind::View));
        let title = tree.add_child(
            card,
            Node::new(
                NodeId::intern("card_title"),
                NodeKind::from_type_tag("Label", NodeId::intern("card_title")).unwrap(),
            ),
        );
        (tree, card, title)
    }

    #[test]
    fn decodes_symbolic_and_numeric_fields() {
        let json = r#"{
            "first": {"item": "card_title", "attribute": "top"},
            "second": {"item": "card", "attribute": 3},
            "relation": ">",
            "constant": 12,
            "isActive": true,
            "priority": 750,
            "idx": 4,
            "added": false
        }"#;
        let config: ConstraintConfig = serde_json::from_str(json).unwrap();
        let (tree, card, title) = card_tree();
        let live = config.to_live(&tree, card).unwrap();
        assert_eq!(live.first, Anchor::new(title, Attribute::Top));
        assert_eq!(live.second, Some(Anchor::new(card, Attribute::Top)));
        assert_eq!(live.relation, Relation::GreaterThanOrEqual);
        assert_eq!(live.constant, 12.0);
        assert_eq!(live.multiplier, 1.0);
        assert_eq!(live.priority, 750.0);
    }

    #[test]
    fn defaults_apply_when_fields_are_absent() {
        let config: ConstraintConfig =
            serde_json::from_str(r#"{"first": {"item": "card", "attribute": "height"}}"#).unwrap();
        let (tree, card, _) = card_tree();
        let live = config.to_live(&tree, card).unwrap();
        assert_eq!(live.second, None);
        assert_eq!(live.constant, 0.0);
        assert_eq!(live.multiplier, 1.0);
        assert!(live.active);
        assert_eq!(live.priority, PRIORITY_REQUIRED);
        assert_eq!(config.idx, None);
    }

    #[test]
    fn items_outside_node_and_children_are_dropped() {
        let (mut tree, card, _) = card_tree();
        tree.add_child(tree.root(), Node::new(NodeId::intern("sibling"), NodeKind::View));
        let config = ConstraintConfig {
            first: AnchorConfig::new("card", "top"),
            second: Some(AnchorConfig::new("sibling", "bottom")),
            relation: None,
            constant: None,
            multiplier: None,
            is_active: true,
            priority: PRIORITY_REQUIRED,
            idx: None,
            added: true,
        };
        assert!(config.to_live(&tree, card).is_none());
    }

    #[test]
    fn axis_mismatch_is_dropped() {
        let (tree, card, _) = card_tree();
        let config = ConstraintConfig {
            first: AnchorConfig::new("card_title", "leading"),
            second: Some(AnchorConfig::new("card", "top")),
            relation: Some("=".into()),
            constant: None,
            multiplier: None,
            is_active: true,
            priority: PRIORITY_REQUIRED,
            idx: None,
            added: true,
        };
        assert!(config.to_live(&tree, card).is_none());
    }

    #[test]
    fn baseline_msgpack_roundtrip() {
        let (mut tree, card, title) = card_tree();
        let mut c = LayoutConstraint::equal(
            Anchor::new(title, Attribute::Leading),
            Some(Anchor::new(card, Attribute::Leading)),
            16.0,
        );
        c.active = true;
        c.priority = 999.0;
        tree.add_constraint(c);
        tree.capture_constraints_state(card);

        let baseline = capture_baseline(&tree, card);
        assert_eq!(baseline.len(), 1);
        let bytes = encode_snapshots_msgpack(&baseline).unwrap();
        assert_eq!(decode_snapshots_msgpack(&bytes).unwrap(), baseline);
    }
}

pub mod anchor;
pub mod config;
pub mod expr;
pub mod id;
pub mod model;
pub mod tree;

pub use anchor::{Attribute, Axis, Relation, SymbolOrCode};
pub use config::{AnchorConfig, ConstraintConfig, SnapshotError, capture_baseline};
pub use expr::{ExprError, Expression, Reference, parse_expression};
pub use id::NodeId;
pub use model::*;
pub use tree::{Anchor, ConstraintId, LayoutConstraint, NodeTree, PRIORITY_REQUIRED, ROOT_ID};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;

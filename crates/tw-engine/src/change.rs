//! Change document shapes.
//!
//! A change document is a JSON array of entries:
//!
//! ```json
//! [
//!   {"operation": "insert", "view": {"id": "A", "superview": "root", "index": 0,
//!    "type": "Label", "frame": {"x": 0, "y": 0, "width": 100, "height": 20}}},
//!   {"operation": "modify", "view": {"id": "A",
//!    "constraints": {"top": "$(root).top + 10"}}}
//! ]
//! ```
//!
//! Values stay loosely typed (`serde_json::Value`) wherever the engine has
//! to decide per key what to do with them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The two supported operations; any other tag is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Modify,
}

impl Operation {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "insert" => Some(Operation::Insert),
            "modify" => Some(Operation::Modify),
            _ => None,
        }
    }
}

/// One entry of a change sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub operation: String,
    #[serde(default)]
    pub view: ViewConfig,
}

/// The `view` object of a change entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ConstraintsField>,
}

/// The two mutually exclusive shapes of `constraints`, selected by shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintsField {
    /// `{ "<attribute>": "<expression>" }`
    Expressions(BTreeMap<String, String>),
    /// `[ <constraint config>, … ]`, each addressed by `idx`.
    Indexed(Vec<Value>),
    /// Anything else; reported and ignored.
    Unsupported(Value),
}

impl ChangeEntry {
    pub fn operation(&self) -> Option<Operation> {
        Operation::from_tag(&self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constraints_shape_selects_form() {
        let entry: ChangeEntry = serde_json::from_value(json!({
            "operation": "modify",
            "view": {"id": "A", "constraints": {"top": "$(root).top + 10"}}
        }))
        .unwrap();
        assert_eq!(entry.operation(), Some(Operation::Modify));
        assert!(matches!(entry.view.constraints, Some(ConstraintsField::Expressions(_))));

        let entry: ChangeEntry = serde_json::from_value(json!({
            "operation": "modify",
            "view": {"id": "A", "constraints": [{"first": {"item": "A", "attribute": "width"}, "idx": 0}]}
        }))
        .unwrap();
        assert!(matches!(entry.view.constraints, Some(ConstraintsField::Indexed(ref v)) if v.len() == 1));

        let entry: ChangeEntry = serde_json::from_value(json!({
            "operation": "modify",
            "view": {"id": "A", "constraints": {"top": 10}}
        }))
        .unwrap();
        assert!(matches!(entry.view.constraints, Some(ConstraintsField::Unsupported(_))));
    }

    #[test]
    fn type_tag_is_renamed() {
        let entry: ChangeEntry = serde_json::from_value(json!({
            "operation": "insert",
            "view": {"id": "A", "superview": "root", "index": 2, "type": "Button"}
        }))
        .unwrap();
        assert_eq!(entry.view.type_tag.as_deref(), Some("Button"));
        assert_eq!(entry.view.index, Some(2));
        assert_eq!(entry.operation(), Some(Operation::Insert));
    }
}

//! Constraint and frame patching.
//!
//! Two mutually exclusive constraint forms arrive in a change entry:
//!
//! - an expression map (`{"top": "$(root).top + 10", "height": "44"}`), where
//!   each attribute is tied to a constant or to another node's anchor. On
//!   modify the constraint previously installed for that attribute, on the
//!   node or any ancestor, is replaced, so re-applying an entry neither
//!   stacks constraints nor grows the arena.
//! - an indexed config list, where a config whose `idx` falls inside the
//!   node's snapshot list updates that constraint in place and any other
//!   config builds a new constraint appended to the list.
//!
//! Frame patching resolves each of `x`/`y`/`width`/`height` once, against
//! the tree as it is when the entry is applied.

use crate::change::ConstraintsField;
use crate::diagnostics::{ApplyReport, TweakError};
use crate::engine::LayoutEngine;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tw_core::{
    Anchor, Attribute, ConstraintConfig, Expression, LayoutConstraint, NodeId, NodeIndex,
    parse_expression,
};

impl LayoutEngine {
    pub(crate) fn patch_constraints(
        &mut self,
        idx: NodeIndex,
        field: &ConstraintsField,
        modify: bool,
        report: &mut ApplyReport,
    ) {
        match field {
            ConstraintsField::Expressions(map) => self.patch_expressions(idx, map, modify, report),
            ConstraintsField::Indexed(configs) => self.patch_indexed(idx, configs, report),
            ConstraintsField::Unsupported(value) => report.record(
                self.node_id(idx),
                TweakError::EntryMalformed {
                    reason: format!("`constraints` must be a map or a list, got {value}"),
                },
            ),
        }
    }

    fn patch_expressions(
        &mut self,
        idx: NodeIndex,
        map: &BTreeMap<String, String>,
        modify: bool,
        report: &mut ApplyReport,
    ) {
        let node_id = self.node_id(idx);
        for (name, text) in map {
            let expr = match parse_expression(text) {
                Ok(expr) => expr,
                Err(source) => {
                    report.record(
                        node_id,
                        TweakError::ExpressionMalformed {
                            attribute: name.clone(),
                            source,
                        },
                    );
                    continue;
                }
            };
            if let Err(e) = self.constrain(idx, name, &expr, modify) {
                report.record(node_id, e);
            }
        }
    }

    /// Tie one attribute of `idx` to the expression's value.
    fn constrain(
        &mut self,
        idx: NodeIndex,
        name: &str,
        expr: &Expression,
        modify: bool,
    ) -> Result<(), TweakError> {
        let attribute = Attribute::from_name(name)
            .ok_or_else(|| TweakError::anchor(name, "unknown attribute"))?;
        let first = Anchor::new(idx, attribute);

        let mut constraint = match expr.reference() {
            None => {
                if !attribute.is_dimension() {
                    return Err(TweakError::anchor(name, "a constant needs width or height"));
                }
                LayoutConstraint::equal(first, None, expr.offset)
            }
            Some(reference) => {
                let target = self
                    .registry
                    .resolve_reference(reference, idx, &self.tree)
                    .ok_or_else(|| TweakError::unresolved(expr.target.as_str()))?;
                let other_name = expr.attribute_or(name);
                let other = Attribute::from_name(other_name)
                    .ok_or_else(|| TweakError::anchor(other_name, "unknown attribute"))?;
                if other.axis() != attribute.axis() {
                    return Err(TweakError::anchor(
                        name,
                        format!("cannot relate {attribute} to {other}"),
                    ));
                }
                LayoutConstraint::equal(first, Some(Anchor::new(target, other)), expr.offset)
            }
        };

        if self
            .tree
            .owner_for(constraint.first, constraint.second)
            .is_none()
        {
            return Err(TweakError::anchor(name, "anchors share no ancestor"));
        }

        constraint.active = true;
        // Assumes at most one prior constraint per attribute.
        let prior = modify
            .then(|| self.tree.find_installed_on_lineage(first))
            .flatten();
        let id = match prior {
            Some(prior) => {
                log::debug!("{name}: replacing {prior:?}");
                self.tree.replace_constraint(prior, constraint)
            }
            None => self.tree.add_constraint(constraint),
        };
        log::debug!("{name}: installed {id:?}");

        if let Some(node) = self.tree.node_mut(idx) {
            node.translates_autoresizing_mask = false;
        }
        Ok(())
    }

    fn patch_indexed(&mut self, idx: NodeIndex, configs: &[Value], report: &mut ApplyReport) {
        let node_id = self.node_id(idx);
        for (position, raw) in configs.iter().enumerate() {
            let config = match ConstraintConfig::deserialize(raw) {
                Ok(config) => config,
                Err(e) => {
                    report.record(
                        node_id,
                        TweakError::EntryMalformed {
                            reason: format!("constraints[{position}]: {e}"),
                        },
                    );
                    continue;
                }
            };

            let existing = config
                .idx
                .and_then(|i| self.tree.constraints_state(idx).get(i).copied());

            if let Some(id) = existing {
                self.tree.update_constraint(
                    id,
                    config.constant.unwrap_or(0.0),
                    config.is_active,
                    config.priority,
                );
                continue;
            }

            match config.to_live(&self.tree, idx) {
                Some(mut live) => {
                    live.added = true;
                    let id = self.tree.add_constraint(live);
                    self.tree.push_constraint_state(idx, id);
                }
                None => report.record(
                    node_id,
                    TweakError::anchor(
                        &format!("constraints[{position}]"),
                        "items or attributes do not resolve",
                    ),
                ),
            }
        }
    }

    pub(crate) fn patch_frame(
        &mut self,
        idx: NodeIndex,
        fields: &Map<String, Value>,
        report: &mut ApplyReport,
    ) {
        let Some(node) = self.tree.node(idx) else {
            return;
        };
        let node_id = Some(node.id);
        let mut frame = node.frame;

        for (name, value) in fields {
            if frame.get(name).is_none() {
                report.record(node_id, TweakError::unclaimed(format!("frame.{name}")));
                continue;
            }
            let resolved = match value {
                Value::Number(n) => n
                    .as_f64()
                    .ok_or_else(|| TweakError::unclaimed(format!("frame.{name}"))),
                Value::String(text) => self.frame_value(idx, name, text),
                _ => Err(TweakError::unclaimed(format!("frame.{name}"))),
            };
            match resolved {
                Ok(v) => {
                    frame.set(name, v);
                }
                Err(e) => report.record(node_id, e),
            }
        }

        if let Some(node) = self.tree.node_mut(idx) {
            node.frame = frame;
        }
    }

    /// A frame field from an expression: the offset, plus the referenced
    /// node's field when there is a reference.
    fn frame_value(&self, idx: NodeIndex, name: &str, text: &str) -> Result<f64, TweakError> {
        let expr = parse_expression(text).map_err(|source| TweakError::ExpressionMalformed {
            attribute: name.to_string(),
            source,
        })?;
        let Some(reference) = expr.reference() else {
            return Ok(expr.offset);
        };
        let target = self
            .registry
            .resolve_reference(reference, idx, &self.tree)
            .ok_or_else(|| TweakError::unresolved(expr.target.as_str()))?;
        let field = expr.attribute_or(name);
        let base = self
            .tree
            .node(target)
            .and_then(|n| n.frame.get(field))
            .ok_or_else(|| TweakError::anchor(field, "not a frame field"))?;
        Ok(base + expr.offset)
    }

    fn node_id(&self, idx: NodeIndex) -> Option<NodeId> {
        self.tree.node(idx).map(|n| n.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tw_core::Frame;

    fn engine() -> LayoutEngine {
        let mut engine = LayoutEngine::new(EngineConfig::default());
        let report = engine.tweak(&[
            json!({"operation": "insert", "view": {"id": "patch_card", "superview": "root",
                "type": "View", "frame": {"x": 10, "y": 20, "width": 200, "height": 100}}}),
            json!({"operation": "insert", "view": {"id": "patch_badge", "superview": "patch_card",
                "type": "Label", "frame": {"x": 0, "y": 0, "width": 30, "height": 30}}}),
        ]);
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        engine
    }

    fn anchor(engine: &LayoutEngine, id: &str, attribute: Attribute) -> Anchor {
        Anchor::new(engine.registry().lookup(id).unwrap(), attribute)
    }

    fn modify(engine: &mut LayoutEngine, id: &str, view: Value) -> ApplyReport {
        let mut entry = json!({"operation": "modify", "view": view});
        entry["view"]["id"] = json!(id);
        engine.tweak(&[entry])
    }

    #[test]
    fn reference_installs_on_common_ancestor() {
        let mut engine = engine();
        let report = modify(
            &mut engine,
            "patch_badge",
            json!({"constraints": {"leading": "$(superview) + 8"}}),
        );
        assert!(report.is_clean(), "{:?}", report.diagnostics);

        let first = anchor(&engine, "patch_badge", Attribute::Leading);
        let active = engine.tree.active_constraints_on(first);
        assert_eq!(active.len(), 1);
        let c = engine.tree.constraint(active[0]).unwrap();
        assert_eq!(c.constant, 8.0);
        assert_eq!(c.second, Some(anchor(&engine, "patch_card", Attribute::Leading)));
        assert_eq!(c.owner(), engine.registry().lookup("patch_card"));
        assert!(!engine.lookup("patch_badge").unwrap().translates_autoresizing_mask);
    }

    #[test]
    fn constant_replaces_on_modify() {
        let mut engine = engine();
        modify(&mut engine, "patch_badge", json!({"constraints": {"height": "44"}}));
        modify(&mut engine, "patch_badge", json!({"constraints": {"height": "48"}}));

        let first = anchor(&engine, "patch_badge", Attribute::Height);
        let active = engine.tree.active_constraints_on(first);
        assert_eq!(active.len(), 1);
        assert_eq!(engine.tree.constraint(active[0]).unwrap().constant, 48.0);
        assert_eq!(engine.tree.constraint(active[0]).unwrap().second, None);
    }

    #[test]
    fn retargeted_reference_replaces_prior_on_ancestor() {
        let mut engine = engine();
        let report = modify(
            &mut engine,
            "patch_badge",
            json!({"constraints": {"top": "$(superview).top + 5"}}),
        );
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        let report = modify(
            &mut engine,
            "patch_badge",
            json!({"constraints": {"top": "$(root).top + 10"}}),
        );
        assert!(report.is_clean(), "{:?}", report.diagnostics);

        let active = engine
            .tree
            .active_constraints_on(anchor(&engine, "patch_badge", Attribute::Top));
        assert_eq!(active.len(), 1);
        let c = engine.tree.constraint(active[0]).unwrap();
        assert_eq!(c.constant, 10.0);
        assert_eq!(c.owner(), Some(engine.tree.root()));
        let card = engine.registry().lookup("patch_card").unwrap();
        assert!(engine.tree.installed(card).is_empty());
    }

    #[test]
    fn repeated_modify_reuses_the_arena_slot() {
        let mut engine = engine();
        modify(&mut engine, "patch_badge", json!({"constraints": {"height": "44"}}));
        let count = engine.tree.constraints().count();
        for _ in 0..50 {
            modify(&mut engine, "patch_badge", json!({"constraints": {"height": "44"}}));
        }
        assert_eq!(engine.tree.constraints().count(), count);
        let active = engine
            .tree
            .active_constraints_on(anchor(&engine, "patch_badge", Attribute::Height));
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn rejected_constraint_keeps_autoresizing() {
        let mut engine = engine();
        let report = modify(
            &mut engine,
            "patch_badge",
            json!({"constraints": {"top": "$(ghost).top", "depth": "12", "left": "4"}}),
        );
        assert_eq!(report.diagnostics.len(), 3);
        assert!(engine.lookup("patch_badge").unwrap().translates_autoresizing_mask);
        assert_eq!(engine.tree.constraints().count(), 0);
    }

    #[test]
    fn constant_needs_a_dimension() {
        let mut engine = engine();
        let report = modify(&mut engine, "patch_badge", json!({"constraints": {"top": "12"}}));
        assert!(matches!(report.diagnostics[0].error, TweakError::AnchorInvalid { .. }));
        assert_eq!(engine.tree.constraints().count(), 0);
    }

    #[test]
    fn bad_attribute_skips_only_itself() {
        let mut engine = engine();
        let report = modify(
            &mut engine,
            "patch_badge",
            json!({"constraints": {
                "width": "$(superview).height",
                "height": "$(ghost).height",
                "top": "$(superview).top + x",
                "trailing": "$(superview) - 4"
            }}),
        );
        assert_eq!(report.diagnostics.len(), 2);
        assert!(report.errors().any(|e| matches!(e, TweakError::ReferenceUnresolved { reference } if reference == "ghost")));
        assert!(report.errors().any(|e| matches!(e, TweakError::ExpressionMalformed { attribute, .. } if attribute == "top")));

        let width = engine.tree.active_constraints_on(anchor(&engine, "patch_badge", Attribute::Width));
        assert_eq!(width.len(), 1);
        let trailing =
            engine.tree.active_constraints_on(anchor(&engine, "patch_badge", Attribute::Trailing));
        assert_eq!(engine.tree.constraint(trailing[0]).unwrap().constant, -4.0);
    }

    #[test]
    fn axis_mismatch_is_rejected() {
        let mut engine = engine();
        let report = modify(
            &mut engine,
            "patch_badge",
            json!({"constraints": {"top": "$(superview).leading"}}),
        );
        assert!(matches!(report.diagnostics[0].error, TweakError::AnchorInvalid { .. }));
    }

    #[test]
    fn indexed_update_in_place_and_append() {
        let mut engine = engine();
        modify(
            &mut engine,
            "patch_card",
            json!({"constraints": [
                {"first": {"item": "patch_badge", "attribute": "width"}, "constant": 30}
            ]}),
        );
        let card = engine.registry().lookup("patch_card").unwrap();
        assert_eq!(engine.tree.constraints_state(card).len(), 1);
        let id = engine.tree.constraints_state(card)[0];
        assert!(engine.tree.constraint(id).unwrap().added);

        modify(
            &mut engine,
            "patch_card",
            json!({"constraints": [
                {"first": {"item": "patch_badge", "attribute": 7}, "constant": 36, "idx": 0, "priority": 750}
            ]}),
        );
        assert_eq!(engine.tree.constraints_state(card).len(), 1);
        let c = engine.tree.constraint(id).unwrap();
        assert_eq!(c.constant, 36.0);
        assert_eq!(c.priority, 750.0);

        modify(
            &mut engine,
            "patch_card",
            json!({"constraints": [
                {"first": {"item": "patch_badge", "attribute": "top"},
                 "second": {"item": "patch_card", "attribute": "top"},
                 "relation": ">", "constant": 4, "idx": 9}
            ]}),
        );
        assert_eq!(engine.tree.constraints_state(card).len(), 2);
    }

    #[test]
    fn indexed_deactivate_uninstalls() {
        let mut engine = engine();
        modify(
            &mut engine,
            "patch_card",
            json!({"constraints": [{"first": {"item": "patch_card", "attribute": "height"}, "constant": 90}]}),
        );
        modify(
            &mut engine,
            "patch_card",
            json!({"constraints": [{"first": {"item": "patch_card", "attribute": "height"}, "idx": 0, "isActive": false}]}),
        );
        let card = engine.registry().lookup("patch_card").unwrap();
        let id = engine.tree.constraints_state(card)[0];
        let c = engine.tree.constraint(id).unwrap();
        assert!(!c.active);
        assert_eq!(c.constant, 0.0);
        assert!(engine.tree.installed(card).is_empty());
    }

    #[test]
    fn unresolvable_config_is_dropped() {
        let mut engine = engine();
        let report = modify(
            &mut engine,
            "patch_card",
            json!({"constraints": [{"first": {"item": "elsewhere", "attribute": "width"}}]}),
        );
        assert_eq!(report.diagnostics.len(), 1);
        let card = engine.registry().lookup("patch_card").unwrap();
        assert!(engine.tree.constraints_state(card).is_empty());
    }

    #[test]
    fn frame_mixes_literals_and_references() {
        let mut engine = engine();
        let report = modify(
            &mut engine,
            "patch_badge",
            json!({"frame": {
                "x": "$(superview).width - 40",
                "y": "$(superview) + 5",
                "width": 24,
                "height": "$(ghost)",
                "depth": 1
            }}),
        );
        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(
            engine.lookup("patch_badge").unwrap().frame,
            Frame::new(160.0, 25.0, 24.0, 30.0)
        );
    }

    #[test]
    fn unsupported_constraints_shape() {
        let mut engine = engine();
        let report = modify(&mut engine, "patch_card", json!({"constraints": {"top": 4}}));
        assert!(matches!(report.diagnostics[0].error, TweakError::EntryMalformed { .. }));
        assert_eq!(report.applied, 1);
    }
}

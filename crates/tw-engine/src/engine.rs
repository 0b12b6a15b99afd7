//! Change-set interpreter.
//!
//! The engine owns the live tree, the node index, its configuration and the
//! image collaborator. A change sequence is applied entry by entry, in
//! order, to completion; later entries can reference nodes inserted by
//! earlier ones. Nothing aborts the sequence; skipped work is recorded in
//! the returned [`ApplyReport`].

use crate::change::{ChangeEntry, Operation, ViewConfig};
use crate::config::EngineConfig;
use crate::diagnostics::{ApplyReport, TweakError};
use crate::image::{ImageLoader, ImageSlot, NoImages, PendingImage};
use crate::index::NodeRegistry;
use crate::tweaks::TweakStore;
use serde::Deserialize;
use serde_json::{Map, Value};
use tw_core::{
    ConstraintConfig, Frame, ImageContent, Node, NodeId, NodeIndex, NodeKind, NodeTree, ROOT_ID,
    capture_baseline,
};

pub struct LayoutEngine {
    /// The live tree (single source of truth).
    pub tree: NodeTree,

    pub(crate) registry: NodeRegistry,

    pub(crate) config: EngineConfig,

    pub(crate) images: Box<dyn ImageLoader>,

    /// Remote fetches handed off in production mode.
    pub(crate) pending_images: Vec<PendingImage>,
}

impl LayoutEngine {
    /// Create an engine over an empty tree whose root is indexed as `root`.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_tree(NodeTree::new(), config)
    }

    /// Adopt an existing tree. Only its root is indexed; register other
    /// pre-existing nodes with [`LayoutEngine::register`].
    pub fn with_tree(tree: NodeTree, config: EngineConfig) -> Self {
        let mut registry = NodeRegistry::new();
        registry.register(NodeId::intern(ROOT_ID), tree.root());
        Self {
            tree,
            registry,
            config,
            images: Box::new(NoImages),
            pending_images: Vec::new(),
        }
    }

    pub fn with_image_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.images = Box::new(loader);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Index a pre-existing node and capture its constraint snapshot list.
    pub fn register(&mut self, id: NodeId, idx: NodeIndex) {
        self.tree.capture_constraints_state(idx);
        self.registry.register(id, idx);
    }

    /// Replace the whole index.
    pub fn update_index(&mut self, registry: NodeRegistry) {
        self.registry = registry;
    }

    pub fn lookup(&self, id: &str) -> Option<&Node> {
        self.registry.lookup(id).and_then(|idx| self.tree.node(idx))
    }

    /// Constraint configs for every entry of a node's snapshot list.
    pub fn baseline(&self, id: &str) -> Option<Vec<ConstraintConfig>> {
        let idx = self.registry.lookup(id)?;
        Some(capture_baseline(&self.tree, idx))
    }

    // ─── Dispatch ────────────────────────────────────────────────────────

    /// Apply an ordered change sequence.
    pub fn tweak(&mut self, changes: &[Value]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for change in changes {
            let entry = match ChangeEntry::deserialize_from(change) {
                Ok(entry) => entry,
                Err(e) => {
                    report.record(None, e);
                    continue;
                }
            };
            match entry.operation() {
                Some(Operation::Insert) => {
                    log::info!("insert {:?}", entry.view.id);
                    self.handle_insert(&entry.view, &mut report);
                }
                Some(Operation::Modify) => {
                    log::info!("modify {:?}", entry.view.id);
                    self.handle_modify(&entry.view, &mut report);
                }
                None => report.record(
                    None,
                    TweakError::OperationUnknown {
                        operation: entry.operation.clone(),
                    },
                ),
            }
        }
        report
    }

    /// Parse a JSON change document and apply it.
    pub fn tweak_json(&mut self, document: &str) -> Result<ApplyReport, TweakError> {
        let changes: Vec<Value> = serde_json::from_str(document)
            .map_err(|e| TweakError::DocumentMalformed(e.to_string()))?;
        Ok(self.tweak(&changes))
    }

    /// Apply a stored, named change sequence. Unknown names apply nothing.
    pub fn apply_tweak(&mut self, store: &TweakStore, name: &str) -> Option<ApplyReport> {
        let changes = store.get(name)?;
        Some(self.tweak(changes))
    }

    // ─── Insert / modify ─────────────────────────────────────────────────

    fn handle_insert(&mut self, view: &ViewConfig, report: &mut ApplyReport) {
        let Some(id) = view.id.as_deref() else {
            report.record(None, malformed("insert without `id`"));
            return;
        };
        // Rejected inserts must not leave their id behind in the interner.
        let superview = view.superview.as_deref().unwrap_or_default();
        let Some(parent) = self.registry.lookup(superview) else {
            report.record(NodeId::existing(id), TweakError::unresolved(superview));
            return;
        };

        let type_tag = view.type_tag.as_deref().unwrap_or_default();
        if NodeKind::known_tag(type_tag).is_none() {
            report.record(
                NodeId::existing(id),
                TweakError::TypeUnknown {
                    type_tag: type_tag.to_string(),
                },
            );
            return;
        }

        let node_id = NodeId::intern(id);
        let Some(kind) = NodeKind::from_type_tag(type_tag, node_id) else {
            return;
        };

        let frame = view.frame.as_ref().map(literal_frame).unwrap_or_default();
        let node = Node::new(node_id, kind).with_frame(frame);
        let idx = self
            .tree
            .insert_child(parent, node, view.index.unwrap_or(usize::MAX));

        if let Some(props) = &view.properties {
            self.apply_properties(idx, props, report);
        }
        if let Some(layer) = &view.layer {
            self.apply_layer(idx, layer, report);
        }
        if let Some(constraints) = &view.constraints {
            self.patch_constraints(idx, constraints, false, report);
        }

        self.tree.capture_constraints_state(idx);
        self.registry.register(node_id, idx);
        report.applied += 1;
    }

    fn handle_modify(&mut self, view: &ViewConfig, report: &mut ApplyReport) {
        let Some(id) = view.id.as_deref() else {
            report.record(None, malformed("modify without `id`"));
            return;
        };
        let Some(idx) = self.registry.lookup(id) else {
            report.record(None, TweakError::unresolved(id));
            return;
        };

        if let Some(props) = &view.properties {
            self.apply_properties(idx, props, report);
        }
        if let Some(layer) = &view.layer {
            self.apply_layer(idx, layer, report);
        }
        if let Some(constraints) = &view.constraints {
            self.patch_constraints(idx, constraints, true, report);
        }
        if let Some(frame) = &view.frame {
            self.patch_frame(idx, frame, report);
        }
        report.applied += 1;
    }

    // ─── Deferred images ─────────────────────────────────────────────────

    /// Hand the pending remote fetches to the host.
    pub fn take_pending_images(&mut self) -> Vec<PendingImage> {
        std::mem::take(&mut self.pending_images)
    }

    /// Deliver the result of a deferred fetch. Failures leave the node as
    /// it was.
    pub fn complete_image(&mut self, pending: &PendingImage, result: Result<ImageContent, String>) {
        match result {
            Ok(content) => self.store_image(pending.node, pending.slot, content),
            Err(reason) => log::debug!("image {} failed: {reason}", pending.src),
        }
    }

    pub(crate) fn store_image(&mut self, idx: NodeIndex, slot: ImageSlot, content: ImageContent) {
        if let Some(Node {
            kind:
                NodeKind::ImageView {
                    image,
                    highlighted_image,
                },
            ..
        }) = self.tree.node_mut(idx)
        {
            match slot {
                ImageSlot::Image => *image = Some(content),
                ImageSlot::HighlightedImage => *highlighted_image = Some(content),
            }
        }
    }
}

impl ChangeEntry {
    fn deserialize_from(value: &Value) -> Result<Self, TweakError> {
        ChangeEntry::deserialize(value).map_err(|e| malformed(e.to_string()))
    }
}

fn malformed(reason: impl Into<String>) -> TweakError {
    TweakError::EntryMalformed {
        reason: reason.into(),
    }
}

/// Insert-time frame: numeric fields only.
fn literal_frame(fields: &Map<String, Value>) -> Frame {
    let mut frame = Frame::default();
    for (name, value) in fields {
        match value.as_f64() {
            Some(v) if frame.set(name, v) => {}
            _ => log::debug!("ignoring insert frame field {name}: {value}"),
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_then_modify_in_one_sequence() {
        let mut engine = LayoutEngine::new(EngineConfig::default());
        let report = engine.tweak(&[
            json!({"operation": "insert", "view": {
                "id": "hdr", "superview": "root", "index": 0, "type": "View",
                "frame": {"x": 0, "y": 0, "width": 320, "height": 44}}}),
            json!({"operation": "modify", "view": {"id": "hdr", "properties": {"alpha": 0.5}}}),
        ]);
        assert!(report.is_clean(), "{:?}", report.diagnostics);
        assert_eq!(report.applied, 2);
        let hdr = engine.lookup("hdr").unwrap();
        assert_eq!(hdr.frame, Frame::new(0.0, 0.0, 320.0, 44.0));
        assert_eq!(hdr.view.alpha, 0.5);
    }

    #[test]
    fn unknown_operation_is_skipped() {
        let mut engine = LayoutEngine::new(EngineConfig::default());
        let report = engine.tweak(&[json!({"operation": "delete", "view": {"id": "root"}})]);
        assert_eq!(report.applied, 0);
        assert!(matches!(
            report.diagnostics[0].error,
            TweakError::OperationUnknown { ref operation } if operation == "delete"
        ));
    }

    #[test]
    fn non_object_entries_are_malformed_not_fatal() {
        let mut engine = LayoutEngine::new(EngineConfig::default());
        let report = engine.tweak(&[
            json!(42),
            json!({"operation": "insert", "view": {"id": "ok", "superview": "root", "type": "View"}}),
        ]);
        assert_eq!(report.applied, 1);
        assert!(matches!(report.diagnostics[0].error, TweakError::EntryMalformed { .. }));
    }

    #[test]
    fn unknown_type_creates_nothing() {
        let mut engine = LayoutEngine::new(EngineConfig::default());
        let before = engine.registry().len();
        let report = engine.tweak(&[json!({"operation": "insert", "view": {
            "id": "grid", "superview": "root", "type": "UICollectionView"}})]);
        assert_eq!(engine.registry().len(), before);
        assert_eq!(engine.tree.len(), 1);
        assert!(matches!(report.diagnostics[0].error, TweakError::TypeUnknown { .. }));
    }

    #[test]
    fn rejected_inserts_do_not_intern_their_ids() {
        let mut engine = LayoutEngine::new(EngineConfig::default());
        let report = engine.tweak(&[
            json!({"operation": "insert", "view": {
                "id": "stray_orphan_4f1", "superview": "nowhere_4f1", "type": "View"}}),
            json!({"operation": "insert", "view": {
                "id": "stray_grid_4f1", "superview": "root", "type": "UICollectionView"}}),
        ]);
        assert_eq!(report.diagnostics.len(), 2);
        assert!(report.diagnostics.iter().all(|d| d.node_id.is_none()));
        assert_eq!(NodeId::existing("stray_orphan_4f1"), None);
        assert_eq!(NodeId::existing("stray_grid_4f1"), None);
        assert_eq!(NodeId::existing("nowhere_4f1"), None);
    }

    #[test]
    fn document_must_be_an_array() {
        let mut engine = LayoutEngine::new(EngineConfig::default());
        assert!(matches!(
            engine.tweak_json(r#"{"operation": "insert"}"#),
            Err(TweakError::DocumentMalformed(_))
        ));
        assert!(engine.tweak_json("[]").unwrap().is_clean());
    }
}

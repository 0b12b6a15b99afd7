//! Diagnostics for change-set application.
//!
//! Nothing in a change sequence is fatal: every failure skips one
//! sub-operation (a key, an attribute, a constraint, or a whole entry) and
//! is recorded here. The report is logged as it fills and handed back to
//! the caller, so tests assert on it instead of catching errors.

use thiserror::Error;
use tw_core::{ExprError, NodeId};

/// How loud a diagnostic is in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A whole entry was skipped, likely from a stale or broken document.
    Warning,
    /// One key or attribute was skipped.
    Info,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TweakError {
    #[error("reference `{reference}` does not resolve")]
    ReferenceUnresolved { reference: String },

    #[error("expression for `{attribute}` is malformed: {source}")]
    ExpressionMalformed {
        attribute: String,
        #[source]
        source: ExprError,
    },

    #[error("anchor `{attribute}` cannot be constrained: {reason}")]
    AnchorInvalid { attribute: String, reason: String },

    #[error("no handler accepts property `{key}`")]
    PropertyUnclaimed { key: String },

    #[error("unknown operation `{operation}`")]
    OperationUnknown { operation: String },

    #[error("unknown node type `{type_tag}`")]
    TypeUnknown { type_tag: String },

    #[error("change entry is malformed: {reason}")]
    EntryMalformed { reason: String },

    #[error("image `{src}` unavailable: {reason}")]
    ImageUnavailable { src: String, reason: String },

    #[error("change document is not a JSON array: {0}")]
    DocumentMalformed(String),
}

impl TweakError {
    pub fn severity(&self) -> Severity {
        match self {
            TweakError::OperationUnknown { .. }
            | TweakError::TypeUnknown { .. }
            | TweakError::EntryMalformed { .. }
            | TweakError::DocumentMalformed(_) => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub(crate) fn unresolved(reference: impl Into<String>) -> Self {
        TweakError::ReferenceUnresolved {
            reference: reference.into(),
        }
    }

    pub(crate) fn unclaimed(key: impl Into<String>) -> Self {
        TweakError::PropertyUnclaimed { key: key.into() }
    }

    pub(crate) fn anchor(attribute: &str, reason: impl Into<String>) -> Self {
        TweakError::AnchorInvalid {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single skipped sub-operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The node being inserted or modified, when known.
    pub node_id: Option<NodeId>,
    pub error: TweakError,
}

/// Outcome of applying one change sequence.
#[derive(Debug, Default, Clone)]
pub struct ApplyReport {
    /// Entries that were dispatched to insert or modify and found their node.
    pub applied: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ApplyReport {
    pub(crate) fn record(&mut self, node_id: Option<NodeId>, error: TweakError) {
        let who = node_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
        match error.severity() {
            Severity::Warning => log::warn!("[{who}] {error}"),
            Severity::Info => log::debug!("[{who}] {error}"),
        }
        self.diagnostics.push(Diagnostic { node_id, error });
    }

    /// True when nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &TweakError> {
        self.diagnostics.iter().map(|d| &d.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities() {
        assert_eq!(
            TweakError::OperationUnknown {
                operation: "delete".into()
            }
            .severity(),
            Severity::Warning
        );
        assert_eq!(TweakError::unclaimed("glow").severity(), Severity::Info);
    }

    #[test]
    fn report_collects_in_order() {
        let mut report = ApplyReport::default();
        report.record(None, TweakError::unresolved("ghost"));
        report.record(Some(NodeId::intern("hdr")), TweakError::unclaimed("glow"));
        assert!(!report.is_clean());
        assert_eq!(report.diagnostics[1].node_id, Some(NodeId::intern("hdr")));
        assert_eq!(
            report.errors().next().unwrap().to_string(),
            "reference `ghost` does not resolve"
        );
    }
}

//! Named change sequences.
//!
//! Design tools push a tweak once under a name; the host replays it on
//! demand (e.g. every time a screen is shown).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TweakStore {
    tweaks: HashMap<String, Vec<Value>>,
}

impl TweakStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `changes` under `name`, replacing any earlier sequence.
    pub fn add(&mut self, name: impl Into<String>, changes: Vec<Value>) {
        let name = name.into();
        if self.tweaks.insert(name.clone(), changes).is_some() {
            log::debug!("tweak {name} replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.tweaks.get(name).map(Vec::as_slice)
    }

    pub fn all(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.tweaks
            .iter()
            .map(|(name, changes)| (name.as_str(), changes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tweaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweaks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_replaces_by_name() {
        let mut store = TweakStore::new();
        store.add("checkout", vec![json!({"operation": "modify"})]);
        store.add("checkout", vec![json!(1), json!(2)]);
        store.add("promo", Vec::new());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("checkout").map(<[Value]>::len), Some(2));
        assert!(store.get("missing").is_none());

        let mut names: Vec<&str> = store.all().map(|(name, _)| name).collect();
        names.sort_unstable();
        assert_eq!(names, ["checkout", "promo"]);
    }

    #[test]
    fn serializes_as_a_plain_object() {
        let store: TweakStore =
            serde_json::from_value(json!({"hero": [{"operation": "insert"}]})).unwrap();
        assert_eq!(store.get("hero").unwrap().len(), 1);
    }
}

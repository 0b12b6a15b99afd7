//! Engine configuration.

use serde::{Deserialize, Serialize};

/// How remote image locators are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Fetch synchronously through the image loader. Deterministic; used
    /// while iterating and in tests.
    #[default]
    Development,
    /// Record a pending fetch and move on; the host completes it later via
    /// `LayoutEngine::complete_image`.
    Production,
}

/// Configuration for a `LayoutEngine`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub mode: EngineMode,

    /// Capability level of the running platform. Gates which semantic text
    /// styles resolve to a font (`Title1` and friends need 9, `LargeTitle`
    /// needs 11).
    pub platform_level: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Development,
            platform_level: 11,
        }
    }
}

impl EngineConfig {
    pub fn production() -> Self {
        Self {
            mode: EngineMode::Production,
            ..Self::default()
        }
    }

    /// Load from a JSON object; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"mode": "production"}"#).unwrap();
        assert_eq!(config.mode, EngineMode::Production);
        assert_eq!(config.platform_level, 11);

        let config = EngineConfig::from_json(r#"{"platformLevel": 9}"#).unwrap();
        assert_eq!(config.mode, EngineMode::Development);
        assert_eq!(config.platform_level, 9);
    }
}

//! Configuration types for the engine.

use serde::{Deserialize, Serialize};

/// Configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether a job's declared `requires_session_keys` are checked before it
    /// is called. A missing key aborts the run with
    /// [`EngineError::MissingSessionKeys`](sauron_types::EngineError::MissingSessionKeys).
    pub enforce_required_session_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enforce_required_session_keys: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.enforce_required_session_keys);
    }

    #[test]
    fn loads_from_yaml() {
        let config: EngineConfig =
            serde_yaml::from_str("enforce_required_session_keys: false").unwrap();
        assert!(!config.enforce_required_session_keys);
    }
}

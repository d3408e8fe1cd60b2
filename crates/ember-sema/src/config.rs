//! Tunables for the semantic core.

use serde::{Deserialize, Serialize};

/// Limits and thresholds shared by the evaluator, the monomorphization
/// engine and the discrimination validator.
///
/// Every field has a default, so a driver can embed this in its own
/// configuration file and only spell out what it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemaConfig {
    /// Deepest parameter shape the unifier will walk.
    pub max_shape_depth: usize,
    /// Deepest chain of nested evaluations, counting constant references.
    pub max_eval_depth: usize,
    /// Largest edit distance still offered as a "did you mean" hint.
    pub suggestion_distance: usize,
}

impl Default for SemaConfig {
    fn default() -> Self {
        Self {
            max_shape_depth: 64,
            max_eval_depth: 256,
            suggestion_distance: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SemaConfig = serde_json::from_str(r#"{ "max_shape_depth": 8 }"#).unwrap();
        assert_eq!(config.max_shape_depth, 8);
        assert_eq!(config.max_eval_depth, SemaConfig::default().max_eval_depth);
        assert_eq!(config.suggestion_distance, 2);
    }
}

//! Runtime Configuration
//!
//! Settings shared by the interpreter, trigger engine, and workflow
//! orchestrator. Loaded from `ARCANEA_*` environment variables with defaults
//! suitable for local development.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

// ============================================================================
// RUNTIME CONFIGURATION
// ============================================================================

/// Configuration for an Arcanea runtime session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcaneaConfig {
    // ========================================================================
    // Trigger Engine
    // ========================================================================
    /// Base confidence used by triggers that do not declare their own.
    pub default_confidence: f64,

    /// Maximum number of processed contexts kept in the trigger history.
    pub max_history: usize,

    // ========================================================================
    // Interpreter
    // ========================================================================
    /// Whether character and world declarations request AI enrichments.
    pub enable_enrichment: bool,

    /// Provider used when no archetype rule selects one.
    pub default_text_provider: String,

    /// Provider used for image generation.
    pub default_image_provider: String,

    /// Sampling temperature passed with spell casts.
    pub spell_temperature: f64,

    /// Token cap passed with spell casts.
    pub spell_max_tokens: u32,

    // ========================================================================
    // Workflow Orchestrator
    // ========================================================================
    /// Whether per-phase `timeout_ms` values are raced against the phase.
    pub enforce_phase_timeouts: bool,
}

impl Default for ArcaneaConfig {
    fn default() -> Self {
        Self {
            default_confidence: 0.8,
            max_history: 1000,
            enable_enrichment: true,
            default_text_provider: "anthropic-claude".to_string(),
            default_image_provider: "midjourney".to_string(),
            spell_temperature: 0.8,
            spell_max_tokens: 2000,
            enforce_phase_timeouts: true,
        }
    }
}

impl ArcaneaConfig {
    /// Create ArcaneaConfig from environment variables.
    ///
    /// Environment variables:
    /// - `ARCANEA_DEFAULT_CONFIDENCE`: Base trigger confidence (default: 0.8)
    /// - `ARCANEA_MAX_HISTORY`: Trigger history bound (default: 1000)
    /// - `ARCANEA_ENABLE_ENRICHMENT`: "true" or "false" (default: true)
    /// - `ARCANEA_TEXT_PROVIDER`: Fallback text provider id (default: anthropic-claude)
    /// - `ARCANEA_IMAGE_PROVIDER`: Image provider id (default: midjourney)
    /// - `ARCANEA_SPELL_TEMPERATURE`: Spell cast temperature (default: 0.8)
    /// - `ARCANEA_SPELL_MAX_TOKENS`: Spell cast token cap (default: 2000)
    /// - `ARCANEA_ENFORCE_PHASE_TIMEOUTS`: "true" or "false" (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let default_confidence = std::env::var("ARCANEA_DEFAULT_CONFIDENCE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.default_confidence);

        let max_history = std::env::var("ARCANEA_MAX_HISTORY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_history);

        let enable_enrichment = std::env::var("ARCANEA_ENABLE_ENRICHMENT")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.enable_enrichment);

        let default_text_provider = std::env::var("ARCANEA_TEXT_PROVIDER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.default_text_provider);

        let default_image_provider = std::env::var("ARCANEA_IMAGE_PROVIDER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.default_image_provider);

        let spell_temperature = std::env::var("ARCANEA_SPELL_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.spell_temperature);

        let spell_max_tokens = std::env::var("ARCANEA_SPELL_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.spell_max_tokens);

        let enforce_phase_timeouts = std::env::var("ARCANEA_ENFORCE_PHASE_TIMEOUTS")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.enforce_phase_timeouts);

        Self {
            default_confidence,
            max_history,
            enable_enrichment,
            default_text_provider,
            default_image_provider,
            spell_temperature,
            spell_max_tokens,
            enforce_phase_timeouts,
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "default_confidence".to_string(),
                value: self.default_confidence.to_string(),
                reason: "must be within [0, 1]".to_string(),
            });
        }
        if self.max_history == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_history".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.spell_max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "spell_max_tokens".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ArcaneaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_history, 1000);
        assert!((config.default_confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        let config = ArcaneaConfig {
            default_confidence: 1.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "default_confidence"));
    }

    #[test]
    fn test_validate_rejects_zero_history() {
        let config = ArcaneaConfig {
            max_history: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

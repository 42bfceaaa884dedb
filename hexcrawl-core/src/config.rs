//! Session rules configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::visibility::SightRule;

/// Seed used when a config does not pin one
pub const DEFAULT_SEED: u64 = 0x4845_5843;

/// Rules knobs for one session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub sight_rule: SightRule,
    /// Most bless cards one deck may hold at once
    pub max_bless: usize,
    pub max_curse: usize,
    /// Session RNG seed; None falls back to [`DEFAULT_SEED`]
    pub seed: Option<u64>,
    /// Reshuffle a flagged deck right after the attack that flagged it,
    /// otherwise at end of round
    pub reshuffle_after_attack: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            sight_rule: SightRule::Centerline,
            max_bless: 10,
            max_curse: 10,
            seed: None,
            reshuffle_after_attack: true,
        }
    }
}

impl RulesConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_sight_rule(mut self, sight_rule: SightRule) -> Self {
        self.sight_rule = sight_rule;
        self
    }

    pub fn with_reshuffle_after_attack(mut self, enabled: bool) -> Self {
        self.reshuffle_after_attack = enabled;
        self
    }

    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading rules config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing rules config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RulesConfig::default();
        assert_eq!(config.sight_rule, SightRule::Centerline);
        assert_eq!(config.max_bless, 10);
        assert!(config.reshuffle_after_attack);
        assert_eq!(config.effective_seed(), DEFAULT_SEED);
        assert_eq!(config.with_seed(9).effective_seed(), 9);
    }

    #[test]
    fn test_partial_json() {
        let config: RulesConfig = serde_json::from_str(r#"{"sight_rule":"corner_to_corner","seed":3}"#).unwrap();
        assert_eq!(config.sight_rule, SightRule::CornerToCorner);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.max_curse, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RulesConfig::load(Path::new("/nonexistent/rules.json")).unwrap_err();
        assert!(err.to_string().contains("reading rules config"));
    }
}

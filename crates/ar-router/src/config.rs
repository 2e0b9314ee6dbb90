//! Router configuration, loadable from TOML with environment overrides.

use ar_protocol::CallSource;
use serde::Deserialize;

use crate::inference::bedrock::BedrockConfig;
use crate::inference::ollama::OllamaConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterConfig {
    /// Pipeline thresholds and cascade order.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Local Ollama inference settings. Optional, defaults to enabled.
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Bedrock cloud tier. Optional, defaults to disabled.
    #[serde(default)]
    pub bedrock: BedrockConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Keyword score a tool needs before the selector trusts it.
    #[serde(default = "default_min_keyword_score")]
    pub min_keyword_score: f64,
    /// Model outputs below this confidence count as tier failure.
    #[serde(default = "default_min_model_confidence")]
    pub min_model_confidence: f64,
    /// Cascade order.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<CallSource>,
    /// Keep valid arguments across tiers and take only the failing ones
    /// from the next tier.
    #[serde(default = "default_targeted_escalation")]
    pub targeted_escalation: bool,
    /// Segments shorter than this make a split ambiguous.
    #[serde(default = "default_min_span_chars")]
    pub min_span_chars: usize,
}

fn default_min_keyword_score() -> f64 {
    0.35
}
fn default_min_model_confidence() -> f64 {
    0.3
}
fn default_tiers() -> Vec<CallSource> {
    vec![CallSource::Pattern, CallSource::LocalModel, CallSource::Cloud]
}
fn default_targeted_escalation() -> bool {
    true
}
fn default_min_span_chars() -> usize {
    4
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            min_keyword_score: default_min_keyword_score(),
            min_model_confidence: default_min_model_confidence(),
            tiers: default_tiers(),
            targeted_escalation: default_targeted_escalation(),
            min_span_chars: default_min_span_chars(),
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.tiers.is_empty(), "routing.tiers must not be empty");
        for (i, tier) in self.tiers.iter().enumerate() {
            anyhow::ensure!(
                !self.tiers[..i].contains(tier),
                "routing.tiers lists {tier} more than once"
            );
        }
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.min_keyword_score),
            "routing.min_keyword_score must be within 0..=1"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.min_model_confidence),
            "routing.min_model_confidence must be within 0..=1"
        );
        Ok(())
    }
}

impl RouterConfig {
    /// Load config from a TOML file path, then apply environment overrides.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.bedrock.apply_env();
        config.routing.validate()?;
        Ok(config)
    }

    /// File config when a path is given, defaults otherwise.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = Self::default();
                config.bedrock.apply_env();
                Ok(config)
            }
        }
    }
}

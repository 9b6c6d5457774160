use crate::regulator::{ComfortZone, EmotionalDynamics};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SolaceConfig {
    pub regulator: RegulatorConfig,
    pub orchestrator: OrchestratorConfig,
    pub llm: LlmConfig,
}

impl SolaceConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SolaceConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SOLACE_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("OLLAMA_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SOLACE_HISTORY_LIMIT") {
            if let Ok(n) = v.parse() {
                self.orchestrator.history_limit = n;
            }
        }
        if let Ok(v) = std::env::var("SOLACE_HANDLER_TIMEOUT_MS") {
            if let Ok(n) = v.parse() {
                self.orchestrator.handler_timeout_ms = Some(n);
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegulatorConfig {
    pub baseline: f32,
    pub max_rate_of_change: f32,
    pub comfort_zone: ComfortZone,
    pub dynamics: EmotionalDynamics,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            baseline: 0.3,
            max_rate_of_change: 0.2,
            comfort_zone: ComfortZone::default(),
            dynamics: EmotionalDynamics::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Conversation history entries kept per session (oldest dropped first).
    pub history_limit: usize,
    /// Recovery-mode transitions kept per session.
    pub transition_limit: usize,
    /// Analysis score a field must exceed to bring in its handler.
    pub handler_threshold: f32,
    /// Per-handler deadline. `None` waits on every handler indefinitely.
    pub handler_timeout_ms: Option<u64>,
    pub handlers: HandlerIds,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            transition_limit: 100,
            handler_threshold: 0.6,
            handler_timeout_ms: None,
            handlers: HandlerIds::default(),
        }
    }
}

/// Handler ids for each participant role. Roles may share an id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HandlerIds {
    pub conductor: String,
    pub technical: String,
    pub emotional: String,
    pub creative: String,
}

impl Default for HandlerIds {
    fn default() -> Self {
        Self {
            conductor: "conductor".to_string(),
            technical: "technical".to_string(),
            emotional: "emotional".to_string(),
            creative: "creative".to_string(),
        }
    }
}

/// The part a handler plays in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerRole {
    Conductor,
    Technical,
    Emotional,
    Creative,
}

impl HandlerIds {
    /// Role served by `id`. A shared id takes the first matching role in
    /// conductor, technical, emotional, creative order; unknown ids act as
    /// the conductor.
    pub fn role_of(&self, id: &str) -> HandlerRole {
        [
            (&self.conductor, HandlerRole::Conductor),
            (&self.technical, HandlerRole::Technical),
            (&self.emotional, HandlerRole::Emotional),
            (&self.creative, HandlerRole::Creative),
        ]
        .into_iter()
        .find(|(handler, _)| handler.as_str() == id)
        .map_or(HandlerRole::Conductor, |(_, role)| role)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `mock` (offline, deterministic) or `ollama`.
    pub provider: String,
    /// OpenAI-compatible endpoint root, e.g. `http://localhost:11434/v1`.
    pub base_url: String,
    /// Model used for any handler id missing from `models`.
    pub default_model: String,
    /// Handler id → model name.
    pub models: BTreeMap<String, String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            default_model: "llama3".to_string(),
            models: BTreeMap::new(),
            temperature: 0.7,
            max_tokens: 1024,
            request_timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    pub fn model_for(&self, handler_id: &str) -> &str {
        self.models
            .get(handler_id)
            .map(String::as_str)
            .unwrap_or(&self.default_model)
    }
}

// ============================================================================
// Tests
// ============================================================================

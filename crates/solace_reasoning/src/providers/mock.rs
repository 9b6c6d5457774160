//! Mock collaborators: deterministic, offline, no API keys.
//!
//! `KeywordAnalyzer` scores messages with keyword regexes, `TemplateResponder`
//! answers from fixed templates and `ConfidenceSynthesizer` keeps the most
//! confident response. Good enough to drive the pipeline end to end.

use crate::api_types::{HandlerResponse, MessageAnalysis, Synthesis};
use crate::collaborators::{Analyzer, Responder, Synthesizer};
use anyhow::Result;
use regex::Regex;
use solace_core::{HandlerIds, HandlerRole};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

static RE_TECHNICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(code|bug|error|compile|rust|function|api|server|database|deploy|algorithm)s?\b")
        .unwrap()
});
static RE_EMOTIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(feel|feeling|sad|happy|lonely|anxious|scared|love|miss|hurt|angry|upset)\b")
        .unwrap()
});
static RE_CREATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(imagine|story|poem|write|design|idea|create|dream)s?\b").unwrap()
});
static RE_RELATIONSHIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(we|us|together|friend|relationship|trust)\b").unwrap()
});
static RE_UNCERTAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\b(maybe|unsure|confused|not sure|don't know)\b|\?{2,})").unwrap()
});
static RE_DESTABILIZING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(hate you|shut up|worthless|useless|go away|leave me alone)\b").unwrap()
});

const SCORE_PER_HIT: f32 = 0.35;
const SCORE_PER_EXCLAMATION: f32 = 0.1;

fn score(re: &Regex, text: &str) -> f32 {
    (re.find_iter(text).count() as f32 * SCORE_PER_HIT).min(1.0)
}

#[derive(Debug, Clone, Default)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, message: &str) -> MessageAnalysis {
        let technical = score(&RE_TECHNICAL, message);
        let emotional = score(&RE_EMOTIONAL, message);
        let creative = score(&RE_CREATIVE, message);
        let exclamations = message.matches('!').count() as f32 * SCORE_PER_EXCLAMATION;

        MessageAnalysis {
            emotional_content: emotional,
            technical_content: technical,
            creativity_needed: creative,
            emotional_intensity: (emotional + exclamations).min(1.0),
            relationship_intensity: score(&RE_RELATIONSHIP, message),
            content_intensity: technical.max(creative) * 0.8,
            uncertainty: score(&RE_UNCERTAIN, message),
            destabilizing_factor: score(&RE_DESTABILIZING, message),
        }
    }
}

#[async_trait::async_trait]
impl Analyzer for KeywordAnalyzer {
    async fn analyze(&self, message: &str) -> Result<MessageAnalysis> {
        Ok(self.score(message))
    }
}

/// Answers every handler from a fixed template chosen by its role.
#[derive(Debug, Clone, Default)]
pub struct TemplateResponder {
    handlers: HandlerIds,
    latency: Option<Duration>,
}

impl TemplateResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before each response.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Resolve roles against configured handler ids.
    pub fn with_handlers(mut self, handlers: &HandlerIds) -> Self {
        self.handlers = handlers.clone();
        self
    }
}

#[async_trait::async_trait]
impl Responder for TemplateResponder {
    async fn respond(&self, message: &str, handler_id: &str) -> Result<HandlerResponse> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let words = message.split_whitespace().count();
        let (text, confidence) = match self.handlers.role_of(handler_id) {
            HandlerRole::Technical => {
                (format!("Let's work through it step by step: {}", message), 0.8)
            }
            HandlerRole::Emotional => {
                ("That sounds like a lot to carry. I'm here with you.".to_string(), 0.75)
            }
            HandlerRole::Creative => ("Here's an idea we could play with together.".to_string(), 0.7),
            HandlerRole::Conductor => (format!("I hear you: \"{}\"", message), 0.6),
        };
        Ok(HandlerResponse {
            response: text,
            confidence,
            complexity: (words as f32 / 50.0).min(1.0),
        })
    }
}

/// Picks the most confident response; mood follows the strongest signal.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceSynthesizer;

impl ConfidenceSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Synthesizer for ConfidenceSynthesizer {
    async fn synthesize(
        &self,
        analysis: &MessageAnalysis,
        responses: &BTreeMap<String, HandlerResponse>,
    ) -> Result<Synthesis> {
        // max_by keeps the last of equal elements; iterate in reverse so ties go to the lowest id
        let (best_id, best) = responses
            .iter()
            .rev()
            .max_by(|a, b| a.1.confidence.total_cmp(&b.1.confidence))
            .ok_or_else(|| anyhow::anyhow!("No responses to synthesize"))?;

        let mean_confidence =
            responses.values().map(|r| r.confidence).sum::<f32>() / responses.len() as f32;

        let signals = [
            ("empathetic", analysis.emotional_content),
            ("focused", analysis.technical_content),
            ("playful", analysis.creativity_needed),
        ];
        let (mood, strength) = signals
            .iter()
            .copied()
            .fold(("calm", 0.0f32), |acc, s| if s.1 > acc.1 { s } else { acc });

        Ok(Synthesis {
            final_response: best.response.clone(),
            emotional_context: format!("{} ({:.2}) via {}", mood, strength, best_id),
            confidence: mean_confidence,
            mood: mood.to_string(),
        })
    }
}

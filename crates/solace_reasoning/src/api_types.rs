use serde::{Deserialize, Serialize};

/// Signals extracted from a message by an [`Analyzer`](crate::collaborators::Analyzer).
///
/// Every field is optional on the wire and defaults to 0.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageAnalysis {
    pub emotional_content: f32,
    pub technical_content: f32,
    pub creativity_needed: f32,
    pub emotional_intensity: f32,
    pub relationship_intensity: f32,
    pub content_intensity: f32,
    pub uncertainty: f32,
    pub destabilizing_factor: f32,
}

impl MessageAnalysis {
    /// Strongest of the three intensity signals; drives arousal regulation.
    pub fn peak_intensity(&self) -> f32 {
        self.emotional_intensity
            .max(self.relationship_intensity)
            .max(self.content_intensity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResponse {
    pub response: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub complexity: f32,
}

impl HandlerResponse {
    pub fn new(response: impl Into<String>, confidence: f32, complexity: f32) -> Self {
        Self {
            response: response.into(),
            confidence,
            complexity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub final_response: String,
    pub emotional_context: String,
    pub confidence: f32,
    pub mood: String,
}

//! Arousal regulation
//!
//! A single scalar "arousal" level is pulled toward a target each turn. Below
//! the autonomy threshold the step is clamped by a headroom that shrinks as the
//! level approaches 1.0; at or above it the regulator switches to exponential
//! smoothing and trusts its inputs.

use crate::config::RegulatorConfig;
use serde::{Deserialize, Serialize};

/// Named intensity bands. Used for labeling only, never for control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComfortBand {
    Baseline,
    Engaged,
    Resonating,
    Peak,
    Autonomous,
}

impl ComfortBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComfortBand::Baseline => "baseline",
            ComfortBand::Engaged => "engaged",
            ComfortBand::Resonating => "resonating",
            ComfortBand::Peak => "peak",
            ComfortBand::Autonomous => "autonomous",
        }
    }
}

impl std::fmt::Display for ComfortBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper thresholds of each comfort band, ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComfortZone {
    pub baseline: f32,
    pub engaged: f32,
    pub resonating: f32,
    pub peak: f32,
    pub autonomous: f32,
}

impl Default for ComfortZone {
    fn default() -> Self {
        Self {
            baseline: 0.2,
            engaged: 0.4,
            resonating: 0.6,
            peak: 0.8,
            autonomous: 1.0,
        }
    }
}

impl ComfortZone {
    /// Classify an intensity by descending strict comparison.
    ///
    /// A value exactly on a threshold falls into the lower band, so `0.8` is
    /// `Resonating` and `1.0` is `Peak`. The `baseline` threshold is never
    /// consulted: anything at or below `engaged` is `Baseline`.
    pub fn classify(&self, intensity: f32) -> ComfortBand {
        if intensity > self.autonomous {
            ComfortBand::Autonomous
        } else if intensity > self.peak {
            ComfortBand::Peak
        } else if intensity > self.resonating {
            ComfortBand::Resonating
        } else if intensity > self.engaged {
            ComfortBand::Engaged
        } else {
            ComfortBand::Baseline
        }
    }
}

/// Tunables for the two update regimes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionalDynamics {
    /// Retention weight of the current level in autonomous smoothing.
    pub adaptation_rate: f32,
    /// Levels at or above this use autonomous smoothing.
    pub autonomy_threshold: f32,
    /// Fraction of the remaining headroom withheld from each clamped step.
    pub stability_margin: f32,
    /// Carried for tuning parity; not read by `regulate`.
    pub recovery_rate: f32,
}

impl Default for EmotionalDynamics {
    fn default() -> Self {
        Self {
            adaptation_rate: 0.95,
            autonomy_threshold: 0.75,
            stability_margin: 0.15,
            recovery_rate: 0.1,
        }
    }
}

/// Bounded, stability-constrained regulator for the arousal scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArousalRegulator {
    pub current_level: f32,
    pub baseline: f32,
    /// Declared cap on per-call change. `regulate` does not enforce it;
    /// downstream tuning was done against the uncapped behavior.
    pub max_rate_of_change: f32,
    pub comfort_zone: ComfortZone,
    pub emotional_dynamics: EmotionalDynamics,
    /// Band of the most recent `intensity` passed to `regulate`.
    pub emotional_state: ComfortBand,
    /// Mirror of `current_level` after each `regulate`.
    pub intensity_level: f32,
}

impl Default for ArousalRegulator {
    fn default() -> Self {
        Self::from_config(&RegulatorConfig::default())
    }
}

impl ArousalRegulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RegulatorConfig) -> Self {
        Self {
            current_level: config.baseline,
            baseline: config.baseline,
            max_rate_of_change: config.max_rate_of_change,
            comfort_zone: config.comfort_zone.clone(),
            emotional_dynamics: config.dynamics.clone(),
            emotional_state: ComfortBand::Baseline,
            intensity_level: config.baseline,
        }
    }

    /// Whether the next `regulate` call takes the smoothing branch.
    pub fn is_autonomous(&self) -> bool {
        self.current_level >= self.emotional_dynamics.autonomy_threshold
    }

    /// Largest step the clamped branch allows from the current level.
    pub fn max_change(&self) -> f32 {
        (1.0 - self.emotional_dynamics.stability_margin) * (1.0 - self.current_level)
    }

    pub fn classify(&self, intensity: f32) -> ComfortBand {
        self.comfort_zone.classify(intensity)
    }

    /// Move `current_level` toward `target_level` and label `intensity`.
    ///
    /// Every caller passes the same value for both arguments; the two
    /// parameters are kept so the signature stays compatible with existing
    /// tuning code.
    ///
    /// The smoothing branch applies no clamp: the result stays in `[0, 1]`
    /// only when both the current level and the target already do.
    pub fn regulate(&mut self, target_level: f32, intensity: f32) -> f32 {
        self.emotional_state = self.comfort_zone.classify(intensity);

        let autonomous = self.is_autonomous();
        if autonomous {
            let rate = self.emotional_dynamics.adaptation_rate;
            self.current_level = rate * self.current_level + (1.0 - rate) * target_level;
        } else {
            let max_change = self.max_change();
            let change = (target_level - self.current_level).clamp(-max_change, max_change);
            self.current_level = (self.current_level + change).clamp(0.0, 1.0);
        }

        self.intensity_level = self.current_level;

        tracing::trace!(
            autonomous,
            band = %self.emotional_state,
            level = self.current_level,
            "Regulated arousal toward {:.3}",
            target_level
        );

        self.current_level
    }
}

//! Session-level emotional state
//!
//! Holds the scalars the pipeline reads and writes every turn, plus the
//! recovery flag that makes the pipeline short-circuit. Arousal is driven
//! exclusively through the owned [`ArousalRegulator`].

use crate::config::RegulatorConfig;
use crate::regulator::{ArousalRegulator, ComfortBand};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

const CONFUSION_LIMIT: f32 = 0.7;
const COGNITIVE_LOAD_LIMIT: f32 = 0.8;
const STABILITY_FLOOR: f32 = 0.4;
const AROUSAL_LIMIT: f32 = 0.85;

const CONFUSION_DECAY: f32 = 0.7;
const COGNITIVE_LOAD_DECAY: f32 = 0.8;
const AROUSAL_DECAY: f32 = 0.75;
const STABILITY_BOOST: f32 = 1.2;

const RECOVERED_STABILITY: f32 = 0.8;
const RECOVERED_CONFUSION: f32 = 0.3;

const UNCERTAINTY_GAIN: f32 = 0.3;
const DESTABILIZATION_GAIN: f32 = 0.2;
const FAILURE_CONFUSION: f32 = 0.3;
const FAILURE_STABILITY_DECAY: f32 = 0.8;
const LOAD_PER_RESPONSE: f32 = 0.15;
const LOAD_PER_COMPLEXITY: f32 = 0.1;

/// Replace NaN/Inf on deserialization so a corrupted snapshot cannot poison
/// the threshold checks.
fn deserialize_finite_f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = f32::deserialize(deserializer)?;
    if v.is_finite() {
        Ok(v)
    } else {
        tracing::warn!("Non-finite value in emotional state snapshot, using 0.0");
        Ok(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    /// -1.0 (negative) to 1.0 (positive)
    #[serde(deserialize_with = "deserialize_finite_f32")]
    pub valence: f32,
    /// 0.0 to 1.0, written by the regulator
    #[serde(deserialize_with = "deserialize_finite_f32")]
    pub arousal: f32,
    #[serde(deserialize_with = "deserialize_finite_f32")]
    pub confusion: f32,
    #[serde(deserialize_with = "deserialize_finite_f32")]
    pub cognitive_load: f32,
    #[serde(deserialize_with = "deserialize_finite_f32")]
    pub stability: f32,
    pub recovery_mode: bool,
    pub regulation_attempts: u32,
    pub last_regulation: Option<DateTime<Utc>>,
    pub regulator: ArousalRegulator,
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self::with_regulator(ArousalRegulator::default())
    }
}

impl EmotionalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &RegulatorConfig) -> Self {
        Self::with_regulator(ArousalRegulator::from_config(config))
    }

    fn with_regulator(regulator: ArousalRegulator) -> Self {
        Self {
            valence: 0.0,
            arousal: regulator.current_level,
            confusion: 0.0,
            cognitive_load: 0.0,
            stability: 1.0,
            recovery_mode: false,
            regulation_attempts: 0,
            last_regulation: None,
            regulator,
        }
    }

    /// True when any of confusion, cognitive load, stability or arousal is
    /// past its limit.
    pub fn needs_regulation(&self) -> bool {
        self.confusion > CONFUSION_LIMIT
            || self.cognitive_load > COGNITIVE_LOAD_LIMIT
            || self.stability < STABILITY_FLOOR
            || self.arousal > AROUSAL_LIMIT
    }

    /// Decay the overloaded scalars and enter recovery, then leave recovery
    /// if the state is calm enough.
    ///
    /// Both checks run on every call and are not exclusive: the second sees
    /// the values the first just decayed.
    pub fn apply_regulation(&mut self) {
        if self.needs_regulation() {
            self.recovery_mode = true;
            self.last_regulation = Some(Utc::now());
            self.regulation_attempts += 1;

            self.confusion *= CONFUSION_DECAY;
            self.cognitive_load *= COGNITIVE_LOAD_DECAY;
            self.arousal *= AROUSAL_DECAY;
            self.stability = (self.stability * STABILITY_BOOST).min(1.0);

            tracing::info!(
                attempt = self.regulation_attempts,
                confusion = self.confusion,
                cognitive_load = self.cognitive_load,
                stability = self.stability,
                arousal = self.arousal,
                "Emotional regulation engaged"
            );
        }

        if self.stability > RECOVERED_STABILITY && self.confusion < RECOVERED_CONFUSION {
            if self.recovery_mode {
                tracing::info!("Recovery mode cleared");
            }
            self.recovery_mode = false;
        }
    }

    /// Run the regulator and mirror its level into `arousal`.
    pub fn regulate_arousal(&mut self, target_level: f32, intensity: f32) -> f32 {
        self.arousal = self.regulator.regulate(target_level, intensity);
        self.arousal
    }

    pub fn absorb_uncertainty(&mut self, uncertainty: f32) {
        self.confusion = (self.confusion + uncertainty * UNCERTAINTY_GAIN).min(1.0);
    }

    pub fn absorb_destabilization(&mut self, factor: f32) {
        self.stability = (self.stability - factor * DESTABILIZATION_GAIN).max(0.0);
    }

    /// Penalty applied when a turn fails unexpectedly.
    pub fn absorb_failure(&mut self) {
        self.confusion = (self.confusion + FAILURE_CONFUSION).min(1.0);
        self.stability *= FAILURE_STABILITY_DECAY;
    }

    /// Cognitive cost of gathering `response_count` responses.
    pub fn absorb_workload(&mut self, response_count: usize, complexity_sum: f32) {
        let load = response_count as f32 * LOAD_PER_RESPONSE + complexity_sum * LOAD_PER_COMPLEXITY;
        self.cognitive_load = (self.cognitive_load + load).clamp(0.0, 1.0);
    }

    pub fn band(&self) -> ComfortBand {
        self.regulator.emotional_state
    }

    /// Short description for user-facing context.
    pub fn describe(&self) -> String {
        if self.recovery_mode {
            format!("recovering ({} regulation attempts)", self.regulation_attempts)
        } else if self.needs_regulation() {
            "overwhelmed".to_string()
        } else {
            format!("{}, stability {:.2}", self.band(), self.stability)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(confusion: f32, cognitive_load: f32, stability: f32, arousal: f32) -> EmotionalState {
        EmotionalState {
            confusion,
            cognitive_load,
            stability,
            arousal,
            ..EmotionalState::default()
        }
    }

    #[test]
    fn test_defaults() {
        let s = EmotionalState::new();
        assert!((s.arousal - 0.3).abs() < 1e-6);
        assert!((s.stability - 1.0).abs() < 1e-6);
        assert!(!s.recovery_mode);
        assert_eq!(s.regulation_attempts, 0);
        assert!(s.last_regulation.is_none());
        assert!(!s.needs_regulation());
    }

    #[test]
    fn test_confusion_alone_needs_regulation() {
        assert!(state(0.75, 0.5, 0.9, 0.2).needs_regulation());
    }

    #[test]
    fn test_each_threshold_is_strict() {
        assert!(!state(0.7, 0.0, 1.0, 0.0).needs_regulation());
        assert!(!state(0.0, 0.8, 1.0, 0.0).needs_regulation());
        assert!(!state(0.0, 0.0, 0.4, 0.0).needs_regulation());
        assert!(!state(0.0, 0.0, 1.0, 0.85).needs_regulation());
        assert!(state(0.0, 0.81, 1.0, 0.0).needs_regulation());
        assert!(state(0.0, 0.0, 0.39, 0.0).needs_regulation());
        assert!(state(0.0, 0.0, 1.0, 0.86).needs_regulation());
    }

    #[test]
    fn test_apply_regulation_scenario() {
        let mut s = state(0.75, 0.85, 0.3, 0.9);
        s.apply_regulation();
        assert!((s.confusion - 0.525).abs() < 1e-6);
        assert!((s.cognitive_load - 0.68).abs() < 1e-6);
        assert!((s.arousal - 0.675).abs() < 1e-6);
        assert!((s.stability - 0.36).abs() < 1e-6);
        assert!(s.recovery_mode, "stability below 0.8 keeps recovery on");
        assert_eq!(s.regulation_attempts, 1);
        assert!(s.last_regulation.is_some());
        // the regulator keeps its own level
        assert!((s.regulator.current_level - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_next_regulation_starts_from_regulator_level() {
        let mut s = EmotionalState::new();
        s.regulate_arousal(0.9, 0.9);
        s.apply_regulation();
        assert!((s.arousal - 0.67125).abs() < 1e-6);
        assert!((s.regulator.current_level - 0.895).abs() < 1e-6);

        // 0.895 is past the autonomy threshold: smoothed, not clamped
        let level = s.regulate_arousal(0.9, 0.9);
        assert!((level - 0.89525).abs() < 1e-6);
        assert!((s.arousal - 0.89525).abs() < 1e-6);
    }

    #[test]
    fn test_apply_regulation_twice() {
        let mut s = state(0.75, 0.85, 0.3, 0.9);
        s.apply_regulation();
        // stability 0.36 is still below the floor, so the second call decays again
        s.apply_regulation();
        assert_eq!(s.regulation_attempts, 2);
        assert!((s.confusion - 0.3675).abs() < 1e-6);
        assert!((s.stability - 0.432).abs() < 1e-6);
        assert!(s.recovery_mode);

        // now nothing is past its limit: a third call changes nothing
        let before = s.clone();
        s.apply_regulation();
        assert_eq!(s.regulation_attempts, 2);
        assert_eq!(s.confusion, before.confusion);
        assert!(s.recovery_mode);
    }

    #[test]
    fn test_regulation_sets_then_clears_in_one_call() {
        // arousal breach only; decay leaves stability 1.0 and confusion 0.1
        let mut s = state(0.1, 0.0, 1.0, 0.9);
        s.apply_regulation();
        assert_eq!(s.regulation_attempts, 1);
        assert!(!s.recovery_mode);
        assert!(s.last_regulation.is_some());
    }

    #[test]
    fn test_calm_state_clears_recovery_without_decay() {
        let mut s = state(0.1, 0.2, 0.95, 0.3);
        s.recovery_mode = true;
        s.apply_regulation();
        assert!(!s.recovery_mode);
        assert_eq!(s.regulation_attempts, 0);
        assert!((s.confusion - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_regulate_arousal_mirrors_regulator() {
        let mut s = EmotionalState::new();
        let level = s.regulate_arousal(0.9, 0.9);
        assert!((level - 0.895).abs() < 1e-6);
        assert!((s.arousal - s.regulator.current_level).abs() < 1e-6);
        assert_eq!(s.band(), ComfortBand::Peak);
    }

    #[test]
    fn test_absorb_failure() {
        let mut s = state(0.5, 0.0, 0.45, 0.3);
        s.absorb_failure();
        assert!((s.confusion - 0.8).abs() < 1e-6);
        assert!((s.stability - 0.36).abs() < 1e-6);
        assert!(s.needs_regulation());
    }

    #[test]
    fn test_absorb_workload_clamps() {
        let mut s = EmotionalState::new();
        s.absorb_workload(2, 1.0);
        assert!((s.cognitive_load - 0.4).abs() < 1e-6);
        s.absorb_workload(4, 3.0);
        assert!((s.cognitive_load - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_absorb_signals_are_bounded() {
        let mut s = EmotionalState::new();
        s.absorb_uncertainty(10.0);
        s.absorb_destabilization(10.0);
        assert!((s.confusion - 1.0).abs() < 1e-6);
        assert!(s.stability.abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_round_trip_and_null_rejected() {
        let mut json = serde_json::to_value(EmotionalState::new()).unwrap();
        json["confusion"] = serde_json::json!(null);
        assert!(serde_json::from_value::<EmotionalState>(json).is_err());

        let restored: EmotionalState =
            serde_json::from_str(&serde_json::to_string(&EmotionalState::new()).unwrap()).unwrap();
        assert_eq!(restored, EmotionalState::new());
    }

    #[test]
    fn test_non_finite_snapshot_values_become_zero() {
        let snapshot = toml::to_string(&EmotionalState::new()).unwrap();
        assert!(snapshot.contains("\nconfusion = 0.0\n"), "{}", snapshot);
        assert!(snapshot.contains("\nstability = 1.0\n"), "{}", snapshot);
        let corrupted = snapshot
            .replace("\nconfusion = 0.0\n", "\nconfusion = nan\n")
            .replace("\nstability = 1.0\n", "\nstability = -inf\n");

        let restored: EmotionalState = toml::from_str(&corrupted).unwrap();
        assert_eq!(restored.confusion, 0.0);
        assert_eq!(restored.stability, 0.0);
        assert!((restored.arousal - 0.3).abs() < 1e-6);
    }
}

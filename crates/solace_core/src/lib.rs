//! # Solace Core
//!
//! Emotional regulation for a companion assistant:
//!
//! - [`ArousalRegulator`]: bounded update of the arousal scalar with a
//!   clamped regime and an autonomous smoothing regime
//! - [`EmotionalState`]: session scalars, the need-regulation predicate and
//!   the decay step that drives recovery mode
//! - [`SolaceConfig`]: TOML configuration shared by every crate

pub mod config;
pub mod emotion;
pub mod regulator;

pub use config::{HandlerIds, HandlerRole, LlmConfig, OrchestratorConfig, RegulatorConfig, SolaceConfig};
pub use emotion::EmotionalState;
pub use regulator::{ArousalRegulator, ComfortBand, ComfortZone, EmotionalDynamics};

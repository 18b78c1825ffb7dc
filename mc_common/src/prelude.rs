//! Prelude module for common re-exports.
//!
//! ```rust
//! use mc_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::mixer::config::{
    MixOptions, MixerConfig, MixerSection, SaturationMode, StreamFormat, TransportConfig,
    YawLimitPolicy,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_ROTORS, QUAD_ROTORS};

// ─── Mixer Types ────────────────────────────────────────────────────
pub use crate::mixer::error::{MixError, MixFault};
pub use crate::mixer::geometry::{FramePreset, RotorGeometryTable};
pub use crate::mixer::types::{ActuatorOutputVector, ControlInputVector, RotorSpec};

// ─── Wire ───────────────────────────────────────────────────────────
pub use crate::mixer::wire::{AttitudeCommandMsg, QuadMixerOutMsg, WireError};

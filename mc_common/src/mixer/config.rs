//! Mixer configuration structures.
//!
//! Loaded from TOML via [`ConfigLoader`](crate::config::ConfigLoader).
//!
//! ```toml
//! [shared]
//! service_name = "MulticopterMixer"
//!
//! [mixer]
//! frame = "quad_plus"
//! saturation = "compat"
//! yaw_limit = "table_order"
//!
//! [transport]
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};

use super::geometry::{FramePreset, RotorGeometryTable};
use super::types::RotorSpec;
use crate::config::{ConfigError, SharedConfig};
use crate::consts::{DEFAULT_COMMAND_TOPIC, DEFAULT_RESULT_TOPIC};

// ─── Mixing Modes ───────────────────────────────────────────────────

/// What to do with the global high-side scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaturationMode {
    /// Compute `scale_out` and report it, but leave outputs untouched.
    /// High-side saturation is handled by the final clamp alone.
    #[default]
    Compat,
    /// Multiply every output by `scale_out` before the final clamp,
    /// trading total thrust for preserved differential authority.
    ScaleOut,
}

/// How the first pass limits yaw authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YawLimitPolicy {
    /// Rotors are checked in table order against the running yaw value;
    /// every qualifying rotor overwrites it.
    #[default]
    TableOrder,
    /// Every rotor is checked against the commanded yaw; the
    /// smallest-magnitude limit wins.
    MostRestrictive,
}

/// Mode switches for one mixing engine.
///
/// Not read from TOML directly; see [`MixerSection::options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MixOptions {
    /// High-side saturation handling.
    pub saturation: SaturationMode,
    /// Yaw de-rating policy.
    pub yaw_limit: YawLimitPolicy,
}

// ─── Geometry Section ───────────────────────────────────────────────

/// `[mixer]` section: frame geometry plus mode switches.
///
/// An explicit `[[mixer.rotors]]` list takes precedence over `frame`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixerSection {
    /// Built-in frame preset.
    #[serde(default)]
    pub frame: FramePreset,
    /// Custom rotor table, overrides `frame` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotors: Option<Vec<RotorSpec>>,
    /// High-side saturation handling.
    #[serde(default)]
    pub saturation: SaturationMode,
    /// Yaw de-rating policy.
    #[serde(default)]
    pub yaw_limit: YawLimitPolicy,
}

impl MixerSection {
    /// Build the validated geometry table.
    pub fn build_table(&self) -> Result<RotorGeometryTable, ConfigError> {
        match &self.rotors {
            Some(rotors) => RotorGeometryTable::new(rotors)
                .map_err(|e| ConfigError::ValidationError(e.to_string())),
            None => Ok(self.frame.table()),
        }
    }

    /// Mode switches of this section.
    pub fn options(&self) -> MixOptions {
        MixOptions {
            saturation: self.saturation,
            yaw_limit: self.yaw_limit,
        }
    }

    /// Human-readable geometry source for logs.
    pub fn geometry_label(&self) -> String {
        match &self.rotors {
            Some(rotors) => format!("custom ({} rotors)", rotors.len()),
            None => self.frame.to_string(),
        }
    }
}

// ─── Transport Section ──────────────────────────────────────────────

/// Framing of the command / result streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Fixed-size little-endian f32 frames.
    Binary,
}

/// `[transport]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Channel the attitude commands arrive on.
    #[serde(default = "default_command_topic")]
    pub command_topic: String,
    /// Channel the throttle results are published on.
    #[serde(default = "default_result_topic")]
    pub result_topic: String,
    /// Stream framing.
    #[serde(default)]
    pub format: StreamFormat,
}

fn default_command_topic() -> String {
    DEFAULT_COMMAND_TOPIC.to_string()
}

fn default_result_topic() -> String {
    DEFAULT_RESULT_TOPIC.to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            command_topic: default_command_topic(),
            result_topic: default_result_topic(),
            format: StreamFormat::default(),
        }
    }
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete mixer process configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixerConfig {
    /// Service identity and log level.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Geometry and modes.
    #[serde(default)]
    pub mixer: MixerSection,
    /// Channel names and framing.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl MixerConfig {
    /// Semantic validation.
    ///
    /// # Errors
    /// `ConfigError::ValidationError` if the service name or a topic is
    /// empty, or the geometry table is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        if self.transport.command_topic.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "transport.command_topic cannot be empty".to_string(),
            ));
        }
        if self.transport.result_topic.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "transport.result_topic cannot be empty".to_string(),
            ));
        }
        self.mixer.build_table()?;
        Ok(())
    }
}

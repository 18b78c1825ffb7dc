//! TOML configuration loader with validation.
//!
//! Loads `MixerConfig`, applies command-line overrides, validates, and
//! builds the immutable geometry table the engine is constructed from.

use std::path::Path;

use mc_common::config::{ConfigError, ConfigLoader};
use mc_common::mixer::config::{MixerConfig, SaturationMode, StreamFormat, YawLimitPolicy};
use mc_common::mixer::geometry::{FramePreset, RotorGeometryTable};
use tracing::{info, warn};

use crate::mix::MixingEngine;

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Validated configuration, ready for runtime use.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Parsed (and overridden) config document.
    pub config: MixerConfig,
    /// Geometry table built from `config.mixer`.
    pub geometry: RotorGeometryTable,
}

impl LoadedConfig {
    /// Build from an in-memory config, validating it.
    pub fn from_config(config: MixerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let geometry = config.mixer.build_table()?;
        Ok(Self { config, geometry })
    }

    /// Engine for this geometry and mode set.
    pub fn engine(&self) -> MixingEngine {
        MixingEngine::new(self.geometry.clone(), self.config.mixer.options())
    }
}

/// Where the configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from the given file.
    File,
    /// Default path absent; built-in defaults used.
    Defaults,
}

// ─── Overrides ──────────────────────────────────────────────────────

/// Command-line overrides applied on top of the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replace the frame preset (and drop any custom rotor list).
    pub frame: Option<FramePreset>,
    /// Replace the saturation mode.
    pub saturation: Option<SaturationMode>,
    /// Replace the yaw limit policy.
    pub yaw_limit: Option<YawLimitPolicy>,
    /// Replace the stream format.
    pub format: Option<StreamFormat>,
}

impl Overrides {
    /// Apply to a config document in place.
    pub fn apply(&self, config: &mut MixerConfig) {
        if let Some(frame) = self.frame {
            if config.mixer.rotors.take().is_some() {
                warn!("--frame {frame} replaces the custom rotor table from the config file");
            }
            config.mixer.frame = frame;
        }
        if let Some(saturation) = self.saturation {
            config.mixer.saturation = saturation;
        }
        if let Some(yaw_limit) = self.yaw_limit {
            config.mixer.yaw_limit = yaw_limit;
        }
        if let Some(format) = self.format {
            config.transport.format = format;
        }
    }
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate a mixer config file.
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<LoadedConfig, ConfigError> {
    let mut config = MixerConfig::load(path)?;
    overrides.apply(&mut config);
    LoadedConfig::from_config(config)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(toml: &str, overrides: &Overrides) -> Result<LoadedConfig, ConfigError> {
    let mut config = MixerConfig::load_str(toml)?;
    overrides.apply(&mut config);
    LoadedConfig::from_config(config)
}

/// Load `path`, falling back to built-in defaults when the file is absent
/// and `required` is false.
pub fn load_or_default(
    path: &Path,
    required: bool,
    overrides: &Overrides,
) -> Result<(LoadedConfig, ConfigSource), ConfigError> {
    match load_config(path, overrides) {
        Ok(loaded) => {
            info!("Loaded mixer config from {}", path.display());
            Ok((loaded, ConfigSource::File))
        }
        Err(ConfigError::FileNotFound) if !required => {
            warn!(
                "No config at {}; using built-in defaults",
                path.display()
            );
            let mut config = MixerConfig::default();
            overrides.apply(&mut config);
            Ok((LoadedConfig::from_config(config)?, ConfigSource::Defaults))
        }
        Err(e) => Err(e),
    }
}

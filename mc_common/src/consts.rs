//! System-wide constants for the mixer workspace.
//!
//! Single source of truth for numeric limits and default names.

/// Maximum number of rotors in a geometry table.
pub const MAX_ROTORS: usize = 16;

/// Number of rotors in the reference quad frames.
pub const QUAD_ROTORS: usize = 4;

/// Default command channel name (attitude controller actuator group 0).
pub const DEFAULT_COMMAND_TOPIC: &str = "MulticopterAttitudeControl/actuators_0";

/// Default result channel name.
pub const DEFAULT_RESULT_TOPIC: &str = "MulticopterMixer/mixer_out";

/// Default service name reported in logs.
pub const DEFAULT_SERVICE_NAME: &str = "MulticopterMixer";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/mixer.toml";

//! Integration test: startup sequence.
//!
//! Validates: config file on disk → overrides → validated geometry →
//! engine → node producing one result per command.

use std::path::Path;

use mc_common::config::ConfigError;
use mc_common::mixer::config::{SaturationMode, StreamFormat};
use mc_common::mixer::geometry::FramePreset;
use mc_common::mixer::types::ControlInputVector;
use mc_mixer::config::{ConfigSource, Overrides, load_config, load_or_default};
use mc_mixer::node::MixerNode;
use mc_mixer::transport::channel::{command_channel, result_channel};
use tempfile::TempDir;

const HEXA_TOML: &str = r#"
[shared]
log_level = "warn"
service_name = "hexa-mixer"

[mixer]
saturation = "scale_out"

[[mixer.rotors]]
roll_scale = -1.0
pitch_scale = 0.0
yaw_scale = -1.0

[[mixer.rotors]]
roll_scale = 1.0
pitch_scale = 0.0
yaw_scale = 1.0

[[mixer.rotors]]
roll_scale = 0.5
pitch_scale = 0.866
yaw_scale = -1.0

[[mixer.rotors]]
roll_scale = -0.5
pitch_scale = -0.866
yaw_scale = 1.0

[[mixer.rotors]]
roll_scale = -0.5
pitch_scale = 0.866
yaw_scale = 1.0

[[mixer.rotors]]
roll_scale = 0.5
pitch_scale = -0.866
yaw_scale = -1.0

[transport]
format = "binary"
"#;

#[test]
fn hexa_config_drives_six_output_node() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("mixer.toml");
    std::fs::write(&path, HEXA_TOML).unwrap();

    let loaded = load_config(&path, &Overrides::default()).unwrap();
    assert_eq!(loaded.config.shared.service_name, "hexa-mixer");
    assert_eq!(loaded.config.transport.format, StreamFormat::Binary);
    assert_eq!(loaded.geometry.len(), 6);

    let (tx, source) = command_channel(loaded.config.transport.command_topic.clone());
    let (sink, results) = result_channel(loaded.config.transport.result_topic.clone());
    let mut node = MixerNode::new(loaded.engine(), source, sink);

    tx.send(ControlInputVector::new(0.3, -0.2, 0.1, 0.6)).unwrap();
    tx.send(ControlInputVector::new(0.0, 0.0, 0.0, 0.4)).unwrap();
    drop(tx);
    assert_eq!(node.spin().unwrap().mixed, 2);

    let outputs: Vec<_> = results.try_iter().collect();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|o| o.len() == 6 && o.in_range()));
    assert_eq!(outputs[1].as_slice(), &[0.4; 6]);
}

#[test]
fn cli_overrides_win_over_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("mixer.toml");
    std::fs::write(&path, HEXA_TOML).unwrap();

    let overrides = Overrides {
        frame: Some(FramePreset::QuadX),
        saturation: Some(SaturationMode::Compat),
        format: Some(StreamFormat::Json),
        ..Default::default()
    };
    let loaded = load_config(&path, &overrides).unwrap();
    assert_eq!(loaded.geometry, FramePreset::QuadX.table());
    assert_eq!(loaded.engine().options().saturation, SaturationMode::Compat);
    assert_eq!(loaded.config.transport.format, StreamFormat::Json);
}

#[test]
fn invalid_file_fails_startup() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("mixer.toml");
    std::fs::write(&path, "[mixer]\nrotors = []\n").unwrap();

    let err = load_or_default(&path, false, &Overrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn shipped_config_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/mixer.toml");
    let (loaded, source) = load_or_default(&path, true, &Overrides::default()).unwrap();
    assert_eq!(source, ConfigSource::File);
    assert_eq!(loaded.geometry, FramePreset::QuadPlus.table());
    assert_eq!(loaded.config.transport.format, StreamFormat::Json);
}

//! Property tests: output range, shape, determinism and saturation handling
//! over arbitrary commands and rotor tables.

use mc_common::consts::MAX_ROTORS;
use mc_common::mixer::config::{MixOptions, SaturationMode, YawLimitPolicy};
use mc_common::mixer::geometry::FramePreset;
use mc_common::mixer::types::{ControlInputVector, RotorSpec};
use mc_mixer::mix::{MixingEngine, mix};
use proptest::prelude::*;

/// Commands including out-of-range values, to exercise clamping.
fn command_strategy() -> impl Strategy<Value = ControlInputVector> {
    (-3.0f32..3.0, -3.0f32..3.0, -3.0f32..3.0, -1.0f32..2.0)
        .prop_map(|(r, p, y, t)| ControlInputVector::new(r, p, y, t))
}

fn rotor_strategy() -> impl Strategy<Value = RotorSpec> {
    (-2.0f32..2.0, -2.0f32..2.0, -1.0f32..1.0).prop_map(|(r, p, y)| RotorSpec::new(r, p, y))
}

fn table_strategy() -> impl Strategy<Value = Vec<RotorSpec>> {
    prop::collection::vec(rotor_strategy(), 1..=MAX_ROTORS)
}

fn options_strategy() -> impl Strategy<Value = MixOptions> {
    (any::<bool>(), any::<bool>()).prop_map(|(scale_out, restrictive)| MixOptions {
        saturation: if scale_out {
            SaturationMode::ScaleOut
        } else {
            SaturationMode::Compat
        },
        yaw_limit: if restrictive {
            YawLimitPolicy::MostRestrictive
        } else {
            YawLimitPolicy::TableOrder
        },
    })
}

fn preset_strategy() -> impl Strategy<Value = FramePreset> {
    prop_oneof![
        Just(FramePreset::QuadPlus),
        Just(FramePreset::QuadX),
        Just(FramePreset::Quadshot),
    ]
}

proptest! {
    /// Every output lies in [0, 1] and there is one per rotor.
    #[test]
    fn outputs_in_range_with_table_shape(
        rotors in table_strategy(),
        cmd in command_strategy(),
        options in options_strategy(),
    ) {
        let outcome = mix(&rotors, &cmd, options).unwrap();
        prop_assert_eq!(outcome.output.len(), rotors.len());
        for v in outcome.output.iter() {
            prop_assert!((0.0..=1.0).contains(&v), "output {} out of range", v);
        }
    }

    /// Same table, same command: bitwise identical outputs.
    #[test]
    fn mixing_is_deterministic(
        rotors in table_strategy(),
        cmd in command_strategy(),
        options in options_strategy(),
    ) {
        let engine = MixingEngine::from_rotors(&rotors, options).unwrap();
        let a = engine.mix(&cmd);
        let b = engine.mix(&cmd);
        let bits = |o: &mc_mixer::mix::MixOutcome| -> Vec<u32> {
            o.output.iter().map(f32::to_bits).collect()
        };
        prop_assert_eq!(bits(&a), bits(&b));
        prop_assert_eq!(a.faults, b.faults);
    }

    /// Zero attitude command: every rotor gets the (clamped) thrust.
    #[test]
    fn hover_is_uniform(
        rotors in table_strategy(),
        thrust in -1.0f32..2.0,
        options in options_strategy(),
    ) {
        let outcome = mix(&rotors, &ControlInputVector::new(0.0, 0.0, 0.0, thrust), options).unwrap();
        let expected = thrust.clamp(0.0, 1.0);
        for v in outcome.output.iter() {
            prop_assert_eq!(v, expected);
        }
    }

    /// Low-side resolution lifts the lowest rotor to exactly zero while
    /// thrust is non-zero, and always discards yaw.
    #[test]
    fn low_side_branch_floors_at_zero(
        preset in preset_strategy(),
        cmd in command_strategy(),
    ) {
        let engine = MixingEngine::new(preset.table(), MixOptions::default());
        let outcome = engine.mix(&cmd);
        if let Some(scale) = outcome.scale_in {
            prop_assert_eq!(outcome.effective_yaw, 0.0);
            prop_assert!((0.0..=1.0).contains(&scale));
            if cmd.clamped().thrust > 0.0 {
                let lowest = outcome.output.iter().fold(f32::INFINITY, f32::min);
                prop_assert!(lowest.abs() < 1e-5, "lowest output {}", lowest);
            }
        }
    }

    /// Both yaw policies settle on the same yaw authority.
    #[test]
    fn yaw_policies_agree(
        rotors in table_strategy(),
        cmd in command_strategy(),
    ) {
        let table_order = mix(&rotors, &cmd, MixOptions {
            yaw_limit: YawLimitPolicy::TableOrder,
            ..Default::default()
        }).unwrap();
        let restrictive = mix(&rotors, &cmd, MixOptions {
            yaw_limit: YawLimitPolicy::MostRestrictive,
            ..Default::default()
        }).unwrap();
        prop_assert_eq!(table_order.effective_yaw, restrictive.effective_yaw);
        prop_assert_eq!(table_order.output, restrictive.output);
    }

    /// Scale-out mode never produces a larger output than compat mode.
    #[test]
    fn scale_out_never_exceeds_compat(
        preset in preset_strategy(),
        cmd in command_strategy(),
    ) {
        let rotors = preset.rotors();
        let compat = mix(rotors, &cmd, MixOptions::default()).unwrap();
        let scaled = mix(rotors, &cmd, MixOptions {
            saturation: SaturationMode::ScaleOut,
            ..Default::default()
        }).unwrap();
        prop_assert_eq!(compat.scale_out, scaled.scale_out);
        for (c, s) in compat.output.iter().zip(scaled.output.iter()) {
            prop_assert!(s <= c + 1e-6, "scaled {} > compat {}", s, c);
        }
    }
}

//! Mixer value types.
//!
//! Defines `ControlInputVector`, `RotorSpec` and `ActuatorOutputVector`.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_ROTORS;

/// Normalized attitude/thrust command, one per received message.
///
/// Nominal ranges: roll, pitch, yaw in [-1, 1]; thrust in [0, 1].
/// Out-of-range values are accepted and clamped by [`clamped`](Self::clamped).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlInputVector {
    /// Roll command.
    pub roll: f32,
    /// Pitch command.
    pub pitch: f32,
    /// Yaw command.
    pub yaw: f32,
    /// Collective thrust.
    pub thrust: f32,
}

impl ControlInputVector {
    /// Create a command from its four axes.
    #[inline]
    pub const fn new(roll: f32, pitch: f32, yaw: f32, thrust: f32) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            thrust,
        }
    }

    /// Copy with every axis clamped to its nominal range.
    ///
    /// NaN is treated as a neutral (zero) command on that axis; infinities
    /// clamp to the nearest bound.
    #[inline]
    pub fn clamped(&self) -> Self {
        Self {
            roll: sanitize(self.roll).clamp(-1.0, 1.0),
            pitch: sanitize(self.pitch).clamp(-1.0, 1.0),
            yaw: sanitize(self.yaw).clamp(-1.0, 1.0),
            thrust: sanitize(self.thrust).clamp(0.0, 1.0),
        }
    }

    /// Returns true if all fields are finite (not NaN, not Inf).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.roll.is_finite()
            && self.pitch.is_finite()
            && self.yaw.is_finite()
            && self.thrust.is_finite()
    }
}

#[inline]
fn sanitize(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v }
}

/// Contribution coefficients of one rotor to the roll, pitch and yaw axes.
///
/// Derived from rotor position and spin direction on the airframe.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotorSpec {
    /// Roll contribution.
    pub roll_scale: f32,
    /// Pitch contribution.
    pub pitch_scale: f32,
    /// Yaw contribution (sign encodes spin direction).
    pub yaw_scale: f32,
}

impl RotorSpec {
    /// Create a rotor entry.
    #[inline]
    pub const fn new(roll_scale: f32, pitch_scale: f32, yaw_scale: f32) -> Self {
        Self {
            roll_scale,
            pitch_scale,
            yaw_scale,
        }
    }

    /// Returns true if all coefficients are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.roll_scale.is_finite() && self.pitch_scale.is_finite() && self.yaw_scale.is_finite()
    }

    /// Roll/pitch part of this rotor's demand, without thrust or yaw.
    #[inline]
    pub fn roll_pitch(&self, roll: f32, pitch: f32) -> f32 {
        roll * self.roll_scale + pitch * self.pitch_scale
    }
}

/// Per-rotor actuator commands, in geometry table order.
///
/// Fixed capacity of [`MAX_ROTORS`]; the mixer never allocates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorOutputVector {
    values: heapless::Vec<f32, MAX_ROTORS>,
}

impl ActuatorOutputVector {
    /// Empty output vector.
    #[inline]
    pub const fn new() -> Self {
        Self {
            values: heapless::Vec::new(),
        }
    }

    /// `count` zero outputs (count is capped at [`MAX_ROTORS`]).
    pub fn zeroed(count: usize) -> Self {
        let mut out = Self::new();
        for _ in 0..count.min(MAX_ROTORS) {
            // Cannot overflow: bounded by MAX_ROTORS above.
            let _ = out.values.push(0.0);
        }
        out
    }

    /// Build from a slice. Returns `None` if the slice exceeds [`MAX_ROTORS`].
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        if values.len() > MAX_ROTORS {
            return None;
        }
        let mut out = Self::new();
        for &v in values {
            out.values.push(v).ok()?;
        }
        Some(out)
    }

    /// Number of rotor outputs.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no outputs are present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Outputs as a slice, in table order.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        self.values.as_slice()
    }

    /// Output of rotor `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Iterate outputs in table order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    /// Mutable access for the mixing passes.
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f32] {
        self.values.as_mut_slice()
    }

    /// Returns true if all outputs are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Returns true if every output lies in [0, 1].
    #[inline]
    pub fn in_range(&self) -> bool {
        self.values.iter().all(|v| (0.0..=1.0).contains(v))
    }
}

//! Wire layouts for the command and result channels.
//!
//! Command: 4 × f32 (roll, pitch, yaw, thrust) = 16 bytes.
//! Result: N × f32 throttles in table order; the reference quad result is
//! `QuadMixerOutMsg` (throttle_0..throttle_3) = 16 bytes.
//!
//! Binary frames are little-endian. JSON results are keyed
//! `throttle_0`..`throttle_{N-1}` so any rotor count is representable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use static_assertions::const_assert_eq;
use thiserror::Error;

use super::types::{ActuatorOutputVector, ControlInputVector};
use crate::consts::{MAX_ROTORS, QUAD_ROTORS};

/// Size of one binary command frame.
pub const COMMAND_FRAME_LEN: usize = 16;

/// Largest binary result frame.
pub const RESULT_FRAME_MAX: usize = MAX_ROTORS * 4;

/// Wire encode/decode errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    /// Rotor count does not match the message layout.
    #[error("shape mismatch: expected {expected} throttles, got {actual}")]
    ShapeMismatch {
        /// Rotors the layout holds.
        expected: usize,
        /// Rotors supplied.
        actual: usize,
    },

    /// Binary frame has the wrong length.
    #[error("bad frame length: {actual} bytes (expected {expected})")]
    FrameLength {
        /// Valid length.
        expected: usize,
        /// Received length.
        actual: usize,
    },

    /// JSON value missing a key or holding a non-number.
    #[error("invalid field: {0}")]
    InvalidField(String),
}

// ─── Command Message ────────────────────────────────────────────────

/// Attitude controller actuator message: 4 × f32 = 16 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct AttitudeCommandMsg {
    /// Roll command.
    pub roll: f32,
    /// Pitch command.
    pub pitch: f32,
    /// Yaw command.
    pub yaw: f32,
    /// Collective thrust.
    pub thrust: f32,
}

const_assert_eq!(core::mem::size_of::<AttitudeCommandMsg>(), COMMAND_FRAME_LEN);

impl AttitudeCommandMsg {
    /// Decode a little-endian command frame.
    pub fn from_le_bytes(frame: &[u8; COMMAND_FRAME_LEN]) -> Self {
        let f = |i: usize| f32::from_le_bytes([frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]);
        Self {
            roll: f(0),
            pitch: f(4),
            yaw: f(8),
            thrust: f(12),
        }
    }

    /// Encode as a little-endian command frame.
    pub fn to_le_bytes(&self) -> [u8; COMMAND_FRAME_LEN] {
        let mut frame = [0u8; COMMAND_FRAME_LEN];
        for (i, v) in [self.roll, self.pitch, self.yaw, self.thrust].into_iter().enumerate() {
            frame[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
        }
        frame
    }
}

impl From<AttitudeCommandMsg> for ControlInputVector {
    fn from(msg: AttitudeCommandMsg) -> Self {
        ControlInputVector::new(msg.roll, msg.pitch, msg.yaw, msg.thrust)
    }
}

impl From<ControlInputVector> for AttitudeCommandMsg {
    fn from(cmd: ControlInputVector) -> Self {
        Self {
            roll: cmd.roll,
            pitch: cmd.pitch,
            yaw: cmd.yaw,
            thrust: cmd.thrust,
        }
    }
}

// ─── Result Messages ────────────────────────────────────────────────

/// Reference quad result message: 4 × f32 = 16 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct QuadMixerOutMsg {
    /// Rotor 0 throttle.
    pub throttle_0: f32,
    /// Rotor 1 throttle.
    pub throttle_1: f32,
    /// Rotor 2 throttle.
    pub throttle_2: f32,
    /// Rotor 3 throttle.
    pub throttle_3: f32,
}

const_assert_eq!(core::mem::size_of::<QuadMixerOutMsg>(), QUAD_ROTORS * 4);

impl TryFrom<&ActuatorOutputVector> for QuadMixerOutMsg {
    type Error = WireError;

    fn try_from(out: &ActuatorOutputVector) -> Result<Self, Self::Error> {
        match out.as_slice() {
            &[t0, t1, t2, t3] => Ok(Self {
                throttle_0: t0,
                throttle_1: t1,
                throttle_2: t2,
                throttle_3: t3,
            }),
            other => Err(WireError::ShapeMismatch {
                expected: QUAD_ROTORS,
                actual: other.len(),
            }),
        }
    }
}

impl QuadMixerOutMsg {
    /// Throttles in rotor order.
    pub fn throttles(&self) -> [f32; QUAD_ROTORS] {
        [self.throttle_0, self.throttle_1, self.throttle_2, self.throttle_3]
    }
}

/// Encode throttles as a little-endian frame of `4 * len` bytes.
pub fn encode_throttles(out: &ActuatorOutputVector) -> heapless::Vec<u8, RESULT_FRAME_MAX> {
    let mut frame = heapless::Vec::new();
    for v in out.iter() {
        for b in v.to_le_bytes() {
            // Bounded: out.len() <= MAX_ROTORS.
            let _ = frame.push(b);
        }
    }
    frame
}

/// Decode a little-endian throttle frame.
pub fn decode_throttles(frame: &[u8]) -> Result<ActuatorOutputVector, WireError> {
    if frame.len() % 4 != 0 || frame.len() > RESULT_FRAME_MAX {
        return Err(WireError::FrameLength {
            expected: (frame.len() / 4).min(MAX_ROTORS) * 4,
            actual: frame.len(),
        });
    }
    let mut values = [0f32; MAX_ROTORS];
    let count = frame.len() / 4;
    for (i, chunk) in frame.chunks_exact(4).enumerate() {
        values[i] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    ActuatorOutputVector::from_slice(&values[..count]).ok_or(WireError::ShapeMismatch {
        expected: MAX_ROTORS,
        actual: count,
    })
}

/// Result as a JSON object keyed `throttle_0`..`throttle_{N-1}`.
pub fn throttle_json(out: &ActuatorOutputVector) -> Map<String, Value> {
    let mut map = Map::with_capacity(out.len());
    for (i, v) in out.iter().enumerate() {
        map.insert(format!("throttle_{i}"), Value::from(v));
    }
    map
}

/// Parse a JSON result object with exactly `rotor_count` throttle keys.
pub fn parse_throttle_json(
    value: &Value,
    rotor_count: usize,
) -> Result<ActuatorOutputVector, WireError> {
    let map = value
        .as_object()
        .ok_or_else(|| WireError::InvalidField("result is not an object".to_string()))?;
    if map.len() != rotor_count || rotor_count > MAX_ROTORS {
        return Err(WireError::ShapeMismatch {
            expected: rotor_count,
            actual: map.len(),
        });
    }
    let mut values = [0f32; MAX_ROTORS];
    for (i, slot) in values.iter_mut().take(rotor_count).enumerate() {
        let key = format!("throttle_{i}");
        *slot = map
            .get(&key)
            .and_then(Value::as_f64)
            .ok_or_else(|| WireError::InvalidField(key))? as f32;
    }
    ActuatorOutputVector::from_slice(&values[..rotor_count]).ok_or(WireError::ShapeMismatch {
        expected: MAX_ROTORS,
        actual: rotor_count,
    })
}

//! Control allocation: attitude/thrust command → per-rotor throttles.
//!
//! Priority order when the actuators saturate: thrust first, roll/pitch
//! second, yaw last.
//!
//! Pipeline (one call, rotor-table order):
//! 1. Clamp roll/pitch/yaw to [-1, 1] and thrust to [0, 1]
//! 2. Naive roll/pitch/thrust allocation; yaw de-rated so it cannot push a
//!    rotor below zero; track `min_out` / `max_out` (seeded at 0)
//! 3. `min_out < 0`: rescale roll/pitch by `scale_in` holding thrust, drop yaw.
//!    Otherwise add yaw
//! 4. `scale_out = 1 / max_out` when `max_out > 1` (applied only in
//!    [`SaturationMode::ScaleOut`])
//! 5. Clamp every output to [0, 1]

use mc_common::mixer::config::{MixOptions, SaturationMode, YawLimitPolicy};
use mc_common::mixer::error::{MixError, MixFault};
use mc_common::mixer::geometry::RotorGeometryTable;
use mc_common::mixer::types::{ActuatorOutputVector, ControlInputVector, RotorSpec};

// ─── Mix Result ─────────────────────────────────────────────────────

/// Result of one allocation: the outputs plus how saturation was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MixOutcome {
    /// Per-rotor throttles in [0, 1], table order.
    pub output: ActuatorOutputVector,
    /// Fault and saturation flags raised by this call.
    pub faults: MixFault,
    /// Roll/pitch rescale factor, `Some` only when the low-side branch ran.
    pub scale_in: Option<f32>,
    /// Global high-side factor (1.0 when no rotor exceeded 1).
    pub scale_out: f32,
    /// Yaw actually mixed into the outputs (0 when discarded).
    pub effective_yaw: f32,
    /// Lowest naive output, seeded at 0.
    pub min_out: f32,
    /// Highest naive output, seeded at 0.
    pub max_out: f32,
}

impl MixOutcome {
    /// True if this command could not be met (`SATURATION_FAULT`).
    #[inline]
    pub fn has_fault(&self) -> bool {
        self.faults.has_fault()
    }
}

// ─── Allocation ─────────────────────────────────────────────────────

/// Mix one command against a rotor table.
///
/// Validates `rotors` exactly like [`RotorGeometryTable::new`], so a table
/// this accepts also builds a [`MixingEngine`].
///
/// # Errors
/// - `MixError::ConfigurationError` if `rotors` is empty
/// - `MixError::TooManyRotors` if `rotors` exceeds [`MAX_ROTORS`](mc_common::consts::MAX_ROTORS)
/// - `MixError::NonFiniteCoefficient` if any coefficient is NaN/Inf
pub fn mix(
    rotors: &[RotorSpec],
    input: &ControlInputVector,
    options: MixOptions,
) -> Result<MixOutcome, MixError> {
    let geometry = RotorGeometryTable::new(rotors)?;
    Ok(allocate(geometry.rotors(), input, options))
}

/// Yaw value that keeps `out + yaw * yaw_scale` at zero, if the current
/// yaw would drive a non-negative output below zero.
#[inline]
fn yaw_limit(out: f32, yaw: f32, yaw_scale: f32) -> Option<f32> {
    if out >= 0.0 && out < -yaw * yaw_scale {
        Some(-out / yaw_scale)
    } else {
        None
    }
}

/// Final output limiting. NaN (only reachable through overflowing
/// coefficients) maps to motor-off.
#[inline]
fn saturate(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn allocate(rotors: &[RotorSpec], input: &ControlInputVector, options: MixOptions) -> MixOutcome {
    let cmd = input.clamped();
    let (roll, pitch, thrust) = (cmd.roll, cmd.pitch, cmd.thrust);
    let mut yaw = cmd.yaw;
    let mut faults = MixFault::empty();
    let mut min_out = 0.0f32;
    let mut max_out = 0.0f32;

    let mut output = ActuatorOutputVector::zeroed(rotors.len());
    let out = output.values_mut();

    // ── 2. Naive roll/pitch/thrust pass, yaw de-rating ─────────
    for (slot, rotor) in out.iter_mut().zip(rotors) {
        let o = rotor.roll_pitch(roll, pitch) + thrust;

        match options.yaw_limit {
            YawLimitPolicy::TableOrder => {
                if let Some(limited) = yaw_limit(o, yaw, rotor.yaw_scale) {
                    yaw = limited;
                }
            }
            YawLimitPolicy::MostRestrictive => {
                if let Some(limited) = yaw_limit(o, cmd.yaw, rotor.yaw_scale) {
                    if limited.abs() < yaw.abs() {
                        yaw = limited;
                    }
                }
            }
        }

        if o < min_out {
            min_out = o;
        }
        if o > max_out {
            max_out = o;
        }
        *slot = o;
    }
    if yaw != cmd.yaw {
        faults |= MixFault::YAW_LIMITED;
    }

    // ── 3. Conflict resolution ──────────────────────────────────
    let (scale_in, effective_yaw) = if min_out < 0.0 {
        // Keep thrust, shrink roll/pitch until the lowest rotor sits at 0.
        faults |= MixFault::ROLL_PITCH_LIMITED;
        let denom = thrust - min_out;
        let scale = if denom > 0.0 && denom.is_finite() {
            thrust / denom
        } else {
            0.0
        };
        // denom > thrust here, so scale is in [0, 1); zero means no
        // roll/pitch authority survives.
        if scale <= 0.0 {
            faults |= MixFault::SATURATION_FAULT;
        }

        for (slot, rotor) in out.iter_mut().zip(rotors) {
            *slot = if scale > 0.0 {
                scale * rotor.roll_pitch(roll, pitch) + thrust
            } else {
                thrust
            };
        }
        (Some(scale), 0.0)
    } else {
        for (slot, rotor) in out.iter_mut().zip(rotors) {
            *slot += yaw * rotor.yaw_scale;
        }
        (None, yaw)
    };

    // ── 4. High-side accounting (pre-resolution max) ───────────
    let scale_out = if max_out > 1.0 {
        faults |= MixFault::THRUST_LIMITED;
        1.0 / max_out
    } else {
        1.0
    };
    if options.saturation == SaturationMode::ScaleOut && scale_out < 1.0 {
        for slot in out.iter_mut() {
            *slot *= scale_out;
        }
    }

    // ── 5. Final limiting ───────────────────────────────────────
    for slot in out.iter_mut() {
        *slot = saturate(*slot);
    }

    MixOutcome {
        output,
        faults,
        scale_in,
        scale_out,
        effective_yaw,
        min_out,
        max_out,
    }
}

// ─── Engine ─────────────────────────────────────────────────────────

/// Mixer bound to one airframe.
///
/// Holds only immutable data (geometry + options); `mix()` takes `&self`,
/// so one engine can be shared across threads without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct MixingEngine {
    geometry: RotorGeometryTable,
    options: MixOptions,
}

impl MixingEngine {
    /// Create an engine for a validated geometry table.
    pub fn new(geometry: RotorGeometryTable, options: MixOptions) -> Self {
        Self { geometry, options }
    }

    /// Create an engine from raw rotor specs.
    ///
    /// # Errors
    /// Any `RotorGeometryTable::new` error; `ConfigurationError` for an
    /// empty list.
    pub fn from_rotors(rotors: &[RotorSpec], options: MixOptions) -> Result<Self, MixError> {
        Ok(Self::new(RotorGeometryTable::new(rotors)?, options))
    }

    /// Mix one command. Never fails: the table was validated at construction.
    #[inline]
    pub fn mix(&self, input: &ControlInputVector) -> MixOutcome {
        allocate(self.geometry.rotors(), input, self.options)
    }

    /// Geometry table.
    pub fn geometry(&self) -> &RotorGeometryTable {
        &self.geometry
    }

    /// Mode switches.
    pub fn options(&self) -> MixOptions {
        self.options
    }

    /// Number of outputs every `mix()` produces.
    pub fn rotor_count(&self) -> usize {
        self.geometry.len()
    }
}

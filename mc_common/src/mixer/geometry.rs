//! Rotor geometry table and airframe presets.
//!
//! A `RotorGeometryTable` is validated once at construction and is
//! immutable afterwards, so it can be shared by any number of readers.

use serde::{Deserialize, Serialize};

use super::error::MixError;
use super::types::RotorSpec;
use crate::consts::MAX_ROTORS;

/// Ordered, validated, immutable rotor coefficient table.
///
/// Rotor `i` of every output vector corresponds to entry `i` of this table.
#[derive(Debug, Clone, PartialEq)]
pub struct RotorGeometryTable {
    rotors: heapless::Vec<RotorSpec, MAX_ROTORS>,
}

impl RotorGeometryTable {
    /// Build a table from rotor specs.
    ///
    /// # Errors
    /// - `MixError::ConfigurationError` if `rotors` is empty
    /// - `MixError::TooManyRotors` if more than [`MAX_ROTORS`] entries
    /// - `MixError::NonFiniteCoefficient` if any coefficient is NaN/Inf
    pub fn new(rotors: impl AsRef<[RotorSpec]>) -> Result<Self, MixError> {
        let rotors = rotors.as_ref();
        if rotors.is_empty() {
            return Err(MixError::ConfigurationError);
        }
        if rotors.len() > MAX_ROTORS {
            return Err(MixError::TooManyRotors {
                count: rotors.len(),
                max: MAX_ROTORS,
            });
        }

        let mut table = heapless::Vec::new();
        for (i, rotor) in rotors.iter().enumerate() {
            if !rotor.is_finite() {
                return Err(MixError::NonFiniteCoefficient { rotor: i });
            }
            table.push(*rotor).map_err(|_| MixError::TooManyRotors {
                count: rotors.len(),
                max: MAX_ROTORS,
            })?;
        }

        Ok(Self { rotors: table })
    }

    /// Number of rotors (always ≥ 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.rotors.len()
    }

    /// True when the table has no rotors (never, once constructed).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rotors.is_empty()
    }

    /// Rotor entries in table order.
    #[inline]
    pub fn rotors(&self) -> &[RotorSpec] {
        self.rotors.as_slice()
    }

    /// Rotor entry `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&RotorSpec> {
        self.rotors.get(index)
    }

    /// Iterate rotor entries in table order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, RotorSpec> {
        self.rotors.iter()
    }

    /// Σ roll_scale. Zero for a roll-balanced frame.
    pub fn roll_balance(&self) -> f32 {
        self.rotors.iter().map(|r| r.roll_scale).sum()
    }

    /// Σ pitch_scale. Zero for a pitch-balanced frame.
    pub fn pitch_balance(&self) -> f32 {
        self.rotors.iter().map(|r| r.pitch_scale).sum()
    }

    /// True if both roll and pitch sums are within `tol` of zero.
    pub fn is_balanced(&self, tol: f32) -> bool {
        self.roll_balance().abs() <= tol && self.pitch_balance().abs() <= tol
    }
}

impl<'a> IntoIterator for &'a RotorGeometryTable {
    type Item = &'a RotorSpec;
    type IntoIter = std::slice::Iter<'a, RotorSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ─── Frame Presets ──────────────────────────────────────────────────

/// "+" quad: rotors on the roll axis spin one way, pitch axis the other.
pub const QUAD_PLUS: [RotorSpec; 4] = [
    RotorSpec::new(-1.0, 0.0, 1.0),
    RotorSpec::new(1.0, 0.0, 1.0),
    RotorSpec::new(0.0, 1.0, -1.0),
    RotorSpec::new(0.0, -1.0, -1.0),
];

/// "X" quad: rotors on the diagonals.
pub const QUAD_X: [RotorSpec; 4] = [
    RotorSpec::new(-0.707107, 0.707107, 1.0),
    RotorSpec::new(0.707107, -0.707107, 1.0),
    RotorSpec::new(0.707107, 0.707107, -1.0),
    RotorSpec::new(-0.707107, -0.707107, -1.0),
];

/// Quadshot tail-sitter: asymmetric yaw authority between front and rear pairs.
pub const QUADSHOT: [RotorSpec; 4] = [
    RotorSpec::new(-0.3223, 0.9466, 0.4242),
    RotorSpec::new(0.3223, -0.9466, 1.0),
    RotorSpec::new(0.3223, 0.9466, -0.4242),
    RotorSpec::new(-0.3223, -0.9466, -1.0),
];

/// Built-in airframe geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePreset {
    /// "+" quad (reference configuration).
    #[default]
    QuadPlus,
    /// "X" quad.
    QuadX,
    /// Quadshot tail-sitter.
    Quadshot,
}

impl FramePreset {
    /// Rotor coefficients of this preset.
    pub const fn rotors(&self) -> &'static [RotorSpec] {
        match self {
            Self::QuadPlus => &QUAD_PLUS,
            Self::QuadX => &QUAD_X,
            Self::Quadshot => &QUADSHOT,
        }
    }

    /// Validated table for this preset.
    pub fn table(&self) -> RotorGeometryTable {
        let rotors = self.rotors();
        // Presets are non-empty, finite and within capacity.
        let mut table = heapless::Vec::new();
        for rotor in rotors {
            let _ = table.push(*rotor);
        }
        RotorGeometryTable { rotors: table }
    }

    /// Lowercase preset name as used in config files.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::QuadPlus => "quad_plus",
            Self::QuadX => "quad_x",
            Self::Quadshot => "quadshot",
        }
    }
}

impl std::fmt::Display for FramePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

//! Mixer error and fault types.
//!
//! `MixError` is fatal: mixing cannot run at all. `MixFault` is reported
//! alongside a best-effort output and never aborts the allocation loop.

use bitflags::bitflags;
use thiserror::Error;

/// Fatal geometry / configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MixError {
    /// Geometry table has zero rotors.
    #[error("configuration error: rotor geometry table is empty")]
    ConfigurationError,

    /// Geometry table exceeds the fixed output capacity.
    #[error("configuration error: {count} rotors exceeds the maximum of {max}")]
    TooManyRotors {
        /// Rotors supplied.
        count: usize,
        /// Capacity limit.
        max: usize,
    },

    /// A rotor coefficient is NaN or infinite.
    #[error("configuration error: rotor {rotor} has a non-finite coefficient")]
    NonFiniteCoefficient {
        /// Table index of the offending rotor.
        rotor: usize,
    },
}

bitflags! {
    /// Per-command fault and saturation flags.
    ///
    /// Only `SATURATION_FAULT` is a fault; the other flags describe which
    /// saturation handling ran and are informational.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MixFault: u8 {
        /// Roll/pitch rescale factor was undefined or collapsed to zero.
        const SATURATION_FAULT   = 0x01;
        /// Low-side saturation: roll/pitch scaled down, yaw discarded.
        const ROLL_PITCH_LIMITED = 0x02;
        /// Yaw authority de-rated in the first allocation pass.
        const YAW_LIMITED        = 0x04;
        /// High-side saturation: naive allocation exceeded 1.0.
        const THRUST_LIMITED     = 0x08;
    }
}

impl MixFault {
    /// Mask of flags that indicate an unreachable command.
    pub const FAULT_MASK: Self = Self::SATURATION_FAULT;

    /// Returns true if any fault (not merely informational) flag is set.
    #[inline]
    pub const fn has_fault(&self) -> bool {
        self.intersects(Self::FAULT_MASK)
    }
}

impl Default for MixFault {
    fn default() -> Self {
        Self::empty()
    }
}

//! Mixer shared types.
//!
//! Everything exchanged between the mixing engine and its collaborators:
//! command / output value types, the rotor geometry table and frame presets,
//! error and fault types, configuration structures, and wire layouts.

pub mod config;
pub mod error;
pub mod geometry;
pub mod types;
pub mod wire;

//! MC Common Library
//!
//! This crate provides the shared value types, rotor geometry tables and
//! configuration loading utilities for all mixer workspace crates.
//!
//! # Module Structure
//!
//! - [`mixer`] - Control input / actuator output types, geometry, faults, wire layouts
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide constants
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use mc_common::prelude::*;
//!
//! let table = FramePreset::QuadPlus.table();
//! assert_eq!(table.len(), 4);
//! ```

pub mod config;
pub mod consts;
pub mod mixer;
pub mod prelude;

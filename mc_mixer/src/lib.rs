//! # MC Mixer Library
//!
//! Control allocation for multirotor airframes. Converts one normalized
//! roll/pitch/yaw/thrust command into per-rotor throttles in [0, 1],
//! resolving actuator saturation with a fixed priority: thrust, then
//! roll/pitch, then yaw.
//!
//! ## Layers
//!
//! 1. **mix** - Pure allocation function and the immutable `MixingEngine`
//! 2. **config** - TOML loading, CLI overrides, geometry table construction
//! 3. **transport** - `CommandSource` / `ResultSink` seam with channel and
//!    byte-stream implementations
//! 4. **node** - Receive → mix → publish loop with counters and the latest
//!    input/output snapshot
//!
//! ## Zero-Allocation Mixing
//!
//! Geometry and outputs live in fixed-capacity `heapless` vectors. `mix()`
//! performs no heap allocation and never fails once the table is validated.

pub mod config;
pub mod mix;
pub mod node;
pub mod transport;

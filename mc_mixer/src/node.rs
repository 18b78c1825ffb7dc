//! Mixer node: receive → mix → publish loop.
//!
//! `MixerNode` owns one engine and one transport pair. Each received command
//! is mixed exactly once and produces exactly one published result. Decode
//! errors skip the message; any other transport error stops the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use mc_common::mixer::error::MixFault;
use mc_common::mixer::types::ControlInputVector;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::mix::{MixOutcome, MixingEngine};
use crate::transport::{CommandSource, ResultSink, TransportError};

/// Only the first few faults are logged individually; after that, one in this many.
const FAULT_LOG_EVERY: u64 = 1000;

/// Node loop errors.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Receiving a command failed unrecoverably.
    #[error("receive on '{topic}' failed: {source}")]
    Receive {
        /// Command topic.
        topic: String,
        /// Transport error.
        source: TransportError,
    },

    /// Publishing a result failed.
    #[error("publish on '{topic}' failed: {source}")]
    Publish {
        /// Result topic.
        topic: String,
        /// Transport error.
        source: TransportError,
    },
}

/// Latest input/output pair, kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct MixSnapshot {
    /// Command as received (before clamping).
    pub input: ControlInputVector,
    /// Mix result published for it.
    pub outcome: MixOutcome,
}

/// What one `step()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// A command was mixed and its result published.
    Mixed,
    /// An undecodable message was dropped.
    Skipped,
    /// The command stream has ended.
    EndOfStream,
}

// ─── Statistics ─────────────────────────────────────────────────────

/// Counters for the node loop. O(1) update, no allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Commands mixed and published.
    pub mixed: u64,
    /// Messages dropped for failing to decode.
    pub decode_errors: u64,
    /// Commands that raised `SATURATION_FAULT`.
    pub saturation_faults: u64,
    /// Commands whose roll/pitch were scaled for low-side saturation.
    pub roll_pitch_limited: u64,
    /// Commands whose yaw was de-rated.
    pub yaw_limited: u64,
    /// Commands that exceeded the upper actuator bound.
    pub thrust_limited: u64,
    /// Longest single `mix()` call [ns].
    pub max_mix_ns: u64,
    /// Sum of `mix()` durations [ns].
    pub total_mix_ns: u64,
}

impl NodeStats {
    /// Record one mixed command.
    #[inline]
    pub fn record(&mut self, faults: MixFault, mix_ns: u64) {
        self.mixed += 1;
        self.saturation_faults += u64::from(faults.contains(MixFault::SATURATION_FAULT));
        self.roll_pitch_limited += u64::from(faults.contains(MixFault::ROLL_PITCH_LIMITED));
        self.yaw_limited += u64::from(faults.contains(MixFault::YAW_LIMITED));
        self.thrust_limited += u64::from(faults.contains(MixFault::THRUST_LIMITED));
        self.max_mix_ns = self.max_mix_ns.max(mix_ns);
        self.total_mix_ns = self.total_mix_ns.saturating_add(mix_ns);
    }

    /// Mean `mix()` duration [ns], 0 before the first command.
    pub fn avg_mix_ns(&self) -> u64 {
        if self.mixed == 0 {
            0
        } else {
            self.total_mix_ns / self.mixed
        }
    }
}

// ─── Node ───────────────────────────────────────────────────────────

/// Mixer node bound to one command source and one result sink.
pub struct MixerNode<S: CommandSource, K: ResultSink> {
    engine: MixingEngine,
    source: S,
    sink: K,
    stats: NodeStats,
    last: Option<MixSnapshot>,
    running: Arc<AtomicBool>,
}

impl<S: CommandSource, K: ResultSink> MixerNode<S, K> {
    /// Create a node. The running flag starts set; clearing it stops `spin()`.
    pub fn new(engine: MixingEngine, source: S, sink: K) -> Self {
        info!(
            "MixerNode: {} rotors, '{}' -> '{}'",
            engine.rotor_count(),
            source.topic(),
            sink.topic()
        );
        Self {
            engine,
            source,
            sink,
            stats: NodeStats::default(),
            last: None,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Use an externally owned running flag (e.g. one shared with a
    /// transport or a signal handler).
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Ask `spin()` to return after the current message.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Receive, mix and publish at most one command.
    pub fn step(&mut self) -> Result<StepResult, NodeError> {
        let input = match self.source.recv() {
            Ok(Some(input)) => input,
            Ok(None) => return Ok(StepResult::EndOfStream),
            Err(e) if e.is_recoverable() => {
                self.stats.decode_errors += 1;
                warn!("Dropping message on '{}': {}", self.source.topic(), e);
                return Ok(StepResult::Skipped);
            }
            Err(source) => {
                return Err(NodeError::Receive {
                    topic: self.source.topic().to_string(),
                    source,
                });
            }
        };

        let start = Instant::now();
        let outcome = self.engine.mix(&input);
        let mix_ns = start.elapsed().as_nanos() as u64;
        self.stats.record(outcome.faults, mix_ns);

        if outcome.has_fault() {
            let n = self.stats.saturation_faults;
            if n <= 10 || n % FAULT_LOG_EVERY == 0 {
                warn!(
                    "Saturation fault #{}: input={:?} min_out={} scale_in={:?}",
                    n, input, outcome.min_out, outcome.scale_in
                );
            }
        } else {
            trace!(
                "mixed {:?} -> {:?} ({:?})",
                input,
                outcome.output.as_slice(),
                outcome.faults
            );
        }

        let published = self.sink.send(&outcome.output);
        self.last = Some(MixSnapshot { input, outcome });
        published.map_err(|source| NodeError::Publish {
            topic: self.sink.topic().to_string(),
            source,
        })?;
        Ok(StepResult::Mixed)
    }

    /// Run until the stream ends or the running flag is cleared.
    pub fn spin(&mut self) -> Result<&NodeStats, NodeError> {
        info!("MixerNode spinning on '{}'", self.source.topic());
        while self.running.load(Ordering::SeqCst) {
            match self.step()? {
                StepResult::EndOfStream => {
                    debug!("Command stream '{}' ended", self.source.topic());
                    break;
                }
                StepResult::Mixed | StepResult::Skipped => {}
            }
        }
        self.running.store(false, Ordering::SeqCst);
        info!(
            "MixerNode stopped after {} commands (faults: {}, dropped: {}, avg mix {}ns, max {}ns)",
            self.stats.mixed,
            self.stats.saturation_faults,
            self.stats.decode_errors,
            self.stats.avg_mix_ns(),
            self.stats.max_mix_ns
        );
        Ok(&self.stats)
    }

    /// Most recent command and its result.
    pub fn last_snapshot(&self) -> Option<&MixSnapshot> {
        self.last.as_ref()
    }

    /// Loop counters.
    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    /// Engine this node mixes with.
    pub fn engine(&self) -> &MixingEngine {
        &self.engine
    }

    /// Tear down, returning the transports.
    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }
}

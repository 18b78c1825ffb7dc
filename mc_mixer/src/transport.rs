//! Command / result transport seam.
//!
//! The mixer core never touches a message bus. The node drives any pair of
//! [`CommandSource`] + [`ResultSink`] implementations:
//!
//! - [`channel`] - in-process `std::sync::mpsc` transport and the reader
//!   thread bridge used for blocking sources
//! - [`stream`] - JSON-lines and fixed-size binary frames over `Read`/`Write`

pub mod channel;
pub mod stream;

use mc_common::mixer::types::{ActuatorOutputVector, ControlInputVector};
use mc_common::mixer::wire::WireError;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Underlying stream failed.
    #[error("I/O error: {source}")]
    Io {
        /// Source I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A single message could not be decoded; the stream itself is intact.
    #[error("decode error: {0}")]
    Decode(String),

    /// A result could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Peer end of an in-process channel was dropped.
    #[error("channel disconnected")]
    Disconnected,
}

impl TransportError {
    /// True if the receive loop may skip the message and continue.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

impl From<WireError> for TransportError {
    fn from(e: WireError) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Delivers attitude commands, one at a time.
pub trait CommandSource {
    /// Channel name, for logs.
    fn topic(&self) -> &str;

    /// Next command. `Ok(None)` means the stream has ended.
    ///
    /// May block until a command is available.
    fn recv(&mut self) -> Result<Option<ControlInputVector>, TransportError>;
}

/// Publishes per-rotor results.
pub trait ResultSink {
    /// Channel name, for logs.
    fn topic(&self) -> &str;

    /// Publish one output vector.
    fn send(&mut self, output: &ActuatorOutputVector) -> Result<(), TransportError>;
}

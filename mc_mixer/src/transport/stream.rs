//! Byte-stream transports over any `Read`/`Write`.
//!
//! Two formats:
//! - JSON lines: one `{"roll":..,"pitch":..,"yaw":..,"thrust":..}` object per
//!   line in, one `{"throttle_0":..,..}` object per line out
//! - Binary: 16-byte little-endian command frames in, `4 * N` byte
//!   little-endian throttle frames out

use std::io::{BufRead, ErrorKind, Read, Write};

use mc_common::mixer::types::{ActuatorOutputVector, ControlInputVector};
use mc_common::mixer::wire::{
    AttitudeCommandMsg, COMMAND_FRAME_LEN, encode_throttles, throttle_json,
};

use super::{CommandSource, ResultSink, TransportError};

// ─── JSON Lines ─────────────────────────────────────────────────────

/// Reads one JSON command per line. Blank lines are ignored.
///
/// A line that is not valid UTF-8 or not a command object is a `Decode`
/// error; the line is consumed, so the next `recv` continues after it.
pub struct JsonLinesSource<R: BufRead> {
    topic: String,
    reader: R,
    line: Vec<u8>,
    line_no: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    /// Wrap a buffered reader.
    pub fn new(topic: impl Into<String>, reader: R) -> Self {
        Self {
            topic: topic.into(),
            reader,
            line: Vec::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> CommandSource for JsonLinesSource<R> {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn recv(&mut self) -> Result<Option<ControlInputVector>, TransportError> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let text = std::str::from_utf8(&self.line)
                .map_err(|_| TransportError::Decode(format!("line {}: invalid UTF-8", self.line_no)))?
                .trim();
            if text.is_empty() {
                continue;
            }
            let msg: AttitudeCommandMsg = serde_json::from_str(text)
                .map_err(|e| TransportError::Decode(format!("line {}: {e}", self.line_no)))?;
            return Ok(Some(msg.into()));
        }
    }
}

/// Writes one JSON result object per line, flushing after each.
pub struct JsonLinesSink<W: Write> {
    topic: String,
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(topic: impl Into<String>, writer: W) -> Self {
        Self {
            topic: topic.into(),
            writer,
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&mut self, output: &ActuatorOutputVector) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.writer, &throttle_json(output))
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

// ─── Binary Frames ──────────────────────────────────────────────────

/// Reads fixed 16-byte command frames.
///
/// A clean end of input between frames ends the stream. Input ending in
/// the middle of a frame yields one `Decode` error, then end of stream.
pub struct BinaryFrameSource<R: Read> {
    topic: String,
    reader: R,
}

impl<R: Read> BinaryFrameSource<R> {
    /// Wrap a reader.
    pub fn new(topic: impl Into<String>, reader: R) -> Self {
        Self {
            topic: topic.into(),
            reader,
        }
    }
}

impl<R: Read> CommandSource for BinaryFrameSource<R> {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn recv(&mut self) -> Result<Option<ControlInputVector>, TransportError> {
        let mut frame = [0u8; COMMAND_FRAME_LEN];
        let mut filled = 0;
        while filled < COMMAND_FRAME_LEN {
            match self.reader.read(&mut frame[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(TransportError::Decode(format!(
                        "truncated command frame: {filled} of {COMMAND_FRAME_LEN} bytes"
                    )));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(AttitudeCommandMsg::from_le_bytes(&frame).into()))
    }
}

/// Writes one `4 * N` byte throttle frame per result.
pub struct BinaryFrameSink<W: Write> {
    topic: String,
    writer: W,
}

impl<W: Write> BinaryFrameSink<W> {
    /// Wrap a writer.
    pub fn new(topic: impl Into<String>, writer: W) -> Self {
        Self {
            topic: topic.into(),
            writer,
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for BinaryFrameSink<W> {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&mut self, output: &ActuatorOutputVector) -> Result<(), TransportError> {
        self.writer.write_all(&encode_throttles(output))?;
        self.writer.flush()?;
        Ok(())
    }
}

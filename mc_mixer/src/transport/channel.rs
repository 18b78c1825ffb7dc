//! In-process channel transport.
//!
//! Commands travel as `Result<ControlInputVector, TransportError>` so a
//! reader thread can forward decode errors to the node unchanged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mc_common::mixer::types::{ActuatorOutputVector, ControlInputVector};
use tracing::debug;

use super::{CommandSource, ResultSink, TransportError};

/// How often a blocked [`ChannelSource`] re-checks its shutdown flag.
pub const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

type CommandMsg = Result<ControlInputVector, TransportError>;

// ─── Command Side ───────────────────────────────────────────────────

/// Producer half of a command channel.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<CommandMsg>,
}

impl CommandSender {
    /// Queue a command.
    pub fn send(&self, cmd: ControlInputVector) -> Result<(), TransportError> {
        self.tx.send(Ok(cmd)).map_err(|_| TransportError::Disconnected)
    }

    /// Queue a transport error for the consumer to observe.
    pub fn send_error(&self, err: TransportError) -> Result<(), TransportError> {
        self.tx.send(Err(err)).map_err(|_| TransportError::Disconnected)
    }
}

/// Consumer half of a command channel.
///
/// The stream ends when every [`CommandSender`] is dropped, or when the
/// attached shutdown flag is cleared.
#[derive(Debug)]
pub struct ChannelSource {
    topic: String,
    rx: Receiver<CommandMsg>,
    running: Option<Arc<AtomicBool>>,
}

impl ChannelSource {
    /// End the stream once `running` goes false, even with senders alive.
    pub fn with_shutdown(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }
}

impl CommandSource for ChannelSource {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn recv(&mut self) -> Result<Option<ControlInputVector>, TransportError> {
        let Some(running) = &self.running else {
            return match self.rx.recv() {
                Ok(msg) => msg.map(Some),
                Err(_) => Ok(None),
            };
        };
        loop {
            if !running.load(Ordering::SeqCst) {
                return Ok(None);
            }
            match self.rx.recv_timeout(SHUTDOWN_POLL) {
                Ok(msg) => return msg.map(Some),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }
}

/// Create a command channel on `topic`.
pub fn command_channel(topic: impl Into<String>) -> (CommandSender, ChannelSource) {
    let (tx, rx) = mpsc::channel();
    (
        CommandSender { tx },
        ChannelSource {
            topic: topic.into(),
            rx,
            running: None,
        },
    )
}

// ─── Result Side ────────────────────────────────────────────────────

/// Result publisher backed by an mpsc sender.
#[derive(Debug)]
pub struct ChannelSink {
    topic: String,
    tx: Sender<ActuatorOutputVector>,
}

impl ResultSink for ChannelSink {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&mut self, output: &ActuatorOutputVector) -> Result<(), TransportError> {
        self.tx
            .send(output.clone())
            .map_err(|_| TransportError::Disconnected)
    }
}

/// Create a result channel on `topic`.
pub fn result_channel(topic: impl Into<String>) -> (ChannelSink, Receiver<ActuatorOutputVector>) {
    let (tx, rx) = mpsc::channel();
    (
        ChannelSink {
            topic: topic.into(),
            tx,
        },
        rx,
    )
}

// ─── Reader Bridge ──────────────────────────────────────────────────

/// Drive a blocking source on its own thread and expose it as a channel.
///
/// Decode errors are forwarded and reading continues; any other error is
/// forwarded and ends the thread. The returned source ends when the reader
/// does.
pub fn spawn_reader<S>(mut source: S) -> std::io::Result<(ChannelSource, JoinHandle<()>)>
where
    S: CommandSource + Send + 'static,
{
    let (sender, channel) = command_channel(source.topic().to_string());
    let handle = thread::Builder::new()
        .name("mixer-reader".into())
        .spawn(move || {
            loop {
                let delivered = match source.recv() {
                    Ok(Some(cmd)) => sender.send(cmd).is_ok(),
                    Ok(None) => break,
                    Err(e) => {
                        let fatal = !e.is_recoverable();
                        sender.send_error(e).is_ok() && !fatal
                    }
                };
                if !delivered {
                    break;
                }
            }
            debug!("Reader for '{}' finished", source.topic());
        })?;
    Ok((channel, handle))
}

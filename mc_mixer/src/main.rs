//! # MC Mixer Binary
//!
//! Reads attitude/thrust commands from stdin, mixes each one into per-rotor
//! throttles and writes one result per command to stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Quad "+" defaults, JSON lines in and out
//! echo '{"roll":0.2,"pitch":0,"yaw":0.1,"thrust":0.5}' | mc_mixer
//!
//! # Explicit config, X frame, binary frames
//! mc_mixer --config config/mixer.toml --frame quad-x --format binary
//!
//! # Show the effective configuration and exit
//! mc_mixer --print-config
//! ```

use clap::{Parser, ValueEnum};
use mc_common::consts::DEFAULT_CONFIG_PATH;
use mc_common::mixer::config::{SaturationMode, StreamFormat, YawLimitPolicy};
use mc_common::mixer::geometry::FramePreset;
use mc_mixer::config::{ConfigSource, Overrides, load_or_default};
use mc_mixer::mix::MixingEngine;
use mc_mixer::node::{MixerNode, NodeStats};
use mc_mixer::transport::channel::spawn_reader;
use mc_mixer::transport::stream::{
    BinaryFrameSink, BinaryFrameSource, JsonLinesSink, JsonLinesSource,
};
use mc_mixer::transport::{CommandSource, ResultSink};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{Level, error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// MC Mixer - multirotor control allocation node
#[derive(Parser, Debug)]
#[command(name = "mc_mixer")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Mixes attitude/thrust commands into per-rotor throttles")]
struct Args {
    /// Mixer configuration TOML. Without this flag a missing
    /// config/mixer.toml falls back to built-in defaults.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the frame preset (drops any custom rotor table).
    #[arg(long, value_enum)]
    frame: Option<FrameArg>,

    /// Override high-side saturation handling.
    #[arg(long, value_enum)]
    saturation: Option<SaturationArg>,

    /// Override the yaw de-rating policy.
    #[arg(long, value_enum)]
    yaw_limit: Option<YawLimitArg>,

    /// Override the stdin/stdout stream format.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging (DEBUG level, overrides the config file).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FrameArg {
    QuadPlus,
    QuadX,
    Quadshot,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SaturationArg {
    Compat,
    ScaleOut,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum YawLimitArg {
    TableOrder,
    MostRestrictive,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Binary,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            frame: self.frame.map(|f| match f {
                FrameArg::QuadPlus => FramePreset::QuadPlus,
                FrameArg::QuadX => FramePreset::QuadX,
                FrameArg::Quadshot => FramePreset::Quadshot,
            }),
            saturation: self.saturation.map(|s| match s {
                SaturationArg::Compat => SaturationMode::Compat,
                SaturationArg::ScaleOut => SaturationMode::ScaleOut,
            }),
            yaw_limit: self.yaw_limit.map(|y| match y {
                YawLimitArg::TableOrder => YawLimitPolicy::TableOrder,
                YawLimitArg::MostRestrictive => YawLimitPolicy::MostRestrictive,
            }),
            format: self.format.map(|f| match f {
                FormatArg::Json => StreamFormat::Json,
                FormatArg::Binary => StreamFormat::Binary,
            }),
        }
    }
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

fn main() {
    let args = Args::parse();
    let filter = setup_tracing(&args);

    info!("MC Mixer v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, &filter) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("MC Mixer shutdown complete");
}

fn run(args: &Args, filter: &FilterHandle) -> Result<(), Box<dyn std::error::Error>> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let (loaded, source) = load_or_default(&path, args.config.is_some(), &args.overrides())?;

    if args.print_config {
        print!("{}", toml::to_string_pretty(&loaded.config)?);
        return Ok(());
    }

    // CLI and RUST_LOG win over the file's log level.
    if !args.verbose && std::env::var_os("RUST_LOG").is_none() {
        let level = loaded.config.shared.log_level;
        filter.modify(|f| *f = EnvFilter::new(level.as_directive()))?;
    }

    let cfg = &loaded.config;
    info!(
        "Config OK ({}): service={}, geometry={}, rotors={}, saturation={:?}, yaw_limit={:?}",
        match source {
            ConfigSource::File => "file",
            ConfigSource::Defaults => "defaults",
        },
        cfg.shared.service_name,
        cfg.mixer.geometry_label(),
        loaded.geometry.len(),
        cfg.mixer.saturation,
        cfg.mixer.yaw_limit,
    );
    info!(
        "Transport: '{}' -> '{}' ({:?} over stdio)",
        cfg.transport.command_topic, cfg.transport.result_topic, cfg.transport.format
    );

    let engine = loaded.engine();
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let command_topic = cfg.transport.command_topic.clone();
    let result_topic = cfg.transport.result_topic.clone();
    let stats = match cfg.transport.format {
        StreamFormat::Json => serve(
            engine,
            JsonLinesSource::new(command_topic, BufReader::new(io::stdin())),
            JsonLinesSink::new(result_topic, io::stdout().lock()),
            running,
        )?,
        StreamFormat::Binary => serve(
            engine,
            BinaryFrameSource::new(command_topic, io::stdin()),
            BinaryFrameSink::new(result_topic, io::stdout().lock()),
            running,
        )?,
    };

    info!(
        "Processed {} commands ({} saturation faults, {} dropped)",
        stats.mixed, stats.saturation_faults, stats.decode_errors
    );
    Ok(())
}

/// Run the node with `source` read on a separate thread, so a shutdown
/// signal is seen even while stdin blocks.
fn serve<S, K>(
    engine: MixingEngine,
    source: S,
    sink: K,
    running: Arc<AtomicBool>,
) -> Result<NodeStats, Box<dyn std::error::Error>>
where
    S: CommandSource + Send + 'static,
    K: ResultSink,
{
    // The reader thread is left detached: it may be parked in a blocking read.
    let (commands, _reader) = spawn_reader(source)?;
    let mut node = MixerNode::new(engine, commands.with_shutdown(running.clone()), sink)
        .with_running_flag(running);
    let stats = node.spin()?;
    Ok(stats.clone())
}

/// Setup tracing subscriber based on CLI arguments. Logs always go to
/// stderr; stdout carries results.
fn setup_tracing(args: &Args) -> FilterHandle {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let (filter, handle) =
        reload::Layer::new(EnvFilter::from_default_env().add_directive(level.into()));

    let registry = tracing_subscriber::registry().with(filter);
    if args.json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
    handle
}

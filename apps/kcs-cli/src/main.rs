//! kcs-cli - command-line tool for encoding/decoding Kansas City Standard
//! (KCS) audio.
//!
//! Wires `kcs_core`'s protocol engine to concrete I/O: a WAV file (via
//! `hound`) or the live audio device (via the `sox` family's `rec`/`play`),
//! plus a CASIO FX-502P text/binary translation layer. Mirrors
//! `KCSCmdline.py`'s three entry points as subcommands.

mod config;
mod device;
mod fx502p;
mod wav;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kcs_core::{DecoderSession, EncoderSession, KcsConfig, Parity, SampleSink, SampleSource};

use crate::config::CliConfig;
use crate::device::{DeviceSink, DeviceSource};
use crate::wav::{WavFileSink, WavFileSource};

/// Encode/decode Kansas City Standard (KCS) audio.
#[derive(Parser, Debug)]
#[command(name = "kcs-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "KCS_LOG_LEVEL")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load program(s) from text or binary data onto tape/audio.
    Fx502pLoad {
        /// Program data (text or binary).
        input: PathBuf,

        /// Input data is binary (FX-502P program bytes) rather than text.
        #[arg(short, long)]
        binary: bool,

        /// Write WAV data to file instead of the sound card.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Volume to apply when writing to the sound card.
        #[arg(short, long)]
        volume: Option<f64>,
    },

    /// Save program(s) from tape/audio to a text or binary file.
    Fx502pSave {
        /// Write to file instead of stdout.
        output: Option<PathBuf>,

        /// Output will be binary (FX-502P program bytes) rather than text.
        #[arg(short, long)]
        binary: bool,

        /// Use a WAV file instead of the sound card.
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Gain to apply when reading from the sound card.
        #[arg(short, long)]
        gain: Option<f64>,
    },

    /// Decode raw bytes from tape/audio and print them as hex.
    KcsAnalyze {
        /// Use a WAV file instead of the sound card.
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Gain to apply when reading from the sound card.
        #[arg(short, long)]
        gain: Option<f64>,

        /// Parity mode: "even" or "odd". Omit for no parity.
        #[arg(short, long)]
        parity: Option<String>,

        /// Sampling rate (default 48000 Hz).
        #[arg(short = 'r', long)]
        framerate: Option<u32>,

        /// Base frequency (default 2400 Hz).
        #[arg(short = 'f', long)]
        basefreq: Option<u32>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    let cli_config =
        CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Fx502pLoad {
            input,
            binary,
            output,
            volume,
        } => fx502p_load(&cli_config, &input, binary, output.as_deref(), volume),
        Command::Fx502pSave {
            output,
            binary,
            input,
            gain,
        } => fx502p_save(&cli_config, output.as_deref(), binary, input.as_deref(), gain),
        Command::KcsAnalyze {
            input,
            gain,
            parity,
            framerate,
            basefreq,
        } => kcs_analyze(
            &cli_config,
            input.as_deref(),
            gain,
            parity.as_deref(),
            framerate,
            basefreq,
        ),
    }
}

fn fx502p_load(
    cli: &CliConfig,
    input: &Path,
    binary: bool,
    output: Option<&Path>,
    volume: Option<f64>,
) -> Result<()> {
    let progbin = if binary {
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?
    } else {
        let text = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        fx502p::text_to_bytes(&text)
    };

    let config = KcsConfig::new(cli.frame_rate, cli.base_freq, Parity::None)
        .context("invalid KCS configuration")?;

    match output {
        Some(path) => {
            let sink =
                WavFileSink::create(path, &config).context("Failed to open output WAV file")?;
            write_program(sink, config, &progbin, cli.lead_in_secs)
        }
        None => {
            let volume = volume.unwrap_or(cli.volume);
            let sink = DeviceSink::spawn(&config, volume)
                .context("Failed to start audio playback device")?;
            write_program(sink, config, &progbin, cli.lead_in_secs)
        }
    }
}

fn fx502p_save(
    cli: &CliConfig,
    output: Option<&Path>,
    binary: bool,
    input: Option<&Path>,
    gain: Option<f64>,
) -> Result<()> {
    let base_config = KcsConfig::new(cli.frame_rate, cli.base_freq, Parity::None)
        .context("invalid KCS configuration")?;

    let data = match input {
        Some(path) => {
            let (source, info) =
                WavFileSource::open(path).context("Failed to open input WAV file")?;
            let config = KcsConfig::new(info.frame_rate, cli.base_freq, Parity::None)
                .context("invalid KCS configuration")?
                .with_channels(info.channels)
                .with_sample_width_bits(16);
            read_program(source, config)?
        }
        None => {
            let gain = gain.unwrap_or(cli.gain);
            let source = DeviceSource::spawn(&base_config, gain)
                .context("Failed to start audio capture device")?;
            read_program(source, base_config)?
        }
    };

    if binary {
        write_output_bytes(output, &data)
    } else {
        let text = fx502p::bytes_to_text(&data);
        write_output_text(output, &text)
    }
}

fn kcs_analyze(
    cli: &CliConfig,
    input: Option<&Path>,
    gain: Option<f64>,
    parity: Option<&str>,
    framerate: Option<u32>,
    basefreq: Option<u32>,
) -> Result<()> {
    let parity = match parity {
        None => Parity::None,
        Some("even") => Parity::Even,
        Some("odd") => Parity::Odd,
        Some(other) => bail!("unknown parity '{other}'"),
    };
    let base_freq = basefreq.unwrap_or(cli.base_freq);

    let data = match input {
        Some(path) => {
            let (source, info) =
                WavFileSource::open(path).context("Failed to open input WAV file")?;
            let config = KcsConfig::new(info.frame_rate, base_freq, parity)
                .context("invalid KCS configuration")?
                .with_channels(info.channels)
                .with_sample_width_bits(16);
            read_program(source, config)?
        }
        None => {
            let gain = gain.unwrap_or(cli.gain);
            let frame_rate = framerate.unwrap_or(cli.frame_rate);
            let config = KcsConfig::new(frame_rate, base_freq, parity)
                .context("invalid KCS configuration")?;
            let source = DeviceSource::spawn(&config, gain)
                .context("Failed to start audio capture device")?;
            read_program(source, config)?
        }
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for byte in data {
        write!(out, "0x{byte:02X} ")?;
    }
    out.flush()?;
    Ok(())
}

/// Writes `data` as a lead-in-prefixed KCS program through `sink`.
fn write_program<W: SampleSink>(
    sink: W,
    config: KcsConfig,
    data: &[u8],
    lead_in_secs: f64,
) -> Result<()> {
    let mut session = EncoderSession::new(sink, config);
    session
        .write_lead_in(lead_in_secs)
        .context("Failed to write lead-in")?;
    session
        .write_bytes(data)
        .context("Failed to write program data")?;
    session.finish().context("Failed to finalize output")?;
    Ok(())
}

/// Waits for lead-in and decodes every byte `source` has to offer.
fn read_program<S: SampleSource>(source: S, config: KcsConfig) -> Result<Vec<u8>> {
    let mut session = DecoderSession::new(source, config);
    if !session
        .wait_for_lead_in()
        .context("Failed waiting for lead-in")?
    {
        bail!("no lead-in tone detected");
    }
    session
        .decode_bytes()
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| anyhow::anyhow!(e))
}

fn write_output_bytes(output: Option<&Path>, data: &[u8]) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => std::io::stdout()
            .write_all(data)
            .context("Failed to write to stdout"),
    }
}

fn write_output_text(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

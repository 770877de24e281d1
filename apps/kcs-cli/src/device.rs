//! Live audio device source/sink, backed by the `sox` family's `rec`/`play`
//! commands — the same external utility the Python original
//! (`KCSProtocol.py`'s `_open_device`) shells out to.
//!
//! Each type owns its `std::process::Child` exclusively and implements
//! `Drop` so the subprocess is terminated and reaped on every exit path:
//! normal completion, a propagated error, or the caller simply dropping the
//! session mid-stream (spec.md §5 "Cancellation", §9 "Ownership of the
//! external audio process").

use std::io::{Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use kcs_core::error::{KcsError, KcsResult};
use kcs_core::io::{SampleSink, SampleSource};
use kcs_core::KcsConfig;

/// Captures raw PCM from the default audio input device via `rec -t raw`.
pub struct DeviceSource {
    child: Child,
    stdout: ChildStdout,
}

impl DeviceSource {
    /// Spawns `rec` configured to emit raw PCM matching `config`, with the
    /// given input gain.
    pub fn spawn(config: &KcsConfig, gain: f64) -> KcsResult<Self> {
        let mut child = Command::new("rec")
            .args([
                "-q",
                "-r",
                &config.frame_rate.to_string(),
                "-c",
                &config.channels.to_string(),
                "-b",
                &config.sample_width_bits.to_string(),
                "-t",
                "raw",
                "-",
                "gain",
                &gain.to_string(),
            ])
            .stdout(Stdio::piped())
            .spawn()
            .map_err(KcsError::source)?;

        let stdout = child.stdout.take().ok_or_else(|| {
            KcsError::source(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "rec produced no stdout pipe",
            ))
        })?;

        Ok(Self { child, stdout })
    }
}

impl SampleSource for DeviceSource {
    fn read_samples(&mut self, buf: &mut [u8]) -> KcsResult<usize> {
        self.stdout.read(buf).map_err(KcsError::source)
    }
}

impl Drop for DeviceSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Plays raw PCM out through the default audio output device via
/// `play -t raw`.
pub struct DeviceSink {
    child: Child,
    stdin: Option<ChildStdin>,
}

impl DeviceSink {
    /// Spawns `play` configured to accept raw PCM matching `config`, at the
    /// given output volume.
    pub fn spawn(config: &KcsConfig, volume: f64) -> KcsResult<Self> {
        let mut child = Command::new("play")
            .args([
                "-q",
                "-r",
                &config.frame_rate.to_string(),
                "-e",
                "unsigned",
                "-c",
                &config.channels.to_string(),
                "-b",
                &config.sample_width_bits.to_string(),
                "-t",
                "raw",
                "-v",
                &volume.to_string(),
                "-",
            ])
            .stdin(Stdio::piped())
            .spawn()
            .map_err(KcsError::sink)?;

        let stdin = child.stdin.take();
        Ok(Self { child, stdin })
    }
}

impl SampleSink for DeviceSink {
    fn write_samples(&mut self, buf: &[u8]) -> KcsResult<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            KcsError::sink(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "play stdin already closed",
            ))
        })?;
        stdin.write_all(buf).map_err(KcsError::sink)
    }

    fn flush(&mut self) -> KcsResult<()> {
        // Closing stdin is how `play` is told the stream is done; it then
        // finishes writing and exits on its own.
        self.stdin.take();
        Ok(())
    }
}

impl Drop for DeviceSink {
    fn drop(&mut self) {
        self.stdin.take();
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

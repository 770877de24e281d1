//! WAV file source and sink, implementing `kcs_core`'s I/O traits over
//! `hound`.
//!
//! Per spec.md §6, the decoder accepts any mono or multi-channel WAV of any
//! sample width and only ever looks at the first channel. [`WavFileSource`]
//! normalizes whatever width the file stores (8/16/24/32-bit integer PCM)
//! to interleaved little-endian 16-bit samples before handing bytes to
//! `kcs_core::sign_change::SignChangeExtractor` — the extractor strides by
//! `sample_width_bytes * channels` and only needs a sample's sign, so
//! normalizing the width up front means it never has to special-case the
//! original file's bit depth. [`WavFileSink`] writes the encoder's native
//! output format (8-, 16-, or 32-bit PCM, matching `kcs_core::waveform`'s
//! `WaveformEncoder`) straight through.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use kcs_core::error::{KcsError, KcsResult};
use kcs_core::io::{SampleSink, SampleSource};
use kcs_core::KcsConfig;

/// The parameters a WAV header actually declares, read back so the caller
/// can build a [`KcsConfig`] that matches the file instead of guessing.
#[derive(Debug, Clone, Copy)]
pub struct WavInfo {
    pub frame_rate: u32,
    pub channels: u16,
}

/// Reads PCM samples from a WAV file, normalizing every sample to 16-bit
/// signed little-endian regardless of the file's native bit depth.
pub struct WavFileSource {
    reader: hound::WavReader<BufReader<File>>,
    bits_per_sample: u16,
}

impl WavFileSource {
    /// Opens `path` as a WAV file, validating it per spec.md §7
    /// (`UnsupportedFormat` for an unreadable header or zero channels,
    /// before any byte is produced).
    pub fn open(path: &Path) -> KcsResult<(Self, WavInfo)> {
        let reader = hound::WavReader::open(path)
            .map_err(|e| KcsError::UnsupportedFormat(format!("{}: {e}", path.display())))?;
        let spec = reader.spec();

        if spec.channels == 0 {
            return Err(KcsError::UnsupportedFormat(format!(
                "{}: WAV header declares zero channels",
                path.display()
            )));
        }
        if !matches!(spec.sample_format, hound::SampleFormat::Int) {
            return Err(KcsError::UnsupportedFormat(format!(
                "{}: only integer PCM WAV is supported",
                path.display()
            )));
        }

        let info = WavInfo {
            frame_rate: spec.sample_rate,
            channels: spec.channels,
        };
        Ok((
            Self {
                reader,
                bits_per_sample: spec.bits_per_sample,
            },
            info,
        ))
    }
}

impl SampleSource for WavFileSource {
    fn read_samples(&mut self, buf: &mut [u8]) -> KcsResult<usize> {
        let mut written = 0usize;
        // hound's sample iterator borrows `&mut self.reader`; re-creating it
        // each call (rather than storing it) sidesteps the
        // self-referential-struct problem, since the reader itself tracks
        // read progress internally.
        while written + 2 <= buf.len() {
            match self.reader.samples::<i32>().next() {
                Some(Ok(sample)) => {
                    let normalized = normalize_to_i16(sample, self.bits_per_sample);
                    buf[written..written + 2].copy_from_slice(&normalized.to_le_bytes());
                    written += 2;
                }
                Some(Err(e)) => return Err(KcsError::source(e)),
                None => break,
            }
        }
        Ok(written)
    }
}

/// Widens or narrows a sample already in hound's zero-centered signed
/// representation to fit in 16 bits, preserving its sign.
fn normalize_to_i16(sample: i32, bits_per_sample: u16) -> i16 {
    if bits_per_sample <= 16 {
        sample as i16
    } else {
        (sample >> (bits_per_sample - 16)) as i16
    }
}

/// Writes PCM samples to a WAV file in the encoder's native format.
pub struct WavFileSink {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    sample_width_bytes: usize,
}

impl WavFileSink {
    /// Creates `path` as a new WAV file shaped by `config` (channel count
    /// and sample width — the encoder's native 8-bit unsigned PCM by
    /// default, matching spec.md §4.4).
    pub fn create(path: &Path, config: &KcsConfig) -> KcsResult<Self> {
        let spec = hound::WavSpec {
            channels: config.channels,
            sample_rate: config.frame_rate,
            bits_per_sample: config.sample_width_bits,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)
            .map_err(|e| KcsError::UnsupportedFormat(format!("{}: {e}", path.display())))?;
        Ok(Self {
            writer: Some(writer),
            sample_width_bytes: config.sample_width_bytes() as usize,
        })
    }

    fn writer_mut(&mut self) -> KcsResult<&mut hound::WavWriter<BufWriter<File>>> {
        self.writer.as_mut().ok_or_else(|| {
            KcsError::sink(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "WAV sink already finalized",
            ))
        })
    }
}

impl SampleSink for WavFileSink {
    fn write_samples(&mut self, buf: &[u8]) -> KcsResult<()> {
        let sample_width_bytes = self.sample_width_bytes;
        let writer = self.writer_mut()?;
        match sample_width_bytes {
            1 => {
                for &byte in buf {
                    // WAV's 8-bit PCM is unsigned; kcs_core's waveform
                    // encoder already writes it that way, so recenter to
                    // hound's signed `i8` representation.
                    let centered = (i16::from(byte) - 128) as i8;
                    writer.write_sample(centered).map_err(KcsError::sink)?;
                }
            }
            2 => {
                for chunk in buf.chunks_exact(2) {
                    let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
                    writer.write_sample(sample).map_err(KcsError::sink)?;
                }
            }
            _ => {
                for chunk in buf.chunks_exact(4) {
                    let sample = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                    writer.write_sample(sample).map_err(KcsError::sink)?;
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> KcsResult<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(KcsError::sink)?;
        }
        Ok(())
    }
}

impl Drop for WavFileSink {
    fn drop(&mut self) {
        // Deterministic release on every exit path, including an error or
        // an early drop that never reached `flush`: an unfinalized hound
        // writer leaves a WAV file with a zeroed/placeholder data-chunk
        // size, so finalize here too if it hasn't happened yet.
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                log::warn!("failed to finalize WAV file on drop: {e}");
            }
        }
    }
}

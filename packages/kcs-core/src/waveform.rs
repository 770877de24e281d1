//! PCM waveform synthesis for the encode direction.
//!
//! Mirrors [`crate::frame::FrameDecoder`]'s byte shape exactly: a low-tone
//! (space) start bit, 8 data bits LSB-first, an optional parity bit
//! computed with the same formula the decoder checks, and the configured
//! number of high-tone (mark) stop bits. A mark-tone lead-in precedes the
//! first byte.

use crate::config::KcsConfig;
use crate::constants::STOP_BITS;
use crate::error::KcsResult;
use crate::io::SampleSink;

/// Synthesizes a KCS-encoded PCM waveform and writes it to a [`SampleSink`].
pub struct WaveformEncoder<W> {
    sink: W,
    config: KcsConfig,
    wave_zero: Vec<u8>,
    wave_one: Vec<u8>,
}

impl<W: SampleSink> WaveformEncoder<W> {
    /// Builds an encoder writing to `sink` using `config`'s tone shape.
    /// Precomputes the "0" and "1" bit waveforms once, since every bit of
    /// every byte reuses one of exactly two buffers.
    pub fn new(sink: W, config: KcsConfig) -> Self {
        let fphw = config.frames_per_half_wave() as usize;
        let sample_width_bytes = config.sample_width_bytes() as usize;

        // A "0" (space) bit alternates at double-width half-waves, 4 times
        // over (base_freq/2); a "1" (mark) bit alternates at single-width
        // half-waves, 8 times over (base_freq). Both span 16 * fphw
        // samples, i.e. frames_per_bit.
        let wave_zero = alternating_tone(fphw * 2, 4, sample_width_bytes);
        let wave_one = alternating_tone(fphw, 8, sample_width_bytes);

        Self {
            sink,
            config,
            wave_zero,
            wave_one,
        }
    }

    /// Writes `secs` seconds of lead-in: a continuous mark tone, giving a
    /// receiver time to synchronize before the first framed byte.
    pub fn write_lead_in(&mut self, secs: f64) -> KcsResult<()> {
        // wave_one's length is a byte count, not a sample count, so at
        // sample widths above 8 bits this must divide by frames_per_bit
        // (samples per wave), not by wave_one.len() (bytes per wave).
        let frames_per_wave = (self.config.frames_per_bit() as usize).max(1);
        let total_samples = (f64::from(self.config.frame_rate) * secs).round() as usize;
        let num_waves = total_samples / frames_per_wave;
        let wave_one = self.wave_one.clone();
        for _ in 0..num_waves {
            self.sink.write_samples(&wave_one)?;
        }
        Ok(())
    }

    /// Writes one framed byte: start bit, 8 data bits, optional parity bit,
    /// and the configured stop bits.
    pub fn write_byte(&mut self, byte: u8) -> KcsResult<()> {
        self.write_bit(false)?; // start bit (space)

        let mut ones = 0u32;
        for i in 0..8 {
            let one = (byte >> i) & 1 == 1;
            if one {
                ones += 1;
            }
            self.write_bit(one)?;
        }

        if self.config.parity.is_enabled() {
            // Resolved per the original KCS implementation: the parity bit
            // is chosen so that ones-in-data-bits plus the parity bit's own
            // value sums to the configured parity mode, not just the data
            // bits alone.
            let parity_bit = (ones % 2) != self.config.parity.mode();
            self.write_bit(parity_bit)?;
        }

        for _ in 0..STOP_BITS {
            self.write_bit(true)?; // stop bits (mark)
        }
        Ok(())
    }

    /// Writes every byte of `data` as consecutive framed bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> KcsResult<()> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    fn write_bit(&mut self, one: bool) -> KcsResult<()> {
        let wave = if one {
            self.wave_one.clone()
        } else {
            self.wave_zero.clone()
        };
        self.sink.write_samples(&wave)
    }

    /// Flushes the underlying sink.
    pub fn finish(mut self) -> KcsResult<()> {
        self.sink.flush()
    }
}

/// Builds an alternating high/low tone: `repeats` cycles of `segment_frames`
/// high samples followed by `segment_frames` low samples.
fn alternating_tone(segment_frames: usize, repeats: usize, sample_width_bytes: usize) -> Vec<u8> {
    let high = high_low_sample(true, sample_width_bytes);
    let low = high_low_sample(false, sample_width_bytes);
    let mut out = Vec::with_capacity(segment_frames * repeats * 2 * sample_width_bytes);
    for _ in 0..repeats {
        for _ in 0..segment_frames {
            out.extend_from_slice(&high);
        }
        for _ in 0..segment_frames {
            out.extend_from_slice(&low);
        }
    }
    out
}

/// Encodes a single full-scale sample, positive if `high` else negative.
fn high_low_sample(high: bool, sample_width_bytes: usize) -> Vec<u8> {
    match sample_width_bytes {
        1 => vec![if high { 200 } else { 55 }],
        2 => {
            let v: i16 = if high { 20_000 } else { -20_000 };
            v.to_le_bytes().to_vec()
        }
        n => {
            let v: i32 = if high { 1_000_000_000 } else { -1_000_000_000 };
            let bytes = v.to_le_bytes();
            let mut out = vec![0u8; n];
            out[..4.min(n)].copy_from_slice(&bytes[..4.min(n)]);
            out
        }
    }
}

//! Turns a raw PCM byte stream into a stream of sign-change bits.
//!
//! Every later stage (lead-in detection, frame decoding) works purely in
//! terms of "did the waveform cross zero between this sample and the last
//! one", which is a cheap, amplitude-independent proxy for instantaneous
//! frequency. This is the first stage of the decode pipeline; see
//! spec.md §2.

use crate::config::KcsConfig;
use crate::constants::READ_CHUNK_BYTES;
use crate::error::{KcsError, KcsResult};
use crate::io::SampleSource;

/// Lazily pulls PCM bytes from a [`SampleSource`] and yields one `bool` per
/// sample on the first channel: `true` if its sign differs from the
/// previous sample's.
///
/// Multi-channel input is supported by striding over the other channels;
/// only channel 0 is inspected, matching spec.md §4.1's "first channel
/// only" rule for multi-channel WAV input.
pub struct SignChangeExtractor<S> {
    source: S,
    sample_width_bytes: usize,
    frame_stride_bytes: usize,
    buf: Vec<u8>,
    buf_len: usize,
    pos: usize,
    source_exhausted: bool,
    /// The previous sample's sign, seeded to `false` ("MSB 0") per spec.md
    /// §4.1 so the very first sample already yields one output bit instead
    /// of merely priming the comparison.
    prev_sign: bool,
    /// Set when [`SampleSource::read_samples`] fails; the `Iterator` impl
    /// has no channel for errors, so this is surfaced separately via
    /// [`Self::take_error`] once the stream reports exhausted.
    error: Option<KcsError>,
}

impl<S: SampleSource> SignChangeExtractor<S> {
    /// Builds an extractor reading PCM bytes from `source` according to
    /// `config`.
    pub fn new(source: S, config: KcsConfig) -> Self {
        let sample_width_bytes = config.sample_width_bytes() as usize;
        let frame_stride_bytes = sample_width_bytes * usize::from(config.channels);
        Self {
            source,
            sample_width_bytes,
            frame_stride_bytes,
            buf: vec![0u8; READ_CHUNK_BYTES],
            buf_len: 0,
            pos: 0,
            source_exhausted: false,
            prev_sign: false,
            error: None,
        }
    }

    /// Takes the error observed from the underlying source, if any. `None`
    /// at a clean end of stream. Only meaningful once the iterator has
    /// yielded its final `None`.
    pub fn take_error(&mut self) -> Option<KcsError> {
        self.error.take()
    }

    /// Reads the next raw sample on channel 0, or `None` at end of stream.
    /// Advances `pos` by a full frame (all channels) each call.
    fn next_sample_sign(&mut self) -> KcsResult<Option<bool>> {
        loop {
            if self.pos + self.frame_stride_bytes <= self.buf_len {
                let sample = &self.buf[self.pos..self.pos + self.sample_width_bytes];
                self.pos += self.frame_stride_bytes;
                return Ok(Some(is_positive(sample)));
            }
            if self.source_exhausted {
                return Ok(None);
            }
            self.refill()?;
            if self.pos + self.frame_stride_bytes > self.buf_len {
                // Refill made no progress: a short, unusable trailing
                // fragment was left over. Treat it as end of stream.
                self.source_exhausted = true;
                return Ok(None);
            }
        }
    }

    /// Shifts unconsumed bytes to the front of the buffer and reads more
    /// from the source to fill the rest.
    fn refill(&mut self) -> KcsResult<()> {
        let remaining = self.buf_len - self.pos;
        self.buf.copy_within(self.pos..self.buf_len, 0);
        self.buf_len = remaining;
        self.pos = 0;

        let read = self.source.read_samples(&mut self.buf[self.buf_len..])?;
        self.buf_len += read;
        if read == 0 {
            self.source_exhausted = true;
        }
        Ok(())
    }
}

/// Interprets `sample` as centered-at-zero and reports whether it is
/// non-negative. 8-bit PCM is unsigned and centered at 128; wider widths
/// are little-endian signed integers.
fn is_positive(sample: &[u8]) -> bool {
    match sample.len() {
        1 => sample[0] >= 128,
        2 => i16::from_le_bytes([sample[0], sample[1]]) >= 0,
        4 => i32::from_le_bytes([sample[0], sample[1], sample[2], sample[3]]) >= 0,
        n => {
            // Wider-than-32-bit PCM is not produced by any source this
            // crate implements; fall back to inspecting the sign bit of
            // the most significant byte (little-endian).
            sample[n - 1] & 0x80 == 0
        }
    }
}

impl<S: SampleSource> Iterator for SignChangeExtractor<S> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let sign = match self.next_sample_sign() {
            Ok(Some(sign)) => sign,
            Ok(None) => return None,
            Err(err) => {
                self.error = Some(err);
                return None;
            }
        };
        let changed = sign != self.prev_sign;
        self.prev_sign = sign;
        Some(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_wave_8bit(half_wave_len: usize, cycles: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(half_wave_len * 2 * cycles);
        for _ in 0..cycles {
            out.extend(std::iter::repeat(200u8).take(half_wave_len));
            out.extend(std::iter::repeat(50u8).take(half_wave_len));
        }
        out
    }

    #[test]
    fn square_wave_emits_one_sign_change_per_half_wave() {
        let data = square_wave_8bit(4, 3);
        let config = KcsConfig::default();
        let extractor = SignChangeExtractor::new(data.as_slice(), config);
        let bits: Vec<bool> = extractor.collect();
        assert_eq!(bits.len(), data.len());
        let changes = bits.iter().filter(|&&b| b).count();
        assert_eq!(changes, 6);
    }

    #[test]
    fn constant_signal_emits_no_changes_after_the_first_sample() {
        // The initial "previous MSB" is assumed 0 (spec.md §4.1), so a
        // constant high-tone signal reports exactly one change on its very
        // first sample and none thereafter.
        let data = vec![200u8; 64];
        let config = KcsConfig::default();
        let extractor = SignChangeExtractor::new(data.as_slice(), config);
        let bits: Vec<bool> = extractor.collect();
        assert_eq!(bits[0], true);
        assert!(bits[1..].iter().all(|&b| !b));
    }

    #[test]
    fn handles_reads_crossing_chunk_boundaries() {
        // Bigger than READ_CHUNK_BYTES so at least one refill happens.
        let data = square_wave_8bit(3, READ_CHUNK_BYTES);
        let config = KcsConfig::default();
        let extractor = SignChangeExtractor::new(data.as_slice(), config);
        let bits: Vec<bool> = extractor.collect();
        assert_eq!(bits.len(), data.len());
    }

    #[test]
    fn sixteen_bit_samples_use_signed_interpretation() {
        let mut data = Vec::new();
        for v in [1000i16, 1000, -1000, -1000, 1000] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let config = KcsConfig::default().with_sample_width_bits(16);
        let extractor = SignChangeExtractor::new(data.as_slice(), config);
        let bits: Vec<bool> = extractor.collect();
        assert_eq!(bits, vec![true, false, true, false, true]);
    }

    #[test]
    fn only_first_channel_is_inspected() {
        // Stereo: channel 0 constant, channel 1 oscillating. Only channel
        // 0's (lack of) sign changes should be visible.
        let mut data = Vec::new();
        for i in 0..8u8 {
            data.push(200); // channel 0: constant
            data.push(if i % 2 == 0 { 200 } else { 50 }); // channel 1: oscillating
        }
        let config = KcsConfig::default().with_channels(2);
        let extractor = SignChangeExtractor::new(data.as_slice(), config);
        let bits: Vec<bool> = extractor.collect();
        assert_eq!(bits[0], true);
        assert!(bits[1..].iter().all(|&b| !b));
    }

    /// A source that yields a few good bytes, then fails.
    struct FailingSource {
        remaining: Vec<u8>,
    }

    impl SampleSource for FailingSource {
        fn read_samples(&mut self, buf: &mut [u8]) -> KcsResult<usize> {
            if self.remaining.is_empty() {
                return Err(KcsError::source(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "device unplugged",
                )));
            }
            let n = buf.len().min(self.remaining.len());
            buf[..n].copy_from_slice(&self.remaining[..n]);
            self.remaining.drain(..n);
            Ok(n)
        }
    }

    #[test]
    fn source_error_is_recorded_after_stream_ends() {
        let config = KcsConfig::default();
        let mut extractor = SignChangeExtractor::new(
            FailingSource {
                remaining: vec![200u8, 50u8, 200u8],
            },
            config,
        );
        assert!(extractor.take_error().is_none());
        let bits: Vec<bool> = (&mut extractor).collect();
        assert_eq!(bits.len(), 3);
        let err = extractor.take_error().expect("source error surfaced");
        assert!(matches!(err, KcsError::Source(_)));
        // Taking it again yields nothing further.
        assert!(extractor.take_error().is_none());
    }
}

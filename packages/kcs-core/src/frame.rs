//! Byte framing: start-bit search and the 8N1/8N2-style byte shape.
//!
//! Once [`crate::lead_in::LeadInDetector`] has located the tone, decoding
//! proceeds byte by byte: search for a start bit, classify eight data bits,
//! optionally check a parity bit, and skip the stop bits before searching
//! for the next byte's start bit.

use std::collections::VecDeque;

use crate::config::KcsConfig;
use crate::constants::STOP_BITS;
use crate::error::{KcsError, KcsResult};
use crate::io::SampleSource;
use crate::sign_change::SignChangeExtractor;

/// Decodes framed bytes from a sign-change bit stream.
///
/// Constructed from the same bit iterator [`crate::lead_in::LeadInDetector::detect`]
/// was given, so decoding picks up exactly where lead-in detection left
/// off.
pub struct FrameDecoder<I> {
    bits: I,
    config: KcsConfig,
    frames_per_bit: usize,
    bit_threshold: u32,
    start_bit_sum_max: u32,
    done: bool,
    /// Bits already pulled from `bits` while confirming the start-bit
    /// search's result, not yet handed to the caller. Drained before
    /// `bits` is polled again.
    pending: VecDeque<bool>,
}

impl<I: Iterator<Item = bool>> FrameDecoder<I> {
    /// Builds a decoder over `bits` using `config`'s framing parameters.
    pub fn new(bits: I, config: KcsConfig) -> Self {
        Self {
            bits,
            config,
            frames_per_bit: config.frames_per_bit() as usize,
            bit_threshold: config.bit_threshold(),
            start_bit_sum_max: config.start_bit_sum_max(),
            done: false,
            pending: VecDeque::new(),
        }
    }

    fn next_bit(&mut self) -> Option<bool> {
        self.pending.pop_front().or_else(|| self.bits.next())
    }

    /// Slides a `frames_per_bit`-wide window one sample at a time looking
    /// for a low-tone (start bit) region: a window whose sign-change sum is
    /// at or below the start-bit threshold.
    ///
    /// Two tones a fixed frequency ratio apart can tie on sum at more than
    /// one (slightly misaligned) window position near a real transition, so
    /// this doesn't commit to the first qualifying window. It tracks the
    /// best (lowest-sum) qualifying window seen and only commits once a
    /// full further bit-width has passed without a strictly better one,
    /// then rewinds logically by replaying the bits read during that
    /// confirmation window as [`Self::pending`]. Returns `false` at end of
    /// stream with no qualifying window ever found.
    fn find_start_bit(&mut self) -> bool {
        if self.frames_per_bit == 0 {
            return false;
        }
        let cap = self.frames_per_bit;
        let grace = cap;
        let mut window: VecDeque<bool> = VecDeque::with_capacity(cap);
        let mut sum = 0u32;
        let mut best_sum: Option<u32> = None;
        let mut since_best = 0usize;
        let mut replay: VecDeque<bool> = VecDeque::new();

        loop {
            let Some(bit) = self.next_bit() else {
                if best_sum.is_some() {
                    self.pending = replay;
                    return true;
                }
                return false;
            };
            if window.len() >= cap {
                if let Some(old) = window.pop_front() {
                    if old {
                        sum -= 1;
                    }
                }
            }
            window.push_back(bit);
            if bit {
                sum += 1;
            }
            replay.push_back(bit);

            if window.len() == cap && sum <= self.start_bit_sum_max {
                let improved = best_sum.is_none_or(|best| sum < best);
                if improved {
                    best_sum = Some(sum);
                    since_best = 0;
                    replay.clear();
                    continue;
                }
            }

            if best_sum.is_some() {
                since_best += 1;
                if since_best >= grace {
                    self.pending = replay;
                    return true;
                }
            }
        }
    }

    /// Consumes the next `frames_per_bit` bits as a single non-overlapping
    /// classification window, returning their sign-change sum, or `None`
    /// if the stream ends before the window fills.
    fn read_window_sum(&mut self) -> Option<u32> {
        let mut sum = 0u32;
        for _ in 0..self.frames_per_bit {
            if self.next_bit()? {
                sum += 1;
            }
        }
        Some(sum)
    }

    fn decode_one(&mut self) -> Option<KcsResult<u8>> {
        if self.done {
            return None;
        }
        if !self.find_start_bit() {
            self.done = true;
            return None;
        }

        let mut byte = 0u8;
        let mut ones = 0u32;
        for bit_index in 0..8 {
            let sum = self.read_window_sum().or_else(|| {
                self.done = true;
                None
            })?;
            if sum >= self.bit_threshold {
                byte |= 1 << bit_index;
                ones += 1;
            }
        }

        if self.config.parity.is_enabled() {
            let sum = match self.read_window_sum() {
                Some(sum) => sum,
                None => {
                    self.done = true;
                    return None;
                }
            };
            let parity_bit = u32::from(sum >= self.bit_threshold);
            if (ones + parity_bit) % 2 != self.config.parity.mode() {
                self.done = true;
                return Some(Err(KcsError::Parity));
            }
        }

        // Stop bits carry no information; an end of stream partway through
        // them still yields the byte just decoded.
        for _ in 0..STOP_BITS {
            if self.read_window_sum().is_none() {
                self.done = true;
                return Some(Ok(byte));
            }
        }

        Some(Ok(byte))
    }
}

impl<I: Iterator<Item = bool>> Iterator for FrameDecoder<I> {
    type Item = KcsResult<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decode_one()
    }
}

impl<S: SampleSource> FrameDecoder<SignChangeExtractor<S>> {
    /// Takes any error the underlying [`SampleSource`] reported while this
    /// decoder was draining it. Only meaningful after the decoder's
    /// iterator has yielded its final `None`; used by
    /// [`crate::session::DecodedBytes`] to surface a source failure instead
    /// of silently treating it as end of stream.
    pub(crate) fn take_source_error(&mut self) -> Option<KcsError> {
        self.bits.take_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parity;

    /// Builds a sign-change bit stream for one framed byte: a low-tone
    /// start bit, `byte`'s 8 data bits LSB-first, an optional parity bit,
    /// and `STOP_BITS` high-tone stop bits.
    fn frame_bits(config: &KcsConfig, byte: u8) -> Vec<bool> {
        let fpb = config.frames_per_bit() as usize;
        let low = |out: &mut Vec<bool>| out.extend(std::iter::repeat(false).take(fpb));
        let high = |out: &mut Vec<bool>| out.extend(std::iter::repeat(true).take(fpb));

        let mut bits = Vec::new();
        low(&mut bits); // start bit

        let mut ones = 0u32;
        for i in 0..8 {
            let one = (byte >> i) & 1 == 1;
            if one {
                ones += 1;
                high(&mut bits);
            } else {
                low(&mut bits);
            }
        }

        if config.parity.is_enabled() {
            let parity_bit = (ones % 2) != config.parity.mode();
            if parity_bit {
                high(&mut bits);
            } else {
                low(&mut bits);
            }
        }

        for _ in 0..STOP_BITS {
            high(&mut bits);
        }
        bits
    }

    /// Prepends a single mark-tone bit, standing in for the tail of the
    /// lead-in or a previous byte's stop bits, so the start-bit search has
    /// a real transition edge to lock onto.
    fn with_leading_mark(mut bits: Vec<bool>) -> Vec<bool> {
        let mut out = vec![true];
        out.append(&mut bits);
        out
    }

    #[test]
    fn decodes_single_byte_no_parity() {
        let config = KcsConfig::default();
        let bits = with_leading_mark(frame_bits(&config, 0xA5));
        let decoded: Vec<u8> = FrameDecoder::new(bits.into_iter(), config)
            .map(Result::unwrap)
            .collect();
        assert_eq!(decoded, vec![0xA5]);
    }

    #[test]
    fn decodes_multiple_consecutive_bytes() {
        let config = KcsConfig::default();
        let mut bits = Vec::new();
        for byte in [0x00u8, 0xFF, 0x55] {
            bits.extend(frame_bits(&config, byte));
        }
        let bits = with_leading_mark(bits);
        let decoded: Vec<u8> = FrameDecoder::new(bits.into_iter(), config)
            .map(Result::unwrap)
            .collect();
        assert_eq!(decoded, vec![0x00, 0xFF, 0x55]);
    }

    #[test]
    fn even_parity_accepts_matching_byte() {
        let config = KcsConfig::default().with_parity(Parity::Even);
        let bits = with_leading_mark(frame_bits(&config, 0xFF)); // 8 ones: parity bit must be 0
        let decoded: Vec<KcsResult<u8>> = FrameDecoder::new(bits.into_iter(), config).collect();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].as_ref().unwrap(), &0xFF);
    }

    #[test]
    fn odd_parity_accepts_matching_byte() {
        let config = KcsConfig::default().with_parity(Parity::Odd);
        let bits = with_leading_mark(frame_bits(&config, 0xFF)); // 8 ones: parity bit must be 1
        let decoded: Vec<KcsResult<u8>> = FrameDecoder::new(bits.into_iter(), config).collect();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].as_ref().unwrap(), &0xFF);
    }

    #[test]
    fn parity_mismatch_is_reported_and_stops_decoding() {
        let config = KcsConfig::default().with_parity(Parity::Even);
        let mut bits = with_leading_mark(frame_bits(&config, 0xFF));
        // Flip the parity bit (the window right after the 8 data bits) to
        // force a mismatch.
        let fpb = config.frames_per_bit() as usize;
        let parity_window_start = 1 + fpb * 9; // leading mark + start bit + 8 data bits
        for b in &mut bits[parity_window_start..parity_window_start + fpb] {
            *b = true;
        }
        let decoded: Vec<KcsResult<u8>> = FrameDecoder::new(bits.into_iter(), config).collect();
        assert_eq!(decoded.len(), 1);
        assert!(matches!(decoded[0], Err(KcsError::Parity)));
    }

    #[test]
    fn empty_stream_yields_no_bytes() {
        let config = KcsConfig::default();
        let decoded: Vec<KcsResult<u8>> = FrameDecoder::new(std::iter::empty(), config).collect();
        assert!(decoded.is_empty());
    }

    #[test]
    fn truncated_byte_at_eof_is_dropped_silently() {
        let config = KcsConfig::default();
        let mut bits = with_leading_mark(frame_bits(&config, 0x42));
        bits.truncate(bits.len() - 3); // cut off mid-stop-bit
        let decoded: Vec<KcsResult<u8>> = FrameDecoder::new(bits.into_iter(), config).collect();
        // The byte itself was fully read before the stop bits were cut
        // short, so it is still emitted.
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].as_ref().unwrap(), &0x42);
    }

    #[test]
    fn truncated_mid_data_bits_yields_nothing() {
        let config = KcsConfig::default();
        let fpb = config.frames_per_bit() as usize;
        let mut bits = with_leading_mark(frame_bits(&config, 0x42));
        bits.truncate(1 + fpb * 3); // leading mark + start bit + 2 data bits only
        let decoded: Vec<KcsResult<u8>> = FrameDecoder::new(bits.into_iter(), config).collect();
        assert!(decoded.is_empty());
    }
}

//! Session configuration and the quantities derived from it.
//!
//! A [`KcsConfig`] is immutable once built and shared (by value — it is
//! small and `Copy`) across the extractor, lead-in detector, frame decoder,
//! and waveform encoder, so every component derives `frames_per_bit` and the
//! bit-classification threshold identically.

use crate::constants::{
    BIT_THRESHOLD_AT_REFERENCE, DEFAULT_BASE_FREQ, DEFAULT_CHANNELS, DEFAULT_FRAME_RATE,
    DEFAULT_SAMPLE_WIDTH_BITS, REFERENCE_FRAMES_PER_BIT, START_BIT_SUM_MAX_AT_REFERENCE,
};
use crate::error::{KcsError, KcsResult};

/// Parity mode applied to (or expected of) each framed byte.
///
/// Modeled as an explicit enum rather than an in-band sentinel bitmask
/// entry, implementing spec.md §9 Open Question 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    /// No parity bit is framed.
    #[default]
    None,
    /// Even parity: data bits plus parity bit must sum to an even count of ones.
    Even,
    /// Odd parity: data bits plus parity bit must sum to an odd count of ones.
    Odd,
}

impl Parity {
    /// The `parity_mode` integer used by the framing algorithm: `0` for
    /// even, `1` for odd. `None` has no mode and is never consulted.
    pub(crate) fn mode(self) -> u32 {
        match self {
            Parity::None => 0,
            Parity::Even => 0,
            Parity::Odd => 1,
        }
    }

    /// Whether a parity bit is framed at all.
    pub fn is_enabled(self) -> bool {
        !matches!(self, Parity::None)
    }
}

/// Immutable configuration for a KCS encode or decode session.
#[derive(Debug, Clone, Copy)]
pub struct KcsConfig {
    /// PCM sampling frequency, in Hz.
    pub frame_rate: u32,
    /// Bits per PCM sample.
    pub sample_width_bits: u16,
    /// Number of PCM channels.
    pub channels: u16,
    /// KCS base tone, in Hz.
    pub base_freq: u32,
    /// Parity mode for framed bytes.
    pub parity: Parity,
}

impl Default for KcsConfig {
    /// The nominal KCS configuration: 48 kHz mono 8-bit PCM, 2400 Hz base
    /// tone, no parity. Known to satisfy [`KcsConfig::new`]'s invariants by
    /// construction, so this bypasses validation.
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            sample_width_bits: DEFAULT_SAMPLE_WIDTH_BITS,
            channels: DEFAULT_CHANNELS,
            base_freq: DEFAULT_BASE_FREQ,
            parity: Parity::None,
        }
    }
}

impl KcsConfig {
    /// Builds a configuration, validating the protocol invariants from
    /// spec.md §3: a positive base frequency and a Nyquist margin of
    /// `frame_rate > 2 * base_freq`.
    pub fn new(frame_rate: u32, base_freq: u32, parity: Parity) -> KcsResult<Self> {
        let config = Self {
            frame_rate,
            base_freq,
            parity,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy of this configuration with the given channel count.
    #[must_use]
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Returns a copy of this configuration with the given sample width.
    #[must_use]
    pub fn with_sample_width_bits(mut self, sample_width_bits: u16) -> Self {
        self.sample_width_bits = sample_width_bits;
        self
    }

    /// Returns a copy of this configuration with the given parity mode.
    #[must_use]
    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Validates the protocol invariants this configuration must satisfy.
    pub fn validate(&self) -> KcsResult<()> {
        if self.base_freq == 0 {
            return Err(KcsError::InvalidConfig("base_freq must be nonzero".into()));
        }
        if self.frame_rate <= 2 * self.base_freq {
            return Err(KcsError::InvalidConfig(format!(
                "frame_rate ({}) must exceed 2 * base_freq ({}) for a Nyquist margin",
                self.frame_rate,
                2 * self.base_freq
            )));
        }
        if self.channels == 0 {
            return Err(KcsError::InvalidConfig("channels must be nonzero".into()));
        }
        if self.sample_width_bits == 0 || self.sample_width_bits % 8 != 0 {
            return Err(KcsError::InvalidConfig(
                "sample_width_bits must be a nonzero multiple of 8".into(),
            ));
        }
        Ok(())
    }

    /// Bytes per PCM sample (`sample_width_bits / 8`).
    #[inline]
    #[must_use]
    pub fn sample_width_bytes(&self) -> u32 {
        u32::from(self.sample_width_bits) / 8
    }

    /// Number of PCM samples spanning one data bit:
    /// `round(frame_rate * 8 / base_freq)`.
    ///
    /// A "0" bit is four cycles of the base tone and a "1" bit is eight
    /// cycles of twice the base tone, both over this same span.
    #[inline]
    #[must_use]
    pub fn frames_per_bit(&self) -> u32 {
        let numerator = u64::from(self.frame_rate) * 8;
        let denom = u64::from(self.base_freq);
        ((numerator + denom / 2) / denom) as u32
    }

    /// Number of PCM samples per half-wave of the base tone:
    /// `floor(frame_rate / base_freq / 2)`.
    #[inline]
    #[must_use]
    pub fn frames_per_half_wave(&self) -> u32 {
        self.frame_rate / (self.base_freq * 2)
    }

    /// Bit-classification threshold: a `frames_per_bit`-wide window of
    /// sign-changes is read as "1" when its sum is at least this value.
    ///
    /// Scaled from the reference constant so non-reference configurations
    /// (other than the nominal 48 kHz / 2400 Hz pair) still separate "0"
    /// (~4 cycles of sign-changes) from "1" (~8 cycles) at their midpoint.
    #[inline]
    #[must_use]
    pub fn bit_threshold(&self) -> u32 {
        scale_reference_constant(self.frames_per_bit(), BIT_THRESHOLD_AT_REFERENCE)
    }

    /// Threshold below which a window is considered to be inside a
    /// low-tone ("0") region during start-bit search.
    #[inline]
    #[must_use]
    pub fn start_bit_sum_max(&self) -> u32 {
        scale_reference_constant(self.frames_per_bit(), START_BIT_SUM_MAX_AT_REFERENCE)
    }
}

/// Scales a constant measured at [`REFERENCE_FRAMES_PER_BIT`] to an
/// arbitrary `frames_per_bit`, clamped to be at least 1.
fn scale_reference_constant(frames_per_bit: u32, reference_value: u32) -> u32 {
    ((u64::from(frames_per_bit) * u64::from(reference_value))
        / u64::from(REFERENCE_FRAMES_PER_BIT))
    .max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_nominal_kcs_parameters() {
        let config = KcsConfig::default();
        assert_eq!(config.frame_rate, 48_000);
        assert_eq!(config.base_freq, 2_400);
        assert_eq!(config.frames_per_bit(), 160);
        assert_eq!(config.frames_per_half_wave(), 10);
        assert_eq!(config.bit_threshold(), 12);
        assert_eq!(config.start_bit_sum_max(), 9);
    }

    #[test]
    fn new_rejects_insufficient_nyquist_margin() {
        let err = KcsConfig::new(4_000, 2_400, Parity::None).unwrap_err();
        assert!(matches!(err, KcsError::InvalidConfig(_)));
    }

    #[test]
    fn new_rejects_zero_base_freq() {
        let err = KcsConfig::new(48_000, 0, Parity::None).unwrap_err();
        assert!(matches!(err, KcsError::InvalidConfig(_)));
    }

    #[test]
    fn builder_methods_compose() {
        let config = KcsConfig::new(48_000, 2_400, Parity::None)
            .unwrap()
            .with_channels(2)
            .with_sample_width_bits(16)
            .with_parity(Parity::Even);
        assert_eq!(config.channels, 2);
        assert_eq!(config.sample_width_bits, 16);
        assert_eq!(config.parity, Parity::Even);
    }

    #[test]
    fn sample_width_bytes_computes_from_bits() {
        assert_eq!(KcsConfig::default().sample_width_bytes(), 1);
        let wide = KcsConfig::default().with_sample_width_bits(16);
        assert_eq!(wide.sample_width_bytes(), 2);
    }

    #[test]
    fn threshold_scales_with_nonreference_rate() {
        // Doubling the sample rate doubles frames_per_bit, which should
        // double the thresholds too.
        let config = KcsConfig::new(96_000, 2_400, Parity::None).unwrap();
        assert_eq!(config.frames_per_bit(), 320);
        assert_eq!(config.bit_threshold(), 24);
        assert_eq!(config.start_bit_sum_max(), 18);
    }

    #[test]
    fn parity_mode_matches_convention() {
        assert_eq!(Parity::Even.mode(), 0);
        assert_eq!(Parity::Odd.mode(), 1);
    }
}

//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the Kansas City Standard itself (framing
//! shape, the reference bit-classification threshold) and changing them
//! would break compatibility with real KCS decoders/encoders.

/// Default PCM sampling frequency (Hz) used when no rate is specified.
pub const DEFAULT_FRAME_RATE: u32 = 48_000;

/// Default KCS base tone (Hz).
pub const DEFAULT_BASE_FREQ: u32 = 2_400;

/// Default number of PCM channels (mono).
pub const DEFAULT_CHANNELS: u16 = 1;

/// Default bits per PCM sample.
pub const DEFAULT_SAMPLE_WIDTH_BITS: u16 = 8;

/// Number of stop bits appended after each framed byte.
pub const STOP_BITS: usize = 2;

/// Default lead-in duration written before data, in seconds.
pub const DEFAULT_LEAD_IN_SECS: f64 = 3.0;

/// Minimum lead-in duration the decoder is required to accept (§8: "Lead-in
/// acceptance"), in seconds.
pub const MIN_LEAD_IN_SECS: f64 = 0.5;

/// Reference `frames_per_bit` at which the classification constants below
/// were measured (`frame_rate = 48000`, `base_freq = 2400`).
pub const REFERENCE_FRAMES_PER_BIT: u32 = 160;

/// Bit-classification threshold at the reference configuration: a window is
/// read as "1" when its sign-change count is at least this value.
///
/// Parameterized per spec.md §9 Open Question 2 rather than hardcoded, so it
/// stays valid at non-reference `frame_rate`/`base_freq` combinations: see
/// [`crate::config::KcsConfig::bit_threshold`].
pub const BIT_THRESHOLD_AT_REFERENCE: u32 = 12;

/// Start-bit-search threshold at the reference configuration: the window is
/// considered "inside a low-tone region" when its sum is at or below this
/// value. Scaled the same way as [`BIT_THRESHOLD_AT_REFERENCE`].
pub const START_BIT_SUM_MAX_AT_REFERENCE: u32 = 9;

/// Acceptable deviation, in sign-changes per half-second, from the expected
/// lead-in tone rate before [`crate::lead_in::LeadInDetector`] accepts it.
pub const LEAD_IN_TOLERANCE: i64 = 100;

/// Number of bytes of PCM frames fetched from a `SampleSource` per
/// underlying read call. Chosen as a reasonable I/O chunk size; does not
/// affect decoding results, only how often the source is polled.
pub const READ_CHUNK_BYTES: usize = 4096;

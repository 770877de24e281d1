//! Lead-in tone detection.
//!
//! Real KCS recordings are preceded by several seconds of a steady base
//! tone so a receiver has time to synchronize before the first framed
//! byte. This stage slides a half-second window over the sign-change bit
//! stream looking for that steady tone, then hands the still-open iterator
//! to [`crate::frame::FrameDecoder`] so decoding picks up exactly where the
//! tone ends.

use std::collections::VecDeque;

use crate::config::KcsConfig;
use crate::constants::LEAD_IN_TOLERANCE;
use crate::error::{KcsError, KcsResult};

/// Detects a steady base-frequency lead-in tone in a sign-change bit stream.
pub struct LeadInDetector;

impl LeadInDetector {
    /// Consumes bits from `bits` until a half-second window of steady
    /// base-frequency tone is observed, leaving the iterator positioned
    /// right after that window so the caller can continue decoding framed
    /// bytes from there.
    ///
    /// Returns [`KcsError::NoLeadIn`] if the stream ends before any window
    /// qualifies.
    pub fn detect(bits: &mut impl Iterator<Item = bool>, config: &KcsConfig) -> KcsResult<()> {
        let window_len = (config.frame_rate / 2).max(1) as usize;
        // Each cycle of the base tone produces two sign changes, so a
        // half-second window of a steady tone contains ~base_freq changes.
        let expected = i64::from(config.base_freq);
        // Amortize the cost of testing: after a failed test, skip ahead by
        // a fifth of a second (spec.md §4.2 step 3) instead of re-testing
        // after every single sample.
        let step = (config.frame_rate / 5).max(1) as usize;

        let mut window: VecDeque<bool> = VecDeque::with_capacity(window_len);
        let mut sum: i64 = 0;

        for bit in bits.by_ref().take(window_len) {
            if bit {
                sum += 1;
            }
            window.push_back(bit);
        }
        if window.len() < window_len {
            return Err(KcsError::NoLeadIn);
        }

        loop {
            if (sum - expected).abs() < LEAD_IN_TOLERANCE {
                return Ok(());
            }

            let mut advanced = 0usize;
            for bit in bits.by_ref().take(step) {
                if let Some(oldest) = window.pop_front() {
                    if oldest {
                        sum -= 1;
                    }
                }
                if bit {
                    sum += 1;
                }
                window.push_back(bit);
                advanced += 1;
            }
            if advanced == 0 {
                return Err(KcsError::NoLeadIn);
            }
        }
    }
}

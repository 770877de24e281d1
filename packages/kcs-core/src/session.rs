//! The `CodecSession` facade: wires a [`crate::io::SampleSource`] or
//! [`crate::io::SampleSink`] plus a [`KcsConfig`] into a reader or writer
//! usable by higher layers, per spec.md §4.5.
//!
//! Read and write are modeled as two distinct types, [`DecoderSession`] and
//! [`EncoderSession`], rather than one type with both halves of the API —
//! a decode-only caller has no use for `write_bytes`, and vice versa. Each
//! owns its source or sink exclusively for its lifetime; releasing the I/O
//! resource on every exit path (normal completion, error, or the caller
//! simply dropping the session mid-stream) falls out of ordinary `Drop`
//! rather than needing bespoke cleanup here — see `kcs-cli`'s `DeviceSource`
//! / `DeviceSink` for the case where that `Drop` impl actually does
//! something (reaping a child process).

use crate::config::KcsConfig;
use crate::error::{KcsError, KcsResult};
use crate::frame::FrameDecoder;
use crate::io::{SampleSink, SampleSource};
use crate::lead_in::LeadInDetector;
use crate::sign_change::SignChangeExtractor;
use crate::waveform::WaveformEncoder;

/// A decode session bound to one [`SampleSource`].
pub struct DecoderSession<S> {
    bits: SignChangeExtractor<S>,
    config: KcsConfig,
}

impl<S: SampleSource> DecoderSession<S> {
    /// Opens a decode session over `source` using `config`.
    pub fn new(source: S, config: KcsConfig) -> Self {
        Self {
            bits: SignChangeExtractor::new(source, config),
            config,
        }
    }

    /// Advances past the lead-in tone. Returns `Ok(true)` once a steady
    /// base-frequency tone has been observed, `Ok(false)` if the stream
    /// ended first with no source error, or `Err` if the source failed.
    pub fn wait_for_lead_in(&mut self) -> KcsResult<bool> {
        match LeadInDetector::detect(&mut self.bits, &self.config) {
            Ok(()) => Ok(true),
            Err(KcsError::NoLeadIn) => match self.bits.take_error() {
                Some(err) => Err(err),
                None => Ok(false),
            },
            Err(err) => Err(err),
        }
    }

    /// Consumes the session and returns a lazy sequence of decoded bytes,
    /// continuing from wherever [`Self::wait_for_lead_in`] left off (or
    /// from the very first bit, if it was never called).
    pub fn decode_bytes(self) -> DecodedBytes<S> {
        DecodedBytes {
            decoder: Some(FrameDecoder::new(self.bits, self.config)),
        }
    }
}

/// Lazy byte sequence produced by [`DecoderSession::decode_bytes`].
///
/// Behaves exactly like [`FrameDecoder`]'s own iterator, except that once
/// the underlying sign-change stream is exhausted, it checks whether that
/// exhaustion was a genuine end of stream or a failed [`SampleSource`]
/// read, surfacing the latter as one final `Err(KcsError::Source(_))` item
/// per spec.md §7 ("Source: underlying I/O error ... propagated unchanged").
pub struct DecodedBytes<S: SampleSource> {
    decoder: Option<FrameDecoder<SignChangeExtractor<S>>>,
}

impl<S: SampleSource> Iterator for DecodedBytes<S> {
    type Item = KcsResult<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let decoder = self.decoder.as_mut()?;
        match decoder.next() {
            Some(item) => Some(item),
            None => {
                let source_error = decoder.take_source_error();
                self.decoder = None;
                source_error.map(Err)
            }
        }
    }
}

/// An encode session bound to one [`SampleSink`].
pub struct EncoderSession<W> {
    encoder: WaveformEncoder<W>,
}

impl<W: SampleSink> EncoderSession<W> {
    /// Opens an encode session writing to `sink` using `config`.
    pub fn new(sink: W, config: KcsConfig) -> Self {
        Self {
            encoder: WaveformEncoder::new(sink, config),
        }
    }

    /// Writes `secs` seconds of lead-in tone.
    pub fn write_lead_in(&mut self, secs: f64) -> KcsResult<()> {
        self.encoder.write_lead_in(secs)
    }

    /// Writes every byte of `data` as consecutive framed bytes.
    pub fn write_bytes(&mut self, data: &[u8]) -> KcsResult<()> {
        self.encoder.write_bytes(data)
    }

    /// Flushes the sink and releases it, consuming the session.
    pub fn finish(self) -> KcsResult<()> {
        self.encoder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Parity;

    #[test]
    fn decoder_session_round_trips_lead_in_and_bytes() {
        let config = KcsConfig::default();
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut encoder = EncoderSession::new(&mut sink, config);
            encoder.write_lead_in(1.0).unwrap();
            encoder.write_bytes(&[0x41, 0x42, 0x43]).unwrap();
            encoder.finish().unwrap();
        }

        let mut session = DecoderSession::new(sink.as_slice(), config);
        assert!(session.wait_for_lead_in().unwrap());
        let decoded: KcsResult<Vec<u8>> = session.decode_bytes().collect();
        assert_eq!(decoded.unwrap(), vec![0x41, 0x42, 0x43]);
    }

    #[test]
    fn decoder_session_reports_no_lead_in_on_silence() {
        let config = KcsConfig::default();
        let silence = vec![0x80u8; config.frame_rate as usize * 2];
        let mut session = DecoderSession::new(silence.as_slice(), config);
        assert!(!session.wait_for_lead_in().unwrap());
    }

    #[test]
    fn encoder_session_with_parity_round_trips() {
        let config = KcsConfig::default().with_parity(Parity::Odd);
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut encoder = EncoderSession::new(&mut sink, config);
            encoder.write_lead_in(1.0).unwrap();
            encoder.write_bytes(&[0xAA]).unwrap();
            encoder.finish().unwrap();
        }

        let mut session = DecoderSession::new(sink.as_slice(), config);
        assert!(session.wait_for_lead_in().unwrap());
        let decoded: KcsResult<Vec<u8>> = session.decode_bytes().collect();
        assert_eq!(decoded.unwrap(), vec![0xAA]);
    }

    #[test]
    fn empty_data_encodes_only_lead_in() {
        let config = KcsConfig::default();
        let mut sink: Vec<u8> = Vec::new();
        {
            let mut encoder = EncoderSession::new(&mut sink, config);
            encoder.write_lead_in(1.0).unwrap();
            encoder.write_bytes(&[]).unwrap();
            encoder.finish().unwrap();
        }

        let mut session = DecoderSession::new(sink.as_slice(), config);
        assert!(session.wait_for_lead_in().unwrap());
        let decoded: KcsResult<Vec<u8>> = session.decode_bytes().collect();
        assert_eq!(decoded.unwrap(), Vec::<u8>::new());
    }
}

//! Source/sink abstractions over PCM sample streams.
//!
//! The codec core never opens a file or a device itself: callers hand it a
//! [`SampleSource`] or [`SampleSink`], so the same [`crate::session`] code
//! runs unchanged over a WAV file, a live capture device, or (in tests) an
//! in-memory buffer.

use crate::error::KcsResult;

/// A readable stream of raw PCM sample bytes.
///
/// Implementations decide their own framing (a WAV file has a skippable
/// header; a live device has none); by the time bytes reach the core they
/// are already raw, interleaved PCM at [`crate::config::KcsConfig::sample_width_bytes`]
/// per sample.
pub trait SampleSource {
    /// Reads up to `buf.len()` bytes of PCM data, returning the number of
    /// bytes actually read. Returns `0` only at end of stream.
    fn read_samples(&mut self, buf: &mut [u8]) -> KcsResult<usize>;
}

/// A writable sink for raw PCM sample bytes.
pub trait SampleSink {
    /// Writes the given PCM bytes in full.
    fn write_samples(&mut self, buf: &[u8]) -> KcsResult<()>;

    /// Flushes any buffered output. The default implementation is a no-op;
    /// sinks that buffer (e.g. a file writer) should override it.
    fn flush(&mut self) -> KcsResult<()> {
        Ok(())
    }
}

impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    fn read_samples(&mut self, buf: &mut [u8]) -> KcsResult<usize> {
        (**self).read_samples(buf)
    }
}

impl<T: SampleSink + ?Sized> SampleSink for Box<T> {
    fn write_samples(&mut self, buf: &[u8]) -> KcsResult<()> {
        (**self).write_samples(buf)
    }

    fn flush(&mut self) -> KcsResult<()> {
        (**self).flush()
    }
}

impl SampleSource for &[u8] {
    fn read_samples(&mut self, buf: &mut [u8]) -> KcsResult<usize> {
        let n = buf.len().min(self.len());
        buf[..n].copy_from_slice(&self[..n]);
        *self = &self[n..];
        Ok(n)
    }
}

impl SampleSink for Vec<u8> {
    fn write_samples(&mut self, buf: &[u8]) -> KcsResult<()> {
        self.extend_from_slice(buf);
        Ok(())
    }
}

impl<T: SampleSink + ?Sized> SampleSink for &mut T {
    fn write_samples(&mut self, buf: &[u8]) -> KcsResult<()> {
        (**self).write_samples(buf)
    }

    fn flush(&mut self) -> KcsResult<()> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_reads_until_exhausted() {
        let mut data: &[u8] = &[1, 2, 3, 4, 5];
        let mut buf = [0u8; 3];

        let n = data.read_samples(&mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);

        let n = data.read_samples(&mut buf).unwrap();
        assert_eq!(n, 2);
        assert_eq!(&buf[..2], &[4, 5]);

        let n = data.read_samples(&mut buf).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn vec_sink_accumulates_writes() {
        let mut sink: Vec<u8> = Vec::new();
        sink.write_samples(&[1, 2]).unwrap();
        sink.write_samples(&[3]).unwrap();
        assert_eq!(sink, vec![1, 2, 3]);
        sink.flush().unwrap();
    }

    #[test]
    fn boxed_source_forwards_to_inner() {
        let data: &[u8] = &[9, 8, 7];
        let mut boxed: Box<dyn SampleSource> = Box::new(data);
        let mut buf = [0u8; 3];
        assert_eq!(boxed.read_samples(&mut buf).unwrap(), 3);
        assert_eq!(buf, [9, 8, 7]);
    }
}

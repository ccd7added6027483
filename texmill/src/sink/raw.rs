//! Raw passthrough sink with progress reporting.

use std::io::Write;

use super::{TextureKind, TextureSink};
use crate::error::PipelineError;

/// Progress callback: `(level, bytes_emitted, total_bytes)`.
///
/// `total_bytes` is the caller's size estimate (0 when unknown).
pub type ProgressFn = Box<dyn FnMut(u32, u64, u64)>;

/// Writes every mip level straight through to an [`std::io::Write`].
///
/// The payload is the levels' RGBA8 bytes in delivery order, nothing else;
/// container framing belongs downstream.
pub struct RawSink<W: Write> {
    writer: W,
    total_bytes: u64,
    bytes_emitted: u64,
    progress: Option<ProgressFn>,
}

impl<W: Write> RawSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            total_bytes: 0,
            bytes_emitted: 0,
            progress: None,
        }
    }

    /// Set the expected total payload size for progress reporting.
    pub fn with_total_bytes(mut self, total: u64) -> Self {
        self.total_bytes = total;
        self
    }

    /// Install a progress callback, invoked after every delivered level.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Bytes written so far.
    pub fn bytes_emitted(&self) -> u64 {
        self.bytes_emitted
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TextureSink for RawSink<W> {
    fn set_texture_layout(
        &mut self,
        _kind: TextureKind,
        _width: u32,
        _height: u32,
        _depth: u32,
        _array_size: u32,
    ) -> Result<(), PipelineError> {
        Ok(())
    }

    fn set_mipmap_data(
        &mut self,
        bytes: &[u8],
        _width: u32,
        _height: u32,
        _depth: u32,
        _face: u32,
        level: u32,
    ) -> Result<(), PipelineError> {
        self.writer
            .write_all(bytes)
            .map_err(|e| PipelineError::Compressor(e.to_string()))?;
        self.bytes_emitted += bytes.len() as u64;

        if let Some(progress) = self.progress.as_mut() {
            progress(level, self.bytes_emitted, self.total_bytes);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), PipelineError> {
        self.writer
            .flush()
            .map_err(|e| PipelineError::Compressor(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_raw_sink_concatenates_levels() {
        let mut sink = RawSink::new(Vec::new());
        sink.set_mipmap_data(&[1, 2, 3, 4], 1, 1, 1, 0, 1).unwrap();
        sink.set_mipmap_data(&[5, 6, 7, 8], 1, 1, 1, 0, 0).unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.bytes_emitted(), 8);
        assert_eq!(sink.into_inner(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_raw_sink_reports_progress() {
        let seen: Rc<RefCell<Vec<(u32, u64, u64)>>> = Rc::default();
        let seen_cb = Rc::clone(&seen);

        let mut sink = RawSink::new(Vec::new())
            .with_total_bytes(8)
            .with_progress(Box::new(move |level, emitted, total| {
                seen_cb.borrow_mut().push((level, emitted, total));
            }));

        sink.set_mipmap_data(&[0; 4], 1, 1, 1, 0, 1).unwrap();
        sink.set_mipmap_data(&[0; 4], 1, 1, 1, 0, 0).unwrap();

        assert_eq!(&*seen.borrow(), &[(1, 4, 8), (0, 8, 8)]);
    }

    #[test]
    fn test_raw_sink_maps_io_failure_to_compressor_error() {
        struct Failing;
        impl Write for Failing {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut sink = RawSink::new(Failing);
        let err = sink.set_mipmap_data(&[0; 4], 1, 1, 1, 0, 0);
        assert!(matches!(err, Err(PipelineError::Compressor(_))));
    }
}

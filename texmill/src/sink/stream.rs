//! Streaming zstd-compressed sink.

use std::io::Write;

use zstd::stream::Encoder;

use super::{TextureKind, TextureSink};
use crate::error::PipelineError;

/// Compression level used for texture payloads.
const ZSTD_LEVEL: i32 = 17;

/// Input buffer size; levels accumulate here so the encoder sees fat
/// chunks instead of one call per mip.
const BUFFER_CAPACITY: usize = 128 * 1024;

/// Streams every mip level through a zstd encoder into the inner writer.
///
/// Incoming bytes land in a bounded buffer that is handed to the encoder
/// whenever it fills; [`finish`](TextureSink::finish) drains the buffer and
/// closes the zstd frame. Dropping the sink without `finish` abandons the
/// frame, so a failed pipeline never commits partial output downstream.
pub struct ZstdSink<W: Write> {
    encoder: Option<Encoder<'static, W>>,
    buffer: Vec<u8>,
}

impl<W: Write> ZstdSink<W> {
    /// Wrap a writer in a compressing sink.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Compressor`] if the encoder cannot be
    /// created.
    pub fn new(writer: W) -> Result<Self, PipelineError> {
        let encoder =
            Encoder::new(writer, ZSTD_LEVEL).map_err(|e| PipelineError::Compressor(e.to_string()))?;
        Ok(Self {
            encoder: Some(encoder),
            buffer: Vec::with_capacity(BUFFER_CAPACITY),
        })
    }

    fn drain_buffer(&mut self) -> Result<(), PipelineError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        if let Some(encoder) = self.encoder.as_mut() {
            encoder
                .write_all(&self.buffer)
                .map_err(|e| PipelineError::Compressor(e.to_string()))?;
        }
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write> TextureSink for ZstdSink<W> {
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
        _level: u32,
    ) -> Result<(), PipelineError> {
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() >= BUFFER_CAPACITY {
            self.drain_buffer()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), PipelineError> {
        self.drain_buffer()?;
        if let Some(encoder) = self.encoder.take() {
            let mut writer = encoder
                .finish()
                .map_err(|e| PipelineError::Compressor(e.to_string()))?;
            writer
                .flush()
                .map_err(|e| PipelineError::Compressor(e.to_string()))?;
        }
        Ok(())
    }
}

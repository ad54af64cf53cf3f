//! Length-prefixed record framing
//!
//! A capture is a flat sequence of records, each a 4-byte little-endian
//! length followed by that many payload bytes:
//!
//! ```text
//! file   := record*
//! record := length:u32le payload:[u8; length]
//! ```
//!
//! Reading is pull-based: the framer never looks past the record it is
//! currently producing.

use crate::error::{FrameSection, Result, ScopeError};
use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_BYTES: usize = 4;

/// One framed payload together with its position in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Zero-based record index
    pub index: u64,
    /// Byte offset of the record's length prefix
    pub offset: u64,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

/// Reads successive frames from a byte source
#[derive(Debug)]
pub struct RecordFramer<R> {
    reader: R,
    index: u64,
    offset: u64,
}

impl<R: Read> RecordFramer<R> {
    /// Wrap a reader positioned at the start of a record
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            index: 0,
            offset: 0,
        }
    }

    /// Bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.offset
    }

    /// Read the next frame
    ///
    /// Returns `Ok(None)` only when the input ends exactly at a record
    /// boundary. Input ending anywhere else is a `TruncatedStream` error.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let index = self.index;
        let offset = self.offset;

        let mut prefix = [0u8; LENGTH_PREFIX_BYTES];
        let filled = read_up_to(&mut self.reader, &mut prefix).map_err(|e| self.io_error(e))?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < LENGTH_PREFIX_BYTES {
            return Err(ScopeError::TruncatedStream {
                index,
                offset,
                section: FrameSection::LengthPrefix,
                expected: LENGTH_PREFIX_BYTES,
                found: filled,
            });
        }

        let length = u32::from_le_bytes(prefix) as usize;

        // Grow with what is actually there, a corrupt length on a short
        // file must not allocate the declared size.
        let mut payload = Vec::new();
        let read = self
            .reader
            .by_ref()
            .take(length as u64)
            .read_to_end(&mut payload);
        let found = read.map_err(|e| self.io_error(e))?;
        if found < length {
            return Err(ScopeError::TruncatedStream {
                index,
                offset,
                section: FrameSection::Payload,
                expected: length,
                found,
            });
        }

        self.index += 1;
        self.offset += (LENGTH_PREFIX_BYTES + length) as u64;

        Ok(Some(Frame {
            index,
            offset,
            payload,
        }))
    }

    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn io_error(&self, source: io::Error) -> ScopeError {
        ScopeError::Io {
            index: self.index,
            offset: self.offset,
            source: Arc::new(source),
        }
    }
}

/// Fill `buf` as far as the reader allows, returning the byte count.
///
/// Unlike `read_exact`, a short read tells us how much was present, which
/// separates a clean end of input (0) from a cut-off prefix.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Writes length-prefixed frames
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
    frames_written: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    /// Write one payload with its length prefix
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let length = u32::try_from(payload.len()).map_err(|_| ScopeError::Encode {
            reason: format!(
                "payload of {} bytes exceeds the {} byte frame limit",
                payload.len(),
                u32::MAX
            ),
        })?;

        self.writer
            .write_all(&length.to_le_bytes())
            .and_then(|()| self.writer.write_all(payload))
            .map_err(write_error)?;

        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush().map_err(write_error)?;
        Ok(self.writer)
    }
}

fn write_error(source: io::Error) -> ScopeError {
    ScopeError::Write {
        source: Arc::new(source),
    }
}

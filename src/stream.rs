//! Streaming access to scope captures
//!
//! A [`ScopeStream`] owns its byte source for its whole life. It reads one
//! record per call and never rewinds; open a fresh stream to read a capture
//! again. Dropping the stream (or calling [`ScopeStream::close`]) releases
//! the source on every path, including errors.
//!
//! A stream has a single owner. It does no locking, so sharing one instance
//! between threads is the caller's problem to avoid.

use crate::error::{Result, ScopeError};
use crate::framer::{FrameWriter, RecordFramer};
use crate::scope_record::{decode_frame, ScopeRecord};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Where a stream stopped
#[derive(Debug, Clone)]
enum Terminal {
    End,
    Failed(ScopeError),
}

/// Lazy, single-pass reader of scope records
#[derive(Debug)]
pub struct ScopeStream<R> {
    framer: RecordFramer<R>,
    terminal: Option<Terminal>,
    records_read: u64,
}

impl ScopeStream<BufReader<File>> {
    /// Open a capture file
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rspscope::stream::ScopeStream;
    ///
    /// let mut stream = ScopeStream::open("capture.rsp")?;
    /// while let Some(scope) = stream.next_scope()? {
    ///     println!("{} took {:.6}s", scope.tag(), scope.elapsed_seconds());
    /// }
    /// stream.close();
    /// # Ok::<(), rspscope::error::ScopeError>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ScopeError::open(path, e))?;

        // File::open succeeds on directories on Linux; reading would fail later
        let metadata = file.metadata().map_err(|e| ScopeError::open(path, e))?;
        if metadata.is_dir() {
            return Err(ScopeError::open(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, "is a directory"),
            ));
        }

        debug!(path = %path.display(), bytes = metadata.len(), "opened scope stream");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: Read> ScopeStream<R> {
    /// Stream records out of any reader positioned at a record boundary
    pub fn from_reader(reader: R) -> Self {
        Self {
            framer: RecordFramer::new(reader),
            terminal: None,
            records_read: 0,
        }
    }

    /// Read the next record
    ///
    /// `Ok(None)` means the capture ended cleanly. Once the stream ends or
    /// fails, every later call returns the same outcome.
    pub fn next_scope(&mut self) -> Result<Option<ScopeRecord>> {
        match &self.terminal {
            Some(Terminal::End) => return Ok(None),
            Some(Terminal::Failed(err)) => return Err(err.clone()),
            None => {}
        }

        let outcome = self
            .framer
            .next_frame()
            .and_then(|frame| frame.map(|f| decode_frame(&f)).transpose());

        match outcome {
            Ok(Some(scope)) => {
                self.records_read += 1;
                Ok(Some(scope))
            }
            Ok(None) => {
                self.terminal = Some(Terminal::End);
                Ok(None)
            }
            Err(err) => {
                self.terminal = Some(Terminal::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Number of records decoded so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// True once the stream reached its end or failed
    pub fn is_finished(&self) -> bool {
        self.terminal.is_some()
    }

    /// Release the byte source
    pub fn close(self) {
        debug!(
            records = self.records_read,
            bytes = self.framer.bytes_read(),
            "closed scope stream"
        );
    }
}

impl<R: Read> Iterator for ScopeStream<R> {
    type Item = Result<ScopeRecord>;

    /// `None` is end-of-stream. After an error the same error keeps coming
    /// back, so stop at the first `Err`.
    fn next(&mut self) -> Option<Self::Item> {
        self.next_scope().transpose()
    }
}

/// Read every record of a capture into memory
pub fn read_all_scopes(path: impl AsRef<Path>) -> Result<Vec<ScopeRecord>> {
    let mut stream = ScopeStream::open(path)?;
    let mut scopes = Vec::new();
    while let Some(scope) = stream.next_scope()? {
        scopes.push(scope);
    }
    stream.close();
    Ok(scopes)
}

/// Writes scope records in the capture format read by [`ScopeStream`]
#[derive(Debug)]
pub struct ScopeWriter<W: Write> {
    frames: FrameWriter<W>,
}

impl ScopeWriter<BufWriter<File>> {
    /// Create (or truncate) a capture file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ScopeError::open(path, e))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ScopeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            frames: FrameWriter::new(writer),
        }
    }

    /// Encode and append one record
    pub fn write_scope(&mut self, scope: &ScopeRecord) -> Result<()> {
        let payload = scope.to_payload()?;
        self.frames.write_frame(&payload)
    }

    /// Append an already-encoded payload
    pub fn write_payload(&mut self, payload: &[u8]) -> Result<()> {
        self.frames.write_frame(payload)
    }

    pub fn records_written(&self) -> u64 {
        self.frames.frames_written()
    }

    /// Flush and hand back the writer
    pub fn finish(self) -> Result<W> {
        self.frames.finish()
    }
}

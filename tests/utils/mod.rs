// Integration test utilities
//
// Builders for capture files on disk.

#![allow(dead_code)]

use rspscope::{MetadataEntry, ScopeRecord, ScopeWriter};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A capture file in its own temporary directory
pub struct Capture {
    dir: TempDir,
    path: PathBuf,
}

impl Capture {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Raw bytes of the file
    pub fn bytes(&self) -> Vec<u8> {
        std::fs::read(&self.path).unwrap()
    }

    /// Replace the file with its first `len` bytes
    pub fn truncate(&self, len: usize) {
        let bytes = self.bytes();
        std::fs::write(&self.path, &bytes[..len]).unwrap();
    }

    /// Append raw bytes to the file
    pub fn append(&self, extra: &[u8]) {
        let mut bytes = self.bytes();
        bytes.extend_from_slice(extra);
        std::fs::write(&self.path, bytes).unwrap();
    }
}

/// Write `scopes` to a fresh capture file
pub fn write_capture(scopes: &[ScopeRecord]) -> Capture {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.rsp");
    let mut writer = ScopeWriter::create(&path).unwrap();
    for scope in scopes {
        writer.write_scope(scope).unwrap();
    }
    writer.finish().unwrap();
    Capture { dir, path }
}

/// A scope of `millis` milliseconds on a 1 MHz clock
pub fn scope_ms(tag: &str, millis: u64) -> ScopeRecord {
    ScopeRecord::new(tag, 1_000, 1_000 + millis * 1_000, 1_000_000)
}

/// The three-tag capture used across the CLI tests
///
/// `parse` x3 (1, 2, 3 ms), `render` x2 (10, 20 ms), `io` x1 (5 ms), interleaved.
pub fn mixed_capture() -> Capture {
    write_capture(&[
        scope_ms("parse", 1).with_metadata(MetadataEntry::uint64("tokens", 42)),
        scope_ms("render", 10),
        scope_ms("parse", 2),
        scope_ms("io", 5).with_buffer(4096, 3),
        scope_ms("render", 20),
        scope_ms("parse", 3),
    ])
}

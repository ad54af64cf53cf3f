//! Scope record model and payload codec
//!
//! Each framed payload is one scope serialized as a MessagePack map:
//!
//! ```text
//! ScopeInfo
//! ├─ tag: str                      grouping key
//! ├─ ticks_start: u64              monotonic ticks at scope entry
//! ├─ ticks_end: u64                monotonic ticks at scope exit
//! ├─ machine_nominal_freq_hz: u64  0 when unknown
//! ├─ max_buffer_size: u64
//! ├─ max_offset: u8
//! └─ metadata: [MetadataEntry]
//!    ├─ tag: str
//!    ├─ type: u8                   see MetadataType
//!    └─ value: u64                 little-endian bytes of the scalar
//! ```
//!
//! The encoder writes the named (map) form; the decoder also accepts the
//! compact array form.
//!
//! A metadata entry that does not decode fails the whole record. Entries are
//! never dropped silently.

use crate::error::{Result, ScopeError};
use crate::framer::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// Interpretation codes for `MetadataEntry::kind`
///
/// The reader never depends on these; they only drive display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MetadataType {
    Unset = 0,
    Int8 = 1,
    Uint8 = 2,
    Int16 = 3,
    Uint16 = 4,
    Int32 = 5,
    Uint32 = 6,
    Int64 = 7,
    Uint64 = 8,
    Double = 9,
    Float = 10,
}

impl MetadataType {
    /// Map a wire code to a known type
    pub fn from_code(code: u8) -> Option<Self> {
        let kind = match code {
            0 => MetadataType::Unset,
            1 => MetadataType::Int8,
            2 => MetadataType::Uint8,
            3 => MetadataType::Int16,
            4 => MetadataType::Uint16,
            5 => MetadataType::Int32,
            6 => MetadataType::Uint32,
            7 => MetadataType::Int64,
            8 => MetadataType::Uint64,
            9 => MetadataType::Double,
            10 => MetadataType::Float,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            MetadataType::Unset => "UNSET",
            MetadataType::Int8 => "INT8",
            MetadataType::Uint8 => "UINT8",
            MetadataType::Int16 => "INT16",
            MetadataType::Uint16 => "UINT16",
            MetadataType::Int32 => "INT32",
            MetadataType::Uint32 => "UINT32",
            MetadataType::Int64 => "INT64",
            MetadataType::Uint64 => "UINT64",
            MetadataType::Double => "DOUBLE",
            MetadataType::Float => "FLOAT",
        }
    }
}

/// A tagged scalar attached to a scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Identifying tag (not unique within a scope)
    pub tag: String,

    /// Type code, see [`MetadataType`]
    #[serde(rename = "type")]
    pub kind: u8,

    /// Raw 64-bit payload
    pub value: u64,
}

impl MetadataEntry {
    pub fn new(tag: impl Into<String>, kind: u8, value: u64) -> Self {
        Self {
            tag: tag.into(),
            kind,
            value,
        }
    }

    /// Build an entry holding an unsigned 64-bit value
    pub fn uint64(tag: impl Into<String>, value: u64) -> Self {
        Self::new(tag, MetadataType::Uint64 as u8, value)
    }

    /// Build an entry holding a double
    pub fn double(tag: impl Into<String>, value: f64) -> Self {
        Self::new(tag, MetadataType::Double as u8, value.to_bits())
    }

    /// Human-readable type name, `UNKNOWN(n)` for codes we don't know
    pub fn type_name(&self) -> String {
        match MetadataType::from_code(self.kind) {
            Some(kind) => kind.name().to_string(),
            None => format!("UNKNOWN({})", self.kind),
        }
    }

    /// Render the value according to its type code
    pub fn display_value(&self) -> String {
        let b = self.value.to_le_bytes();
        match MetadataType::from_code(self.kind) {
            Some(MetadataType::Unset) => "(unset)".to_string(),
            Some(MetadataType::Int8) => (b[0] as i8).to_string(),
            Some(MetadataType::Uint8) => b[0].to_string(),
            Some(MetadataType::Int16) => i16::from_le_bytes([b[0], b[1]]).to_string(),
            Some(MetadataType::Uint16) => u16::from_le_bytes([b[0], b[1]]).to_string(),
            Some(MetadataType::Int32) => i32::from_le_bytes([b[0], b[1], b[2], b[3]]).to_string(),
            Some(MetadataType::Uint32) => u32::from_le_bytes([b[0], b[1], b[2], b[3]]).to_string(),
            Some(MetadataType::Int64) => (self.value as i64).to_string(),
            Some(MetadataType::Uint64) | None => self.value.to_string(),
            Some(MetadataType::Double) => f64::from_bits(self.value).to_string(),
            Some(MetadataType::Float) => {
                f32::from_bits(u32::from_le_bytes([b[0], b[1], b[2], b[3]])).to_string()
            }
        }
    }
}

/// One timed execution region
///
/// Fields are read-only; `elapsed_seconds` is derived once when the record
/// is built and stays consistent with the tick bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeRecord {
    tag: String,
    ticks_start: u64,
    ticks_end: u64,
    machine_nominal_freq_hz: u64,
    max_buffer_size: u64,
    max_offset: u8,
    metadata: Vec<MetadataEntry>,
    elapsed_seconds: f64,
}

impl ScopeRecord {
    /// Create a record with computed elapsed time
    ///
    /// # Example
    ///
    /// ```
    /// use rspscope::scope_record::ScopeRecord;
    ///
    /// let scope = ScopeRecord::new("parse", 1000, 2000, 1000);
    /// assert_eq!(scope.elapsed_seconds(), 1.0);
    /// ```
    pub fn new(
        tag: impl Into<String>,
        ticks_start: u64,
        ticks_end: u64,
        machine_nominal_freq_hz: u64,
    ) -> Self {
        Self {
            tag: tag.into(),
            ticks_start,
            ticks_end,
            machine_nominal_freq_hz,
            max_buffer_size: 0,
            max_offset: 0,
            metadata: Vec::new(),
            elapsed_seconds: elapsed_seconds(ticks_start, ticks_end, machine_nominal_freq_hz),
        }
    }

    /// Set the capture buffer bookkeeping
    pub fn with_buffer(mut self, max_buffer_size: u64, max_offset: u8) -> Self {
        self.max_buffer_size = max_buffer_size;
        self.max_offset = max_offset;
        self
    }

    /// Append a metadata entry
    pub fn with_metadata(mut self, entry: MetadataEntry) -> Self {
        self.metadata.push(entry);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn ticks_start(&self) -> u64 {
        self.ticks_start
    }

    pub fn ticks_end(&self) -> u64 {
        self.ticks_end
    }

    pub fn machine_nominal_freq_hz(&self) -> u64 {
        self.machine_nominal_freq_hz
    }

    pub fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }

    pub fn max_offset(&self) -> u8 {
        self.max_offset
    }

    /// Metadata in payload order
    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    /// Wall time covered by the scope, 0 when the frequency is unknown
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Serialize this record into a payload
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        let wire = WireScopeRef {
            tag: &self.tag,
            ticks_start: self.ticks_start,
            ticks_end: self.ticks_end,
            machine_nominal_freq_hz: self.machine_nominal_freq_hz,
            max_buffer_size: self.max_buffer_size,
            max_offset: self.max_offset,
            metadata: &self.metadata,
        };
        rmp_serde::to_vec_named(&wire).map_err(|e| ScopeError::Encode {
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for ScopeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scope[{}] ticks_start={} ticks_end={} machine_nominal_freq_hz={} metadata={{",
            self.tag, self.ticks_start, self.ticks_end, self.machine_nominal_freq_hz
        )?;
        for (i, m) in self.metadata.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}: {}", m.tag, m.type_name(), m.display_value())?;
        }
        f.write_str("}")
    }
}

/// `(end - start) / freq`, or 0 when the frequency is unknown
///
/// An end tick before the start tick counts as zero elapsed time.
fn elapsed_seconds(ticks_start: u64, ticks_end: u64, freq_hz: u64) -> f64 {
    if freq_hz == 0 {
        return 0.0;
    }
    ticks_end.saturating_sub(ticks_start) as f64 / freq_hz as f64
}

#[derive(Deserialize)]
struct WireScope {
    tag: String,
    ticks_start: u64,
    ticks_end: u64,
    machine_nominal_freq_hz: u64,
    max_buffer_size: u64,
    max_offset: u8,
    #[serde(default)]
    metadata: Vec<MetadataEntry>,
}

#[derive(Serialize)]
struct WireScopeRef<'a> {
    tag: &'a str,
    ticks_start: u64,
    ticks_end: u64,
    machine_nominal_freq_hz: u64,
    max_buffer_size: u64,
    max_offset: u8,
    metadata: &'a [MetadataEntry],
}

/// Decode one payload into a record
///
/// Pure: the same bytes always give the same record. Bytes left over after
/// the record are an error.
pub fn decode_payload(payload: &[u8]) -> std::result::Result<ScopeRecord, String> {
    let mut cursor = Cursor::new(payload);
    let wire = {
        let mut de = rmp_serde::Deserializer::new(&mut cursor);
        WireScope::deserialize(&mut de).map_err(|e| e.to_string())?
    };

    let consumed = cursor.position() as usize;
    if consumed != payload.len() {
        return Err(format!(
            "{} trailing bytes after scope record",
            payload.len() - consumed
        ));
    }

    let mut scope = ScopeRecord::new(
        wire.tag,
        wire.ticks_start,
        wire.ticks_end,
        wire.machine_nominal_freq_hz,
    )
    .with_buffer(wire.max_buffer_size, wire.max_offset);
    scope.metadata = wire.metadata;
    Ok(scope)
}

/// Decode a framed payload, attaching the frame's position to any failure
pub fn decode_frame(frame: &Frame) -> Result<ScopeRecord> {
    decode_payload(&frame.payload).map_err(|reason| ScopeError::MalformedRecord {
        index: frame.index,
        offset: frame.offset,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScopeRecord {
        ScopeRecord::new("render", 1_000, 3_000, 2_000)
            .with_buffer(4096, 3)
            .with_metadata(MetadataEntry::uint64("items", 42))
            .with_metadata(MetadataEntry::double("ratio", 0.25))
    }

    #[test]
    fn test_elapsed_one_second() {
        let scope = ScopeRecord::new("a", 1000, 2000, 1000);
        assert_eq!(scope.elapsed_seconds(), 1.0);
    }

    #[test]
    fn test_elapsed_zero_frequency() {
        let scope = ScopeRecord::new("a", 1000, 2000, 0);
        assert_eq!(scope.elapsed_seconds(), 0.0);
        assert!(scope.elapsed_seconds().is_finite());
    }

    #[test]
    fn test_elapsed_end_before_start() {
        let scope = ScopeRecord::new("a", 5000, 1000, 1000);
        assert_eq!(scope.elapsed_seconds(), 0.0);
    }

    #[test]
    fn test_decode_preserves_fields() {
        let original = sample();
        let payload = original.to_payload().unwrap();
        let decoded = decode_payload(&payload).unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.tag(), "render");
        assert_eq!(decoded.max_buffer_size(), 4096);
        assert_eq!(decoded.max_offset(), 3);
        assert_eq!(decoded.metadata().len(), 2);
        assert_eq!(decoded.metadata()[0].tag, "items");
        assert_eq!(decoded.elapsed_seconds(), 1.0);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let payload = sample().to_payload().unwrap();
        assert_eq!(
            decode_payload(&payload).unwrap(),
            decode_payload(&payload).unwrap()
        );
    }

    #[test]
    fn test_decode_array_form() {
        let tuple = (
            "tuple",
            10u64,
            20u64,
            10u64,
            64u64,
            1u8,
            vec![("n", 8u8, 5u64)],
        );
        let payload = rmp_serde::to_vec(&tuple).unwrap();
        let decoded = decode_payload(&payload).unwrap();

        assert_eq!(decoded.tag(), "tuple");
        assert_eq!(decoded.elapsed_seconds(), 1.0);
        assert_eq!(decoded.metadata(), &[MetadataEntry::uint64("n", 5)]);
    }

    #[test]
    fn test_decode_empty_payload_fails() {
        assert!(decode_payload(&[]).is_err());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_payload(&[0xc1, 0xff, 0x00]).is_err());
    }

    #[test]
    fn test_decode_trailing_bytes_fails() {
        let mut payload = sample().to_payload().unwrap();
        payload.push(0x00);
        let err = decode_payload(&payload).unwrap_err();
        assert!(err.contains("trailing"));
    }

    #[test]
    fn test_bad_metadata_entry_fails_whole_record() {
        #[derive(Serialize)]
        struct BadMeta<'a> {
            tag: &'a str,
            #[serde(rename = "type")]
            kind: &'a str,
            value: u64,
        }
        #[derive(Serialize)]
        struct Scope<'a> {
            tag: &'a str,
            ticks_start: u64,
            ticks_end: u64,
            machine_nominal_freq_hz: u64,
            max_buffer_size: u64,
            max_offset: u8,
            metadata: Vec<BadMeta<'a>>,
        }
        let payload = rmp_serde::to_vec_named(&Scope {
            tag: "x",
            ticks_start: 0,
            ticks_end: 1,
            machine_nominal_freq_hz: 1,
            max_buffer_size: 0,
            max_offset: 0,
            metadata: vec![BadMeta {
                tag: "m",
                kind: "not-a-code",
                value: 1,
            }],
        })
        .unwrap();

        assert!(decode_payload(&payload).is_err());
    }

    #[test]
    fn test_decode_frame_carries_position() {
        let frame = Frame {
            index: 4,
            offset: 256,
            payload: vec![0xc1],
        };
        match decode_frame(&frame) {
            Err(ScopeError::MalformedRecord { index, offset, .. }) => {
                assert_eq!(index, 4);
                assert_eq!(offset, 256);
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_metadata_display_values() {
        assert_eq!(MetadataEntry::uint64("n", 7).display_value(), "7");
        assert_eq!(MetadataEntry::double("d", 1.5).display_value(), "1.5");
        assert_eq!(
            MetadataEntry::new("i8", MetadataType::Int8 as u8, 0xff).display_value(),
            "-1"
        );
        assert_eq!(
            MetadataEntry::new("i32", MetadataType::Int32 as u8, (-5i32) as u32 as u64)
                .display_value(),
            "-5"
        );
        assert_eq!(
            MetadataEntry::new("f", MetadataType::Float as u8, 2.5f32.to_bits() as u64)
                .display_value(),
            "2.5"
        );
        assert_eq!(
            MetadataEntry::new("u", MetadataType::Unset as u8, 9).display_value(),
            "(unset)"
        );
    }

    #[test]
    fn test_unknown_metadata_type() {
        let entry = MetadataEntry::new("x", 200, 99);
        assert_eq!(entry.type_name(), "UNKNOWN(200)");
        assert_eq!(entry.display_value(), "99");
    }

    #[test]
    fn test_display_lists_metadata() {
        let text = sample().to_string();
        assert!(text.starts_with("Scope[render]"));
        assert!(text.contains("items=UINT64: 42"));
        assert!(text.contains("ratio=DOUBLE: 0.25"));
    }
}

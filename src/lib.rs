//! rspscope - reader and analyzer for recorded profiling scopes
//!
//! A capture file is a sequence of length-prefixed scope records written by
//! an external profiler. This library frames and decodes that stream lazily,
//! groups records by tag, and computes elapsed-time percentiles, with text,
//! JSON, CSV and HTML chart reports on top.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod framer;
pub mod html_output;
pub mod json_output;
pub mod report;
pub mod scope_record;
pub mod serve;
pub mod stats;
pub mod stream;

pub use error::{Result, ScopeError};
pub use scope_record::{MetadataEntry, MetadataType, ScopeRecord};
pub use stream::{ScopeStream, ScopeWriter};

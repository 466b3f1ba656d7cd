//! Crate-wide error type.
//!
//! Fatal-syntax and fatal-I/O errors each carry enough context (file name,
//! input line number) that the `Display` impl alone is a usable diagnostic,
//! mirroring the single structured error enum pattern other pipeline crates
//! in this tree use (e.g. `rde_core::RdeError`) rather than a bag of
//! `String`s.

use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("couldn't open \"{path}\" for read: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed: {source}")]
    WriteFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: syntax error: unwrapped double quote at line {line}")]
    UnwrappedQuote { file: Arc<str>, line: u64 },

    #[error("{file}: imbalanced double-quote at line {line}")]
    ImbalancedQuote { file: Arc<str>, line: u64 },

    #[error("{file}: syntax error: record-ending field separator at line {line}")]
    RecordEndingFieldSeparator { file: Arc<str>, line: u64 },

    #[error("{file}: unacceptable empty CSV key at line {line}")]
    EmptyHeaderKey { file: Arc<str>, line: u64 },

    #[error("{file}: header/data length mismatch ({header_len} != {data_len}) at line {line}")]
    HeaderDataMismatch {
        file: Arc<str>,
        line: u64,
        header_len: usize,
        data_len: usize,
    },

    #[error("field \"{field}\" is not valid UTF-8 at line {line} of {file}")]
    InvalidUtf8 { file: Arc<str>, line: u64, field: String },

    #[error("non-numeric value {value:?} in field \"{field}\"")]
    NonNumericValue { field: String, value: String },

    #[error("internal invariant violation: {0}")]
    Internal(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;

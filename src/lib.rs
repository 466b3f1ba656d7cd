//! # recstream
//!
//! A streaming record-processing engine for line-oriented tabular data
//! (CSV-family formats). Records flow source → parser → mappers → writer,
//! one record at a time, on a single thread: no internal concurrency, no
//! reordering, one end-of-stream signal per mapper at the very end.
//!
//! The pieces that make this correct under schema change and a tight
//! memory model live in their own modules:
//!
//! - [`trie`]: longest-prefix byte-pattern matching for separators, quotes,
//!   and their end-of-input variants.
//! - [`source`]: presents a file (memory-mapped) or an arbitrary byte
//!   stream as one contiguous, read-only region with a synthesized
//!   one-past-end sentinel.
//! - [`field`] / [`strbuilder`]: the reusable scratch field list and the
//!   byte accumulator backing it when a field can't be emitted zero-copy.
//! - [`header`]: interns header schemas so records sharing a schema share
//!   one key list.
//! - [`record`]: the ordered key/value map that flows through the
//!   pipeline.
//! - [`parser`]: turns a source region into a stream of [`record::Record`]s.
//! - [`pipeline`]: chains [`pipeline::Mapper`]s together and drives
//!   end-of-stream propagation.
//! - [`mappers`]: the one fully specified mapper (`fraction`), plus the
//!   trait every mapper implements.
//! - [`writer`]: the pipeline's terminal stage.
//!
//! ## Usage
//!
//! ```no_run
//! use recstream::context::StreamContext;
//! use recstream::parser::{CsvConfig, CsvParser};
//! use recstream::pipeline::{self, Mapper};
//! use recstream::source::SourceFile;
//! use recstream::writer::CsvWriter;
//! use std::sync::Arc;
//!
//! # fn main() -> recstream::error::Result<()> {
//! let source = SourceFile::open_buffered("inline", &b"a,b\n1,2\n"[..])?;
//! let sources: Vec<(Arc<str>, SourceFile)> = vec![(Arc::from("inline"), source)];
//! let parser = CsvParser::new(CsvConfig::default(), false);
//! let mappers: Vec<Box<dyn Mapper<'_> + '_>> = vec![];
//! let mut writer = CsvWriter::new(std::io::stdout(), b",".to_vec(), b"\n".to_vec(), b'"');
//! pipeline::run(&sources, parser, mappers, &mut writer)?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod field;
pub mod header;
pub mod mappers;
pub mod parser;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod strbuilder;
pub mod trie;
pub mod writer;

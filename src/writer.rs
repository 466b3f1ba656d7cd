//! The CSV writer: the pipeline's terminal stage. Uses the same
//! separator/quote configuration as the parser (see
//! [`crate::parser::CsvConfig`]) so a run's output uses the same wire
//! format as its input unless overridden.
//!
//! Because records are schema-flexible -- fields may appear, disappear, or
//! change order between records within the same stream -- the writer
//! cannot assume one header for the whole run. It tracks the
//! key sequence of the last record it wrote and emits a fresh header line
//! whenever the next record's keys differ in content, not just identity --
//! two records under the same header keeper are always `Arc::ptr_eq` and
//! skip the comparison entirely, but two records from different header
//! keepers that happen to share the same field names still only get one
//! header line between them.

use crate::context::StreamContext;
use crate::error::{EngineError, Result};
use crate::pipeline::Writer as WriterTrait;
use crate::record::{Keys, Record};
use std::io::Write;
use std::sync::Arc;

fn needs_quoting(s: &str, ifs: &[u8], irs: &[u8], quote: u8) -> bool {
    let bytes = s.as_bytes();
    bytes.contains(&quote) || contains_seq(bytes, ifs) || contains_seq(bytes, irs)
}

fn contains_seq(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn write_field(buf: &mut Vec<u8>, s: &str, ifs: &[u8], irs: &[u8], quote: u8) {
    if needs_quoting(s, ifs, irs, quote) {
        buf.push(quote);
        for &b in s.as_bytes() {
            if b == quote {
                buf.push(quote);
            }
            buf.push(b);
        }
        buf.push(quote);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

fn keys_changed(last: &Option<Keys>, keys: &Keys) -> bool {
    match last {
        None => true,
        Some(prev) => {
            if Arc::ptr_eq(prev, keys) {
                return false;
            }
            prev.len() != keys.len() || prev.iter().zip(keys.iter()).any(|(a, b)| a.as_ref() != b.as_ref())
        }
    }
}

/// Writes records as CSV to any [`std::io::Write`], re-emitting a header
/// line whenever the key sequence changes.
pub struct CsvWriter<W: Write> {
    out: W,
    ifs: Vec<u8>,
    irs: Vec<u8>,
    quote: u8,
    last_keys: Option<Keys>,
    scratch: Vec<u8>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(out: W, ifs: Vec<u8>, irs: Vec<u8>, quote: u8) -> Self {
        CsvWriter { out, ifs, irs, quote, last_keys: None, scratch: Vec::with_capacity(256) }
    }

    fn write_header(&mut self, keys: &Keys) -> Result<()> {
        self.scratch.clear();
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                self.scratch.extend_from_slice(&self.ifs);
            }
            write_field(&mut self.scratch, key, &self.ifs, &self.irs, self.quote);
        }
        self.scratch.extend_from_slice(&self.irs);
        self.out.write_all(&self.scratch).map_err(|source| EngineError::WriteFailed { source })
    }

    fn write_record(&mut self, record: &Record<'_>) -> Result<()> {
        self.scratch.clear();
        for (i, (_, field)) in record.iter().enumerate() {
            if i > 0 {
                self.scratch.extend_from_slice(&self.ifs);
            }
            write_field(&mut self.scratch, field.as_str(), &self.ifs, &self.irs, self.quote);
        }
        self.scratch.extend_from_slice(&self.irs);
        self.out.write_all(&self.scratch).map_err(|source| EngineError::WriteFailed { source })
    }
}

impl<'src, W: Write> WriterTrait<'src> for CsvWriter<W> {
    fn write(&mut self, record: Option<Record<'src>>, _ctx: &StreamContext) -> Result<()> {
        match record {
            Some(record) => {
                if keys_changed(&self.last_keys, &record.keys) {
                    self.write_header(&record.keys)?;
                    self.last_keys = Some(Arc::clone(&record.keys));
                }
                self.write_record(&record)
            }
            None => self.out.flush().map_err(|source| EngineError::WriteFailed { source }),
        }
    }
}

//! The pipeline driver: chains mappers together and pushes records and the
//! end-of-stream signal through them in order.
//!
//! The original (`stream.c`'s `do_stream_chained`) represents end-of-stream
//! as a sentinel `NULL` appended to a mapper's own output list -- a
//! convention that only works if every mapper remembers to forward it
//! exactly once. Here the driver owns end-of-stream entirely: it calls
//! `process(None, ctx)` on a mapper itself, exactly once, and only after
//! every record that mapper's upstream neighbor emitted (including records
//! that neighbor's own end-of-stream call produced) has already been pushed
//! all the way through the rest of the chain.

use crate::context::StreamContext;
use crate::error::Result;
use crate::parser::CsvParser;
use crate::record::Record;
use crate::source::SourceFile;
use std::sync::Arc;

/// One stage of the chain. `process` is called once per upstream record
/// with `Some(record)`, and exactly once at end-of-stream with `None`; it
/// returns zero or more records to hand to the next stage (or the writer,
/// for the last stage).
pub trait Mapper<'src> {
    fn process(&mut self, record: Option<Record<'src>>, ctx: &StreamContext) -> Result<Vec<Record<'src>>>;
}

/// Receives the fully-mapped record stream. Like `Mapper`, sees `None`
/// exactly once, after every real record.
pub trait Writer<'src> {
    fn write(&mut self, record: Option<Record<'src>>, ctx: &StreamContext) -> Result<()>;
}

fn drive_record<'src>(
    mappers: &mut [Box<dyn Mapper<'src> + 'src>],
    idx: usize,
    record: Record<'src>,
    ctx: &StreamContext,
    writer: &mut dyn Writer<'src>,
) -> Result<()> {
    if idx == mappers.len() {
        return writer.write(Some(record), ctx);
    }
    let outputs = mappers[idx].process(Some(record), ctx)?;
    for out in outputs {
        drive_record(mappers, idx + 1, out, ctx, writer)?;
    }
    Ok(())
}

/// Propagates end-of-stream starting at stage `idx`: stage `idx` sees
/// `None` first, its outputs are pushed through stages `idx+1..`, and only
/// once those have fully drained does stage `idx + 1` get its own `None`.
fn drive_eos<'src>(
    mappers: &mut [Box<dyn Mapper<'src> + 'src>],
    idx: usize,
    ctx: &StreamContext,
    writer: &mut dyn Writer<'src>,
) -> Result<()> {
    if idx == mappers.len() {
        return writer.write(None, ctx);
    }
    let outputs = mappers[idx].process(None, ctx)?;
    for out in outputs {
        drive_record(mappers, idx + 1, out, ctx, writer)?;
    }
    drive_eos(mappers, idx + 1, ctx, writer)
}

/// Pushes one record through the whole chain.
pub fn drive<'src>(
    mappers: &mut [Box<dyn Mapper<'src> + 'src>],
    record: Record<'src>,
    ctx: &StreamContext,
    writer: &mut dyn Writer<'src>,
) -> Result<()> {
    drive_record(mappers, 0, record, ctx, writer)
}

/// Drains the chain at end-of-stream. Called exactly once, after the last
/// real record of the last source file has been driven through.
pub fn drive_end<'src>(
    mappers: &mut [Box<dyn Mapper<'src> + 'src>],
    ctx: &StreamContext,
    writer: &mut dyn Writer<'src>,
) -> Result<()> {
    drive_eos(mappers, 0, ctx, writer)
}

/// Runs every already-opened source file through `parser`, driving each
/// record through `mappers` into `writer`, and finishes with a single
/// end-of-stream drive. Callers decide which files made it into `sources`
/// in the first place -- a source that failed to open doesn't belong here
/// and doesn't stop the rest of the run.
pub fn run<'src>(
    sources: &'src [(Arc<str>, SourceFile)],
    mut parser: CsvParser<'src>,
    mut mappers: Vec<Box<dyn Mapper<'src> + 'src>>,
    writer: &mut dyn Writer<'src>,
) -> Result<StreamContext> {
    let mut ctx = StreamContext::new();
    for (name, source) in sources {
        parser.start_of_file(source, Arc::clone(name));
        ctx.start_of_file(Arc::clone(name));
        while let Some(record) = parser.parse_next_record()? {
            ctx.record_delivered();
            drive(&mut mappers, record, &ctx, writer)?;
        }
    }
    drive_end(&mut mappers, &ctx, writer)?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use std::sync::Arc;

    fn rec(key: &str, value: &'static str) -> Record<'static> {
        let keys: crate::record::Keys = Arc::from(vec![Arc::from(key)].into_boxed_slice());
        Record::new(keys, vec![Field::Borrowed(value)])
    }

    /// Doubles every record it sees and, at end-of-stream, emits one more
    /// record carrying a running count -- enough to exercise both real-record
    /// fan-out and end-of-stream-produced output flowing through the rest of
    /// the chain.
    struct DoublingCounter {
        seen: usize,
    }

    impl<'src> Mapper<'src> for DoublingCounter {
        fn process(&mut self, record: Option<Record<'src>>, _ctx: &StreamContext) -> Result<Vec<Record<'src>>> {
            Ok(match record {
                Some(r) => {
                    self.seen += 1;
                    vec![r.clone(), r]
                }
                None => vec![rec("count", "done")],
            })
        }
    }

    struct Passthrough;

    impl<'src> Mapper<'src> for Passthrough {
        fn process(&mut self, record: Option<Record<'src>>, _ctx: &StreamContext) -> Result<Vec<Record<'src>>> {
            Ok(match record {
                Some(r) => vec![r],
                None => vec![],
            })
        }
    }

    struct Recording {
        records: Vec<String>,
        saw_eos: bool,
        eos_after_count: Option<usize>,
    }

    impl<'src> Writer<'src> for Recording {
        fn write(&mut self, record: Option<Record<'src>>, _ctx: &StreamContext) -> Result<()> {
            match record {
                Some(r) => self.records.push(r.values()[0].as_str().to_string()),
                None => {
                    self.saw_eos = true;
                    self.eos_after_count = Some(self.records.len());
                }
            }
            Ok(())
        }
    }

    #[test]
    fn real_records_fan_out_through_every_stage() {
        let mut mappers: Vec<Box<dyn Mapper<'static>>> =
            vec![Box::new(DoublingCounter { seen: 0 }), Box::new(Passthrough)];
        let mut writer = Recording { records: vec![], saw_eos: false, eos_after_count: None };
        let ctx = StreamContext::new();
        drive(&mut mappers, rec("a", "1"), &ctx, &mut writer).unwrap();
        assert_eq!(writer.records, vec!["1", "1"]);
    }

    #[test]
    fn end_of_stream_output_flows_through_remaining_stages_before_their_own_eos() {
        let mut mappers: Vec<Box<dyn Mapper<'static>>> =
            vec![Box::new(DoublingCounter { seen: 0 }), Box::new(Passthrough)];
        let mut writer = Recording { records: vec![], saw_eos: false, eos_after_count: None };
        let ctx = StreamContext::new();
        drive(&mut mappers, rec("a", "1"), &ctx, &mut writer).unwrap();
        drive_end(&mut mappers, &ctx, &mut writer).unwrap();
        // The first mapper's end-of-stream record ("done") must have reached
        // the writer as an ordinary record before the writer's own `None`.
        assert_eq!(writer.records, vec!["1", "1", "done"]);
        assert!(writer.saw_eos);
        assert_eq!(writer.eos_after_count, Some(3));
    }

    #[test]
    fn each_stage_sees_end_of_stream_exactly_once() {
        struct CountingEos {
            eos_calls: std::rc::Rc<std::cell::Cell<usize>>,
        }
        impl<'src> Mapper<'src> for CountingEos {
            fn process(&mut self, record: Option<Record<'src>>, _ctx: &StreamContext) -> Result<Vec<Record<'src>>> {
                if record.is_none() {
                    self.eos_calls.set(self.eos_calls.get() + 1);
                }
                Ok(record.into_iter().collect())
            }
        }
        let counter_a = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter_b = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut mappers: Vec<Box<dyn Mapper<'static>>> = vec![
            Box::new(CountingEos { eos_calls: counter_a.clone() }),
            Box::new(CountingEos { eos_calls: counter_b.clone() }),
        ];
        let ctx = StreamContext::new();
        let mut writer = Recording { records: vec![], saw_eos: false, eos_after_count: None };
        drive_end(&mut mappers, &ctx, &mut writer).unwrap();
        assert_eq!(counter_a.get(), 1);
        assert_eq!(counter_b.get(), 1);
    }
}

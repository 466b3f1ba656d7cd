//! `recstream` command-line front end: wires the CLI's choice of sources,
//! wire format, and mappers into the library's [`recstream::pipeline::run`].
//!
//! The engine itself stays usable as a library independent of this binary
//! -- this file only translates flags into a [`CsvConfig`] and a mapper
//! chain for whatever front end constructs it.

use clap::Parser;
use recstream::error::EngineError;
use recstream::mappers::FractionMapper;
use recstream::parser::{CsvConfig, CsvParser};
use recstream::pipeline::{self, Mapper};
use recstream::source::SourceFile;
use recstream::writer::CsvWriter;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// A streaming record-processing engine for CSV-family tabular data.
#[derive(Parser, Debug)]
#[command(name = "recstream", about = "Stream CSV records through a pipeline of mappers")]
struct Cli {
    /// Input files. With none given, reads a single stream from stdin.
    files: Vec<PathBuf>,

    /// Input (and output) field separator. Supports \n \r \t \\ escapes.
    #[arg(long, default_value = ",")]
    ifs: String,

    /// Input (and output) record separator. Supports \n \r \t \\ escapes.
    #[arg(long, default_value = "\\n")]
    irs: String,

    /// Quote character.
    #[arg(long, default_value = "\"")]
    quote: String,

    /// Treat the first line of every file as data, synthesizing
    /// positional keys ("1", "2", ...) instead of reading a header line.
    #[arg(long)]
    implicit_header: bool,

    /// Buffer each input fully instead of memory-mapping it (required for
    /// stdin and other non-seekable sources; available for files too).
    #[arg(long)]
    stream: bool,

    /// Field names for the `fraction` mapper's ratio-of-total calculation.
    /// Comma-separated. Omit to run the pipeline with no mappers at all.
    #[arg(short = 'f', long = "fraction-field", value_delimiter = ',')]
    fraction_fields: Vec<String>,

    /// Optional group-by field names partitioning the `fraction` mapper's
    /// running sums. Comma-separated.
    #[arg(short = 'g', long = "group-by", value_delimiter = ',')]
    group_by_fields: Vec<String>,
}

/// Expands `\n`, `\r`, `\t`, and `\\` escapes in a separator given on the
/// command line; every other byte (including any literal, unescaped
/// multi-byte sequence the shell passed through) is taken as-is.
fn unescape(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            match bytes[i + 1] {
                b'n' => out.push(b'\n'),
                b'r' => out.push(b'\r'),
                b't' => out.push(b'\t'),
                b'\\' => out.push(b'\\'),
                other => {
                    out.push(b'\\');
                    out.push(other);
                }
            }
            i += 2;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}

fn quote_byte(cli: &Cli) -> u8 {
    unescape(&cli.quote).first().copied().unwrap_or(b'"')
}

fn build_config(cli: &Cli) -> CsvConfig {
    CsvConfig::default().with_ifs(unescape(&cli.ifs)).with_irs(unescape(&cli.irs)).with_quote(quote_byte(cli))
}

fn build_mappers<'src>(cli: &Cli) -> Vec<Box<dyn Mapper<'src> + 'src>> {
    if cli.fraction_fields.is_empty() {
        return Vec::new();
    }
    vec![Box::new(FractionMapper::new(cli.fraction_fields.clone(), cli.group_by_fields.clone()))]
}

fn open_sources(cli: &Cli) -> (Vec<(Arc<str>, SourceFile)>, bool) {
    let mut had_failure = false;
    if cli.files.is_empty() {
        tracing::debug!("no input files given, reading stdin");
        match SourceFile::open_buffered("<stdin>", io::stdin()) {
            Ok(src) => return (vec![(Arc::from("<stdin>"), src)], false),
            Err(err) => {
                tracing::error!("{err}");
                return (Vec::new(), true);
            }
        }
    }

    let mut sources = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let display: Arc<str> = Arc::from(path.display().to_string());
        let opened = if cli.stream {
            std::fs::File::open(path)
                .map_err(|source| EngineError::OpenFailed { path: path.clone(), source })
                .and_then(|f| SourceFile::open_buffered(display.to_string(), f))
        } else {
            SourceFile::open_mapped(path)
        };
        match opened {
            Ok(src) => {
                tracing::debug!(file = %display, "opened source");
                sources.push((display, src));
            }
            Err(err) => {
                tracing::error!("{err}");
                had_failure = true;
            }
        }
    }
    (sources, had_failure)
}

fn run(cli: Cli) -> Result<bool, EngineError> {
    let (sources, mut had_failure) = open_sources(&cli);
    let config = build_config(&cli);
    let parser = CsvParser::new(config, cli.implicit_header);
    let mappers = build_mappers(&cli);

    let out = BufWriter::new(io::stdout());
    let mut writer = CsvWriter::new(out, unescape(&cli.ifs), unescape(&cli.irs), quote_byte(&cli));

    if let Err(err) = pipeline::run(&sources, parser, mappers, &mut writer) {
        tracing::error!("{err}");
        had_failure = true;
    }
    Ok(had_failure)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

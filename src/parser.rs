//! The streaming CSV parser: produces one record's worth of fields from a
//! source region per call, using two token tries (one per quoting context)
//! to recognize separators, quotes, and their end-of-input variants.

use crate::error::{EngineError, Result};
use crate::field::{Field, FieldList};
use crate::header::{HeaderCache, HeaderKeeper};
use crate::record::Record;
use crate::source::SourceFile;
use crate::strbuilder::StringBuilder;
use crate::trie::TokenTrie;
use std::sync::Arc;

/// Wire-format configuration: separators and quote character as byte
/// sequences (rather than single `char`s) so multi-byte separators (e.g.
/// `"\r\n"`) are expressible.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    pub ifs: Vec<u8>,
    pub irs: Vec<u8>,
    pub quote: u8,
}

impl Default for CsvConfig {
    fn default() -> Self {
        CsvConfig { ifs: b",".to_vec(), irs: b"\n".to_vec(), quote: b'"' }
    }
}

impl CsvConfig {
    pub fn with_ifs(mut self, ifs: impl Into<Vec<u8>>) -> Self {
        self.ifs = ifs.into();
        self
    }

    pub fn with_irs(mut self, irs: impl Into<Vec<u8>>) -> Self {
        self.irs = irs.into();
        self
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Eof,
    Irs,
    IfsEof,
    Ifs,
    Dquote,
    DquoteIrs,
    DquoteIfs,
    DquoteEof,
    DquoteDquote,
}

const EOF_BYTE: u8 = crate::source::EOF_SENTINEL;

fn build_tries(config: &CsvConfig) -> (TokenTrie<Token>, TokenTrie<Token>) {
    let mut outside = TokenTrie::new();
    outside.insert(&[EOF_BYTE], Token::Eof);
    outside.insert(&config.irs, Token::Irs);
    let mut ifs_eof = config.ifs.clone();
    ifs_eof.push(EOF_BYTE);
    outside.insert(&ifs_eof, Token::IfsEof);
    outside.insert(&config.ifs, Token::Ifs);
    outside.insert(&[config.quote], Token::Dquote);

    let mut inside = TokenTrie::new();
    inside.insert(&[EOF_BYTE], Token::Eof);
    let mut dquote_irs = vec![config.quote];
    dquote_irs.extend_from_slice(&config.irs);
    inside.insert(&dquote_irs, Token::DquoteIrs);
    let mut dquote_ifs = vec![config.quote];
    dquote_ifs.extend_from_slice(&config.ifs);
    inside.insert(&dquote_ifs, Token::DquoteIfs);
    inside.insert(&[config.quote, EOF_BYTE], Token::DquoteEof);
    inside.insert(&[config.quote, config.quote], Token::DquoteDquote);

    (outside, inside)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingHeader,
    AwaitingData,
    Done,
    Failed,
}

/// Produces records one at a time from a sequence of source files, each of
/// which must outlive `'src`. Header keepers are interned for the lifetime
/// of the parser (i.e. across every file in one run): two files sharing a
/// header schema share one header keeper.
pub struct CsvParser<'src> {
    config: CsvConfig,
    use_implicit_header: bool,
    outside_trie: TokenTrie<Token>,
    inside_trie: TokenTrie<Token>,

    source: Option<&'src SourceFile>,
    pos: usize,
    ilno: u64,
    current_file: Arc<str>,

    expect_header_line_next: bool,
    header_cache: HeaderCache,
    current_header: Option<Arc<HeaderKeeper>>,

    field_list: FieldList<'src>,
    string_builder: StringBuilder,

    pub state: ParserState,
}

impl<'src> CsvParser<'src> {
    pub fn new(config: CsvConfig, use_implicit_header: bool) -> Self {
        let (outside_trie, inside_trie) = build_tries(&config);
        CsvParser {
            config,
            use_implicit_header,
            outside_trie,
            inside_trie,
            source: None,
            pos: 0,
            ilno: 0,
            current_file: Arc::from(""),
            expect_header_line_next: !use_implicit_header,
            header_cache: HeaderCache::new(),
            current_header: None,
            field_list: FieldList::new(),
            string_builder: StringBuilder::new(),
            state: if use_implicit_header { ParserState::AwaitingData } else { ParserState::AwaitingHeader },
        }
    }

    pub fn distinct_schema_count(&self) -> usize {
        self.header_cache.distinct_schema_count()
    }

    /// Start-of-file hook: resets `ilno` and re-arms the header-expectation
    /// flag, but leaves the header-keeper cache untouched so repeated
    /// schemas across files keep sharing one keeper.
    pub fn start_of_file(&mut self, source: &'src SourceFile, filename: Arc<str>) {
        self.source = Some(source);
        self.pos = 0;
        self.ilno = 0;
        self.current_file = filename;
        self.current_header = None;
        self.expect_header_line_next = !self.use_implicit_header;
        self.state = if self.use_implicit_header { ParserState::AwaitingData } else { ParserState::AwaitingHeader };
    }

    fn source(&self) -> &'src SourceFile {
        self.source.expect("parser used before start_of_file")
    }

    fn fail(&mut self, err: EngineError) -> EngineError {
        self.state = ParserState::Failed;
        err
    }

    pub fn parse_next_record(&mut self) -> Result<Option<Record<'src>>> {
        if matches!(self.state, ParserState::Done | ParserState::Failed) {
            return Ok(None);
        }

        if self.expect_header_line_next {
            if !self.scan_fields()? {
                self.state = ParserState::Done;
                return Ok(None);
            }
            self.ilno += 1;
            let raw_fields = self.field_list.take();
            let mut keys: Vec<Arc<str>> = Vec::with_capacity(raw_fields.len());
            for field in raw_fields {
                let s = field.into_owned();
                if s.is_empty() {
                    let file = self.current_file.clone();
                    let line = self.ilno;
                    return Err(self.fail(EngineError::EmptyHeaderKey { file, line }));
                }
                keys.push(Arc::from(s));
            }
            let keeper = self.header_cache.intern(keys);
            self.current_header = Some(keeper);
            self.expect_header_line_next = false;
            self.state = ParserState::AwaitingData;
        }

        if !self.scan_fields()? {
            self.state = ParserState::Done;
            return Ok(None);
        }
        self.ilno += 1;

        let fields = self.field_list.take();
        let record = if self.use_implicit_header {
            let keys: Vec<Arc<str>> =
                (1..=fields.len()).map(|i| Arc::from(i.to_string().into_boxed_str())).collect();
            Record::new(Arc::from(keys.into_boxed_slice()), fields)
        } else {
            let keeper = Arc::clone(
                self.current_header.as_ref().expect("header keeper must be set before data rows"),
            );
            if keeper.len() != fields.len() {
                let file = self.current_file.clone();
                let line = self.ilno;
                let header_len = keeper.len();
                let data_len = fields.len();
                return Err(self.fail(EngineError::HeaderDataMismatch { file, line, header_len, data_len }));
            }
            Record::new(Arc::clone(&keeper.keys), fields)
        };
        self.state = ParserState::AwaitingData;
        Ok(Some(record))
    }

    fn make_borrowed_field(&mut self, p: usize, e: usize) -> Result<Field<'src>> {
        let src = self.source();
        let bytes = &src.bytes()[p..e];
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Field::Borrowed(s)),
            Err(_) => Err(self.mk_invalid_utf8(bytes)),
        }
    }

    fn make_owned_field(&mut self) -> Result<Field<'src>> {
        match self.string_builder.take_string() {
            Ok(s) => Ok(Field::Owned(s)),
            Err(err) => {
                let bytes = err.into_bytes();
                Err(self.mk_invalid_utf8(&bytes))
            }
        }
    }

    /// Builds the fatal error for a field whose bytes aren't valid UTF-8,
    /// carrying a lossy rendering of the offending bytes for the diagnostic.
    fn mk_invalid_utf8(&mut self, bytes: &[u8]) -> EngineError {
        let file = self.current_file.clone();
        let line = self.ilno;
        let field = String::from_utf8_lossy(bytes).into_owned();
        self.fail(EngineError::InvalidUtf8 { file, line, field })
    }

    /// Scans forward from the current position to produce one record's
    /// worth of fields, using the token tries to recognize separators,
    /// quotes, and end-of-input. Returns `Ok(false)` if there was nothing
    /// left to read (clean EOF at a record boundary).
    fn scan_fields(&mut self) -> Result<bool> {
        if self.pos >= self.source().len() {
            return Ok(false);
        }
        let quote = self.config.quote;
        let mut p = self.pos;
        let mut e = p;

        'record: loop {
            if self.source().byte_at(e) != quote {
                // --- unquoted field ---
                'unquoted: loop {
                    let src = self.source();
                    let matched = self.outside_trie.match_at(|pos| src.byte_at(pos), e);
                    match matched {
                        Some((Token::Eof, matchlen)) | Some((Token::Irs, matchlen)) => {
                            let field = self.make_borrowed_field(p, e)?;
                            self.field_list.push(field);
                            self.pos = e + matchlen;
                            return Ok(true);
                        }
                        Some((Token::IfsEof, _)) => {
                            let file = self.current_file.clone();
                            let line = self.ilno;
                            return Err(self.fail(EngineError::RecordEndingFieldSeparator { file, line }));
                        }
                        Some((Token::Ifs, matchlen)) => {
                            let field = self.make_borrowed_field(p, e)?;
                            self.field_list.push(field);
                            e += matchlen;
                            p = e;
                            break 'unquoted;
                        }
                        Some((Token::Dquote, _)) => {
                            let file = self.current_file.clone();
                            let line = self.ilno;
                            return Err(self.fail(EngineError::UnwrappedQuote { file, line }));
                        }
                        Some(_) => {
                            return Err(self.fail(EngineError::Internal(
                                "unexpected token outside quotes",
                            )));
                        }
                        None => {
                            e += 1;
                        }
                    }
                }
                continue 'record;
            }

            // --- quoted field ---
            e += 1; // consume opening quote
            p = e;
            let mut contiguous = true;
            'quoted: loop {
                let src = self.source();
                let matched = self.inside_trie.match_at(|pos| src.byte_at(pos), e);
                match matched {
                    Some((Token::Eof, _)) => {
                        let file = self.current_file.clone();
                        let line = self.ilno;
                        return Err(self.fail(EngineError::ImbalancedQuote { file, line }));
                    }
                    Some((Token::DquoteEof, matchlen)) | Some((Token::DquoteIrs, matchlen)) => {
                        let field = self.finish_quoted_field(p, e, contiguous)?;
                        self.field_list.push(field);
                        self.pos = e + matchlen;
                        return Ok(true);
                    }
                    Some((Token::DquoteIfs, matchlen)) => {
                        let field = self.finish_quoted_field(p, e, contiguous)?;
                        self.field_list.push(field);
                        e += matchlen;
                        p = e;
                        break 'quoted;
                    }
                    Some((Token::DquoteDquote, matchlen)) => {
                        if contiguous {
                            self.string_builder.append_range(&src.bytes()[p..e]);
                            contiguous = false;
                        }
                        self.string_builder.append_byte(quote);
                        e += matchlen;
                    }
                    Some(_) => {
                        return Err(self.fail(EngineError::Internal(
                            "unexpected token inside quotes",
                        )));
                    }
                    None => {
                        if !contiguous {
                            self.string_builder.append_byte(src.byte_at(e));
                        }
                        e += 1;
                    }
                }
            }
            continue 'record;
        }
    }

    /// Finalizes a quoted field: a zero-copy slice if no `""` escape ever
    /// forced copying, otherwise whatever the builder has accumulated.
    fn finish_quoted_field(&mut self, p: usize, e: usize, contiguous: bool) -> Result<Field<'src>> {
        if contiguous {
            self.make_borrowed_field(p, e)
        } else {
            // Every byte since the first `""` escape was already copied in,
            // one at a time, by the unmatched-byte arm below.
            self.make_owned_field()
        }
    }
}

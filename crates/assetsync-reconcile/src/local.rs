//! Local record files.
//!
//! Files are `;`-delimited, `"`-quoted CSV with a mandatory header row.
//! Inside a quoted field a backslash escapes the next byte and both bytes are
//! kept, so `"says \"hi\""` reads as `says \"hi\"`. Key hashes depend on
//! that exact text. Each row is zipped with the header and projected through
//! the provider's column mapping into a [`LocalRecord`] keyed by API attribute.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ParseError;

/// One local row, keyed by API attribute name.
///
/// Mapped columns that the file lacks are present with no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalRecord {
    fields: BTreeMap<String, Option<String>>,
}

impl LocalRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `attribute`, if the attribute is present and has a value.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.fields.get(attribute).and_then(|v| v.as_deref())
    }

    /// Value of `attribute` unless it is missing or blank.
    #[must_use]
    pub fn non_blank(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).filter(|v| !v.trim().is_empty())
    }

    #[must_use]
    pub fn contains(&self, attribute: &str) -> bool {
        self.fields.contains_key(attribute)
    }

    pub fn insert(&mut self, attribute: impl Into<String>, value: Option<String>) {
        self.fields.insert(attribute.into(), value);
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for LocalRecord {
    fn from_iter<T: IntoIterator<Item = (K, Option<String>)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

const DELIMITER: u8 = b';';
const QUOTE: u8 = b'"';
const ESCAPE: u8 = b'\\';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// Escape byte seen inside quotes.
    QuotedEscape,
    /// Quote byte seen inside quotes: doubled quote or end of quoting.
    QuotedQuote,
}

/// Byte filter in front of the CSV reader.
///
/// Rewrites an escaped quote `\"` inside a quoted field to `\""`. The reader
/// then sees a backslash followed by a doubled quote and keeps both, where
/// its own escape handling would drop the backslash.
struct EscapedQuotes<R> {
    inner: R,
    state: QuoteState,
    scratch: Vec<u8>,
    /// Output byte that did not fit the caller's buffer.
    pending: Option<u8>,
}

impl<R: Read> EscapedQuotes<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            state: QuoteState::FieldStart,
            scratch: Vec::new(),
            pending: None,
        }
    }

    /// Feed one input byte; returns the output bytes and how many are used.
    fn step(&mut self, byte: u8) -> ([u8; 2], usize) {
        let boundary = byte == DELIMITER || byte == b'\n' || byte == b'\r';
        let (next, extra) = match self.state {
            QuoteState::FieldStart if byte == QUOTE => (QuoteState::Quoted, false),
            QuoteState::FieldStart | QuoteState::Unquoted | QuoteState::QuotedQuote
                if boundary =>
            {
                (QuoteState::FieldStart, false)
            }
            QuoteState::FieldStart | QuoteState::Unquoted => (QuoteState::Unquoted, false),
            QuoteState::QuotedQuote if byte == QUOTE => (QuoteState::Quoted, false),
            QuoteState::QuotedQuote => (QuoteState::Unquoted, false),
            QuoteState::Quoted if byte == ESCAPE => (QuoteState::QuotedEscape, false),
            QuoteState::Quoted if byte == QUOTE => (QuoteState::QuotedQuote, false),
            QuoteState::Quoted => (QuoteState::Quoted, false),
            QuoteState::QuotedEscape => (QuoteState::Quoted, byte == QUOTE),
        };
        self.state = next;
        if extra {
            ([byte, QUOTE], 2)
        } else {
            ([byte, 0], 1)
        }
    }
}

impl<R: Read> Read for EscapedQuotes<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        if let Some(byte) = self.pending.take() {
            buf[0] = byte;
            written = 1;
        }

        // Every input byte expands to at most two output bytes.
        let want = ((buf.len() - written) / 2).max(1);
        if written == buf.len() {
            return Ok(written);
        }
        self.scratch.resize(want, 0);
        let read = self.inner.read(&mut self.scratch[..want])?;

        for idx in 0..read {
            let (out, len) = self.step(self.scratch[idx]);
            for &byte in &out[..len] {
                if written < buf.len() {
                    buf[written] = byte;
                    written += 1;
                } else {
                    self.pending = Some(byte);
                }
            }
        }
        Ok(written)
    }
}

/// A record file bound to a column mapping.
///
/// [`CsvRecordSource::records`] re-opens the file on every call, so the
/// source can be iterated any number of times.
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
    column_mapping: BTreeMap<String, String>,
}

impl CsvRecordSource {
    /// `column_mapping` maps local column names to API attribute names.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, column_mapping: &BTreeMap<String, String>) -> Self {
        Self {
            path: path.into(),
            column_mapping: column_mapping.clone(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file and read its header.
    ///
    /// Rows are parsed lazily as the returned iterator is advanced.
    pub fn records(&self) -> Result<LocalRecords, ParseError> {
        let file = File::open(&self.path).map_err(|e| ParseError::Open {
            path: self.path.clone(),
            source: csv::Error::from(e),
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(DELIMITER)
            .quote(QUOTE)
            .double_quote(true)
            .escape(None)
            .from_reader(EscapedQuotes::new(file));

        let header: Vec<String> = reader
            .headers()
            .map_err(|source| ParseError::Header {
                path: self.path.clone(),
                source,
            })?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        if header.is_empty() || header.iter().all(String::is_empty) {
            return Err(ParseError::MissingHeader {
                path: self.path.clone(),
            });
        }

        // Duplicate header names resolve to the last column, as a zip into a
        // map would.
        let positions: HashMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();

        let projection: Vec<(String, Option<usize>)> = self
            .column_mapping
            .iter()
            .map(|(column, attribute)| {
                let position = positions.get(column.as_str()).copied();
                if position.is_none() {
                    debug!(
                        file = %self.path.display(),
                        column = %column,
                        "Mapped column absent from file header"
                    );
                }
                (attribute.clone(), position)
            })
            .collect();

        Ok(LocalRecords {
            path: self.path.clone(),
            reader,
            width: header.len(),
            projection,
            row: csv::StringRecord::new(),
            skipped: 0,
            finished: false,
        })
    }
}

/// Lazy iterator over the records of one file.
///
/// Rows whose field count differs from the header's, and rows that are not
/// valid UTF-8, are skipped and counted in [`LocalRecords::skipped_rows`].
pub struct LocalRecords {
    path: PathBuf,
    reader: csv::Reader<EscapedQuotes<File>>,
    width: usize,
    projection: Vec<(String, Option<usize>)>,
    row: csv::StringRecord,
    skipped: usize,
    finished: bool,
}

impl LocalRecords {
    /// Rows skipped so far.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped
    }

    fn project(&self) -> LocalRecord {
        self.projection
            .iter()
            .map(|(attribute, position)| {
                let value = position
                    .and_then(|idx| self.row.get(idx))
                    .map(str::to_string);
                (attribute.clone(), value)
            })
            .collect()
    }
}

impl Iterator for LocalRecords {
    type Item = LocalRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.reader.read_record(&mut self.row) {
                Ok(false) => self.finished = true,
                Ok(true) => {
                    if self.row.len() == self.width {
                        return Some(self.project());
                    }
                    self.skipped += 1;
                    debug!(
                        file = %self.path.display(),
                        line = self.row.position().map(csv::Position::line),
                        fields = self.row.len(),
                        expected = self.width,
                        "Skipping row with mismatched field count"
                    );
                }
                Err(e) if e.is_io_error() => {
                    warn!(file = %self.path.display(), error = %e, "Read error, stopping file");
                    self.finished = true;
                }
                Err(e) => {
                    self.skipped += 1;
                    debug!(file = %self.path.display(), error = %e, "Skipping undecodable row");
                }
            }
        }
        None
    }
}

impl std::fmt::Debug for LocalRecords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRecords")
            .field("path", &self.path)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}

//! Delimited text reader for the raw dataset files.
//!
//! Files are decoded as UTF-8 when valid and as Windows-1252 otherwise,
//! which covers the Latin-1 exports found in the Brazilian dataset.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::table::Table;

use super::source::RawFile;

/// Candidate separators, in tie-break order.
const CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Lines sampled when guessing the separator.
const SNIFF_LINES: usize = 10;

#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Fixed separator; guessed from the first lines when unset.
    pub delimiter: Option<u8>,
    /// Stop after this many data rows.
    pub max_rows: Option<usize>,
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Reads delimited files into tables with inferred column types.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read a file into a table named after its stem.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Table, RawFile)> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| PipelineError::io(path, e))?;
        let mut raw = RawFile::fingerprint(path, &contents);

        let text = match std::str::from_utf8(&contents) {
            Ok(text) => Cow::Borrowed(text),
            Err(_) => {
                raw.encoding = String::from("latin-1");
                encoding_rs::WINDOWS_1252.decode(&contents).0
            }
        };

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => sniff_delimiter(&text).ok_or_else(|| {
                PipelineError::EmptyData(format!("'{}' has no content", raw.file_name()))
            })?,
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let table = self.parse_bytes(&stem, text.as_bytes(), delimiter)?;

        raw.delimiter = delimiter as char;
        raw.rows = table.row_count();
        raw.columns = table.column_count();
        Ok((table, raw))
    }

    /// Read decoded text with a known separator. The first record is the header.
    pub fn parse_bytes(&self, name: &str, bytes: &[u8], delimiter: u8) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_owned())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(PipelineError::EmptyData(format!(
                "no columns found in '{name}'"
            )));
        }
        let headers = unique_headers(headers);

        let limit = self.config.max_rows.unwrap_or(usize::MAX);
        let rows = reader
            .records()
            .take(limit)
            .map(|record| -> Result<Vec<String>> {
                Ok(record?.iter().map(str::to_owned).collect())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Table::from_text_rows(name, headers, rows))
    }
}

/// Suffix repeated header names with `.1`, `.2`, ... so every column is addressable.
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .map(|header| {
            let name = if taken.contains(&header) {
                (1..)
                    .map(|n| format!("{header}.{n}"))
                    .find(|candidate| !taken.contains(candidate))
                    .unwrap_or_default()
            } else {
                header
            };
            taken.insert(name.clone());
            name
        })
        .collect()
}

/// Guess the separator from the first non-blank lines.
///
/// A candidate that splits every sampled line into the same number of
/// fields beats one that does not; within each group more fields win.
fn sniff_delimiter(text: &str) -> Option<u8> {
    let sample: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    if sample.is_empty() {
        return None;
    }

    let ranked = CANDIDATES.iter().filter_map(|&candidate| {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| unquoted_occurrences(line, candidate as char))
            .collect();
        let header = counts[0];
        (header > 0).then(|| {
            let steady = counts.iter().all(|&c| c == header);
            (candidate, (steady, header))
        })
    });

    // max_by_key keeps the last maximum, so walk the candidates in reverse
    // to let earlier ones win ties.
    let best = ranked
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .max_by_key(|&(_, rank)| rank)
        .map(|(candidate, _)| candidate);

    Some(best.unwrap_or(b','))
}

fn unquoted_occurrences(line: &str, separator: char) -> usize {
    line.chars()
        .scan(false, |quoted, ch| {
            if ch == '"' {
                *quoted = !*quoted;
            }
            Some(!*quoted && ch == separator)
        })
        .filter(|&hit| hit)
        .count()
}

//! Delimited interaction rows.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};

/// Prefix carried by DrugBank accession numbers in the input files.
pub const DEFAULT_ID_PREFIX: &str = "DB";

/// One object/precipitant pair, identifiers already stripped of their prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionRow {
    pub line: u64,
    pub object_name: String,
    pub object_id: String,
    pub precipitant_name: String,
    pub precipitant_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRow {
    Row(InteractionRow),
    /// Fewer than four fields
    Malformed { line: u64, fields: usize },
}

impl ParsedRow {
    pub fn line(&self) -> u64 {
        match self {
            Self::Row(row) => row.line,
            Self::Malformed { line, .. } => *line,
        }
    }
}

/// Drop a leading `prefix` from an identifier, if present.
pub fn strip_id_prefix<'a>(id: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return id;
    }
    id.strip_prefix(prefix).unwrap_or(id)
}

/// Parse headerless delimited content into rows. Blank lines are skipped, extra fields ignored.
pub fn parse_rows(content: &str, delimiter: u8, id_prefix: &str) -> Result<Vec<ParsedRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    let mut lines = LineCounter::new(content);
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read record {}", index + 1))?;
        // The reader's own line count skips blank lines
        let line = match record.position() {
            Some(position) => lines.line_at(position.byte() as usize),
            None => index as u64 + 1,
        };

        if record.len() < 4 {
            rows.push(ParsedRow::Malformed {
                line,
                fields: record.len(),
            });
            continue;
        }

        rows.push(ParsedRow::Row(InteractionRow {
            line,
            object_name: record[0].to_string(),
            object_id: strip_id_prefix(&record[1], id_prefix).to_string(),
            precipitant_name: record[2].to_string(),
            precipitant_id: strip_id_prefix(&record[3], id_prefix).to_string(),
        }));
    }
    Ok(rows)
}

/// Maps increasing byte offsets to 1-based physical line numbers.
struct LineCounter<'a> {
    content: &'a [u8],
    offset: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            content: content.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    /// `byte` is where the reader resumed, which precedes any blank lines it discarded.
    fn line_at(&mut self, byte: usize) -> u64 {
        let mut byte = byte.min(self.content.len());
        while matches!(self.content.get(byte), Some(b'\r' | b'\n')) {
            byte += 1;
        }
        if byte > self.offset {
            let newlines = self.content[self.offset..byte]
                .iter()
                .filter(|b| **b == b'\n')
                .count();
            self.line += newlines as u64;
            self.offset = byte;
        }
        self.line
    }
}

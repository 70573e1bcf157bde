use super::state::{AssessmentState, ScoreError};
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One rating parsed from a responses export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEntry {
    pub line: u64,
    pub domain: String,
    pub criterion_index: usize,
    pub level: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseImportError {
    #[error("failed to read responses: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid responses CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {source}")]
    Row { line: u64, source: csv::Error },
    #[error("line {line}: criterion numbers start at 1")]
    CriterionNumber { line: u64 },
    #[error("line {line}: {source}")]
    Rejected { line: u64, source: ScoreError },
}

#[derive(Debug, Deserialize)]
struct ResponseRow {
    #[serde(rename = "Domain")]
    domain: String,
    #[serde(rename = "Criterion")]
    criterion: usize,
    #[serde(rename = "Level", default, deserialize_with = "empty_string_as_none")]
    level: Option<i64>,
}

/// Parses `Domain,Criterion,Level` rows; criterion numbers are 1-based and blank levels skipped.
pub fn parse_responses<R: Read>(mut reader: R) -> Result<Vec<ResponseEntry>, ResponseImportError> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    let lines = LineIndex::new(&input);

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input.as_slice());
    let headers = csv_reader.headers()?.clone();
    let mut entries = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let start = record.position().map_or(0, |position| position.byte());
        let line = lines.line_of_record(start);
        let row: ResponseRow = record
            .deserialize(Some(&headers))
            .map_err(|source| ResponseImportError::Row { line, source })?;
        let Some(level) = row.level else {
            continue;
        };
        let criterion_index = row
            .criterion
            .checked_sub(1)
            .ok_or(ResponseImportError::CriterionNumber { line })?;

        entries.push(ResponseEntry {
            line,
            domain: row.domain,
            criterion_index,
            level,
        });
    }

    Ok(entries)
}

/// Applies every entry or none of them.
pub fn apply_responses(
    state: &mut AssessmentState,
    entries: &[ResponseEntry],
) -> Result<usize, ResponseImportError> {
    let mut staged = state.clone();
    for entry in entries {
        staged
            .set_score(&entry.domain, entry.criterion_index, entry.level)
            .map_err(|source| ResponseImportError::Rejected {
                line: entry.line,
                source,
            })?;
    }
    *state = staged;
    Ok(entries.len())
}

/// Maps byte offsets back to 1-based physical line numbers.
struct LineIndex<'a> {
    input: &'a [u8],
    newlines: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(input: &'a [u8]) -> Self {
        let newlines = input
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .map(|(at, _)| at)
            .collect();
        Self { input, newlines }
    }

    /// The reader reports a record from where it began scanning, which may be a preceding
    /// blank line or the tail of a CRLF; the record itself starts after those breaks.
    fn line_of_record(&self, offset: u64) -> u64 {
        let mut start = usize::try_from(offset).unwrap_or(self.input.len());
        while matches!(self.input.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }
        self.newlines.partition_point(|&at| at < start) as u64 + 1
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("invalid level '{value}': {err}"))),
    }
}

use crate::utils::{Result, TransferError};
use csv::StringRecord;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use tracing::warn;

const RATING_ID_COLUMN: usize = 0;
const RATING_SCORE_COLUMN: usize = 1;
const WATCHLIST_ID_COLUMN: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingEntry {
    pub title_id: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub title_id: String,
}

/// A data row that was dropped while reading an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the file; the header is line 1.
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCsv<T> {
    pub entries: Vec<T>,
    pub skipped: Vec<SkippedRow>,
}

impl<T> Default for ParsedCsv<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> ParsedCsv<T> {
    fn skip(&mut self, path: &Path, line: u64, reason: String) {
        warn!(file = %path.display(), line, reason = %reason, "Skipping malformed row");
        self.skipped.push(SkippedRow { line, reason });
    }
}

/// Reads a ratings export: `title_id, score, ...` after a header row.
///
/// A repeated title keeps its first position and takes the later score.
pub fn read_ratings_csv(path: impl AsRef<Path>) -> Result<ParsedCsv<RatingEntry>> {
    let path = path.as_ref();
    let mut parsed: ParsedCsv<RatingEntry> = ParsedCsv::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in open_records(path)? {
        let (line, record) = match row {
            Ok(row) => row,
            Err(RowError::Fatal(e)) => return Err(e),
            Err(RowError::Malformed { line, reason }) => {
                parsed.skip(path, line, reason);
                continue;
            }
        };

        let title_id = match title_id_at(&record, RATING_ID_COLUMN) {
            Ok(id) => id,
            Err(reason) => {
                parsed.skip(path, line, reason);
                continue;
            }
        };

        let score = match parse_score(record.get(RATING_SCORE_COLUMN)) {
            Ok(score) => score,
            Err(reason) => {
                parsed.skip(path, line, reason);
                continue;
            }
        };

        match positions.get(&title_id) {
            Some(&index) => parsed.entries[index].score = score,
            None => {
                positions.insert(title_id.clone(), parsed.entries.len());
                parsed.entries.push(RatingEntry { title_id, score });
            }
        }
    }

    Ok(parsed)
}

/// Reads a watchlist export, where the title id is the second column.
pub fn read_watchlist_csv(path: impl AsRef<Path>) -> Result<ParsedCsv<WatchlistEntry>> {
    let path = path.as_ref();
    let mut parsed: ParsedCsv<WatchlistEntry> = ParsedCsv::default();
    let mut seen: HashSet<String> = HashSet::new();

    for row in open_records(path)? {
        let (line, record) = match row {
            Ok(row) => row,
            Err(RowError::Fatal(e)) => return Err(e),
            Err(RowError::Malformed { line, reason }) => {
                parsed.skip(path, line, reason);
                continue;
            }
        };

        match title_id_at(&record, WATCHLIST_ID_COLUMN) {
            Ok(title_id) => {
                if seen.insert(title_id.clone()) {
                    parsed.entries.push(WatchlistEntry { title_id });
                }
            }
            Err(reason) => parsed.skip(path, line, reason),
        }
    }

    Ok(parsed)
}

enum RowError {
    Fatal(TransferError),
    Malformed { line: u64, reason: String },
}

/// Yields `(line, record)` pairs. Callers stop at the first `RowError::Fatal`.
fn open_records(
    path: &Path,
) -> Result<impl Iterator<Item = std::result::Result<(u64, StringRecord), RowError>>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TransferError::FileNotFound(path.display().to_string()),
        _ => TransferError::IoError(e),
    })?;

    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    Ok(reader.into_records().map(|result| match result {
        Ok(record) => {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            Ok((line, record))
        }
        Err(e) if e.is_io_error() => Err(RowError::Fatal(TransferError::CsvError(e))),
        Err(e) => {
            let line = e.position().map(|p| p.line()).unwrap_or_default();
            Err(RowError::Malformed {
                line,
                reason: e.to_string(),
            })
        }
    }))
}

fn title_id_at(record: &StringRecord, column: usize) -> std::result::Result<String, String> {
    match record.get(column).map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        Some(_) => Err(format!("empty title id in column {}", column + 1)),
        None => Err(format!("missing column {}", column + 1)),
    }
}

fn parse_score(field: Option<&str>) -> std::result::Result<u8, String> {
    let raw = field
        .map(str::trim)
        .ok_or_else(|| format!("missing column {}", RATING_SCORE_COLUMN + 1))?;
    let score: i64 = raw
        .parse()
        .map_err(|_| format!("score {:?} is not an integer", raw))?;

    match u8::try_from(score) {
        Ok(score) if (1..=10).contains(&score) => Ok(score),
        _ => Err(format!("score {} is outside 1-10", score)),
    }
}

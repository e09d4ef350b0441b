use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use logging_timer::time;

use crate::error::{Error, Result};
use crate::types::AnswerKey;

pub const DEFAULT_KEY_DELIMITER: char = ',';

/// Where an answer key comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerKeySource {
    /// A delimited text file on disk.
    Path(PathBuf),
    /// Delimited text already in memory.
    Text(String),
}

impl AnswerKeySource {
    /// Reads and parses the key, requiring exactly `rows` lines of `cols`
    /// fields each.
    pub fn load(&self, rows: usize, cols: usize, delimiter: char) -> Result<AnswerKey> {
        match self {
            AnswerKeySource::Path(path) => load_answer_key(path, rows, cols, delimiter),
            AnswerKeySource::Text(text) => parse_answer_key(text, rows, cols, delimiter),
        }
    }
}

impl From<&Path> for AnswerKeySource {
    fn from(path: &Path) -> Self {
        AnswerKeySource::Path(path.to_path_buf())
    }
}

fn parse_field(field: &str, line: usize, column: usize) -> Result<bool> {
    match field.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(Error::KeyFormat {
            line,
            column,
            found: other.to_string(),
        }),
    }
}

/// Parses an answer key from delimited text: one row per line, one `0` or
/// `1` per field. Blank lines are ignored. The key must have exactly `rows`
/// rows of `cols` fields; it is never padded or truncated.
pub fn parse_answer_key(text: &str, rows: usize, cols: usize, delimiter: char) -> Result<AnswerKey> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut parsed = Vec::with_capacity(rows);
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_number = index + 1;

        let row = line
            .split(delimiter)
            .enumerate()
            .map(|(column, field)| parse_field(field, line_number, column + 1))
            .collect::<Result<Vec<bool>>>()?;

        if row.len() != cols {
            return Err(Error::KeyShape {
                expected_rows: rows,
                expected_cols: cols,
                found: format!("line {} has {} fields", line_number, row.len()),
            });
        }
        parsed.push(row);
    }

    if parsed.len() != rows {
        return Err(Error::KeyShape {
            expected_rows: rows,
            expected_cols: cols,
            found: format!("found {} rows", parsed.len()),
        });
    }

    // every row was checked against `cols` above
    AnswerKey::from_rows(parsed).ok_or_else(|| Error::KeyShape {
        expected_rows: rows,
        expected_cols: cols,
        found: "ragged rows".to_string(),
    })
}

/// Reads an answer key from any reader. See [`parse_answer_key`] for the
/// format; the input must be UTF-8.
pub fn read_answer_key<R: Read>(
    mut reader: R,
    rows: usize,
    cols: usize,
    delimiter: char,
) -> Result<AnswerKey> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(Error::KeyRead)?;
    parse_answer_key(&text, rows, cols, delimiter)
}

/// Reads an answer key file. See [`parse_answer_key`] for the format.
#[time]
pub fn load_answer_key(path: &Path, rows: usize, cols: usize, delimiter: char) -> Result<AnswerKey> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let key = read_answer_key(BufReader::new(file), rows, cols, delimiter)?;
    log::debug!(
        "loaded {}x{} answer key from {}",
        rows,
        cols,
        path.display()
    );
    Ok(key)
}

//! Dataset loading from a URL or a local file.
//!
//! The source must be comma-separated text with a header row. Records shorter
//! than the header are padded with empty (missing) cells; records longer than
//! the header cannot be aligned to column names and fail the load.

use super::RawTable;
use crate::error::{PipelineError, Result};
use csv::ReaderBuilder;
use std::fmt;
use std::path::PathBuf;

/// Where the dataset comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// HTTP(S) endpoint serving CSV.
    Url(String),
    /// CSV file on the local filesystem.
    File(PathBuf),
}

impl DataSource {
    /// Classify a locator: `http://` and `https://` prefixes are URLs,
    /// anything else is a filesystem path.
    pub fn parse(locator: &str) -> Self {
        let lower = locator.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(locator.to_string())
        } else {
            DataSource::File(PathBuf::from(locator))
        }
    }

    fn unavailable(&self, reason: impl ToString) -> PipelineError {
        PipelineError::SourceUnavailable {
            locator: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{url}"),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch and parse the dataset.
pub fn load(source: &DataSource) -> Result<RawTable> {
    let bytes = fetch(source)?;
    let table = parse_csv(source, &bytes)?;
    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.records().len(),
        table.columns.len(),
        source
    );
    Ok(table)
}

fn fetch(source: &DataSource) -> Result<Vec<u8>> {
    match source {
        DataSource::Url(url) => {
            log::debug!("GET {url}");
            let response = reqwest::blocking::get(url)
                .and_then(|r| r.error_for_status())
                .map_err(|e| source.unavailable(e))?;
            let body = response.bytes().map_err(|e| source.unavailable(e))?;
            Ok(body.to_vec())
        }
        DataSource::File(path) => std::fs::read(path).map_err(|e| source.unavailable(e)),
    }
}

/// Parse comma-separated bytes with a header row. Invalid UTF-8 is replaced
/// rather than rejected.
pub(crate) fn parse_csv(source: &DataSource, bytes: &[u8]) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = rdr
        .byte_headers()
        .map_err(|e| source.unavailable(e))?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(source.unavailable("no header row"));
    }

    let width = columns.len();
    let mut records = Vec::new();
    for (i, result) in rdr.byte_records().enumerate() {
        let record = result.map_err(|e| source.unavailable(e))?;
        if record.len() > width {
            return Err(source.unavailable(format!(
                "record {} has {} fields, header has {}",
                i + 1,
                record.len(),
                width
            )));
        }
        let mut row: Vec<String> = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect();
        row.resize(width, String::new());
        records.push(row);
    }

    Ok(RawTable::new(columns, records))
}

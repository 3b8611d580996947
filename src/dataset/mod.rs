//! Tabular data containers.
//!
//! Two table shapes flow through the pipeline:
//!
//! - [`RawTable`]: header plus string records exactly as the source delivered them.
//! - [`Frame`]: named columns over an `Array2<f64>`, where `NaN` marks a missing cell.
//!
//! Both implement [`Tabular`], which is what the first cleaning stage consumes.
//! Cleaning an already-clean [`Frame`] therefore goes through the same code
//! path as cleaning freshly loaded text.
//!
//! After the label is split off, features travel as a [`FeatureMatrix`] and
//! labels as a plain `Array1<f64>`.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};

pub mod loader;
pub use self::loader::{load, DataSource};

/// Label vector, values in {0, 1}.
pub type Labels = Array1<f64>;

/// Text tokens read as a missing value.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single table cell, viewed uniformly across table representations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cell<'a> {
    /// No value.
    Missing,
    /// A numeric value; may be infinite.
    Number(f64),
    /// Text that does not parse as a number.
    Text(&'a str),
}

impl<'a> Cell<'a> {
    /// Interpret a raw text field.
    pub fn parse(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if MISSING_TOKENS.contains(&trimmed) {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_nan() => Cell::Missing,
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(trimmed),
        }
    }
}

/// Uniform read access to a table with a header row.
pub trait Tabular {
    /// Column names in order.
    fn columns(&self) -> &[String];

    /// Number of data rows.
    fn n_rows(&self) -> usize;

    /// Number of cells actually present in `row`.
    fn row_width(&self, row: usize) -> usize;

    /// Cell at (`row`, `col`). Callers must stay within `row_width(row)`.
    fn cell(&self, row: usize, col: usize) -> Cell<'_>;
}

/// Header and string records as read from a delimited source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    records: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from a header and records. Records are not checked
    /// against the header width; that is the cleaner's job.
    pub fn new(columns: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { columns, records }
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }
}

impl Tabular for RawTable {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn n_rows(&self) -> usize {
        self.records.len()
    }

    fn row_width(&self, row: usize) -> usize {
        self.records[row].len()
    }

    fn cell(&self, row: usize, col: usize) -> Cell<'_> {
        Cell::parse(&self.records[row][col])
    }
}

/// Numeric table with named columns. `NaN` marks a missing cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    data: Array2<f64>,
}

impl Frame {
    /// Create a frame; the column count of `data` must match `columns`.
    pub fn new(columns: Vec<String>, data: Array2<f64>) -> Result<Self> {
        if columns.len() != data.ncols() {
            return Err(PipelineError::shape(
                format!("{} columns", columns.len()),
                format!("{} columns", data.ncols()),
            ));
        }
        Ok(Self { columns, data })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    /// Position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn into_parts(self) -> (Vec<String>, Array2<f64>) {
        (self.columns, self.data)
    }
}

impl Tabular for Frame {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    fn row_width(&self, _row: usize) -> usize {
        self.data.ncols()
    }

    fn cell(&self, row: usize, col: usize) -> Cell<'_> {
        let v = self.data[[row, col]];
        if v.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(v)
        }
    }
}

/// Feature columns with their names. Column order is fixed from here on.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }
}

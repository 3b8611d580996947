//! Two-stage table cleaning.
//!
//! Stage A ([`clean_data`]) drops incomplete and non-finite rows and casts the
//! rest to `f64`. Stage B ([`clean_data1`]) fills anything still missing with
//! [`MISSING_SENTINEL`] and separates the label column from the features.
//!
//! After stage A no missing or infinite value survives, so the replacement
//! and fill in stage B only matter for frames that never went through stage A.

use crate::config::LABEL_COLUMN;
use crate::dataset::{Cell, FeatureMatrix, Frame, Labels, Tabular};
use crate::error::{PipelineError, Result};
use ndarray::{Array2, Axis};

/// Fill value for cells that are still missing in stage B.
pub const MISSING_SENTINEL: f64 = -99999.0;

/// Stage A: keep only complete, finite, numeric rows.
///
/// Rows with any missing cell are dropped first; among the remaining rows,
/// any row holding `±inf` is dropped. A surviving cell that is not numeric,
/// or a row whose width differs from the header, is a [`PipelineError::TypeInput`].
pub fn clean_data<T: Tabular + ?Sized>(table: &T) -> Result<Frame> {
    let columns = table.columns().to_vec();
    let width = columns.len();
    if width == 0 {
        return Err(PipelineError::TypeInput("table has no columns".to_string()));
    }

    let n_rows = table.n_rows();
    let mut values = Vec::with_capacity(n_rows * width);
    let mut kept = 0usize;
    let mut dropped_missing = 0usize;
    let mut dropped_non_finite = 0usize;

    let mut row_values = Vec::with_capacity(width);
    for row in 0..n_rows {
        if table.row_width(row) != width {
            return Err(PipelineError::TypeInput(format!(
                "row {} has {} cells, header has {}",
                row,
                table.row_width(row),
                width
            )));
        }

        row_values.clear();
        let mut missing = false;
        let mut non_finite = false;
        let mut text: Option<(usize, String)> = None;
        for col in 0..width {
            match table.cell(row, col) {
                Cell::Missing => missing = true,
                Cell::Number(v) => {
                    non_finite |= !v.is_finite();
                    row_values.push(v);
                }
                Cell::Text(t) => {
                    if text.is_none() {
                        text = Some((col, t.to_string()));
                    }
                    row_values.push(f64::NAN);
                }
            }
        }

        if missing {
            dropped_missing += 1;
            continue;
        }
        if non_finite {
            dropped_non_finite += 1;
            continue;
        }
        if let Some((col, t)) = text {
            return Err(PipelineError::TypeInput(format!(
                "column '{}' row {}: '{}' is not numeric",
                columns[col], row, t
            )));
        }
        values.extend_from_slice(&row_values);
        kept += 1;
    }

    if dropped_missing + dropped_non_finite > 0 {
        log::warn!(
            "Dropped {} rows with missing values and {} rows with non-finite values",
            dropped_missing,
            dropped_non_finite
        );
    }
    log::info!("Cleaning kept {kept} of {n_rows} rows");

    let data = Array2::from_shape_vec((kept, width), values)
        .map_err(|e| PipelineError::TypeInput(e.to_string()))?;
    Frame::new(columns, data)
}

/// Stage B: sentinel-fill and split the label column off.
///
/// Infinite values become missing, every missing value becomes
/// [`MISSING_SENTINEL`], and the `Outcome` column is returned separately.
pub fn clean_data1(frame: Frame) -> Result<(FeatureMatrix, Labels)> {
    let label_idx = frame
        .column_index(LABEL_COLUMN)
        .ok_or_else(|| PipelineError::MissingColumn(LABEL_COLUMN.to_string()))?;

    let (columns, mut data) = frame.into_parts();
    replace_infinite_with_missing(&mut data);
    fill_missing(&mut data, MISSING_SENTINEL);

    let labels = data.column(label_idx).to_owned();
    let feature_idx: Vec<usize> = (0..columns.len()).filter(|&c| c != label_idx).collect();
    let values = data.select(Axis(1), &feature_idx);
    let names = feature_idx.iter().map(|&c| columns[c].clone()).collect();

    Ok((FeatureMatrix { names, values }, labels))
}

fn replace_infinite_with_missing(data: &mut Array2<f64>) {
    data.mapv_inplace(|v| if v.is_infinite() { f64::NAN } else { v });
}

fn fill_missing(data: &mut Array2<f64>, value: f64) {
    data.mapv_inplace(|v| if v.is_nan() { value } else { v });
}

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{AnswerKey, BoundingBox, BubbleMatrix};

/// Everything learned from evaluating one sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Degrees of counter-clockwise rotation applied to deskew the sheet.
    pub rotation_angle: f64,
    pub grid_region: BoundingBox,
    pub bubble_matrix: BubbleMatrix,
    /// Number of cells where the sheet agrees with the key.
    pub score: usize,
    pub total: usize,
}

/// Counts the cells where `matrix` and `key` agree, whether both filled or
/// both empty. Returns `(score, total)`.
pub fn score(matrix: &BubbleMatrix, key: &AnswerKey) -> Result<(usize, usize)> {
    if matrix.shape() != key.shape() {
        return Err(Error::ShapeMismatch {
            matrix_rows: matrix.rows(),
            matrix_cols: matrix.cols(),
            key_rows: key.rows(),
            key_cols: key.cols(),
        });
    }

    let matching = matrix
        .cells()
        .iter()
        .zip(key.cells())
        .filter(|(read, expected)| read == expected)
        .count();
    Ok((matching, matrix.rows() * matrix.cols()))
}

/// Lists the `(row, col)` positions where the sheet and key disagree.
pub fn mismatches(matrix: &BubbleMatrix, key: &AnswerKey) -> Vec<(usize, usize)> {
    let cols = matrix.cols().max(1);
    matrix
        .cells()
        .iter()
        .zip(key.cells())
        .enumerate()
        .filter(|(_, (read, expected))| read != expected)
        .map(|(i, _)| (i / cols, i % cols))
        .collect()
}

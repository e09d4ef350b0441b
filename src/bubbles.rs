use image::GrayImage;
use logging_timer::time;

use crate::error::{Error, Result};
use crate::image_utils::mean_intensity;
use crate::types::{BoundingBox, BubbleMatrix};

/// Cells whose mean intensity is below this read as filled.
pub const DEFAULT_FILL_THRESHOLD: f64 = 127.0;

/// Computes the region covered by cell `(row, col)` of a `rows`x`cols`
/// tiling of a `width`x`height` image. Cells are `width / cols` by
/// `height / rows` pixels; the last row and column absorb the remainder.
pub fn cell_bounds(
    (width, height): (u32, u32),
    (rows, cols): (usize, usize),
    (row, col): (usize, usize),
) -> BoundingBox {
    let cell_width = width / cols as u32;
    let cell_height = height / rows as u32;
    let x = col as u32 * cell_width;
    let y = row as u32 * cell_height;
    BoundingBox {
        x,
        y,
        width: if col + 1 == cols { width - x } else { cell_width },
        height: if row + 1 == rows { height - y } else { cell_height },
    }
}

/// Mean intensity of every cell, row-major.
pub fn cell_means(grid: &GrayImage, rows: usize, cols: usize) -> Result<Vec<f64>> {
    let (width, height) = grid.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidGrid {
            reason: format!("grid region is empty ({}x{})", width, height),
        });
    }
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidGrid {
            reason: format!("cannot split a grid into {}x{} cells", rows, cols),
        });
    }
    if (height as usize) < rows || (width as usize) < cols {
        return Err(Error::InvalidGrid {
            reason: format!(
                "{}x{} pixel grid region is too small for {} rows and {} columns",
                width, height, rows, cols
            ),
        });
    }

    let mut means = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let bounds = cell_bounds((width, height), (rows, cols), (row, col));
            let mean = mean_intensity(grid, bounds).ok_or_else(|| Error::InvalidGrid {
                reason: format!("cell ({}, {}) covers no pixels", row, col),
            })?;
            log::trace!("cell ({}, {}) {:?} mean {:.1}", row, col, bounds, mean);
            means.push(mean);
        }
    }
    Ok(means)
}

/// Reads which bubbles of the grid are filled. A cell is filled when its
/// mean intensity is below `fill_threshold`.
#[time]
pub fn classify_bubbles(
    grid: &GrayImage,
    rows: usize,
    cols: usize,
    fill_threshold: f64,
) -> Result<BubbleMatrix> {
    let means = cell_means(grid, rows, cols)?;
    let mut matrix = BubbleMatrix::new(rows, cols);
    for (i, mean) in means.into_iter().enumerate() {
        matrix.set(i / cols, i % cols, mean < fill_threshold);
    }
    log::debug!(
        "{} of {} bubbles filled",
        matrix.count_filled(),
        rows * cols
    );
    Ok(matrix)
}

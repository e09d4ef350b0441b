use std::path::{Path, PathBuf};

use logging_timer::time;
use rayon::prelude::*;

use crate::answer_key::AnswerKeySource;
use crate::bubbles::classify_bubbles;
use crate::config::Options;
use crate::debug::{draw_cells_debug_image, draw_grid_region_debug_image, ImageDebugWriter};
use crate::error::Result;
use crate::grid::locate_grid;
use crate::image_utils::{load_image, load_image_from_memory, RasterImage};
use crate::orientation::correct_orientation;
use crate::score::{mismatches, score, ScoreResult};
use crate::types::AnswerKey;

pub type BatchResult = Vec<(PathBuf, Result<ScoreResult>)>;

/// Runs the full pipeline on an already decoded sheet: deskew, locate the
/// grid, read the bubbles and compare them to `key`.
#[time]
pub fn evaluate_sheet(
    img: &RasterImage,
    rows: usize,
    cols: usize,
    key: &AnswerKey,
    options: &Options,
    debug: &ImageDebugWriter,
) -> Result<ScoreResult> {
    let orientation = correct_orientation(img, options.blur_sigma)?;
    debug.write("rectified", || orientation.image.to_rgb());

    let grid = locate_grid(&orientation.image, &options.edge_thresholds())?;
    debug.write("grid", || {
        draw_grid_region_debug_image(&orientation.image, grid.bounds)
    });

    let bubble_matrix = classify_bubbles(&grid.image.to_gray(), rows, cols, options.fill_threshold)?;
    debug.write("cells", || {
        draw_cells_debug_image(&grid.image, &bubble_matrix, key)
    });

    let (score, total) = score(&bubble_matrix, key)?;
    log::debug!("cells disagreeing with key: {:?}", mismatches(&bubble_matrix, key));
    log::info!(
        "score {}/{} (rotation {:.2}°, grid {:?})",
        score,
        total,
        orientation.angle,
        grid.bounds
    );

    Ok(ScoreResult {
        rotation_angle: orientation.angle,
        grid_region: grid.bounds,
        bubble_matrix,
        score,
        total,
    })
}

/// Evaluates one encoded sheet image against an answer key.
pub fn evaluate(
    image_bytes: &[u8],
    rows: usize,
    cols: usize,
    key_source: &AnswerKeySource,
    options: &Options,
) -> Result<ScoreResult> {
    let img = load_image_from_memory(image_bytes)?;
    let key = key_source.load(rows, cols, options.key_delimiter)?;
    evaluate_sheet(
        &img,
        rows,
        cols,
        &key,
        options,
        &ImageDebugWriter::disabled(),
    )
}

/// Evaluates a sheet image file. With `debug` set, intermediate images are
/// written next to the input.
pub fn evaluate_path(
    image_path: &Path,
    rows: usize,
    cols: usize,
    key: &AnswerKey,
    options: &Options,
    debug: bool,
) -> Result<ScoreResult> {
    let img = load_image(image_path)?;
    let debug = if debug {
        ImageDebugWriter::new(image_path.to_path_buf())
    } else {
        ImageDebugWriter::disabled()
    };
    evaluate_sheet(&img, rows, cols, key, options, &debug)
}

/// Evaluates many sheets in parallel against the same key. Results are
/// returned in input order; one sheet failing does not affect the others.
#[time]
pub fn evaluate_batch(
    image_paths: &[PathBuf],
    rows: usize,
    cols: usize,
    key: &AnswerKey,
    options: &Options,
    debug: bool,
) -> BatchResult {
    image_paths
        .par_iter()
        .map(|path| {
            let result = evaluate_path(path, rows, cols, key, options, debug);
            if let Err(e) = &result {
                log::warn!("{}: {} failed: {}", path.display(), e.stage(), e);
            }
            (path.clone(), result)
        })
        .collect()
}

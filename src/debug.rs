use std::path::{Path, PathBuf};

use image::RgbImage;
use imageproc::drawing::{draw_cross_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::bubbles::cell_bounds;
use crate::image_utils::{RasterImage, BLUE, DARK_GREEN, GREEN, RED};
use crate::types::{AnswerKey, BoundingBox, BubbleMatrix};

/// Creates a path for a debug image.
pub fn debug_image_path(base: &Path, label: &str) -> PathBuf {
    let mut result = PathBuf::from(base);
    result.set_file_name(format!(
        "{}_debug_{}.png",
        base.file_stem().unwrap_or_default().to_string_lossy(),
        label
    ));
    result
}

/// Writes intermediate pipeline images beside the input image. A disabled
/// writer never renders anything.
#[derive(Debug, Clone)]
pub struct ImageDebugWriter {
    input_path: Option<PathBuf>,
}

impl ImageDebugWriter {
    pub fn new(input_path: PathBuf) -> Self {
        Self {
            input_path: Some(input_path),
        }
    }

    pub fn disabled() -> Self {
        Self { input_path: None }
    }

    /// Renders and saves a debug image. Failing to save is logged, never
    /// fatal.
    pub fn write(&self, label: &str, draw: impl FnOnce() -> RgbImage) {
        if let Some(input_path) = &self.input_path {
            let path = debug_image_path(input_path, label);
            match draw().save(&path) {
                Ok(()) => log::debug!("wrote debug image {}", path.display()),
                Err(e) => log::warn!("unable to write debug image {}: {}", path.display(), e),
            }
        }
    }
}

/// Draws the corrected sheet with the located grid outlined.
pub fn draw_grid_region_debug_image(img: &RasterImage, bounds: BoundingBox) -> RgbImage {
    let mut canvas = img.to_rgb();
    let rect = Rect::from(bounds);
    draw_hollow_rect_mut(&mut canvas, rect, GREEN);
    if bounds.width > 2 && bounds.height > 2 {
        let inset = Rect::at(rect.left() + 1, rect.top() + 1).of_size(bounds.width - 2, bounds.height - 2);
        draw_hollow_rect_mut(&mut canvas, inset, GREEN);
    }
    canvas
}

/// Draws the cell tiling over the grid image. Filled cells get a cross,
/// and cells that disagree with the key are outlined in red.
pub fn draw_cells_debug_image(grid: &RasterImage, matrix: &BubbleMatrix, key: &AnswerKey) -> RgbImage {
    let mut canvas = grid.to_rgb();
    let (rows, cols) = matrix.shape();

    for row in 0..rows {
        for col in 0..cols {
            let bounds = cell_bounds(canvas.dimensions(), (rows, cols), (row, col));
            if bounds.width == 0 || bounds.height == 0 {
                continue;
            }
            let filled = matrix.get(row, col).unwrap_or(false);
            let agrees = key.get(row, col).map_or(true, |expected| expected == filled);

            draw_hollow_rect_mut(
                &mut canvas,
                Rect::from(bounds),
                if agrees { BLUE } else { RED },
            );
            if filled {
                draw_cross_mut(
                    &mut canvas,
                    DARK_GREEN,
                    (bounds.x + bounds.width / 2) as i32,
                    (bounds.y + bounds.height / 2) as i32,
                );
            }
        }
    }

    canvas
}

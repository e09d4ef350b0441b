use image::GrayImage;
use imageproc::contrast::otsu_level;
use imageproc::point::Point;
use logging_timer::time;

use crate::error::{Error, Result};
use crate::geometry::min_area_rect;
use crate::image_utils::{binarize_inverted, smooth, RasterImage, WHITE};
use crate::transform::rotate_image;

/// A deskewed image and the rotation that was applied to produce it.
#[derive(Clone, Debug)]
pub struct OrientationResult {
    pub image: RasterImage,
    /// Degrees of counter-clockwise rotation applied, in `(-45, 45]`.
    pub angle: f64,
}

/// Separates ink from paper. Returns the binarized image (foreground white)
/// along with the Otsu level used, or `None` if the image holds a single
/// intensity and so has nothing to separate.
pub fn foreground_mask(gray: &GrayImage, blur_sigma: f32) -> Option<(GrayImage, u8)> {
    let blurred = smooth(gray, blur_sigma);
    let mut pixels = blurred.pixels().map(|p| p.0[0]);
    let first = pixels.next()?;
    if pixels.all(|value| value == first) {
        return None;
    }

    let level = otsu_level(&blurred);
    Some((binarize_inverted(&blurred, level), level))
}

/// Coordinates of every foreground pixel of a binarized image.
pub fn foreground_points(binary: &GrayImage) -> Vec<Point<i32>> {
    binary
        .enumerate_pixels()
        .filter(|(_, _, pixel)| **pixel == WHITE)
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect()
}

/// Maps a rectangle angle in `[-90, 0)` to the smallest rotation that makes
/// the rectangle axis-aligned, in `(-45, 45]`.
pub fn skew_from_rect_angle(rect_angle: f64) -> f64 {
    let skew = if rect_angle < -45.0 {
        -(90.0 + rect_angle)
    } else {
        -rect_angle
    };
    // keep an axis-aligned sheet at +0 rather than -0
    skew + 0.0
}

/// Estimates the skew of the marks on a sheet from the minimum-area
/// rectangle around all of its ink.
pub fn estimate_skew(gray: &GrayImage, blur_sigma: f32) -> Result<f64> {
    let empty = || Error::EmptyForeground {
        width: gray.width(),
        height: gray.height(),
    };

    let (binary, level) = foreground_mask(gray, blur_sigma).ok_or_else(empty)?;
    let points = foreground_points(&binary);
    log::debug!(
        "otsu level {}, {} foreground pixels",
        level,
        points.len()
    );

    let rect = min_area_rect(&points).ok_or_else(empty)?;
    log::trace!("minimum-area rect: {:?}", rect);
    Ok(skew_from_rect_angle(rect.angle))
}

/// Removes skew from a scanned sheet. The returned image has the same
/// dimensions as the input; pixels rotated in from outside the canvas
/// replicate the nearest border pixel.
#[time]
pub fn correct_orientation(img: &RasterImage, blur_sigma: f32) -> Result<OrientationResult> {
    let angle = estimate_skew(&img.to_gray(), blur_sigma)?;
    log::debug!("rotating by {:.3} degrees", angle);

    let image = rotate_image(img, angle);
    Ok(OrientationResult { image, angle })
}

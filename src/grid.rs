use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::edges::canny;
use logging_timer::time;

use crate::error::{Error, Result};
use crate::geometry::{get_contour_bounding_box, polygon_area};
use crate::image_utils::{smooth, RasterImage};
use crate::types::BoundingBox;

pub const DEFAULT_CANNY_LOW: f32 = 50.0;
pub const DEFAULT_CANNY_HIGH: f32 = 200.0;

/// Parameters for edge detection during grid location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeThresholds {
    pub blur_sigma: f32,
    pub low: f32,
    pub high: f32,
}

impl EdgeThresholds {
    /// Whether Canny can run with these hysteresis thresholds.
    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }
}

/// The located answer grid: where it sits in the corrected image, and the
/// pixels it covers.
#[derive(Clone, Debug)]
pub struct GridRegion {
    pub bounds: BoundingBox,
    pub image: RasterImage,
}

/// Finds the outermost contours of an edge map, i.e. outer borders that are
/// not nested inside any other border.
pub fn find_external_contours(edges: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .collect()
}

/// Picks the contour enclosing the greatest area. The first contour wins a
/// tie, and a contour enclosing no area never qualifies.
pub fn largest_contour(contours: &[Contour<i32>]) -> Option<(&Contour<i32>, f64)> {
    contours
        .iter()
        .map(|contour| (contour, polygon_area(&contour.points)))
        .filter(|(_, area)| *area > 0.0)
        .fold(None, |best, (contour, area)| match best {
            Some((_, best_area)) if area <= best_area => best,
            _ => Some((contour, area)),
        })
}

/// Locates the answer grid as the bounding box of the largest contour in the
/// image's edge map.
///
/// This assumes the grid is the most prominent enclosed shape on the page; a
/// larger box such as a header or photo will be picked instead.
#[time]
pub fn locate_grid(img: &RasterImage, thresholds: &EdgeThresholds) -> Result<GridRegion> {
    if !thresholds.is_valid() {
        return Err(Error::InvalidEdgeThresholds {
            low: thresholds.low,
            high: thresholds.high,
        });
    }

    let gray = img.to_gray();
    let edges = canny(
        &smooth(&gray, thresholds.blur_sigma),
        thresholds.low,
        thresholds.high,
    );

    let contours = find_external_contours(&edges);
    log::debug!("found {} external contours", contours.len());

    let not_found = || Error::GridNotFound {
        width: img.width(),
        height: img.height(),
    };
    let (contour, area) = largest_contour(&contours).ok_or_else(not_found)?;
    let bounds = get_contour_bounding_box(contour).ok_or_else(not_found)?;
    log::debug!("grid contour area {:.1}, bounds {:?}", area, bounds);

    Ok(GridRegion {
        bounds,
        image: img.crop(bounds),
    })
}

use imageproc::contours::Contour;
use imageproc::geometry;
use imageproc::point::Point;

use crate::types::BoundingBox;

/// A rectangle that may be rotated relative to the image axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedRect {
    pub center: Point<f64>,
    pub width: f64,
    pub height: f64,
    /// Angle of the rectangle in degrees, in `[-90, 0)`. Measured
    /// counter-clockwise as displayed, i.e. with the y axis pointing up.
    pub angle: f64,
}

impl RotatedRect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Convex hull of a point set, as floating-point coordinates. Repeated
/// points are removed first so the hull's angular sort never compares a
/// point with a copy of itself.
pub fn convex_hull(points: &[Point<i32>]) -> Vec<Point<f64>> {
    let mut unique = points
        .iter()
        .map(|p| (p.x, p.y))
        .collect::<Vec<(i32, i32)>>();
    unique.sort_unstable();
    unique.dedup();

    let unique = unique
        .into_iter()
        .map(|(x, y)| Point::new(x, y))
        .collect::<Vec<Point<i32>>>();
    geometry::convex_hull(&unique)
        .into_iter()
        .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
        .collect()
}

/// Folds an angle in degrees into `[-90, 0)`. A rectangle looks the same
/// after a quarter turn, so its angle is only defined modulo 90°.
fn normalize_rect_angle(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(90.0);
    // rem_euclid rounds tiny negative inputs up to exactly 90
    if folded == 0.0 || folded >= 90.0 {
        -90.0
    } else {
        folded - 90.0
    }
}

/// Finds the minimum-area rectangle enclosing all the points.
///
/// One side of the optimal rectangle is always collinear with an edge of the
/// convex hull, so each hull edge is tried in turn, including the edge that
/// closes the hull. Unlike `imageproc::geometry::min_area_rect` this keeps
/// the exact edge angle rather than integer corners. Returns `None` for an
/// empty point set.
pub fn min_area_rect(points: &[Point<i32>]) -> Option<RotatedRect> {
    let hull = convex_hull(points);
    match hull.len() {
        0 => return None,
        1 => {
            return Some(RotatedRect {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle: -90.0,
            })
        }
        _ => {}
    }

    let mut best: Option<(f64, RotatedRect)> = None;
    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let edge_length = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        if edge_length == 0.0 {
            continue;
        }
        let (ux, uy) = ((b.x - a.x) / edge_length, (b.y - a.y) / edge_length);

        // project every hull point onto the edge direction and its normal
        let (mut min_u, mut max_u, mut min_v, mut max_v) = (
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        );
        for p in &hull {
            let u = (p.x - a.x) * ux + (p.y - a.y) * uy;
            let v = -(p.x - a.x) * uy + (p.y - a.y) * ux;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let width = max_u - min_u;
        let height = max_v - min_v;
        let area = width * height;
        if best.as_ref().map_or(true, |(best_area, _)| area < *best_area) {
            let mid_u = (min_u + max_u) / 2.0;
            let mid_v = (min_v + max_v) / 2.0;
            let center = Point::new(
                a.x + mid_u * ux - mid_v * uy,
                a.y + mid_u * uy + mid_v * ux,
            );
            // image rows grow downward, so flip the sign to report a y-up angle
            let angle = normalize_rect_angle(-uy.atan2(ux).to_degrees());
            best = Some((
                area,
                RotatedRect {
                    center,
                    width,
                    height,
                    angle,
                },
            ));
        }
    }

    best.map(|(_, rect)| rect)
}

/// Area enclosed by a closed polygon, via the shoelace formula.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y))
        .sum::<i64>();
    (twice_area as f64 / 2.0).abs()
}

/// Gets the smallest axis-aligned box containing every point of the
/// contour, counting both extreme pixels.
pub fn get_contour_bounding_box(contour: &Contour<i32>) -> Option<BoundingBox> {
    let min_x = contour.points.iter().map(|p| p.x).min()?;
    let max_x = contour.points.iter().map(|p| p.x).max()?;
    let min_y = contour.points.iter().map(|p| p.y).min()?;
    let max_y = contour.points.iter().map(|p| p.y).max()?;
    Some(BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

/// A 2x3 affine transform mapping `(x, y)` to
/// `(m[0][0] x + m[0][1] y + m[0][2], m[1][0] x + m[1][1] y + m[1][2])`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub m: [[f64; 3]; 2],
}

impl Affine {
    /// Rotation by `degrees` about `center`; positive angles turn the image
    /// counter-clockwise as displayed.
    pub fn rotation(center: Point<f64>, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            m: [
                [cos, sin, (1.0 - cos) * center.x - sin * center.y],
                [-sin, cos, sin * center.x + (1.0 - cos) * center.y],
            ],
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.m;
        (
            m[0][0] * x + m[0][1] * y + m[0][2],
            m[1][0] * x + m[1][1] * y + m[1][2],
        )
    }
}

#[cfg(test)]
mod tests {
    use imageproc::contours::BorderType;
    use proptest::prelude::*;

    use super::*;

    fn points(coords: &[(i32, i32)]) -> Vec<Point<i32>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_convex_hull_drops_interior_and_repeated_points() {
        let hull = convex_hull(&points(&[
            (0, 0),
            (4, 0),
            (4, 4),
            (0, 4),
            (2, 2),
            (1, 3),
            (4, 4),
            (0, 0),
        ]));
        assert_eq!(hull.len(), 4);
        for corner in [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)] {
            assert!(hull.contains(&Point::new(corner.0, corner.1)));
        }
    }

    #[test]
    fn test_min_area_rect_uses_closing_hull_edge() {
        // an obtuse triangle: only the long side from (10, 10) back to the
        // starting vertex (0, 0) gives the smallest rectangle
        let rect = min_area_rect(&points(&[(0, 0), (7, 3), (10, 10)])).unwrap();
        assert!((rect.area() - 40.0).abs() < 1e-6, "area was {}", rect.area());
        assert!((rect.angle + 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_area_rect_axis_aligned() {
        let rect = min_area_rect(&points(&[(10, 20), (30, 20), (30, 25), (10, 25)])).unwrap();
        assert_eq!(rect.angle, -90.0);
        assert!((rect.area() - 100.0).abs() < 1e-9);
        assert!((rect.center.x - 20.0).abs() < 1e-9);
        assert!((rect.center.y - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_min_area_rect_rotated() {
        // a 20x10 rectangle rotated by atan(3/4) in image coordinates
        let rect = min_area_rect(&points(&[(0, 0), (16, 12), (10, 20), (-6, 8)])).unwrap();
        let expected = normalize_rect_angle(-(3.0f64).atan2(4.0).to_degrees());
        assert!((rect.angle - expected).abs() < 1e-9);
        assert!((rect.area() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_area_rect_degenerate() {
        assert_eq!(min_area_rect(&[]), None);

        let single = min_area_rect(&points(&[(5, 5), (5, 5)])).unwrap();
        assert_eq!(single.area(), 0.0);
        assert_eq!(single.center, Point::new(5.0, 5.0));

        let line = min_area_rect(&points(&[(0, 0), (5, 0), (10, 0)])).unwrap();
        assert_eq!(line.area(), 0.0);
        assert_eq!(line.angle, -90.0);
    }

    #[test]
    fn test_polygon_area() {
        assert_eq!(polygon_area(&points(&[(0, 0), (10, 0), (10, 5), (0, 5)])), 50.0);
        assert_eq!(polygon_area(&points(&[(0, 0), (0, 5), (10, 5), (10, 0)])), 50.0);
        assert_eq!(polygon_area(&points(&[(0, 0), (3, 3)])), 0.0);
    }

    #[test]
    fn test_contour_bounding_box_is_inclusive() {
        let contour = Contour {
            points: points(&[(3, 4), (8, 4), (8, 9), (3, 9)]),
            border_type: BorderType::Outer,
            parent: None,
        };
        assert_eq!(
            get_contour_bounding_box(&contour),
            Some(BoundingBox {
                x: 3,
                y: 4,
                width: 6,
                height: 6
            })
        );
    }

    #[test]
    fn test_rotation_about_center() {
        let rotation = Affine::rotation(Point::new(10.0, 10.0), 90.0);
        let (x, y) = rotation.apply(10.0, 10.0);
        assert!((x - 10.0).abs() < 1e-9 && (y - 10.0).abs() < 1e-9);

        // counter-clockwise as displayed: a point right of center moves above it
        let (x, y) = rotation.apply(15.0, 10.0);
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 5.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_rect_angle_in_range(coords in prop::collection::vec((-500i32..500, -500i32..500), 1..60)) {
            let rect = min_area_rect(&points(&coords)).unwrap();
            prop_assert!(rect.angle >= -90.0 && rect.angle < 0.0);
            prop_assert!(rect.width >= 0.0 && rect.height >= 0.0);
        }

        #[test]
        fn prop_opposite_rotations_cancel(degrees in -180.0f64..180.0, x in -1e3f64..1e3, y in -1e3f64..1e3) {
            let center = Point::new(320.0, 240.0);
            let forward = Affine::rotation(center, degrees);
            let backward = Affine::rotation(center, -degrees);
            let (fx, fy) = forward.apply(x, y);
            let (bx, by) = backward.apply(fx, fy);
            prop_assert!((bx - x).abs() < 1e-6 && (by - y).abs() < 1e-6);
        }
    }
}

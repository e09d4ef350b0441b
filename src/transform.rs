use image::{ImageBuffer, Pixel};
use imageproc::point::Point;
use logging_timer::time;

use crate::geometry::Affine;
use crate::image_utils::RasterImage;

/// Sharpness of the bicubic kernel. -0.75 matches what most scanning
/// software uses and keeps edges crisp without heavy ringing.
const CUBIC_A: f64 = -0.75;

/// Weights of the four neighbouring samples at fractional offset `t`.
fn cubic_weights(t: f64) -> [f64; 4] {
    let a = CUBIC_A;
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let w2 = ((a + 2.0) * (1.0 - t) - (a + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    [w0, w1, w2, 1.0 - w0 - w1 - w2]
}

/// Resamples `img` into a canvas of the same size. `source_of` maps each
/// destination pixel to the source position it is read from. Samples use
/// bicubic interpolation; positions outside the source replicate the
/// nearest border pixel.
pub fn warp_affine<P>(img: &ImageBuffer<P, Vec<u8>>, source_of: &Affine) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (width, height) = img.dimensions();
    let mut out = ImageBuffer::<P, Vec<u8>>::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (sx, sy) = source_of.apply(f64::from(x), f64::from(y));
        let (fx, fy) = (sx.floor(), sy.floor());
        let wx = cubic_weights(sx - fx);
        let wy = cubic_weights(sy - fy);
        let (x0, y0) = (fx as i64 - 1, fy as i64 - 1);

        let mut acc = [0f64; 4];
        for (j, weight_y) in wy.iter().enumerate() {
            let yy = (y0 + j as i64).clamp(0, max_y) as u32;
            for (i, weight_x) in wx.iter().enumerate() {
                let xx = (x0 + i as i64).clamp(0, max_x) as u32;
                let weight = weight_x * weight_y;
                for (c, value) in img.get_pixel(xx, yy).channels().iter().enumerate() {
                    acc[c] += weight * f64::from(*value);
                }
            }
        }

        for (c, value) in pixel.channels_mut().iter_mut().enumerate() {
            *value = acc[c].round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}

/// Rotates an image about its center by `degrees` (counter-clockwise as
/// displayed), keeping the original dimensions.
#[time]
pub fn rotate_image(img: &RasterImage, degrees: f64) -> RasterImage {
    let center = Point::new(
        f64::from(img.width() / 2),
        f64::from(img.height() / 2),
    );
    // reading back through the opposite rotation gives the forward warp
    let source_of = Affine::rotation(center, -degrees);
    match img {
        RasterImage::Gray(gray) => RasterImage::Gray(warp_affine(gray, &source_of)),
        RasterImage::Rgb(rgb) => RasterImage::Rgb(warp_affine(rgb, &source_of)),
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    use super::*;
    use crate::image_utils::{BLACK, WHITE};

    #[test]
    fn test_cubic_weights_sum_to_one() {
        for t in [0.0, 0.25, 0.5, 0.9] {
            let sum: f64 = cubic_weights(t).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
        assert_eq!(cubic_weights(0.0), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_rotation_is_identity() {
        let mut img = GrayImage::from_pixel(40, 30, WHITE);
        draw_filled_rect_mut(&mut img, Rect::at(5, 7).of_size(10, 4), BLACK);
        let rotated = rotate_image(&RasterImage::Gray(img.clone()), 0.0);
        assert_eq!(rotated, RasterImage::Gray(img));
    }

    #[test]
    fn test_quarter_turn_moves_pixels() {
        let mut img = GrayImage::from_pixel(21, 21, WHITE);
        img.put_pixel(15, 10, BLACK);
        let rotated = rotate_image(&RasterImage::Gray(img), 90.0).to_gray();
        // counter-clockwise: right of center ends up above center
        assert_eq!(*rotated.get_pixel(10, 5), BLACK);
        assert_eq!(*rotated.get_pixel(15, 10), WHITE);
    }

    #[test]
    fn test_border_is_replicated() {
        let img = RgbImage::from_pixel(30, 20, Rgb([10, 200, 30]));
        let rotated = rotate_image(&RasterImage::Rgb(img), 30.0);
        assert_eq!(rotated.dimensions(), (30, 20));
        match rotated {
            RasterImage::Rgb(rgb) => {
                assert!(rgb.pixels().all(|p| *p == Rgb([10, 200, 30])));
            }
            RasterImage::Gray(_) => panic!("rotation changed the color type"),
        }
    }

    #[test]
    fn test_gray_uniform_stays_uniform() {
        let img = GrayImage::from_pixel(17, 9, Luma([77]));
        let rotated = rotate_image(&RasterImage::Gray(img), -12.5).to_gray();
        assert!(rotated.pixels().all(|p| *p == Luma([77])));
    }
}

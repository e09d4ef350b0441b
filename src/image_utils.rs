use std::path::Path;

use image::{imageops, DynamicImage, GrayImage, Luma, Pixel, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use logging_timer::time;

use crate::error::{Error, Result};
use crate::types::BoundingBox;

pub const WHITE: Luma<u8> = Luma([u8::MAX]);
pub const BLACK: Luma<u8> = Luma([u8::MIN]);

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const DARK_GREEN: Rgb<u8> = Rgb([0, 127, 0]);

/// A decoded sheet image. Color scans keep their channels so the corrected
/// image can be handed back unchanged in color; every analysis step works on
/// the intensity view.
#[derive(Clone, Debug, PartialEq)]
pub enum RasterImage {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl RasterImage {
    pub fn width(&self) -> u32 {
        match self {
            RasterImage::Gray(img) => img.width(),
            RasterImage::Rgb(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            RasterImage::Gray(img) => img.height(),
            RasterImage::Rgb(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Intensity of a single pixel. Panics if `(x, y)` is out of bounds.
    pub fn intensity(&self, x: u32, y: u32) -> u8 {
        match self {
            RasterImage::Gray(img) => img.get_pixel(x, y).0[0],
            RasterImage::Rgb(img) => img.get_pixel(x, y).to_luma().0[0],
        }
    }

    /// Single-channel intensity view of the image.
    pub fn to_gray(&self) -> GrayImage {
        match self {
            RasterImage::Gray(img) => img.clone(),
            RasterImage::Rgb(img) => imageops::grayscale(img),
        }
    }

    pub fn to_rgb(&self) -> RgbImage {
        match self {
            RasterImage::Gray(img) => DynamicImage::ImageLuma8(img.clone()).to_rgb8(),
            RasterImage::Rgb(img) => img.clone(),
        }
    }

    /// Copies out the given region. The region must lie within the image.
    pub fn crop(&self, bounds: BoundingBox) -> RasterImage {
        let BoundingBox {
            x,
            y,
            width,
            height,
        } = bounds;
        match self {
            RasterImage::Gray(img) => {
                RasterImage::Gray(imageops::crop_imm(img, x, y, width, height).to_image())
            }
            RasterImage::Rgb(img) => {
                RasterImage::Rgb(imageops::crop_imm(img, x, y, width, height).to_image())
            }
        }
    }
}

impl From<GrayImage> for RasterImage {
    fn from(img: GrayImage) -> Self {
        RasterImage::Gray(img)
    }
}

impl From<RgbImage> for RasterImage {
    fn from(img: RgbImage) -> Self {
        RasterImage::Rgb(img)
    }
}

impl From<DynamicImage> for RasterImage {
    fn from(img: DynamicImage) -> Self {
        if img.color().has_color() {
            RasterImage::Rgb(img.into_rgb8())
        } else {
            RasterImage::Gray(img.into_luma8())
        }
    }
}

/// Decodes an image from an in-memory buffer in any format `image` supports.
#[time]
pub fn load_image_from_memory(bytes: &[u8]) -> Result<RasterImage> {
    if bytes.is_empty() {
        return Err(Error::Decode("input is empty".to_string()));
    }

    let img = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::Decode(format!(
            "image has no pixels ({}x{})",
            img.width(),
            img.height()
        )));
    }

    let img = RasterImage::from(img);
    log::debug!("decoded {}x{} image", img.width(), img.height());
    Ok(img)
}

/// Reads and decodes an image file.
pub fn load_image(path: &Path) -> Result<RasterImage> {
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_image_from_memory(&bytes)
}

/// Mean intensity of the pixels within `bounds`. Returns `None` for an
/// empty region.
pub fn mean_intensity(img: &GrayImage, bounds: BoundingBox) -> Option<f64> {
    if bounds.width == 0 || bounds.height == 0 {
        return None;
    }

    let sum = (bounds.y..bounds.bottom())
        .flat_map(|y| (bounds.x..bounds.right()).map(move |x| (x, y)))
        .map(|(x, y)| u64::from(img.get_pixel(x, y).0[0]))
        .sum::<u64>();
    let count = u64::from(bounds.width) * u64::from(bounds.height);
    Some(sum as f64 / count as f64)
}

/// The sigma OpenCV derives for a 5x5 Gaussian kernel.
pub const DEFAULT_BLUR_SIGMA: f32 = 1.1;

/// Suppresses sensor noise with a Gaussian blur. A non-positive sigma
/// disables smoothing.
pub fn smooth(img: &GrayImage, sigma: f32) -> GrayImage {
    if sigma > 0.0 {
        gaussian_blur_f32(img, sigma)
    } else {
        img.clone()
    }
}

/// Binarizes an image so that dark pixels (at or below `level`) become
/// white foreground and everything else becomes black background.
pub fn binarize_inverted(img: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y).0[0] <= level {
            WHITE
        } else {
            BLACK
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::ImageOutputFormat;

    use super::*;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_load_gray_png() {
        let img = GrayImage::from_pixel(8, 6, Luma([200]));
        let loaded = load_image_from_memory(&encode_png(DynamicImage::ImageLuma8(img))).unwrap();
        assert!(matches!(loaded, RasterImage::Gray(_)));
        assert_eq!(loaded.dimensions(), (8, 6));
        assert_eq!(loaded.intensity(3, 3), 200);
    }

    #[test]
    fn test_load_color_png_keeps_channels() {
        let img = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        let loaded = load_image_from_memory(&encode_png(DynamicImage::ImageRgb8(img))).unwrap();
        match &loaded {
            RasterImage::Rgb(rgb) => assert_eq!(*rgb.get_pixel(0, 0), Rgb([255, 0, 0])),
            RasterImage::Gray(_) => panic!("expected a color image"),
        }
        assert_eq!(loaded.intensity(0, 0), loaded.to_gray().get_pixel(0, 0).0[0]);
    }

    #[test]
    fn test_load_rejects_empty_and_corrupt_input() {
        assert!(matches!(load_image_from_memory(&[]), Err(Error::Decode(_))));
        assert!(matches!(
            load_image_from_memory(b"definitely not an image"),
            Err(Error::Decode(_))
        ));

        let mut truncated = encode_png(DynamicImage::ImageLuma8(GrayImage::new(16, 16)));
        truncated.truncate(truncated.len() / 2);
        assert!(matches!(
            load_image_from_memory(&truncated),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        assert!(matches!(load_image(&path), Err(Error::Io { .. })));
    }

    #[test]
    fn test_binarize_inverted() {
        let img = GrayImage::from_fn(4, 1, |x, _| Luma([(x * 60) as u8]));
        let binary = binarize_inverted(&img, 60);
        let values = binary.pixels().map(|p| p.0[0]).collect::<Vec<u8>>();
        assert_eq!(values, vec![255, 255, 0, 0]);
    }

    #[test]
    fn test_smooth_keeps_uniform_images_uniform() {
        let img = GrayImage::from_pixel(12, 12, WHITE);
        let blurred = smooth(&img, DEFAULT_BLUR_SIGMA);
        let first = *blurred.get_pixel(0, 0);
        assert!(blurred.pixels().all(|p| *p == first));
        assert_eq!(smooth(&img, 0.0), img);
    }

    #[test]
    fn test_crop_and_mean_intensity() {
        let mut img = GrayImage::from_pixel(10, 10, WHITE);
        for y in 2..4 {
            for x in 2..6 {
                img.put_pixel(x, y, BLACK);
            }
        }
        let bounds = BoundingBox {
            x: 2,
            y: 2,
            width: 4,
            height: 2,
        };
        assert_eq!(mean_intensity(&img, bounds), Some(0.0));
        let half = BoundingBox {
            x: 2,
            y: 2,
            width: 4,
            height: 4,
        };
        assert_eq!(mean_intensity(&img, half), Some(127.5));
        assert_eq!(
            mean_intensity(
                &img,
                BoundingBox {
                    x: 0,
                    y: 0,
                    width: 0,
                    height: 3
                }
            ),
            None
        );

        let cropped = RasterImage::from(img).crop(bounds);
        assert_eq!(cropped.dimensions(), (4, 2));
        assert!(cropped.to_gray().pixels().all(|p| *p == BLACK));
    }
}

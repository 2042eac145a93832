use super::region::ImageRegion;
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::Deserialize;

/// HSV triple in OpenCV 8-bit scale: hue in `0..180`, saturation and value in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn from_rgb(px: &Rgb<u8>) -> Self {
        let [r, g, b] = px.0;
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let max = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let diff = max - min;

        let s = if max > 0.0 { diff * 255.0 / max } else { 0.0 };

        let mut h = if diff == 0.0 {
            0.0
        } else if max == rf {
            60.0 * (gf - bf) / diff
        } else if max == gf {
            120.0 + 60.0 * (bf - rf) / diff
        } else {
            240.0 + 60.0 * (rf - gf) / diff
        };
        if h < 0.0 {
            h += 360.0;
        }

        Self {
            h: ((h / 2.0).round() as u32 % 180) as u8,
            s: s.round().min(255.0) as u8,
            v: max as u8,
        }
    }
}

/// Inclusive HSV bounds, `[h, s, v]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.lower[0]..=self.upper[0]).contains(&hsv.h)
            && (self.lower[1]..=self.upper[1]).contains(&hsv.s)
            && (self.lower[2]..=self.upper[2]).contains(&hsv.v)
    }
}

/// Binary mask with 255 where the pixel falls inside `range`.
pub fn mask(image: &RgbImage, range: &HsvRange) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if range.contains(Hsv::from_rgb(image.get_pixel(x, y))) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

pub fn count_non_zero(mask: &GrayImage, region: ImageRegion) -> usize {
    let region = ImageRegion::from_signed(
        region.x as i64,
        region.y as i64,
        region.width as i64,
        region.height as i64,
        mask.width(),
        mask.height(),
    );

    let mut count = 0;
    for y in region.y..region.y + region.height {
        for x in region.x..region.x + region.width {
            if mask.get_pixel(x, y)[0] != 0 {
                count += 1;
            }
        }
    }
    count
}

/// Share of non-zero mask pixels inside `region`, `0.0` for an empty region.
pub fn fill_ratio(mask: &GrayImage, region: ImageRegion) -> f32 {
    if region.is_empty() {
        return 0.0;
    }
    count_non_zero(mask, region) as f32 / region.area() as f32
}

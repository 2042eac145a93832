use super::color::{self, HsvRange};
use super::geometry::BoardQuad;
use super::region::ImageRegion;
use crate::config::VisionSettings;
use crate::engine::board::Color;
use image::RgbImage;
use tracing::debug;

/// Reads our colour from the score badge drawn above the board's top right corner.
#[derive(Debug, Clone)]
pub struct PlayerColorDetector {
    badge_white: HsvRange,
    black: HsvRange,
    fill_ratio: f32,
}

impl PlayerColorDetector {
    pub fn new(settings: &VisionSettings) -> Self {
        Self {
            badge_white: settings.colors.badge_white,
            black: settings.colors.black_disc,
            fill_ratio: settings.badge_fill_ratio,
        }
    }

    /// Badge square relative to the board, clipped to the screenshot.
    pub fn badge_region(quad: &BoardQuad, width: u32, height: u32) -> ImageRegion {
        let board_width = quad.top_width();
        let side = (board_width * 0.1) as i64;
        let x = (quad.top_right.x - board_width * 0.27) as i64;
        let y = (quad.top_right.y - board_width * 0.3) as i64;
        ImageRegion::from_signed(x, y, side, side, width, height)
    }

    pub fn detect(&self, image: &RgbImage, quad: &BoardQuad) -> Option<Color> {
        let region = Self::badge_region(quad, image.width(), image.height());
        if region.is_empty() {
            debug!("Score badge lies outside the image");
            return None;
        }

        let badge = image::imageops::crop_imm(image, region.x, region.y, region.width, region.height)
            .to_image();
        let whole = ImageRegion::full_image(region.width, region.height);
        let threshold = region.area() as f32 * self.fill_ratio;

        let white = color::count_non_zero(&color::mask(&badge, &self.badge_white), whole);
        let black = color::count_non_zero(&color::mask(&badge, &self.black), whole);
        debug!(?region, white, black, "Score badge sampled");

        if white as f32 > threshold {
            Some(Color::White)
        } else if black as f32 > threshold {
            Some(Color::Black)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::geometry::PointF;
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn quad() -> BoardQuad {
        BoardQuad {
            top_left: PointF { x: 100.0, y: 200.0 },
            top_right: PointF { x: 500.0, y: 200.0 },
            bottom_right: PointF { x: 500.0, y: 600.0 },
            bottom_left: PointF { x: 100.0, y: 600.0 },
        }
    }

    fn screenshot(badge: Rgb<u8>) -> RgbImage {
        let mut img = RgbImage::from_pixel(640, 640, Rgb([0, 128, 0]));
        draw_filled_rect_mut(&mut img, Rect::at(392, 80).of_size(40, 40), badge);
        img
    }

    #[test]
    fn badge_sits_above_top_right_corner() {
        assert_eq!(
            PlayerColorDetector::badge_region(&quad(), 640, 640),
            ImageRegion::new(392, 80, 40, 40)
        );
    }

    #[test]
    fn reads_badge_colour() {
        let detector = PlayerColorDetector::new(&VisionSettings::default());
        assert_eq!(
            detector.detect(&screenshot(Rgb([245, 245, 245])), &quad()),
            Some(Color::White)
        );
        assert_eq!(
            detector.detect(&screenshot(Rgb([15, 15, 15])), &quad()),
            Some(Color::Black)
        );
        assert_eq!(detector.detect(&screenshot(Rgb([0, 128, 0])), &quad()), None);
    }

    #[test]
    fn badge_outside_image_gives_none() {
        let detector = PlayerColorDetector::new(&VisionSettings::default());
        let full = BoardQuad::full_image(320, 320);
        let img = RgbImage::from_pixel(320, 320, Rgb([255, 255, 255]));
        assert_eq!(detector.detect(&img, &full), None);
    }
}

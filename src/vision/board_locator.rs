use super::color::{self, HsvRange};
use super::geometry::{order_corners, BoardQuad, PointF};
use crate::config::VisionSettings;
use crate::error::VisionError;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use imageproc::morphology::{dilate, erode};
use imageproc::point::Point;
use serde::Serialize;
use tracing::{debug, warn};

/// How the board outline was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateSource {
    Contour,
    GreenMask,
    FullImage,
}

#[derive(Debug, Clone)]
pub struct BoardLocation {
    pub quad: BoardQuad,
    pub source: LocateSource,
    /// Board rectified to `quad.rectified_size()`.
    pub warped: RgbImage,
}

#[derive(Debug, Clone)]
pub struct BoardLocator {
    min_area: f64,
    epsilon_ratio: f64,
    board_green: HsvRange,
}

impl BoardLocator {
    pub fn new(settings: &VisionSettings) -> Self {
        Self {
            min_area: settings.min_board_area,
            epsilon_ratio: settings.approx_epsilon_ratio,
            board_green: settings.colors.board_green,
        }
    }

    /// Find the board in `image` given its thresholded counterpart.
    pub fn locate(&self, image: &RgbImage, binary: &GrayImage) -> BoardLocation {
        let (outline, source) = match self.find_by_contours(binary) {
            Some(poly) => (Some(poly), LocateSource::Contour),
            None => match self.find_by_green_mask(image) {
                Some(poly) => (Some(poly), LocateSource::GreenMask),
                None => (None, LocateSource::FullImage),
            },
        };

        let quad = outline.and_then(|poly| {
            let points: Vec<PointF> = poly.into_iter().map(PointF::from).collect();
            order_corners(&points)
        });

        let located = quad.and_then(|quad| match warp_board(image, &quad) {
            Ok(warped) => Some(BoardLocation {
                quad,
                source,
                warped,
            }),
            Err(e) => {
                warn!(error = %e, "Board rectification failed");
                None
            }
        });

        match located {
            Some(location) => {
                debug!(source = ?location.source, quad = ?location.quad, "Board located");
                location
            }
            None => {
                warn!("Board outline not found, using the whole image");
                BoardLocation {
                    quad: BoardQuad::full_image(image.width(), image.height()),
                    source: LocateSource::FullImage,
                    warped: image.clone(),
                }
            }
        }
    }

    /// Douglas-Peucker outline of a closed contour, tolerance relative to its length.
    fn approximate(&self, contour: &Contour<i32>) -> Vec<Point<i32>> {
        approximate_closed(&contour.points, self.epsilon_ratio)
    }

    /// Largest outer contour whose approximation has four to six vertices.
    fn find_by_contours(&self, binary: &GrayImage) -> Option<Vec<Point<i32>>> {
        let mut best: Option<(f64, Vec<Point<i32>>)> = None;

        for contour in outer_contours(binary) {
            let area = contour_area(&contour.points);
            if area <= self.min_area {
                continue;
            }
            let approx = self.approximate(&contour);
            if (4..=6).contains(&approx.len()) && best.as_ref().map_or(true, |(a, _)| area > *a) {
                best = Some((area, approx));
            }
        }

        best.map(|(area, poly)| {
            debug!(area, vertices = poly.len(), "Board contour candidate");
            poly
        })
    }

    /// Largest blob of board green after closing small gaps.
    fn find_by_green_mask(&self, image: &RgbImage) -> Option<Vec<Point<i32>>> {
        let mut mask = color::mask(image, &self.board_green);
        for _ in 0..2 {
            mask = dilate(&mask, Norm::LInf, 2);
        }
        for _ in 0..2 {
            mask = erode(&mask, Norm::LInf, 2);
        }

        outer_contours(&mask)
            .into_iter()
            .map(|c| (contour_area(&c.points), c))
            .filter(|(area, _)| *area > 0.0)
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(area, contour)| {
                debug!(area, "Board green mask candidate");
                self.approximate(&contour)
            })
    }
}

fn approximate_closed(points: &[Point<i32>], epsilon_ratio: f64) -> Vec<Point<i32>> {
    let epsilon = epsilon_ratio * arc_length(points, true);
    // approximate_polygon_dp panics on an empty curve or a non-positive tolerance
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }
    approximate_polygon_dp(points, epsilon, true)
}

fn outer_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .collect()
}

/// Perspective-correct `quad` into an axis aligned image.
pub fn warp_board(image: &RgbImage, quad: &BoardQuad) -> Result<RgbImage, VisionError> {
    let (width, height) = quad.rectified_size();
    if width < 2 || height < 2 {
        return Err(VisionError::DegenerateQuad);
    }

    let (w, h) = ((width - 1) as f32, (height - 1) as f32);
    let target = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let projection = Projection::from_control_points(quad.to_control_points(), target)
        .ok_or(VisionError::DegenerateQuad)?;

    let mut warped = RgbImage::new(width, height);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut warped,
    );
    Ok(warped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::preprocess::Preprocessor;
    use image::DynamicImage;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn board_on_white() -> RgbImage {
        let mut img = RgbImage::from_pixel(300, 240, Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut img, Rect::at(60, 40).of_size(160, 160), Rgb([0, 128, 0]));
        img
    }

    fn square_outline(x0: i32, y0: i32, side: i32) -> Vec<Point<i32>> {
        let mut pts = Vec::new();
        for x in x0..x0 + side {
            pts.push(Point::new(x, y0));
        }
        for y in y0..y0 + side {
            pts.push(Point::new(x0 + side, y));
        }
        for x in (x0 + 1..=x0 + side).rev() {
            pts.push(Point::new(x, y0 + side));
        }
        for y in (y0 + 1..=y0 + side).rev() {
            pts.push(Point::new(x0, y));
        }
        pts
    }

    #[test]
    fn square_outline_simplifies_to_four_corners() {
        let outline = square_outline(10, 20, 100);
        let approx = approximate_closed(&outline, 0.02);

        assert_eq!(approx.len(), 4, "{approx:?}");
        for (x, y) in [(10, 20), (110, 20), (110, 120), (10, 120)] {
            assert!(approx.contains(&Point::new(x, y)), "missing ({x}, {y})");
        }
        assert_eq!(contour_area(&approx), 10_000.0);
        assert_eq!(arc_length(&approx, true), 400.0);
    }

    #[test]
    fn tiny_or_zero_tolerance_contours_pass_through() {
        let pair = [Point::new(0, 0), Point::new(3, 4)];
        assert_eq!(approximate_closed(&pair, 0.02), pair.to_vec());
        assert!(approximate_closed(&[], 0.02).is_empty());

        let outline = square_outline(0, 0, 10);
        assert_eq!(approximate_closed(&outline, 0.0), outline);
    }

    #[test]
    fn finds_board_outline_from_threshold_contours() {
        let img = board_on_white();
        let pre = Preprocessor::default()
            .run(&DynamicImage::ImageRgb8(img.clone()))
            .unwrap();
        let location = BoardLocator::new(&VisionSettings::default()).locate(&img, &pre.binary);

        assert_eq!(location.source, LocateSource::Contour);
        assert!((location.quad.top_left.x - 60.0).abs() <= 2.0);
        assert!((location.quad.top_left.y - 40.0).abs() <= 2.0);
        assert!((location.quad.bottom_right.x - 219.0).abs() <= 2.0);
        assert!((location.quad.bottom_right.y - 199.0).abs() <= 2.0);
        assert_eq!(location.warped.dimensions(), location.quad.rectified_size());
    }

    #[test]
    fn green_mask_is_used_when_threshold_has_no_board() {
        let img = board_on_white();
        let blank = GrayImage::new(img.width(), img.height());
        let location = BoardLocator::new(&VisionSettings::default()).locate(&img, &blank);

        assert_eq!(location.source, LocateSource::GreenMask);
        assert!((location.quad.top_left.x - 60.0).abs() <= 2.0);
        assert!((location.quad.bottom_right.y - 199.0).abs() <= 2.0);
    }

    #[test]
    fn falls_back_to_whole_image() {
        let img = RgbImage::from_pixel(50, 30, Rgb([255, 255, 255]));
        let blank = GrayImage::new(50, 30);
        let location = BoardLocator::new(&VisionSettings::default()).locate(&img, &blank);

        assert_eq!(location.source, LocateSource::FullImage);
        assert_eq!(location.quad, BoardQuad::full_image(50, 30));
        assert_eq!(location.warped.dimensions(), (50, 30));
    }

    #[test]
    fn degenerate_quad_cannot_be_warped() {
        let img = RgbImage::new(10, 10);
        let p = PointF::new(3.0, 3.0);
        let quad = BoardQuad {
            top_left: p,
            top_right: p,
            bottom_right: p,
            bottom_left: p,
        };
        assert!(matches!(
            warp_board(&img, &quad),
            Err(VisionError::DegenerateQuad)
        ));
    }
}

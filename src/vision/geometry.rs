use imageproc::point::Point;
use serde::Serialize;

/// Sub-pixel image coordinate, serialised as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "[f64; 2]")]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &PointF) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<PointF> for [f64; 2] {
    fn from(p: PointF) -> Self {
        [p.x, p.y]
    }
}

impl From<Point<i32>> for PointF {
    fn from(p: Point<i32>) -> Self {
        Self::new(p.x as f64, p.y as f64)
    }
}

/// Board corners in image space, clockwise from the top left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoardQuad {
    pub top_left: PointF,
    pub top_right: PointF,
    pub bottom_right: PointF,
    pub bottom_left: PointF,
}

impl BoardQuad {
    /// Quad covering the whole image, `(0,0)` to `(w-1,h-1)`.
    pub fn full_image(width: u32, height: u32) -> Self {
        let (w, h) = (width.saturating_sub(1) as f64, height.saturating_sub(1) as f64);
        Self {
            top_left: PointF::new(0.0, 0.0),
            top_right: PointF::new(w, 0.0),
            bottom_right: PointF::new(w, h),
            bottom_left: PointF::new(0.0, h),
        }
    }

    /// Length of the top edge, used as the board width for badge lookup.
    pub fn top_width(&self) -> f64 {
        self.top_right.distance(&self.top_left)
    }

    /// Target size of the rectified board, edge lengths truncated.
    pub fn rectified_size(&self) -> (u32, u32) {
        let width = (self.top_right.distance(&self.top_left) as u32)
            .max(self.bottom_right.distance(&self.bottom_left) as u32);
        let height = (self.bottom_left.distance(&self.top_left) as u32)
            .max(self.bottom_right.distance(&self.top_right) as u32);
        (width, height)
    }

    /// Screen position of the centre of `(row, col)`.
    pub fn cell_center(&self, row: usize, col: usize) -> (i32, i32) {
        let fx = (col as f64 + 0.5) / 8.0;
        let fy = (row as f64 + 0.5) / 8.0;
        let x = self.top_left.x
            + (self.top_right.x - self.top_left.x) * fx
            + (self.bottom_left.x - self.top_left.x) * fy;
        let y = self.top_left.y
            + (self.top_right.y - self.top_left.y) * fx
            + (self.bottom_left.y - self.top_left.y) * fy;
        (x.round() as i32, y.round() as i32)
    }

    pub fn corners(&self) -> [PointF; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    pub fn to_control_points(&self) -> [(f32, f32); 4] {
        self.corners().map(|p| (p.x as f32, p.y as f32))
    }
}

/// Picks the four board corners out of a polygon.
///
/// Top-left minimises `x + y`, bottom-right maximises it; top-right minimises
/// `y - x`, bottom-left maximises it.
pub fn order_corners(points: &[PointF]) -> Option<BoardQuad> {
    let first = *points.first()?;
    let mut quad = BoardQuad {
        top_left: first,
        top_right: first,
        bottom_right: first,
        bottom_left: first,
    };

    for p in points.iter().skip(1) {
        let (sum, diff) = (p.x + p.y, p.y - p.x);
        if sum < quad.top_left.x + quad.top_left.y {
            quad.top_left = *p;
        }
        if sum > quad.bottom_right.x + quad.bottom_right.y {
            quad.bottom_right = *p;
        }
        if diff < quad.top_right.y - quad.top_right.x {
            quad.top_right = *p;
        }
        if diff > quad.bottom_left.y - quad.bottom_left.x {
            quad.bottom_left = *p;
        }
    }
    Some(quad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_ordered_by_sum_and_difference() {
        let pts = [
            PointF::new(500.0, 500.0),
            PointF::new(100.0, 500.0),
            PointF::new(100.0, 100.0),
            PointF::new(500.0, 100.0),
        ];
        let quad = order_corners(&pts).unwrap();
        assert_eq!(quad.top_left, PointF::new(100.0, 100.0));
        assert_eq!(quad.top_right, PointF::new(500.0, 100.0));
        assert_eq!(quad.bottom_right, PointF::new(500.0, 500.0));
        assert_eq!(quad.bottom_left, PointF::new(100.0, 500.0));
        assert_eq!(quad.rectified_size(), (400, 400));
        assert!(order_corners(&[]).is_none());
    }

    #[test]
    fn cell_center_maps_to_screen() {
        let quad = order_corners(&[
            PointF::new(100.0, 100.0),
            PointF::new(500.0, 100.0),
            PointF::new(500.0, 500.0),
            PointF::new(100.0, 500.0),
        ])
        .unwrap();
        assert_eq!(quad.cell_center(3, 4), (325, 275));
        assert_eq!(quad.cell_center(0, 0), (125, 125));
    }

    #[test]
    fn quad_serializes_as_coordinate_pairs() {
        let quad = BoardQuad::full_image(640, 480);
        let json = serde_json::to_value(quad).unwrap();
        assert_eq!(json["bottom_right"], serde_json::json!([639.0, 479.0]));
    }
}

//! Classifies the 64 squares of a rectified board image by colour.
use super::color::{self, HsvRange};
use super::region::ImageRegion;
use crate::config::VisionSettings;
use crate::engine::board::{Board, Cell, Position, BOARD_SIZE};
use image::RgbImage;
use tracing::debug;

/// Square grid laid over a rectified board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGrid {
    /// Side of one square in pixels.
    pub cell: u32,
    sample_ratio: f32,
}

impl CellGrid {
    pub fn for_image(width: u32, height: u32, sample_ratio: f32) -> Self {
        Self {
            cell: width.min(height) / BOARD_SIZE as u32,
            sample_ratio,
        }
    }

    pub fn center(&self, pos: Position) -> (i64, i64) {
        let cell = self.cell as f64;
        (
            ((pos.col as f64 + 0.5) * cell) as i64,
            ((pos.row as f64 + 0.5) * cell) as i64,
        )
    }

    pub fn radius(&self) -> i64 {
        (self.cell as f32 * self.sample_ratio) as i64
    }

    /// Sampling square for `pos`, clipped to a `width x height` image.
    pub fn sample_region(&self, pos: Position, width: u32, height: u32) -> ImageRegion {
        let (cx, cy) = self.center(pos);
        ImageRegion::around(cx, cy, self.radius(), width, height)
    }
}

#[derive(Debug, Clone)]
pub struct CellClassifier {
    white: HsvRange,
    black: HsvRange,
    sample_ratio: f32,
    fill_ratio: f32,
}

impl CellClassifier {
    pub fn new(settings: &VisionSettings) -> Self {
        Self {
            white: settings.colors.white_disc,
            black: settings.colors.black_disc,
            sample_ratio: settings.cell_sample_ratio,
            fill_ratio: settings.cell_fill_ratio,
        }
    }

    pub fn grid(&self, board_image: &RgbImage) -> CellGrid {
        CellGrid::for_image(board_image.width(), board_image.height(), self.sample_ratio)
    }

    /// Read the disc layout from a rectified board image.
    pub fn classify(&self, board_image: &RgbImage) -> Board {
        let (width, height) = board_image.dimensions();
        let grid = self.grid(board_image);
        let white_mask = color::mask(board_image, &self.white);
        let black_mask = color::mask(board_image, &self.black);

        let mut board = Board::empty();
        for pos in Position::all() {
            let region = grid.sample_region(pos, width, height);
            if region.is_empty() {
                continue;
            }
            let threshold = region.area() as f32 * self.fill_ratio;

            let cell = if color::count_non_zero(&white_mask, region) as f32 > threshold {
                Cell::White
            } else if color::count_non_zero(&black_mask, region) as f32 > threshold {
                Cell::Black
            } else {
                Cell::Empty
            };
            board.set(pos, cell);
        }

        let count = board.count();
        debug!(
            cell = grid.cell,
            black = count.black,
            white = count.white,
            "Cells classified"
        );
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use imageproc::drawing::draw_filled_circle_mut;

    const GREEN: Rgb<u8> = Rgb([0, 128, 0]);
    const DARK: Rgb<u8> = Rgb([20, 20, 20]);
    const LIGHT: Rgb<u8> = Rgb([200, 220, 235]);

    fn classifier() -> CellClassifier {
        CellClassifier::new(&VisionSettings::default())
    }

    #[test]
    fn grid_geometry_uses_shorter_side() {
        let grid = CellGrid::for_image(330, 320, 0.25);
        assert_eq!(grid.cell, 40);
        assert_eq!(grid.center(Position::new(0, 0)), (20, 20));
        assert_eq!(grid.center(Position::new(3, 4)), (180, 140));
        assert_eq!(grid.radius(), 10);
        assert_eq!(
            grid.sample_region(Position::new(0, 0), 330, 320),
            ImageRegion::new(10, 10, 20, 20)
        );
    }

    #[test]
    fn grids_compare_by_cell_and_ratio() {
        let grid = CellGrid::for_image(320, 320, 0.25);
        assert_eq!(grid, CellGrid::for_image(327, 321, 0.25));
        assert_ne!(grid, CellGrid::for_image(320, 320, 0.3));
        assert!(format!("{grid:?}").contains("cell: 40"));
    }

    #[test]
    fn reads_drawn_discs() {
        let mut img = RgbImage::from_pixel(320, 320, GREEN);
        let grid = CellGrid::for_image(320, 320, 0.25);
        let discs = [
            (Position::new(3, 3), LIGHT),
            (Position::new(4, 4), LIGHT),
            (Position::new(3, 4), DARK),
            (Position::new(4, 3), DARK),
            (Position::new(0, 7), DARK),
        ];
        for (pos, colour) in discs {
            let (cx, cy) = grid.center(pos);
            draw_filled_circle_mut(&mut img, (cx as i32, cy as i32), 16, colour);
        }

        let board = classifier().classify(&img);
        assert_eq!(board.get(Position::new(3, 3)), Cell::White);
        assert_eq!(board.get(Position::new(4, 4)), Cell::White);
        assert_eq!(board.get(Position::new(3, 4)), Cell::Black);
        assert_eq!(board.get(Position::new(0, 7)), Cell::Black);
        assert_eq!(board.count().empty, 59);
    }

    #[test]
    fn tiny_image_is_all_empty() {
        let img = RgbImage::from_pixel(6, 6, DARK);
        assert_eq!(classifier().classify(&img), Board::empty());
    }
}

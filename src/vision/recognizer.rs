use super::board_locator::{BoardLocator, LocateSource};
use super::cell_classifier::{CellClassifier, CellGrid};
use super::geometry::BoardQuad;
use super::player_color::PlayerColorDetector;
use super::preprocess::Preprocessor;
use crate::common::frame::Frame;
use crate::config::VisionSettings;
use crate::engine::board::{Board, Cell, Color, Position};
use crate::error::AppError;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

const GRID_COLOUR: Rgb<u8> = Rgb([0, 0, 255]);
const WHITE_MARK: Rgb<u8> = Rgb([0, 255, 0]);
const BLACK_MARK: Rgb<u8> = Rgb([255, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Board state read from one screenshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    pub board: Board,
    pub player_color: Option<Color>,
    pub screen_size: ScreenSize,
    pub board_rect: BoardQuad,
    #[serde(skip)]
    pub source: LocateSource,
}

/// Locates the board, reads the player's colour and classifies all cells.
#[derive(Debug, Clone)]
pub struct Recognizer {
    preprocessor: Preprocessor,
    locator: BoardLocator,
    classifier: CellClassifier,
    player_color: PlayerColorDetector,
    debug_dir: Option<PathBuf>,
}

impl Recognizer {
    pub fn new(settings: &VisionSettings) -> Self {
        Self {
            preprocessor: Preprocessor::from_settings(settings),
            locator: BoardLocator::new(settings),
            classifier: CellClassifier::new(settings),
            player_color: PlayerColorDetector::new(settings),
            debug_dir: settings.debug_dir.clone(),
        }
    }

    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn recognize_path(&self, path: impl AsRef<Path>) -> Result<Recognition, AppError> {
        let frame = Frame::load(path)?;
        self.recognize(&frame)
    }

    pub fn recognize(&self, frame: &Frame) -> Result<Recognition, AppError> {
        let started = Instant::now();
        let rgb = frame.image().to_rgb8();
        let pre = self.preprocessor.run(frame.image())?;

        let location = self.locator.locate(&rgb, &pre.binary);
        let player_color = self.player_color.detect(&rgb, &location.quad);
        let board = self.classifier.classify(&location.warped);

        if let Some(dir) = &self.debug_dir {
            let grid = self.classifier.grid(&location.warped);
            self.write_debug_images(dir, frame, &location.warped, &board, grid)?;
        }

        let (width, height) = frame.dimensions();
        let count = board.count();
        info!(
            frame_id = %frame.id(),
            source = ?location.source,
            player_color = player_color.map(Color::as_str),
            black = count.black,
            white = count.white,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Board recognised"
        );

        Ok(Recognition {
            board,
            player_color,
            screen_size: ScreenSize { width, height },
            board_rect: location.quad,
            source: location.source,
        })
    }

    fn write_debug_images(
        &self,
        dir: &Path,
        frame: &Frame,
        warped: &RgbImage,
        board: &Board,
        grid: CellGrid,
    ) -> Result<(), AppError> {
        std::fs::create_dir_all(dir)?;
        let board_path = dir.join(format!("{}_board.png", frame.id()));
        let overlay_path = dir.join(format!("{}_overlay.png", frame.id()));

        warped.save(&board_path)?;
        annotate(warped, board, grid).save(&overlay_path)?;
        debug!(board = %board_path.display(), overlay = %overlay_path.display(), "Debug images written");
        Ok(())
    }
}

/// Grid lines on every square and a ring on each detected disc.
pub fn annotate(warped: &RgbImage, board: &Board, grid: CellGrid) -> RgbImage {
    let mut overlay = warped.clone();
    if grid.cell == 0 {
        return overlay;
    }
    let radius = grid.radius() as i32;

    for pos in Position::all() {
        let x = (pos.col as u32 * grid.cell) as i32;
        let y = (pos.row as u32 * grid.cell) as i32;
        draw_hollow_rect_mut(
            &mut overlay,
            Rect::at(x, y).of_size(grid.cell, grid.cell),
            GRID_COLOUR,
        );

        let mark = match board.get(pos) {
            Cell::White => WHITE_MARK,
            Cell::Black => BLACK_MARK,
            Cell::Empty => continue,
        };
        let (cx, cy) = grid.center(pos);
        draw_hollow_circle_mut(&mut overlay, (cx as i32, cy as i32), radius, mark);
    }
    overlay
}

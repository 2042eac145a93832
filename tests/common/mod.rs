#![allow(dead_code)]

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

pub const BOARD_LEFT: i32 = 50;
pub const BOARD_TOP: i32 = 150;
pub const CELL: i32 = 40;

pub const WHITE_DISC: Rgb<u8> = Rgb([200, 220, 235]);
pub const BLACK_DISC: Rgb<u8> = Rgb([20, 20, 20]);

/// A 420x520 screenshot: green board with the given discs and a dark
/// score badge above its top right corner.
pub fn screenshot(discs: &[(i32, i32, Rgb<u8>)]) -> RgbImage {
    let mut img = RgbImage::from_pixel(420, 520, Rgb([255, 255, 255]));
    draw_filled_rect_mut(
        &mut img,
        Rect::at(BOARD_LEFT, BOARD_TOP).of_size(8 * CELL as u32, 8 * CELL as u32),
        Rgb([0, 128, 0]),
    );
    draw_filled_rect_mut(&mut img, Rect::at(270, 40).of_size(60, 60), BLACK_DISC);
    for &(row, col, colour) in discs {
        let cx = BOARD_LEFT + col * CELL + CELL / 2;
        let cy = BOARD_TOP + row * CELL + CELL / 2;
        draw_filled_circle_mut(&mut img, (cx, cy), 16, colour);
    }
    img
}

pub fn opening_discs() -> Vec<(i32, i32, Rgb<u8>)> {
    vec![
        (3, 3, WHITE_DISC),
        (4, 4, WHITE_DISC),
        (3, 4, BLACK_DISC),
        (4, 3, BLACK_DISC),
    ]
}

pub fn save(img: &RgbImage, dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

pub fn cell_center(row: i32, col: i32) -> (i32, i32) {
    (
        BOARD_LEFT + col * CELL + CELL / 2,
        BOARD_TOP + row * CELL + CELL / 2,
    )
}

mod common;

use common::{BLACK_DISC, WHITE_DISC};
use reversi_analyzer::config::{Settings, VisionSettings};
use reversi_analyzer::engine::{Board, Cell, Color, Position};
use reversi_analyzer::pipeline::ProcessingPipeline;
use reversi_analyzer::vision::Recognizer;

#[test]
fn recognizes_drawn_layout_and_player_colour() {
    let dir = tempfile::tempdir().unwrap();
    let discs = vec![
        (0, 0, BLACK_DISC),
        (2, 5, WHITE_DISC),
        (3, 3, WHITE_DISC),
        (3, 4, BLACK_DISC),
        (4, 3, BLACK_DISC),
        (4, 4, WHITE_DISC),
        (7, 6, WHITE_DISC),
    ];
    let path = common::save(&common::screenshot(&discs), dir.path(), "shot.png");

    let recognition = Recognizer::new(&VisionSettings::default())
        .recognize_path(&path)
        .unwrap();

    let mut expected = Board::empty();
    for &(row, col, colour) in &discs {
        let cell = if colour == BLACK_DISC { Cell::Black } else { Cell::White };
        expected.set(Position::new(row as usize, col as usize), cell);
    }
    assert_eq!(recognition.board, expected);
    assert_eq!(recognition.player_color, Some(Color::Black));
    assert_eq!(recognition.screen_size.width, 420);
    assert_eq!(recognition.screen_size.height, 520);
}

#[tokio::test]
async fn pipeline_advises_the_opening_book_move() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::save(
        &common::screenshot(&common::opening_discs()),
        dir.path(),
        "opening.png",
    );

    let mut pipeline = ProcessingPipeline::from_settings(&Settings::default());
    let ctx = pipeline.process_path(&path).await.unwrap();
    assert_eq!(ctx.recognition().board, Board::new());
    assert!(ctx.metrics().recognition_duration().is_some());
    assert!(ctx.metrics().advice_duration().is_some());

    let advice = ctx.advice();
    assert!(advice.success && advice.has_move);
    let mv = advice.mv.as_ref().unwrap();
    assert_eq!((mv.row, mv.col.as_str()), (5, "F"));

    let (x, y) = common::cell_center(4, 5);
    assert!((mv.screen_coordinates.x - x).abs() <= 6, "x = {}", mv.screen_coordinates.x);
    assert!((mv.screen_coordinates.y - y).abs() <= 6, "y = {}", mv.screen_coordinates.y);
}

#[tokio::test]
async fn full_board_has_no_advice() {
    let dir = tempfile::tempdir().unwrap();
    let mut discs = Vec::new();
    for row in 0..8 {
        for col in 0..8 {
            discs.push((row, col, WHITE_DISC));
        }
    }
    let path = common::save(&common::screenshot(&discs), dir.path(), "full.png");

    let mut pipeline = ProcessingPipeline::from_settings(&Settings::default());
    let advice = pipeline.process_path(&path).await.unwrap().into_advice();
    assert!(advice.success);
    assert!(!advice.has_move);
    assert_eq!(advice.message.as_deref(), Some("No moves available"));
}

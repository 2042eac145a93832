use crate::config::{AdvisorSettings, SearchSettings, StrategyKind};
use crate::engine::board::{Board, Color, Position};
use crate::engine::heuristics::move_score;
use crate::engine::strategy::{MoveSource, Strategist};
use crate::vision::geometry::BoardQuad;
use crate::vision::recognizer::{Recognition, ScreenSize};
use serde::Serialize;
use tracing::info;

pub const NO_MOVES_MESSAGE: &str = "No moves available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveAdvice {
    /// 1-based row number as shown on the board.
    pub row: usize,
    /// Column letter `A`..`H`.
    pub col: String,
    pub score: f64,
    pub screen_coordinates: ScreenPoint,
    #[serde(skip)]
    pub position: Position,
    #[serde(skip)]
    pub source: Option<MoveSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSummary {
    pub state: Board,
    pub player_color: Color,
    pub rect: BoardQuad,
}

/// Move suggestion for one recognised screenshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub success: bool,
    pub has_move: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "move", skip_serializing_if = "Option::is_none")]
    pub mv: Option<MoveAdvice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<BoardSummary>,
    pub screen_size: ScreenSize,
}

impl Advice {
    pub fn no_moves(screen_size: ScreenSize) -> Self {
        Self {
            success: true,
            has_move: false,
            message: Some(NO_MOVES_MESSAGE.to_string()),
            mv: None,
            board: None,
            screen_size,
        }
    }
}

/// Turns a recognised board into a move and a click position.
#[derive(Debug)]
pub struct Advisor {
    strategy: StrategyKind,
    strategist: Strategist,
}

impl Advisor {
    pub fn new(advisor: &AdvisorSettings, search: &SearchSettings) -> Self {
        Self {
            strategy: advisor.strategy,
            strategist: Strategist::new(search),
        }
    }

    pub fn strategist(&self) -> &Strategist {
        &self.strategist
    }

    fn pick(&mut self, board: &Board, color: Color) -> Option<(Position, f64, Option<MoveSource>)> {
        match self.strategy {
            StrategyKind::Adaptive => self
                .strategist
                .best_move(board, color, None, None)
                .map(|c| (c.position, c.score, Some(c.source))),
            StrategyKind::Greedy => {
                let mut best: Option<(Position, i32)> = None;
                for pos in board.valid_moves(color) {
                    let score = move_score(board, pos, color);
                    if best.map_or(true, |(_, s)| score > s) {
                        best = Some((pos, score));
                    }
                }
                best.map(|(pos, score)| (pos, score as f64, None))
            }
        }
    }

    pub fn advise(&mut self, recognition: &Recognition) -> Advice {
        let color = recognition.player_color.unwrap_or(Color::Black);
        let board = recognition.board;

        let Some((position, score, source)) = self.pick(&board, color) else {
            info!(%color, "No legal move for player");
            return Advice::no_moves(recognition.screen_size);
        };

        let (x, y) = recognition.board_rect.cell_center(position.row, position.col);
        info!(mv = %position, score, x, y, "Move advised");

        Advice {
            success: true,
            has_move: true,
            message: None,
            mv: Some(MoveAdvice {
                row: position.row + 1,
                col: position.col_letter().to_string(),
                score,
                screen_coordinates: ScreenPoint { x, y },
                position,
                source,
            }),
            board: Some(BoardSummary {
                state: board,
                player_color: color,
                rect: recognition.board_rect,
            }),
            screen_size: recognition.screen_size,
        }
    }
}

use super::board::{detect_opponent_move, Board, Color, Outcome, PieceCount};
use super::game_log::{GameLog, MoveRecord};
use super::opponent::{Opponent, Strength};
use super::strategy::Strategist;
use crate::config::SearchSettings;
use crate::error::AppError;
use serde::Serialize;
use tracing::{debug, info};

/// Upper bound on loop turns; a real game never needs more than 60 moves plus passes.
const MAX_TURNS: u32 = 128;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResult {
    pub our_color: Color,
    pub strength: Strength,
    pub final_board: Board,
    pub pieces: PieceCount,
    pub outcome: Option<Outcome>,
    pub moves_played: u32,
}

impl GameResult {
    pub fn we_won(&self) -> bool {
        self.outcome == Some(Outcome::Win(self.our_color))
    }
}

/// Strategist against the simulated opponent, from the standard opening.
#[derive(Debug)]
pub struct SelfPlay {
    our_color: Color,
    strategist: Strategist,
    opponent: Opponent,
}

impl SelfPlay {
    pub fn new(our_color: Color, strength: Strength, settings: &SearchSettings) -> Self {
        Self {
            our_color,
            strategist: Strategist::new(settings),
            opponent: Opponent::new(strength, settings),
        }
    }

    pub fn with_strategist(mut self, strategist: Strategist) -> Self {
        self.strategist = strategist;
        self
    }

    pub fn strategist(&self) -> &Strategist {
        &self.strategist
    }

    /// Play one game to the end, recording every move in `log` when given.
    pub fn play(&mut self, mut log: Option<&mut GameLog>) -> Result<GameResult, AppError> {
        let mut board = Board::new();
        let mut to_move = Color::Black;
        let mut moves_played = 0;
        let mut before_their_move: Option<Board> = None;

        for _ in 0..MAX_TURNS {
            if board.is_game_over() {
                break;
            }

            if to_move == self.our_color {
                let opponent_move = before_their_move
                    .take()
                    .and_then(|prev| detect_opponent_move(&prev, &board, self.our_color));
                if let Some(choice) = self.strategist.best_move(&board, to_move, None, None) {
                    board.make_move(choice.position, to_move);
                    moves_played += 1;
                    debug!(mv = %choice.position, source = %choice.source, "Our move");
                    if let Some(log) = log.as_deref_mut() {
                        log.record(
                            moves_played,
                            &board,
                            to_move,
                            MoveRecord {
                                mv: Some(choice.position),
                                opponent_move,
                                algorithm: Some(choice.source.as_str()),
                                algorithm_stats: Some(self.strategist.stats()),
                                is_our_move: Some(true),
                            },
                        )?;
                    }
                } else {
                    debug!(color = %to_move, "We pass");
                }
            } else {
                before_their_move = Some(board);
                if let Some(position) = self.opponent.choose(&board, to_move) {
                    board.make_move(position, to_move);
                    moves_played += 1;
                    debug!(mv = %position, "Opponent move");
                    if let Some(log) = log.as_deref_mut() {
                        log.record(
                            moves_played,
                            &board,
                            to_move,
                            MoveRecord {
                                opponent_move: Some(position),
                                algorithm: Some(self.opponent.strength().as_str()),
                                is_our_move: Some(false),
                                ..MoveRecord::default()
                            },
                        )?;
                    }
                } else {
                    debug!(color = %to_move, "Opponent passes");
                }
            }
            to_move = to_move.opponent();
        }

        let result = GameResult {
            our_color: self.our_color,
            strength: self.opponent.strength(),
            final_board: board,
            pieces: board.count(),
            outcome: board.winner(),
            moves_played,
        };
        info!(
            our_color = %result.our_color,
            strength = %result.strength,
            black = result.pieces.black,
            white = result.pieces.white,
            won = result.we_won(),
            "Game finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::search::{Mcts, Minimax, NegaScout};
    use std::time::Duration;

    fn quick_strategist() -> Strategist {
        Strategist::with_algorithms(
            Mcts::new(50, 1.414, Duration::from_millis(20), Some(3)),
            NegaScout::new(Duration::from_millis(20)),
            Minimax::new(Duration::from_millis(20)),
        )
    }

    #[test]
    fn game_against_weak_opponent_runs_to_completion() {
        let settings = SearchSettings::default().with_seed(11);
        let mut game = SelfPlay::new(Color::Black, Strength::Weak, &settings)
            .with_strategist(quick_strategist());
        let result = game.play(None).unwrap();

        assert!(result.final_board.is_game_over());
        assert!(result.moves_played <= 60);
        assert_eq!(result.pieces.discs(), 4 + result.moves_played);
        assert!(result.outcome.is_some());
    }

    #[test]
    fn every_move_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = GameLog::at(dir.path().join("game_selfplay.json"));
        let settings = SearchSettings::default().with_seed(5);
        let mut game = SelfPlay::new(Color::White, Strength::Medium, &settings)
            .with_strategist(quick_strategist());
        let result = game.play(Some(&mut log)).unwrap();

        assert_eq!(log.entries().len() as u32, result.moves_played);
        let first = &log.entries()[0];
        assert_eq!(first.player, Color::Black);
        assert_eq!(first.is_our_move, Some(false));
        assert_eq!(first.algorithm, "medium");

        let ours: Vec<_> = log
            .entries()
            .iter()
            .filter(|e| e.is_our_move == Some(true))
            .collect();
        assert!(!ours.is_empty());
        assert!(ours.iter().all(|e| e.player == Color::White && e.mv.is_some()));
        assert!(ours[0].opponent_move.is_some());
        assert_eq!(GameLog::load(log.path()).unwrap().len(), log.entries().len());
    }
}

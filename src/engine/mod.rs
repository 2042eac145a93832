pub mod board;
pub mod game_log;
pub mod heuristics;
pub mod opponent;
pub mod search;
pub mod self_play;
pub mod strategy;

pub use board::{detect_opponent_move, Board, Cell, Color, Outcome, PieceCount, Position};
pub use game_log::{GameLog, GameLogEntry, LogSummary, MoveRecord};
pub use heuristics::{evaluate_position, move_score, GamePhase};
pub use opponent::{Opponent, Strength};
pub use search::{Mcts, Minimax, NegaScout, SearchAlgorithm, SearchOutcome};
pub use self_play::{GameResult, SelfPlay};
pub use strategy::{AlgorithmStats, Choice, MoveSource, Strategist};

pub mod mcts;
pub mod minimax;
pub mod negascout;

pub use mcts::Mcts;
pub use minimax::Minimax;
pub use negascout::NegaScout;

use super::board::{Board, Color, Position};
use super::heuristics::GamePhase;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Score reported for an immediate corner capture.
pub const CORNER_SCORE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub position: Position,
    pub score: f64,
}

impl SearchOutcome {
    pub fn new(position: Position, score: f64) -> Self {
        Self { position, score }
    }
}

/// A move finder driven by one caller at a time.
pub trait SearchAlgorithm: Send {
    fn name(&self) -> &'static str;

    /// Best move for `color`, `None` when it has no legal move.
    fn best_move(
        &mut self,
        board: &Board,
        color: Color,
        max_depth: Option<u8>,
    ) -> Option<SearchOutcome>;
}

/// What a search does at the root before any tree work.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RootMoves {
    /// Several candidates, none of them a corner.
    Search(Vec<Position>),
    /// Settled without searching: no move, a forced move or a corner.
    Decided(Option<SearchOutcome>),
}

/// Shortcuts shared by every algorithm: no move, a forced move, a corner.
pub(crate) fn root_moves(board: &Board, color: Color) -> RootMoves {
    let moves = board.valid_moves(color);
    match moves.as_slice() {
        [] => RootMoves::Decided(None),
        [only] => RootMoves::Decided(Some(SearchOutcome::new(*only, 0.0))),
        _ => match moves.iter().find(|p| p.is_corner()) {
            Some(corner) => RootMoves::Decided(Some(SearchOutcome::new(*corner, CORNER_SCORE))),
            None => RootMoves::Search(moves),
        },
    }
}

/// Corners first, then edges, then everything else, keeping board order within each group.
pub fn order_moves(moves: &[Position]) -> Vec<Position> {
    let mut ordered: Vec<Position> = moves.to_vec();
    ordered.sort_by_key(|p| {
        if p.is_corner() {
            0
        } else if p.is_edge() {
            1
        } else {
            2
        }
    });
    ordered
}

/// Search depth picked from the number of empty squares.
pub fn default_depth(empty: u32) -> u8 {
    if empty <= 10 {
        9
    } else if empty <= 15 {
        7
    } else {
        5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TableEntry {
    pub score: f64,
    pub depth: i32,
    pub bound: Bound,
}

/// Transposition table keyed by position and side to move.
///
/// An entry answers any probe at its own depth or shallower.
#[derive(Debug, Default)]
pub(crate) struct TranspositionTable {
    entries: HashMap<(Board, Color), TableEntry>,
    pub hits: u64,
}

impl TranspositionTable {
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
    }

    /// Keeps the deeper of the stored and the new result.
    pub fn store(&mut self, board: &Board, color: Color, depth: i32, score: f64, bound: Bound) {
        let entry = TableEntry {
            score,
            depth,
            bound,
        };
        self.entries
            .entry((*board, color))
            .and_modify(|existing| {
                if depth >= existing.depth {
                    *existing = entry;
                }
            })
            .or_insert(entry);
    }

    /// Narrow `alpha`/`beta` from a stored entry. Returns a score when the node is resolved.
    pub fn probe(
        &mut self,
        board: &Board,
        color: Color,
        depth: i32,
        alpha: &mut f64,
        beta: &mut f64,
    ) -> Option<f64> {
        let entry = *self.entries.get(&(*board, color))?;
        if entry.depth < depth {
            return None;
        }
        self.hits += 1;
        match entry.bound {
            Bound::Exact => return Some(entry.score),
            Bound::Lower if entry.score > *alpha => *alpha = entry.score,
            Bound::Upper if entry.score < *beta => *beta = entry.score,
            _ => {}
        }
        (*alpha >= *beta).then_some(entry.score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Per-search state threaded through the recursion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchContext {
    pub phase: GamePhase,
    pub deadline: Deadline,
}

/// Wall clock budget for one search.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn start(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

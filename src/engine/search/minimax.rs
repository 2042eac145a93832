use super::{
    default_depth, order_moves, root_moves, Bound, Deadline, RootMoves, SearchAlgorithm,
    SearchContext, SearchOutcome, TranspositionTable,
};
use crate::engine::board::{Board, Color, Position};
use crate::engine::heuristics::{evaluate_position, GamePhase};
use std::time::Duration;
use tracing::debug;

/// Negamax with alpha-beta pruning and iterative deepening.
#[derive(Debug)]
pub struct Minimax {
    max_time: Duration,
    table: TranspositionTable,
    nodes: u64,
}

impl Minimax {
    pub fn new(max_time: Duration) -> Self {
        Self {
            max_time,
            table: TranspositionTable::default(),
            nodes: 0,
        }
    }

    pub fn nodes_visited(&self) -> u64 {
        self.nodes
    }

    fn alpha_beta(
        &mut self,
        board: &Board,
        depth: i32,
        mut alpha: f64,
        mut beta: f64,
        color: Color,
        ctx: &SearchContext,
    ) -> f64 {
        self.nodes += 1;

        if ctx.deadline.expired() {
            return evaluate_position(board, color, ctx.phase);
        }

        if let Some(score) = self.table.probe(board, color, depth, &mut alpha, &mut beta) {
            return score;
        }

        if depth <= 0 || board.is_game_over() {
            let score = evaluate_position(board, color, ctx.phase);
            self.table.store(board, color, depth, score, Bound::Exact);
            return score;
        }

        let moves = board.valid_moves(color);
        if moves.is_empty() {
            // only reachable when the opponent can still move
            return -self.alpha_beta(board, depth - 1, -beta, -alpha, color.opponent(), ctx);
        }

        let mut best = f64::NEG_INFINITY;
        let mut bound = Bound::Upper;
        for pos in order_moves(&moves) {
            if ctx.deadline.expired() {
                break;
            }
            let Some(child) = board.apply(pos, color) else {
                continue;
            };
            let child_depth = if pos.is_corner() { depth } else { depth - 1 };
            let score = -self.alpha_beta(&child, child_depth, -beta, -alpha, color.opponent(), ctx);

            if score > best {
                best = score;
                bound = Bound::Exact;
            }
            alpha = alpha.max(best);
            if alpha >= beta {
                self.table.store(board, color, depth, best, Bound::Lower);
                return best;
            }
        }

        self.table.store(board, color, depth, best, bound);
        best
    }

    fn search_root(
        &mut self,
        board: &Board,
        color: Color,
        moves: &[Position],
        depth: i32,
        ctx: &SearchContext,
    ) -> Option<SearchOutcome> {
        let mut alpha = f64::NEG_INFINITY;
        let beta = f64::INFINITY;
        let mut best: Option<SearchOutcome> = None;

        for &pos in moves {
            if ctx.deadline.expired() {
                break;
            }
            let Some(child) = board.apply(pos, color) else {
                continue;
            };
            let child_depth = if pos.is_corner() { depth } else { depth - 1 };
            let score = -self.alpha_beta(&child, child_depth, -beta, -alpha, color.opponent(), ctx);
            if best.map_or(true, |b| score > b.score) {
                best = Some(SearchOutcome::new(pos, score));
                alpha = alpha.max(score);
            }
        }
        best
    }
}

impl Default for Minimax {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl SearchAlgorithm for Minimax {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn best_move(
        &mut self,
        board: &Board,
        color: Color,
        max_depth: Option<u8>,
    ) -> Option<SearchOutcome> {
        let ctx = SearchContext {
            phase: GamePhase::of(board),
            deadline: Deadline::start(self.max_time),
        };
        self.nodes = 0;
        self.table.clear();

        let moves = match root_moves(board, color) {
            RootMoves::Search(moves) => order_moves(&moves),
            RootMoves::Decided(outcome) => return outcome,
        };

        let max_depth = max_depth.unwrap_or_else(|| default_depth(board.empty_count())) as i32;
        let mut depth = max_depth.min(3);
        let mut best: Option<SearchOutcome> = None;

        while depth <= max_depth && !ctx.deadline.expired() {
            if let Some(found) = self.search_root(board, color, &moves, depth, &ctx) {
                if best.map_or(true, |b| found.score > b.score) {
                    best = Some(found);
                }
            }
            depth += 1;
        }

        debug!(
            depth = depth - 1,
            nodes = self.nodes,
            tt_hits = self.table.hits,
            elapsed_ms = ctx.deadline.elapsed().as_millis() as u64,
            "Minimax search finished"
        );
        best.or_else(|| moves.first().map(|&p| SearchOutcome::new(p, 0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::Cell;

    #[test]
    fn returns_legal_move_from_opening() {
        let board = Board::new();
        let mut minimax = Minimax::default();
        let outcome = minimax.best_move(&board, Color::Black, Some(3)).unwrap();
        assert!(board.is_valid_move(outcome.position, Color::Black));
        assert!(minimax.nodes_visited() > 0);
    }

    #[test]
    fn no_moves_yields_none() {
        let board = Board::from_cells([[Cell::White; 8]; 8]);
        assert!(Minimax::default().best_move(&board, Color::Black, None).is_none());
    }

    #[test]
    fn corner_is_taken_immediately() {
        let mut board = Board::new();
        board.set(Position::new(0, 1), Cell::White);
        board.set(Position::new(0, 2), Cell::Black);
        let outcome = Minimax::default().best_move(&board, Color::Black, None).unwrap();
        assert_eq!(outcome.position, Position::new(0, 0));
        assert_eq!(outcome.score, super::super::CORNER_SCORE);
    }

    #[test]
    fn deep_search_respects_time_budget() {
        let mut board = Board::new();
        for (pos, color) in [
            (Position::new(4, 5), Color::Black),
            (Position::new(5, 3), Color::White),
            (Position::new(2, 2), Color::Black),
        ] {
            assert!(board.make_move(pos, color));
        }

        let started = std::time::Instant::now();
        let outcome = Minimax::new(Duration::from_millis(50))
            .best_move(&board, Color::White, Some(9))
            .unwrap();
        assert!(board.is_valid_move(outcome.position, Color::White));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}

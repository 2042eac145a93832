use super::{
    default_depth, order_moves, root_moves, Bound, Deadline, RootMoves, SearchAlgorithm,
    SearchContext, SearchOutcome, TranspositionTable,
};
use crate::engine::board::{Board, Color, Position};
use crate::engine::heuristics::{evaluate_position, GamePhase};
use std::time::Duration;
use tracing::debug;

/// Width of the scout window around alpha.
const NULL_WINDOW: f64 = 1e-6;

/// Principal variation search: the first move gets a full window, later moves
/// are probed with a null window and re-searched only when they beat alpha.
#[derive(Debug)]
pub struct NegaScout {
    max_time: Duration,
    table: TranspositionTable,
    nodes: u64,
    re_searches: u64,
}

impl NegaScout {
    pub fn new(max_time: Duration) -> Self {
        Self {
            max_time,
            table: TranspositionTable::default(),
            nodes: 0,
            re_searches: 0,
        }
    }

    fn scout(
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

        let alpha_orig = alpha;
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
            return -self.scout(board, depth - 1, -beta, -alpha, color.opponent(), ctx);
        }

        let mut best = f64::NEG_INFINITY;
        for (i, pos) in order_moves(&moves).into_iter().enumerate() {
            if ctx.deadline.expired() {
                break;
            }
            let Some(child) = board.apply(pos, color) else {
                continue;
            };
            let child_depth = if pos.is_corner() { depth } else { depth - 1 };
            let opp = color.opponent();

            let score = if i == 0 {
                -self.scout(&child, child_depth, -beta, -alpha, opp, ctx)
            } else {
                let probe = -self.scout(&child, child_depth, -alpha - NULL_WINDOW, -alpha, opp, ctx);
                if probe > alpha && probe < beta {
                    self.re_searches += 1;
                    -self.scout(&child, child_depth, -beta, -probe, opp, ctx)
                } else {
                    probe
                }
            };

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                self.table.store(board, color, depth, best, Bound::Lower);
                return best;
            }
        }

        let bound = if best <= alpha_orig {
            Bound::Upper
        } else {
            Bound::Exact
        };
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
            let opp = color.opponent();

            let score = match best {
                None => -self.scout(&child, child_depth, -beta, -alpha, opp, ctx),
                Some(_) => {
                    let probe = -self.scout(&child, child_depth, -alpha - NULL_WINDOW, -alpha, opp, ctx);
                    if probe > alpha {
                        self.re_searches += 1;
                        -self.scout(&child, child_depth, -beta, -probe, opp, ctx)
                    } else {
                        probe
                    }
                }
            };

            if best.map_or(true, |b| score > b.score) {
                best = Some(SearchOutcome::new(pos, score));
                alpha = alpha.max(score);
            }
        }
        best
    }
}

impl Default for NegaScout {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl SearchAlgorithm for NegaScout {
    fn name(&self) -> &'static str {
        "negascout"
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
        self.re_searches = 0;
        self.table.clear();

        let moves = match root_moves(board, color) {
            RootMoves::Search(moves) => order_moves(&moves),
            RootMoves::Decided(outcome) => return outcome,
        };

        let max_depth = max_depth.unwrap_or_else(|| default_depth(board.empty_count())) as i32;
        let mut depth = max_depth.min(3);
        let mut best: Option<SearchOutcome> = None;
        let mut moves = moves;

        while depth <= max_depth && !ctx.deadline.expired() {
            if let Some(found) = self.search_root(board, color, &moves, depth, &ctx) {
                // search the previous best first on the next iteration
                if let Some(idx) = moves.iter().position(|&p| p == found.position) {
                    let pv = moves.remove(idx);
                    moves.insert(0, pv);
                }
                best = Some(found);
            }
            depth += 1;
        }

        debug!(
            depth = depth - 1,
            nodes = self.nodes,
            re_searches = self.re_searches,
            tt_hits = self.table.hits,
            tt_size = self.table.len(),
            "NegaScout search finished"
        );
        best.or_else(|| moves.first().map(|&p| SearchOutcome::new(p, 0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::search::Minimax;

    fn midgame() -> Board {
        let mut board = Board::new();
        for (pos, color) in [
            (Position::new(4, 5), Color::Black),
            (Position::new(5, 3), Color::White),
            (Position::new(2, 2), Color::Black),
            (Position::new(2, 3), Color::White),
            (Position::new(3, 2), Color::Black),
        ] {
            assert!(board.make_move(pos, color), "{pos}");
        }
        board
    }

    #[test]
    fn returns_legal_move() {
        let board = midgame();
        let outcome = NegaScout::default()
            .best_move(&board, Color::White, Some(3))
            .unwrap();
        assert!(board.is_valid_move(outcome.position, Color::White));
    }

    #[test]
    fn agrees_with_minimax_on_shallow_search() {
        let board = midgame();
        let budget = Duration::from_secs(30);
        let pvs = NegaScout::new(budget)
            .best_move(&board, Color::White, Some(2))
            .unwrap();
        let ab = Minimax::new(budget)
            .best_move(&board, Color::White, Some(2))
            .unwrap();
        assert!((pvs.score - ab.score).abs() < 1e-4, "{} vs {}", pvs.score, ab.score);
    }

    #[test]
    fn no_moves_yields_none() {
        let board = Board::empty();
        assert!(NegaScout::default().best_move(&board, Color::White, None).is_none());
    }
}

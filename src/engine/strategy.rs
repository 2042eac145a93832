use super::board::{Board, Color, Position};
use super::heuristics::{gives_corner_access, GamePhase};
use super::search::{Mcts, Minimax, NegaScout, SearchAlgorithm, SearchOutcome, CORNER_SCORE};
use crate::config::SearchSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Fixed opening line, one move per ply.
const OPENING_LINE: &str = "F5D6C3D3C4F4F6F3E6E7D7C5B6D8C6C7D2B5A5A6A7G5E3B4C8G6G4C2E8D1F7E2G3H4F1E1F2G1B1F8G8B3H3B2H5B7A3A4A1A2C1H2H1G2B8A8G7H8H7H6";

const SAFE_MOVE_SCORE: f64 = 0.95;
const FALLBACK_SCORE: f64 = 0.5;
const EARLY_MCTS_ITERATIONS: u32 = 2000;

fn opening_book() -> Vec<Position> {
    OPENING_LINE
        .as_bytes()
        .chunks(2)
        .filter_map(|pair| std::str::from_utf8(pair).ok()?.parse().ok())
        .collect()
}

/// Where a chosen move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveSource {
    OpeningBook,
    Corner,
    SafeGreedy,
    Mcts,
    NegaScout,
    Minimax,
    Fallback,
}

impl MoveSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveSource::OpeningBook => "opening_book",
            MoveSource::Corner => "corner",
            MoveSource::SafeGreedy => "safe_greedy",
            MoveSource::Mcts => "mcts",
            MoveSource::NegaScout => "negascout",
            MoveSource::Minimax => "minimax",
            MoveSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for MoveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Choice {
    pub position: Position,
    pub score: f64,
    pub source: MoveSource,
}

/// Usage counters for one search algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmStats {
    pub used: u32,
    /// Total seconds spent in the algorithm.
    pub time: f64,
    pub avg_score: f64,
}

impl AlgorithmStats {
    fn record(&mut self, elapsed: Duration, score: f64) {
        self.used += 1;
        self.time += elapsed.as_secs_f64();
        self.avg_score += (score - self.avg_score) / self.used as f64;
    }

    pub fn mean_time(&self) -> f64 {
        self.time / self.used.max(1) as f64
    }
}

/// Picks a move by game phase: book and corner shortcuts first, then one of
/// the three searches.
pub struct Strategist {
    book: Vec<Position>,
    mcts: Mcts,
    negascout: NegaScout,
    minimax: Minimax,
    stats: BTreeMap<&'static str, AlgorithmStats>,
}

impl Strategist {
    pub fn new(settings: &SearchSettings) -> Self {
        let budget = settings.time_budget();
        let mcts = Mcts::new(
            settings.mcts_iterations,
            settings.mcts_exploration,
            budget,
            settings.seed,
        );
        Self::with_algorithms(mcts, NegaScout::new(budget), Minimax::new(budget))
    }

    pub fn with_algorithms(mcts: Mcts, negascout: NegaScout, minimax: Minimax) -> Self {
        let stats = [mcts.name(), negascout.name(), minimax.name()]
            .into_iter()
            .map(|name| (name, AlgorithmStats::default()))
            .collect();
        Self {
            book: opening_book(),
            mcts,
            negascout,
            minimax,
            stats,
        }
    }

    pub fn stats(&self) -> &BTreeMap<&'static str, AlgorithmStats> {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.values_mut().for_each(|s| *s = AlgorithmStats::default());
    }

    fn book_move(&self, board: &Board, color: Color) -> Option<Position> {
        let discs = board.count().discs();
        if discs >= 10 {
            return None;
        }
        let played = discs.saturating_sub(4) as usize;
        self.book
            .get(played)
            .copied()
            .filter(|&pos| board.is_valid_move(pos, color))
    }

    fn safe_greedy_move(board: &Board, color: Color, moves: &[Position]) -> Option<Position> {
        let mut best: Option<(Position, u32)> = None;
        for &pos in moves.iter().filter(|&&p| !gives_corner_access(board, p)) {
            let Some(next) = board.apply(pos, color) else {
                continue;
            };
            let ours = next.count().of(color);
            if best.map_or(true, |(_, n)| ours > n) {
                best = Some((pos, ours));
            }
        }
        best.map(|(pos, _)| pos)
    }

    /// Best move for `color`, or `None` when it has no legal move.
    ///
    /// `phase` defaults to the phase derived from the empty count. `max_depth`
    /// overrides the per-phase depth of the tree searches.
    pub fn best_move(
        &mut self,
        board: &Board,
        color: Color,
        max_depth: Option<u8>,
        phase: Option<GamePhase>,
    ) -> Option<Choice> {
        let moves = board.valid_moves(color);
        if moves.is_empty() {
            return None;
        }
        let empty = board.empty_count();
        let phase = phase.unwrap_or_else(|| GamePhase::from_empty_count(empty));

        if let Some(position) = self.book_move(board, color) {
            return Some(Choice {
                position,
                score: CORNER_SCORE,
                source: MoveSource::OpeningBook,
            });
        }

        if let Some(&position) = moves.iter().find(|p| p.is_corner()) {
            return Some(Choice {
                position,
                score: CORNER_SCORE,
                source: MoveSource::Corner,
            });
        }

        if empty > 48 || phase == GamePhase::Early {
            if let Some(position) = Self::safe_greedy_move(board, color, &moves) {
                return Some(Choice {
                    position,
                    score: SAFE_MOVE_SCORE,
                    source: MoveSource::SafeGreedy,
                });
            }
        }

        let (algorithm, source, depth) = if phase == GamePhase::Early || empty > 45 {
            self.mcts.set_iterations(EARLY_MCTS_ITERATIONS);
            (&mut self.mcts as &mut dyn SearchAlgorithm, MoveSource::Mcts, max_depth)
        } else if phase == GamePhase::Middle || empty > 15 {
            let depth = max_depth.unwrap_or(if empty < 25 { 6 } else { 5 });
            (&mut self.negascout as &mut dyn SearchAlgorithm, MoveSource::NegaScout, Some(depth))
        } else {
            let depth = max_depth.unwrap_or(if empty < 10 { 9 } else { 7 });
            (&mut self.minimax as &mut dyn SearchAlgorithm, MoveSource::Minimax, Some(depth))
        };

        let name = algorithm.name();
        let started = Instant::now();
        let found = algorithm.best_move(board, color, depth);
        let elapsed = started.elapsed();

        let (choice, score) = match found {
            Some(SearchOutcome { position, score }) => (
                Choice {
                    position,
                    score,
                    source,
                },
                score,
            ),
            None => (
                Choice {
                    position: moves[0],
                    score: FALLBACK_SCORE,
                    source: MoveSource::Fallback,
                },
                FALLBACK_SCORE,
            ),
        };
        self.stats.entry(name).or_default().record(elapsed, score);

        debug!(
            algorithm = name,
            %phase,
            empty,
            elapsed_ms = elapsed.as_millis() as u64,
            "Search finished"
        );
        info!(
            mv = %choice.position,
            score = choice.score,
            source = %choice.source,
            "Move chosen"
        );
        Some(choice)
    }
}

impl fmt::Debug for Strategist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategist")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

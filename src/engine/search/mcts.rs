use super::{root_moves, RootMoves, SearchAlgorithm, SearchOutcome};
use crate::engine::board::{Board, Color, Outcome, Position};
use crate::engine::heuristics::{evaluate_position, position_weight, GamePhase};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::debug;

const PLAYOUT_MOVE_CAP: usize = 40;
const CORNER_BONUS: f64 = 0.2;

#[derive(Debug, Clone)]
struct Node {
    board: Board,
    /// Side to play from this node, `None` once the game is over.
    to_move: Option<Color>,
    /// Side whose move produced this node.
    mover: Option<Color>,
    mv: Option<Position>,
    parent: Option<usize>,
    children: Vec<usize>,
    untried: Vec<Position>,
    visits: u32,
    /// Accumulated reward from `mover`'s point of view.
    wins: f64,
}

impl Node {
    fn new(board: Board, to_move: Option<Color>, mover: Option<Color>, mv: Option<Position>, parent: Option<usize>) -> Self {
        let untried = to_move.map(|c| board.valid_moves(c)).unwrap_or_default();
        Self {
            board,
            to_move,
            mover,
            mv,
            parent,
            children: Vec::new(),
            untried,
            visits: 0,
            wins: 0.0,
        }
    }
}

/// Who plays after `just_moved`, accounting for passes.
fn next_to_move(board: &Board, just_moved: Color) -> Option<Color> {
    let other = just_moved.opponent();
    if board.has_valid_move(other) {
        Some(other)
    } else if board.has_valid_move(just_moved) {
        Some(just_moved)
    } else {
        None
    }
}

/// Monte Carlo tree search over an index arena. The tree survives between
/// calls so the subtree for the next position can be reused.
#[derive(Debug)]
pub struct Mcts {
    iterations: u32,
    exploration: f64,
    max_time: Duration,
    rng: StdRng,
    nodes: Vec<Node>,
}

impl Mcts {
    pub fn new(iterations: u32, exploration: f64, max_time: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            iterations,
            exploration,
            max_time,
            rng,
            nodes: Vec::new(),
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.iterations = iterations;
    }

    pub fn tree_size(&self) -> usize {
        self.nodes.len()
    }

    /// Reuse a child or grandchild of the previous root when it matches `board`.
    fn prepare_root(&mut self, board: &Board, color: Color) -> bool {
        let found = self.nodes.first().and_then(|root| {
            root.children
                .iter()
                .chain(root.children.iter().flat_map(|&c| self.nodes[c].children.iter()))
                .copied()
                .find(|&idx| {
                    let node = &self.nodes[idx];
                    node.board == *board && node.to_move == Some(color)
                })
        });

        match found {
            Some(idx) => {
                self.reroot(idx);
                true
            }
            None => {
                self.nodes = vec![Node::new(*board, Some(color), None, None, None)];
                false
            }
        }
    }

    /// Keep only the subtree under `idx`, compacting the arena.
    fn reroot(&mut self, idx: usize) {
        let old = std::mem::take(&mut self.nodes);
        let mut queue = vec![(idx, None)];
        while let Some((old_idx, parent)) = queue.pop() {
            let mut node = old[old_idx].clone();
            let new_idx = self.nodes.len();
            node.parent = parent;
            if parent.is_none() {
                node.mover = None;
                node.mv = None;
            }
            let children = std::mem::take(&mut node.children);
            self.nodes.push(node);
            if let Some(p) = parent {
                self.nodes[p].children.push(new_idx);
            }
            for child in children.into_iter().rev() {
                queue.push((child, Some(new_idx)));
            }
        }
    }

    fn select_child(&self, idx: usize) -> usize {
        let node = &self.nodes[idx];
        let visited = node
            .children
            .iter()
            .filter(|&&c| self.nodes[c].visits > 0)
            .count();
        let weight = if node.visits > 500 {
            self.exploration * 0.8
        } else if visited > 2 {
            self.exploration * 0.9
        } else {
            self.exploration
        };

        let ln_parent = (node.visits.max(1) as f64).ln();
        let mut best = node.children[0];
        let mut best_value = f64::NEG_INFINITY;
        for &c in &node.children {
            let child = &self.nodes[c];
            if child.visits == 0 {
                return c;
            }
            let visits = child.visits as f64;
            let mut value = child.wins / visits + weight * (ln_parent / visits).sqrt();
            if child.mv.is_some_and(|m| m.is_corner()) {
                value += CORNER_BONUS;
            }
            if value > best_value {
                best_value = value;
                best = c;
            }
        }
        best
    }

    fn expand(&mut self, idx: usize) -> usize {
        let (board, color, pick) = {
            let node = &self.nodes[idx];
            let Some(color) = node.to_move else {
                return idx;
            };
            let pick = if self.rng.random::<f64>() < 0.7 {
                // first square with the highest positional weight
                node.untried
                    .iter()
                    .enumerate()
                    .fold(None::<(usize, i32)>, |best, (i, &p)| match best {
                        Some((_, w)) if w >= position_weight(p) => best,
                        _ => Some((i, position_weight(p))),
                    })
                    .map(|(i, _)| i)
            } else {
                (!node.untried.is_empty()).then(|| self.rng.random_range(0..node.untried.len()))
            };
            (node.board, color, pick)
        };
        let Some(pick) = pick else {
            return idx;
        };

        let mv = self.nodes[idx].untried.remove(pick);
        let Some(next) = board.apply(mv, color) else {
            return idx;
        };
        let child = Node::new(next, next_to_move(&next, color), Some(color), Some(mv), Some(idx));
        let child_idx = self.nodes.len();
        self.nodes.push(child);
        self.nodes[idx].children.push(child_idx);
        child_idx
    }

    fn playout_move(&mut self, board: &Board, color: Color) -> Option<Position> {
        let moves = board.valid_moves(color);
        if moves.is_empty() {
            return None;
        }
        if self.rng.random::<f64>() >= 0.8 {
            return moves.choose(&mut self.rng).copied();
        }

        let before = board.count().of(color) as i32;
        let mut scored: Vec<(Position, i32)> = moves
            .iter()
            .map(|&p| {
                let mut value = position_weight(p);
                if p.is_corner() {
                    value += 1000;
                } else if p.is_edge() {
                    value += 100;
                }
                let after = board
                    .apply(p, color)
                    .map_or(before, |b| b.count().of(color) as i32);
                (p, value + (after - before) * 10)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        if self.rng.random::<f64>() < 0.8 {
            Some(scored[0].0)
        } else {
            let top = scored.len().min(3);
            Some(scored[self.rng.random_range(0..top)].0)
        }
    }

    /// Reward in `[0, 1]` for `perspective` from a playout starting at `idx`.
    fn simulate(&mut self, idx: usize, perspective: Color) -> f64 {
        let mut board = self.nodes[idx].board;
        let mut current = self.nodes[idx].to_move;
        let mut played = 0;

        while let Some(color) = current {
            if played >= PLAYOUT_MOVE_CAP {
                break;
            }
            let Some(mv) = self.playout_move(&board, color) else {
                break;
            };
            board.make_move(mv, color);
            current = next_to_move(&board, color);
            played += 1;
        }

        match board.winner() {
            Some(Outcome::Win(c)) if c == perspective => 1.0,
            Some(Outcome::Win(_)) => 0.0,
            Some(Outcome::Tie) => 0.5,
            None => (evaluate_position(&board, perspective, GamePhase::of(&board)) + 1.0) / 2.0,
        }
    }

    fn backpropagate(&mut self, mut idx: usize, reward: f64, perspective: Color) {
        loop {
            let node = &mut self.nodes[idx];
            node.visits += 1;
            match node.mover {
                Some(c) if c == perspective => node.wins += reward,
                Some(_) => node.wins += 1.0 - reward,
                None => {}
            }
            match node.parent {
                Some(parent) => idx = parent,
                None => break,
            }
        }
    }
}

impl Default for Mcts {
    fn default() -> Self {
        Self::new(3000, 1.414, Duration::from_millis(500), None)
    }
}

impl SearchAlgorithm for Mcts {
    fn name(&self) -> &'static str {
        "mcts"
    }

    /// `max_depth` is ignored: the search is bounded by iterations and time.
    fn best_move(
        &mut self,
        board: &Board,
        color: Color,
        _max_depth: Option<u8>,
    ) -> Option<SearchOutcome> {
        let moves = match root_moves(board, color) {
            RootMoves::Search(moves) => moves,
            RootMoves::Decided(outcome) => return outcome,
        };

        let start = Instant::now();
        let reused = self.prepare_root(board, color);
        let mut iterations = 0;

        while iterations < self.iterations && start.elapsed() < self.max_time {
            let mut idx = 0;
            while self.nodes[idx].untried.is_empty() && !self.nodes[idx].children.is_empty() {
                idx = self.select_child(idx);
            }
            if !self.nodes[idx].untried.is_empty() {
                idx = self.expand(idx);
            }
            let reward = self.simulate(idx, color);
            self.backpropagate(idx, reward, color);
            iterations += 1;
        }

        debug!(
            iterations,
            reused,
            tree = self.nodes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "MCTS search finished"
        );

        let root = &self.nodes[0];
        let best = root
            .children
            .iter()
            .map(|&c| &self.nodes[c])
            .fold(None::<&Node>, |best, n| match best {
                Some(b) if b.visits >= n.visits => Some(b),
                _ => Some(n),
            });

        match best.and_then(|n| n.mv.map(|mv| (mv, n))) {
            Some((mv, node)) => {
                let win_rate = if node.visits > 0 {
                    node.wins / node.visits as f64
                } else {
                    0.0
                };
                Some(SearchOutcome::new(mv, win_rate))
            }
            None => moves
                .choose(&mut self.rng)
                .map(|&p| SearchOutcome::new(p, 0.0)),
        }
    }
}

use super::board::{Board, Cell, Color, Position, BOARD_SIZE, CORNERS, DIRECTIONS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Positional value of each square.
pub const POSITION_WEIGHTS: [[i32; BOARD_SIZE]; BOARD_SIZE] = [
    [120, -20, 20, 5, 5, 20, -20, 120],
    [-20, -40, -5, -5, -5, -5, -40, -20],
    [20, -5, 15, 3, 3, 15, -5, 20],
    [5, -5, 3, 3, 3, 3, -5, 5],
    [5, -5, 3, 3, 3, 3, -5, 5],
    [20, -5, 15, 3, 3, 15, -5, 20],
    [-20, -40, -5, -5, -5, -5, -40, -20],
    [120, -20, 20, 5, 5, 20, -20, 120],
];

pub fn position_weight(pos: Position) -> i32 {
    POSITION_WEIGHTS[pos.row][pos.col]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Early,
    Middle,
    Late,
}

impl GamePhase {
    pub fn from_empty_count(empty: u32) -> Self {
        if empty > 45 {
            GamePhase::Early
        } else if empty > 15 {
            GamePhase::Middle
        } else {
            GamePhase::Late
        }
    }

    pub fn of(board: &Board) -> Self {
        Self::from_empty_count(board.empty_count())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GamePhase::Early => "early",
            GamePhase::Middle => "middle",
            GamePhase::Late => "late",
        }
    }

    fn weights(self) -> Weights {
        match self {
            GamePhase::Early => Weights {
                pieces: 0.05,
                position: 0.35,
                mobility: 0.25,
                stability: 0.05,
                corners: 0.20,
                edges: 0.05,
                patterns: 0.05,
                parity: 0.0,
            },
            GamePhase::Middle => Weights {
                pieces: 0.1,
                position: 0.3,
                mobility: 0.15,
                stability: 0.1,
                corners: 0.25,
                edges: 0.05,
                patterns: 0.05,
                parity: 0.0,
            },
            GamePhase::Late => Weights {
                pieces: 0.3,
                position: 0.1,
                mobility: 0.05,
                stability: 0.2,
                corners: 0.2,
                edges: 0.1,
                patterns: 0.0,
                parity: 0.05,
            },
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Weights {
    pieces: f64,
    position: f64,
    mobility: f64,
    stability: f64,
    corners: f64,
    edges: f64,
    patterns: f64,
    parity: f64,
}

/// `(ours - theirs) / (ours + theirs)`, zero when both are zero.
fn balance(ours: f64, theirs: f64) -> f64 {
    let total = ours + theirs;
    if total > 0.0 {
        (ours - theirs) / total
    } else {
        0.0
    }
}

fn count_cells(board: &Board, cell: Cell, squares: impl Iterator<Item = Position>) -> usize {
    squares.filter(|&p| board.get(p) == cell).count()
}

/// Static evaluation of `board` for `color`, in `[-1, 1]`.
pub fn evaluate_position(board: &Board, color: Color, phase: GamePhase) -> f64 {
    let weights = phase.weights();
    let own = Cell::from(color);
    let theirs = Cell::from(color.opponent());
    let count = board.count();

    let pieces = balance(count.of(color) as f64, count.of(color.opponent()) as f64);

    let mut positional = 0.0;
    let mut max_positional = 0.0;
    for pos in Position::all() {
        let w = position_weight(pos) as f64;
        match board.get(pos) {
            c if c == own => positional += w,
            c if c == theirs => positional -= w,
            _ => {}
        }
        max_positional += w.abs();
    }
    let positional = positional / max_positional;

    let mobility = balance(
        board.valid_moves(color).len() as f64,
        board.valid_moves(color.opponent()).len() as f64,
    );

    let stability = balance(
        count_stable_discs(board, color) as f64,
        count_stable_discs(board, color.opponent()) as f64,
    );

    let own_corners = count_cells(board, own, CORNERS.into_iter());
    let their_corners = count_cells(board, theirs, CORNERS.into_iter());
    let corners = if own_corners == 4 {
        1.0
    } else if their_corners == 4 {
        -1.0
    } else {
        (own_corners as f64 - their_corners as f64) / 4.0
    };

    let edge_squares = || Position::all().filter(Position::is_edge);
    let edges = (count_cells(board, own, edge_squares()) as f64
        - count_cells(board, theirs, edge_squares()) as f64)
        / 24.0;

    let mut patterns = 0.0;
    for diagonal in [
        (0..BOARD_SIZE).map(|i| Position::new(i, i)).collect::<Vec<_>>(),
        (0..BOARD_SIZE).map(|i| Position::new(i, 7 - i)).collect(),
    ] {
        let ours = count_cells(board, own, diagonal.iter().copied());
        let others = count_cells(board, theirs, diagonal.iter().copied());
        if ours > others {
            patterns += 0.1;
        } else if others > ours {
            patterns -= 0.1;
        }
    }

    let parity = if phase == GamePhase::Late && count.empty < 10 {
        if count.empty % 2 == 0 {
            0.1
        } else {
            -0.1
        }
    } else {
        0.0
    };

    let mut score = weights.pieces * pieces
        + weights.position * positional
        + weights.mobility * mobility
        + weights.stability * stability
        + weights.corners * corners
        + weights.edges * edges
        + weights.patterns * patterns
        + weights.parity * parity;

    // C and X squares next to an open corner
    for pos in Position::all() {
        let Some(corner) = pos.guarded_corner() else {
            continue;
        };
        if !board.is_empty_at(corner) {
            continue;
        }
        match board.get(pos) {
            c if c == own => score -= 0.05,
            c if c == theirs => score += 0.05,
            _ => {}
        }
    }

    score.clamp(-1.0, 1.0)
}

/// Discs of `color` that can no longer be flipped.
///
/// Corners seed the set. Edge discs count as settled, and an interior disc joins
/// once four or more directions reach a settled disc through its own colour.
pub fn count_stable_discs(board: &Board, color: Color) -> usize {
    let own = Cell::from(color);
    let mut stable: HashSet<Position> = CORNERS
        .iter()
        .copied()
        .filter(|&p| board.get(p) == own)
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for pos in Position::all() {
            if board.get(pos) != own || stable.contains(&pos) {
                continue;
            }
            if is_stable(board, pos, &stable) {
                stable.insert(pos);
                changed = true;
            }
        }
    }
    stable.len()
}

fn reaches_stable(board: &Board, pos: Position, dr: i32, dc: i32, stable: &HashSet<Position>) -> bool {
    let own = board.get(pos);
    let mut cursor = pos.offset(dr, dc);
    while let Some(p) = cursor {
        if board.get(p) != own {
            return false;
        }
        if stable.contains(&p) {
            return true;
        }
        cursor = p.offset(dr, dc);
    }
    false
}

fn is_stable(board: &Board, pos: Position, stable: &HashSet<Position>) -> bool {
    let on_edge = pos.row == 0 || pos.row == 7 || pos.col == 0 || pos.col == 7;
    if on_edge {
        return true;
    }
    DIRECTIONS
        .iter()
        .filter(|&&(dr, dc)| reaches_stable(board, pos, dr, dc, stable))
        .count()
        >= 4
}

/// Single-ply greedy score: corner +100, edge +10, +1 per flipped disc.
pub fn move_score(board: &Board, pos: Position, color: Color) -> i32 {
    let mut score = board.flips(pos, color).len() as i32;
    if pos.is_corner() {
        score += 100;
    } else if pos.is_edge() {
        score += 10;
    }
    score
}

/// Whether playing `pos` leaves the neighbouring corner open to the opponent.
pub fn gives_corner_access(board: &Board, pos: Position) -> bool {
    pos.guarded_corner()
        .is_some_and(|corner| board.is_empty_at(corner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_boundaries() {
        assert_eq!(GamePhase::from_empty_count(60), GamePhase::Early);
        assert_eq!(GamePhase::from_empty_count(46), GamePhase::Early);
        assert_eq!(GamePhase::from_empty_count(45), GamePhase::Middle);
        assert_eq!(GamePhase::from_empty_count(16), GamePhase::Middle);
        assert_eq!(GamePhase::from_empty_count(15), GamePhase::Late);
        assert_eq!(GamePhase::of(&Board::new()), GamePhase::Early);
    }

    #[test]
    fn opening_position_is_balanced() {
        let board = Board::new();
        for phase in [GamePhase::Early, GamePhase::Middle, GamePhase::Late] {
            let black = evaluate_position(&board, Color::Black, phase);
            let white = evaluate_position(&board, Color::White, phase);
            assert!(black.abs() < 1e-9, "{phase}: {black}");
            assert!(white.abs() < 1e-9);
        }
    }

    #[test]
    fn corners_favour_their_owner() {
        let mut board = Board::new();
        board.set(Position::new(0, 0), Cell::Black);
        let black = evaluate_position(&board, Color::Black, GamePhase::Middle);
        let white = evaluate_position(&board, Color::White, GamePhase::Middle);
        assert!(black > 0.0);
        assert!(white < 0.0);
        assert!((-1.0..=1.0).contains(&black));
    }

    #[test]
    fn wiped_out_board_scores_near_the_bounds() {
        let board = Board::from_cells([[Cell::Black; 8]; 8]);
        let black = evaluate_position(&board, Color::Black, GamePhase::Late);
        let white = evaluate_position(&board, Color::White, GamePhase::Late);
        assert!(black > 0.8 && black <= 1.0, "{black}");
        assert!(white < -0.8 && white >= -1.0, "{white}");
    }

    #[test]
    fn stable_discs_grow_from_corners() {
        let mut board = Board::empty();
        board.set(Position::new(0, 0), Cell::White);
        board.set(Position::new(3, 3), Cell::White);
        // edge discs always count, interior discs need support
        board.set(Position::new(0, 4), Cell::White);
        assert_eq!(count_stable_discs(&board, Color::White), 2);
        assert_eq!(count_stable_discs(&board, Color::Black), 0);
    }

    #[test]
    fn greedy_score_prefers_corners_and_edges() {
        let mut board = Board::empty();
        board.set(Position::new(0, 1), Cell::White);
        board.set(Position::new(0, 2), Cell::Black);
        assert_eq!(move_score(&board, Position::new(0, 0), Color::Black), 101);

        let opening = Board::new();
        assert_eq!(move_score(&opening, Position::new(2, 3), Color::Black), 1);
    }

    #[test]
    fn corner_access_only_when_corner_is_open() {
        let mut board = Board::new();
        assert!(gives_corner_access(&board, Position::new(1, 1)));
        assert!(!gives_corner_access(&board, Position::new(2, 2)));
        board.set(Position::new(0, 0), Cell::White);
        assert!(!gives_corner_access(&board, Position::new(0, 1)));
    }
}

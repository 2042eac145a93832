use super::board::{Board, Color, Position};
use super::strategy::Strategist;
use crate::config::SearchSettings;
use crate::error::AppError;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const STRONG_DEPTH: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    #[default]
    Medium,
    Strong,
}

impl Strength {
    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strength {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weak" => Ok(Strength::Weak),
            "medium" => Ok(Strength::Medium),
            "strong" => Ok(Strength::Strong),
            other => Err(AppError::Pipeline(format!("unknown opponent strength '{other}'"))),
        }
    }
}

/// Simulated opponent used for self-play.
pub struct Opponent {
    strength: Strength,
    rng: StdRng,
    strategist: Strategist,
}

impl fmt::Debug for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opponent")
            .field("strength", &self.strength)
            .finish_non_exhaustive()
    }
}

impl Opponent {
    pub fn new(strength: Strength, settings: &SearchSettings) -> Self {
        let rng = match settings.seed {
            // keep the opponent's stream apart from the search's
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };
        Self {
            strength,
            rng,
            strategist: Strategist::new(settings),
        }
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub fn choose(&mut self, board: &Board, color: Color) -> Option<Position> {
        let moves = board.valid_moves(color);
        if moves.is_empty() {
            return None;
        }
        match self.strength {
            Strength::Weak => {
                let quiet: Vec<Position> = moves.iter().copied().filter(|p| !p.is_corner()).collect();
                let pool = if quiet.is_empty() { &moves } else { &quiet };
                pool.choose(&mut self.rng).copied()
            }
            Strength::Medium => {
                if self.rng.random::<f64>() < 0.7 {
                    let mut scored: Vec<(Position, f64)> = moves
                        .iter()
                        .map(|&p| (p, medium_score(board, p, color)))
                        .collect();
                    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
                    scored.truncate(3);
                    scored.choose(&mut self.rng).map(|&(p, _)| p)
                } else {
                    moves.choose(&mut self.rng).copied()
                }
            }
            Strength::Strong => self
                .strategist
                .best_move(board, color, Some(STRONG_DEPTH), None)
                .map(|choice| choice.position),
        }
    }
}

/// Corner +10, edge +5, an X-square beside an open corner -5, plus 0.1 per
/// disc gained.
fn medium_score(board: &Board, pos: Position, color: Color) -> f64 {
    let mut score = if pos.is_corner() {
        10.0
    } else if pos.is_edge() {
        5.0
    } else if pos.guarded_corner().is_some_and(|c| board.is_empty_at(c)) {
        -5.0
    } else {
        0.0
    };
    score += (board.flips(pos, color).len() + 1) as f64 * 0.1;
    score
}

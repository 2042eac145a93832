use super::board::{Board, Color, PieceCount, Position};
use super::heuristics::{evaluate_position, GamePhase};
use super::strategy::AlgorithmStats;
use crate::error::AppError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// One ply of a recorded game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLogEntry {
    pub move_number: u32,
    pub board: Board,
    pub pieces: PieceCount,
    pub game_phase: GamePhase,
    pub player: Color,
    #[serde(rename = "move")]
    pub mv: Option<String>,
    pub opponent_move: Option<String>,
    pub score: f64,
    pub timestamp: String,
    pub algorithm: String,
    #[serde(default)]
    pub algorithm_stats: BTreeMap<String, AlgorithmStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_our_move: Option<bool>,
}

/// What the caller knows about a move when recording it.
#[derive(Debug, Clone, Default)]
pub struct MoveRecord<'a> {
    pub mv: Option<Position>,
    pub opponent_move: Option<Position>,
    pub algorithm: Option<&'a str>,
    pub algorithm_stats: Option<&'a BTreeMap<&'static str, AlgorithmStats>>,
    pub is_our_move: Option<bool>,
}

/// Search normally used in `phase`, recorded when the caller names none.
fn default_algorithm(phase: GamePhase) -> &'static str {
    match phase {
        GamePhase::Early => "mcts",
        GamePhase::Middle => "negascout",
        GamePhase::Late => "minimax",
    }
}

/// Game journal rewritten in full after every entry.
#[derive(Debug)]
pub struct GameLog {
    path: PathBuf,
    entries: Vec<GameLogEntry>,
}

impl GameLog {
    /// Start a log in `dir`, named after the current local time plus a random tag.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let tag = Uuid::new_v4().simple().to_string();
        let name = format!(
            "game_{}_{}.json",
            Local::now().format("%Y%m%d_%H%M%S_%3f"),
            &tag[..8]
        );
        Ok(Self::at(dir.join(name)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[GameLogEntry] {
        &self.entries
    }

    /// Append an entry describing `board` after `player`'s move and flush the file.
    pub fn record(
        &mut self,
        move_number: u32,
        board: &Board,
        player: Color,
        record: MoveRecord<'_>,
    ) -> Result<&GameLogEntry, AppError> {
        let phase = GamePhase::of(board);
        let entry = GameLogEntry {
            move_number,
            board: *board,
            pieces: board.count(),
            game_phase: phase,
            player,
            mv: record.mv.map(|p| p.notation()),
            opponent_move: record.opponent_move.map(|p| p.notation()),
            score: evaluate_position(board, player, phase),
            timestamp: Local::now().to_rfc3339(),
            algorithm: record
                .algorithm
                .unwrap_or_else(|| default_algorithm(phase))
                .to_string(),
            algorithm_stats: record
                .algorithm_stats
                .map(|stats| stats.iter().map(|(k, v)| (k.to_string(), *v)).collect())
                .unwrap_or_default(),
            is_our_move: record.is_our_move,
        };
        self.entries.push(entry);
        self.flush()?;
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn flush(&self) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        std::fs::write(&self.path, bytes)?;
        debug!(path = %self.path.display(), entries = self.entries.len(), "Game log written");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Vec<GameLogEntry>, AppError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Aggregated figures for one algorithm across all logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlgorithmSummary {
    pub total_moves: u32,
    pub total_score: f64,
    pub average_score: f64,
    pub moves_by_phase: BTreeMap<GamePhase, u32>,
}

/// Disc counts over one game, from our side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameProgress {
    pub file: String,
    pub our_color: Color,
    pub moves: Vec<u32>,
    pub our_pieces: Vec<u32>,
    pub opponent_pieces: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogSummary {
    pub games: usize,
    pub algorithms: BTreeMap<String, AlgorithmSummary>,
    pub progress: Vec<GameProgress>,
}

impl LogSummary {
    /// Read every `*.json` log under `dir`. Unreadable files are skipped.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        let mut games = Vec::with_capacity(files.len());
        for file in files {
            match GameLog::load(&file) {
                Ok(entries) => {
                    let name = file
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    games.push((name, entries));
                }
                Err(e) => warn!(path = %file.display(), error = %e, "Skipping unreadable game log"),
            }
        }
        Ok(Self::from_games(&games))
    }

    pub fn from_games(games: &[(String, Vec<GameLogEntry>)]) -> Self {
        let mut summary = LogSummary {
            games: games.len(),
            ..Default::default()
        };

        for (file, entries) in games {
            for entry in entries.iter().filter(|e| e.is_our_move.unwrap_or(true)) {
                let stats = summary.algorithms.entry(entry.algorithm.clone()).or_default();
                stats.total_moves += 1;
                stats.total_score += entry.score;
                *stats.moves_by_phase.entry(entry.game_phase).or_default() += 1;
            }

            let Some(our_color) = entries
                .iter()
                .find(|e| e.is_our_move.unwrap_or(false))
                .map(|e| e.player)
            else {
                continue;
            };
            let ours: Vec<&GameLogEntry> = entries
                .iter()
                .filter(|e| e.is_our_move.unwrap_or(false))
                .collect();
            summary.progress.push(GameProgress {
                file: file.clone(),
                our_color,
                moves: ours.iter().map(|e| e.move_number).collect(),
                our_pieces: ours.iter().map(|e| e.pieces.of(our_color)).collect(),
                opponent_pieces: ours
                    .iter()
                    .map(|e| e.pieces.of(our_color.opponent()))
                    .collect(),
            });
        }

        for stats in summary.algorithms.values_mut() {
            if stats.total_moves > 0 {
                stats.average_score = stats.total_score / stats.total_moves as f64;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening_log(dir: &Path) -> GameLog {
        let mut log = GameLog::at(dir.join("game_test.json"));
        let mut board = Board::new();
        let f5 = Position::new(4, 5);
        board.make_move(f5, Color::Black);
        log.record(
            1,
            &board,
            Color::Black,
            MoveRecord {
                mv: Some(f5),
                algorithm: Some("opening_book"),
                is_our_move: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        let d6 = Position::new(5, 3);
        board.make_move(d6, Color::White);
        log.record(
            2,
            &board,
            Color::White,
            MoveRecord {
                mv: Some(d6),
                is_our_move: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        log
    }

    #[test]
    fn entries_are_written_after_each_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = opening_log(dir.path());

        let loaded = GameLog::load(log.path()).unwrap();
        assert_eq!(loaded.len(), log.entries().len());
        assert_eq!(loaded[1].board, log.entries()[1].board);
        assert_eq!(loaded[0].mv.as_deref(), Some("F5"));
        assert_eq!(loaded[0].pieces.black, 4);
        assert_eq!(loaded[1].algorithm, "mcts");
        assert_eq!(loaded[1].game_phase, GamePhase::Early);
        assert!(chrono::DateTime::parse_from_rfc3339(&loaded[0].timestamp).is_ok());
    }

    #[test]
    fn json_uses_log_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let log = opening_log(dir.path());
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(log.path()).unwrap()).unwrap();
        let first = &raw[0];
        assert_eq!(first["move"], "F5");
        assert_eq!(first["player"], "black");
        assert_eq!(first["game_phase"], "early");
        assert_eq!(first["board"][4][5], "black");
        assert_eq!(first["is_our_move"], true);
    }

    #[test]
    fn create_names_file_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let log = GameLog::create(dir.path().join("logs")).unwrap();
        let name = log.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("game_") && name.ends_with(".json"), "{name}");
        assert_eq!(name.len(), "game_20240101_120000_123_0a1b2c3d.json".len());
    }

    #[test]
    fn back_to_back_games_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = GameLog::create(dir.path()).unwrap();
        let second = GameLog::create(dir.path()).unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn summary_counts_only_our_moves() {
        let dir = tempfile::tempdir().unwrap();
        opening_log(dir.path());
        std::fs::write(dir.path().join("broken.json"), b"not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let summary = LogSummary::from_dir(dir.path()).unwrap();
        assert_eq!(summary.games, 1);
        assert_eq!(summary.algorithms.len(), 1);
        let book = &summary.algorithms["opening_book"];
        assert_eq!(book.total_moves, 1);
        assert_eq!(book.moves_by_phase[&GamePhase::Early], 1);
        assert!((book.average_score - book.total_score).abs() < 1e-12);

        assert_eq!(summary.progress.len(), 1);
        assert_eq!(summary.progress[0].our_color, Color::Black);
        assert_eq!(summary.progress[0].our_pieces, vec![4]);
        assert_eq!(summary.progress[0].opponent_pieces, vec![1]);
    }
}

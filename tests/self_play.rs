use reversi_analyzer::config::SearchSettings;
use reversi_analyzer::engine::{Color, GameLog, LogSummary, SelfPlay, Strength};

fn settings(seed: u64) -> SearchSettings {
    SearchSettings::default().with_seed(seed).with_max_time_ms(30)
}

#[test]
fn logged_games_feed_the_summary() {
    let dir = tempfile::tempdir().unwrap();

    for (i, color) in [Color::Black, Color::White].into_iter().enumerate() {
        let mut log = GameLog::at(dir.path().join(format!("game_{i}.json")));
        let mut game = SelfPlay::new(color, Strength::Weak, &settings(i as u64));
        let result = game.play(Some(&mut log)).unwrap();
        assert!(result.final_board.is_game_over());
    }
    std::fs::write(dir.path().join("broken.json"), b"{ not json").unwrap();

    let summary = LogSummary::from_dir(dir.path()).unwrap();
    assert_eq!(summary.games, 2);
    assert_eq!(summary.progress.len(), 2);
    assert_eq!(summary.progress[0].our_color, Color::Black);
    assert_eq!(summary.progress[1].our_color, Color::White);
    assert!(summary.algorithms.contains_key("opening_book"));
    assert!(!summary.algorithms.contains_key("weak"));

    let total: u32 = summary.algorithms.values().map(|a| a.total_moves).sum();
    let ours: usize = summary.progress.iter().map(|p| p.moves.len()).sum();
    assert_eq!(total as usize, ours);
}
